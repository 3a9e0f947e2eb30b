use super::*;

#[test]
fn new_decision_is_unresolved() {
    let decision = Decision::new(
        InstanceId::generate(),
        StepId::from("approve-deploy"),
        "Deploy to prod?",
        vec![DecisionOption::new("yes"), DecisionOption::new("no")],
        1_000,
    );
    assert!(!decision.is_resolved());
    assert_eq!(decision.options.len(), 2);
}
