use super::*;

#[test]
fn parse_review_input_skips_on_blank_or_s() {
    assert_eq!(parse_review_input("", 3), ReviewAction::Skip);
    assert_eq!(parse_review_input("s", 3), ReviewAction::Skip);
    assert_eq!(parse_review_input("S", 3), ReviewAction::Skip);
}

#[test]
fn parse_review_input_quits_on_q_or_x() {
    assert_eq!(parse_review_input("q", 3), ReviewAction::Quit);
    assert_eq!(parse_review_input("X", 3), ReviewAction::Quit);
}

#[test]
fn parse_review_input_picks_a_valid_number() {
    assert_eq!(parse_review_input("2", 3), ReviewAction::Pick(2));
}

#[test]
fn parse_review_input_rejects_an_out_of_range_number() {
    assert_eq!(parse_review_input("9", 3), ReviewAction::Invalid);
    assert_eq!(parse_review_input("0", 3), ReviewAction::Invalid);
}

fn sample_decision() -> Decision {
    Decision::new(
        orbitmesh_core::InstanceId::from_string("inst-1"),
        orbitmesh_core::StepId::from_string("step-1"),
        "proceed?",
        vec![orbitmesh_core::DecisionOption::new("approve"), orbitmesh_core::DecisionOption::new("deny")],
        0,
    )
}

#[test]
fn render_decision_table_includes_the_prompt() {
    let decision = sample_decision();
    let mut buf = Vec::new();
    render_decision_table(&[decision], &mut buf);
    let rendered = String::from_utf8(buf).unwrap();
    assert!(rendered.contains("proceed?"));
}

#[test]
fn print_decision_detail_lists_every_option() {
    let decision = sample_decision();
    let mut buf = Vec::new();
    print_decision_detail(&mut buf, &decision, true);
    let rendered = String::from_utf8(buf).unwrap();
    assert!(rendered.contains("approve"));
    assert!(rendered.contains("deny"));
    assert!(rendered.contains("decision resolve"));
}

#[test]
fn print_decision_detail_shows_chosen_label_once_resolved() {
    let mut decision = sample_decision();
    decision.resolved_at_ms = Some(10);
    decision.chosen_label = Some("approve".to_string());
    let mut buf = Vec::new();
    print_decision_detail(&mut buf, &decision, true);
    let rendered = String::from_utf8(buf).unwrap();
    assert!(rendered.contains("resolved"));
    assert!(rendered.contains("approve"));
}
