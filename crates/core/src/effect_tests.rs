use super::*;
use crate::job::JobRequest;

#[test]
fn name_is_stable_regardless_of_payload() {
    let a = Effect::CancelTimer { timer_id: TimerId("x".into()) };
    let b = Effect::CancelTimer { timer_id: TimerId("y".into()) };
    assert_eq!(a.name(), b.name());
}

#[test]
fn deliver_job_fields_include_agent_job_and_attempt() {
    let job = Job::from_request(JobRequest::new("noop"), 0);
    let job_id = job.id;
    let effect = Effect::DeliverJob { agent_id: AgentId::generate(), job, attempt: 1 };
    let fields = effect.fields();
    assert!(fields.iter().any(|(k, v)| *k == "job_id" && v == &job_id.to_string()));
    assert!(fields.iter().any(|(k, v)| *k == "attempt" && v == "1"));
}

#[test]
fn publish_fields_surface_the_event_topic() {
    let effect = Effect::Publish(Event::AgentReady { agent_id: AgentId::generate() });
    let fields = effect.fields();
    assert_eq!(fields, vec![("topic", "agent".to_string())]);
}
