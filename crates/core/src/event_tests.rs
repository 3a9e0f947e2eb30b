use super::*;

#[test]
fn topic_groups_job_events_under_job() {
    let event = Event::JobCompleted { job_id: JobId::generate(), agent_id: AgentId::generate() };
    assert_eq!(event.topic(), "job");
}

#[test]
fn serializes_with_the_tagged_type_field() {
    let event = Event::AgentReady { agent_id: AgentId::from_string("agt-test") };
    let json = serde_json::to_value(&event).unwrap();
    assert_eq!(json["type"], "agent:ready");
    assert_eq!(json["agent_id"], "agt-test");
}

#[test]
fn unknown_types_deserialize_to_the_catch_all() {
    let json = serde_json::json!({"type": "something:new", "x": 1});
    let event: Event = serde_json::from_value(json).unwrap();
    assert!(matches!(event, Event::Unknown));
}
