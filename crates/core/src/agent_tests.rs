use super::*;

#[test]
fn selectable_statuses_are_ready_and_running() {
    assert!(AgentStatus::Ready.is_selectable());
    assert!(AgentStatus::Running.is_selectable());
    assert!(!AgentStatus::Paused.is_selectable());
    assert!(!AgentStatus::Disconnected.is_selectable());
}

#[test]
fn has_all_capabilities_requires_every_name() {
    let agent = AgentBuilder::new()
        .name("worker-1")
        .capabilities(vec![Capability::new("gpu", "1"), Capability::new("fs.watch", "1")])
        .build();
    assert!(agent.has_all_capabilities(&["gpu".to_string()]));
    assert!(agent.has_all_capabilities(&["gpu".to_string(), "fs.watch".to_string()]));
    assert!(!agent.has_all_capabilities(&["gpu".to_string(), "missing".to_string()]));
}

#[test]
fn has_all_capabilities_is_vacuously_true_when_empty() {
    let agent = AgentBuilder::new().build();
    assert!(agent.has_all_capabilities(&[]));
}

#[test]
fn display_matches_snake_case_tag() {
    assert_eq!(AgentStatus::Disconnected.to_string(), "disconnected");
}
