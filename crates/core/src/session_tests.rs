use super::*;

#[test]
fn new_session_is_active_and_freshly_seen() {
    let agent_id = AgentId::generate();
    let session = Session::new(agent_id, "10.0.0.5:9000", 1_000);
    assert_eq!(session.status, SessionStatus::Active);
    assert_eq!(session.opened_at_ms, 1_000);
    assert_eq!(session.last_seen_ms, 1_000);
}

#[test]
fn resume_tokens_are_unique() {
    let a = ResumeToken::generate();
    let b = ResumeToken::generate();
    assert_ne!(a, b);
}
