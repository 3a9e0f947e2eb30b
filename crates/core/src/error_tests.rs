use super::*;

#[test]
fn transient_tags_are_retryable() {
    assert!(OrbitError::unavailable("store down").is_retryable());
    assert!(OrbitError::Timeout { message: "t_ack".into() }.is_retryable());
}

#[test]
fn semantic_tags_are_not_retryable() {
    assert!(!OrbitError::not_found(EntityKind::Job, "job-1").is_retryable());
    assert!(!OrbitError::invalid_argument("bad pattern").is_retryable());
    assert!(!OrbitError::conflict("already terminal").is_retryable());
}

#[test]
fn tag_is_stable_machine_readable_text() {
    assert_eq!(OrbitError::internal("oops").tag(), "internal");
    assert_eq!(OrbitError::not_found(EntityKind::Agent, "a1").tag(), "not_found");
}
