use super::*;

#[test]
fn star_matches_any_suffix() {
    assert!(glob_match("worker-*", "worker-1"));
    assert!(glob_match("worker-*", "worker-"));
    assert!(!glob_match("worker-*", "scraper-1"));
}

#[test]
fn question_mark_matches_exactly_one_character() {
    assert!(glob_match("worker-?", "worker-1"));
    assert!(!glob_match("worker-?", "worker-10"));
}

#[test]
fn matching_is_case_insensitive() {
    assert!(glob_match("Worker-*", "WORKER-1"));
}

#[test]
fn group_prefix_matches_on_agent_group_not_name() {
    let pattern = AgentPattern::parse(Some("group:prod"));
    assert!(pattern.matches("worker-1", Some("prod")));
    assert!(!pattern.matches("worker-1", Some("dev")));
    assert!(!pattern.matches("worker-1", None));
}

#[test]
fn no_pattern_matches_everything() {
    let pattern = AgentPattern::parse(None);
    assert!(pattern.matches("anything", None));
}
