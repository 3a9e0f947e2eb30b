use super::*;
use orbitmesh_core::{FakeClock, JobBuilder, JobStatus};
use orbitmesh_store::InMemoryStore;
use std::sync::Arc;

fn registry() -> (AgentRegistry<FakeClock>, Arc<dyn Store>, FakeClock) {
    let store: Arc<dyn Store> = Arc::new(InMemoryStore::new());
    let bus = Arc::new(EventBus::new(64));
    let clock = FakeClock::new();
    (AgentRegistry::new(store.clone(), bus, clock.clone()), store, clock)
}

fn identity(id: &str) -> AgentIdentity {
    AgentIdentity {
        agent_id: AgentId::from_string(id),
        name: id.to_string(),
        capabilities: Vec::new(),
        group: None,
    }
}

#[tokio::test]
async fn connect_transitions_a_new_agent_to_ready() {
    let (registry, ..) = registry();
    let outcome = registry.connect(identity("agt-1"), "127.0.0.1:1").await.unwrap();
    assert_eq!(outcome.agent.status, AgentStatus::Ready);
    assert!(outcome.inflight_replay.is_empty());
}

#[tokio::test]
async fn reconnect_supersedes_the_prior_session() {
    let (registry, store, _clock) = registry();
    let first = registry.connect(identity("agt-1"), "127.0.0.1:1").await.unwrap();
    let second = registry.connect(identity("agt-1"), "127.0.0.1:2").await.unwrap();
    assert_ne!(first.session.connection_id, second.session.connection_id);

    let current = store.get_session_for_agent(&AgentId::from_string("agt-1")).await.unwrap().unwrap();
    assert_eq!(current.connection_id, second.session.connection_id);
    assert_eq!(current.status, SessionStatus::Active);
}

#[tokio::test]
async fn reconnect_replays_inflight_assigned_jobs() {
    let (registry, store, _clock) = registry();
    registry.connect(identity("agt-1"), "127.0.0.1:1").await.unwrap();

    let mut job = JobBuilder::default().command("noop").build();
    job.status = JobStatus::Acknowledged;
    job.assigned_agent_id = Some(AgentId::from_string("agt-1"));
    store.put_job(job.clone()).await.unwrap();

    let outcome = registry.connect(identity("agt-1"), "127.0.0.1:3").await.unwrap();
    assert_eq!(outcome.inflight_replay.len(), 1);
    assert_eq!(outcome.inflight_replay[0].id, job.id);
}

#[tokio::test]
async fn heartbeat_timeout_disconnects_a_silent_agent() {
    let (registry, _store, clock) = registry();
    registry.connect(identity("agt-1"), "127.0.0.1:1").await.unwrap();
    clock.advance(std::time::Duration::from_millis(DEFAULT_HEARTBEAT_TIMEOUT_MS + 1));

    let dead = registry.reap_dead_sessions().await.unwrap();
    assert_eq!(dead, vec![AgentId::from_string("agt-1")]);
    let agent = registry.get(&AgentId::from_string("agt-1")).await.unwrap();
    assert_eq!(agent.status, AgentStatus::Disconnected);
}

#[tokio::test]
async fn pause_then_resume_round_trips_status() {
    let (registry, ..) = registry();
    registry.connect(identity("agt-1"), "127.0.0.1:1").await.unwrap();
    registry.pause(&AgentId::from_string("agt-1")).await.unwrap();
    assert_eq!(registry.get(&AgentId::from_string("agt-1")).await.unwrap().status, AgentStatus::Paused);
    registry.resume(&AgentId::from_string("agt-1")).await.unwrap();
    assert_eq!(registry.get(&AgentId::from_string("agt-1")).await.unwrap().status, AgentStatus::Ready);
}

#[tokio::test]
async fn stop_finishes_immediately_when_no_inflight_work() {
    let (registry, ..) = registry();
    registry.connect(identity("agt-1"), "127.0.0.1:1").await.unwrap();
    registry.stop(&AgentId::from_string("agt-1")).await.unwrap();
    assert_eq!(registry.get(&AgentId::from_string("agt-1")).await.unwrap().status, AgentStatus::Stopped);
}

#[tokio::test]
async fn disconnect_clears_active_assignments_so_a_reconnect_starts_idle() {
    let (registry, store, _clock) = registry();
    let outcome = registry.connect(identity("agt-1"), "127.0.0.1:1").await.unwrap();
    let mut agent = outcome.agent;
    agent.active_assignments = 3;
    store.put_agent(agent).await.unwrap();

    registry.disconnect(&AgentId::from_string("agt-1"), "socket closed").await.unwrap();

    let after = registry.get(&AgentId::from_string("agt-1")).await.unwrap();
    assert_eq!(after.status, AgentStatus::Disconnected);
    assert_eq!(after.active_assignments, 0);
}
