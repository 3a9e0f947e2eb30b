// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Integration tests driving `AgentRegistry` and `Dispatcher` together
//! through a full job lifecycle, sharing one `Store`/`EventBus` the way
//! `orbitmesh-server`'s `App` wires them.

use orbitmesh_core::{AgentId, Capability, FakeClock, JobRequest, JobStatus};
use orbitmesh_engine::registry::AgentIdentity;
use orbitmesh_engine::{AgentRegistry, Dispatcher, EventBus};
use orbitmesh_store::InMemoryStore;
use std::sync::Arc;
use std::time::Duration;

fn harness() -> (AgentRegistry<FakeClock>, Dispatcher<FakeClock>, FakeClock) {
    let store: Arc<dyn orbitmesh_store::Store> = Arc::new(InMemoryStore::new());
    let bus = Arc::new(EventBus::new(64));
    let clock = FakeClock::new();
    let registry = AgentRegistry::new(store.clone(), bus.clone(), clock.clone());
    let dispatcher = Dispatcher::new(store, bus, clock.clone());
    (registry, dispatcher, clock)
}

#[tokio::test]
async fn a_job_runs_from_submission_through_completion() {
    let (registry, dispatcher, clock) = harness();

    let identity = AgentIdentity {
        agent_id: AgentId::generate(),
        name: "worker-1".to_string(),
        capabilities: vec![Capability { name: "shell".to_string(), version: "1".to_string(), props: Default::default() }],
        group: None,
    };
    let outcome = registry.connect(identity.clone(), "127.0.0.1:0").await.unwrap();
    assert!(outcome.inflight_replay.is_empty());

    let job = dispatcher.submit(JobRequest::new("echo hi")).await.unwrap();
    assert_eq!(job.status, JobStatus::Pending);

    let dispatched = dispatcher.try_dispatch().await.unwrap();
    assert_eq!(dispatched.len(), 1);
    assert_eq!(dispatched[0].id, job.id);
    assert_eq!(dispatched[0].assigned_agent_id, Some(identity.agent_id));

    dispatcher.on_ack(&job.id, &identity.agent_id).await.unwrap();
    let acked = dispatcher.get(&job.id).await.unwrap();
    assert_eq!(acked.status, JobStatus::Acknowledged);

    clock.advance(Duration::from_millis(10));
    dispatcher.on_start(&job.id).await.unwrap();
    let running = dispatcher.get(&job.id).await.unwrap();
    assert_eq!(running.status, JobStatus::Running);
    assert!(running.started_at_ms.is_some());

    clock.advance(Duration::from_millis(10));
    dispatcher.on_result(&job.id, b"ok".to_vec()).await.unwrap();
    let completed = dispatcher.get(&job.id).await.unwrap();
    assert_eq!(completed.status, JobStatus::Completed);
    assert_eq!(completed.result.as_deref(), Some(&b"ok"[..]));

    let agent = registry.get(&identity.agent_id).await.unwrap();
    assert_eq!(agent.active_assignments, 0);
}

#[tokio::test]
async fn a_job_is_not_assigned_to_a_paused_agent() {
    let (registry, dispatcher, _clock) = harness();

    let identity = AgentIdentity {
        agent_id: AgentId::generate(),
        name: "worker-1".to_string(),
        capabilities: Vec::new(),
        group: None,
    };
    registry.connect(identity.clone(), "127.0.0.1:0").await.unwrap();
    registry.pause(&identity.agent_id).await.unwrap();

    dispatcher.submit(JobRequest::new("echo hi")).await.unwrap();
    let dispatched = dispatcher.try_dispatch().await.unwrap();
    assert!(dispatched.is_empty());
}

#[tokio::test]
async fn retrying_a_failed_job_clears_its_error_and_requeues_it() {
    let (registry, dispatcher, _clock) = harness();

    let identity = AgentIdentity {
        agent_id: AgentId::generate(),
        name: "worker-1".to_string(),
        capabilities: Vec::new(),
        group: None,
    };
    registry.connect(identity.clone(), "127.0.0.1:0").await.unwrap();

    let job = dispatcher.submit(JobRequest::new("echo hi")).await.unwrap();
    dispatcher.try_dispatch().await.unwrap();
    dispatcher.on_ack(&job.id, &identity.agent_id).await.unwrap();
    dispatcher.on_start(&job.id).await.unwrap();
    dispatcher.on_error(&job.id, "boom", "it broke", false).await.unwrap();

    let failed = dispatcher.get(&job.id).await.unwrap();
    assert_eq!(failed.status, JobStatus::Failed);

    let retried = dispatcher.retry(&job.id).await.unwrap();
    assert_eq!(retried.status, JobStatus::Pending);
    assert!(retried.error.is_none());
}
