use super::*;
use orbitmesh_core::{AgentBuilder, AgentStatus, FakeClock};
use orbitmesh_store::InMemoryStore;
use std::sync::Arc;

fn dispatcher() -> (Dispatcher<FakeClock>, Arc<dyn Store>, FakeClock) {
    let store: Arc<dyn Store> = Arc::new(InMemoryStore::new());
    let bus = Arc::new(EventBus::new(64));
    let clock = FakeClock::new();
    (Dispatcher::new(store.clone(), bus, clock.clone()), store, clock)
}

async fn put_ready_agent(store: &Arc<dyn Store>, name: &str) -> AgentId {
    let agent = AgentBuilder::default().name(name).status(AgentStatus::Ready).build();
    let id = agent.id;
    store.put_agent(agent).await.unwrap();
    id
}

#[test]
fn retry_backoff_doubles_per_attempt_and_caps_at_max() {
    assert_eq!(retry_backoff_ms(1, 1000, 60_000, 0.0), 1000);
    assert_eq!(retry_backoff_ms(2, 1000, 60_000, 0.0), 2000);
    assert_eq!(retry_backoff_ms(3, 1000, 60_000, 0.0), 4000);
    assert_eq!(retry_backoff_ms(20, 1000, 60_000, 0.0), 60_000);
}

#[test]
fn retry_backoff_jitter_stays_within_twenty_percent() {
    let base = retry_backoff_ms(3, 1000, 60_000, 0.0);
    let high = retry_backoff_ms(3, 1000, 60_000, 1.0);
    let low = retry_backoff_ms(3, 1000, 60_000, -1.0);
    assert_eq!(high, base + base / 5);
    assert_eq!(low, base - base / 5);
}

#[tokio::test]
async fn submit_persists_a_pending_job() {
    let (dispatcher, store, _clock) = dispatcher();
    let job = dispatcher.submit(JobRequest::new("build")).await.unwrap();
    assert_eq!(job.status, JobStatus::Pending);
    assert_eq!(store.get_job(&job.id).await.unwrap().unwrap().id, job.id);
}

#[tokio::test]
async fn try_dispatch_assigns_a_ready_job_to_an_idle_agent() {
    let (dispatcher, store, _clock) = dispatcher();
    put_ready_agent(&store, "worker-1").await;
    let job = dispatcher.submit(JobRequest::new("build")).await.unwrap();

    let assigned = dispatcher.try_dispatch().await.unwrap();
    assert_eq!(assigned.len(), 1);
    assert_eq!(assigned[0].id, job.id);
    assert_eq!(assigned[0].status, JobStatus::Assigned);
}

#[tokio::test]
async fn assigning_a_job_moves_the_agent_to_running_and_back_to_ready_on_completion() {
    let (dispatcher, store, _clock) = dispatcher();
    let agent_id = put_ready_agent(&store, "worker-1").await;
    let job = dispatcher.submit(JobRequest::new("build")).await.unwrap();
    dispatcher.try_dispatch().await.unwrap();

    assert_eq!(store.get_agent(&agent_id).await.unwrap().unwrap().status, AgentStatus::Running);

    dispatcher.on_ack(&job.id, &agent_id).await.unwrap();
    dispatcher.on_start(&job.id).await.unwrap();
    dispatcher.on_result(&job.id, Vec::new()).await.unwrap();

    assert_eq!(store.get_agent(&agent_id).await.unwrap().unwrap().status, AgentStatus::Ready);
}

#[tokio::test]
async fn a_running_agent_with_spare_capacity_can_take_a_second_job() {
    let (dispatcher, store, _clock) = dispatcher();
    let agent_id = put_ready_agent(&store, "worker-1").await;
    dispatcher.submit(JobRequest::new("first")).await.unwrap();
    dispatcher.try_dispatch().await.unwrap();
    assert_eq!(store.get_agent(&agent_id).await.unwrap().unwrap().status, AgentStatus::Running);

    dispatcher.submit(JobRequest::new("second")).await.unwrap();
    let assigned = dispatcher.try_dispatch().await.unwrap();
    assert_eq!(assigned.len(), 1, "a Running agent is still selectable for more work");
    assert_eq!(assigned[0].assigned_agent_id, Some(agent_id));
}

#[tokio::test]
async fn try_dispatch_skips_jobs_still_in_retry_backoff() {
    let (dispatcher, store, clock) = dispatcher();
    put_ready_agent(&store, "worker-1").await;
    let mut job = dispatcher.submit(JobRequest::new("build")).await.unwrap();
    job.retry_after_ms = Some(clock.epoch_ms() + 10_000);
    store.put_job(job).await.unwrap();

    let assigned = dispatcher.try_dispatch().await.unwrap();
    assert!(assigned.is_empty());
}

#[tokio::test]
async fn try_dispatch_prefers_the_target_agent_when_set() {
    let (dispatcher, store, _clock) = dispatcher();
    put_ready_agent(&store, "worker-1").await;
    let target = put_ready_agent(&store, "worker-2").await;

    let mut request = JobRequest::new("build");
    request.target_agent_id = Some(target);
    let job = dispatcher.submit(request).await.unwrap();

    let assigned = dispatcher.try_dispatch().await.unwrap();
    assert_eq!(assigned[0].id, job.id);
    assert_eq!(assigned[0].assigned_agent_id, Some(target));
}

#[tokio::test]
async fn rejection_requeues_the_job_and_blacklists_the_agent_for_one_round() {
    let (dispatcher, store, _clock) = dispatcher();
    let only_agent = put_ready_agent(&store, "worker-1").await;
    let job = dispatcher.submit(JobRequest::new("build")).await.unwrap();
    dispatcher.try_dispatch().await.unwrap();

    dispatcher.on_reject(&job.id, &only_agent, "busy").await.unwrap();
    let reloaded = dispatcher.get(&job.id).await.unwrap();
    assert_eq!(reloaded.status, JobStatus::Pending);
    assert_eq!(reloaded.retry_count, 1);

    let assigned = dispatcher.try_dispatch().await.unwrap();
    assert!(assigned.is_empty(), "the only agent is blacklisted for this job this round");
}

#[tokio::test]
async fn full_happy_path_ack_start_progress_result() {
    let (dispatcher, store, _clock) = dispatcher();
    let agent_id = put_ready_agent(&store, "worker-1").await;
    let job = dispatcher.submit(JobRequest::new("build")).await.unwrap();
    dispatcher.try_dispatch().await.unwrap();

    dispatcher.on_ack(&job.id, &agent_id).await.unwrap();
    assert_eq!(dispatcher.get(&job.id).await.unwrap().status, JobStatus::Acknowledged);

    dispatcher.on_start(&job.id).await.unwrap();
    assert_eq!(dispatcher.get(&job.id).await.unwrap().status, JobStatus::Running);

    dispatcher.on_progress(&job.id, JobProgress { pct: 50, message: None, step: None }).await.unwrap();
    assert_eq!(dispatcher.get(&job.id).await.unwrap().last_progress.as_ref().unwrap().pct, 50);

    dispatcher.on_result(&job.id, b"ok".to_vec()).await.unwrap();
    let done = dispatcher.get(&job.id).await.unwrap();
    assert_eq!(done.status, JobStatus::Completed);
    assert_eq!(done.result, Some(b"ok".to_vec()));
}

#[tokio::test]
async fn retryable_error_requeues_with_backoff_until_max_retries_exhausted() {
    let (dispatcher, store, clock) = dispatcher();
    let agent_id = put_ready_agent(&store, "worker-1").await;
    let mut request = JobRequest::new("build");
    request.max_retries = 1;
    let job = dispatcher.submit(request).await.unwrap();
    dispatcher.try_dispatch().await.unwrap();
    dispatcher.on_ack(&job.id, &agent_id).await.unwrap();
    dispatcher.on_start(&job.id).await.unwrap();

    dispatcher.on_error(&job.id, "E_TRANSIENT", "timed out talking to upstream", true).await.unwrap();
    let retried = dispatcher.get(&job.id).await.unwrap();
    assert_eq!(retried.status, JobStatus::Pending);
    assert_eq!(retried.retry_count, 1);
    assert!(retried.retry_after_ms.unwrap() > clock.epoch_ms());

    // second failure exceeds max_retries=1, so it is now terminal.
    let mut job = dispatcher.get(&job.id).await.unwrap();
    job.status = JobStatus::Running;
    job.assigned_agent_id = Some(agent_id);
    store.put_job(job).await.unwrap();
    dispatcher.on_error(&retried.id, "E_TRANSIENT", "timed out again", true).await.unwrap();
    let failed = dispatcher.get(&retried.id).await.unwrap();
    assert_eq!(failed.status, JobStatus::Failed);
    assert!(failed.error.is_some());
}

#[tokio::test]
async fn non_retryable_error_fails_immediately() {
    let (dispatcher, store, _clock) = dispatcher();
    let agent_id = put_ready_agent(&store, "worker-1").await;
    let job = dispatcher.submit(JobRequest::new("build")).await.unwrap();
    dispatcher.try_dispatch().await.unwrap();
    dispatcher.on_ack(&job.id, &agent_id).await.unwrap();
    dispatcher.on_start(&job.id).await.unwrap();

    dispatcher.on_error(&job.id, "E_BAD_INPUT", "malformed payload", false).await.unwrap();
    assert_eq!(dispatcher.get(&job.id).await.unwrap().status, JobStatus::Failed);
}

#[tokio::test]
async fn timeout_requeues_then_eventually_times_out_terminally() {
    let (dispatcher, store, _clock) = dispatcher();
    let agent_id = put_ready_agent(&store, "worker-1").await;
    let mut request = JobRequest::new("build");
    request.max_retries = 0;
    let job = dispatcher.submit(request).await.unwrap();
    dispatcher.try_dispatch().await.unwrap();
    dispatcher.on_ack(&job.id, &agent_id).await.unwrap();
    dispatcher.on_start(&job.id).await.unwrap();

    dispatcher.on_timeout(&job.id).await.unwrap();
    let after = dispatcher.get(&job.id).await.unwrap();
    assert_eq!(after.status, JobStatus::TimedOut);
    assert_eq!(after.timeout_count, 1);
}

#[tokio::test]
async fn cancelling_a_pending_job_is_immediate() {
    let (dispatcher, ..) = dispatcher();
    let job = dispatcher.submit(JobRequest::new("build")).await.unwrap();
    let cancelled = dispatcher.cancel(&job.id, Some("no longer needed".to_string())).await.unwrap();
    assert_eq!(cancelled.status, JobStatus::Cancelled);
}

#[tokio::test]
async fn cancelling_a_terminal_job_is_rejected() {
    let (dispatcher, ..) = dispatcher();
    let job = dispatcher.submit(JobRequest::new("build")).await.unwrap();
    dispatcher.cancel(&job.id, None).await.unwrap();
    assert!(dispatcher.cancel(&job.id, None).await.is_err());
}

#[tokio::test]
async fn retry_resubmits_a_terminal_job_as_a_fresh_attempt() {
    let (dispatcher, ..) = dispatcher();
    let job = dispatcher.submit(JobRequest::new("build")).await.unwrap();
    dispatcher.cancel(&job.id, None).await.unwrap();

    let retried = dispatcher.retry(&job.id).await.unwrap();
    assert_eq!(retried.id, job.id);
    assert_eq!(retried.status, JobStatus::Pending);
    assert_eq!(retried.idempotency_key, job.idempotency_key);
}

#[tokio::test]
async fn lost_agent_requeues_an_acknowledged_job_under_max_retries() {
    let (dispatcher, store, _clock) = dispatcher();
    let agent_id = put_ready_agent(&store, "worker-1").await;
    let job = dispatcher.submit(JobRequest { max_retries: 2, ..JobRequest::new("build") }).await.unwrap();
    dispatcher.try_dispatch().await.unwrap();
    dispatcher.on_ack(&job.id, &agent_id).await.unwrap();

    dispatcher.fail_inflight_for_lost_agent(&agent_id).await.unwrap();

    let after = dispatcher.get(&job.id).await.unwrap();
    assert_eq!(after.status, JobStatus::Pending);
    assert_eq!(after.retry_count, 1);
    assert!(after.assigned_agent_id.is_none());
    assert!(after.retry_after_ms.is_some());
}

#[tokio::test]
async fn lost_agent_fails_an_assigned_job_terminally_once_retries_are_exhausted() {
    let (dispatcher, store, _clock) = dispatcher();
    let agent_id = put_ready_agent(&store, "worker-1").await;
    let job = dispatcher.submit(JobRequest::new("build")).await.unwrap();
    dispatcher.try_dispatch().await.unwrap();

    dispatcher.fail_inflight_for_lost_agent(&agent_id).await.unwrap();

    let after = dispatcher.get(&job.id).await.unwrap();
    assert_eq!(after.status, JobStatus::Failed);
    assert_eq!(after.error.as_ref().map(|e| e.code.as_str()), Some("agent_lost"));
}

#[tokio::test]
async fn lost_agent_leaves_unrelated_jobs_untouched() {
    let (dispatcher, store, _clock) = dispatcher();
    let agent_id = put_ready_agent(&store, "worker-1").await;
    let other_agent_id = put_ready_agent(&store, "worker-2").await;
    let job = dispatcher.submit(JobRequest::new("build")).await.unwrap();
    dispatcher.try_dispatch().await.unwrap();
    assert_eq!(dispatcher.get(&job.id).await.unwrap().assigned_agent_id, Some(agent_id));

    dispatcher.fail_inflight_for_lost_agent(&other_agent_id).await.unwrap();

    assert_eq!(dispatcher.get(&job.id).await.unwrap().status, JobStatus::Assigned);
}
