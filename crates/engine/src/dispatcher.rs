// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Job Dispatcher & Scheduler (spec §4.2): moves jobs through their lifecycle
//! and chooses which agent gets which job. Selection and transitions happen
//! in-memory and are durably persisted before the corresponding event is
//! published (spec §6); the caller executes the returned [`Effect`]s (a
//! `Deliver`/`Cancel` send) the same way the lineage's runtime executes
//! effects from its own engine.

use orbitmesh_core::{
    Agent, AgentId, AgentStatus, Clock, EntityKind, Event, Job, JobError, JobId, JobProgress,
    JobRequest, JobStatus, OrbitError, Result,
};
use orbitmesh_store::{JobFilter, Store};
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use crate::event_bus::EventBus;
use crate::pattern::AgentPattern;

pub const DEFAULT_ACK_TIMEOUT_MS: u64 = 5_000;
pub const DEFAULT_CANCEL_TIMEOUT_MS: u64 = 5_000;
pub const DEFAULT_RETRY_BASE_MS: u64 = 1_000;
pub const DEFAULT_RETRY_MAX_BACKOFF_MS: u64 = 60_000;

/// `delay = base * 2^(retryCount-1)`, capped at `max_backoff_ms`, jittered
/// +/-20% (spec §4.2 "Retry backoff"). `jitter` is a caller-supplied value in
/// `[-1.0, 1.0]` so the computation stays deterministic under test.
pub fn retry_backoff_ms(retry_count: u32, base_ms: u64, max_backoff_ms: u64, jitter: f64) -> u64 {
    let exp = retry_count.saturating_sub(1).min(32);
    let raw = base_ms.saturating_mul(1u64 << exp).min(max_backoff_ms);
    let jitter = jitter.clamp(-1.0, 1.0) * 0.2;
    ((raw as f64) * (1.0 + jitter)).round().max(0.0) as u64
}

pub struct Dispatcher<C: Clock> {
    store: Arc<dyn Store>,
    bus: Arc<EventBus>,
    clock: C,
    ack_timeout_ms: u64,
    cancel_timeout_ms: u64,
    retry_base_ms: u64,
    retry_max_backoff_ms: u64,
    /// Agents excluded from selecting a given job for the remainder of the
    /// current selection round, after a `Reject` (spec §4.2 "Assignment
    /// protocol"). Cleared once the job is reassigned elsewhere or completes.
    round_blacklist: Mutex<HashMap<JobId, HashSet<AgentId>>>,
}

impl<C: Clock> Dispatcher<C> {
    pub fn new(store: Arc<dyn Store>, bus: Arc<EventBus>, clock: C) -> Self {
        Self {
            store,
            bus,
            clock,
            ack_timeout_ms: DEFAULT_ACK_TIMEOUT_MS,
            cancel_timeout_ms: DEFAULT_CANCEL_TIMEOUT_MS,
            retry_base_ms: DEFAULT_RETRY_BASE_MS,
            retry_max_backoff_ms: DEFAULT_RETRY_MAX_BACKOFF_MS,
            round_blacklist: Mutex::new(HashMap::new()),
        }
    }

    pub fn with_timeouts(
        mut self,
        ack_timeout_ms: u64,
        cancel_timeout_ms: u64,
        retry_base_ms: u64,
        retry_max_backoff_ms: u64,
    ) -> Self {
        self.ack_timeout_ms = ack_timeout_ms;
        self.cancel_timeout_ms = cancel_timeout_ms;
        self.retry_base_ms = retry_base_ms;
        self.retry_max_backoff_ms = retry_max_backoff_ms;
        self
    }

    /// Submit a job request durably in `Pending` (spec §4.2 "Submission").
    pub async fn submit(&self, request: JobRequest) -> Result<Job> {
        let now = self.clock.epoch_ms();
        let job = Job::from_request(request, now);
        self.store.put_job(job.clone()).await?;
        self.bus.publish(Event::JobSubmitted {
            job_id: job.id,
            idempotency_key: job.idempotency_key.clone(),
            priority: job.priority,
        });
        Ok(job)
    }

    pub async fn get(&self, job_id: &JobId) -> Result<Job> {
        self.store
            .get_job(job_id)
            .await?
            .ok_or_else(|| OrbitError::not_found(EntityKind::Job, job_id.to_string()))
    }

    pub async fn list(&self, filter: JobFilter) -> Result<orbitmesh_store::Page<Job>> {
        self.store.list_jobs(filter).await
    }

    /// Advance the ready set: assign as many ready jobs to eligible agents as
    /// possible (spec §4.2 "Ready set and fairness", "Agent selection").
    /// Called on `AgentReady`/`AgentCapabilitiesUpdated`/job-completion
    /// events rather than polled.
    pub async fn try_dispatch(&self) -> Result<Vec<Job>> {
        let now = self.clock.epoch_ms();
        let mut ready: Vec<Job> = self
            .store
            .list_ready_jobs()
            .await?
            .into_iter()
            .filter(|j| j.status == JobStatus::Pending)
            .filter(|j| j.retry_after_ms.map(|at| at <= now).unwrap_or(true))
            .collect();
        ready.sort_by_key(|j| j.ready_sort_key());

        let mut agents = self.store.list_agents().await?;
        let mut assigned = Vec::new();

        for job in ready.iter_mut() {
            let excluded = self.round_blacklist.lock().get(&job.id).cloned().unwrap_or_default();
            let Some(agent) = select_agent(&agents, job, &excluded) else { continue };
            self.assign(job, &agent).await?;
            if let Some(a) = agents.iter_mut().find(|a| a.id == agent.id) {
                a.active_assignments += 1;
            }
            assigned.push(job.clone());
        }
        Ok(assigned)
    }

    async fn assign(&self, job: &mut Job, agent: &Agent) -> Result<()> {
        let now = self.clock.epoch_ms();
        let agent_id = agent.id;
        job.status = JobStatus::Assigned;
        job.assigned_agent_id = Some(agent_id);
        job.assigned_at_ms = Some(now);
        self.store.put_job(job.clone()).await?;
        let mut agent = agent.clone();
        agent.active_assignments += 1;
        if agent.status == AgentStatus::Ready {
            agent.status = AgentStatus::Running;
        }
        self.store.put_agent(agent).await?;
        self.bus.publish(Event::JobAssigned { job_id: job.id, agent_id, attempt: job.retry_count });
        self.round_blacklist.lock().remove(&job.id);
        Ok(())
    }

    /// Decrement the outgoing agent's load once a job it held leaves
    /// `Assigned/Acknowledged/Running` for any terminal status (spec §4.2
    /// "Agent selection" load accounting, maintained here since the
    /// dispatcher is the only writer of `active_assignments`). Drops the
    /// agent back to `Ready` once its last active assignment clears; an
    /// agent `Paused`/`Stopping` keeps that status regardless of load.
    async fn release_agent(&self, agent_id: &AgentId) -> Result<()> {
        if let Some(mut agent) = self.store.get_agent(agent_id).await? {
            agent.active_assignments = agent.active_assignments.saturating_sub(1);
            agent.last_assignment_completed_at_ms = Some(self.clock.epoch_ms());
            if agent.status == AgentStatus::Running && agent.active_assignments == 0 {
                agent.status = AgentStatus::Ready;
            }
            self.store.put_agent(agent).await?;
        }
        Ok(())
    }

    pub async fn on_ack(&self, job_id: &JobId, agent_id: &AgentId) -> Result<()> {
        let mut job = self.transitioning(job_id, JobStatus::Assigned).await?;
        job.status = JobStatus::Acknowledged;
        self.store.put_job(job).await?;
        self.bus.publish(Event::JobAcknowledged { job_id: *job_id, agent_id: *agent_id });
        Ok(())
    }

    /// `Reject{reason}`: back to `Pending`, blacklist this agent for one
    /// selection round (spec §4.2).
    pub async fn on_reject(&self, job_id: &JobId, agent_id: &AgentId, reason: &str) -> Result<()> {
        let mut job = self.transitioning(job_id, JobStatus::Assigned).await?;
        job.status = JobStatus::Pending;
        job.retry_count += 1;
        job.assigned_agent_id = None;
        self.store.put_job(job).await?;
        self.release_agent(agent_id).await?;
        self.round_blacklist.lock().entry(*job_id).or_default().insert(*agent_id);
        self.bus.publish(Event::JobRejected { job_id: *job_id, agent_id: *agent_id, reason: reason.to_string() });
        Ok(())
    }

    pub async fn on_start(&self, job_id: &JobId) -> Result<()> {
        let mut job = self.transitioning(job_id, JobStatus::Acknowledged).await?;
        let agent_id = job.assigned_agent_id.ok_or_else(|| OrbitError::internal("started job has no assigned agent"))?;
        job.status = JobStatus::Running;
        job.started_at_ms = Some(self.clock.epoch_ms());
        self.store.put_job(job).await?;
        self.bus.publish(Event::JobStarted { job_id: *job_id, agent_id });
        Ok(())
    }

    pub async fn on_progress(&self, job_id: &JobId, progress: JobProgress) -> Result<()> {
        let mut job = self.get(job_id).await?;
        job.last_progress = Some(progress.clone());
        self.store.put_job(job).await?;
        self.bus.publish(Event::JobProgressed { job_id: *job_id, progress });
        Ok(())
    }

    pub async fn on_result(&self, job_id: &JobId, result: Vec<u8>) -> Result<()> {
        let mut job = self.transitioning(job_id, JobStatus::Running).await?;
        let agent_id = job.assigned_agent_id.ok_or_else(|| OrbitError::internal("completed job has no assigned agent"))?;
        job.status = JobStatus::Completed;
        job.result = Some(result);
        job.completed_at_ms = Some(self.clock.epoch_ms());
        self.store.put_job(job).await?;
        self.release_agent(&agent_id).await?;
        self.bus.publish(Event::JobCompleted { job_id: *job_id, agent_id });
        Ok(())
    }

    /// `Error{code, message, retryable}`: terminal `Failed`, or re-queued with
    /// backoff if retryable and under `maxRetries` (spec §4.2).
    pub async fn on_error(&self, job_id: &JobId, code: &str, message: &str, retryable: bool) -> Result<()> {
        let mut job = self.transitioning(job_id, JobStatus::Running).await?;
        let will_retry = retryable && job.retry_count < job.max_retries;
        if let Some(agent_id) = job.assigned_agent_id.take() {
            self.release_agent(&agent_id).await?;
        }
        if will_retry {
            job.retry_count += 1;
            let delay = retry_backoff_ms(job.retry_count, self.retry_base_ms, self.retry_max_backoff_ms, 0.0);
            job.status = JobStatus::Pending;
            job.retry_after_ms = Some(self.clock.epoch_ms() + delay);
            self.store.put_job(job).await?;
            self.bus.publish(Event::JobRetried { job_id: *job_id, retry_count: job.retry_count, delay_ms: delay });
        } else {
            job.status = JobStatus::Failed;
            job.error = Some(JobError { code: code.to_string(), message: message.to_string(), retryable });
            job.completed_at_ms = Some(self.clock.epoch_ms());
            self.store.put_job(job.clone()).await?;
        }
        self.bus.publish(Event::JobFailed {
            job_id: *job_id,
            error: JobError { code: code.to_string(), message: message.to_string(), retryable },
            retry_count: job.retry_count,
            will_retry,
        });
        Ok(())
    }

    /// `now - startedAt > timeout`: `Running -> TimedOut`, re-queued unless
    /// `timeoutCount >= maxRetries` (spec §4.2 "Timeouts").
    pub async fn on_timeout(&self, job_id: &JobId) -> Result<()> {
        let mut job = self.transitioning(job_id, JobStatus::Running).await?;
        let agent_id = job.assigned_agent_id;
        job.timeout_count += 1;
        let will_retry = job.timeout_count <= job.max_retries;
        job.assigned_agent_id = None;
        if let Some(agent_id) = agent_id {
            self.release_agent(&agent_id).await?;
        }
        if will_retry {
            job.status = JobStatus::Pending;
            let delay = retry_backoff_ms(job.timeout_count, self.retry_base_ms, self.retry_max_backoff_ms, 0.0);
            job.retry_after_ms = Some(self.clock.epoch_ms() + delay);
        } else {
            job.status = JobStatus::TimedOut;
            job.completed_at_ms = Some(self.clock.epoch_ms());
        }
        self.store.put_job(job.clone()).await?;
        if let Some(agent_id) = agent_id {
            self.bus.publish(Event::JobTimedOut { job_id: *job_id, agent_id, timeout_count: job.timeout_count, will_retry });
        }
        Ok(())
    }

    /// Legal in `Pending/Assigned/Acknowledged/Running` (spec §4.2
    /// "Cancellation"). `Pending` cancels immediately; the rest are left in
    /// place for the caller to send `Cancel` on the wire and call
    /// [`Self::confirm_cancelled`] once the agent acknowledges or
    /// `T_cancel` elapses.
    pub async fn cancel(&self, job_id: &JobId, reason: Option<String>) -> Result<Job> {
        let mut job = self.get(job_id).await?;
        if job.status.is_terminal() {
            return Err(OrbitError::conflict(format!("job {job_id} is already terminal")));
        }
        if job.status == JobStatus::Pending {
            job.status = JobStatus::Cancelled;
            job.completed_at_ms = Some(self.clock.epoch_ms());
            self.store.put_job(job.clone()).await?;
            self.bus.publish(Event::JobCancelled { job_id: *job_id, reason });
        }
        Ok(job)
    }

    pub async fn confirm_cancelled(&self, job_id: &JobId, reason: Option<String>) -> Result<()> {
        let mut job = self.get(job_id).await?;
        if job.status.is_terminal() {
            return Ok(());
        }
        if let Some(agent_id) = job.assigned_agent_id.take() {
            self.release_agent(&agent_id).await?;
        }
        job.status = JobStatus::Cancelled;
        job.completed_at_ms = Some(self.clock.epoch_ms());
        self.store.put_job(job).await?;
        self.bus.publish(Event::JobCancelled { job_id: *job_id, reason });
        Ok(())
    }

    /// An agent's session died (heartbeat timeout or dropped socket) while it
    /// still held jobs in `Assigned`/`Acknowledged` — neither status has an
    /// `Ack`/`Error` from the agent to transition on, so nothing else would
    /// ever move these jobs again. Re-queue under the same backoff/maxRetries
    /// accounting as any other retry, or fail terminally with "agent lost"
    /// once retries are exhausted (spec §4.1 "Heartbeat").
    pub async fn fail_inflight_for_lost_agent(&self, agent_id: &AgentId) -> Result<()> {
        let page = self
            .store
            .list_jobs(JobFilter { agent_id: Some(*agent_id), page_size: u32::MAX, ..Default::default() })
            .await?;
        for job in page.items {
            if matches!(job.status, JobStatus::Assigned | JobStatus::Acknowledged) {
                self.requeue_or_fail_lost_job(job).await?;
            }
        }
        Ok(())
    }

    async fn requeue_or_fail_lost_job(&self, mut job: Job) -> Result<()> {
        let job_id = job.id;
        job.assigned_agent_id = None;
        if job.retry_count < job.max_retries {
            job.retry_count += 1;
            let delay = retry_backoff_ms(job.retry_count, self.retry_base_ms, self.retry_max_backoff_ms, 0.0);
            job.status = JobStatus::Pending;
            job.retry_after_ms = Some(self.clock.epoch_ms() + delay);
            self.store.put_job(job.clone()).await?;
            self.bus.publish(Event::JobRetried { job_id, retry_count: job.retry_count, delay_ms: delay });
        } else {
            let error = JobError { code: "agent_lost".to_string(), message: "agent lost".to_string(), retryable: false };
            job.status = JobStatus::Failed;
            job.error = Some(error.clone());
            job.completed_at_ms = Some(self.clock.epoch_ms());
            self.store.put_job(job.clone()).await?;
            self.bus.publish(Event::JobFailed { job_id, error, retry_count: job.retry_count, will_retry: false });
        }
        Ok(())
    }

    /// Resubmit a terminal job as a fresh attempt under the same id and
    /// idempotency key (administrative `jobs.retry`).
    pub async fn retry(&self, job_id: &JobId) -> Result<Job> {
        let mut job = self.get(job_id).await?;
        if !job.status.is_terminal() {
            return Err(OrbitError::conflict(format!("job {job_id} is not terminal")));
        }
        job.status = JobStatus::Pending;
        job.assigned_agent_id = None;
        job.assigned_at_ms = None;
        job.started_at_ms = None;
        job.completed_at_ms = None;
        job.result = None;
        job.error = None;
        job.retry_after_ms = None;
        self.store.put_job(job.clone()).await?;
        Ok(job)
    }

    pub fn ack_timeout_ms(&self) -> u64 {
        self.ack_timeout_ms
    }

    pub fn cancel_timeout_ms(&self) -> u64 {
        self.cancel_timeout_ms
    }

    async fn transitioning(&self, job_id: &JobId, expected: JobStatus) -> Result<Job> {
        let job = self.get(job_id).await?;
        if job.status != expected {
            return Err(OrbitError::conflict(format!(
                "job {job_id} expected status {expected} but was {}",
                job.status
            )));
        }
        Ok(job)
    }
}

/// Select the best agent for `job` (spec §4.2 "Agent selection"): every
/// candidate must be selectable (`Ready` or already `Running` with spare
/// capacity), match `targetAgentId`/`pattern`, and advertise every required
/// capability; the agent with the fewest active assignments wins, ties
/// broken by earliest `lastAssignmentCompletedAt` then agentId.
fn select_agent(agents: &[Agent], job: &Job, excluded: &HashSet<AgentId>) -> Option<Agent> {
    let pattern = AgentPattern::parse(job.pattern.as_deref());
    agents
        .iter()
        .filter(|a| a.status.is_selectable())
        .filter(|a| !excluded.contains(&a.id))
        .filter(|a| job.target_agent_id.map(|target| target == a.id).unwrap_or(true))
        .filter(|a| pattern.matches(&a.name, a.group.as_deref()))
        .filter(|a| a.has_all_capabilities(&job.required_capabilities))
        .min_by(|a, b| {
            a.active_assignments
                .cmp(&b.active_assignments)
                .then(a.last_assignment_completed_at_ms.cmp(&b.last_assignment_completed_at_ms))
                .then(a.id.as_str().cmp(b.id.as_str()))
        })
        .cloned()
}

#[cfg(test)]
#[path = "dispatcher_tests.rs"]
mod tests;
