// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The `Job` entity and its lifecycle state machine (spec §4.2).

use crate::agent::AgentId;
use serde::{Deserialize, Serialize};

crate::define_id! {
    /// Unique identifier for a job. Stable across retries: retries are new
    /// attempts of the same job, not new jobs.
    pub struct JobId("job-");
}

/// Caller-supplied (or dispatcher-generated) idempotency key, forwarded to
/// the agent so handlers can de-duplicate re-deliveries (spec invariant 6).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct IdempotencyKey(pub String);

impl IdempotencyKey {
    pub fn generate() -> Self {
        Self(crate::id::generate("idem-"))
    }
}

impl std::fmt::Display for IdempotencyKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Lifecycle status of a job. Distinct from [`crate::agent::AgentStatus::Running`];
/// see the module doc on `Agent` for why the two are never conflated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Pending,
    Assigned,
    Acknowledged,
    Running,
    Completed,
    Failed,
    TimedOut,
    Cancelled,
}

crate::simple_display! {
    JobStatus {
        JobStatus::Pending => "pending",
        JobStatus::Assigned => "assigned",
        JobStatus::Acknowledged => "acknowledged",
        JobStatus::Running => "running",
        JobStatus::Completed => "completed",
        JobStatus::Failed => "failed",
        JobStatus::TimedOut => "timed_out",
        JobStatus::Cancelled => "cancelled",
    }
}

impl JobStatus {
    /// No further transitions expected (spec invariant 2: exactly one of
    /// `result`/`error` set iff terminal).
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            JobStatus::Completed | JobStatus::Failed | JobStatus::TimedOut | JobStatus::Cancelled
        )
    }

    /// Whether the job currently occupies one of an agent's active-assignment
    /// slots (spec invariant 1).
    pub fn is_assigned_slot(&self) -> bool {
        matches!(self, JobStatus::Assigned | JobStatus::Acknowledged | JobStatus::Running)
    }
}

/// The outcome of a terminated job: exactly one of these is present once
/// `status.is_terminal()` (spec invariant 2).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobError {
    pub code: String,
    pub message: String,
    pub retryable: bool,
}

/// Progress report from the agent; does not change `status` (spec §4.2).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobProgress {
    pub pct: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub step: Option<String>,
}

/// A client's request to submit a job (spec §4.2 Submission).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobRequest {
    pub command: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,
    #[serde(default)]
    pub required_capabilities: Vec<String>,
    #[serde(default = "default_priority")]
    pub priority: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_ms: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_agent_id: Option<AgentId>,
    #[serde(default)]
    pub payload: Vec<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub idempotency_key: Option<IdempotencyKey>,
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
}

fn default_priority() -> u8 {
    5
}

fn default_max_retries() -> u32 {
    0
}

impl JobRequest {
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            pattern: None,
            required_capabilities: Vec::new(),
            priority: default_priority(),
            timeout_ms: None,
            target_agent_id: None,
            payload: Vec::new(),
            idempotency_key: None,
            max_retries: default_max_retries(),
        }
    }
}

crate::setters! {
    JobRequest {
        pattern: Option<String>,
        timeout_ms: Option<u64>,
        target_agent_id: Option<AgentId>,
    }
}

/// One job and its full lifecycle state (spec §3 data model).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Job {
    pub id: JobId,
    pub idempotency_key: IdempotencyKey,
    pub command: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,
    #[serde(default)]
    pub required_capabilities: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_agent_id: Option<AgentId>,
    pub priority: u8,
    #[serde(default)]
    pub payload: Vec<u8>,
    pub created_at_ms: u64,
    pub status: JobStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assigned_agent_id: Option<AgentId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assigned_at_ms: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub started_at_ms: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at_ms: Option<u64>,
    /// Attempt number, 0 on first submission. Retries increment this and
    /// redeliver under the *same* `idempotency_key` and `id` (spec glossary).
    #[serde(default)]
    pub retry_count: u32,
    #[serde(default)]
    pub timeout_count: u32,
    pub max_retries: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_ms: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_progress: Option<JobProgress>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<Vec<u8>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<JobError>,
    /// Set on a retryable failure; the job is not in the ready set again
    /// until this time (spec §4.2 "Ready set and fairness", "Retry backoff").
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retry_after_ms: Option<u64>,
}

impl Job {
    pub fn from_request(request: JobRequest, now_ms: u64) -> Self {
        Self {
            id: JobId::generate(),
            idempotency_key: request.idempotency_key.unwrap_or_else(IdempotencyKey::generate),
            command: request.command,
            pattern: request.pattern,
            required_capabilities: request.required_capabilities,
            target_agent_id: request.target_agent_id,
            priority: request.priority.clamp(1, 10),
            payload: request.payload,
            created_at_ms: now_ms,
            status: JobStatus::Pending,
            assigned_agent_id: None,
            assigned_at_ms: None,
            started_at_ms: None,
            completed_at_ms: None,
            retry_count: 0,
            timeout_count: 0,
            max_retries: request.max_retries,
            timeout_ms: request.timeout_ms,
            last_progress: None,
            result: None,
            error: None,
            retry_after_ms: None,
        }
    }

    /// The §4.2 ready-set ordering key: `(priority desc, createdAt asc, jobId asc)`.
    pub fn ready_sort_key(&self) -> (std::cmp::Reverse<u8>, u64, String) {
        (std::cmp::Reverse(self.priority), self.created_at_ms, self.id.to_string())
    }
}

crate::builder! {
    pub struct JobBuilder => Job {
        into {
            command: String = "noop",
        }
        set {
            id: JobId = JobId::generate(),
            idempotency_key: IdempotencyKey = IdempotencyKey::generate(),
            pattern: Option<String> = None,
            required_capabilities: Vec<String> = Vec::new(),
            target_agent_id: Option<AgentId> = None,
            priority: u8 = 5,
            payload: Vec<u8> = Vec::new(),
            created_at_ms: u64 = 0,
            status: JobStatus = JobStatus::Pending,
            assigned_agent_id: Option<AgentId> = None,
            assigned_at_ms: Option<u64> = None,
            started_at_ms: Option<u64> = None,
            completed_at_ms: Option<u64> = None,
            retry_count: u32 = 0,
            timeout_count: u32 = 0,
            max_retries: u32 = 0,
            timeout_ms: Option<u64> = None,
            last_progress: Option<JobProgress> = None,
            result: Option<Vec<u8>> = None,
            error: Option<JobError> = None,
            retry_after_ms: Option<u64> = None,
        }
        option {
        }
    }
}

#[cfg(test)]
#[path = "job_tests.rs"]
mod tests;
