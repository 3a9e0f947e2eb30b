// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The domain event sum, fanned out by the [`crate::EventBus`] placeholder
//! (the bus itself lives in `orbitmesh-engine`; this is only the wire shape
//! of what it carries). Every event carries enough detail to reconstruct the
//! failure it reports (spec §7).

use crate::agent::AgentId;
use crate::job::{IdempotencyKey, JobError, JobId, JobProgress};
use crate::session::ConnectionId;
use crate::workflow::{InstanceId, StepId, WorkflowId};
use serde::{Deserialize, Serialize};

/// A domain event. Tagged by `type` so events serialize self-describingly
/// (matches the lineage's event-sourcing convention of one closed enum with
/// per-variant `#[serde(rename)]`).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Event {
    #[serde(rename = "agent:connected")]
    AgentConnected { agent_id: AgentId, connection_id: ConnectionId },
    #[serde(rename = "agent:ready")]
    AgentReady { agent_id: AgentId },
    #[serde(rename = "agent:disconnected")]
    AgentDisconnected { agent_id: AgentId, reason: String },
    #[serde(rename = "agent:paused")]
    AgentPaused { agent_id: AgentId },
    #[serde(rename = "agent:resumed")]
    AgentResumed { agent_id: AgentId },
    #[serde(rename = "agent:stopping")]
    AgentStopping { agent_id: AgentId },
    #[serde(rename = "agent:stopped")]
    AgentStopped { agent_id: AgentId },
    #[serde(rename = "agent:capabilities_updated")]
    AgentCapabilitiesUpdated { agent_id: AgentId },
    #[serde(rename = "agent:protocol_error")]
    AgentProtocolError { agent_id: AgentId, detail: String },

    #[serde(rename = "job:submitted")]
    JobSubmitted { job_id: JobId, idempotency_key: IdempotencyKey, priority: u8 },
    #[serde(rename = "job:assigned")]
    JobAssigned { job_id: JobId, agent_id: AgentId, attempt: u32 },
    #[serde(rename = "job:acknowledged")]
    JobAcknowledged { job_id: JobId, agent_id: AgentId },
    #[serde(rename = "job:rejected")]
    JobRejected { job_id: JobId, agent_id: AgentId, reason: String },
    #[serde(rename = "job:started")]
    JobStarted { job_id: JobId, agent_id: AgentId },
    #[serde(rename = "job:progress")]
    JobProgressed { job_id: JobId, progress: JobProgress },
    #[serde(rename = "job:completed")]
    JobCompleted { job_id: JobId, agent_id: AgentId },
    #[serde(rename = "job:failed")]
    JobFailed { job_id: JobId, error: JobError, retry_count: u32, will_retry: bool },
    #[serde(rename = "job:timed_out")]
    JobTimedOut { job_id: JobId, agent_id: AgentId, timeout_count: u32, will_retry: bool },
    #[serde(rename = "job:retried")]
    JobRetried { job_id: JobId, retry_count: u32, delay_ms: u64 },
    #[serde(rename = "job:cancelled")]
    JobCancelled { job_id: JobId, reason: Option<String> },

    #[serde(rename = "workflow:instance_started")]
    WorkflowInstanceStarted { instance_id: InstanceId, workflow_id: WorkflowId },
    #[serde(rename = "workflow:step_started")]
    WorkflowStepStarted { instance_id: InstanceId, step_id: StepId },
    #[serde(rename = "workflow:step_completed")]
    WorkflowStepCompleted { instance_id: InstanceId, step_id: StepId },
    #[serde(rename = "workflow:step_failed")]
    WorkflowStepFailed { instance_id: InstanceId, step_id: StepId, error: String },
    #[serde(rename = "workflow:step_skipped")]
    WorkflowStepSkipped { instance_id: InstanceId, step_id: StepId },
    #[serde(rename = "workflow:instance_paused")]
    WorkflowInstancePaused { instance_id: InstanceId },
    #[serde(rename = "workflow:instance_resumed")]
    WorkflowInstanceResumed { instance_id: InstanceId },
    #[serde(rename = "workflow:instance_completed")]
    WorkflowInstanceCompleted { instance_id: InstanceId },
    #[serde(rename = "workflow:instance_failed")]
    WorkflowInstanceFailed { instance_id: InstanceId, error: String },
    #[serde(rename = "workflow:instance_cancelled")]
    WorkflowInstanceCancelled { instance_id: InstanceId },
    #[serde(rename = "workflow:signal_received")]
    WorkflowSignalReceived { instance_id: InstanceId, event_type: String },

    #[serde(rename = "bus:subscriber_lagged")]
    SubscriberLagged { subscriber: String, dropped: u64 },

    /// Forward-compat catch-all: unknown event types deserialize here rather
    /// than failing the whole frame.
    #[serde(other)]
    Unknown,
}

impl Event {
    /// The topic key used for [`crate::EventBus`] subscriptions (e.g. `"job"`,
    /// `"agent"`, `"workflow"`, `"bus"`).
    pub fn topic(&self) -> &'static str {
        match self {
            Event::AgentConnected { .. }
            | Event::AgentReady { .. }
            | Event::AgentDisconnected { .. }
            | Event::AgentPaused { .. }
            | Event::AgentResumed { .. }
            | Event::AgentStopping { .. }
            | Event::AgentStopped { .. }
            | Event::AgentCapabilitiesUpdated { .. }
            | Event::AgentProtocolError { .. } => "agent",

            Event::JobSubmitted { .. }
            | Event::JobAssigned { .. }
            | Event::JobAcknowledged { .. }
            | Event::JobRejected { .. }
            | Event::JobStarted { .. }
            | Event::JobProgressed { .. }
            | Event::JobCompleted { .. }
            | Event::JobFailed { .. }
            | Event::JobTimedOut { .. }
            | Event::JobRetried { .. }
            | Event::JobCancelled { .. } => "job",

            Event::WorkflowInstanceStarted { .. }
            | Event::WorkflowStepStarted { .. }
            | Event::WorkflowStepCompleted { .. }
            | Event::WorkflowStepFailed { .. }
            | Event::WorkflowStepSkipped { .. }
            | Event::WorkflowInstancePaused { .. }
            | Event::WorkflowInstanceResumed { .. }
            | Event::WorkflowInstanceCompleted { .. }
            | Event::WorkflowInstanceFailed { .. }
            | Event::WorkflowInstanceCancelled { .. }
            | Event::WorkflowSignalReceived { .. } => "workflow",

            Event::SubscriberLagged { .. } | Event::Unknown => "bus",
        }
    }
}

#[cfg(test)]
#[path = "event_tests.rs"]
mod tests;
