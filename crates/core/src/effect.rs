// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Side effects produced by the dispatcher and workflow engine as they react
//! to events. Separating "what changed" (an [`crate::Event`]) from "what to
//! do about it" (an `Effect`) keeps the state machines pure and makes every
//! side effect uniformly loggable before it runs.

use crate::agent::AgentId;
use crate::event::Event;
use crate::job::{Job, JobId};
use crate::timer::TimerId;

/// A side effect to execute after a state transition commits.
#[derive(Debug, Clone)]
pub enum Effect {
    /// Publish a domain event on the [`crate::EventBus`] placeholder.
    Publish(Event),
    /// Send `Deliver{job}` on the agent's session (spec §4.2 Assignment protocol).
    DeliverJob { agent_id: AgentId, job: Job, attempt: u32 },
    /// Send `Cancel{jobId}` on the agent's session (spec §4.2 Cancellation/Timeouts).
    SendCancel { agent_id: AgentId, job_id: JobId, reason: Option<String> },
    /// Arm a timer; fires a reaction through the owning component's mailbox.
    SetTimer { timer_id: TimerId, duration_ms: u64 },
    /// Disarm a previously-armed timer. A no-op if it already fired.
    CancelTimer { timer_id: TimerId },
    /// Outbound notification for a workflow `Notify` step (spec §4.3).
    Notify { target: String, message: String },
}

impl Effect {
    /// Stable name for structured logging, independent of field contents.
    pub fn name(&self) -> &'static str {
        match self {
            Effect::Publish(_) => "publish",
            Effect::DeliverJob { .. } => "deliver_job",
            Effect::SendCancel { .. } => "send_cancel",
            Effect::SetTimer { .. } => "set_timer",
            Effect::CancelTimer { .. } => "cancel_timer",
            Effect::Notify { .. } => "notify",
        }
    }

    /// Key/value pairs for `tracing` fields, logged before the effect runs.
    pub fn fields(&self) -> Vec<(&'static str, String)> {
        match self {
            Effect::Publish(event) => vec![("topic", event.topic().to_string())],
            Effect::DeliverJob { agent_id, job, attempt } => vec![
                ("agent_id", agent_id.to_string()),
                ("job_id", job.id.to_string()),
                ("attempt", attempt.to_string()),
            ],
            Effect::SendCancel { agent_id, job_id, .. } => {
                vec![("agent_id", agent_id.to_string()), ("job_id", job_id.to_string())]
            }
            Effect::SetTimer { timer_id, duration_ms } => {
                vec![("timer_id", timer_id.to_string()), ("duration_ms", duration_ms.to_string())]
            }
            Effect::CancelTimer { timer_id } => vec![("timer_id", timer_id.to_string())],
            Effect::Notify { target, .. } => vec![("target", target.clone())],
        }
    }
}

#[cfg(test)]
#[path = "effect_tests.rs"]
mod tests;
