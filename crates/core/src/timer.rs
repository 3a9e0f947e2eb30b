// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! String-encoded timer identifiers for every named timeout in the spec
//! (`T_ack`, `T_cancel`, `H_timeout`, job `timeout`, retry backoff, workflow
//! `Delay`/`timeout`). Encoding the kind and owner into one string lets a
//! single timer wheel key on `TimerId` without a side table.

use std::fmt;

/// What a timer is for, parameterized by the owning entity's id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TimerKind<'a> {
    /// §4.2: time allowed for `Ack` after `Deliver`.
    Ack { job_id: &'a str, attempt: u32 },
    /// §4.2: time allowed for the agent to honor a `Cancel`.
    Cancel { job_id: &'a str },
    /// §4.1: time allowed without any frame before the session is dead.
    Heartbeat { agent_id: &'a str, connection_id: &'a str },
    /// §4.2: the job's own `timeout` field, counted from `startedAt`.
    JobTimeout { job_id: &'a str },
    /// §4.2: retry backoff delay before a job becomes ready again.
    RetryBackoff { job_id: &'a str },
    /// §4.3: a `Delay` step's `duration`.
    StepDelay { instance_id: &'a str, step_id: &'a str },
    /// §4.3: a `WaitForEvent`/`Approval` step's `timeout`.
    StepWait { instance_id: &'a str, step_id: &'a str },
    /// §4.3: the workflow-level `timeout`.
    WorkflowTimeout { instance_id: &'a str },
}

impl<'a> TimerKind<'a> {
    pub fn to_timer_id(&self) -> String {
        match self {
            TimerKind::Ack { job_id, attempt } => format!("ack:{job_id}:{attempt}"),
            TimerKind::Cancel { job_id } => format!("cancel:{job_id}"),
            TimerKind::Heartbeat { agent_id, connection_id } => {
                format!("heartbeat:{agent_id}:{connection_id}")
            }
            TimerKind::JobTimeout { job_id } => format!("job_timeout:{job_id}"),
            TimerKind::RetryBackoff { job_id } => format!("retry_backoff:{job_id}"),
            TimerKind::StepDelay { instance_id, step_id } => {
                format!("step_delay:{instance_id}:{step_id}")
            }
            TimerKind::StepWait { instance_id, step_id } => {
                format!("step_wait:{instance_id}:{step_id}")
            }
            TimerKind::WorkflowTimeout { instance_id } => format!("workflow_timeout:{instance_id}"),
        }
    }
}

impl fmt::Display for TimerKind<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_timer_id())
    }
}

/// A timer's string id, as handed to `SetTimer`/`CancelTimer` effects and
/// echoed back when the timer fires.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TimerId(pub String);

impl fmt::Display for TimerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<TimerKind<'_>> for TimerId {
    fn from(kind: TimerKind<'_>) -> Self {
        TimerId(kind.to_timer_id())
    }
}

#[cfg(test)]
#[path = "timer_tests.rs"]
mod tests;
