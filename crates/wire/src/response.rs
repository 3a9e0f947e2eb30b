// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Administrative control-plane responses (spec §6), the counterpart to
//! [`crate::request::Request`].

use orbitmesh_core::{Agent, Decision, Event, Job, WorkflowDefinition, WorkflowInstance};
use serde::{Deserialize, Serialize};

/// A response returned by the server to an administrative client.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Response {
    Ok,
    Pong,
    Hello { version: String },
    ShuttingDown,

    Agent { agent: Option<Box<Agent>> },
    Agents { agents: Vec<Agent> },

    Job { job: Option<Box<Job>> },
    Jobs { jobs: Vec<Job>, total: u64, page: u32, page_size: u32 },

    WorkflowDefinition { definition: Option<Box<WorkflowDefinition>> },
    WorkflowDefinitions { definitions: Vec<WorkflowDefinition> },
    WorkflowInstance { instance: Option<Box<WorkflowInstance>> },

    Decision { decision: Option<Box<Decision>> },
    Decisions { decisions: Vec<Decision> },

    Event { event: Event },

    /// Structured error, carrying the same tag as [`orbitmesh_core::OrbitError::tag`].
    Error { tag: String, message: String },
}

impl From<orbitmesh_core::OrbitError> for Response {
    fn from(err: orbitmesh_core::OrbitError) -> Self {
        Response::Error { tag: err.tag().to_string(), message: err.to_string() }
    }
}

#[cfg(test)]
#[path = "response_tests.rs"]
mod tests;
