// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Administrative control-plane requests (spec §6), framed identically to
//! session frames but served on a separate listener.

use orbitmesh_core::{AgentId, DecisionId, InstanceId, JobId, JobRequest, WorkflowDefinition, WorkflowId};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A request issued by an administrative client (the `orbitmesh` CLI, or any
/// other control-plane caller) to the server.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Request {
    Ping,
    Hello { version: String },

    AgentsList { group: Option<String>, status: Option<String> },
    AgentGet { agent_id: AgentId },
    AgentPause { agent_id: AgentId },
    AgentResume { agent_id: AgentId },
    AgentStop { agent_id: AgentId },
    AgentRemove { agent_id: AgentId },
    AgentUpdateCapabilities { agent_id: AgentId, capabilities: Vec<orbitmesh_core::agent::Capability> },

    JobSubmit { request: JobRequest },
    JobGet { job_id: JobId },
    JobCancel { job_id: JobId, reason: Option<String> },
    JobRetry { job_id: JobId },
    JobsList {
        status: Option<String>,
        agent_id: Option<AgentId>,
        command: Option<String>,
        page_size: u32,
        page: u32,
    },

    WorkflowDefine { definition: WorkflowDefinition },
    WorkflowGet { workflow_id: WorkflowId },
    WorkflowDelete { workflow_id: WorkflowId },
    WorkflowsList,
    WorkflowStart { workflow_id: WorkflowId, input: HashMap<String, serde_json::Value> },
    WorkflowInstanceGet { instance_id: InstanceId },
    WorkflowInstanceCancel { instance_id: InstanceId, reason: Option<String> },
    WorkflowInstanceSignal {
        instance_id: InstanceId,
        event_type: String,
        correlation_key: Option<String>,
        payload: serde_json::Value,
    },

    DecisionGet { decision_id: DecisionId },
    DecisionsList,
    DecisionResolve { decision_id: DecisionId, chosen_label: String },

    EventsSubscribe { topic_filter: Option<String> },

    Shutdown { drain_timeout_ms: Option<u64> },
}

#[cfg(test)]
#[path = "request_tests.rs"]
mod tests;
