// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The `Agent` entity: a remote worker process tracked by the registry.

use crate::session::ConnectionId;
use serde::{Deserialize, Serialize};

crate::define_id! {
    /// Unique, stable identifier for an agent. Opaque to the core.
    pub struct AgentId("agt-");
}

/// A single named, versioned skill an agent advertises.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Capability {
    pub name: String,
    pub version: String,
    #[serde(default)]
    pub props: std::collections::BTreeMap<String, String>,
}

impl Capability {
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self { name: name.into(), version: version.into(), props: Default::default() }
    }
}

/// Lifecycle status of an agent in the registry.
///
/// Distinct from [`crate::job::JobStatus::Running`] — this `Running` means
/// "the agent has at least one active assignment", not a job-level concept.
/// Kept deliberately unconflated per the source's ambiguity on this point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentStatus {
    Created,
    Initializing,
    Ready,
    Running,
    Paused,
    Stopping,
    Stopped,
    Disconnected,
    Faulted,
}

crate::simple_display! {
    AgentStatus {
        AgentStatus::Created => "created",
        AgentStatus::Initializing => "initializing",
        AgentStatus::Ready => "ready",
        AgentStatus::Running => "running",
        AgentStatus::Paused => "paused",
        AgentStatus::Stopping => "stopping",
        AgentStatus::Stopped => "stopped",
        AgentStatus::Disconnected => "disconnected",
        AgentStatus::Faulted => "faulted",
    }
}

impl AgentStatus {
    /// Whether the dispatcher may select this agent for new work (§4.2(i)).
    pub fn is_selectable(&self) -> bool {
        matches!(self, AgentStatus::Ready | AgentStatus::Running)
    }
}

/// A registered agent and its current reachability state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Agent {
    pub id: AgentId,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub capabilities: Vec<Capability>,
    pub status: AgentStatus,
    pub last_heartbeat_ms: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub active_connection_id: Option<ConnectionId>,
    /// Count of jobs currently `Assigned`/`Acknowledged`/`Running` on this agent.
    /// Maintained by the dispatcher; used for load-balanced selection (§4.2).
    #[serde(default)]
    pub active_assignments: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_assignment_completed_at_ms: Option<u64>,
}

impl Agent {
    pub fn new(id: AgentId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            group: None,
            tags: Vec::new(),
            capabilities: Vec::new(),
            status: AgentStatus::Created,
            last_heartbeat_ms: 0,
            active_connection_id: None,
            active_assignments: 0,
            last_assignment_completed_at_ms: None,
        }
    }

    pub fn has_capability(&self, name: &str) -> bool {
        self.capabilities.iter().any(|c| c.name == name)
    }

    pub fn has_all_capabilities(&self, required: &[String]) -> bool {
        required.iter().all(|name| self.has_capability(name))
    }
}

crate::builder! {
    pub struct AgentBuilder => Agent {
        into {
            name: String = "worker-1",
        }
        set {
            id: AgentId = AgentId::generate(),
            group: Option<String> = None,
            tags: Vec<String> = Vec::new(),
            capabilities: Vec<Capability> = Vec::new(),
            status: AgentStatus = AgentStatus::Ready,
            last_heartbeat_ms: u64 = 0,
            active_connection_id: Option<ConnectionId> = None,
            active_assignments: u32 = 0,
            last_assignment_completed_at_ms: Option<u64> = None,
        }
        option {
        }
    }
}

#[cfg(test)]
#[path = "agent_tests.rs"]
mod tests;
