// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The `Session` entity: one live duplex channel between the server and a
//! specific agent instance.

use crate::agent::AgentId;
use serde::{Deserialize, Serialize};

crate::define_id! {
    /// Identifies one connection attempt. A reconnecting agent gets a new
    /// `ConnectionId` even though its `AgentId` and `resumeToken` carry over.
    pub struct ConnectionId("cnx-");
}

/// Opaque token presented on reconnect to claim continuity with a prior
/// session (inflight job replay, §4.1 step 4).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResumeToken(pub String);

impl ResumeToken {
    pub fn generate() -> Self {
        Self(crate::id::generate("rtk-"))
    }
}

impl std::fmt::Display for ResumeToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Status of a session from the registry's point of view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    /// Currently the agent's one live channel.
    Active,
    /// Superseded by a newer connection from the same agent; draining.
    Superseded,
    /// Closed (drained, timed out, or the agent disconnected).
    Closed,
}

/// One duplex channel instance, exclusively owned by one agent (§3).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub connection_id: ConnectionId,
    pub agent_id: AgentId,
    pub remote_addr: String,
    pub opened_at_ms: u64,
    pub last_seen_ms: u64,
    pub resume_token: ResumeToken,
    pub status: SessionStatus,
}

impl Session {
    pub fn new(agent_id: AgentId, remote_addr: impl Into<String>, now_ms: u64) -> Self {
        Self {
            connection_id: ConnectionId::generate(),
            agent_id,
            remote_addr: remote_addr.into(),
            opened_at_ms: now_ms,
            last_seen_ms: now_ms,
            resume_token: ResumeToken::generate(),
            status: SessionStatus::Active,
        }
    }
}

#[cfg(test)]
#[path = "session_tests.rs"]
mod tests;
