// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The live map from a connected agent to its session's outbound frame
//! channel. The dispatcher and workflow engine know nothing about sockets;
//! this is the seam where a `Deliver`/`Cancel` decision becomes bytes on a
//! wire (spec §4.2 "Assignment protocol").

use orbitmesh_core::AgentId;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::mpsc;

#[derive(Clone, Default)]
pub struct Connections {
    inner: Arc<Mutex<HashMap<AgentId, mpsc::UnboundedSender<Vec<u8>>>>>,
}

impl Connections {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the outbound channel for a freshly-connected agent. A prior
    /// entry for the same id is dropped, which closes its writer task.
    pub fn register(&self, agent_id: AgentId, sender: mpsc::UnboundedSender<Vec<u8>>) {
        self.inner.lock().insert(agent_id, sender);
    }

    pub fn remove(&self, agent_id: &AgentId) {
        self.inner.lock().remove(agent_id);
    }

    /// Best-effort send of a pre-encoded frame. Returns `false` if the agent
    /// has no live connection (disconnected since the decision was made).
    pub fn send(&self, agent_id: &AgentId, frame: Vec<u8>) -> bool {
        match self.inner.lock().get(agent_id) {
            Some(sender) => sender.send(frame).is_ok(),
            None => false,
        }
    }

    pub fn is_connected(&self, agent_id: &AgentId) -> bool {
        self.inner.lock().contains_key(agent_id)
    }
}

#[cfg(test)]
#[path = "connections_tests.rs"]
mod tests;
