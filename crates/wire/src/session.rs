// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Session-plane frame payloads: the agent↔server protocol carried over the
//! `kind | version | length` framing in [`crate::frame`]. One `kind` byte per
//! payload shape, matching the literal table in spec §6.

use orbitmesh_core::{AgentId, JobId};
use serde::{Deserialize, Serialize};

/// `kind` byte for each session frame payload.
pub mod kind {
    pub const HELLO: u8 = 0x01;
    pub const WELCOME: u8 = 0x02;
    pub const HEARTBEAT: u8 = 0x10;
    pub const DELIVER: u8 = 0x20;
    pub const ACK_REJECT: u8 = 0x21;
    pub const START: u8 = 0x22;
    pub const PROGRESS: u8 = 0x23;
    pub const RESULT: u8 = 0x24;
    pub const ERROR: u8 = 0x25;
    pub const CANCEL: u8 = 0x26;
    pub const STREAM_ITEM: u8 = 0x30;
}

/// agent → server: opening handshake.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Hello {
    pub agent_id: AgentId,
    pub nominal_name: String,
    #[serde(default)]
    pub capabilities: Vec<orbitmesh_core::agent::Capability>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resume_token: Option<String>,
}

/// server → agent: handshake acknowledgment.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Welcome {
    pub connection_id: orbitmesh_core::ConnectionId,
    pub server_id: String,
    pub heartbeat_interval_ms: u64,
    pub resume_token: String,
}

/// both directions: liveness + optional load sample.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Heartbeat {
    pub timestamp_ms: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cpu_pct: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mem_pct: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub active_jobs: Option<u32>,
}

/// server → agent: assign a job.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Deliver {
    pub job_id: JobId,
    pub idempotency_key: String,
    pub command: String,
    #[serde(default)]
    pub payload: Vec<u8>,
    pub priority: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_ms: Option<u64>,
    pub attempt: u32,
}

/// agent → server: accept or reject a `Deliver`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AckReject {
    pub job_id: JobId,
    pub accepted: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

/// agent → server: work has begun.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Start {
    pub job_id: JobId,
    pub started_at_ms: u64,
}

/// agent → server: progress report, does not change job status.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Progress {
    pub job_id: JobId,
    pub pct: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub step: Option<String>,
}

/// agent → server: terminal success.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct JobResult {
    pub job_id: JobId,
    pub result_bytes: Vec<u8>,
}

/// agent → server: terminal failure.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct JobError {
    pub job_id: JobId,
    pub code: String,
    pub message: String,
    pub retryable: bool,
}

/// server → agent: withdraw a previously-delivered job.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Cancel {
    pub job_id: JobId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

/// agent → server: one chunk of a streamed result.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StreamItem {
    pub job_id: JobId,
    pub seq: u64,
    pub bytes: Vec<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,
    pub is_last: bool,
}

#[cfg(test)]
#[path = "session_tests.rs"]
mod tests;
