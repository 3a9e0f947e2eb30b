// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Human-in-the-loop decisions backing the workflow `Approval` step
//! (SPEC_FULL §10.7 — a supplemental feature grounded on the lineage's
//! decision/approval handling, not detailed by the distilled spec).

use crate::workflow::{InstanceId, StepId};
use serde::{Deserialize, Serialize};

crate::define_id! {
    /// Unique identifier for a decision awaiting (or resolved by) a human.
    pub struct DecisionId("dcn-");
}

/// A single option the operator can choose.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecisionOption {
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl DecisionOption {
    pub fn new(label: impl Into<String>) -> Self {
        Self { label: label.into(), description: None }
    }
}

/// A decision created by an `Approval` step, resolved through the same
/// `Signal` mechanism as `WaitForEvent` (spec §4.3).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Decision {
    pub id: DecisionId,
    pub instance_id: InstanceId,
    pub step_id: StepId,
    pub prompt: String,
    #[serde(default)]
    pub options: Vec<DecisionOption>,
    pub created_at_ms: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resolved_at_ms: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chosen_label: Option<String>,
}

impl Decision {
    pub fn new(
        instance_id: InstanceId,
        step_id: StepId,
        prompt: impl Into<String>,
        options: Vec<DecisionOption>,
        now_ms: u64,
    ) -> Self {
        Self {
            id: DecisionId::generate(),
            instance_id,
            step_id,
            prompt: prompt.into(),
            options,
            created_at_ms: now_ms,
            resolved_at_ms: None,
            chosen_label: None,
        }
    }

    pub fn is_resolved(&self) -> bool {
        self.resolved_at_ms.is_some()
    }
}

#[cfg(test)]
#[path = "decision_tests.rs"]
mod tests;
