// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `WorkflowDefinition` and `WorkflowInstance`: the DAG-of-steps data model
//! driven by the workflow engine (spec §4.3).

use crate::job::JobId;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

crate::define_id! {
    /// Identifier for a workflow definition. Definitions are versioned
    /// separately (`version: u32`); the id is stable across versions.
    pub struct WorkflowId("wfd-");
}

crate::define_id! {
    /// Identifier for one concrete execution of a workflow definition.
    pub struct InstanceId("wfi-");
}

/// A step's name within its definition. User-chosen (e.g. from YAML), not
/// generated, so this is a plain string newtype rather than a `define_id!`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct StepId(pub String);

impl From<&str> for StepId {
    fn from(s: &str) -> Self {
        StepId(s.to_string())
    }
}

impl From<String> for StepId {
    fn from(s: String) -> Self {
        StepId(s)
    }
}

impl fmt::Display for StepId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The closed sum of step behaviors (spec §4.3, §9 "polymorphism over
/// step/trigger variants"). Composite kinds (`Parallel`, `Conditional`,
/// `ForEach`) reference other steps in the *same* definition by id rather
/// than embedding a nested tree, so the whole definition stays one DAG.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StepKind {
    Job {
        command: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pattern: Option<String>,
        #[serde(default)]
        required_capabilities: Vec<String>,
        #[serde(default = "default_priority")]
        priority: u8,
        /// Raw payload, or an expression (`${var}`) interpolated at submit time.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        payload_expression: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        timeout_ms: Option<u64>,
    },
    Delay {
        duration_ms: u64,
    },
    Parallel {
        branches: Vec<Vec<StepId>>,
        #[serde(default)]
        fail_fast: bool,
    },
    Conditional {
        expression: String,
        #[serde(default)]
        then_steps: Vec<StepId>,
        #[serde(default)]
        else_steps: Vec<StepId>,
    },
    ForEach {
        collection_expression: String,
        item_variable: String,
        body: Vec<StepId>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        max_concurrency: Option<u32>,
    },
    WaitForEvent {
        event_type: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        correlation_key: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        timeout_ms: Option<u64>,
    },
    SubWorkflow {
        workflow_id: WorkflowId,
        #[serde(default)]
        wait_for_completion: bool,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        input_expression: Option<String>,
    },
    Notify {
        target: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        message_expression: Option<String>,
    },
    /// Gates on external approval; reuses `WaitForEvent` wake-up semantics
    /// (spec §4.3) and is also exposed to operators as a `Decision`
    /// (supplemental feature, see SPEC_FULL §10.7).
    Approval {
        prompt: String,
        #[serde(default)]
        options: Vec<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        timeout_ms: Option<u64>,
    },
}

fn default_priority() -> u8 {
    5
}

/// One node in a workflow definition's DAG.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Step {
    pub id: StepId,
    #[serde(default)]
    pub depends_on: Vec<StepId>,
    /// Evaluated before the step starts; `false` marks it `Skipped` rather
    /// than running it (spec §4.3 Scheduling).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub condition: Option<String>,
    #[serde(default)]
    pub continue_on_error: bool,
    #[serde(default)]
    pub max_retries: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_variable: Option<String>,
    #[serde(flatten)]
    pub kind: StepKind,
}

/// Per-workflow failure policy (spec §4.3 Error handling).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ErrorHandlingPolicy {
    #[default]
    StopOnFirstError,
    ContinueAndAggregate,
    Compensate,
}

/// A trigger declaration. The core only records these; firing them on an
/// external signal (cron, webhook) is glue left to the host.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Trigger {
    pub name: String,
    pub event_type: String,
}

/// An immutable, versioned workflow template (spec §3 data model).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowDefinition {
    pub id: WorkflowId,
    #[serde(default = "default_version")]
    pub version: u32,
    pub steps: Vec<Step>,
    #[serde(default)]
    pub triggers: Vec<Trigger>,
    #[serde(default)]
    pub variables: HashMap<String, serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_ms: Option<u64>,
    #[serde(default)]
    pub error_handling: ErrorHandlingPolicy,
}

fn default_version() -> u32 {
    1
}

impl WorkflowDefinition {
    pub fn step(&self, id: &StepId) -> Option<&Step> {
        self.steps.iter().find(|s| &s.id == id)
    }

    /// Re-derive a `WaitForEvent`/`Approval` step's wake-up key from the
    /// definition (the counterpart `StepInstance::waiting_on` is never
    /// persisted — see its doc comment — so this is how a reloaded instance
    /// gets it back).
    pub fn waiting_on_for(&self, step_id: &StepId) -> Option<(String, Option<String>)> {
        match &self.step(step_id)?.kind {
            StepKind::WaitForEvent { event_type, correlation_key, .. } => {
                Some((event_type.clone(), correlation_key.clone()))
            }
            StepKind::Approval { .. } => Some(("approval".to_string(), Some(step_id.to_string()))),
            _ => None,
        }
    }
}

/// Status of one workflow instance (spec §3).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InstanceStatus {
    Pending,
    Running,
    Paused,
    Completed,
    Failed,
    Cancelled,
}

crate::simple_display! {
    InstanceStatus {
        InstanceStatus::Pending => "pending",
        InstanceStatus::Running => "running",
        InstanceStatus::Paused => "paused",
        InstanceStatus::Completed => "completed",
        InstanceStatus::Failed => "failed",
        InstanceStatus::Cancelled => "cancelled",
    }
}

impl InstanceStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, InstanceStatus::Completed | InstanceStatus::Failed | InstanceStatus::Cancelled)
    }
}

/// Status of one step within one instance (spec §3).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepStatus {
    Pending,
    Running,
    WaitingForEvent,
    Completed,
    Failed,
    Skipped,
    Cancelled,
}

crate::simple_display! {
    StepStatus {
        StepStatus::Pending => "pending",
        StepStatus::Running => "running",
        StepStatus::WaitingForEvent => "waiting_for_event",
        StepStatus::Completed => "completed",
        StepStatus::Failed => "failed",
        StepStatus::Skipped => "skipped",
        StepStatus::Cancelled => "cancelled",
    }
}

impl StepStatus {
    /// Satisfies a downstream `dependsOn` (spec invariant 5: `Completed` or
    /// `Skipped`).
    pub fn satisfies_dependency(&self) -> bool {
        matches!(self, StepStatus::Completed | StepStatus::Skipped)
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            StepStatus::Completed | StepStatus::Failed | StepStatus::Skipped | StepStatus::Cancelled
        )
    }
}

/// Per-step execution record within one instance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepInstance {
    pub status: StepStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub started_at_ms: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at_ms: Option<u64>,
    #[serde(default)]
    pub attempts: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Set while `status == WaitingForEvent`; the event/correlation key this
    /// step is waiting to be woken by. Not serialized on disk — it's a pure
    /// function of the step definition, so [`WorkflowDefinition::waiting_on_for`]
    /// re-derives it whenever an instance is loaded (see
    /// `WorkflowEngine::get_instance`); never read this field on a
    /// freshly-deserialized instance without calling that first.
    #[serde(skip)]
    pub waiting_on: Option<(String, Option<String>)>,
    /// Job(s) submitted on behalf of this step, awaiting completion. A plain
    /// `Job` step has at most one entry; a `ForEach` step's body may submit
    /// one per item.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub job_ids: Vec<JobId>,
}

impl Default for StepInstance {
    fn default() -> Self {
        Self {
            status: StepStatus::Pending,
            started_at_ms: None,
            completed_at_ms: None,
            attempts: 0,
            output: None,
            error: None,
            waiting_on: None,
            job_ids: Vec::new(),
        }
    }
}

/// One concrete execution of a [`WorkflowDefinition`] (spec §3).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowInstance {
    pub id: InstanceId,
    pub workflow_id: WorkflowId,
    pub workflow_version: u32,
    pub status: InstanceStatus,
    pub variables: HashMap<String, serde_json::Value>,
    pub step_instances: HashMap<StepId, StepInstance>,
    pub started_at_ms: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at_ms: Option<u64>,
}

impl WorkflowInstance {
    pub fn new(
        definition: &WorkflowDefinition,
        input: HashMap<String, serde_json::Value>,
        now_ms: u64,
    ) -> Self {
        let mut variables = definition.variables.clone();
        variables.extend(input);
        let step_instances =
            definition.steps.iter().map(|s| (s.id.clone(), StepInstance::default())).collect();
        Self {
            id: InstanceId::generate(),
            workflow_id: definition.id.clone(),
            workflow_version: definition.version,
            status: InstanceStatus::Pending,
            variables,
            step_instances,
            started_at_ms: now_ms,
            completed_at_ms: None,
        }
    }
}

#[cfg(test)]
#[path = "workflow_tests.rs"]
mod tests;
