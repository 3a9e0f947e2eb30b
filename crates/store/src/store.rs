// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The `Store` abstraction (spec §6 "Persisted state layout"): durable,
//! indexed storage for every long-lived entity. Callers depend on this
//! trait, not a concrete backend, so the in-memory reference implementation
//! in [`crate::memory`] and any future durable backend are interchangeable.

use async_trait::async_trait;
use orbitmesh_core::{
    Agent, AgentId, Decision, DecisionId, InstanceId, Job, JobId, JobStatus, Session,
    WorkflowDefinition, WorkflowId, WorkflowInstance,
};
use orbitmesh_core::workflow::InstanceStatus;

/// Filters + paging for [`Store::list_jobs`], mirroring spec §6's
/// `jobs.list(status?, agentId?, command?, pageSize, page)`.
#[derive(Debug, Clone, Default)]
pub struct JobFilter {
    pub status: Option<JobStatus>,
    pub agent_id: Option<AgentId>,
    pub command: Option<String>,
    pub page_size: u32,
    pub page: u32,
}

/// A page of results plus the total matching count (for client-side paging UI).
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: u64,
}

/// Filters for [`Store::list_workflow_instances`].
#[derive(Debug, Clone, Default)]
pub struct InstanceFilter {
    pub status: Option<InstanceStatus>,
    pub workflow_id: Option<WorkflowId>,
}

/// Durable, indexed storage for agents, sessions, jobs, workflow definitions
/// and instances, and human decisions.
#[async_trait]
pub trait Store: Send + Sync + 'static {
    async fn put_agent(&self, agent: Agent) -> orbitmesh_core::Result<()>;
    async fn get_agent(&self, id: &AgentId) -> orbitmesh_core::Result<Option<Agent>>;
    async fn list_agents(&self) -> orbitmesh_core::Result<Vec<Agent>>;
    async fn delete_agent(&self, id: &AgentId) -> orbitmesh_core::Result<()>;

    async fn put_session(&self, session: Session) -> orbitmesh_core::Result<()>;
    async fn get_session_for_agent(&self, agent_id: &AgentId) -> orbitmesh_core::Result<Option<Session>>;

    async fn put_job(&self, job: Job) -> orbitmesh_core::Result<()>;
    async fn get_job(&self, id: &JobId) -> orbitmesh_core::Result<Option<Job>>;
    async fn list_jobs(&self, filter: JobFilter) -> orbitmesh_core::Result<Page<Job>>;
    /// Every job not in a terminal status, ordered per spec §4.2's ready-set
    /// ordering (`priority desc, createdAt asc, jobId asc`).
    async fn list_ready_jobs(&self) -> orbitmesh_core::Result<Vec<Job>>;

    async fn put_workflow_definition(&self, definition: WorkflowDefinition) -> orbitmesh_core::Result<()>;
    async fn get_workflow_definition(&self, id: &WorkflowId) -> orbitmesh_core::Result<Option<WorkflowDefinition>>;
    async fn list_workflow_definitions(&self) -> orbitmesh_core::Result<Vec<WorkflowDefinition>>;
    async fn delete_workflow_definition(&self, id: &WorkflowId) -> orbitmesh_core::Result<()>;

    async fn put_workflow_instance(&self, instance: WorkflowInstance) -> orbitmesh_core::Result<()>;
    async fn get_workflow_instance(&self, id: &InstanceId) -> orbitmesh_core::Result<Option<WorkflowInstance>>;
    async fn list_workflow_instances(&self, filter: InstanceFilter) -> orbitmesh_core::Result<Vec<WorkflowInstance>>;

    async fn put_decision(&self, decision: Decision) -> orbitmesh_core::Result<()>;
    async fn get_decision(&self, id: &DecisionId) -> orbitmesh_core::Result<Option<Decision>>;
    async fn list_unresolved_decisions(&self) -> orbitmesh_core::Result<Vec<Decision>>;
}
