// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Agent Registry & Session Layer (spec §4.1): the authoritative live set of
//! reachable agents and the one-per-agent duplex session.

use orbitmesh_core::{
    Agent, AgentId, AgentStatus, Capability, Clock, EntityKind, Event, OrbitError, Result, Session,
    SessionStatus,
};
use orbitmesh_store::Store;
use sha2::{Digest, Sha256};
use std::sync::Arc;

use crate::event_bus::EventBus;

/// Default grace window before a superseded session is fully closed.
pub const DEFAULT_DRAIN_MS: u64 = 5_000;
/// Default interval agents are expected to heartbeat at.
pub const DEFAULT_HEARTBEAT_MS: u64 = 10_000;
/// Default silence window before a session is declared dead (3x heartbeat).
pub const DEFAULT_HEARTBEAT_TIMEOUT_MS: u64 = 30_000;

/// What the Registry learns about an agent from a validated credential.
/// Opaque to the core: the concrete credential format is a host concern.
#[derive(Debug, Clone)]
pub struct AgentIdentity {
    pub agent_id: AgentId,
    pub name: String,
    pub capabilities: Vec<Capability>,
    pub group: Option<String>,
}

/// Validates an inbound connection's credential before any state change
/// (spec §4.1 "Failures": authenticator failure rejects the session before
/// any state is touched).
#[async_trait::async_trait]
pub trait Authenticator: Send + Sync + 'static {
    async fn authenticate(&self, credential: &str) -> Result<AgentIdentity>;
}

/// A fixed shared-secret authenticator: the credential is `"<agent_id>:<token>"`
/// and is accepted iff its SHA-256 digest matches the configured one. Simple
/// enough to audit, sufficient for a single operator/fleet trust boundary.
pub struct StaticTokenAuthenticator {
    token_digest: [u8; 32],
}

impl StaticTokenAuthenticator {
    pub fn new(shared_token: &str) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(shared_token.as_bytes());
        Self { token_digest: hasher.finalize().into() }
    }
}

#[async_trait::async_trait]
impl Authenticator for StaticTokenAuthenticator {
    async fn authenticate(&self, credential: &str) -> Result<AgentIdentity> {
        let (agent_id, token) = credential
            .split_once(':')
            .ok_or_else(|| OrbitError::unauthorized("credential must be \"agent_id:token\""))?;
        let mut hasher = Sha256::new();
        hasher.update(token.as_bytes());
        let digest: [u8; 32] = hasher.finalize().into();
        if digest != self.token_digest {
            return Err(OrbitError::Unauthorized { message: "token mismatch".into() });
        }
        Ok(AgentIdentity {
            agent_id: AgentId::from_string(agent_id),
            name: agent_id.to_string(),
            capabilities: Vec::new(),
            group: None,
        })
    }
}

/// Outcome of a successful `connect()`, carrying what the caller needs to
/// send a `Welcome` frame and to replay any inflight work.
pub struct ConnectOutcome {
    pub agent: Agent,
    pub session: Session,
    pub inflight_replay: Vec<orbitmesh_core::Job>,
}

pub struct AgentRegistry<C: Clock> {
    store: Arc<dyn Store>,
    bus: Arc<EventBus>,
    clock: C,
    drain_ms: u64,
    heartbeat_timeout_ms: u64,
}

impl<C: Clock> AgentRegistry<C> {
    pub fn new(store: Arc<dyn Store>, bus: Arc<EventBus>, clock: C) -> Self {
        Self { store, bus, clock, drain_ms: DEFAULT_DRAIN_MS, heartbeat_timeout_ms: DEFAULT_HEARTBEAT_TIMEOUT_MS }
    }

    pub fn with_timeouts(mut self, drain_ms: u64, heartbeat_timeout_ms: u64) -> Self {
        self.drain_ms = drain_ms;
        self.heartbeat_timeout_ms = heartbeat_timeout_ms;
        self
    }

    /// Open a session for `identity` (spec §4.1 "Session open").
    pub async fn connect(&self, identity: AgentIdentity, remote_addr: &str) -> Result<ConnectOutcome> {
        let now = self.clock.epoch_ms();
        let mut agent = match self.store.get_agent(&identity.agent_id).await? {
            Some(mut existing) => {
                existing.capabilities = identity.capabilities.clone();
                existing.group = identity.group.clone();
                existing
            }
            None => {
                let mut fresh = Agent::new(identity.agent_id, identity.name.clone());
                fresh.capabilities = identity.capabilities.clone();
                fresh.group = identity.group.clone();
                fresh
            }
        };

        // Step 2: supersede any existing session for this agent.
        if let Some(mut old) = self.store.get_session_for_agent(&identity.agent_id).await? {
            if old.status == SessionStatus::Active {
                old.status = SessionStatus::Superseded;
                self.store.put_session(old).await?;
            }
        }

        let session = Session::new(identity.agent_id, remote_addr, now);
        self.store.put_session(session.clone()).await?;

        // Step 3: status transition and connectivity events.
        agent.active_connection_id = Some(session.connection_id);
        agent.last_heartbeat_ms = now;
        agent.status = AgentStatus::Initializing;
        self.store.put_agent(agent.clone()).await?;
        self.bus.publish(Event::AgentConnected { agent_id: agent.id, connection_id: session.connection_id });

        agent.status = AgentStatus::Ready;
        self.store.put_agent(agent.clone()).await?;
        self.bus.publish(Event::AgentReady { agent_id: agent.id });

        // Step 4: inflight replay — jobs still assigned to this agent with no
        // terminal outcome yet.
        let page = self
            .store
            .list_jobs(orbitmesh_store::JobFilter {
                agent_id: Some(agent.id),
                page_size: u32::MAX,
                ..Default::default()
            })
            .await?;
        let inflight_replay = page.items.into_iter().filter(|job| job.status.is_assigned_slot()).collect();

        Ok(ConnectOutcome { agent, session, inflight_replay })
    }

    pub async fn heartbeat(&self, agent_id: &AgentId) -> Result<()> {
        let mut agent = self.require_agent(agent_id).await?;
        agent.last_heartbeat_ms = self.clock.epoch_ms();
        self.store.put_agent(agent).await
    }

    /// Declare any agent silent for longer than the configured heartbeat
    /// timeout dead (spec §4.1 "Heartbeat"). Returns the ids transitioned.
    pub async fn reap_dead_sessions(&self) -> Result<Vec<AgentId>> {
        let now = self.clock.epoch_ms();
        let mut dead = Vec::new();
        for agent in self.store.list_agents().await? {
            if !matches!(agent.status, AgentStatus::Ready | AgentStatus::Running | AgentStatus::Paused) {
                continue;
            }
            if now.saturating_sub(agent.last_heartbeat_ms) > self.heartbeat_timeout_ms {
                self.disconnect(&agent.id, "heartbeat timeout").await?;
                dead.push(agent.id);
            }
        }
        Ok(dead)
    }

    /// Closes the session and declares every job this agent still held
    /// (`Assigned`/`Acknowledged`) lost (spec §4.1 "Heartbeat"); the caller
    /// is expected to react to the published `AgentDisconnected` event to
    /// requeue or fail those jobs, since only the dispatcher knows a job's
    /// retry accounting.
    pub async fn disconnect(&self, agent_id: &AgentId, reason: &str) -> Result<()> {
        let mut agent = self.require_agent(agent_id).await?;
        agent.status = AgentStatus::Disconnected;
        agent.active_connection_id = None;
        agent.active_assignments = 0;
        self.store.put_agent(agent).await?;
        if let Some(mut session) = self.store.get_session_for_agent(agent_id).await? {
            session.status = SessionStatus::Closed;
            self.store.put_session(session).await?;
        }
        self.bus.publish(Event::AgentDisconnected { agent_id: *agent_id, reason: reason.to_string() });
        Ok(())
    }

    pub async fn pause(&self, agent_id: &AgentId) -> Result<()> {
        let mut agent = self.require_agent(agent_id).await?;
        agent.status = AgentStatus::Paused;
        self.store.put_agent(agent).await?;
        self.bus.publish(Event::AgentPaused { agent_id: *agent_id });
        Ok(())
    }

    pub async fn resume(&self, agent_id: &AgentId) -> Result<()> {
        let mut agent = self.require_agent(agent_id).await?;
        agent.status = AgentStatus::Ready;
        self.store.put_agent(agent).await?;
        self.bus.publish(Event::AgentResumed { agent_id: *agent_id });
        Ok(())
    }

    /// Begin a graceful drain; the agent reaches `Stopped` once every inflight
    /// job it holds reaches a terminal status (spec §4.1 "Graceful drain").
    pub async fn stop(&self, agent_id: &AgentId) -> Result<()> {
        let mut agent = self.require_agent(agent_id).await?;
        agent.status = AgentStatus::Stopping;
        self.store.put_agent(agent).await?;
        self.bus.publish(Event::AgentStopping { agent_id: *agent_id });
        self.maybe_finish_stop(agent_id).await
    }

    /// Called by the dispatcher whenever an inflight job reaches a terminal
    /// status, so a `Stopping` agent with no more inflight work can finish
    /// its drain.
    pub async fn maybe_finish_stop(&self, agent_id: &AgentId) -> Result<()> {
        let mut agent = self.require_agent(agent_id).await?;
        if agent.status != AgentStatus::Stopping {
            return Ok(());
        }
        if agent.active_assignments == 0 {
            agent.status = AgentStatus::Stopped;
            self.store.put_agent(agent).await?;
            self.bus.publish(Event::AgentStopped { agent_id: *agent_id });
        }
        Ok(())
    }

    pub async fn remove(&self, agent_id: &AgentId) -> Result<()> {
        self.store.delete_agent(agent_id).await
    }

    pub async fn update_capabilities(&self, agent_id: &AgentId, capabilities: Vec<Capability>) -> Result<()> {
        let mut agent = self.require_agent(agent_id).await?;
        agent.capabilities = capabilities;
        self.store.put_agent(agent).await?;
        self.bus.publish(Event::AgentCapabilitiesUpdated { agent_id: *agent_id });
        Ok(())
    }

    pub async fn get(&self, agent_id: &AgentId) -> Result<Agent> {
        self.require_agent(agent_id).await
    }

    pub async fn list(&self) -> Result<Vec<Agent>> {
        self.store.list_agents().await
    }

    async fn require_agent(&self, agent_id: &AgentId) -> Result<Agent> {
        self.store
            .get_agent(agent_id)
            .await?
            .ok_or_else(|| OrbitError::not_found(EntityKind::Agent, agent_id.to_string()))
    }
}

#[cfg(test)]
#[path = "registry_tests.rs"]
mod tests;
