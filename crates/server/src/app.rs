// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The process-wide singleton set (spec §9 "Global state"): one `Store`,
//! `EventBus`, `AgentRegistry`, `Dispatcher`, and `WorkflowEngine`, wired
//! together behind a single `App` handle that the session listener, the
//! admin listener, and the background sweep all share.

use crate::config::Config;
use crate::connections::Connections;
use orbitmesh_core::clock::SystemClock;
use orbitmesh_core::{Effect, JobId, Result};
use orbitmesh_engine::registry::{AgentRegistry, StaticTokenAuthenticator};
use orbitmesh_engine::{Dispatcher, EventBus, WorkflowEngine};
use orbitmesh_store::InMemoryStore;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::Mutex as AsyncMutex;
use tracing::{info, warn};

/// The shared singleton set plus the bits that only make sense once sockets
/// are involved (live connections, outstanding cancellation requests).
pub struct App {
    pub config: Config,
    pub store: Arc<dyn orbitmesh_store::Store>,
    pub bus: Arc<EventBus>,
    pub registry: Arc<AgentRegistry<SystemClock>>,
    pub dispatcher: Arc<Dispatcher<SystemClock>>,
    pub workflows: Arc<WorkflowEngine<SystemClock>>,
    pub authenticator: Arc<StaticTokenAuthenticator>,
    pub connections: Connections,
    /// `jobId -> requestedAt` for cancellations still awaiting agent
    /// confirmation; swept by the background task (spec §4.2 "Cancellation").
    pub pending_cancellations: AsyncMutex<HashMap<JobId, u64>>,
    draining: AtomicBool,
    /// Notified when an admin `Shutdown` request (or a process signal) asks
    /// `main` to begin an orderly stop.
    pub shutdown: tokio::sync::Notify,
}

impl App {
    /// Construct every singleton in dependency order (spec §9): store first,
    /// then the bus, then the components that publish onto it.
    pub fn new(config: Config) -> Result<Arc<Self>> {
        let store: Arc<dyn orbitmesh_store::Store> = match config.state_dir() {
            Some(dir) => Arc::new(InMemoryStore::open(dir)?),
            None => Arc::new(InMemoryStore::new()),
        };
        let bus = Arc::new(EventBus::new(config.event_bus_capacity));
        let registry = Arc::new(
            AgentRegistry::new(store.clone(), bus.clone(), SystemClock)
                .with_timeouts(config.drain_timeout_ms, config.heartbeat_timeout_ms),
        );
        let dispatcher = Arc::new(
            Dispatcher::new(store.clone(), bus.clone(), SystemClock).with_timeouts(
                config.ack_timeout_ms,
                config.cancel_timeout_ms,
                config.retry_base_ms,
                config.retry_max_backoff_ms,
            ),
        );
        let workflows = Arc::new(WorkflowEngine::new(
            store.clone(),
            bus.clone(),
            dispatcher.clone(),
            SystemClock,
        ));
        let authenticator = Arc::new(StaticTokenAuthenticator::new(&config.shared_token));

        Ok(Arc::new(Self {
            config,
            store,
            bus,
            registry,
            dispatcher,
            workflows,
            authenticator,
            connections: Connections::new(),
            pending_cancellations: AsyncMutex::new(HashMap::new()),
            draining: AtomicBool::new(false),
            shutdown: tokio::sync::Notify::new(),
        }))
    }

    pub fn is_draining(&self) -> bool {
        self.draining.load(Ordering::Acquire)
    }

    pub fn request_shutdown(&self) {
        self.shutdown.notify_one();
    }

    /// Stop accepting new work. Called first in `stop()`, and checked by the
    /// admin listener to reject `JobSubmit`/`WorkflowStart` early (spec §9).
    pub fn begin_drain(&self) {
        self.draining.store(true, Ordering::Release);
    }

    /// Re-dispatch the ready set and push every newly-assigned job over the
    /// wire. Invoked by the central event reactor, not polled (mirrors
    /// [`orbitmesh_engine::dispatcher::Dispatcher::try_dispatch`]'s own doc
    /// comment: triggered by `AgentReady`/`AgentCapabilitiesUpdated`/job
    /// completion events).
    pub async fn dispatch_and_deliver(&self) {
        if self.is_draining() {
            return;
        }
        match self.dispatcher.try_dispatch().await {
            Ok(assigned) => {
                for job in assigned {
                    if let Some(agent_id) = job.assigned_agent_id {
                        self.deliver(agent_id, job).await;
                    }
                }
            }
            Err(err) => warn!(error = %err, "try_dispatch failed"),
        }
    }

    /// Encode and push a `Deliver` frame for a just-assigned job, logging the
    /// effect before the write (spec §10.3's structured-effect-logging
    /// convention).
    async fn deliver(&self, agent_id: orbitmesh_core::AgentId, job: orbitmesh_core::Job) {
        let effect = Effect::DeliverJob { agent_id, job: job.clone(), attempt: job.retry_count };
        log_effect(&effect);
        let frame = orbitmesh_wire::session::Deliver {
            job_id: job.id,
            idempotency_key: job.idempotency_key.0.clone(),
            command: job.command.clone(),
            payload: job.payload.clone(),
            priority: job.priority,
            timeout_ms: job.timeout_ms,
            attempt: job.retry_count,
        };
        match orbitmesh_wire::frame::encode_frame(orbitmesh_wire::session::kind::DELIVER, &frame) {
            Ok(bytes) => {
                if !self.connections.send(&agent_id, bytes) {
                    warn!(%agent_id, job_id = %job.id, "deliver: agent not connected");
                }
            }
            Err(err) => warn!(error = %err, "failed to encode Deliver frame"),
        }
    }

    /// Request that an agent drop an in-flight job, tracking the request so
    /// the background sweep can force-confirm it after `cancelTimeoutMs`.
    pub async fn request_cancel(&self, job_id: JobId, agent_id: orbitmesh_core::AgentId, reason: Option<String>) {
        let effect = Effect::SendCancel { agent_id, job_id, reason: reason.clone() };
        log_effect(&effect);
        let frame = orbitmesh_wire::session::Cancel { job_id, reason };
        match orbitmesh_wire::frame::encode_frame(orbitmesh_wire::session::kind::CANCEL, &frame) {
            Ok(bytes) => {
                self.connections.send(&agent_id, bytes);
            }
            Err(err) => warn!(error = %err, "failed to encode Cancel frame"),
        }
        let now = orbitmesh_core::clock::Clock::epoch_ms(&SystemClock);
        self.pending_cancellations.lock().await.insert(job_id, now);
    }

    /// Drain inflight work within `drain_timeout_ms`, then release listeners.
    /// Runs singleton teardown in the reverse of `new()`'s construction order
    /// (spec §9).
    pub async fn stop(&self, drain_timeout_ms: u64) {
        info!(drain_timeout_ms, "draining");
        self.begin_drain();
        let deadline = tokio::time::Instant::now() + std::time::Duration::from_millis(drain_timeout_ms);
        loop {
            let still_running = self
                .store
                .list_jobs(orbitmesh_store::JobFilter {
                    status: Some(orbitmesh_core::JobStatus::Running),
                    ..Default::default()
                })
                .await
                .map(|page| page.total)
                .unwrap_or(0);
            if still_running == 0 || tokio::time::Instant::now() >= deadline {
                break;
            }
            tokio::time::sleep(std::time::Duration::from_millis(100)).await;
        }
        info!("drain complete");
    }
}

fn log_effect(effect: &Effect) {
    info!(effect = effect.name(), fields = ?effect.fields(), "effect");
}

#[cfg(test)]
#[path = "app_tests.rs"]
mod tests;
