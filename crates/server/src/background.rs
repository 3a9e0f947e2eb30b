// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Two background tasks every running server holds for its lifetime:
//!
//! - [`run_event_reactor`]: a single subscriber to the whole [`EventBus`]
//!   that centrally reacts to state changes — re-dispatching the ready set,
//!   closing out finished workflow steps, and finishing an agent's graceful
//!   drain — instead of every call site re-deriving the same follow-ups
//!   (matches [`orbitmesh_engine::Dispatcher::try_dispatch`]'s own doc
//!   comment: triggered by events, not polled).
//! - [`run_sweep`]: the timer side of spec §4.1/§4.2 that no event ever
//!   fires for — heartbeat death, ack timeout, running timeout, and
//!   cancel-confirmation timeout all have to be noticed by someone checking
//!   the clock.

use crate::app::App;
use orbitmesh_core::{AgentStatus, Event};
use std::sync::Arc;
use std::time::Duration;
use tracing::warn;

pub async fn run_event_reactor(app: Arc<App>) {
    let mut subscription = app.bus.subscribe(None);
    while let Some(event) = subscription.recv().await {
        handle_event(&app, event).await;
    }
}

async fn handle_event(app: &Arc<App>, event: Event) {
    match event {
        Event::AgentReady { .. }
        | Event::AgentCapabilitiesUpdated { .. }
        | Event::AgentResumed { .. }
        | Event::JobSubmitted { .. }
        | Event::JobRetried { .. } => {
            app.dispatch_and_deliver().await;
        }

        Event::JobCompleted { job_id, agent_id } => {
            on_job_terminal(app, &job_id).await;
            finish_stop_if_idle(app, &agent_id).await;
            app.dispatch_and_deliver().await;
        }
        Event::JobTimedOut { job_id, agent_id, will_retry, .. } => {
            if !will_retry {
                on_job_terminal(app, &job_id).await;
            }
            finish_stop_if_idle(app, &agent_id).await;
            app.dispatch_and_deliver().await;
        }
        Event::JobFailed { job_id, will_retry, .. } => {
            if !will_retry {
                on_job_terminal(app, &job_id).await;
            }
            sweep_stopping_agents(app).await;
            app.dispatch_and_deliver().await;
        }
        Event::JobCancelled { job_id, .. } => {
            on_job_terminal(app, &job_id).await;
            app.pending_cancellations.lock().await.remove(&job_id);
            sweep_stopping_agents(app).await;
            app.dispatch_and_deliver().await;
        }
        Event::AgentDisconnected { agent_id, .. } => {
            if let Err(err) = app.dispatcher.fail_inflight_for_lost_agent(&agent_id).await {
                warn!(%agent_id, error = %err, "fail_inflight_for_lost_agent failed");
            }
            app.dispatch_and_deliver().await;
        }

        _ => {}
    }
}

async fn on_job_terminal(app: &Arc<App>, job_id: &orbitmesh_core::JobId) {
    if let Err(err) = app.workflows.on_job_terminal(job_id).await {
        warn!(%job_id, error = %err, "on_job_terminal failed");
    }
}

async fn finish_stop_if_idle(app: &Arc<App>, agent_id: &orbitmesh_core::AgentId) {
    if let Err(err) = app.registry.maybe_finish_stop(agent_id).await {
        warn!(%agent_id, error = %err, "maybe_finish_stop failed");
    }
}

/// `JobFailed`/`JobCancelled` don't carry an `agentId` (the dispatcher had
/// already released it before publishing), so instead of guessing we check
/// every agent still draining.
async fn sweep_stopping_agents(app: &Arc<App>) {
    match app.registry.list().await {
        Ok(agents) => {
            for agent in agents.into_iter().filter(|a| a.status == AgentStatus::Stopping) {
                finish_stop_if_idle(app, &agent.id).await;
            }
        }
        Err(err) => warn!(error = %err, "listing agents for stop sweep failed"),
    }
}

pub async fn run_sweep(app: Arc<App>) {
    let mut interval = tokio::time::interval(Duration::from_millis(app.config.sweep_interval_ms));
    loop {
        interval.tick().await;
        sweep_once(&app).await;
    }
}

async fn sweep_once(app: &Arc<App>) {
    match app.registry.reap_dead_sessions().await {
        Ok(reaped) => {
            for agent_id in reaped {
                warn!(%agent_id, "agent heartbeat timed out");
            }
        }
        Err(err) => warn!(error = %err, "reap_dead_sessions failed"),
    }

    let now = orbitmesh_core::clock::Clock::epoch_ms(&orbitmesh_core::SystemClock);

    let assigned = app
        .store
        .list_jobs(orbitmesh_store::JobFilter {
            status: Some(orbitmesh_core::JobStatus::Assigned),
            page_size: u32::MAX,
            ..Default::default()
        })
        .await;
    if let Ok(page) = assigned {
        for job in page.items {
            if let (Some(assigned_at), Some(agent_id)) = (job.assigned_at_ms, job.assigned_agent_id) {
                if now.saturating_sub(assigned_at) > app.dispatcher.ack_timeout_ms() {
                    if let Err(err) = app.dispatcher.on_reject(&job.id, &agent_id, "ack timeout").await {
                        warn!(job_id = %job.id, error = %err, "on_reject (ack timeout) failed");
                    }
                }
            }
        }
    }

    let running = app
        .store
        .list_jobs(orbitmesh_store::JobFilter {
            status: Some(orbitmesh_core::JobStatus::Running),
            page_size: u32::MAX,
            ..Default::default()
        })
        .await;
    if let Ok(page) = running {
        for job in page.items {
            if let (Some(started_at), Some(timeout_ms)) = (job.started_at_ms, job.timeout_ms) {
                if now.saturating_sub(started_at) > timeout_ms {
                    if let Err(err) = app.dispatcher.on_timeout(&job.id).await {
                        warn!(job_id = %job.id, error = %err, "on_timeout failed");
                    }
                }
            }
        }
    }

    let mut pending = app.pending_cancellations.lock().await;
    let cancel_timeout_ms = app.dispatcher.cancel_timeout_ms();
    let expired: Vec<orbitmesh_core::JobId> = pending
        .iter()
        .filter(|(_, requested_at)| now.saturating_sub(**requested_at) > cancel_timeout_ms)
        .map(|(job_id, _)| *job_id)
        .collect();
    for job_id in &expired {
        pending.remove(job_id);
    }
    drop(pending);
    for job_id in expired {
        if let Err(err) = app.dispatcher.confirm_cancelled(&job_id, None).await {
            warn!(%job_id, error = %err, "confirm_cancelled (cancel timeout) failed");
        }
    }
}

#[cfg(test)]
#[path = "background_tests.rs"]
mod tests;
