// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The administrative control plane (spec §6): one request per connection on
//! a Unix domain socket, mirroring the teacher's `listener/mod.rs`
//! `handle_connection` — read one request, dispatch, write one response,
//! close — except `EventsSubscribe`, which upgrades the connection into a
//! long-lived stream of `Response::Event` frames (the teacher's `AgentAttach`
//! special case, adapted to this protocol's event topics).

use crate::app::App;
use orbitmesh_store::JobFilter;
use orbitmesh_wire::frame::{self, ProtocolError};
use orbitmesh_wire::{Request, Response};
use std::sync::Arc;
use tokio::net::{UnixListener, UnixStream};
use tracing::{debug, error, info, warn};

pub const PROTOCOL_VERSION: &str = "1";

pub async fn run(listener: UnixListener, app: Arc<App>) {
    loop {
        match listener.accept().await {
            Ok((stream, _addr)) => {
                let app = app.clone();
                tokio::spawn(async move {
                    if let Err(err) = handle_connection(stream, &app).await {
                        log_connection_error(err);
                    }
                });
            }
            Err(err) => error!(error = %err, "admin socket accept error"),
        }
    }
}

fn log_connection_error(err: ProtocolError) {
    match err {
        ProtocolError::Io(io_err) if io_err.kind() == std::io::ErrorKind::UnexpectedEof => {
            debug!("admin client disconnected")
        }
        other => warn!(error = %other, "admin connection error"),
    }
}

async fn handle_connection(mut stream: UnixStream, app: &Arc<App>) -> Result<(), ProtocolError> {
    let raw = frame::read_frame(&mut stream).await?;
    let request: Request = frame::decode_payload(&raw)?;

    if matches!(request, Request::EventsSubscribe { .. }) {
        return stream_events(stream, request, app).await;
    }

    debug!(request = ?request, "admin request");
    let response = handle_request(request, app).await;
    frame::write_frame(&mut stream, 0, &response).await
}

async fn stream_events(mut stream: UnixStream, request: Request, app: &Arc<App>) -> Result<(), ProtocolError> {
    let Request::EventsSubscribe { topic_filter } = request else { unreachable!() };
    let mut subscription = app.bus.subscribe(topic_filter.as_deref());
    info!(topic_filter = ?topic_filter, "admin client subscribed to events");
    loop {
        tokio::select! {
            event = subscription.recv() => {
                match event {
                    Some(event) => {
                        frame::write_frame(&mut stream, 0, &Response::Event { event }).await?;
                    }
                    None => return Ok(()),
                }
            }
            n = stream.readable() => {
                n?;
                let mut buf = [0u8; 1];
                match stream.try_read(&mut buf) {
                    Ok(0) => return Ok(()),
                    Ok(_) | Err(_) => continue,
                }
            }
        }
    }
}

async fn handle_request(request: Request, app: &Arc<App>) -> Response {
    match request {
        Request::Ping => Response::Pong,
        Request::Hello { version: _ } => Response::Hello { version: PROTOCOL_VERSION.to_string() },

        Request::AgentsList { group, status } => {
            match app.registry.list().await {
                Ok(agents) => {
                    let agents = agents
                        .into_iter()
                        .filter(|a| group.as_deref().map(|g| a.group.as_deref() == Some(g)).unwrap_or(true))
                        .filter(|a| status.as_deref().map(|s| a.status.to_string() == s).unwrap_or(true))
                        .collect();
                    Response::Agents { agents }
                }
                Err(err) => err.into(),
            }
        }
        Request::AgentGet { agent_id } => match app.registry.get(&agent_id).await {
            Ok(agent) => Response::Agent { agent: Some(Box::new(agent)) },
            Err(err) => err.into(),
        },
        Request::AgentPause { agent_id } => match app.registry.pause(&agent_id).await {
            Ok(()) => Response::Ok,
            Err(err) => err.into(),
        },
        Request::AgentResume { agent_id } => match app.registry.resume(&agent_id).await {
            Ok(()) => Response::Ok,
            Err(err) => err.into(),
        },
        Request::AgentStop { agent_id } => match app.registry.stop(&agent_id).await {
            Ok(()) => Response::Ok,
            Err(err) => err.into(),
        },
        Request::AgentRemove { agent_id } => match app.registry.remove(&agent_id).await {
            Ok(()) => Response::Ok,
            Err(err) => err.into(),
        },
        Request::AgentUpdateCapabilities { agent_id, capabilities } => {
            match app.registry.update_capabilities(&agent_id, capabilities).await {
                Ok(()) => Response::Ok,
                Err(err) => err.into(),
            }
        }

        Request::JobSubmit { request } => {
            if app.is_draining() {
                return orbitmesh_core::OrbitError::unavailable("server is draining").into();
            }
            match app.dispatcher.submit(request).await {
                Ok(job) => Response::Job { job: Some(Box::new(job)) },
                Err(err) => err.into(),
            }
        }
        Request::JobGet { job_id } => match app.dispatcher.get(&job_id).await {
            Ok(job) => Response::Job { job: Some(Box::new(job)) },
            Err(err) => err.into(),
        },
        Request::JobCancel { job_id, reason } => match app.dispatcher.cancel(&job_id, reason.clone()).await {
            Ok(job) => {
                if let Some(agent_id) = job.assigned_agent_id {
                    app.request_cancel(job_id, agent_id, reason).await;
                }
                Response::Job { job: Some(Box::new(job)) }
            }
            Err(err) => err.into(),
        },
        Request::JobRetry { job_id } => match app.dispatcher.retry(&job_id).await {
            Ok(job) => {
                app.dispatch_and_deliver().await;
                Response::Job { job: Some(Box::new(job)) }
            }
            Err(err) => err.into(),
        },
        Request::JobsList { status, agent_id, command, page_size, page } => {
            let filter = JobFilter {
                status: status.and_then(|s| parse_job_status(&s)),
                agent_id,
                command,
                page_size,
                page,
            };
            match app.dispatcher.list(filter).await {
                Ok(page_result) => Response::Jobs {
                    jobs: page_result.items,
                    total: page_result.total,
                    page,
                    page_size,
                },
                Err(err) => err.into(),
            }
        }

        Request::WorkflowDefine { definition } => match app.workflows.register(definition).await {
            Ok(()) => Response::Ok,
            Err(err) => err.into(),
        },
        Request::WorkflowGet { workflow_id } => match app.workflows.get_definition(&workflow_id).await {
            Ok(definition) => Response::WorkflowDefinition { definition: Some(Box::new(definition)) },
            Err(err) => err.into(),
        },
        Request::WorkflowDelete { workflow_id } => match app.store.delete_workflow_definition(&workflow_id).await {
            Ok(()) => Response::Ok,
            Err(err) => err.into(),
        },
        Request::WorkflowsList => match app.store.list_workflow_definitions().await {
            Ok(definitions) => Response::WorkflowDefinitions { definitions },
            Err(err) => err.into(),
        },
        Request::WorkflowStart { workflow_id, input } => match app.workflows.start(&workflow_id, input).await {
            Ok(instance) => Response::WorkflowInstance { instance: Some(Box::new(instance)) },
            Err(err) => err.into(),
        },
        Request::WorkflowInstanceGet { instance_id } => match app.workflows.get_instance(&instance_id).await {
            Ok(instance) => Response::WorkflowInstance { instance: Some(Box::new(instance)) },
            Err(err) => err.into(),
        },
        Request::WorkflowInstanceCancel { instance_id, reason: _ } => {
            match app.workflows.cancel(&instance_id).await {
                Ok(()) => Response::Ok,
                Err(err) => err.into(),
            }
        }
        Request::WorkflowInstanceSignal { instance_id, event_type, correlation_key, payload } => {
            match app.workflows.signal(&instance_id, &event_type, correlation_key.as_deref(), payload).await {
                Ok(()) => Response::Ok,
                Err(err) => err.into(),
            }
        }

        Request::DecisionGet { decision_id } => match app.store.get_decision(&decision_id).await {
            Ok(decision) => Response::Decision { decision: decision.map(Box::new) },
            Err(err) => err.into(),
        },
        Request::DecisionsList => match app.store.list_unresolved_decisions().await {
            Ok(decisions) => Response::Decisions { decisions },
            Err(err) => err.into(),
        },
        Request::DecisionResolve { decision_id, chosen_label } => {
            match app.workflows.resolve_decision(&decision_id, &chosen_label).await {
                Ok(()) => Response::Ok,
                Err(err) => err.into(),
            }
        }

        Request::Shutdown { drain_timeout_ms } => {
            info!(?drain_timeout_ms, "shutdown requested over admin socket");
            app.request_shutdown();
            Response::ShuttingDown
        }

        Request::EventsSubscribe { .. } => unreachable!("handled in stream_events"),
    }
}

fn parse_job_status(s: &str) -> Option<orbitmesh_core::JobStatus> {
    use orbitmesh_core::JobStatus::*;
    match s {
        "pending" => Some(Pending),
        "assigned" => Some(Assigned),
        "acknowledged" => Some(Acknowledged),
        "running" => Some(Running),
        "completed" => Some(Completed),
        "failed" => Some(Failed),
        "timed_out" => Some(TimedOut),
        "cancelled" => Some(Cancelled),
        _ => None,
    }
}

#[cfg(test)]
#[path = "admin_listener_tests.rs"]
mod tests;
