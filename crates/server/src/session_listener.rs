// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The agent session plane (spec §4.1, wire table in spec §6): a persistent
//! duplex TCP connection per agent. `Hello` authenticates and opens the
//! session; afterwards a writer task drains an outbound frame channel while
//! a read loop dispatches inbound frames to the registry and dispatcher.

use crate::app::App;
use orbitmesh_core::{AgentId, OrbitError};
use orbitmesh_wire::frame::{self, ProtocolError};
use orbitmesh_wire::session::{self, kind};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tokio::time::Instant;
use tracing::{debug, info, warn};

/// Inbound frames that fail to parse/decode, tolerated per rolling one-second
/// window, before a session is judged a malformed peer and closed (spec
/// §4.1 "Failures").
const MAX_PARSE_ERRORS_PER_SECOND: u32 = 10;

pub async fn run(listener: TcpListener, app: Arc<App>) {
    loop {
        match listener.accept().await {
            Ok((stream, addr)) => {
                let app = app.clone();
                tokio::spawn(async move {
                    if let Err(err) = handle_session(stream, addr.to_string(), &app).await {
                        warn!(remote = %addr, error = %err, "session connection error");
                    }
                });
            }
            Err(err) => warn!(error = %err, "session socket accept error"),
        }
    }
}

async fn handle_session(stream: TcpStream, remote_addr: String, app: &Arc<App>) -> Result<(), ProtocolError> {
    let (mut reader, mut writer) = stream.into_split();

    let raw = frame::read_frame(&mut reader).await?;
    if raw.kind != kind::HELLO {
        warn!(remote = %remote_addr, "first frame was not Hello, closing");
        return Ok(());
    }
    let hello: session::Hello = frame::decode_payload(&raw)?;

    let identity = match authenticate(app, &hello).await {
        Ok(identity) => identity,
        Err(err) => {
            warn!(agent_id = %hello.agent_id, error = %err, "session authentication failed");
            return Ok(());
        }
    };

    let outcome = match app.registry.connect(identity, &remote_addr).await {
        Ok(outcome) => outcome,
        Err(err) => {
            warn!(agent_id = %hello.agent_id, error = %err, "registry connect failed");
            return Ok(());
        }
    };
    let agent_id = outcome.agent.id;
    info!(%agent_id, remote = %remote_addr, "agent connected");

    let (tx, rx) = mpsc::unbounded_channel();
    app.connections.register(agent_id, tx.clone());

    let welcome = session::Welcome {
        connection_id: outcome.session.connection_id,
        server_id: app.config.server_id.clone(),
        heartbeat_interval_ms: app.config.heartbeat_interval_ms,
        resume_token: outcome.session.resume_token.0.clone(),
    };
    write_frame_now(&mut writer, kind::WELCOME, &welcome).await?;

    for job in outcome.inflight_replay {
        let deliver = session::Deliver {
            job_id: job.id,
            idempotency_key: job.idempotency_key.0.clone(),
            command: job.command.clone(),
            payload: job.payload.clone(),
            priority: job.priority,
            timeout_ms: job.timeout_ms,
            attempt: job.retry_count,
        };
        if let Ok(bytes) = frame::encode_frame(kind::DELIVER, &deliver) {
            let _ = tx.send(bytes);
        }
    }

    let writer_task = tokio::spawn(run_writer(writer, rx));
    let result = read_loop(&mut reader, agent_id, app).await;

    app.connections.remove(&agent_id);
    writer_task.abort();
    if let Err(err) = app.registry.disconnect(&agent_id, "session closed").await {
        warn!(%agent_id, error = %err, "disconnect bookkeeping failed");
    }

    result
}

async fn authenticate(app: &App, hello: &session::Hello) -> orbitmesh_core::Result<orbitmesh_engine::registry::AgentIdentity> {
    let credential = hello
        .resume_token
        .clone()
        .ok_or_else(|| OrbitError::unauthorized("Hello carried no credential"))?;
    let mut identity = app.authenticator.authenticate(&credential).await?;
    identity.name = hello.nominal_name.clone();
    identity.capabilities = hello.capabilities.clone();
    identity.group = hello.group.clone();
    Ok(identity)
}

async fn run_writer<W: AsyncWrite + Unpin>(mut writer: W, mut rx: mpsc::UnboundedReceiver<Vec<u8>>) {
    while let Some(frame) = rx.recv().await {
        if writer.write_all(&frame).await.is_err() {
            break;
        }
        if writer.flush().await.is_err() {
            break;
        }
    }
}

async fn write_frame_now<W: AsyncWrite + Unpin, T: serde::Serialize>(
    writer: &mut W,
    kind: u8,
    value: &T,
) -> Result<(), ProtocolError> {
    frame::write_frame(writer, kind, value).await
}

async fn read_loop<R: AsyncRead + Unpin>(reader: &mut R, agent_id: AgentId, app: &Arc<App>) -> Result<(), ProtocolError> {
    let mut window_start = Instant::now();
    let mut parse_errors_this_window: u32 = 0;
    loop {
        let raw = match frame::read_frame(reader).await {
            Ok(raw) => raw,
            Err(ProtocolError::Io(err)) if err.kind() == std::io::ErrorKind::UnexpectedEof => return Ok(()),
            Err(err) => return Err(err),
        };
        if let Err(err) = dispatch_frame(&raw, agent_id, app).await {
            warn!(%agent_id, error = %err, "error handling session frame");
            if matches!(err, OrbitError::InvalidArgument { .. }) {
                if window_start.elapsed() >= Duration::from_secs(1) {
                    window_start = Instant::now();
                    parse_errors_this_window = 0;
                }
                parse_errors_this_window += 1;
                if parse_errors_this_window > MAX_PARSE_ERRORS_PER_SECOND {
                    warn!(%agent_id, "closing session: too many malformed frames in one second");
                    return Ok(());
                }
            }
        }
    }
}

async fn dispatch_frame(raw: &frame::RawFrame, agent_id: AgentId, app: &Arc<App>) -> orbitmesh_core::Result<()> {
    match raw.kind {
        kind::HEARTBEAT => {
            let _heartbeat: session::Heartbeat = frame::decode_payload(raw)?;
            app.registry.heartbeat(&agent_id).await?;
        }
        kind::ACK_REJECT => {
            let ack: session::AckReject = frame::decode_payload(raw)?;
            if ack.accepted {
                app.dispatcher.on_ack(&ack.job_id, &agent_id).await?;
            } else {
                let reason = ack.reason.unwrap_or_else(|| "rejected".to_string());
                app.dispatcher.on_reject(&ack.job_id, &agent_id, &reason).await?;
            }
        }
        kind::START => {
            let start: session::Start = frame::decode_payload(raw)?;
            app.dispatcher.on_start(&start.job_id).await?;
        }
        kind::PROGRESS => {
            let progress: session::Progress = frame::decode_payload(raw)?;
            app.dispatcher
                .on_progress(
                    &progress.job_id,
                    orbitmesh_core::JobProgress { pct: progress.pct, message: progress.message, step: progress.step },
                )
                .await?;
        }
        kind::RESULT => {
            let result: session::JobResult = frame::decode_payload(raw)?;
            app.dispatcher.on_result(&result.job_id, result.result_bytes).await?;
        }
        kind::ERROR => {
            let error: session::JobError = frame::decode_payload(raw)?;
            app.dispatcher.on_error(&error.job_id, &error.code, &error.message, error.retryable).await?;
        }
        kind::STREAM_ITEM => {
            let item: session::StreamItem = frame::decode_payload(raw)?;
            debug!(job_id = %item.job_id, seq = item.seq, is_last = item.is_last, "stream item");
        }
        other => {
            debug!(%agent_id, kind = other, "unexpected frame kind on session plane");
        }
    }
    Ok(())
}

#[cfg(test)]
#[path = "session_listener_tests.rs"]
mod tests;
