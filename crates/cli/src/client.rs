// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! A thin connection to `orbitmeshd`'s admin socket. The admin plane is one
//! request per connection (`orbitmesh_server::admin_listener::handle_connection`),
//! so every call here dials a fresh [`UnixStream`], except [`DaemonClient::subscribe`]
//! which upgrades into a long-lived event stream.

use orbitmesh_wire::frame::{self, ProtocolError};
use orbitmesh_wire::{Request, Response};
use std::path::PathBuf;
use thiserror::Error;
use tokio::net::UnixStream;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("connecting to {path}: {source}")]
    Connect { path: PathBuf, source: std::io::Error },
    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),
    #[error("server error ({tag}): {message}")]
    Server { tag: String, message: String },
    #[error("unexpected response from server")]
    UnexpectedResponse,
}

/// Issues [`Request`]s against one admin socket and decodes [`Response`]s.
pub struct DaemonClient {
    socket_path: PathBuf,
}

impl DaemonClient {
    pub fn new(socket_path: PathBuf) -> Self {
        Self { socket_path }
    }

    pub fn socket_path(&self) -> &PathBuf {
        &self.socket_path
    }

    async fn connect(&self) -> Result<UnixStream, ClientError> {
        UnixStream::connect(&self.socket_path)
            .await
            .map_err(|source| ClientError::Connect { path: self.socket_path.clone(), source })
    }

    /// Send one request and return whatever the server sent back, errors included.
    pub async fn send(&self, request: &Request) -> Result<Response, ClientError> {
        let mut stream = self.connect().await?;
        frame::write_frame(&mut stream, 0, request).await?;
        let raw = frame::read_frame(&mut stream).await?;
        Ok(frame::decode_payload(&raw)?)
    }

    /// Send a request whose only successful shape is [`Response::Ok`].
    pub async fn send_ok(&self, request: &Request) -> Result<(), ClientError> {
        match self.send(request).await? {
            Response::Ok => Ok(()),
            other => Self::reject(other),
        }
    }

    /// Turn a non-matching response into the right [`ClientError`] variant.
    pub(crate) fn reject<T>(response: Response) -> Result<T, ClientError> {
        match response {
            Response::Error { tag, message } => Err(ClientError::Server { tag, message }),
            _ => Err(ClientError::UnexpectedResponse),
        }
    }

    /// Open a long-lived connection and yield [`Response::Event`] payloads
    /// until the server closes it.
    pub async fn subscribe(&self, topic_filter: Option<String>) -> Result<EventStream, ClientError> {
        let mut stream = self.connect().await?;
        frame::write_frame(&mut stream, 0, &Request::EventsSubscribe { topic_filter }).await?;
        Ok(EventStream { stream })
    }
}

/// The receiving half of a subscribed admin connection.
pub struct EventStream {
    stream: UnixStream,
}

impl EventStream {
    /// Read the next event frame, or `None` once the server closes the connection.
    pub async fn next(&mut self) -> Result<Option<orbitmesh_core::Event>, ClientError> {
        match frame::read_frame(&mut self.stream).await {
            Ok(raw) => match frame::decode_payload(&raw)? {
                Response::Event { event } => Ok(Some(event)),
                other => Self::reject_event(other),
            },
            Err(ProtocolError::Io(err)) if err.kind() == std::io::ErrorKind::UnexpectedEof => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    fn reject_event(response: Response) -> Result<Option<orbitmesh_core::Event>, ClientError> {
        match response {
            Response::Error { tag, message } => Err(ClientError::Server { tag, message }),
            _ => Err(ClientError::UnexpectedResponse),
        }
    }
}

#[cfg(test)]
#[path = "client_tests.rs"]
mod tests;
