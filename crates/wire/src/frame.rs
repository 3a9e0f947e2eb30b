// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Length-prefixed framing shared by the session wire and the admin control
//! plane: `u8 kind | u16 version | u32 length (big-endian) | JSON payload`.

use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

/// Current wire version. Bumped on any breaking payload schema change.
pub const WIRE_VERSION: u16 = 1;

/// Largest frame this implementation will read before erroring, guarding
/// against a misbehaving peer claiming an unbounded length.
pub const MAX_FRAME_LEN: u32 = 16 * 1024 * 1024;

#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("frame too large: {len} bytes exceeds max {max}")]
    FrameTooLarge { len: u32, max: u32 },
    #[error("unsupported wire version: {0}")]
    UnsupportedVersion(u16),
}

impl From<ProtocolError> for orbitmesh_core::OrbitError {
    fn from(err: ProtocolError) -> Self {
        orbitmesh_core::OrbitError::invalid_argument(err.to_string())
    }
}

/// A decoded frame header plus its still-serialized JSON payload.
pub struct RawFrame {
    pub kind: u8,
    pub version: u16,
    pub payload: Vec<u8>,
}

/// Encode `kind | version | len | payload` into one buffer.
pub fn encode_frame<T: Serialize>(kind: u8, value: &T) -> Result<Vec<u8>, ProtocolError> {
    let payload = serde_json::to_vec(value)?;
    if payload.len() as u64 > MAX_FRAME_LEN as u64 {
        return Err(ProtocolError::FrameTooLarge { len: payload.len() as u32, max: MAX_FRAME_LEN });
    }
    let mut buf = Vec::with_capacity(7 + payload.len());
    buf.push(kind);
    buf.extend_from_slice(&WIRE_VERSION.to_be_bytes());
    buf.extend_from_slice(&(payload.len() as u32).to_be_bytes());
    buf.extend_from_slice(&payload);
    Ok(buf)
}

/// Decode a previously-read frame's payload into `T`.
pub fn decode_payload<T: DeserializeOwned>(raw: &RawFrame) -> Result<T, ProtocolError> {
    Ok(serde_json::from_slice(&raw.payload)?)
}

/// Read one `kind | version | len | payload` frame from an async stream.
pub async fn read_frame<R: AsyncRead + Unpin>(reader: &mut R) -> Result<RawFrame, ProtocolError> {
    let kind = reader.read_u8().await?;
    let version = reader.read_u16().await?;
    let len = reader.read_u32().await?;
    if len > MAX_FRAME_LEN {
        return Err(ProtocolError::FrameTooLarge { len, max: MAX_FRAME_LEN });
    }
    let mut payload = vec![0u8; len as usize];
    reader.read_exact(&mut payload).await?;
    Ok(RawFrame { kind, version, payload })
}

/// Write one `kind | version | len | payload` frame to an async stream.
pub async fn write_frame<W: AsyncWrite + Unpin, T: Serialize>(
    writer: &mut W,
    kind: u8,
    value: &T,
) -> Result<(), ProtocolError> {
    let buf = encode_frame(kind, value)?;
    writer.write_all(&buf).await?;
    writer.flush().await?;
    Ok(())
}

#[cfg(test)]
#[path = "frame_tests.rs"]
mod tests;
