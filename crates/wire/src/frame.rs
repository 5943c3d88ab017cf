// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Length-prefixed framing and routed envelopes.
//!
//! A frame is a 4-byte big-endian length followed by that many payload
//! bytes. Request/reply endpoints exchange single frames; the routed
//! front-end endpoints exchange envelopes of three frames:
//! `[identity, empty delimiter, body]`.

use thiserror::Error;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

/// Upper bound on a single frame payload (16 MiB).
pub const MAX_FRAME_LEN: usize = 16 * 1024 * 1024;

/// Errors from frame I/O.
#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Connection closed")]
    ConnectionClosed,

    #[error("Frame of {0} bytes exceeds maximum")]
    FrameTooLarge(usize),
}

/// Read one length-prefixed frame.
pub async fn read_message<R>(reader: &mut R) -> Result<Vec<u8>, ProtocolError>
where
    R: AsyncRead + Unpin,
{
    let mut len_buf = [0u8; 4];
    match reader.read_exact(&mut len_buf).await {
        Ok(_) => {}
        Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
            return Err(ProtocolError::ConnectionClosed)
        }
        Err(e) => return Err(e.into()),
    }
    let len = u32::from_be_bytes(len_buf) as usize;
    if len > MAX_FRAME_LEN {
        return Err(ProtocolError::FrameTooLarge(len));
    }
    let mut payload = vec![0u8; len];
    match reader.read_exact(&mut payload).await {
        Ok(_) => Ok(payload),
        Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
            Err(ProtocolError::ConnectionClosed)
        }
        Err(e) => Err(e.into()),
    }
}

/// Write one length-prefixed frame and flush.
pub async fn write_message<W>(writer: &mut W, payload: &[u8]) -> Result<(), ProtocolError>
where
    W: AsyncWrite + Unpin,
{
    if payload.len() > MAX_FRAME_LEN {
        return Err(ProtocolError::FrameTooLarge(payload.len()));
    }
    let len = payload.len() as u32;
    writer.write_all(&len.to_be_bytes()).await?;
    writer.write_all(payload).await?;
    writer.flush().await?;
    Ok(())
}

/// Read a routed envelope: identity frame, delimiter frame, body frame.
///
/// The delimiter content is not validated; routers only care about frame
/// positions.
pub async fn read_envelope<R>(reader: &mut R) -> Result<(Vec<u8>, Vec<u8>), ProtocolError>
where
    R: AsyncRead + Unpin,
{
    let identity = read_message(reader).await?;
    let _delimiter = read_message(reader).await?;
    let body = read_message(reader).await?;
    Ok((identity, body))
}

/// Write a routed envelope: identity frame, empty delimiter, body frame.
pub async fn write_envelope<W>(
    writer: &mut W,
    identity: &[u8],
    body: &[u8],
) -> Result<(), ProtocolError>
where
    W: AsyncWrite + Unpin,
{
    if identity.len() > MAX_FRAME_LEN || body.len() > MAX_FRAME_LEN {
        return Err(ProtocolError::FrameTooLarge(identity.len().max(body.len())));
    }
    writer.write_all(&(identity.len() as u32).to_be_bytes()).await?;
    writer.write_all(identity).await?;
    writer.write_all(&0u32.to_be_bytes()).await?;
    writer.write_all(&(body.len() as u32).to_be_bytes()).await?;
    writer.write_all(body).await?;
    writer.flush().await?;
    Ok(())
}

/// Decode an identity frame to the address string: UTF-8 when valid,
/// lowercase hex otherwise.
pub fn decode_identity(identity: &[u8]) -> String {
    match std::str::from_utf8(identity) {
        Ok(s) => s.to_string(),
        Err(_) => identity.iter().map(|b| format!("{b:02x}")).collect(),
    }
}

#[cfg(test)]
#[path = "frame_tests.rs"]
mod tests;
