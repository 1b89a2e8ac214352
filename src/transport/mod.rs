//! Length-prefixed binary framing over a reliable byte stream.
//!
//! Each frame is a 4-byte big-endian unsigned length followed by that many
//! bytes of UTF-8 JSON payload. Reads fail with [`FrameError::Closed`] when
//! the peer closes cleanly between frames, [`FrameError::Malformed`] when the
//! declared length exceeds [`MAX_FRAME_BYTES`], and [`FrameError::Truncated`]
//! when the stream ends mid-frame. A connection has a single writer
//! discipline: [`FramedTransport`] serializes writes behind an internal lock
//! so the owning endpoint task is free to pass clones around without a
//! separate outbound queue.

mod error;

pub use error::FrameError;

use std::sync::Arc;

use bytes::{Buf, BufMut, BytesMut};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpStream;
use tokio::sync::Mutex;

/// Ceiling on a single frame's payload, per spec.
pub const MAX_FRAME_BYTES: u32 = 10 * 1024 * 1024;

const LENGTH_PREFIX_BYTES: usize = 4;

/// A length-prefixed frame reader. Owns the read half; not `Clone` since a
/// connection has exactly one reader.
pub struct FrameReader {
    inner: OwnedReadHalf,
}

impl FrameReader {
    /// Reads one frame's raw payload bytes.
    pub async fn read_frame(&mut self) -> Result<Vec<u8>, FrameError> {
        let mut len_buf = [0u8; LENGTH_PREFIX_BYTES];
        match self.inner.read_exact(&mut len_buf).await {
            Ok(_) => {}
            Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
                return Err(FrameError::Closed)
            }
            Err(e) => return Err(FrameError::Io(e)),
        }

        let len = u32::from_be_bytes(len_buf);
        if len > MAX_FRAME_BYTES {
            return Err(FrameError::Malformed(format!(
                "frame length {len} exceeds ceiling of {MAX_FRAME_BYTES} bytes"
            )));
        }

        let mut payload = vec![0u8; len as usize];
        if let Err(e) = self.inner.read_exact(&mut payload).await {
            return Err(match e.kind() {
                std::io::ErrorKind::UnexpectedEof => FrameError::Truncated,
                _ => FrameError::Io(e),
            });
        }
        Ok(payload)
    }

    /// Reads one frame and deserializes it as JSON.
    pub async fn read_json<T: DeserializeOwned>(&mut self) -> Result<T, FrameError> {
        let payload = self.read_frame().await?;
        serde_json::from_slice(&payload)
            .map_err(|e| FrameError::Malformed(format!("invalid JSON payload: {e}")))
    }
}

/// A length-prefixed frame writer, shared behind a lock so every caller on a
/// connection can write a full frame atomically without a separate outbound
/// queue (the teacher's single-writer-per-connection discipline).
#[derive(Clone)]
pub struct FrameWriter {
    inner: Arc<Mutex<OwnedWriteHalf>>,
}

impl FrameWriter {
    /// Writes one frame's raw payload bytes atomically.
    pub async fn write_frame(&self, payload: &[u8]) -> Result<(), FrameError> {
        if payload.len() as u64 > MAX_FRAME_BYTES as u64 {
            return Err(FrameError::Malformed(format!(
                "outgoing frame of {} bytes exceeds ceiling of {MAX_FRAME_BYTES} bytes",
                payload.len()
            )));
        }

        let mut buf = BytesMut::with_capacity(LENGTH_PREFIX_BYTES + payload.len());
        buf.put_u32(payload.len() as u32);
        buf.put_slice(payload);

        let mut writer = self.inner.lock().await;
        writer.write_all(&buf).await?;
        writer.flush().await?;
        Ok(())
    }

    /// Serializes `value` as JSON and writes it as one frame.
    pub async fn write_json<T: Serialize>(&self, value: &T) -> Result<(), FrameError> {
        let payload = serde_json::to_vec(value)
            .map_err(|e| FrameError::Malformed(format!("failed to serialize response: {e}")))?;
        self.write_frame(&payload).await
    }
}

/// A split, ready-to-use transport over one accepted TCP connection.
pub struct FramedTransport {
    pub reader: FrameReader,
    pub writer: FrameWriter,
}

impl FramedTransport {
    /// Splits a connected stream into an owned reader/writer pair.
    pub fn new(stream: TcpStream) -> Self {
        let _ = stream.set_nodelay(true);
        let (read_half, write_half) = stream.into_split();
        Self {
            reader: FrameReader { inner: read_half },
            writer: FrameWriter {
                inner: Arc::new(Mutex::new(write_half)),
            },
        }
    }
}

/// Decodes a length prefix out of a byte slice, used by property tests that
/// exercise the wire format without a live socket.
#[allow(dead_code)]
pub fn peek_declared_length(bytes: &[u8]) -> Option<u32> {
    if bytes.len() < LENGTH_PREFIX_BYTES {
        return None;
    }
    let mut cursor = &bytes[..LENGTH_PREFIX_BYTES];
    Some(cursor.get_u32())
}
