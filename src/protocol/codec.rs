//! Length-prefixed framing for byte-stream channels.
//!
//! Wire format: `[u32 BE length][JSON payload]`. The length counts the JSON
//! payload only. Used by the process substrate over child stdin/stdout.

use serde_json::Value;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use super::{Channel, ChannelError};

/// Maximum frame size: 16 MiB.
pub const MAX_FRAME_SIZE: u32 = 16 * 1024 * 1024;

/// Write one JSON value as a length-prefixed frame and flush.
///
/// # Errors
///
/// Returns an error if the payload exceeds [`MAX_FRAME_SIZE`] or the writer
/// fails.
pub async fn write_frame<W>(writer: &mut W, value: &Value) -> Result<(), ChannelError>
where
    W: AsyncWrite + Unpin,
{
    let data = serde_json::to_vec(value)?;
    let len = u32::try_from(data.len()).unwrap_or(u32::MAX);
    if len > MAX_FRAME_SIZE {
        return Err(ChannelError::TooLarge { size: len });
    }
    writer.write_all(&len.to_be_bytes()).await?;
    writer.write_all(&data).await?;
    writer.flush().await?;
    Ok(())
}

/// Read one length-prefixed frame and parse it as JSON.
///
/// # Errors
///
/// Returns [`ChannelError::Closed`] on EOF before a frame header, and other
/// variants for oversized frames, truncated payloads, or invalid JSON.
pub async fn read_frame<R>(reader: &mut R) -> Result<Value, ChannelError>
where
    R: AsyncRead + Unpin,
{
    let mut len_buf = [0u8; 4];
    match reader.read_exact(&mut len_buf).await {
        Ok(_) => {}
        Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
            return Err(ChannelError::Closed);
        }
        Err(e) => return Err(ChannelError::Io(e)),
    }

    let len = u32::from_be_bytes(len_buf);
    if len > MAX_FRAME_SIZE {
        return Err(ChannelError::TooLarge { size: len });
    }

    let mut buf = vec![0u8; len as usize];
    reader.read_exact(&mut buf).await?;
    Ok(serde_json::from_slice(&buf)?)
}

/// [`Channel`] over a reader/writer pair of byte streams.
#[derive(Debug)]
pub struct FramedChannel<R, W> {
    reader: R,
    writer: W,
}

impl<R, W> FramedChannel<R, W> {
    /// Wrap a reader and a writer.
    pub const fn new(reader: R, writer: W) -> Self {
        Self { reader, writer }
    }
}

impl<R, W> Channel for FramedChannel<R, W>
where
    R: AsyncRead + Unpin + Send,
    W: AsyncWrite + Unpin + Send,
{
    async fn send(&mut self, value: Value) -> Result<(), ChannelError> {
        write_frame(&mut self.writer, &value).await
    }

    async fn recv(&mut self) -> Result<Value, ChannelError> {
        read_frame(&mut self.reader).await
    }
}
