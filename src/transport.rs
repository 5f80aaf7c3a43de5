//! Newline-delimited JSON framing over a byte pipe.
//!
//! One JSON value per line, `\n`-terminated, flushed after every write so a
//! blocking reader on the other end of a pipe sees the frame immediately.

use serde::Serialize;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};

/// Maximum bytes per JSON-RPC message (1 MiB).
pub const MAX_MESSAGE_BYTES: usize = 1024 * 1024;

/// Outcome of reading one line.
#[derive(Debug)]
pub enum Frame {
    /// A line that decoded as JSON.
    Message(serde_json::Value),
    /// A whitespace-only line.
    Blank,
    /// A line that is not valid UTF-8 JSON, or exceeds [`MAX_MESSAGE_BYTES`].
    Malformed(String),
    /// End of stream.
    Eof,
}

/// Read the next frame, reusing `buf` as line storage.
pub async fn read_frame<R>(reader: &mut R, buf: &mut Vec<u8>) -> std::io::Result<Frame>
where
    R: AsyncBufRead + Unpin,
{
    buf.clear();
    let n = reader.read_until(b'\n', buf).await?;
    if n == 0 {
        return Ok(Frame::Eof);
    }

    if n > MAX_MESSAGE_BYTES {
        return Ok(Frame::Malformed(format!(
            "message too large: {n} bytes (limit {MAX_MESSAGE_BYTES})"
        )));
    }

    let line = match std::str::from_utf8(buf) {
        Ok(s) => s.trim(),
        Err(e) => return Ok(Frame::Malformed(format!("invalid UTF-8: {e}"))),
    };

    if line.is_empty() {
        return Ok(Frame::Blank);
    }

    match serde_json::from_str(line) {
        Ok(value) => Ok(Frame::Message(value)),
        Err(e) => Ok(Frame::Malformed(e.to_string())),
    }
}

/// Encode `message` as a single line and flush it.
pub async fn write_frame<W, T>(writer: &mut W, message: &T) -> std::io::Result<()>
where
    W: AsyncWrite + Unpin,
    T: Serialize + ?Sized,
{
    let mut out = serde_json::to_vec(message)?;
    out.push(b'\n');
    writer.write_all(&out).await?;
    writer.flush().await?;
    Ok(())
}
