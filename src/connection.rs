//! Message exchange over a stream-oriented connection.
//!
//! The codec never performs I/O itself; these helpers are the thin layer in
//! between. Reading accumulates socket data into a caller-supplied buffer
//! and re-parses from the start after every read until the message is
//! complete - a request ends with an empty STDIN record, a response with an
//! END_REQUEST record. Writing hands the built byte range to the transport
//! verbatim.
//!
//! One buffer and one reader/writer belong to one connection at a time;
//! serializing access across connections is the caller's concern.

use bytes::BytesMut;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::error::{FcgiWireError, Result};
use crate::protocol::{Header, MessageView};

/// Capacity reserved ahead of each socket read.
const READ_CHUNK: usize = 8 * 1024;

/// Write a built message verbatim and flush.
pub async fn write_message<W>(writer: &mut W, bytes: &[u8]) -> Result<()>
where
    W: AsyncWrite + Unpin,
{
    writer.write_all(bytes).await?;
    writer.flush().await?;
    tracing::trace!(bytes = bytes.len(), "message written");
    Ok(())
}

/// Read until the buffer holds a complete request (an empty STDIN record).
///
/// Returns the total number of buffered bytes. Fails with
/// [`FcgiWireError::Protocol`] when the stream contains an invalid record
/// header and with [`FcgiWireError::ConnectionClosed`] on EOF before
/// completion.
pub async fn read_request<R>(reader: &mut R, buf: &mut BytesMut) -> Result<usize>
where
    R: AsyncRead + Unpin,
{
    read_until(reader, buf, |view| view.is_complete_request()).await
}

/// Read until the buffer holds a complete response (an END_REQUEST record).
///
/// Same contract as [`read_request`].
pub async fn read_response<R>(reader: &mut R, buf: &mut BytesMut) -> Result<usize>
where
    R: AsyncRead + Unpin,
{
    read_until(reader, buf, |view| view.is_complete_response()).await
}

async fn read_until<R, F>(reader: &mut R, buf: &mut BytesMut, complete: F) -> Result<usize>
where
    R: AsyncRead + Unpin,
    F: Fn(&MessageView<'_>) -> bool,
{
    loop {
        {
            let view = MessageView::new(&buf[..]);
            if complete(&view) {
                tracing::debug!(bytes = buf.len(), "message complete");
                return Ok(buf.len());
            }

            // Whatever the records did not consume is either a record still
            // in flight or garbage; a decodable header that fails validation
            // means the latter.
            let mut records = view.records();
            records.by_ref().for_each(|_| {});
            if let Some(header) = Header::decode(records.trailing()) {
                if !header.is_valid() {
                    return Err(FcgiWireError::Protocol(format!(
                        "invalid record header (version {}, type {})",
                        header.version, header.record_type
                    )));
                }
            }
        }

        buf.reserve(READ_CHUNK);
        let n = reader.read_buf(buf).await?;
        if n == 0 {
            return Err(FcgiWireError::ConnectionClosed);
        }
        tracing::trace!(bytes = n, buffered = buf.len(), "socket read");
    }
}
