//! Unix domain socket listener and stream.

use std::path::Path;

use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::{UnixListener, UnixStream};

use crate::error::Result;

/// Unix domain socket listener.
pub struct SocketListener {
    listener: UnixListener,
    path: String,
}

/// Connected Unix domain socket stream.
pub struct SocketStream {
    stream: UnixStream,
}

/// Cleanup guard that removes the socket file on drop.
pub struct SocketCleanup {
    path: String,
}

impl Drop for SocketCleanup {
    fn drop(&mut self) {
        let _ = std::fs::remove_file(&self.path);
    }
}

impl SocketListener {
    /// Bind to a socket path.
    ///
    /// Removes any stale socket file at the path before binding.
    pub fn bind<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if path.exists() {
            std::fs::remove_file(path)?;
        }

        let listener = UnixListener::bind(path)?;
        let path = path.to_string_lossy().into_owned();
        tracing::debug!(%path, "listening");

        Ok(Self { listener, path })
    }

    /// Accept a single connection.
    pub async fn accept(&self) -> Result<SocketStream> {
        let (stream, _addr) = self.listener.accept().await?;
        tracing::debug!(path = %self.path, "connection accepted");
        Ok(SocketStream { stream })
    }

    /// The socket path.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Create a cleanup guard that removes the socket file on drop.
    pub fn cleanup_guard(&self) -> SocketCleanup {
        SocketCleanup {
            path: self.path.clone(),
        }
    }
}

impl Drop for SocketListener {
    fn drop(&mut self) {
        let _ = std::fs::remove_file(&self.path);
    }
}

impl SocketStream {
    /// Connect to a listening socket.
    pub async fn connect<P: AsRef<Path>>(path: P) -> Result<Self> {
        let stream = UnixStream::connect(path.as_ref()).await?;
        tracing::debug!(path = %path.as_ref().display(), "connected");
        Ok(Self { stream })
    }

    /// Split into read and write halves.
    pub fn into_split(self) -> (impl AsyncRead, impl AsyncWrite) {
        self.stream.into_split()
    }

    /// Get a reference to the underlying stream.
    pub fn inner(&self) -> &UnixStream {
        &self.stream
    }

    /// Get a mutable reference to the underlying stream.
    pub fn inner_mut(&mut self) -> &mut UnixStream {
        &mut self.stream
    }
}

impl AsyncRead for SocketStream {
    fn poll_read(
        mut self: std::pin::Pin<&mut Self>,
        cx: &mut std::task::Context<'_>,
        buf: &mut tokio::io::ReadBuf<'_>,
    ) -> std::task::Poll<std::io::Result<()>> {
        std::pin::Pin::new(&mut self.stream).poll_read(cx, buf)
    }
}

impl AsyncWrite for SocketStream {
    fn poll_write(
        mut self: std::pin::Pin<&mut Self>,
        cx: &mut std::task::Context<'_>,
        buf: &[u8],
    ) -> std::task::Poll<std::io::Result<usize>> {
        std::pin::Pin::new(&mut self.stream).poll_write(cx, buf)
    }

    fn poll_flush(
        mut self: std::pin::Pin<&mut Self>,
        cx: &mut std::task::Context<'_>,
    ) -> std::task::Poll<std::io::Result<()>> {
        std::pin::Pin::new(&mut self.stream).poll_flush(cx)
    }

    fn poll_shutdown(
        mut self: std::pin::Pin<&mut Self>,
        cx: &mut std::task::Context<'_>,
    ) -> std::task::Poll<std::io::Result<()>> {
        std::pin::Pin::new(&mut self.stream).poll_shutdown(cx)
    }
}
