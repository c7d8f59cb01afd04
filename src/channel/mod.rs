//! Content ↔ background messaging over Unix sockets
//!
//! Length-prefixed JSON between the content-side process and the background
//! fetch service. A missing or unreachable socket is the "channel
//! unavailable" condition the preview controller falls back on.

use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};
use std::io::{Read, Write};
use std::os::unix::net::{UnixListener, UnixStream};
use std::path::{Path, PathBuf};

mod messages;
pub use messages::{FetchReply, Notification, Request, Response};

/// Maximum message size (10 MB) to prevent memory exhaustion on a bad peer
const MAX_MESSAGE_SIZE: usize = 10 * 1024 * 1024;

/// Default socket path (XDG_RUNTIME_DIR with fallback to cache dir)
pub fn default_socket_path() -> Result<PathBuf> {
    if let Ok(runtime_dir) = std::env::var("XDG_RUNTIME_DIR") {
        return Ok(PathBuf::from(runtime_dir).join("linkpeek/background.sock"));
    }

    let cache = dirs::cache_dir()
        .context("Failed to determine cache directory (no XDG_RUNTIME_DIR or HOME)")?;
    Ok(cache.join("linkpeek/background.sock"))
}

/// Client connection to the background service (used by the content side)
pub struct BackgroundClient {
    stream: UnixStream,
}

impl BackgroundClient {
    /// Connect to the background service socket
    pub fn connect() -> Result<Self> {
        let path = default_socket_path()?;
        Self::connect_to(&path)
    }

    /// Connect to a specific socket path
    pub fn connect_to(path: &Path) -> Result<Self> {
        let stream = UnixStream::connect(path)
            .context(format!("Failed to connect to background service at {}", path.display()))?;
        Ok(Self { stream })
    }

    /// Send a request and wait for the response
    pub fn request(&mut self, req: &Request) -> Result<Response> {
        write_message(&mut self.stream, req)?;
        read_message(&mut self.stream)
    }
}

/// Server listener for the background service
pub struct BackgroundServer {
    listener: UnixListener,
    socket_path: PathBuf,
}

/// One accepted peer connection on the background side
pub struct Peer {
    stream: UnixStream,
}

impl Peer {
    /// Receive the next request (blocking); Ok(None) on clean disconnect
    pub fn recv_request(&mut self) -> Result<Option<Request>> {
        match read_message(&mut self.stream) {
            Ok(req) => Ok(Some(req)),
            Err(e) if is_disconnect(&e) => Ok(None),
            Err(e) => Err(e),
        }
    }

    pub fn send_response(&mut self, resp: &Response) -> Result<()> {
        write_message(&mut self.stream, resp)
    }
}

fn is_disconnect(err: &anyhow::Error) -> bool {
    err.downcast_ref::<std::io::Error>()
        .is_some_and(|io| io.kind() == std::io::ErrorKind::UnexpectedEof)
}

impl BackgroundServer {
    /// Bind to the default socket path
    pub fn bind() -> Result<Self> {
        let socket_path = default_socket_path()?;
        Self::bind_to(socket_path)
    }

    /// Bind to a specific socket path
    pub fn bind_to(socket_path: PathBuf) -> Result<Self> {
        if let Some(parent) = socket_path.parent() {
            std::fs::create_dir_all(parent)
                .context(format!("Failed to create socket directory: {}", parent.display()))?;
        }

        // Remove stale socket if exists
        if socket_path.exists() {
            std::fs::remove_file(&socket_path)
                .context(format!("Failed to remove stale socket: {}", socket_path.display()))?;
        }

        let listener = UnixListener::bind(&socket_path)
            .context(format!("Failed to bind socket at {}", socket_path.display()))?;

        // Owner-only socket
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(&socket_path, std::fs::Permissions::from_mode(0o700))
                .context("Failed to set socket permissions")?;
        }

        Ok(Self { listener, socket_path })
    }

    /// Accept an incoming connection (blocking)
    pub fn accept(&self) -> Result<Peer> {
        let (stream, _addr) = self.listener.accept().context("Failed to accept connection")?;
        Ok(Peer { stream })
    }

    pub fn path(&self) -> &Path {
        &self.socket_path
    }
}

impl Drop for BackgroundServer {
    fn drop(&mut self) {
        let _ = std::fs::remove_file(&self.socket_path);
    }
}

/// Write a length-prefixed message to the stream
fn write_message<T: Serialize>(stream: &mut UnixStream, msg: &T) -> Result<()> {
    let json = serde_json::to_vec(msg).context("Failed to serialize message to JSON")?;

    let len = json.len() as u32;
    stream
        .write_all(&len.to_le_bytes())
        .context("Failed to write message length")?;

    stream.write_all(&json).context("Failed to write message payload")?;
    stream.flush().context("Failed to flush stream")?;

    Ok(())
}

/// Read a length-prefixed message from the stream
fn read_message<T: for<'de> Deserialize<'de>>(stream: &mut UnixStream) -> Result<T> {
    let mut len_buf = [0u8; 4];
    stream.read_exact(&mut len_buf).context("Failed to read message length")?;
    let len = u32::from_le_bytes(len_buf) as usize;

    if len > MAX_MESSAGE_SIZE {
        return Err(anyhow!("Message too large: {} bytes (max: {})", len, MAX_MESSAGE_SIZE));
    }

    let mut json_buf = vec![0u8; len];
    stream.read_exact(&mut json_buf).context("Failed to read message payload")?;

    serde_json::from_slice(&json_buf).context("Failed to deserialize message from JSON")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_request_response_over_socket() {
        let dir = std::env::temp_dir().join(format!("linkpeek-test-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("chan.sock");

        let server = BackgroundServer::bind_to(path.clone()).unwrap();
        let handle = thread::spawn(move || {
            let mut peer = server.accept().unwrap();
            let req = peer.recv_request().unwrap().unwrap();
            match req {
                Request::FetchContent { url } => {
                    assert_eq!(url, "https://example.org/");
                    peer.send_response(&Response::Fetch {
                        reply: FetchReply::Image { url },
                    })
                    .unwrap();
                }
                other => panic!("unexpected request: {other:?}"),
            }
            // Clean disconnect yields None
            assert!(peer.recv_request().unwrap().is_none());
        });

        let mut client = BackgroundClient::connect_to(&path).unwrap();
        let resp = client
            .request(&Request::FetchContent { url: "https://example.org/".to_string() })
            .unwrap();
        match resp {
            Response::Fetch { reply: FetchReply::Image { url } } => {
                assert_eq!(url, "https://example.org/");
            }
            other => panic!("unexpected response: {other:?}"),
        }

        drop(client);
        handle.join().unwrap();
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_connect_to_missing_socket_fails() {
        let path = std::env::temp_dir().join("linkpeek-no-such-socket.sock");
        assert!(BackgroundClient::connect_to(&path).is_err());
    }
}
