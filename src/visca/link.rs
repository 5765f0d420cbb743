//! TCP link to a single camera.
//!
//! Blocking I/O with per-operation socket timeouts. One link carries one
//! command at a time; callers drain before every exchange so a late reply to
//! an earlier command is never read as the answer to the next one.

use std::io::{ErrorKind, Read, Write};
use std::net::{Shutdown, SocketAddr, TcpStream, ToSocketAddrs};
use std::time::Duration;

use tracing::{debug, error, info, warn};

use super::error::{ConnectError, LinkError, LinkResult};
use super::protocol::Command;
use super::types::RECV_BUFFER_SIZE;

/// Connection state of a link.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkState {
    Disconnected,
    Connected,
}

/// Byte transport beneath the position and motion services.
pub trait Transport {
    /// Discard every byte currently buffered on the link without blocking.
    ///
    /// Returns the number of bytes thrown away.
    fn drain(&mut self) -> LinkResult<usize>;

    /// Send `command`, then perform exactly one bounded read.
    ///
    /// The reply may be shorter than `expected_len`; callers validate it.
    fn exchange(&mut self, command: &Command, expected_len: usize) -> LinkResult<Vec<u8>>;
}

/// VISCA over IP link backed by a `std::net::TcpStream`.
pub struct TcpLink {
    stream: Option<TcpStream>,
    host: String,
    port: u16,
    timeout_duration: Duration,
}

impl TcpLink {
    /// Create a disconnected link.
    pub fn new(host: &str, port: u16, timeout_duration: Duration) -> Self {
        Self {
            stream: None,
            host: host.to_string(),
            port,
            timeout_duration,
        }
    }

    /// Create a link and connect it.
    pub fn open(host: &str, port: u16, timeout_duration: Duration) -> Result<Self, ConnectError> {
        let mut link = Self::new(host, port, timeout_duration);
        link.connect()?;
        Ok(link)
    }

    /// Camera address as `host:port`.
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn state(&self) -> LinkState {
        if self.stream.is_some() {
            LinkState::Connected
        } else {
            LinkState::Disconnected
        }
    }

    pub fn is_connected(&self) -> bool {
        self.stream.is_some()
    }

    /// Open the TCP stream and clear anything the camera sent on connect.
    pub fn connect(&mut self) -> Result<(), ConnectError> {
        let addr = self.addr();
        info!("Connecting to camera at {addr} (timeout={:?})", self.timeout_duration);

        let candidates: Vec<SocketAddr> = addr
            .to_socket_addrs()
            .map_err(|e| ConnectError::Resolve {
                addr: addr.clone(),
                reason: e.to_string(),
            })?
            .collect();

        if candidates.is_empty() {
            return Err(ConnectError::Resolve {
                addr,
                reason: "no addresses found".to_string(),
            });
        }

        let mut last_err = None;
        let mut stream = None;
        for candidate in candidates {
            match TcpStream::connect_timeout(&candidate, self.timeout_duration) {
                Ok(s) => {
                    stream = Some(s);
                    break;
                }
                Err(e) => {
                    debug!("Connect to {candidate} failed: {e}");
                    last_err = Some(e);
                }
            }
        }

        let stream = match (stream, last_err) {
            (Some(s), _) => s,
            (None, Some(e)) if e.kind() == ErrorKind::TimedOut => {
                error!("Connection timeout to {addr}");
                return Err(ConnectError::Timeout(addr));
            }
            (None, Some(e)) => {
                error!("Failed to connect to {addr}: {e}");
                return Err(ConnectError::Refused { addr, source: e });
            }
            (None, None) => return Err(ConnectError::Timeout(addr)),
        };

        stream.set_read_timeout(Some(self.timeout_duration))?;
        stream.set_write_timeout(Some(self.timeout_duration))?;
        stream.set_nodelay(true)?;
        self.stream = Some(stream);

        match self.drain() {
            Ok(0) => {}
            Ok(n) => debug!("Discarded {n} bytes buffered on connect"),
            Err(e) => warn!("Initial drain failed: {e}"),
        }

        info!("Connected to {addr}");
        Ok(())
    }

    /// Close the socket. Safe to call repeatedly.
    pub fn disconnect(&mut self) {
        if let Some(stream) = self.stream.take() {
            info!("Disconnecting from {}", self.addr());
            let _ = stream.shutdown(Shutdown::Both);
        }
    }

    /// Map an IO failure, dropping the socket unless it was a plain timeout.
    fn fail(&mut self, err: std::io::Error) -> LinkError {
        let err = LinkError::from_io(err);
        if !matches!(err, LinkError::Timeout) {
            error!("Link to {} failed: {err}", self.addr());
            self.stream = None;
        }
        err
    }

    fn closed_by_peer(&mut self) -> LinkError {
        warn!("Camera at {} closed the connection", self.addr());
        self.stream = None;
        LinkError::Io(std::io::Error::new(ErrorKind::UnexpectedEof, "connection closed by camera"))
    }
}

/// Read until the socket would block. `Ok(None)` means the peer closed.
fn read_available(stream: &mut TcpStream) -> std::io::Result<Option<usize>> {
    let mut buf = [0u8; 1024];
    let mut discarded = 0;
    loop {
        match stream.read(&mut buf) {
            Ok(0) => return Ok(None),
            Ok(n) => discarded += n,
            Err(e) if e.kind() == ErrorKind::WouldBlock => return Ok(Some(discarded)),
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
}

impl Transport for TcpLink {
    fn drain(&mut self) -> LinkResult<usize> {
        let stream = self.stream.as_mut().ok_or(LinkError::NotConnected)?;

        if let Err(e) = stream.set_nonblocking(true) {
            return Err(self.fail(e));
        }
        let outcome = read_available(stream);
        let restore = stream.set_nonblocking(false);

        match (outcome, restore) {
            (Ok(Some(n)), Ok(())) => {
                if n > 0 {
                    debug!("Drained {n} stale bytes");
                }
                Ok(n)
            }
            (Ok(None), _) => Err(self.closed_by_peer()),
            (Err(e), _) | (_, Err(e)) => Err(self.fail(e)),
        }
    }

    fn exchange(&mut self, command: &Command, expected_len: usize) -> LinkResult<Vec<u8>> {
        let packet = command.encode();
        let stream = self.stream.as_mut().ok_or(LinkError::NotConnected)?;

        debug!("TX ({} bytes): {:02X?}", packet.len(), packet);
        if let Err(e) = stream.write_all(&packet) {
            return Err(self.fail(e));
        }

        let mut buf = vec![0u8; expected_len.max(RECV_BUFFER_SIZE)];
        let received = loop {
            match stream.read(&mut buf) {
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                other => break other,
            }
        };

        match received {
            Ok(0) => Err(self.closed_by_peer()),
            Ok(n) => {
                buf.truncate(n);
                debug!("RX ({n} bytes): {:02X?}", buf);
                Ok(buf)
            }
            Err(e) => {
                let err = self.fail(e);
                if matches!(err, LinkError::Timeout) {
                    warn!("RX timeout after {:?}", self.timeout_duration);
                }
                Err(err)
            }
        }
    }
}

impl Drop for TcpLink {
    fn drop(&mut self) {
        self.disconnect();
    }
}
