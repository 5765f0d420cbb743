//! VISCA protocol error types.

use thiserror::Error;

/// Errors raised while opening the TCP connection to a camera.
#[derive(Error, Debug)]
pub enum ConnectError {
    /// Host name could not be resolved to an address.
    #[error("Failed to resolve {addr}: {reason}")]
    Resolve { addr: String, reason: String },

    /// No connection within the configured timeout.
    #[error("Connection timeout to {0}")]
    Timeout(String),

    /// Camera refused or the network is unreachable.
    #[error("Failed to connect to {addr}: {source}")]
    Refused {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    /// Socket options could not be applied after connecting.
    #[error("Failed to configure socket: {0}")]
    Socket(#[from] std::io::Error),
}

/// Errors raised by a single send/receive exchange on an open link.
#[derive(Error, Debug)]
pub enum LinkError {
    /// No reply within the socket timeout.
    #[error("Timeout waiting for response")]
    Timeout,

    /// IO error during socket operations.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Operation attempted without an active connection.
    #[error("Camera not connected")]
    NotConnected,
}

impl LinkError {
    /// Map an IO error from a read or write, folding the timeout kinds into `Timeout`.
    pub(crate) fn from_io(err: std::io::Error) -> Self {
        match err.kind() {
            std::io::ErrorKind::TimedOut | std::io::ErrorKind::WouldBlock => Self::Timeout,
            _ => Self::Io(err),
        }
    }
}

/// Reply bytes that do not decode into the expected fields.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    /// Reply shorter than the inquiry requires.
    #[error("Reply too short: expected {expected} bytes, got {actual}")]
    TooShort { expected: usize, actual: usize },

    /// Reply did not classify as an inquiry reply.
    #[error("Unexpected reply: {0:02X?}")]
    UnexpectedReply(Vec<u8>),

    /// A packed field byte was outside 0x0..=0xF.
    #[error("Invalid nibble {value:#04X} at offset {offset}")]
    InvalidNibble { offset: usize, value: u8 },
}

/// Result type for VISCA link operations.
pub type LinkResult<T> = std::result::Result<T, LinkError>;
