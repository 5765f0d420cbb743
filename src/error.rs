//! Error types and handling.

use thiserror::Error;

use crate::visca::{ConnectError, DecodeError, LinkError};

/// Application-wide error type
#[derive(Error, Debug)]
pub enum AppError {
    /// Camera could not be reached
    #[error("Connect error: {0}")]
    Connect(#[from] ConnectError),

    /// Send/receive on an open link failed
    #[error("Link error: {0}")]
    Link(#[from] LinkError),

    /// Reply bytes could not be decoded
    #[error("Decode error: {0}")]
    Decode(#[from] DecodeError),

    /// Camera answered with a VISCA error reply
    #[error("Device rejected command: {0}")]
    Device(String),

    /// Input rejected before any I/O
    #[error("Validation error: {0}")]
    Validation(String),

    /// Data parsing error
    #[error("Parse error: {0}")]
    Parse(String),

    /// File I/O error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Preset file (de)serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Background task panicked or was cancelled
    #[error("Task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

/// Result type alias for AppError
pub type Result<T> = std::result::Result<T, AppError>;

impl AppError {
    /// Create a parse error with message
    pub fn parse(msg: impl Into<String>) -> Self {
        Self::Parse(msg.into())
    }

    /// Create a validation error with message
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }
}
