//! Error types for mcbin
//!
//! Provides a unified error type for all client operations, plus a closed
//! `ErrorKind` enumeration for matching failures by kind.

use thiserror::Error;

/// Result type alias using McError
pub type Result<T> = std::result::Result<T, McError>;

/// Unified error type for mcbin operations
#[derive(Debug, Error)]
pub enum McError {
    // -------------------------------------------------------------------------
    // Command Errors (mapped from response status codes)
    // -------------------------------------------------------------------------
    #[error("Key not found")]
    NotFound,

    #[error("Key exists")]
    KeyExists,

    #[error("Value too large")]
    ValueTooLarge,

    #[error("Invalid arguments")]
    InvalidArguments,

    #[error("Value not stored")]
    ValueNotStored,

    #[error("Incr/decr on non-numeric value")]
    NonNumericValue,

    #[error("Unknown command")]
    UnknownCommand,

    #[error("Out of memory")]
    OutOfMemory,

    #[error("Command not supported")]
    NotSupported,

    #[error("Server busy")]
    Busy,

    #[error("Temporary failure")]
    TemporaryFailure,

    /// Any other non-zero status; `message` is the diagnostic body sent by the server
    #[error("Server error 0x{status:04x}: {message}")]
    Server { status: u16, message: String },

    // -------------------------------------------------------------------------
    // Authentication Errors
    // -------------------------------------------------------------------------
    #[error("Authentication failed: {0}")]
    AuthFailed(String),

    // -------------------------------------------------------------------------
    // Transport / Protocol Errors (fatal to the connection)
    // -------------------------------------------------------------------------
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Protocol error: {0}")]
    Protocol(String),

    #[error("Connection is no longer usable after a previous fatal error")]
    ConnectionBroken,

    // -------------------------------------------------------------------------
    // Client-side Errors
    // -------------------------------------------------------------------------
    #[error("Invalid key: {0}")]
    InvalidKey(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

/// Closed set of failure kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    NotFound,
    KeyExists,
    ValueTooLarge,
    InvalidArguments,
    ValueNotStored,
    NonNumericValue,
    UnknownCommand,
    OutOfMemory,
    NotSupported,
    Busy,
    TemporaryFailure,
    Server,
    AuthFailed,
    Transport,
    Protocol,
    ConnectionBroken,
    InvalidKey,
    Config,
}

impl McError {
    /// The kind of this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            McError::NotFound => ErrorKind::NotFound,
            McError::KeyExists => ErrorKind::KeyExists,
            McError::ValueTooLarge => ErrorKind::ValueTooLarge,
            McError::InvalidArguments => ErrorKind::InvalidArguments,
            McError::ValueNotStored => ErrorKind::ValueNotStored,
            McError::NonNumericValue => ErrorKind::NonNumericValue,
            McError::UnknownCommand => ErrorKind::UnknownCommand,
            McError::OutOfMemory => ErrorKind::OutOfMemory,
            McError::NotSupported => ErrorKind::NotSupported,
            McError::Busy => ErrorKind::Busy,
            McError::TemporaryFailure => ErrorKind::TemporaryFailure,
            McError::Server { .. } => ErrorKind::Server,
            McError::AuthFailed(_) => ErrorKind::AuthFailed,
            McError::Io(_) => ErrorKind::Transport,
            McError::Protocol(_) => ErrorKind::Protocol,
            McError::ConnectionBroken => ErrorKind::ConnectionBroken,
            McError::InvalidKey(_) => ErrorKind::InvalidKey,
            McError::Config(_) => ErrorKind::Config,
        }
    }

    /// True if the connection that produced this error can no longer be used
    pub fn is_fatal(&self) -> bool {
        matches!(
            self.kind(),
            ErrorKind::Transport | ErrorKind::Protocol | ErrorKind::ConnectionBroken
        )
    }
}
