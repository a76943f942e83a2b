//! Error types for logrelay

use thiserror::Error;

/// Core error type for logrelay operations
#[derive(Debug, Error)]
pub enum RelayError {
    /// Bad command line; the message is the usage text
    #[error("{0}")]
    Usage(String),

    /// The child could not be started; the message is shown to the user as is
    #[error("{0}")]
    Spawn(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl RelayError {
    pub fn usage(msg: impl Into<String>) -> Self {
        Self::Usage(msg.into())
    }

    pub fn spawn(msg: impl Into<String>) -> Self {
        Self::Spawn(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Code the supervisor exits with when this error ends it
    pub fn exit_code(&self) -> i32 {
        1
    }
}

pub type Result<T> = std::result::Result<T, RelayError>;
