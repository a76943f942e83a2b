//! Host error types

use thiserror::Error;

/// Errors from host operations
#[derive(Debug, Error)]
pub enum HostError {
    /// The child executable could not be started
    #[error("Failed to spawn {program}: {source}")]
    Spawn {
        program: String,
        source: std::io::Error,
    },

    #[error("Pipe setup failed: {0}")]
    Pipe(String),

    #[error("Signal setup failed: {0}")]
    Signal(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type HostResult<T> = Result<T, HostError>;

impl From<HostError> for logrelay_core::RelayError {
    fn from(err: HostError) -> Self {
        match err {
            HostError::Spawn { .. } => Self::Spawn(err.to_string()),
            HostError::Io(e) => Self::Io(e),
            other => Self::Internal(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use logrelay_core::RelayError;

    #[test]
    fn spawn_error_message_names_program() {
        let err = HostError::Spawn {
            program: "/no/such/tool".into(),
            source: std::io::Error::from(std::io::ErrorKind::NotFound),
        };
        assert!(err.to_string().starts_with("Failed to spawn /no/such/tool: "));

        let relay: RelayError = err.into();
        assert!(matches!(relay, RelayError::Spawn(ref msg) if msg.starts_with("Failed to spawn /no/such/tool")));
    }

    #[test]
    fn pipe_error_becomes_internal_relay_error() {
        let relay: RelayError = HostError::Pipe("EMFILE".into()).into();
        assert!(matches!(relay, RelayError::Internal(_)));
    }
}
