//! Error types for the hzsql client.

use hzsql_core::{ConfigError, UrlError};
use thiserror::Error;

/// Failure reported by a [`ConnectionProvider`](crate::ConnectionProvider).
#[derive(Debug, Error)]
pub enum ConnectError {
    #[error("cluster '{cluster}' unreachable at {members}: {message}")]
    Unreachable {
        cluster: String,
        members: String,
        message: String,
    },

    #[error("connection to {members} timed out after {timeout_ms}ms")]
    Timeout { members: String, timeout_ms: u64 },

    #[error("connection rejected: {0}")]
    Rejected(String),
}

/// Failure reported by a [`ConnectionHandle`](crate::ConnectionHandle) while executing.
#[derive(Debug, Error)]
pub enum ExecuteError {
    #[error("connection is not running")]
    NotRunning,

    #[error("statement failed: {0}")]
    Failed(String),
}

/// Why a connection could not be constructed.
#[derive(Debug, Error)]
pub enum ConstructionError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Connect(#[from] ConnectError),
}

#[derive(Debug, Error)]
pub enum ClientError {
    #[error(transparent)]
    Url(#[from] UrlError),

    /// No entry is left in the cache for `url`; a later acquire tries again.
    #[error("failed to construct connection for {url}: {source}")]
    ConnectionConstruction {
        url: String,
        #[source]
        source: ConstructionError,
    },

    #[error(transparent)]
    Execute(#[from] ExecuteError),

    #[error("client for {0} has been shut down")]
    ClientShutdown(String),
}

impl ClientError {
    pub(crate) fn construction(url: &str, source: impl Into<ConstructionError>) -> Self {
        ClientError::ConnectionConstruction {
            url: url.to_string(),
            source: source.into(),
        }
    }
}
