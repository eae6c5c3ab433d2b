//! Error types for the risk monitor.

use thiserror::Error;

/// Monitor error type
///
/// Every runtime kind is caught where it happens, logged and dropped; only
/// [`MonitorError::Config`] reaches the binary during startup.
#[derive(Debug, Error)]
pub enum MonitorError {
    /// Pull request rejected or backend unreachable
    #[error("Network failure: {0}")]
    Network(String),

    /// Response body or push frame did not match the expected shape
    #[error("Decode failure: {0}")]
    Decode(String),

    /// Push transport closed or errored
    #[error("Connection failure: {0}")]
    Connection(String),

    /// Push frame with an unknown or missing `type` discriminator
    #[error("Unrecognized message: {0}")]
    UnrecognizedMessage(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(#[from] crate::config::ConfigError),
}

impl MonitorError {
    /// Create a network error
    pub fn network(msg: impl Into<String>) -> Self {
        Self::Network(msg.into())
    }

    /// Create a decode error
    pub fn decode(msg: impl Into<String>) -> Self {
        Self::Decode(msg.into())
    }

    /// Create a connection error
    pub fn connection(msg: impl Into<String>) -> Self {
        Self::Connection(msg.into())
    }

    /// Create an unrecognized-message error
    pub fn unrecognized(msg: impl Into<String>) -> Self {
        Self::UnrecognizedMessage(msg.into())
    }
}

impl From<reqwest::Error> for MonitorError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            Self::Decode(err.to_string())
        } else {
            Self::Network(err.to_string())
        }
    }
}

/// Result alias used across the crate
pub type Result<T> = std::result::Result<T, MonitorError>;
