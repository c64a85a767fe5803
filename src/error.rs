//! Error types for DAI tracker operations
//!
//! One error type for the whole pipeline: chain reads, local cache,
//! remote store and payload (de)serialization.

use std::error::Error as StdError;
use std::fmt;

/// Core error type for balance synchronization
///
/// Chain-side variants abort a sync. Store-side variants are mostly
/// swallowed by `WalletStore`, which degrades to the local cache.
#[derive(Clone, Debug)]
pub enum TrackerError {
    /// HTTP transport to the RPC endpoint failed
    ConnectionFailed(String),

    /// The RPC endpoint answered with a JSON-RPC error object
    RpcError { code: i64, message: String },

    /// Invalid response from the RPC endpoint
    InvalidResponse(String),

    /// ABI decoding of a call result failed
    DecodeFailed(String),

    /// Local cache could not be read or written
    StorageFailed(String),

    /// Remote store request failed
    RemoteStoreFailed(String),

    /// Serialization error
    SerializationError(String),
}

impl fmt::Display for TrackerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ConnectionFailed(msg) => {
                write!(f, "Failed to reach RPC endpoint: {}", msg)
            }
            Self::RpcError { code, message } => {
                write!(f, "RPC error: code={}, message={}", code, message)
            }
            Self::InvalidResponse(msg) => {
                write!(f, "Invalid response from RPC endpoint: {}", msg)
            }
            Self::DecodeFailed(msg) => {
                write!(f, "ABI decode failed: {}", msg)
            }
            Self::StorageFailed(msg) => {
                write!(f, "Local storage failed: {}", msg)
            }
            Self::RemoteStoreFailed(msg) => {
                write!(f, "Remote store failed: {}", msg)
            }
            Self::SerializationError(msg) => {
                write!(f, "Serialization error: {}", msg)
            }
        }
    }
}

impl StdError for TrackerError {}

// Helper functions for common error scenarios
impl TrackerError {
    /// Create a connection failed error
    pub fn connection_failed(msg: impl Into<String>) -> Self {
        Self::ConnectionFailed(msg.into())
    }

    /// Create a remote store error
    pub fn remote(msg: impl Into<String>) -> Self {
        Self::RemoteStoreFailed(msg.into())
    }

    /// Create a local storage error
    pub fn storage(msg: impl Into<String>) -> Self {
        Self::StorageFailed(msg.into())
    }

    /// True for failures on the chain-read side of the pipeline
    pub fn is_fetch_error(&self) -> bool {
        matches!(
            self,
            Self::ConnectionFailed(_)
                | Self::RpcError { .. }
                | Self::InvalidResponse(_)
                | Self::DecodeFailed(_)
        )
    }
}

impl From<serde_json::Error> for TrackerError {
    fn from(err: serde_json::Error) -> Self {
        Self::SerializationError(err.to_string())
    }
}

impl From<std::io::Error> for TrackerError {
    fn from(err: std::io::Error) -> Self {
        Self::StorageFailed(err.to_string())
    }
}

impl From<reqwest::Error> for TrackerError {
    fn from(err: reqwest::Error) -> Self {
        Self::ConnectionFailed(err.to_string())
    }
}
