//! Error types for the synchronization engine
//!
//! One taxonomy covers the whole polling core: login rejection, transport
//! failure, payload decode failure, and responses superseded by a newer
//! session generation. Uses thiserror for proper error trait
//! implementations.

use thiserror::Error;

/// Main synchronization error type
#[derive(Debug, Error)]
pub enum SyncError {
    /// Login was rejected by the server
    #[error("login rejected: {0}")]
    Auth(String),

    /// Transport or HTTP-level failure
    #[error("network error: {0}")]
    Network(String),

    /// Payload violated a decode invariant
    #[error("decode error: {0}")]
    Decode(String),

    /// Response belongs to a superseded session generation.
    ///
    /// Never user-visible; stale responses are discarded before they reach
    /// the resource store.
    #[error("response superseded by a newer session generation")]
    Stale,
}

/// The value-level error recorded in a resource slot.
///
/// `Stale` has no counterpart here: a stale response is discarded, not
/// surfaced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Auth,
    Network,
    Decode,
}

impl SyncError {
    /// The store-facing kind of this error, if it is one that gets recorded.
    pub fn kind(&self) -> Option<ErrorKind> {
        match self {
            SyncError::Auth(_) => Some(ErrorKind::Auth),
            SyncError::Network(_) => Some(ErrorKind::Network),
            SyncError::Decode(_) => Some(ErrorKind::Decode),
            SyncError::Stale => None,
        }
    }
}

/// Result type alias for synchronization operations
pub type SyncResult<T> = Result<T, SyncError>;

impl From<reqwest::Error> for SyncError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            SyncError::Decode(err.to_string())
        } else {
            SyncError::Network(err.to_string())
        }
    }
}

impl From<serde_json::Error> for SyncError {
    fn from(err: serde_json::Error) -> Self {
        SyncError::Decode(err.to_string())
    }
}

impl From<vitalsync_model::ModelError> for SyncError {
    fn from(err: vitalsync_model::ModelError) -> Self {
        SyncError::Decode(err.to_string())
    }
}
