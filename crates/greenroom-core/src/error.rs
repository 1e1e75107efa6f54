//! Error types for fetch resolution.
//!
//! Failures are classified before they reach a caller: a recognized API
//! failure keeps a stable, user-presentable message, while anything else
//! (including a panicking fetch) collapses to [`FetchError::Unknown`].

use crate::key::CacheKey;
use thiserror::Error;

/// Classified failure of a fetch operation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    /// The operation failed with a recognized error condition. The message
    /// is stable and safe to present, distinct from raw failure detail.
    #[error("{message}")]
    Api { message: String },

    /// The operation failed with an unrecognized shape.
    #[error("Unknown error occurred")]
    Unknown,
}

impl FetchError {
    /// Create a classified API error.
    pub fn api(message: impl Into<String>) -> Self {
        FetchError::Api {
            message: message.into(),
        }
    }

    /// Whether the failure carries a recognized classification.
    pub fn is_classified(&self) -> bool {
        matches!(self, FetchError::Api { .. })
    }
}

/// A failed resolution: the key it belongs to and the classified error.
///
/// Surfaced by the coordinator once a fetch has settled as failed. Never
/// recovered internally: callers delegate it to an error-handling
/// collaborator, and a new attempt requires an explicit reset of the key.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Fetch for {key} failed: {error}")]
pub struct Rejection {
    /// Key the failed fetch was bound to.
    pub key: CacheKey,
    /// The classified failure.
    pub error: FetchError,
}

/// Result type alias for fetch operations.
pub type Result<T> = std::result::Result<T, FetchError>;
