//! Error types for fleet-management service calls.

use thiserror::Error;

/// Result type alias for fleet operations.
pub type FleetResult<T> = Result<T, UpstreamError>;

/// Failures reported by (or while talking to) the fleet-management service.
///
/// Every variant originates upstream. Nothing in this crate validates
/// group names or capacity counts locally.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum UpstreamError {
    #[error("autoscaling group not found: {0}")]
    GroupNotFound(String),

    #[error("transport error: {0}")]
    Transport(String),

    #[error("service error ({status}): {message}")]
    Service { status: u16, message: String },

    #[error("malformed response: {0}")]
    MalformedResponse(String),
}
