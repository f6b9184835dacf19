//! Narration service errors.

use std::time::Duration;

use thiserror::Error;

/// Failure of a narration backend. Never shown to clients.
#[derive(Debug, Error)]
pub enum NarrationError {
    /// The request could not be sent or was rejected.
    #[error("narration request failed: {0}")]
    RequestFailed(String),

    /// The service answered with something unusable.
    #[error("invalid narration response: {0}")]
    InvalidResponse(String),

    /// The call did not complete in time.
    #[error("narration timed out after {0:?}")]
    Timeout(Duration),

    /// No capacity to make the call.
    #[error("narration unavailable: {0}")]
    Unavailable(String),
}
