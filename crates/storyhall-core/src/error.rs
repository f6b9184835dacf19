//! Domain error types.

use thiserror::Error;

/// Top-level domain error type.
///
/// Every variant describes a rejected request. None of them is fatal: the
/// router reports them privately to the requesting connection and leaves
/// session state untouched.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DomainError {
    /// No session is registered under the identifier.
    #[error("session not found: {0}")]
    SessionNotFound(String),

    /// A session with the identifier is already registered.
    #[error("session already exists: {0}")]
    SessionAlreadyExists(String),

    /// The session exists but has not been started (or was paused).
    #[error("session is not active: {0}")]
    SessionInactive(String),

    /// Dice notation did not match the grammar or its bounds.
    #[error("invalid dice notation: {0}")]
    InvalidNotation(String),

    /// The caller is not the bound facilitator of its session.
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// The connection has not joined a session.
    #[error("connection has not joined a session")]
    NotInSession,

    /// The connection is already bound to a session.
    #[error("connection has already joined a session")]
    AlreadyInSession,

    /// A payload field failed boundary validation.
    #[error("validation error: {0}")]
    Validation(String),

    /// An infrastructure error (poisoned lock, closed channel).
    #[error("infrastructure error: {0}")]
    Infrastructure(String),
}

impl DomainError {
    /// Machine-readable code shared by WebSocket error events and HTTP bodies.
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::SessionNotFound(_) => "session_not_found",
            Self::SessionAlreadyExists(_) => "session_already_exists",
            Self::SessionInactive(_) => "session_inactive",
            Self::InvalidNotation(_) => "invalid_notation",
            Self::Unauthorized(_) => "unauthorized",
            Self::NotInSession => "not_in_session",
            Self::AlreadyInSession => "already_in_session",
            Self::Validation(_) => "validation_error",
            Self::Infrastructure(_) => "infrastructure_error",
        }
    }
}
