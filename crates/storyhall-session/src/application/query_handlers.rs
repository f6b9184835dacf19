//! Read-only views of router state.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::domain::aggregates::{Session, SessionId};

/// Summary of one session, as exposed over HTTP.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionView {
    /// The session identifier.
    pub session_id: SessionId,
    /// Participants on the roster.
    pub player_count: usize,
    /// Whether participants may join.
    pub is_active: bool,
    /// Whether a facilitator connection is bound.
    pub has_facilitator: bool,
    /// When the session was created.
    pub created_at: DateTime<Utc>,
}

impl From<&Session> for SessionView {
    fn from(session: &Session) -> Self {
        Self {
            session_id: session.id.clone(),
            player_count: session.participants().len(),
            is_active: session.is_active(),
            has_facilitator: session.facilitator().is_some(),
            created_at: session.created_at,
        }
    }
}

/// Process-wide counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RouterStats {
    /// Registered sessions.
    pub sessions: usize,
    /// Open connections.
    pub connections: usize,
    /// Connections bound to a session.
    pub bound_connections: usize,
}
