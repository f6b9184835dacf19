//! Sessions, participants and the identifiers that key them.

use std::borrow::Borrow;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use storyhall_core::error::DomainError;
use uuid::Uuid;

/// Starting hit points for a new participant.
pub const DEFAULT_HP: u32 = 20;
/// Starting armor class for a new participant.
pub const DEFAULT_AC: u32 = 15;
/// Starting level for a new participant.
pub const DEFAULT_LEVEL: u32 = 1;

/// Identifier of one duplex connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConnectionId(Uuid);

impl ConnectionId {
    /// Allocates a fresh identifier.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ConnectionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Identifier of a session, supplied by whoever creates it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(String);

impl SessionId {
    /// Returns the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for SessionId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for SessionId {
    fn from(value: &str) -> Self {
        Self(value.to_owned())
    }
}

impl From<Uuid> for SessionId {
    fn from(value: Uuid) -> Self {
        Self(value.to_string())
    }
}

impl Borrow<str> for SessionId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A player connection with basic combat attributes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Participant {
    /// The owning connection.
    pub id: ConnectionId,
    /// Display name.
    pub name: String,
    /// Hit points.
    pub hp: u32,
    /// Armor class.
    pub ac: u32,
    /// Character level.
    pub level: u32,
}

impl Participant {
    /// Creates a participant with default attributes.
    #[must_use]
    pub fn new(id: ConnectionId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            hp: DEFAULT_HP,
            ac: DEFAULT_AC,
            level: DEFAULT_LEVEL,
        }
    }
}

/// One live storytelling session.
#[derive(Debug, Clone)]
pub struct Session {
    /// Session identifier.
    pub id: SessionId,
    /// Joined participants, in join order. No connection appears twice.
    participants: Vec<Participant>,
    /// The bound facilitator connection, if any.
    facilitator: Option<ConnectionId>,
    /// Whether participants may join.
    is_active: bool,
    /// When the session was created.
    pub created_at: DateTime<Utc>,
}

impl Session {
    /// Creates an inactive session with no facilitator or participants.
    #[must_use]
    pub fn new(id: SessionId, created_at: DateTime<Utc>) -> Self {
        Self {
            id,
            participants: Vec::new(),
            facilitator: None,
            is_active: false,
            created_at,
        }
    }

    /// Current roster.
    #[must_use]
    pub fn participants(&self) -> &[Participant] {
        &self.participants
    }

    /// Looks up the participant owned by `connection`.
    #[must_use]
    pub fn participant(&self, connection: ConnectionId) -> Option<&Participant> {
        self.participants.iter().find(|p| p.id == connection)
    }

    /// The bound facilitator connection.
    #[must_use]
    pub fn facilitator(&self) -> Option<ConnectionId> {
        self.facilitator
    }

    /// Whether `connection` is the bound facilitator.
    #[must_use]
    pub fn is_facilitator(&self, connection: ConnectionId) -> bool {
        self.facilitator == Some(connection)
    }

    /// Whether participants may join.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.is_active
    }

    /// Binds `connection` as facilitator, returning any connection it displaced.
    pub fn bind_facilitator(&mut self, connection: ConnectionId) -> Option<ConnectionId> {
        self.facilitator
            .replace(connection)
            .filter(|previous| *previous != connection)
    }

    /// Marks the session active.
    pub fn start(&mut self) {
        self.is_active = true;
    }

    /// Adds a participant for `connection`.
    ///
    /// A blank or missing name becomes `Player <n>`, where `n` is the roster
    /// size after joining.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::SessionInactive` if the session has not been
    /// started, or `DomainError::AlreadyInSession` if the connection is already
    /// on the roster. The roster is unchanged on error.
    pub fn admit(
        &mut self,
        connection: ConnectionId,
        name: Option<&str>,
    ) -> Result<Participant, DomainError> {
        if !self.is_active {
            return Err(DomainError::SessionInactive(self.id.to_string()));
        }
        if self.participant(connection).is_some() {
            return Err(DomainError::AlreadyInSession);
        }

        let name = name
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .map_or_else(
                || format!("Player {}", self.participants.len() + 1),
                str::to_owned,
            );
        let participant = Participant::new(connection, name);
        self.participants.push(participant.clone());
        Ok(participant)
    }

    /// Removes the participant owned by `connection`.
    pub fn remove_participant(&mut self, connection: ConnectionId) -> Option<Participant> {
        let index = self.participants.iter().position(|p| p.id == connection)?;
        Some(self.participants.remove(index))
    }

    /// Unbinds `connection` if it is the facilitator and pauses the session.
    ///
    /// Returns `true` if the facilitator binding was cleared.
    pub fn release_facilitator(&mut self, connection: ConnectionId) -> bool {
        if self.is_facilitator(connection) {
            self.facilitator = None;
            self.is_active = false;
            true
        } else {
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn session() -> Session {
        Session::new(
            SessionId::from("s1"),
            Utc.with_ymd_and_hms(2026, 1, 15, 10, 0, 0).unwrap(),
        )
    }

    #[test]
    fn test_new_session_is_inactive_and_empty() {
        let session = session();
        assert!(!session.is_active());
        assert!(session.participants().is_empty());
        assert!(session.facilitator().is_none());
    }

    #[test]
    fn test_admit_rejects_inactive_session_without_mutation() {
        let mut session = session();

        let result = session.admit(ConnectionId::new(), Some("Aria"));

        assert_eq!(result, Err(DomainError::SessionInactive("s1".to_owned())));
        assert!(session.participants().is_empty());
    }

    #[test]
    fn test_admit_assigns_default_stats() {
        let mut session = session();
        session.start();
        let connection = ConnectionId::new();

        let participant = session.admit(connection, Some("  Aria ")).unwrap();

        assert_eq!(participant.name, "Aria");
        assert_eq!(
            (participant.hp, participant.ac, participant.level),
            (20, 15, 1)
        );
        assert_eq!(session.participant(connection), Some(&participant));
    }

    #[test]
    fn test_admit_names_anonymous_players_by_position() {
        let mut session = session();
        session.start();

        session.admit(ConnectionId::new(), Some("Aria")).unwrap();
        let second = session.admit(ConnectionId::new(), None).unwrap();
        let third = session.admit(ConnectionId::new(), Some("   ")).unwrap();

        assert_eq!(second.name, "Player 2");
        assert_eq!(third.name, "Player 3");
    }

    #[test]
    fn test_admit_rejects_duplicate_connection() {
        let mut session = session();
        session.start();
        let connection = ConnectionId::new();
        session.admit(connection, Some("Aria")).unwrap();

        assert_eq!(
            session.admit(connection, Some("Aria again")),
            Err(DomainError::AlreadyInSession)
        );
        assert_eq!(session.participants().len(), 1);
    }

    #[test]
    fn test_bind_facilitator_reports_displaced_connection() {
        let mut session = session();
        let first = ConnectionId::new();
        let second = ConnectionId::new();

        assert_eq!(session.bind_facilitator(first), None);
        assert_eq!(session.bind_facilitator(first), None);
        assert_eq!(session.bind_facilitator(second), Some(first));
        assert!(session.is_facilitator(second));
        assert!(!session.is_facilitator(first));
    }

    #[test]
    fn test_release_facilitator_pauses_only_for_the_bound_connection() {
        let mut session = session();
        let facilitator = ConnectionId::new();
        session.bind_facilitator(facilitator);
        session.start();

        assert!(!session.release_facilitator(ConnectionId::new()));
        assert!(session.is_active());

        assert!(session.release_facilitator(facilitator));
        assert!(!session.is_active());
        assert!(session.facilitator().is_none());
        assert!(!session.release_facilitator(facilitator));
    }

    #[test]
    fn test_remove_participant_returns_removed_entry() {
        let mut session = session();
        session.start();
        let connection = ConnectionId::new();
        session.admit(connection, Some("Aria")).unwrap();

        let removed = session.remove_participant(connection).unwrap();

        assert_eq!(removed.name, "Aria");
        assert!(session.participants().is_empty());
        assert!(session.remove_participant(connection).is_none());
    }
}
