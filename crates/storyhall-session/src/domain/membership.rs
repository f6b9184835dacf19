//! Connection-to-session membership index.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};
use storyhall_core::error::DomainError;

use super::aggregates::{ConnectionId, SessionId};

/// Role a connection holds within its session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// The bound facilitator.
    Facilitator,
    /// A joined player.
    Participant,
}

/// Which session a connection is bound to, and how.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Binding {
    /// The session.
    pub session_id: SessionId,
    /// The connection's role in it.
    pub role: Role,
}

/// Forward (connection → binding) and reverse (session → connections) indexes,
/// always updated together.
#[derive(Debug, Default)]
pub struct Membership {
    by_connection: HashMap<ConnectionId, Binding>,
    by_session: HashMap<SessionId, HashSet<ConnectionId>>,
}

impl Membership {
    /// Creates an empty index.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Binds `connection` to `session_id` in `role`.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::AlreadyInSession` if the connection is bound.
    pub fn bind(
        &mut self,
        connection: ConnectionId,
        session_id: SessionId,
        role: Role,
    ) -> Result<(), DomainError> {
        if self.by_connection.contains_key(&connection) {
            return Err(DomainError::AlreadyInSession);
        }
        self.by_session
            .entry(session_id.clone())
            .or_default()
            .insert(connection);
        self.by_connection
            .insert(connection, Binding { session_id, role });
        Ok(())
    }

    /// Removes `connection` from both indexes, returning its former binding.
    pub fn unbind(&mut self, connection: ConnectionId) -> Option<Binding> {
        let binding = self.by_connection.remove(&connection)?;
        if let Some(members) = self.by_session.get_mut(&binding.session_id) {
            members.remove(&connection);
            if members.is_empty() {
                self.by_session.remove(&binding.session_id);
            }
        }
        Some(binding)
    }

    /// The binding of `connection`, if any.
    #[must_use]
    pub fn binding(&self, connection: ConnectionId) -> Option<&Binding> {
        self.by_connection.get(&connection)
    }

    /// Connections currently bound to `session_id`.
    #[must_use]
    pub fn members(&self, session_id: &SessionId) -> Vec<ConnectionId> {
        self.by_session
            .get(session_id)
            .map(|members| members.iter().copied().collect())
            .unwrap_or_default()
    }

    /// Unbinds every connection of `session_id`, returning them.
    pub fn remove_session(&mut self, session_id: &SessionId) -> Vec<ConnectionId> {
        let members: Vec<ConnectionId> = self
            .by_session
            .remove(session_id)
            .map(|members| members.into_iter().collect())
            .unwrap_or_default();
        for connection in &members {
            self.by_connection.remove(connection);
        }
        members
    }

    /// Number of bound connections.
    #[must_use]
    pub fn bound_connections(&self) -> usize {
        self.by_connection.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bind_updates_both_indexes() {
        let mut membership = Membership::new();
        let connection = ConnectionId::new();
        let session = SessionId::from("s1");

        membership
            .bind(connection, session.clone(), Role::Participant)
            .unwrap();

        assert_eq!(
            membership.binding(connection),
            Some(&Binding {
                session_id: session.clone(),
                role: Role::Participant
            })
        );
        assert_eq!(membership.members(&session), vec![connection]);
    }

    #[test]
    fn test_connection_binds_at_most_once() {
        let mut membership = Membership::new();
        let connection = ConnectionId::new();
        membership
            .bind(connection, SessionId::from("s1"), Role::Facilitator)
            .unwrap();

        let result = membership.bind(connection, SessionId::from("s2"), Role::Participant);

        assert_eq!(result, Err(DomainError::AlreadyInSession));
        assert!(membership.members(&SessionId::from("s2")).is_empty());
    }

    #[test]
    fn test_unbind_is_idempotent_and_prunes_empty_groups() {
        let mut membership = Membership::new();
        let connection = ConnectionId::new();
        let session = SessionId::from("s1");
        membership
            .bind(connection, session.clone(), Role::Participant)
            .unwrap();

        assert!(membership.unbind(connection).is_some());
        assert!(membership.unbind(connection).is_none());
        assert!(membership.members(&session).is_empty());
        assert_eq!(membership.bound_connections(), 0);
    }

    #[test]
    fn test_groups_are_isolated_per_session() {
        let mut membership = Membership::new();
        let a = ConnectionId::new();
        let b = ConnectionId::new();
        membership
            .bind(a, SessionId::from("s1"), Role::Facilitator)
            .unwrap();
        membership
            .bind(b, SessionId::from("s2"), Role::Participant)
            .unwrap();

        assert_eq!(membership.members(&SessionId::from("s1")), vec![a]);
        assert_eq!(membership.members(&SessionId::from("s2")), vec![b]);
    }

    #[test]
    fn test_remove_session_unbinds_every_member() {
        let mut membership = Membership::new();
        let session = SessionId::from("s1");
        let a = ConnectionId::new();
        let b = ConnectionId::new();
        membership.bind(a, session.clone(), Role::Facilitator).unwrap();
        membership.bind(b, session.clone(), Role::Participant).unwrap();

        let mut removed = membership.remove_session(&session);
        removed.sort_by_key(ToString::to_string);
        let mut expected = vec![a, b];
        expected.sort_by_key(ToString::to_string);

        assert_eq!(removed, expected);
        assert!(membership.binding(a).is_none());
        assert!(membership.binding(b).is_none());
    }
}
