//! Session registry.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use storyhall_core::error::DomainError;

use super::aggregates::{Session, SessionId};

/// Registry of live sessions keyed by identifier.
///
/// A pure registry: it validates identifier uniqueness and nothing else. Its
/// owner serializes access.
#[derive(Debug, Default)]
pub struct SessionStore {
    sessions: HashMap<SessionId, Session>,
}

impl SessionStore {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a new inactive session.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::SessionAlreadyExists` if `id` is taken.
    pub fn create(
        &mut self,
        id: SessionId,
        created_at: DateTime<Utc>,
    ) -> Result<&Session, DomainError> {
        match self.sessions.entry(id) {
            std::collections::hash_map::Entry::Occupied(entry) => Err(
                DomainError::SessionAlreadyExists(entry.key().to_string()),
            ),
            std::collections::hash_map::Entry::Vacant(entry) => {
                let session = Session::new(entry.key().clone(), created_at);
                Ok(entry.insert(session))
            }
        }
    }

    /// Looks up a session.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<&Session> {
        self.sessions.get(id)
    }

    /// Looks up a session for mutation.
    pub fn get_mut(&mut self, id: &str) -> Option<&mut Session> {
        self.sessions.get_mut(id)
    }

    /// Removes a session, returning it.
    pub fn delete(&mut self, id: &str) -> Option<Session> {
        self.sessions.remove(id)
    }

    /// All sessions, oldest first.
    #[must_use]
    pub fn list(&self) -> Vec<&Session> {
        let mut sessions: Vec<&Session> = self.sessions.values().collect();
        sessions.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
        sessions
    }

    /// Number of sessions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    /// Returns `true` when no sessions exist.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}
