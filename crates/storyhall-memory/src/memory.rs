//! Registry of campaign state keyed by session.

use std::collections::HashMap;
use std::sync::Arc;

use storyhall_core::clock::Clock;
use tracing::debug;

use crate::campaign::{CampaignSnapshot, CampaignState, LoreCategory, LoreRecord};
use crate::entry::EventLogEntry;

/// Owns every session's campaign state.
///
/// The registry is synchronous and not internally locked; its single owner
/// (the connection router) serializes access.
pub struct CampaignMemory {
    campaigns: HashMap<String, CampaignState>,
    clock: Arc<dyn Clock>,
}

impl std::fmt::Debug for CampaignMemory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CampaignMemory")
            .field("campaigns", &self.campaigns.len())
            .finish_non_exhaustive()
    }
}

impl CampaignMemory {
    /// Creates an empty registry.
    #[must_use]
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            campaigns: HashMap::new(),
            clock,
        }
    }

    /// Returns the campaign for `session_id`, creating it on first reference.
    pub fn ensure(&mut self, session_id: &str) -> &mut CampaignState {
        let clock = &self.clock;
        self.campaigns
            .entry(session_id.to_owned())
            .or_insert_with(|| {
                debug!(session_id, "initialising campaign memory");
                CampaignState::new(clock.now())
            })
    }

    /// Appends an entry to the session's log and returns it.
    pub fn append(&mut self, session_id: &str, entry: EventLogEntry) -> EventLogEntry {
        let now = self.clock.now();
        self.ensure(session_id).push(entry.clone(), now);
        entry
    }

    /// Adds a lore record to the session's campaign.
    pub fn record(&mut self, session_id: &str, category: LoreCategory, record: LoreRecord) {
        self.ensure(session_id).record(category, record);
    }

    /// Builds the session's context snapshot.
    ///
    /// A session that was never referenced yields an empty snapshot and is not
    /// created.
    #[must_use]
    pub fn snapshot(&self, session_id: &str) -> CampaignSnapshot {
        self.campaigns
            .get(session_id)
            .map(CampaignState::snapshot)
            .unwrap_or_default()
    }

    /// Returns the session's campaign, if one exists.
    #[must_use]
    pub fn get(&self, session_id: &str) -> Option<&CampaignState> {
        self.campaigns.get(session_id)
    }

    /// Drops all campaign data for the session.
    pub fn clear(&mut self, session_id: &str) {
        if self.campaigns.remove(session_id).is_some() {
            debug!(session_id, "cleared campaign memory");
        }
    }

    /// Number of sessions with campaign state.
    #[must_use]
    pub fn len(&self) -> usize {
        self.campaigns.len()
    }

    /// Returns `true` when no campaign state exists.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.campaigns.is_empty()
    }
}
