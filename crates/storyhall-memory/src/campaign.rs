//! Per-session campaign state and its derived views.

use std::collections::VecDeque;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::entry::EventLogEntry;

/// Number of entries retained per session; older entries are evicted first.
pub const MAX_RETAINED_ENTRIES: usize = 100;

/// Number of most recent entries exposed by a snapshot.
pub const CONTEXT_WINDOW: usize = 20;

/// Which auxiliary collection a lore record belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LoreCategory {
    /// A non-player character.
    Npc,
    /// A place.
    Location,
    /// A quest or objective.
    Quest,
}

/// An NPC, location or quest noted during play.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoreRecord {
    /// Display name.
    pub name: String,
    /// Free-form notes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// When the record was added.
    pub added_at: DateTime<Utc>,
}

/// History and lore for one session.
#[derive(Debug, Clone)]
pub struct CampaignState {
    pub(crate) entries: VecDeque<EventLogEntry>,
    pub(crate) npcs: Vec<LoreRecord>,
    pub(crate) locations: Vec<LoreRecord>,
    pub(crate) quests: Vec<LoreRecord>,
    /// When the campaign was first referenced.
    pub created_at: DateTime<Utc>,
    /// When the campaign last changed.
    pub updated_at: DateTime<Utc>,
}

impl CampaignState {
    /// Creates an empty campaign.
    #[must_use]
    pub fn new(created_at: DateTime<Utc>) -> Self {
        Self {
            entries: VecDeque::with_capacity(MAX_RETAINED_ENTRIES),
            npcs: Vec::new(),
            locations: Vec::new(),
            quests: Vec::new(),
            created_at,
            updated_at: created_at,
        }
    }

    /// Appends an entry, evicting the oldest once the cap is exceeded.
    pub fn push(&mut self, entry: EventLogEntry, at: DateTime<Utc>) {
        self.entries.push_back(entry);
        while self.entries.len() > MAX_RETAINED_ENTRIES {
            self.entries.pop_front();
        }
        self.updated_at = at;
    }

    /// Adds a lore record to the matching collection.
    pub fn record(&mut self, category: LoreCategory, record: LoreRecord) {
        self.updated_at = record.added_at;
        match category {
            LoreCategory::Npc => self.npcs.push(record),
            LoreCategory::Location => self.locations.push(record),
            LoreCategory::Quest => self.quests.push(record),
        }
    }

    /// Retained entries, oldest first.
    pub fn entries(&self) -> impl Iterator<Item = &EventLogEntry> {
        self.entries.iter()
    }

    /// Number of retained entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` when no entries are retained.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Computes the summary from the retained entries.
    #[must_use]
    pub fn summary(&self) -> CampaignSummary {
        CampaignSummary {
            entry_count: self.entries.len(),
            dice_roll_count: self.entries.iter().filter(|e| e.is_dice()).count(),
        }
    }

    /// Builds the context view: the newest entries plus lore and summary.
    #[must_use]
    pub fn snapshot(&self) -> CampaignSnapshot {
        let skip = self.entries.len().saturating_sub(CONTEXT_WINDOW);
        CampaignSnapshot {
            messages: self.entries.iter().skip(skip).cloned().collect(),
            npcs: self.npcs.clone(),
            locations: self.locations.clone(),
            quests: self.quests.clone(),
            summary: self.summary(),
        }
    }
}

/// Counts derived from the retained log. Never stored.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CampaignSummary {
    /// Retained entries.
    pub entry_count: usize,
    /// Retained dice entries.
    pub dice_roll_count: usize,
}

impl fmt::Display for CampaignSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.entry_count == 0 {
            f.write_str("New campaign - no history yet.")
        } else {
            write!(
                f,
                "Campaign with {} events ({} dice rolls).",
                self.entry_count, self.dice_roll_count
            )
        }
    }
}

/// Read-only campaign view sent to clients and to the narration service.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CampaignSnapshot {
    /// At most [`CONTEXT_WINDOW`] most recent entries, oldest first.
    pub messages: Vec<EventLogEntry>,
    /// Recorded NPCs.
    pub npcs: Vec<LoreRecord>,
    /// Recorded locations.
    pub locations: Vec<LoreRecord>,
    /// Recorded quests.
    pub quests: Vec<LoreRecord>,
    /// Counts over the full retained log.
    pub summary: CampaignSummary,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(minute: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 1, 15, 10, minute % 60, 0).unwrap()
    }

    #[test]
    fn test_summary_text_for_empty_and_populated_logs() {
        let mut state = CampaignState::new(at(0));
        assert_eq!(state.summary().to_string(), "New campaign - no history yet.");

        state.push(EventLogEntry::speech("Aria", "hello", at(1)), at(1));
        state.push(
            EventLogEntry::dice("Aria rolled 1d20: 7", serde_json::json!({}), at(2)),
            at(2),
        );

        assert_eq!(
            state.summary().to_string(),
            "Campaign with 2 events (1 dice rolls)."
        );
    }

    #[test]
    fn test_push_updates_timestamp() {
        let mut state = CampaignState::new(at(0));
        state.push(EventLogEntry::narration("It begins.", at(5)), at(5));
        assert_eq!(state.updated_at, at(5));
        assert_eq!(state.created_at, at(0));
    }

    #[test]
    fn test_lore_goes_to_its_own_collection() {
        let mut state = CampaignState::new(at(0));
        let record = |name: &str| LoreRecord {
            name: name.to_owned(),
            description: None,
            added_at: at(3),
        };

        state.record(LoreCategory::Npc, record("Borin"));
        state.record(LoreCategory::Location, record("Ashford"));
        state.record(LoreCategory::Quest, record("Find the relic"));
        state.record(LoreCategory::Npc, record("Mira"));

        let snapshot = state.snapshot();
        assert_eq!(snapshot.npcs.len(), 2);
        assert_eq!(snapshot.locations[0].name, "Ashford");
        assert_eq!(snapshot.quests[0].name, "Find the relic");
        assert!(snapshot.messages.is_empty());
    }
}
