//! Event log entries.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Speaker label used for facilitator and narration-service text.
pub const DM_SPEAKER: &str = "DM";
/// Speaker label used for entries produced by the server itself.
pub const SYSTEM_SPEAKER: &str = "System";

/// Type tag of a log entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    /// Transcribed speech from a connection.
    Speech,
    /// Narration from the facilitator or the narration service.
    Narration,
    /// A dice roll; `details` carries the roll.
    Dice,
}

/// One immutable line of campaign history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventLogEntry {
    /// Who produced the entry.
    pub speaker: String,
    /// Human-readable text.
    pub text: String,
    /// Optional type tag.
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<EntryKind>,
    /// Optional structured payload, e.g. a dice roll result.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
    /// When the entry was produced.
    pub timestamp: DateTime<Utc>,
}

impl EventLogEntry {
    /// Speech attributed to `speaker`.
    #[must_use]
    pub fn speech(speaker: impl Into<String>, text: impl Into<String>, at: DateTime<Utc>) -> Self {
        Self {
            speaker: speaker.into(),
            text: text.into(),
            kind: Some(EntryKind::Speech),
            details: None,
            timestamp: at,
        }
    }

    /// Narration attributed to the DM.
    #[must_use]
    pub fn narration(text: impl Into<String>, at: DateTime<Utc>) -> Self {
        Self {
            speaker: DM_SPEAKER.to_owned(),
            text: text.into(),
            kind: Some(EntryKind::Narration),
            details: None,
            timestamp: at,
        }
    }

    /// A dice roll summary with the full roll attached as `details`.
    #[must_use]
    pub fn dice(text: impl Into<String>, details: serde_json::Value, at: DateTime<Utc>) -> Self {
        Self {
            speaker: SYSTEM_SPEAKER.to_owned(),
            text: text.into(),
            kind: Some(EntryKind::Dice),
            details: Some(details),
            timestamp: at,
        }
    }

    /// Returns `true` for dice entries.
    #[must_use]
    pub fn is_dice(&self) -> bool {
        self.kind == Some(EntryKind::Dice)
    }
}
