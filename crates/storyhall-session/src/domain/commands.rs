//! Inbound protocol commands (client → server).
//!
//! Every frame is a JSON object tagged by `"event"`, with payload fields
//! beside the tag. Frames are parsed and validated here, before any state is
//! touched.

use serde::Deserialize;
use storyhall_core::command::Command;
use storyhall_core::error::DomainError;
use storyhall_dice::roll::RollMode;
use storyhall_memory::campaign::LoreCategory;

use super::aggregates::SessionId;

/// Longest accepted display name.
pub const MAX_NAME_LEN: usize = 64;
/// Longest accepted speech or narration text.
pub const MAX_TEXT_LEN: usize = 2000;
/// Longest accepted dice notation.
pub const MAX_NOTATION_LEN: usize = 32;

/// A validated inbound command.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "event")]
pub enum ClientCommand {
    /// Bind this connection as the session's facilitator.
    #[serde(rename = "dm:join", rename_all = "camelCase")]
    JoinAsFacilitator {
        /// Target session.
        session_id: SessionId,
    },

    /// Join the session as a participant.
    #[serde(rename = "player:join", rename_all = "camelCase")]
    JoinAsParticipant {
        /// Target session.
        session_id: SessionId,
        /// Display name; defaults to `Player <n>`.
        #[serde(default)]
        name: Option<String>,
    },

    /// Transcribed speech to log and narrate.
    #[serde(rename = "player:voice")]
    Speak {
        /// What was said.
        text: String,
    },

    /// Roll dice and share the result.
    #[serde(rename = "dice:roll")]
    RollDice {
        /// Dice notation such as `2d6+3`.
        notation: String,
        /// Single, advantage or disadvantage roll.
        #[serde(default)]
        mode: RollMode,
    },

    /// Facilitator narration.
    #[serde(rename = "dm:narrate")]
    Narrate {
        /// Narration text.
        text: String,
    },

    /// Facilitator starts (or resumes) the session.
    #[serde(rename = "session:start")]
    StartSession {
        /// When present, an introduction for this setting is narrated if the
        /// campaign has no history yet.
        #[serde(default)]
        setting: Option<String>,
    },

    /// Facilitator notes an NPC, location or quest.
    #[serde(rename = "campaign:record")]
    RecordLore {
        /// Which collection.
        category: LoreCategory,
        /// Display name.
        name: String,
        /// Free-form notes.
        #[serde(default)]
        description: Option<String>,
    },
}

impl ClientCommand {
    /// Parses and validates one inbound frame.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Validation` if the frame is not a known command or
    /// a field is out of bounds.
    pub fn from_json(frame: &str) -> Result<Self, DomainError> {
        let command: Self = serde_json::from_str(frame)
            .map_err(|e| DomainError::Validation(format!("invalid message format: {e}")))?;
        command.validated()
    }

    /// Trims text fields and enforces their bounds.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Validation` naming the offending field.
    pub fn validated(self) -> Result<Self, DomainError> {
        Ok(match self {
            Self::JoinAsFacilitator { session_id } => Self::JoinAsFacilitator {
                session_id: non_blank_id(session_id)?,
            },
            Self::JoinAsParticipant { session_id, name } => Self::JoinAsParticipant {
                session_id: non_blank_id(session_id)?,
                name: optional(name, "name", MAX_NAME_LEN)?,
            },
            Self::Speak { text } => Self::Speak {
                text: required(&text, "text", MAX_TEXT_LEN)?,
            },
            Self::RollDice { notation, mode } => Self::RollDice {
                notation: required(&notation, "notation", MAX_NOTATION_LEN)?,
                mode,
            },
            Self::Narrate { text } => Self::Narrate {
                text: required(&text, "text", MAX_TEXT_LEN)?,
            },
            Self::StartSession { setting } => Self::StartSession {
                setting: optional(setting, "setting", MAX_NAME_LEN)?,
            },
            Self::RecordLore {
                category,
                name,
                description,
            } => Self::RecordLore {
                category,
                name: required(&name, "name", MAX_NAME_LEN)?,
                description: optional(description, "description", MAX_TEXT_LEN)?,
            },
        })
    }
}

impl Command for ClientCommand {
    fn command_type(&self) -> &'static str {
        match self {
            Self::JoinAsFacilitator { .. } => "dm:join",
            Self::JoinAsParticipant { .. } => "player:join",
            Self::Speak { .. } => "player:voice",
            Self::RollDice { .. } => "dice:roll",
            Self::Narrate { .. } => "dm:narrate",
            Self::StartSession { .. } => "session:start",
            Self::RecordLore { .. } => "campaign:record",
        }
    }
}

fn non_blank_id(id: SessionId) -> Result<SessionId, DomainError> {
    let trimmed = id.as_str().trim();
    if trimmed.is_empty() {
        return Err(DomainError::Validation("sessionId must not be blank".to_owned()));
    }
    Ok(SessionId::from(trimmed))
}

fn required(value: &str, field: &str, max_len: usize) -> Result<String, DomainError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(DomainError::Validation(format!("{field} must not be blank")));
    }
    if trimmed.chars().count() > max_len {
        return Err(DomainError::Validation(format!(
            "{field} must be at most {max_len} characters"
        )));
    }
    Ok(trimmed.to_owned())
}

fn optional(
    value: Option<String>,
    field: &str,
    max_len: usize,
) -> Result<Option<String>, DomainError> {
    match value.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(trimmed) => required(trimmed, field, max_len).map(Some),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parses_join_commands() {
        assert_eq!(
            ClientCommand::from_json(r#"{"event":"dm:join","sessionId":"s1"}"#).unwrap(),
            ClientCommand::JoinAsFacilitator {
                session_id: SessionId::from("s1")
            }
        );
        assert_eq!(
            ClientCommand::from_json(r#"{"event":"player:join","sessionId":"s1","name":" Aria "}"#)
                .unwrap(),
            ClientCommand::JoinAsParticipant {
                session_id: SessionId::from("s1"),
                name: Some("Aria".to_owned())
            }
        );
    }

    #[test]
    fn test_optional_fields_default() {
        assert_eq!(
            ClientCommand::from_json(r#"{"event":"session:start"}"#).unwrap(),
            ClientCommand::StartSession { setting: None }
        );
        assert_eq!(
            ClientCommand::from_json(r#"{"event":"dice:roll","notation":"1d20"}"#).unwrap(),
            ClientCommand::RollDice {
                notation: "1d20".to_owned(),
                mode: RollMode::Normal
            }
        );
        assert_eq!(
            ClientCommand::from_json(r#"{"event":"player:join","sessionId":"s1","name":"  "}"#)
                .unwrap(),
            ClientCommand::JoinAsParticipant {
                session_id: SessionId::from("s1"),
                name: None
            }
        );
    }

    #[test]
    fn test_extra_fields_are_ignored() {
        let command = ClientCommand::from_json(
            r#"{"event":"dice:roll","sessionId":"s1","notation":"2d6","mode":"advantage"}"#,
        )
        .unwrap();

        assert_eq!(
            command,
            ClientCommand::RollDice {
                notation: "2d6".to_owned(),
                mode: RollMode::Advantage
            }
        );
    }

    #[test]
    fn test_rejects_unknown_events_and_missing_fields() {
        for frame in [
            r#"{"event":"dm:explode"}"#,
            r#"{"event":"player:voice"}"#,
            r#"{"sessionId":"s1"}"#,
            r#"{"event":"dice:roll","notation":"1d20","mode":"sideways"}"#,
            "not json",
        ] {
            let result = ClientCommand::from_json(frame);
            assert!(
                matches!(result, Err(DomainError::Validation(_))),
                "{frame} gave {result:?}"
            );
        }
    }

    #[test]
    fn test_rejects_blank_and_oversized_text() {
        assert!(ClientCommand::from_json(r#"{"event":"player:voice","text":"   "}"#).is_err());
        assert!(ClientCommand::from_json(r#"{"event":"dm:join","sessionId":" "}"#).is_err());

        let long = "x".repeat(MAX_TEXT_LEN + 1);
        let frame = serde_json::json!({ "event": "dm:narrate", "text": long }).to_string();
        assert!(ClientCommand::from_json(&frame).is_err());

        let long_name = "n".repeat(MAX_NAME_LEN + 1);
        let frame = serde_json::json!({ "event": "player:join", "sessionId": "s1", "name": long_name })
            .to_string();
        assert!(ClientCommand::from_json(&frame).is_err());
    }

    #[test]
    fn test_parses_lore_record() {
        let command = ClientCommand::from_json(
            r#"{"event":"campaign:record","category":"npc","name":"Borin","description":"A dwarf smith"}"#,
        )
        .unwrap();

        assert_eq!(
            command,
            ClientCommand::RecordLore {
                category: LoreCategory::Npc,
                name: "Borin".to_owned(),
                description: Some("A dwarf smith".to_owned())
            }
        );
        assert_eq!(command.command_type(), "campaign:record");
    }
}
