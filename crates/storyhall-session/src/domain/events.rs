//! Outbound protocol events (server → client).

use serde::Serialize;
use storyhall_core::error::DomainError;
use storyhall_dice::roll::{DiceRollResult, RollMode};
use storyhall_memory::campaign::{CampaignSnapshot, LoreCategory, LoreRecord};

use super::aggregates::{Participant, SessionId};

/// Message sent to the facilitator when its session pauses.
pub const FACILITATOR_DISCONNECTED: &str = "DM disconnected";

/// Event delivered to one connection or fanned out to a session group.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event")]
pub enum ServerEvent {
    /// Private reply to a facilitator join.
    #[serde(rename = "dm:joined", rename_all = "camelCase")]
    FacilitatorJoined {
        session_id: SessionId,
        players: Vec<Participant>,
        campaign_state: CampaignSnapshot,
    },

    /// Broadcast when a participant joins.
    #[serde(rename = "player:joined")]
    ParticipantJoined {
        player: Participant,
        players: Vec<Participant>,
    },

    /// Private reply to a participant join.
    #[serde(rename = "player:welcome", rename_all = "camelCase")]
    Welcome {
        session_id: SessionId,
        player_info: Participant,
        campaign_state: CampaignSnapshot,
    },

    /// Broadcast of transcribed speech.
    #[serde(rename = "player:spoke", rename_all = "camelCase")]
    ParticipantSpoke { player_name: String, text: String },

    /// Broadcast of DM narration, from the facilitator or the narration service.
    #[serde(rename = "dm:narration")]
    Narration { text: String },

    /// Broadcast of a dice roll. `rolls` holds both candidates for
    /// advantage/disadvantage.
    #[serde(rename = "dice:result", rename_all = "camelCase")]
    DiceResult {
        player_name: String,
        notation: String,
        mode: RollMode,
        result: DiceRollResult,
        #[serde(skip_serializing_if = "Option::is_none")]
        rolls: Option<[DiceRollResult; 2]>,
    },

    /// Broadcast when the facilitator starts the session.
    #[serde(rename = "session:started")]
    SessionStarted,

    /// Broadcast when a participant disconnects.
    #[serde(rename = "player:left", rename_all = "camelCase")]
    ParticipantLeft {
        player_name: String,
        players: Vec<Participant>,
    },

    /// Broadcast when the facilitator disconnects.
    #[serde(rename = "session:paused")]
    SessionPaused { message: String },

    /// Sent to every member when the session is deleted.
    #[serde(rename = "session:closed", rename_all = "camelCase")]
    SessionClosed { session_id: SessionId },

    /// Broadcast when the facilitator records lore.
    #[serde(rename = "campaign:recorded")]
    LoreRecorded {
        category: LoreCategory,
        entry: LoreRecord,
    },

    /// Private rejection of a request.
    #[serde(rename = "error")]
    Error { code: String, message: String },
}

impl ServerEvent {
    /// Private error event for a rejected request.
    #[must_use]
    pub fn error(error: &DomainError) -> Self {
        Self::Error {
            code: error.code().to_owned(),
            message: error.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::aggregates::ConnectionId;
    use serde_json::json;

    #[test]
    fn test_unit_event_serializes_as_bare_tag() {
        let json = serde_json::to_value(ServerEvent::SessionStarted).unwrap();
        assert_eq!(json, json!({ "event": "session:started" }));
    }

    #[test]
    fn test_participant_left_uses_camel_case_fields() {
        let event = ServerEvent::ParticipantLeft {
            player_name: "Aria".to_owned(),
            players: vec![],
        };

        let json = serde_json::to_value(event).unwrap();

        assert_eq!(
            json,
            json!({ "event": "player:left", "playerName": "Aria", "players": [] })
        );
    }

    #[test]
    fn test_participant_joined_carries_roster() {
        let player = Participant::new(ConnectionId::new(), "Aria");
        let event = ServerEvent::ParticipantJoined {
            player: player.clone(),
            players: vec![player.clone()],
        };

        let json = serde_json::to_value(event).unwrap();

        assert_eq!(json["event"], "player:joined");
        assert_eq!(json["players"][0]["name"], "Aria");
        assert_eq!(json["players"][0]["hp"], 20);
        assert_eq!(json["players"][0]["ac"], 15);
        assert_eq!(json["players"][0]["level"], 1);
        assert_eq!(json["player"]["id"], player.id.to_string());
    }

    #[test]
    fn test_error_event_carries_code_and_message() {
        let event = ServerEvent::error(&DomainError::SessionNotFound("s9".to_owned()));

        assert_eq!(
            serde_json::to_value(event).unwrap(),
            json!({
                "event": "error",
                "code": "session_not_found",
                "message": "session not found: s9"
            })
        );
    }

    #[test]
    fn test_single_dice_result_omits_candidates() {
        let result = DiceRollResult {
            notation: "1d20".to_owned(),
            num_dice: 1,
            sides: 20,
            modifier: 0,
            rolls: vec![7],
            sum: 7,
            total: 7,
        };
        let event = ServerEvent::DiceResult {
            player_name: "Aria".to_owned(),
            notation: "1d20".to_owned(),
            mode: RollMode::Normal,
            result,
            rolls: None,
        };

        let json = serde_json::to_value(event).unwrap();

        assert_eq!(json["mode"], "normal");
        assert_eq!(json["result"]["total"], 7);
        assert!(json.get("rolls").is_none());
    }
}
