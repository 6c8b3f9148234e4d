//! Wire schema: envelope and payload records.
//!
//! Every record maps one-to-one onto a JSON object with the camelCase field
//! names declared here. Enumerations travel as plain integer codes so the
//! schema stays language-neutral; `game::*::from_index` decodes them.

use serde::{Deserialize, Serialize};

/// Protocol message discriminant. 1xx flow client to server, 2xx server to
/// client.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u16", into = "u16")]
pub enum MessageType {
    Join = 100,
    Command = 101,
    Ping = 102,
    PullSync = 103,
    Ack = 104,
    JoinAck = 200,
    CommandAck = 201,
    Snapshot = 202,
    EventDelta = 203,
    GameOver = 204,
    Error = 205,
}

impl TryFrom<u16> for MessageType {
    type Error = String;

    fn try_from(value: u16) -> Result<Self, String> {
        match value {
            100 => Ok(MessageType::Join),
            101 => Ok(MessageType::Command),
            102 => Ok(MessageType::Ping),
            103 => Ok(MessageType::PullSync),
            104 => Ok(MessageType::Ack),
            200 => Ok(MessageType::JoinAck),
            201 => Ok(MessageType::CommandAck),
            202 => Ok(MessageType::Snapshot),
            203 => Ok(MessageType::EventDelta),
            204 => Ok(MessageType::GameOver),
            205 => Ok(MessageType::Error),
            other => Err(format!("unknown message type code {other}")),
        }
    }
}

impl From<MessageType> for u16 {
    fn from(value: MessageType) -> u16 {
        value as u16
    }
}

/// Outer framing of every protocol message.
///
/// `match_id` is a decimal string; `payload_json` is a nested JSON object
/// encoded as a string, so the envelope can be routed without understanding
/// the payload.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Envelope {
    pub message_type: MessageType,
    pub sequence: u64,
    pub match_id: String,
    pub payload_json: String,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JoinPayload {
    pub match_id: u64,
    pub player_id: u64,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MovePayload {
    pub piece_id: u16,
    pub from_x: i32,
    pub from_y: i32,
    pub to_x: i32,
    pub to_y: i32,
    pub has_captured_piece_id: bool,
    pub captured_piece_id: u16,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetupPlacementPayload {
    pub piece_id: u16,
    pub x: i32,
    pub y: i32,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetupCommitPayload {
    pub side: i32,
    pub hash_hex: String,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetupPlainPayload {
    pub side: i32,
    pub nonce: String,
    pub placements: Vec<SetupPlacementPayload>,
}

/// Command request. The `has_*` flags are authoritative; the optional
/// sub-records must be present whenever the matching flag is set.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommandPayload {
    pub player_id: u64,
    pub command_type: i32,
    pub side: i32,
    pub has_move: bool,
    pub has_setup_commit: bool,
    pub has_setup_plain: bool,
    #[serde(rename = "move", default, skip_serializing_if = "Option::is_none")]
    pub move_action: Option<MovePayload>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub setup_commit: Option<SetupCommitPayload>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub setup_plain: Option<SetupPlainPayload>,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PullSyncPayload {
    pub player_id: u64,
    pub has_after_sequence_override: bool,
    /// Zero when no override is set.
    pub after_sequence_override: u64,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AckPayload {
    pub player_id: u64,
    pub sequence: u64,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JoinAckPayload {
    pub accepted: bool,
    pub assigned_side: i32,
    pub error_code: String,
    pub error_message: String,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommandAckPayload {
    pub accepted: bool,
    pub error_code: String,
    pub error_message: String,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PieceSnapshotPayload {
    pub piece_id: u16,
    pub side: i32,
    pub visible_role: i32,
    pub x: i32,
    pub y: i32,
    pub alive: bool,
    pub frozen: bool,
    pub revealed: bool,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotPayload {
    pub viewer_side: i32,
    pub phase: i32,
    pub current_turn: i32,
    pub pass_count: i32,
    pub result: i32,
    pub end_reason: i32,
    pub turn_index: u64,
    pub last_event_sequence: u64,
    pub pieces: Vec<PieceSnapshotPayload>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventRecordPayload {
    pub sequence: u64,
    pub turn_index: u64,
    pub event_type: i32,
    pub actor_player_id: u64,
    pub error_code: String,
    pub description: String,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventDeltaPayload {
    pub requested_after_sequence: u64,
    pub latest_sequence: u64,
    pub events: Vec<EventRecordPayload>,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameOverPayload {
    pub result: i32,
    pub end_reason: i32,
    pub turn_index: u64,
    pub is_draw: bool,
    /// -1 on a draw.
    pub winner_side: i32,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorPayload {
    pub error_message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_type_codes() {
        let cases = [
            (100u16, MessageType::Join),
            (101, MessageType::Command),
            (102, MessageType::Ping),
            (103, MessageType::PullSync),
            (104, MessageType::Ack),
            (200, MessageType::JoinAck),
            (201, MessageType::CommandAck),
            (202, MessageType::Snapshot),
            (203, MessageType::EventDelta),
            (204, MessageType::GameOver),
            (205, MessageType::Error),
        ];
        for (code, message_type) in cases {
            assert_eq!(MessageType::try_from(code), Ok(message_type));
            assert_eq!(u16::from(message_type), code);
        }
        assert!(MessageType::try_from(199).is_err());
        assert!(MessageType::try_from(0).is_err());
    }
}
