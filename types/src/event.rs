//! Match event journal records.

use crate::PlayerId;

/// Kind of journal entry. Codes are part of the wire contract.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum MatchEventType {
    PlayerJoined = 0,
    SetupCommitted = 1,
    SetupRevealed = 2,
    MoveApplied = 3,
    PassApplied = 4,
    ResignApplied = 5,
    CommandRejected = 6,
    GameOver = 7,
}

impl MatchEventType {
    pub fn from_index(value: i64) -> Option<Self> {
        match value {
            0 => Some(MatchEventType::PlayerJoined),
            1 => Some(MatchEventType::SetupCommitted),
            2 => Some(MatchEventType::SetupRevealed),
            3 => Some(MatchEventType::MoveApplied),
            4 => Some(MatchEventType::PassApplied),
            5 => Some(MatchEventType::ResignApplied),
            6 => Some(MatchEventType::CommandRejected),
            7 => Some(MatchEventType::GameOver),
            _ => None,
        }
    }
}

/// One append-only journal entry. Sequences start at 1 and increase by one
/// per appended event within a match.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MatchEventRecord {
    pub sequence: u64,
    pub turn_index: u64,
    pub event_type: MatchEventType,
    pub actor_player_id: PlayerId,
    /// Stable `ERR_*` code for `CommandRejected` entries, empty otherwise.
    pub error_code: String,
    pub description: String,
}
