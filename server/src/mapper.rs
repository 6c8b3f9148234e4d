//! Translation between session-side results/views and wire payloads.

use crate::service::MatchSyncBundle;
use crate::session::JoinResult;
use jieqi_types::protocol::{
    CommandAckPayload, EventDeltaPayload, EventRecordPayload, GameOverPayload, JoinAckPayload,
    PieceSnapshotPayload, SnapshotPayload,
};
use jieqi_types::{
    CommandError, CommandResult, GameResult, MatchEventRecord, MatchPlayerView, Side,
};

/// Join acknowledgement. Rejections carry the fixed `ERR_JOIN_REJECTED` code
/// plus the specific refusal message.
pub fn join_ack(result: &JoinResult) -> JoinAckPayload {
    match result {
        Ok(side) => JoinAckPayload {
            accepted: true,
            assigned_side: *side as i32,
            error_code: String::new(),
            error_message: String::new(),
        },
        Err(error) => JoinAckPayload {
            accepted: false,
            assigned_side: Side::Red as i32,
            error_code: CommandError::JoinRejected.code().to_string(),
            error_message: error.to_string(),
        },
    }
}

/// Command acknowledgement for the acting player.
pub fn command_ack(result: &CommandResult) -> CommandAckPayload {
    match result {
        Ok(()) => CommandAckPayload {
            accepted: true,
            error_code: String::new(),
            error_message: String::new(),
        },
        Err(error) => CommandAckPayload {
            accepted: false,
            error_code: error.code().to_string(),
            error_message: error.to_string(),
        },
    }
}

/// Full per-viewer snapshot.
pub fn snapshot(view: &MatchPlayerView, last_event_sequence: u64) -> SnapshotPayload {
    SnapshotPayload {
        viewer_side: view.viewer_side as i32,
        phase: view.phase as i32,
        current_turn: view.current_turn as i32,
        pass_count: view.pass_count as i32,
        result: view.result as i32,
        end_reason: view.end_reason as i32,
        turn_index: view.turn_index,
        last_event_sequence,
        pieces: view
            .pieces
            .iter()
            .map(|piece| PieceSnapshotPayload {
                piece_id: piece.piece_id,
                side: piece.side as i32,
                visible_role: piece.visible_role as i32,
                x: piece.pos.x as i32,
                y: piece.pos.y as i32,
                alive: piece.alive,
                frozen: piece.frozen,
                revealed: piece.revealed,
            })
            .collect(),
    }
}

fn event_record(event: &MatchEventRecord) -> EventRecordPayload {
    EventRecordPayload {
        sequence: event.sequence,
        turn_index: event.turn_index,
        event_type: event.event_type as i32,
        actor_player_id: event.actor_player_id,
        error_code: event.error_code.clone(),
        description: event.description.clone(),
    }
}

/// Journal suffix for one player.
pub fn event_delta(bundle: &MatchSyncBundle) -> EventDeltaPayload {
    EventDeltaPayload {
        requested_after_sequence: bundle.requested_after_sequence,
        latest_sequence: bundle.latest_sequence,
        events: bundle.events.iter().map(event_record).collect(),
    }
}

/// Terminal result notification. `winner_side` is -1 unless one side won.
pub fn game_over(view: &MatchPlayerView) -> GameOverPayload {
    let winner_side = match view.result {
        GameResult::RedWin => Side::Red as i32,
        GameResult::BlackWin => Side::Black as i32,
        GameResult::Ongoing | GameResult::Draw => -1,
    };
    GameOverPayload {
        result: view.result as i32,
        end_reason: view.end_reason as i32,
        turn_index: view.turn_index,
        is_draw: view.result == GameResult::Draw,
        winner_side,
    }
}
