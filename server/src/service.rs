//! Multi-match registry: player bindings, command routing and sync pulls.

use crate::session::{JoinError, JoinResult, MatchSession};
use jieqi_types::{
    CommandError, CommandResult, MatchEventRecord, MatchId, MatchPlayerView, PlayerCommand,
    PlayerId, Side,
};
use std::collections::HashMap;
use tracing::debug;

/// A join request routed through the service.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MatchJoinRequest {
    pub match_id: MatchId,
    pub player_id: PlayerId,
}

/// Everything a player needs to resynchronize: its view plus the journal
/// suffix after the requested sequence.
#[derive(Clone, Debug)]
pub struct MatchSyncBundle {
    pub match_id: MatchId,
    pub requested_after_sequence: u64,
    pub latest_sequence: u64,
    pub view: MatchPlayerView,
    pub events: Vec<MatchEventRecord>,
}

struct PlayerBinding {
    match_id: MatchId,
    side: Side,
    last_acked_sequence: u64,
}

/// Owns every session and every player binding. A player is bound to at most
/// one match for the lifetime of the service.
#[derive(Default)]
pub struct MatchService {
    sessions: HashMap<MatchId, MatchSession>,
    bindings: HashMap<PlayerId, PlayerBinding>,
}

impl MatchService {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind a player to a match, creating the session on first join.
    /// Re-joining the same match is idempotent and returns the assigned
    /// side; joining a different match while bound is refused.
    pub fn join_match(&mut self, request: MatchJoinRequest) -> JoinResult {
        if request.match_id == 0 || request.player_id == 0 {
            return Err(JoinError::ZeroId);
        }

        if let Some(binding) = self.bindings.get(&request.player_id) {
            if binding.match_id != request.match_id {
                return Err(JoinError::BoundToOtherMatch);
            }
            return Ok(binding.side);
        }

        let session = self
            .sessions
            .entry(request.match_id)
            .or_insert_with(|| MatchSession::new(request.match_id));
        let side = session.join(request.player_id)?;
        self.bindings.insert(
            request.player_id,
            PlayerBinding {
                match_id: request.match_id,
                side,
                last_acked_sequence: 0,
            },
        );
        debug!(
            match_id = request.match_id,
            player_id = request.player_id,
            side = ?side,
            "player bound"
        );
        Ok(side)
    }

    /// Route a command to the player's session.
    pub fn submit_player_command(
        &mut self,
        player_id: PlayerId,
        command: &PlayerCommand,
    ) -> CommandResult {
        let Some(binding) = self.bindings.get(&player_id) else {
            return Err(CommandError::PlayerNotBound);
        };
        let Some(session) = self.sessions.get_mut(&binding.match_id) else {
            return Err(CommandError::MatchNotFound);
        };
        session.submit_command(player_id, command)
    }

    /// Assemble a resync bundle for a player. `after_sequence_override`
    /// replaces the stored ack cursor as the journal start.
    pub fn pull_player_sync(
        &self,
        player_id: PlayerId,
        after_sequence_override: Option<u64>,
    ) -> Result<MatchSyncBundle, CommandError> {
        let Some(binding) = self.bindings.get(&player_id) else {
            return Err(CommandError::PlayerNotBound);
        };
        let Some(session) = self.sessions.get(&binding.match_id) else {
            return Err(CommandError::MatchNotFound);
        };

        let requested_after_sequence =
            after_sequence_override.unwrap_or(binding.last_acked_sequence);
        let view = session
            .player_view(player_id)
            .ok_or(CommandError::Internal)?;
        Ok(MatchSyncBundle {
            match_id: binding.match_id,
            requested_after_sequence,
            latest_sequence: session.latest_event_sequence(),
            view,
            events: session.pull_events(player_id, requested_after_sequence),
        })
    }

    /// Advance a player's ack cursor. The cursor never moves backwards and
    /// never past the session's latest sequence.
    pub fn ack_player_events(&mut self, player_id: PlayerId, sequence: u64) -> bool {
        let Some(binding) = self.bindings.get_mut(&player_id) else {
            return false;
        };
        if sequence < binding.last_acked_sequence {
            return false;
        }
        let Some(session) = self.sessions.get(&binding.match_id) else {
            return false;
        };
        if sequence > session.latest_event_sequence() {
            return false;
        }
        binding.last_acked_sequence = sequence;
        true
    }

    pub fn find_player_match(&self, player_id: PlayerId) -> Option<MatchId> {
        self.bindings.get(&player_id).map(|binding| binding.match_id)
    }

    pub fn player_ack_sequence(&self, player_id: PlayerId) -> Option<u64> {
        self.bindings
            .get(&player_id)
            .map(|binding| binding.last_acked_sequence)
    }

    /// Players bound to a match, in ascending player-id order.
    pub fn players_in_match(&self, match_id: MatchId) -> Vec<PlayerId> {
        let mut players: Vec<PlayerId> = self
            .bindings
            .iter()
            .filter(|(_, binding)| binding.match_id == match_id)
            .map(|(player_id, _)| *player_id)
            .collect();
        players.sort_unstable();
        players
    }

    pub fn active_match_count(&self) -> usize {
        self.sessions.len()
    }

    pub fn session(&self, match_id: MatchId) -> Option<&MatchSession> {
        self.sessions.get(&match_id)
    }
}
