//! One match: player bindings, the referee, and the event journal.

use jieqi_referee::Referee;
use jieqi_types::{
    CommandError, CommandResult, CommandType, GamePhase, MatchEventRecord, MatchEventType,
    MatchId, MatchPlayerView, MoveAction, PieceState, PieceView, PlayerCommand, PlayerId, Side,
};
use std::collections::HashMap;
use thiserror::Error;
use tracing::debug;

/// Why a join request was refused.
#[derive(Clone, Copy, Debug, Error, PartialEq, Eq)]
pub enum JoinError {
    #[error("match id and player id must be non-zero")]
    ZeroId,
    #[error("player is already bound to another match")]
    BoundToOtherMatch,
    #[error("match already has two players")]
    MatchFull,
}

/// Result of a join: the assigned side, or a refusal.
pub type JoinResult = Result<Side, JoinError>;

/// A single match session: up to two bound players, one referee, and an
/// append-only event journal whose sequences start at 1.
pub struct MatchSession {
    match_id: MatchId,
    referee: Referee,
    player_sides: HashMap<PlayerId, Side>,
    event_log: Vec<MatchEventRecord>,
    next_event_sequence: u64,
}

impl MatchSession {
    pub fn new(match_id: MatchId) -> Self {
        Self {
            match_id,
            referee: Referee::default(),
            player_sides: HashMap::new(),
            event_log: Vec::new(),
            next_event_sequence: 1,
        }
    }

    pub fn match_id(&self) -> MatchId {
        self.match_id
    }

    /// Bind a player. The first joiner plays Red, the second Black; a player
    /// already in the match gets its existing side back without a new event.
    pub fn join(&mut self, player_id: PlayerId) -> JoinResult {
        if let Some(side) = self.player_sides.get(&player_id) {
            return Ok(*side);
        }
        if self.player_sides.len() >= 2 {
            return Err(JoinError::MatchFull);
        }

        let side = if self.player_sides.is_empty() {
            Side::Red
        } else {
            Side::Black
        };
        self.player_sides.insert(player_id, side);
        debug!(match_id = self.match_id, player_id, side = ?side, "player joined");
        self.append_event(
            MatchEventType::PlayerJoined,
            player_id,
            String::new(),
            format!("player {player_id} joined as {side:?}"),
        );
        Ok(side)
    }

    /// Apply a player's command. The command side (and sub-payload sides) are
    /// overridden by the player's binding before dispatch. Accepted commands
    /// append the matching event, plus a `GameOver` event when the phase
    /// transitions; rejections append `CommandRejected` and are returned.
    pub fn submit_command(
        &mut self,
        player_id: PlayerId,
        command: &PlayerCommand,
    ) -> CommandResult {
        let Some(side) = self.player_sides.get(&player_id).copied() else {
            return Err(CommandError::PlayerNotBound);
        };

        let mut normalized = command.clone();
        normalized.side = side;
        if let Some(commit) = &mut normalized.setup_commit {
            commit.side = side;
        }
        if let Some(setup) = &mut normalized.setup_plain {
            setup.side = side;
        }

        let phase_before = self.referee.state().phase;
        match self.referee.apply_command(&normalized) {
            Ok(()) => {
                self.append_accepted_event(player_id, &normalized);
                if phase_before != GamePhase::GameOver
                    && self.referee.state().phase == GamePhase::GameOver
                {
                    self.append_game_over_event(player_id);
                }
                Ok(())
            }
            Err(error) => {
                self.append_event(
                    MatchEventType::CommandRejected,
                    player_id,
                    error.code().to_string(),
                    error.to_string(),
                );
                Err(error)
            }
        }
    }

    /// Project the match for one viewer; `None` when the player is not bound.
    pub fn player_view(&self, player_id: PlayerId) -> Option<MatchPlayerView> {
        let viewer_side = *self.player_sides.get(&player_id)?;
        let state = self.referee.state();

        let pieces = state
            .pieces
            .iter()
            .map(|piece| {
                let revealed = piece.state == PieceState::RevealedActual;
                let visible_role = if piece.side == viewer_side || revealed {
                    piece.actual_role
                } else {
                    piece.surface_role
                };
                PieceView {
                    piece_id: piece.id,
                    side: piece.side,
                    visible_role,
                    pos: piece.pos,
                    alive: piece.alive,
                    frozen: piece.frozen,
                    revealed,
                }
            })
            .collect();

        Some(MatchPlayerView {
            viewer_side,
            phase: state.phase,
            current_turn: state.current_turn,
            pass_count: state.pass_count,
            result: state.result,
            end_reason: state.end_reason,
            turn_index: state.turn_index,
            pieces,
        })
    }

    /// Journal suffix after a sequence, in order. Empty for non-members.
    pub fn pull_events(&self, player_id: PlayerId, after_sequence: u64) -> Vec<MatchEventRecord> {
        if !self.player_sides.contains_key(&player_id) {
            return Vec::new();
        }
        self.event_log
            .iter()
            .filter(|event| event.sequence > after_sequence)
            .cloned()
            .collect()
    }

    /// Sequence of the most recently appended event (zero when empty).
    pub fn latest_event_sequence(&self) -> u64 {
        self.next_event_sequence - 1
    }

    pub fn player_side(&self, player_id: PlayerId) -> Option<Side> {
        self.player_sides.get(&player_id).copied()
    }

    pub fn state(&self) -> &jieqi_types::GameState {
        self.referee.state()
    }

    /// Legal moves for a side, delegated to the referee.
    pub fn legal_moves(&self, side: Side) -> Vec<MoveAction> {
        self.referee.generate_legal_moves(side)
    }

    fn append_accepted_event(&mut self, player_id: PlayerId, command: &PlayerCommand) {
        let (event_type, description) = match command.command_type {
            CommandType::CommitSetup => (
                MatchEventType::SetupCommitted,
                format!("{:?} committed a setup digest", command.side),
            ),
            CommandType::RevealSetup => (
                MatchEventType::SetupRevealed,
                format!("{:?} revealed its setup", command.side),
            ),
            CommandType::Move => {
                let description = match &command.move_action {
                    Some(action) => format!(
                        "piece {} moved ({}, {}) -> ({}, {})",
                        action.piece_id,
                        action.from.x,
                        action.from.y,
                        action.to.x,
                        action.to.y
                    ),
                    None => "move applied".to_string(),
                };
                (MatchEventType::MoveApplied, description)
            }
            CommandType::Pass => (
                MatchEventType::PassApplied,
                format!("{:?} passed", command.side),
            ),
            CommandType::Resign => (
                MatchEventType::ResignApplied,
                format!("{:?} resigned", command.side),
            ),
        };
        self.append_event(event_type, player_id, String::new(), description);
    }

    fn append_game_over_event(&mut self, player_id: PlayerId) {
        let state = self.referee.state();
        let description = format!(
            "game over: {:?} ({:?})",
            state.result, state.end_reason
        );
        self.append_event(MatchEventType::GameOver, player_id, String::new(), description);
    }

    fn append_event(
        &mut self,
        event_type: MatchEventType,
        actor_player_id: PlayerId,
        error_code: String,
        description: String,
    ) {
        let record = MatchEventRecord {
            sequence: self.next_event_sequence,
            turn_index: self.referee.state().turn_index,
            event_type,
            actor_player_id,
            error_code,
            description,
        };
        self.next_event_sequence += 1;
        self.event_log.push(record);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jieqi_referee::board::{base_piece_id, setup_slots};
    use jieqi_types::{BoardPos, GameResult, RoleType, SetupCommit, SetupPlacement, SetupPlain};

    fn standard_setup(side: Side) -> SetupPlain {
        let base = base_piece_id(side);
        SetupPlain {
            side,
            nonce: "n".to_string(),
            placements: setup_slots(side)
                .iter()
                .enumerate()
                .map(|(index, slot)| SetupPlacement {
                    piece_id: base + index as u16,
                    target_pos: *slot,
                })
                .collect(),
        }
    }

    /// Standard black setup with the king moved onto the horse slot.
    fn swapped_black_setup() -> SetupPlain {
        let mut setup = standard_setup(Side::Black);
        let king = setup
            .placements
            .iter()
            .position(|p| p.piece_id == 20)
            .expect("king placement");
        let horse = setup
            .placements
            .iter()
            .position(|p| p.piece_id == 17)
            .expect("horse placement");
        let tmp = setup.placements[king].target_pos;
        setup.placements[king].target_pos = setup.placements[horse].target_pos;
        setup.placements[horse].target_pos = tmp;
        setup
    }

    fn empty_commit(side: Side) -> PlayerCommand {
        PlayerCommand::commit(SetupCommit {
            side,
            hash_hex: String::new(),
        })
    }

    fn advance_to_battle(
        session: &mut MatchSession,
        red_player: PlayerId,
        black_player: PlayerId,
        red_setup: SetupPlain,
        black_setup: SetupPlain,
    ) {
        session
            .submit_command(red_player, &empty_commit(Side::Red))
            .expect("red commit");
        session
            .submit_command(black_player, &empty_commit(Side::Black))
            .expect("black commit");
        session
            .submit_command(red_player, &PlayerCommand::reveal(red_setup))
            .expect("red reveal");
        session
            .submit_command(black_player, &PlayerCommand::reveal(black_setup))
            .expect("black reveal");
        assert_eq!(session.state().phase, GamePhase::Battle);
    }

    #[test]
    fn test_join_assigns_red_then_black() {
        let mut session = MatchSession::new(7);

        assert_eq!(session.join(1001), Ok(Side::Red));
        assert_eq!(session.join(1002), Ok(Side::Black));
        assert_eq!(session.join(1003), Err(JoinError::MatchFull));

        // Re-join is idempotent and appends no second event.
        assert_eq!(session.join(1001), Ok(Side::Red));
        assert_eq!(session.latest_event_sequence(), 2);
        let events = session.pull_events(1001, 0);
        assert_eq!(events.len(), 2);
        assert!(events
            .iter()
            .all(|event| event.event_type == MatchEventType::PlayerJoined));
        assert_eq!(events[0].sequence, 1);
        assert_eq!(events[1].sequence, 2);
    }

    #[test]
    fn test_submit_overrides_side_from_binding() {
        let mut session = MatchSession::new(8);
        session.join(1001).expect("red join");
        session.join(1002).expect("black join");

        // The red player claims to commit for Black; the binding wins.
        let forged = PlayerCommand::commit(SetupCommit {
            side: Side::Black,
            hash_hex: String::new(),
        });
        assert_eq!(session.submit_command(1001, &forged), Ok(()));
        assert!(session.state().red_committed);
        assert!(!session.state().black_committed);
    }

    #[test]
    fn test_unjoined_player_is_rejected_without_event() {
        let mut session = MatchSession::new(8);
        session.join(1001).expect("red join");

        let result = session.submit_command(9999, &empty_commit(Side::Red));
        assert_eq!(result, Err(CommandError::PlayerNotBound));
        assert_eq!(session.latest_event_sequence(), 1);
    }

    #[test]
    fn test_view_hides_opponent_surface_until_reveal() {
        let mut session = MatchSession::new(8);
        session.join(2001).expect("red join");
        session.join(2002).expect("black join");
        advance_to_battle(
            &mut session,
            2001,
            2002,
            standard_setup(Side::Red),
            swapped_black_setup(),
        );

        // Red sees the concealed black king as the slot's horse.
        let red_view = session.player_view(2001).expect("red view");
        assert_eq!(red_view.viewer_side, Side::Red);
        let concealed_king = red_view
            .pieces
            .iter()
            .find(|piece| piece.piece_id == 20)
            .expect("black king in view");
        assert_eq!(concealed_king.pos, BoardPos::new(1, 9));
        assert_eq!(concealed_king.visible_role, RoleType::Horse);
        assert!(!concealed_king.revealed);

        // Black sees its own piece truthfully.
        let black_view = session.player_view(2002).expect("black view");
        let own_king = black_view
            .pieces
            .iter()
            .find(|piece| piece.piece_id == 20)
            .expect("black king in view");
        assert_eq!(own_king.visible_role, RoleType::King);

        // Unjoined players get nothing.
        assert!(session.player_view(9999).is_none());
        assert!(session.pull_events(9999, 0).is_empty());
    }

    #[test]
    fn test_events_record_commands_and_rejections() {
        let mut session = MatchSession::new(9);
        session.join(3001).expect("red join");
        session.join(3002).expect("black join");
        advance_to_battle(
            &mut session,
            3001,
            3002,
            standard_setup(Side::Red),
            standard_setup(Side::Black),
        );

        // 2 joins + 2 commits + 2 reveals so far.
        assert_eq!(session.latest_event_sequence(), 6);
        let after_joins = session.pull_events(3001, 2);
        assert_eq!(after_joins.len(), 4);
        assert_eq!(after_joins[0].sequence, 3);
        assert_eq!(after_joins[0].event_type, MatchEventType::SetupCommitted);
        assert_eq!(after_joins[2].event_type, MatchEventType::SetupRevealed);

        // An illegal move is rejected and journaled with its code.
        let illegal = PlayerCommand::make_move(
            Side::Red,
            MoveAction {
                piece_id: 0,
                from: BoardPos::new(1, 1),
                to: BoardPos::new(1, 2),
                captured_piece_id: None,
            },
        );
        assert!(session.submit_command(3001, &illegal).is_err());
        let events = session.pull_events(3001, 0);
        let last = events.last().expect("rejection event");
        assert_eq!(last.event_type, MatchEventType::CommandRejected);
        assert_eq!(last.error_code, "ERR_INVALID_FROM");

        // An accepted move is journaled as MoveApplied.
        let opening = PlayerCommand::make_move(
            Side::Red,
            MoveAction {
                piece_id: 11,
                from: BoardPos::new(0, 3),
                to: BoardPos::new(0, 4),
                captured_piece_id: None,
            },
        );
        assert_eq!(session.submit_command(3001, &opening), Ok(()));
        let last = session.pull_events(3001, 0).pop().expect("move event");
        assert_eq!(last.event_type, MatchEventType::MoveApplied);
        assert_eq!(last.actor_player_id, 3001);
    }

    #[test]
    fn test_resign_appends_game_over_event() {
        let mut session = MatchSession::new(10);
        session.join(4001).expect("red join");
        session.join(4002).expect("black join");
        advance_to_battle(
            &mut session,
            4001,
            4002,
            standard_setup(Side::Red),
            standard_setup(Side::Black),
        );

        assert_eq!(
            session.submit_command(4002, &PlayerCommand::resign(Side::Black)),
            Ok(())
        );
        let events = session.pull_events(4001, 0);
        let tail: Vec<MatchEventType> = events
            .iter()
            .rev()
            .take(2)
            .map(|event| event.event_type)
            .collect();
        assert_eq!(
            tail,
            vec![MatchEventType::GameOver, MatchEventType::ResignApplied]
        );
        assert_eq!(session.state().result, GameResult::RedWin);

        // Sequences stay dense and strictly increasing.
        for (index, event) in events.iter().enumerate() {
            assert_eq!(event.sequence, index as u64 + 1);
        }
    }

    #[test]
    fn test_capture_reveals_role_to_opponent_view() {
        // Red advisor 3 opens on the cannon slot; black standard. The
        // capture on (1, 9) reveals it to both viewers.
        let mut red_setup = standard_setup(Side::Red);
        let advisor = red_setup
            .placements
            .iter()
            .position(|p| p.piece_id == 3)
            .expect("advisor placement");
        let cannon = red_setup
            .placements
            .iter()
            .position(|p| p.piece_id == 9)
            .expect("cannon placement");
        let tmp = red_setup.placements[advisor].target_pos;
        red_setup.placements[advisor].target_pos = red_setup.placements[cannon].target_pos;
        red_setup.placements[cannon].target_pos = tmp;

        let mut session = MatchSession::new(11);
        session.join(5001).expect("red join");
        session.join(5002).expect("black join");
        advance_to_battle(
            &mut session,
            5001,
            5002,
            red_setup,
            standard_setup(Side::Black),
        );

        // Before the capture, black sees the advisor as a cannon.
        let before = session.player_view(5002).expect("black view");
        let concealed = before
            .pieces
            .iter()
            .find(|piece| piece.piece_id == 3)
            .expect("red piece in view");
        assert_eq!(concealed.visible_role, RoleType::Cannon);

        let capture = PlayerCommand::make_move(
            Side::Red,
            MoveAction {
                piece_id: 3,
                from: BoardPos::new(1, 2),
                to: BoardPos::new(1, 9),
                captured_piece_id: Some(17),
            },
        );
        assert_eq!(session.submit_command(5001, &capture), Ok(()));

        let after = session.player_view(5002).expect("black view");
        let revealed = after
            .pieces
            .iter()
            .find(|piece| piece.piece_id == 3)
            .expect("red piece in view");
        assert_eq!(revealed.visible_role, RoleType::Advisor);
        assert!(revealed.revealed);
        assert!(revealed.frozen);
    }
}
