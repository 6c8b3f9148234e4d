//! The match referee: phase machine, command application and end-game
//! detection.

use crate::{board, digest, moves};
use jieqi_types::{
    BoardPos, CommandError, CommandResult, CommandType, EndReason, GamePhase, GameResult,
    GameState, MoveAction, Piece, PieceId, PieceState, PlayerCommand, RuleConfig, SetupCommit,
    SetupPlain, Side, PIECE_COUNT,
};
use tracing::debug;

/// Deterministic rules arbiter for one match.
///
/// The referee owns the authoritative [`GameState`] and is the only writer.
/// Commands either mutate the state and return `Ok(())` or leave it untouched
/// and return a structured rejection.
pub struct Referee {
    rules: RuleConfig,
    state: GameState,
    red_commit_hash: Option<String>,
    black_commit_hash: Option<String>,
}

impl Default for Referee {
    fn default() -> Self {
        Self::new(RuleConfig::default())
    }
}

impl Referee {
    pub fn new(rules: RuleConfig) -> Self {
        let mut referee = Self {
            rules,
            state: GameState::default(),
            red_commit_hash: None,
            black_commit_hash: None,
        };
        referee.reset();
        referee
    }

    /// Restore a match in progress. Commit bookkeeping is reset; callers
    /// resuming a setup-phase match must replay commits.
    pub fn from_state(rules: RuleConfig, state: GameState) -> Self {
        Self {
            rules,
            state,
            red_commit_hash: None,
            black_commit_hash: None,
        }
    }

    /// Discard all progress and start a fresh match in the commit phase with
    /// the full roster dead and off the board.
    pub fn reset(&mut self) {
        self.state = GameState::default();
        self.red_commit_hash = None;
        self.black_commit_hash = None;
        self.initialize_roster();
    }

    pub fn state(&self) -> &GameState {
        &self.state
    }

    pub fn rules(&self) -> &RuleConfig {
        &self.rules
    }

    fn initialize_roster(&mut self) {
        self.state.pieces.clear();
        self.state.pieces.reserve(PIECE_COUNT as usize);
        for piece_id in 0..PIECE_COUNT {
            // The tables cover every id below PIECE_COUNT.
            let side = board::side_of_piece(piece_id).unwrap_or(Side::Red);
            let actual_role = board::actual_role_for_piece(piece_id)
                .unwrap_or(jieqi_types::RoleType::Pawn);
            self.state.pieces.push(Piece {
                id: piece_id,
                side,
                actual_role,
                surface_role: actual_role,
                state: PieceState::HiddenSurface,
                pos: BoardPos::invalid(),
                alive: false,
                frozen: false,
                has_captured: false,
            });
        }
    }

    fn commit_hash_slot(&mut self, side: Side) -> &mut Option<String> {
        match side {
            Side::Red => &mut self.red_commit_hash,
            Side::Black => &mut self.black_commit_hash,
        }
    }

    fn stored_commit_hash(&self, side: Side) -> Option<&String> {
        match side {
            Side::Red => self.red_commit_hash.as_ref(),
            Side::Black => self.black_commit_hash.as_ref(),
        }
    }

    /// Record a side's setup digest. Both commits advance the match to the
    /// reveal phase.
    pub fn apply_commit(&mut self, commit: &SetupCommit) -> CommandResult {
        if self.state.phase != GamePhase::SetupCommit {
            return Err(CommandError::InvalidPhase);
        }
        if self.state.side_committed(commit.side) {
            return Err(CommandError::DuplicateCommit);
        }

        *self.commit_hash_slot(commit.side) = Some(commit.hash_hex.clone());
        match commit.side {
            Side::Red => self.state.red_committed = true,
            Side::Black => self.state.black_committed = true,
        }
        debug!(side = ?commit.side, "setup committed");

        if self.state.red_committed && self.state.black_committed {
            self.state.phase = GamePhase::SetupReveal;
        }
        Ok(())
    }

    /// Disclose a side's setup. The digest is checked against the stored
    /// commit unless the stored hash is empty ("unbound" commit). Both
    /// reveals advance the match to battle with Red to move.
    pub fn apply_reveal(&mut self, setup: &SetupPlain) -> CommandResult {
        if self.state.phase != GamePhase::SetupReveal {
            return Err(CommandError::InvalidPhase);
        }
        if self.state.side_revealed(setup.side) {
            return Err(CommandError::DuplicateReveal);
        }
        let Some(stored_hash) = self.stored_commit_hash(setup.side) else {
            return Err(CommandError::MissingCommit);
        };
        if !stored_hash.is_empty() && *stored_hash != digest::reveal_digest(setup) {
            return Err(CommandError::CommitMismatch);
        }

        self.validate_setup_plain(setup)?;
        self.place_revealed_setup(setup);
        match setup.side {
            Side::Red => self.state.red_revealed = true,
            Side::Black => self.state.black_revealed = true,
        }
        debug!(side = ?setup.side, "setup revealed");

        if self.state.red_revealed && self.state.black_revealed {
            self.state.phase = GamePhase::Battle;
            self.state.current_turn = Side::Red;
        }
        Ok(())
    }

    fn validate_setup_plain(&self, setup: &SetupPlain) -> CommandResult {
        if setup.placements.len() != 16 {
            return Err(CommandError::InvalidReveal(format!(
                "expected 16 placements, got {}",
                setup.placements.len()
            )));
        }

        let mut seen_ids: Vec<PieceId> = Vec::with_capacity(16);
        let mut seen_positions: Vec<BoardPos> = Vec::with_capacity(16);
        for placement in &setup.placements {
            if board::side_of_piece(placement.piece_id) != Some(setup.side) {
                return Err(CommandError::InvalidPieceId);
            }
            if seen_ids.contains(&placement.piece_id) {
                return Err(CommandError::InvalidPieceId);
            }
            if !board::is_setup_slot(setup.side, placement.target_pos) {
                return Err(CommandError::InvalidReveal(format!(
                    "({}, {}) is not a setup slot",
                    placement.target_pos.x, placement.target_pos.y
                )));
            }
            if seen_positions.contains(&placement.target_pos) {
                return Err(CommandError::PositionConflict);
            }
            seen_ids.push(placement.piece_id);
            seen_positions.push(placement.target_pos);
        }
        Ok(())
    }

    fn place_revealed_setup(&mut self, setup: &SetupPlain) {
        for placement in &setup.placements {
            let surface_role =
                board::surface_role_for_slot(setup.side, placement.target_pos);
            let Some(cell) = GameState::cell_index(placement.target_pos) else {
                continue;
            };
            let Some(piece) = self.state.piece_mut(placement.piece_id) else {
                continue;
            };
            // Validation guarantees a slot role; keep the actual role as a
            // conservative fallback.
            piece.surface_role = surface_role.unwrap_or(piece.actual_role);
            piece.state = PieceState::HiddenSurface;
            piece.pos = placement.target_pos;
            piece.alive = true;
            piece.frozen = false;
            piece.has_captured = false;
            self.state.board_cells[cell] = Some(placement.piece_id);
        }
    }

    /// Apply any player command. Commit and reveal commands are routed to the
    /// setup handlers; battle commands are gated on phase, result and turn.
    pub fn apply_command(&mut self, command: &PlayerCommand) -> CommandResult {
        match command.command_type {
            CommandType::CommitSetup => {
                let Some(commit) = &command.setup_commit else {
                    return Err(CommandError::InvalidPayload);
                };
                self.apply_commit(commit)
            }
            CommandType::RevealSetup => {
                let Some(setup) = &command.setup_plain else {
                    return Err(CommandError::InvalidPayload);
                };
                self.apply_reveal(setup)
            }
            CommandType::Move | CommandType::Pass | CommandType::Resign => {
                self.apply_battle_command(command)
            }
        }
    }

    fn apply_battle_command(&mut self, command: &PlayerCommand) -> CommandResult {
        if self.state.phase != GamePhase::Battle {
            return Err(CommandError::InvalidPhase);
        }
        if self.state.result != GameResult::Ongoing {
            return Err(CommandError::GameEnded);
        }
        if command.side != self.state.current_turn {
            return Err(CommandError::NotYourTurn);
        }

        match command.command_type {
            CommandType::Move => {
                let Some(action) = &command.move_action else {
                    return Err(CommandError::InvalidPayload);
                };
                self.apply_move(command.side, action)
            }
            CommandType::Pass => self.apply_pass(command.side),
            CommandType::Resign => self.apply_resign(command.side),
            _ => Err(CommandError::UnsupportedCommand),
        }
    }

    fn apply_move(&mut self, side: Side, action: &MoveAction) -> CommandResult {
        let piece = self
            .state
            .piece(action.piece_id)
            .ok_or(CommandError::InvalidPiece)?;
        if !piece.alive {
            return Err(CommandError::InvalidPiece);
        }
        if piece.side != side {
            return Err(CommandError::InvalidPieceSide);
        }
        if piece.pos != action.from {
            return Err(CommandError::InvalidFrom);
        }

        let candidate = moves::pseudo_moves_for_piece(&self.state, piece)
            .into_iter()
            .find(|pseudo| pseudo.to == action.to)
            .ok_or(CommandError::IllegalMove)?;
        if self.would_leave_in_check(&candidate, side) {
            return Err(CommandError::IllegalMove);
        }

        apply_move_unchecked(&mut self.state, &self.rules, &candidate);
        self.state.pass_count = 0;
        debug!(
            piece = candidate.piece_id,
            captured = ?candidate.captured_piece_id,
            "move applied"
        );
        self.evaluate_end_after_move(side);
        self.state.turn_index += 1;
        Ok(())
    }

    fn apply_pass(&mut self, side: Side) -> CommandResult {
        if !self.can_pass(side) {
            return Err(CommandError::PassNotAllowed);
        }

        self.state.pass_count += 1;
        self.state.turn_index += 1;
        if self.rules.double_pass_is_draw && self.state.pass_count >= 2 {
            self.state.result = GameResult::Draw;
            self.state.end_reason = EndReason::DoublePassDraw;
            self.state.phase = GamePhase::GameOver;
            debug!("double pass draw");
        } else {
            self.state.current_turn = self.state.current_turn.opposite();
        }
        Ok(())
    }

    fn apply_resign(&mut self, side: Side) -> CommandResult {
        self.state.result = match side {
            Side::Red => GameResult::BlackWin,
            Side::Black => GameResult::RedWin,
        };
        self.state.end_reason = EndReason::Resign;
        self.state.phase = GamePhase::GameOver;
        self.state.turn_index += 1;
        debug!(side = ?side, "resigned");
        Ok(())
    }

    /// All legal moves for a side. Empty outside the battle phase. Not gated
    /// on the turn: end-game evaluation inspects the defender's replies
    /// before the turn flips.
    pub fn generate_legal_moves(&self, side: Side) -> Vec<MoveAction> {
        if self.state.phase != GamePhase::Battle {
            return Vec::new();
        }
        moves::pseudo_moves_for_side(&self.state, side)
            .into_iter()
            .filter(|candidate| !self.would_leave_in_check(candidate, side))
            .collect()
    }

    /// A side may pass when the rules allow it, the battle is ongoing, it is
    /// the side's turn, the side is not in check, and it has no legal move.
    pub fn can_pass(&self, side: Side) -> bool {
        self.rules.allow_pass_when_no_legal_move
            && self.state.phase == GamePhase::Battle
            && self.state.result == GameResult::Ongoing
            && side == self.state.current_turn
            && !moves::is_side_in_check(&self.state, side)
            && self.generate_legal_moves(side).is_empty()
    }

    fn would_leave_in_check(&self, candidate: &MoveAction, side: Side) -> bool {
        let mut simulated = self.state.clone();
        apply_move_unchecked(&mut simulated, &self.rules, candidate);
        moves::is_side_in_check(&simulated, side)
    }

    fn evaluate_end_after_move(&mut self, moved_side: Side) {
        let defender = moved_side.opposite();
        let defender_has_king = moves::find_king_pos(&self.state, defender).is_some();
        let defender_mated = defender_has_king
            && moves::is_side_in_check(&self.state, defender)
            && self.generate_legal_moves(defender).is_empty();

        if !defender_has_king || defender_mated {
            self.state.result = match moved_side {
                Side::Red => GameResult::RedWin,
                Side::Black => GameResult::BlackWin,
            };
            self.state.end_reason = EndReason::Checkmate;
            self.state.phase = GamePhase::GameOver;
            debug!(winner = ?moved_side, "checkmate");
        } else {
            self.state.current_turn = defender;
        }
    }
}

/// Apply a move to a state without legality checks: capture bookkeeping,
/// reveal-on-capture and the freeze rule. Shared by real application and the
/// check simulation.
fn apply_move_unchecked(state: &mut GameState, rules: &RuleConfig, action: &MoveAction) {
    let captured_id = state.piece_at(action.to).map(|piece| piece.id);
    if let Some(captured_id) = captured_id {
        if let Some(cell) = GameState::cell_index(action.to) {
            state.board_cells[cell] = None;
        }
        if let Some(captured) = state.piece_mut(captured_id) {
            captured.alive = false;
            captured.pos = BoardPos::invalid();
            if rules.reveal_captured_role {
                captured.state = PieceState::RevealedActual;
            }
        }
    }

    let (from_cell, to_cell) = (
        GameState::cell_index(action.from),
        GameState::cell_index(action.to),
    );
    if let Some(cell) = from_cell {
        state.board_cells[cell] = None;
    }
    if let Some(cell) = to_cell {
        state.board_cells[cell] = Some(action.piece_id);
    }

    let Some(mover) = state.piece_mut(action.piece_id) else {
        return;
    };
    mover.pos = action.to;
    if captured_id.is_some() {
        mover.has_captured = true;
        if mover.state == PieceState::HiddenSurface && rules.reveal_on_first_capture {
            mover.state = PieceState::RevealedActual;
            let (actual_role, side, pos) = (mover.actual_role, mover.side, mover.pos);
            if rules.freeze_if_illegal_after_reveal
                && !moves::is_role_position_legal(actual_role, side, pos)
            {
                mover.frozen = true;
            }
        }
    }
}
