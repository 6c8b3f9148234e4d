//! Per-viewer state projections.
//!
//! A view is the only shape in which match state leaves the session: each
//! piece carries a `visible_role` that hides concealed opponents' actual
//! roles behind their surface roles.

use crate::{
    BoardPos, EndReason, GamePhase, GameResult, PieceId, RoleType, Side,
};

/// One piece as a specific viewer sees it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PieceView {
    pub piece_id: PieceId,
    pub side: Side,
    /// The actual role iff the viewer owns the piece or it has been revealed;
    /// the surface role otherwise.
    pub visible_role: RoleType,
    pub pos: BoardPos,
    pub alive: bool,
    pub frozen: bool,
    pub revealed: bool,
}

/// Full match projection for one viewer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MatchPlayerView {
    pub viewer_side: Side,
    pub phase: GamePhase,
    pub current_turn: Side,
    pub pass_count: u32,
    pub result: GameResult,
    pub end_reason: EndReason,
    pub turn_index: u64,
    pub pieces: Vec<PieceView>,
}
