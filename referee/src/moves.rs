//! Pseudo-move generation, attack testing and check detection.
//!
//! A pseudo-move respects the piece's movement rule and board occupancy but
//! not king safety. Legality filtering (simulate, then test check) is done by
//! the referee. Concealed pieces move by their surface role; revealed pieces
//! move by their actual role. Dead and frozen pieces generate nothing.

use crate::board;
use jieqi_types::{BoardPos, GameState, MoveAction, Piece, RoleType, Side};

/// The role a piece currently moves by.
pub fn active_role(piece: &Piece) -> RoleType {
    match piece.state {
        jieqi_types::PieceState::HiddenSurface => piece.surface_role,
        jieqi_types::PieceState::RevealedActual => piece.actual_role,
    }
}

/// Whether the role is placement-legal at a position, used for the
/// freeze-after-reveal rule. Roles without placement constraints are always
/// legal.
pub fn is_role_position_legal(role: RoleType, side: Side, pos: BoardPos) -> bool {
    match role {
        RoleType::King => board::in_palace(side, pos),
        RoleType::Advisor => board::is_advisor_point(side, pos),
        RoleType::Elephant => board::is_elephant_point(side, pos),
        _ => true,
    }
}

fn occupant_side(state: &GameState, pos: BoardPos) -> Option<Side> {
    state.piece_at(pos).map(|piece| piece.side)
}

/// Number of alive pieces strictly between two positions sharing a file or a
/// rank. Returns `None` when the positions are not aligned.
pub fn count_between_straight(state: &GameState, from: BoardPos, to: BoardPos) -> Option<u32> {
    if from == to {
        return None;
    }
    let (dx, dy) = (to.x - from.x, to.y - from.y);
    if dx != 0 && dy != 0 {
        return None;
    }

    let step = (dx.signum(), dy.signum());
    let mut cursor = BoardPos::new(from.x + step.0, from.y + step.1);
    let mut count = 0;
    while cursor != to {
        if state.piece_at(cursor).is_some() {
            count += 1;
        }
        cursor = BoardPos::new(cursor.x + step.0, cursor.y + step.1);
    }
    Some(count)
}

/// Push a pseudo-move if the target is on the board and not occupied by a
/// friendly piece.
fn push_if_enterable(state: &GameState, piece: &Piece, to: BoardPos, out: &mut Vec<MoveAction>) {
    if !to.is_valid() {
        return;
    }
    match state.piece_at(to) {
        Some(occupant) if occupant.side == piece.side => {}
        occupant => out.push(MoveAction {
            piece_id: piece.id,
            from: piece.pos,
            to,
            captured_piece_id: occupant.map(|p| p.id),
        }),
    }
}

fn king_moves(state: &GameState, piece: &Piece, out: &mut Vec<MoveAction>) {
    for (dx, dy) in [(1, 0), (-1, 0), (0, 1), (0, -1)] {
        let to = BoardPos::new(piece.pos.x + dx, piece.pos.y + dy);
        if board::in_palace(piece.side, to) {
            push_if_enterable(state, piece, to, out);
        }
    }
}

fn advisor_moves(state: &GameState, piece: &Piece, out: &mut Vec<MoveAction>) {
    for (dx, dy) in [(1, 1), (1, -1), (-1, 1), (-1, -1)] {
        let to = BoardPos::new(piece.pos.x + dx, piece.pos.y + dy);
        if board::is_advisor_point(piece.side, to) {
            push_if_enterable(state, piece, to, out);
        }
    }
}

fn elephant_moves(state: &GameState, piece: &Piece, out: &mut Vec<MoveAction>) {
    for (dx, dy) in [(2, 2), (2, -2), (-2, 2), (-2, -2)] {
        let to = BoardPos::new(piece.pos.x + dx, piece.pos.y + dy);
        if !to.is_valid() || board::has_crossed_river(piece.side, to) {
            continue;
        }
        let eye = BoardPos::new(piece.pos.x + dx / 2, piece.pos.y + dy / 2);
        if state.piece_at(eye).is_some() {
            continue;
        }
        push_if_enterable(state, piece, to, out);
    }
}

fn horse_moves(state: &GameState, piece: &Piece, out: &mut Vec<MoveAction>) {
    const JUMPS: [((i8, i8), (i8, i8)); 8] = [
        ((1, 2), (0, 1)),
        ((-1, 2), (0, 1)),
        ((1, -2), (0, -1)),
        ((-1, -2), (0, -1)),
        ((2, 1), (1, 0)),
        ((2, -1), (1, 0)),
        ((-2, 1), (-1, 0)),
        ((-2, -1), (-1, 0)),
    ];
    for ((dx, dy), (leg_dx, leg_dy)) in JUMPS {
        let to = BoardPos::new(piece.pos.x + dx, piece.pos.y + dy);
        if !to.is_valid() {
            continue;
        }
        let leg = BoardPos::new(piece.pos.x + leg_dx, piece.pos.y + leg_dy);
        if state.piece_at(leg).is_some() {
            continue;
        }
        push_if_enterable(state, piece, to, out);
    }
}

fn rook_moves(state: &GameState, piece: &Piece, out: &mut Vec<MoveAction>) {
    for (dx, dy) in [(1, 0), (-1, 0), (0, 1), (0, -1)] {
        let mut to = BoardPos::new(piece.pos.x + dx, piece.pos.y + dy);
        while to.is_valid() {
            match occupant_side(state, to) {
                None => push_if_enterable(state, piece, to, out),
                Some(_) => {
                    // First piece on the ray: capturable if hostile, then stop.
                    push_if_enterable(state, piece, to, out);
                    break;
                }
            }
            to = BoardPos::new(to.x + dx, to.y + dy);
        }
    }
}

fn cannon_moves(state: &GameState, piece: &Piece, out: &mut Vec<MoveAction>) {
    for (dx, dy) in [(1, 0), (-1, 0), (0, 1), (0, -1)] {
        let mut to = BoardPos::new(piece.pos.x + dx, piece.pos.y + dy);
        let mut jumped_screen = false;
        while to.is_valid() {
            match occupant_side(state, to) {
                None => {
                    if !jumped_screen {
                        push_if_enterable(state, piece, to, out);
                    }
                }
                Some(side) => {
                    if !jumped_screen {
                        jumped_screen = true;
                    } else {
                        // Exactly one screen between: capture if hostile.
                        if side != piece.side {
                            push_if_enterable(state, piece, to, out);
                        }
                        break;
                    }
                }
            }
            to = BoardPos::new(to.x + dx, to.y + dy);
        }
    }
}

fn pawn_moves(state: &GameState, piece: &Piece, out: &mut Vec<MoveAction>) {
    let forward = BoardPos::new(piece.pos.x, piece.pos.y + board::forward_dy(piece.side));
    if forward.is_valid() {
        push_if_enterable(state, piece, forward, out);
    }
    if board::has_crossed_river(piece.side, piece.pos) {
        for dx in [1, -1] {
            let sideways = BoardPos::new(piece.pos.x + dx, piece.pos.y);
            if sideways.is_valid() {
                push_if_enterable(state, piece, sideways, out);
            }
        }
    }
}

/// All pseudo-moves for one piece under its active role.
pub fn pseudo_moves_for_piece(state: &GameState, piece: &Piece) -> Vec<MoveAction> {
    if !piece.alive || piece.frozen {
        return Vec::new();
    }

    let mut out = Vec::new();
    match active_role(piece) {
        RoleType::King => king_moves(state, piece, &mut out),
        RoleType::Advisor => advisor_moves(state, piece, &mut out),
        RoleType::Elephant => elephant_moves(state, piece, &mut out),
        RoleType::Horse => horse_moves(state, piece, &mut out),
        RoleType::Rook => rook_moves(state, piece, &mut out),
        RoleType::Cannon => cannon_moves(state, piece, &mut out),
        RoleType::Pawn => pawn_moves(state, piece, &mut out),
    }
    out
}

/// All pseudo-moves for a side.
pub fn pseudo_moves_for_side(state: &GameState, side: Side) -> Vec<MoveAction> {
    let mut out = Vec::new();
    for piece in &state.pieces {
        if piece.side == side {
            out.extend(pseudo_moves_for_piece(state, piece));
        }
    }
    out
}

/// Whether any of `attacker_side`'s pieces has a pseudo-move landing on the
/// target square.
pub fn is_square_attacked(state: &GameState, target: BoardPos, attacker_side: Side) -> bool {
    state
        .pieces
        .iter()
        .filter(|piece| piece.side == attacker_side)
        .any(|piece| {
            pseudo_moves_for_piece(state, piece)
                .iter()
                .any(|candidate| candidate.to == target)
        })
}

/// Position of a side's alive king, if any. Looks up the piece whose actual
/// role is King; the concealed board always has exactly one per side while it
/// lives.
pub fn find_king_pos(state: &GameState, side: Side) -> Option<BoardPos> {
    state
        .pieces
        .iter()
        .find(|piece| {
            piece.side == side && piece.alive && piece.actual_role == RoleType::King
        })
        .map(|piece| piece.pos)
}

/// Flying-general rule: the two kings share a file with nothing between.
pub fn kings_facing(state: &GameState) -> bool {
    let (Some(red), Some(black)) = (
        find_king_pos(state, Side::Red),
        find_king_pos(state, Side::Black),
    ) else {
        return false;
    };
    if red.x != black.x {
        return false;
    }
    count_between_straight(state, red, black) == Some(0)
}

/// Whether a side's king is currently attacked, including by the
/// flying-general rule. A side with no king is not "in check" (the game is
/// already decided).
pub fn is_side_in_check(state: &GameState, side: Side) -> bool {
    let Some(king_pos) = find_king_pos(state, side) else {
        return false;
    };
    if kings_facing(state) {
        return true;
    }
    is_square_attacked(state, king_pos, side.opposite())
}
