//! Board geometry: palaces, river, role points and the canonical setup slots.
//!
//! All predicates are pure and side-relative. Red occupies ranks y 0..5,
//! Black occupies ranks y 5..10; Black coordinates mirror Red's through
//! y' = 9 - y.

use jieqi_types::{BoardPos, PieceId, RoleType, Side, PIECES_PER_SIDE, PIECE_COUNT};

/// The sixteen canonical setup slots for Red, in canonical order: back rank
/// left to right, then the two cannon slots, then the five pawn slots.
pub const RED_SETUP_SLOTS: [BoardPos; 16] = [
    BoardPos::new(0, 0),
    BoardPos::new(1, 0),
    BoardPos::new(2, 0),
    BoardPos::new(3, 0),
    BoardPos::new(4, 0),
    BoardPos::new(5, 0),
    BoardPos::new(6, 0),
    BoardPos::new(7, 0),
    BoardPos::new(8, 0),
    BoardPos::new(1, 2),
    BoardPos::new(7, 2),
    BoardPos::new(0, 3),
    BoardPos::new(2, 3),
    BoardPos::new(4, 3),
    BoardPos::new(6, 3),
    BoardPos::new(8, 3),
];

/// Mirror a Red-relative position into the given side's half.
pub fn side_relative(side: Side, pos: BoardPos) -> BoardPos {
    match side {
        Side::Red => pos,
        Side::Black => BoardPos::new(pos.x, 9 - pos.y),
    }
}

/// The sixteen canonical setup slots for a side, in canonical order.
pub fn setup_slots(side: Side) -> [BoardPos; 16] {
    let mut slots = RED_SETUP_SLOTS;
    for slot in &mut slots {
        *slot = side_relative(side, *slot);
    }
    slots
}

/// Whether a position is one of the side's canonical setup slots.
pub fn is_setup_slot(side: Side, pos: BoardPos) -> bool {
    setup_slots(side).contains(&pos)
}

/// Surface role presented by a piece occupying a setup slot: the role that
/// slot holds in the orthodox opening arrangement.
pub fn surface_role_for_slot(side: Side, pos: BoardPos) -> Option<RoleType> {
    let relative = side_relative(side, pos);
    match (relative.x, relative.y) {
        (0 | 8, 0) => Some(RoleType::Rook),
        (1 | 7, 0) => Some(RoleType::Horse),
        (2 | 6, 0) => Some(RoleType::Elephant),
        (3 | 5, 0) => Some(RoleType::Advisor),
        (4, 0) => Some(RoleType::King),
        (1 | 7, 2) => Some(RoleType::Cannon),
        (0 | 2 | 4 | 6 | 8, 3) => Some(RoleType::Pawn),
        _ => None,
    }
}

/// Actual role fixed by piece id: `id mod 16` indexes the roster table.
pub fn actual_role_for_piece(piece_id: PieceId) -> Option<RoleType> {
    if piece_id >= PIECE_COUNT {
        return None;
    }
    match piece_id % PIECES_PER_SIDE {
        0 | 8 => Some(RoleType::Rook),
        1 | 7 => Some(RoleType::Horse),
        2 | 6 => Some(RoleType::Elephant),
        3 | 5 => Some(RoleType::Advisor),
        4 => Some(RoleType::King),
        9 | 10 => Some(RoleType::Cannon),
        _ => Some(RoleType::Pawn),
    }
}

/// Side owning a piece id: 0..16 Red, 16..32 Black.
pub fn side_of_piece(piece_id: PieceId) -> Option<Side> {
    if piece_id < PIECES_PER_SIDE {
        Some(Side::Red)
    } else if piece_id < PIECE_COUNT {
        Some(Side::Black)
    } else {
        None
    }
}

/// First piece id owned by a side.
pub fn base_piece_id(side: Side) -> PieceId {
    match side {
        Side::Red => 0,
        Side::Black => PIECES_PER_SIDE,
    }
}

/// Whether a position lies inside the side's palace (x 3..6, home three
/// ranks).
pub fn in_palace(side: Side, pos: BoardPos) -> bool {
    let relative = side_relative(side, pos);
    (3..=5).contains(&relative.x) && (0..=2).contains(&relative.y)
}

/// The five advisor points of a side's palace.
pub fn is_advisor_point(side: Side, pos: BoardPos) -> bool {
    let relative = side_relative(side, pos);
    matches!(
        (relative.x, relative.y),
        (3, 0) | (5, 0) | (4, 1) | (3, 2) | (5, 2)
    )
}

/// The seven elephant points of a side's half.
pub fn is_elephant_point(side: Side, pos: BoardPos) -> bool {
    let relative = side_relative(side, pos);
    matches!(
        (relative.x, relative.y),
        (2, 0) | (6, 0) | (0, 2) | (4, 2) | (8, 2) | (2, 4) | (6, 4)
    )
}

/// Whether a position is past the river from the side's perspective.
pub fn has_crossed_river(side: Side, pos: BoardPos) -> bool {
    match side {
        Side::Red => pos.y >= 5,
        Side::Black => pos.y <= 4,
    }
}

/// Forward rank direction for a side's pawns.
pub fn forward_dy(side: Side) -> i8 {
    match side {
        Side::Red => 1,
        Side::Black => -1,
    }
}
