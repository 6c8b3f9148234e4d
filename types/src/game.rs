//! Core game model: sides, roles, pieces, commands and match state.
//!
//! Everything here is plain data. The rules that drive it live in the
//! `jieqi-referee` crate.

use crate::PieceId;
use thiserror::Error;

/// Number of files on the board.
pub const BOARD_WIDTH: i8 = 9;

/// Number of ranks on the board.
pub const BOARD_HEIGHT: i8 = 10;

/// Total number of board cells.
pub const CELL_COUNT: usize = (BOARD_WIDTH as usize) * (BOARD_HEIGHT as usize);

/// Pieces fielded by one side.
pub const PIECES_PER_SIDE: u16 = 16;

/// Total pieces in a match.
pub const PIECE_COUNT: u16 = PIECES_PER_SIDE * 2;

/// The two players of a match.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Side {
    Red = 0,
    Black = 1,
}

impl Side {
    /// The opposing side.
    pub fn opposite(&self) -> Side {
        match self {
            Side::Red => Side::Black,
            Side::Black => Side::Red,
        }
    }

    /// Decode a wire integer code.
    pub fn from_index(value: i64) -> Option<Self> {
        match value {
            0 => Some(Side::Red),
            1 => Some(Side::Black),
            _ => None,
        }
    }
}

/// Piece role, either presented (surface) or true (actual).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum RoleType {
    King = 0,
    Advisor = 1,
    Elephant = 2,
    Horse = 3,
    Rook = 4,
    Cannon = 5,
    Pawn = 6,
}

impl RoleType {
    pub fn from_index(value: i64) -> Option<Self> {
        match value {
            0 => Some(RoleType::King),
            1 => Some(RoleType::Advisor),
            2 => Some(RoleType::Elephant),
            3 => Some(RoleType::Horse),
            4 => Some(RoleType::Rook),
            5 => Some(RoleType::Cannon),
            6 => Some(RoleType::Pawn),
            _ => None,
        }
    }
}

/// Whether a piece still presents its surface role or has been revealed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum PieceState {
    HiddenSurface = 0,
    RevealedActual = 1,
}

/// Match phase machine: setup commit, setup reveal, battle, game over.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum GamePhase {
    SetupCommit = 0,
    SetupReveal = 1,
    Battle = 2,
    GameOver = 3,
}

impl GamePhase {
    pub fn from_index(value: i64) -> Option<Self> {
        match value {
            0 => Some(GamePhase::SetupCommit),
            1 => Some(GamePhase::SetupReveal),
            2 => Some(GamePhase::Battle),
            3 => Some(GamePhase::GameOver),
            _ => None,
        }
    }
}

/// Final outcome of a match.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum GameResult {
    Ongoing = 0,
    RedWin = 1,
    BlackWin = 2,
    Draw = 3,
}

impl GameResult {
    pub fn from_index(value: i64) -> Option<Self> {
        match value {
            0 => Some(GameResult::Ongoing),
            1 => Some(GameResult::RedWin),
            2 => Some(GameResult::BlackWin),
            3 => Some(GameResult::Draw),
            _ => None,
        }
    }
}

/// Why the match ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum EndReason {
    None = 0,
    Checkmate = 1,
    Resign = 2,
    Timeout = 3,
    DoublePassDraw = 4,
    RuleViolation = 5,
}

impl EndReason {
    pub fn from_index(value: i64) -> Option<Self> {
        match value {
            0 => Some(EndReason::None),
            1 => Some(EndReason::Checkmate),
            2 => Some(EndReason::Resign),
            3 => Some(EndReason::Timeout),
            4 => Some(EndReason::DoublePassDraw),
            5 => Some(EndReason::RuleViolation),
            _ => None,
        }
    }
}

/// Player command discriminant.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum CommandType {
    CommitSetup = 0,
    RevealSetup = 1,
    Move = 2,
    Pass = 3,
    Resign = 4,
}

impl CommandType {
    pub fn from_index(value: i64) -> Option<Self> {
        match value {
            0 => Some(CommandType::CommitSetup),
            1 => Some(CommandType::RevealSetup),
            2 => Some(CommandType::Move),
            3 => Some(CommandType::Pass),
            4 => Some(CommandType::Resign),
            _ => None,
        }
    }
}

/// Board coordinate. Files run x 0..9, ranks run y 0..10 from Red's back rank.
///
/// The (-1, -1) default doubles as the "off board" sentinel for dead pieces.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct BoardPos {
    pub x: i8,
    pub y: i8,
}

impl BoardPos {
    pub const fn new(x: i8, y: i8) -> Self {
        Self { x, y }
    }

    /// Sentinel position for pieces that are not on the board.
    pub const fn invalid() -> Self {
        Self { x: -1, y: -1 }
    }

    pub fn is_valid(&self) -> bool {
        self.x >= 0 && self.x < BOARD_WIDTH && self.y >= 0 && self.y < BOARD_HEIGHT
    }
}

impl Default for BoardPos {
    fn default() -> Self {
        Self::invalid()
    }
}

/// Rule toggles for the concealed-role variant.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RuleConfig {
    /// A concealed piece flips to its actual role on its first capture.
    pub reveal_on_first_capture: bool,
    /// A captured piece's actual role becomes visible to both players.
    pub reveal_captured_role: bool,
    /// A newly revealed piece freezes if its actual role is placement-illegal
    /// at its current position.
    pub freeze_if_illegal_after_reveal: bool,
    /// A side with no legal moves (and not in check) may pass.
    pub allow_pass_when_no_legal_move: bool,
    /// Two consecutive passes end the match as a draw.
    pub double_pass_is_draw: bool,
}

impl Default for RuleConfig {
    fn default() -> Self {
        Self {
            reveal_on_first_capture: true,
            reveal_captured_role: true,
            freeze_if_illegal_after_reveal: true,
            allow_pass_when_no_legal_move: true,
            double_pass_is_draw: true,
        }
    }
}

/// One piece of the 32-piece roster.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Piece {
    pub id: PieceId,
    pub side: Side,
    /// Fixed at roster initialization by `id mod 16`; never changes.
    pub actual_role: RoleType,
    /// Role presented to opponents while hidden; derived from the setup slot.
    pub surface_role: RoleType,
    pub state: PieceState,
    /// Valid only while `alive`.
    pub pos: BoardPos,
    pub alive: bool,
    pub frozen: bool,
    pub has_captured: bool,
}

/// A move request or generated move: piece, origin, target, optional capture.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MoveAction {
    pub piece_id: PieceId,
    pub from: BoardPos,
    pub to: BoardPos,
    pub captured_piece_id: Option<PieceId>,
}

/// One placement of a reveal: which piece occupies which canonical slot.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SetupPlacement {
    pub piece_id: PieceId,
    pub target_pos: BoardPos,
}

/// Disclosed setup: the placement list plus the nonce that salted the commit.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SetupPlain {
    pub side: Side,
    pub nonce: String,
    pub placements: Vec<SetupPlacement>,
}

/// Committed setup digest. An empty hash commits to nothing (see spec notes).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SetupCommit {
    pub side: Side,
    pub hash_hex: String,
}

/// A player-issued command as the session hands it to the referee.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PlayerCommand {
    pub command_type: CommandType,
    pub side: Side,
    pub move_action: Option<MoveAction>,
    pub setup_commit: Option<SetupCommit>,
    pub setup_plain: Option<SetupPlain>,
}

impl PlayerCommand {
    pub fn commit(commit: SetupCommit) -> Self {
        Self {
            command_type: CommandType::CommitSetup,
            side: commit.side,
            move_action: None,
            setup_commit: Some(commit),
            setup_plain: None,
        }
    }

    pub fn reveal(plain: SetupPlain) -> Self {
        Self {
            command_type: CommandType::RevealSetup,
            side: plain.side,
            move_action: None,
            setup_commit: None,
            setup_plain: Some(plain),
        }
    }

    pub fn make_move(side: Side, action: MoveAction) -> Self {
        Self {
            command_type: CommandType::Move,
            side,
            move_action: Some(action),
            setup_commit: None,
            setup_plain: None,
        }
    }

    pub fn pass(side: Side) -> Self {
        Self {
            command_type: CommandType::Pass,
            side,
            move_action: None,
            setup_commit: None,
            setup_plain: None,
        }
    }

    pub fn resign(side: Side) -> Self {
        Self {
            command_type: CommandType::Resign,
            side,
            move_action: None,
            setup_commit: None,
            setup_plain: None,
        }
    }
}

/// Structured rejection for any referee, session or service command.
///
/// `code()` yields the stable wire error code; `Display` yields the human
/// message carried alongside it.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum CommandError {
    #[error("command is not allowed in the current phase")]
    InvalidPhase,
    #[error("the game has already ended")]
    GameEnded,
    #[error("the side has already committed a setup")]
    DuplicateCommit,
    #[error("the side has already revealed its setup")]
    DuplicateReveal,
    #[error("reveal received without a prior commit")]
    MissingCommit,
    #[error("reveal digest does not match the committed hash")]
    CommitMismatch,
    #[error("invalid reveal: {0}")]
    InvalidReveal(String),
    #[error("two placements target the same position")]
    PositionConflict,
    #[error("placement piece id is outside the side's range or duplicated")]
    InvalidPieceId,
    #[error("it is not the player's turn")]
    NotYourTurn,
    #[error("command payload is missing or malformed")]
    InvalidPayload,
    #[error("moved piece does not exist or is not alive")]
    InvalidPiece,
    #[error("moved piece belongs to the opponent")]
    InvalidPieceSide,
    #[error("move origin does not match the piece position")]
    InvalidFrom,
    #[error("move is not legal for the piece")]
    IllegalMove,
    #[error("passing is not allowed now")]
    PassNotAllowed,
    #[error("command type is not supported")]
    UnsupportedCommand,
    #[error("player is not bound to any match")]
    PlayerNotBound,
    #[error("bound match does not exist")]
    MatchNotFound,
    #[error("join request was rejected")]
    JoinRejected,
    #[error("internal invariant violation")]
    Internal,
}

impl CommandError {
    /// Stable wire code for this rejection.
    pub fn code(&self) -> &'static str {
        match self {
            CommandError::InvalidPhase => "ERR_INVALID_PHASE",
            CommandError::GameEnded => "ERR_GAME_OVER",
            CommandError::DuplicateCommit => "ERR_DUPLICATE_COMMIT",
            CommandError::DuplicateReveal => "ERR_DUPLICATE_REVEAL",
            CommandError::MissingCommit => "ERR_MISSING_COMMIT",
            CommandError::CommitMismatch => "ERR_COMMIT_MISMATCH",
            CommandError::InvalidReveal(_) => "ERR_INVALID_REVEAL",
            CommandError::PositionConflict => "ERR_POSITION_CONFLICT",
            CommandError::InvalidPieceId => "ERR_INVALID_PIECE_ID",
            CommandError::NotYourTurn => "ERR_NOT_YOUR_TURN",
            CommandError::InvalidPayload => "ERR_INVALID_PAYLOAD",
            CommandError::InvalidPiece => "ERR_INVALID_PIECE",
            CommandError::InvalidPieceSide => "ERR_INVALID_PIECE_SIDE",
            CommandError::InvalidFrom => "ERR_INVALID_FROM",
            CommandError::IllegalMove => "ERR_ILLEGAL_MOVE",
            CommandError::PassNotAllowed => "ERR_PASS_NOT_ALLOWED",
            CommandError::UnsupportedCommand => "ERR_UNSUPPORTED_COMMAND",
            CommandError::PlayerNotBound => "ERR_PLAYER_NOT_BOUND",
            CommandError::MatchNotFound => "ERR_MATCH_NOT_FOUND",
            CommandError::JoinRejected => "ERR_JOIN_REJECTED",
            CommandError::Internal => "ERR_INTERNAL",
        }
    }
}

/// Result of applying a command: accepted, or a structured rejection.
pub type CommandResult = Result<(), CommandError>;

/// Complete match state as the referee maintains it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GameState {
    pub phase: GamePhase,
    pub current_turn: Side,
    /// Cell -> alive piece id, indexed `x + 9 * y`.
    pub board_cells: [Option<PieceId>; CELL_COUNT],
    /// Indexed by piece id; populated at roster initialization.
    pub pieces: Vec<Piece>,
    pub red_committed: bool,
    pub black_committed: bool,
    pub red_revealed: bool,
    pub black_revealed: bool,
    pub pass_count: u32,
    pub result: GameResult,
    pub end_reason: EndReason,
    pub turn_index: u64,
}

impl Default for GameState {
    fn default() -> Self {
        Self {
            phase: GamePhase::SetupCommit,
            current_turn: Side::Red,
            board_cells: [None; CELL_COUNT],
            pieces: Vec::new(),
            red_committed: false,
            black_committed: false,
            red_revealed: false,
            black_revealed: false,
            pass_count: 0,
            result: GameResult::Ongoing,
            end_reason: EndReason::None,
            turn_index: 0,
        }
    }
}

impl GameState {
    /// Cell index for a valid position.
    pub fn cell_index(pos: BoardPos) -> Option<usize> {
        if !pos.is_valid() {
            return None;
        }
        Some(pos.x as usize + (BOARD_WIDTH as usize) * pos.y as usize)
    }

    /// Piece by id, if the roster has been initialized.
    pub fn piece(&self, id: PieceId) -> Option<&Piece> {
        self.pieces.get(id as usize)
    }

    pub fn piece_mut(&mut self, id: PieceId) -> Option<&mut Piece> {
        self.pieces.get_mut(id as usize)
    }

    /// Alive piece occupying a position.
    pub fn piece_at(&self, pos: BoardPos) -> Option<&Piece> {
        let index = Self::cell_index(pos)?;
        let id = self.board_cells[index]?;
        self.piece(id)
    }

    pub fn side_committed(&self, side: Side) -> bool {
        match side {
            Side::Red => self.red_committed,
            Side::Black => self.black_committed,
        }
    }

    pub fn side_revealed(&self, side: Side) -> bool {
        match side {
            Side::Red => self.red_revealed,
            Side::Black => self.black_revealed,
        }
    }
}
