//! Shared schema types for jieqi.
//!
//! This crate defines the core game model (`game`), the match event journal and
//! per-viewer projections (`event`, `view`), and the wire schema plus its JSON
//! codec (`protocol`, `codec`). It is the single public surface shared by the
//! referee and the server crates.
//!
//! ## Stability and compatibility
//! The wire records in `protocol` and the numeric enum codes in `game` and
//! `event` are part of the client protocol. Field names and codes must not
//! change without a protocol version bump.

pub mod codec;
pub mod event;
pub mod game;
pub mod protocol;
pub mod view;

pub use event::*;
pub use game::*;
pub use view::*;

/// Identifies one match within a service. Zero is reserved as "no match".
pub type MatchId = u64;

/// Identifies one player across the service. Zero is reserved as "no player".
pub type PlayerId = u64;

/// Stable per-match piece identity: 0..16 are Red, 16..32 are Black.
pub type PieceId = u16;
