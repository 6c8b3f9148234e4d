//! Setup commit/reveal digest.
//!
//! The digest is a 64-bit FNV-1a over the canonical textual serialization
//! `side|nonce|{pieceId|x|y|}*` with placements ordered by piece id, rendered
//! as 16 lowercase hex digits. It binds a commit to a later reveal against
//! accidental corruption only; it is deliberately not cryptographic.

use jieqi_types::{SetupPlain, SetupPlacement, Side};

const FNV_OFFSET_BASIS: u64 = 0xcbf2_9ce4_8422_2325;
const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;

/// 64-bit FNV-1a over a byte string.
pub fn fnv1a64(bytes: &[u8]) -> u64 {
    let mut hash = FNV_OFFSET_BASIS;
    for &byte in bytes {
        hash ^= byte as u64;
        hash = hash.wrapping_mul(FNV_PRIME);
    }
    hash
}

/// Canonical serialization hashed by [`reveal_digest`].
fn canonical_text(side: Side, nonce: &str, placements: &[SetupPlacement]) -> String {
    let mut ordered: Vec<SetupPlacement> = placements.to_vec();
    ordered.sort_by_key(|placement| placement.piece_id);

    let mut text = format!("{}|{}|", side as u8, nonce);
    for placement in &ordered {
        text.push_str(&format!(
            "{}|{}|{}|",
            placement.piece_id, placement.target_pos.x, placement.target_pos.y
        ));
    }
    text
}

/// Digest of a disclosed setup, as 16 lowercase hex digits.
pub fn reveal_digest(setup: &SetupPlain) -> String {
    let text = canonical_text(setup.side, &setup.nonce, &setup.placements);
    format!("{:016x}", fnv1a64(text.as_bytes()))
}
