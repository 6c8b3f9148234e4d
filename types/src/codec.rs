//! JSON codec for the wire schema.
//!
//! Encoding emits the canonical field order (struct declaration order) with
//! decimal numbers, `true`/`false` booleans and escaped strings. Decoding
//! accepts keys in any order and fails on a missing required field, a value
//! of the wrong kind, or trailing garbage after the closing brace.

use crate::protocol::Envelope;
use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;

/// Errors produced while encoding or decoding wire records.
#[derive(Debug, Error)]
pub enum CodecError {
    #[error("malformed wire text: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type for codec operations.
pub type CodecResult<T> = Result<T, CodecError>;

/// Encode any wire record to its canonical JSON text.
pub fn encode<T: Serialize>(value: &T) -> CodecResult<String> {
    Ok(serde_json::to_string(value)?)
}

/// Decode a wire record, rejecting malformed or trailing input.
pub fn decode<T: DeserializeOwned>(text: &str) -> CodecResult<T> {
    Ok(serde_json::from_str(text)?)
}

/// Encode an envelope to its canonical JSON text.
pub fn encode_envelope(envelope: &Envelope) -> CodecResult<String> {
    encode(envelope)
}

/// Decode an envelope, rejecting malformed or trailing input.
pub fn decode_envelope(text: &str) -> CodecResult<Envelope> {
    decode(text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::*;

    #[test]
    fn test_envelope_round_trip() {
        let envelope = Envelope {
            message_type: MessageType::Join,
            sequence: 7,
            match_id: "900".to_string(),
            payload_json: r#"{"matchId":900,"playerId":10001}"#.to_string(),
        };

        let text = encode_envelope(&envelope).expect("encode");
        let decoded = decode_envelope(&text).expect("decode");
        assert_eq!(decoded, envelope);
    }

    #[test]
    fn test_envelope_canonical_field_order() {
        let envelope = Envelope {
            message_type: MessageType::Ping,
            sequence: 1,
            match_id: "1".to_string(),
            payload_json: "{}".to_string(),
        };

        let text = encode_envelope(&envelope).expect("encode");
        assert_eq!(
            text,
            r#"{"messageType":102,"sequence":1,"matchId":"1","payloadJson":"{}"}"#
        );
    }

    #[test]
    fn test_envelope_accepts_any_key_order() {
        let text = r#"{"payloadJson":"{}","matchId":"42","sequence":3,"messageType":103}"#;
        let envelope = decode_envelope(text).expect("decode");
        assert_eq!(envelope.message_type, MessageType::PullSync);
        assert_eq!(envelope.sequence, 3);
        assert_eq!(envelope.match_id, "42");
    }

    #[test]
    fn test_envelope_rejects_bad_input() {
        // Missing required field.
        assert!(decode_envelope(r#"{"messageType":102,"sequence":1,"matchId":"1"}"#).is_err());
        // Wrong kind.
        assert!(decode_envelope(
            r#"{"messageType":102,"sequence":"one","matchId":"1","payloadJson":"{}"}"#
        )
        .is_err());
        // Unknown message type code.
        assert!(decode_envelope(
            r#"{"messageType":999,"sequence":1,"matchId":"1","payloadJson":"{}"}"#
        )
        .is_err());
        // Trailing garbage.
        assert!(decode_envelope(
            r#"{"messageType":102,"sequence":1,"matchId":"1","payloadJson":"{}"} trailing"#
        )
        .is_err());
        // Not JSON at all.
        assert!(decode_envelope("{invalid json").is_err());
    }

    #[test]
    fn test_string_escapes_round_trip() {
        let payload = ErrorPayload {
            error_message: "quote \" backslash \\ newline \n tab \t cr \r slash /".to_string(),
        };
        let text = encode(&payload).expect("encode");
        let decoded: ErrorPayload = decode(&text).expect("decode");
        assert_eq!(decoded, payload);
    }

    #[test]
    fn test_command_payload_round_trip_with_move() {
        let payload = CommandPayload {
            player_id: 10001,
            command_type: 2,
            side: 0,
            has_move: true,
            has_setup_commit: false,
            has_setup_plain: false,
            move_action: Some(MovePayload {
                piece_id: 11,
                from_x: 0,
                from_y: 3,
                to_x: 0,
                to_y: 4,
                has_captured_piece_id: false,
                captured_piece_id: 0,
            }),
            setup_commit: None,
            setup_plain: None,
        };

        let text = encode(&payload).expect("encode");
        let decoded: CommandPayload = decode(&text).expect("decode");
        assert_eq!(decoded, payload);
        // Absent sub-records stay off the wire.
        assert!(!text.contains("setupCommit"));
        assert!(!text.contains("setupPlain"));
        assert!(text.contains(r#""move":{"#));
    }

    #[test]
    fn test_command_payload_round_trip_with_setup_plain() {
        let payload = CommandPayload {
            player_id: 10002,
            command_type: 1,
            side: 1,
            has_move: false,
            has_setup_commit: false,
            has_setup_plain: true,
            move_action: None,
            setup_commit: None,
            setup_plain: Some(SetupPlainPayload {
                side: 1,
                nonce: "B-nonce".to_string(),
                placements: vec![
                    SetupPlacementPayload { piece_id: 16, x: 0, y: 9 },
                    SetupPlacementPayload { piece_id: 17, x: 1, y: 9 },
                ],
            }),
        };

        let text = encode(&payload).expect("encode");
        let decoded: CommandPayload = decode(&text).expect("decode");
        assert_eq!(decoded, payload);
    }

    #[test]
    fn test_payload_round_trips() {
        let join = JoinPayload { match_id: 900, player_id: 10001 };
        let decoded: JoinPayload = decode(&encode(&join).expect("encode")).expect("decode");
        assert_eq!(decoded, join);

        let pull = PullSyncPayload {
            player_id: 10001,
            has_after_sequence_override: true,
            after_sequence_override: 5,
        };
        let decoded: PullSyncPayload = decode(&encode(&pull).expect("encode")).expect("decode");
        assert_eq!(decoded, pull);

        let ack = AckPayload { player_id: 10001, sequence: 3 };
        let decoded: AckPayload = decode(&encode(&ack).expect("encode")).expect("decode");
        assert_eq!(decoded, ack);

        let join_ack = JoinAckPayload {
            accepted: false,
            assigned_side: 0,
            error_code: "ERR_JOIN_REJECTED".to_string(),
            error_message: "match already has two players".to_string(),
        };
        let decoded: JoinAckPayload =
            decode(&encode(&join_ack).expect("encode")).expect("decode");
        assert_eq!(decoded, join_ack);

        let command_ack = CommandAckPayload {
            accepted: true,
            error_code: String::new(),
            error_message: String::new(),
        };
        let decoded: CommandAckPayload =
            decode(&encode(&command_ack).expect("encode")).expect("decode");
        assert_eq!(decoded, command_ack);

        let snapshot = SnapshotPayload {
            viewer_side: 0,
            phase: 2,
            current_turn: 1,
            pass_count: 0,
            result: 0,
            end_reason: 0,
            turn_index: 1,
            last_event_sequence: 8,
            pieces: vec![PieceSnapshotPayload {
                piece_id: 11,
                side: 0,
                visible_role: 6,
                x: 0,
                y: 4,
                alive: true,
                frozen: false,
                revealed: false,
            }],
        };
        let decoded: SnapshotPayload =
            decode(&encode(&snapshot).expect("encode")).expect("decode");
        assert_eq!(decoded, snapshot);

        let delta = EventDeltaPayload {
            requested_after_sequence: 2,
            latest_sequence: 4,
            events: vec![EventRecordPayload {
                sequence: 3,
                turn_index: 0,
                event_type: 1,
                actor_player_id: 10001,
                error_code: String::new(),
                description: "red committed setup".to_string(),
            }],
        };
        let decoded: EventDeltaPayload =
            decode(&encode(&delta).expect("encode")).expect("decode");
        assert_eq!(decoded, delta);

        let game_over = GameOverPayload {
            result: 1,
            end_reason: 2,
            turn_index: 4,
            is_draw: false,
            winner_side: 0,
        };
        let decoded: GameOverPayload =
            decode(&encode(&game_over).expect("encode")).expect("decode");
        assert_eq!(decoded, game_over);
    }

    #[test]
    fn test_payload_rejects_missing_required_field() {
        // JoinPayload without playerId.
        assert!(decode::<JoinPayload>(r#"{"matchId":900}"#).is_err());
        // CommandPayload without the has flags.
        assert!(decode::<CommandPayload>(r#"{"playerId":1,"commandType":3,"side":0}"#).is_err());
        // Snapshot piece with a boolean where an integer belongs.
        assert!(decode::<PieceSnapshotPayload>(
            r#"{"pieceId":1,"side":0,"visibleRole":true,"x":0,"y":0,"alive":true,"frozen":false,"revealed":false}"#
        )
        .is_err());
    }

    #[test]
    fn test_large_sequence_values() {
        let ack = AckPayload { player_id: 1, sequence: u64::MAX / 2 };
        let decoded: AckPayload = decode(&encode(&ack).expect("encode")).expect("decode");
        assert_eq!(decoded, ack);
    }
}
