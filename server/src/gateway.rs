//! Inbound envelope dispatch.
//!
//! The gateway decodes payloads, validates that command envelopes carry the
//! sub-payload their command type requires, and forwards to the transport
//! adapter. Undecodable or unknown input yields `false` with no outbound
//! traffic.

use crate::adapter::{MessageSink, TransportAdapter};
use jieqi_types::codec;
use jieqi_types::protocol::{
    AckPayload, CommandPayload, Envelope, JoinPayload, MessageType, PullSyncPayload,
};
use jieqi_types::{
    BoardPos, CommandType, MoveAction, PlayerCommand, SetupCommit, SetupPlacement, SetupPlain,
    Side,
};
use tracing::debug;

/// Front door of the server: envelopes in, adapter calls out.
pub struct ServerGateway<S: MessageSink> {
    adapter: TransportAdapter<S>,
}

impl<S: MessageSink> ServerGateway<S> {
    pub fn new(adapter: TransportAdapter<S>) -> Self {
        Self { adapter }
    }

    pub fn adapter(&self) -> &TransportAdapter<S> {
        &self.adapter
    }

    pub fn adapter_mut(&mut self) -> &mut TransportAdapter<S> {
        &mut self.adapter
    }

    /// Dispatch one decoded envelope.
    pub fn process_envelope(&mut self, envelope: &Envelope) -> bool {
        match envelope.message_type {
            MessageType::Join => {
                let Ok(payload) = codec::decode::<JoinPayload>(&envelope.payload_json) else {
                    return false;
                };
                self.adapter.handle_join(&payload)
            }
            MessageType::Command => {
                let Ok(payload) = codec::decode::<CommandPayload>(&envelope.payload_json) else {
                    return false;
                };
                let Some(command) = build_player_command(&payload) else {
                    return false;
                };
                self.adapter.handle_player_command(payload.player_id, &command)
            }
            MessageType::PullSync => {
                let Ok(payload) = codec::decode::<PullSyncPayload>(&envelope.payload_json) else {
                    return false;
                };
                let override_sequence = payload
                    .has_after_sequence_override
                    .then_some(payload.after_sequence_override);
                self.adapter.handle_pull_sync(payload.player_id, override_sequence)
            }
            MessageType::Ack => {
                let Ok(payload) = codec::decode::<AckPayload>(&envelope.payload_json) else {
                    return false;
                };
                self.adapter.handle_ack(payload.player_id, payload.sequence)
            }
            MessageType::Ping => true,
            // Server-to-client types are not valid inbound.
            _ => {
                debug!(message_type = ?envelope.message_type, "dropping non-inbound envelope");
                false
            }
        }
    }

    /// Decode and dispatch an envelope from its wire text.
    pub fn process_envelope_json(&mut self, envelope_json: &str) -> bool {
        let Ok(envelope) = codec::decode_envelope(envelope_json) else {
            return false;
        };
        self.process_envelope(&envelope)
    }
}

/// Lift a command payload into a referee-level command, checking that the
/// sub-payload required by the command type is present and well-formed.
fn build_player_command(payload: &CommandPayload) -> Option<PlayerCommand> {
    let command_type = CommandType::from_index(payload.command_type as i64)?;
    let side = Side::from_index(payload.side as i64)?;

    match command_type {
        CommandType::CommitSetup if !payload.has_setup_commit => return None,
        CommandType::RevealSetup if !payload.has_setup_plain => return None,
        CommandType::Move if !payload.has_move => return None,
        _ => {}
    }

    let move_action = if payload.has_move {
        let move_payload = payload.move_action.as_ref()?;
        Some(MoveAction {
            piece_id: move_payload.piece_id,
            from: BoardPos::new(move_payload.from_x as i8, move_payload.from_y as i8),
            to: BoardPos::new(move_payload.to_x as i8, move_payload.to_y as i8),
            captured_piece_id: move_payload
                .has_captured_piece_id
                .then_some(move_payload.captured_piece_id),
        })
    } else {
        None
    };

    let setup_commit = if payload.has_setup_commit {
        let commit_payload = payload.setup_commit.as_ref()?;
        Some(SetupCommit {
            side: Side::from_index(commit_payload.side as i64)?,
            hash_hex: commit_payload.hash_hex.clone(),
        })
    } else {
        None
    };

    let setup_plain = if payload.has_setup_plain {
        let plain_payload = payload.setup_plain.as_ref()?;
        Some(SetupPlain {
            side: Side::from_index(plain_payload.side as i64)?,
            nonce: plain_payload.nonce.clone(),
            placements: plain_payload
                .placements
                .iter()
                .map(|placement| SetupPlacement {
                    piece_id: placement.piece_id,
                    target_pos: BoardPos::new(placement.x as i8, placement.y as i8),
                })
                .collect(),
        })
    } else {
        None
    };

    Some(PlayerCommand {
        command_type,
        side,
        move_action,
        setup_commit,
        setup_plain,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapter::MemorySink;
    use crate::service::MatchService;
    use jieqi_types::protocol::{MovePayload, SetupCommitPayload};

    fn gateway() -> ServerGateway<MemorySink> {
        ServerGateway::new(TransportAdapter::new(MatchService::new(), MemorySink::new()))
    }

    fn envelope(message_type: MessageType, sequence: u64, match_id: u64, payload: &str) -> Envelope {
        Envelope {
            message_type,
            sequence,
            match_id: match_id.to_string(),
            payload_json: payload.to_string(),
        }
    }

    fn join_json(match_id: u64, player_id: u64) -> String {
        codec::encode(&JoinPayload { match_id, player_id }).expect("encode join")
    }

    #[test]
    fn test_join_envelope_emits_initial_sync() {
        let mut gateway = gateway();
        let envelope = envelope(MessageType::Join, 1, 600, &join_json(600, 8201));
        assert!(gateway.process_envelope(&envelope));

        let messages = gateway.adapter().sink().pull_messages(8201, 0);
        assert_eq!(messages.len(), 3);
        assert_eq!(messages[0].envelope.message_type, MessageType::JoinAck);
        assert_eq!(messages[1].envelope.message_type, MessageType::Snapshot);
        assert_eq!(messages[2].envelope.message_type, MessageType::EventDelta);
    }

    #[test]
    fn test_command_envelope_requires_sub_payload() {
        let mut gateway = gateway();
        assert!(gateway.process_envelope(&envelope(
            MessageType::Join,
            1,
            603,
            &join_json(603, 8501)
        )));
        gateway.adapter_mut().sink_mut().clear();

        // Commit command without its sub-payload: dropped before dispatch.
        let missing_commit = CommandPayload {
            player_id: 8501,
            command_type: CommandType::CommitSetup as i32,
            side: Side::Red as i32,
            ..CommandPayload::default()
        };
        let command_json = codec::encode(&missing_commit).expect("encode command");
        assert!(!gateway.process_envelope(&envelope(MessageType::Command, 2, 603, &command_json)));
        assert!(gateway.adapter().sink().all_messages().is_empty());

        // Move command without the move record: also dropped.
        let missing_move = CommandPayload {
            player_id: 8501,
            command_type: CommandType::Move as i32,
            side: Side::Red as i32,
            has_move: true,
            ..CommandPayload::default()
        };
        let command_json = codec::encode(&missing_move).expect("encode command");
        assert!(!gateway.process_envelope(&envelope(MessageType::Command, 3, 603, &command_json)));
        assert!(gateway.adapter().sink().all_messages().is_empty());
    }

    #[test]
    fn test_unknown_command_type_is_dropped() {
        let mut gateway = gateway();
        assert!(gateway.process_envelope(&envelope(
            MessageType::Join,
            1,
            603,
            &join_json(603, 8501)
        )));
        gateway.adapter_mut().sink_mut().clear();

        let bogus = CommandPayload {
            player_id: 8501,
            command_type: 777,
            side: Side::Red as i32,
            ..CommandPayload::default()
        };
        let command_json = codec::encode(&bogus).expect("encode command");
        assert!(!gateway.process_envelope(&envelope(MessageType::Command, 2, 603, &command_json)));
        assert!(gateway.adapter().sink().all_messages().is_empty());
    }

    #[test]
    fn test_commit_command_round_trip() {
        let mut gateway = gateway();
        assert!(gateway.process_envelope(&envelope(
            MessageType::Join,
            1,
            601,
            &join_json(601, 8301)
        )));
        assert!(gateway.process_envelope(&envelope(
            MessageType::Join,
            2,
            601,
            &join_json(601, 8302)
        )));
        gateway.adapter_mut().sink_mut().clear();

        let commit = CommandPayload {
            player_id: 8301,
            command_type: CommandType::CommitSetup as i32,
            side: Side::Red as i32,
            has_setup_commit: true,
            setup_commit: Some(SetupCommitPayload {
                side: Side::Red as i32,
                hash_hex: String::new(),
            }),
            ..CommandPayload::default()
        };
        let command_json = codec::encode(&commit).expect("encode command");
        assert!(gateway.process_envelope(&envelope(MessageType::Command, 3, 601, &command_json)));

        let actor = gateway.adapter().sink().pull_messages(8301, 0);
        assert_eq!(actor.len(), 3);
        assert_eq!(actor[0].envelope.message_type, MessageType::CommandAck);
        let other = gateway.adapter().sink().pull_messages(8302, 0);
        assert_eq!(other.len(), 2);
        assert_eq!(other[0].envelope.message_type, MessageType::Snapshot);
        assert_eq!(other[1].envelope.message_type, MessageType::EventDelta);
    }

    #[test]
    fn test_ping_and_malformed_envelopes() {
        let mut gateway = gateway();
        assert!(gateway.process_envelope(&envelope(MessageType::Ping, 1, 1, "{}")));
        assert!(!gateway.process_envelope_json("{invalid json"));
        // A server-to-client type is not valid inbound.
        assert!(!gateway.process_envelope(&envelope(MessageType::Snapshot, 2, 1, "{}")));
        assert!(gateway.adapter().sink().all_messages().is_empty());
    }

    #[test]
    fn test_process_envelope_json_end_to_end() {
        let mut gateway = gateway();
        let text = codec::encode_envelope(&envelope(
            MessageType::Join,
            1,
            604,
            &join_json(604, 8601),
        ))
        .expect("encode envelope");
        assert!(gateway.process_envelope_json(&text));
        assert_eq!(gateway.adapter().sink().pull_messages(8601, 0).len(), 3);
    }

    #[test]
    fn test_build_player_command_maps_move_fields() {
        let payload = CommandPayload {
            player_id: 1,
            command_type: CommandType::Move as i32,
            side: Side::Black as i32,
            has_move: true,
            move_action: Some(MovePayload {
                piece_id: 27,
                from_x: 0,
                from_y: 6,
                to_x: 0,
                to_y: 5,
                has_captured_piece_id: true,
                captured_piece_id: 11,
            }),
            ..CommandPayload::default()
        };
        let command = build_player_command(&payload).expect("command");
        assert_eq!(command.command_type, CommandType::Move);
        assert_eq!(command.side, Side::Black);
        let action = command.move_action.expect("move action");
        assert_eq!(action.piece_id, 27);
        assert_eq!(action.from, BoardPos::new(0, 6));
        assert_eq!(action.to, BoardPos::new(0, 5));
        assert_eq!(action.captured_piece_id, Some(11));

        // Bad side code.
        let mut bad_side = payload;
        bad_side.side = 9;
        assert!(build_player_command(&bad_side).is_none());
    }
}
