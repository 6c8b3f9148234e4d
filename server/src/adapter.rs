//! Transport adapter: turns service results into ordered outbound messages.
//!
//! The adapter owns the service and a [`MessageSink`] and stamps every
//! outbound message with a globally monotonic `server_sequence` (starting at
//! 1). For one accepted command the actor sees CommandAck, then Snapshot,
//! then EventDelta, then an optional GameOver; other players in the match see
//! Snapshot, EventDelta, optional GameOver, in ascending player-id order.

use crate::mapper;
use crate::service::{MatchJoinRequest, MatchService, MatchSyncBundle};
use jieqi_types::codec;
use jieqi_types::protocol::{
    CommandAckPayload, Envelope, ErrorPayload, EventDeltaPayload, GameOverPayload, JoinAckPayload,
    JoinPayload, MessageType, SnapshotPayload,
};
use jieqi_types::{GamePhase, MatchId, PlayerCommand, PlayerId};
use tracing::{debug, error};

/// Typed body of an outbound message, alongside its encoded envelope form.
#[derive(Clone, Debug, PartialEq)]
pub enum OutboundPayload {
    JoinAck(JoinAckPayload),
    CommandAck(CommandAckPayload),
    Snapshot(SnapshotPayload),
    EventDelta(EventDeltaPayload),
    GameOver(GameOverPayload),
    Error(ErrorPayload),
}

impl OutboundPayload {
    fn message_type(&self) -> MessageType {
        match self {
            OutboundPayload::JoinAck(_) => MessageType::JoinAck,
            OutboundPayload::CommandAck(_) => MessageType::CommandAck,
            OutboundPayload::Snapshot(_) => MessageType::Snapshot,
            OutboundPayload::EventDelta(_) => MessageType::EventDelta,
            OutboundPayload::GameOver(_) => MessageType::GameOver,
            OutboundPayload::Error(_) => MessageType::Error,
        }
    }

    fn encode(&self) -> codec::CodecResult<String> {
        match self {
            OutboundPayload::JoinAck(payload) => codec::encode(payload),
            OutboundPayload::CommandAck(payload) => codec::encode(payload),
            OutboundPayload::Snapshot(payload) => codec::encode(payload),
            OutboundPayload::EventDelta(payload) => codec::encode(payload),
            OutboundPayload::GameOver(payload) => codec::encode(payload),
            OutboundPayload::Error(payload) => codec::encode(payload),
        }
    }
}

/// One server-to-client message: addressee, global ordering stamp, the
/// encoded envelope, and the typed payload.
#[derive(Clone, Debug, PartialEq)]
pub struct OutboundMessage {
    pub player_id: PlayerId,
    pub server_sequence: u64,
    pub envelope: Envelope,
    pub payload: OutboundPayload,
}

/// Destination for outbound messages. Implementations must preserve emission
/// order per player.
pub trait MessageSink {
    fn send(&mut self, message: OutboundMessage);
}

/// Sink that records every message, for local drivers and tests.
#[derive(Default)]
pub struct MemorySink {
    messages: Vec<OutboundMessage>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn all_messages(&self) -> &[OutboundMessage] {
        &self.messages
    }

    /// Messages addressed to a player with `server_sequence > after`.
    pub fn pull_messages(&self, player_id: PlayerId, after: u64) -> Vec<OutboundMessage> {
        self.messages
            .iter()
            .filter(|message| message.player_id == player_id && message.server_sequence > after)
            .cloned()
            .collect()
    }

    pub fn clear(&mut self) {
        self.messages.clear();
    }
}

impl MessageSink for MemorySink {
    fn send(&mut self, message: OutboundMessage) {
        self.messages.push(message);
    }
}

/// Synchronous bridge between the service and a message sink.
pub struct TransportAdapter<S: MessageSink> {
    service: MatchService,
    sink: S,
    next_server_sequence: u64,
}

impl<S: MessageSink> TransportAdapter<S> {
    pub fn new(service: MatchService, sink: S) -> Self {
        Self {
            service,
            sink,
            next_server_sequence: 1,
        }
    }

    pub fn service(&self) -> &MatchService {
        &self.service
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }

    /// The sequence the next outbound message will carry.
    pub fn next_server_sequence(&self) -> u64 {
        self.next_server_sequence
    }

    /// Join a match. The joiner always receives a JoinAck; an accepted join
    /// is followed by the initial sync.
    pub fn handle_join(&mut self, payload: &JoinPayload) -> bool {
        let result = self.service.join_match(MatchJoinRequest {
            match_id: payload.match_id,
            player_id: payload.player_id,
        });
        self.emit(
            payload.player_id,
            payload.match_id,
            OutboundPayload::JoinAck(mapper::join_ack(&result)),
        );
        if result.is_err() {
            return false;
        }
        self.handle_pull_sync(payload.player_id, None)
    }

    /// Submit a player command and broadcast the new state to every player in
    /// the match.
    pub fn handle_player_command(&mut self, player_id: PlayerId, command: &PlayerCommand) -> bool {
        let Some(match_id) = self.service.find_player_match(player_id) else {
            self.emit_error(player_id, 0, "Player is not bound to any match.");
            return false;
        };

        let result = self.service.submit_player_command(player_id, command);
        self.emit(
            player_id,
            match_id,
            OutboundPayload::CommandAck(mapper::command_ack(&result)),
        );
        if result.is_err() {
            return false;
        }

        for match_player in self.service.players_in_match(match_id) {
            match self.service.pull_player_sync(match_player, None) {
                Ok(bundle) => self.emit_sync(match_player, &bundle),
                Err(error) => {
                    self.emit_error(match_player, match_id, &error.to_string());
                }
            }
        }
        true
    }

    /// Resynchronize one player on demand.
    pub fn handle_pull_sync(
        &mut self,
        player_id: PlayerId,
        after_sequence_override: Option<u64>,
    ) -> bool {
        match self.service.pull_player_sync(player_id, after_sequence_override) {
            Ok(bundle) => {
                self.emit_sync(player_id, &bundle);
                true
            }
            Err(error) => {
                self.emit_error(player_id, 0, &error.to_string());
                false
            }
        }
    }

    /// Advance a player's ack cursor. Accepted acks are silent; rejected
    /// acks emit an error message.
    pub fn handle_ack(&mut self, player_id: PlayerId, sequence: u64) -> bool {
        let Some(match_id) = self.service.find_player_match(player_id) else {
            self.emit_error(player_id, 0, "Player is not bound to any match.");
            return false;
        };
        if self.service.ack_player_events(player_id, sequence) {
            return true;
        }
        self.emit_error(player_id, match_id, "Ack sequence is invalid.");
        false
    }

    fn emit_sync(&mut self, player_id: PlayerId, bundle: &MatchSyncBundle) {
        self.emit(
            player_id,
            bundle.match_id,
            OutboundPayload::Snapshot(mapper::snapshot(&bundle.view, bundle.latest_sequence)),
        );
        self.emit(
            player_id,
            bundle.match_id,
            OutboundPayload::EventDelta(mapper::event_delta(bundle)),
        );
        if bundle.view.phase == GamePhase::GameOver {
            self.emit(
                player_id,
                bundle.match_id,
                OutboundPayload::GameOver(mapper::game_over(&bundle.view)),
            );
        }
    }

    fn emit_error(&mut self, player_id: PlayerId, match_id: MatchId, message: &str) {
        self.emit(
            player_id,
            match_id,
            OutboundPayload::Error(ErrorPayload {
                error_message: message.to_string(),
            }),
        );
    }

    fn emit(&mut self, player_id: PlayerId, match_id: MatchId, payload: OutboundPayload) {
        let payload_json = match payload.encode() {
            Ok(json) => json,
            Err(err) => {
                // Outbound payloads are plain data; an encode failure is a bug.
                error!(player_id, match_id, %err, "failed to encode outbound payload");
                return;
            }
        };

        let server_sequence = self.next_server_sequence;
        self.next_server_sequence += 1;

        let message = OutboundMessage {
            player_id,
            server_sequence,
            envelope: Envelope {
                message_type: payload.message_type(),
                sequence: server_sequence,
                match_id: match_id.to_string(),
                payload_json,
            },
            payload,
        };
        debug!(
            player_id,
            server_sequence,
            message_type = ?message.envelope.message_type,
            "outbound message"
        );
        self.sink.send(message);
    }
}
