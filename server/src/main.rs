//! Local demo driver: runs a full concealed-setup match through the gateway
//! stack and logs the outbound traffic.
//!
//! Both players join, commit digests of seeded random setups, reveal them,
//! and then play randomly chosen legal moves until the match ends or the turn
//! cap is reached.

use anyhow::{bail, Context};
use clap::Parser;
use jieqi_referee::board::{base_piece_id, setup_slots};
use jieqi_referee::digest::reveal_digest;
use jieqi_server::{MatchService, MemorySink, ServerGateway, TransportAdapter};
use jieqi_types::codec;
use jieqi_types::protocol::{
    CommandPayload, Envelope, JoinPayload, MessageType, MovePayload, SetupCommitPayload,
    SetupPlacementPayload, SetupPlainPayload,
};
use jieqi_types::{
    CommandType, GamePhase, MatchId, MoveAction, PlayerId, SetupPlacement, SetupPlain, Side,
};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use serde::Serialize;
use tracing::{info, warn};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Match id to play on.
    #[arg(long, default_value_t = 900)]
    match_id: MatchId,

    /// Player id assigned Red (joins first).
    #[arg(long, default_value_t = 10001)]
    red_player: PlayerId,

    /// Player id assigned Black (joins second).
    #[arg(long, default_value_t = 10002)]
    black_player: PlayerId,

    /// RNG seed for the concealed setups and move choices.
    #[arg(long, default_value_t = 42)]
    seed: u64,

    /// Stop after this many accepted battle commands.
    #[arg(long, default_value_t = 400)]
    max_turns: u64,

    /// Enable debug logging.
    #[arg(short, long)]
    verbose: bool,
}

/// Drives one client's traffic through the gateway.
struct LocalClient {
    gateway: ServerGateway<MemorySink>,
    next_client_sequence: u64,
}

impl LocalClient {
    fn new() -> Self {
        Self {
            gateway: ServerGateway::new(TransportAdapter::new(
                MatchService::new(),
                MemorySink::new(),
            )),
            next_client_sequence: 1,
        }
    }

    fn send<T: Serialize>(
        &mut self,
        message_type: MessageType,
        match_id: MatchId,
        payload: &T,
    ) -> anyhow::Result<bool> {
        let sequence = self.next_client_sequence;
        self.next_client_sequence += 1;
        let envelope = Envelope {
            message_type,
            sequence,
            match_id: match_id.to_string(),
            payload_json: codec::encode(payload).context("encode payload")?,
        };
        let text = codec::encode_envelope(&envelope).context("encode envelope")?;
        Ok(self.gateway.process_envelope_json(&text))
    }
}

/// Seeded random concealed setup: the side's sixteen pieces shuffled over the
/// sixteen canonical slots.
fn random_setup(side: Side, rng: &mut StdRng) -> SetupPlain {
    let base = base_piece_id(side);
    let mut piece_ids: Vec<u16> = (base..base + 16).collect();
    piece_ids.shuffle(rng);

    SetupPlain {
        side,
        nonce: format!("nonce-{:016x}", rng.gen::<u64>()),
        placements: setup_slots(side)
            .iter()
            .zip(piece_ids)
            .map(|(slot, piece_id)| SetupPlacement {
                piece_id,
                target_pos: *slot,
            })
            .collect(),
    }
}

fn setup_plain_payload(setup: &SetupPlain) -> SetupPlainPayload {
    SetupPlainPayload {
        side: setup.side as i32,
        nonce: setup.nonce.clone(),
        placements: setup
            .placements
            .iter()
            .map(|placement| SetupPlacementPayload {
                piece_id: placement.piece_id,
                x: placement.target_pos.x as i32,
                y: placement.target_pos.y as i32,
            })
            .collect(),
    }
}

fn move_payload(action: &MoveAction) -> MovePayload {
    MovePayload {
        piece_id: action.piece_id,
        from_x: action.from.x as i32,
        from_y: action.from.y as i32,
        to_x: action.to.x as i32,
        to_y: action.to.y as i32,
        has_captured_piece_id: action.captured_piece_id.is_some(),
        captured_piece_id: action.captured_piece_id.unwrap_or(0),
    }
}

fn command_base(player_id: PlayerId, command_type: CommandType, side: Side) -> CommandPayload {
    CommandPayload {
        player_id,
        command_type: command_type as i32,
        side: side as i32,
        ..CommandPayload::default()
    }
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    tracing_subscriber::fmt()
        .with_max_level(if args.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        })
        .init();

    let mut rng = StdRng::seed_from_u64(args.seed);
    let mut client = LocalClient::new();
    let player_for = |side: Side| match side {
        Side::Red => args.red_player,
        Side::Black => args.black_player,
    };

    // Join both players.
    for player_id in [args.red_player, args.black_player] {
        if !client.send(
            MessageType::Join,
            args.match_id,
            &JoinPayload {
                match_id: args.match_id,
                player_id,
            },
        )? {
            bail!("join failed for player {player_id}");
        }
    }
    info!(match_id = args.match_id, "both players joined");

    // Commit and reveal seeded random setups, digests computed up front.
    let setups = [
        random_setup(Side::Red, &mut rng),
        random_setup(Side::Black, &mut rng),
    ];
    for setup in &setups {
        let mut commit = command_base(player_for(setup.side), CommandType::CommitSetup, setup.side);
        commit.has_setup_commit = true;
        commit.setup_commit = Some(SetupCommitPayload {
            side: setup.side as i32,
            hash_hex: reveal_digest(setup),
        });
        if !client.send(MessageType::Command, args.match_id, &commit)? {
            bail!("commit failed for {:?}", setup.side);
        }
    }
    for setup in &setups {
        let mut reveal = command_base(player_for(setup.side), CommandType::RevealSetup, setup.side);
        reveal.has_setup_plain = true;
        reveal.setup_plain = Some(setup_plain_payload(setup));
        if !client.send(MessageType::Command, args.match_id, &reveal)? {
            bail!("reveal failed for {:?}", setup.side);
        }
    }
    info!("setup committed and revealed, battle begins");

    // Play random legal moves until the match ends or the cap is hit.
    let mut turns = 0;
    while turns < args.max_turns {
        let (side, choice) = {
            let session = client
                .gateway
                .adapter()
                .service()
                .session(args.match_id)
                .context("session must exist")?;
            if session.state().phase == GamePhase::GameOver {
                break;
            }
            let side = session.state().current_turn;
            (side, session.legal_moves(side).choose(&mut rng).copied())
        };

        let accepted = match choice {
            Some(action) => {
                let mut command = command_base(player_for(side), CommandType::Move, side);
                command.has_move = true;
                command.move_action = Some(move_payload(&action));
                client.send(MessageType::Command, args.match_id, &command)?
            }
            None => {
                let command = command_base(player_for(side), CommandType::Pass, side);
                client.send(MessageType::Command, args.match_id, &command)?
            }
        };
        if !accepted {
            warn!(side = ?side, "command rejected, stopping");
            break;
        }
        turns += 1;
    }

    let service = client.gateway.adapter().service();
    let session = service.session(args.match_id).context("session must exist")?;
    let state = session.state();
    info!(
        turns,
        phase = ?state.phase,
        result = ?state.result,
        end_reason = ?state.end_reason,
        "match finished"
    );

    let sink = client.gateway.adapter().sink();
    for player_id in [args.red_player, args.black_player] {
        let messages = sink.pull_messages(player_id, 0);
        info!(
            player_id,
            outbound = messages.len(),
            latest_event = session.latest_event_sequence(),
            "player traffic"
        );
    }
    Ok(())
}
