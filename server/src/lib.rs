//! jieqi match server core.
//!
//! This crate binds players to referees and speaks the wire protocol:
//! [`session`] owns one referee plus the match event journal, [`service`]
//! routes players across sessions and tracks acknowledgement cursors,
//! [`mapper`] translates session views into wire payloads, [`adapter`] emits
//! ordered outbound messages into a [`adapter::MessageSink`], and [`gateway`]
//! dispatches decoded inbound envelopes.
//!
//! The whole stack is synchronous and single-threaded: one inbound envelope
//! produces all of its outbound messages before the next envelope is
//! processed. Parallel deployments shard whole services by match id.

pub mod adapter;
pub mod gateway;
pub mod mapper;
pub mod service;
pub mod session;


pub use adapter::{MemorySink, MessageSink, OutboundMessage, OutboundPayload, TransportAdapter};
pub use gateway::ServerGateway;
pub use service::{MatchService, MatchSyncBundle};
pub use session::{JoinError, MatchSession};
