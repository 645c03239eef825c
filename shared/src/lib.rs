//! Types shared between the scoreboard hub and its clients: the score grid,
//! the envelope wire protocol and the read-only competition snapshot.

pub mod competition;
pub mod envelope;
pub mod grid;

use thiserror::Error;

pub use competition::{Competition, CompetitionStatus, Lake, LakeDuration, Player};
pub use envelope::{CompetitionId, Envelope, EnvelopeKind};
pub use grid::{Score, ScoreGrid, WireGrid};

pub const DEFAULT_PORT: u16 = 3000;
pub const DEFAULT_HOST: &str = "127.0.0.1";

/// Every way an envelope can fail to decode or validate.
///
/// A protocol error always rejects the whole envelope; nothing from a
/// rejected envelope is ever relayed or merged.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    #[error("malformed envelope: {0}")]
    Malformed(String),

    #[error("competition id must not be empty")]
    EmptyCompetitionId,

    #[error("score for lake '{lake}', player '{player}' is not a non-negative integer: '{value}'")]
    InvalidScore {
        lake: String,
        player: String,
        value: String,
    },

    #[error("{0} envelopes are not accepted from this peer")]
    UnexpectedKind(EnvelopeKind),
}
