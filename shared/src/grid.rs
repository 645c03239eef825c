//! Score grid model: the lake × player matrix of scores for one competition.
//!
//! On the wire every score is decimal text (`^\d+$`). The text is validated
//! and parsed into a [`Score`] as soon as it crosses the boundary, so the rest
//! of the system only ever sees bounded integers.

use crate::ProtocolError;
use std::collections::BTreeMap;
use std::fmt;

/// Textual grid as it travels inside an envelope: lake → player → score text.
pub type WireGrid = BTreeMap<String, BTreeMap<String, String>>;

/// A single non-negative score value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Score(u32);

impl Score {
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    pub const fn value(self) -> u32 {
        self.0
    }

    /// Parses wire text into a score.
    ///
    /// Only non-empty, ASCII-digit-only text that fits in a `u32` is accepted.
    /// Signs, whitespace and decimal points are all rejected.
    pub fn parse(text: &str) -> Option<Self> {
        if text.is_empty() || !text.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        text.parse::<u32>().ok().map(Self)
    }
}

impl fmt::Display for Score {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Validated lake × player score matrix.
///
/// Keys are lake and player names exactly as they appear in the owning
/// competition. The grid does not check them against any competition; that
/// is the job of whoever builds the grid.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScoreGrid {
    lakes: BTreeMap<String, BTreeMap<String, Score>>,
}

impl ScoreGrid {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, lake: impl Into<String>, player: impl Into<String>, score: Score) {
        self.lakes
            .entry(lake.into())
            .or_default()
            .insert(player.into(), score);
    }

    pub fn get(&self, lake: &str, player: &str) -> Option<Score> {
        self.lakes.get(lake)?.get(player).copied()
    }

    /// Iterates every `(lake, player, score)` cell.
    pub fn cells(&self) -> impl Iterator<Item = (&str, &str, Score)> + '_ {
        self.lakes.iter().flat_map(|(lake, players)| {
            players
                .iter()
                .map(move |(player, score)| (lake.as_str(), player.as_str(), *score))
        })
    }

    pub fn cell_count(&self) -> usize {
        self.lakes.values().map(BTreeMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.cell_count() == 0
    }

    /// Validates a wire grid as a whole.
    ///
    /// A single invalid leaf rejects the entire grid; the error names the
    /// first offending cell in key order.
    pub fn from_wire(wire: WireGrid) -> Result<Self, ProtocolError> {
        let mut lakes = BTreeMap::new();

        for (lake, players) in wire {
            let mut row = BTreeMap::new();
            for (player, value) in players {
                match Score::parse(&value) {
                    Some(score) => {
                        row.insert(player, score);
                    }
                    None => {
                        return Err(ProtocolError::InvalidScore {
                            lake,
                            player,
                            value,
                        })
                    }
                }
            }
            lakes.insert(lake, row);
        }

        Ok(Self { lakes })
    }

    pub fn to_wire(&self) -> WireGrid {
        self.lakes
            .iter()
            .map(|(lake, players)| {
                let row = players
                    .iter()
                    .map(|(player, score)| (player.clone(), score.to_string()))
                    .collect();
                (lake.clone(), row)
            })
            .collect()
    }
}
