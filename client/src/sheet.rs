//! Local score sheet: the editable, cell-granular form behind the scoreboard.
//!
//! Cells hold whatever text the user typed, so a half-typed or invalid value
//! can sit in the sheet until it is fixed. Text only becomes a [`ScoreGrid`]
//! when the sheet is submitted.

use shared::{Competition, CompetitionId, ProtocolError, Score, ScoreGrid, WireGrid};
use std::collections::{BTreeMap, BTreeSet};
use std::time::Instant;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Cell {
    pub text: String,
    /// When the local user last typed into this cell, cleared when a remote
    /// value replaces the local text
    pub edited_at: Option<Instant>,
}

impl Cell {
    pub fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }
}

#[derive(Debug, Clone)]
pub struct ScoreSheet {
    competition_id: CompetitionId,
    cells: BTreeMap<String, BTreeMap<String, Cell>>,
}

impl ScoreSheet {
    pub fn new(competition_id: CompetitionId) -> Self {
        Self {
            competition_id,
            cells: BTreeMap::new(),
        }
    }

    /// Seeds a blank cell for every lake × player of the snapshot.
    pub fn from_competition(competition: &Competition) -> Result<Self, ProtocolError> {
        let mut sheet = Self::new(competition.competition_id()?);
        for lake in competition.lake_names() {
            let row = sheet.cells.entry(lake.to_string()).or_default();
            for player in competition.player_names() {
                row.entry(player.to_string()).or_default();
            }
        }
        Ok(sheet)
    }

    pub fn competition_id(&self) -> &CompetitionId {
        &self.competition_id
    }

    /// Records a local keystroke. Unknown lakes and players are created.
    pub fn edit(&mut self, lake: &str, player: &str, text: impl Into<String>, now: Instant) {
        let cell = self.cell_mut(lake, player);
        cell.text = text.into();
        cell.edited_at = Some(now);
    }

    /// Replaces a cell with a value received from another session.
    pub fn write_remote(&mut self, lake: &str, player: &str, score: Score) {
        let cell = self.cell_mut(lake, player);
        cell.text = score.to_string();
        cell.edited_at = None;
    }

    pub fn cell(&self, lake: &str, player: &str) -> Option<&Cell> {
        self.cells.get(lake)?.get(player)
    }

    pub fn text(&self, lake: &str, player: &str) -> Option<&str> {
        self.cell(lake, player).map(|cell| cell.text.as_str())
    }

    /// Builds the grid to submit.
    ///
    /// Blank cells are left out, as nothing has been scored there yet. Any
    /// other cell must be a valid score or nothing is submitted at all.
    pub fn to_grid(&self) -> Result<ScoreGrid, ProtocolError> {
        let mut grid = ScoreGrid::new();
        for (lake, players) in &self.cells {
            for (player, cell) in players {
                if cell.is_blank() {
                    continue;
                }
                let score = Score::parse(&cell.text).ok_or_else(|| ProtocolError::InvalidScore {
                    lake: lake.clone(),
                    player: player.clone(),
                    value: cell.text.clone(),
                })?;
                grid.set(lake.as_str(), player.as_str(), score);
            }
        }
        Ok(grid)
    }

    /// Current text of every cell, blanks included.
    pub fn texts(&self) -> WireGrid {
        self.cells
            .iter()
            .map(|(lake, players)| {
                let row = players
                    .iter()
                    .map(|(player, cell)| (player.clone(), cell.text.clone()))
                    .collect();
                (lake.clone(), row)
            })
            .collect()
    }

    pub fn lake_names(&self) -> impl Iterator<Item = &str> + '_ {
        self.cells.keys().map(String::as_str)
    }

    pub fn player_names(&self) -> BTreeSet<&str> {
        self.cells
            .values()
            .flat_map(|players| players.keys().map(String::as_str))
            .collect()
    }

    fn cell_mut(&mut self, lake: &str, player: &str) -> &mut Cell {
        self.cells
            .entry(lake.to_string())
            .or_default()
            .entry(player.to_string())
            .or_default()
    }
}
