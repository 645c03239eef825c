//! Merges score updates from other sessions into the local sheet.
//!
//! Updates carry no causality metadata, so the default policy is
//! last-write-wins: every cell in an incoming grid replaces the local text,
//! even one the user is typing into. A clobbered cell is noticed and retyped.
//! The policy lives behind [`MergeStrategy`] so it can be swapped without
//! touching the hub or the protocol.

use crate::sheet::{Cell, ScoreSheet};
use log::debug;
use shared::{Envelope, ProtocolError};
use std::time::{Duration, Instant};

/// Decides, per cell, whether an incoming value may replace the local one.
pub trait MergeStrategy {
    fn name(&self) -> &'static str;

    /// `local` is None when the sheet has no such cell yet.
    fn should_overwrite(&self, local: Option<&Cell>, now: Instant) -> bool;
}

impl<S: MergeStrategy + ?Sized> MergeStrategy for Box<S> {
    fn name(&self) -> &'static str {
        (**self).name()
    }

    fn should_overwrite(&self, local: Option<&Cell>, now: Instant) -> bool {
        (**self).should_overwrite(local, now)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct LastWriteWins;

impl MergeStrategy for LastWriteWins {
    fn name(&self) -> &'static str {
        "last-write-wins"
    }

    fn should_overwrite(&self, _local: Option<&Cell>, _now: Instant) -> bool {
        true
    }
}

/// Leaves a cell alone if the local user typed into it within `window`.
#[derive(Debug, Clone, Copy)]
pub struct PreserveRecentEdits {
    pub window: Duration,
}

impl MergeStrategy for PreserveRecentEdits {
    fn name(&self) -> &'static str {
        "preserve-recent-edits"
    }

    fn should_overwrite(&self, local: Option<&Cell>, now: Instant) -> bool {
        match local.and_then(|cell| cell.edited_at) {
            Some(edited_at) => now.saturating_duration_since(edited_at) >= self.window,
            None => true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReconcileOutcome {
    Merged { written: usize, kept_local: usize },
    /// Update for a competition this sheet does not show
    ForeignCompetition,
    /// The hub refused something this client sent
    Rejected { reason: String },
    /// Not a hub → client update
    Ignored,
}

#[derive(Debug, Clone, Default)]
pub struct Reconciler<S = LastWriteWins> {
    strategy: S,
}

impl<S: MergeStrategy> Reconciler<S> {
    pub fn new(strategy: S) -> Self {
        Self { strategy }
    }

    pub fn strategy(&self) -> &S {
        &self.strategy
    }

    /// Applies one decoded envelope to `sheet`.
    ///
    /// Updates for another competition leave the sheet untouched. Cells the
    /// sheet has never seen are created.
    pub fn apply(&self, sheet: &mut ScoreSheet, envelope: &Envelope, now: Instant) -> ReconcileOutcome {
        let (competition_id, scores) = match envelope {
            Envelope::ScoresUpdated {
                competition_id,
                scores,
            } => (competition_id, scores),
            Envelope::ProtocolError { reason } => {
                return ReconcileOutcome::Rejected {
                    reason: reason.clone(),
                }
            }
            Envelope::UpdateScores { .. } => return ReconcileOutcome::Ignored,
        };

        if competition_id != sheet.competition_id() {
            debug!(
                "Ignoring update for competition {} (showing {})",
                competition_id,
                sheet.competition_id()
            );
            return ReconcileOutcome::ForeignCompetition;
        }

        let mut written = 0;
        let mut kept_local = 0;
        for (lake, player, score) in scores.cells() {
            if self
                .strategy
                .should_overwrite(sheet.cell(lake, player), now)
            {
                sheet.write_remote(lake, player, score);
                written += 1;
            } else {
                kept_local += 1;
            }
        }

        debug!(
            "Merged {} cells ({} kept local, {})",
            written,
            kept_local,
            self.strategy.name()
        );
        ReconcileOutcome::Merged {
            written,
            kept_local,
        }
    }

    /// Decodes a text frame and applies it.
    ///
    /// A frame that fails validation changes nothing.
    pub fn apply_frame(
        &self,
        sheet: &mut ScoreSheet,
        text: &str,
        now: Instant,
    ) -> Result<ReconcileOutcome, ProtocolError> {
        let envelope = Envelope::decode(text)?;
        Ok(self.apply(sheet, &envelope, now))
    }
}
