//! # Scoreboard Client Library
//!
//! This library provides the client side of live score entry: a local,
//! editable copy of one competition's score sheet that stays in step with
//! every other open copy through the broadcast hub.
//!
//! ## Architecture Overview
//!
//! ### Local Editing
//! Keystrokes land in the local sheet immediately. Nothing waits on the
//! network, and a cell may hold half-typed or invalid text until the user
//! fixes it.
//!
//! ### Debounced Submission
//! Once the user has stopped typing for a short quiet period the whole sheet
//! is validated and sent as one `UPDATE_SCORES` envelope. A single invalid
//! cell holds back the submission; blank cells are simply left out.
//!
//! ### Reconciliation
//! Every `SCORES_UPDATED` envelope from the hub is checked against the
//! competition this client has open. Updates for other competitions are
//! dropped, the rest are merged cell by cell. The default merge policy is
//! last-write-wins. `PreserveRecentEdits` keeps cells the user touched
//! within a short window instead.
//!
//! ## Module Organization
//!
//! - `sheet`: the cell-granular form model
//! - `reconciler`: competition filtering and merge strategies
//! - `debounce`: quiet-period timer for submission
//! - `input`: line-based command parsing
//! - `rendering`: plain-text score table
//! - `snapshot`: loading the competition the sheet is seeded from
//! - `network`: hub connection and the interactive client loop
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use client::network::{Client, ScoreConnection};
//! use client::reconciler::{LastWriteWins, Reconciler};
//! use client::snapshot::load_competition;
//! use std::path::Path;
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
//!     let competition = load_competition(Path::new("competition.json")).await?;
//!     let connection = ScoreConnection::connect("ws://127.0.0.1:3000").await?;
//!
//!     let mut client = Client::new(
//!         connection,
//!         competition,
//!         Reconciler::new(LastWriteWins),
//!         Duration::from_millis(300),
//!     )?;
//!     client.run().await
//! }
//! ```

pub mod debounce;
pub mod input;
pub mod network;
pub mod reconciler;
pub mod rendering;
pub mod sheet;
pub mod snapshot;
