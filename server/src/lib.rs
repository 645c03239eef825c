//! # Scoreboard Hub Library
//!
//! This library provides the broadcast hub that keeps every open scoreboard
//! in sync while a fishing competition is being scored. When one editor
//! submits their grid, every other connected viewer receives it within one
//! network round trip.
//!
//! ## Core Responsibilities
//!
//! ### Pure Relay
//! The hub never holds score data. It validates an inbound `UPDATE_SCORES`
//! envelope, re-labels it `SCORES_UPDATED` and fans it out. Restarting the
//! hub loses nothing, because the grid lives entirely on the clients.
//!
//! ### Session Management
//! Handles the lifecycle of every WebSocket session:
//! - Registration on connect, with a capacity limit
//! - A shared liveness flag checked during every fan-out
//! - Deregistration on close, read error or failed delivery
//!
//! ### Fault Isolation
//! A malformed envelope is rejected in full and reported to its sender only.
//! A dead or backlogged session is dropped without disturbing delivery to
//! the others. Nothing a client does can stop the hub.
//!
//! ## Architecture Design
//!
//! ### Task Per Direction
//! Each session gets a reader task that feeds inbound frames to the hub one
//! at a time, so updates from a single client keep their order, and a writer
//! task that drains a bounded outbound queue into the socket. Fan-out only
//! pushes onto queues and never waits on a socket, so a slow client slows
//! down nobody but itself.
//!
//! ### Shared Registry
//! The session registry is the only shared mutable state. It sits behind a
//! `tokio::sync::RwLock`: fan-out walks take the read guard, connect and
//! close take the write guard.
//!
//! ### Global Broadcast
//! Updates go to every session regardless of competition. Clients drop
//! updates for competitions they do not have open. Deployments that need
//! isolation on the server side run one hub per competition.
//!
//! ## Module Organization
//!
//! - `config`: listener address, capacity limits and echo policy
//! - `registry`: sessions, liveness and non-blocking delivery
//! - `hub`: validation, relay and fan-out
//! - `network`: WebSocket accept loop and per-session tasks
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use server::config::HubConfig;
//! use server::network::Server;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
//!     let server = Server::bind(&HubConfig::new("127.0.0.1", 3000)).await?;
//!     server.run().await?;
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod hub;
pub mod network;
pub mod registry;
