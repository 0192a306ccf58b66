//! # Shared-World Game Server Library
//!
//! This library provides the authoritative server for a single, global
//! Flappy Bird style world that every connected player watches and steers
//! together. There is one bird, one pipe course and one score; any player can
//! flap, chat or restart the round.
//!
//! ## Core Responsibilities
//!
//! ### Authoritative Simulation
//! The server integrates bird physics, scrolls and recycles pipes, counts
//! score and detects collisions at a fixed tick rate. Clients never simulate;
//! they only render what the server broadcasts.
//!
//! ### Session Tracking
//! Every connection gets a generated display name (adjective + bird) used to
//! label its chat lines. The live user count is broadcast whenever someone
//! joins or leaves.
//!
//! ### State Broadcasting
//! After every tick the full world snapshot is pushed to all connections. A
//! newly joined client additionally receives the current snapshot right away.
//!
//! ## Architecture Design
//!
//! ### Single-Owner Event Loop
//! The world and the roster are owned by one `network::Server` value. Ticks
//! and client events are applied strictly one after another inside its loop,
//! so no locking is needed and every client observes the same sequence of
//! snapshots.
//!
//! ### WebSocket Transport
//! Clients speak JSON events over WebSocket. Each connection has a reader task
//! that forwards decoded events to the loop and a writer task draining a
//! bounded outbound queue, so a stalled client cannot delay the tick and
//! only ever holds a capped backlog.
//!
//! ## Module Organization
//!
//! - `physics`: pure per-tick transition and collision tests
//! - `game`: the world state and its three mutation entry points
//! - `client_manager`: connected sessions, display names, outbound queues
//! - `network`: listener, connection tasks, input routing and the tick loop
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use server::network::Server;
//! use server::ServerConfig;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
//!     let mut server = Server::new("127.0.0.1:3000", ServerConfig::default()).await?;
//!     server.run().await?;
//!     Ok(())
//! }
//! ```

pub mod client_manager;
pub mod game;
pub mod network;
pub mod physics;

use std::time::Duration;

/// Default tick period (20 Hz).
pub const DEFAULT_TICK_MS: u64 = 50;

/// Runtime settings for [`network::Server`].
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub tick_duration: Duration,
    /// Seeds pipe gaps and generated names. Entropy when `None`.
    pub seed: Option<u64>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            tick_duration: Duration::from_millis(DEFAULT_TICK_MS),
            seed: None,
        }
    }
}
