//! # Console Client Library
//!
//! A headless client for the shared-world server. It connects over
//! WebSocket, keeps the last world snapshot it was sent, and prints chat,
//! user count, score and crash notices. Typed lines become client events.
//!
//! Drawing the world is left to graphical front ends; this crate only covers
//! the protocol side a front end needs.
//!
//! ## Module Organization
//!
//! - `game`: local view of the world and the notices derived from updates
//! - `input`: parsing of typed lines into flap, restart, chat or quit
//! - `network`: the connection loop

pub mod game;
pub mod input;
pub mod network;
