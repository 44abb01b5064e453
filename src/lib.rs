//! Bloop: a virtual pet whose stats decay in real time, plus a star-catching mini-game that
//! earns the coins it eats.
//!
//! [`session::Session`] is the entry point. It owns the [`model::SimulationState`], the
//! [`clock::Scheduler`] that drives decay and the timed actions, the voice backend and the
//! active [`minigame::MiniGame`]. The terminal front end in `main.rs` drives it with frame
//! deltas and key presses.

pub mod catalog;
pub mod clock;
pub mod config;
pub mod error;
pub mod minigame;
pub mod model;
pub mod mood;
pub mod session;
pub mod sim;
pub mod storage;
pub mod voice;
