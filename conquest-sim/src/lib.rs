//! AI-only game runner for the conquest rules engine.
//!
//! Loads a map and rules, seats one AI per player, and drives the game
//! through [`conquest_core::apply_action`] until someone wins or the turn
//! limit is hit.

pub mod loader;
pub mod runner;

pub use runner::{run_game, GameSummary, RunOptions};
