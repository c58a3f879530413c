//! Read-only tournament statistics.

pub mod calculator;
pub mod models;

pub use calculator::calculate_stats;
pub use models::{ChipLeader, TournamentStats};
