//! Tournament clock.
//!
//! State machine over `setup -> running <-> paused`, `running <-> break` and
//! `finished`. Time is stored as a checkpoint taken at each transition; no
//! task ticks the clock down. Use [`ClockState::projected_remaining`] for a
//! read-only view of the countdown between checkpoints.

pub mod errors;
pub mod manager;
pub mod models;

pub use errors::{ClockError, ClockResult};
pub use manager::ClockManager;
pub use models::{ClockAction, ClockState, ClockStateId, ClockStatus};
