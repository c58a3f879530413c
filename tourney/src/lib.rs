//! # Tourney
//!
//! Engine for running live poker tournaments: the tournament clock, the
//! player ledger, seating and table balancing, and prize calculations.
//!
//! ## Architecture
//!
//! The engine is built from a few managers sharing storage, a time source
//! and an event bus:
//!
//! - **Clock**: blind levels, pause/resume, breaks and finish. Time is only
//!   checkpointed at transitions; there is no ticking timer.
//! - **Ledger**: registrations, bust-outs, re-entries, rebuys, add-ons and
//!   bounties, with an auditable transaction log.
//! - **Seating**: tables and seats, auto-seating, balance plans and table
//!   breaks.
//! - **Prize / Stats**: prize pool, payouts, deal-making and live numbers.
//!
//! Mutations for one tournament go through a [`tournament::TournamentActor`]
//! spawned by the [`tournament::TournamentRegistry`], so they are applied in
//! order while different tournaments run independently.
//!
//! ## Core Modules
//!
//! - [`clock`]: Checkpointed tournament clock
//! - [`ledger`]: Player entries and transactions
//! - [`seating`]: Tables, seats and balancing
//! - [`prize`]: Prize pool, payouts and chops
//! - [`stats`]: Derived tournament statistics
//! - [`db`]: Repository traits with in-memory and PostgreSQL storage
//! - [`tournament`]: Configuration, events, actor and registry
//!
//! ## Example
//!
//! ```
//! use std::sync::Arc;
//! use tourney::{
//!     db::Repositories,
//!     time::SystemTimeSource,
//!     tournament::{ClockCommand, EngineConfig, EventBus, TournamentConfig, TournamentEngine, TournamentRegistry},
//! };
//!
//! # #[tokio::main]
//! # async fn main() {
//! let engine = TournamentEngine::new(
//!     Repositories::in_memory(),
//!     Arc::new(SystemTimeSource),
//!     EventBus::default(),
//! );
//! let registry = TournamentRegistry::new(engine, EngineConfig::default());
//!
//! let handle = registry.handle(1).await;
//! handle
//!     .register_config(TournamentConfig::freezeout(1, "Friday Freezeout".to_string(), 10_000))
//!     .await
//!     .unwrap();
//! handle.clock(ClockCommand::Initialize { template_id: None }).await.unwrap();
//! handle.add_player(7, None).await.unwrap();
//! let state = handle.clock(ClockCommand::Start { duration_secs: None }).await.unwrap();
//! assert_eq!(state.current_level, 1);
//! # }
//! ```

/// Checkpointed tournament clock.
pub mod clock;

/// Storage layer.
pub mod db;

/// Player ledger.
pub mod ledger;

/// Prize pool, payouts and chops.
pub mod prize;

/// Tables, seats and balancing.
pub mod seating;

/// Derived statistics.
pub mod stats;

/// Time sources.
pub mod time;

/// Configuration, events, actor and registry.
pub mod tournament;

pub use clock::{ClockError, ClockManager, ClockState, ClockStatus};
pub use ledger::{LedgerError, LedgerManager, PlayerEntry};
pub use prize::{Cents, PrizeError};
pub use seating::{SeatingError, SeatingManager};
pub use stats::TournamentStats;
pub use tournament::{
    EventBus, PlayerId, TournamentConfig, TournamentEngine, TournamentError, TournamentEvent,
    TournamentId, TournamentRegistry,
};
