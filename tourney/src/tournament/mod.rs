//! Tournament configuration, events and the per-tournament actor.

pub mod actor;
pub mod config;
pub mod engine;
pub mod errors;
pub mod events;
pub mod messages;
pub mod models;
pub mod registry;

pub use actor::{TournamentActor, TournamentHandle};
pub use config::{
    AddonPolicy, BlindLevel, BountyKind, BountyPolicy, EngineConfig, MAX_TABLE_SEATS,
    MIN_TABLE_SEATS, RebuyPolicy, ReentryPolicy, TournamentConfig,
};
pub use engine::TournamentEngine;
pub use errors::{ConfigError, TournamentError, TournamentResult};
pub use events::{EventBus, TournamentEvent};
pub use messages::{ClockCommand, SeatDraw, TournamentMessage};
pub use models::{PlayerId, TournamentId};
pub use registry::TournamentRegistry;
