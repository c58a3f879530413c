//! Clock error types.

use super::models::{ClockAction, ClockStatus};
use crate::{db::StorageError, tournament::TournamentId};
use thiserror::Error;

/// Clock errors
#[derive(Debug, Error)]
pub enum ClockError {
    /// No clock state exists for the tournament
    #[error("Clock not initialized for tournament {0}")]
    NotInitialized(TournamentId),

    /// Transition not legal from the current status
    #[error("Cannot {action} while the clock is {status}")]
    InvalidTransition {
        action: ClockAction,
        status: ClockStatus,
    },

    /// Tournament already finished
    #[error("Tournament {0} is finished")]
    Finished(TournamentId),

    /// Negative duration or snapshot
    #[error("Invalid time value: {0}")]
    InvalidTime(i64),

    /// Blind level missing from the tournament configuration
    #[error("Level {0} is not configured")]
    LevelNotConfigured(u32),

    /// Storage error
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

impl ClockError {
    /// Stable reason code
    pub fn code(&self) -> &'static str {
        match self {
            ClockError::NotInitialized(_) => "clock_not_initialized",
            ClockError::InvalidTransition { .. } => "invalid_transition",
            ClockError::Finished(_) => "tournament_finished",
            ClockError::InvalidTime(_) => "invalid_time",
            ClockError::LevelNotConfigured(_) => "level_not_configured",
            ClockError::Storage(_) => "storage",
        }
    }
}

/// Result type for clock operations
pub type ClockResult<T> = Result<T, ClockError>;
