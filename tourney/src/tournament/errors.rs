//! Tournament-level error types.

use crate::{
    clock::ClockError, db::StorageError, ledger::LedgerError, prize::PrizeError,
    seating::SeatingError,
};
use thiserror::Error;

use super::TournamentId;

/// Configuration errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// Configuration values are inconsistent
    #[error("Invalid configuration: {0}")]
    Invalid(String),

    /// Environment variable is set but cannot be parsed
    #[error("Invalid value for {var}: {value:?}")]
    InvalidVar { var: String, value: String },

    /// Required environment variable is missing
    #[error("{0} must be set")]
    MissingVar(String),
}

impl ConfigError {
    /// Stable reason code
    pub fn code(&self) -> &'static str {
        match self {
            ConfigError::Invalid(_) => "invalid_config",
            ConfigError::InvalidVar { .. } => "invalid_env_var",
            ConfigError::MissingVar(_) => "missing_env_var",
        }
    }
}

/// Errors surfaced by the tournament actor and registry
#[derive(Debug, Error)]
pub enum TournamentError {
    #[error(transparent)]
    Clock(#[from] ClockError),

    #[error(transparent)]
    Ledger(#[from] LedgerError),

    #[error(transparent)]
    Seating(#[from] SeatingError),

    #[error(transparent)]
    Prize(#[from] PrizeError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Storage(#[from] StorageError),

    /// No configuration is registered for the tournament
    #[error("No configuration for tournament {0}")]
    ConfigNotFound(TournamentId),

    /// The actor owning the tournament has stopped
    #[error("Tournament {0} is not accepting commands")]
    Unavailable(TournamentId),
}

impl TournamentError {
    /// Stable reason code
    pub fn code(&self) -> &'static str {
        match self {
            TournamentError::Clock(e) => e.code(),
            TournamentError::Ledger(e) => e.code(),
            TournamentError::Seating(e) => e.code(),
            TournamentError::Prize(e) => e.code(),
            TournamentError::Config(e) => e.code(),
            TournamentError::Storage(_) => "storage",
            TournamentError::ConfigNotFound(_) => "config_not_found",
            TournamentError::Unavailable(_) => "tournament_unavailable",
        }
    }
}

/// Result type for tournament operations
pub type TournamentResult<T> = Result<T, TournamentError>;
