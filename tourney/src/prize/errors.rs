//! Prize calculation error types.

use thiserror::Error;

/// Prize errors
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PrizeError {
    /// Payout structure failed validation
    #[error("Invalid payout structure: {}", .0.join("; "))]
    InvalidStructure(Vec<String>),

    /// Nobody to pay
    #[error("No players to split the pool between")]
    NoPlayers,

    /// Chip-based split with no chips in play
    #[error("Total chip count is zero")]
    NoChips,

    /// Negative chip stack
    #[error("Invalid chip count: {0}")]
    InvalidChips(i64),

    /// Negative amount
    #[error("Invalid amount: {0}")]
    InvalidAmount(i64),
}

impl PrizeError {
    /// Stable reason code for callers
    pub fn code(&self) -> &'static str {
        match self {
            PrizeError::InvalidStructure(_) => "invalid_structure",
            PrizeError::NoPlayers => "no_players",
            PrizeError::NoChips => "no_chips",
            PrizeError::InvalidChips(_) => "invalid_chips",
            PrizeError::InvalidAmount(_) => "invalid_amount",
        }
    }
}

/// Result type for prize calculations
pub type PrizeResult<T> = Result<T, PrizeError>;
