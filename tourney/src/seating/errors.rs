//! Seating error types.

use super::models::{TableId, TableStatus};
use crate::{
    db::StorageError,
    tournament::{PlayerId, TournamentId},
};
use thiserror::Error;

/// Seating errors
#[derive(Debug, Error)]
pub enum SeatingError {
    #[error("Table size must be between {min} and {max}, got {got}")]
    InvalidTableSize { min: u8, max: u8, got: u8 },

    #[error("Table {0} not found")]
    TableNotFound(TableId),

    /// Table belongs to another tournament
    #[error("Table {table_id} is not part of tournament {tournament_id}")]
    WrongTournament {
        table_id: TableId,
        tournament_id: TournamentId,
    },

    #[error("Table {table_id} is {status}")]
    TableNotActive { table_id: TableId, status: TableStatus },

    #[error("Table {0} still has players")]
    TableNotEmpty(TableId),

    #[error("Seat {seat_number} does not exist at table {table_id}")]
    InvalidSeat { table_id: TableId, seat_number: u8 },

    #[error("Seat {seat_number} at table {table_id} is taken")]
    SeatOccupied { table_id: TableId, seat_number: u8 },

    #[error("Player {0} is not seated")]
    PlayerNotSeated(PlayerId),

    #[error("Player {0} is already seated")]
    PlayerAlreadySeated(PlayerId),

    /// Every active table is full
    #[error("No free seat available")]
    NoSeatAvailable,

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

impl SeatingError {
    /// Stable reason code
    pub fn code(&self) -> &'static str {
        match self {
            SeatingError::InvalidTableSize { .. } => "invalid_table_size",
            SeatingError::TableNotFound(_) | SeatingError::WrongTournament { .. } => {
                "table_not_found"
            }
            SeatingError::TableNotActive { .. } => "table_not_active",
            SeatingError::TableNotEmpty(_) => "table_not_empty",
            SeatingError::InvalidSeat { .. } => "invalid_seat",
            SeatingError::SeatOccupied { .. } => "seat_occupied",
            SeatingError::PlayerNotSeated(_) => "player_not_seated",
            SeatingError::PlayerAlreadySeated(_) => "player_already_seated",
            SeatingError::NoSeatAvailable => "no_seat_available",
            SeatingError::Storage(_) => "storage",
        }
    }
}

/// Result type for seating operations
pub type SeatingResult<T> = Result<T, SeatingError>;
