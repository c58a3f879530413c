//! Seating data models.

use crate::tournament::{PlayerId, TournamentId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Table ID type
pub type TableId = i64;

/// Table status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TableStatus {
    Active,
    /// Players are being moved off the table
    Breaking,
    /// Closed, kept for history
    Broken,
}

impl TableStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TableStatus::Active => "active",
            TableStatus::Breaking => "breaking",
            TableStatus::Broken => "broken",
        }
    }
}

impl std::fmt::Display for TableStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TableStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(TableStatus::Active),
            "breaking" => Ok(TableStatus::Breaking),
            "broken" => Ok(TableStatus::Broken),
            _ => Err(format!("Unknown table status: {}", s)),
        }
    }
}

/// A tournament table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Table {
    pub id: TableId,
    pub tournament_id: TournamentId,
    /// Display number, monotonic within a tournament and never reused
    pub table_number: u32,
    pub max_seats: u8,
    pub status: TableStatus,
    pub created_at: DateTime<Utc>,
}

/// One seat of a table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Seat {
    pub table_id: TableId,
    /// Seat number (1-indexed)
    pub seat_number: u8,
    pub player_id: Option<PlayerId>,
}

/// Position of a player in the room
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SeatRef {
    pub table_id: TableId,
    pub seat_number: u8,
}

impl SeatRef {
    pub fn new(table_id: TableId, seat_number: u8) -> Self {
        Self {
            table_id,
            seat_number,
        }
    }
}

/// A table together with all of its seats
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableLayout {
    pub table: Table,
    /// Seats `1..=max_seats`, ordered by seat number
    pub seats: Vec<Seat>,
}

impl TableLayout {
    /// Empty layout with every seat free
    pub fn empty(table: Table) -> Self {
        let seats = (1..=table.max_seats)
            .map(|seat_number| Seat {
                table_id: table.id,
                seat_number,
                player_id: None,
            })
            .collect();
        Self { table, seats }
    }

    pub fn id(&self) -> TableId {
        self.table.id
    }

    pub fn is_active(&self) -> bool {
        self.table.status == TableStatus::Active
    }

    /// Number of occupied seats
    pub fn player_count(&self) -> usize {
        self.seats.iter().filter(|s| s.player_id.is_some()).count()
    }

    /// Seated players in seat order
    pub fn players(&self) -> impl Iterator<Item = (u8, PlayerId)> + '_ {
        self.seats
            .iter()
            .filter_map(|s| s.player_id.map(|p| (s.seat_number, p)))
    }

    pub fn free_seat_count(&self) -> usize {
        self.seats.len() - self.player_count()
    }

    /// Lowest free seat number
    pub fn first_free_seat(&self) -> Option<u8> {
        self.seats
            .iter()
            .find(|s| s.player_id.is_none())
            .map(|s| s.seat_number)
    }

    pub fn seat(&self, seat_number: u8) -> Option<&Seat> {
        self.seats.iter().find(|s| s.seat_number == seat_number)
    }

    /// Seat held by `player_id`, if seated here
    pub fn seat_of(&self, player_id: PlayerId) -> Option<u8> {
        self.seats
            .iter()
            .find(|s| s.player_id == Some(player_id))
            .map(|s| s.seat_number)
    }
}

/// One planned player move
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BalanceMove {
    pub player_id: PlayerId,
    pub from_table: TableId,
    pub from_seat: u8,
    pub to_table: TableId,
    pub to_seat: u8,
}

/// Plan bringing active tables within one player of each other
///
/// Plans are advisory and never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BalancePlan {
    /// `ceil(players / tables)`
    pub target_size: usize,
    /// Nothing to move: within one player, or as close as the seat counts allow
    pub balanced: bool,
    pub moves: Vec<BalanceMove>,
}

/// A move that could not be applied
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveFailure {
    pub planned: BalanceMove,
    /// Reason code of the rejection
    pub reason: String,
}

/// Result of executing a plan; completed moves are never rolled back
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionReport {
    pub completed: Vec<BalanceMove>,
    pub failed: Vec<MoveFailure>,
}

impl ExecutionReport {
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Plan for breaking one table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableBreakPlan {
    pub table_id: TableId,
    pub table_number: u32,
    pub moves: Vec<BalanceMove>,
}

/// Whether the field fits on a single table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FinalTableCheck {
    pub is_final_table: bool,
    pub players_remaining: usize,
    /// Seats of the largest active table
    pub max_seats: u8,
    pub active_tables: usize,
}
