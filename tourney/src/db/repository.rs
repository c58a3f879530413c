//! Repository trait definitions for testability and dependency injection.
//!
//! Every repository is keyed by tournament and offers atomic per-row
//! updates. Seat operations are conditional so that a player can never end
//! up in two seats, whatever the interleaving of callers.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::errors::StorageResult;
use crate::clock::ClockState;
use crate::ledger::{EntryId, LedgerTransaction, PlayerEntry};
use crate::seating::{SeatRef, TableId, TableLayout, TableStatus};
use crate::tournament::{PlayerId, TournamentConfig, TournamentId};

/// Trait for clock state storage
#[async_trait]
pub trait ClockRepository: Send + Sync {
    /// Get the clock of a tournament
    async fn get_clock(&self, tournament_id: TournamentId) -> StorageResult<Option<ClockState>>;

    /// Insert `state` unless its tournament already has a clock
    ///
    /// Returns the stored clock, which is the pre-existing one on conflict.
    async fn insert_clock_if_absent(&self, state: &ClockState) -> StorageResult<ClockState>;

    /// Overwrite the clock of `state.tournament_id`
    async fn save_clock(&self, state: &ClockState) -> StorageResult<()>;

    /// Delete the clock; returns whether one existed
    async fn delete_clock(&self, tournament_id: TournamentId) -> StorageResult<bool>;
}

/// Trait for tournament configuration lookup
#[async_trait]
pub trait ConfigRepository: Send + Sync {
    /// Get tournament configuration
    async fn get_config(
        &self,
        tournament_id: TournamentId,
    ) -> StorageResult<Option<TournamentConfig>>;

    /// Create or replace tournament configuration
    async fn save_config(&self, config: &TournamentConfig) -> StorageResult<()>;
}

/// Trait for player entries and the transaction log
#[async_trait]
pub trait LedgerRepository: Send + Sync {
    /// Insert an entry; the repository assigns its ID
    async fn insert_entry(&self, entry: &PlayerEntry) -> StorageResult<PlayerEntry>;

    /// Get entry by ID
    async fn get_entry(&self, entry_id: EntryId) -> StorageResult<Option<PlayerEntry>>;

    /// Overwrite an existing entry
    async fn update_entry(&self, entry: &PlayerEntry) -> StorageResult<()>;

    /// All entries of a tournament, ordered by ID
    async fn tournament_entries(
        &self,
        tournament_id: TournamentId,
    ) -> StorageResult<Vec<PlayerEntry>>;

    /// Entries of one player, ordered by entry number
    async fn player_entries(
        &self,
        tournament_id: TournamentId,
        player_id: PlayerId,
    ) -> StorageResult<Vec<PlayerEntry>>;

    /// Delete every entry of a player; returns the number deleted
    async fn delete_player_entries(
        &self,
        tournament_id: TournamentId,
        player_id: PlayerId,
    ) -> StorageResult<u64>;

    /// Append to the transaction log
    async fn record_transaction(&self, transaction: &LedgerTransaction) -> StorageResult<()>;

    /// Transaction log of a tournament, oldest first
    async fn transactions(
        &self,
        tournament_id: TournamentId,
    ) -> StorageResult<Vec<LedgerTransaction>>;
}

/// Trait for tables and seats
#[async_trait]
pub trait TableRepository: Send + Sync {
    /// Create a table with the next table number and `max_seats` empty seats
    async fn create_table(
        &self,
        tournament_id: TournamentId,
        max_seats: u8,
        created_at: DateTime<Utc>,
    ) -> StorageResult<TableLayout>;

    /// Get table with its seats
    async fn get_table(&self, table_id: TableId) -> StorageResult<Option<TableLayout>>;

    /// All tables of a tournament, ordered by table number
    async fn tournament_tables(
        &self,
        tournament_id: TournamentId,
    ) -> StorageResult<Vec<TableLayout>>;

    /// Update table status
    async fn set_table_status(&self, table_id: TableId, status: TableStatus) -> StorageResult<()>;

    /// Delete a table and its seats; returns whether it existed
    async fn delete_table(&self, table_id: TableId) -> StorageResult<bool>;

    /// Seat currently held by a player
    async fn find_seat(
        &self,
        tournament_id: TournamentId,
        player_id: PlayerId,
    ) -> StorageResult<Option<SeatRef>>;

    /// Seat a player
    ///
    /// Succeeds only if the seat is empty and the player holds no other
    /// seat in the tournament.
    async fn take_seat(
        &self,
        tournament_id: TournamentId,
        seat: SeatRef,
        player_id: PlayerId,
    ) -> StorageResult<bool>;

    /// Move a seated player to an empty seat in one step
    ///
    /// Returns `false` and changes nothing if the player is not seated or
    /// the destination is taken.
    async fn move_seat(
        &self,
        tournament_id: TournamentId,
        player_id: PlayerId,
        to: SeatRef,
    ) -> StorageResult<bool>;

    /// Free the player's seat; returns the seat that was freed
    async fn release_seat(
        &self,
        tournament_id: TournamentId,
        player_id: PlayerId,
    ) -> StorageResult<Option<SeatRef>>;
}
