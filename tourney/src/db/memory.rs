//! In-memory repositories for tests and embedding.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::{BTreeMap, HashMap};
use tokio::sync::RwLock;

use super::{
    errors::{StorageError, StorageResult},
    repository::{ClockRepository, ConfigRepository, LedgerRepository, TableRepository},
};
use crate::clock::ClockState;
use crate::ledger::{EntryId, LedgerTransaction, PlayerEntry};
use crate::seating::{SeatRef, Table, TableId, TableLayout, TableStatus};
use crate::tournament::{PlayerId, TournamentConfig, TournamentId};

/// In-memory clock storage
#[derive(Debug, Default)]
pub struct MemoryClockRepository {
    inner: RwLock<ClockStore>,
}

#[derive(Debug, Default)]
struct ClockStore {
    clocks: HashMap<TournamentId, ClockState>,
    next_id: i64,
}

impl MemoryClockRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ClockRepository for MemoryClockRepository {
    async fn get_clock(&self, tournament_id: TournamentId) -> StorageResult<Option<ClockState>> {
        Ok(self.inner.read().await.clocks.get(&tournament_id).cloned())
    }

    async fn insert_clock_if_absent(&self, state: &ClockState) -> StorageResult<ClockState> {
        let mut store = self.inner.write().await;
        if let Some(existing) = store.clocks.get(&state.tournament_id) {
            return Ok(existing.clone());
        }

        store.next_id += 1;
        let mut stored = state.clone();
        stored.id = store.next_id;
        store.clocks.insert(stored.tournament_id, stored.clone());
        Ok(stored)
    }

    async fn save_clock(&self, state: &ClockState) -> StorageResult<()> {
        let mut store = self.inner.write().await;
        match store.clocks.get_mut(&state.tournament_id) {
            Some(existing) => {
                *existing = state.clone();
                Ok(())
            }
            None => Err(StorageError::NotFound(format!(
                "clock of tournament {}",
                state.tournament_id
            ))),
        }
    }

    async fn delete_clock(&self, tournament_id: TournamentId) -> StorageResult<bool> {
        Ok(self.inner.write().await.clocks.remove(&tournament_id).is_some())
    }
}

/// In-memory tournament configurations
#[derive(Debug, Default)]
pub struct MemoryConfigRepository {
    configs: RwLock<HashMap<TournamentId, TournamentConfig>>,
}

impl MemoryConfigRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ConfigRepository for MemoryConfigRepository {
    async fn get_config(
        &self,
        tournament_id: TournamentId,
    ) -> StorageResult<Option<TournamentConfig>> {
        Ok(self.configs.read().await.get(&tournament_id).cloned())
    }

    async fn save_config(&self, config: &TournamentConfig) -> StorageResult<()> {
        self.configs
            .write()
            .await
            .insert(config.tournament_id, config.clone());
        Ok(())
    }
}

/// In-memory ledger storage
#[derive(Debug, Default)]
pub struct MemoryLedgerRepository {
    inner: RwLock<LedgerStore>,
}

#[derive(Debug, Default)]
struct LedgerStore {
    entries: BTreeMap<EntryId, PlayerEntry>,
    transactions: Vec<LedgerTransaction>,
    next_id: EntryId,
}

impl MemoryLedgerRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl LedgerRepository for MemoryLedgerRepository {
    async fn insert_entry(&self, entry: &PlayerEntry) -> StorageResult<PlayerEntry> {
        let mut store = self.inner.write().await;
        store.next_id += 1;
        let mut stored = entry.clone();
        stored.id = store.next_id;
        store.entries.insert(stored.id, stored.clone());
        Ok(stored)
    }

    async fn get_entry(&self, entry_id: EntryId) -> StorageResult<Option<PlayerEntry>> {
        Ok(self.inner.read().await.entries.get(&entry_id).cloned())
    }

    async fn update_entry(&self, entry: &PlayerEntry) -> StorageResult<()> {
        let mut store = self.inner.write().await;
        match store.entries.get_mut(&entry.id) {
            Some(existing) => {
                *existing = entry.clone();
                Ok(())
            }
            None => Err(StorageError::NotFound(format!("entry {}", entry.id))),
        }
    }

    async fn tournament_entries(
        &self,
        tournament_id: TournamentId,
    ) -> StorageResult<Vec<PlayerEntry>> {
        Ok(self
            .inner
            .read()
            .await
            .entries
            .values()
            .filter(|e| e.tournament_id == tournament_id)
            .cloned()
            .collect())
    }

    async fn player_entries(
        &self,
        tournament_id: TournamentId,
        player_id: PlayerId,
    ) -> StorageResult<Vec<PlayerEntry>> {
        let mut entries: Vec<PlayerEntry> = self
            .inner
            .read()
            .await
            .entries
            .values()
            .filter(|e| e.tournament_id == tournament_id && e.player_id == player_id)
            .cloned()
            .collect();
        entries.sort_by_key(|e| e.entry_number);
        Ok(entries)
    }

    async fn delete_player_entries(
        &self,
        tournament_id: TournamentId,
        player_id: PlayerId,
    ) -> StorageResult<u64> {
        let mut store = self.inner.write().await;
        let before = store.entries.len();
        store
            .entries
            .retain(|_, e| !(e.tournament_id == tournament_id && e.player_id == player_id));
        Ok((before - store.entries.len()) as u64)
    }

    async fn record_transaction(&self, transaction: &LedgerTransaction) -> StorageResult<()> {
        self.inner
            .write()
            .await
            .transactions
            .push(transaction.clone());
        Ok(())
    }

    async fn transactions(
        &self,
        tournament_id: TournamentId,
    ) -> StorageResult<Vec<LedgerTransaction>> {
        Ok(self
            .inner
            .read()
            .await
            .transactions
            .iter()
            .filter(|t| t.tournament_id == tournament_id)
            .cloned()
            .collect())
    }
}

/// In-memory tables and seats
#[derive(Debug, Default)]
pub struct MemoryTableRepository {
    inner: RwLock<TableStore>,
}

#[derive(Debug, Default)]
struct TableStore {
    tables: BTreeMap<TableId, TableLayout>,
    /// Last table number handed out per tournament
    numbers: HashMap<TournamentId, u32>,
    next_id: TableId,
}

impl TableStore {
    fn seat_of(&self, tournament_id: TournamentId, player_id: PlayerId) -> Option<SeatRef> {
        self.tables
            .values()
            .filter(|t| t.table.tournament_id == tournament_id)
            .find_map(|t| {
                t.seat_of(player_id)
                    .map(|seat_number| SeatRef::new(t.id(), seat_number))
            })
    }

    fn is_free(&self, tournament_id: TournamentId, seat: SeatRef) -> bool {
        self.tables
            .get(&seat.table_id)
            .filter(|t| t.table.tournament_id == tournament_id)
            .and_then(|t| t.seat(seat.seat_number))
            .is_some_and(|s| s.player_id.is_none())
    }

    fn set_occupant(&mut self, seat: SeatRef, player_id: Option<PlayerId>) {
        if let Some(slot) = self
            .tables
            .get_mut(&seat.table_id)
            .and_then(|t| t.seats.iter_mut().find(|s| s.seat_number == seat.seat_number))
        {
            slot.player_id = player_id;
        }
    }
}

impl MemoryTableRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TableRepository for MemoryTableRepository {
    async fn create_table(
        &self,
        tournament_id: TournamentId,
        max_seats: u8,
        created_at: DateTime<Utc>,
    ) -> StorageResult<TableLayout> {
        let mut store = self.inner.write().await;
        store.next_id += 1;
        let id = store.next_id;
        let number = store.numbers.entry(tournament_id).or_insert(0);
        *number += 1;

        let layout = TableLayout::empty(Table {
            id,
            tournament_id,
            table_number: *number,
            max_seats,
            status: TableStatus::Active,
            created_at,
        });
        store.tables.insert(id, layout.clone());
        Ok(layout)
    }

    async fn get_table(&self, table_id: TableId) -> StorageResult<Option<TableLayout>> {
        Ok(self.inner.read().await.tables.get(&table_id).cloned())
    }

    async fn tournament_tables(
        &self,
        tournament_id: TournamentId,
    ) -> StorageResult<Vec<TableLayout>> {
        let mut tables: Vec<TableLayout> = self
            .inner
            .read()
            .await
            .tables
            .values()
            .filter(|t| t.table.tournament_id == tournament_id)
            .cloned()
            .collect();
        tables.sort_by_key(|t| t.table.table_number);
        Ok(tables)
    }

    async fn set_table_status(&self, table_id: TableId, status: TableStatus) -> StorageResult<()> {
        let mut store = self.inner.write().await;
        match store.tables.get_mut(&table_id) {
            Some(layout) => {
                layout.table.status = status;
                Ok(())
            }
            None => Err(StorageError::NotFound(format!("table {}", table_id))),
        }
    }

    async fn delete_table(&self, table_id: TableId) -> StorageResult<bool> {
        Ok(self.inner.write().await.tables.remove(&table_id).is_some())
    }

    async fn find_seat(
        &self,
        tournament_id: TournamentId,
        player_id: PlayerId,
    ) -> StorageResult<Option<SeatRef>> {
        Ok(self.inner.read().await.seat_of(tournament_id, player_id))
    }

    async fn take_seat(
        &self,
        tournament_id: TournamentId,
        seat: SeatRef,
        player_id: PlayerId,
    ) -> StorageResult<bool> {
        let mut store = self.inner.write().await;
        if store.seat_of(tournament_id, player_id).is_some() || !store.is_free(tournament_id, seat) {
            return Ok(false);
        }
        store.set_occupant(seat, Some(player_id));
        Ok(true)
    }

    async fn move_seat(
        &self,
        tournament_id: TournamentId,
        player_id: PlayerId,
        to: SeatRef,
    ) -> StorageResult<bool> {
        let mut store = self.inner.write().await;
        let Some(from) = store.seat_of(tournament_id, player_id) else {
            return Ok(false);
        };
        if !store.is_free(tournament_id, to) {
            return Ok(false);
        }
        store.set_occupant(from, None);
        store.set_occupant(to, Some(player_id));
        Ok(true)
    }

    async fn release_seat(
        &self,
        tournament_id: TournamentId,
        player_id: PlayerId,
    ) -> StorageResult<Option<SeatRef>> {
        let mut store = self.inner.write().await;
        let seat = store.seat_of(tournament_id, player_id);
        if let Some(seat) = seat {
            store.set_occupant(seat, None);
        }
        Ok(seat)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_insert_clock_if_absent_keeps_existing() {
        let repo = MemoryClockRepository::new();
        let now = Utc::now();

        let first = repo.insert_clock_if_absent(&ClockState::new(1, None, now)).await.unwrap();
        let mut progressed = first.clone();
        progressed.current_level = 3;
        repo.save_clock(&progressed).await.unwrap();

        let second = repo.insert_clock_if_absent(&ClockState::new(1, Some(9), now)).await.unwrap();
        assert_eq!(second.id, first.id);
        assert_eq!(second.current_level, 3);
        assert_eq!(second.template_id, None);
    }

    #[tokio::test]
    async fn test_table_numbers_are_never_reused() {
        let repo = MemoryTableRepository::new();
        let now = Utc::now();

        let one = repo.create_table(1, 9, now).await.unwrap();
        let two = repo.create_table(1, 9, now).await.unwrap();
        assert!(repo.delete_table(two.id()).await.unwrap());
        let three = repo.create_table(1, 9, now).await.unwrap();
        let other = repo.create_table(2, 6, now).await.unwrap();

        assert_eq!(one.table.table_number, 1);
        assert_eq!(three.table.table_number, 3);
        assert_eq!(other.table.table_number, 1);
        assert_eq!(three.seats.len(), 9);
    }

    #[tokio::test]
    async fn test_player_holds_one_seat() {
        let repo = MemoryTableRepository::new();
        let table = repo.create_table(1, 4, Utc::now()).await.unwrap();

        assert!(repo.take_seat(1, SeatRef::new(table.id(), 1), 42).await.unwrap());
        assert!(!repo.take_seat(1, SeatRef::new(table.id(), 2), 42).await.unwrap());
        assert!(!repo.take_seat(1, SeatRef::new(table.id(), 1), 43).await.unwrap());
        assert!(!repo.take_seat(1, SeatRef::new(table.id(), 9), 43).await.unwrap());

        assert!(repo.move_seat(1, 42, SeatRef::new(table.id(), 3)).await.unwrap());
        assert_eq!(repo.find_seat(1, 42).await.unwrap(), Some(SeatRef::new(table.id(), 3)));

        assert_eq!(
            repo.release_seat(1, 42).await.unwrap(),
            Some(SeatRef::new(table.id(), 3))
        );
        assert_eq!(repo.find_seat(1, 42).await.unwrap(), None);
    }
}
