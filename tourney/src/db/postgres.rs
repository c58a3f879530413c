//! PostgreSQL repositories.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Row, postgres::PgRow};

use super::{
    errors::{StorageError, StorageResult},
    repository::{ClockRepository, ConfigRepository, LedgerRepository, TableRepository},
};
use crate::clock::{ClockState, ClockStatus};
use crate::ledger::{EntryId, EntryStatus, LedgerTransaction, PlayerEntry, TransactionKind, WithdrawalStatus};
use crate::seating::{Seat, SeatRef, Table, TableId, TableLayout, TableStatus};
use crate::tournament::{PlayerId, TournamentConfig, TournamentId};

fn parse_column<T: std::str::FromStr<Err = String>>(row: &PgRow, column: &str) -> StorageResult<T> {
    let raw: String = row.try_get(column)?;
    raw.parse().map_err(StorageError::Corrupt)
}

fn to_u32(value: i32, column: &str) -> StorageResult<u32> {
    u32::try_from(value).map_err(|_| StorageError::Corrupt(format!("{} = {}", column, value)))
}

fn opt_u32(value: Option<i32>, column: &str) -> StorageResult<Option<u32>> {
    value.map(|v| to_u32(v, column)).transpose()
}

fn to_u8(value: i16, column: &str) -> StorageResult<u8> {
    u8::try_from(value).map_err(|_| StorageError::Corrupt(format!("{} = {}", column, value)))
}

/// PostgreSQL implementation of `ClockRepository`
pub struct PgClockRepository {
    pool: PgPool,
}

impl PgClockRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

const CLOCK_COLUMNS: &str = "id, tournament_id, template_id, status, current_level, time_remaining,
    started_at, paused_at, break_until, completed_at, total_players, remaining_players, updated_at";

fn clock_from_row(row: &PgRow) -> StorageResult<ClockState> {
    Ok(ClockState {
        id: row.try_get("id")?,
        tournament_id: row.try_get("tournament_id")?,
        template_id: row.try_get("template_id")?,
        status: parse_column::<ClockStatus>(row, "status")?,
        current_level: to_u32(row.try_get("current_level")?, "current_level")?,
        time_remaining: row.try_get("time_remaining")?,
        started_at: row.try_get("started_at")?,
        paused_at: row.try_get("paused_at")?,
        break_until: row.try_get("break_until")?,
        completed_at: row.try_get("completed_at")?,
        total_players: to_u32(row.try_get("total_players")?, "total_players")?,
        remaining_players: to_u32(row.try_get("remaining_players")?, "remaining_players")?,
        updated_at: row.try_get("updated_at")?,
    })
}

#[async_trait]
impl ClockRepository for PgClockRepository {
    async fn get_clock(&self, tournament_id: TournamentId) -> StorageResult<Option<ClockState>> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM tournament_clocks WHERE tournament_id = $1",
            CLOCK_COLUMNS
        ))
        .bind(tournament_id)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(clock_from_row).transpose()
    }

    async fn insert_clock_if_absent(&self, state: &ClockState) -> StorageResult<ClockState> {
        sqlx::query(
            r#"
            INSERT INTO tournament_clocks (
                tournament_id, template_id, status, current_level, time_remaining,
                total_players, remaining_players, updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            ON CONFLICT (tournament_id) DO NOTHING
            "#,
        )
        .bind(state.tournament_id)
        .bind(state.template_id)
        .bind(state.status.as_str())
        .bind(state.current_level as i32)
        .bind(state.time_remaining)
        .bind(state.total_players as i32)
        .bind(state.remaining_players as i32)
        .bind(state.updated_at)
        .execute(&self.pool)
        .await?;

        self.get_clock(state.tournament_id).await?.ok_or_else(|| {
            StorageError::NotFound(format!("clock of tournament {}", state.tournament_id))
        })
    }

    async fn save_clock(&self, state: &ClockState) -> StorageResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE tournament_clocks
            SET status = $2, current_level = $3, time_remaining = $4, started_at = $5,
                paused_at = $6, break_until = $7, completed_at = $8, total_players = $9,
                remaining_players = $10, updated_at = $11
            WHERE tournament_id = $1
            "#,
        )
        .bind(state.tournament_id)
        .bind(state.status.as_str())
        .bind(state.current_level as i32)
        .bind(state.time_remaining)
        .bind(state.started_at)
        .bind(state.paused_at)
        .bind(state.break_until)
        .bind(state.completed_at)
        .bind(state.total_players as i32)
        .bind(state.remaining_players as i32)
        .bind(state.updated_at)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StorageError::NotFound(format!(
                "clock of tournament {}",
                state.tournament_id
            )));
        }
        Ok(())
    }

    async fn delete_clock(&self, tournament_id: TournamentId) -> StorageResult<bool> {
        let result = sqlx::query("DELETE FROM tournament_clocks WHERE tournament_id = $1")
            .bind(tournament_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

/// PostgreSQL implementation of `ConfigRepository`
///
/// Configurations are stored as JSON text.
pub struct PgConfigRepository {
    pool: PgPool,
}

impl PgConfigRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ConfigRepository for PgConfigRepository {
    async fn get_config(
        &self,
        tournament_id: TournamentId,
    ) -> StorageResult<Option<TournamentConfig>> {
        let row = sqlx::query("SELECT config FROM tournament_configs WHERE tournament_id = $1")
            .bind(tournament_id)
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(row) => {
                let raw: String = row.try_get("config")?;
                Ok(Some(serde_json::from_str(&raw)?))
            }
            None => Ok(None),
        }
    }

    async fn save_config(&self, config: &TournamentConfig) -> StorageResult<()> {
        let raw = serde_json::to_string(config)?;
        sqlx::query(
            r#"
            INSERT INTO tournament_configs (tournament_id, config) VALUES ($1, $2)
            ON CONFLICT (tournament_id) DO UPDATE SET config = EXCLUDED.config
            "#,
        )
        .bind(config.tournament_id)
        .bind(raw)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}

/// PostgreSQL implementation of `LedgerRepository`
pub struct PgLedgerRepository {
    pool: PgPool,
}

impl PgLedgerRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

const ENTRY_COLUMNS: &str = "id, tournament_id, player_id, entry_number, is_reentry, status,
    withdrawal_status, chip_count, paid_amount, bounty_amount, bounties_earned, rebuys_count,
    addons_count, knockouts, finish_position, pending_position, seat_table_id, seat_number,
    original_entry_id, registered_at, elimination_time, eliminated_by_player_id";

fn entry_from_row(row: &PgRow) -> StorageResult<PlayerEntry> {
    let seat_table_id: Option<TableId> = row.try_get("seat_table_id")?;
    let seat_number: Option<i16> = row.try_get("seat_number")?;
    let seat_assignment = match (seat_table_id, seat_number) {
        (Some(table_id), Some(seat)) => Some(SeatRef::new(table_id, to_u8(seat, "seat_number")?)),
        _ => None,
    };

    Ok(PlayerEntry {
        id: row.try_get("id")?,
        tournament_id: row.try_get("tournament_id")?,
        player_id: row.try_get("player_id")?,
        entry_number: to_u32(row.try_get("entry_number")?, "entry_number")?,
        is_reentry: row.try_get("is_reentry")?,
        status: parse_column::<EntryStatus>(row, "status")?,
        withdrawal_status: parse_column::<WithdrawalStatus>(row, "withdrawal_status")?,
        chip_count: row.try_get("chip_count")?,
        paid_amount: row.try_get("paid_amount")?,
        bounty_amount: row.try_get("bounty_amount")?,
        bounties_earned: row.try_get("bounties_earned")?,
        rebuys_count: to_u32(row.try_get("rebuys_count")?, "rebuys_count")?,
        addons_count: to_u32(row.try_get("addons_count")?, "addons_count")?,
        knockouts: to_u32(row.try_get("knockouts")?, "knockouts")?,
        finish_position: opt_u32(row.try_get("finish_position")?, "finish_position")?,
        pending_position: opt_u32(row.try_get("pending_position")?, "pending_position")?,
        seat_assignment,
        original_entry_id: row.try_get("original_entry_id")?,
        registered_at: row.try_get("registered_at")?,
        elimination_time: row.try_get("elimination_time")?,
        eliminated_by_player_id: row.try_get("eliminated_by_player_id")?,
    })
}

fn transaction_from_row(row: &PgRow) -> StorageResult<LedgerTransaction> {
    Ok(LedgerTransaction {
        id: row.try_get("id")?,
        tournament_id: row.try_get("tournament_id")?,
        player_id: row.try_get("player_id")?,
        entry_id: row.try_get("entry_id")?,
        kind: parse_column::<TransactionKind>(row, "kind")?,
        amount: row.try_get("amount")?,
        chips: row.try_get("chips")?,
        created_at: row.try_get("created_at")?,
        note: row.try_get("note")?,
    })
}

#[async_trait]
impl LedgerRepository for PgLedgerRepository {
    async fn insert_entry(&self, entry: &PlayerEntry) -> StorageResult<PlayerEntry> {
        let row = sqlx::query(
            r#"
            INSERT INTO tournament_entries (
                tournament_id, player_id, entry_number, is_reentry, status, withdrawal_status,
                chip_count, paid_amount, bounty_amount, bounties_earned, rebuys_count,
                addons_count, knockouts, finish_position, pending_position, seat_table_id,
                seat_number, original_entry_id, registered_at, elimination_time,
                eliminated_by_player_id
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16,
                      $17, $18, $19, $20, $21)
            RETURNING id
            "#,
        )
        .bind(entry.tournament_id)
        .bind(entry.player_id)
        .bind(entry.entry_number as i32)
        .bind(entry.is_reentry)
        .bind(entry.status.as_str())
        .bind(entry.withdrawal_status.as_str())
        .bind(entry.chip_count)
        .bind(entry.paid_amount)
        .bind(entry.bounty_amount)
        .bind(entry.bounties_earned)
        .bind(entry.rebuys_count as i32)
        .bind(entry.addons_count as i32)
        .bind(entry.knockouts as i32)
        .bind(entry.finish_position.map(|p| p as i32))
        .bind(entry.pending_position.map(|p| p as i32))
        .bind(entry.seat_assignment.map(|s| s.table_id))
        .bind(entry.seat_assignment.map(|s| i16::from(s.seat_number)))
        .bind(entry.original_entry_id)
        .bind(entry.registered_at)
        .bind(entry.elimination_time)
        .bind(entry.eliminated_by_player_id)
        .fetch_one(&self.pool)
        .await?;

        let mut stored = entry.clone();
        stored.id = row.try_get("id")?;
        Ok(stored)
    }

    async fn get_entry(&self, entry_id: EntryId) -> StorageResult<Option<PlayerEntry>> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM tournament_entries WHERE id = $1",
            ENTRY_COLUMNS
        ))
        .bind(entry_id)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(entry_from_row).transpose()
    }

    async fn update_entry(&self, entry: &PlayerEntry) -> StorageResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE tournament_entries
            SET status = $2, withdrawal_status = $3, chip_count = $4, paid_amount = $5,
                bounty_amount = $6, bounties_earned = $7, rebuys_count = $8, addons_count = $9,
                knockouts = $10, finish_position = $11, pending_position = $12,
                seat_table_id = $13, seat_number = $14, original_entry_id = $15,
                elimination_time = $16, eliminated_by_player_id = $17
            WHERE id = $1
            "#,
        )
        .bind(entry.id)
        .bind(entry.status.as_str())
        .bind(entry.withdrawal_status.as_str())
        .bind(entry.chip_count)
        .bind(entry.paid_amount)
        .bind(entry.bounty_amount)
        .bind(entry.bounties_earned)
        .bind(entry.rebuys_count as i32)
        .bind(entry.addons_count as i32)
        .bind(entry.knockouts as i32)
        .bind(entry.finish_position.map(|p| p as i32))
        .bind(entry.pending_position.map(|p| p as i32))
        .bind(entry.seat_assignment.map(|s| s.table_id))
        .bind(entry.seat_assignment.map(|s| i16::from(s.seat_number)))
        .bind(entry.original_entry_id)
        .bind(entry.elimination_time)
        .bind(entry.eliminated_by_player_id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StorageError::NotFound(format!("entry {}", entry.id)));
        }
        Ok(())
    }

    async fn tournament_entries(
        &self,
        tournament_id: TournamentId,
    ) -> StorageResult<Vec<PlayerEntry>> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM tournament_entries WHERE tournament_id = $1 ORDER BY id",
            ENTRY_COLUMNS
        ))
        .bind(tournament_id)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(entry_from_row).collect()
    }

    async fn player_entries(
        &self,
        tournament_id: TournamentId,
        player_id: PlayerId,
    ) -> StorageResult<Vec<PlayerEntry>> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM tournament_entries
             WHERE tournament_id = $1 AND player_id = $2
             ORDER BY entry_number",
            ENTRY_COLUMNS
        ))
        .bind(tournament_id)
        .bind(player_id)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(entry_from_row).collect()
    }

    async fn delete_player_entries(
        &self,
        tournament_id: TournamentId,
        player_id: PlayerId,
    ) -> StorageResult<u64> {
        let result =
            sqlx::query("DELETE FROM tournament_entries WHERE tournament_id = $1 AND player_id = $2")
                .bind(tournament_id)
                .bind(player_id)
                .execute(&self.pool)
                .await?;
        Ok(result.rows_affected())
    }

    async fn record_transaction(&self, transaction: &LedgerTransaction) -> StorageResult<()> {
        sqlx::query(
            r#"
            INSERT INTO tournament_transactions (
                id, tournament_id, player_id, entry_id, kind, amount, chips, created_at, note
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(transaction.id)
        .bind(transaction.tournament_id)
        .bind(transaction.player_id)
        .bind(transaction.entry_id)
        .bind(transaction.kind.as_str())
        .bind(transaction.amount)
        .bind(transaction.chips)
        .bind(transaction.created_at)
        .bind(&transaction.note)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn transactions(
        &self,
        tournament_id: TournamentId,
    ) -> StorageResult<Vec<LedgerTransaction>> {
        let rows = sqlx::query(
            "SELECT id, tournament_id, player_id, entry_id, kind, amount, chips, created_at, note
             FROM tournament_transactions
             WHERE tournament_id = $1
             ORDER BY created_at, id",
        )
        .bind(tournament_id)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(transaction_from_row).collect()
    }
}

/// PostgreSQL implementation of `TableRepository`
pub struct PgTableRepository {
    pool: PgPool,
}

impl PgTableRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn load_layouts(&self, tables: Vec<Table>) -> StorageResult<Vec<TableLayout>> {
        if tables.is_empty() {
            return Ok(Vec::new());
        }

        let ids: Vec<TableId> = tables.iter().map(|t| t.id).collect();
        let rows = sqlx::query(
            "SELECT table_id, seat_number, player_id FROM tournament_seats
             WHERE table_id = ANY($1)
             ORDER BY table_id, seat_number",
        )
        .bind(&ids)
        .fetch_all(&self.pool)
        .await?;

        let mut layouts: Vec<TableLayout> = tables
            .into_iter()
            .map(|table| TableLayout {
                table,
                seats: Vec::new(),
            })
            .collect();

        for row in rows {
            let table_id: TableId = row.try_get("table_id")?;
            let seat = Seat {
                table_id,
                seat_number: to_u8(row.try_get("seat_number")?, "seat_number")?,
                player_id: row.try_get("player_id")?,
            };
            if let Some(layout) = layouts.iter_mut().find(|l| l.table.id == table_id) {
                layout.seats.push(seat);
            }
        }

        Ok(layouts)
    }
}

fn table_from_row(row: &PgRow) -> StorageResult<Table> {
    Ok(Table {
        id: row.try_get("id")?,
        tournament_id: row.try_get("tournament_id")?,
        table_number: to_u32(row.try_get("table_number")?, "table_number")?,
        max_seats: to_u8(row.try_get("max_seats")?, "max_seats")?,
        status: parse_column::<TableStatus>(row, "status")?,
        created_at: row.try_get("created_at")?,
    })
}

#[async_trait]
impl TableRepository for PgTableRepository {
    async fn create_table(
        &self,
        tournament_id: TournamentId,
        max_seats: u8,
        created_at: DateTime<Utc>,
    ) -> StorageResult<TableLayout> {
        let mut tx = self.pool.begin().await?;

        // The counter row outlives deleted tables, so numbers are never reused
        let number_row = sqlx::query(
            r#"
            INSERT INTO tournament_table_counters (tournament_id, last_number) VALUES ($1, 1)
            ON CONFLICT (tournament_id)
            DO UPDATE SET last_number = tournament_table_counters.last_number + 1
            RETURNING last_number
            "#,
        )
        .bind(tournament_id)
        .fetch_one(&mut *tx)
        .await?;
        let table_number: i32 = number_row.try_get("last_number")?;

        let row = sqlx::query(
            r#"
            INSERT INTO tournament_tables (tournament_id, table_number, max_seats, status, created_at)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, tournament_id, table_number, max_seats, status, created_at
            "#,
        )
        .bind(tournament_id)
        .bind(table_number)
        .bind(i16::from(max_seats))
        .bind(TableStatus::Active.as_str())
        .bind(created_at)
        .fetch_one(&mut *tx)
        .await?;
        let table = table_from_row(&row)?;

        sqlx::query(
            r#"
            INSERT INTO tournament_seats (table_id, tournament_id, seat_number)
            SELECT $1, $2, generate_series(1, $3)::SMALLINT
            "#,
        )
        .bind(table.id)
        .bind(tournament_id)
        .bind(i32::from(max_seats))
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(TableLayout::empty(table))
    }

    async fn get_table(&self, table_id: TableId) -> StorageResult<Option<TableLayout>> {
        let row = sqlx::query(
            "SELECT id, tournament_id, table_number, max_seats, status, created_at
             FROM tournament_tables WHERE id = $1",
        )
        .bind(table_id)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => {
                let table = table_from_row(&row)?;
                Ok(self.load_layouts(vec![table]).await?.pop())
            }
            None => Ok(None),
        }
    }

    async fn tournament_tables(
        &self,
        tournament_id: TournamentId,
    ) -> StorageResult<Vec<TableLayout>> {
        let rows = sqlx::query(
            "SELECT id, tournament_id, table_number, max_seats, status, created_at
             FROM tournament_tables WHERE tournament_id = $1
             ORDER BY table_number",
        )
        .bind(tournament_id)
        .fetch_all(&self.pool)
        .await?;

        let tables = rows.iter().map(table_from_row).collect::<StorageResult<Vec<_>>>()?;
        self.load_layouts(tables).await
    }

    async fn set_table_status(&self, table_id: TableId, status: TableStatus) -> StorageResult<()> {
        let result = sqlx::query("UPDATE tournament_tables SET status = $2 WHERE id = $1")
            .bind(table_id)
            .bind(status.as_str())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(StorageError::NotFound(format!("table {}", table_id)));
        }
        Ok(())
    }

    async fn delete_table(&self, table_id: TableId) -> StorageResult<bool> {
        let result = sqlx::query("DELETE FROM tournament_tables WHERE id = $1")
            .bind(table_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn find_seat(
        &self,
        tournament_id: TournamentId,
        player_id: PlayerId,
    ) -> StorageResult<Option<SeatRef>> {
        let row = sqlx::query(
            "SELECT table_id, seat_number FROM tournament_seats
             WHERE tournament_id = $1 AND player_id = $2",
        )
        .bind(tournament_id)
        .bind(player_id)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => Ok(Some(SeatRef::new(
                row.try_get("table_id")?,
                to_u8(row.try_get("seat_number")?, "seat_number")?,
            ))),
            None => Ok(None),
        }
    }

    async fn take_seat(
        &self,
        tournament_id: TournamentId,
        seat: SeatRef,
        player_id: PlayerId,
    ) -> StorageResult<bool> {
        // The partial unique index on (tournament_id, player_id) backs the
        // NOT EXISTS check under concurrent writers
        let result = sqlx::query(
            r#"
            UPDATE tournament_seats SET player_id = $3
            WHERE table_id = $1 AND seat_number = $2 AND tournament_id = $4
              AND player_id IS NULL
              AND NOT EXISTS (
                  SELECT 1 FROM tournament_seats WHERE tournament_id = $4 AND player_id = $3
              )
            "#,
        )
        .bind(seat.table_id)
        .bind(i16::from(seat.seat_number))
        .bind(player_id)
        .bind(tournament_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    async fn move_seat(
        &self,
        tournament_id: TournamentId,
        player_id: PlayerId,
        to: SeatRef,
    ) -> StorageResult<bool> {
        let mut tx = self.pool.begin().await?;

        let vacated = sqlx::query(
            "UPDATE tournament_seats SET player_id = NULL
             WHERE tournament_id = $1 AND player_id = $2",
        )
        .bind(tournament_id)
        .bind(player_id)
        .execute(&mut *tx)
        .await?;
        if vacated.rows_affected() == 0 {
            tx.rollback().await?;
            return Ok(false);
        }

        let taken = sqlx::query(
            "UPDATE tournament_seats SET player_id = $3
             WHERE table_id = $1 AND seat_number = $2 AND tournament_id = $4 AND player_id IS NULL",
        )
        .bind(to.table_id)
        .bind(i16::from(to.seat_number))
        .bind(player_id)
        .bind(tournament_id)
        .execute(&mut *tx)
        .await?;
        if taken.rows_affected() == 0 {
            tx.rollback().await?;
            return Ok(false);
        }

        tx.commit().await?;
        Ok(true)
    }

    async fn release_seat(
        &self,
        tournament_id: TournamentId,
        player_id: PlayerId,
    ) -> StorageResult<Option<SeatRef>> {
        let row = sqlx::query(
            "UPDATE tournament_seats SET player_id = NULL
             WHERE tournament_id = $1 AND player_id = $2
             RETURNING table_id, seat_number",
        )
        .bind(tournament_id)
        .bind(player_id)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => Ok(Some(SeatRef::new(
                row.try_get("table_id")?,
                to_u8(row.try_get("seat_number")?, "seat_number")?,
            ))),
            None => Ok(None),
        }
    }
}
