//! Seating manager: tables, seat moves and balance execution.

use super::{
    balance,
    errors::{SeatingError, SeatingResult},
    models::{
        BalanceMove, BalancePlan, ExecutionReport, FinalTableCheck, MoveFailure, SeatRef,
        TableBreakPlan, TableId, TableLayout, TableStatus,
    },
};
use crate::{
    db::{LedgerRepository, TableRepository},
    time::TimeSource,
    tournament::{EventBus, MAX_TABLE_SEATS, MIN_TABLE_SEATS, PlayerId, TournamentEvent, TournamentId},
};
use rand::{SeedableRng, rngs::StdRng, seq::SliceRandom};
use std::sync::Arc;

/// Seating manager
#[derive(Clone)]
pub struct SeatingManager {
    tables: Arc<dyn TableRepository>,
    ledger: Arc<dyn LedgerRepository>,
    time: Arc<dyn TimeSource>,
    events: EventBus,
}

impl SeatingManager {
    /// Create a new seating manager
    pub fn new(
        tables: Arc<dyn TableRepository>,
        ledger: Arc<dyn LedgerRepository>,
        time: Arc<dyn TimeSource>,
        events: EventBus,
    ) -> Self {
        Self {
            tables,
            ledger,
            time,
            events,
        }
    }

    /// Open a table with the next table number
    pub async fn add_table(&self, tournament_id: TournamentId, max_seats: u8) -> SeatingResult<TableLayout> {
        if !(MIN_TABLE_SEATS..=MAX_TABLE_SEATS).contains(&max_seats) {
            return Err(SeatingError::InvalidTableSize {
                min: MIN_TABLE_SEATS,
                max: MAX_TABLE_SEATS,
                got: max_seats,
            });
        }

        let layout = self
            .tables
            .create_table(tournament_id, max_seats, self.time.now())
            .await?;

        log::info!(
            "Tournament {}: opened table {} with {} seats",
            tournament_id,
            layout.table.table_number,
            max_seats
        );
        self.events.publish(TournamentEvent::TableAdded {
            tournament_id,
            table_id: layout.id(),
            table_number: layout.table.table_number,
        });
        Ok(layout)
    }

    /// Delete an empty table
    pub async fn remove_table(&self, tournament_id: TournamentId, table_id: TableId) -> SeatingResult<()> {
        let layout = self.table_of(tournament_id, table_id).await?;
        if layout.player_count() > 0 {
            return Err(SeatingError::TableNotEmpty(table_id));
        }

        self.tables.delete_table(table_id).await?;
        log::info!(
            "Tournament {}: removed table {}",
            tournament_id,
            layout.table.table_number
        );
        self.events.publish(TournamentEvent::TableRemoved {
            tournament_id,
            table_id,
        });
        Ok(())
    }

    /// Tables of a tournament, optionally filtered by status
    pub async fn get_tables(
        &self,
        tournament_id: TournamentId,
        status: Option<TableStatus>,
    ) -> SeatingResult<Vec<TableLayout>> {
        let tables = self.tables.tournament_tables(tournament_id).await?;
        Ok(match status {
            Some(status) => tables
                .into_iter()
                .filter(|t| t.table.status == status)
                .collect(),
            None => tables,
        })
    }

    /// Seat currently held by a player
    pub async fn find_seat(
        &self,
        tournament_id: TournamentId,
        player_id: PlayerId,
    ) -> SeatingResult<Option<SeatRef>> {
        Ok(self.tables.find_seat(tournament_id, player_id).await?)
    }

    /// Move a seated player to an empty seat of an active table
    pub async fn move_player(
        &self,
        tournament_id: TournamentId,
        player_id: PlayerId,
        to_table: TableId,
        to_seat: u8,
    ) -> SeatingResult<BalanceMove> {
        let destination = self.table_of(tournament_id, to_table).await?;
        if !destination.is_active() {
            return Err(SeatingError::TableNotActive {
                table_id: to_table,
                status: destination.table.status,
            });
        }
        match destination.seat(to_seat) {
            None => {
                return Err(SeatingError::InvalidSeat {
                    table_id: to_table,
                    seat_number: to_seat,
                });
            }
            Some(seat) if seat.player_id.is_some() => {
                return Err(SeatingError::SeatOccupied {
                    table_id: to_table,
                    seat_number: to_seat,
                });
            }
            Some(_) => {}
        }

        let from = self
            .tables
            .find_seat(tournament_id, player_id)
            .await?
            .ok_or(SeatingError::PlayerNotSeated(player_id))?;

        let target = SeatRef::new(to_table, to_seat);
        if !self.tables.move_seat(tournament_id, player_id, target).await? {
            return Err(SeatingError::SeatOccupied {
                table_id: to_table,
                seat_number: to_seat,
            });
        }
        self.record_seat(tournament_id, player_id, Some(target)).await?;

        let movement = BalanceMove {
            player_id,
            from_table: from.table_id,
            from_seat: from.seat_number,
            to_table,
            to_seat,
        };
        log::info!(
            "Tournament {}: moved player {} from table {} seat {} to table {} seat {}",
            tournament_id,
            player_id,
            from.table_id,
            from.seat_number,
            to_table,
            to_seat
        );
        self.events.publish(TournamentEvent::PlayerMoved {
            tournament_id,
            movement,
        });
        Ok(movement)
    }

    /// Free a player's seat; returns the seat that was freed
    pub async fn unseat_player(
        &self,
        tournament_id: TournamentId,
        player_id: PlayerId,
    ) -> SeatingResult<Option<SeatRef>> {
        let freed = self.tables.release_seat(tournament_id, player_id).await?;
        self.record_seat(tournament_id, player_id, None).await?;

        if let Some(seat) = freed {
            log::debug!(
                "Tournament {}: player {} left table {} seat {}",
                tournament_id,
                player_id,
                seat.table_id,
                seat.seat_number
            );
            self.events.publish(TournamentEvent::PlayerUnseated {
                tournament_id,
                player_id,
                table_id: seat.table_id,
                seat_number: seat.seat_number,
            });
        }
        Ok(freed)
    }

    /// Seat a player by the auto-seat rule
    ///
    /// Fewest players first, then lowest table number, then lowest free
    /// seat. A player who already holds a seat keeps it.
    pub async fn auto_seat_player(
        &self,
        tournament_id: TournamentId,
        player_id: PlayerId,
    ) -> SeatingResult<SeatRef> {
        if let Some(existing) = self.tables.find_seat(tournament_id, player_id).await? {
            return Ok(existing);
        }

        let tables = self.tables.tournament_tables(tournament_id).await?;
        let seat = balance::select_seat(&tables).ok_or(SeatingError::NoSeatAvailable)?;
        self.seat(tournament_id, player_id, seat).await?;
        Ok(seat)
    }

    /// Random initial draw of every unseated player in play
    ///
    /// The draw order is shuffled (reproducibly when `seed` is given) and
    /// each player is then placed by the auto-seat rule. Returns the seats
    /// taken and the players left without one.
    pub async fn seat_all_players(
        &self,
        tournament_id: TournamentId,
        seed: Option<u64>,
    ) -> SeatingResult<(Vec<(PlayerId, SeatRef)>, Vec<PlayerId>)> {
        let tables = self.tables.tournament_tables(tournament_id).await?;
        let seated: Vec<PlayerId> = tables
            .iter()
            .flat_map(|t| t.players().map(|(_, p)| p).collect::<Vec<_>>())
            .collect();

        let mut players: Vec<PlayerId> = self
            .ledger
            .tournament_entries(tournament_id)
            .await?
            .into_iter()
            .filter(|e| e.is_in_play() && !seated.contains(&e.player_id))
            .map(|e| e.player_id)
            .collect();
        players.sort_unstable();
        players.dedup();

        match seed {
            Some(seed) => players.shuffle(&mut StdRng::seed_from_u64(seed)),
            None => players.shuffle(&mut rand::rng()),
        }

        let (assignments, mut unseated) = balance::select_seats(&tables, &players);
        let mut placed = Vec::with_capacity(assignments.len());
        for (player_id, seat) in assignments {
            match self.seat(tournament_id, player_id, seat).await {
                Ok(()) => placed.push((player_id, seat)),
                Err(SeatingError::SeatOccupied { .. }) => unseated.push(player_id),
                Err(e) => return Err(e),
            }
        }

        if !unseated.is_empty() {
            log::warn!(
                "Tournament {}: {} players could not be seated",
                tournament_id,
                unseated.len()
            );
        }
        Ok((placed, unseated))
    }

    /// Plan moves that balance the active tables
    pub async fn calculate_balance_plan(&self, tournament_id: TournamentId) -> SeatingResult<BalancePlan> {
        let tables = self.tables.tournament_tables(tournament_id).await?;
        Ok(balance::plan_balance(&tables))
    }

    /// Apply a balance plan move by move
    ///
    /// Failed moves are collected; completed ones are kept.
    pub async fn execute_balance(
        &self,
        tournament_id: TournamentId,
        plan: &BalancePlan,
    ) -> SeatingResult<ExecutionReport> {
        let report = self.execute_moves(tournament_id, &plan.moves).await?;

        log::info!(
            "Tournament {}: balance executed, {} moved, {} failed",
            tournament_id,
            report.completed.len(),
            report.failed.len()
        );
        self.events.publish(TournamentEvent::TablesBalanced {
            tournament_id,
            completed: report.completed.len(),
            failed: report.failed.len(),
        });
        Ok(report)
    }

    /// Plan breaking the table with the fewest players
    pub async fn suggest_table_break(
        &self,
        tournament_id: TournamentId,
    ) -> SeatingResult<Option<TableBreakPlan>> {
        let tables = self.tables.tournament_tables(tournament_id).await?;
        Ok(balance::plan_table_break(&tables))
    }

    /// Break a table
    ///
    /// The table is marked `breaking` before any move and `broken` only
    /// when every move succeeded; otherwise it stays `breaking`.
    pub async fn execute_table_break(
        &self,
        tournament_id: TournamentId,
        plan: &TableBreakPlan,
    ) -> SeatingResult<ExecutionReport> {
        self.table_of(tournament_id, plan.table_id).await?;
        self.tables
            .set_table_status(plan.table_id, TableStatus::Breaking)
            .await?;

        let report = self.execute_moves(tournament_id, &plan.moves).await?;
        let complete = report.is_complete();
        if complete {
            self.tables
                .set_table_status(plan.table_id, TableStatus::Broken)
                .await?;
            log::info!(
                "Tournament {}: table {} broken",
                tournament_id,
                plan.table_number
            );
        } else {
            log::warn!(
                "Tournament {}: table {} left breaking, {} moves failed",
                tournament_id,
                plan.table_number,
                report.failed.len()
            );
        }

        self.events.publish(TournamentEvent::TableBroken {
            tournament_id,
            table_id: plan.table_id,
            complete,
        });
        Ok(report)
    }

    /// Whether the remaining field fits on one table
    pub async fn check_final_table(&self, tournament_id: TournamentId) -> SeatingResult<FinalTableCheck> {
        let tables = self.tables.tournament_tables(tournament_id).await?;
        let players_remaining = self
            .ledger
            .tournament_entries(tournament_id)
            .await?
            .iter()
            .filter(|e| e.is_in_play())
            .count();
        Ok(balance::final_table_check(&tables, players_remaining))
    }

    async fn execute_moves(
        &self,
        tournament_id: TournamentId,
        moves: &[BalanceMove],
    ) -> SeatingResult<ExecutionReport> {
        let mut report = ExecutionReport::default();
        for planned in moves {
            match self
                .move_player(tournament_id, planned.player_id, planned.to_table, planned.to_seat)
                .await
            {
                Ok(done) => report.completed.push(done),
                Err(SeatingError::Storage(e)) => return Err(SeatingError::Storage(e)),
                Err(e) => {
                    log::warn!(
                        "Tournament {}: move of player {} failed: {}",
                        tournament_id,
                        planned.player_id,
                        e
                    );
                    report.failed.push(MoveFailure {
                        planned: *planned,
                        reason: e.code().to_string(),
                    });
                }
            }
        }
        Ok(report)
    }

    async fn seat(&self, tournament_id: TournamentId, player_id: PlayerId, seat: SeatRef) -> SeatingResult<()> {
        if !self.tables.take_seat(tournament_id, seat, player_id).await? {
            return Err(SeatingError::SeatOccupied {
                table_id: seat.table_id,
                seat_number: seat.seat_number,
            });
        }
        self.record_seat(tournament_id, player_id, Some(seat)).await?;

        log::debug!(
            "Tournament {}: seated player {} at table {} seat {}",
            tournament_id,
            player_id,
            seat.table_id,
            seat.seat_number
        );
        self.events.publish(TournamentEvent::PlayerSeated {
            tournament_id,
            player_id,
            table_id: seat.table_id,
            seat_number: seat.seat_number,
        });
        Ok(())
    }

    /// Mirror a seat change onto the player's latest entry
    async fn record_seat(
        &self,
        tournament_id: TournamentId,
        player_id: PlayerId,
        seat: Option<SeatRef>,
    ) -> SeatingResult<()> {
        let entries = self.ledger.player_entries(tournament_id, player_id).await?;
        for mut entry in entries {
            let wanted = if entry.is_in_play() { seat } else { None };
            if entry.seat_assignment != wanted {
                entry.seat_assignment = wanted;
                self.ledger.update_entry(&entry).await?;
            }
        }
        Ok(())
    }

    async fn table_of(&self, tournament_id: TournamentId, table_id: TableId) -> SeatingResult<TableLayout> {
        let layout = self
            .tables
            .get_table(table_id)
            .await?
            .ok_or(SeatingError::TableNotFound(table_id))?;
        if layout.table.tournament_id != tournament_id {
            return Err(SeatingError::WrongTournament {
                table_id,
                tournament_id,
            });
        }
        Ok(layout)
    }
}
