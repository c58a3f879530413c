//! Ledger manager: the player side of a running tournament.

use super::{
    errors::{LedgerError, LedgerResult},
    models::{
        BustOutcome, DeclineOutcome, EntryId, EntryStatus, LedgerTransaction, PlayerEntry,
        TransactionKind, WithdrawalStatus,
    },
};
use crate::{
    clock::{ClockManager, ClockStatus},
    db::{ConfigRepository, LedgerRepository},
    prize::{Cents, percent_of},
    seating::{SeatRef, SeatingError, SeatingManager},
    time::TimeSource,
    tournament::{BountyKind, EventBus, PlayerId, TournamentConfig, TournamentEvent, TournamentId},
};
use std::sync::Arc;

/// Ledger manager
///
/// Owns the entry state machine. After every mutation the clock's player
/// counters are recomputed from the stored entries.
#[derive(Clone)]
pub struct LedgerManager {
    ledger: Arc<dyn LedgerRepository>,
    configs: Arc<dyn ConfigRepository>,
    clock: ClockManager,
    seating: SeatingManager,
    time: Arc<dyn TimeSource>,
    events: EventBus,
}

impl LedgerManager {
    /// Create a new ledger manager
    pub fn new(
        ledger: Arc<dyn LedgerRepository>,
        configs: Arc<dyn ConfigRepository>,
        clock: ClockManager,
        seating: SeatingManager,
        time: Arc<dyn TimeSource>,
        events: EventBus,
    ) -> Self {
        Self {
            ledger,
            configs,
            clock,
            seating,
            time,
            events,
        }
    }

    /// Register a player's first entry
    ///
    /// `paid_amount` defaults to the buy-in. Once the clock has started the
    /// late registration cutoff applies and the new entry is auto-seated.
    pub async fn add_player(
        &self,
        tournament_id: TournamentId,
        player_id: PlayerId,
        paid_amount: Option<Cents>,
    ) -> LedgerResult<PlayerEntry> {
        let config = self.config(tournament_id).await?;
        let clock = self.clock.get_state(tournament_id).await?;

        let started = match &clock {
            Some(state) if state.is_finished() => {
                return Err(LedgerError::TournamentFinished(tournament_id));
            }
            Some(state) if state.status.is_in_progress() => {
                if let Some(cutoff) = config.late_registration_until_level
                    && state.current_level > cutoff
                {
                    return Err(LedgerError::LateRegistrationClosed(cutoff));
                }
                true
            }
            _ => false,
        };

        if !self
            .ledger
            .player_entries(tournament_id, player_id)
            .await?
            .is_empty()
        {
            return Err(LedgerError::AlreadyRegistered(player_id));
        }

        let mut entry = PlayerEntry::new(
            tournament_id,
            player_id,
            1,
            config.starting_chips,
            paid_amount.unwrap_or(config.buy_in),
            self.time.now(),
        );
        if config.bounty.is_active() {
            entry.bounty_amount = config.bounty.amount;
        }
        let mut entry = self.ledger.insert_entry(&entry).await?;

        self.ledger
            .record_transaction(&LedgerTransaction::new(
                &entry,
                TransactionKind::BuyIn,
                entry.paid_amount,
                entry.chip_count,
                self.time.now(),
            ))
            .await?;

        log::info!(
            "Tournament {}: registered player {} (entry {})",
            tournament_id,
            player_id,
            entry.id
        );
        self.events.publish(TournamentEvent::PlayerRegistered {
            tournament_id,
            player_id,
            entry_id: entry.id,
        });

        if started {
            entry.seat_assignment = self.try_auto_seat(tournament_id, player_id).await?;
        }
        self.refresh_counts(tournament_id).await?;
        Ok(entry)
    }

    /// Remove a player before the tournament starts
    pub async fn remove_player(&self, tournament_id: TournamentId, player_id: PlayerId) -> LedgerResult<()> {
        if let Some(status) = self.clock.status(tournament_id).await?
            && status != ClockStatus::Setup
        {
            return Err(LedgerError::TournamentAlreadyStarted(tournament_id));
        }

        let entries = self.ledger.player_entries(tournament_id, player_id).await?;
        if entries.is_empty() {
            return Err(LedgerError::NotRegistered(player_id));
        }

        self.release_seat(tournament_id, player_id).await?;
        for entry in &entries {
            self.ledger
                .record_transaction(
                    &LedgerTransaction::new(
                        entry,
                        TransactionKind::Withdrawal,
                        -entry.paid_amount,
                        -entry.chip_count,
                        self.time.now(),
                    )
                    .with_note("removed before start"),
                )
                .await?;
        }
        self.ledger
            .delete_player_entries(tournament_id, player_id)
            .await?;

        log::info!("Tournament {}: removed player {}", tournament_id, player_id);
        self.events.publish(TournamentEvent::PlayerRemoved {
            tournament_id,
            player_id,
        });
        self.refresh_counts(tournament_id).await?;
        Ok(())
    }

    /// Operator status override
    ///
    /// Only registered, paid, active and checked-in can be set here.
    pub async fn update_player_status(&self, entry_id: EntryId, status: EntryStatus) -> LedgerResult<PlayerEntry> {
        if !status.is_admin_settable() {
            return Err(LedgerError::InvalidStatusChange(status));
        }

        let mut entry = self.entry(entry_id).await?;
        if entry.status == EntryStatus::Completed {
            return Err(LedgerError::TournamentFinished(entry.tournament_id));
        }

        entry.status = status;
        self.ledger.update_entry(&entry).await?;
        if !entry.is_in_play() {
            self.release_seat(entry.tournament_id, entry.player_id).await?;
            entry.seat_assignment = None;
        }

        log::info!(
            "Tournament {}: entry {} set to {}",
            entry.tournament_id,
            entry_id,
            status
        );
        self.refresh_counts(entry.tournament_id).await?;
        Ok(entry)
    }

    /// Record a new chip count for an entry
    pub async fn update_chip_count(&self, entry_id: EntryId, chips: i64) -> LedgerResult<PlayerEntry> {
        if chips < 0 {
            return Err(LedgerError::InvalidChips(chips));
        }

        let mut entry = self.entry(entry_id).await?;
        if entry.status == EntryStatus::Completed {
            return Err(LedgerError::TournamentFinished(entry.tournament_id));
        }

        entry.chip_count = chips;
        self.ledger.update_entry(&entry).await?;
        Ok(entry)
    }

    /// Bust an entry out of the tournament
    ///
    /// The in-play count before the bust is the entry's place. It becomes
    /// final right away when no re-entry is possible, otherwise it is kept
    /// pending until the player declines. The eliminator collects the bounty
    /// and a knockout. When a single entry remains in play and nobody can
    /// still re-enter, that entry wins and the tournament is finished.
    pub async fn bust_player(
        &self,
        tournament_id: TournamentId,
        player_id: PlayerId,
        entry_number: u32,
        eliminated_by: Option<PlayerId>,
    ) -> LedgerResult<BustOutcome> {
        let level = self.running_level(tournament_id).await?;
        let config = self.config(tournament_id).await?;
        let entries = self.ledger.tournament_entries(tournament_id).await?;

        let mut busted = entries
            .iter()
            .find(|e| e.player_id == player_id && e.entry_number == entry_number)
            .cloned()
            .ok_or(LedgerError::EntryNotFound {
                player_id,
                entry_number,
            })?;
        if !busted.is_in_play() {
            return Err(LedgerError::EntryNotInPlay {
                entry_id: busted.id,
                status: busted.status,
            });
        }

        let active_before = entries.iter().filter(|e| e.is_in_play()).count() as u32;
        if active_before <= 1 {
            return Err(LedgerError::CannotBustLastPlayer);
        }

        let eliminator = match eliminated_by {
            Some(eliminator_id) => Some(
                entries
                    .iter()
                    .find(|e| e.player_id == eliminator_id && eliminator_id != player_id && e.is_in_play())
                    .cloned()
                    .ok_or(LedgerError::NotRegistered(eliminator_id))?,
            ),
            None => None,
        };

        let player_entry_count = entries.iter().filter(|e| e.player_id == player_id).count();
        let can_reentry =
            config.reentry.is_open_at(level) && config.reentry.has_entries_left(player_entry_count);

        busted.status = EntryStatus::Eliminated;
        busted.chip_count = 0;
        busted.elimination_time = Some(self.time.now());
        busted.eliminated_by_player_id = eliminated_by;
        if can_reentry {
            busted.pending_position = Some(active_before);
        } else {
            busted.finish_position = Some(active_before);
        }
        self.ledger.update_entry(&busted).await?;
        self.release_seat(tournament_id, player_id).await?;

        let bounty_earned = match eliminator {
            Some(eliminator) => self.award_bounty(&config, &busted, eliminator).await?,
            None => 0,
        };

        log::info!(
            "Tournament {}: player {} (entry {}) busted at level {}, place {}{}",
            tournament_id,
            player_id,
            entry_number,
            level,
            active_before,
            if can_reentry { " pending re-entry" } else { "" }
        );
        self.events.publish(TournamentEvent::PlayerBusted {
            tournament_id,
            player_id,
            entry_number,
            eliminated_by,
            finish_position: busted.finish_position,
            can_reentry,
        });

        let winner = self.check_completion(tournament_id, &config, level).await?;
        self.refresh_counts(tournament_id).await?;

        let message = if can_reentry {
            format!("Player {} eliminated, re-entry available", player_id)
        } else {
            format!("Player {} eliminated in place {}", player_id, active_before)
        };
        Ok(BustOutcome {
            message,
            can_reentry,
            finish_position: busted.finish_position,
            bounty_earned,
            remaining_count: active_before - 1,
            tournament_completed: winner.is_some(),
        })
    }

    /// Pay the bounty of `busted` to `eliminator`; returns the amount paid
    ///
    /// Fixed bounties pay in full. Progressive bounties pay their
    /// percentage and add the rest to the eliminator's own bounty.
    async fn award_bounty(
        &self,
        config: &TournamentConfig,
        busted: &PlayerEntry,
        mut eliminator: PlayerEntry,
    ) -> LedgerResult<Cents> {
        eliminator.knockouts += 1;

        let value = busted.bounty_amount;
        let (earned, carried) = match config.bounty.kind {
            BountyKind::None => (0, 0),
            BountyKind::Fixed => (value, 0),
            BountyKind::Pko => {
                let earned = percent_of(value, config.bounty.pko_percentage);
                (earned, value - earned)
            }
        };
        eliminator.bounties_earned += earned;
        eliminator.bounty_amount += carried;
        self.ledger.update_entry(&eliminator).await?;

        if value > 0 && config.bounty.is_active() {
            self.ledger
                .record_transaction(
                    &LedgerTransaction::new(
                        &eliminator,
                        TransactionKind::Bounty,
                        earned,
                        0,
                        self.time.now(),
                    )
                    .with_note(format!(
                        "eliminated player {}, {} carried forward",
                        busted.player_id, carried
                    )),
                )
                .await?;

            log::info!(
                "Tournament {}: player {} collects bounty {} on player {} ({} carried forward)",
                busted.tournament_id,
                eliminator.player_id,
                earned,
                busted.player_id,
                carried
            );
            self.events.publish(TournamentEvent::BountyAwarded {
                tournament_id: busted.tournament_id,
                eliminator_id: eliminator.player_id,
                eliminated_id: busted.player_id,
                amount: earned,
                carried_forward: carried,
            });
        }
        Ok(earned)
    }

    /// Buy a busted player back in with a new entry
    pub async fn reentry_player(&self, tournament_id: TournamentId, player_id: PlayerId) -> LedgerResult<PlayerEntry> {
        let level = self.running_level(tournament_id).await?;
        let config = self.config(tournament_id).await?;

        if !config.reentry.allow {
            return Err(LedgerError::ReentryNotAllowed);
        }
        if let Some(cutoff) = config.reentry.until_level
            && level > cutoff
        {
            return Err(LedgerError::ReentryClosed(cutoff));
        }

        let entries = self.ledger.player_entries(tournament_id, player_id).await?;
        let (Some(first), Some(latest)) = (entries.first(), entries.last()) else {
            return Err(LedgerError::NotRegistered(player_id));
        };
        if entries.iter().any(|e| e.is_in_play()) {
            return Err(LedgerError::PlayerStillActive(player_id));
        }
        if latest.withdrawal_status != WithdrawalStatus::Active {
            return Err(LedgerError::ReentryDeclined(player_id));
        }
        if !config.reentry.has_entries_left(entries.len()) {
            return Err(LedgerError::ReentryLimitReached(
                config.reentry.limit.unwrap_or_default(),
            ));
        }

        // Clear any seat left over from an earlier entry
        self.release_seat(tournament_id, player_id).await?;

        let mut entry = PlayerEntry::new(
            tournament_id,
            player_id,
            entries.len() as u32 + 1,
            config.reentry_chips(),
            config.reentry_cost(),
            self.time.now(),
        );
        entry.original_entry_id = Some(first.id);
        if config.bounty.is_active() {
            entry.bounty_amount = config.bounty.amount;
        }
        let mut entry = self.ledger.insert_entry(&entry).await?;

        self.ledger
            .record_transaction(&LedgerTransaction::new(
                &entry,
                TransactionKind::Reentry,
                entry.paid_amount,
                entry.chip_count,
                self.time.now(),
            ))
            .await?;

        log::info!(
            "Tournament {}: player {} re-entered (entry {})",
            tournament_id,
            player_id,
            entry.entry_number
        );
        self.events.publish(TournamentEvent::PlayerReentered {
            tournament_id,
            player_id,
            entry_number: entry.entry_number,
        });

        entry.seat_assignment = self.try_auto_seat(tournament_id, player_id).await?;
        self.refresh_counts(tournament_id).await?;
        Ok(entry)
    }

    /// Add rebuy chips to the player's entry in play
    pub async fn process_rebuy(&self, tournament_id: TournamentId, player_id: PlayerId) -> LedgerResult<PlayerEntry> {
        let level = self.running_level(tournament_id).await?;
        let config = self.config(tournament_id).await?;
        let policy = &config.rebuy;

        if !policy.allow {
            return Err(LedgerError::RebuyNotAllowed);
        }
        if let Some(cutoff) = policy.until_level
            && level > cutoff
        {
            return Err(LedgerError::RebuyClosed(cutoff));
        }

        let mut entry = self.entry_in_play(tournament_id, player_id).await?;
        if let Some(limit) = policy.limit
            && entry.rebuys_count >= limit
        {
            return Err(LedgerError::RebuyLimitReached(limit));
        }

        entry.chip_count += policy.chips;
        entry.paid_amount += policy.cost;
        entry.rebuys_count += 1;
        self.ledger.update_entry(&entry).await?;
        self.ledger
            .record_transaction(&LedgerTransaction::new(
                &entry,
                TransactionKind::Rebuy,
                policy.cost,
                policy.chips,
                self.time.now(),
            ))
            .await?;

        log::info!(
            "Tournament {}: player {} rebuy #{}",
            tournament_id,
            player_id,
            entry.rebuys_count
        );
        self.events.publish(TournamentEvent::RebuyProcessed {
            tournament_id,
            player_id,
            chips: policy.chips,
            amount: policy.cost,
        });
        Ok(entry)
    }

    /// Add add-on chips to the player's entry in play
    pub async fn process_addon(&self, tournament_id: TournamentId, player_id: PlayerId) -> LedgerResult<PlayerEntry> {
        let level = self.running_level(tournament_id).await?;
        let config = self.config(tournament_id).await?;
        let policy = &config.addon;

        if !policy.allow {
            return Err(LedgerError::AddonNotAllowed);
        }
        if level < policy.at_level {
            return Err(LedgerError::AddonNotOpen(policy.at_level));
        }
        if level > policy.last_level() {
            return Err(LedgerError::AddonClosed(policy.last_level()));
        }

        let mut entry = self.entry_in_play(tournament_id, player_id).await?;
        if entry.addons_count >= policy.limit {
            return Err(LedgerError::AddonLimitReached(policy.limit));
        }

        entry.chip_count += policy.chips;
        entry.paid_amount += policy.cost;
        entry.addons_count += 1;
        self.ledger.update_entry(&entry).await?;
        self.ledger
            .record_transaction(&LedgerTransaction::new(
                &entry,
                TransactionKind::Addon,
                policy.cost,
                policy.chips,
                self.time.now(),
            ))
            .await?;

        log::info!("Tournament {}: player {} add-on", tournament_id, player_id);
        self.events.publish(TournamentEvent::AddonProcessed {
            tournament_id,
            player_id,
            chips: policy.chips,
            amount: policy.cost,
        });
        Ok(entry)
    }

    /// Turn a pending re-entry into a final elimination
    pub async fn process_declined_reentry(
        &self,
        tournament_id: TournamentId,
        player_id: PlayerId,
    ) -> LedgerResult<DeclineOutcome> {
        let state = self
            .clock
            .get_state(tournament_id)
            .await?
            .ok_or(LedgerError::TournamentNotFound(tournament_id))?;
        if state.is_finished() {
            return Err(LedgerError::TournamentFinished(tournament_id));
        }
        let config = self.config(tournament_id).await?;

        let entries = self.ledger.player_entries(tournament_id, player_id).await?;
        if entries.is_empty() {
            return Err(LedgerError::NotRegistered(player_id));
        }
        if entries.iter().any(|e| e.is_in_play()) {
            return Err(LedgerError::PlayerStillActive(player_id));
        }
        let mut entry = entries
            .last()
            .filter(|e| e.is_pending_reentry())
            .cloned()
            .ok_or(LedgerError::NoPendingReentry(player_id))?;

        entry.withdrawal_status = WithdrawalStatus::DeclinedReentry;
        entry.finish_position = entry.pending_position;
        self.ledger.update_entry(&entry).await?;
        self.ledger
            .record_transaction(&LedgerTransaction::new(
                &entry,
                TransactionKind::DeclinedReentry,
                0,
                0,
                self.time.now(),
            ))
            .await?;

        log::info!(
            "Tournament {}: player {} declined re-entry, final place {:?}",
            tournament_id,
            player_id,
            entry.finish_position
        );
        self.events.publish(TournamentEvent::ReentryDeclined {
            tournament_id,
            player_id,
            finish_position: entry.finish_position,
        });

        let winner = self
            .check_completion(tournament_id, &config, state.current_level)
            .await?;
        self.refresh_counts(tournament_id).await?;

        Ok(DeclineOutcome {
            entry_id: entry.id,
            finish_position: entry.finish_position,
            tournament_completed: winner.is_some(),
        })
    }

    /// Finish the clock and close the ledger
    pub async fn finish_tournament(&self, tournament_id: TournamentId) -> LedgerResult<()> {
        self.clock.finish(tournament_id).await?;
        self.finalize_tournament(tournament_id).await
    }

    /// Close the ledger of a finished tournament
    ///
    /// Undecided re-entries get their pending place and every entry becomes
    /// `completed`.
    pub async fn finalize_tournament(&self, tournament_id: TournamentId) -> LedgerResult<()> {
        let entries = self.ledger.tournament_entries(tournament_id).await?;
        let undecided: Vec<EntryId> = awaiting_decision(&entries).map(|e| e.id).collect();

        let mut winner = None;
        for mut entry in entries {
            if undecided.contains(&entry.id) {
                entry.finish_position = entry.pending_position;
            }
            if entry.finish_position == Some(1) {
                winner = Some(entry.player_id);
            }
            if entry.seat_assignment.is_some() {
                self.release_seat(tournament_id, entry.player_id).await?;
                entry.seat_assignment = None;
            }
            entry.status = EntryStatus::Completed;
            self.ledger.update_entry(&entry).await?;
        }

        log::info!(
            "Tournament {}: ledger closed, winner {:?}",
            tournament_id,
            winner
        );
        self.events.publish(TournamentEvent::TournamentCompleted {
            tournament_id,
            winner,
        });
        self.refresh_counts(tournament_id).await?;
        Ok(())
    }

    /// Entries of a tournament, optionally filtered by status
    pub async fn get_tournament_players(
        &self,
        tournament_id: TournamentId,
        status: Option<EntryStatus>,
    ) -> LedgerResult<Vec<PlayerEntry>> {
        let entries = self.ledger.tournament_entries(tournament_id).await?;
        Ok(match status {
            Some(status) => entries.into_iter().filter(|e| e.status == status).collect(),
            None => entries,
        })
    }

    /// Entries with a final place, best place first
    pub async fn get_final_standings(&self, tournament_id: TournamentId) -> LedgerResult<Vec<PlayerEntry>> {
        let mut standings: Vec<PlayerEntry> = self
            .ledger
            .tournament_entries(tournament_id)
            .await?
            .into_iter()
            .filter(|e| e.finish_position.is_some())
            .collect();
        standings.sort_by_key(|e| e.finish_position);
        Ok(standings)
    }

    /// Eliminated entries in bust order
    pub async fn get_bustout_timeline(&self, tournament_id: TournamentId) -> LedgerResult<Vec<PlayerEntry>> {
        let mut timeline: Vec<PlayerEntry> = self
            .ledger
            .tournament_entries(tournament_id)
            .await?
            .into_iter()
            .filter(|e| e.elimination_time.is_some())
            .collect();
        timeline.sort_by_key(|e| (e.elimination_time, e.id));
        Ok(timeline)
    }

    /// Transaction log, oldest first
    pub async fn get_transactions(&self, tournament_id: TournamentId) -> LedgerResult<Vec<LedgerTransaction>> {
        Ok(self.ledger.transactions(tournament_id).await?)
    }

    /// Declare the winner when one entry is left and nobody can re-enter
    async fn check_completion(
        &self,
        tournament_id: TournamentId,
        config: &TournamentConfig,
        level: u32,
    ) -> LedgerResult<Option<PlayerId>> {
        let entries = self.ledger.tournament_entries(tournament_id).await?;
        let in_play: Vec<&PlayerEntry> = entries.iter().filter(|e| e.is_in_play()).collect();
        if in_play.len() != 1 {
            return Ok(None);
        }

        let reentry_pending = config.reentry.is_open_at(level)
            && awaiting_decision(&entries).any(|pending| {
                let count = entries
                    .iter()
                    .filter(|e| e.player_id == pending.player_id)
                    .count();
                config.reentry.has_entries_left(count)
            });
        if reentry_pending {
            return Ok(None);
        }

        let mut winner = in_play[0].clone();
        winner.finish_position = Some(1);
        self.ledger.update_entry(&winner).await?;

        log::info!(
            "Tournament {}: player {} wins",
            tournament_id,
            winner.player_id
        );
        self.clock.finish(tournament_id).await?;
        self.finalize_tournament(tournament_id).await?;
        Ok(Some(winner.player_id))
    }

    /// Recompute the clock's player counters from the ledger
    async fn refresh_counts(&self, tournament_id: TournamentId) -> LedgerResult<()> {
        let entries = self.ledger.tournament_entries(tournament_id).await?;
        let in_play = entries.iter().filter(|e| e.is_in_play()).count();
        let remaining = in_play + awaiting_decision(&entries).count();
        self.clock
            .update_player_counts(tournament_id, entries.len() as u32, remaining as u32)
            .await?;
        Ok(())
    }

    /// Current level, failing unless the clock is running, paused or on a break
    async fn running_level(&self, tournament_id: TournamentId) -> LedgerResult<u32> {
        let state = self
            .clock
            .get_state(tournament_id)
            .await?
            .ok_or(LedgerError::TournamentNotFound(tournament_id))?;
        match state.status {
            ClockStatus::Finished => Err(LedgerError::TournamentFinished(tournament_id)),
            status if status.is_in_progress() => Ok(state.current_level),
            status => Err(LedgerError::TournamentNotRunning {
                tournament_id,
                status,
            }),
        }
    }

    async fn config(&self, tournament_id: TournamentId) -> LedgerResult<TournamentConfig> {
        self.configs
            .get_config(tournament_id)
            .await?
            .ok_or(LedgerError::ConfigNotFound(tournament_id))
    }

    async fn entry(&self, entry_id: EntryId) -> LedgerResult<PlayerEntry> {
        self.ledger
            .get_entry(entry_id)
            .await?
            .ok_or(LedgerError::UnknownEntry(entry_id))
    }

    async fn entry_in_play(&self, tournament_id: TournamentId, player_id: PlayerId) -> LedgerResult<PlayerEntry> {
        let entries = self.ledger.player_entries(tournament_id, player_id).await?;
        let Some(latest) = entries.last() else {
            return Err(LedgerError::NotRegistered(player_id));
        };
        if !latest.is_in_play() {
            return Err(LedgerError::EntryNotInPlay {
                entry_id: latest.id,
                status: latest.status,
            });
        }
        Ok(latest.clone())
    }

    /// Auto-seat, tolerating a full room
    async fn try_auto_seat(&self, tournament_id: TournamentId, player_id: PlayerId) -> LedgerResult<Option<SeatRef>> {
        match self.seating.auto_seat_player(tournament_id, player_id).await {
            Ok(seat) => Ok(Some(seat)),
            Err(SeatingError::Storage(e)) => Err(e.into()),
            Err(e) => {
                log::warn!(
                    "Tournament {}: could not seat player {}: {}",
                    tournament_id,
                    player_id,
                    e
                );
                Ok(None)
            }
        }
    }

    async fn release_seat(&self, tournament_id: TournamentId, player_id: PlayerId) -> LedgerResult<()> {
        match self.seating.unseat_player(tournament_id, player_id).await {
            Ok(_) => Ok(()),
            Err(SeatingError::Storage(e)) => Err(e.into()),
            Err(e) => {
                log::warn!(
                    "Tournament {}: could not unseat player {}: {}",
                    tournament_id,
                    player_id,
                    e
                );
                Ok(())
            }
        }
    }
}

/// Eliminated entries whose player has not yet re-entered or declined
fn awaiting_decision(entries: &[PlayerEntry]) -> impl Iterator<Item = &PlayerEntry> {
    entries.iter().filter(|e| {
        e.is_pending_reentry()
            && !entries
                .iter()
                .any(|o| o.player_id == e.player_id && o.entry_number > e.entry_number)
    })
}
