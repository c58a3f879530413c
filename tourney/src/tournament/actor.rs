//! Tournament actor: the single writer of one tournament.

use super::{
    PlayerId, TournamentConfig, TournamentId,
    engine::TournamentEngine,
    errors::{ConfigError, TournamentError, TournamentResult},
    messages::{ClockCommand, Reply, SeatDraw, TournamentMessage},
};
use crate::{
    clock::ClockState,
    ledger::{BustOutcome, DeclineOutcome, EntryId, EntryStatus, PlayerEntry},
    prize::Cents,
    seating::{BalanceMove, BalancePlan, ExecutionReport, SeatRef, TableBreakPlan, TableId, TableLayout},
};
use tokio::sync::{mpsc, oneshot};

/// Tournament actor handle for sending messages
#[derive(Clone)]
pub struct TournamentHandle {
    sender: mpsc::Sender<TournamentMessage>,
    tournament_id: TournamentId,
}

impl TournamentHandle {
    /// Create a new tournament handle
    pub fn new(sender: mpsc::Sender<TournamentMessage>, tournament_id: TournamentId) -> Self {
        Self {
            sender,
            tournament_id,
        }
    }

    pub fn tournament_id(&self) -> TournamentId {
        self.tournament_id
    }

    /// Whether the actor has stopped
    pub fn is_closed(&self) -> bool {
        self.sender.is_closed()
    }

    /// Send a message to the tournament
    pub async fn send(&self, message: TournamentMessage) -> TournamentResult<()> {
        self.sender
            .send(message)
            .await
            .map_err(|_| TournamentError::Unavailable(self.tournament_id))
    }

    /// Send a command and wait for its reply
    async fn request<T>(&self, build: impl FnOnce(Reply<T>) -> TournamentMessage) -> TournamentResult<T> {
        let (tx, rx) = oneshot::channel();
        self.send(build(tx)).await?;
        rx.await
            .map_err(|_| TournamentError::Unavailable(self.tournament_id))?
    }

    pub async fn register_config(&self, config: TournamentConfig) -> TournamentResult<()> {
        self.request(|response| TournamentMessage::RegisterConfig {
            config: Box::new(config),
            response,
        })
        .await
    }

    pub async fn clock(&self, command: ClockCommand) -> TournamentResult<ClockState> {
        self.request(|response| TournamentMessage::Clock { command, response })
            .await
    }

    pub async fn delete_clock(&self) -> TournamentResult<bool> {
        self.request(|response| TournamentMessage::DeleteClock { response })
            .await
    }

    pub async fn add_player(&self, player_id: PlayerId, paid_amount: Option<Cents>) -> TournamentResult<PlayerEntry> {
        self.request(|response| TournamentMessage::AddPlayer {
            player_id,
            paid_amount,
            response,
        })
        .await
    }

    pub async fn remove_player(&self, player_id: PlayerId) -> TournamentResult<()> {
        self.request(|response| TournamentMessage::RemovePlayer {
            player_id,
            response,
        })
        .await
    }

    pub async fn update_player_status(&self, entry_id: EntryId, status: EntryStatus) -> TournamentResult<PlayerEntry> {
        self.request(|response| TournamentMessage::UpdatePlayerStatus {
            entry_id,
            status,
            response,
        })
        .await
    }

    pub async fn update_chip_count(&self, entry_id: EntryId, chips: i64) -> TournamentResult<PlayerEntry> {
        self.request(|response| TournamentMessage::UpdateChipCount {
            entry_id,
            chips,
            response,
        })
        .await
    }

    pub async fn bust_player(
        &self,
        player_id: PlayerId,
        entry_number: u32,
        eliminated_by: Option<PlayerId>,
    ) -> TournamentResult<BustOutcome> {
        self.request(|response| TournamentMessage::BustPlayer {
            player_id,
            entry_number,
            eliminated_by,
            response,
        })
        .await
    }

    pub async fn reentry_player(&self, player_id: PlayerId) -> TournamentResult<PlayerEntry> {
        self.request(|response| TournamentMessage::Reentry {
            player_id,
            response,
        })
        .await
    }

    pub async fn process_rebuy(&self, player_id: PlayerId) -> TournamentResult<PlayerEntry> {
        self.request(|response| TournamentMessage::Rebuy {
            player_id,
            response,
        })
        .await
    }

    pub async fn process_addon(&self, player_id: PlayerId) -> TournamentResult<PlayerEntry> {
        self.request(|response| TournamentMessage::Addon {
            player_id,
            response,
        })
        .await
    }

    pub async fn process_declined_reentry(&self, player_id: PlayerId) -> TournamentResult<DeclineOutcome> {
        self.request(|response| TournamentMessage::DeclineReentry {
            player_id,
            response,
        })
        .await
    }

    pub async fn add_table(&self, max_seats: Option<u8>) -> TournamentResult<TableLayout> {
        self.request(|response| TournamentMessage::AddTable {
            max_seats,
            response,
        })
        .await
    }

    pub async fn remove_table(&self, table_id: TableId) -> TournamentResult<()> {
        self.request(|response| TournamentMessage::RemoveTable { table_id, response })
            .await
    }

    pub async fn move_player(&self, player_id: PlayerId, to_table: TableId, to_seat: u8) -> TournamentResult<BalanceMove> {
        self.request(|response| TournamentMessage::MovePlayer {
            player_id,
            to_table,
            to_seat,
            response,
        })
        .await
    }

    pub async fn unseat_player(&self, player_id: PlayerId) -> TournamentResult<Option<SeatRef>> {
        self.request(|response| TournamentMessage::UnseatPlayer {
            player_id,
            response,
        })
        .await
    }

    pub async fn auto_seat_player(&self, player_id: PlayerId) -> TournamentResult<SeatRef> {
        self.request(|response| TournamentMessage::AutoSeat {
            player_id,
            response,
        })
        .await
    }

    pub async fn seat_all_players(&self, seed: Option<u64>) -> TournamentResult<SeatDraw> {
        self.request(|response| TournamentMessage::SeatAll { seed, response })
            .await
    }

    pub async fn execute_balance(&self, plan: BalancePlan) -> TournamentResult<ExecutionReport> {
        self.request(|response| TournamentMessage::ExecuteBalance { plan, response })
            .await
    }

    pub async fn execute_table_break(&self, plan: TableBreakPlan) -> TournamentResult<ExecutionReport> {
        self.request(|response| TournamentMessage::ExecuteTableBreak { plan, response })
            .await
    }

    /// Ask the actor to stop once the queued messages are handled
    pub async fn shutdown(&self) -> TournamentResult<()> {
        self.send(TournamentMessage::Shutdown).await
    }
}

/// Tournament actor owning every mutation of a single tournament
pub struct TournamentActor {
    /// Tournament ID
    id: TournamentId,

    /// Shared managers
    engine: TournamentEngine,

    /// Table size used when a command does not give one
    default_max_seats: u8,

    /// Message inbox
    inbox: mpsc::Receiver<TournamentMessage>,
}

impl TournamentActor {
    /// Create a new tournament actor
    ///
    /// # Returns
    ///
    /// * `(TournamentActor, TournamentHandle)` - Actor and handle for sending messages
    pub fn new(
        id: TournamentId,
        engine: TournamentEngine,
        default_max_seats: u8,
        inbox_capacity: usize,
    ) -> (Self, TournamentHandle) {
        let (sender, inbox) = mpsc::channel(inbox_capacity.max(1));

        let actor = Self {
            id,
            engine,
            default_max_seats,
            inbox,
        };

        (actor, TournamentHandle::new(sender, id))
    }

    /// Run the tournament actor event loop
    pub async fn run(mut self) {
        log::info!("Tournament {} actor starting", self.id);

        while let Some(message) = self.inbox.recv().await {
            if matches!(message, TournamentMessage::Shutdown) {
                break;
            }
            self.handle_message(message).await;
        }

        log::info!("Tournament {} actor stopped", self.id);
    }

    /// Handle a tournament message
    async fn handle_message(&mut self, message: TournamentMessage) {
        let id = self.id;
        let engine = &self.engine;

        match message {
            TournamentMessage::RegisterConfig { config, response } => {
                let result = if config.tournament_id == id {
                    engine.register_config(&config).await
                } else {
                    Err(ConfigError::Invalid(format!(
                        "Configuration is for tournament {}, not {}",
                        config.tournament_id, id
                    ))
                    .into())
                };
                let _ = response.send(result);
            }

            TournamentMessage::Clock { command, response } => {
                let result = self.handle_clock(command).await;
                let _ = response.send(result);
            }

            TournamentMessage::DeleteClock { response } => {
                let result = engine.clock().delete(id).await.map_err(Into::into);
                let _ = response.send(result);
            }

            TournamentMessage::AddPlayer {
                player_id,
                paid_amount,
                response,
            } => {
                let result = engine
                    .ledger()
                    .add_player(id, player_id, paid_amount)
                    .await
                    .map_err(Into::into);
                let _ = response.send(result);
            }

            TournamentMessage::RemovePlayer {
                player_id,
                response,
            } => {
                let result = engine
                    .ledger()
                    .remove_player(id, player_id)
                    .await
                    .map_err(Into::into);
                let _ = response.send(result);
            }

            TournamentMessage::UpdatePlayerStatus {
                entry_id,
                status,
                response,
            } => {
                let result = engine
                    .ledger()
                    .update_player_status(entry_id, status)
                    .await
                    .map_err(Into::into);
                let _ = response.send(result);
            }

            TournamentMessage::UpdateChipCount {
                entry_id,
                chips,
                response,
            } => {
                let result = engine
                    .ledger()
                    .update_chip_count(entry_id, chips)
                    .await
                    .map_err(Into::into);
                let _ = response.send(result);
            }

            TournamentMessage::BustPlayer {
                player_id,
                entry_number,
                eliminated_by,
                response,
            } => {
                let result = engine
                    .ledger()
                    .bust_player(id, player_id, entry_number, eliminated_by)
                    .await
                    .map_err(Into::into);
                let _ = response.send(result);
            }

            TournamentMessage::Reentry {
                player_id,
                response,
            } => {
                let result = engine
                    .ledger()
                    .reentry_player(id, player_id)
                    .await
                    .map_err(Into::into);
                let _ = response.send(result);
            }

            TournamentMessage::Rebuy {
                player_id,
                response,
            } => {
                let result = engine
                    .ledger()
                    .process_rebuy(id, player_id)
                    .await
                    .map_err(Into::into);
                let _ = response.send(result);
            }

            TournamentMessage::Addon {
                player_id,
                response,
            } => {
                let result = engine
                    .ledger()
                    .process_addon(id, player_id)
                    .await
                    .map_err(Into::into);
                let _ = response.send(result);
            }

            TournamentMessage::DeclineReentry {
                player_id,
                response,
            } => {
                let result = engine
                    .ledger()
                    .process_declined_reentry(id, player_id)
                    .await
                    .map_err(Into::into);
                let _ = response.send(result);
            }

            TournamentMessage::AddTable {
                max_seats,
                response,
            } => {
                let result = engine
                    .seating()
                    .add_table(id, max_seats.unwrap_or(self.default_max_seats))
                    .await
                    .map_err(Into::into);
                let _ = response.send(result);
            }

            TournamentMessage::RemoveTable { table_id, response } => {
                let result = engine
                    .seating()
                    .remove_table(id, table_id)
                    .await
                    .map_err(Into::into);
                let _ = response.send(result);
            }

            TournamentMessage::MovePlayer {
                player_id,
                to_table,
                to_seat,
                response,
            } => {
                let result = engine
                    .seating()
                    .move_player(id, player_id, to_table, to_seat)
                    .await
                    .map_err(Into::into);
                let _ = response.send(result);
            }

            TournamentMessage::UnseatPlayer {
                player_id,
                response,
            } => {
                let result = engine
                    .seating()
                    .unseat_player(id, player_id)
                    .await
                    .map_err(Into::into);
                let _ = response.send(result);
            }

            TournamentMessage::AutoSeat {
                player_id,
                response,
            } => {
                let result = engine
                    .seating()
                    .auto_seat_player(id, player_id)
                    .await
                    .map_err(Into::into);
                let _ = response.send(result);
            }

            TournamentMessage::SeatAll { seed, response } => {
                let result = engine
                    .seating()
                    .seat_all_players(id, seed)
                    .await
                    .map_err(Into::into);
                let _ = response.send(result);
            }

            TournamentMessage::ExecuteBalance { plan, response } => {
                let result = engine
                    .seating()
                    .execute_balance(id, &plan)
                    .await
                    .map_err(Into::into);
                let _ = response.send(result);
            }

            TournamentMessage::ExecuteTableBreak { plan, response } => {
                let result = engine
                    .seating()
                    .execute_table_break(id, &plan)
                    .await
                    .map_err(Into::into);
                let _ = response.send(result);
            }

            TournamentMessage::Shutdown => {}
        }
    }

    async fn handle_clock(&self, command: ClockCommand) -> TournamentResult<ClockState> {
        let id = self.id;
        let clock = self.engine.clock();

        let state = match command {
            ClockCommand::Initialize { template_id } => clock.initialize(id, template_id).await?,
            ClockCommand::Start {
                duration_secs: Some(duration),
            } => clock.start(id, duration).await?,
            ClockCommand::Start { duration_secs: None } => clock.start_default(id).await?,
            ClockCommand::Pause { time_remaining } => clock.pause(id, time_remaining).await?,
            ClockCommand::Resume => clock.resume(id).await?,
            ClockCommand::AdvanceLevel {
                duration_secs: Some(duration),
            } => clock.advance_level(id, duration).await?,
            ClockCommand::AdvanceLevel { duration_secs: None } => {
                clock.advance_to_next_level(id).await?
            }
            ClockCommand::StartBreak { minutes: Some(minutes) } => {
                clock.start_break(id, minutes).await?
            }
            ClockCommand::StartBreak { minutes: None } => {
                let level = clock.require_state(id).await?.current_level;
                let minutes = clock
                    .level_info(id, level)
                    .await?
                    .break_after_mins
                    .ok_or_else(|| {
                        ConfigError::Invalid(format!("No break scheduled after level {}", level))
                    })?;
                clock.start_break(id, i64::from(minutes)).await?
            }
            ClockCommand::EndBreak {
                duration_secs: Some(duration),
            } => clock.end_break(id, duration).await?,
            ClockCommand::EndBreak { duration_secs: None } => clock.end_break_auto(id).await?,
            ClockCommand::AddTime { seconds } => clock.add_time(id, seconds).await?,
            ClockCommand::Finish => {
                self.engine.ledger().finish_tournament(id).await?;
                clock.require_state(id).await?
            }
        };
        Ok(state)
    }
}
