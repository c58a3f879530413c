//! Engine facade wiring the clock, ledger and seating managers together.

use super::{
    EventBus, TournamentConfig, TournamentId,
    errors::{TournamentError, TournamentResult},
};
use crate::{
    clock::ClockManager,
    db::{ConfigRepository, LedgerRepository, Repositories},
    ledger::LedgerManager,
    seating::SeatingManager,
    stats::{TournamentStats, calculate_stats},
    time::TimeSource,
};
use std::sync::Arc;

/// All managers of one deployment, sharing storage, time and events
#[derive(Clone)]
pub struct TournamentEngine {
    clock: ClockManager,
    ledger: LedgerManager,
    seating: SeatingManager,
    configs: Arc<dyn ConfigRepository>,
    entries: Arc<dyn LedgerRepository>,
    events: EventBus,
}

impl TournamentEngine {
    /// Create an engine over `repositories`
    pub fn new(repositories: Repositories, time: Arc<dyn TimeSource>, events: EventBus) -> Self {
        let clock = ClockManager::new(
            repositories.clocks.clone(),
            repositories.configs.clone(),
            time.clone(),
            events.clone(),
        );
        let seating = SeatingManager::new(
            repositories.tables.clone(),
            repositories.ledger.clone(),
            time.clone(),
            events.clone(),
        );
        let ledger = LedgerManager::new(
            repositories.ledger.clone(),
            repositories.configs.clone(),
            clock.clone(),
            seating.clone(),
            time,
            events.clone(),
        );

        Self {
            clock,
            ledger,
            seating,
            configs: repositories.configs,
            entries: repositories.ledger,
            events,
        }
    }

    pub fn clock(&self) -> &ClockManager {
        &self.clock
    }

    pub fn ledger(&self) -> &LedgerManager {
        &self.ledger
    }

    pub fn seating(&self) -> &SeatingManager {
        &self.seating
    }

    pub fn events(&self) -> &EventBus {
        &self.events
    }

    /// Validate and store a tournament's configuration
    pub async fn register_config(&self, config: &TournamentConfig) -> TournamentResult<()> {
        config.validate()?;
        self.configs.save_config(config).await?;
        log::info!(
            "Registered configuration for tournament {} '{}'",
            config.tournament_id,
            config.name
        );
        Ok(())
    }

    /// Stored configuration of a tournament
    pub async fn config(&self, tournament_id: TournamentId) -> TournamentResult<TournamentConfig> {
        self.configs
            .get_config(tournament_id)
            .await?
            .ok_or(TournamentError::ConfigNotFound(tournament_id))
    }

    /// Current statistics of a tournament
    pub async fn stats(&self, tournament_id: TournamentId) -> TournamentResult<TournamentStats> {
        let config = self.config(tournament_id).await?;
        let entries = self.entries.tournament_entries(tournament_id).await?;
        let clock = self.clock.get_state(tournament_id).await?;
        Ok(calculate_stats(&config, &entries, clock.as_ref())?)
    }
}
