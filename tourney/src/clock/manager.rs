//! Clock manager: loads, transitions and persists tournament clocks.

use super::{
    errors::{ClockError, ClockResult},
    models::{ClockState, ClockStatus},
};
use crate::{
    db::{ClockRepository, ConfigRepository},
    time::TimeSource,
    tournament::{BlindLevel, EventBus, TournamentEvent, TournamentId},
};
use std::sync::Arc;

/// Clock manager
///
/// Every successful transition is persisted as a checkpoint and published
/// on the event bus. Failed transitions leave the stored state untouched.
#[derive(Clone)]
pub struct ClockManager {
    clocks: Arc<dyn ClockRepository>,
    configs: Arc<dyn ConfigRepository>,
    time: Arc<dyn TimeSource>,
    events: EventBus,
}

impl ClockManager {
    /// Create a new clock manager
    pub fn new(
        clocks: Arc<dyn ClockRepository>,
        configs: Arc<dyn ConfigRepository>,
        time: Arc<dyn TimeSource>,
        events: EventBus,
    ) -> Self {
        Self {
            clocks,
            configs,
            time,
            events,
        }
    }

    /// Create the clock of a tournament, or return the existing one
    ///
    /// Calling this again never resets progress.
    pub async fn initialize(
        &self,
        tournament_id: TournamentId,
        template_id: Option<i64>,
    ) -> ClockResult<ClockState> {
        if let Some(existing) = self.clocks.get_clock(tournament_id).await? {
            return Ok(existing);
        }

        let state = self
            .clocks
            .insert_clock_if_absent(&ClockState::new(tournament_id, template_id, self.time.now()))
            .await?;

        log::info!(
            "Initialized clock {} for tournament {}",
            state.id,
            tournament_id
        );
        self.events.publish(TournamentEvent::ClockInitialized {
            tournament_id,
            state_id: state.id,
        });
        Ok(state)
    }

    /// Get the clock of a tournament
    pub async fn get_state(&self, tournament_id: TournamentId) -> ClockResult<Option<ClockState>> {
        Ok(self.clocks.get_clock(tournament_id).await?)
    }

    /// Get the clock of a tournament, failing if it does not exist
    pub async fn require_state(&self, tournament_id: TournamentId) -> ClockResult<ClockState> {
        self.clocks
            .get_clock(tournament_id)
            .await?
            .ok_or(ClockError::NotInitialized(tournament_id))
    }

    /// Load, apply `transition`, persist
    async fn transition<F>(&self, tournament_id: TournamentId, transition: F) -> ClockResult<ClockState>
    where
        F: FnOnce(&mut ClockState, chrono::DateTime<chrono::Utc>) -> ClockResult<()>,
    {
        let mut state = self.require_state(tournament_id).await?;
        if let Err(e) = transition(&mut state, self.time.now()) {
            log::warn!("Clock of tournament {}: {}", tournament_id, e);
            return Err(e);
        }
        self.clocks.save_clock(&state).await?;
        Ok(state)
    }

    /// `setup -> running` with a level 1 of `duration_secs`
    pub async fn start(&self, tournament_id: TournamentId, duration_secs: i64) -> ClockResult<ClockState> {
        let state = self
            .transition(tournament_id, |s, now| s.start(duration_secs, now))
            .await?;

        log::info!("Tournament {} started", tournament_id);
        self.events.publish(TournamentEvent::TournamentStarted {
            tournament_id,
            duration_secs,
        });
        Ok(state)
    }

    /// Start with the configured duration of level 1
    pub async fn start_default(&self, tournament_id: TournamentId) -> ClockResult<ClockState> {
        let duration = self.configured_duration(tournament_id, 1).await?;
        self.start(tournament_id, duration).await
    }

    /// `running -> paused`, persisting the caller's snapshot
    pub async fn pause(&self, tournament_id: TournamentId, time_remaining: i64) -> ClockResult<ClockState> {
        let state = self
            .transition(tournament_id, |s, now| s.pause(time_remaining, now))
            .await?;

        log::info!(
            "Tournament {} paused with {}s left in level {}",
            tournament_id,
            time_remaining,
            state.current_level
        );
        self.events.publish(TournamentEvent::ClockPaused {
            tournament_id,
            time_remaining,
        });
        Ok(state)
    }

    /// `paused -> running`
    pub async fn resume(&self, tournament_id: TournamentId) -> ClockResult<ClockState> {
        let state = self.transition(tournament_id, |s, now| s.resume(now)).await?;

        log::info!("Tournament {} resumed", tournament_id);
        self.events.publish(TournamentEvent::ClockResumed {
            tournament_id,
            time_remaining: state.time_remaining,
        });
        Ok(state)
    }

    /// Next level with an explicit duration
    pub async fn advance_level(
        &self,
        tournament_id: TournamentId,
        next_duration_secs: i64,
    ) -> ClockResult<ClockState> {
        let state = self
            .transition(tournament_id, |s, now| s.advance_level(next_duration_secs, now))
            .await?;

        log::info!(
            "Tournament {} advanced to level {}",
            tournament_id,
            state.current_level
        );
        self.events.publish(TournamentEvent::LevelAdvanced {
            tournament_id,
            level: state.current_level,
            duration_secs: next_duration_secs,
        });
        Ok(state)
    }

    /// Next level with its configured duration
    pub async fn advance_to_next_level(&self, tournament_id: TournamentId) -> ClockResult<ClockState> {
        let state = self.require_state(tournament_id).await?;
        let duration = self
            .configured_duration(tournament_id, state.current_level + 1)
            .await?;
        self.advance_level(tournament_id, duration).await
    }

    /// `running -> break` for `minutes`
    pub async fn start_break(&self, tournament_id: TournamentId, minutes: i64) -> ClockResult<ClockState> {
        let state = self
            .transition(tournament_id, |s, now| s.start_break(minutes, now))
            .await?;

        log::info!("Tournament {} on a {} minute break", tournament_id, minutes);
        if let Some(until) = state.break_until {
            self.events.publish(TournamentEvent::BreakStarted {
                tournament_id,
                until,
            });
        }
        Ok(state)
    }

    /// `break -> running` at the next level with an explicit duration
    pub async fn end_break(
        &self,
        tournament_id: TournamentId,
        next_duration_secs: i64,
    ) -> ClockResult<ClockState> {
        let state = self
            .transition(tournament_id, |s, now| s.end_break(next_duration_secs, now))
            .await?;

        log::info!(
            "Tournament {} back from break at level {}",
            tournament_id,
            state.current_level
        );
        self.events.publish(TournamentEvent::BreakEnded {
            tournament_id,
            level: state.current_level,
        });
        Ok(state)
    }

    /// `break -> running` at the next level with its configured duration
    pub async fn end_break_auto(&self, tournament_id: TournamentId) -> ClockResult<ClockState> {
        let state = self.require_state(tournament_id).await?;
        let duration = self
            .configured_duration(tournament_id, state.current_level + 1)
            .await?;
        self.end_break(tournament_id, duration).await
    }

    /// Add (or remove, with a negative value) time in any non-finished status
    pub async fn add_time(&self, tournament_id: TournamentId, seconds: i64) -> ClockResult<ClockState> {
        let state = self
            .transition(tournament_id, |s, now| s.add_time(seconds, now))
            .await?;

        self.events.publish(TournamentEvent::TimeAdded {
            tournament_id,
            seconds,
            time_remaining: state.time_remaining,
        });
        Ok(state)
    }

    /// Any non-finished status -> `finished`
    pub async fn finish(&self, tournament_id: TournamentId) -> ClockResult<ClockState> {
        let state = self.transition(tournament_id, |s, now| s.finish(now)).await?;

        log::info!("Tournament {} finished", tournament_id);
        self.events
            .publish(TournamentEvent::TournamentFinished { tournament_id });
        Ok(state)
    }

    /// Remove the clock; returns whether one existed
    pub async fn delete(&self, tournament_id: TournamentId) -> ClockResult<bool> {
        let deleted = self.clocks.delete_clock(tournament_id).await?;
        if deleted {
            log::info!("Deleted clock of tournament {}", tournament_id);
            self.events
                .publish(TournamentEvent::ClockDeleted { tournament_id });
        }
        Ok(deleted)
    }

    /// Blinds of `level` from the tournament configuration
    pub async fn level_info(&self, tournament_id: TournamentId, level: u32) -> ClockResult<BlindLevel> {
        let config = self.configs.get_config(tournament_id).await?;
        config
            .and_then(|c| c.level(level).cloned())
            .ok_or(ClockError::LevelNotConfigured(level))
    }

    /// Store recomputed player counters without emitting an event
    pub async fn update_player_counts(
        &self,
        tournament_id: TournamentId,
        total_players: u32,
        remaining_players: u32,
    ) -> ClockResult<()> {
        let Some(mut state) = self.clocks.get_clock(tournament_id).await? else {
            return Ok(());
        };
        if state.total_players == total_players && state.remaining_players == remaining_players {
            return Ok(());
        }
        // Counters stay writable after finish so the final tally is recorded
        state.total_players = total_players;
        state.remaining_players = remaining_players;
        self.clocks.save_clock(&state).await?;
        Ok(())
    }

    /// Whether the clock is running, paused or on a break
    pub async fn is_in_progress(&self, tournament_id: TournamentId) -> ClockResult<bool> {
        Ok(self
            .clocks
            .get_clock(tournament_id)
            .await?
            .is_some_and(|s| s.status.is_in_progress()))
    }

    /// Current status, `None` without a clock
    pub async fn status(&self, tournament_id: TournamentId) -> ClockResult<Option<ClockStatus>> {
        Ok(self.clocks.get_clock(tournament_id).await?.map(|s| s.status))
    }

    async fn configured_duration(&self, tournament_id: TournamentId, level: u32) -> ClockResult<i64> {
        let blinds = self.level_info(tournament_id, level).await?;
        Ok(i64::from(blinds.duration_secs))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{MemoryClockRepository, MemoryConfigRepository};
    use crate::time::ManualTimeSource;
    use crate::tournament::TournamentConfig;
    use chrono::{TimeZone, Utc};

    async fn setup() -> (ClockManager, ManualTimeSource, Arc<MemoryConfigRepository>) {
        let time = ManualTimeSource::new(Utc.with_ymd_and_hms(2026, 3, 14, 19, 0, 0).unwrap());
        let configs = Arc::new(MemoryConfigRepository::new());
        configs
            .save_config(&TournamentConfig::freezeout(1, "Test".to_string(), 10_000))
            .await
            .unwrap();
        let manager = ClockManager::new(
            Arc::new(MemoryClockRepository::new()),
            configs.clone(),
            Arc::new(time.clone()),
            EventBus::default(),
        );
        (manager, time, configs)
    }

    #[tokio::test]
    async fn test_initialize_is_idempotent() {
        let (manager, time, _) = setup().await;
        let first = manager.initialize(1, Some(4)).await.unwrap();
        manager.start(1, 900).await.unwrap();

        time.advance_secs(60);
        let second = manager.initialize(1, None).await.unwrap();
        assert_eq!(second.id, first.id);
        assert_eq!(second.status, ClockStatus::Running);
        assert_eq!(second.template_id, Some(4));
    }

    #[tokio::test]
    async fn test_missing_clock_is_reported() {
        let (manager, _, _) = setup().await;
        let err = manager.start(99, 600).await.unwrap_err();
        assert_eq!(err.code(), "clock_not_initialized");
        assert!(manager.get_state(99).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_failed_transition_leaves_state_untouched() {
        let (manager, time, _) = setup().await;
        manager.initialize(1, None).await.unwrap();
        let before = manager.require_state(1).await.unwrap();

        time.advance_secs(30);
        let err = manager.resume(1).await.unwrap_err();
        assert_eq!(err.code(), "invalid_transition");
        assert_eq!(manager.require_state(1).await.unwrap(), before);
    }

    #[tokio::test]
    async fn test_configured_level_durations() {
        let (manager, time, _) = setup().await;
        manager.initialize(1, None).await.unwrap();
        let state = manager.start_default(1).await.unwrap();
        assert_eq!(state.time_remaining, 1200);

        time.advance_secs(1200);
        let state = manager.advance_to_next_level(1).await.unwrap();
        assert_eq!(state.current_level, 2);
        assert_eq!(state.time_remaining, 1200);

        manager.start_break(1, 10).await.unwrap();
        time.advance_secs(600);
        let state = manager.end_break_auto(1).await.unwrap();
        assert_eq!(state.current_level, 3);
        assert_eq!(state.status, ClockStatus::Running);

        let blinds = manager.level_info(1, 3).await.unwrap();
        assert_eq!((blinds.small_blind, blinds.big_blind), (75, 150));
    }

    #[tokio::test]
    async fn test_advancing_past_last_level_fails() {
        let (manager, _, configs) = setup().await;
        let mut config = TournamentConfig::freezeout(1, "Short".to_string(), 10_000);
        config.levels.truncate(1);
        configs.save_config(&config).await.unwrap();

        manager.initialize(1, None).await.unwrap();
        manager.start_default(1).await.unwrap();
        let err = manager.advance_to_next_level(1).await.unwrap_err();
        assert!(matches!(err, ClockError::LevelNotConfigured(2)));
        assert_eq!(manager.require_state(1).await.unwrap().current_level, 1);
    }

    #[tokio::test]
    async fn test_transitions_publish_events() {
        let (manager, _, _) = setup().await;
        let mut events = manager.events.subscribe();

        manager.initialize(1, None).await.unwrap();
        manager.start(1, 600).await.unwrap();
        manager.pause(1, 420).await.unwrap();
        manager.finish(1).await.unwrap();

        let mut received = Vec::new();
        while let Ok(event) = events.try_recv() {
            received.push(event);
        }
        assert_eq!(received.len(), 4);
        assert_eq!(
            received[2],
            TournamentEvent::ClockPaused {
                tournament_id: 1,
                time_remaining: 420
            }
        );
        assert_eq!(
            received[3],
            TournamentEvent::TournamentFinished { tournament_id: 1 }
        );
    }

    #[tokio::test]
    async fn test_delete() {
        let (manager, _, _) = setup().await;
        manager.initialize(1, None).await.unwrap();
        assert!(manager.delete(1).await.unwrap());
        assert!(!manager.delete(1).await.unwrap());
    }
}
