//! Clock state models and transition rules.
//!
//! Time is a checkpoint: `time_remaining` is only written when a transition
//! happens. Between checkpoints the presentation layer counts down locally
//! and resynchronizes by polling.

use super::errors::{ClockError, ClockResult};
use crate::tournament::TournamentId;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Clock state ID type
pub type ClockStateId = i64;

/// Clock status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClockStatus {
    /// Created, not started yet
    Setup,
    Running,
    Paused,
    /// Scheduled break between levels
    Break,
    /// Terminal
    Finished,
}

impl ClockStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ClockStatus::Setup => "setup",
            ClockStatus::Running => "running",
            ClockStatus::Paused => "paused",
            ClockStatus::Break => "break",
            ClockStatus::Finished => "finished",
        }
    }

    /// Whether play is underway (running, paused or on a break)
    pub fn is_in_progress(&self) -> bool {
        matches!(
            self,
            ClockStatus::Running | ClockStatus::Paused | ClockStatus::Break
        )
    }
}

impl std::fmt::Display for ClockStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ClockStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "setup" => Ok(ClockStatus::Setup),
            "running" => Ok(ClockStatus::Running),
            "paused" => Ok(ClockStatus::Paused),
            "break" => Ok(ClockStatus::Break),
            "finished" => Ok(ClockStatus::Finished),
            _ => Err(format!("Unknown clock status: {}", s)),
        }
    }
}

/// Clock transitions, used in error reports and events
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClockAction {
    Start,
    Pause,
    Resume,
    AdvanceLevel,
    StartBreak,
    EndBreak,
    AddTime,
    Finish,
}

impl std::fmt::Display for ClockAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ClockAction::Start => "start",
            ClockAction::Pause => "pause",
            ClockAction::Resume => "resume",
            ClockAction::AdvanceLevel => "advance_level",
            ClockAction::StartBreak => "start_break",
            ClockAction::EndBreak => "end_break",
            ClockAction::AddTime => "add_time",
            ClockAction::Finish => "finish",
        };
        f.write_str(name)
    }
}

/// Durable timer state of one tournament
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClockState {
    pub id: ClockStateId,
    pub tournament_id: TournamentId,
    /// Blind template chosen at initialization
    pub template_id: Option<i64>,
    pub status: ClockStatus,
    /// Current blind level (1-indexed)
    pub current_level: u32,
    /// Seconds left in the level at the last checkpoint
    pub time_remaining: i64,
    pub started_at: Option<DateTime<Utc>>,
    pub paused_at: Option<DateTime<Utc>>,
    pub break_until: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    /// Entries taken, re-entries included
    pub total_players: u32,
    /// Players still alive: in play or pending a re-entry decision
    pub remaining_players: u32,
    /// Time of the last checkpoint
    pub updated_at: DateTime<Utc>,
}

impl ClockState {
    /// Fresh state in `setup`
    pub fn new(tournament_id: TournamentId, template_id: Option<i64>, now: DateTime<Utc>) -> Self {
        Self {
            id: 0,
            tournament_id,
            template_id,
            status: ClockStatus::Setup,
            current_level: 1,
            time_remaining: 0,
            started_at: None,
            paused_at: None,
            break_until: None,
            completed_at: None,
            total_players: 0,
            remaining_players: 0,
            updated_at: now,
        }
    }

    /// Whether the tournament reached its terminal state
    pub fn is_finished(&self) -> bool {
        self.status == ClockStatus::Finished
    }

    fn require(&self, action: ClockAction, expected: ClockStatus) -> ClockResult<()> {
        if self.is_finished() {
            return Err(ClockError::Finished(self.tournament_id));
        }
        if self.status != expected {
            return Err(ClockError::InvalidTransition {
                action,
                status: self.status,
            });
        }
        Ok(())
    }

    fn checkpoint(&mut self, now: DateTime<Utc>) {
        self.updated_at = now;
    }

    /// `setup -> running` at level 1
    pub fn start(&mut self, duration_secs: i64, now: DateTime<Utc>) -> ClockResult<()> {
        self.require(ClockAction::Start, ClockStatus::Setup)?;
        check_duration(duration_secs)?;

        self.status = ClockStatus::Running;
        self.current_level = 1;
        self.time_remaining = duration_secs;
        self.started_at = Some(now);
        self.paused_at = None;
        self.break_until = None;
        self.checkpoint(now);
        Ok(())
    }

    /// `running -> paused`, persisting the caller's remaining-time snapshot
    pub fn pause(&mut self, time_remaining: i64, now: DateTime<Utc>) -> ClockResult<()> {
        self.require(ClockAction::Pause, ClockStatus::Running)?;
        check_duration(time_remaining)?;

        self.status = ClockStatus::Paused;
        self.time_remaining = time_remaining;
        self.paused_at = Some(now);
        self.checkpoint(now);
        Ok(())
    }

    /// `paused -> running` with whatever time was last persisted
    pub fn resume(&mut self, now: DateTime<Utc>) -> ClockResult<()> {
        self.require(ClockAction::Resume, ClockStatus::Paused)?;

        self.status = ClockStatus::Running;
        self.paused_at = None;
        self.checkpoint(now);
        Ok(())
    }

    /// `running -> running` one level up
    pub fn advance_level(&mut self, next_duration_secs: i64, now: DateTime<Utc>) -> ClockResult<()> {
        self.require(ClockAction::AdvanceLevel, ClockStatus::Running)?;
        check_duration(next_duration_secs)?;

        self.current_level += 1;
        self.time_remaining = next_duration_secs;
        self.checkpoint(now);
        Ok(())
    }

    /// `running -> break` for `minutes`
    pub fn start_break(&mut self, minutes: i64, now: DateTime<Utc>) -> ClockResult<()> {
        self.require(ClockAction::StartBreak, ClockStatus::Running)?;
        check_duration(minutes)?;

        self.status = ClockStatus::Break;
        self.break_until = Some(now + Duration::minutes(minutes));
        self.checkpoint(now);
        Ok(())
    }

    /// `break -> running` one level up
    pub fn end_break(&mut self, next_duration_secs: i64, now: DateTime<Utc>) -> ClockResult<()> {
        self.require(ClockAction::EndBreak, ClockStatus::Break)?;
        check_duration(next_duration_secs)?;

        self.status = ClockStatus::Running;
        self.current_level += 1;
        self.time_remaining = next_duration_secs;
        self.break_until = None;
        self.checkpoint(now);
        Ok(())
    }

    /// Add (or with a negative value, remove) time without changing status
    pub fn add_time(&mut self, seconds: i64, now: DateTime<Utc>) -> ClockResult<()> {
        if self.is_finished() {
            return Err(ClockError::Finished(self.tournament_id));
        }

        self.time_remaining = (self.time_remaining + seconds).max(0);
        self.checkpoint(now);
        Ok(())
    }

    /// Any non-finished status -> `finished`
    pub fn finish(&mut self, now: DateTime<Utc>) -> ClockResult<()> {
        if self.is_finished() {
            return Err(ClockError::Finished(self.tournament_id));
        }

        self.status = ClockStatus::Finished;
        self.paused_at = None;
        self.break_until = None;
        self.completed_at = Some(now);
        self.checkpoint(now);
        Ok(())
    }

    /// Remaining level time projected from the last checkpoint
    ///
    /// Nothing is written: this only mirrors what a client countdown shows.
    pub fn projected_remaining(&self, now: DateTime<Utc>) -> i64 {
        match self.status {
            ClockStatus::Running => {
                let elapsed = (now - self.updated_at).num_seconds().max(0);
                (self.time_remaining - elapsed).max(0)
            }
            _ => self.time_remaining,
        }
    }

    /// Seconds left in the current break
    pub fn break_remaining(&self, now: DateTime<Utc>) -> Option<i64> {
        match (self.status, self.break_until) {
            (ClockStatus::Break, Some(until)) => Some((until - now).num_seconds().max(0)),
            _ => None,
        }
    }

    /// Seconds since the tournament started (up to completion)
    pub fn elapsed(&self, now: DateTime<Utc>) -> i64 {
        match self.started_at {
            Some(started) => {
                let end = self.completed_at.unwrap_or(now);
                (end - started).num_seconds().max(0)
            }
            None => 0,
        }
    }
}

fn check_duration(value: i64) -> ClockResult<()> {
    if value < 0 {
        return Err(ClockError::InvalidTime(value));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 14, 19, 0, 0).unwrap() + Duration::seconds(secs)
    }

    fn running() -> ClockState {
        let mut state = ClockState::new(7, None, at(0));
        state.start(1200, at(0)).unwrap();
        state
    }

    #[test]
    fn test_start_sets_level_one() {
        let state = running();
        assert_eq!(state.status, ClockStatus::Running);
        assert_eq!(state.current_level, 1);
        assert_eq!(state.time_remaining, 1200);
        assert_eq!(state.started_at, Some(at(0)));
    }

    #[test]
    fn test_start_only_from_setup() {
        let mut state = running();
        let err = state.start(600, at(5)).unwrap_err();
        assert!(matches!(
            err,
            ClockError::InvalidTransition {
                action: ClockAction::Start,
                status: ClockStatus::Running
            }
        ));
    }

    #[test]
    fn test_pause_persists_snapshot_and_resume_keeps_it() {
        let mut state = running();
        state.pause(845, at(355)).unwrap();
        assert_eq!(state.status, ClockStatus::Paused);
        assert_eq!(state.time_remaining, 845);
        assert_eq!(state.paused_at, Some(at(355)));

        state.resume(at(1000)).unwrap();
        assert_eq!(state.status, ClockStatus::Running);
        assert_eq!(state.time_remaining, 845);
        assert_eq!(state.paused_at, None);
    }

    #[test]
    fn test_pause_rejects_negative_snapshot() {
        let mut state = running();
        assert!(matches!(
            state.pause(-1, at(1)),
            Err(ClockError::InvalidTime(-1))
        ));
        assert_eq!(state.status, ClockStatus::Running);
    }

    #[test]
    fn test_break_cycle_advances_level() {
        let mut state = running();
        state.start_break(10, at(1200)).unwrap();
        assert_eq!(state.status, ClockStatus::Break);
        assert_eq!(state.break_until, Some(at(1800)));
        assert_eq!(state.break_remaining(at(1500)), Some(300));

        state.end_break(900, at(1800)).unwrap();
        assert_eq!(state.status, ClockStatus::Running);
        assert_eq!(state.current_level, 2);
        assert_eq!(state.time_remaining, 900);
        assert_eq!(state.break_until, None);
    }

    #[test]
    fn test_add_time_floors_at_zero() {
        let mut state = running();
        state.add_time(60, at(1)).unwrap();
        assert_eq!(state.time_remaining, 1260);
        state.add_time(-5000, at(2)).unwrap();
        assert_eq!(state.time_remaining, 0);
        assert_eq!(state.status, ClockStatus::Running);
    }

    #[test]
    fn test_finish_is_terminal() {
        let mut state = running();
        state.finish(at(50)).unwrap();
        assert!(state.is_finished());

        assert!(matches!(state.start(10, at(51)), Err(ClockError::Finished(7))));
        assert!(matches!(state.pause(10, at(51)), Err(ClockError::Finished(7))));
        assert!(matches!(state.resume(at(51)), Err(ClockError::Finished(7))));
        assert!(matches!(state.advance_level(10, at(51)), Err(ClockError::Finished(7))));
        assert!(matches!(state.start_break(5, at(51)), Err(ClockError::Finished(7))));
        assert!(matches!(state.end_break(10, at(51)), Err(ClockError::Finished(7))));
        assert!(matches!(state.add_time(10, at(51)), Err(ClockError::Finished(7))));
        assert!(matches!(state.finish(at(51)), Err(ClockError::Finished(7))));
        assert_eq!(state.status, ClockStatus::Finished);
    }

    #[test]
    fn test_projection_does_not_mutate() {
        let state = running();
        assert_eq!(state.projected_remaining(at(200)), 1000);
        assert_eq!(state.projected_remaining(at(5000)), 0);
        assert_eq!(state.time_remaining, 1200);
        assert_eq!(state.elapsed(at(200)), 200);
    }

    #[test]
    fn test_status_round_trips_through_text() {
        for status in [
            ClockStatus::Setup,
            ClockStatus::Running,
            ClockStatus::Paused,
            ClockStatus::Break,
            ClockStatus::Finished,
        ] {
            assert_eq!(status.as_str().parse::<ClockStatus>(), Ok(status));
        }
        assert!("ticking".parse::<ClockStatus>().is_err());
    }
}
