//! Ledger error types.

use super::models::{EntryId, EntryStatus};
use crate::{
    clock::{ClockError, ClockStatus},
    db::StorageError,
    tournament::{PlayerId, TournamentId},
};
use thiserror::Error;

/// Player ledger errors
#[derive(Debug, Error)]
pub enum LedgerError {
    /// Clock is not running, paused or on a break
    #[error("Tournament {tournament_id} is not running (clock is {status})")]
    TournamentNotRunning {
        tournament_id: TournamentId,
        status: ClockStatus,
    },

    /// Clock has not been initialized
    #[error("Tournament {0} has no clock")]
    TournamentNotFound(TournamentId),

    /// No configuration registered for the tournament
    #[error("No configuration for tournament {0}")]
    ConfigNotFound(TournamentId),

    #[error("Tournament {0} is finished")]
    TournamentFinished(TournamentId),

    /// Only allowed before the clock starts
    #[error("Tournament {0} has already started")]
    TournamentAlreadyStarted(TournamentId),

    #[error("Late registration closed after level {0}")]
    LateRegistrationClosed(u32),

    #[error("Player {0} is not registered")]
    NotRegistered(PlayerId),

    #[error("Player {0} is already registered")]
    AlreadyRegistered(PlayerId),

    #[error("Entry {entry_number} of player {player_id} not found")]
    EntryNotFound {
        player_id: PlayerId,
        entry_number: u32,
    },

    #[error("Entry {0} not found")]
    UnknownEntry(EntryId),

    /// Entry is not in play
    #[error("Entry {entry_id} is {status}")]
    EntryNotInPlay { entry_id: EntryId, status: EntryStatus },

    /// The last player in play wins, they cannot bust
    #[error("Cannot bust the last player in play")]
    CannotBustLastPlayer,

    #[error("Re-entry is not allowed")]
    ReentryNotAllowed,

    #[error("Re-entry closed after level {0}")]
    ReentryClosed(u32),

    #[error("Re-entry limit of {0} reached")]
    ReentryLimitReached(u32),

    #[error("Player {0} declined re-entry")]
    ReentryDeclined(PlayerId),

    /// Player still has an entry in play
    #[error("Player {0} is still in play")]
    PlayerStillActive(PlayerId),

    /// No eliminated entry awaits a re-entry decision
    #[error("Player {0} has no pending re-entry")]
    NoPendingReentry(PlayerId),

    #[error("Rebuys are not allowed")]
    RebuyNotAllowed,

    #[error("Rebuys closed after level {0}")]
    RebuyClosed(u32),

    #[error("Rebuy limit of {0} reached")]
    RebuyLimitReached(u32),

    #[error("Add-ons are not allowed")]
    AddonNotAllowed,

    #[error("Add-ons open at level {0}")]
    AddonNotOpen(u32),

    #[error("Add-ons closed after level {0}")]
    AddonClosed(u32),

    #[error("Add-on limit of {0} reached")]
    AddonLimitReached(u32),

    /// Eliminated and completed are reached only through bust and finish
    #[error("Cannot set entry status to {0}")]
    InvalidStatusChange(EntryStatus),

    #[error("Invalid chip count: {0}")]
    InvalidChips(i64),

    #[error(transparent)]
    Clock(#[from] ClockError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

impl LedgerError {
    /// Stable reason code
    pub fn code(&self) -> &'static str {
        match self {
            LedgerError::TournamentNotRunning { .. } => "tournament_not_running",
            LedgerError::TournamentNotFound(_) => "tournament_not_found",
            LedgerError::ConfigNotFound(_) => "config_not_found",
            LedgerError::TournamentFinished(_) => "tournament_finished",
            LedgerError::TournamentAlreadyStarted(_) => "tournament_already_started",
            LedgerError::LateRegistrationClosed(_) => "late_registration_closed",
            LedgerError::NotRegistered(_) => "not_registered",
            LedgerError::AlreadyRegistered(_) => "already_registered",
            LedgerError::EntryNotFound { .. } | LedgerError::UnknownEntry(_) => "entry_not_found",
            LedgerError::EntryNotInPlay { .. } => "entry_not_in_play",
            LedgerError::CannotBustLastPlayer => "cannot_bust_last_player",
            LedgerError::ReentryNotAllowed => "reentry_not_allowed",
            LedgerError::ReentryClosed(_) => "reentry_closed",
            LedgerError::ReentryLimitReached(_) => "reentry_limit_reached",
            LedgerError::ReentryDeclined(_) => "reentry_declined",
            LedgerError::PlayerStillActive(_) => "player_still_active",
            LedgerError::NoPendingReentry(_) => "no_pending_reentry",
            LedgerError::RebuyNotAllowed => "rebuy_not_allowed",
            LedgerError::RebuyClosed(_) => "rebuy_closed",
            LedgerError::RebuyLimitReached(_) => "rebuy_limit_reached",
            LedgerError::AddonNotAllowed => "addon_not_allowed",
            LedgerError::AddonNotOpen(_) => "addon_not_open",
            LedgerError::AddonClosed(_) => "addon_closed",
            LedgerError::AddonLimitReached(_) => "addon_limit_reached",
            LedgerError::InvalidStatusChange(_) => "invalid_status_change",
            LedgerError::InvalidChips(_) => "invalid_chips",
            LedgerError::Clock(e) => e.code(),
            LedgerError::Storage(_) => "storage",
        }
    }
}

/// Result type for ledger operations
pub type LedgerResult<T> = Result<T, LedgerError>;
