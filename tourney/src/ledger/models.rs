//! Player ledger data models.

use crate::{
    prize::Cents,
    seating::SeatRef,
    tournament::{PlayerId, TournamentId},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use uuid::Uuid;

/// Entry ID type
pub type EntryId = i64;

/// Lifecycle of one entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryStatus {
    Registered,
    Paid,
    Active,
    CheckedIn,
    Eliminated,
    /// Tournament finished
    Completed,
}

impl EntryStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntryStatus::Registered => "registered",
            EntryStatus::Paid => "paid",
            EntryStatus::Active => "active",
            EntryStatus::CheckedIn => "checked_in",
            EntryStatus::Eliminated => "eliminated",
            EntryStatus::Completed => "completed",
        }
    }

    /// Registered, paid or active
    pub fn is_in_play(&self) -> bool {
        matches!(
            self,
            EntryStatus::Registered | EntryStatus::Paid | EntryStatus::Active
        )
    }

    /// Statuses an operator may set directly
    pub fn is_admin_settable(&self) -> bool {
        matches!(
            self,
            EntryStatus::Registered | EntryStatus::Paid | EntryStatus::Active | EntryStatus::CheckedIn
        )
    }
}

impl std::fmt::Display for EntryStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EntryStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "registered" => Ok(EntryStatus::Registered),
            "paid" => Ok(EntryStatus::Paid),
            "active" => Ok(EntryStatus::Active),
            "checked_in" => Ok(EntryStatus::CheckedIn),
            "eliminated" => Ok(EntryStatus::Eliminated),
            "completed" => Ok(EntryStatus::Completed),
            _ => Err(format!("Unknown entry status: {}", s)),
        }
    }
}

/// Whether the player left the tournament for good
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WithdrawalStatus {
    #[default]
    Active,
    Withdrawn,
    /// Busted with a re-entry available and chose not to take it
    DeclinedReentry,
}

impl WithdrawalStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            WithdrawalStatus::Active => "active",
            WithdrawalStatus::Withdrawn => "withdrawn",
            WithdrawalStatus::DeclinedReentry => "declined_reentry",
        }
    }
}

impl FromStr for WithdrawalStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(WithdrawalStatus::Active),
            "withdrawn" => Ok(WithdrawalStatus::Withdrawn),
            "declined_reentry" => Ok(WithdrawalStatus::DeclinedReentry),
            _ => Err(format!("Unknown withdrawal status: {}", s)),
        }
    }
}

/// One life of a player in a tournament; re-entries create new entries
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerEntry {
    pub id: EntryId,
    pub tournament_id: TournamentId,
    pub player_id: PlayerId,
    /// 1 for the original entry
    pub entry_number: u32,
    pub is_reentry: bool,
    pub status: EntryStatus,
    pub withdrawal_status: WithdrawalStatus,
    pub chip_count: i64,
    /// Total paid for this entry, rebuys and add-ons included
    pub paid_amount: Cents,
    /// Bounty on this entry's head
    pub bounty_amount: Cents,
    /// Bounties collected by this entry
    pub bounties_earned: Cents,
    pub rebuys_count: u32,
    pub addons_count: u32,
    /// Eliminations credited to this entry
    pub knockouts: u32,
    /// Final place, assigned at most once
    pub finish_position: Option<u32>,
    /// Place recorded at a bust while a re-entry is still possible
    pub pending_position: Option<u32>,
    pub seat_assignment: Option<SeatRef>,
    /// First entry of the same player (lookup only)
    pub original_entry_id: Option<EntryId>,
    pub registered_at: DateTime<Utc>,
    pub elimination_time: Option<DateTime<Utc>>,
    pub eliminated_by_player_id: Option<PlayerId>,
}

impl PlayerEntry {
    /// New registered entry; the repository assigns `id`
    pub fn new(
        tournament_id: TournamentId,
        player_id: PlayerId,
        entry_number: u32,
        chip_count: i64,
        paid_amount: Cents,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: 0,
            tournament_id,
            player_id,
            entry_number,
            is_reentry: entry_number > 1,
            status: EntryStatus::Registered,
            withdrawal_status: WithdrawalStatus::Active,
            chip_count,
            paid_amount,
            bounty_amount: 0,
            bounties_earned: 0,
            rebuys_count: 0,
            addons_count: 0,
            knockouts: 0,
            finish_position: None,
            pending_position: None,
            seat_assignment: None,
            original_entry_id: None,
            registered_at: now,
            elimination_time: None,
            eliminated_by_player_id: None,
        }
    }

    pub fn is_in_play(&self) -> bool {
        self.status.is_in_play()
    }

    /// Eliminated with the re-entry decision still open
    pub fn is_pending_reentry(&self) -> bool {
        self.status == EntryStatus::Eliminated
            && self.finish_position.is_none()
            && self.withdrawal_status == WithdrawalStatus::Active
    }
}

/// Kinds of ledger transactions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionKind {
    BuyIn,
    Reentry,
    Rebuy,
    Addon,
    Bounty,
    DeclinedReentry,
    Withdrawal,
}

impl TransactionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionKind::BuyIn => "buy_in",
            TransactionKind::Reentry => "reentry",
            TransactionKind::Rebuy => "rebuy",
            TransactionKind::Addon => "addon",
            TransactionKind::Bounty => "bounty",
            TransactionKind::DeclinedReentry => "declined_reentry",
            TransactionKind::Withdrawal => "withdrawal",
        }
    }
}

impl std::fmt::Display for TransactionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TransactionKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "buy_in" => Ok(TransactionKind::BuyIn),
            "reentry" => Ok(TransactionKind::Reentry),
            "rebuy" => Ok(TransactionKind::Rebuy),
            "addon" => Ok(TransactionKind::Addon),
            "bounty" => Ok(TransactionKind::Bounty),
            "declined_reentry" => Ok(TransactionKind::DeclinedReentry),
            "withdrawal" => Ok(TransactionKind::Withdrawal),
            _ => Err(format!("Unknown transaction kind: {}", s)),
        }
    }
}

/// Audit record of a money or chip movement
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerTransaction {
    pub id: Uuid,
    pub tournament_id: TournamentId,
    pub player_id: PlayerId,
    pub entry_id: EntryId,
    pub kind: TransactionKind,
    pub amount: Cents,
    pub chips: i64,
    pub created_at: DateTime<Utc>,
    pub note: Option<String>,
}

impl LedgerTransaction {
    pub fn new(entry: &PlayerEntry, kind: TransactionKind, amount: Cents, chips: i64, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            tournament_id: entry.tournament_id,
            player_id: entry.player_id,
            entry_id: entry.id,
            kind,
            amount,
            chips,
            created_at: now,
            note: None,
        }
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(note.into());
        self
    }
}

/// Result of a bust-out
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BustOutcome {
    pub message: String,
    /// Whether the busted player may still re-enter
    pub can_reentry: bool,
    /// Final place, unless the re-entry decision is still open
    pub finish_position: Option<u32>,
    /// Amount credited to the eliminator
    pub bounty_earned: Cents,
    /// Entries still in play after the bust
    pub remaining_count: u32,
    pub tournament_completed: bool,
}

/// Result of a declined re-entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeclineOutcome {
    pub entry_id: EntryId,
    pub finish_position: Option<u32>,
    pub tournament_completed: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_in_play_statuses() {
        assert!(EntryStatus::Registered.is_in_play());
        assert!(EntryStatus::Paid.is_in_play());
        assert!(EntryStatus::Active.is_in_play());
        assert!(!EntryStatus::CheckedIn.is_in_play());
        assert!(!EntryStatus::Eliminated.is_in_play());
        assert!(!EntryStatus::Completed.is_in_play());
    }

    #[test]
    fn test_admin_cannot_set_terminal_statuses() {
        assert!(EntryStatus::CheckedIn.is_admin_settable());
        assert!(!EntryStatus::Eliminated.is_admin_settable());
        assert!(!EntryStatus::Completed.is_admin_settable());
    }

    #[test]
    fn test_new_entry_marks_reentries() {
        let now = Utc::now();
        assert!(!PlayerEntry::new(1, 2, 1, 10_000, 5_000, now).is_reentry);
        assert!(PlayerEntry::new(1, 2, 2, 10_000, 5_000, now).is_reentry);
    }

    #[test]
    fn test_pending_reentry() {
        let mut entry = PlayerEntry::new(1, 2, 1, 0, 5_000, Utc::now());
        assert!(!entry.is_pending_reentry());

        entry.status = EntryStatus::Eliminated;
        entry.pending_position = Some(4);
        assert!(entry.is_pending_reentry());

        entry.withdrawal_status = WithdrawalStatus::DeclinedReentry;
        assert!(!entry.is_pending_reentry());
    }

    #[test]
    fn test_status_text_round_trip() {
        assert_eq!("checked_in".parse::<EntryStatus>(), Ok(EntryStatus::CheckedIn));
        assert_eq!(
            "declined_reentry".parse::<TransactionKind>(),
            Ok(TransactionKind::DeclinedReentry)
        );
        assert!("busted".parse::<EntryStatus>().is_err());
    }
}
