//! Statistics data models.

use crate::{
    clock::ClockStatus,
    ledger::EntryId,
    prize::{Cents, PrizePoolBreakdown},
    tournament::{PlayerId, TournamentId},
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Biggest stack in play
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChipLeader {
    pub player_id: PlayerId,
    pub entry_id: EntryId,
    pub chip_count: i64,
}

/// Snapshot of a tournament's numbers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TournamentStats {
    pub tournament_id: TournamentId,
    /// Clock status (`None` before the clock is initialized)
    pub status: Option<ClockStatus>,
    pub current_level: u32,
    /// Entries in play
    pub players_remaining: u32,
    /// Entries sold, re-entries included
    pub total_entries: u32,
    pub unique_players: u32,
    pub reentries: u32,
    pub total_rebuys: u32,
    pub total_addons: u32,
    /// Chips in play
    pub total_chips: i64,
    pub average_stack: i64,
    /// Average stack in big blinds of the current level
    pub average_stack_bb: Option<f64>,
    pub chip_leader: Option<ChipLeader>,
    pub prize_pool: PrizePoolBreakdown,
    /// Payout per place from the net pool
    pub payouts: BTreeMap<u32, Cents>,
    pub paid_places: u32,
    /// Bounties still on the heads of players in play
    pub bounty_pool: Cents,
    /// Bounties already collected
    pub bounties_paid: Cents,
    /// One elimination away from the money
    pub on_the_bubble: bool,
    pub in_the_money: bool,
}
