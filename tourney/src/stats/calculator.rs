//! Derives tournament statistics from the ledger, configuration and clock.

use super::models::{ChipLeader, TournamentStats};
use crate::{
    clock::ClockState,
    ledger::PlayerEntry,
    prize::{PayoutStructure, PrizePoolInput, PrizeResult, calculate_payouts, calculate_prize_pool},
    tournament::TournamentConfig,
};
use std::collections::BTreeSet;

/// Calculate statistics for a tournament
///
/// Uses the configured payout structure, or the standard one for the
/// number of entries when none is configured. Ties for chip leader go to
/// the earliest entry.
///
/// # Errors
///
/// Returns `PrizeError::InvalidStructure` if the configured payout
/// structure is invalid.
pub fn calculate_stats(
    config: &TournamentConfig,
    entries: &[PlayerEntry],
    clock: Option<&ClockState>,
) -> PrizeResult<TournamentStats> {
    let in_play: Vec<&PlayerEntry> = entries.iter().filter(|e| e.is_in_play()).collect();
    let players_remaining = in_play.len() as u32;
    let total_entries = entries.len() as u32;
    let unique_players = entries
        .iter()
        .map(|e| e.player_id)
        .collect::<BTreeSet<_>>()
        .len() as u32;

    let total_rebuys: u32 = entries.iter().map(|e| e.rebuys_count).sum();
    let total_addons: u32 = entries.iter().map(|e| e.addons_count).sum();

    let total_chips: i64 = in_play.iter().map(|e| e.chip_count).sum();
    let average_stack = if in_play.is_empty() {
        0
    } else {
        total_chips / i64::from(players_remaining)
    };

    let current_level = clock.map_or(1, |c| c.current_level);
    let average_stack_bb = config
        .level(current_level)
        .filter(|l| l.big_blind > 0 && !in_play.is_empty())
        .map(|l| average_stack as f64 / l.big_blind as f64);

    let chip_leader = in_play
        .iter()
        .fold(None::<&PlayerEntry>, |best, e| match best {
            Some(b) if b.chip_count >= e.chip_count => Some(b),
            _ => Some(e),
        })
        .map(|e| ChipLeader {
            player_id: e.player_id,
            entry_id: e.id,
            chip_count: e.chip_count,
        });

    let reentries = entries.iter().filter(|e| e.is_reentry).count() as u32;
    let prize_pool = calculate_prize_pool(&PrizePoolInput {
        buy_in: config.buy_in,
        entries: total_entries - reentries,
        reentries,
        reentry_cost: config.reentry_cost(),
        rebuys: total_rebuys,
        addons: total_addons,
        rebuy_cost: config.rebuy.cost,
        addon_cost: config.addon.cost,
        rake_percentage: config.rake_percentage,
    });

    let structure = if config.payout_structure.is_empty() {
        PayoutStructure::standard(total_entries as usize)
    } else {
        config.payout_structure.clone()
    };
    let payouts = calculate_payouts(prize_pool.net_pool, &structure)?;
    let paid_places = payouts.len() as u32;

    let finished = clock.is_some_and(|c| c.is_finished());
    let started = clock.is_some_and(|c| c.started_at.is_some());

    Ok(TournamentStats {
        tournament_id: config.tournament_id,
        status: clock.map(|c| c.status),
        current_level,
        players_remaining,
        total_entries,
        unique_players,
        reentries,
        total_rebuys,
        total_addons,
        total_chips,
        average_stack,
        average_stack_bb,
        chip_leader,
        prize_pool,
        payouts,
        paid_places,
        bounty_pool: in_play.iter().map(|e| e.bounty_amount).sum(),
        bounties_paid: entries.iter().map(|e| e.bounties_earned).sum(),
        on_the_bubble: started && !finished && players_remaining == paid_places + 1,
        in_the_money: started && players_remaining <= paid_places,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{clock::ClockStatus, ledger::EntryStatus, prize::PayoutPlace};
    use chrono::Utc;

    fn entries(stacks: &[i64]) -> Vec<PlayerEntry> {
        stacks
            .iter()
            .enumerate()
            .map(|(idx, &chips)| {
                let mut entry = PlayerEntry::new(1, idx as i64 + 1, 1, chips, 10_000, Utc::now());
                entry.id = idx as i64 + 1;
                entry
            })
            .collect()
    }

    fn running_clock(level: u32) -> ClockState {
        let mut clock = ClockState::new(1, None, Utc::now());
        clock.status = ClockStatus::Running;
        clock.current_level = level;
        clock.started_at = Some(Utc::now());
        clock
    }

    #[test]
    fn test_chip_leader_and_average() {
        let config = TournamentConfig::freezeout(1, "Test".to_string(), 10_000);
        let mut entries = entries(&[12_000, 30_000, 30_000, 8_000]);
        entries[3].status = EntryStatus::Eliminated;

        let stats = calculate_stats(&config, &entries, Some(&running_clock(2))).unwrap();
        assert_eq!(stats.players_remaining, 3);
        assert_eq!(stats.total_chips, 72_000);
        assert_eq!(stats.average_stack, 24_000);
        // Level 2 is 50/100
        assert_eq!(stats.average_stack_bb, Some(240.0));

        let leader = stats.chip_leader.unwrap();
        assert_eq!(leader.player_id, 2);
        assert_eq!(leader.chip_count, 30_000);
    }

    #[test]
    fn test_prize_pool_counts_reentries_and_rebuys() {
        let mut config = TournamentConfig::freezeout(1, "Test".to_string(), 10_000);
        config.rebuy.cost = 10_000;
        config.rake_percentage = 10.0;

        let mut entries = entries(&[10_000, 10_000, 10_000]);
        entries[0].rebuys_count = 2;
        entries[2].entry_number = 2;
        entries[2].is_reentry = true;
        entries[2].player_id = 2;

        let stats = calculate_stats(&config, &entries, None).unwrap();
        assert_eq!(stats.total_entries, 3);
        assert_eq!(stats.unique_players, 2);
        assert_eq!(stats.reentries, 1);
        assert_eq!(stats.prize_pool.gross_pool, 50_000);
        assert_eq!(stats.prize_pool.net_pool, 45_000);
        assert_eq!(stats.payouts.values().sum::<i64>(), 45_000);
    }

    #[test]
    fn test_prize_pool_matches_paid_amounts_with_reentry_cost() {
        let mut config = TournamentConfig::freezeout(1, "Test".to_string(), 10_000);
        config.reentry.allow = true;
        config.reentry.cost = Some(6_000);

        let mut entries = entries(&[10_000, 10_000, 10_000, 10_000]);
        for entry in entries.iter_mut().skip(2) {
            entry.entry_number = 2;
            entry.is_reentry = true;
            entry.paid_amount = config.reentry_cost();
        }

        let stats = calculate_stats(&config, &entries, None).unwrap();
        let paid: i64 = entries.iter().map(|e| e.paid_amount).sum();
        assert_eq!(paid, 32_000);
        assert_eq!(stats.prize_pool.entry_pool, paid);
        assert_eq!(stats.prize_pool.gross_pool, paid);
    }

    #[test]
    fn test_bubble_and_money() {
        let mut config = TournamentConfig::freezeout(1, "Test".to_string(), 10_000);
        config.payout_structure = vec![PayoutPlace::new(1, 65.0), PayoutPlace::new(2, 35.0)];
        let clock = running_clock(5);

        let mut entries = entries(&[5_000; 6]);
        for entry in entries.iter_mut().take(3) {
            entry.status = EntryStatus::Eliminated;
        }
        let stats = calculate_stats(&config, &entries, Some(&clock)).unwrap();
        assert_eq!(stats.paid_places, 2);
        assert!(stats.on_the_bubble);
        assert!(!stats.in_the_money);

        entries[3].status = EntryStatus::Eliminated;
        let stats = calculate_stats(&config, &entries, Some(&clock)).unwrap();
        assert!(!stats.on_the_bubble);
        assert!(stats.in_the_money);
    }

    #[test]
    fn test_empty_tournament() {
        let config = TournamentConfig::freezeout(1, "Test".to_string(), 10_000);
        let stats = calculate_stats(&config, &[], None).unwrap();
        assert_eq!(stats.players_remaining, 0);
        assert_eq!(stats.average_stack, 0);
        assert_eq!(stats.average_stack_bb, None);
        assert!(stats.chip_leader.is_none());
        assert!(!stats.in_the_money);
    }
}
