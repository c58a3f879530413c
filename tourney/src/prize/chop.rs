//! Deal-making: chip chop, even chop and simplified ICM chop.

use super::{
    errors::{PrizeError, PrizeResult},
    models::{Cents, ChopShare},
};

/// Split `pool` in proportion to chip stacks
///
/// Each share is rounded to the cent; the rounding remainder goes to the
/// largest stack (the first one listed when stacks tie).
pub fn calculate_chip_chop<K: Clone>(
    pool: Cents,
    stacks: &[(K, i64)],
) -> PrizeResult<Vec<ChopShare<K>>> {
    check_stacks(pool, stacks)?;

    let total_chips: i64 = stacks.iter().map(|(_, chips)| chips).sum();
    if total_chips == 0 {
        return Err(PrizeError::NoChips);
    }

    let mut shares: Vec<ChopShare<K>> = stacks
        .iter()
        .map(|(player, chips)| ChopShare {
            player: player.clone(),
            amount: (pool as f64 * *chips as f64 / total_chips as f64).round() as Cents,
        })
        .collect();

    absorb_remainder(pool, &mut shares, largest_stack(stacks));
    Ok(shares)
}

/// Split `pool` evenly
///
/// Everyone gets the pool divided by the player count, truncated to the cent;
/// the leftover cents are handed out one at a time in input order.
pub fn calculate_even_chop<K: Clone>(pool: Cents, players: &[K]) -> PrizeResult<Vec<ChopShare<K>>> {
    if pool < 0 {
        return Err(PrizeError::InvalidAmount(pool));
    }
    if players.is_empty() {
        return Err(PrizeError::NoPlayers);
    }

    let count = players.len() as i64;
    let base = pool / count;
    let leftover = (pool - base * count) as usize;

    Ok(players
        .iter()
        .enumerate()
        .map(|(idx, player)| ChopShare {
            player: player.clone(),
            amount: base + if idx < leftover { 1 } else { 0 },
        })
        .collect())
}

/// Simplified ICM chop
///
/// This is a heuristic, not a recursive Malmuth-Harville computation. The
/// remaining prizes are sorted from largest to smallest and truncated to
/// the number of players. With `rank` the player's chip rank (1 = biggest
/// stack, equal stacks share a rank), the chance of finishing in place `k`
/// out of `n` players is approximated as
///
/// ```text
/// chip_share * (1 - |rank - k| / n) * (n - k + 1) / n
/// ```
///
/// Equity sums `chance * prize` over the paid places and is then normalized
/// so the shares add up to the prize total. Rounding slack goes to the
/// biggest stack.
pub fn calculate_icm_chop<K: Clone>(
    stacks: &[(K, i64)],
    prizes: &[Cents],
) -> PrizeResult<Vec<ChopShare<K>>> {
    if let Some(&negative) = prizes.iter().find(|&&p| p < 0) {
        return Err(PrizeError::InvalidAmount(negative));
    }

    let mut prizes = prizes.to_vec();
    prizes.sort_unstable_by(|a, b| b.cmp(a));
    prizes.truncate(stacks.len());
    let prize_total: Cents = prizes.iter().sum();

    check_stacks(prize_total, stacks)?;

    let total_chips: i64 = stacks.iter().map(|(_, chips)| chips).sum();
    if total_chips == 0 {
        return Err(PrizeError::NoChips);
    }

    let players = stacks.len() as f64;
    let equities: Vec<f64> = stacks
        .iter()
        .map(|(_, chips)| {
            let share = *chips as f64 / total_chips as f64;
            let rank = 1 + stacks.iter().filter(|(_, other)| other > chips).count();
            prizes
                .iter()
                .enumerate()
                .map(|(idx, &prize)| {
                    let place = idx as f64 + 1.0;
                    let place_decay = 1.0 - (rank as f64 - place).abs() / players;
                    let remaining_factor = (players - place + 1.0) / players;
                    share * place_decay * remaining_factor * prize as f64
                })
                .sum()
        })
        .collect();

    let total_equity: f64 = equities.iter().sum();
    let scale = if total_equity > 0.0 {
        prize_total as f64 / total_equity
    } else {
        0.0
    };

    let mut shares: Vec<ChopShare<K>> = stacks
        .iter()
        .zip(&equities)
        .map(|((player, _), equity)| ChopShare {
            player: player.clone(),
            amount: (equity * scale).round() as Cents,
        })
        .collect();

    absorb_remainder(prize_total, &mut shares, largest_stack(stacks));
    Ok(shares)
}

fn check_stacks<K>(pool: Cents, stacks: &[(K, i64)]) -> PrizeResult<()> {
    if pool < 0 {
        return Err(PrizeError::InvalidAmount(pool));
    }
    if stacks.is_empty() {
        return Err(PrizeError::NoPlayers);
    }
    if let Some((_, chips)) = stacks.iter().find(|(_, chips)| *chips < 0) {
        return Err(PrizeError::InvalidChips(*chips));
    }
    Ok(())
}

/// Index of the largest stack, first one wins ties
fn largest_stack<K>(stacks: &[(K, i64)]) -> usize {
    let mut best = 0;
    for (idx, (_, chips)) in stacks.iter().enumerate() {
        if *chips > stacks[best].1 {
            best = idx;
        }
    }
    best
}

fn absorb_remainder<K>(pool: Cents, shares: &mut [ChopShare<K>], into: usize) {
    let distributed: Cents = shares.iter().map(|s| s.amount).sum();
    if let Some(share) = shares.get_mut(into) {
        share.amount += pool - distributed;
    }
}
