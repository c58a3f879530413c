//! Prize pool, payout distribution and structure validation.

use super::{
    errors::{PrizeError, PrizeResult},
    models::{Cents, PayoutPlace, PrizePoolBreakdown, PrizePoolInput, StructureValidation, percent_of},
};
use std::collections::{BTreeMap, BTreeSet};

/// Allowed distance between a structure's total and 100%
const PERCENTAGE_TOLERANCE: f64 = 0.01;

/// Calculate the prize pool breakdown
///
/// Every stage is rounded to the cent on its own: the rake is taken from the
/// already rounded gross pool and the net pool is their difference. The
/// entry pool holds first entries and re-entries alike.
pub fn calculate_prize_pool(input: &PrizePoolInput) -> PrizePoolBreakdown {
    let entry_pool = input.buy_in * i64::from(input.entries)
        + input.reentry_cost * i64::from(input.reentries);
    let rebuy_pool = input.rebuy_cost * i64::from(input.rebuys);
    let addon_pool = input.addon_cost * i64::from(input.addons);
    let gross_pool = entry_pool + rebuy_pool + addon_pool;
    let rake_amount = percent_of(gross_pool, input.rake_percentage);

    PrizePoolBreakdown {
        entry_pool,
        rebuy_pool,
        addon_pool,
        gross_pool,
        rake_amount,
        net_pool: gross_pool - rake_amount,
    }
}

/// Distribute `net_pool` over a percentage structure
///
/// Each place gets its percentage rounded to the cent; whatever the rounding
/// leaves over (positive or negative) is added to first place, so the
/// amounts always sum to `net_pool`.
///
/// # Errors
///
/// * `PrizeError::InvalidAmount` - negative pool
/// * `PrizeError::InvalidStructure` - structure fails [`validate_structure`]
pub fn calculate_payouts(
    net_pool: Cents,
    structure: &[PayoutPlace],
) -> PrizeResult<BTreeMap<u32, Cents>> {
    if net_pool < 0 {
        return Err(PrizeError::InvalidAmount(net_pool));
    }

    let validation = validate_structure(structure);
    if !validation.valid {
        return Err(PrizeError::InvalidStructure(validation.errors));
    }

    let mut payouts: BTreeMap<u32, Cents> = structure
        .iter()
        .map(|p| (p.place, percent_of(net_pool, p.percentage)))
        .collect();

    let distributed: Cents = payouts.values().sum();
    let remainder = net_pool - distributed;
    if remainder != 0 {
        if let Some(first) = payouts.get_mut(&1) {
            *first += remainder;
        }
    }

    Ok(payouts)
}

/// Validate a payout structure
///
/// All problems are collected rather than stopping at the first one.
pub fn validate_structure(structure: &[PayoutPlace]) -> StructureValidation {
    let mut errors = Vec::new();

    if structure.is_empty() {
        errors.push("Payout structure is empty".to_string());
        return StructureValidation { valid: false, errors };
    }

    let mut seen = BTreeSet::new();
    for entry in structure {
        if entry.place == 0 {
            errors.push("Places must start at 1".to_string());
        }
        if !seen.insert(entry.place) {
            errors.push(format!("Duplicate place {}", entry.place));
        }
        if !entry.percentage.is_finite() || entry.percentage < 0.0 {
            errors.push(format!(
                "Place {} has an invalid percentage {}",
                entry.place, entry.percentage
            ));
        }
    }

    let places: Vec<u32> = seen.into_iter().filter(|&p| p > 0).collect();
    if let Some(&highest) = places.last() {
        for expected in 1..=highest {
            if places.binary_search(&expected).is_err() {
                errors.push(format!("Missing place {}", expected));
            }
        }
    }

    let total: f64 = structure.iter().map(|p| p.percentage).sum();
    if (total - 100.0).abs() > PERCENTAGE_TOLERANCE {
        errors.push(format!("Percentages sum to {:.2}, expected 100", total));
    }

    StructureValidation {
        valid: errors.is_empty(),
        errors,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prize_pool_breakdown() {
        let pool = calculate_prize_pool(&PrizePoolInput {
            buy_in: 10_000,
            entries: 50,
            rebuys: 10,
            addons: 5,
            rebuy_cost: 10_000,
            addon_cost: 5_000,
            rake_percentage: 5.0,
            ..Default::default()
        });

        assert_eq!(pool.entry_pool, 500_000);
        assert_eq!(pool.rebuy_pool, 100_000);
        assert_eq!(pool.addon_pool, 25_000);
        assert_eq!(pool.gross_pool, 625_000);
        assert_eq!(pool.rake_amount, 31_250);
        assert_eq!(pool.net_pool, 593_750);
    }

    #[test]
    fn test_prize_pool_without_rake() {
        let pool = calculate_prize_pool(&PrizePoolInput {
            buy_in: 2_500,
            entries: 7,
            ..Default::default()
        });
        assert_eq!(pool.gross_pool, 17_500);
        assert_eq!(pool.rake_amount, 0);
        assert_eq!(pool.net_pool, 17_500);
    }

    #[test]
    fn test_prize_pool_prices_reentries_separately() {
        let pool = calculate_prize_pool(&PrizePoolInput {
            buy_in: 10_000,
            entries: 20,
            reentries: 4,
            reentry_cost: 7_500,
            rake_percentage: 10.0,
            ..Default::default()
        });
        assert_eq!(pool.entry_pool, 230_000);
        assert_eq!(pool.rake_amount, 23_000);
        assert_eq!(pool.net_pool, 207_000);
    }

    #[test]
    fn test_payouts_remainder_goes_to_first_place() {
        let structure = [
            PayoutPlace::new(1, 33.34),
            PayoutPlace::new(2, 33.33),
            PayoutPlace::new(3, 33.33),
        ];
        let payouts = calculate_payouts(10_001, &structure).unwrap();

        // 3334.33 -> 3334, 3333.33 -> 3333 (twice), one cent left over
        assert_eq!(payouts[&2], 3_333);
        assert_eq!(payouts[&3], 3_333);
        assert_eq!(payouts[&1], 3_335);
        assert_eq!(payouts.values().sum::<i64>(), 10_001);
    }

    #[test]
    fn test_payouts_reject_invalid_structure() {
        let structure = [PayoutPlace::new(1, 60.0), PayoutPlace::new(2, 30.0)];
        let result = calculate_payouts(100_000, &structure);
        assert!(matches!(result, Err(PrizeError::InvalidStructure(_))));
    }

    #[test]
    fn test_payouts_reject_negative_pool() {
        let structure = [PayoutPlace::new(1, 100.0)];
        assert_eq!(
            calculate_payouts(-1, &structure),
            Err(PrizeError::InvalidAmount(-1))
        );
    }

    #[test]
    fn test_validate_structure_sum_not_hundred() {
        let result = validate_structure(&[PayoutPlace::new(1, 60.0), PayoutPlace::new(2, 30.0)]);
        assert!(!result.valid);
        assert_eq!(result.errors, vec!["Percentages sum to 90.00, expected 100"]);
    }

    #[test]
    fn test_validate_structure_tolerance() {
        let result = validate_structure(&[
            PayoutPlace::new(1, 50.005),
            PayoutPlace::new(2, 30.0),
            PayoutPlace::new(3, 20.0),
        ]);
        assert!(result.valid, "{}", result.message());
    }

    #[test]
    fn test_validate_structure_collects_every_problem() {
        let result = validate_structure(&[
            PayoutPlace::new(1, 50.0),
            PayoutPlace::new(1, 20.0),
            PayoutPlace::new(3, 20.0),
        ]);
        assert!(!result.valid);
        assert!(result.errors.contains(&"Duplicate place 1".to_string()));
        assert!(result.errors.contains(&"Missing place 2".to_string()));
        assert!(
            result
                .errors
                .contains(&"Percentages sum to 90.00, expected 100".to_string())
        );
    }

    #[test]
    fn test_validate_structure_empty() {
        let result = validate_structure(&[]);
        assert!(!result.valid);
        assert_eq!(result.message(), "Payout structure is empty");
    }

    #[test]
    fn test_validate_structure_must_start_at_one() {
        let result = validate_structure(&[PayoutPlace::new(2, 100.0)]);
        assert!(!result.valid);
        assert!(result.errors.contains(&"Missing place 1".to_string()));
    }
}
