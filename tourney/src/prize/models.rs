//! Prize data models and money helpers.

use serde::{Deserialize, Serialize};

/// Money amount in cents
pub type Cents = i64;

/// `amount * percentage / 100`, rounded to the cent (half away from zero)
pub fn percent_of(amount: Cents, percentage: f64) -> Cents {
    (amount as f64 * percentage / 100.0).round() as Cents
}

/// Parse a decimal amount such as `"5937.50"` or `"100"` into cents
pub fn parse_amount(raw: &str) -> Option<Cents> {
    let raw = raw.trim();
    let (negative, digits) = match raw.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, raw),
    };

    let (whole, fraction) = match digits.split_once('.') {
        Some((whole, fraction)) => (whole, fraction),
        None => (digits, ""),
    };

    if whole.is_empty() && fraction.is_empty() {
        return None;
    }
    if fraction.len() > 2 || !fraction.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }

    let whole: i64 = if whole.is_empty() { 0 } else { whole.parse().ok()? };
    let cents: i64 = match fraction.len() {
        0 => 0,
        1 => fraction.parse::<i64>().ok()? * 10,
        _ => fraction.parse().ok()?,
    };

    let amount = whole.checked_mul(100)?.checked_add(cents)?;
    Some(if negative { -amount } else { amount })
}

/// Format cents as a decimal amount with two places
pub fn format_amount(amount: Cents) -> String {
    let sign = if amount < 0 { "-" } else { "" };
    let abs = amount.unsigned_abs();
    format!("{}{}.{:02}", sign, abs / 100, abs % 100)
}

/// One row of a payout structure
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PayoutPlace {
    /// Finishing place (1-indexed)
    pub place: u32,
    /// Share of the net pool (0-100)
    pub percentage: f64,
}

impl PayoutPlace {
    pub fn new(place: u32, percentage: f64) -> Self {
        Self { place, percentage }
    }
}

/// Default payout structures
pub struct PayoutStructure;

impl PayoutStructure {
    /// Standard structure for a given number of entries
    ///
    /// - up to 5 entries: winner takes all
    /// - 6-9 entries: 60/40
    /// - 10-20 entries: 50/30/20
    /// - 21-30 entries: 40/25/17/10/8
    /// - larger fields: top ~15% on linearly decreasing weights
    pub fn standard(entries: usize) -> Vec<PayoutPlace> {
        let percentages: Vec<f64> = match entries {
            0..=5 => vec![100.0],
            6..=9 => vec![60.0, 40.0],
            10..=20 => vec![50.0, 30.0, 20.0],
            21..=30 => vec![40.0, 25.0, 17.0, 10.0, 8.0],
            _ => Self::linear((entries as f64 * 0.15).ceil() as usize),
        };

        percentages
            .into_iter()
            .enumerate()
            .map(|(idx, pct)| PayoutPlace::new(idx as u32 + 1, pct))
            .collect()
    }

    /// Linearly decreasing percentages over `places` places, summing to 100
    fn linear(places: usize) -> Vec<f64> {
        if places == 0 {
            return vec![100.0];
        }

        let total_weight = (places * (places + 1) / 2) as f64;
        let mut percentages: Vec<f64> = (0..places)
            .map(|i| {
                let weight = (places - i) as f64;
                (weight / total_weight * 10_000.0).round() / 100.0
            })
            .collect();

        // Rounding slack goes to first place
        let sum: f64 = percentages.iter().sum();
        percentages[0] = ((percentages[0] + 100.0 - sum) * 100.0).round() / 100.0;
        percentages
    }
}

/// Inputs of a prize pool calculation
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PrizePoolInput {
    pub buy_in: Cents,
    /// First entries, paid at `buy_in`
    pub entries: u32,
    /// Re-entries, paid at `reentry_cost`
    #[serde(default)]
    pub reentries: u32,
    #[serde(default)]
    pub reentry_cost: Cents,
    pub rebuys: u32,
    pub addons: u32,
    pub rebuy_cost: Cents,
    pub addon_cost: Cents,
    /// Rake taken from the gross pool (0-100)
    pub rake_percentage: f64,
}

/// Prize pool breakdown
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrizePoolBreakdown {
    pub entry_pool: Cents,
    pub rebuy_pool: Cents,
    pub addon_pool: Cents,
    pub gross_pool: Cents,
    pub rake_amount: Cents,
    pub net_pool: Cents,
}

/// Outcome of a payout structure validation
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StructureValidation {
    pub valid: bool,
    pub errors: Vec<String>,
}

impl StructureValidation {
    /// Human-readable summary
    pub fn message(&self) -> String {
        if self.valid {
            "Payout structure is valid".to_string()
        } else {
            self.errors.join("; ")
        }
    }
}

/// One player's share of a chopped pool
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChopShare<K> {
    pub player: K,
    pub amount: Cents,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_amount() {
        assert_eq!(parse_amount("5937.50"), Some(593_750));
        assert_eq!(parse_amount("100"), Some(10_000));
        assert_eq!(parse_amount("0.5"), Some(50));
        assert_eq!(parse_amount(".07"), Some(7));
        assert_eq!(parse_amount("-12.34"), Some(-1_234));
        assert_eq!(parse_amount("1.234"), None);
        assert_eq!(parse_amount("abc"), None);
        assert_eq!(parse_amount(""), None);
    }

    #[test]
    fn test_format_amount() {
        assert_eq!(format_amount(593_750), "5937.50");
        assert_eq!(format_amount(7), "0.07");
        assert_eq!(format_amount(-1_234), "-12.34");
    }

    #[test]
    fn test_percent_of_rounds_half_away_from_zero() {
        assert_eq!(percent_of(625_000, 5.0), 31_250);
        assert_eq!(percent_of(10_001, 50.0), 5_001);
        assert_eq!(percent_of(0, 33.0), 0);
    }

    #[test]
    fn test_standard_structures_sum_to_hundred() {
        for entries in [2, 5, 6, 9, 10, 20, 21, 30, 31, 100, 347] {
            let structure = PayoutStructure::standard(entries);
            let sum: f64 = structure.iter().map(|p| p.percentage).sum();
            assert!(
                (sum - 100.0).abs() < 0.01,
                "{} entries: structure sums to {}",
                entries,
                sum
            );
            assert_eq!(structure[0].place, 1);
        }
    }

    #[test]
    fn test_standard_structure_sizes() {
        assert_eq!(PayoutStructure::standard(5).len(), 1);
        assert_eq!(PayoutStructure::standard(8).len(), 2);
        assert_eq!(PayoutStructure::standard(12).len(), 3);
        assert_eq!(PayoutStructure::standard(25).len(), 5);
        assert_eq!(PayoutStructure::standard(100).len(), 15);
    }
}
