//! Tournament and engine configuration models.

use super::{errors::ConfigError, models::TournamentId};
use crate::prize::{Cents, PayoutPlace, validate_structure};
use serde::{Deserialize, Serialize};
use std::env;

/// Maximum number of seats a table may have
pub const MAX_TABLE_SEATS: u8 = 12;

/// Minimum number of seats a table may have
pub const MIN_TABLE_SEATS: u8 = 2;

/// One level of the blind schedule
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlindLevel {
    /// Level number (1-indexed)
    pub level: u32,
    /// Small blind amount
    pub small_blind: i64,
    /// Big blind amount
    pub big_blind: i64,
    /// Ante amount (optional)
    pub ante: Option<i64>,
    /// Duration of this level in seconds
    pub duration_secs: u32,
    /// Break scheduled after this level, in minutes
    pub break_after_mins: Option<u32>,
}

impl BlindLevel {
    /// Create a new blind level
    pub fn new(level: u32, small_blind: i64, big_blind: i64, duration_secs: u32) -> Self {
        Self {
            level,
            small_blind,
            big_blind,
            ante: None,
            duration_secs,
            break_after_mins: None,
        }
    }

    /// Create a blind level with ante
    pub fn with_ante(mut self, ante: i64) -> Self {
        self.ante = Some(ante);
        self
    }

    /// Schedule a break after this level
    pub fn with_break(mut self, minutes: u32) -> Self {
        self.break_after_mins = Some(minutes);
        self
    }
}

/// Re-entry policy
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReentryPolicy {
    pub allow: bool,
    /// Last level at which a re-entry is accepted (`None` = no cutoff)
    pub until_level: Option<u32>,
    /// Maximum number of re-entries per player (`None` = unlimited)
    pub limit: Option<u32>,
    /// Chips for a re-entry (defaults to the starting stack)
    pub chips: Option<i64>,
    /// Cost of a re-entry (defaults to the buy-in)
    pub cost: Option<Cents>,
}

impl ReentryPolicy {
    /// Whether re-entries are open at `level`
    pub fn is_open_at(&self, level: u32) -> bool {
        self.allow && self.until_level.is_none_or(|cutoff| level <= cutoff)
    }

    /// Whether a player holding `entries` entries may take another one
    pub fn has_entries_left(&self, entries: usize) -> bool {
        self.limit.is_none_or(|limit| entries < limit as usize + 1)
    }
}

/// Rebuy policy
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RebuyPolicy {
    pub allow: bool,
    /// Last level at which rebuys are accepted (`None` = no cutoff)
    pub until_level: Option<u32>,
    /// Maximum rebuys per entry (`None` = unlimited)
    pub limit: Option<u32>,
    pub chips: i64,
    pub cost: Cents,
}

/// Add-on policy
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddonPolicy {
    pub allow: bool,
    /// First level at which add-ons are offered
    pub at_level: u32,
    /// Last level at which add-ons are offered (`None` = only `at_level`)
    pub until_level: Option<u32>,
    /// Maximum add-ons per entry
    pub limit: u32,
    pub chips: i64,
    pub cost: Cents,
}

impl Default for AddonPolicy {
    fn default() -> Self {
        Self {
            allow: false,
            at_level: 1,
            until_level: None,
            limit: 1,
            chips: 0,
            cost: 0,
        }
    }
}

impl AddonPolicy {
    /// Last level at which add-ons are offered
    pub fn last_level(&self) -> u32 {
        self.until_level.unwrap_or(self.at_level)
    }
}

/// Bounty variants
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BountyKind {
    #[default]
    None,
    /// Eliminator collects the whole bounty
    Fixed,
    /// Progressive knockout: part is paid, the rest rides on the eliminator
    Pko,
}

impl std::fmt::Display for BountyKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BountyKind::None => write!(f, "none"),
            BountyKind::Fixed => write!(f, "fixed"),
            BountyKind::Pko => write!(f, "pko"),
        }
    }
}

/// Bounty policy
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BountyPolicy {
    pub kind: BountyKind,
    /// Bounty placed on every entry at registration
    pub amount: Cents,
    /// Share of a PKO bounty paid out immediately (0-100)
    pub pko_percentage: f64,
}

impl Default for BountyPolicy {
    fn default() -> Self {
        Self {
            kind: BountyKind::None,
            amount: 0,
            pko_percentage: 50.0,
        }
    }
}

impl BountyPolicy {
    /// Whether eliminations pay bounties
    pub fn is_active(&self) -> bool {
        self.kind != BountyKind::None
    }
}

/// Tournament configuration provided by the surrounding application
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TournamentConfig {
    pub tournament_id: TournamentId,
    /// Tournament name
    pub name: String,
    /// Buy-in amount
    pub buy_in: Cents,
    /// Starting chip stack for each entry
    pub starting_chips: i64,
    /// Rake taken from the gross pool (0-100)
    pub rake_percentage: f64,
    /// Blind level structure
    pub levels: Vec<BlindLevel>,
    pub reentry: ReentryPolicy,
    pub rebuy: RebuyPolicy,
    pub addon: AddonPolicy,
    pub bounty: BountyPolicy,
    /// Last level at which new players may register (`None` = until finish)
    pub late_registration_until_level: Option<u32>,
    /// Payout percentages by place
    pub payout_structure: Vec<PayoutPlace>,
}

impl TournamentConfig {
    /// Create a freezeout with a standard 20-minute structure
    pub fn freezeout(tournament_id: TournamentId, name: String, buy_in: Cents) -> Self {
        let blinds = [
            (25, 50),
            (50, 100),
            (75, 150),
            (100, 200),
            (150, 300),
            (200, 400),
            (300, 600),
            (400, 800),
            (500, 1000),
            (700, 1400),
        ];

        let levels = blinds
            .iter()
            .enumerate()
            .map(|(idx, &(small, big))| {
                let level = BlindLevel::new(idx as u32 + 1, small, big, 1200);
                if level.level == 4 {
                    level.with_break(10)
                } else {
                    level
                }
            })
            .collect();

        Self {
            tournament_id,
            name,
            buy_in,
            starting_chips: 10_000,
            rake_percentage: 0.0,
            levels,
            reentry: ReentryPolicy::default(),
            rebuy: RebuyPolicy::default(),
            addon: AddonPolicy::default(),
            bounty: BountyPolicy::default(),
            late_registration_until_level: None,
            payout_structure: Vec::new(),
        }
    }

    /// Get blind level by number
    pub fn level(&self, level: u32) -> Option<&BlindLevel> {
        self.levels.iter().find(|bl| bl.level == level)
    }

    /// Duration of `level` in seconds, if configured
    pub fn level_duration(&self, level: u32) -> Option<u32> {
        self.level(level).map(|bl| bl.duration_secs)
    }

    /// Chips handed out on a re-entry
    pub fn reentry_chips(&self) -> i64 {
        self.reentry.chips.unwrap_or(self.starting_chips)
    }

    /// Price of a re-entry
    pub fn reentry_cost(&self) -> Cents {
        self.reentry.cost.unwrap_or(self.buy_in)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.buy_in < 0 {
            return Err(ConfigError::Invalid("Buy-in cannot be negative".to_string()));
        }

        if self.starting_chips <= 0 {
            return Err(ConfigError::Invalid(
                "Starting chips must be positive".to_string(),
            ));
        }

        if !(0.0..=100.0).contains(&self.rake_percentage) {
            return Err(ConfigError::Invalid(format!(
                "Rake percentage must be between 0 and 100, got {}",
                self.rake_percentage
            )));
        }

        if self.levels.is_empty() {
            return Err(ConfigError::Invalid(
                "Blind structure has no levels".to_string(),
            ));
        }

        for (idx, level) in self.levels.iter().enumerate() {
            if level.level != idx as u32 + 1 {
                return Err(ConfigError::Invalid(format!(
                    "Blind levels must be numbered 1..{}, found level {} at position {}",
                    self.levels.len(),
                    level.level,
                    idx + 1
                )));
            }
            if level.big_blind < level.small_blind {
                return Err(ConfigError::Invalid(format!(
                    "Level {}: big blind must be at least the small blind",
                    level.level
                )));
            }
            if level.duration_secs == 0 {
                return Err(ConfigError::Invalid(format!(
                    "Level {}: duration must be positive",
                    level.level
                )));
            }
        }

        if self.bounty.is_active() {
            if self.bounty.amount <= 0 {
                return Err(ConfigError::Invalid(
                    "Bounty amount must be positive".to_string(),
                ));
            }
            if !(0.0..=100.0).contains(&self.bounty.pko_percentage) {
                return Err(ConfigError::Invalid(
                    "PKO percentage must be between 0 and 100".to_string(),
                ));
            }
        }

        if self.addon.allow && self.addon.last_level() < self.addon.at_level {
            return Err(ConfigError::Invalid(
                "Add-on window closes before it opens".to_string(),
            ));
        }

        if !self.payout_structure.is_empty() {
            let validation = validate_structure(&self.payout_structure);
            if !validation.valid {
                return Err(ConfigError::Invalid(validation.message()));
            }
        }

        Ok(())
    }
}

/// Runtime settings of the engine
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    /// Capacity of each tournament actor's inbox
    pub inbox_capacity: usize,
    /// Capacity of each event subscriber channel
    pub event_buffer: usize,
    /// Seats used when a caller does not specify a table size
    pub default_max_seats: u8,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            inbox_capacity: 100,
            event_buffer: 256,
            default_max_seats: 9,
        }
    }
}

impl EngineConfig {
    /// Create configuration from environment variables
    ///
    /// Expected environment variables:
    /// - `TOURNEY_INBOX_CAPACITY`: actor inbox size (default: 100)
    /// - `TOURNEY_EVENT_BUFFER`: subscriber buffer size (default: 256)
    /// - `TOURNEY_DEFAULT_MAX_SEATS`: default table size (default: 9)
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidVar` if a variable is set but malformed
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let config = Self {
            inbox_capacity: parse_env_or("TOURNEY_INBOX_CAPACITY", defaults.inbox_capacity)?,
            event_buffer: parse_env_or("TOURNEY_EVENT_BUFFER", defaults.event_buffer)?,
            default_max_seats: parse_env_or(
                "TOURNEY_DEFAULT_MAX_SEATS",
                defaults.default_max_seats,
            )?,
        };

        config.validate()?;
        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.inbox_capacity == 0 || self.event_buffer == 0 {
            return Err(ConfigError::Invalid(
                "Channel capacities must be positive".to_string(),
            ));
        }

        if !(MIN_TABLE_SEATS..=MAX_TABLE_SEATS).contains(&self.default_max_seats) {
            return Err(ConfigError::Invalid(format!(
                "Default table size must be between {} and {}",
                MIN_TABLE_SEATS, MAX_TABLE_SEATS
            )));
        }

        Ok(())
    }
}

fn parse_env_or<T: std::str::FromStr>(var: &str, default: T) -> Result<T, ConfigError> {
    match env::var(var) {
        Ok(raw) => raw.parse().map_err(|_| ConfigError::InvalidVar {
            var: var.to_string(),
            value: raw,
        }),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_freezeout_config_is_valid() {
        let config = TournamentConfig::freezeout(1, "Friday Freezeout".to_string(), 10_000);
        assert!(config.validate().is_ok());
        assert_eq!(config.levels.len(), 10);
        assert_eq!(config.level_duration(1), Some(1200));
        assert_eq!(config.level(4).unwrap().break_after_mins, Some(10));
        assert_eq!(config.level(11), None);
    }

    #[test]
    fn test_reentry_defaults_to_buy_in_and_starting_stack() {
        let config = TournamentConfig::freezeout(1, "Test".to_string(), 5_000);
        assert_eq!(config.reentry_chips(), 10_000);
        assert_eq!(config.reentry_cost(), 5_000);
    }

    #[test]
    fn test_reentry_window_and_limit() {
        let policy = ReentryPolicy {
            allow: true,
            until_level: Some(4),
            limit: Some(1),
            ..Default::default()
        };
        assert!(policy.is_open_at(4));
        assert!(!policy.is_open_at(5));
        assert!(policy.has_entries_left(1));
        assert!(!policy.has_entries_left(2));

        let closed = ReentryPolicy::default();
        assert!(!closed.is_open_at(1));
    }

    #[test]
    fn test_validate_rejects_gapped_levels() {
        let mut config = TournamentConfig::freezeout(1, "Test".to_string(), 10_000);
        config.levels.remove(2);
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_validate_rejects_bad_payout_structure() {
        let mut config = TournamentConfig::freezeout(1, "Test".to_string(), 10_000);
        config.payout_structure = vec![PayoutPlace::new(1, 60.0), PayoutPlace::new(2, 30.0)];
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_engine_config_defaults_are_valid() {
        let config = EngineConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.default_max_seats, 9);
    }
}
