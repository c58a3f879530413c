//! Prize pool, payout and deal-making calculations.
//!
//! This module provides:
//! - Prize pool breakdown with rake (rounded to the cent at every stage)
//! - Payout distribution from a percentage structure
//! - Payout structure validation
//! - Chip chop, even chop and simplified ICM chop
//!
//! All amounts are integer cents, so "rounding to 2 decimals" is rounding to
//! whole cents and every distribution closes exactly on its pool.
//!
//! ## Example
//!
//! ```
//! use tourney::prize::{PayoutPlace, PrizePoolInput, calculate_payouts, calculate_prize_pool};
//!
//! let pool = calculate_prize_pool(&PrizePoolInput {
//!     buy_in: 10_000,
//!     entries: 50,
//!     rake_percentage: 5.0,
//!     ..Default::default()
//! });
//! let payouts = calculate_payouts(
//!     pool.net_pool,
//!     &[PayoutPlace::new(1, 60.0), PayoutPlace::new(2, 40.0)],
//! )
//! .unwrap();
//! assert_eq!(payouts.values().sum::<i64>(), pool.net_pool);
//! ```

pub mod calculator;
pub mod chop;
pub mod errors;
pub mod models;

pub use calculator::{calculate_payouts, calculate_prize_pool, validate_structure};
pub use chop::{calculate_chip_chop, calculate_even_chop, calculate_icm_chop};
pub use errors::{PrizeError, PrizeResult};
pub use models::{
    Cents, ChopShare, PayoutPlace, PayoutStructure, PrizePoolBreakdown, PrizePoolInput,
    StructureValidation, format_amount, parse_amount, percent_of,
};
