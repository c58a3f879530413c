//! Player ledger: registrations, bust-outs, re-entries, rebuys, add-ons
//! and bounties.

pub mod errors;
pub mod manager;
pub mod models;

pub use errors::{LedgerError, LedgerResult};
pub use manager::LedgerManager;
pub use models::{
    BustOutcome, DeclineOutcome, EntryId, EntryStatus, LedgerTransaction, PlayerEntry,
    TransactionKind, WithdrawalStatus,
};
