//! Tournament actor message types.

use super::{PlayerId, TournamentConfig, errors::TournamentResult};
use crate::{
    clock::ClockState,
    ledger::{BustOutcome, DeclineOutcome, EntryId, EntryStatus, PlayerEntry},
    prize::Cents,
    seating::{BalanceMove, BalancePlan, ExecutionReport, SeatRef, TableBreakPlan, TableId, TableLayout},
};
use tokio::sync::oneshot;

/// Reply channel of a command
pub type Reply<T> = oneshot::Sender<TournamentResult<T>>;

/// Seats taken by a draw and the players left without one
pub type SeatDraw = (Vec<(PlayerId, SeatRef)>, Vec<PlayerId>);

/// Clock transitions
///
/// A missing duration means the one configured for the level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClockCommand {
    Initialize { template_id: Option<i64> },
    Start { duration_secs: Option<i64> },
    Pause { time_remaining: i64 },
    Resume,
    AdvanceLevel { duration_secs: Option<i64> },
    /// A missing length means the break scheduled after the current level
    StartBreak { minutes: Option<i64> },
    EndBreak { duration_secs: Option<i64> },
    AddTime { seconds: i64 },
    /// Finish the clock and close the ledger
    Finish,
}

/// Messages that can be sent to a TournamentActor
#[derive(Debug)]
pub enum TournamentMessage {
    /// Validate and store the configuration
    RegisterConfig {
        config: Box<TournamentConfig>,
        response: Reply<()>,
    },

    Clock {
        command: ClockCommand,
        response: Reply<ClockState>,
    },

    /// Remove the clock state
    DeleteClock { response: Reply<bool> },

    AddPlayer {
        player_id: PlayerId,
        paid_amount: Option<Cents>,
        response: Reply<PlayerEntry>,
    },

    RemovePlayer {
        player_id: PlayerId,
        response: Reply<()>,
    },

    UpdatePlayerStatus {
        entry_id: EntryId,
        status: EntryStatus,
        response: Reply<PlayerEntry>,
    },

    UpdateChipCount {
        entry_id: EntryId,
        chips: i64,
        response: Reply<PlayerEntry>,
    },

    BustPlayer {
        player_id: PlayerId,
        entry_number: u32,
        eliminated_by: Option<PlayerId>,
        response: Reply<BustOutcome>,
    },

    Reentry {
        player_id: PlayerId,
        response: Reply<PlayerEntry>,
    },

    Rebuy {
        player_id: PlayerId,
        response: Reply<PlayerEntry>,
    },

    Addon {
        player_id: PlayerId,
        response: Reply<PlayerEntry>,
    },

    DeclineReentry {
        player_id: PlayerId,
        response: Reply<DeclineOutcome>,
    },

    /// Open a table; a missing size means the engine default
    AddTable {
        max_seats: Option<u8>,
        response: Reply<TableLayout>,
    },

    RemoveTable {
        table_id: TableId,
        response: Reply<()>,
    },

    MovePlayer {
        player_id: PlayerId,
        to_table: TableId,
        to_seat: u8,
        response: Reply<BalanceMove>,
    },

    UnseatPlayer {
        player_id: PlayerId,
        response: Reply<Option<SeatRef>>,
    },

    AutoSeat {
        player_id: PlayerId,
        response: Reply<SeatRef>,
    },

    SeatAll {
        seed: Option<u64>,
        response: Reply<SeatDraw>,
    },

    ExecuteBalance {
        plan: BalancePlan,
        response: Reply<ExecutionReport>,
    },

    ExecuteTableBreak {
        plan: TableBreakPlan,
        response: Reply<ExecutionReport>,
    },

    /// Stop the actor after the messages already queued
    Shutdown,
}
