//! Tables, seats and table balancing.

pub mod balance;
pub mod errors;
pub mod manager;
pub mod models;

pub use balance::{final_table_check, plan_balance, plan_table_break, select_seat, select_seats};
pub use errors::{SeatingError, SeatingResult};
pub use manager::SeatingManager;
pub use models::{
    BalanceMove, BalancePlan, ExecutionReport, FinalTableCheck, MoveFailure, Seat, SeatRef, Table,
    TableBreakPlan, TableId, TableLayout, TableStatus,
};
