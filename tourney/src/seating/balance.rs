//! Seat selection, balance and table-break planning.
//!
//! Everything here works on table snapshots and never touches storage.
//! Planning tracks virtual counts and virtual seat occupancy so that two
//! moves of the same plan never target the same seat.

use super::models::{
    BalanceMove, BalancePlan, FinalTableCheck, SeatRef, TableBreakPlan, TableId, TableLayout,
};
use crate::tournament::PlayerId;
use std::cmp::Reverse;

/// Working copy of a table used while planning
#[derive(Debug, Clone)]
struct VirtualTable {
    id: TableId,
    number: u32,
    /// Occupant per seat, index 0 is seat 1
    seats: Vec<Option<PlayerId>>,
}

impl VirtualTable {
    fn from_layout(layout: &TableLayout) -> Self {
        let mut seats = vec![None; usize::from(layout.table.max_seats)];
        for seat in &layout.seats {
            if let Some(slot) = seats.get_mut(usize::from(seat.seat_number).wrapping_sub(1)) {
                *slot = seat.player_id;
            }
        }
        Self {
            id: layout.table.id,
            number: layout.table.table_number,
            seats,
        }
    }

    fn count(&self) -> usize {
        self.seats.iter().filter(|s| s.is_some()).count()
    }

    fn capacity(&self) -> usize {
        self.seats.len()
    }

    fn take_free_seat(&mut self, player_id: PlayerId) -> Option<u8> {
        let idx = self.seats.iter().position(|s| s.is_none())?;
        self.seats[idx] = Some(player_id);
        Some(idx as u8 + 1)
    }

    /// Occupied seats, highest seat number first
    fn occupants_from_back(&self) -> Vec<(u8, PlayerId)> {
        self.seats
            .iter()
            .enumerate()
            .rev()
            .filter_map(|(idx, s)| s.map(|p| (idx as u8 + 1, p)))
            .collect()
    }

    fn vacate(&mut self, seat_number: u8) {
        if let Some(slot) = self.seats.get_mut(usize::from(seat_number) - 1) {
            *slot = None;
        }
    }
}

fn active_tables(tables: &[TableLayout]) -> Vec<VirtualTable> {
    let mut active: Vec<VirtualTable> = tables
        .iter()
        .filter(|t| t.is_active())
        .map(VirtualTable::from_layout)
        .collect();
    active.sort_by_key(|t| t.number);
    active
}

/// Seat for a newly arriving player
///
/// Among active tables with a free seat, the one with the fewest players
/// wins (lowest table number on ties); the player gets its lowest free seat.
pub fn select_seat(tables: &[TableLayout]) -> Option<SeatRef> {
    tables
        .iter()
        .filter(|t| t.is_active() && t.free_seat_count() > 0)
        .min_by_key(|t| (t.player_count(), t.table.table_number))
        .and_then(|t| t.first_free_seat().map(|seat| SeatRef::new(t.id(), seat)))
}

/// Seats for a batch of arriving players, in arrival order
///
/// Each player is placed by the [`select_seat`] rule against the tables as
/// they look after the previous placements. Players that do not fit are
/// returned unseated.
pub fn select_seats(
    tables: &[TableLayout],
    players: &[PlayerId],
) -> (Vec<(PlayerId, SeatRef)>, Vec<PlayerId>) {
    let mut virtual_tables = active_tables(tables);
    let mut seated = Vec::new();
    let mut unseated = Vec::new();

    for &player_id in players {
        let target = virtual_tables
            .iter_mut()
            .filter(|t| t.count() < t.capacity())
            .min_by_key(|t| (t.count(), t.number));

        match target.and_then(|t| t.take_free_seat(player_id).map(|seat| (t.id, seat))) {
            Some((table_id, seat)) => seated.push((player_id, SeatRef::new(table_id, seat))),
            None => unseated.push(player_id),
        }
    }

    (seated, unseated)
}

/// Player quotas for a balanced room, summing to `total`
///
/// Tables are filled up to a common `level`, small tables stopping at their
/// seat count. The players left over go one each to the fullest tables
/// (lowest number on ties) that still have a seat above `level`. With equal
/// seat counts this is `floor(avg)` or `ceil(avg)` everywhere.
fn balance_quotas(tables: &[VirtualTable], by_size: &[usize], total: usize) -> Vec<usize> {
    let filled = |level: usize| -> usize { tables.iter().map(|t| t.capacity().min(level)).sum() };
    let max_capacity = tables.iter().map(|t| t.capacity()).max().unwrap_or(0);

    let mut level = 0;
    while level < max_capacity && filled(level + 1) <= total {
        level += 1;
    }

    let mut quotas: Vec<usize> = tables.iter().map(|t| t.capacity().min(level)).collect();
    let mut leftover = total.saturating_sub(filled(level));
    for &idx in by_size {
        if leftover == 0 {
            break;
        }
        if tables[idx].capacity() > level {
            quotas[idx] += 1;
            leftover -= 1;
        }
    }
    quotas
}

/// Plan moves that bring active tables within one player of each other
///
/// Quotas come from `balance_quotas`, so when seat counts rule out an
/// even spread the small tables end up full and the rest within one player.
/// Tables above quota give players, starting with the fullest, from their
/// highest occupied seat. Each move goes to the emptiest table still below
/// quota (lowest number on ties), on its lowest free seat. The plan is
/// `balanced` when no move is needed.
pub fn plan_balance(tables: &[TableLayout]) -> BalancePlan {
    let mut virtual_tables = active_tables(tables);
    let table_count = virtual_tables.len();
    let total: usize = virtual_tables.iter().map(|t| t.count()).sum();

    let target_size = if table_count == 0 {
        0
    } else {
        total.div_ceil(table_count)
    };

    let max = virtual_tables.iter().map(|t| t.count()).max().unwrap_or(0);
    let min = virtual_tables.iter().map(|t| t.count()).min().unwrap_or(0);
    if table_count <= 1 || max - min <= 1 {
        return BalancePlan {
            target_size,
            balanced: true,
            moves: Vec::new(),
        };
    }

    // Fullest first; table number breaks ties
    let mut by_size: Vec<usize> = (0..table_count).collect();
    by_size.sort_by_key(|&idx| (Reverse(virtual_tables[idx].count()), virtual_tables[idx].number));

    let quotas = balance_quotas(&virtual_tables, &by_size, total);

    let sources: Vec<usize> = by_size
        .iter()
        .copied()
        .filter(|&idx| virtual_tables[idx].count() > quotas[idx])
        .collect();

    let mut moves = Vec::new();
    for source in sources {
        for (from_seat, player_id) in virtual_tables[source].occupants_from_back() {
            if virtual_tables[source].count() <= quotas[source] {
                break;
            }

            let destination = (0..table_count)
                .filter(|&idx| idx != source && virtual_tables[idx].count() < quotas[idx])
                .min_by_key(|&idx| (virtual_tables[idx].count(), virtual_tables[idx].number));
            let Some(destination) = destination else {
                break;
            };
            let Some(to_seat) = virtual_tables[destination].take_free_seat(player_id) else {
                break;
            };
            virtual_tables[source].vacate(from_seat);

            moves.push(BalanceMove {
                player_id,
                from_table: virtual_tables[source].id,
                from_seat,
                to_table: virtual_tables[destination].id,
                to_seat,
            });
        }
    }

    log::debug!(
        "Balance plan over {} tables, {} players: {} moves",
        table_count,
        total,
        moves.len()
    );

    BalancePlan {
        target_size,
        balanced: moves.is_empty(),
        moves,
    }
}

/// Plan breaking the table with the fewest players
///
/// Ties go to the highest table number. Returns `None` when there is no
/// other active table or the remaining tables lack the free seats. Players
/// fill the first free seat in table-number order.
pub fn plan_table_break(tables: &[TableLayout]) -> Option<TableBreakPlan> {
    let mut virtual_tables = active_tables(tables);
    if virtual_tables.len() < 2 {
        return None;
    }

    let breaking = virtual_tables
        .iter()
        .enumerate()
        .min_by_key(|(_, t)| (t.count(), Reverse(t.number)))
        .map(|(idx, _)| idx)?;

    let players: Vec<(u8, PlayerId)> = {
        let mut occupants = virtual_tables[breaking].occupants_from_back();
        occupants.reverse();
        occupants
    };
    let spare: usize = virtual_tables
        .iter()
        .enumerate()
        .filter(|(idx, _)| *idx != breaking)
        .map(|(_, t)| t.capacity() - t.count())
        .sum();
    if spare < players.len() {
        log::debug!(
            "Table {} cannot break: {} players, {} free seats elsewhere",
            virtual_tables[breaking].number,
            players.len(),
            spare
        );
        return None;
    }

    let from_table = virtual_tables[breaking].id;
    let table_number = virtual_tables[breaking].number;
    let mut moves = Vec::with_capacity(players.len());
    for (from_seat, player_id) in players {
        let (to_table, to_seat) = virtual_tables
            .iter_mut()
            .enumerate()
            .filter(|(idx, _)| *idx != breaking)
            .find_map(|(_, t)| t.take_free_seat(player_id).map(|seat| (t.id, seat)))?;
        moves.push(BalanceMove {
            player_id,
            from_table,
            from_seat,
            to_table,
            to_seat,
        });
    }

    Some(TableBreakPlan {
        table_id: from_table,
        table_number,
        moves,
    })
}

/// Final-table check against the number of players still in play
pub fn final_table_check(tables: &[TableLayout], players_remaining: usize) -> FinalTableCheck {
    let active: Vec<&TableLayout> = tables.iter().filter(|t| t.is_active()).collect();
    let max_seats = active.iter().map(|t| t.table.max_seats).max().unwrap_or(0);

    FinalTableCheck {
        is_final_table: active.len() > 1 && players_remaining <= usize::from(max_seats),
        players_remaining,
        max_seats,
        active_tables: active.len(),
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::seating::models::{Table, TableStatus};
    use chrono::Utc;

    /// Layout whose table `number` seats players `first..first + count`
    pub(crate) fn layout(number: u32, max_seats: u8, first: PlayerId, count: usize) -> TableLayout {
        let mut layout = TableLayout::empty(Table {
            id: i64::from(number) * 100,
            tournament_id: 1,
            table_number: number,
            max_seats,
            status: TableStatus::Active,
            created_at: Utc::now(),
        });
        for (idx, seat) in layout.seats.iter_mut().take(count).enumerate() {
            seat.player_id = Some(first + idx as PlayerId);
        }
        layout
    }

    fn counts_after(tables: &[TableLayout], moves: &[BalanceMove]) -> Vec<usize> {
        tables
            .iter()
            .map(|t| {
                let gained = moves.iter().filter(|m| m.to_table == t.id()).count();
                let lost = moves.iter().filter(|m| m.from_table == t.id()).count();
                t.player_count() + gained - lost
            })
            .collect()
    }

    #[test]
    fn test_select_seat_prefers_emptiest_then_lowest_number() {
        let tables = vec![layout(1, 9, 1, 5), layout(2, 9, 20, 3), layout(3, 9, 40, 3)];
        assert_eq!(select_seat(&tables), Some(SeatRef::new(200, 4)));
    }

    #[test]
    fn test_select_seat_skips_full_and_inactive_tables() {
        let mut breaking = layout(2, 9, 20, 1);
        breaking.table.status = TableStatus::Breaking;
        let tables = vec![layout(1, 2, 1, 2), breaking, layout(3, 9, 40, 6)];
        assert_eq!(select_seat(&tables), Some(SeatRef::new(300, 7)));

        let full = vec![layout(1, 2, 1, 2)];
        assert_eq!(select_seat(&full), None);
    }

    #[test]
    fn test_select_seats_spreads_batch() {
        let tables = vec![layout(1, 3, 1, 0), layout(2, 3, 20, 0)];
        let (seated, unseated) = select_seats(&tables, &[7, 8, 9, 10, 11, 12, 13]);
        assert_eq!(seated.len(), 6);
        assert_eq!(unseated, vec![13]);
        assert_eq!(seated[0], (7, SeatRef::new(100, 1)));
        assert_eq!(seated[1], (8, SeatRef::new(200, 1)));
        assert_eq!(seated[2], (9, SeatRef::new(100, 2)));
    }

    #[test]
    fn test_balance_plan_nine_seven_four() {
        let tables = vec![layout(1, 9, 1, 9), layout(2, 9, 20, 7), layout(3, 9, 40, 4)];
        let plan = plan_balance(&tables);

        assert!(!plan.balanced);
        assert_eq!(plan.target_size, 7);
        // Quotas 7/7/6: two players leave table 1 for table 3
        assert_eq!(plan.moves.len(), 2);
        assert_eq!(counts_after(&tables, &plan.moves), vec![7, 7, 6]);
        assert!(plan.moves.iter().all(|m| m.to_table == 300));
    }

    #[test]
    fn test_balance_plan_moves_target_distinct_seats() {
        let tables = vec![layout(1, 9, 1, 9), layout(2, 9, 20, 1), layout(3, 9, 40, 1)];
        let plan = plan_balance(&tables);

        let mut targets: Vec<(TableId, u8)> =
            plan.moves.iter().map(|m| (m.to_table, m.to_seat)).collect();
        let before = targets.len();
        targets.sort_unstable();
        targets.dedup();
        assert_eq!(targets.len(), before);

        let counts = counts_after(&tables, &plan.moves);
        let max = counts.iter().max().unwrap();
        let min = counts.iter().min().unwrap();
        assert!(max - min <= 1);
    }

    #[test]
    fn test_balance_plan_with_short_table() {
        // A 2-max cannot take its share of the ceiling; the other 9-max does
        let tables = vec![layout(1, 9, 1, 8), layout(2, 2, 20, 0), layout(3, 9, 40, 0)];
        let plan = plan_balance(&tables);

        assert!(!plan.balanced);
        assert_eq!(plan.moves.len(), 5);
        let counts = counts_after(&tables, &plan.moves);
        assert_eq!(counts, vec![3, 2, 3]);

        let after = vec![layout(1, 9, 1, 3), layout(2, 2, 20, 2), layout(3, 9, 40, 3)];
        let replan = plan_balance(&after);
        assert!(replan.balanced);
        assert!(replan.moves.is_empty());
    }

    #[test]
    fn test_balance_plan_fills_small_table_when_spread_is_unreachable() {
        let tables = vec![layout(1, 2, 1, 0), layout(2, 9, 20, 9)];
        let plan = plan_balance(&tables);

        assert_eq!(counts_after(&tables, &plan.moves), vec![2, 7]);

        // Best reachable layout: nothing left to move
        let after = vec![layout(1, 2, 1, 2), layout(2, 9, 20, 7)];
        let replan = plan_balance(&after);
        assert!(replan.balanced);
        assert!(replan.moves.is_empty());
    }

    #[test]
    fn test_balanced_tables_need_no_moves() {
        let tables = vec![layout(1, 9, 1, 8), layout(2, 9, 20, 7)];
        let plan = plan_balance(&tables);
        assert!(plan.balanced);
        assert!(plan.moves.is_empty());
        assert_eq!(plan.target_size, 8);
    }

    #[test]
    fn test_single_table_is_always_balanced() {
        let tables = vec![layout(1, 9, 1, 2)];
        assert!(plan_balance(&tables).balanced);
        assert_eq!(plan_table_break(&tables), None);
    }

    #[test]
    fn test_break_picks_fewest_players_highest_number() {
        let tables = vec![layout(1, 9, 1, 6), layout(2, 9, 20, 3), layout(3, 9, 40, 3)];
        let plan = plan_table_break(&tables).unwrap();

        assert_eq!(plan.table_number, 3);
        assert_eq!(plan.moves.len(), 3);
        // Table 1 has three free seats (7, 8, 9) and is filled first
        assert_eq!(plan.moves[0].to_table, 100);
        assert_eq!(plan.moves[0].to_seat, 7);
        assert_eq!(plan.moves[2].to_seat, 9);
    }

    #[test]
    fn test_break_requires_spare_capacity() {
        let tables = vec![layout(1, 9, 1, 8), layout(2, 9, 20, 8)];
        assert_eq!(plan_table_break(&tables), None);
    }

    #[test]
    fn test_final_table_check() {
        let tables = vec![layout(1, 9, 1, 5), layout(2, 9, 20, 4)];
        let check = final_table_check(&tables, 9);
        assert!(check.is_final_table);
        assert_eq!(check.active_tables, 2);

        assert!(!final_table_check(&tables, 10).is_final_table);
        assert!(!final_table_check(&tables[..1], 5).is_final_table);
    }
}
