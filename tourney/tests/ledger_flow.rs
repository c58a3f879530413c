//! Player ledger integration tests.
//!
//! Runs whole tournaments through the engine: bust-out ordering,
//! progressive bounties, re-entries and the statistics derived from them.

use chrono::{TimeZone, Utc};
use proptest::prelude::*;
use std::sync::Arc;
use tourney::{
    clock::ClockStatus,
    db::Repositories,
    ledger::{EntryStatus, TransactionKind},
    time::ManualTimeSource,
    tournament::{
        BountyKind, BountyPolicy, EventBus, PlayerId, RebuyPolicy, ReentryPolicy, TournamentConfig,
        TournamentEngine, TournamentEvent,
    },
};

async fn engine(config: TournamentConfig) -> (TournamentEngine, ManualTimeSource) {
    let time = ManualTimeSource::new(Utc.with_ymd_and_hms(2026, 6, 12, 19, 30, 0).unwrap());
    let engine = TournamentEngine::new(
        Repositories::in_memory(),
        Arc::new(time.clone()),
        EventBus::default(),
    );
    engine.register_config(&config).await.unwrap();
    engine.clock().initialize(config.tournament_id, None).await.unwrap();
    (engine, time)
}

async fn register_and_start(engine: &TournamentEngine, players: &[PlayerId]) {
    for &player_id in players {
        engine.ledger().add_player(1, player_id, None).await.unwrap();
    }
    engine.clock().start_default(1).await.unwrap();
}

fn freezeout() -> TournamentConfig {
    TournamentConfig::freezeout(1, "Ledger".to_string(), 10_000)
}

// ============================================================================
// Bust-out ordering
// ============================================================================

fn bust_order_strategy() -> impl Strategy<Value = Vec<PlayerId>> {
    (2i64..=10).prop_flat_map(|n| Just((1..=n).collect::<Vec<PlayerId>>()).prop_shuffle())
}

proptest! {
    /// Without re-entries, N bust-outs hand out places N..1 exactly once
    #[test]
    fn prop_finish_positions_are_a_permutation(order in bust_order_strategy()) {
        let runtime = tokio::runtime::Runtime::new().unwrap();
        runtime.block_on(async {
            let n = order.len() as u32;
            let winner = order[n as usize - 1];
            let (engine, time) = engine(freezeout()).await;
            register_and_start(&engine, &order).await;

            for (idx, &player_id) in order[..order.len() - 1].iter().enumerate() {
                time.advance_secs(30);
                let eliminator = if idx % 2 == 0 { Some(winner) } else { None };
                let outcome = engine
                    .ledger()
                    .bust_player(1, player_id, 1, eliminator)
                    .await
                    .unwrap();

                prop_assert!(!outcome.can_reentry);
                prop_assert_eq!(outcome.finish_position, Some(n - idx as u32));
                prop_assert_eq!(outcome.remaining_count, n - idx as u32 - 1);
                prop_assert_eq!(outcome.tournament_completed, idx as u32 == n - 2);
            }

            let standings = engine.ledger().get_final_standings(1).await.unwrap();
            let positions: Vec<u32> = standings.iter().filter_map(|e| e.finish_position).collect();
            prop_assert_eq!(positions, (1..=n).collect::<Vec<u32>>());
            prop_assert_eq!(standings[0].player_id, winner);
            prop_assert!(standings.iter().all(|e| e.status == EntryStatus::Completed));

            let timeline = engine.ledger().get_bustout_timeline(1).await.unwrap();
            let busted: Vec<PlayerId> = timeline.iter().map(|e| e.player_id).collect();
            prop_assert_eq!(busted, order[..order.len() - 1].to_vec());

            let clock = engine.clock().require_state(1).await.unwrap();
            prop_assert_eq!(clock.status, ClockStatus::Finished);
            Ok(())
        })?;
    }
}

// ============================================================================
// Bounties
// ============================================================================

#[tokio::test]
async fn test_pko_bounty_carries_forward() {
    let mut config = freezeout();
    config.bounty = BountyPolicy {
        kind: BountyKind::Pko,
        amount: 10_000,
        pko_percentage: 50.0,
    };
    let (engine, _) = engine(config).await;
    let mut events = engine.events().subscribe();
    register_and_start(&engine, &[1, 2, 3]).await;

    let outcome = engine.ledger().bust_player(1, 3, 1, Some(2)).await.unwrap();
    assert_eq!(outcome.bounty_earned, 5_000);

    let two = engine.ledger().get_tournament_players(1, None).await.unwrap();
    let two = two.iter().find(|e| e.player_id == 2).unwrap();
    assert_eq!(two.bounties_earned, 5_000);
    assert_eq!(two.bounty_amount, 15_000);
    assert_eq!(two.knockouts, 1);

    // The grown bounty is what the next eliminator collects half of
    let outcome = engine.ledger().bust_player(1, 2, 1, Some(1)).await.unwrap();
    assert_eq!(outcome.bounty_earned, 7_500);
    assert!(outcome.tournament_completed);

    let entries = engine.ledger().get_tournament_players(1, None).await.unwrap();
    let one = entries.iter().find(|e| e.player_id == 1).unwrap();
    assert_eq!(one.bounties_earned, 7_500);
    assert_eq!(one.bounty_amount, 17_500);
    assert_eq!(one.finish_position, Some(1));

    let bounties: Vec<i64> = engine
        .ledger()
        .get_transactions(1)
        .await
        .unwrap()
        .iter()
        .filter(|t| t.kind == TransactionKind::Bounty)
        .map(|t| t.amount)
        .collect();
    assert_eq!(bounties, vec![5_000, 7_500]);

    let mut awarded = Vec::new();
    while let Ok(event) = events.try_recv() {
        if let TournamentEvent::BountyAwarded {
            amount,
            carried_forward,
            ..
        } = event
        {
            awarded.push((amount, carried_forward));
        }
    }
    assert_eq!(awarded, vec![(5_000, 5_000), (7_500, 7_500)]);
}

#[tokio::test]
async fn test_eliminator_must_be_in_play() {
    let (engine, _) = engine(freezeout()).await;
    register_and_start(&engine, &[1, 2, 3]).await;

    engine.ledger().bust_player(1, 3, 1, Some(1)).await.unwrap();

    let err = engine.ledger().bust_player(1, 2, 1, Some(3)).await.unwrap_err();
    assert_eq!(err.code(), "not_registered");
    let err = engine.ledger().bust_player(1, 2, 1, Some(2)).await.unwrap_err();
    assert_eq!(err.code(), "not_registered");

    // Nothing was written by the rejected calls
    let entries = engine.ledger().get_tournament_players(1, None).await.unwrap();
    let two = entries.iter().find(|e| e.player_id == 2).unwrap();
    assert!(two.is_in_play());
}

// ============================================================================
// Re-entries and statistics
// ============================================================================

#[tokio::test]
async fn test_reentry_tournament_stats() {
    let mut config = freezeout();
    config.reentry = ReentryPolicy {
        allow: true,
        until_level: Some(2),
        limit: Some(1),
        chips: None,
        cost: None,
    };
    config.rebuy = RebuyPolicy {
        allow: true,
        until_level: None,
        limit: None,
        chips: 5_000,
        cost: 5_000,
    };
    let (engine, _) = engine(config).await;
    register_and_start(&engine, &[1, 2, 3, 4]).await;

    engine.ledger().process_rebuy(1, 1).await.unwrap();
    let outcome = engine.ledger().bust_player(1, 4, 1, Some(1)).await.unwrap();
    assert!(outcome.can_reentry);
    assert_eq!(outcome.finish_position, None);

    // Pending players still count as remaining
    let clock = engine.clock().require_state(1).await.unwrap();
    assert_eq!(clock.remaining_players, 4);

    let reentry = engine.ledger().reentry_player(1, 4).await.unwrap();
    assert_eq!(reentry.entry_number, 2);
    assert!(reentry.is_reentry);

    let stats = engine.stats(1).await.unwrap();
    assert_eq!(stats.total_entries, 5);
    assert_eq!(stats.unique_players, 4);
    assert_eq!(stats.reentries, 1);
    assert_eq!(stats.total_rebuys, 1);
    assert_eq!(stats.players_remaining, 4);
    assert_eq!(stats.prize_pool.gross_pool, 55_000);
    assert_eq!(stats.payouts.get(&1), Some(&55_000));
    assert_eq!(stats.chip_leader.map(|c| c.player_id), Some(1));
    assert_eq!(stats.chip_leader.map(|c| c.chip_count), Some(15_000));

    // Past the cutoff, busts are final
    engine.clock().advance_to_next_level(1).await.unwrap();
    engine.clock().advance_to_next_level(1).await.unwrap();

    let outcome = engine.ledger().bust_player(1, 4, 2, Some(2)).await.unwrap();
    assert!(!outcome.can_reentry);
    assert_eq!(outcome.finish_position, Some(4));
    let err = engine.ledger().reentry_player(1, 4).await.unwrap_err();
    assert_eq!(err.code(), "reentry_closed");

    engine.ledger().bust_player(1, 3, 1, None).await.unwrap();
    let outcome = engine.ledger().bust_player(1, 2, 1, None).await.unwrap();
    assert!(outcome.tournament_completed);

    let stats = engine.stats(1).await.unwrap();
    assert_eq!(stats.status, Some(ClockStatus::Finished));
    assert!(stats.in_the_money);
    assert!(!stats.on_the_bubble);

    let standings = engine.ledger().get_final_standings(1).await.unwrap();
    let places: Vec<(PlayerId, u32)> = standings
        .iter()
        .filter_map(|e| e.finish_position.map(|p| (e.player_id, p)))
        .collect();
    assert_eq!(places, vec![(1, 1), (2, 2), (3, 3), (4, 4)]);
}

#[tokio::test]
async fn test_bubble_detection() {
    let mut config = freezeout();
    config.payout_structure = vec![
        tourney::prize::PayoutPlace::new(1, 70.0),
        tourney::prize::PayoutPlace::new(2, 30.0),
    ];
    let (engine, _) = engine(config).await;
    register_and_start(&engine, &[1, 2, 3, 4]).await;

    assert!(!engine.stats(1).await.unwrap().on_the_bubble);

    engine.ledger().bust_player(1, 4, 1, None).await.unwrap();
    let stats = engine.stats(1).await.unwrap();
    assert!(stats.on_the_bubble);
    assert!(!stats.in_the_money);

    engine.ledger().bust_player(1, 3, 1, None).await.unwrap();
    let stats = engine.stats(1).await.unwrap();
    assert!(!stats.on_the_bubble);
    assert!(stats.in_the_money);
    assert_eq!(stats.payouts.get(&2), Some(&12_000));
}
