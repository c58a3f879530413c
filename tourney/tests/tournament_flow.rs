//! End-to-end tournament tests through the registry and actor handles.
//!
//! A full field is registered, seated by draw, whittled down with balancing
//! and table breaks, and played to a winner, with every mutation going
//! through the tournament's actor.

use std::{collections::HashSet, sync::Arc};
use tourney::{
    clock::ClockStatus,
    db::Repositories,
    time::SystemTimeSource,
    tournament::{
        ClockCommand, EngineConfig, EventBus, PlayerId, TournamentConfig, TournamentEngine,
        TournamentEvent, TournamentRegistry,
    },
};

fn registry() -> TournamentRegistry {
    let engine = TournamentEngine::new(
        Repositories::in_memory(),
        Arc::new(SystemTimeSource),
        EventBus::new(1024),
    );
    TournamentRegistry::new(engine, EngineConfig::default())
}

fn config() -> TournamentConfig {
    TournamentConfig::freezeout(1, "Sunday Major".to_string(), 10_000)
}

#[tokio::test]
async fn test_full_tournament_through_actor() {
    let registry = registry();
    let mut events = registry.engine().events().subscribe();
    let handle = registry.handle(1).await;

    handle.register_config(config()).await.unwrap();
    handle
        .clock(ClockCommand::Initialize { template_id: None })
        .await
        .unwrap();
    for _ in 0..3 {
        let table = handle.add_table(None).await.unwrap();
        assert_eq!(table.table.max_seats, 9);
    }
    for player_id in 1..=20 {
        handle.add_player(player_id, None).await.unwrap();
    }

    // Seat draw
    let (placed, unseated) = handle.seat_all_players(Some(42)).await.unwrap();
    assert_eq!(placed.len(), 20);
    assert!(unseated.is_empty());
    let seats: HashSet<_> = placed.iter().map(|(_, seat)| *seat).collect();
    assert_eq!(seats.len(), 20);

    let state = handle
        .clock(ClockCommand::Start { duration_secs: None })
        .await
        .unwrap();
    assert_eq!(state.status, ClockStatus::Running);
    assert_eq!(state.total_players, 20);

    // Eight busts, then rebalance
    for player_id in (13..=20).rev() {
        let outcome = handle.bust_player(player_id, 1, Some(1)).await.unwrap();
        assert_eq!(outcome.finish_position, Some(player_id as u32));
    }
    let seating = registry.engine().seating();
    let plan = seating.calculate_balance_plan(1).await.unwrap();
    let report = handle.execute_balance(plan).await.unwrap();
    assert!(report.is_complete());
    let counts: Vec<usize> = seating
        .get_tables(1, None)
        .await
        .unwrap()
        .iter()
        .filter(|t| t.is_active())
        .map(|t| t.player_count())
        .collect();
    let max = counts.iter().max().unwrap();
    let min = counts.iter().min().unwrap();
    assert!(max - min <= 1, "unbalanced after execution: {:?}", counts);

    let check = seating.check_final_table(1).await.unwrap();
    assert!(!check.is_final_table);
    assert_eq!(check.players_remaining, 12);

    for player_id in (9..=12).rev() {
        handle.bust_player(player_id, 1, Some(1)).await.unwrap();
    }
    let check = seating.check_final_table(1).await.unwrap();
    assert!(check.is_final_table);
    assert_eq!(check.players_remaining, 8);

    // Consolidate to one table
    while let Some(plan) = seating.suggest_table_break(1).await.unwrap() {
        let report = handle.execute_table_break(plan).await.unwrap();
        assert!(report.is_complete());
    }
    let check = seating.check_final_table(1).await.unwrap();
    assert_eq!(check.active_tables, 1);

    let players = registry.engine().ledger().get_tournament_players(1, None).await.unwrap();
    let seated: Vec<PlayerId> = players
        .iter()
        .filter(|e| e.seat_assignment.is_some())
        .map(|e| e.player_id)
        .collect();
    assert_eq!(seated.len(), 8);
    assert!(seated.iter().all(|&p| p <= 8));

    // Play down to a winner
    for player_id in (2..=8).rev() {
        let outcome = handle.bust_player(player_id, 1, Some(1)).await.unwrap();
        assert_eq!(outcome.tournament_completed, player_id == 2);
    }

    let state = registry.engine().clock().require_state(1).await.unwrap();
    assert_eq!(state.status, ClockStatus::Finished);
    assert_eq!(state.remaining_players, 0);

    let standings = registry.engine().ledger().get_final_standings(1).await.unwrap();
    assert_eq!(standings.len(), 20);
    assert!(
        standings
            .iter()
            .all(|e| e.finish_position == Some(e.player_id as u32))
    );
    let winner = &standings[0];
    assert_eq!(winner.knockouts, 19);

    let mut completed = None;
    while let Ok(event) = events.try_recv() {
        if let TournamentEvent::TournamentCompleted { winner, .. } = event {
            completed = Some(winner);
        }
    }
    assert_eq!(completed, Some(Some(1)));

    // Finished tournaments reject further commands
    let err = handle
        .clock(ClockCommand::Pause { time_remaining: 10 })
        .await
        .unwrap_err();
    assert_eq!(err.code(), "tournament_finished");
}

#[tokio::test]
async fn test_concurrent_registrations_are_serialized() {
    let registry = registry();
    let handle = registry.handle(1).await;
    handle.register_config(config()).await.unwrap();
    handle
        .clock(ClockCommand::Initialize { template_id: None })
        .await
        .unwrap();

    let mut tasks = Vec::new();
    for player_id in 1..=50 {
        let handle = handle.clone();
        tasks.push(tokio::spawn(async move {
            handle.add_player(player_id, None).await
        }));
    }
    // Player 1 registers twice; exactly one attempt wins
    let duplicate = {
        let handle = handle.clone();
        tokio::spawn(async move { handle.add_player(1, None).await })
    };

    let mut results = Vec::new();
    for task in tasks {
        results.push(task.await.unwrap());
    }
    results.push(duplicate.await.unwrap());

    let failures: Vec<_> = results.iter().filter_map(|r| r.as_ref().err()).collect();
    assert_eq!(failures.len(), 1);
    assert_eq!(failures[0].code(), "already_registered");

    let entries = registry.engine().ledger().get_tournament_players(1, None).await.unwrap();
    assert_eq!(entries.len(), 50);
    let players: HashSet<PlayerId> = entries.iter().map(|e| e.player_id).collect();
    assert_eq!(players.len(), 50);

    let state = registry.engine().clock().require_state(1).await.unwrap();
    assert_eq!(state.total_players, 50);
    assert_eq!(state.remaining_players, 50);
}

#[tokio::test]
async fn test_clock_break_uses_scheduled_length() {
    let registry = registry();
    let handle = registry.handle(1).await;
    handle.register_config(config()).await.unwrap();
    handle
        .clock(ClockCommand::Initialize { template_id: None })
        .await
        .unwrap();
    handle
        .clock(ClockCommand::Start { duration_secs: None })
        .await
        .unwrap();

    // Level 1 has no break after it
    let err = handle
        .clock(ClockCommand::StartBreak { minutes: None })
        .await
        .unwrap_err();
    assert_eq!(err.code(), "invalid_config");

    for _ in 0..3 {
        handle
            .clock(ClockCommand::AdvanceLevel { duration_secs: None })
            .await
            .unwrap();
    }
    let state = handle
        .clock(ClockCommand::StartBreak { minutes: None })
        .await
        .unwrap();
    assert_eq!(state.status, ClockStatus::Break);
    let until = state.break_until.unwrap();
    assert_eq!((until - state.updated_at).num_minutes(), 10);

    let state = handle
        .clock(ClockCommand::EndBreak { duration_secs: None })
        .await
        .unwrap();
    assert_eq!(state.current_level, 5);
}

#[tokio::test]
async fn test_commands_after_shutdown_fail() {
    let registry = registry();
    let handle = registry.handle(1).await;
    handle.shutdown().await.unwrap();

    // Give the actor a moment to drop its inbox
    tokio::task::yield_now().await;
    for _ in 0..100 {
        if handle.is_closed() {
            break;
        }
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
    }

    let err = handle.add_table(None).await.unwrap_err();
    assert_eq!(err.code(), "tournament_unavailable");
}
