//! Operator console for the live tournament engine.
//!
//! Prize and chop commands run offline. Every other command works on the
//! PostgreSQL database named by `DATABASE_URL`, sending mutations through
//! the tournament's actor.

mod parse;

use anyhow::{Context, Result, bail};
use log::info;
use pico_args::Arguments;
use serde::Serialize;
use std::sync::Arc;
use tourney::{
    db::{Database, DatabaseConfig, Repositories},
    ledger::EntryStatus,
    prize::{self, ChopShare, PayoutStructure, PrizePoolInput, format_amount},
    time::SystemTimeSource,
    tournament::{
        ClockCommand, EngineConfig, EventBus, PlayerId, TournamentConfig, TournamentEngine,
        TournamentHandle, TournamentId, TournamentRegistry,
    },
};

const HELP: &str = "\
Run a live poker tournament from the command line

USAGE:
  tourney_cli <COMMAND> [ACTION] [OPTIONS]

OFFLINE COMMANDS:
  prize-pool   --buy-in AMT --entries N [--reentries N --reentry-cost AMT]
               [--rebuys N --rebuy-cost AMT] [--addons N --addon-cost AMT]
               [--rake PCT]
  payouts      --pool AMT (--structure PCTS | --entries N)
  validate     --structure PCTS
  chop even    --pool AMT --players NAMES
  chop chips   --pool AMT --stacks NAME:CHIPS,...
  chop icm     --prizes AMTS --stacks NAME:CHIPS,...

DATABASE COMMANDS:
  migrate                      Create the engine tables
  config   --file PATH         Register a tournament configuration (JSON)
  clock    show|init|start|pause|resume|advance|break|end-break|add-time|finish
           [--seconds N] [--minutes N] [--template ID]
  tables   list|add [--seats N]|draw [--seed N]
  players  list [--status S]|standings|timeline|transactions
           add [--paid AMT]|remove|reentry|rebuy|addon|decline  --player ID
  bust     --player ID [--entry N] [--by ID]
  balance  plan|execute
  break    plan|execute
  stats

  Every database command except migrate takes --tournament ID.

FLAGS:
  -h, --help               Print help information

ENVIRONMENT:
  DATABASE_URL             PostgreSQL connection string
  RUST_LOG                 Log filter (e.g., info)
  DB_MAX_CONNECTIONS, DB_MIN_CONNECTIONS, DB_CONNECTION_TIMEOUT,
  DB_IDLE_TIMEOUT, DB_MAX_LIFETIME, TOURNEY_INBOX_CAPACITY,
  TOURNEY_EVENT_BUFFER, TOURNEY_DEFAULT_MAX_SEATS
";

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if it exists
    let _ = dotenvy::dotenv();
    env_logger::builder().format_target(false).init();

    let mut pargs = Arguments::from_env();

    // Help has a higher priority and should be handled separately.
    if pargs.contains(["-h", "--help"]) {
        print!("{HELP}");
        std::process::exit(0);
    }

    let Some(command) = pargs.subcommand()? else {
        print!("{HELP}");
        std::process::exit(2);
    };

    match command.as_str() {
        "prize-pool" => prize_pool(&mut pargs)?,
        "payouts" => payouts(&mut pargs)?,
        "validate" => validate(&mut pargs)?,
        "chop" => chop(&mut pargs)?,
        "migrate" | "config" | "clock" | "tables" | "players" | "bust" | "balance" | "break"
        | "stats" => admin(&command, &mut pargs).await?,
        other => bail!("Unknown command '{}'. Run with --help for usage", other),
    }

    let rest = pargs.finish();
    if !rest.is_empty() {
        log::warn!("Ignored arguments: {:?}", rest);
    }
    Ok(())
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn print_shares(shares: &[ChopShare<String>]) {
    for share in shares {
        println!("{:<16} {:>12}", share.player, format_amount(share.amount));
    }
}

// ============================================================================
// Offline commands
// ============================================================================

fn prize_pool(pargs: &mut Arguments) -> Result<()> {
    let input = PrizePoolInput {
        buy_in: pargs.value_from_fn("--buy-in", parse::money)?,
        entries: pargs.value_from_str("--entries")?,
        reentries: pargs.opt_value_from_str("--reentries")?.unwrap_or(0),
        reentry_cost: pargs
            .opt_value_from_fn("--reentry-cost", parse::money)?
            .unwrap_or(0),
        rebuys: pargs.opt_value_from_str("--rebuys")?.unwrap_or(0),
        addons: pargs.opt_value_from_str("--addons")?.unwrap_or(0),
        rebuy_cost: pargs
            .opt_value_from_fn("--rebuy-cost", parse::money)?
            .unwrap_or(0),
        addon_cost: pargs
            .opt_value_from_fn("--addon-cost", parse::money)?
            .unwrap_or(0),
        rake_percentage: pargs.opt_value_from_str("--rake")?.unwrap_or(0.0),
    };
    if !(0.0..=100.0).contains(&input.rake_percentage) {
        bail!("--rake must be between 0 and 100");
    }

    let pool = prize::calculate_prize_pool(&input);
    println!("Entry pool   {:>12}", format_amount(pool.entry_pool));
    println!("Rebuy pool   {:>12}", format_amount(pool.rebuy_pool));
    println!("Add-on pool  {:>12}", format_amount(pool.addon_pool));
    println!("Gross pool   {:>12}", format_amount(pool.gross_pool));
    println!("Rake         {:>12}", format_amount(pool.rake_amount));
    println!("Net pool     {:>12}", format_amount(pool.net_pool));
    Ok(())
}

fn payouts(pargs: &mut Arguments) -> Result<()> {
    let pool = pargs.value_from_fn("--pool", parse::money)?;
    let structure = match pargs.opt_value_from_fn("--structure", parse::structure)? {
        Some(structure) => structure,
        None => {
            let entries: usize = pargs
                .value_from_str("--entries")
                .context("payouts needs --structure or --entries")?;
            PayoutStructure::standard(entries)
        }
    };

    let payouts = prize::calculate_payouts(pool, &structure)?;
    for (place, amount) in &payouts {
        println!("{:>4}  {:>12}", place, format_amount(*amount));
    }
    Ok(())
}

fn validate(pargs: &mut Arguments) -> Result<()> {
    let structure = pargs.value_from_fn("--structure", parse::structure)?;
    let validation = prize::validate_structure(&structure);
    println!("{}", validation.message());
    if !validation.valid {
        std::process::exit(1);
    }
    Ok(())
}

fn chop(pargs: &mut Arguments) -> Result<()> {
    let method = pargs
        .subcommand()?
        .context("chop needs a method: even, chips or icm")?;

    let shares = match method.as_str() {
        "even" => {
            let pool = pargs.value_from_fn("--pool", parse::money)?;
            let players = pargs.value_from_fn("--players", parse::names)?;
            prize::calculate_even_chop(pool, &players)?
        }
        "chips" => {
            let pool = pargs.value_from_fn("--pool", parse::money)?;
            let stacks = pargs.value_from_fn("--stacks", parse::stacks)?;
            prize::calculate_chip_chop(pool, &stacks)?
        }
        "icm" => {
            let prizes = pargs.value_from_fn("--prizes", parse::money_list)?;
            let stacks = pargs.value_from_fn("--stacks", parse::stacks)?;
            prize::calculate_icm_chop(&stacks, &prizes)?
        }
        other => bail!("Unknown chop method '{}'. Use even, chips or icm", other),
    };

    print_shares(&shares);
    Ok(())
}

// ============================================================================
// Database commands
// ============================================================================

async fn admin(command: &str, pargs: &mut Arguments) -> Result<()> {
    let db_config = DatabaseConfig::from_env()?;
    info!("Connecting to database");
    let db = Database::new(&db_config)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to connect to database: {}", e))?;

    if command == "migrate" {
        db.apply_schema().await.context("Failed to apply schema")?;
        println!("Schema is up to date");
        db.close().await;
        return Ok(());
    }

    let tournament_id: TournamentId = pargs.value_from_str("--tournament")?;
    let engine_config = EngineConfig::from_env()?;
    let engine = TournamentEngine::new(
        Repositories::postgres(db.pool().clone()),
        Arc::new(SystemTimeSource),
        EventBus::new(engine_config.event_buffer),
    );
    let registry = TournamentRegistry::new(engine, engine_config);
    let handle = registry.handle(tournament_id).await;

    let result = run_admin(command, pargs, &registry, &handle).await;

    registry.shutdown_all().await;
    db.close().await;
    result
}

async fn run_admin(
    command: &str,
    pargs: &mut Arguments,
    registry: &TournamentRegistry,
    handle: &TournamentHandle,
) -> Result<()> {
    let id = handle.tournament_id();
    let engine = registry.engine();

    match command {
        "config" => {
            let path: String = pargs.value_from_str("--file")?;
            let raw = std::fs::read_to_string(&path)
                .with_context(|| format!("Failed to read {}", path))?;
            let config: TournamentConfig =
                serde_json::from_str(&raw).context("Invalid configuration JSON")?;
            handle.register_config(config).await?;
            println!("Configuration registered for tournament {}", id);
        }

        "clock" => {
            let action = pargs.subcommand()?.unwrap_or_else(|| "show".to_string());
            let seconds: Option<i64> = pargs.opt_value_from_str("--seconds")?;
            let minutes: Option<i64> = pargs.opt_value_from_str("--minutes")?;
            let template_id: Option<i64> = pargs.opt_value_from_str("--template")?;

            let command = match action.as_str() {
                "show" => {
                    return print_json(&engine.clock().require_state(id).await?);
                }
                "init" => ClockCommand::Initialize { template_id },
                "start" => ClockCommand::Start {
                    duration_secs: seconds,
                },
                "pause" => ClockCommand::Pause {
                    time_remaining: seconds.context("pause needs --seconds left in the level")?,
                },
                "resume" => ClockCommand::Resume,
                "advance" => ClockCommand::AdvanceLevel {
                    duration_secs: seconds,
                },
                "break" => ClockCommand::StartBreak { minutes },
                "end-break" => ClockCommand::EndBreak {
                    duration_secs: seconds,
                },
                "add-time" => ClockCommand::AddTime {
                    seconds: seconds.context("add-time needs --seconds")?,
                },
                "finish" => ClockCommand::Finish,
                other => bail!("Unknown clock action '{}'", other),
            };
            print_json(&handle.clock(command).await?)?;
        }

        "tables" => {
            let action = pargs.subcommand()?.unwrap_or_else(|| "list".to_string());
            match action.as_str() {
                "list" => print_json(&engine.seating().get_tables(id, None).await?)?,
                "add" => {
                    let seats: Option<u8> = pargs.opt_value_from_str("--seats")?;
                    print_json(&handle.add_table(seats).await?)?;
                }
                "draw" => {
                    let seed: Option<u64> = pargs.opt_value_from_str("--seed")?;
                    let (placed, unseated) = handle.seat_all_players(seed).await?;
                    for (player_id, seat) in &placed {
                        println!(
                            "player {:>6} -> table {} seat {}",
                            player_id, seat.table_id, seat.seat_number
                        );
                    }
                    if !unseated.is_empty() {
                        println!("No seat for players {:?}", unseated);
                    }
                }
                other => bail!("Unknown tables action '{}'", other),
            }
        }

        "players" => players(pargs, engine, handle).await?,

        "bust" => {
            let player_id: PlayerId = pargs.value_from_str("--player")?;
            let entry_number: u32 = pargs.opt_value_from_str("--entry")?.unwrap_or(1);
            let eliminated_by: Option<PlayerId> = pargs.opt_value_from_str("--by")?;
            let outcome = handle
                .bust_player(player_id, entry_number, eliminated_by)
                .await?;
            println!("{}", outcome.message);
            print_json(&outcome)?;
        }

        "balance" => {
            let action = pargs.subcommand()?.unwrap_or_else(|| "plan".to_string());
            let plan = engine.seating().calculate_balance_plan(id).await?;
            match action.as_str() {
                "plan" => print_json(&plan)?,
                "execute" => print_json(&handle.execute_balance(plan).await?)?,
                other => bail!("Unknown balance action '{}'", other),
            }
        }

        "break" => {
            let action = pargs.subcommand()?.unwrap_or_else(|| "plan".to_string());
            let plan = engine.seating().suggest_table_break(id).await?;
            match (action.as_str(), plan) {
                ("plan" | "execute", None) => println!("No table can be broken"),
                ("plan", Some(plan)) => print_json(&plan)?,
                ("execute", Some(plan)) => print_json(&handle.execute_table_break(plan).await?)?,
                (other, _) => bail!("Unknown break action '{}'", other),
            }
        }

        "stats" => print_json(&engine.stats(id).await?)?,

        other => bail!("Unknown command '{}'", other),
    }

    Ok(())
}

async fn players(pargs: &mut Arguments, engine: &TournamentEngine, handle: &TournamentHandle) -> Result<()> {
    let id = handle.tournament_id();
    let action = pargs.subcommand()?.unwrap_or_else(|| "list".to_string());

    match action.as_str() {
        "list" => {
            let status: Option<EntryStatus> = pargs.opt_value_from_str("--status")?;
            print_json(&engine.ledger().get_tournament_players(id, status).await?)?;
        }
        "standings" => print_json(&engine.ledger().get_final_standings(id).await?)?,
        "timeline" => print_json(&engine.ledger().get_bustout_timeline(id).await?)?,
        "transactions" => print_json(&engine.ledger().get_transactions(id).await?)?,
        action => {
            let player_id: PlayerId = pargs.value_from_str("--player")?;
            match action {
                "add" => {
                    let paid = pargs.opt_value_from_fn("--paid", parse::money)?;
                    print_json(&handle.add_player(player_id, paid).await?)?;
                }
                "remove" => {
                    handle.remove_player(player_id).await?;
                    println!("Player {} removed", player_id);
                }
                "reentry" => print_json(&handle.reentry_player(player_id).await?)?,
                "rebuy" => print_json(&handle.process_rebuy(player_id).await?)?,
                "addon" => print_json(&handle.process_addon(player_id).await?)?,
                "decline" => print_json(&handle.process_declined_reentry(player_id).await?)?,
                other => bail!("Unknown players action '{}'", other),
            }
        }
    }
    Ok(())
}
