use anyhow::Result;
use clap::Parser;
use conquest_core::Difficulty;
use conquest_sim::{loader, run_game, RunOptions};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Map data file (JSON). Defaults to the built-in classic board
    #[arg(long)]
    map: Option<PathBuf>,

    /// Rules config file (JSON). Defaults to the canonical rules
    #[arg(long)]
    rules: Option<PathBuf>,

    /// Number of AI players
    #[arg(short, long, default_value_t = 3, value_parser = clap::value_parser!(u8).range(2..=6))]
    players: u8,

    /// AI strength (easy, normal)
    #[arg(long, default_value_t = Difficulty::Normal)]
    difficulty: Difficulty,

    /// Seed for the deal, the dice and the AIs
    #[arg(long, default_value_t = 12345)]
    seed: u64,

    /// Stop after this many rounds without a winner
    #[arg(long, default_value_t = 200)]
    max_turns: u32,

    /// Print the final summary as JSON
    #[arg(long)]
    json: bool,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, default_value = "info")]
    log_level: String,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let level = std::str::FromStr::from_str(&args.log_level).unwrap_or(log::LevelFilter::Info);
    env_logger::Builder::new()
        .filter_level(level)
        .format_timestamp(None)
        .init();

    log::info!("Starting conquest-sim...");

    let map = loader::load_map(args.map.as_deref())?;
    let rules = loader::load_rules(args.rules.as_deref())?;

    let options = RunOptions {
        players: args.players as usize,
        difficulty: args.difficulty,
        seed: args.seed,
        max_turns: args.max_turns,
    };
    let summary = run_game(&map, &rules, &options)?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        match summary.winner {
            Some(winner) => println!(
                "Player {} won on '{}' after {} turns",
                winner, summary.map, summary.turns
            ),
            None => println!(
                "No winner on '{}' after {} turns",
                summary.map, summary.turns
            ),
        }
        println!(
            "{} actions, {} battles, {} conquests, {} rejected",
            summary.actions, summary.battles, summary.conquests, summary.rejected
        );
        for (player, held) in &summary.territories {
            println!("  Player {player}: {held} territories");
        }
    }

    log::info!("Simulation finished");
    Ok(())
}
