//! arcade-headless: run a hub session without a browser.
//!
//! Usage:
//!   arcade-headless <game> [--frames N] [--step-ms MS] [--seed N] [--keys "0:ArrowUp,500:ArrowLeft"]
//!   arcade-headless --list

use anyhow::{Context, Result, bail};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use arcade_core::config::HubConfig;
use arcade_headless::{RunOptions, builtin_games, parse_script, run};

#[derive(Parser)]
#[command(name = "arcade-headless")]
#[command(about = "Drive an arcade hub session with a simulated clock and scripted input")]
struct Args {
    /// Key of the game to run (see --list)
    game: Option<String>,

    /// List registered games and exit
    #[arg(long)]
    list: bool,

    /// Maximum number of frames to simulate
    #[arg(long, default_value_t = 600)]
    frames: usize,

    /// Simulated time between frames, in milliseconds
    #[arg(long, default_value_t = 1000.0 / 60.0)]
    step_ms: f64,

    /// Surface width in pixels
    #[arg(long, default_value_t = 400)]
    width: u32,

    /// Surface height in pixels
    #[arg(long, default_value_t = 300)]
    height: u32,

    /// RNG seed passed to the game
    #[arg(long)]
    seed: Option<u64>,

    /// Previous best score passed to the game
    #[arg(long)]
    high_score: Option<i64>,

    /// Scripted key presses: "<ms>:<code>,..."
    #[arg(long, default_value = "")]
    keys: String,

    /// Hub config file (defaults to ./arcade.toml if present)
    #[arg(long)]
    config: Option<String>,

    /// Print the report as JSON
    #[arg(long)]
    json: bool,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let args = Args::parse();

    if args.list {
        for game in builtin_games() {
            println!(
                "{:<8} {} - {}",
                game.key, game.metadata.display_name, game.metadata.description
            );
        }
        return Ok(());
    }

    let Some(game) = args.game else {
        bail!("no game given; pass a game key or --list");
    };

    let config = match &args.config {
        Some(path) => HubConfig::load_from(path).context("Failed to load hub config")?,
        None => HubConfig::load(),
    };
    let script = parse_script(&args.keys).context("Failed to parse --keys")?;

    let mut options = RunOptions::new(game);
    options.frames = args.frames;
    options.step_ms = args.step_ms;
    options.width = args.width;
    options.height = args.height;
    options.seed = args.seed;
    options.high_score = args.high_score;
    options.script = script;
    options.config = config;

    let report = run(&options).with_context(|| format!("Failed to run {}", options.game))?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!("Game:       {}", report.game);
    println!(
        "Frames:     {} ({:.0} ms simulated)",
        report.frames_run, report.simulated_ms
    );
    println!("Keys sent:  {}", report.keys_delivered);
    println!("Phase:      {}", report.final_phase);
    for session in &report.sessions {
        let score = session
            .score
            .map_or_else(|| "-".to_string(), |s| s.to_string());
        println!(
            "Session {}: {} ({}) score {}",
            session.session, session.key, session.reason, score
        );
        if let Some(fault) = &session.fault {
            println!("  fault: {fault}");
        }
    }
    Ok(())
}
