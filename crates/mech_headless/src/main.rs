//! Headless engagement runner.
//!
//! # Usage
//!
//! ```bash
//! # Play a scenario and print the combat log
//! cargo run -p mech_headless -- run --scenario duel.ron
//!
//! # Same, as JSON, saving a replay
//! cargo run -p mech_headless -- run --scenario duel.ron --json --replay duel.replay
//!
//! # Run a batch over seeds
//! cargo run -p mech_headless -- batch --scenario duel.ron --count 1000 --output results/
//!
//! # Verify determinism
//! cargo run -p mech_headless -- verify --scenario duel.ron --seed 12345 --runs 5
//! ```
//!
//! Logs are written to stderr and filtered by `RUST_LOG`; `--verbose`
//! lowers the default level to debug.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use mech_core::replay::Replay;
use mech_headless::{
    batch::{run_batch, verify_determinism, BatchConfig},
    log::{render_phase, render_run},
    runner::run_scenario,
    scenario::{Scenario, ScenarioError},
};

#[derive(Parser)]
#[command(name = "mech_headless")]
#[command(about = "Headless combat runner for scripted engagements and CI")]
#[command(version)]
struct Cli {
    /// Enable verbose logging to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Play a scenario once
    Run {
        /// Scenario file to load (the bundled duel when absent)
        #[arg(short, long)]
        scenario: Option<PathBuf>,

        /// Dice seed (the scenario's own seed when absent)
        #[arg(long)]
        seed: Option<u64>,

        /// Print JSON instead of the combat log
        #[arg(long)]
        json: bool,

        /// Also write the JSON outcome to this file
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Save a replay to this file
        #[arg(long)]
        replay: Option<PathBuf>,
    },

    /// Run a scenario over many seeds
    Batch {
        /// Scenario file to load (the bundled duel when absent)
        #[arg(short, long)]
        scenario: Option<PathBuf>,

        /// Number of runs
        #[arg(short, long, default_value = "100")]
        count: u32,

        /// Maximum parallel runs (0 = auto)
        #[arg(short, long, default_value = "0")]
        parallel: u32,

        /// Output directory for results
        #[arg(short, long, default_value = "results")]
        output: PathBuf,

        /// Starting seed
        #[arg(long, default_value = "0")]
        seed: u64,
    },

    /// Verify determinism by running the same seed several times
    Verify {
        /// Scenario file to load (the bundled duel when absent)
        #[arg(short, long)]
        scenario: Option<PathBuf>,

        /// Seed to verify
        #[arg(long, default_value = "12345")]
        seed: u64,

        /// Number of verification runs
        #[arg(short, long, default_value = "5")]
        runs: u32,
    },

    /// Play back a recorded replay
    Replay {
        /// Replay file path
        #[arg(short, long)]
        file: PathBuf,

        /// Only check the final hash
        #[arg(long)]
        verify: bool,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Logs go to stderr (stdout is for output)
    let default_level = if cli.verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_ansi(true),
        )
        .with(filter)
        .init();

    let result = match cli.command {
        Commands::Run {
            scenario,
            seed,
            json,
            output,
            replay,
        } => cmd_run(scenario, seed, json, output, replay),
        Commands::Batch {
            scenario,
            count,
            parallel,
            output,
            seed,
        } => cmd_batch(scenario, count, parallel, output, seed),
        Commands::Verify {
            scenario,
            seed,
            runs,
        } => cmd_verify(scenario, seed, runs),
        Commands::Replay { file, verify } => cmd_replay(file, verify),
    };

    match result {
        Ok(code) => code,
        Err(e) => {
            tracing::error!(error = %e, "command failed");
            eprintln!("FATAL: {e}");
            ExitCode::FAILURE
        }
    }
}

fn load_scenario(path: Option<PathBuf>) -> Result<Scenario, ScenarioError> {
    match path {
        Some(path) => {
            tracing::info!(path = %path.display(), "Loading scenario");
            Scenario::load(path)
        }
        None => Scenario::duel(),
    }
}

/// Play a scenario once
fn cmd_run(
    scenario: Option<PathBuf>,
    seed: Option<u64>,
    json: bool,
    output: Option<PathBuf>,
    replay: Option<PathBuf>,
) -> Result<ExitCode, ScenarioError> {
    let scenario = load_scenario(scenario)?;
    let outcome = run_scenario(&scenario, seed)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&outcome)?);
    } else {
        print!("{}", render_run(&outcome));
    }
    if let Some(path) = output {
        outcome.save_json(&path)?;
        tracing::info!(path = %path.display(), "Outcome saved");
    }
    if let (Some(path), Some(recorded)) = (replay, &outcome.replay) {
        recorded.save(&path)?;
        tracing::info!(path = %path.display(), "Replay saved");
    }
    Ok(ExitCode::SUCCESS)
}

/// Run a batch of seeds
fn cmd_batch(
    scenario: Option<PathBuf>,
    count: u32,
    parallel: u32,
    output: PathBuf,
    seed: u64,
) -> Result<ExitCode, ScenarioError> {
    let scenario = load_scenario(scenario)?;
    let num_cpus = std::thread::available_parallelism()
        .map(|p| p.get())
        .unwrap_or(1);
    tracing::info!(
        scenario = %scenario.name,
        count,
        parallel,
        seed,
        output = %output.display(),
        cpus_available = num_cpus,
        "Batch configuration"
    );

    std::fs::create_dir_all(&output)?;
    let config = BatchConfig {
        count,
        seed_start: seed,
        parallel,
        output_dir: output.clone(),
    };
    let results = run_batch(&scenario, config);

    let results_path = output.join("batch_results.json");
    results.save(&results_path)?;

    eprintln!("\n{}", "=".repeat(50));
    eprintln!("BATCH COMPLETE");
    eprintln!("{}", "=".repeat(50));
    eprintln!("Runs completed: {}", results.runs.len());
    if !results.errors.is_empty() {
        eprintln!("Runs failed: {}", results.errors.len());
    }
    for (team, survivors) in &results.mean_survivors {
        let damage = results.mean_damage_taken.get(team).copied().unwrap_or(0.0);
        eprintln!("Team {team}: {survivors:.2} survivors, {damage:.1} damage taken");
    }
    eprintln!("Duration: {:.1}s", results.duration_seconds);
    eprintln!("Results: {}", results_path.display());

    Ok(if results.errors.is_empty() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

/// Verify determinism
fn cmd_verify(scenario: Option<PathBuf>, seed: u64, runs: u32) -> Result<ExitCode, ScenarioError> {
    let scenario = load_scenario(scenario)?;
    tracing::info!(
        "Verifying determinism: {} with seed {} ({} runs)",
        scenario.name,
        seed,
        runs
    );
    if verify_determinism(&scenario, seed, runs) {
        eprintln!("PASS: All {runs} runs produced identical results");
        Ok(ExitCode::SUCCESS)
    } else {
        eprintln!("FAIL: Non-determinism detected!");
        Ok(ExitCode::FAILURE)
    }
}

/// Play back or verify a recorded replay
fn cmd_replay(file: PathBuf, verify: bool) -> Result<ExitCode, ScenarioError> {
    let replay = Replay::load(&file)?;
    eprintln!("Loaded replay:");
    eprintln!("  Scenario: {}", replay.scenario_id);
    eprintln!("  Seed: {}", replay.seed);
    eprintln!("  Phases: {}", replay.phase_count());

    let (engine, reports) = replay.play()?;
    let actual = engine.state_hash();
    if !verify {
        for report in &reports {
            print!("{}", render_phase(report));
        }
    }
    if actual == replay.final_hash {
        eprintln!("PASS: Replay verification successful");
        eprintln!("  Hash: {actual:016x}");
        Ok(ExitCode::SUCCESS)
    } else {
        eprintln!("FAIL: Replay hash mismatch");
        eprintln!("  Expected hash: {:016x}", replay.final_hash);
        eprintln!("  Actual hash:   {actual:016x}");
        Ok(ExitCode::FAILURE)
    }
}
