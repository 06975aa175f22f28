//! Batch runner for outcome statistics and determinism checks.
//!
//! Runs one scenario over many seeds in parallel using rayon. Every run
//! owns its engine, board and dice, so runs never share state.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Instant;

use mech_core::unit::TeamId;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::runner::run_scenario;
use crate::scenario::{Scenario, ScenarioError};

/// Configuration for a batch run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchConfig {
    /// Number of runs
    pub count: u32,
    /// Seed of the first run; run `i` uses `seed_start + i`
    pub seed_start: u64,
    /// Maximum parallel runs (0 = use rayon default)
    pub parallel: u32,
    /// Output directory for results
    pub output_dir: PathBuf,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            count: 100,
            seed_start: 0,
            parallel: 0,
            output_dir: PathBuf::from("results"),
        }
    }
}

impl BatchConfig {
    /// Config for `count` runs.
    pub fn new(count: u32) -> Self {
        Self {
            count,
            ..Default::default()
        }
    }

    /// Set seed start
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed_start = seed;
        self
    }
}

/// Summary of one run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunSummary {
    /// Seed used
    pub seed: u64,
    /// Final engine hash
    pub final_hash: u64,
    /// Surviving units per team
    pub survivors: BTreeMap<TeamId, u32>,
    /// Damage taken per team
    pub damage_taken: BTreeMap<TeamId, u32>,
}

/// Error during batch run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchError {
    /// Seed used
    pub seed: u64,
    /// Error message
    pub message: String,
}

/// Results from a batch run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchResults {
    /// Scenario name
    pub scenario: String,
    /// Configuration used
    pub config: BatchConfig,
    /// Completed runs, in seed order
    pub runs: Vec<RunSummary>,
    /// Errors encountered
    pub errors: Vec<BatchError>,
    /// Mean surviving units per team
    pub mean_survivors: BTreeMap<TeamId, f64>,
    /// Mean damage taken per team
    pub mean_damage_taken: BTreeMap<TeamId, f64>,
    /// Total runtime
    pub duration_seconds: f64,
}

impl BatchResults {
    /// Save results to JSON file
    pub fn save(&self, path: &Path) -> Result<(), ScenarioError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Load results from JSON file
    pub fn load(path: &Path) -> Result<Self, ScenarioError> {
        let json = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&json)?)
    }
}

fn summarize(scenario: &Scenario, seed: u64) -> Result<RunSummary, ScenarioError> {
    let outcome = run_scenario(scenario, Some(seed))?;
    let damage_taken = outcome
        .survivors
        .keys()
        .map(|&team| (team, outcome.damage_taken_by(team)))
        .collect();
    Ok(RunSummary {
        seed,
        final_hash: outcome.final_hash,
        survivors: outcome.survivors,
        damage_taken,
    })
}

fn mean_by_team<'a>(
    runs: &'a [RunSummary],
    field: impl Fn(&'a RunSummary) -> &'a BTreeMap<TeamId, u32>,
) -> BTreeMap<TeamId, f64> {
    let mut totals: BTreeMap<TeamId, u64> = BTreeMap::new();
    for run in runs {
        for (&team, &value) in field(run) {
            *totals.entry(team).or_insert(0) += u64::from(value);
        }
    }
    let n = runs.len().max(1) as f64;
    totals
        .into_iter()
        .map(|(team, total)| (team, total as f64 / n))
        .collect()
}

/// Run a batch of seeds.
pub fn run_batch(scenario: &Scenario, config: BatchConfig) -> BatchResults {
    let start = Instant::now();
    info!(
        "Starting batch run: {} runs of '{}'",
        config.count, scenario.name
    );

    // Configure thread pool if specified
    if config.parallel > 0 {
        rayon::ThreadPoolBuilder::new()
            .num_threads(config.parallel as usize)
            .build_global()
            .ok(); // Ignore if already set
    }

    let results: Vec<Result<RunSummary, BatchError>> = (0..config.count)
        .into_par_iter()
        .map(|i| {
            let seed = config.seed_start.wrapping_add(u64::from(i));
            summarize(scenario, seed).map_err(|e| {
                warn!("Run with seed {} failed: {}", seed, e);
                BatchError {
                    seed,
                    message: e.to_string(),
                }
            })
        })
        .collect();

    let (runs, errors): (Vec<_>, Vec<_>) = results.into_iter().partition(Result::is_ok);
    let runs: Vec<RunSummary> = runs.into_iter().filter_map(Result::ok).collect();
    let errors: Vec<BatchError> = errors.into_iter().filter_map(Result::err).collect();

    let mean_survivors = mean_by_team(&runs, |r| &r.survivors);
    let mean_damage_taken = mean_by_team(&runs, |r| &r.damage_taken);
    let duration_seconds = start.elapsed().as_secs_f64();
    info!(
        runs = runs.len(),
        errors = errors.len(),
        duration_seconds,
        "Batch finished"
    );

    BatchResults {
        scenario: scenario.name.clone(),
        config,
        runs,
        errors,
        mean_survivors,
        mean_damage_taken,
        duration_seconds,
    }
}

/// Run the same seed `runs` times in parallel and compare final hashes.
pub fn verify_determinism(scenario: &Scenario, seed: u64, runs: u32) -> bool {
    let hashes: Vec<Option<u64>> = (0..runs)
        .into_par_iter()
        .map(|_| run_scenario(scenario, Some(seed)).ok().map(|o| o.final_hash))
        .collect();
    let deterministic =
        hashes.iter().all(Option::is_some) && hashes.windows(2).all(|w| w[0] == w[1]);
    if !deterministic {
        warn!(seed, ?hashes, "Non-determinism detected");
    }
    deterministic
}

#[cfg(test)]
mod tests {
    use super::*;

    fn duel() -> Scenario {
        Scenario::duel().unwrap_or_else(|e| panic!("duel should parse: {e}"))
    }

    #[test]
    fn test_batch_runs_every_seed() {
        let results = run_batch(&duel(), BatchConfig::new(6).with_seed(100));
        assert!(results.errors.is_empty());
        assert_eq!(results.runs.len(), 6);
        let seeds: Vec<u64> = results.runs.iter().map(|r| r.seed).collect();
        assert_eq!(seeds, (100..106).collect::<Vec<_>>());
        assert_eq!(results.mean_survivors.len(), 2);
    }

    #[test]
    fn test_batch_is_repeatable() {
        let a = run_batch(&duel(), BatchConfig::new(4).with_seed(7));
        let b = run_batch(&duel(), BatchConfig::new(4).with_seed(7));
        assert_eq!(a.runs, b.runs);
    }

    #[test]
    fn test_verify_determinism() {
        assert!(verify_determinism(&duel(), 12345, 4));
    }

    #[test]
    fn test_broken_scenario_reports_errors() {
        let mut scenario = duel();
        scenario.units[0].mounts[0].equipment = "Gauss Rifle".to_string();
        let results = run_batch(&scenario, BatchConfig::new(2));
        assert!(results.runs.is_empty());
        assert_eq!(results.errors.len(), 2);
        assert!(!verify_determinism(&scenario, 1, 2));
    }
}
