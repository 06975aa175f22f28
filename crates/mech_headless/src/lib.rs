//! Headless engagement runner for scripted combat and CI verification.
//!
//! Loads a RON scenario (catalog, units, board, network links and the
//! attacks declared in each phase), plays it through
//! [`mech_core::engine::CombatEngine`] with seeded dice and reports the
//! result as a combat log or JSON. This enables:
//!
//! - **Outcome statistics**: the same scenario over many seeds in parallel
//! - **CI verification**: determinism checks across repeated runs
//! - **Replay verification**: check that replays reproduce their final hash
//!
//! Output goes to stdout; logs go to stderr.
//!
//! # Example
//!
//! ```bash
//! # Play a scenario and print the combat log
//! cargo run -p mech_headless -- run --scenario crates/mech_headless/scenarios/duel.ron
//!
//! # Batch over 1000 seeds
//! cargo run -p mech_headless -- batch --scenario duel.ron --count 1000 --output results/
//!
//! # Verify a saved replay
//! cargo run -p mech_headless -- replay --file duel.replay --verify
//! ```

pub mod batch;
pub mod log;
pub mod runner;
pub mod scenario;

pub use batch::{run_batch, verify_determinism, BatchConfig, BatchResults};
pub use log::{render_phase, render_run};
pub use runner::{run_scenario, RunOutcome};
pub use scenario::{Scenario, ScenarioError};
