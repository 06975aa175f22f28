//! Determinism testing utilities.
//!
//! Provides a harness for verifying that combat resolution produces
//! identical results given identical inputs.
//!
//! # Testing Strategy
//!
//! Replays only work if resolution is 100% deterministic. Sources of
//! non-determinism include:
//!
//! - **Floating-point math**: Different CPUs can produce different results.
//!   We use fixed-point arithmetic via [`mech_core::math::Fixed`] throughout.
//!
//! - **HashMap iteration order**: Rust's default hasher is randomized.
//!   Units are always visited in id order.
//!
//! - **System randomness**: Every roll comes from an injected
//!   [`mech_core::dice::Dice`], seeded or scripted.
//!
//! # Test Levels
//!
//! 1. **Unit tests**: Individual steps (to-hit, damage chain, point defense)
//! 2. **Property tests**: Random inputs must still produce deterministic outputs
//! 3. **Integration tests**: Full engagements are reproducible
//! 4. **Parallel tests**: Running N engagements on threads all match

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::thread;

use mech_core::attack::AttackDeclaration;
use mech_core::board::OpenField;
use mech_core::dice::SeededDice;
use mech_core::engine::CombatEngine;

/// Result of a determinism test.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeterminismResult {
    /// Whether all runs produced identical results.
    pub is_deterministic: bool,
    /// Hashes from each run.
    pub hashes: Vec<u64>,
    /// Number of phases resolved.
    pub phases: u64,
}

impl DeterminismResult {
    /// Get all unique hashes (should be 1 for a deterministic engine).
    #[must_use]
    pub fn unique_hashes(&self) -> Vec<u64> {
        let mut unique: Vec<u64> = self.hashes.clone();
        unique.sort_unstable();
        unique.dedup();
        unique
    }

    /// Assert that resolution was deterministic, with a detailed error message.
    ///
    /// # Panics
    ///
    /// Panics if the runs produced different hashes.
    pub fn assert_deterministic(&self) {
        if !self.is_deterministic {
            let unique = self.unique_hashes();
            panic!(
                "Combat resolution is non-deterministic!\n\
                 Runs: {}\n\
                 Phases: {}\n\
                 Unique hashes: {} (expected 1)\n\
                 All hashes: {:?}",
                self.hashes.len(),
                self.phases,
                unique.len(),
                self.hashes
            );
        }
    }
}

/// Run a process multiple times and verify determinism.
///
/// # Arguments
///
/// * `runs` - Number of times to run
/// * `steps` - Number of steps per run
/// * `setup` - Function to create the initial state
/// * `step` - Function to advance the state by one step
/// * `hash` - Function to compute the state hash
pub fn verify_determinism<S, Setup, Step, HashFn>(
    runs: usize,
    steps: u64,
    setup: Setup,
    step: Step,
    hash: HashFn,
) -> DeterminismResult
where
    Setup: Fn() -> S,
    Step: Fn(&mut S),
    HashFn: Fn(&S) -> u64,
{
    let mut hashes = Vec::with_capacity(runs);

    for _ in 0..runs {
        let mut state = setup();

        for _ in 0..steps {
            step(&mut state);
        }

        hashes.push(hash(&state));
    }

    let is_deterministic = hashes.windows(2).all(|w| w[0] == w[1]);

    DeterminismResult {
        is_deterministic,
        hashes,
        phases: steps,
    }
}

/// An engine, its board and its dice, advanced one scripted phase at a time.
#[derive(Debug, Clone)]
pub struct Engagement {
    /// Combat state.
    pub engine: CombatEngine,
    /// Board.
    pub board: OpenField,
    /// Dice.
    pub dice: SeededDice,
    script: Vec<Vec<AttackDeclaration>>,
    next: usize,
}

impl Engagement {
    /// Engagement that repeats `script` phase by phase, one phase per round.
    #[must_use]
    pub fn new(
        engine: CombatEngine,
        board: OpenField,
        seed: u64,
        script: Vec<Vec<AttackDeclaration>>,
    ) -> Self {
        Self {
            engine,
            board,
            dice: SeededDice::new(seed),
            script,
            next: 0,
        }
    }

    /// Start a round, resolve the next scripted phase and commit it.
    pub fn step(&mut self) {
        if self.script.is_empty() {
            return;
        }
        let declarations = &self.script[self.next % self.script.len()];
        self.next += 1;
        self.engine.start_round(&self.board);
        self.engine
            .resolve_phase(&mut self.board, &mut self.dice, declarations);
        self.engine.commit_phase();
    }

    /// Engine state hash.
    #[must_use]
    pub fn state_hash(&self) -> u64 {
        self.engine.state_hash()
    }
}

/// Run the same engagement twice and compare final hashes.
pub fn verify_engagement_determinism<F>(setup_fn: F, phases: u64) -> bool
where
    F: Fn() -> Engagement,
{
    verify_determinism(2, phases, &setup_fn, Engagement::step, Engagement::state_hash)
        .is_deterministic
}

/// Result of parallel engagement runs.
#[derive(Debug, Clone)]
pub struct ParallelRunResult {
    /// Final state hash from each run.
    pub hashes: Vec<u64>,
    /// Phases each run resolved.
    pub phases: u64,
}

impl ParallelRunResult {
    /// Check if all runs produced identical results.
    #[must_use]
    pub fn is_deterministic(&self) -> bool {
        self.hashes.windows(2).all(|w| w[0] == w[1])
    }
}

/// Run N engagements on scoped threads and collect final hashes.
pub fn run_parallel_engagements<F>(setup_fn: F, runs: usize, phases: u64) -> ParallelRunResult
where
    F: Fn() -> Engagement + Sync,
{
    let hashes = thread::scope(|s| {
        let handles: Vec<_> = (0..runs)
            .map(|_| {
                s.spawn(|| {
                    let mut engagement = setup_fn();
                    for _ in 0..phases {
                        engagement.step();
                    }
                    engagement.state_hash()
                })
            })
            .collect();

        handles
            .into_iter()
            .map(|h| h.join().unwrap_or_else(|_| panic!("engagement thread panicked")))
            .collect()
    });

    ParallelRunResult { hashes, phases }
}

/// Compare two runs phase by phase, finding the first divergence.
///
/// # Returns
///
/// `None` if the runs are deterministic, `Some(phase)` if they diverge
/// after that phase.
pub fn find_first_divergence<F>(setup_fn: F, phases: u64) -> Option<u64>
where
    F: Fn() -> Engagement,
{
    let mut first = setup_fn();
    let mut second = setup_fn();

    if first.state_hash() != second.state_hash() {
        return Some(0);
    }

    for phase in 1..=phases {
        first.step();
        second.step();

        if first.state_hash() != second.state_hash() {
            tracing::warn!(
                phase,
                first = first.state_hash(),
                second = second.state_hash(),
                "engagements diverged"
            );
            return Some(phase);
        }
    }

    None
}

/// Verify that a serialization round-trip preserves engine state exactly.
pub fn verify_serialization_determinism<F>(setup_fn: F, phases: u64) -> bool
where
    F: Fn() -> Engagement,
{
    let mut engagement = setup_fn();

    for _ in 0..phases {
        engagement.step();
    }

    let hash_before = engagement.state_hash();

    let Ok(bytes) = engagement.engine.serialize() else {
        return false;
    };
    let Ok(restored) = CombatEngine::deserialize(&bytes) else {
        return false;
    };

    hash_before == restored.state_hash()
}

/// Compute a simple hash for any hashable value.
pub fn compute_hash<T: Hash>(value: &T) -> u64 {
    let mut hasher = DefaultHasher::new();
    value.hash(&mut hasher);
    hasher.finish()
}
