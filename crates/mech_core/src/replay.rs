//! Replays: an initial engine state, a board, a seed and the declarations
//! made in each phase. Because dice are seeded and the engine is
//! deterministic, re-running the declarations must reproduce the recorded
//! final hash.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::attack::{AttackDeclaration, PhaseReport};
use crate::board::OpenField;
use crate::dice::SeededDice;
use crate::engine::CombatEngine;
use crate::error::{CombatError, Result};

/// Replay file format version for compatibility.
pub const REPLAY_VERSION: u32 = 1;

/// Declarations of one phase.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplayPhase {
    /// A new round starts before this phase.
    pub new_round: bool,
    /// Declarations in order.
    pub declarations: Vec<AttackDeclaration>,
}

/// Complete replay record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Replay {
    /// Format version.
    pub version: u32,
    /// Scenario identifier.
    pub scenario_id: String,
    /// Dice seed.
    pub seed: u64,
    /// Serialized initial engine.
    pub initial_state: Vec<u8>,
    /// Board at the start.
    pub board: OpenField,
    /// Phases in order.
    pub phases: Vec<ReplayPhase>,
    /// Engine hash after the last phase.
    pub final_hash: u64,
}

impl Replay {
    /// Start a replay from an engine and board before the first phase.
    ///
    /// # Errors
    ///
    /// Returns an error if the engine cannot be serialized.
    pub fn new(
        scenario_id: impl Into<String>,
        seed: u64,
        engine: &CombatEngine,
        board: &OpenField,
    ) -> Result<Self> {
        Ok(Self {
            version: REPLAY_VERSION,
            scenario_id: scenario_id.into(),
            seed,
            initial_state: engine.serialize()?,
            board: board.clone(),
            phases: Vec::new(),
            final_hash: 0,
        })
    }

    /// Record a phase.
    pub fn record_phase(&mut self, new_round: bool, declarations: Vec<AttackDeclaration>) {
        self.phases.push(ReplayPhase {
            new_round,
            declarations,
        });
    }

    /// Seal the replay with the final hash.
    pub fn finalize(&mut self, final_hash: u64) {
        self.final_hash = final_hash;
    }

    /// Engine state at the start.
    ///
    /// # Errors
    ///
    /// Returns an error if the state bytes are corrupt.
    pub fn restore_initial_state(&self) -> Result<CombatEngine> {
        CombatEngine::deserialize(&self.initial_state)
    }

    /// Re-run every phase from the initial state.
    ///
    /// # Errors
    ///
    /// Returns an error if the initial state cannot be restored.
    pub fn play(&self) -> Result<(CombatEngine, Vec<PhaseReport>)> {
        let mut engine = self.restore_initial_state()?;
        let mut board = self.board.clone();
        let mut dice = SeededDice::new(self.seed);
        let mut reports = Vec::with_capacity(self.phases.len());
        for phase in &self.phases {
            if phase.new_round {
                engine.start_round(&board);
            }
            let mut report = engine.resolve_phase(&mut board, &mut dice, &phase.declarations);
            report.commits = engine.commit_phase();
            reports.push(report);
        }
        Ok((engine, reports))
    }

    /// Re-run and compare against the recorded hash.
    ///
    /// # Errors
    ///
    /// Returns an error if the initial state cannot be restored.
    pub fn verify(&self) -> Result<bool> {
        let (engine, _) = self.play()?;
        let hash = engine.state_hash();
        info!(
            scenario = %self.scenario_id,
            expected = self.final_hash,
            actual = hash,
            "replay verified"
        );
        Ok(hash == self.final_hash)
    }

    /// Save to a file.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or writing fails.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let bytes = bincode::serialize(self)
            .map_err(|e| CombatError::InvalidState(format!("Failed to serialize replay: {e}")))?;
        std::fs::write(path.as_ref(), bytes)
            .map_err(|e| CombatError::InvalidState(format!("Failed to write replay file: {e}")))
    }

    /// Load from a file.
    ///
    /// # Errors
    ///
    /// Returns an error if reading or deserialization fails, or the version
    /// does not match.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let bytes = std::fs::read(path.as_ref())
            .map_err(|e| CombatError::InvalidState(format!("Failed to read replay file: {e}")))?;
        let replay: Self = bincode::deserialize(&bytes).map_err(|e| {
            CombatError::InvalidState(format!("Failed to deserialize replay: {e}"))
        })?;
        if replay.version != REPLAY_VERSION {
            return Err(CombatError::InvalidState(format!(
                "Replay version mismatch: expected {REPLAY_VERSION}, got {}",
                replay.version
            )));
        }
        Ok(replay)
    }

    /// Number of recorded phases.
    #[must_use]
    pub fn phase_count(&self) -> usize {
        self.phases.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::RulesConfig;

    #[test]
    fn test_empty_replay_verifies() {
        let engine = CombatEngine::new(RulesConfig::default());
        let board = OpenField::new();
        let mut replay = Replay::new("empty", 3, &engine, &board)
            .unwrap_or_else(|e| panic!("replay creation failed: {e}"));
        replay.record_phase(true, Vec::new());
        let (after, reports) = replay
            .play()
            .unwrap_or_else(|e| panic!("replay failed: {e}"));
        assert_eq!(reports.len(), 1);
        replay.finalize(after.state_hash());
        assert_eq!(replay.verify(), Ok(true));
    }

    #[test]
    fn test_tampered_hash_fails() {
        let engine = CombatEngine::new(RulesConfig::default());
        let mut replay = Replay::new("empty", 3, &engine, &OpenField::new())
            .unwrap_or_else(|e| panic!("replay creation failed: {e}"));
        replay.finalize(1);
        assert_eq!(replay.verify(), Ok(false));
    }
}
