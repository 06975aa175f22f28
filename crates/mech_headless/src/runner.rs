//! Scenario runner.
//!
//! Plays a scenario's phases through the engine with seeded dice,
//! recording a [`Replay`] as it goes. The sequencer role is trivial here:
//! start a round when the phase asks for one, resolve, then commit.

use std::collections::BTreeMap;
use std::path::Path;

use mech_core::attack::PhaseReport;
use mech_core::dice::SeededDice;
use mech_core::replay::Replay;
use mech_core::unit::{RoundStart, TeamId};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::scenario::{Scenario, ScenarioError};

/// One phase as played.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayedPhase {
    /// Round-start outcomes, per unit, when a round started first.
    pub round_start: Option<Vec<RoundStart>>,
    /// Resolution and commit report.
    pub report: PhaseReport,
}

/// Standing of one unit at the end of a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnitStanding {
    /// Unit name.
    pub name: String,
    /// Team.
    pub team: TeamId,
    /// Armor left.
    pub armor: u32,
    /// Internal structure left.
    pub internal: u32,
    /// Heat carried into the next round.
    pub heat: u32,
    /// Destroyed.
    pub destroyed: bool,
}

/// Outcome of a full scenario run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunOutcome {
    /// Scenario name.
    pub scenario: String,
    /// Dice seed.
    pub seed: u64,
    /// Phases in order.
    pub phases: Vec<PlayedPhase>,
    /// Units at the end.
    pub standings: Vec<UnitStanding>,
    /// Surviving units per team.
    pub survivors: BTreeMap<TeamId, u32>,
    /// Engine state hash at the end.
    pub final_hash: u64,
    /// Replay of the run.
    #[serde(skip)]
    pub replay: Option<Replay>,
}

impl RunOutcome {
    /// Total damage dealt to units of `team`.
    #[must_use]
    pub fn damage_taken_by(&self, team: TeamId) -> u32 {
        let members: Vec<u32> = self
            .standings
            .iter()
            .enumerate()
            .filter(|(_, s)| s.team == team)
            .map(|(i, _)| i as u32)
            .collect();
        self.phases
            .iter()
            .flat_map(|p| &p.report.attacks)
            .map(|a| members.iter().map(|&m| a.damage_to(m)).sum::<u32>())
            .sum()
    }

    /// Save as pretty JSON.
    pub fn save_json(&self, path: &Path) -> Result<(), ScenarioError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }
}

/// Play `scenario` with `seed`, or the scenario's own seed when `None`.
pub fn run_scenario(scenario: &Scenario, seed: Option<u64>) -> Result<RunOutcome, ScenarioError> {
    let seed = seed.unwrap_or(scenario.seed);
    let prepared = scenario.prepare()?;
    let mut engine = prepared.engine;
    let mut board = prepared.board;
    let mut dice = SeededDice::new(seed);
    let mut replay = Replay::new(scenario.name.clone(), seed, &engine, &board)?;

    info!(scenario = %scenario.name, seed, "run started");
    let mut phases = Vec::with_capacity(prepared.phases.len());
    for (new_round, declarations) in prepared.phases {
        let round_start = new_round.then(|| engine.start_round(&board));
        let mut report = engine.resolve_phase(&mut board, &mut dice, &declarations);
        report.commits = engine.commit_phase();
        debug!(
            phase = report.phase,
            attacks = report.attacks.len(),
            rejected = report.rejected.len(),
            "phase played"
        );
        replay.record_phase(new_round, declarations);
        phases.push(PlayedPhase {
            round_start,
            report,
        });
    }

    let final_hash = engine.state_hash();
    replay.finalize(final_hash);

    let standings: Vec<UnitStanding> = engine
        .units()
        .iter()
        .map(|u| UnitStanding {
            name: u.name().to_string(),
            team: u.team(),
            armor: u.total_armor(),
            internal: u.total_internal(),
            heat: u.heat(),
            destroyed: u.is_destroyed(),
        })
        .collect();
    let mut survivors = BTreeMap::new();
    for standing in &standings {
        let count = survivors.entry(standing.team).or_insert(0);
        if !standing.destroyed {
            *count += 1;
        }
    }

    info!(
        scenario = %scenario.name,
        seed,
        final_hash = format!("{final_hash:016x}"),
        "run finished"
    );
    Ok(RunOutcome {
        scenario: scenario.name.clone(),
        seed,
        phases,
        standings,
        survivors,
        final_hash,
        replay: Some(replay),
    })
}
