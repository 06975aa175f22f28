//! Scenario loading and configuration.
//!
//! A scenario carries everything needed to replay an engagement without a
//! turn sequencer: the equipment catalog, the units, the board, the
//! command-network links and the attacks declared in each phase.

use std::collections::HashMap;
use std::path::Path;

use mech_core::attack::AttackDeclaration;
use mech_core::board::{EcmField, HexCoord, OpenField, Terrain};
use mech_core::data::{Catalog, UnitData};
use mech_core::engine::CombatEngine;
use mech_core::error::CombatError;
use mech_core::rules::RulesConfig;
use mech_core::unit::{MountId, UnitId};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

/// Error type for scenario operations.
#[derive(Error, Debug)]
pub enum ScenarioError {
    /// File not found.
    #[error("Scenario file not found: {0}")]
    FileNotFound(String),
    /// Failed to read or write a file.
    #[error("Scenario I/O failed: {0}")]
    Io(#[from] std::io::Error),
    /// Failed to parse RON.
    #[error("Failed to parse scenario: {0}")]
    ParseError(#[from] ron::error::SpannedError),
    /// Failed to write JSON output.
    #[error("Failed to encode output: {0}")]
    Json(#[from] serde_json::Error),
    /// The engine refused part of the setup.
    #[error("Combat setup failed: {0}")]
    Combat(#[from] CombatError),
    /// A declaration or link names a unit the scenario does not define.
    #[error("Scenario references unknown unit '{0}'")]
    UnknownUnit(String),
    /// Two units share a name.
    #[error("Scenario defines unit '{0}' more than once")]
    DuplicateUnit(String),
}

/// Terrain placed on one hex.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TerrainPlacement {
    /// Hex.
    pub hex: HexCoord,
    /// Terrain there.
    pub terrain: Terrain,
}

/// Building placed on one hex.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildingPlacement {
    /// Hex.
    pub hex: HexCoord,
    /// Starting construction factor.
    pub construction_factor: u32,
}

/// Board layout.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct BoardSetup {
    /// Non-clear terrain.
    #[serde(default)]
    pub terrain: Vec<TerrainPlacement>,
    /// Buildings.
    #[serde(default)]
    pub buildings: Vec<BuildingPlacement>,
    /// Static interference fields.
    #[serde(default)]
    pub ecm: Vec<EcmField>,
}

impl BoardSetup {
    /// Build the reference board.
    #[must_use]
    pub fn build(&self) -> OpenField {
        let mut board = OpenField::new();
        for t in &self.terrain {
            board = board.with_terrain(t.hex, t.terrain);
        }
        for b in &self.buildings {
            board = board.with_building(b.hex, b.construction_factor);
        }
        for field in &self.ecm {
            board = board.with_ecm(*field);
        }
        board
    }
}

/// Master assignment in a hierarchical network.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MasterLink {
    /// Unit being linked.
    pub unit: String,
    /// Its master; the unit itself for a company master.
    pub master: String,
}

/// What a scripted attack is aimed at.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TargetSetup {
    /// A unit by name.
    Unit(String),
    /// A hex.
    Hex(HexCoord),
}

/// One scripted attack.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttackSetup {
    /// Firing unit by name.
    pub attacker: String,
    /// Mount index on the firing unit.
    pub weapon: MountId,
    /// Target.
    pub target: TargetSetup,
}

const fn default_true() -> bool {
    true
}

/// One scripted phase.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhaseSetup {
    /// Start a new round before this phase.
    #[serde(default = "default_true")]
    pub new_round: bool,
    /// Attacks in declaration order.
    #[serde(default)]
    pub attacks: Vec<AttackSetup>,
}

/// A complete scenario configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scenario {
    /// Scenario name.
    pub name: String,
    /// Human-readable description.
    #[serde(default)]
    pub description: String,
    /// Default dice seed.
    #[serde(default)]
    pub seed: u64,
    /// Optional rules.
    #[serde(default)]
    pub rules: RulesConfig,
    /// Equipment the units refer to.
    pub catalog: Catalog,
    /// Units, added in order; the first is unit 0.
    pub units: Vec<UnitData>,
    /// Board layout.
    #[serde(default)]
    pub board: BoardSetup,
    /// Hierarchical network links, applied in order.
    #[serde(default)]
    pub masters: Vec<MasterLink>,
    /// Peer networks.
    #[serde(default)]
    pub peers: Vec<Vec<String>>,
    /// Scripted phases.
    #[serde(default)]
    pub phases: Vec<PhaseSetup>,
}

/// A scenario turned into engine state and declarations.
#[derive(Debug, Clone)]
pub struct PreparedScenario {
    /// Engine before the first phase.
    pub engine: CombatEngine,
    /// Board before the first phase.
    pub board: OpenField,
    /// Phases as `(new_round, declarations)`.
    pub phases: Vec<(bool, Vec<AttackDeclaration>)>,
}

impl Scenario {
    /// Load a scenario from a RON file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ScenarioError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ScenarioError::FileNotFound(path.display().to_string()));
        }
        let contents = std::fs::read_to_string(path)?;
        Self::from_ron_str(&contents)
    }

    /// Load from a RON string (useful for embedded scenarios).
    pub fn from_ron_str(ron: &str) -> Result<Self, ScenarioError> {
        let scenario: Scenario = ron::from_str(ron)?;
        Ok(scenario)
    }

    /// The bundled two-unit duel.
    pub fn duel() -> Result<Self, ScenarioError> {
        Self::from_ron_str(include_str!("../scenarios/duel.ron"))
    }

    /// Build the engine, the board and the declarations.
    pub fn prepare(&self) -> Result<PreparedScenario, ScenarioError> {
        let mut engine = CombatEngine::new(self.rules.clone());
        let mut ids: HashMap<&str, UnitId> = HashMap::new();
        for data in &self.units {
            let unit = data.build(&self.catalog)?;
            let id = engine.add_unit(unit);
            if ids.insert(data.name.as_str(), id).is_some() {
                return Err(ScenarioError::DuplicateUnit(data.name.clone()));
            }
        }
        let lookup = |name: &str| {
            ids.get(name)
                .copied()
                .ok_or_else(|| ScenarioError::UnknownUnit(name.to_string()))
        };

        let board = self.board.build();
        for link in &self.masters {
            let unit = lookup(&link.unit)?;
            let master = lookup(&link.master)?;
            engine.set_master(&board, unit, Some(master))?;
        }
        for group in &self.peers {
            let members = group
                .iter()
                .map(|name| lookup(name))
                .collect::<Result<Vec<_>, _>>()?;
            let id = engine.join_peers(&members)?;
            debug!(network = %id, members = members.len(), "peer network joined");
        }

        let mut phases = Vec::with_capacity(self.phases.len());
        for phase in &self.phases {
            let declarations = phase
                .attacks
                .iter()
                .map(|attack| {
                    let attacker = lookup(&attack.attacker)?;
                    Ok(match &attack.target {
                        TargetSetup::Unit(name) => {
                            AttackDeclaration::at_unit(attacker, attack.weapon, lookup(name)?)
                        }
                        TargetSetup::Hex(hex) => {
                            AttackDeclaration::at_hex(attacker, attack.weapon, *hex)
                        }
                    })
                })
                .collect::<Result<Vec<_>, ScenarioError>>()?;
            phases.push((phase.new_round, declarations));
        }

        info!(
            scenario = %self.name,
            units = self.units.len(),
            phases = phases.len(),
            "scenario prepared"
        );
        Ok(PreparedScenario {
            engine,
            board,
            phases,
        })
    }
}
