//! Combat engine: the unit arena and the phase/round lifecycle.
//!
//! [`CombatEngine`] owns every unit and the command-network registry. The
//! board and the dice are collaborators passed into each call, so the
//! engine itself is plain data and serializes in full.
//!
//! # Determinism
//!
//! - No system randomness: every roll comes from the injected [`Dice`]
//! - Units are visited in id order everywhere
//! - Same state, same declarations, same dice, same reports
//!
//! # Example
//!
//! ```
//! use mech_core::prelude::*;
//!
//! let mut engine = CombatEngine::new(RulesConfig::default());
//! let mut board = OpenField::new();
//! let mut dice = SeededDice::new(7);
//!
//! let report = engine.resolve_phase(&mut board, &mut dice, &[]);
//! assert!(report.attacks.is_empty());
//! engine.commit_phase();
//! engine.start_round(&board);
//! ```

use std::collections::hash_map::DefaultHasher;
use std::collections::BTreeSet;
use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::attack::{
    self, point_defense, resolve, to_hit, AimedAttack, AttackDeclaration, AttackReport,
    DeclaredAttack, PhaseReport, RejectedAttack,
};
use crate::board::Battlefield;
use crate::dice::Dice;
use crate::error::{CombatError, Result};
use crate::network::CommandNetwork;
use crate::rules::RulesConfig;
use crate::unit::{CommitReport, RoundStart, TeamId, Unit, UnitId};

/// Combat state for one engagement.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CombatEngine {
    units: Vec<Unit>,
    network: CommandNetwork,
    rules: RulesConfig,
    phase: u32,
    round: u32,
}

impl CombatEngine {
    /// Empty engine under `rules`.
    #[must_use]
    pub fn new(rules: RulesConfig) -> Self {
        Self {
            rules,
            ..Self::default()
        }
    }

    /// Rules in force.
    #[must_use]
    pub const fn rules(&self) -> &RulesConfig {
        &self.rules
    }

    /// Phases committed so far.
    #[must_use]
    pub const fn phase(&self) -> u32 {
        self.phase
    }

    /// Rounds started so far.
    #[must_use]
    pub const fn round(&self) -> u32 {
        self.round
    }

    /// Add a unit. Its id becomes its arena index.
    pub fn add_unit(&mut self, mut unit: Unit) -> UnitId {
        let id = self.units.len() as UnitId;
        unit.set_id(id);
        info!(unit = id, name = unit.name(), team = unit.team(), "unit added");
        self.units.push(unit);
        id
    }

    /// All units in id order.
    #[must_use]
    pub fn units(&self) -> &[Unit] {
        &self.units
    }

    /// Unit by id.
    ///
    /// # Errors
    ///
    /// Returns [`CombatError::UnitNotFound`] for an unknown id.
    pub fn unit(&self, id: UnitId) -> Result<&Unit> {
        self.units
            .get(id as usize)
            .ok_or(CombatError::UnitNotFound(id))
    }

    /// Mutable unit by id, for the turn sequencer (movement, modes).
    ///
    /// # Errors
    ///
    /// Returns [`CombatError::UnitNotFound`] for an unknown id.
    pub fn unit_mut(&mut self, id: UnitId) -> Result<&mut Unit> {
        self.units
            .get_mut(id as usize)
            .ok_or(CombatError::UnitNotFound(id))
    }

    /// Units still in the fight for `team`.
    pub fn survivors(&self, team: TeamId) -> impl Iterator<Item = &Unit> {
        self.units
            .iter()
            .filter(move |u| u.team() == team && !u.is_destroyed())
    }

    // ------------------------------------------------------------------
    // Command network
    // ------------------------------------------------------------------

    /// Set or clear the master of `unit`.
    ///
    /// # Errors
    ///
    /// See [`CommandNetwork::set_master`].
    pub fn set_master(
        &mut self,
        board: &dyn Battlefield,
        unit: UnitId,
        master: Option<UnitId>,
    ) -> Result<()> {
        self.network
            .set_master(&mut self.units, board, unit, master)
    }

    /// Put `members` on one fresh peer network.
    ///
    /// # Errors
    ///
    /// See [`CommandNetwork::join_peers`].
    pub fn join_peers(&mut self, members: &[UnitId]) -> Result<String> {
        self.network.join_peers(&mut self.units, members)
    }

    /// Units sharing a working network with `unit`.
    #[must_use]
    pub fn network_members(&self, board: &dyn Battlefield, unit: UnitId) -> Vec<UnitId> {
        CommandNetwork::members(&self.units, board, unit)
    }

    // ------------------------------------------------------------------
    // Attacks
    // ------------------------------------------------------------------

    /// Validate a declaration. Touches nothing.
    ///
    /// # Errors
    ///
    /// Returns the invalid-declaration [`CombatError`] for a bad declaration.
    pub fn declare(&self, declaration: AttackDeclaration) -> Result<DeclaredAttack> {
        attack::declare(&self.units, declaration)
    }

    /// Build the to-hit accumulator. Touches nothing.
    #[must_use]
    pub fn aim(&self, board: &dyn Battlefield, declared: DeclaredAttack) -> AimedAttack {
        to_hit::aim(&self.units, board, &self.rules, declared)
    }

    /// Roll and apply an aimed attack.
    ///
    /// # Errors
    ///
    /// See [`resolve::resolve`].
    pub fn resolve(
        &mut self,
        board: &mut dyn Battlefield,
        dice: &mut dyn Dice,
        aimed: AimedAttack,
    ) -> Result<AttackReport> {
        resolve::resolve(&mut self.units, board, dice, &self.rules, aimed)
    }

    /// Declare, aim and resolve one attack.
    ///
    /// # Errors
    ///
    /// Returns the declaration error, or any error from [`Self::resolve`].
    pub fn attack(
        &mut self,
        board: &mut dyn Battlefield,
        dice: &mut dyn Dice,
        declaration: AttackDeclaration,
    ) -> Result<AttackReport> {
        let declared = self.declare(declaration)?;
        let aimed = self.aim(&*board, declared);
        self.resolve(board, dice, aimed)
    }

    /// Resolve a phase's declarations as a batch.
    ///
    /// Every declaration is validated first; refused ones and repeats of a
    /// weapon are reported as rejected. Point defense is then assigned
    /// against the accepted attacks, and the attacks resolve in declaration
    /// order. Each attack is re-aimed just before its roll so that damage
    /// dealt earlier in the phase is seen. The phase is not committed.
    pub fn resolve_phase(
        &mut self,
        board: &mut dyn Battlefield,
        dice: &mut dyn Dice,
        declarations: &[AttackDeclaration],
    ) -> PhaseReport {
        let mut report = PhaseReport {
            phase: self.phase,
            ..PhaseReport::default()
        };
        let mut weapons = BTreeSet::new();
        let mut aimed = Vec::new();
        for &declaration in declarations {
            let checked = if weapons.insert((declaration.attacker, declaration.weapon)) {
                self.declare(declaration)
            } else {
                Err(CombatError::WeaponAlreadyFired {
                    unit: declaration.attacker,
                    mount: declaration.weapon,
                })
            };
            match checked {
                Ok(declared) => aimed.push(self.aim(&*board, declared)),
                Err(e) => reject(&mut report, declaration, &e),
            }
        }

        report.point_defense =
            point_defense::assign(&mut self.units, &*board, &self.rules, &mut aimed);

        for planned in aimed {
            let declaration = *planned.declaration();
            let mut fresh = self.aim(&*board, planned.declared().clone());
            if let Some(&assignment) = planned.point_defense() {
                fresh.set_point_defense(assignment);
            }
            match self.resolve(board, dice, fresh) {
                Ok(attack) => report.attacks.push(attack),
                Err(e) => reject(&mut report, declaration, &e),
            }
        }
        debug!(
            phase = self.phase,
            attacks = report.attacks.len(),
            rejected = report.rejected.len(),
            "phase resolved"
        );
        report
    }

    // ------------------------------------------------------------------
    // Lifecycle
    // ------------------------------------------------------------------

    /// Commit the phase: the only point where hits become destruction.
    /// Returns the units that changed.
    pub fn commit_phase(&mut self) -> Vec<CommitReport> {
        let reports: Vec<CommitReport> = self
            .units
            .iter_mut()
            .map(Unit::commit_phase)
            .filter(|r| !r.is_empty())
            .collect();
        #[cfg(feature = "debug-validation")]
        self.validate();
        info!(phase = self.phase, changed = reports.len(), "phase committed");
        self.phase += 1;
        reports
    }

    /// Start a new round on every unit and refresh the command networks.
    pub fn start_round(&mut self, board: &dyn Battlefield) -> Vec<RoundStart> {
        let starts = self.units.iter_mut().map(Unit::start_round).collect();
        self.network.refresh(&mut self.units, board);
        self.round += 1;
        debug!(round = self.round, "round started");
        starts
    }

    #[cfg(feature = "debug-validation")]
    fn validate(&self) {
        for (index, unit) in self.units.iter().enumerate() {
            debug_assert_eq!(unit.id() as usize, index, "unit id must match arena index");
            debug_assert!(
                unit.total_armor() <= unit.total_original_armor(),
                "armor cannot exceed its starting value"
            );
        }
    }

    // ------------------------------------------------------------------
    // Persistence
    // ------------------------------------------------------------------

    /// Hash of the combat state, for replay verification.
    #[must_use]
    pub fn state_hash(&self) -> u64 {
        let mut hasher = DefaultHasher::new();
        self.phase.hash(&mut hasher);
        self.round.hash(&mut hasher);
        self.units.len().hash(&mut hasher);
        for unit in &self.units {
            unit.id().hash(&mut hasher);
            unit.position.hash(&mut hasher);
            unit.facing.hash(&mut hasher);
            unit.heat().hash(&mut hasher);
            unit.pending_heat().hash(&mut hasher);
            unit.is_destroyed().hash(&mut hasher);
            unit.is_doomed().hash(&mut hasher);
            unit.crew().hits.hash(&mut hasher);
            unit.crew().status.hash(&mut hasher);
            unit.locations().hash(&mut hasher);
            unit.mounts().hash(&mut hasher);
            unit.network_link().hash(&mut hasher);
        }
        hasher.finish()
    }

    /// Serialize the engine state to bytes.
    ///
    /// # Errors
    ///
    /// Returns [`CombatError::InvalidState`] if serialization fails.
    pub fn serialize(&self) -> Result<Vec<u8>> {
        bincode::serialize(self)
            .map_err(|e| CombatError::InvalidState(format!("Failed to serialize engine: {e}")))
    }

    /// Deserialize engine state from bytes.
    ///
    /// # Errors
    ///
    /// Returns [`CombatError::InvalidState`] if deserialization fails.
    pub fn deserialize(data: &[u8]) -> Result<Self> {
        bincode::deserialize(data)
            .map_err(|e| CombatError::InvalidState(format!("Failed to deserialize engine: {e}")))
    }
}

fn reject(report: &mut PhaseReport, declaration: AttackDeclaration, error: &CombatError) {
    warn!(
        attacker = declaration.attacker,
        weapon = declaration.weapon,
        %error,
        "attack rejected"
    );
    report.rejected.push(RejectedAttack {
        declaration,
        reason: error.to_string(),
    });
}
