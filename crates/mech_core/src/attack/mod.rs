//! Attack resolution pipeline.
//!
//! An attack moves through three types:
//!
//! - [`DeclaredAttack`]: the declaration passed validation. Nothing has
//!   been touched.
//! - [`AimedAttack`]: the to-hit accumulator is built. It can still be
//!   withdrawn with no effect on any unit.
//! - [`AttackReport`]: dice were drawn and the outcome applied. Final.
//!
//! Resolution itself (roll, damage strategy, secondary effects) lives in
//! [`resolve`]; point-defense assignment for a phase batch lives in
//! [`point_defense`].

pub mod cluster;
pub mod point_defense;
pub mod report;
pub mod resolve;
pub mod to_hit;

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::board::{attack_side, in_arc, HexCoord, Side};
use crate::equipment::{RangeBand, WeaponFamily};
use crate::error::{CombatError, Result};
use crate::roll::TargetRoll;
use crate::unit::{MountId, Unit, UnitId};

pub use report::{
    AttackReport, AttackResult, ClusterRecord, CriticalRecord, DamageRecord, EffectReport,
    PhaseReport, PointDefenseAssignment, RejectedAttack,
};

/// What an attack is aimed at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Target {
    /// A unit.
    Unit(UnitId),
    /// A hex (mines, fires, artillery).
    Hex(HexCoord),
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unit(id) => write!(f, "unit {id}"),
            Self::Hex(hex) => write!(f, "hex {hex}"),
        }
    }
}

/// A weapon attack as declared by the turn sequencer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AttackDeclaration {
    /// Firing unit.
    pub attacker: UnitId,
    /// Weapon mount on the firing unit.
    pub weapon: MountId,
    /// Target.
    pub target: Target,
}

impl AttackDeclaration {
    /// Declaration against a unit.
    #[must_use]
    pub const fn at_unit(attacker: UnitId, weapon: MountId, target: UnitId) -> Self {
        Self {
            attacker,
            weapon,
            target: Target::Unit(target),
        }
    }

    /// Declaration against a hex.
    #[must_use]
    pub const fn at_hex(attacker: UnitId, weapon: MountId, hex: HexCoord) -> Self {
        Self {
            attacker,
            weapon,
            target: Target::Hex(hex),
        }
    }
}

/// A declaration that passed validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeclaredAttack {
    declaration: AttackDeclaration,
    family: WeaponFamily,
    target_position: HexCoord,
}

impl DeclaredAttack {
    /// Underlying declaration.
    #[must_use]
    pub const fn declaration(&self) -> &AttackDeclaration {
        &self.declaration
    }

    /// Weapon family of the declared weapon.
    #[must_use]
    pub const fn family(&self) -> WeaponFamily {
        self.family
    }

    /// Hex the attack is aimed at.
    #[must_use]
    pub const fn target_position(&self) -> HexCoord {
        self.target_position
    }
}

/// A declared attack with its to-hit accumulator built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AimedAttack {
    declared: DeclaredAttack,
    to_hit: TargetRoll,
    band: RangeBand,
    range: u32,
    side: Side,
    spotter: Option<UnitId>,
    point_defense: Option<PointDefenseAssignment>,
}

impl AimedAttack {
    /// Declared attack.
    #[must_use]
    pub const fn declared(&self) -> &DeclaredAttack {
        &self.declared
    }

    /// Underlying declaration.
    #[must_use]
    pub const fn declaration(&self) -> &AttackDeclaration {
        &self.declared.declaration
    }

    /// To-hit accumulator.
    #[must_use]
    pub const fn to_hit(&self) -> &TargetRoll {
        &self.to_hit
    }

    /// Range band used for modifiers and damage.
    #[must_use]
    pub const fn band(&self) -> RangeBand {
        self.band
    }

    /// Range from the firer in hexes.
    #[must_use]
    pub const fn range(&self) -> u32 {
        self.range
    }

    /// Side of the target struck.
    #[must_use]
    pub const fn side(&self) -> Side {
        self.side
    }

    /// Network member whose range was used, if not the firer.
    #[must_use]
    pub const fn spotter(&self) -> Option<UnitId> {
        self.spotter
    }

    /// Point defense engaging this attack.
    #[must_use]
    pub const fn point_defense(&self) -> Option<&PointDefenseAssignment> {
        self.point_defense.as_ref()
    }

    pub(crate) fn set_point_defense(&mut self, assignment: PointDefenseAssignment) {
        if self.point_defense.is_none() {
            self.point_defense = Some(assignment);
        }
    }

    /// Abandon the attack before any dice are drawn.
    #[must_use]
    pub fn withdraw(self) -> AttackDeclaration {
        self.declared.declaration
    }
}

fn get(units: &[Unit], id: UnitId) -> Result<&Unit> {
    units.get(id as usize).ok_or(CombatError::UnitNotFound(id))
}

/// Validate a declaration against the unit arena.
///
/// # Errors
///
/// Returns the matching invalid-declaration [`CombatError`]: unknown unit
/// or mount, not a weapon, already fired, destroyed, missing, point
/// defense, self-target, a target the family cannot engage, or a target
/// outside the weapon's arc.
pub fn declare(units: &[Unit], declaration: AttackDeclaration) -> Result<DeclaredAttack> {
    let AttackDeclaration {
        attacker,
        weapon,
        target,
    } = declaration;
    let firer = get(units, attacker)?;
    let mount = firer.mount(weapon)?;
    let def = mount.def.weapon().ok_or(CombatError::NotAWeapon {
        unit: attacker,
        mount: weapon,
    })?;
    if mount.missing {
        return Err(CombatError::WeaponMissing {
            unit: attacker,
            mount: weapon,
        });
    }
    if mount.destroyed {
        return Err(CombatError::WeaponDestroyed {
            unit: attacker,
            mount: weapon,
        });
    }
    if def.family.is_point_defense() {
        return Err(CombatError::AutomaticWeapon {
            unit: attacker,
            mount: weapon,
        });
    }
    if mount.used_this_round {
        return Err(CombatError::WeaponAlreadyFired {
            unit: attacker,
            mount: weapon,
        });
    }
    let invalid_target = || CombatError::InvalidTarget {
        unit: attacker,
        mount: weapon,
        target: target.to_string(),
    };
    let target_position = match target {
        Target::Unit(id) if id == attacker => return Err(CombatError::SelfTarget(attacker)),
        Target::Unit(id) => {
            let victim = get(units, id)?;
            if !def.family.can_target_unit() {
                return Err(invalid_target());
            }
            victim.position
        }
        Target::Hex(hex) => {
            if !def.family.can_target_hex() {
                return Err(invalid_target());
            }
            hex
        }
    };
    if !in_arc(
        firer.position,
        firer.facing,
        firer.weapon_arc(weapon),
        target_position,
    ) {
        return Err(CombatError::OutOfArc {
            unit: attacker,
            mount: weapon,
        });
    }
    Ok(DeclaredAttack {
        declaration,
        family: def.family,
        target_position,
    })
}

/// Side of the target struck by a declared attack. Hex targets count as
/// frontal.
fn struck_side(units: &[Unit], declared: &DeclaredAttack) -> Side {
    match declared.declaration.target {
        Target::Unit(id) => match (
            units.get(declared.declaration.attacker as usize),
            units.get(id as usize),
        ) {
            (Some(firer), Some(victim)) => {
                attack_side(firer.position, victim.position, victim.facing)
            }
            _ => Side::Front,
        },
        Target::Hex(_) => Side::Front,
    }
}
