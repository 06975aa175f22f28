//! Structured attack records.
//!
//! Everything a combat log needs is recorded here so the log can be
//! rendered without re-running any resolution logic.

use serde::{Deserialize, Serialize};

use crate::archetype::LocationKind;
use crate::board::HexCoord;
use crate::math::{fixed_serde, Fixed};
use crate::roll::{RollOutcome, TargetRoll};
use crate::unit::{CommitReport, MountId, UnitId};

use super::{AttackDeclaration, Target};

/// Final result of an attack.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AttackResult {
    /// Struck the target.
    Hit,
    /// Missed, including impossible and automatic-failure shots.
    Miss,
    /// Check not attempted; nothing happened.
    Skipped,
}

/// Cluster roll details.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClusterRecord {
    /// Volley size.
    pub size: u32,
    /// Natural roll, absent for all-or-nothing volleys.
    pub roll: Option<u8>,
    /// Total modifier applied.
    pub modifier: i32,
    /// Missiles or shots that struck.
    pub hits: u32,
}

/// Damage applied to one location by one step of the damage chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DamageRecord {
    /// Unit damaged.
    pub unit: UnitId,
    /// Location damaged.
    pub location: LocationKind,
    /// Against rear armor.
    pub rear: bool,
    /// Points delivered to this location.
    pub amount: u32,
    /// Points taken by armor.
    pub armor: u32,
    /// Points taken by internal structure.
    pub internal: u32,
    /// Arrived by transfer from an outer location.
    pub transferred: bool,
    /// This step doomed the location.
    pub doomed: bool,
}

/// A critical slot struck.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CriticalRecord {
    /// Unit struck.
    pub unit: UnitId,
    /// Location of the slot.
    pub location: LocationKind,
    /// Slot index.
    pub slot: usize,
    /// What was in it.
    pub component: String,
}

/// A secondary effect and what it did.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum EffectReport {
    /// An ammo bin detonated.
    AmmoExplosion {
        /// Owner of the bin.
        unit: UnitId,
        /// Bin.
        mount: MountId,
        /// Total damage.
        damage: u32,
        /// Damage chain.
        damage_records: Vec<DamageRecord>,
    },
    /// Mines were laid.
    MinefieldLaid {
        /// Hex.
        hex: HexCoord,
        /// Density added.
        density: u32,
    },
    /// A hex was set alight.
    TerrainIgnited {
        /// Hex.
        hex: HexCoord,
        /// Whether it is now burning.
        burning: bool,
    },
    /// A building took damage.
    BuildingDamaged {
        /// Hex.
        hex: HexCoord,
        /// Damage dealt.
        amount: u32,
        /// Construction factor left, `None` when no building stood there.
        remaining: Option<u32>,
    },
    /// A homing beacon was attached.
    BeaconAttached {
        /// Unit tagged.
        unit: UnitId,
    },
    /// A target was designated.
    TargetDesignated {
        /// Unit designated.
        unit: UnitId,
    },
    /// A point-defense mount engaged the volley.
    PointDefenseInterception {
        /// Defending unit.
        defender: UnitId,
        /// Point-defense mount.
        mount: MountId,
        /// Cluster modifier applied.
        cluster_modifier: i32,
    },
}

/// Complete record of one resolved attack.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttackReport {
    /// Declaration resolved.
    pub declaration: AttackDeclaration,
    /// Attacker name.
    pub attacker_name: String,
    /// Weapon name.
    pub weapon_name: String,
    /// Target description.
    pub target_name: String,
    /// To-hit breakdown.
    pub to_hit: TargetRoll,
    /// Folded to-hit outcome.
    pub outcome: RollOutcome,
    /// Natural 2d6 roll, when one was made.
    pub roll: Option<u8>,
    /// Result.
    pub result: AttackResult,
    /// Hit on exactly the target number with glancing blows enabled.
    pub glancing: bool,
    /// Extra damage per hit from the margin of success.
    pub direct_blow_bonus: u32,
    /// Shots fired by the weapon.
    pub shots_fired: u32,
    /// Heat generated by the attacker.
    pub heat_generated: u32,
    /// Rapid-fire weapon jammed.
    pub jammed: bool,
    /// Cluster roll, for volley weapons.
    pub cluster: Option<ClusterRecord>,
    /// Damage chain.
    pub damage: Vec<DamageRecord>,
    /// Critical slots struck.
    pub criticals: Vec<CriticalRecord>,
    /// Limbs torn away.
    pub blown_off: Vec<(UnitId, LocationKind)>,
    /// Locations newly doomed, including stranded dependents.
    pub locations_doomed: Vec<(UnitId, LocationKind)>,
    /// Secondary effects in processing order.
    pub effects: Vec<EffectReport>,
}

impl AttackReport {
    /// Empty record for `declaration`.
    #[must_use]
    pub fn new(declaration: AttackDeclaration, to_hit: TargetRoll) -> Self {
        let outcome = to_hit.value();
        Self {
            declaration,
            attacker_name: String::new(),
            weapon_name: String::new(),
            target_name: String::new(),
            to_hit,
            outcome,
            roll: None,
            result: AttackResult::Miss,
            glancing: false,
            direct_blow_bonus: 0,
            shots_fired: 0,
            heat_generated: 0,
            jammed: false,
            cluster: None,
            damage: Vec::new(),
            criticals: Vec::new(),
            blown_off: Vec::new(),
            locations_doomed: Vec::new(),
            effects: Vec::new(),
        }
    }

    /// Total damage delivered to `unit`, including transfers and
    /// secondary effects.
    #[must_use]
    pub fn damage_to(&self, unit: UnitId) -> u32 {
        let direct: u32 = self
            .damage
            .iter()
            .filter(|d| d.unit == unit)
            .map(|d| d.armor + d.internal)
            .sum();
        let secondary: u32 = self
            .effects
            .iter()
            .filter_map(|e| match e {
                EffectReport::AmmoExplosion { damage_records, .. } => Some(damage_records),
                _ => None,
            })
            .flatten()
            .filter(|d| d.unit == unit)
            .map(|d| d.armor + d.internal)
            .sum();
        direct + secondary
    }

    /// Attack struck its target.
    #[must_use]
    pub fn is_hit(&self) -> bool {
        self.result == AttackResult::Hit
    }
}

/// Point-defense assignment for a phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PointDefenseAssignment {
    /// Defending unit.
    pub defender: UnitId,
    /// Point-defense mount.
    pub mount: MountId,
    /// Index of the engaged attack among the phase's accepted attacks.
    pub attack: usize,
    /// Expected damage of the engaged attack.
    #[serde(with = "fixed_serde")]
    pub expected_damage: Fixed,
}

/// A declaration refused before any mutation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RejectedAttack {
    /// Declaration refused.
    pub declaration: AttackDeclaration,
    /// Reason.
    pub reason: String,
}

/// Everything that happened in one phase.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PhaseReport {
    /// Phase number.
    pub phase: u32,
    /// Point-defense assignments made at the start of the phase.
    pub point_defense: Vec<PointDefenseAssignment>,
    /// Resolved attacks in declaration order.
    pub attacks: Vec<AttackReport>,
    /// Refused declarations.
    pub rejected: Vec<RejectedAttack>,
    /// Commit results, once the phase is committed.
    pub commits: Vec<CommitReport>,
}

impl PhaseReport {
    /// Attacks aimed at `unit`.
    pub fn attacks_against(&self, unit: UnitId) -> impl Iterator<Item = &AttackReport> {
        self.attacks
            .iter()
            .filter(move |a| a.declaration.target == Target::Unit(unit))
    }

    /// Attacks made by `unit`.
    pub fn attacks_by(&self, unit: UnitId) -> impl Iterator<Item = &AttackReport> {
        self.attacks
            .iter()
            .filter(move |a| a.declaration.attacker == unit)
    }
}
