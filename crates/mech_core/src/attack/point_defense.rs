//! Point-defense assignment.
//!
//! At the start of a phase every working point-defense mount is assigned
//! to one incoming missile attack: the one in its arc with the highest
//! expected damage. Ties go to the lowest `(attacker, weapon)` pair, so
//! the result never depends on declaration order. Each mount engages at
//! most one attack per phase, and an attack already engaged by an earlier
//! mount is not picked again.

use std::cmp::Reverse;

use tracing::debug;

use crate::board::{in_arc, Battlefield};
use crate::equipment::{MountId, WeaponFamily};
use crate::math::{success_chance, Fixed};
use crate::network::interference_between;
use crate::rules::RulesConfig;
use crate::unit::{Unit, UnitId};

use super::cluster::expected_hits;
use super::{AimedAttack, PointDefenseAssignment, Target};

/// An attack a point-defense mount could engage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Candidate {
    /// Index of the attack in the phase.
    pub attack: usize,
    /// Attacking unit.
    pub attacker: UnitId,
    /// Attacking weapon.
    pub weapon: MountId,
    /// Expected damage if not intercepted.
    pub expected_damage: Fixed,
}

impl Candidate {
    fn rank(&self) -> (Fixed, Reverse<UnitId>, Reverse<MountId>) {
        (
            self.expected_damage,
            Reverse(self.attacker),
            Reverse(self.weapon),
        )
    }
}

/// Highest expected damage, ties to the lowest `(attacker, weapon)`.
#[must_use]
pub fn pick_engagement(candidates: &[Candidate]) -> Option<Candidate> {
    candidates
        .iter()
        .copied()
        .max_by_key(Candidate::rank)
}

/// Cluster modifier from fire control and beacons, before interception.
#[must_use]
pub fn guidance_bonus(
    units: &[Unit],
    board: &dyn Battlefield,
    rules: &RulesConfig,
    attack: &AimedAttack,
) -> i32 {
    let WeaponFamily::Missile(rack) = attack.declared().family() else {
        return 0;
    };
    let decl = attack.declaration();
    let mut bonus = 0;
    if rack.artemis {
        let jammed = units.get(decl.attacker as usize).is_some_and(|firer| {
            interference_between(
                units,
                board,
                firer.position,
                attack.declared().target_position(),
                firer.team(),
            )
        });
        if !jammed {
            bonus += rules.artemis_cluster_bonus;
        }
    }
    if let Target::Unit(id) = decl.target {
        if units.get(id as usize).is_some_and(Unit::has_beacon) {
            bonus += rules.beacon_cluster_bonus;
        }
    }
    bonus
}

/// Expected damage of a missile attack. Zero for every other family.
#[must_use]
pub fn expected_damage(
    units: &[Unit],
    board: &dyn Battlefield,
    rules: &RulesConfig,
    attack: &AimedAttack,
) -> Fixed {
    let WeaponFamily::Missile(rack) = attack.declared().family() else {
        return Fixed::ZERO;
    };
    let chance = success_chance(attack.to_hit().value());
    let size = u32::from(rack.size);
    let missiles = if rack.streak {
        Fixed::from_num(size)
    } else {
        expected_hits(size, guidance_bonus(units, board, rules, attack))
    };
    chance * missiles * Fixed::from_num(rack.damage_per_missile)
}

fn can_engage(unit: &Unit, id: MountId) -> bool {
    let Some(mount) = unit.mounts().get(id) else {
        return false;
    };
    let Some(weapon) = mount.def.weapon() else {
        return false;
    };
    if !weapon.family.is_point_defense()
        || !unit.is_functional(id)
        || mount.used_this_round
        || mount.jammed
    {
        return false;
    }
    match &weapon.ammo_type {
        None => true,
        Some(ammo_type) => mount
            .linked_ammo
            .and_then(|bin| unit.mounts().get(bin))
            .is_some_and(|bin| bin.can_feed(ammo_type)),
    }
}

/// Assign every working point-defense mount for the phase. Marks each
/// assigned mount used and records the assignment on the engaged attack.
pub fn assign(
    units: &mut [Unit],
    board: &dyn Battlefield,
    rules: &RulesConfig,
    attacks: &mut [AimedAttack],
) -> Vec<PointDefenseAssignment> {
    let mut assignments = Vec::new();
    if !rules.point_defense {
        return assignments;
    }
    let expected: Vec<Fixed> = attacks
        .iter()
        .map(|a| expected_damage(units, board, rules, a))
        .collect();

    for defender in 0..units.len() {
        for mount in 0..units[defender].mounts().len() {
            let unit = &units[defender];
            if !can_engage(unit, mount) {
                continue;
            }
            let arc = unit.weapon_arc(mount);
            let candidates: Vec<Candidate> = attacks
                .iter()
                .enumerate()
                .filter(|(_, a)| a.declaration().target == Target::Unit(unit.id()))
                .filter(|(_, a)| a.point_defense().is_none())
                .filter(|(i, _)| expected[*i] > Fixed::ZERO)
                .filter_map(|(i, a)| {
                    let attacker = units.get(a.declaration().attacker as usize)?;
                    in_arc(unit.position, unit.facing, arc, attacker.position).then_some(
                        Candidate {
                            attack: i,
                            attacker: a.declaration().attacker,
                            weapon: a.declaration().weapon,
                            expected_damage: expected[i],
                        },
                    )
                })
                .collect();
            let Some(pick) = pick_engagement(&candidates) else {
                continue;
            };
            let assignment = PointDefenseAssignment {
                defender: unit.id(),
                mount,
                attack: pick.attack,
                expected_damage: pick.expected_damage,
            };
            debug!(
                defender = assignment.defender,
                mount,
                attack = pick.attack,
                expected = %pick.expected_damage,
                "point defense assigned"
            );
            if let Ok(m) = units[defender].mount_mut(mount) {
                m.used_this_round = true;
            }
            attacks[pick.attack].set_point_defense(assignment);
            assignments.push(assignment);
        }
    }
    assignments
}
