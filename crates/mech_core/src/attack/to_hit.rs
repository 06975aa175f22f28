//! To-hit accumulation.
//!
//! Modifiers are appended in a fixed order: gunnery, attacker and weapon
//! status, range, line of sight and terrain, weapon, attacker movement,
//! heat and damage, then target movement and stealth. Because the
//! accumulator stops at the first sentinel, the first disqualifying
//! condition in that order is the one reported.

use tracing::debug;

use crate::board::{Battlefield, HexCoord};
use crate::equipment::{RangeBand, WeaponFamily, WeaponMode};
use crate::network::CommandNetwork;
use crate::roll::{Modifier, ModifierValue, TargetRoll};
use crate::rules::RulesConfig;
use crate::unit::{CrewStatus, MovementMode, Unit, UnitId};

use super::{struck_side, AimedAttack, DeclaredAttack, Target};

/// Penalty for the target's movement this turn, by hexes entered.
#[must_use]
pub const fn target_movement_modifier(hexes: u32) -> i32 {
    match hexes {
        0..=2 => 0,
        3 | 4 => 1,
        5 | 6 => 2,
        7..=9 => 3,
        10..=17 => 4,
        18..=24 => 5,
        _ => 6,
    }
}

/// Penalty for the attacker's current heat.
#[must_use]
pub const fn heat_modifier(heat: u32) -> i32 {
    match heat {
        0..=7 => 0,
        8..=12 => 1,
        13..=16 => 2,
        17..=23 => 3,
        _ => 4,
    }
}

/// Stealth penalty by range band.
#[must_use]
pub const fn stealth_modifier(band: RangeBand) -> i32 {
    match band {
        RangeBand::Short | RangeBand::OutOfRange => 0,
        RangeBand::Medium => 1,
        RangeBand::Long | RangeBand::Extreme => 2,
    }
}

/// Closest range to the target from the firer or any network member with
/// line of sight to it. Returns the range and the member used, if any.
fn shared_range(
    units: &[Unit],
    board: &dyn Battlefield,
    firer: &Unit,
    target: HexCoord,
) -> (u32, Option<UnitId>) {
    let own = board.range(firer.position, target);
    CommandNetwork::members(units, board, firer.id())
        .into_iter()
        .filter_map(|id| units.get(id as usize))
        .filter(|m| !m.is_destroyed() && !board.line_of_sight(m.position, target).blocked)
        .map(|m| (board.range(m.position, target), Some(m.id())))
        .fold((own, None), |best, candidate| {
            if candidate.0 < best.0 {
                candidate
            } else {
                best
            }
        })
}

/// Build the to-hit accumulator for a declared attack. Reads only.
#[must_use]
pub fn aim(
    units: &[Unit],
    board: &dyn Battlefield,
    rules: &RulesConfig,
    declared: DeclaredAttack,
) -> AimedAttack {
    let decl = *declared.declaration();
    let side = struck_side(units, &declared);
    let target_pos = declared.target_position();
    let mut to_hit = TargetRoll::new();

    let Some(firer) = units.get(decl.attacker as usize) else {
        return AimedAttack {
            declared,
            to_hit: TargetRoll::impossible("attacker not present"),
            band: RangeBand::OutOfRange,
            range: 0,
            side,
            spotter: None,
            point_defense: None,
        };
    };
    let range = board.range(firer.position, target_pos);
    let Some(mount) = firer.mounts().get(decl.weapon) else {
        return AimedAttack {
            declared,
            to_hit: TargetRoll::impossible("weapon not present"),
            band: RangeBand::OutOfRange,
            range,
            side,
            spotter: None,
            point_defense: None,
        };
    };
    let Some(weapon) = mount.def.weapon() else {
        return AimedAttack {
            declared,
            to_hit: TargetRoll::impossible("not a weapon"),
            band: RangeBand::OutOfRange,
            range,
            side,
            spotter: None,
            point_defense: None,
        };
    };

    to_hit.add_flat(firer.crew().gunnery, "gunnery skill");

    if firer.is_destroyed() {
        to_hit.add(Modifier::new(ModifierValue::Impossible, "attacker destroyed"));
    }
    if firer.is_shutdown() {
        to_hit.add(Modifier::new(ModifierValue::Impossible, "attacker shut down"));
    }
    match firer.crew().status {
        CrewStatus::Dead => to_hit.add(Modifier::new(ModifierValue::Impossible, "crew dead")),
        CrewStatus::Unconscious => {
            to_hit.add(Modifier::new(ModifierValue::Impossible, "crew unconscious"));
        }
        CrewStatus::Active => {}
    }
    if mount.jammed {
        to_hit.add(Modifier::new(ModifierValue::Impossible, "weapon jammed"));
    }
    if firer.location_fired_opposite(decl.weapon) {
        let location = firer
            .locations()
            .get(mount.location)
            .map_or_else(|| "location".to_string(), |l| l.kind().to_string());
        to_hit.add(Modifier::new(
            ModifierValue::Impossible,
            format!("{location} already fired the other way this round"),
        ));
    }
    if let Some(ammo_type) = &weapon.ammo_type {
        let fed = mount
            .linked_ammo
            .and_then(|bin| firer.mounts().get(bin))
            .is_some_and(|bin| bin.can_feed(ammo_type));
        if !fed {
            to_hit.add(Modifier::new(ModifierValue::Impossible, "no ammunition"));
        }
    }

    if let Target::Unit(id) = decl.target {
        if units.get(id as usize).is_some_and(Unit::is_destroyed) {
            to_hit.add(Modifier::new(ModifierValue::Impossible, "target destroyed"));
        }
    }

    let (band_range, spotter) = shared_range(units, board, firer, target_pos);
    let band = weapon.ranges.band(band_range, rules.extreme_range);
    match band.modifier() {
        None => to_hit.add(Modifier::new(ModifierValue::Impossible, "target out of range")),
        Some(value) => {
            let label = match spotter {
                Some(id) => format!("{} (spotted by unit {id})", band.label()),
                None => band.label().to_string(),
            };
            to_hit.add_flat(value, label);
        }
    }
    let hot_loaded = mount.effective_mode() == WeaponMode::HotLoaded;
    if !hot_loaded {
        if let Some(penalty) = weapon.ranges.minimum_range_penalty(range) {
            to_hit.add_flat(penalty, "minimum range");
        }
    }

    let los = board.line_of_sight(firer.position, target_pos);
    if los.blocked {
        let reason = los.blocked_by.unwrap_or_else(|| "terrain".to_string());
        to_hit.add(Modifier::new(
            ModifierValue::Impossible,
            format!("line of sight blocked by {reason}"),
        ));
    }
    for modifier in los.modifiers {
        to_hit.add(modifier);
    }

    if weapon.to_hit_modifier != 0 {
        to_hit.add_flat(weapon.to_hit_modifier, "weapon accuracy");
    }
    if let WeaponFamily::Energy { pulse: true, .. } = weapon.family {
        to_hit.add_flat(-2, "pulse weapon");
    }

    let moved = firer.movement.mode.attacker_modifier();
    if moved != 0 {
        let label = match firer.movement.mode {
            MovementMode::Walked => "attacker walked",
            MovementMode::Ran => "attacker ran",
            _ => "attacker jumped",
        };
        to_hit.add_flat(moved, label);
    }
    let heat = heat_modifier(firer.heat());
    if heat != 0 {
        to_hit.add_flat(heat, "attacker heat");
    }
    let sensors = firer.sensor_hits() as i32 * rules.sensor_hit_modifier;
    if sensors != 0 {
        to_hit.add_flat(sensors, "sensor damage");
    }

    match decl.target {
        Target::Unit(id) => {
            if let Some(victim) = units.get(id as usize) {
                if victim.is_immobile() {
                    to_hit.add_flat(-4, "target immobile");
                } else {
                    let moved = target_movement_modifier(victim.movement.hexes);
                    if moved != 0 {
                        to_hit.add_flat(
                            moved,
                            format!("target moved {} hexes", victim.movement.hexes),
                        );
                    }
                    if victim.movement.mode == MovementMode::Jumped {
                        to_hit.add_flat(1, "target jumped");
                    }
                }
                if victim.has_stealth() {
                    let stealth = stealth_modifier(band);
                    if stealth != 0 {
                        to_hit.add_flat(stealth, "target stealth");
                    }
                }
            }
        }
        Target::Hex(_) => to_hit.add_flat(-4, "stationary hex target"),
    }

    debug!(
        attacker = decl.attacker,
        weapon = decl.weapon,
        target = %decl.target,
        to_hit = %to_hit.value(),
        "to-hit computed"
    );
    AimedAttack {
        declared,
        to_hit,
        band,
        range,
        side,
        spotter,
        point_defense: None,
    }
}
