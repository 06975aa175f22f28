//! Damage chain tests: transfer, criticals, commit, ammunition explosions.
//!
//! Every test drives the engine with scripted dice so the hit location,
//! critical roll and slot pick are exact.

use mech_core::archetype::LocationKind;
use mech_core::attack::{AttackDeclaration, AttackResult, EffectReport};
use mech_core::board::OpenField;
use mech_core::dice::ScriptedDice;
use mech_core::engine::CombatEngine;
use mech_core::equipment::{
    EquipmentDef, EquipmentKind, RangeBands, WeaponDamage, WeaponDef, WeaponFamily,
};
use mech_core::rules::RulesConfig;
use mech_core::structure::SlotState;
use mech_test_utils::fixtures::{autocannon_ammo, laser_walker, medium_laser, UnitBuilder};

fn heavy_laser(damage: u32) -> EquipmentDef {
    EquipmentDef {
        name: format!("{damage}-point laser"),
        kind: EquipmentKind::Weapon(WeaponDef {
            family: WeaponFamily::Energy {
                damage: WeaponDamage::Flat(damage),
                pulse: false,
            },
            ranges: RangeBands {
                minimum: 0,
                short: 3,
                medium: 6,
                long: 9,
                extreme: 12,
            },
            heat: 10,
            ammo_type: None,
            to_hit_modifier: 0,
        }),
        slots: 1,
        hittable: true,
    }
}

/// Attacker at the origin facing north, target two hexes north facing
/// south: every shot lands on the target's front.
fn duel_with(target: UnitBuilder, weapon: EquipmentDef) -> CombatEngine {
    let mut engine = CombatEngine::new(RulesConfig::default());
    engine.add_unit(
        UnitBuilder::biped("Attacker")
            .team(1)
            .at(0, 0, 0)
            .mount(weapon, LocationKind::RightArm)
            .build(),
    );
    engine.add_unit(target.team(2).at(0, -2, 3).build());
    engine
}

#[test]
fn test_overflow_transfers_inward() {
    let mut engine = duel_with(UnitBuilder::biped("Target"), heavy_laser(18));
    let mut board = OpenField::new();
    // to-hit 8, location 10 (left arm)
    let mut dice = ScriptedDice::new([8, 10]);

    let report = engine
        .attack(&mut board, &mut dice, AttackDeclaration::at_unit(0, 0, 1))
        .unwrap_or_else(|e| panic!("attack failed: {e}"));

    assert_eq!(report.damage.len(), 2);
    let arm = report.damage[0];
    assert_eq!(arm.location, LocationKind::LeftArm);
    assert_eq!((arm.armor, arm.internal), (10, 5));
    assert!(arm.doomed);
    let torso = report.damage[1];
    assert_eq!(torso.location, LocationKind::LeftTorso);
    assert!(torso.transferred);
    assert_eq!(torso.amount, 3);
    assert_eq!(torso.armor, 3);
    assert_eq!(report.locations_doomed, vec![(1, LocationKind::LeftArm)]);
    assert_eq!(report.damage_to(1), 18);
}

#[test]
fn test_doomed_location_waits_for_commit() {
    let mut engine = duel_with(
        UnitBuilder::biped("Target").mount(medium_laser(), LocationKind::LeftArm),
        heavy_laser(18),
    );
    let mut board = OpenField::new();
    let mut dice = ScriptedDice::new([8, 10]);
    engine
        .attack(&mut board, &mut dice, AttackDeclaration::at_unit(0, 0, 1))
        .unwrap_or_else(|e| panic!("attack failed: {e}"));

    let target = engine.unit(1).unwrap_or_else(|e| panic!("{e}"));
    let arm = target
        .location_index(LocationKind::LeftArm)
        .unwrap_or_else(|| panic!("biped has a left arm"));
    assert!(target.locations()[arm].is_doomed());
    assert!(!target.locations()[arm].is_destroyed());
    assert!(!target.mounts()[0].missing);

    let commits = engine.commit_phase();
    assert_eq!(commits.len(), 1);
    assert_eq!(commits[0].destroyed_locations, vec![LocationKind::LeftArm]);
    assert_eq!(commits[0].missing_mounts, vec![0]);
    let target = engine.unit(1).unwrap_or_else(|e| panic!("{e}"));
    assert!(target.locations()[arm].is_destroyed());
    assert!(target.mounts()[0].missing);
    assert!(!target.is_destroyed());
}

#[test]
fn test_critical_hit_lands_at_commit() {
    let mut engine = CombatEngine::new(RulesConfig::default());
    engine.add_unit(laser_walker("Red", 1, 0, 0, 0));
    engine.add_unit(
        UnitBuilder::biped("Blue")
            .team(2)
            .at(0, -2, 3)
            .structure(LocationKind::RightArm, 0, 10)
            .mount(medium_laser(), LocationKind::RightArm)
            .build(),
    );
    let mut board = OpenField::new();
    // Red: to-hit 8, location 3 (right arm), critical 8 (one slot).
    // Blue: to-hit 8, location 7 (center torso).
    let mut dice = ScriptedDice::new([8, 3, 8, 8, 7]).with_picks([0]);

    let report = engine.resolve_phase(
        &mut board,
        &mut dice,
        &[
            AttackDeclaration::at_unit(0, 0, 1),
            AttackDeclaration::at_unit(1, 0, 0),
        ],
    );

    assert_eq!(report.attacks.len(), 2);
    let red = &report.attacks[0];
    assert_eq!(red.criticals.len(), 1);
    assert_eq!(red.criticals[0].component, "Medium Laser");
    // The struck laser still fires in the same phase.
    let blue = &report.attacks[1];
    assert_eq!(blue.result, AttackResult::Hit);
    assert_eq!(blue.damage_to(0), 5);

    let target = engine.unit(1).unwrap_or_else(|e| panic!("{e}"));
    let arm = target
        .location_index(LocationKind::RightArm)
        .unwrap_or_else(|| panic!("biped has a right arm"));
    assert_eq!(target.locations()[arm].slots()[0].state(), SlotState::Hit);
    assert!(!target.mounts()[0].destroyed);

    let commits = engine.commit_phase();
    let blue_commit = commits
        .iter()
        .find(|c| c.unit == 1)
        .unwrap_or_else(|| panic!("blue changed at commit"));
    assert_eq!(blue_commit.destroyed_mounts, vec![0]);
    let target = engine.unit(1).unwrap_or_else(|e| panic!("{e}"));
    assert_eq!(
        target.locations()[arm].slots()[0].state(),
        SlotState::Destroyed
    );
    assert!(target.mounts()[0].destroyed);
}

#[test]
fn test_ammo_explosion_destroys_unit() {
    let mut engine = CombatEngine::new(RulesConfig::default());
    engine.add_unit(laser_walker("Red", 1, 0, 0, 0));
    engine.add_unit(
        UnitBuilder::biped("Blue")
            .team(2)
            .at(0, -2, 3)
            .structure(LocationKind::RightTorso, 0, 10)
            .mount(autocannon_ammo(), LocationKind::RightTorso)
            .build(),
    );
    let mut board = OpenField::new();
    // to-hit 8, location 6 (right torso), critical 8 on the bin
    let mut dice = ScriptedDice::new([8, 6, 8]).with_picks([0]);

    let report = engine
        .attack(&mut board, &mut dice, AttackDeclaration::at_unit(0, 0, 1))
        .unwrap_or_else(|e| panic!("attack failed: {e}"));

    let explosion = report.effects.iter().find_map(|e| match e {
        EffectReport::AmmoExplosion {
            damage,
            damage_records,
            ..
        } => Some((*damage, damage_records.clone())),
        _ => None,
    });
    let (damage, records) = explosion.unwrap_or_else(|| panic!("bin should explode"));
    assert_eq!(damage, 100);
    assert_eq!(records[0].location, LocationKind::RightTorso);
    assert_eq!(records[0].armor, 0);
    assert!(records
        .iter()
        .any(|r| r.location == LocationKind::CenterTorso && r.doomed));
    assert!(report
        .locations_doomed
        .contains(&(1, LocationKind::RightArm)));

    let target = engine.unit(1).unwrap_or_else(|e| panic!("{e}"));
    assert_eq!(target.mounts()[0].shots, 0);
    assert!(target.is_doomed());
    assert!(!target.is_destroyed());

    let commits = engine.commit_phase();
    assert!(commits.iter().any(|c| c.unit == 1 && c.unit_destroyed));
    assert_eq!(engine.survivors(2).count(), 0);
}

#[test]
fn test_doomed_location_passes_damage_inward() {
    let mut engine = duel_with(UnitBuilder::biped("Target"), heavy_laser(18));
    let mut board = OpenField::new();
    let mut dice = ScriptedDice::new([8, 10]);
    engine
        .attack(&mut board, &mut dice, AttackDeclaration::at_unit(0, 0, 1))
        .unwrap_or_else(|e| panic!("attack failed: {e}"));
    engine.start_round(&board);

    // Second shot on the doomed arm passes straight into the torso.
    let mut dice = ScriptedDice::new([8, 10]);
    let report = engine
        .attack(&mut board, &mut dice, AttackDeclaration::at_unit(0, 0, 1))
        .unwrap_or_else(|e| panic!("attack failed: {e}"));
    assert_eq!(report.damage[0].location, LocationKind::LeftArm);
    assert_eq!(report.damage[0].armor + report.damage[0].internal, 0);
    assert_eq!(report.damage[1].location, LocationKind::LeftTorso);
    assert_eq!(report.damage[1].amount, 18);
}
