//! Hex-targeted weapons: artillery against open ground and buildings.

use mech_core::archetype::LocationKind;
use mech_core::attack::{AttackDeclaration, EffectReport};
use mech_core::board::{HexCoord, OpenField};
use mech_core::dice::ScriptedDice;
use mech_core::engine::CombatEngine;
use mech_core::rules::RulesConfig;
use mech_test_utils::fixtures::{laser_walker, mortar, UnitBuilder};

const GUNNER: u32 = 0;
const SQUATTER: u32 = 1;
const MORTAR: usize = 0;

fn impact_hex() -> HexCoord {
    HexCoord::new(0, -2)
}

/// Mortar carrier at the origin facing north.
fn battery() -> CombatEngine {
    let mut engine = CombatEngine::new(RulesConfig::default());
    engine.add_unit(
        UnitBuilder::biped("Gunner")
            .team(1)
            .at(0, 0, 0)
            .mount(mortar(), LocationKind::RightTorso)
            .build(),
    );
    engine
}

fn building_effects(effects: &[EffectReport]) -> usize {
    effects
        .iter()
        .filter(|e| matches!(e, EffectReport::BuildingDamaged { .. }))
        .count()
}

#[test]
fn test_open_hex_damages_units_only() {
    let mut engine = battery();
    engine.add_unit(laser_walker("Squatter", 2, 0, -2, 3));
    let mut board = OpenField::new();
    // To-hit 7, hit location 7 (center torso).
    let mut dice = ScriptedDice::new([7, 7]);
    let report = engine.resolve_phase(
        &mut board,
        &mut dice,
        &[AttackDeclaration::at_hex(GUNNER, MORTAR, impact_hex())],
    );

    let shell = &report.attacks[0];
    assert!(shell.is_hit(), "{}", shell.to_hit.full_description());
    assert!(shell
        .damage
        .iter()
        .any(|d| d.unit == SQUATTER && d.location == LocationKind::CenterTorso && d.amount == 10));
    assert_eq!(building_effects(&shell.effects), 0);
    assert_eq!(board.building(impact_hex()), None);
}

#[test]
fn test_empty_open_hex_has_no_effects() {
    let mut engine = battery();
    let mut board = OpenField::new();
    let mut dice = ScriptedDice::new([7]);
    let report = engine.resolve_phase(
        &mut board,
        &mut dice,
        &[AttackDeclaration::at_hex(GUNNER, MORTAR, impact_hex())],
    );

    let shell = &report.attacks[0];
    assert!(shell.is_hit());
    assert!(shell.damage.is_empty());
    assert!(shell.effects.is_empty());
}

#[test]
fn test_building_hex_loses_construction_factor() {
    let mut engine = battery();
    let mut board = OpenField::new().with_building(impact_hex(), 25);
    let mut dice = ScriptedDice::new([7]);
    let report = engine.resolve_phase(
        &mut board,
        &mut dice,
        &[AttackDeclaration::at_hex(GUNNER, MORTAR, impact_hex())],
    );

    let shell = &report.attacks[0];
    assert!(shell.effects.contains(&EffectReport::BuildingDamaged {
        hex: impact_hex(),
        amount: 10,
        remaining: Some(15),
    }));
    assert_eq!(building_effects(&shell.effects), 1);
    assert_eq!(board.building(impact_hex()), Some(15));
}
