//! File round trips: scenarios, outcomes, batch results and replays.

use std::io::Write;

use mech_core::archetype::LocationKind;
use mech_core::replay::Replay;
use mech_headless::batch::{run_batch, BatchConfig, BatchResults};
use mech_headless::runner::run_scenario;
use mech_headless::scenario::{AttackSetup, PhaseSetup, Scenario, ScenarioError, TargetSetup};
use mech_test_utils::fixtures::{medium_laser, reference_catalog, UnitBuilder};

fn duel() -> Scenario {
    Scenario::duel().unwrap_or_else(|e| panic!("duel should parse: {e}"))
}

#[test]
fn test_scenario_loads_from_disk() {
    let text = ron::ser::to_string_pretty(&duel(), ron::ser::PrettyConfig::default())
        .unwrap_or_else(|e| panic!("scenario should serialize: {e}"));
    let mut file = tempfile::NamedTempFile::new().unwrap_or_else(|e| panic!("{e}"));
    file.write_all(text.as_bytes())
        .unwrap_or_else(|e| panic!("{e}"));

    let loaded = Scenario::load(file.path()).unwrap_or_else(|e| panic!("load failed: {e}"));
    assert_eq!(loaded, duel());
}

#[test]
fn test_malformed_scenario_is_parse_error() {
    let mut file = tempfile::NamedTempFile::new().unwrap_or_else(|e| panic!("{e}"));
    file.write_all(b"Scenario(name: ")
        .unwrap_or_else(|e| panic!("{e}"));
    assert!(matches!(
        Scenario::load(file.path()),
        Err(ScenarioError::ParseError(_))
    ));
}

#[test]
fn test_fixture_units_drive_a_scenario() {
    let mut scenario = duel();
    scenario.catalog = reference_catalog();
    scenario.units = vec![
        UnitBuilder::biped("Red")
            .team(1)
            .at(0, 0, 0)
            .mount(medium_laser(), LocationKind::RightArm)
            .data()
            .clone(),
        UnitBuilder::biped("Blue").team(2).at(0, -2, 3).data().clone(),
    ];
    scenario.phases = vec![PhaseSetup {
        new_round: true,
        attacks: vec![AttackSetup {
            attacker: "Red".to_string(),
            weapon: 0,
            target: TargetSetup::Unit("Blue".to_string()),
        }],
    }];

    let outcome = run_scenario(&scenario, Some(4)).unwrap_or_else(|e| panic!("{e}"));
    assert_eq!(outcome.phases.len(), 1);
    let attack = &outcome.phases[0].report.attacks[0];
    assert_eq!(attack.attacker_name, "Red");
    assert_eq!(attack.weapon_name, "Medium Laser");
    assert_eq!(outcome.standings[1].name, "Blue");
}

#[test]
fn test_outcome_json_round_trip() {
    let dir = tempfile::tempdir().unwrap_or_else(|e| panic!("{e}"));
    let path = dir.path().join("out").join("duel.json");
    let outcome = run_scenario(&duel(), None).unwrap_or_else(|e| panic!("{e}"));
    outcome
        .save_json(&path)
        .unwrap_or_else(|e| panic!("save failed: {e}"));

    let text = std::fs::read_to_string(&path).unwrap_or_else(|e| panic!("{e}"));
    let value: serde_json::Value = serde_json::from_str(&text).unwrap_or_else(|e| panic!("{e}"));
    assert_eq!(value["scenario"], "Duel");
    assert_eq!(value["final_hash"], outcome.final_hash);
    assert!(value.get("replay").is_none());
}

#[test]
fn test_batch_results_round_trip() {
    let dir = tempfile::tempdir().unwrap_or_else(|e| panic!("{e}"));
    let path = dir.path().join("batch_results.json");
    let results = run_batch(&duel(), BatchConfig::new(3).with_seed(50));
    results
        .save(&path)
        .unwrap_or_else(|e| panic!("save failed: {e}"));
    let loaded = BatchResults::load(&path).unwrap_or_else(|e| panic!("load failed: {e}"));
    assert_eq!(loaded.runs, results.runs);
    assert_eq!(loaded.scenario, "Duel");
}

#[test]
fn test_saved_replay_verifies() {
    let dir = tempfile::tempdir().unwrap_or_else(|e| panic!("{e}"));
    let path = dir.path().join("duel.replay");
    let outcome = run_scenario(&duel(), Some(99)).unwrap_or_else(|e| panic!("{e}"));
    let replay = outcome
        .replay
        .unwrap_or_else(|| panic!("run should record a replay"));
    replay
        .save(&path)
        .unwrap_or_else(|e| panic!("save failed: {e}"));

    let loaded = Replay::load(&path).unwrap_or_else(|e| panic!("load failed: {e}"));
    assert_eq!(loaded, replay);
    assert_eq!(loaded.verify(), Ok(true));

    let mut tampered = loaded;
    tampered.final_hash ^= 1;
    assert_eq!(tampered.verify(), Ok(false));
}
