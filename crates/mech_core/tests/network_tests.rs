//! Command network tests: hierarchy, cycles, interference, shared range.

use mech_core::archetype::LocationKind;
use mech_core::attack::AttackDeclaration;
use mech_core::board::OpenField;
use mech_core::engine::CombatEngine;
use mech_core::error::CombatError;
use mech_core::network::CommandNetwork;
use mech_core::roll::RollOutcome;
use mech_core::rules::RulesConfig;
use mech_core::unit::UnitId;
use mech_test_utils::fixtures::{
    ecm_suite, medium_laser, network_master, network_peer, network_slave, UnitBuilder,
};

fn master(name: &str, q: i32, r: i32) -> UnitBuilder {
    UnitBuilder::biped(name)
        .at(q, r, 0)
        .mount(network_master(), LocationKind::LeftTorso)
        .mount(medium_laser(), LocationKind::RightArm)
}

fn slave(name: &str, q: i32, r: i32) -> UnitBuilder {
    UnitBuilder::biped(name)
        .at(q, r, 0)
        .mount(network_slave(), LocationKind::LeftTorso)
        .mount(medium_laser(), LocationKind::RightArm)
}

/// Company master 0, lance master 1 under it, slave 2 under the lance.
fn company() -> (CombatEngine, OpenField) {
    let mut engine = CombatEngine::new(RulesConfig::default());
    let board = OpenField::new();
    engine.add_unit(master("Company", 0, 0).build());
    engine.add_unit(master("Lance", 2, 0).build());
    engine.add_unit(slave("Scout", 4, 0).build());
    set(&mut engine, &board, 0, Some(0));
    set(&mut engine, &board, 1, Some(0));
    set(&mut engine, &board, 2, Some(1));
    (engine, board)
}

fn set(engine: &mut CombatEngine, board: &OpenField, unit: UnitId, master: Option<UnitId>) {
    engine
        .set_master(board, unit, master)
        .unwrap_or_else(|e| panic!("set_master({unit}, {master:?}) failed: {e}"));
}

fn network_id(engine: &CombatEngine, unit: UnitId) -> Option<String> {
    engine
        .unit(unit)
        .ok()
        .and_then(|u| u.network_link().network_id.clone())
}

#[test]
fn test_hierarchy_shares_one_id() {
    let (engine, board) = company();
    assert_eq!(CommandNetwork::top_of(engine.units(), &board, 2), 0);
    let id = network_id(&engine, 0);
    assert!(id.is_some());
    assert_eq!(network_id(&engine, 1), id);
    assert_eq!(network_id(&engine, 2), id);
    assert_eq!(engine.network_members(&board, 2), vec![0, 1]);
}

#[test]
fn test_cycle_refused() {
    let (mut engine, board) = company();
    assert_eq!(
        engine.set_master(&board, 0, Some(1)),
        Err(CombatError::NetworkCycle { unit: 0, master: 1 })
    );
    assert_eq!(CommandNetwork::top_of(engine.units(), &board, 2), 0);
}

#[test]
fn test_slave_cannot_be_master() {
    let (mut engine, board) = company();
    assert_eq!(
        engine.set_master(&board, 1, Some(2)),
        Err(CombatError::NoNetworkGear(2))
    );
}

#[test]
fn test_leaving_company_role_severs_slaves() {
    let (mut engine, board) = company();
    set(&mut engine, &board, 1, None);
    assert_eq!(engine.unit(2).map(|u| u.network_link().master), Ok(None));
    assert_eq!(CommandNetwork::top_of(engine.units(), &board, 2), 2);
    assert!(engine.network_members(&board, 2).is_empty());
}

#[test]
fn test_enemy_ecm_splits_network_at_round_start() {
    let (mut engine, board) = company();
    let before = network_id(&engine, 0);
    engine.add_unit(
        UnitBuilder::biped("Jammer")
            .team(2)
            .at(1, 3, 0)
            .mount(ecm_suite(), LocationKind::LeftTorso)
            .build(),
    );
    engine.start_round(&board);
    assert_eq!(CommandNetwork::top_of(engine.units(), &board, 2), 2);
    assert_eq!(network_id(&engine, 0), before);
    assert_ne!(network_id(&engine, 2), before);
    assert!(engine.network_members(&board, 0).is_empty());
}

#[test]
fn test_spotter_range_used_for_band() {
    let mut engine = CombatEngine::new(RulesConfig::default());
    let board = OpenField::new();
    engine.add_unit(master("Firer", 0, 5).build());
    engine.add_unit(slave("Spotter", 0, 0).build());
    engine.add_unit(UnitBuilder::biped("Target").team(2).at(0, -2, 3).build());
    set(&mut engine, &board, 0, Some(0));
    set(&mut engine, &board, 1, Some(0));

    let declared = engine
        .declare(AttackDeclaration::at_unit(0, 1, 2))
        .unwrap_or_else(|e| panic!("declaration refused: {e}"));
    let aimed = engine.aim(&board, declared);
    assert_eq!(aimed.range(), 7);
    assert_eq!(aimed.spotter(), Some(1));
    assert_eq!(aimed.to_hit().value(), RollOutcome::Target(4));
}

#[test]
fn test_peer_network() {
    let mut engine = CombatEngine::new(RulesConfig::default());
    let board = OpenField::new();
    for q in 0..3 {
        engine.add_unit(
            UnitBuilder::biped("Peer")
                .at(q * 2, 0, 0)
                .mount(network_peer(), LocationKind::LeftTorso)
                .build(),
        );
    }
    let id = engine
        .join_peers(&[0, 2])
        .unwrap_or_else(|e| panic!("join failed: {e}"));
    assert_eq!(network_id(&engine, 0).as_deref(), Some(id.as_str()));
    assert_eq!(engine.network_members(&board, 0), vec![2]);
    assert!(engine.network_members(&board, 1).is_empty());
}
