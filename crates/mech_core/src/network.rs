//! Command networks.
//!
//! Two families exist. In the master/slave family every unit has at most
//! one outward master edge; a unit mastering itself is a company-level
//! root, a unit slaved to another is lance-level. Membership is decided by
//! walking master edges to the top. In the peer family membership is a
//! shared id plus a clear line between the two units.
//!
//! Edges are plain [`UnitId`]s resolved through the unit arena; nothing
//! here holds a reference to a unit between calls.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::board::{Battlefield, HexCoord};
use crate::equipment::MiscKind;
use crate::error::{CombatError, Result};
use crate::unit::{TeamId, Unit, UnitId};

/// Monotonic source of network ids.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NetworkIdGenerator {
    prefix: String,
    next: u64,
}

impl NetworkIdGenerator {
    /// Generator producing `<prefix>.<n>`.
    #[must_use]
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            next: 1,
        }
    }

    /// Next unused id.
    pub fn next_id(&mut self) -> String {
        let id = format!("{}.{}", self.prefix, self.next);
        self.next += 1;
        id
    }
}

impl Default for NetworkIdGenerator {
    fn default() -> Self {
        Self::new("NET")
    }
}

/// Network family a unit's equipment belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NetworkFamily {
    /// Master computers and slave units.
    MasterSlave,
    /// Peer-to-peer nodes.
    Peer,
}

impl NetworkFamily {
    /// Family of a piece of misc equipment.
    #[must_use]
    pub const fn of(kind: MiscKind) -> Option<Self> {
        match kind {
            MiscKind::NetworkMaster | MiscKind::NetworkSlave => Some(Self::MasterSlave),
            MiscKind::NetworkPeer => Some(Self::Peer),
            _ => None,
        }
    }
}

/// Hostile interference on the line between two hexes: static fields from
/// the board, or a working ECM suite on a unit not on `team`.
#[must_use]
pub fn interference_between(
    units: &[Unit],
    board: &dyn Battlefield,
    from: HexCoord,
    to: HexCoord,
    team: TeamId,
) -> bool {
    if board.ecm_between(from, to) {
        return true;
    }
    let emitters: Vec<(HexCoord, u32)> = units
        .iter()
        .filter(|u| u.team() != team && !u.is_destroyed())
        .filter_map(|u| u.ecm_radius().map(|r| (u.position, r)))
        .collect();
    if emitters.is_empty() {
        return false;
    }
    from.line_to(to).iter().any(|hex| {
        emitters
            .iter()
            .any(|(center, radius)| center.distance(*hex) <= *radius)
    })
}

fn get(units: &[Unit], id: UnitId) -> Result<&Unit> {
    units.get(id as usize).ok_or(CombatError::UnitNotFound(id))
}

fn family(unit: &Unit) -> Option<NetworkFamily> {
    unit.network_gear().and_then(NetworkFamily::of)
}

/// Registry of command networks over a unit arena.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub struct CommandNetwork {
    ids: NetworkIdGenerator,
}

impl CommandNetwork {
    /// Registry drawing ids from `ids`.
    #[must_use]
    pub fn new(ids: NetworkIdGenerator) -> Self {
        Self { ids }
    }

    /// Set or clear the master of `unit`.
    ///
    /// `Some(unit)` makes it a company-level root, which needs master gear.
    /// Moving between company and lance roles first severs every unit that
    /// had it as master, recursively. Network ids are recomputed afterward.
    ///
    /// # Errors
    ///
    /// Returns [`CombatError::UnitNotFound`] for unknown ids,
    /// [`CombatError::NoNetworkGear`] when either end lacks working
    /// master/slave gear, and [`CombatError::NetworkCycle`] when the edge
    /// would close a loop.
    pub fn set_master(
        &mut self,
        units: &mut [Unit],
        board: &dyn Battlefield,
        unit: UnitId,
        master: Option<UnitId>,
    ) -> Result<()> {
        let subject = get(units, unit)?;
        if master.is_some() && family(subject) != Some(NetworkFamily::MasterSlave) {
            return Err(CombatError::NoNetworkGear(unit));
        }
        if master == Some(unit) && subject.network_gear() != Some(MiscKind::NetworkMaster) {
            return Err(CombatError::NoNetworkGear(unit));
        }
        if let Some(m) = master.filter(|&m| m != unit) {
            let target = get(units, m)?;
            if target.network_gear() != Some(MiscKind::NetworkMaster) {
                return Err(CombatError::NoNetworkGear(m));
            }
            if Self::reaches(units, m, unit) {
                return Err(CombatError::NetworkCycle { unit, master: m });
            }
        }

        let was_company = subject.network.master == Some(unit);
        let was_lance = subject.network.master.is_some_and(|m| m != unit);
        let is_company = master == Some(unit);
        let is_lance = master.is_some_and(|m| m != unit);
        if (was_company && !is_company) || (was_lance && !is_lance) {
            Self::sever_slaves(units, unit);
        }

        units[unit as usize].network.master = master;
        debug!(unit, ?master, "network master set");
        self.refresh(units, board);
        Ok(())
    }

    /// Put `members` on one fresh peer network.
    ///
    /// # Errors
    ///
    /// Returns [`CombatError::UnitNotFound`] for unknown ids and
    /// [`CombatError::NoNetworkGear`] for units without peer gear.
    pub fn join_peers(&mut self, units: &mut [Unit], members: &[UnitId]) -> Result<String> {
        for &id in members {
            if family(get(units, id)?) != Some(NetworkFamily::Peer) {
                return Err(CombatError::NoNetworkGear(id));
            }
        }
        let id = self.ids.next_id();
        for &member in members {
            units[member as usize].network.network_id = Some(id.clone());
        }
        Ok(id)
    }

    /// Whether following master edges from `from` reaches `to`.
    fn reaches(units: &[Unit], from: UnitId, to: UnitId) -> bool {
        let mut current = from;
        for _ in 0..=units.len() {
            if current == to {
                return true;
            }
            match units.get(current as usize).and_then(|u| u.network.master) {
                Some(next) if next != current => current = next,
                _ => return false,
            }
        }
        false
    }

    fn sever_slaves(units: &mut [Unit], root: UnitId) {
        let mut stack = vec![root];
        let mut seen = BTreeSet::new();
        while let Some(master) = stack.pop() {
            if !seen.insert(master) {
                continue;
            }
            for slave in Self::slaves_of(units, master) {
                let link = &mut units[slave as usize].network;
                link.master = None;
                link.network_id = None;
                debug!(unit = slave, former_master = master, "severed from network");
                stack.push(slave);
            }
        }
    }

    /// Units whose master edge points at `master` (excluding itself).
    #[must_use]
    pub fn slaves_of(units: &[Unit], master: UnitId) -> Vec<UnitId> {
        units
            .iter()
            .filter(|u| u.id() != master && u.network.master == Some(master))
            .map(Unit::id)
            .collect()
    }

    /// Walk master edges from `unit` to the top of its network.
    ///
    /// Stops at a self-master, a unit with no master, or an edge that is
    /// broken (master lacks working gear, is an enemy, or interference lies
    /// between the two). Takes at most as many steps as there are units.
    #[must_use]
    pub fn top_of(units: &[Unit], board: &dyn Battlefield, unit: UnitId) -> UnitId {
        let mut current = unit;
        for _ in 0..units.len() {
            let Some(here) = units.get(current as usize) else {
                return current;
            };
            if here.network_gear().is_none() {
                return current;
            }
            let next = match here.network.master {
                Some(m) if m != current => m,
                _ => return current,
            };
            let Some(master) = units.get(next as usize) else {
                return current;
            };
            if master.network_gear() != Some(MiscKind::NetworkMaster)
                || master.is_enemy_of(here)
                || interference_between(units, board, here.position, master.position, here.team())
            {
                return current;
            }
            current = next;
        }
        current
    }

    /// Whether `a` and `b` share a working network.
    #[must_use]
    pub fn on_same_network(units: &[Unit], board: &dyn Battlefield, a: UnitId, b: UnitId) -> bool {
        let (Some(ua), Some(ub)) = (units.get(a as usize), units.get(b as usize)) else {
            return false;
        };
        if ua.is_enemy_of(ub) {
            return false;
        }
        match (family(ua), family(ub)) {
            (Some(NetworkFamily::MasterSlave), Some(NetworkFamily::MasterSlave)) => {
                a == b || Self::top_of(units, board, a) == Self::top_of(units, board, b)
            }
            (Some(NetworkFamily::Peer), Some(NetworkFamily::Peer)) => {
                a == b
                    || (ua.network.network_id.is_some()
                        && ua.network.network_id == ub.network.network_id
                        && !interference_between(
                            units,
                            board,
                            ua.position,
                            ub.position,
                            ua.team(),
                        ))
            }
            _ => false,
        }
    }

    /// Every other unit sharing a working network with `unit`.
    #[must_use]
    pub fn members(units: &[Unit], board: &dyn Battlefield, unit: UnitId) -> Vec<UnitId> {
        units
            .iter()
            .map(Unit::id)
            .filter(|&other| other != unit && Self::on_same_network(units, board, unit, other))
            .collect()
    }

    /// Recompute master/slave network ids so that exactly the units
    /// sharing a top share an id. A top whose id is already claimed by an
    /// earlier top gets a fresh one.
    pub fn refresh(&mut self, units: &mut [Unit], board: &dyn Battlefield) {
        let tops: Vec<Option<UnitId>> = units
            .iter()
            .map(|u| {
                (family(u) == Some(NetworkFamily::MasterSlave))
                    .then(|| Self::top_of(units, board, u.id()))
            })
            .collect();
        let mut claimed = BTreeSet::new();
        let mut top_ids = BTreeMap::new();
        for &top in tops.iter().flatten() {
            if top_ids.contains_key(&top) {
                continue;
            }
            let id = match units[top as usize].network.network_id.clone() {
                Some(existing) if !claimed.contains(&existing) => existing,
                _ => self.ids.next_id(),
            };
            claimed.insert(id.clone());
            top_ids.insert(top, id);
        }
        for (unit, top) in units.iter_mut().zip(tops) {
            if let Some(top) = top {
                unit.network.network_id = top_ids.get(&top).cloned();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::archetype::UnitArchetype;
    use crate::board::OpenField;
    use crate::equipment::{EquipmentDef, EquipmentKind, EquipmentMount};
    use crate::structure::{CriticalSlot, Location};
    use crate::unit::Crew;

    fn misc(kind: MiscKind) -> EquipmentMount {
        EquipmentMount::new(
            EquipmentDef {
                name: format!("{kind:?}"),
                kind: EquipmentKind::Misc(kind),
                slots: 1,
                hittable: true,
            },
            1,
            false,
        )
    }

    fn unit(id: UnitId, team: TeamId, gear: MiscKind) -> Unit {
        let archetype = UnitArchetype::Vehicle;
        let locations = archetype
            .locations()
            .iter()
            .map(|&k| Location::new(k, 10, None, 5, vec![CriticalSlot::mount(0, true)]))
            .collect();
        Unit::new(
            id,
            format!("U{id}"),
            archetype,
            team,
            locations,
            vec![misc(gear)],
            Crew::new("Crew", 4, 5),
            10,
        )
        .at(HexCoord::new(id as i32, 0), crate::board::Facing(0))
    }

    fn lance() -> Vec<Unit> {
        vec![
            unit(0, 1, MiscKind::NetworkMaster),
            unit(1, 1, MiscKind::NetworkMaster),
            unit(2, 1, MiscKind::NetworkMaster),
            unit(3, 1, MiscKind::NetworkSlave),
        ]
    }

    #[test]
    fn test_id_generator_is_monotonic() {
        let mut ids = NetworkIdGenerator::new("C3");
        assert_eq!(ids.next_id(), "C3.1");
        assert_eq!(ids.next_id(), "C3.2");
    }

    #[test]
    fn test_cycle_refused_and_top_terminates() {
        let board = OpenField::new();
        let mut units = lance();
        let mut net = CommandNetwork::default();
        // A masters B, B masters C.
        assert!(net.set_master(&mut units, &board, 0, Some(0)).is_ok());
        assert!(net.set_master(&mut units, &board, 1, Some(0)).is_ok());
        assert!(net.set_master(&mut units, &board, 2, Some(1)).is_ok());
        // C mastering B would close B -> C -> B.
        assert_eq!(
            net.set_master(&mut units, &board, 1, Some(2)),
            Err(CombatError::NetworkCycle { unit: 1, master: 2 })
        );
        // C mastering A would close A -> C -> B -> A.
        assert_eq!(
            net.set_master(&mut units, &board, 0, Some(2)),
            Err(CombatError::NetworkCycle { unit: 0, master: 2 })
        );
        for id in 0..4 {
            let top = CommandNetwork::top_of(&units, &board, id);
            assert!((top as usize) < units.len());
        }
        assert_eq!(CommandNetwork::top_of(&units, &board, 2), 0);
    }

    #[test]
    fn test_shared_ids_follow_tops() {
        let board = OpenField::new();
        let mut units = lance();
        let mut net = CommandNetwork::default();
        net.set_master(&mut units, &board, 1, Some(1)).ok();
        net.set_master(&mut units, &board, 3, Some(1)).ok();
        net.set_master(&mut units, &board, 2, Some(1)).ok();
        let id = units[1].network_link().network_id.clone();
        assert!(id.is_some());
        assert_eq!(units[3].network_link().network_id, id);
        assert_eq!(units[2].network_link().network_id, id);
        assert_ne!(units[0].network_link().network_id, id);
        assert!(CommandNetwork::on_same_network(&units, &board, 2, 3));
        assert_eq!(CommandNetwork::members(&units, &board, 3), vec![1, 2]);
    }

    #[test]
    fn test_role_change_severs_slaves() {
        let board = OpenField::new();
        let mut units = lance();
        let mut net = CommandNetwork::default();
        net.set_master(&mut units, &board, 1, Some(1)).ok();
        net.set_master(&mut units, &board, 3, Some(1)).ok();
        let old = units[1].network_link().network_id.clone();
        // Company root becomes lance-level under unit 0.
        net.set_master(&mut units, &board, 0, Some(0)).ok();
        net.set_master(&mut units, &board, 1, Some(0)).ok();
        assert_eq!(units[3].network_link().master, None);
        assert_ne!(units[3].network_link().network_id, old);
        assert_ne!(units[3].network_link().network_id, units[1].network_link().network_id);
        assert!(!CommandNetwork::on_same_network(&units, &board, 1, 3));
        assert_eq!(CommandNetwork::slaves_of(&units, 0), vec![1]);
    }

    #[test]
    fn test_enemy_ecm_breaks_edge() {
        let board = OpenField::new();
        let mut units = lance();
        let mut jammer = unit(4, 2, MiscKind::Ecm { radius: 1 });
        jammer.position = HexCoord::new(3, 1);
        units.push(jammer);
        let mut net = CommandNetwork::default();
        net.set_master(&mut units, &board, 0, Some(0)).ok();
        net.set_master(&mut units, &board, 3, Some(0)).ok();
        assert_eq!(CommandNetwork::top_of(&units, &board, 3), 3);
        assert!(!CommandNetwork::on_same_network(&units, &board, 0, 3));
        assert_ne!(
            units[0].network_link().network_id,
            units[3].network_link().network_id
        );
    }

    #[test]
    fn test_peer_network() {
        let board = OpenField::new();
        let mut units = vec![
            unit(0, 1, MiscKind::NetworkPeer),
            unit(1, 1, MiscKind::NetworkPeer),
            unit(2, 1, MiscKind::NetworkMaster),
        ];
        let mut net = CommandNetwork::default();
        assert!(net.join_peers(&mut units, &[0, 1]).is_ok());
        assert!(CommandNetwork::on_same_network(&units, &board, 0, 1));
        assert!(!CommandNetwork::on_same_network(&units, &board, 0, 2));
        assert_eq!(
            net.join_peers(&mut units, &[2]),
            Err(CombatError::NoNetworkGear(2))
        );
    }

    #[test]
    fn test_slave_gear_cannot_be_master() {
        let board = OpenField::new();
        let mut units = lance();
        let mut net = CommandNetwork::default();
        assert_eq!(
            net.set_master(&mut units, &board, 0, Some(3)),
            Err(CombatError::NoNetworkGear(3))
        );
    }

    #[test]
    fn test_slave_gear_cannot_be_company_root() {
        let board = OpenField::new();
        let mut units = lance();
        let mut net = CommandNetwork::default();
        assert_eq!(
            net.set_master(&mut units, &board, 3, Some(3)),
            Err(CombatError::NoNetworkGear(3))
        );
        assert_eq!(units[3].network.master, None);
        assert!(net.set_master(&mut units, &board, 0, Some(0)).is_ok());
        assert_eq!(units[0].network.master, Some(0));
    }
}
