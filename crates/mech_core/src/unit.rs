//! Units: the structural model, crew, heat, and per-round state.
//!
//! A [`Unit`] owns its locations and equipment mounts outright. Other units
//! are referenced only by [`UnitId`] and resolved through the engine's
//! arena.

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::archetype::{LocationKind, UnitArchetype};
use crate::board::{Facing, FiringArc, HexCoord};
use crate::equipment::{EquipmentMount, MiscKind};
use crate::error::{CombatError, Result};
use crate::math::{ratio, Fixed};
use crate::structure::{
    CriticalSlot, Location, LocationDamage, SlotContent, SlotState, SystemKind,
};

pub use crate::equipment::MountId;

/// Index of a unit in the engine arena.
pub type UnitId = u32;

/// Side a unit fights for.
pub type TeamId = u8;

/// Heat at which a unit shuts down.
pub const SHUTDOWN_HEAT: u32 = 30;

/// Destroyed engine slots that doom a unit.
pub const FATAL_ENGINE_HITS: usize = 3;

/// Crew hits that kill the crew.
pub const FATAL_CREW_HITS: u8 = 6;

/// Crew condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum CrewStatus {
    /// Fighting.
    #[default]
    Active,
    /// Knocked out.
    Unconscious,
    /// Killed.
    Dead,
}

/// Crew operating a unit.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Crew {
    /// Name for logs.
    pub name: String,
    /// Base to-hit number.
    pub gunnery: i32,
    /// Piloting skill.
    pub piloting: i32,
    /// Wounds taken.
    pub hits: u8,
    /// Condition.
    pub status: CrewStatus,
}

impl Crew {
    /// Healthy crew.
    #[must_use]
    pub fn new(name: impl Into<String>, gunnery: i32, piloting: i32) -> Self {
        Self {
            name: name.into(),
            gunnery,
            piloting,
            hits: 0,
            status: CrewStatus::Active,
        }
    }

    /// Able to fire.
    #[must_use]
    pub const fn is_active(&self) -> bool {
        matches!(self.status, CrewStatus::Active)
    }
}

/// How a unit moved this turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum MovementMode {
    /// Did not move.
    #[default]
    Stationary,
    /// Walked or cruised.
    Walked,
    /// Ran or flanked.
    Ran,
    /// Jumped.
    Jumped,
}

impl MovementMode {
    /// Attacker movement penalty.
    #[must_use]
    pub const fn attacker_modifier(self) -> i32 {
        match self {
            Self::Stationary => 0,
            Self::Walked => 1,
            Self::Ran => 2,
            Self::Jumped => 3,
        }
    }
}

/// Movement performed this turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub struct Movement {
    /// Mode used.
    pub mode: MovementMode,
    /// Hexes entered.
    pub hexes: u32,
}

/// Command-network link of a unit.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub struct NetworkLink {
    /// Shared network token.
    pub network_id: Option<String>,
    /// Master; a unit mastering itself is a company-level root.
    pub master: Option<UnitId>,
}

/// Unit-level outcome of a phase commit.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CommitReport {
    /// Unit committed.
    pub unit: UnitId,
    /// Locations destroyed by this commit.
    pub destroyed_locations: Vec<LocationKind>,
    /// Mounts destroyed by this commit.
    pub destroyed_mounts: Vec<MountId>,
    /// Mounts lost with their location.
    pub missing_mounts: Vec<MountId>,
    /// Crew killed by this commit.
    pub crew_killed: bool,
    /// Unit destroyed by this commit.
    pub unit_destroyed: bool,
}

impl CommitReport {
    /// True when nothing changed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.destroyed_locations.is_empty()
            && self.destroyed_mounts.is_empty()
            && self.missing_mounts.is_empty()
            && !self.crew_killed
            && !self.unit_destroyed
    }
}

/// Unit-level outcome of a round start.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RoundStart {
    /// Heat after dissipation.
    pub heat: u32,
    /// Shut down by heat.
    pub shutdown: bool,
    /// Ammo bins emptied by dumping.
    pub dumped: Vec<MountId>,
    /// Weapons left without ammunition.
    pub unloaded: Vec<MountId>,
}

/// A combat unit.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Unit {
    id: UnitId,
    name: String,
    archetype: UnitArchetype,
    team: TeamId,
    /// Board position.
    pub position: HexCoord,
    /// Facing.
    pub facing: Facing,
    locations: Vec<Location>,
    mounts: Vec<EquipmentMount>,
    crew: Crew,
    heat: u32,
    pending_heat: u32,
    heat_sinks: u32,
    destroyed: bool,
    doomed: bool,
    shutdown: bool,
    pub(crate) network: NetworkLink,
    /// Movement this turn.
    pub movement: Movement,
    /// Arms flipped to fire rearward this turn.
    pub arms_flipped: bool,
    unloaded_this_turn: bool,
    designated: bool,
    beacon_attached: bool,
}

impl Unit {
    /// Assemble a unit. Locations must follow the archetype's layout order.
    #[must_use]
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        id: UnitId,
        name: impl Into<String>,
        archetype: UnitArchetype,
        team: TeamId,
        locations: Vec<Location>,
        mounts: Vec<EquipmentMount>,
        crew: Crew,
        heat_sinks: u32,
    ) -> Self {
        debug_assert_eq!(
            locations
                .iter()
                .map(Location::kind)
                .collect::<Vec<_>>()
                .as_slice(),
            archetype.locations(),
            "location layout must match archetype"
        );
        Self {
            id,
            name: name.into(),
            archetype,
            team,
            position: HexCoord::default(),
            facing: Facing::default(),
            locations,
            mounts,
            crew,
            heat: 0,
            pending_heat: 0,
            heat_sinks,
            destroyed: false,
            doomed: false,
            shutdown: false,
            network: NetworkLink::default(),
            movement: Movement::default(),
            arms_flipped: false,
            unloaded_this_turn: false,
            designated: false,
            beacon_attached: false,
        }
    }

    /// Place the unit on the board.
    #[must_use]
    pub fn at(mut self, position: HexCoord, facing: Facing) -> Self {
        self.position = position;
        self.facing = facing;
        self
    }

    /// Arena id.
    #[must_use]
    pub const fn id(&self) -> UnitId {
        self.id
    }

    pub(crate) fn set_id(&mut self, id: UnitId) {
        self.id = id;
    }

    /// Display name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Body plan.
    #[must_use]
    pub const fn archetype(&self) -> UnitArchetype {
        self.archetype
    }

    /// Team.
    #[must_use]
    pub const fn team(&self) -> TeamId {
        self.team
    }

    /// Units on different teams are enemies.
    #[must_use]
    pub const fn is_enemy_of(&self, other: &Unit) -> bool {
        self.team != other.team
    }

    /// Crew.
    #[must_use]
    pub const fn crew(&self) -> &Crew {
        &self.crew
    }

    /// Mutable crew access for scenario setup.
    pub fn crew_mut(&mut self) -> &mut Crew {
        &mut self.crew
    }

    /// Current heat.
    #[must_use]
    pub const fn heat(&self) -> u32 {
        self.heat
    }

    /// Set current heat directly (scenario setup).
    pub fn set_heat(&mut self, heat: u32) {
        self.heat = heat;
        self.shutdown = heat >= SHUTDOWN_HEAT;
    }

    /// Heat generated this round, applied at the next round start.
    #[must_use]
    pub const fn pending_heat(&self) -> u32 {
        self.pending_heat
    }

    /// Queue heat for the next round start.
    pub fn add_heat(&mut self, amount: u32) {
        self.pending_heat = self.pending_heat.saturating_add(amount);
    }

    /// Destroyed (committed).
    #[must_use]
    pub const fn is_destroyed(&self) -> bool {
        self.destroyed
    }

    /// Will be destroyed at the next commit.
    #[must_use]
    pub const fn is_doomed(&self) -> bool {
        self.doomed
    }

    /// Shut down by heat.
    #[must_use]
    pub const fn is_shutdown(&self) -> bool {
        self.shutdown
    }

    /// Cannot move or dodge.
    #[must_use]
    pub const fn is_immobile(&self) -> bool {
        self.shutdown || self.destroyed || !self.crew.is_active()
    }

    /// Marked by a designator this round.
    #[must_use]
    pub const fn is_designated(&self) -> bool {
        self.designated
    }

    /// Carries a homing beacon.
    #[must_use]
    pub const fn has_beacon(&self) -> bool {
        self.beacon_attached
    }

    pub(crate) fn designate(&mut self) {
        self.designated = true;
    }

    pub(crate) fn attach_beacon(&mut self) {
        self.beacon_attached = true;
    }

    /// A weapon was left without ammunition this round.
    #[must_use]
    pub const fn unloaded_this_turn(&self) -> bool {
        self.unloaded_this_turn
    }

    /// Command-network link.
    #[must_use]
    pub const fn network_link(&self) -> &NetworkLink {
        &self.network
    }

    /// Locations in layout order.
    #[must_use]
    pub fn locations(&self) -> &[Location] {
        &self.locations
    }

    /// Location at `index`.
    ///
    /// # Errors
    ///
    /// Returns [`CombatError::InvalidLocation`] for an out-of-range index.
    pub fn location(&self, index: usize) -> Result<&Location> {
        self.locations.get(index).ok_or(CombatError::InvalidLocation {
            unit: self.id,
            index,
        })
    }

    fn location_mut(&mut self, index: usize) -> Result<&mut Location> {
        let unit = self.id;
        self.locations
            .get_mut(index)
            .ok_or(CombatError::InvalidLocation { unit, index })
    }

    /// Index of the location of `kind`.
    #[must_use]
    pub fn location_index(&self, kind: LocationKind) -> Option<usize> {
        self.archetype.index_of(kind)
    }

    /// Equipment mounts in order.
    #[must_use]
    pub fn mounts(&self) -> &[EquipmentMount] {
        &self.mounts
    }

    /// Mount at `id`.
    ///
    /// # Errors
    ///
    /// Returns [`CombatError::MountNotFound`] for an unknown id.
    pub fn mount(&self, id: MountId) -> Result<&EquipmentMount> {
        self.mounts.get(id).ok_or(CombatError::MountNotFound {
            unit: self.id,
            mount: id,
        })
    }

    /// Mutable mount at `id`.
    ///
    /// # Errors
    ///
    /// Returns [`CombatError::MountNotFound`] for an unknown id.
    pub fn mount_mut(&mut self, id: MountId) -> Result<&mut EquipmentMount> {
        let unit = self.id;
        self.mounts
            .get_mut(id)
            .ok_or(CombatError::MountNotFound { unit, mount: id })
    }

    // ------------------------------------------------------------------
    // Damage
    // ------------------------------------------------------------------

    /// Apply damage to a location and return what it could not absorb.
    ///
    /// # Errors
    ///
    /// Returns [`CombatError::InvalidLocation`] for an out-of-range index.
    pub fn damage_location(&mut self, index: usize, amount: u32, is_rear: bool) -> Result<u32> {
        Ok(self.apply_location_damage(index, amount, is_rear)?.remainder)
    }

    /// Apply damage to a location and return the full split.
    ///
    /// # Errors
    ///
    /// Returns [`CombatError::InvalidLocation`] for an out-of-range index.
    pub fn apply_location_damage(
        &mut self,
        index: usize,
        amount: u32,
        is_rear: bool,
    ) -> Result<LocationDamage> {
        let archetype = self.archetype;
        let unit = self.id;
        let location = self.location_mut(index)?;
        let kind = location.kind();
        let dealt = location.take_damage(amount, is_rear);
        debug!(
            unit,
            location = %kind,
            amount,
            armor = dealt.armor,
            internal = dealt.internal,
            remainder = dealt.remainder,
            "damage applied"
        );
        if dealt.doomed {
            info!(unit, location = %kind, "location doomed");
            if archetype.is_unit_critical(kind) {
                self.doomed = true;
            }
        }
        Ok(dealt)
    }

    /// Apply damage that bypasses armor and return the split.
    ///
    /// # Errors
    ///
    /// Returns [`CombatError::InvalidLocation`] for an out-of-range index.
    pub fn apply_internal_damage(&mut self, index: usize, amount: u32) -> Result<LocationDamage> {
        let archetype = self.archetype;
        let unit = self.id;
        let location = self.location_mut(index)?;
        let kind = location.kind();
        let dealt = location.take_internal_damage(amount);
        debug!(
            unit,
            location = %kind,
            amount,
            internal = dealt.internal,
            remainder = dealt.remainder,
            "internal damage applied"
        );
        if dealt.doomed {
            info!(unit, location = %kind, "location doomed");
            if archetype.is_unit_critical(kind) {
                self.doomed = true;
            }
        }
        Ok(dealt)
    }

    /// Inward neighbour that receives damage this location cannot absorb.
    ///
    /// # Errors
    ///
    /// Returns [`CombatError::InvalidLocation`] for an out-of-range index.
    pub fn transfer_location(&self, index: usize) -> Result<Option<usize>> {
        let kind = self.location(index)?.kind();
        Ok(self
            .archetype
            .transfer_location(kind)
            .and_then(|k| self.location_index(k)))
    }

    /// Doom the outward locations stranded by losing `index`. Returns the
    /// indices newly doomed.
    ///
    /// # Errors
    ///
    /// Returns [`CombatError::InvalidLocation`] for an out-of-range index.
    pub fn destroy_dependent(&mut self, index: usize) -> Result<Vec<usize>> {
        let kind = self.location(index)?.kind();
        let mut doomed = Vec::new();
        for &dependent in self.archetype.dependent_locations(kind) {
            if let Some(dep) = self.location_index(dependent) {
                if self.location_mut(dep)?.doom() {
                    info!(unit = self.id, location = %dependent, "dependent location lost");
                    doomed.push(dep);
                }
            }
        }
        Ok(doomed)
    }

    /// Blow a limb off: the location is doomed regardless of structure.
    ///
    /// # Errors
    ///
    /// Returns [`CombatError::InvalidLocation`] for an out-of-range index.
    pub fn blow_off(&mut self, index: usize) -> Result<bool> {
        let lost = self.location_mut(index)?.doom();
        if lost {
            info!(unit = self.id, location = index, "limb blown off");
        }
        Ok(lost)
    }

    /// Mark a critical slot hit. Returns the content struck, or `None` for
    /// an empty slot.
    ///
    /// # Errors
    ///
    /// Returns [`CombatError::InvalidLocation`] or
    /// [`CombatError::InvalidSlot`] for out-of-range indices.
    pub fn mark_slot_hit(&mut self, location: usize, slot: usize) -> Result<Option<SlotContent>> {
        let unit = self.id;
        let loc = self.location_mut(location)?;
        let struck = loc.mark_slot_hit(slot).ok_or(CombatError::InvalidSlot {
            unit,
            location,
            slot,
        })?;
        if !struck {
            return Ok(None);
        }
        let content = loc.slot(slot).map(CriticalSlot::content);
        debug!(unit, location, slot, ?content, "critical slot hit");
        Ok(content)
    }

    /// Wound the crew.
    pub fn wound_crew(&mut self, hits: u8) {
        self.crew.hits = self.crew.hits.saturating_add(hits);
        debug!(unit = self.id, hits = self.crew.hits, "crew wounded");
    }

    // ------------------------------------------------------------------
    // Phase and round lifecycle
    // ------------------------------------------------------------------

    /// Commit all hits taken this phase.
    ///
    /// Mounts backed by a hit slot, and empty ammo bins, are destroyed and
    /// their shots zeroed. Hit slots become destroyed. Doomed locations are
    /// destroyed and their mounts go missing. Crew and unit death follow.
    pub fn commit_phase(&mut self) -> CommitReport {
        let mut report = CommitReport {
            unit: self.id,
            ..CommitReport::default()
        };

        for (id, mount) in self.mounts.iter_mut().enumerate() {
            if mount.destroyed {
                continue;
            }
            let slot_hit = self.locations.iter().any(|loc| {
                loc.slots().iter().any(|s| {
                    s.content() == SlotContent::Mount(id) && s.state() == SlotState::Hit
                })
            });
            let exhausted = mount.def.ammo().is_some() && mount.shots == 0;
            if slot_hit || exhausted {
                mount.destroyed = true;
                mount.shots = 0;
                report.destroyed_mounts.push(id);
            }
        }

        for (index, location) in self.locations.iter_mut().enumerate() {
            if location.commit() {
                report.destroyed_locations.push(location.kind());
                for (id, mount) in self.mounts.iter_mut().enumerate() {
                    if mount.location == index && !mount.missing {
                        mount.missing = true;
                        mount.shots = 0;
                        report.missing_mounts.push(id);
                    }
                }
            }
        }

        let crew_location_lost = self.locations.iter().any(|l| {
            l.is_destroyed() && self.archetype.is_crew_critical(l.kind())
        });
        let cockpit_lost = self.destroyed_systems(SystemKind::Cockpit) > 0;
        if self.crew.status != CrewStatus::Dead
            && (crew_location_lost || cockpit_lost || self.crew.hits >= FATAL_CREW_HITS)
        {
            self.crew.status = CrewStatus::Dead;
            report.crew_killed = true;
            info!(unit = self.id, crew = %self.crew.name, "crew killed");
        }

        if self.destroyed_systems(SystemKind::Engine) >= FATAL_ENGINE_HITS {
            self.doomed = true;
        }
        if self
            .locations
            .iter()
            .any(|l| l.is_destroyed() && self.archetype.is_unit_critical(l.kind()))
        {
            self.doomed = true;
        }
        if self.doomed && !self.destroyed {
            self.destroyed = true;
            report.unit_destroyed = true;
            info!(unit = self.id, name = %self.name, "unit destroyed");
        }
        report
    }

    /// Begin a new round: clear per-round flags, settle heat, empty dumped
    /// bins, and reload every weapon.
    pub fn start_round(&mut self) -> RoundStart {
        for mount in &mut self.mounts {
            mount.used_this_round = false;
        }
        self.movement = Movement::default();
        self.arms_flipped = false;
        self.unloaded_this_turn = false;
        self.designated = false;

        let dissipation = self.dissipation();
        self.heat = (self.heat + self.pending_heat).saturating_sub(dissipation);
        self.pending_heat = 0;
        self.shutdown = self.heat >= SHUTDOWN_HEAT;

        let mut result = RoundStart {
            heat: self.heat,
            shutdown: self.shutdown,
            ..RoundStart::default()
        };
        for (id, mount) in self.mounts.iter_mut().enumerate() {
            if mount.dumping && mount.shots > 0 {
                mount.shots = 0;
                result.dumped.push(id);
            }
        }
        for id in 0..self.mounts.len() {
            let needs_ammo = self.mounts[id]
                .def
                .weapon()
                .is_some_and(|w| w.ammo_type.is_some());
            if needs_ammo && self.mounts[id].is_operable() && self.reload(id).is_none() {
                result.unloaded.push(id);
            }
        }
        result
    }

    /// Link `weapon` to a bin that can feed it. Keeps the current link if
    /// it still can; otherwise takes the first bin in mount order that is
    /// neither exhausted nor dumping. Leaves the weapon unlinked when none
    /// qualifies.
    pub fn reload(&mut self, weapon: MountId) -> Option<MountId> {
        let ammo_type = self
            .mounts
            .get(weapon)?
            .def
            .weapon()?
            .ammo_type
            .clone()?;
        let current = self.mounts[weapon].linked_ammo;
        if let Some(bin) = current {
            if self.mounts.get(bin).is_some_and(|m| m.can_feed(&ammo_type)) {
                return Some(bin);
            }
        }
        let next = self
            .mounts
            .iter()
            .position(|m| m.can_feed(&ammo_type));
        self.mounts[weapon].linked_ammo = next;
        match next {
            Some(bin) => debug!(unit = self.id, weapon, bin, "weapon reloaded"),
            None => {
                self.unloaded_this_turn = true;
                warn!(unit = self.id, weapon, %ammo_type, "no ammunition available");
            }
        }
        next
    }

    /// Heat shed per round.
    #[must_use]
    pub fn dissipation(&self) -> u32 {
        let extra = self
            .mounts
            .iter()
            .filter(|m| m.is_operable() && m.def.misc() == Some(MiscKind::HeatSink))
            .count() as u32;
        self.heat_sinks + extra
    }

    // ------------------------------------------------------------------
    // Derived state
    // ------------------------------------------------------------------

    /// Committed destroyed slots holding system `kind`.
    #[must_use]
    pub fn destroyed_systems(&self, kind: SystemKind) -> usize {
        self.locations
            .iter()
            .flat_map(Location::slots)
            .filter(|s| {
                s.content() == SlotContent::System(kind) && s.state() == SlotState::Destroyed
            })
            .count()
    }

    /// Destroyed sensor slots.
    #[must_use]
    pub fn sensor_hits(&self) -> usize {
        self.destroyed_systems(SystemKind::Sensors)
    }

    /// A mount's equipment still works: operable, location standing, and
    /// the unit powered.
    #[must_use]
    pub fn is_functional(&self, id: MountId) -> bool {
        self.mounts.get(id).is_some_and(|m| {
            m.is_operable()
                && !self
                    .locations
                    .get(m.location)
                    .is_some_and(Location::is_destroyed)
        }) && !self.shutdown
            && !self.destroyed
    }

    /// Another weapon in the same location already fired this round in the
    /// opposite direction (front-mounted against rear-mounted).
    #[must_use]
    pub fn location_fired_opposite(&self, id: MountId) -> bool {
        let Some(mount) = self.mounts.get(id) else {
            return false;
        };
        self.mounts.iter().enumerate().any(|(other, m)| {
            other != id
                && m.location == mount.location
                && m.used_this_round
                && m.rear_facing != mount.rear_facing
                && m.def.weapon().is_some_and(|w| !w.family.is_point_defense())
        })
    }

    fn functional_misc(&self) -> impl Iterator<Item = MiscKind> + '_ {
        self.mounts
            .iter()
            .enumerate()
            .filter(|(id, _)| self.is_functional(*id))
            .filter_map(|(_, m)| m.def.misc())
    }

    /// Radius of a working ECM suite.
    #[must_use]
    pub fn ecm_radius(&self) -> Option<u32> {
        self.functional_misc().find_map(|m| match m {
            MiscKind::Ecm { radius } => Some(radius),
            _ => None,
        })
    }

    /// Stealth system active.
    #[must_use]
    pub fn has_stealth(&self) -> bool {
        self.functional_misc().any(|m| m == MiscKind::Stealth)
    }

    /// Working command-network equipment, if any.
    #[must_use]
    pub fn network_gear(&self) -> Option<MiscKind> {
        self.functional_misc().find(|m| {
            matches!(
                m,
                MiscKind::NetworkMaster | MiscKind::NetworkSlave | MiscKind::NetworkPeer
            )
        })
    }

    /// Firing arc of a mount given location, rear mounting and flipped arms.
    #[must_use]
    pub fn weapon_arc(&self, id: MountId) -> FiringArc {
        let Some(mount) = self.mounts.get(id) else {
            return FiringArc::Forward;
        };
        let kind = self
            .locations
            .get(mount.location)
            .map_or(LocationKind::CenterTorso, Location::kind);
        let base = match kind {
            LocationKind::LeftArm => FiringArc::LeftArm,
            LocationKind::RightArm => FiringArc::RightArm,
            LocationKind::Turret => FiringArc::Turret,
            LocationKind::Rear => FiringArc::Rear,
            LocationKind::LeftSide => FiringArc::LeftSide,
            LocationKind::RightSide => FiringArc::RightSide,
            _ => FiringArc::Forward,
        };
        let arc = if mount.rear_facing {
            base.rear_mounted()
        } else {
            base
        };
        if self.arms_flipped && kind.is_arm() {
            arc.flipped()
        } else {
            arc
        }
    }

    /// Current front and rear armor across all locations.
    #[must_use]
    pub fn total_armor(&self) -> u32 {
        self.locations.iter().map(Location::armor_points).sum()
    }

    /// Starting front and rear armor across all locations.
    #[must_use]
    pub fn total_original_armor(&self) -> u32 {
        self.locations
            .iter()
            .map(Location::original_armor_points)
            .sum()
    }

    /// Current internal structure across all locations.
    #[must_use]
    pub fn total_internal(&self) -> u32 {
        self.locations.iter().map(|l| l.internal().points()).sum()
    }

    /// Current over original armor, in `[0, 1]`.
    #[must_use]
    pub fn armor_remaining_fraction(&self) -> Fixed {
        ratio(self.total_armor(), self.total_original_armor())
    }

    /// Location is gone.
    ///
    /// # Errors
    ///
    /// Returns [`CombatError::InvalidLocation`] for an out-of-range index.
    pub fn is_location_destroyed(&self, index: usize) -> Result<bool> {
        Ok(self.location(index)?.is_destroyed())
    }

    /// Slots a critical roll may pick in the location.
    ///
    /// # Errors
    ///
    /// Returns [`CombatError::InvalidLocation`] for an out-of-range index.
    pub fn hittable_slot_count(&self, index: usize) -> Result<usize> {
        Ok(self.location(index)?.hittable_slot_count())
    }

    /// Criticals landing in the location pass inward.
    ///
    /// # Errors
    ///
    /// Returns [`CombatError::InvalidLocation`] for an out-of-range index.
    pub fn transfer_eligible(&self, index: usize) -> Result<bool> {
        Ok(self.location(index)?.transfer_eligible())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::equipment::{
        AmmoDef, EquipmentDef, EquipmentKind, RangeBands, WeaponDamage, WeaponDef, WeaponFamily,
    };

    fn ac_def() -> EquipmentDef {
        EquipmentDef {
            name: "AC/10".to_string(),
            kind: EquipmentKind::Weapon(WeaponDef {
                family: WeaponFamily::Ballistic {
                    damage: WeaponDamage::Flat(10),
                    rapid: crate::equipment::RapidFire::Single,
                },
                ranges: RangeBands {
                    minimum: 0,
                    short: 5,
                    medium: 10,
                    long: 15,
                    extreme: 20,
                },
                heat: 3,
                ammo_type: Some("AC10".to_string()),
                to_hit_modifier: 0,
            }),
            slots: 2,
            hittable: true,
        }
    }

    fn ammo_def(shots: u32) -> EquipmentDef {
        EquipmentDef {
            name: "AC/10 Ammo".to_string(),
            kind: EquipmentKind::Ammo(AmmoDef {
                ammo_type: "AC10".to_string(),
                shots,
                damage_per_shot: 10,
                explosive: true,
            }),
            slots: 1,
            hittable: true,
        }
    }

    /// Minimal biped: AC in the right torso, two bins in the left torso.
    fn test_unit() -> Unit {
        let archetype = UnitArchetype::Biped;
        let locations = archetype
            .locations()
            .iter()
            .map(|&kind| {
                let slots = match kind {
                    LocationKind::Head => vec![
                        CriticalSlot::system(SystemKind::Cockpit),
                        CriticalSlot::system(SystemKind::Sensors),
                    ],
                    LocationKind::CenterTorso => vec![
                        CriticalSlot::system(SystemKind::Engine),
                        CriticalSlot::system(SystemKind::Engine),
                        CriticalSlot::system(SystemKind::Engine),
                    ],
                    LocationKind::RightTorso => {
                        vec![CriticalSlot::mount(0, true), CriticalSlot::mount(0, true)]
                    }
                    LocationKind::LeftTorso => {
                        vec![CriticalSlot::mount(1, true), CriticalSlot::mount(2, true)]
                    }
                    _ => vec![CriticalSlot::empty()],
                };
                let rear = kind.has_rear_armor().then_some(4);
                Location::new(kind, 10, rear, 5, slots)
            })
            .collect();
        let mounts = vec![
            EquipmentMount::new(ac_def(), 2, false),
            EquipmentMount::new(ammo_def(0), 3, false),
            EquipmentMount::new(ammo_def(10), 3, false),
        ];
        Unit::new(
            0,
            "Test",
            archetype,
            1,
            locations,
            mounts,
            Crew::new("Pilot", 4, 5),
            10,
        )
    }

    #[test]
    fn test_invalid_indices_error() {
        let mut unit = test_unit();
        assert_eq!(
            unit.damage_location(99, 5, false),
            Err(CombatError::InvalidLocation { unit: 0, index: 99 })
        );
        assert_eq!(
            unit.mark_slot_hit(2, 40),
            Err(CombatError::InvalidSlot {
                unit: 0,
                location: 2,
                slot: 40
            })
        );
    }

    #[test]
    fn test_hit_mount_works_until_commit() {
        let mut unit = test_unit();
        assert_eq!(unit.mark_slot_hit(2, 0), Ok(Some(SlotContent::Mount(0))));
        assert!(!unit.mounts()[0].destroyed);
        assert!(unit.is_functional(0));
        let report = unit.commit_phase();
        assert!(report.destroyed_mounts.contains(&0));
        assert!(unit.mounts()[0].destroyed);
        assert!(!unit.is_functional(0));
    }

    #[test]
    fn test_commit_destroys_exhausted_bins() {
        let mut unit = test_unit();
        let report = unit.commit_phase();
        assert_eq!(report.destroyed_mounts, vec![1]);
        assert_eq!(unit.mounts()[1].shots, 0);
        assert!(!unit.mounts()[2].destroyed);
    }

    #[test]
    fn test_reload_skips_exhausted_and_dumping() {
        let mut unit = test_unit();
        assert_eq!(unit.reload(0), Some(2));
        unit.mount_mut(2).map(|m| m.dumping = true).ok();
        unit.mount_mut(0).map(|m| m.linked_ammo = None).ok();
        assert_eq!(unit.reload(0), None);
        assert!(unit.unloaded_this_turn());
        assert_eq!(unit.mounts()[0].linked_ammo, None);
    }

    #[test]
    fn test_start_round_dumps_and_reloads() {
        let mut unit = test_unit();
        unit.mount_mut(2).map(|m| m.dumping = true).ok();
        unit.add_heat(14);
        let start = unit.start_round();
        assert_eq!(start.heat, 4);
        assert_eq!(start.dumped, vec![2]);
        assert_eq!(start.unloaded, vec![0]);
    }

    #[test]
    fn test_center_torso_loss_destroys_unit() {
        let mut unit = test_unit();
        let ct = unit.location_index(LocationKind::CenterTorso).unwrap_or(1);
        assert_eq!(unit.damage_location(ct, 20, false), Ok(5));
        assert!(unit.is_doomed());
        assert!(!unit.is_destroyed());
        let report = unit.commit_phase();
        assert!(report.unit_destroyed);
        assert!(unit.is_destroyed());
        assert_eq!(unit.location(ct).map(Location::armor_points), Ok(0));
    }

    #[test]
    fn test_engine_hits_doom_unit() {
        let mut unit = test_unit();
        for slot in 0..3 {
            assert!(unit.mark_slot_hit(1, slot).is_ok());
        }
        let report = unit.commit_phase();
        assert!(report.unit_destroyed);
    }

    #[test]
    fn test_cockpit_hit_kills_crew_at_commit() {
        let mut unit = test_unit();
        assert!(unit.mark_slot_hit(0, 0).is_ok());
        assert!(unit.crew().is_active());
        let report = unit.commit_phase();
        assert!(report.crew_killed);
        assert_eq!(unit.crew().status, CrewStatus::Dead);
    }

    #[test]
    fn test_dependent_destruction_strands_arm() {
        let mut unit = test_unit();
        let rt = 2;
        unit.damage_location(rt, 30, false).ok();
        let doomed = unit.destroy_dependent(rt);
        assert_eq!(doomed, Ok(vec![4]));
        let report = unit.commit_phase();
        assert!(report.destroyed_locations.contains(&LocationKind::RightArm));
        assert!(report.destroyed_locations.contains(&LocationKind::RightTorso));
        assert!(report.missing_mounts.contains(&0));
    }

    #[test]
    fn test_armor_fraction_bounds() {
        let mut unit = test_unit();
        assert_eq!(unit.armor_remaining_fraction(), Fixed::ONE);
        unit.damage_location(1, 7, true).ok();
        let f = unit.armor_remaining_fraction();
        assert!(f > Fixed::ZERO && f < Fixed::ONE);
    }

    #[test]
    fn test_weapon_arc_follows_location_and_flip() {
        let mut unit = test_unit();
        assert_eq!(unit.weapon_arc(0), FiringArc::Forward);
        unit.arms_flipped = true;
        assert_eq!(unit.weapon_arc(0), FiringArc::Forward);
    }
}
