//! Locations, armor, internal structure and critical slots.
//!
//! Damage is two-phase. During a phase, slots are only ever marked
//! [`SlotState::Hit`] and locations only ever become
//! [`StructureValue::Doomed`]; equipment keeps working. [`Location::commit`]
//! is the single transition to `Destroyed`, and it is only reachable from
//! the unit-level phase commit.

use serde::{Deserialize, Serialize};

use crate::archetype::LocationKind;
use crate::equipment::MountId;

/// Armor or internal-structure value of a location.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StructureValue {
    /// Remaining points.
    Points(u32),
    /// The location has no such layer (e.g. rear armor on a limb).
    NotApplicable,
    /// Internal structure gone; removed at the next commit.
    Doomed,
    /// Committed: the location is gone.
    Destroyed,
}

impl StructureValue {
    /// Remaining points, zero for every sentinel.
    #[must_use]
    pub const fn points(self) -> u32 {
        match self {
            Self::Points(p) => p,
            _ => 0,
        }
    }

    /// True for `Points`.
    #[must_use]
    pub const fn is_points(self) -> bool {
        matches!(self, Self::Points(_))
    }
}

/// Fixed system occupying critical slots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SystemKind {
    /// Power plant. Three hits shut the unit down for good.
    Engine,
    /// Gyroscope.
    Gyro,
    /// Sensors. Each hit adds to-hit penalties.
    Sensors,
    /// Cockpit. Destroying it kills the crew.
    Cockpit,
    /// Life support.
    LifeSupport,
    /// Limb actuator.
    Actuator,
}

/// What a critical slot is bound to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SlotContent {
    /// Nothing.
    Empty,
    /// A fixed system component.
    System(SystemKind),
    /// An equipment mount on the owning unit.
    Mount(MountId),
}

/// Damage state of a critical slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum SlotState {
    /// Undamaged.
    #[default]
    Intact,
    /// Struck this phase; still functional until commit.
    Hit,
    /// Permanently gone.
    Destroyed,
}

/// One critical slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CriticalSlot {
    content: SlotContent,
    hittable: bool,
    state: SlotState,
    hits: u8,
}

impl CriticalSlot {
    /// Unoccupied slot.
    #[must_use]
    pub const fn empty() -> Self {
        Self {
            content: SlotContent::Empty,
            hittable: false,
            state: SlotState::Intact,
            hits: 0,
        }
    }

    /// Slot holding a system component.
    #[must_use]
    pub const fn system(kind: SystemKind) -> Self {
        Self {
            content: SlotContent::System(kind),
            hittable: true,
            state: SlotState::Intact,
            hits: 0,
        }
    }

    /// Slot holding part of an equipment mount.
    #[must_use]
    pub const fn mount(mount: MountId, hittable: bool) -> Self {
        Self {
            content: SlotContent::Mount(mount),
            hittable,
            state: SlotState::Intact,
            hits: 0,
        }
    }

    /// What the slot holds.
    #[must_use]
    pub const fn content(&self) -> SlotContent {
        self.content
    }

    /// Current state.
    #[must_use]
    pub const fn state(&self) -> SlotState {
        self.state
    }

    /// Times struck since the last commit.
    #[must_use]
    pub const fn hits(&self) -> u8 {
        self.hits
    }

    /// Occupied by something that can take criticals.
    #[must_use]
    pub const fn is_ever_hittable(&self) -> bool {
        self.hittable && !matches!(self.content, SlotContent::Empty)
    }

    /// Can be chosen by a critical roll now. Hit slots remain eligible
    /// until commit.
    #[must_use]
    pub const fn is_hittable(&self) -> bool {
        self.is_ever_hittable() && !matches!(self.state, SlotState::Destroyed)
    }

    /// Struck this phase or already destroyed.
    #[must_use]
    pub const fn is_damaged(&self) -> bool {
        !matches!(self.state, SlotState::Intact)
    }

    fn mark_hit(&mut self) -> bool {
        if matches!(self.content, SlotContent::Empty) {
            return false;
        }
        self.hits = self.hits.saturating_add(1);
        if self.state == SlotState::Intact {
            self.state = SlotState::Hit;
        }
        true
    }

    fn commit(&mut self) -> bool {
        self.hits = 0;
        if self.state == SlotState::Hit {
            self.state = SlotState::Destroyed;
            true
        } else {
            false
        }
    }
}

/// Split of one damage application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct LocationDamage {
    /// Points taken by armor.
    pub armor: u32,
    /// Points taken by internal structure.
    pub internal: u32,
    /// Points not absorbed, to transfer inward.
    pub remainder: u32,
    /// This call doomed the location.
    pub doomed: bool,
}

/// Structural subdivision of a unit.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Location {
    kind: LocationKind,
    armor: StructureValue,
    rear_armor: StructureValue,
    internal: StructureValue,
    original_armor: u32,
    original_rear_armor: u32,
    original_internal: u32,
    slots: Box<[CriticalSlot]>,
}

impl Location {
    /// Location at full strength. The slot array size is fixed from here on.
    #[must_use]
    pub fn new(
        kind: LocationKind,
        armor: u32,
        rear_armor: Option<u32>,
        internal: u32,
        slots: Vec<CriticalSlot>,
    ) -> Self {
        Self {
            kind,
            armor: StructureValue::Points(armor),
            rear_armor: rear_armor.map_or(StructureValue::NotApplicable, StructureValue::Points),
            internal: StructureValue::Points(internal),
            original_armor: armor,
            original_rear_armor: rear_armor.unwrap_or(0),
            original_internal: internal,
            slots: slots.into_boxed_slice(),
        }
    }

    /// Location kind.
    #[must_use]
    pub const fn kind(&self) -> LocationKind {
        self.kind
    }

    /// Front armor value.
    #[must_use]
    pub const fn armor(&self) -> StructureValue {
        self.armor
    }

    /// Rear armor value.
    #[must_use]
    pub const fn rear_armor(&self) -> StructureValue {
        self.rear_armor
    }

    /// Internal structure value.
    #[must_use]
    pub const fn internal(&self) -> StructureValue {
        self.internal
    }

    /// Current front plus rear armor points.
    #[must_use]
    pub const fn armor_points(&self) -> u32 {
        self.armor.points() + self.rear_armor.points()
    }

    /// Starting front plus rear armor points.
    #[must_use]
    pub const fn original_armor_points(&self) -> u32 {
        self.original_armor + self.original_rear_armor
    }

    /// Starting internal structure.
    #[must_use]
    pub const fn original_internal(&self) -> u32 {
        self.original_internal
    }

    /// Has a separate rear armor layer.
    #[must_use]
    pub const fn has_rear_armor(&self) -> bool {
        !matches!(self.rear_armor, StructureValue::NotApplicable)
    }

    /// Marked for removal at the next commit.
    #[must_use]
    pub const fn is_doomed(&self) -> bool {
        matches!(self.internal, StructureValue::Doomed)
    }

    /// Gone.
    #[must_use]
    pub const fn is_destroyed(&self) -> bool {
        matches!(self.internal, StructureValue::Destroyed)
    }

    /// Doomed or destroyed: absorbs nothing further.
    #[must_use]
    pub const fn is_lost(&self) -> bool {
        self.is_doomed() || self.is_destroyed()
    }

    /// Slot array.
    #[must_use]
    pub fn slots(&self) -> &[CriticalSlot] {
        &self.slots
    }

    /// Slot at `index`.
    #[must_use]
    pub fn slot(&self, index: usize) -> Option<&CriticalSlot> {
        self.slots.get(index)
    }

    /// Slots a critical roll may pick.
    #[must_use]
    pub fn hittable_slot_count(&self) -> usize {
        self.slots.iter().filter(|s| s.is_hittable()).count()
    }

    /// Indices of slots a critical roll may pick, in slot order.
    #[must_use]
    pub fn hittable_slots(&self) -> Vec<usize> {
        self.slots
            .iter()
            .enumerate()
            .filter(|(_, s)| s.is_hittable())
            .map(|(i, _)| i)
            .collect()
    }

    /// Every occupied slot is destroyed or was never hittable, so
    /// criticals landing here pass inward.
    #[must_use]
    pub fn transfer_eligible(&self) -> bool {
        self.slots.iter().all(|s| {
            matches!(s.content, SlotContent::Empty)
                || !s.hittable
                || s.state == SlotState::Destroyed
        })
    }

    /// Apply damage: armor first (rear layer when `is_rear` and present),
    /// then internal structure. Damage beyond the internal structure dooms
    /// the location and comes back as `remainder`. A doomed or destroyed
    /// location absorbs nothing.
    pub fn take_damage(&mut self, amount: u32, is_rear: bool) -> LocationDamage {
        let mut result = LocationDamage::default();
        if self.is_lost() {
            result.remainder = amount;
            return result;
        }
        let layer = if is_rear && self.has_rear_armor() {
            &mut self.rear_armor
        } else {
            &mut self.armor
        };
        let mut left = amount;
        if let StructureValue::Points(points) = *layer {
            let absorbed = points.min(left);
            *layer = StructureValue::Points(points - absorbed);
            result.armor = absorbed;
            left -= absorbed;
        }
        if left > 0 {
            self.absorb_internal(left, &mut result);
        }
        debug_assert_eq!(
            result.armor + result.internal + result.remainder,
            amount,
            "damage must be conserved"
        );
        result
    }

    /// Apply damage straight to internal structure, skipping armor (ammo
    /// explosions). Same remainder and doom rules as [`Self::take_damage`].
    pub fn take_internal_damage(&mut self, amount: u32) -> LocationDamage {
        let mut result = LocationDamage::default();
        if self.is_lost() {
            result.remainder = amount;
        } else if amount > 0 {
            self.absorb_internal(amount, &mut result);
        }
        result
    }

    fn absorb_internal(&mut self, left: u32, result: &mut LocationDamage) {
        match self.internal {
            StructureValue::Points(points) if left < points => {
                self.internal = StructureValue::Points(points - left);
                result.internal = left;
            }
            StructureValue::Points(points) => {
                self.internal = StructureValue::Doomed;
                result.internal = points;
                result.remainder = left - points;
                result.doomed = true;
            }
            _ => result.remainder = left,
        }
    }

    /// Mark the location for removal at the next commit (blown off or
    /// stranded). Returns true if it was not already lost.
    pub fn doom(&mut self) -> bool {
        if self.is_lost() {
            return false;
        }
        self.internal = StructureValue::Doomed;
        true
    }

    /// Set slot `index` to `Hit`. Empty slots are left alone and yield
    /// `Some(false)`; an out-of-range index yields `None`.
    pub fn mark_slot_hit(&mut self, index: usize) -> Option<bool> {
        self.slots.get_mut(index).map(CriticalSlot::mark_hit)
    }

    /// Commit this location: hit slots become destroyed, a doomed location
    /// becomes destroyed with all layers zeroed. Returns true when the
    /// location itself was destroyed by this call.
    pub(crate) fn commit(&mut self) -> bool {
        for slot in self.slots.iter_mut() {
            slot.commit();
        }
        if !self.is_doomed() {
            return false;
        }
        self.armor = StructureValue::Destroyed;
        if self.has_rear_armor() {
            self.rear_armor = StructureValue::Destroyed;
        }
        self.internal = StructureValue::Destroyed;
        for slot in self.slots.iter_mut() {
            if slot.content != SlotContent::Empty {
                slot.state = SlotState::Destroyed;
            }
        }
        true
    }
}
