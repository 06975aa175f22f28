//! Unit records for data-driven unit definitions.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::archetype::{LocationKind, UnitArchetype};
use crate::board::{Facing, HexCoord};
use crate::equipment::{EquipmentMount, WeaponMode};
use crate::error::{CombatError, Result};
use crate::structure::{CriticalSlot, Location, SystemKind};
use crate::unit::{Crew, TeamId, Unit};

use super::Catalog;

/// Crew record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrewData {
    /// Name for logs.
    pub name: String,
    /// Gunnery skill.
    #[serde(default = "default_gunnery")]
    pub gunnery: i32,
    /// Piloting skill.
    #[serde(default = "default_piloting")]
    pub piloting: i32,
}

const fn default_gunnery() -> i32 {
    4
}

const fn default_piloting() -> i32 {
    5
}

/// Location record. Fixed systems fill the first slots in order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocationData {
    /// Which location.
    pub kind: LocationKind,
    /// Front armor.
    pub armor: u32,
    /// Rear armor, for torsos.
    #[serde(default)]
    pub rear_armor: Option<u32>,
    /// Internal structure.
    pub internal: u32,
    /// Slot count; the archetype default when absent.
    #[serde(default)]
    pub slots: Option<usize>,
    /// Fixed systems.
    #[serde(default)]
    pub systems: Vec<SystemKind>,
}

/// Mount record. Equipment takes the next free slots of its location.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MountData {
    /// Catalog name.
    pub equipment: String,
    /// Location it is installed in.
    pub location: LocationKind,
    /// Faces the rear arc.
    #[serde(default)]
    pub rear: bool,
    /// Starting firing mode.
    #[serde(default)]
    pub mode: WeaponMode,
}

/// Data-driven unit definition.
///
/// # Example RON
///
/// ```ron
/// UnitData(
///     name: "Hunchback",
///     archetype: Biped,
///     team: 1,
///     crew: CrewData(name: "Lt. Reyes", gunnery: 3),
///     heat_sinks: 13,
///     position: (q: 0, r: 4),
///     facing: Facing(0),
///     locations: [
///         LocationData(kind: Head, armor: 9, internal: 3, systems: [Cockpit, Sensors]),
///         LocationData(kind: CenterTorso, armor: 26, rear_armor: Some(5), internal: 16,
///             systems: [Engine, Engine, Engine, Gyro]),
///         // ... one record per location of the archetype
///     ],
///     mounts: [
///         MountData(equipment: "AC/20", location: RightTorso),
///         MountData(equipment: "AC/20 Ammo", location: LeftTorso),
///     ],
/// )
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnitData {
    /// Display name.
    pub name: String,
    /// Body plan.
    #[serde(default)]
    pub archetype: UnitArchetype,
    /// Team.
    #[serde(default)]
    pub team: TeamId,
    /// Crew.
    pub crew: CrewData,
    /// Built-in heat sinks.
    #[serde(default = "default_heat_sinks")]
    pub heat_sinks: u32,
    /// Starting hex.
    #[serde(default)]
    pub position: HexCoord,
    /// Starting facing.
    #[serde(default)]
    pub facing: Facing,
    /// One record per location of the archetype, in any order.
    pub locations: Vec<LocationData>,
    /// Installed equipment in mount order.
    #[serde(default)]
    pub mounts: Vec<MountData>,
}

const fn default_heat_sinks() -> u32 {
    10
}

impl UnitData {
    fn error(&self, message: String) -> CombatError {
        CombatError::DataParse {
            source_name: self.name.clone(),
            message,
        }
    }

    /// Build the unit, resolving equipment names against `catalog` and
    /// linking every ammunition weapon to its first bin. The id is a
    /// placeholder until the engine adopts the unit.
    ///
    /// # Errors
    ///
    /// Returns [`CombatError::DataParse`] for a missing or duplicated
    /// location, unknown equipment, or a location without room for its
    /// systems and mounts.
    pub fn build(&self, catalog: &Catalog) -> Result<Unit> {
        let layout = self.archetype.locations();
        let mut slot_tables: Vec<Vec<CriticalSlot>> = Vec::with_capacity(layout.len());
        let mut records = Vec::with_capacity(layout.len());
        for &kind in layout {
            let mut matching = self.locations.iter().filter(|l| l.kind == kind);
            let record = matching
                .next()
                .ok_or_else(|| self.error(format!("missing location {kind}")))?;
            if matching.next().is_some() {
                return Err(self.error(format!("location {kind} listed twice")));
            }
            let count = record
                .slots
                .unwrap_or_else(|| self.archetype.default_slot_count(kind));
            if record.systems.len() > count {
                return Err(self.error(format!("too many systems in {kind}")));
            }
            let mut slots = vec![CriticalSlot::empty(); count];
            for (slot, &system) in slots.iter_mut().zip(&record.systems) {
                *slot = CriticalSlot::system(system);
            }
            slot_tables.push(slots);
            records.push(record);
        }
        if let Some(extra) = self
            .locations
            .iter()
            .find(|l| !layout.contains(&l.kind))
        {
            return Err(self.error(format!(
                "location {} does not belong to {:?}",
                extra.kind, self.archetype
            )));
        }

        let mut next_free: Vec<usize> = records.iter().map(|r| r.systems.len()).collect();
        let mut mounts = Vec::with_capacity(self.mounts.len());
        for (id, data) in self.mounts.iter().enumerate() {
            let def = catalog.require(&data.equipment, &self.name)?;
            let index = self
                .archetype
                .index_of(data.location)
                .ok_or_else(|| self.error(format!("no location {}", data.location)))?;
            let start = next_free[index];
            let end = start + usize::from(def.slots);
            let table = &mut slot_tables[index];
            if end > table.len() {
                return Err(self.error(format!(
                    "no room for {} in {}",
                    data.equipment, data.location
                )));
            }
            for slot in &mut table[start..end] {
                *slot = CriticalSlot::mount(id, def.hittable);
            }
            next_free[index] = end;
            let mut mount = EquipmentMount::new(def.clone(), index, data.rear);
            mount.mode = data.mode;
            mounts.push(mount);
        }

        let locations = records
            .iter()
            .zip(slot_tables)
            .map(|(r, slots)| Location::new(r.kind, r.armor, r.rear_armor, r.internal, slots))
            .collect();
        let crew = Crew::new(
            self.crew.name.clone(),
            self.crew.gunnery,
            self.crew.piloting,
        );
        let mut unit = Unit::new(
            0,
            self.name.clone(),
            self.archetype,
            self.team,
            locations,
            mounts,
            crew,
            self.heat_sinks,
        )
        .at(self.position, self.facing);
        for id in 0..unit.mounts().len() {
            if unit.mounts()[id]
                .def
                .weapon()
                .is_some_and(|w| w.ammo_type.is_some())
            {
                unit.reload(id);
            }
        }
        debug!(name = %self.name, mounts = unit.mounts().len(), "unit built");
        Ok(unit)
    }

    /// Parse a unit record from RON text.
    ///
    /// # Errors
    ///
    /// Returns [`CombatError::DataParse`] when the text does not parse.
    pub fn from_ron_str(text: &str) -> Result<Self> {
        super::from_ron_str("unit", text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::equipment::{
        AmmoDef, EquipmentDef, EquipmentKind, RangeBands, RapidFire, WeaponDamage, WeaponDef,
        WeaponFamily,
    };
    use crate::structure::SlotContent;

    fn catalog() -> Catalog {
        Catalog::new(vec![
            EquipmentDef {
                name: "AC/20".to_string(),
                kind: EquipmentKind::Weapon(WeaponDef {
                    family: WeaponFamily::Ballistic {
                        damage: WeaponDamage::Flat(20),
                        rapid: RapidFire::Single,
                    },
                    ranges: RangeBands {
                        minimum: 0,
                        short: 3,
                        medium: 6,
                        long: 9,
                        extreme: 12,
                    },
                    heat: 7,
                    ammo_type: Some("AC20".to_string()),
                    to_hit_modifier: 0,
                }),
                slots: 10,
                hittable: true,
            },
            EquipmentDef {
                name: "AC/20 Ammo".to_string(),
                kind: EquipmentKind::Ammo(AmmoDef {
                    ammo_type: "AC20".to_string(),
                    shots: 5,
                    damage_per_shot: 20,
                    explosive: true,
                }),
                slots: 1,
                hittable: true,
            },
        ])
    }

    fn record() -> UnitData {
        let locations = UnitArchetype::Biped
            .locations()
            .iter()
            .map(|&kind| LocationData {
                kind,
                armor: 10,
                rear_armor: kind.has_rear_armor().then_some(3),
                internal: 6,
                slots: None,
                systems: if kind == LocationKind::CenterTorso {
                    vec![SystemKind::Engine, SystemKind::Engine, SystemKind::Engine]
                } else {
                    Vec::new()
                },
            })
            .collect();
        UnitData {
            name: "Hunchback".to_string(),
            archetype: UnitArchetype::Biped,
            team: 1,
            crew: CrewData {
                name: "Reyes".to_string(),
                gunnery: 3,
                piloting: 4,
            },
            heat_sinks: 13,
            position: HexCoord::new(2, 3),
            facing: Facing(1),
            locations,
            mounts: vec![
                MountData {
                    equipment: "AC/20".to_string(),
                    location: LocationKind::RightTorso,
                    rear: false,
                    mode: WeaponMode::Standard,
                },
                MountData {
                    equipment: "AC/20 Ammo".to_string(),
                    location: LocationKind::LeftTorso,
                    rear: false,
                    mode: WeaponMode::Standard,
                },
            ],
        }
    }

    #[test]
    fn test_build_places_slots_and_links_ammo() {
        let unit = record()
            .build(&catalog())
            .unwrap_or_else(|e| panic!("unit should build: {e}"));
        assert_eq!(unit.position, HexCoord::new(2, 3));
        assert_eq!(unit.mounts()[0].linked_ammo, Some(1));
        let rt = unit
            .location_index(LocationKind::RightTorso)
            .and_then(|i| unit.location(i).ok());
        let filled = rt.map_or(0, |l| {
            l.slots()
                .iter()
                .filter(|s| s.content() == SlotContent::Mount(0))
                .count()
        });
        assert_eq!(filled, 10);
        assert_eq!(unit.crew().gunnery, 3);
    }

    #[test]
    fn test_missing_location_rejected() {
        let mut data = record();
        data.locations.retain(|l| l.kind != LocationKind::Head);
        assert!(matches!(
            data.build(&catalog()),
            Err(CombatError::DataParse { .. })
        ));
    }

    #[test]
    fn test_overfull_location_rejected() {
        let mut data = record();
        data.mounts[0].location = LocationKind::Head;
        assert!(matches!(
            data.build(&catalog()),
            Err(CombatError::DataParse { .. })
        ));
    }
}
