//! Test fixtures and helpers.
//!
//! Reference equipment, a catalog holding all of it, and a builder for
//! units laid out the way a real record would be. Units are built through
//! [`UnitData::build`] so fixtures exercise the same path as data files.

use fixed::types::I32F32;
use mech_core::archetype::{LocationKind, UnitArchetype};
use mech_core::board::{Facing, HexCoord};
use mech_core::data::{Catalog, CrewData, LocationData, MountData, UnitData};
use mech_core::equipment::{
    AmmoDef, EquipmentDef, EquipmentKind, MiscKind, MissileRack, RangeBands, RapidFire,
    WeaponDamage, WeaponDef, WeaponFamily, WeaponMode,
};
use mech_core::structure::SystemKind;
use mech_core::unit::{TeamId, Unit};
use serde::de::DeserializeOwned;
use serde::Serialize;

/// Create a fixed-point number from an integer.
#[must_use]
pub fn fixed(n: i32) -> I32F32 {
    I32F32::from_num(n)
}

/// Create a fixed-point number from a float (for tests only).
///
/// Note: In real resolution code, never use floats.
/// This is only for convenient test setup.
#[must_use]
pub fn fixed_f(n: f64) -> I32F32 {
    I32F32::from_num(n)
}

/// Write `value` as pretty RON and read it back, the way a data file
/// would travel.
///
/// # Panics
///
/// Panics if either direction fails.
#[must_use]
pub fn ron_round_trip<T>(value: &T) -> T
where
    T: Serialize + DeserializeOwned,
{
    let text = ron::ser::to_string_pretty(value, ron::ser::PrettyConfig::default())
        .unwrap_or_else(|e| panic!("fixture failed to serialize: {e}"));
    ron::from_str(&text).unwrap_or_else(|e| panic!("fixture failed to parse back: {e}\n{text}"))
}

const fn bands(minimum: u32, short: u32, medium: u32, long: u32) -> RangeBands {
    RangeBands {
        minimum,
        short,
        medium,
        long,
        extreme: long + long / 3,
    }
}

fn weapon(name: &str, slots: u8, def: WeaponDef) -> EquipmentDef {
    EquipmentDef {
        name: name.to_string(),
        kind: EquipmentKind::Weapon(def),
        slots,
        hittable: true,
    }
}

fn ammo(name: &str, ammo_type: &str, shots: u32, damage_per_shot: u32) -> EquipmentDef {
    EquipmentDef {
        name: name.to_string(),
        kind: EquipmentKind::Ammo(AmmoDef {
            ammo_type: ammo_type.to_string(),
            shots,
            damage_per_shot,
            explosive: true,
        }),
        slots: 1,
        hittable: true,
    }
}

fn misc(name: &str, slots: u8, kind: MiscKind) -> EquipmentDef {
    EquipmentDef {
        name: name.to_string(),
        kind: EquipmentKind::Misc(kind),
        slots,
        hittable: true,
    }
}

/// 5 damage, 3 heat, 3/6/9.
#[must_use]
pub fn medium_laser() -> EquipmentDef {
    weapon(
        "Medium Laser",
        1,
        WeaponDef {
            family: WeaponFamily::Energy {
                damage: WeaponDamage::Flat(5),
                pulse: false,
            },
            ranges: bands(0, 3, 6, 9),
            heat: 3,
            ammo_type: None,
            to_hit_modifier: 0,
        },
    )
}

/// 5 damage per shot, minimum range 3, ultra capable.
#[must_use]
pub fn ultra_autocannon() -> EquipmentDef {
    weapon(
        "Ultra AC/5",
        5,
        WeaponDef {
            family: WeaponFamily::Ballistic {
                damage: WeaponDamage::Flat(5),
                rapid: RapidFire::Ultra,
            },
            ranges: bands(2, 6, 13, 20),
            heat: 1,
            ammo_type: Some("AC5".to_string()),
            to_hit_modifier: 0,
        },
    )
}

/// 20 shots of AC/5.
#[must_use]
pub fn autocannon_ammo() -> EquipmentDef {
    ammo("Ultra AC/5 Ammo", "AC5", 20, 5)
}

/// Long-range rack of `size` missiles in groups of five.
#[must_use]
pub fn lrm(size: u8) -> EquipmentDef {
    weapon(
        &format!("LRM {size}"),
        (size / 5).max(1),
        WeaponDef {
            family: WeaponFamily::Missile(MissileRack {
                size,
                damage_per_missile: 1,
                group_size: 5,
                streak: false,
                artemis: false,
                hot_loadable: true,
            }),
            ranges: bands(6, 7, 14, 21),
            heat: u32::from(size / 5) + 1,
            ammo_type: Some("LRM".to_string()),
            to_hit_modifier: 0,
        },
    )
}

/// Long-range missile bin.
#[must_use]
pub fn lrm_ammo() -> EquipmentDef {
    ammo("LRM Ammo", "LRM", 120, 1)
}

/// Two-missile streak rack.
#[must_use]
pub fn streak_srm() -> EquipmentDef {
    weapon(
        "Streak SRM 2",
        1,
        WeaponDef {
            family: WeaponFamily::Missile(MissileRack {
                size: 2,
                damage_per_missile: 2,
                group_size: 1,
                streak: true,
                artemis: false,
                hot_loadable: false,
            }),
            ranges: bands(0, 3, 6, 9),
            heat: 2,
            ammo_type: Some("SRM".to_string()),
            to_hit_modifier: 0,
        },
    )
}

/// Short-range missile bin.
#[must_use]
pub fn srm_ammo() -> EquipmentDef {
    ammo("SRM Ammo", "SRM", 50, 2)
}

/// Anti-missile system.
#[must_use]
pub fn anti_missile() -> EquipmentDef {
    weapon(
        "Anti-Missile System",
        1,
        WeaponDef {
            family: WeaponFamily::PointDefense,
            ranges: bands(0, 1, 1, 1),
            heat: 1,
            ammo_type: Some("AMS".to_string()),
            to_hit_modifier: 0,
        },
    )
}

/// Anti-missile bin.
#[must_use]
pub fn anti_missile_ammo() -> EquipmentDef {
    ammo("AMS Ammo", "AMS", 12, 2)
}

/// Light flamer.
#[must_use]
pub fn flamer() -> EquipmentDef {
    weapon(
        "Flamer",
        1,
        WeaponDef {
            family: WeaponFamily::Flamer { damage: 2, heat: 2 },
            ranges: bands(0, 1, 2, 3),
            heat: 3,
            ammo_type: None,
            to_hit_modifier: 0,
        },
    )
}

/// Direct-fire mortar: 10 damage to everything in the hex, 2/4/6.
#[must_use]
pub fn mortar() -> EquipmentDef {
    weapon(
        "Mortar",
        3,
        WeaponDef {
            family: WeaponFamily::Artillery { damage: 10 },
            ranges: bands(0, 2, 4, 6),
            heat: 4,
            ammo_type: None,
            to_hit_modifier: 0,
        },
    )
}

/// Master computer for master/slave networks.
#[must_use]
pub fn network_master() -> EquipmentDef {
    misc("C3 Master", 5, MiscKind::NetworkMaster)
}

/// Slave unit for master/slave networks.
#[must_use]
pub fn network_slave() -> EquipmentDef {
    misc("C3 Slave", 1, MiscKind::NetworkSlave)
}

/// Peer network node.
#[must_use]
pub fn network_peer() -> EquipmentDef {
    misc("C3i", 2, MiscKind::NetworkPeer)
}

/// ECM suite with a six-hex bubble.
#[must_use]
pub fn ecm_suite() -> EquipmentDef {
    misc("Guardian ECM", 2, MiscKind::Ecm { radius: 6 })
}

/// Catalog with every fixture above.
#[must_use]
pub fn reference_catalog() -> Catalog {
    Catalog::new(vec![
        medium_laser(),
        ultra_autocannon(),
        autocannon_ammo(),
        lrm(10),
        lrm(20),
        lrm_ammo(),
        streak_srm(),
        srm_ammo(),
        anti_missile(),
        anti_missile_ammo(),
        flamer(),
        mortar(),
        network_master(),
        network_slave(),
        network_peer(),
        ecm_suite(),
    ])
}

fn fixed_systems(archetype: UnitArchetype, kind: LocationKind) -> Vec<SystemKind> {
    match (archetype, kind) {
        (UnitArchetype::Vehicle, _) => Vec::new(),
        (_, LocationKind::Head) => vec![SystemKind::Cockpit, SystemKind::Sensors],
        (_, LocationKind::CenterTorso) => vec![
            SystemKind::Engine,
            SystemKind::Engine,
            SystemKind::Engine,
            SystemKind::Gyro,
        ],
        _ => Vec::new(),
    }
}

/// Builder for test units.
///
/// ```
/// use mech_core::archetype::LocationKind;
/// use mech_test_utils::fixtures::{medium_laser, UnitBuilder};
///
/// let unit = UnitBuilder::biped("Hunchback")
///     .team(2)
///     .mount(medium_laser(), LocationKind::RightArm)
///     .build();
/// assert_eq!(unit.mounts().len(), 1);
/// ```
#[derive(Debug, Clone)]
pub struct UnitBuilder {
    data: UnitData,
    catalog: Catalog,
}

impl UnitBuilder {
    /// Unit of `archetype` with 10 armor, 4 rear armor on torsos, and 5
    /// internal structure in every location.
    #[must_use]
    pub fn new(name: &str, archetype: UnitArchetype) -> Self {
        let locations = archetype
            .locations()
            .iter()
            .map(|&kind| LocationData {
                kind,
                armor: 10,
                rear_armor: kind.has_rear_armor().then_some(4),
                internal: 5,
                slots: None,
                systems: fixed_systems(archetype, kind),
            })
            .collect();
        Self {
            data: UnitData {
                name: name.to_string(),
                archetype,
                team: 1,
                crew: CrewData {
                    name: format!("{name} pilot"),
                    gunnery: 4,
                    piloting: 5,
                },
                heat_sinks: 10,
                position: HexCoord::default(),
                facing: Facing::default(),
                locations,
                mounts: Vec::new(),
            },
            catalog: Catalog::default(),
        }
    }

    /// Biped walker.
    #[must_use]
    pub fn biped(name: &str) -> Self {
        Self::new(name, UnitArchetype::Biped)
    }

    /// Tracked vehicle.
    #[must_use]
    pub fn vehicle(name: &str) -> Self {
        Self::new(name, UnitArchetype::Vehicle)
    }

    /// Team.
    #[must_use]
    pub fn team(mut self, team: TeamId) -> Self {
        self.data.team = team;
        self
    }

    /// Gunnery skill.
    #[must_use]
    pub fn gunnery(mut self, gunnery: i32) -> Self {
        self.data.crew.gunnery = gunnery;
        self
    }

    /// Starting hex and facing.
    #[must_use]
    pub fn at(mut self, q: i32, r: i32, facing: u8) -> Self {
        self.data.position = HexCoord::new(q, r);
        self.data.facing = Facing(facing);
        self
    }

    /// Set armor and internal structure of one location.
    #[must_use]
    pub fn structure(mut self, kind: LocationKind, armor: u32, internal: u32) -> Self {
        if let Some(location) = self.data.locations.iter_mut().find(|l| l.kind == kind) {
            location.armor = armor;
            location.internal = internal;
        }
        self
    }

    /// Install equipment in the next free slots of `location`.
    #[must_use]
    pub fn mount(self, def: EquipmentDef, location: LocationKind) -> Self {
        self.mount_with(def, location, WeaponMode::Standard)
    }

    /// Install equipment facing the rear arc.
    #[must_use]
    pub fn mount_rear(self, def: EquipmentDef, location: LocationKind) -> Self {
        self.install(def, location, true, WeaponMode::Standard)
    }

    /// Install equipment with a starting mode.
    #[must_use]
    pub fn mount_with(self, def: EquipmentDef, location: LocationKind, mode: WeaponMode) -> Self {
        self.install(def, location, false, mode)
    }

    fn install(
        mut self,
        def: EquipmentDef,
        location: LocationKind,
        rear: bool,
        mode: WeaponMode,
    ) -> Self {
        self.data.mounts.push(MountData {
            equipment: def.name.clone(),
            location,
            rear,
            mode,
        });
        if self.catalog.get(&def.name).is_none() {
            self.catalog.equipment.push(def);
        }
        self
    }

    /// The record the builder would build.
    #[must_use]
    pub fn data(&self) -> &UnitData {
        &self.data
    }

    /// The record as RON text, for tests that go through the data loader.
    ///
    /// # Panics
    ///
    /// Panics if the record cannot be serialized.
    #[must_use]
    pub fn to_ron(&self) -> String {
        ron::ser::to_string_pretty(&self.data, ron::ser::PrettyConfig::default())
            .unwrap_or_else(|e| panic!("fixture record failed to serialize: {e}"))
    }

    /// Build the unit.
    ///
    /// # Panics
    ///
    /// Panics if the layout cannot hold the mounted equipment.
    #[must_use]
    pub fn build(self) -> Unit {
        self.data
            .build(&self.catalog)
            .unwrap_or_else(|e| panic!("fixture unit failed to build: {e}"))
    }
}

/// Laser walker at `(q, r)` facing `facing`.
#[must_use]
pub fn laser_walker(name: &str, team: TeamId, q: i32, r: i32, facing: u8) -> Unit {
    UnitBuilder::biped(name)
        .team(team)
        .at(q, r, facing)
        .mount(medium_laser(), LocationKind::RightArm)
        .build()
}

/// Missile boat: an LRM 20 in the right torso and an LRM 10 in the left,
/// both fed from one bin in the left torso.
#[must_use]
pub fn missile_boat(name: &str, team: TeamId, q: i32, r: i32, facing: u8) -> Unit {
    UnitBuilder::biped(name)
        .team(team)
        .at(q, r, facing)
        .mount(lrm(20), LocationKind::RightTorso)
        .mount(lrm(10), LocationKind::LeftTorso)
        .mount(lrm_ammo(), LocationKind::LeftTorso)
        .build()
}

/// Walker with an anti-missile system in the center torso.
#[must_use]
pub fn point_defense_walker(name: &str, team: TeamId, q: i32, r: i32, facing: u8) -> Unit {
    UnitBuilder::biped(name)
        .team(team)
        .at(q, r, facing)
        .mount(anti_missile(), LocationKind::CenterTorso)
        .mount(anti_missile_ammo(), LocationKind::CenterTorso)
        .mount(medium_laser(), LocationKind::RightArm)
        .build()
}
