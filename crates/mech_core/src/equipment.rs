//! Equipment definitions and mounted instances.
//!
//! Weapon behaviour is a tagged enum ([`WeaponFamily`]) carrying only the
//! data its damage strategy needs. The pipeline dispatches on it with a
//! plain `match`.

use serde::{Deserialize, Serialize};

/// Range band a shot falls into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RangeBand {
    /// Short range, +0.
    Short,
    /// Medium range, +2.
    Medium,
    /// Long range, +4.
    Long,
    /// Extreme range, +6 (optional rule).
    Extreme,
    /// Beyond reach.
    OutOfRange,
}

impl RangeBand {
    /// To-hit modifier for the band. `None` when the target is unreachable.
    #[must_use]
    pub const fn modifier(self) -> Option<i32> {
        match self {
            Self::Short => Some(0),
            Self::Medium => Some(2),
            Self::Long => Some(4),
            Self::Extreme => Some(6),
            Self::OutOfRange => None,
        }
    }

    /// Label for to-hit breakdowns.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Short => "short range",
            Self::Medium => "medium range",
            Self::Long => "long range",
            Self::Extreme => "extreme range",
            Self::OutOfRange => "out of range",
        }
    }
}

/// Range brackets in hexes. Each band's value is its upper bound.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub struct RangeBands {
    /// Minimum range; zero when none.
    #[serde(default)]
    pub minimum: u32,
    /// Short bound.
    pub short: u32,
    /// Medium bound.
    pub medium: u32,
    /// Long bound.
    pub long: u32,
    /// Extreme bound.
    pub extreme: u32,
}

impl RangeBands {
    /// Band for a shot at `range`.
    #[must_use]
    pub const fn band(&self, range: u32, extreme_enabled: bool) -> RangeBand {
        if range <= self.short {
            RangeBand::Short
        } else if range <= self.medium {
            RangeBand::Medium
        } else if range <= self.long {
            RangeBand::Long
        } else if extreme_enabled && range <= self.extreme {
            RangeBand::Extreme
        } else {
            RangeBand::OutOfRange
        }
    }

    /// Minimum-range penalty: `minimum - range + 1` when inside it.
    #[must_use]
    pub const fn minimum_range_penalty(&self, range: u32) -> Option<i32> {
        if self.minimum > 0 && range <= self.minimum {
            Some((self.minimum - range + 1) as i32)
        } else {
            None
        }
    }
}

/// Damage of a single hit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WeaponDamage {
    /// Same at every range.
    Flat(u32),
    /// Drops with range band.
    Banded {
        /// Short band.
        short: u32,
        /// Medium band.
        medium: u32,
        /// Long band.
        long: u32,
        /// Extreme band.
        extreme: u32,
    },
}

impl WeaponDamage {
    /// Damage at `band`.
    #[must_use]
    pub const fn at(self, band: RangeBand) -> u32 {
        match self {
            Self::Flat(d) => d,
            Self::Banded {
                short,
                medium,
                long,
                extreme,
            } => match band {
                RangeBand::Short => short,
                RangeBand::Medium => medium,
                RangeBand::Long => long,
                RangeBand::Extreme => extreme,
                RangeBand::OutOfRange => 0,
            },
        }
    }
}

/// Rate-of-fire capability of a ballistic weapon.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum RapidFire {
    /// One shot per attack.
    #[default]
    Single,
    /// Two shots in ultra mode.
    Ultra,
    /// Up to `max_shots` in rotary mode.
    Rotary {
        /// Highest selectable shot count.
        max_shots: u8,
    },
}

/// Missile rack profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MissileRack {
    /// Missiles per salvo.
    pub size: u8,
    /// Damage of each missile.
    pub damage_per_missile: u32,
    /// Missiles grouped per hit-location roll (5 for long-range racks).
    pub group_size: u8,
    /// All-or-nothing lock-on: every missile hits or the rack does not fire.
    #[serde(default)]
    pub streak: bool,
    /// Fire-control bonus of +2 on the cluster roll unless jammed.
    #[serde(default)]
    pub artemis: bool,
    /// May be hot-loaded (no minimum range, fumbles on a natural 2).
    #[serde(default)]
    pub hot_loadable: bool,
}

/// Weapon family: selects the damage strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WeaponFamily {
    /// Lasers, particle cannons.
    Energy {
        /// Damage per hit.
        damage: WeaponDamage,
        /// Pulse weapons get -2 to hit.
        #[serde(default)]
        pulse: bool,
    },
    /// Autocannons and rifles.
    Ballistic {
        /// Damage per shot.
        damage: WeaponDamage,
        /// Rapid-fire capability.
        #[serde(default)]
        rapid: RapidFire,
    },
    /// Missile racks.
    Missile(MissileRack),
    /// Flamers: damage plus heat, ignite hex targets.
    Flamer {
        /// Damage per hit.
        damage: u32,
        /// Heat added to the target.
        heat: u32,
    },
    /// Lays a minefield at the target hex.
    MineDispenser {
        /// Mine density laid per shot.
        density: u32,
    },
    /// Area attack: damages every unit in the hex and any building.
    Artillery {
        /// Damage to each unit in the hex.
        damage: u32,
    },
    /// Marks the target for guided munitions.
    Designator,
    /// Attaches a homing pod to the target.
    Beacon,
    /// Fires automatically at incoming missiles.
    PointDefense,
}

impl WeaponFamily {
    /// Weapons that roll on the cluster table.
    #[must_use]
    pub const fn is_cluster(&self) -> bool {
        matches!(self, Self::Missile(_))
    }

    /// Weapons that only fire automatically.
    #[must_use]
    pub const fn is_point_defense(&self) -> bool {
        matches!(self, Self::PointDefense)
    }

    /// Weapons that may be aimed at an empty hex.
    #[must_use]
    pub const fn can_target_hex(&self) -> bool {
        matches!(
            self,
            Self::Flamer { .. } | Self::MineDispenser { .. } | Self::Artillery { .. }
        )
    }

    /// Weapons that may be aimed at a unit.
    #[must_use]
    pub const fn can_target_unit(&self) -> bool {
        !matches!(self, Self::MineDispenser { .. } | Self::PointDefense)
    }

    /// Whether a direct blow can add damage.
    #[must_use]
    pub const fn allows_direct_blow(&self) -> bool {
        matches!(
            self,
            Self::Energy { .. } | Self::Ballistic { .. } | Self::Flamer { .. }
        )
    }
}

/// Weapon definition.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WeaponDef {
    /// Family and its damage profile.
    pub family: WeaponFamily,
    /// Range brackets.
    pub ranges: RangeBands,
    /// Heat generated per shot.
    #[serde(default)]
    pub heat: u32,
    /// Ammunition type consumed, if any.
    #[serde(default)]
    pub ammo_type: Option<String>,
    /// Built-in to-hit adjustment.
    #[serde(default)]
    pub to_hit_modifier: i32,
}

/// Ammunition bin definition.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AmmoDef {
    /// Ammunition type, matched against [`WeaponDef::ammo_type`].
    pub ammo_type: String,
    /// Shots in a full bin.
    pub shots: u32,
    /// Damage dealt per remaining shot if the bin explodes.
    pub damage_per_shot: u32,
    /// Whether a hit on the bin detonates it.
    #[serde(default = "default_true")]
    pub explosive: bool,
}

const fn default_true() -> bool {
    true
}

/// Non-weapon equipment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MiscKind {
    /// Command-network master computer (master/slave family).
    NetworkMaster,
    /// Command-network slave unit (master/slave family).
    NetworkSlave,
    /// Peer-to-peer network node.
    NetworkPeer,
    /// Electronic countermeasures suite.
    Ecm {
        /// Radius of the bubble in hexes.
        radius: u32,
    },
    /// Stealth armor system.
    Stealth,
    /// Extra heat dissipation.
    HeatSink,
}

/// What a piece of equipment is.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EquipmentKind {
    /// Weapon.
    Weapon(WeaponDef),
    /// Ammunition.
    Ammo(AmmoDef),
    /// Anything else.
    Misc(MiscKind),
}

/// Catalog definition of a piece of equipment.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EquipmentDef {
    /// Catalog name.
    pub name: String,
    /// Kind and kind-specific data.
    pub kind: EquipmentKind,
    /// Critical slots occupied.
    #[serde(default = "default_slots")]
    pub slots: u8,
    /// Whether the equipment can ever be struck by a critical.
    #[serde(default = "default_true")]
    pub hittable: bool,
}

const fn default_slots() -> u8 {
    1
}

impl EquipmentDef {
    /// Weapon data, if this is a weapon.
    #[must_use]
    pub const fn weapon(&self) -> Option<&WeaponDef> {
        match &self.kind {
            EquipmentKind::Weapon(w) => Some(w),
            _ => None,
        }
    }

    /// Ammo data, if this is an ammo bin.
    #[must_use]
    pub const fn ammo(&self) -> Option<&AmmoDef> {
        match &self.kind {
            EquipmentKind::Ammo(a) => Some(a),
            _ => None,
        }
    }

    /// Misc kind, if this is misc equipment.
    #[must_use]
    pub const fn misc(&self) -> Option<MiscKind> {
        match &self.kind {
            EquipmentKind::Misc(m) => Some(*m),
            _ => None,
        }
    }
}

/// Selected firing mode of a mode-switchable weapon.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum WeaponMode {
    /// Normal single-shot fire.
    #[default]
    Standard,
    /// Ultra double shot.
    Ultra,
    /// Rotary burst of this many shots.
    Rotary(u8),
    /// Hot-loaded missiles.
    HotLoaded,
}

impl WeaponMode {
    /// Shots fired per attack in this mode.
    #[must_use]
    pub const fn shots(self) -> u32 {
        match self {
            Self::Standard | Self::HotLoaded => 1,
            Self::Ultra => 2,
            Self::Rotary(n) => n as u32,
        }
    }

    /// Rapid-fire modes jam on a natural 2.
    #[must_use]
    pub const fn can_jam(self) -> bool {
        matches!(self, Self::Ultra | Self::Rotary(_))
    }
}

/// Index of a mount within its unit.
pub type MountId = usize;

/// A piece of equipment installed on a unit.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EquipmentMount {
    /// Catalog definition.
    pub def: EquipmentDef,
    /// Index of the owning location.
    pub location: usize,
    /// Faces the rear arc.
    pub rear_facing: bool,
    /// Destroyed at a commit.
    pub destroyed: bool,
    /// Lost with its location.
    pub missing: bool,
    /// Jammed by a rapid-fire fumble.
    pub jammed: bool,
    /// Fired this round.
    pub used_this_round: bool,
    /// Remaining shots (ammo bins only).
    pub shots: u32,
    /// Ammo bin feeding this weapon.
    pub linked_ammo: Option<MountId>,
    /// Active firing mode.
    pub mode: WeaponMode,
    /// Bin is being dumped and cannot feed weapons.
    pub dumping: bool,
}

impl EquipmentMount {
    /// Fresh mount at `location`. Ammo bins start full.
    #[must_use]
    pub fn new(def: EquipmentDef, location: usize, rear_facing: bool) -> Self {
        let shots = def.ammo().map_or(0, |a| a.shots);
        Self {
            def,
            location,
            rear_facing,
            destroyed: false,
            missing: false,
            jammed: false,
            used_this_round: false,
            shots,
            linked_ammo: None,
            mode: WeaponMode::Standard,
            dumping: false,
        }
    }

    /// Catalog name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.def.name
    }

    /// Neither destroyed nor missing.
    #[must_use]
    pub const fn is_operable(&self) -> bool {
        !self.destroyed && !self.missing
    }

    /// Ammo bin that can feed `ammo_type` right now.
    #[must_use]
    pub fn can_feed(&self, ammo_type: &str) -> bool {
        self.is_operable()
            && !self.dumping
            && self.shots > 0
            && self.def.ammo().is_some_and(|a| a.ammo_type == ammo_type)
    }

    /// Shots the active mode fires, clamped to what the weapon supports.
    #[must_use]
    pub fn shots_per_attack(&self) -> u32 {
        match (self.def.weapon().map(|w| w.family), self.mode) {
            (
                Some(WeaponFamily::Ballistic {
                    rapid: RapidFire::Ultra,
                    ..
                }),
                WeaponMode::Ultra,
            ) => 2,
            (
                Some(WeaponFamily::Ballistic {
                    rapid: RapidFire::Rotary { max_shots },
                    ..
                }),
                WeaponMode::Rotary(n),
            ) => u32::from(n.clamp(1, max_shots)),
            _ => 1,
        }
    }

    /// Mode in effect for resolution: modes the weapon cannot use fall back
    /// to standard.
    #[must_use]
    pub fn effective_mode(&self) -> WeaponMode {
        match (self.def.weapon().map(|w| w.family), self.mode) {
            (
                Some(WeaponFamily::Ballistic {
                    rapid: RapidFire::Ultra,
                    ..
                }),
                WeaponMode::Ultra,
            ) => WeaponMode::Ultra,
            (
                Some(WeaponFamily::Ballistic {
                    rapid: RapidFire::Rotary { max_shots },
                    ..
                }),
                WeaponMode::Rotary(n),
            ) => WeaponMode::Rotary(n.clamp(1, max_shots)),
            (Some(WeaponFamily::Missile(rack)), WeaponMode::HotLoaded) if rack.hot_loadable => {
                WeaponMode::HotLoaded
            }
            _ => WeaponMode::Standard,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn medium_laser() -> EquipmentDef {
        EquipmentDef {
            name: "Medium Laser".to_string(),
            kind: EquipmentKind::Weapon(WeaponDef {
                family: WeaponFamily::Energy {
                    damage: WeaponDamage::Flat(5),
                    pulse: false,
                },
                ranges: RangeBands {
                    minimum: 0,
                    short: 3,
                    medium: 6,
                    long: 9,
                    extreme: 12,
                },
                heat: 3,
                ammo_type: None,
                to_hit_modifier: 0,
            }),
            slots: 1,
            hittable: true,
        }
    }

    fn ultra_ac() -> EquipmentDef {
        EquipmentDef {
            name: "Ultra AC/5".to_string(),
            kind: EquipmentKind::Weapon(WeaponDef {
                family: WeaponFamily::Ballistic {
                    damage: WeaponDamage::Flat(5),
                    rapid: RapidFire::Ultra,
                },
                ranges: RangeBands {
                    minimum: 2,
                    short: 6,
                    medium: 13,
                    long: 20,
                    extreme: 26,
                },
                heat: 1,
                ammo_type: Some("AC5".to_string()),
                to_hit_modifier: 0,
            }),
            slots: 5,
            hittable: true,
        }
    }

    #[test]
    fn test_range_bands() {
        let bands = RangeBands {
            minimum: 6,
            short: 7,
            medium: 14,
            long: 21,
            extreme: 28,
        };
        assert_eq!(bands.band(5, false), RangeBand::Short);
        assert_eq!(bands.band(10, false), RangeBand::Medium);
        assert_eq!(bands.band(21, false), RangeBand::Long);
        assert_eq!(bands.band(25, false), RangeBand::OutOfRange);
        assert_eq!(bands.band(25, true), RangeBand::Extreme);
        assert_eq!(bands.minimum_range_penalty(3), Some(4));
        assert_eq!(bands.minimum_range_penalty(6), Some(1));
        assert_eq!(bands.minimum_range_penalty(7), None);
    }

    #[test]
    fn test_banded_damage() {
        let damage = WeaponDamage::Banded {
            short: 10,
            medium: 10,
            long: 7,
            extreme: 5,
        };
        assert_eq!(damage.at(RangeBand::Medium), 10);
        assert_eq!(damage.at(RangeBand::Long), 7);
        assert_eq!(damage.at(RangeBand::OutOfRange), 0);
    }

    #[test]
    fn test_mode_falls_back_when_unsupported() {
        let mut laser = EquipmentMount::new(medium_laser(), 4, false);
        laser.mode = WeaponMode::Ultra;
        assert_eq!(laser.effective_mode(), WeaponMode::Standard);
        assert_eq!(laser.shots_per_attack(), 1);

        let mut ac = EquipmentMount::new(ultra_ac(), 2, false);
        ac.mode = WeaponMode::Ultra;
        assert_eq!(ac.effective_mode(), WeaponMode::Ultra);
        assert_eq!(ac.shots_per_attack(), 2);
    }

    #[test]
    fn test_ammo_feed_rules() {
        let def = EquipmentDef {
            name: "AC/5 Ammo".to_string(),
            kind: EquipmentKind::Ammo(AmmoDef {
                ammo_type: "AC5".to_string(),
                shots: 20,
                damage_per_shot: 5,
                explosive: true,
            }),
            slots: 1,
            hittable: true,
        };
        let mut bin = EquipmentMount::new(def, 2, false);
        assert_eq!(bin.shots, 20);
        assert!(bin.can_feed("AC5"));
        assert!(!bin.can_feed("LRM"));
        bin.dumping = true;
        assert!(!bin.can_feed("AC5"));
        bin.dumping = false;
        bin.shots = 0;
        assert!(!bin.can_feed("AC5"));
    }
}
