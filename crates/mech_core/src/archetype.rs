//! Unit archetypes: location layouts, hit tables, and the two damage
//! direction maps.
//!
//! Damage *transfer* flows inward (arm → side torso → center torso).
//! *Dependent destruction* flows outward (side torso lost → arm lost).
//! The two are separate tables and neither is derived from the other.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::board::Side;

/// Structural subdivision of a unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum LocationKind {
    /// Cockpit location; losing it kills the crew.
    Head,
    /// Core torso; losing it destroys the unit.
    CenterTorso,
    /// Right side torso.
    RightTorso,
    /// Left side torso.
    LeftTorso,
    /// Right arm (biped).
    RightArm,
    /// Left arm (biped).
    LeftArm,
    /// Right leg (biped).
    RightLeg,
    /// Left leg (biped).
    LeftLeg,
    /// Front right leg (quad).
    FrontRightLeg,
    /// Front left leg (quad).
    FrontLeftLeg,
    /// Rear right leg (quad).
    RearRightLeg,
    /// Rear left leg (quad).
    RearLeftLeg,
    /// Vehicle front.
    Front,
    /// Vehicle right side.
    RightSide,
    /// Vehicle left side.
    LeftSide,
    /// Vehicle rear.
    Rear,
    /// Vehicle turret.
    Turret,
}

impl LocationKind {
    /// Short label used in combat logs.
    #[must_use]
    pub const fn abbreviation(self) -> &'static str {
        match self {
            Self::Head => "HD",
            Self::CenterTorso => "CT",
            Self::RightTorso => "RT",
            Self::LeftTorso => "LT",
            Self::RightArm => "RA",
            Self::LeftArm => "LA",
            Self::RightLeg => "RL",
            Self::LeftLeg => "LL",
            Self::FrontRightLeg => "FRL",
            Self::FrontLeftLeg => "FLL",
            Self::RearRightLeg => "RRL",
            Self::RearLeftLeg => "RLL",
            Self::Front => "FR",
            Self::RightSide => "RS",
            Self::LeftSide => "LS",
            Self::Rear => "RR",
            Self::Turret => "TU",
        }
    }

    /// Limbs are blown off by a 12 on the critical-chance roll.
    #[must_use]
    pub const fn is_limb(self) -> bool {
        matches!(
            self,
            Self::RightArm
                | Self::LeftArm
                | Self::RightLeg
                | Self::LeftLeg
                | Self::FrontRightLeg
                | Self::FrontLeftLeg
                | Self::RearRightLeg
                | Self::RearLeftLeg
        )
    }

    /// Torso locations carry separate rear armor.
    #[must_use]
    pub const fn has_rear_armor(self) -> bool {
        matches!(self, Self::CenterTorso | Self::RightTorso | Self::LeftTorso)
    }

    /// Arm locations (flip rules and arm firing arcs).
    #[must_use]
    pub const fn is_arm(self) -> bool {
        matches!(self, Self::RightArm | Self::LeftArm)
    }
}

impl fmt::Display for LocationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.abbreviation())
    }
}

/// Result of a hit-location roll.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HitLocation {
    /// Location struck.
    pub kind: LocationKind,
    /// Damage goes against rear armor.
    pub rear: bool,
    /// A 2 on the table: check for a critical even if armor holds.
    pub through_armor_critical: bool,
}

/// Outcome of a critical-chance roll.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CriticalChance {
    /// No critical.
    None,
    /// This many critical slots are hit.
    Slots(u8),
    /// The limb is torn away.
    BlownOff,
}

/// Body plan of a unit. Fixes location count, order, and all tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum UnitArchetype {
    /// Two-legged walker with arms.
    #[default]
    Biped,
    /// Four-legged walker.
    Quad,
    /// Tracked or wheeled vehicle.
    Vehicle,
}

const BIPED_LOCATIONS: [LocationKind; 8] = [
    LocationKind::Head,
    LocationKind::CenterTorso,
    LocationKind::RightTorso,
    LocationKind::LeftTorso,
    LocationKind::RightArm,
    LocationKind::LeftArm,
    LocationKind::RightLeg,
    LocationKind::LeftLeg,
];

const QUAD_LOCATIONS: [LocationKind; 8] = [
    LocationKind::Head,
    LocationKind::CenterTorso,
    LocationKind::RightTorso,
    LocationKind::LeftTorso,
    LocationKind::FrontRightLeg,
    LocationKind::FrontLeftLeg,
    LocationKind::RearRightLeg,
    LocationKind::RearLeftLeg,
];

const VEHICLE_LOCATIONS: [LocationKind; 5] = [
    LocationKind::Front,
    LocationKind::RightSide,
    LocationKind::LeftSide,
    LocationKind::Rear,
    LocationKind::Turret,
];

impl UnitArchetype {
    /// Ordered location layout. A location's index is its position here.
    #[must_use]
    pub const fn locations(self) -> &'static [LocationKind] {
        match self {
            Self::Biped => &BIPED_LOCATIONS,
            Self::Quad => &QUAD_LOCATIONS,
            Self::Vehicle => &VEHICLE_LOCATIONS,
        }
    }

    /// Index of `kind` in this layout.
    #[must_use]
    pub fn index_of(self, kind: LocationKind) -> Option<usize> {
        self.locations().iter().position(|&k| k == kind)
    }

    /// Default critical-slot count for a location of this archetype.
    #[must_use]
    pub const fn default_slot_count(self, kind: LocationKind) -> usize {
        match (self, kind) {
            (Self::Vehicle, _) => 4,
            (_, LocationKind::Head) => 6,
            (Self::Biped, LocationKind::RightLeg | LocationKind::LeftLeg) => 6,
            (Self::Quad, k) if k.is_limb() => 6,
            _ => 12,
        }
    }

    /// Inward neighbour that receives unabsorbed damage. `None` means the
    /// location is life-critical and excess damage stops there.
    #[must_use]
    pub const fn transfer_location(self, kind: LocationKind) -> Option<LocationKind> {
        use LocationKind::*;
        match self {
            Self::Biped => match kind {
                RightArm | RightLeg => Some(RightTorso),
                LeftArm | LeftLeg => Some(LeftTorso),
                RightTorso | LeftTorso => Some(CenterTorso),
                _ => None,
            },
            Self::Quad => match kind {
                FrontRightLeg | RearRightLeg => Some(RightTorso),
                FrontLeftLeg | RearLeftLeg => Some(LeftTorso),
                RightTorso | LeftTorso => Some(CenterTorso),
                _ => None,
            },
            Self::Vehicle => None,
        }
    }

    /// Outward locations stranded when `kind` is destroyed.
    #[must_use]
    pub const fn dependent_locations(self, kind: LocationKind) -> &'static [LocationKind] {
        use LocationKind::*;
        match (self, kind) {
            (Self::Biped, RightTorso) => &[RightArm],
            (Self::Biped, LeftTorso) => &[LeftArm],
            (Self::Quad, RightTorso) => &[FrontRightLeg],
            (Self::Quad, LeftTorso) => &[FrontLeftLeg],
            _ => &[],
        }
    }

    /// Losing this location destroys the whole unit.
    #[must_use]
    pub const fn is_unit_critical(self, kind: LocationKind) -> bool {
        match self {
            Self::Biped | Self::Quad => matches!(kind, LocationKind::CenterTorso),
            Self::Vehicle => true,
        }
    }

    /// Losing this location kills the crew.
    #[must_use]
    pub const fn is_crew_critical(self, kind: LocationKind) -> bool {
        matches!(kind, LocationKind::Head)
    }

    /// Resolve a 2d6 hit-location roll for an attack from `side`.
    #[must_use]
    pub fn hit_location(self, side: Side, roll: u8) -> HitLocation {
        let kind = match self {
            Self::Biped => walker_table(side, roll, WalkerLimbs::BIPED),
            Self::Quad => walker_table(side, roll, WalkerLimbs::QUAD),
            Self::Vehicle => vehicle_table(side, roll),
        };
        HitLocation {
            kind,
            rear: side == Side::Rear && kind.has_rear_armor(),
            through_armor_critical: roll <= 2,
        }
    }

    /// Critical-chance roll for a location that took internal damage.
    #[must_use]
    pub fn critical_chance(self, kind: LocationKind, roll: u8) -> CriticalChance {
        match roll {
            0..=7 => CriticalChance::None,
            8 | 9 => CriticalChance::Slots(1),
            10 | 11 => CriticalChance::Slots(2),
            _ if kind.is_limb() => CriticalChance::BlownOff,
            _ => CriticalChance::Slots(3),
        }
    }
}

struct WalkerLimbs {
    right_arm: LocationKind,
    left_arm: LocationKind,
    right_leg: LocationKind,
    left_leg: LocationKind,
}

impl WalkerLimbs {
    const BIPED: Self = Self {
        right_arm: LocationKind::RightArm,
        left_arm: LocationKind::LeftArm,
        right_leg: LocationKind::RightLeg,
        left_leg: LocationKind::LeftLeg,
    };

    const QUAD: Self = Self {
        right_arm: LocationKind::FrontRightLeg,
        left_arm: LocationKind::FrontLeftLeg,
        right_leg: LocationKind::RearRightLeg,
        left_leg: LocationKind::RearLeftLeg,
    };
}

fn walker_table(side: Side, roll: u8, limbs: WalkerLimbs) -> LocationKind {
    use LocationKind::{CenterTorso, Head, LeftTorso, RightTorso};
    match side {
        Side::Front | Side::Rear => match roll {
            0..=2 => CenterTorso,
            3 | 4 => limbs.right_arm,
            5 => limbs.right_leg,
            6 => RightTorso,
            7 => CenterTorso,
            8 => LeftTorso,
            9 => limbs.left_leg,
            10 | 11 => limbs.left_arm,
            _ => Head,
        },
        Side::Left => match roll {
            0..=2 => LeftTorso,
            3 => limbs.left_leg,
            4 | 5 => limbs.left_arm,
            6 => limbs.left_leg,
            7 => LeftTorso,
            8 => CenterTorso,
            9 => RightTorso,
            10 => limbs.right_arm,
            11 => limbs.right_leg,
            _ => Head,
        },
        Side::Right => match roll {
            0..=2 => RightTorso,
            3 => limbs.right_leg,
            4 | 5 => limbs.right_arm,
            6 => limbs.right_leg,
            7 => RightTorso,
            8 => CenterTorso,
            9 => LeftTorso,
            10 => limbs.left_arm,
            11 => limbs.left_leg,
            _ => Head,
        },
    }
}

fn vehicle_table(side: Side, roll: u8) -> LocationKind {
    use LocationKind::{Front, LeftSide, Rear, RightSide, Turret};
    let (facing, left, right) = match side {
        Side::Front => (Front, LeftSide, RightSide),
        Side::Rear => (Rear, RightSide, LeftSide),
        Side::Left => (LeftSide, Rear, Front),
        Side::Right => (RightSide, Front, Rear),
    };
    match roll {
        5 => right,
        9 => left,
        10..=12 => Turret,
        _ => facing,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layout_indices() {
        assert_eq!(UnitArchetype::Biped.locations().len(), 8);
        assert_eq!(UnitArchetype::Vehicle.locations().len(), 5);
        assert_eq!(
            UnitArchetype::Biped.index_of(LocationKind::CenterTorso),
            Some(1)
        );
        assert_eq!(UnitArchetype::Biped.index_of(LocationKind::Turret), None);
    }

    #[test]
    fn test_transfer_flows_inward() {
        let biped = UnitArchetype::Biped;
        assert_eq!(
            biped.transfer_location(LocationKind::LeftArm),
            Some(LocationKind::LeftTorso)
        );
        assert_eq!(
            biped.transfer_location(LocationKind::LeftTorso),
            Some(LocationKind::CenterTorso)
        );
        assert_eq!(biped.transfer_location(LocationKind::CenterTorso), None);
        assert_eq!(biped.transfer_location(LocationKind::Head), None);
    }

    #[test]
    fn test_dependent_is_separate_from_transfer() {
        let biped = UnitArchetype::Biped;
        assert_eq!(
            biped.dependent_locations(LocationKind::RightTorso),
            &[LocationKind::RightArm]
        );
        // Legs transfer into side torsos but are not stranded by them.
        assert_eq!(
            biped.transfer_location(LocationKind::RightLeg),
            Some(LocationKind::RightTorso)
        );
        assert!(!biped
            .dependent_locations(LocationKind::RightTorso)
            .contains(&LocationKind::RightLeg));
        assert!(biped.dependent_locations(LocationKind::RightArm).is_empty());
    }

    #[test]
    fn test_hit_table_rear_and_tac() {
        let hit = UnitArchetype::Biped.hit_location(Side::Rear, 7);
        assert_eq!(hit.kind, LocationKind::CenterTorso);
        assert!(hit.rear);

        let hit = UnitArchetype::Biped.hit_location(Side::Rear, 3);
        assert_eq!(hit.kind, LocationKind::RightArm);
        assert!(!hit.rear);

        let hit = UnitArchetype::Biped.hit_location(Side::Left, 2);
        assert_eq!(hit.kind, LocationKind::LeftTorso);
        assert!(hit.through_armor_critical);

        let hit = UnitArchetype::Quad.hit_location(Side::Front, 12);
        assert_eq!(hit.kind, LocationKind::Head);
    }

    #[test]
    fn test_vehicle_table() {
        let v = UnitArchetype::Vehicle;
        assert_eq!(v.hit_location(Side::Front, 7).kind, LocationKind::Front);
        assert_eq!(v.hit_location(Side::Rear, 7).kind, LocationKind::Rear);
        assert_eq!(v.hit_location(Side::Front, 11).kind, LocationKind::Turret);
        assert!(!v.hit_location(Side::Rear, 7).rear);
    }

    #[test]
    fn test_critical_chance() {
        let biped = UnitArchetype::Biped;
        assert_eq!(
            biped.critical_chance(LocationKind::CenterTorso, 7),
            CriticalChance::None
        );
        assert_eq!(
            biped.critical_chance(LocationKind::CenterTorso, 12),
            CriticalChance::Slots(3)
        );
        assert_eq!(
            biped.critical_chance(LocationKind::LeftArm, 12),
            CriticalChance::BlownOff
        );
    }
}
