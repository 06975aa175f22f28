//! Board collaborator interface and hex geometry.
//!
//! The combat core does not own the map. Everything it needs from the
//! board (line of sight, terrain modifiers, hex contents, static
//! interference, and the hooks that mines, fires and area attacks write
//! through) comes in through the [`Battlefield`] trait. [`OpenField`] is a
//! small reference board used by tests and the headless runner.
//!
//! Geometry is integer-only: axial hex coordinates with cube-space
//! projections for direction and arc tests, and fixed-point cube lerp for
//! line tracing.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::math::Fixed;
use crate::roll::Modifier;

/// Axial hex coordinate (flat-topped columns).
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
pub struct HexCoord {
    /// Column.
    pub q: i32,
    /// Row.
    pub r: i32,
}

/// Axial offsets for the six facings, clockwise from north.
const DIRECTIONS: [(i32, i32); 6] = [(0, -1), (1, -1), (1, 0), (0, 1), (-1, 1), (-1, 0)];

impl HexCoord {
    /// Create a coordinate.
    #[must_use]
    pub const fn new(q: i32, r: i32) -> Self {
        Self { q, r }
    }

    /// Third cube coordinate.
    #[must_use]
    pub const fn s(self) -> i32 {
        -self.q - self.r
    }

    /// Hex distance.
    #[must_use]
    pub fn distance(self, other: Self) -> u32 {
        let dq = (self.q - other.q).unsigned_abs();
        let dr = (self.r - other.r).unsigned_abs();
        let ds = (self.s() - other.s()).unsigned_abs();
        (dq + dr + ds) / 2
    }

    /// Adjacent hex in `facing`.
    #[must_use]
    pub const fn neighbor(self, facing: Facing) -> Self {
        let (dq, dr) = DIRECTIONS[facing.0 as usize % 6];
        Self::new(self.q + dq, self.r + dr)
    }

    /// Facing whose 60° wedge contains `other`. `None` for the same hex.
    ///
    /// Picks the direction with the largest cube-space projection; ties on
    /// a wedge boundary go to the lower facing index.
    #[must_use]
    pub fn direction_to(self, other: Self) -> Option<Facing> {
        if self == other {
            return None;
        }
        let dq = other.q - self.q;
        let dr = other.r - self.r;
        let ds = other.s() - self.s();
        let projections = [ds - dr, dq - dr, dq - ds, dr - ds, dr - dq, ds - dq];
        let mut best = 0usize;
        for (index, &p) in projections.iter().enumerate() {
            if p > projections[best] {
                best = index;
            }
        }
        Some(Facing(best as u8))
    }

    /// Hexes on the straight line from `self` to `other`, both included.
    #[must_use]
    pub fn line_to(self, other: Self) -> Vec<Self> {
        let n = self.distance(other);
        if n == 0 {
            return vec![self];
        }
        // Nudge off exact vertices so ties always round the same way.
        let nudge = Fixed::from_bits(1 << 12);
        let (aq, ar, as_) = (
            Fixed::from_num(self.q) + nudge,
            Fixed::from_num(self.r) + nudge * 2,
            Fixed::from_num(self.s()) - nudge * 3,
        );
        let (bq, br, bs) = (
            Fixed::from_num(other.q) + nudge,
            Fixed::from_num(other.r) + nudge * 2,
            Fixed::from_num(other.s()) - nudge * 3,
        );
        (0..=n)
            .map(|i| {
                let t = Fixed::from_num(i) / Fixed::from_num(n);
                cube_round(aq + (bq - aq) * t, ar + (br - ar) * t, as_ + (bs - as_) * t)
            })
            .collect()
    }
}

impl fmt::Display for HexCoord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.q, self.r)
    }
}

fn cube_round(q: Fixed, r: Fixed, s: Fixed) -> HexCoord {
    let rq = q.round();
    let rr = r.round();
    let rs = s.round();
    let dq = (rq - q).abs();
    let dr = (rr - r).abs();
    let ds = (rs - s).abs();
    let (q, r) = if dq > dr && dq > ds {
        (-rr - rs, rr)
    } else if dr > ds {
        (rq, -rq - rs)
    } else {
        (rq, rr)
    };
    HexCoord::new(q.to_num(), r.to_num())
}

/// One of six hex facings, 0 = north, clockwise.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
pub struct Facing(pub u8);

impl Facing {
    /// Steps clockwise from `self` to `other` (0..6).
    #[must_use]
    pub const fn relative(self, other: Facing) -> u8 {
        (other.0 % 6 + 6 - self.0 % 6) % 6
    }

    /// Facing pointing the other way.
    #[must_use]
    pub const fn opposite(self) -> Facing {
        Facing((self.0 % 6 + 3) % 6)
    }
}

/// Side of the target an attack arrives on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Side {
    /// Front hexside.
    Front,
    /// Left hexsides.
    Left,
    /// Right hexsides.
    Right,
    /// Rear hexside.
    Rear,
}

/// Side of a target at `target` facing `facing` struck from `attacker`.
///
/// Same-hex attacks count as frontal.
#[must_use]
pub fn attack_side(attacker: HexCoord, target: HexCoord, facing: Facing) -> Side {
    let Some(dir) = target.direction_to(attacker) else {
        return Side::Front;
    };
    match facing.relative(dir) {
        0 => Side::Front,
        1 | 2 => Side::Right,
        3 => Side::Rear,
        _ => Side::Left,
    }
}

/// Firing arc of a weapon mount.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum FiringArc {
    /// Front 180° wedge.
    #[default]
    Forward,
    /// Rear 180° wedge.
    Rear,
    /// Forward plus left flank.
    LeftArm,
    /// Forward plus right flank.
    RightArm,
    /// Left flank only.
    LeftSide,
    /// Right flank only.
    RightSide,
    /// All around.
    Turret,
}

impl FiringArc {
    /// Whether `relative` (clockwise steps from unit facing to the target
    /// direction) falls inside this arc.
    #[must_use]
    pub const fn contains(self, relative: u8) -> bool {
        match self {
            Self::Forward => matches!(relative, 5 | 0 | 1),
            Self::Rear => matches!(relative, 2..=4),
            Self::LeftArm => matches!(relative, 4 | 5 | 0 | 1),
            Self::RightArm => matches!(relative, 5 | 0..=2),
            Self::LeftSide => matches!(relative, 4 | 5),
            Self::RightSide => matches!(relative, 1 | 2),
            Self::Turret => true,
        }
    }

    /// Arc after the arms are flipped to fire backward.
    #[must_use]
    pub const fn flipped(self) -> Self {
        match self {
            Self::LeftArm | Self::RightArm | Self::Forward => Self::Rear,
            other => other,
        }
    }

    /// Arc covered when mounted facing rearward.
    #[must_use]
    pub const fn rear_mounted(self) -> Self {
        match self {
            Self::Turret | Self::LeftSide | Self::RightSide => self,
            _ => Self::Rear,
        }
    }
}

/// True when `target` is inside `arc` of a unit at `origin` facing `facing`.
#[must_use]
pub fn in_arc(origin: HexCoord, facing: Facing, arc: FiringArc, target: HexCoord) -> bool {
    match origin.direction_to(target) {
        None => true,
        Some(dir) => arc.contains(facing.relative(dir)),
    }
}

/// Terrain type of a hex.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Terrain {
    /// Open ground.
    #[default]
    Clear,
    /// Light woods: +1 per hex, one point of obstruction.
    LightWoods,
    /// Heavy woods: +2 per hex, two points of obstruction.
    HeavyWoods,
    /// Broken ground. No line-of-fire effect.
    Rough,
}

impl Terrain {
    /// To-hit modifier and obstruction points for this terrain.
    #[must_use]
    pub const fn obstruction(self) -> u32 {
        match self {
            Self::LightWoods => 1,
            Self::HeavyWoods => 2,
            Self::Clear | Self::Rough => 0,
        }
    }

    /// Woods burn.
    #[must_use]
    pub const fn is_flammable(self) -> bool {
        matches!(self, Self::LightWoods | Self::HeavyWoods)
    }
}

/// Line-of-sight query result.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct LineOfSight {
    /// Whether the line is blocked outright.
    pub blocked: bool,
    /// Reason shown when blocked.
    pub blocked_by: Option<String>,
    /// Terrain modifiers for the line of attack, in order along the line.
    pub modifiers: Vec<Modifier>,
}

/// Contents of a single hex as reported by the board.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct HexContents {
    /// Terrain.
    pub terrain: Terrain,
    /// Remaining construction factor of a building, if any.
    pub building: Option<u32>,
    /// Mine density of a minefield, if any.
    pub minefield: Option<u32>,
    /// Hex is burning.
    pub on_fire: bool,
}

/// Board collaborator consumed by the attack pipeline.
pub trait Battlefield {
    /// Line of sight and terrain modifiers from `from` to `to`.
    fn line_of_sight(&self, from: HexCoord, to: HexCoord) -> LineOfSight;

    /// Range in hexes.
    fn range(&self, from: HexCoord, to: HexCoord) -> u32 {
        from.distance(to)
    }

    /// Contents of `hex`.
    fn hex_contents(&self, hex: HexCoord) -> HexContents;

    /// Static electronic interference on the line from `from` to `to`.
    fn ecm_between(&self, from: HexCoord, to: HexCoord) -> bool;

    /// Lay (or thicken) a minefield.
    fn lay_minefield(&mut self, hex: HexCoord, density: u32);

    /// Try to set the hex on fire. Returns true if it is now burning.
    fn ignite(&mut self, hex: HexCoord) -> bool;

    /// Damage the building in `hex`. Returns remaining construction factor,
    /// or `None` if there is no building.
    fn damage_building(&mut self, hex: HexCoord, amount: u32) -> Option<u32>;
}

/// Static ECM field placed on the map.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EcmField {
    /// Centre hex.
    pub center: HexCoord,
    /// Radius in hexes.
    pub radius: u32,
}

/// Maximum obstruction points along a line before it is blocked.
pub const MAX_OBSTRUCTION: u32 = 2;

/// Reference board: sparse terrain, buildings, static ECM, mines, fires.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct OpenField {
    terrain: BTreeMap<HexCoord, Terrain>,
    buildings: BTreeMap<HexCoord, u32>,
    ecm: Vec<EcmField>,
    minefields: BTreeMap<HexCoord, u32>,
    fires: BTreeSet<HexCoord>,
}

impl OpenField {
    /// Empty clear board.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set terrain of a hex.
    #[must_use]
    pub fn with_terrain(mut self, hex: HexCoord, terrain: Terrain) -> Self {
        self.terrain.insert(hex, terrain);
        self
    }

    /// Place a building with a construction factor.
    #[must_use]
    pub fn with_building(mut self, hex: HexCoord, construction_factor: u32) -> Self {
        self.buildings.insert(hex, construction_factor);
        self
    }

    /// Place a static ECM field.
    #[must_use]
    pub fn with_ecm(mut self, field: EcmField) -> Self {
        self.ecm.push(field);
        self
    }

    /// Terrain at `hex`.
    #[must_use]
    pub fn terrain(&self, hex: HexCoord) -> Terrain {
        self.terrain.get(&hex).copied().unwrap_or_default()
    }

    /// Minefield density at `hex`.
    #[must_use]
    pub fn minefield(&self, hex: HexCoord) -> Option<u32> {
        self.minefields.get(&hex).copied()
    }

    /// Whether `hex` is burning.
    #[must_use]
    pub fn is_burning(&self, hex: HexCoord) -> bool {
        self.fires.contains(&hex)
    }

    /// Remaining construction factor of the building at `hex`.
    #[must_use]
    pub fn building(&self, hex: HexCoord) -> Option<u32> {
        self.buildings.get(&hex).copied()
    }
}

impl Battlefield for OpenField {
    fn line_of_sight(&self, from: HexCoord, to: HexCoord) -> LineOfSight {
        let line = from.line_to(to);
        let mut los = LineOfSight::default();
        let mut obstruction = 0;
        // The attacker's own hex never obstructs; the target hex adds its
        // modifier but does not count toward blocking.
        for (index, &hex) in line.iter().enumerate().skip(1) {
            let is_target = index == line.len() - 1;
            if !is_target && self.buildings.contains_key(&hex) {
                los.blocked = true;
                los.blocked_by = Some(format!("building at {hex}"));
                return los;
            }
            let terrain = self.terrain(hex);
            let points = terrain.obstruction();
            if points == 0 {
                continue;
            }
            let label = match terrain {
                Terrain::HeavyWoods => "heavy woods",
                _ => "light woods",
            };
            if is_target {
                los.modifiers
                    .push(Modifier::flat(points as i32, format!("target in {label}")));
            } else {
                obstruction += points;
                los.modifiers.push(Modifier::flat(
                    points as i32,
                    format!("intervening {label} at {hex}"),
                ));
            }
        }
        if obstruction > MAX_OBSTRUCTION {
            los.blocked = true;
            los.blocked_by = Some("intervening woods".to_string());
        }
        los
    }

    fn hex_contents(&self, hex: HexCoord) -> HexContents {
        HexContents {
            terrain: self.terrain(hex),
            building: self.building(hex),
            minefield: self.minefield(hex),
            on_fire: self.is_burning(hex),
        }
    }

    fn ecm_between(&self, from: HexCoord, to: HexCoord) -> bool {
        if self.ecm.is_empty() {
            return false;
        }
        from.line_to(to).iter().any(|hex| {
            self.ecm
                .iter()
                .any(|field| field.center.distance(*hex) <= field.radius)
        })
    }

    fn lay_minefield(&mut self, hex: HexCoord, density: u32) {
        let entry = self.minefields.entry(hex).or_insert(0);
        *entry = entry.saturating_add(density);
    }

    fn ignite(&mut self, hex: HexCoord) -> bool {
        let flammable = self.terrain(hex).is_flammable() || self.buildings.contains_key(&hex);
        if flammable {
            self.fires.insert(hex);
        }
        self.fires.contains(&hex)
    }

    fn damage_building(&mut self, hex: HexCoord, amount: u32) -> Option<u32> {
        let cf = self.buildings.get_mut(&hex)?;
        *cf = cf.saturating_sub(amount);
        let remaining = *cf;
        if remaining == 0 {
            self.buildings.remove(&hex);
            tracing::info!(%hex, "building collapsed");
        }
        Some(remaining)
    }
}
