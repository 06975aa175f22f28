//! # Mech Core
//!
//! Deterministic combat resolution for a turn-based armored wargame.
//!
//! This crate contains **only** deterministic logic:
//! - No rendering
//! - No IO beyond explicit replay files
//! - No system randomness (dice are injected)
//! - No floating-point math (uses fixed-point)
//!
//! This separation enables:
//! - Headless engagement runners
//! - Replay systems
//! - Determinism testing with scripted dice
//!
//! ## Crate Structure
//!
//! - [`roll`] - Target-number accumulator with sentinel outcomes
//! - [`archetype`] - Location layouts, hit tables, transfer and critical tables
//! - [`structure`] - Armor, internal structure, critical slots
//! - [`unit`] - Units, crew, heat, phase commit and round start
//! - [`equipment`] - Weapon, ammunition and misc definitions and mounts
//! - [`board`] - Hex geometry, arcs and the board collaborator
//! - [`dice`] - Injected dice: seeded and scripted
//! - [`rules`] - Optional-rule toggles
//! - [`network`] - Command networks and electronic interference
//! - [`attack`] - Declaration, to-hit, resolution and point defense
//! - [`engine`] - Unit arena and the phase/round lifecycle
//! - [`replay`] - Recorded engagements and verification
//! - [`data`] - RON records for catalogs and units
//! - [`math`] - Fixed-point math utilities

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]

pub mod archetype;
pub mod attack;
pub mod board;
pub mod data;
pub mod dice;
pub mod engine;
pub mod equipment;
pub mod error;
pub mod math;
pub mod network;
pub mod replay;
pub mod roll;
pub mod rules;
pub mod structure;
pub mod unit;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::archetype::{LocationKind, UnitArchetype};
    pub use crate::attack::{
        AimedAttack, AttackDeclaration, AttackReport, AttackResult, DeclaredAttack, PhaseReport,
        Target,
    };
    pub use crate::board::{Battlefield, Facing, HexCoord, OpenField, Side, Terrain};
    pub use crate::data::{Catalog, UnitData};
    pub use crate::dice::{Dice, ScriptedDice, SeededDice};
    pub use crate::engine::CombatEngine;
    pub use crate::equipment::{EquipmentDef, EquipmentMount, WeaponMode};
    pub use crate::error::{CombatError, Result};
    pub use crate::math::Fixed;
    pub use crate::replay::Replay;
    pub use crate::roll::{Modifier, ModifierValue, RollOutcome, TargetRoll};
    pub use crate::rules::RulesConfig;
    pub use crate::structure::{CriticalSlot, Location, SystemKind};
    pub use crate::unit::{Crew, MountId, TeamId, Unit, UnitId};
}
