//! Error types for combat resolution.
//!
//! Only two kinds of failure leave the core: invalid attack declarations
//! (rejected before any state is touched) and structural invariant
//! violations (programmer errors that must not be clamped away). Every
//! other condition, including an impossible shot or an empty ammo bin, is
//! a defined outcome and is reported through the attack report instead.

use thiserror::Error;

use crate::unit::{MountId, UnitId};

/// Result type alias using [`CombatError`].
pub type Result<T> = std::result::Result<T, CombatError>;

/// Top-level error type for combat resolution.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CombatError {
    /// Unit not present in the arena.
    #[error("Unit not found: {0}")]
    UnitNotFound(UnitId),

    /// Mount index not present on the unit.
    #[error("Unit {unit} has no mount {mount}")]
    MountNotFound {
        /// Owning unit.
        unit: UnitId,
        /// Requested mount index.
        mount: MountId,
    },

    /// Mount exists but is not a weapon.
    #[error("Mount {mount} on unit {unit} is not a weapon")]
    NotAWeapon {
        /// Owning unit.
        unit: UnitId,
        /// Mount index.
        mount: MountId,
    },

    /// Weapon has already been fired this round.
    #[error("Weapon {mount} on unit {unit} already fired this round")]
    WeaponAlreadyFired {
        /// Owning unit.
        unit: UnitId,
        /// Mount index.
        mount: MountId,
    },

    /// Weapon is destroyed.
    #[error("Weapon {mount} on unit {unit} is destroyed")]
    WeaponDestroyed {
        /// Owning unit.
        unit: UnitId,
        /// Mount index.
        mount: MountId,
    },

    /// Weapon was blown off with its location.
    #[error("Weapon {mount} on unit {unit} is missing")]
    WeaponMissing {
        /// Owning unit.
        unit: UnitId,
        /// Mount index.
        mount: MountId,
    },

    /// Point-defense weapons fire automatically and cannot be declared.
    #[error("Weapon {mount} on unit {unit} is automatic point defense")]
    AutomaticWeapon {
        /// Owning unit.
        unit: UnitId,
        /// Mount index.
        mount: MountId,
    },

    /// Target lies outside every arc the weapon can fire into.
    #[error("Target is outside the firing arc of weapon {mount} on unit {unit}")]
    OutOfArc {
        /// Owning unit.
        unit: UnitId,
        /// Mount index.
        mount: MountId,
    },

    /// A unit cannot attack itself.
    #[error("Unit {0} cannot target itself")]
    SelfTarget(UnitId),

    /// Weapon family cannot engage this kind of target.
    #[error("Weapon {mount} on unit {unit} cannot engage {target}")]
    InvalidTarget {
        /// Owning unit.
        unit: UnitId,
        /// Mount index.
        mount: MountId,
        /// Human-readable target description.
        target: String,
    },

    /// Location index outside the unit's location table.
    #[error("Location index {index} out of range for unit {unit}")]
    InvalidLocation {
        /// Owning unit.
        unit: UnitId,
        /// Offending index.
        index: usize,
    },

    /// Slot index outside the location's slot array.
    #[error("Slot index {slot} out of range in location {location} of unit {unit}")]
    InvalidSlot {
        /// Owning unit.
        unit: UnitId,
        /// Location index.
        location: usize,
        /// Offending slot index.
        slot: usize,
    },

    /// Proposed master edge would close a loop.
    #[error("Linking unit {unit} to master {master} would create a network cycle")]
    NetworkCycle {
        /// Unit being re-linked.
        unit: UnitId,
        /// Proposed master.
        master: UnitId,
    },

    /// Unit carries no functioning network equipment.
    #[error("Unit {0} has no functioning command-network equipment")]
    NoNetworkGear(UnitId),

    /// Catalog or rules data could not be parsed.
    #[error("Failed to parse data '{source_name}': {message}")]
    DataParse {
        /// File or label of the data that failed.
        source_name: String,
        /// Parser message.
        message: String,
    },

    /// Snapshot encode/decode failure.
    #[error("Invalid engine state: {0}")]
    InvalidState(String),
}

impl CombatError {
    /// True for errors that reject a declaration before any mutation.
    #[must_use]
    pub const fn is_invalid_declaration(&self) -> bool {
        matches!(
            self,
            Self::UnitNotFound(_)
                | Self::MountNotFound { .. }
                | Self::NotAWeapon { .. }
                | Self::WeaponAlreadyFired { .. }
                | Self::WeaponDestroyed { .. }
                | Self::WeaponMissing { .. }
                | Self::AutomaticWeapon { .. }
                | Self::OutOfArc { .. }
                | Self::SelfTarget(_)
                | Self::InvalidTarget { .. }
        )
    }
}
