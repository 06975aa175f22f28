//! Equipment catalog.

use serde::{Deserialize, Serialize};

use crate::equipment::EquipmentDef;
use crate::error::{CombatError, Result};

/// Named equipment definitions.
///
/// # Example RON
///
/// ```ron
/// Catalog(
///     equipment: [
///         EquipmentDef(
///             name: "Medium Laser",
///             kind: Weapon(WeaponDef(
///                 family: Energy(damage: Flat(5)),
///                 ranges: RangeBands(short: 3, medium: 6, long: 9, extreme: 12),
///                 heat: 3,
///             )),
///         ),
///         EquipmentDef(
///             name: "LRM 20 Ammo",
///             kind: Ammo(AmmoDef(ammo_type: "LRM", shots: 6, damage_per_shot: 20)),
///         ),
///     ],
/// )
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Catalog {
    /// Definitions, looked up by name.
    #[serde(default)]
    pub equipment: Vec<EquipmentDef>,
}

impl Catalog {
    /// Catalog over `equipment`.
    #[must_use]
    pub fn new(equipment: Vec<EquipmentDef>) -> Self {
        Self { equipment }
    }

    /// Definition named `name`.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&EquipmentDef> {
        self.equipment.iter().find(|e| e.name == name)
    }

    /// Definition named `name`, or a data error naming the unit that asked.
    ///
    /// # Errors
    ///
    /// Returns [`CombatError::DataParse`] when the name is unknown.
    pub fn require(&self, name: &str, requested_by: &str) -> Result<&EquipmentDef> {
        self.get(name).ok_or_else(|| CombatError::DataParse {
            source_name: requested_by.to_string(),
            message: format!("unknown equipment '{name}'"),
        })
    }

    /// Parse a catalog from RON text.
    ///
    /// # Errors
    ///
    /// Returns [`CombatError::DataParse`] when the text does not parse.
    pub fn from_ron_str(text: &str) -> Result<Self> {
        super::from_ron_str("catalog", text)
    }
}
