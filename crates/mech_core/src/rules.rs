//! Optional rules and tunable constants.
//!
//! # Example RON
//!
//! ```ron
//! RulesConfig(
//!     glancing_blows: true,
//!     direct_blows: true,
//!     extreme_range: true,
//! )
//! ```
//!
//! Omitted fields keep their defaults.

use serde::{Deserialize, Serialize};

use crate::error::{CombatError, Result};

/// Rules toggles consulted by the attack pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct RulesConfig {
    /// A roll equal to the target is a glancing blow.
    pub glancing_blows: bool,
    /// Margin of success adds damage to non-cluster weapons.
    pub direct_blows: bool,
    /// Through-armor criticals float to a rerolled location.
    pub floating_crits: bool,
    /// Extreme range band is available.
    pub extreme_range: bool,
    /// Point-defense weapons intercept missiles.
    pub point_defense: bool,
    /// Cluster roll modifier applied by an intercepting point-defense mount.
    pub point_defense_cluster_modifier: i32,
    /// Cluster roll modifier on a glancing blow.
    pub glancing_cluster_modifier: i32,
    /// Cluster bonus for guided missiles with working fire control.
    pub artemis_cluster_bonus: i32,
    /// Cluster bonus against a target carrying a beacon.
    pub beacon_cluster_bonus: i32,
    /// To-hit penalty per destroyed sensor slot.
    pub sensor_hit_modifier: i32,
    /// Crew hits taken per damaging head hit.
    pub crew_hits_per_head_hit: u8,
}

impl Default for RulesConfig {
    fn default() -> Self {
        Self {
            glancing_blows: false,
            direct_blows: false,
            floating_crits: false,
            extreme_range: false,
            point_defense: true,
            point_defense_cluster_modifier: -4,
            glancing_cluster_modifier: -4,
            artemis_cluster_bonus: 2,
            beacon_cluster_bonus: 2,
            sensor_hit_modifier: 2,
            crew_hits_per_head_hit: 1,
        }
    }
}

impl RulesConfig {
    /// Every optional rule switched on.
    #[must_use]
    pub fn all_optional() -> Self {
        Self {
            glancing_blows: true,
            direct_blows: true,
            floating_crits: true,
            extreme_range: true,
            ..Self::default()
        }
    }

    /// Parse from RON text.
    ///
    /// # Errors
    ///
    /// Returns [`CombatError::DataParse`] when the text is not valid.
    pub fn from_ron_str(text: &str) -> Result<Self> {
        ron::from_str(text).map_err(|e| CombatError::DataParse {
            source_name: "rules".to_string(),
            message: e.to_string(),
        })
    }
}
