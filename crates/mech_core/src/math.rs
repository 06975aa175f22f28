//! Fixed-point math utilities for deterministic resolution.
//!
//! Derived quantities that are not whole numbers (expected damage for
//! point-defense assignment, armor fractions) use fixed-point arithmetic
//! so results are identical on every platform.

use fixed::types::I32F32;

use crate::roll::RollOutcome;

/// Fixed-point number type for all fractional combat math.
pub type Fixed = I32F32;

/// Serde support for fixed-point numbers.
///
/// Serializes fixed-point numbers as their raw bit representation (i64)
/// to preserve exact precision across serialization boundaries.
pub mod fixed_serde {
    use super::Fixed;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    /// Serialize a fixed-point number as its raw bit representation.
    pub fn serialize<S>(value: &Fixed, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        value.to_bits().serialize(serializer)
    }

    /// Deserialize a fixed-point number from its raw bit representation.
    pub fn deserialize<'de, D>(deserializer: D) -> Result<Fixed, D::Error>
    where
        D: Deserializer<'de>,
    {
        let bits = i64::deserialize(deserializer)?;
        Ok(Fixed::from_bits(bits))
    }
}

/// Ways to roll each 2d6 total, indexed by total (0 and 1 unused).
const TWO_D6_WAYS: [u32; 13] = [0, 0, 1, 2, 3, 4, 5, 6, 5, 4, 3, 2, 1];

/// Number of the 36 outcomes of 2d6 that meet or beat `target`.
#[must_use]
pub fn ways_at_least(target: i32) -> u32 {
    if target <= 2 {
        return 36;
    }
    if target > 12 {
        return 0;
    }
    (target..=12).map(|t| TWO_D6_WAYS[t as usize]).sum()
}

/// Probability that a roll against `outcome` succeeds.
#[must_use]
pub fn success_chance(outcome: RollOutcome) -> Fixed {
    match outcome {
        RollOutcome::Target(t) => Fixed::from_num(ways_at_least(t)) / Fixed::from_num(36),
        RollOutcome::AutomaticSuccess => Fixed::ONE,
        RollOutcome::Impossible | RollOutcome::AutomaticFail | RollOutcome::SuppressedCheck => {
            Fixed::ZERO
        }
    }
}

/// `numerator / denominator` as fixed-point, zero when the denominator is.
#[must_use]
pub fn ratio(numerator: u32, denominator: u32) -> Fixed {
    if denominator == 0 {
        Fixed::ZERO
    } else {
        Fixed::from_num(numerator) / Fixed::from_num(denominator)
    }
}
