//! Target-number accumulation.
//!
//! A [`TargetRoll`] is an ordered list of [`Modifier`]s. Folding it left to
//! right yields either a finite target number for a 2d6 roll or a sentinel
//! outcome. The fold stops at the **first** sentinel it meets: modifiers
//! after that point are never summed and never described, even if they are
//! themselves sentinels. Combat logs and replays depend on this exact
//! order sensitivity.

use std::cmp::Ordering;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Value carried by a single modifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ModifierValue {
    /// Signed adjustment to the target number.
    Flat(i32),
    /// The roll cannot succeed at all.
    Impossible,
    /// The roll fails without being made.
    AutomaticFail,
    /// The roll succeeds without being made.
    AutomaticSuccess,
    /// The check is not attempted.
    SuppressedCheck,
}

impl ModifierValue {
    /// Sentinel outcome this value stands for, if any.
    #[must_use]
    pub const fn sentinel(self) -> Option<RollOutcome> {
        match self {
            Self::Flat(_) => None,
            Self::Impossible => Some(RollOutcome::Impossible),
            Self::AutomaticFail => Some(RollOutcome::AutomaticFail),
            Self::AutomaticSuccess => Some(RollOutcome::AutomaticSuccess),
            Self::SuppressedCheck => Some(RollOutcome::SuppressedCheck),
        }
    }

    /// True for automatic fail/success, the two values stripped by
    /// [`TargetRoll::remove_automatic_outcomes`].
    #[must_use]
    pub const fn is_automatic(self) -> bool {
        matches!(self, Self::AutomaticFail | Self::AutomaticSuccess)
    }
}

impl fmt::Display for ModifierValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Flat(v) => write!(f, "{v:+}"),
            other => match other.sentinel() {
                Some(outcome) => write!(f, "{outcome}"),
                None => Ok(()),
            },
        }
    }
}

/// A single to-hit modifier with its reason.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Modifier {
    /// Value contributed to the fold.
    pub value: ModifierValue,
    /// Human-readable reason.
    pub description: String,
}

impl Modifier {
    /// Finite modifier.
    #[must_use]
    pub fn flat(value: i32, description: impl Into<String>) -> Self {
        Self {
            value: ModifierValue::Flat(value),
            description: description.into(),
        }
    }

    /// Modifier with an arbitrary value.
    #[must_use]
    pub fn new(value: ModifierValue, description: impl Into<String>) -> Self {
        Self {
            value,
            description: description.into(),
        }
    }
}

/// Result of folding a [`TargetRoll`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RollOutcome {
    /// Roll 2d6 and meet or beat this number.
    Target(i32),
    /// Cannot succeed.
    Impossible,
    /// Fails without rolling.
    AutomaticFail,
    /// Succeeds without rolling.
    AutomaticSuccess,
    /// Check is not attempted.
    SuppressedCheck,
}

impl RollOutcome {
    /// Position in the conventional total order.
    const fn rank(self) -> (u8, i32) {
        match self {
            Self::AutomaticSuccess => (0, 0),
            Self::SuppressedCheck => (1, 0),
            Self::Target(v) => (2, v),
            Self::AutomaticFail => (3, 0),
            Self::Impossible => (4, 0),
        }
    }

    /// True when dice must actually be rolled.
    #[must_use]
    pub const fn needs_roll(self) -> bool {
        matches!(self, Self::Target(_))
    }
}

impl PartialOrd for RollOutcome {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Impossible > AutomaticFail > finite > SuppressedCheck > AutomaticSuccess.
impl Ord for RollOutcome {
    fn cmp(&self, other: &Self) -> Ordering {
        self.rank().cmp(&other.rank())
    }
}

impl fmt::Display for RollOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Target(v) => write!(f, "{v}"),
            Self::Impossible => write!(f, "Impossible"),
            Self::AutomaticFail => write!(f, "Automatic Failure"),
            Self::AutomaticSuccess => write!(f, "Automatic Success"),
            Self::SuppressedCheck => write!(f, "Not Attempted"),
        }
    }
}

/// Ordered modifier accumulator.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TargetRoll {
    modifiers: Vec<Modifier>,
}

impl TargetRoll {
    /// Empty accumulator. Evaluates to `Target(0)`.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Accumulator starting with one finite modifier.
    #[must_use]
    pub fn with_base(value: i32, description: impl Into<String>) -> Self {
        let mut roll = Self::new();
        roll.add(Modifier::flat(value, description));
        roll
    }

    /// Accumulator that can never succeed.
    #[must_use]
    pub fn impossible(description: impl Into<String>) -> Self {
        Self::sentinel(ModifierValue::Impossible, description)
    }

    /// Accumulator that fails without rolling.
    #[must_use]
    pub fn automatic_fail(description: impl Into<String>) -> Self {
        Self::sentinel(ModifierValue::AutomaticFail, description)
    }

    /// Accumulator that succeeds without rolling.
    #[must_use]
    pub fn automatic_success(description: impl Into<String>) -> Self {
        Self::sentinel(ModifierValue::AutomaticSuccess, description)
    }

    /// Accumulator whose check is not attempted.
    #[must_use]
    pub fn suppressed(description: impl Into<String>) -> Self {
        Self::sentinel(ModifierValue::SuppressedCheck, description)
    }

    fn sentinel(value: ModifierValue, description: impl Into<String>) -> Self {
        let mut roll = Self::new();
        roll.add(Modifier::new(value, description));
        roll
    }

    /// Append a modifier.
    pub fn add(&mut self, modifier: Modifier) {
        self.modifiers.push(modifier);
    }

    /// Append a finite modifier. Zero values are still recorded so the
    /// breakdown shows every rule that was consulted.
    pub fn add_flat(&mut self, value: i32, description: impl Into<String>) {
        self.add(Modifier::flat(value, description));
    }

    /// Append every modifier of `other`, preserving order.
    pub fn append(&mut self, other: &TargetRoll) {
        self.modifiers.extend(other.modifiers.iter().cloned());
    }

    /// Strip automatic fail/success modifiers. Impossible and suppressed
    /// checks are kept.
    pub fn remove_automatic_outcomes(&mut self) {
        self.modifiers.retain(|m| !m.value.is_automatic());
    }

    /// Fold modifiers left to right, stopping at the first sentinel.
    #[must_use]
    pub fn value(&self) -> RollOutcome {
        let mut total = 0i32;
        for modifier in &self.modifiers {
            match modifier.value {
                ModifierValue::Flat(v) => total = total.saturating_add(v),
                sentinel => {
                    if let Some(outcome) = sentinel.sentinel() {
                        return outcome;
                    }
                }
            }
        }
        RollOutcome::Target(total)
    }

    /// True when the fold yields a finite number.
    #[must_use]
    pub fn needs_roll(&self) -> bool {
        self.value().needs_roll()
    }

    /// True when the fold yields a sentinel.
    #[must_use]
    pub fn is_sentinel(&self) -> bool {
        !self.needs_roll()
    }

    /// Description of the first modifier, or empty.
    #[must_use]
    pub fn first_description(&self) -> &str {
        self.modifiers
            .first()
            .map_or("", |m| m.description.as_str())
    }

    /// Description of the last modifier, or empty.
    #[must_use]
    pub fn last_description(&self) -> &str {
        self.modifiers
            .last()
            .map_or("", |m| m.description.as_str())
    }

    /// Full breakdown text such as `4 (gunnery skill) + 2 (medium range)`.
    ///
    /// Performs its own left-to-right scan with the same short-circuit as
    /// [`value`](Self::value): when a sentinel is met only that modifier's
    /// description is returned.
    #[must_use]
    pub fn full_description(&self) -> String {
        let mut text = String::new();
        for (index, modifier) in self.modifiers.iter().enumerate() {
            let v = match modifier.value {
                ModifierValue::Flat(v) => v,
                _ => return modifier.description.clone(),
            };
            if index == 0 {
                text.push_str(&format!("{v} ({})", modifier.description));
            } else {
                let sign = if v < 0 { '-' } else { '+' };
                text.push_str(&format!(
                    " {sign} {} ({})",
                    v.unsigned_abs(),
                    modifier.description
                ));
            }
        }
        text
    }

    /// Target number rendered for logs.
    #[must_use]
    pub fn value_as_string(&self) -> String {
        self.value().to_string()
    }

    /// All recorded modifiers in order, including any after a sentinel.
    #[must_use]
    pub fn modifiers(&self) -> &[Modifier] {
        &self.modifiers
    }

    /// Number of recorded modifiers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.modifiers.len()
    }

    /// True when no modifiers are recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.modifiers.is_empty()
    }
}

impl fmt::Display for TargetRoll {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} [{}]", self.value(), self.full_description())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_empty_roll_is_zero() {
        let roll = TargetRoll::new();
        assert_eq!(roll.value(), RollOutcome::Target(0));
        assert_eq!(roll.full_description(), "");
        assert_eq!(roll.first_description(), "");
        assert_eq!(roll.last_description(), "");
    }

    #[test]
    fn test_flat_sum_and_description() {
        let mut roll = TargetRoll::with_base(4, "gunnery skill");
        roll.add_flat(2, "medium range");
        roll.add_flat(-1, "target immobile");
        assert_eq!(roll.value(), RollOutcome::Target(5));
        assert_eq!(
            roll.full_description(),
            "4 (gunnery skill) + 2 (medium range) - 1 (target immobile)"
        );
        assert_eq!(roll.first_description(), "gunnery skill");
        assert_eq!(roll.last_description(), "target immobile");
    }

    #[test]
    fn test_first_sentinel_wins() {
        let mut roll = TargetRoll::with_base(2, "base");
        roll.add(Modifier::new(ModifierValue::AutomaticFail, "pilot dead"));
        roll.add_flat(5, "range");
        assert_eq!(roll.value(), RollOutcome::AutomaticFail);
        assert_eq!(roll.full_description(), "pilot dead");
    }

    #[test]
    fn test_later_worse_sentinel_is_ignored() {
        let mut roll = TargetRoll::with_base(3, "base");
        roll.add(Modifier::new(ModifierValue::AutomaticSuccess, "adjacent immobile"));
        roll.add(Modifier::new(ModifierValue::Impossible, "no line of sight"));
        assert_eq!(roll.value(), RollOutcome::AutomaticSuccess);
        assert_eq!(roll.full_description(), "adjacent immobile");
    }

    #[test]
    fn test_remove_automatic_keeps_impossible() {
        let mut roll = TargetRoll::with_base(4, "gunnery");
        roll.add(Modifier::new(ModifierValue::AutomaticSuccess, "point blank"));
        roll.add(Modifier::new(ModifierValue::Impossible, "out of range"));
        roll.add_flat(2, "moved");
        roll.remove_automatic_outcomes();
        assert_eq!(roll.len(), 3);
        assert_eq!(roll.value(), RollOutcome::Impossible);
        assert_eq!(roll.full_description(), "out of range");
    }

    #[test]
    fn test_remove_automatic_then_sum() {
        let mut roll = TargetRoll::with_base(4, "gunnery");
        roll.add(Modifier::new(ModifierValue::AutomaticFail, "stunned"));
        roll.add_flat(3, "long range");
        roll.remove_automatic_outcomes();
        assert_eq!(roll.value(), RollOutcome::Target(7));
    }

    #[test]
    fn test_append_preserves_order() {
        let mut a = TargetRoll::with_base(4, "gunnery");
        let mut b = TargetRoll::new();
        b.add_flat(1, "woods");
        b.add(Modifier::new(ModifierValue::Impossible, "blocked"));
        a.append(&b);
        assert_eq!(a.len(), 3);
        assert_eq!(a.last_description(), "blocked");
        assert_eq!(a.value(), RollOutcome::Impossible);
    }

    #[test]
    fn test_outcome_ordering_convention() {
        assert!(RollOutcome::Impossible > RollOutcome::AutomaticFail);
        assert!(RollOutcome::AutomaticFail > RollOutcome::Target(i32::MAX));
        assert!(RollOutcome::Target(i32::MIN) > RollOutcome::AutomaticSuccess);
        assert!(RollOutcome::Target(8) > RollOutcome::Target(7));
    }

    fn arb_flat() -> impl Strategy<Value = Modifier> {
        (-6i32..12).prop_map(|v| Modifier::flat(v, format!("flat {v}")))
    }

    fn arb_sentinel() -> impl Strategy<Value = Modifier> {
        prop_oneof![
            Just(ModifierValue::Impossible),
            Just(ModifierValue::AutomaticFail),
            Just(ModifierValue::AutomaticSuccess),
            Just(ModifierValue::SuppressedCheck),
        ]
        .prop_map(|v| Modifier::new(v, format!("sentinel {v:?}")))
    }

    proptest! {
        #[test]
        fn prop_sentinel_at_k_decides(
            prefix in proptest::collection::vec(arb_flat(), 0..6),
            sentinel in arb_sentinel(),
            suffix in proptest::collection::vec(prop_oneof![arb_flat(), arb_sentinel()], 0..6),
        ) {
            let mut roll = TargetRoll::new();
            for m in &prefix {
                roll.add(m.clone());
            }
            roll.add(sentinel.clone());
            for m in &suffix {
                roll.add(m.clone());
            }
            prop_assert_eq!(Some(roll.value()), sentinel.value.sentinel());
            prop_assert_eq!(roll.full_description(), sentinel.description.clone());
        }

        #[test]
        fn prop_flat_only_sums(mods in proptest::collection::vec(arb_flat(), 0..10)) {
            let mut roll = TargetRoll::new();
            let mut expected = 0;
            for m in &mods {
                if let ModifierValue::Flat(v) = m.value {
                    expected += v;
                }
                roll.add(m.clone());
            }
            prop_assert_eq!(roll.value(), RollOutcome::Target(expected));
        }
    }
}
