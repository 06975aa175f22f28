//! Proptest strategies.
//!
//! These strategies generate random but reproducible inputs for
//! property-based testing of the accumulator, the structural model and
//! whole engagements.

use mech_core::archetype::LocationKind;
use mech_core::board::HexCoord;
use mech_core::roll::{Modifier, ModifierValue};
use proptest::prelude::*;

/// A modifier value, mostly numeric with the occasional sentinel.
pub fn arb_modifier_value() -> impl Strategy<Value = ModifierValue> {
    prop_oneof![
        8 => (-6i32..=8).prop_map(ModifierValue::Flat),
        1 => Just(ModifierValue::Impossible),
        1 => Just(ModifierValue::AutomaticFail),
        1 => Just(ModifierValue::AutomaticSuccess),
        1 => Just(ModifierValue::SuppressedCheck),
    ]
}

/// A labelled modifier.
pub fn arb_modifier() -> impl Strategy<Value = Modifier> {
    (arb_modifier_value(), "[a-z]{1,12}").prop_map(|(value, label)| Modifier::new(value, label))
}

/// A sequence of modifiers.
pub fn arb_modifiers(max_len: usize) -> impl Strategy<Value = Vec<Modifier>> {
    prop::collection::vec(arb_modifier(), 0..=max_len)
}

/// Damage amounts a single hit can realistically deal.
pub fn arb_damage() -> impl Strategy<Value = u32> {
    0u32..=40
}

/// A volley of damage groupings.
pub fn arb_volley(max_hits: usize) -> impl Strategy<Value = Vec<u32>> {
    prop::collection::vec(arb_damage(), 0..=max_hits)
}

/// A biped location.
pub fn arb_biped_location() -> impl Strategy<Value = LocationKind> {
    prop::sample::select(vec![
        LocationKind::Head,
        LocationKind::CenterTorso,
        LocationKind::RightTorso,
        LocationKind::LeftTorso,
        LocationKind::RightArm,
        LocationKind::LeftArm,
        LocationKind::RightLeg,
        LocationKind::LeftLeg,
    ])
}

/// A hex within `radius` columns and rows of the origin.
pub fn arb_hex(radius: i32) -> impl Strategy<Value = HexCoord> {
    (-radius..=radius, -radius..=radius).prop_map(|(q, r)| HexCoord::new(q, r))
}

/// A dice seed.
pub fn arb_seed() -> impl Strategy<Value = u64> {
    any::<u64>()
}
