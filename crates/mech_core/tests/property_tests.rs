//! Property tests for the accumulator and the structural model.

use mech_core::math::Fixed;
use mech_core::roll::{Modifier, ModifierValue, RollOutcome, TargetRoll};
use mech_test_utils::fixtures::UnitBuilder;
use mech_test_utils::proptest::prelude::*;
use mech_test_utils::strategies::{arb_biped_location, arb_damage, arb_modifiers};

fn roll_of(modifiers: &[Modifier]) -> TargetRoll {
    let mut roll = TargetRoll::new();
    for m in modifiers {
        roll.add(m.clone());
    }
    roll
}

#[test]
fn test_first_sentinel_wins() {
    let mut roll = TargetRoll::new();
    roll.add_flat(2, "a");
    roll.add(Modifier::new(ModifierValue::AutomaticFail, "b"));
    roll.add_flat(5, "c");
    assert_eq!(roll.value(), RollOutcome::AutomaticFail);
    assert_eq!(roll.full_description(), "b");

    roll.remove_automatic_outcomes();
    assert_eq!(roll.value(), RollOutcome::Target(7));
    assert_eq!(roll.full_description(), "2 (a) + 5 (c)");
}

proptest! {
    #[test]
    fn prop_value_is_prefix_fold(modifiers in arb_modifiers(12)) {
        let roll = roll_of(&modifiers);
        let mut expected = None;
        let mut total = 0i32;
        for m in &modifiers {
            match m.value {
                ModifierValue::Flat(v) => total += v,
                other => {
                    expected = other.sentinel();
                    break;
                }
            }
        }
        prop_assert_eq!(roll.value(), expected.unwrap_or(RollOutcome::Target(total)));
    }

    #[test]
    fn prop_sentinel_description_is_first_sentinel(modifiers in arb_modifiers(12)) {
        let roll = roll_of(&modifiers);
        if let Some(first) = modifiers.iter().find(|m| m.value.sentinel().is_some()) {
            prop_assert_eq!(roll.full_description(), first.description.clone());
        }
    }

    #[test]
    fn prop_removing_automatics_keeps_hard_sentinels(modifiers in arb_modifiers(12)) {
        let mut roll = roll_of(&modifiers);
        roll.remove_automatic_outcomes();
        let value = roll.value();
        prop_assert!(value != RollOutcome::AutomaticFail);
        prop_assert!(value != RollOutcome::AutomaticSuccess);
        let had_hard = modifiers.iter().any(|m| {
            matches!(m.value, ModifierValue::Impossible | ModifierValue::SuppressedCheck)
        });
        prop_assert_eq!(roll.is_sentinel(), had_hard);
    }

    #[test]
    fn prop_damage_is_conserved(
        hits in prop::collection::vec((arb_biped_location(), arb_damage(), any::<bool>()), 0..30)
    ) {
        let mut unit = UnitBuilder::biped("Target").build();
        for (kind, amount, rear) in hits {
            let index = unit.location_index(kind).unwrap_or(0);
            let dealt = unit
                .apply_location_damage(index, amount, rear)
                .unwrap_or_else(|e| panic!("{e}"));
            prop_assert_eq!(dealt.armor + dealt.internal + dealt.remainder, amount);
            let fraction = unit.armor_remaining_fraction();
            prop_assert!(fraction >= Fixed::ZERO && fraction <= Fixed::ONE);
            prop_assert!(unit.total_armor() <= unit.total_original_armor());
        }
    }

    #[test]
    fn prop_lost_location_absorbs_nothing(amount in 1u32..60, extra in arb_damage()) {
        let mut unit = UnitBuilder::biped("Target").build();
        let arm = unit.location_index(mech_core::archetype::LocationKind::LeftArm).unwrap_or(0);
        unit.apply_location_damage(arm, 15 + amount, false)
            .unwrap_or_else(|e| panic!("{e}"));
        let dealt = unit.apply_location_damage(arm, extra, false)
            .unwrap_or_else(|e| panic!("{e}"));
        prop_assert_eq!(dealt.remainder, extra);
        prop_assert!(!dealt.doomed);
    }
}
