//! Injected dice.
//!
//! The core never touches system randomness. Every roll goes through a
//! [`Dice`] implementation handed in by the caller: [`SeededDice`] for
//! real play (ChaCha8, reproducible from a seed) and [`ScriptedDice`] for
//! tests and replays that need exact rolls.

use std::collections::VecDeque;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Source of six-sided die rolls.
pub trait Dice {
    /// Roll one six-sided die (1..=6).
    fn d6(&mut self) -> u8;

    /// Roll two six-sided dice and sum them (2..=12).
    fn roll_2d6(&mut self) -> u8 {
        self.d6() + self.d6()
    }

    /// Pick an index in `0..len` (for random critical slot selection).
    ///
    /// Default implementation rerolls d6 pairs; implementors with a real
    /// generator should override it.
    fn pick(&mut self, len: usize) -> usize {
        if len <= 1 {
            return 0;
        }
        let raw = (usize::from(self.d6()) - 1) * 6 + (usize::from(self.d6()) - 1);
        raw % len
    }
}

/// Deterministic dice backed by a seeded ChaCha8 stream.
#[derive(Debug, Clone)]
pub struct SeededDice {
    rng: ChaCha8Rng,
    seed: u64,
}

impl SeededDice {
    /// Create dice from a seed. Same seed, same rolls.
    #[must_use]
    pub fn new(seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
            seed,
        }
    }

    /// Seed this stream was created with.
    #[must_use]
    pub const fn seed(&self) -> u64 {
        self.seed
    }
}

impl Dice for SeededDice {
    fn d6(&mut self) -> u8 {
        self.rng.gen_range(1..=6)
    }

    fn pick(&mut self, len: usize) -> usize {
        if len <= 1 {
            0
        } else {
            self.rng.gen_range(0..len)
        }
    }
}

/// Dice that replay a fixed list of 2d6 totals.
///
/// Each queued value is returned whole by [`Dice::roll_2d6`]; single-die
/// requests split the next total as evenly as possible. `pick` consumes
/// from a separate queue so slot choices can be scripted independently.
/// When a queue runs dry the fallback value is used.
#[derive(Debug, Clone)]
pub struct ScriptedDice {
    totals: VecDeque<u8>,
    picks: VecDeque<usize>,
    pending_die: Option<u8>,
    fallback: u8,
}

impl ScriptedDice {
    /// Script a sequence of 2d6 totals. Falls back to 7 when exhausted.
    #[must_use]
    pub fn new(totals: impl IntoIterator<Item = u8>) -> Self {
        Self {
            totals: totals.into_iter().collect(),
            picks: VecDeque::new(),
            pending_die: None,
            fallback: 7,
        }
    }

    /// Script the slot picks consumed by [`Dice::pick`].
    #[must_use]
    pub fn with_picks(mut self, picks: impl IntoIterator<Item = usize>) -> Self {
        self.picks = picks.into_iter().collect();
        self
    }

    /// Total returned once the script is exhausted.
    #[must_use]
    pub fn with_fallback(mut self, fallback: u8) -> Self {
        self.fallback = fallback.clamp(2, 12);
        self
    }

    /// Totals not yet consumed.
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.totals.len()
    }

    fn next_total(&mut self) -> u8 {
        self.totals.pop_front().unwrap_or(self.fallback).clamp(2, 12)
    }
}

impl Dice for ScriptedDice {
    fn d6(&mut self) -> u8 {
        if let Some(die) = self.pending_die.take() {
            return die;
        }
        let total = self.next_total();
        let first = total.div_ceil(2).min(6);
        self.pending_die = Some(total - first);
        first
    }

    fn roll_2d6(&mut self) -> u8 {
        self.pending_die = None;
        self.next_total()
    }

    fn pick(&mut self, len: usize) -> usize {
        if len == 0 {
            return 0;
        }
        self.picks.pop_front().unwrap_or(0) % len
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seeded_dice_reproducible() {
        let mut a = SeededDice::new(42);
        let mut b = SeededDice::new(42);
        for _ in 0..200 {
            assert_eq!(a.roll_2d6(), b.roll_2d6());
        }
    }

    #[test]
    fn test_seeded_dice_in_range() {
        let mut dice = SeededDice::new(7);
        for _ in 0..1000 {
            let roll = dice.roll_2d6();
            assert!((2..=12).contains(&roll));
            assert!(dice.pick(5) < 5);
        }
    }

    #[test]
    fn test_scripted_totals_in_order() {
        let mut dice = ScriptedDice::new([9, 2, 12]);
        assert_eq!(dice.roll_2d6(), 9);
        assert_eq!(dice.roll_2d6(), 2);
        assert_eq!(dice.roll_2d6(), 12);
        assert_eq!(dice.remaining(), 0);
        assert_eq!(dice.roll_2d6(), 7);
    }

    #[test]
    fn test_scripted_single_dice_split_total() {
        let mut dice = ScriptedDice::new([11]);
        let first = dice.d6();
        let second = dice.d6();
        assert_eq!(first + second, 11);
        assert!(first <= 6 && second <= 6);
    }

    #[test]
    fn test_scripted_picks() {
        let mut dice = ScriptedDice::new([]).with_picks([3, 9]);
        assert_eq!(dice.pick(5), 3);
        assert_eq!(dice.pick(5), 4);
        assert_eq!(dice.pick(5), 0);
    }
}
