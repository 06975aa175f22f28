//! Cluster hits table.

use crate::math::{ratio, Fixed};

/// Columns of the cluster table, by volley size.
const COLUMNS: [(u32, [u32; 11]); 8] = [
    (2, [1, 1, 1, 1, 1, 1, 2, 2, 2, 2, 2]),
    (3, [1, 1, 1, 2, 2, 2, 2, 2, 3, 3, 3]),
    (4, [1, 2, 2, 2, 2, 3, 3, 3, 3, 4, 4]),
    (5, [1, 2, 2, 3, 3, 3, 3, 4, 4, 5, 5]),
    (6, [2, 2, 3, 3, 4, 4, 4, 5, 5, 6, 6]),
    (10, [3, 3, 4, 6, 6, 6, 6, 8, 8, 10, 10]),
    (15, [5, 5, 6, 9, 9, 9, 9, 12, 12, 15, 15]),
    (20, [6, 6, 9, 12, 12, 12, 12, 16, 16, 20, 20]),
];

/// Ways to roll each 2d6 total from 2 to 12.
const WAYS: [u32; 11] = [1, 2, 3, 4, 5, 6, 5, 4, 3, 2, 1];

/// Clamp a modified cluster roll to the table.
#[must_use]
pub fn clamp_roll(roll: i32) -> u8 {
    roll.clamp(2, 12) as u8
}

/// Missiles or shots that hit from a volley of `size` on a (modified,
/// clamped) roll.
///
/// Sizes larger than the table are split into full 20-columns plus a
/// remainder. Sizes between listed columns scale the next larger column
/// down, rounding up.
#[must_use]
pub fn cluster_hits(size: u32, roll: u8) -> u32 {
    if size == 0 {
        return 0;
    }
    if size == 1 {
        return 1;
    }
    let index = usize::from(clamp_roll(i32::from(roll)) - 2);
    if size > 20 {
        return cluster_hits(20, roll) + cluster_hits(size - 20, roll);
    }
    match COLUMNS.iter().find(|(s, _)| *s >= size) {
        Some((s, column)) if *s == size => column[index],
        Some((s, column)) => (column[index] * size).div_ceil(*s).clamp(1, size),
        None => size,
    }
}

/// Mean number of hits from a volley of `size` with a roll modifier.
#[must_use]
pub fn expected_hits(size: u32, modifier: i32) -> Fixed {
    let total: u32 = (2..=12)
        .zip(WAYS)
        .map(|(roll, ways)| ways * cluster_hits(size, clamp_roll(roll + modifier)))
        .sum();
    ratio(total, 36)
}
