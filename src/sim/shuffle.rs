//! Unbiased in-place shuffle

use rand::Rng;

/// Fisher-Yates: walk from the last index down to 1, swapping each slot with a
/// uniformly chosen index in `[0, i]`.
pub fn fisher_yates<T, R: Rng>(items: &mut [T], rng: &mut R) {
    for i in (1..items.len()).rev() {
        let j = rng.random_range(0..=i);
        items.swap(i, j);
    }
}
