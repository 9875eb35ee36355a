//! Seeded train/test splitting

use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use steamrec_core::RatingTable;

use crate::error::{DataError, Result};

/// Default seed, matching the latent-factor default
pub const DEFAULT_SEED: u64 = 42;

/// Split `table` into (train, test).
///
/// Record positions are shuffled with a seeded RNG and the first
/// `round(len × test_fraction)` go to the test side. Each side keeps the
/// input's relative record order, so axis order after `fit` still follows
/// first appearance in the source.
pub fn train_test_split(
    table: &RatingTable,
    test_fraction: f64,
    seed: u64,
) -> Result<(RatingTable, RatingTable)> {
    if !(test_fraction > 0.0 && test_fraction < 1.0) {
        return Err(DataError::InvalidFraction(test_fraction));
    }

    let mut positions: Vec<usize> = (0..table.len()).collect();
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    positions.shuffle(&mut rng);

    let test_len = (table.len() as f64 * test_fraction).round() as usize;
    let (test, train) = positions.split_at_mut(test_len);
    test.sort_unstable();
    train.sort_unstable();

    Ok((table.select(train), table.select(test)))
}
