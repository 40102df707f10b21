//! Stratified train / validation / test partitioning

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

/// Share of each class assigned to the training partition
pub const TRAIN_FRACTION: f64 = 0.70;

/// Default seed for reproducible splits
pub const DEFAULT_SEED: u64 = 42;

/// Row indices of the three partitions
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StratifiedSplit {
    pub train: Vec<usize>,
    pub validation: Vec<usize>,
    pub test: Vec<usize>,
}

/// Partition sizes as recorded in the metrics report
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SplitSizes {
    pub train_rows: usize,
    pub val_rows: usize,
    pub test_rows: usize,
}

impl StratifiedSplit {
    pub fn sizes(&self) -> SplitSizes {
        SplitSizes {
            train_rows: self.train.len(),
            val_rows: self.validation.len(),
            test_rows: self.test.len(),
        }
    }
}

/// Split row indices 70/15/15 while preserving the class ratio of `labels`.
///
/// Per class: `round(0.70 * n)` rows go to train, the remainder is halved
/// with validation taking the floor. Each partition is shuffled afterwards so
/// classes are interleaved.
pub fn stratified_split(labels: &[u8], seed: u64) -> StratifiedSplit {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut split = StratifiedSplit::default();

    for class in [0u8, 1] {
        let mut members: Vec<usize> = labels
            .iter()
            .enumerate()
            .filter_map(|(i, &l)| (l == class).then_some(i))
            .collect();
        members.shuffle(&mut rng);

        let n = members.len();
        let n_train = ((n as f64) * TRAIN_FRACTION).round() as usize;
        let n_val = (n - n_train) / 2;

        split.train.extend_from_slice(&members[..n_train]);
        split.validation.extend_from_slice(&members[n_train..n_train + n_val]);
        split.test.extend_from_slice(&members[n_train + n_val..]);
    }

    split.train.shuffle(&mut rng);
    split.validation.shuffle(&mut rng);
    split.test.shuffle(&mut rng);
    split
}
