//! Binary classification metrics for validation and test partitions

use serde::{Deserialize, Serialize};

/// Probability cutoff the classifier uses for its own hard predictions
pub const CLASSIFIER_CUTOFF: f64 = 0.5;

/// Counts of a 2x2 confusion matrix
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConfusionCounts {
    pub true_negatives: usize,
    pub false_positives: usize,
    pub false_negatives: usize,
    pub true_positives: usize,
}

impl ConfusionCounts {
    pub fn from_predictions(labels: &[u8], predicted: &[u8]) -> Self {
        let mut counts = Self::default();
        for (&actual, &pred) in labels.iter().zip(predicted) {
            match (actual, pred) {
                (0, 0) => counts.true_negatives += 1,
                (0, _) => counts.false_positives += 1,
                (_, 0) => counts.false_negatives += 1,
                _ => counts.true_positives += 1,
            }
        }
        counts
    }

    pub fn total(&self) -> usize {
        self.true_negatives + self.false_positives + self.false_negatives + self.true_positives
    }

    /// `[[tn, fp], [fn, tp]]`
    pub fn as_matrix(&self) -> [[usize; 2]; 2] {
        [
            [self.true_negatives, self.false_positives],
            [self.false_negatives, self.true_positives],
        ]
    }
}

/// Evaluation metrics for one partition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationMetrics {
    pub accuracy: f64,
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
    /// `None` when the partition contains a single class
    pub roc_auc: Option<f64>,
    /// `[[tn, fp], [fn, tp]]`
    pub confusion_matrix: [[usize; 2]; 2],
}

/// Ratio that falls back to zero when the denominator is zero
fn safe_div(num: f64, den: f64) -> f64 {
    if den == 0.0 {
        0.0
    } else {
        num / den
    }
}

/// Evaluate probabilities against true labels
pub fn evaluate(labels: &[u8], probabilities: &[f64]) -> EvaluationMetrics {
    let predicted: Vec<u8> = probabilities
        .iter()
        .map(|&p| u8::from(p >= CLASSIFIER_CUTOFF))
        .collect();
    let counts = ConfusionCounts::from_predictions(labels, &predicted);

    let tp = counts.true_positives as f64;
    let precision = safe_div(tp, tp + counts.false_positives as f64);
    let recall = safe_div(tp, tp + counts.false_negatives as f64);
    let f1 = safe_div(2.0 * precision * recall, precision + recall);
    let accuracy = safe_div(
        (counts.true_positives + counts.true_negatives) as f64,
        counts.total() as f64,
    );

    EvaluationMetrics {
        accuracy,
        precision,
        recall,
        f1,
        roc_auc: roc_auc(labels, probabilities),
        confusion_matrix: counts.as_matrix(),
    }
}

/// Area under the ROC curve via the Mann-Whitney U statistic.
///
/// Tied scores share their average rank. Returns `None` when either class is
/// absent.
pub fn roc_auc(labels: &[u8], scores: &[f64]) -> Option<f64> {
    let mut pairs: Vec<(f64, u8)> = scores.iter().copied().zip(labels.iter().copied()).collect();
    pairs.sort_by(|a, b| a.0.total_cmp(&b.0));

    let total_pos = pairs.iter().filter(|(_, t)| *t == 1).count() as f64;
    let total_neg = pairs.len() as f64 - total_pos;
    if total_pos == 0.0 || total_neg == 0.0 {
        return None;
    }

    let n = pairs.len();
    let mut rank_sum_pos = 0.0;
    let mut i = 0;

    while i < n {
        let current = pairs[i].0;
        let mut j = i;
        while j < n && pairs[j].0 == current {
            j += 1;
        }

        // Ranks i+1..=j share their mean
        let avg_rank = (i + 1 + j) as f64 / 2.0;
        let positives = pairs[i..j].iter().filter(|(_, t)| *t == 1).count() as f64;
        rank_sum_pos += avg_rank * positives;

        i = j;
    }

    let u = rank_sum_pos - total_pos * (total_pos + 1.0) / 2.0;
    Some((u / (total_pos * total_neg)).clamp(0.0, 1.0))
}
