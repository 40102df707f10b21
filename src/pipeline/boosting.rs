//! Gradient-boosted regression trees for binary classification
//!
//! Second-order boosting on the logistic loss. Each feature is pre-binned into
//! quantile bins once, then every tree grows depth-first with histogram split
//! search over those bins. Trees store raw-value thresholds (`x <= t` goes
//! left), so prediction works directly on the feature matrix.

use indicatif::ProgressBar;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use super::classifier::{validate_fit_inputs, Classifier, ClassifierError};
use super::preprocess::FeatureMatrix;

/// Upper bound on quantile bins per feature
pub const MAX_BINS: usize = 256;

/// Floor for hessians so near-certain rows do not zero out a leaf
const MIN_HESSIAN: f64 = 1e-16;

/// Minimum gain for a split to be kept
const MIN_SPLIT_GAIN: f64 = 1e-12;

/// Boosting hyperparameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoostingConfig {
    /// Number of boosting rounds (trees)
    pub n_estimators: usize,
    /// Shrinkage applied to every leaf value
    pub learning_rate: f64,
    /// Maximum tree depth
    pub max_depth: usize,
    /// Fraction of rows sampled per tree
    pub subsample: f64,
    /// Fraction of features sampled per tree
    pub colsample_bytree: f64,
    /// L2 regularization on leaf weights
    pub reg_lambda: f64,
    /// Minimum hessian sum on each side of a split
    pub min_child_weight: f64,
    /// Quantile bins per feature
    pub max_bins: usize,
    /// Seed for row and column sampling
    pub seed: u64,
}

impl Default for BoostingConfig {
    fn default() -> Self {
        Self {
            n_estimators: 500,
            learning_rate: 0.05,
            max_depth: 5,
            subsample: 0.9,
            colsample_bytree: 0.9,
            reg_lambda: 1.0,
            min_child_weight: 1.0,
            max_bins: MAX_BINS,
            seed: 42,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
enum TreeNode {
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
    Leaf {
        value: f64,
    },
}

/// A single regression tree; node 0 is the root
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegressionTree {
    nodes: Vec<TreeNode>,
}

impl RegressionTree {
    /// Leaf value reached by a row
    pub fn predict(&self, row: &[f64]) -> f64 {
        let mut idx = 0;
        loop {
            match &self.nodes[idx] {
                TreeNode::Leaf { value } => return *value,
                TreeNode::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    idx = if row[*feature] <= *threshold {
                        *left
                    } else {
                        *right
                    };
                }
            }
        }
    }

    pub fn n_leaves(&self) -> usize {
        self.nodes
            .iter()
            .filter(|n| matches!(n, TreeNode::Leaf { .. }))
            .count()
    }
}

/// Quantile-binned view of one feature column
struct BinnedFeature {
    /// Ascending cut points; bin `b` holds `cuts[b-1] < x <= cuts[b]`
    cuts: Vec<f64>,
    bins: Vec<u16>,
}

impl BinnedFeature {
    fn new(values: &[f64], max_bins: usize) -> Self {
        let cuts = quantile_cuts(values, max_bins);
        let bins = values
            .iter()
            .map(|&x| cuts.partition_point(|&c| c < x) as u16)
            .collect();
        Self { cuts, bins }
    }

    fn n_bins(&self) -> usize {
        self.cuts.len() + 1
    }
}

/// Cut points at equal-frequency quantiles. The column maximum is never a cut,
/// so the last bin is never empty.
fn quantile_cuts(values: &[f64], max_bins: usize) -> Vec<f64> {
    let mut sorted: Vec<f64> = values.iter().copied().filter(|v| !v.is_nan()).collect();
    if sorted.is_empty() {
        return Vec::new();
    }
    sorted.sort_by(|a, b| a.total_cmp(b));
    let max = sorted[sorted.len() - 1];

    let mut unique = sorted.clone();
    unique.dedup();

    let mut cuts: Vec<f64> = if unique.len() <= max_bins {
        unique
    } else {
        let n = sorted.len();
        (1..max_bins).map(|k| sorted[k * n / max_bins]).collect()
    };
    cuts.dedup();
    cuts.retain(|&c| c < max);
    cuts
}

#[derive(Debug, Clone, Copy)]
struct SplitCandidate {
    feature: usize,
    bin: usize,
    gain: f64,
}

/// Grows one tree from precomputed gradients
struct TreeBuilder<'a> {
    binned: &'a [BinnedFeature],
    grads: &'a [f64],
    hess: &'a [f64],
    features: &'a [usize],
    config: &'a BoostingConfig,
}

impl TreeBuilder<'_> {
    fn build(&self, rows: Vec<usize>) -> RegressionTree {
        let mut nodes = Vec::new();
        self.grow(&mut nodes, rows, 0);
        RegressionTree { nodes }
    }

    fn grow(&self, nodes: &mut Vec<TreeNode>, rows: Vec<usize>, depth: usize) -> usize {
        let g_sum: f64 = rows.iter().map(|&r| self.grads[r]).sum();
        let h_sum: f64 = rows.iter().map(|&r| self.hess[r]).sum();

        let idx = nodes.len();
        nodes.push(TreeNode::Leaf {
            value: -g_sum / (h_sum + self.config.reg_lambda) * self.config.learning_rate,
        });

        if depth >= self.config.max_depth || rows.len() < 2 {
            return idx;
        }

        let Some(best) = self.best_split(&rows, g_sum, h_sum) else {
            return idx;
        };

        let feature = &self.binned[best.feature];
        let (left_rows, right_rows): (Vec<usize>, Vec<usize>) = rows
            .into_iter()
            .partition(|&r| (feature.bins[r] as usize) <= best.bin);

        let left = self.grow(nodes, left_rows, depth + 1);
        let right = self.grow(nodes, right_rows, depth + 1);
        nodes[idx] = TreeNode::Split {
            feature: best.feature,
            threshold: feature.cuts[best.bin],
            left,
            right,
        };
        idx
    }

    /// Best histogram split across the sampled features
    fn best_split(&self, rows: &[usize], g_sum: f64, h_sum: f64) -> Option<SplitCandidate> {
        let lambda = self.config.reg_lambda;
        let parent_score = g_sum * g_sum / (h_sum + lambda);

        self.features
            .par_iter()
            .filter_map(|&f| {
                let feature = &self.binned[f];
                if feature.cuts.is_empty() {
                    return None;
                }

                let mut hist = vec![(0.0f64, 0.0f64); feature.n_bins()];
                for &r in rows {
                    let slot = &mut hist[feature.bins[r] as usize];
                    slot.0 += self.grads[r];
                    slot.1 += self.hess[r];
                }

                let mut best: Option<SplitCandidate> = None;
                let (mut g_left, mut h_left) = (0.0, 0.0);
                for (bin, &(g, h)) in hist.iter().enumerate().take(feature.cuts.len()) {
                    g_left += g;
                    h_left += h;
                    let g_right = g_sum - g_left;
                    let h_right = h_sum - h_left;
                    if h_left < self.config.min_child_weight
                        || h_right < self.config.min_child_weight
                    {
                        continue;
                    }

                    let gain = g_left * g_left / (h_left + lambda)
                        + g_right * g_right / (h_right + lambda)
                        - parent_score;
                    if gain > MIN_SPLIT_GAIN && best.map_or(true, |b| gain > b.gain) {
                        best = Some(SplitCandidate {
                            feature: f,
                            bin,
                            gain,
                        });
                    }
                }
                best
            })
            .reduce_with(|a, b| if b.gain > a.gain { b } else { a })
    }
}

fn sigmoid(x: f64) -> f64 {
    if x >= 0.0 {
        1.0 / (1.0 + (-x).exp())
    } else {
        let e = x.exp();
        e / (1.0 + e)
    }
}

/// Boosted tree ensemble implementing [`Classifier`]
#[derive(Clone, Serialize, Deserialize)]
pub struct GradientBoostedTrees {
    config: BoostingConfig,
    base_margin: f64,
    n_features: Option<usize>,
    trees: Vec<RegressionTree>,
    #[serde(skip)]
    progress: Option<ProgressBar>,
}

impl std::fmt::Debug for GradientBoostedTrees {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GradientBoostedTrees")
            .field("config", &self.config)
            .field("base_margin", &self.base_margin)
            .field("n_features", &self.n_features)
            .field("trees", &self.trees.len())
            .finish()
    }
}

impl Default for GradientBoostedTrees {
    fn default() -> Self {
        Self::new(BoostingConfig::default())
    }
}

impl GradientBoostedTrees {
    pub fn new(config: BoostingConfig) -> Self {
        Self {
            config,
            base_margin: 0.0,
            n_features: None,
            trees: Vec::new(),
            progress: None,
        }
    }

    /// Advance `progress` by one per boosting round during `fit`
    pub fn with_progress(mut self, progress: ProgressBar) -> Self {
        self.progress = Some(progress);
        self
    }

    pub fn config(&self) -> &BoostingConfig {
        &self.config
    }

    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }

    /// Raw log-odds score for one row
    pub fn margin(&self, row: &[f64]) -> f64 {
        self.base_margin + self.trees.iter().map(|t| t.predict(row)).sum::<f64>()
    }

    fn sample_rows(&self, n: usize, rng: &mut StdRng) -> Vec<usize> {
        if self.config.subsample >= 1.0 {
            return (0..n).collect();
        }
        let rows: Vec<usize> = (0..n)
            .filter(|_| rng.gen::<f64>() < self.config.subsample)
            .collect();
        if rows.is_empty() {
            (0..n).collect()
        } else {
            rows
        }
    }

    fn sample_features(&self, n: usize, rng: &mut StdRng) -> Vec<usize> {
        let mut features: Vec<usize> = (0..n).collect();
        if self.config.colsample_bytree >= 1.0 {
            return features;
        }
        let k = ((n as f64 * self.config.colsample_bytree).round() as usize).clamp(1, n);
        features.shuffle(rng);
        features.truncate(k);
        features.sort_unstable();
        features
    }
}

impl Classifier for GradientBoostedTrees {
    fn fit(&mut self, features: &FeatureMatrix, labels: &[u8]) -> Result<(), ClassifierError> {
        validate_fit_inputs(features, labels)?;

        let n_rows = features.n_rows();
        let n_cols = features.n_cols();
        let max_bins = self.config.max_bins.clamp(2, MAX_BINS);

        let binned: Vec<BinnedFeature> = (0..n_cols)
            .into_par_iter()
            .map(|c| BinnedFeature::new(&features.column(c), max_bins))
            .collect();

        let y: Vec<f64> = labels.iter().map(|&l| f64::from(l)).collect();
        let prior = (y.iter().sum::<f64>() / n_rows as f64).clamp(1e-6, 1.0 - 1e-6);
        self.base_margin = (prior / (1.0 - prior)).ln();
        self.trees.clear();
        self.n_features = Some(n_cols);

        let mut margins = vec![self.base_margin; n_rows];
        let mut grads = vec![0.0; n_rows];
        let mut hess = vec![0.0; n_rows];
        let mut rng = StdRng::seed_from_u64(self.config.seed);

        if let Some(pb) = &self.progress {
            pb.set_length(self.config.n_estimators as u64);
        }

        for _ in 0..self.config.n_estimators {
            for i in 0..n_rows {
                let p = sigmoid(margins[i]);
                grads[i] = p - y[i];
                hess[i] = (p * (1.0 - p)).max(MIN_HESSIAN);
            }

            let rows = self.sample_rows(n_rows, &mut rng);
            let sampled_features = self.sample_features(n_cols, &mut rng);
            let tree = TreeBuilder {
                binned: &binned,
                grads: &grads,
                hess: &hess,
                features: &sampled_features,
                config: &self.config,
            }
            .build(rows);

            margins
                .par_iter_mut()
                .enumerate()
                .for_each(|(i, m)| *m += tree.predict(features.row(i)));
            self.trees.push(tree);

            if let Some(pb) = &self.progress {
                pb.inc(1);
            }
        }

        Ok(())
    }

    fn predict_probability(&self, features: &FeatureMatrix) -> Result<Vec<f64>, ClassifierError> {
        let expected = self.n_features.ok_or(ClassifierError::NotFitted)?;
        if features.n_cols() != expected {
            return Err(ClassifierError::FeatureWidthMismatch {
                expected,
                actual: features.n_cols(),
            });
        }

        Ok((0..features.n_rows())
            .into_par_iter()
            .map(|i| sigmoid(self.margin(features.row(i))))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("f{}", i)).collect()
    }

    /// Positive class iff the first feature exceeds 5
    fn threshold_problem() -> (FeatureMatrix, Vec<u8>) {
        let rows: Vec<Vec<f64>> = (0..200)
            .map(|i| vec![(i % 10) as f64, ((i * 7) % 13) as f64])
            .collect();
        let labels = rows.iter().map(|r| u8::from(r[0] > 5.0)).collect();
        (FeatureMatrix::from_rows(names(2), &rows), labels)
    }

    fn small_config() -> BoostingConfig {
        BoostingConfig {
            n_estimators: 50,
            learning_rate: 0.3,
            max_depth: 3,
            ..BoostingConfig::default()
        }
    }

    #[test]
    fn test_quantile_cuts_exclude_maximum() {
        assert_eq!(quantile_cuts(&[1.0, 2.0, 2.0, 3.0], 256), vec![1.0, 2.0]);
        assert!(quantile_cuts(&[4.0, 4.0], 256).is_empty());
        assert!(quantile_cuts(&(0..1000).map(f64::from).collect::<Vec<_>>(), 16).len() <= 15);
    }

    #[test]
    fn test_binning_respects_thresholds() {
        let feature = BinnedFeature::new(&[1.0, 2.0, 3.0, 2.0], 256);
        assert_eq!(feature.bins, vec![0, 1, 2, 1]);
        assert_eq!(feature.n_bins(), 3);
    }

    #[test]
    fn test_learns_simple_threshold() {
        let (x, y) = threshold_problem();
        let mut model = GradientBoostedTrees::new(small_config());
        model.fit(&x, &y).unwrap();

        let probs = model.predict_probability(&x).unwrap();
        for (p, &label) in probs.iter().zip(&y) {
            if label == 1 {
                assert!(*p > 0.5, "positive row scored {}", p);
            } else {
                assert!(*p < 0.5, "negative row scored {}", p);
            }
        }
        assert_eq!(model.n_trees(), 50);
    }

    #[test]
    fn test_fit_is_deterministic_for_a_seed() {
        let (x, y) = threshold_problem();
        let mut a = GradientBoostedTrees::new(small_config());
        let mut b = GradientBoostedTrees::new(small_config());
        a.fit(&x, &y).unwrap();
        b.fit(&x, &y).unwrap();
        assert_eq!(
            a.predict_probability(&x).unwrap(),
            b.predict_probability(&x).unwrap()
        );
    }

    #[test]
    fn test_predict_rejects_wrong_width() {
        let (x, y) = threshold_problem();
        let mut model = GradientBoostedTrees::new(small_config());
        model.fit(&x, &y).unwrap();

        let narrow = FeatureMatrix::from_rows(names(1), &[vec![1.0]]);
        assert_eq!(
            model.predict_probability(&narrow).unwrap_err(),
            ClassifierError::FeatureWidthMismatch {
                expected: 2,
                actual: 1
            }
        );
    }

    #[test]
    fn test_unfitted_model_refuses_to_predict() {
        let model = GradientBoostedTrees::default();
        let x = FeatureMatrix::from_rows(names(1), &[vec![1.0]]);
        assert_eq!(
            model.predict_probability(&x).unwrap_err(),
            ClassifierError::NotFitted
        );
    }

    #[test]
    fn test_serde_roundtrip_preserves_predictions() {
        let (x, y) = threshold_problem();
        let mut model = GradientBoostedTrees::new(small_config());
        model.fit(&x, &y).unwrap();

        let json = serde_json::to_string(&model).unwrap();
        let restored: GradientBoostedTrees = serde_json::from_str(&json).unwrap();
        assert_eq!(restored.n_trees(), model.n_trees());

        let before = model.predict_probability(&x).unwrap();
        let after = restored.predict_probability(&x).unwrap();
        for (a, b) in before.iter().zip(&after) {
            assert!((a - b).abs() < 1e-9);
        }
    }
}
