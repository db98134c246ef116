//! Chronological train/test split and training-only correlation screening.
//!
//! Weeks are never shuffled: the test partition is always the most recent
//! weeks, and correlations are computed from the training partition alone so
//! that nothing about the held-out weeks leaks into the analysis.

use std::collections::BTreeMap;

use crate::features::{Feature, FeatureRow};

#[derive(Debug, Clone)]
pub struct TrainTestSplit<'a> {
    pub train: &'a [FeatureRow],
    pub test: &'a [FeatureRow],
    pub train_correlations: BTreeMap<String, f64>,
}

/// Number of leading weeks used for training: `floor(n * (1 - test_size))`,
/// kept at one or more whenever there is data and at most `n - 1` once there
/// are two weeks, so the test partition is never empty.
pub fn train_size(n: usize, test_size: f64) -> usize {
    let size = (n as f64 * (1.0 - test_size)).floor() as usize;
    let min = n.min(1);
    size.clamp(min, n.saturating_sub(1).max(min))
}

pub fn split_train_test(rows: &[FeatureRow], test_size: f64) -> TrainTestSplit<'_> {
    let (train, test) = rows.split_at(train_size(rows.len(), test_size));
    let train_correlations = correlations(train);
    tracing::info!(
        "Chronological split: {} training weeks, {} test weeks",
        train.len(),
        test.len()
    );
    TrainTestSplit {
        train,
        test,
        train_correlations,
    }
}

/// Pearson correlation of each screened feature with weekly payments over `rows`.
pub fn correlations(rows: &[FeatureRow]) -> BTreeMap<String, f64> {
    let payments: Vec<f64> = rows.iter().map(FeatureRow::total_payments).collect();
    Feature::CORRELATED
        .iter()
        .map(|feature| {
            let values: Vec<f64> = rows.iter().map(|row| feature.value(row)).collect();
            (feature.name().to_string(), pearson(&values, &payments))
        })
        .collect()
}

/// Pearson's r; 0 when either series has no variance or the inputs are empty.
pub fn pearson(xs: &[f64], ys: &[f64]) -> f64 {
    let n = xs.len().min(ys.len());
    if n == 0 {
        return 0.0;
    }
    let (mut sx, mut sy, mut sxy, mut sxx, mut syy) = (0.0, 0.0, 0.0, 0.0, 0.0);
    for (x, y) in xs.iter().zip(ys).take(n) {
        sx += x;
        sy += y;
        sxy += x * y;
        sxx += x * x;
        syy += y * y;
    }
    let n = n as f64;
    let numerator = n * sxy - sx * sy;
    let denominator = ((n * sxx - sx * sx) * (n * syy - sy * sy)).sqrt();
    if denominator == 0.0 || !denominator.is_finite() {
        return 0.0;
    }
    (numerator / denominator).clamp(-1.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pearson_of_linear_series() {
        let xs = [1.0, 2.0, 3.0, 4.0];
        let ys = [2.0, 4.0, 6.0, 8.0];
        assert!((pearson(&xs, &ys) - 1.0).abs() < 1e-12);
        let inverse = [8.0, 6.0, 4.0, 2.0];
        assert!((pearson(&xs, &inverse) + 1.0).abs() < 1e-12);
    }

    #[test]
    fn pearson_without_variance_is_zero() {
        assert_eq!(pearson(&[3.0, 3.0, 3.0], &[1.0, 2.0, 3.0]), 0.0);
        assert_eq!(pearson(&[], &[]), 0.0);
    }

    #[test]
    fn train_size_floors_and_keeps_one_week() {
        assert_eq!(train_size(10, 0.2), 8);
        assert_eq!(train_size(7, 0.2), 5);
        assert_eq!(train_size(5, 0.2), 4);
        assert_eq!(train_size(2, 0.9), 1);
        assert_eq!(train_size(0, 0.2), 0);
        assert_eq!(train_size(1, 0.2), 1);
    }

    #[test]
    fn tiny_test_fraction_still_holds_out_a_week() {
        assert_eq!(train_size(10, 1e-17), 9);
        assert_eq!(train_size(2, 1e-17), 1);
    }
}
