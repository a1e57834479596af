//! Sample weighting and the error/accuracy measures recorded per iteration.

use std::collections::BTreeMap;

use crate::config::WeightingPolicy;

/// Per-sample weights for `labels` under `policy`.
///
/// `InverseClassFrequency` assigns `n / (k * count(class))`, so every class
/// carries the same total weight. `Uniform` returns `None`.
pub fn sample_weights(labels: &[usize], policy: WeightingPolicy) -> Option<Vec<f64>> {
    match policy {
        WeightingPolicy::Uniform => None,
        WeightingPolicy::InverseClassFrequency => {
            let counts = class_counts(labels);
            let n = labels.len() as f64;
            let k = counts.len() as f64;
            Some(
                labels
                    .iter()
                    .map(|label| n / (k * counts[label] as f64))
                    .collect(),
            )
        }
    }
}

/// Number of occurrences of each class id, ordered by class id.
pub fn class_counts(labels: &[usize]) -> BTreeMap<usize, usize> {
    let mut counts = BTreeMap::new();
    for &label in labels {
        *counts.entry(label).or_insert(0) += 1;
    }
    counts
}

/// Weighted mean squared deviation between predicted and true class codes.
pub fn weighted_mse(predicted: &[usize], truth: &[usize], weights: Option<&[f64]>) -> f64 {
    weighted_mean(predicted, truth, weights, |p, t| {
        let d = p as f64 - t as f64;
        d * d
    })
}

/// Weighted fraction of correct predictions.
pub fn weighted_accuracy(predicted: &[usize], truth: &[usize], weights: Option<&[f64]>) -> f64 {
    weighted_mean(predicted, truth, weights, |p, t| if p == t { 1.0 } else { 0.0 })
}

fn weighted_mean<F>(predicted: &[usize], truth: &[usize], weights: Option<&[f64]>, f: F) -> f64
where
    F: Fn(usize, usize) -> f64,
{
    assert_eq!(
        predicted.len(),
        truth.len(),
        "Predictions and labels must have the same length"
    );
    if predicted.is_empty() {
        return 0.0;
    }
    match weights {
        Some(w) => {
            let total: f64 = w.iter().sum();
            if total <= 0.0 {
                return 0.0;
            }
            predicted
                .iter()
                .zip(truth)
                .zip(w)
                .map(|((&p, &t), &wi)| wi * f(p, t))
                .sum::<f64>()
                / total
        }
        None => {
            predicted
                .iter()
                .zip(truth)
                .map(|(&p, &t)| f(p, t))
                .sum::<f64>()
                / predicted.len() as f64
        }
    }
}
