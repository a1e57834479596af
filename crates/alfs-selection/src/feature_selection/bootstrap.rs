use ndarray::{Array2, Axis};

use crate::config::{ClassifierKind, WeightingPolicy};
use crate::error::SelectionError;
use crate::metrics::sample_weights;
use crate::models::build_classifier;
use crate::parallel::{argmax_first, evaluate_candidates};

/// Pick the column whose univariate classifier scores best on `(x, y)`.
///
/// Every column is fitted in isolation and scored on the same rows, weighted
/// according to `policy`. Ties go to the lowest column index.
pub fn bootstrap_feature(
    x: &Array2<f64>,
    y: &[usize],
    kind: &ClassifierKind,
    policy: WeightingPolicy,
    num_threads: Option<usize>,
) -> Result<usize, SelectionError> {
    if x.ncols() == 0 {
        return Err(SelectionError::EmptyInput);
    }
    let weights = sample_weights(y, policy);
    let candidates: Vec<usize> = (0..x.ncols()).collect();

    let scores = evaluate_candidates(&candidates, num_threads, |j| -> Result<f64, SelectionError> {
        let column = x.select(Axis(1), &[j]);
        let mut model = build_classifier(kind);
        model.fit(&column, y)?;
        let accuracy = model.score(&column, y, weights.as_deref())?;
        log::trace!("Bootstrap candidate {} accuracy {:.4}", j, accuracy);
        Ok(accuracy)
    })?;

    let best = argmax_first(&scores).ok_or(SelectionError::EmptyInput)?;
    log::debug!(
        "Bootstrap feature {} with accuracy {:.4}",
        best,
        scores[best]
    );
    Ok(best)
}
