//! One-vs-rest linear decision functions shared by the classifier families.

use ndarray::{Array1, Array2};

use crate::error::SelectionError;
use crate::metrics::class_counts;

/// Fitted coefficients of a one-vs-rest linear model.
#[derive(Debug, Clone)]
pub struct LinearModel {
    pub classes: Vec<usize>,
    /// `(1, n_features)` for two classes, `(n_classes, n_features)` otherwise.
    pub coef: Array2<f64>,
    pub intercept: Array1<f64>,
}

impl LinearModel {
    pub fn decision_function(&self, x: &Array2<f64>) -> Result<Array2<f64>, SelectionError> {
        if x.ncols() != self.coef.ncols() {
            return Err(SelectionError::FitFailed(format!(
                "model was fitted on {} features but input has {}",
                self.coef.ncols(),
                x.ncols()
            )));
        }
        Ok(x.dot(&self.coef.t()) + &self.intercept)
    }

    pub fn predict(&self, x: &Array2<f64>) -> Result<Vec<usize>, SelectionError> {
        let scores = self.decision_function(x)?;
        if self.coef.nrows() == 1 {
            return Ok(scores
                .column(0)
                .iter()
                .map(|&s| if s > 0.0 { self.classes[1] } else { self.classes[0] })
                .collect());
        }
        Ok(scores
            .rows()
            .into_iter()
            .map(|row| {
                let mut best = 0;
                for (k, &s) in row.iter().enumerate() {
                    if s > row[best] {
                        best = k;
                    }
                }
                self.classes[best]
            })
            .collect())
    }

    pub fn ensure_finite(&self) -> Result<(), SelectionError> {
        if self.coef.iter().chain(self.intercept.iter()).all(|v| v.is_finite()) {
            Ok(())
        } else {
            Err(SelectionError::FitFailed(
                "solver produced non-finite coefficients".to_string(),
            ))
        }
    }
}

/// Validate training input and return the sorted distinct classes.
pub fn check_training_input(x: &Array2<f64>, y: &[usize]) -> Result<Vec<usize>, SelectionError> {
    if x.nrows() == 0 || x.ncols() == 0 {
        return Err(SelectionError::EmptyInput);
    }
    if x.nrows() != y.len() {
        return Err(SelectionError::ShapeMismatch {
            rows: x.nrows(),
            labels: y.len(),
        });
    }
    if x.iter().any(|v| !v.is_finite()) {
        return Err(SelectionError::FitFailed(
            "input matrix contains non-finite values".to_string(),
        ));
    }
    let classes: Vec<usize> = class_counts(y).into_keys().collect();
    if classes.len() < 2 {
        return Err(SelectionError::SingleClass { class: classes[0] });
    }
    Ok(classes)
}

/// The binary sub-problems of a one-vs-rest fit: for each output row, the
/// positive class. Two classes collapse into a single problem whose positive
/// class is the larger id.
pub fn ovr_targets(classes: &[usize], y: &[usize]) -> Vec<Vec<f64>> {
    let positives: Vec<usize> = if classes.len() == 2 {
        vec![classes[1]]
    } else {
        classes.to_vec()
    };
    positives
        .into_iter()
        .map(|pos| y.iter().map(|&l| if l == pos { 1.0 } else { -1.0 }).collect())
        .collect()
}
