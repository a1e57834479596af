use ndarray::Array2;

use crate::error::SelectionError;
use crate::metrics::weighted_accuracy;

/// Contract shared by the linear classifier families used during selection.
///
/// Labels are dense class ids as produced by `LabelEncoding`. A fitted model
/// exposes one weight row for a two-class problem and one row per class
/// (one-vs-rest) otherwise.
pub trait LinearClassifier: Send {
    /// Fit the model on rows of `x` labelled by `y`.
    fn fit(&mut self, x: &Array2<f64>, y: &[usize]) -> Result<(), SelectionError>;

    /// Predict a class id per row.
    fn predict(&self, x: &Array2<f64>) -> Result<Vec<usize>, SelectionError>;

    /// Weight matrix, shape `(1 | n_classes, n_features)`, intercept excluded.
    fn weights(&self) -> Result<Array2<f64>, SelectionError>;

    /// Class ids seen during `fit`, ascending.
    fn classes(&self) -> &[usize];

    fn name(&self) -> &str {
        "linear"
    }

    /// Accuracy of `predict(x)` against `y`, optionally sample-weighted.
    fn score(
        &self,
        x: &Array2<f64>,
        y: &[usize],
        sample_weights: Option<&[f64]>,
    ) -> Result<f64, SelectionError> {
        if x.nrows() != y.len() {
            return Err(SelectionError::ShapeMismatch {
                rows: x.nrows(),
                labels: y.len(),
            });
        }
        let predicted = self.predict(x)?;
        Ok(weighted_accuracy(&predicted, y, sample_weights))
    }
}
