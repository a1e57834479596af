use linfa::traits::Fit;
use linfa::Dataset;
use linfa_svm::{Svm, SvmError, SvmParams};
use ndarray::{Array1, Array2};

use crate::config::MaxMarginParams;
use crate::error::SelectionError;
use crate::models::classifier_trait::LinearClassifier;
use crate::models::linear::{check_training_input, ovr_targets, LinearModel};

/// Linear-kernel C-SVM, one-vs-rest, backed by `linfa_svm::Svm`.
///
/// The decision function of a linear-kernel SVM is `weighted_sum(x) - rho`,
/// so the primal weight of column `j` is `weighted_sum(e_j)` and the
/// intercept is `-rho`.
pub struct MaxMarginClassifier {
    params: MaxMarginParams,
    model: Option<LinearModel>,
    classes: Vec<usize>,
}

impl MaxMarginClassifier {
    pub fn new(params: MaxMarginParams) -> Self {
        MaxMarginClassifier {
            params,
            model: None,
            classes: Vec::new(),
        }
    }

    /// `(C+, C-)` for one binary problem.
    fn pos_neg_costs(&self, target: &[bool]) -> (f64, f64) {
        let c = self.params.c;
        if !self.params.balanced_class_weight {
            return (c, c);
        }
        let n = target.len() as f64;
        let n_pos = target.iter().filter(|&&t| t).count() as f64;
        let n_neg = n - n_pos;
        (c * n / (2.0 * n_pos), c * n / (2.0 * n_neg))
    }

    fn solve_binary(
        &self,
        x: &Array2<f64>,
        target: Vec<bool>,
    ) -> Result<(Array1<f64>, f64), SelectionError> {
        let (c_pos, c_neg) = self.pos_neg_costs(&target);
        let params: SvmParams<f64, bool> = Svm::<f64, bool>::params()
            .eps(self.params.eps)
            .shrinking(self.params.shrinking)
            .pos_neg_weights(c_pos, c_neg)
            .linear_kernel();

        let dataset = Dataset::new(x.to_owned(), Array1::from_vec(target));
        let svm = <SvmParams<f64, bool> as Fit<_, _, SvmError>>::fit(&params, &dataset)
            .map_err(|e| SelectionError::FitFailed(e.to_string()))?;
        log::trace!("{}", svm);

        let n_cols = x.ncols();
        let mut basis = Array1::<f64>::zeros(n_cols);
        let mut w = Array1::<f64>::zeros(n_cols);
        for j in 0..n_cols {
            basis[j] = 1.0;
            w[j] = svm.weighted_sum(&basis);
            basis[j] = 0.0;
        }
        Ok((w, -svm.rho))
    }
}

impl LinearClassifier for MaxMarginClassifier {
    fn fit(&mut self, x: &Array2<f64>, y: &[usize]) -> Result<(), SelectionError> {
        let classes = check_training_input(x, y)?;
        let problems = ovr_targets(&classes, y);

        let mut coef = Array2::<f64>::zeros((problems.len(), x.ncols()));
        let mut intercept = Array1::<f64>::zeros(problems.len());
        for (k, target) in problems.iter().enumerate() {
            let target = target.iter().map(|&t| t > 0.0).collect();
            let (w, b) = self.solve_binary(x, target)?;
            coef.row_mut(k).assign(&w);
            intercept[k] = b;
        }

        let model = LinearModel {
            classes: classes.clone(),
            coef,
            intercept,
        };
        model.ensure_finite()?;
        self.classes = classes;
        self.model = Some(model);
        Ok(())
    }

    fn predict(&self, x: &Array2<f64>) -> Result<Vec<usize>, SelectionError> {
        self.model.as_ref().ok_or(SelectionError::NotFitted)?.predict(x)
    }

    fn weights(&self) -> Result<Array2<f64>, SelectionError> {
        Ok(self.model.as_ref().ok_or(SelectionError::NotFitted)?.coef.clone())
    }

    fn classes(&self) -> &[usize] {
        &self.classes
    }

    fn name(&self) -> &str {
        "max-margin"
    }
}
