use ndarray::{Array1, Array2, Zip};

use crate::config::SparseLinearParams;
use crate::error::SelectionError;
use crate::models::classifier_trait::LinearClassifier;
use crate::models::linear::{check_training_input, ovr_targets, LinearModel};

/// L1-regularised squared-hinge linear classifier, one-vs-rest.
///
/// Minimises `mean(max(0, 1 - t * (w.x + b))^2) + alpha * |w|_1` with
/// proximal gradient steps; the penalty drives uninformative weights to
/// exactly zero. The intercept is not penalised.
pub struct SparseLinearClassifier {
    params: SparseLinearParams,
    model: Option<LinearModel>,
    classes: Vec<usize>,
}

impl SparseLinearClassifier {
    pub fn new(params: SparseLinearParams) -> Self {
        SparseLinearClassifier {
            params,
            model: None,
            classes: Vec::new(),
        }
    }

    fn solve_binary(&self, x: &Array2<f64>, target: &Array1<f64>) -> (Array1<f64>, f64) {
        let n = x.nrows() as f64;
        let bias_sq = if self.params.fit_intercept { 1.0 } else { 0.0 };

        // Upper bound on the Lipschitz constant of the smooth part.
        let lipschitz = 2.0 * x.rows().into_iter().map(|r| r.dot(&r) + bias_sq).sum::<f64>() / n;
        let step = self.params.learning_rate / if lipschitz > 0.0 { lipschitz } else { 1.0 };
        let threshold = step * self.params.alpha;

        let mut w = Array1::<f64>::zeros(x.ncols());
        let mut b = 0.0f64;

        for iter in 0..self.params.max_iter {
            let scores = x.dot(&w) + b;
            let mut coeff = Array1::<f64>::zeros(target.len());
            Zip::from(&mut coeff)
                .and(&scores)
                .and(target)
                .for_each(|c, &s, &t| {
                    let margin = 1.0 - t * s;
                    *c = if margin > 0.0 { -2.0 * margin * t / n } else { 0.0 };
                });

            let grad_w = x.t().dot(&coeff);
            let w_new = (&w - &(grad_w * step)).mapv(|v| soft_threshold(v, threshold));
            let b_new = if self.params.fit_intercept { b - step * coeff.sum() } else { 0.0 };

            let delta = (&w_new - &w)
                .iter()
                .fold((b_new - b).abs(), |acc, d| acc.max(d.abs()));
            w = w_new;
            b = b_new;

            if delta < self.params.tol {
                log::trace!("Proximal gradient converged after {} steps", iter + 1);
                return (w, b);
            }
        }
        log::debug!(
            "Proximal gradient reached max_iter={} without converging",
            self.params.max_iter
        );
        (w, b)
    }
}

fn soft_threshold(v: f64, threshold: f64) -> f64 {
    if v > threshold {
        v - threshold
    } else if v < -threshold {
        v + threshold
    } else {
        0.0
    }
}

impl LinearClassifier for SparseLinearClassifier {
    fn fit(&mut self, x: &Array2<f64>, y: &[usize]) -> Result<(), SelectionError> {
        let classes = check_training_input(x, y)?;
        let problems = ovr_targets(&classes, y);

        let mut coef = Array2::<f64>::zeros((problems.len(), x.ncols()));
        let mut intercept = Array1::<f64>::zeros(problems.len());
        for (k, target) in problems.into_iter().enumerate() {
            let (w, b) = self.solve_binary(x, &Array1::from_vec(target));
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
        "lp"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn penalty_zeroes_noise_feature() {
        // Column 0 separates the classes, column 1 is constant noise.
        let x = Array2::from_shape_vec(
            (6, 2),
            vec![2.0, 0.5, 1.5, 0.5, 1.8, 0.5, -2.0, 0.5, -1.6, 0.5, -1.9, 0.5],
        )
        .unwrap();
        let y = vec![1, 1, 1, 0, 0, 0];
        let params = SparseLinearParams {
            alpha: 0.05,
            ..Default::default()
        };
        let mut clf = SparseLinearClassifier::new(params);
        clf.fit(&x, &y).unwrap();

        let w = clf.weights().unwrap();
        assert_eq!(w.shape(), &[1, 2]);
        assert!(w[(0, 0)] > 0.0);
        assert_eq!(clf.predict(&x).unwrap(), y);
    }

    #[test]
    fn soft_threshold_shrinks_towards_zero() {
        assert_eq!(soft_threshold(0.5, 1.0), 0.0);
        assert_eq!(soft_threshold(-3.0, 1.0), -2.0);
        assert_eq!(soft_threshold(3.0, 1.0), 2.0);
    }
}
