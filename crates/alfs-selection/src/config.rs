use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::error::SelectionError;

/// Hyper-parameters of the linear-kernel C-SVM.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct MaxMarginParams {
    /// Inverse regularisation strength.
    pub c: f64,
    /// SMO stopping threshold on the maximal violating pair.
    pub eps: f64,
    pub shrinking: bool,
    /// Scale `c` per side of each binary problem by `n / (2 * count(side))`.
    pub balanced_class_weight: bool,
}

impl Default for MaxMarginParams {
    fn default() -> Self {
        Self {
            c: 1.0,
            eps: 1e-7,
            shrinking: false,
            balanced_class_weight: false,
        }
    }
}

/// Hyper-parameters of the L1-regularised (sparse) linear model.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct SparseLinearParams {
    /// L1 penalty strength.
    pub alpha: f64,
    pub tol: f64,
    pub max_iter: usize,
    /// Fraction of the safe proximal step, in (0, 1].
    pub learning_rate: f64,
    pub fit_intercept: bool,
}

impl Default for SparseLinearParams {
    fn default() -> Self {
        Self {
            alpha: 1e-3,
            tol: 1e-5,
            max_iter: 2000,
            learning_rate: 1.0,
            fit_intercept: true,
        }
    }
}

/// Supported linear classifier families and their hyper-parameters.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub enum ClassifierKind {
    MaxMarginLinear(MaxMarginParams),
    LinearProgrammingLinear(SparseLinearParams),
}

impl Default for ClassifierKind {
    fn default() -> Self {
        ClassifierKind::MaxMarginLinear(MaxMarginParams::default())
    }
}

impl ClassifierKind {
    pub fn name(&self) -> &'static str {
        match self {
            ClassifierKind::MaxMarginLinear(_) => "max-margin",
            ClassifierKind::LinearProgrammingLinear(_) => "lp",
        }
    }

    /// Reject hyper-parameters the solvers cannot work with.
    pub fn validate(&self) -> Result<(), SelectionError> {
        let invalid = |reason: String| Err(SelectionError::InvalidConfig(reason));
        match self {
            ClassifierKind::MaxMarginLinear(p) => {
                if !(p.c > 0.0 && p.c.is_finite()) {
                    return invalid(format!("max-margin c must be positive, got {}", p.c));
                }
                if !(p.eps > 0.0 && p.eps.is_finite()) {
                    return invalid(format!("max-margin eps must be positive, got {}", p.eps));
                }
            }
            ClassifierKind::LinearProgrammingLinear(p) => {
                if !(p.alpha >= 0.0 && p.alpha.is_finite()) {
                    return invalid(format!("lp alpha must be non-negative, got {}", p.alpha));
                }
                if !(p.tol > 0.0 && p.tol.is_finite()) {
                    return invalid(format!("lp tol must be positive, got {}", p.tol));
                }
                if p.max_iter == 0 {
                    return invalid("lp max_iter must be at least 1".to_string());
                }
                if !(p.learning_rate > 0.0 && p.learning_rate <= 1.0) {
                    return invalid(format!(
                        "lp learning_rate must lie in (0, 1], got {}",
                        p.learning_rate
                    ));
                }
            }
        }
        Ok(())
    }

    /// The error/accuracy weighting used when the run does not set one.
    pub fn default_weighting(&self, balance: bool) -> WeightingPolicy {
        match self {
            ClassifierKind::MaxMarginLinear(_) if balance => WeightingPolicy::InverseClassFrequency,
            ClassifierKind::MaxMarginLinear(_) => WeightingPolicy::Uniform,
            ClassifierKind::LinearProgrammingLinear(_) => WeightingPolicy::Uniform,
        }
    }
}

impl FromStr for ClassifierKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "max-margin" | "max_margin" | "svc" | "linear-svc" => {
                Ok(ClassifierKind::MaxMarginLinear(MaxMarginParams::default()))
            }
            "lp" | "sparse" | "linear-programming" => Ok(ClassifierKind::LinearProgrammingLinear(
                SparseLinearParams::default(),
            )),
            _ => Err(format!(
                "Unknown classifier: {}. Valid options are: max-margin, lp",
                s
            )),
        }
    }
}

/// How per-sample weights are derived for error and accuracy computations.
#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum WeightingPolicy {
    Uniform,
    InverseClassFrequency,
}

/// Parameters of one active selection run.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct SelectionConfig {
    /// Total number of features to select, bootstrap feature included.
    pub num_features: usize,
    /// Upper bound on samples drawn per iteration.
    pub num_samples: usize,
    /// Size of the seed draw; falls back to `num_samples`.
    pub init_samples: Option<usize>,
    /// Class-balanced sample draws.
    pub balance: bool,
    pub classifier: ClassifierKind,
    /// Overrides `ClassifierKind::default_weighting`.
    pub weighting: Option<WeightingPolicy>,
    /// Held-out fraction of the labelled pool.
    pub test_fraction: f64,
    pub seed: Option<u64>,
    /// Worker threads for candidate evaluation, `None` uses rayon's default.
    pub num_threads: Option<usize>,
}

impl Default for SelectionConfig {
    fn default() -> Self {
        Self {
            num_features: 10,
            num_samples: 100,
            init_samples: None,
            balance: false,
            classifier: ClassifierKind::default(),
            weighting: None,
            test_fraction: 0.2,
            seed: None,
            num_threads: None,
        }
    }
}

impl SelectionConfig {
    pub fn init_samples(&self) -> usize {
        self.init_samples.unwrap_or(self.num_samples)
    }

    pub fn weighting(&self) -> WeightingPolicy {
        self.weighting
            .unwrap_or_else(|| self.classifier.default_weighting(self.balance))
    }

    pub fn validate(&self) -> Result<(), SelectionError> {
        if self.num_features == 0 {
            return Err(SelectionError::InvalidConfig(
                "num_features must be at least 1".to_string(),
            ));
        }
        if self.num_samples == 0 || self.init_samples() == 0 {
            return Err(SelectionError::InvalidConfig(
                "num_samples and init_samples must be at least 1".to_string(),
            ));
        }
        if !(self.test_fraction > 0.0 && self.test_fraction < 1.0) {
            return Err(SelectionError::InvalidConfig(format!(
                "test_fraction must lie in (0, 1), got {}",
                self.test_fraction
            )));
        }
        if self.num_threads == Some(0) {
            return Err(SelectionError::InvalidConfig(
                "num_threads must be positive".to_string(),
            ));
        }
        self.classifier.validate()
    }
}
