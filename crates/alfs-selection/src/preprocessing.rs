//! Preprocessing applied to every matrix fetched from the dataset.
//!
//! `LogScaler` log-transforms raw abundances and then standardises each
//! column. Scaling statistics are fitted on the matrix being transformed and
//! discarded afterwards, so two calls never share state.

use ndarray::{Array1, Array2, Axis};

/// Stateless matrix transformation applied before fitting.
pub trait Preprocessor: Send + Sync {
    fn transform(&self, x: &Array2<f64>) -> Array2<f64>;
}

/// Simple standard scaler (per-column mean/std).
#[derive(Clone, Debug)]
pub struct Scaler {
    pub mean: Array1<f64>,
    pub std: Array1<f64>,
}

impl Scaler {
    /// Minimum stddev to avoid division by zero when transforming.
    const MIN_STD: f64 = 1e-6;
}

/// Fit a `Scaler` where rows are samples and columns are features.
///
/// An empty matrix yields an empty scaler.
pub fn fit_scaler(x: &Array2<f64>) -> Scaler {
    let ncols = x.ncols();
    if x.nrows() == 0 {
        return Scaler {
            mean: Array1::zeros(ncols),
            std: Array1::from_elem(ncols, 1.0),
        };
    }
    let mean = x.mean_axis(Axis(0)).unwrap_or_else(|| Array1::zeros(ncols));
    let std = x.std_axis(Axis(0), 0.0).mapv(|s| s.max(Scaler::MIN_STD));
    Scaler { mean, std }
}

/// Transform all rows using the provided `Scaler`.
pub fn transform_all(x: &Array2<f64>, sc: &Scaler) -> Array2<f64> {
    (x - &sc.mean) / &sc.std
}

/// `ln(1 + max(x, 0))` followed by per-column standardisation.
///
/// A column that is zero everywhere stays zero: its mean is 0 and its
/// deviation is clamped to `MIN_STD`.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogScaler;

impl Preprocessor for LogScaler {
    fn transform(&self, x: &Array2<f64>) -> Array2<f64> {
        let logged = x.mapv(|v| v.max(0.0).ln_1p());
        let sc = fit_scaler(&logged);
        transform_all(&logged, &sc)
    }
}

/// Passthrough for data that is already normalised.
#[derive(Debug, Clone, Copy, Default)]
pub struct Identity;

impl Preprocessor for Identity {
    fn transform(&self, x: &Array2<f64>) -> Array2<f64> {
        x.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn scaled_columns_have_zero_mean_unit_std() {
        let x = array![[1.0, 10.0], [3.0, 30.0], [5.0, 20.0]];
        let out = transform_all(&x, &fit_scaler(&x));
        for col in out.columns() {
            assert!(col.mean().unwrap().abs() < 1e-12);
            assert!((col.std(0.0) - 1.0).abs() < 1e-12);
        }
    }

    #[test]
    fn log_scaler_keeps_zero_columns_zero() {
        let x = array![[0.0, 4.0], [0.0, -2.0], [0.0, 9.0]];
        let out = LogScaler.transform(&x);
        assert!(out.column(0).iter().all(|&v| v == 0.0));
        // Negative values are clipped to zero before the log.
        assert!(out[(1, 1)] < out[(0, 1)]);
        assert!(out.iter().all(|v| v.is_finite()));
    }

    #[test]
    fn identity_is_passthrough() {
        let x = array![[1.5, -2.0]];
        assert_eq!(Identity.transform(&x), x);
    }
}
