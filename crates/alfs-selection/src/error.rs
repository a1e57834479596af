use std::error::Error;
use std::fmt;

/// Failures raised by the numerical core (classifier fitting, selection).
#[derive(Debug, Clone, PartialEq)]
pub enum SelectionError {
    /// No rows (or no columns) were supplied.
    EmptyInput,
    /// Feature matrix rows and label count disagree.
    ShapeMismatch { rows: usize, labels: usize },
    /// Only one distinct class is present, a linear boundary is undefined.
    SingleClass { class: usize },
    /// The solver produced a non-finite model or otherwise failed.
    FitFailed(String),
    /// `predict`/`weights` called before `fit`.
    NotFitted,
    UnknownSample(String),
    UnknownFeature(String),
    /// A raw class label outside the fitted `LabelEncoding`.
    UnknownLabel(String),
    InvalidConfig(String),
}

impl fmt::Display for SelectionError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            SelectionError::EmptyInput => write!(f, "Input matrix has no rows or no columns"),
            SelectionError::ShapeMismatch { rows, labels } => write!(
                f,
                "Feature matrix has {} rows but {} labels were given",
                rows, labels
            ),
            SelectionError::SingleClass { class } => write!(
                f,
                "Cannot fit a linear classifier on a single class (class id {})",
                class
            ),
            SelectionError::FitFailed(reason) => write!(f, "Classifier fit failed: {}", reason),
            SelectionError::NotFitted => write!(f, "Classifier has not been fitted"),
            SelectionError::UnknownSample(id) => write!(f, "Unknown sample identifier '{}'", id),
            SelectionError::UnknownFeature(id) => write!(f, "Unknown feature identifier '{}'", id),
            SelectionError::UnknownLabel(label) => write!(f, "Unknown class label '{}'", label),
            SelectionError::InvalidConfig(reason) => write!(f, "Invalid configuration: {}", reason),
        }
    }
}

impl Error for SelectionError {}
