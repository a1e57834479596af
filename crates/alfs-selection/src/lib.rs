//! alfs-selection: active learning of a small, discriminative feature set.
//!
//! The crate alternates between two greedy steps on a labelled
//! sample-by-feature table: draw the training samples a linear classifier
//! currently gets wrong, then add the feature whose inclusion rotates the
//! classifier's decision boundary the most on those samples. The result is an
//! ordered feature list together with the train/test accuracy achieved after
//! each addition.
//!
//! Classifier fitting, sample drawing and feature scoring live in small
//! modules that can be used on their own; `active_loop` ties them together
//! with a dataset reader, a preprocessor and a result sink.
pub mod active_loop;
pub mod config;
pub mod data;
pub mod error;
pub mod feature_selection;
pub mod io;
pub mod metrics;
pub mod models;
pub mod parallel;
pub mod preprocessing;
pub mod sampling;

pub use active_loop::{ActiveLearner, IterationRecord, SelectionOutcome, TrainTestSplit};
pub use config::{ClassifierKind, SelectionConfig, WeightingPolicy};
pub use error::SelectionError;
