//! Feature selection routines.
//!
//! `bootstrap` picks the first feature from univariate fits, `incremental`
//! extends an existing selection by the candidate that rotates the decision
//! boundary the most.
pub mod bootstrap;
pub mod incremental;

pub use bootstrap::bootstrap_feature;
pub use incremental::{angle_score, candidate_scores, pad_weights, select_feature};
