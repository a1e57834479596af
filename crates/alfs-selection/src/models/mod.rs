pub mod classifier_trait;
pub mod factory;
pub mod linear;
pub mod max_margin;
pub mod sparse;

pub use classifier_trait::LinearClassifier;
pub use factory::build_classifier;
