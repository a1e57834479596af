use crate::config::ClassifierKind;
use crate::models::classifier_trait::LinearClassifier;
use crate::models::max_margin::MaxMarginClassifier;
use crate::models::sparse::SparseLinearClassifier;

/// Build an unfitted boxed classifier from a `ClassifierKind`.
pub fn build_classifier(kind: &ClassifierKind) -> Box<dyn LinearClassifier> {
    match kind {
        ClassifierKind::MaxMarginLinear(params) => {
            Box::new(MaxMarginClassifier::new(params.clone()))
        }
        ClassifierKind::LinearProgrammingLinear(params) => {
            Box::new(SparseLinearClassifier::new(params.clone()))
        }
    }
}
