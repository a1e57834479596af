use std::collections::BTreeSet;

use crate::error::SelectionError;

/// Mapping from raw class labels to dense ids `0..n_classes`.
///
/// Ids follow the sorted order of the distinct labels, so the same label set
/// always encodes the same way regardless of row order.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct LabelEncoding {
    classes: Vec<String>,
}

impl LabelEncoding {
    pub fn fit<S: AsRef<str>>(labels: &[S]) -> Self {
        let distinct: BTreeSet<&str> = labels.iter().map(|l| l.as_ref()).collect();
        LabelEncoding {
            classes: distinct.into_iter().map(str::to_string).collect(),
        }
    }

    pub fn encode(&self, label: &str) -> Result<usize, SelectionError> {
        self.classes
            .binary_search_by(|c| c.as_str().cmp(label))
            .map_err(|_| SelectionError::UnknownLabel(label.to_string()))
    }

    pub fn encode_all<S: AsRef<str>>(&self, labels: &[S]) -> Result<Vec<usize>, SelectionError> {
        labels.iter().map(|l| self.encode(l.as_ref())).collect()
    }

    pub fn decode(&self, id: usize) -> Option<&str> {
        self.classes.get(id).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }

    pub fn classes(&self) -> &[String] {
        &self.classes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_follow_sorted_labels() {
        let enc = LabelEncoding::fit(&["tumor", "normal", "tumor", "benign"]);
        assert_eq!(enc.classes(), &["benign", "normal", "tumor"]);
        assert_eq!(enc.encode("normal").unwrap(), 1);
        assert_eq!(enc.decode(2), Some("tumor"));
        assert_eq!(enc.decode(3), None);
        assert_eq!(
            enc.encode_all(&["tumor", "benign"]).unwrap(),
            vec![2, 0]
        );
    }

    #[test]
    fn unknown_label_is_an_error() {
        let enc = LabelEncoding::fit(&["a", "b"]);
        assert_eq!(
            enc.encode("c"),
            Err(SelectionError::UnknownLabel("c".to_string()))
        );
    }
}
