//! Dataset access: the reader contract used by the active loop and an
//! in-memory table implementation.
use std::collections::HashMap;

use anyhow::{anyhow, Result};
use ndarray::Array2;

use crate::error::SelectionError;

/// One observation row as seen by a row filter.
#[derive(Debug, Clone, Copy)]
pub struct ObservationRow<'a> {
    pub sample_id: &'a str,
    columns: &'a [String],
    values: &'a [String],
}

impl<'a> ObservationRow<'a> {
    pub fn get(&self, column: &str) -> Option<&'a str> {
        self.columns
            .iter()
            .position(|c| c == column)
            .map(|i| self.values[i].as_str())
    }
}

/// Observation columns for the rows that passed a filter.
#[derive(Debug, Clone, Default)]
pub struct ObservationTable {
    pub sample_ids: Vec<String>,
    pub columns: Vec<String>,
    /// Row-major, aligned with `sample_ids` and `columns`.
    pub values: Vec<Vec<String>>,
}

impl ObservationTable {
    pub fn len(&self) -> usize {
        self.sample_ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sample_ids.is_empty()
    }

    pub fn column(&self, name: &str) -> Option<Vec<String>> {
        let idx = self.columns.iter().position(|c| c == name)?;
        Some(self.values.iter().map(|row| row[idx].clone()).collect())
    }
}

/// Feature values for a set of samples, rows in request order.
#[derive(Debug, Clone)]
pub struct FeatureMatrix {
    pub matrix: Array2<f64>,
    /// Raw class label of each row.
    pub labels: Vec<String>,
}

/// Read access to a labelled sample-by-feature store.
pub trait DatasetReader {
    /// Observation column holding the raw class label.
    fn label_column(&self) -> &str;

    /// Observation `columns` of every row accepted by `filter`.
    fn read_observations(
        &self,
        filter: &dyn Fn(&ObservationRow<'_>) -> bool,
        columns: &[&str],
    ) -> Result<ObservationTable>;

    /// The `sample_ids` x `feature_ids` block of the store. Row `i` of the
    /// result belongs to `sample_ids[i]`; unknown identifiers are errors.
    fn read_feature_matrix(
        &self,
        sample_ids: &[String],
        feature_ids: &[String],
    ) -> Result<FeatureMatrix>;
}

/// A fully in-memory dataset: observation columns plus a dense feature block.
#[derive(Debug, Clone)]
pub struct TableDataset {
    sample_ids: Vec<String>,
    sample_index: HashMap<String, usize>,
    label_column: String,
    observation_columns: Vec<String>,
    observations: Vec<Vec<String>>,
    feature_ids: Vec<String>,
    feature_index: HashMap<String, usize>,
    features: Array2<f64>,
}

impl TableDataset {
    /// Build a dataset. `observation_columns` must contain `label_column`;
    /// `observations` and `features` rows align with `sample_ids`.
    pub fn new(
        sample_ids: Vec<String>,
        label_column: &str,
        observation_columns: Vec<String>,
        observations: Vec<Vec<String>>,
        feature_ids: Vec<String>,
        features: Array2<f64>,
    ) -> Result<Self> {
        if !observation_columns.iter().any(|c| c == label_column) {
            return Err(anyhow!(
                "Label column '{}' is not among the observation columns",
                label_column
            ));
        }
        if observations.len() != sample_ids.len() || features.nrows() != sample_ids.len() {
            return Err(anyhow!(
                "Row count mismatch: {} sample ids, {} observation rows, {} feature rows",
                sample_ids.len(),
                observations.len(),
                features.nrows()
            ));
        }
        if features.ncols() != feature_ids.len() {
            return Err(anyhow!(
                "Feature matrix has {} columns but {} feature ids were given",
                features.ncols(),
                feature_ids.len()
            ));
        }
        if let Some(row) = observations
            .iter()
            .position(|r| r.len() != observation_columns.len())
        {
            return Err(anyhow!(
                "Observation row {} has the wrong number of columns",
                row
            ));
        }

        let sample_index = index_unique(&sample_ids, "sample")?;
        let feature_index = index_unique(&feature_ids, "feature")?;

        Ok(TableDataset {
            sample_ids,
            sample_index,
            label_column: label_column.to_string(),
            observation_columns,
            observations,
            feature_ids,
            feature_index,
            features,
        })
    }

    pub fn sample_ids(&self) -> &[String] {
        &self.sample_ids
    }

    pub fn feature_ids(&self) -> &[String] {
        &self.feature_ids
    }

    pub fn log_summary(&self) {
        log::info!(
            "Dataset: {} samples, {} features, {} observation columns",
            self.sample_ids.len(),
            self.feature_ids.len(),
            self.observation_columns.len()
        );
    }
}

fn index_unique(ids: &[String], what: &str) -> Result<HashMap<String, usize>> {
    let mut index = HashMap::with_capacity(ids.len());
    for (i, id) in ids.iter().enumerate() {
        if index.insert(id.clone(), i).is_some() {
            return Err(anyhow!("Duplicate {} identifier '{}'", what, id));
        }
    }
    Ok(index)
}

impl DatasetReader for TableDataset {
    fn label_column(&self) -> &str {
        &self.label_column
    }

    fn read_observations(
        &self,
        filter: &dyn Fn(&ObservationRow<'_>) -> bool,
        columns: &[&str],
    ) -> Result<ObservationTable> {
        let positions = columns
            .iter()
            .map(|name| {
                self.observation_columns
                    .iter()
                    .position(|c| c == name)
                    .ok_or_else(|| anyhow!("Unknown observation column '{}'", name))
            })
            .collect::<Result<Vec<usize>>>()?;

        let mut table = ObservationTable {
            columns: columns.iter().map(|c| c.to_string()).collect(),
            ..Default::default()
        };
        for (id, values) in self.sample_ids.iter().zip(&self.observations) {
            let row = ObservationRow {
                sample_id: id,
                columns: &self.observation_columns,
                values,
            };
            if filter(&row) {
                table.sample_ids.push(id.clone());
                table
                    .values
                    .push(positions.iter().map(|&p| values[p].clone()).collect());
            }
        }
        Ok(table)
    }

    fn read_feature_matrix(
        &self,
        sample_ids: &[String],
        feature_ids: &[String],
    ) -> Result<FeatureMatrix> {
        let rows = sample_ids
            .iter()
            .map(|id| {
                self.sample_index
                    .get(id)
                    .copied()
                    .ok_or_else(|| SelectionError::UnknownSample(id.clone()))
            })
            .collect::<Result<Vec<usize>, _>>()?;
        let cols = feature_ids
            .iter()
            .map(|id| {
                self.feature_index
                    .get(id)
                    .copied()
                    .ok_or_else(|| SelectionError::UnknownFeature(id.clone()))
            })
            .collect::<Result<Vec<usize>, _>>()?;

        let label_pos = self
            .observation_columns
            .iter()
            .position(|c| c == &self.label_column)
            .ok_or_else(|| anyhow!("Label column '{}' missing", self.label_column))?;

        let mut matrix = Array2::<f64>::zeros((rows.len(), cols.len()));
        for (i, &r) in rows.iter().enumerate() {
            for (j, &c) in cols.iter().enumerate() {
                matrix[(i, j)] = self.features[(r, c)];
            }
        }
        let labels = rows
            .iter()
            .map(|&r| self.observations[r][label_pos].clone())
            .collect();

        Ok(FeatureMatrix { matrix, labels })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dataset() -> TableDataset {
        TableDataset::new(
            vec!["s1".into(), "s2".into(), "s3".into()],
            "label",
            vec!["label".into(), "tissue".into()],
            vec![
                vec!["a".into(), "lung".into()],
                vec!["b".into(), "liver".into()],
                vec!["a".into(), "lung".into()],
            ],
            vec!["f1".into(), "f2".into()],
            Array2::from_shape_vec((3, 2), vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0]).unwrap(),
        )
        .unwrap()
    }

    #[test]
    fn observations_are_filtered_by_row_predicate() {
        let ds = dataset();
        let table = ds
            .read_observations(&|row| row.get("tissue") == Some("lung"), &["label"])
            .unwrap();
        assert_eq!(table.sample_ids, vec!["s1", "s3"]);
        assert_eq!(table.column("label").unwrap(), vec!["a", "a"]);
        assert!(ds.read_observations(&|_| true, &["missing"]).is_err());
    }

    #[test]
    fn feature_matrix_follows_request_order() {
        let ds = dataset();
        let fm = ds
            .read_feature_matrix(&["s3".to_string(), "s1".to_string()], &["f2".to_string()])
            .unwrap();
        assert_eq!(fm.matrix.shape(), &[2, 1]);
        assert_eq!(fm.matrix[(0, 0)], 6.0);
        assert_eq!(fm.matrix[(1, 0)], 2.0);
        assert_eq!(fm.labels, vec!["a", "a"]);
    }

    #[test]
    fn unknown_identifiers_are_errors() {
        let ds = dataset();
        assert!(ds
            .read_feature_matrix(&["nope".to_string()], &["f1".to_string()])
            .is_err());
        assert!(ds
            .read_feature_matrix(&["s1".to_string()], &["nope".to_string()])
            .is_err());
    }

    #[test]
    fn duplicate_sample_ids_are_rejected() {
        let result = TableDataset::new(
            vec!["s1".into(), "s1".into()],
            "label",
            vec!["label".into()],
            vec![vec!["a".into()], vec!["b".into()]],
            vec!["f1".into()],
            Array2::zeros((2, 1)),
        );
        assert!(result.is_err());
    }
}
