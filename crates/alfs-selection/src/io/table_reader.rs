//! Delimited (CSV/TSV) sample table reader.
use std::collections::HashSet;
use std::path::Path;

use anyhow::{anyhow, Context, Result};
use csv::StringRecord;
use ndarray::Array2;
use serde::{Deserialize, Serialize};

use crate::data::TableDataset;

/// Column layout of a delimited sample table: one row per sample.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TableLayout {
    /// Column holding unique sample identifiers.
    pub id_column: String,
    /// Column holding the raw class label. Empty cells mark unlabelled rows.
    pub label_column: String,
    /// Extra non-numeric columns kept as observations (usable by row filters).
    pub observation_columns: Vec<String>,
    /// Optional list of feature columns to load (in order).
    /// When `None`, every other column is treated as a feature.
    pub feature_columns: Option<Vec<String>>,
}

impl Default for TableLayout {
    fn default() -> Self {
        TableLayout {
            id_column: "sample_id".to_string(),
            label_column: "label".to_string(),
            observation_columns: Vec::new(),
            feature_columns: None,
        }
    }
}

impl TableDataset {
    /// Load a table from `path`. Files ending in `.tsv` are tab separated,
    /// anything else is read as comma separated. Empty feature cells read
    /// as 0.
    pub fn from_delimited<P: AsRef<Path>>(path: P, layout: &TableLayout) -> Result<Self> {
        let path = path.as_ref();
        let delimiter = match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("tsv") => b'\t',
            _ => b',',
        };

        let mut reader = csv::ReaderBuilder::new()
            .delimiter(delimiter)
            .has_headers(true)
            .from_path(path)
            .with_context(|| format!("Failed to open sample table: {}", path.display()))?;

        let headers = reader
            .headers()
            .context("Failed to read sample table header row")?
            .clone();

        let id_idx = find_column(&headers, &layout.id_column)
            .ok_or_else(|| anyhow!("Missing id column '{}'", layout.id_column))?;
        let label_idx = find_column(&headers, &layout.label_column)
            .ok_or_else(|| anyhow!("Missing label column '{}'", layout.label_column))?;

        let mut observation_indices = vec![label_idx];
        for name in &layout.observation_columns {
            let idx = find_column(&headers, name)
                .ok_or_else(|| anyhow!("Missing observation column '{}'", name))?;
            if !observation_indices.contains(&idx) {
                observation_indices.push(idx);
            }
        }

        let feature_indices =
            resolve_feature_indices(&headers, layout, id_idx, &observation_indices)?;
        if feature_indices.is_empty() {
            return Err(anyhow!("No feature columns detected in sample table header"));
        }

        let mut sample_ids = Vec::new();
        let mut observations = Vec::new();
        let mut features = Vec::new();

        for (row_idx, result) in reader.records().enumerate() {
            let record = result.with_context(|| format!("Failed to read row {}", row_idx + 1))?;

            let id = record
                .get(id_idx)
                .ok_or_else(|| anyhow!("Missing sample id at row {}", row_idx + 1))?
                .trim();
            sample_ids.push(id.to_string());

            observations.push(
                observation_indices
                    .iter()
                    .map(|&idx| record.get(idx).unwrap_or_default().trim().to_string())
                    .collect::<Vec<String>>(),
            );

            for &idx in &feature_indices {
                let value = record
                    .get(idx)
                    .ok_or_else(|| anyhow!("Missing feature value at row {}", row_idx + 1))?
                    .trim();
                let parsed = if value.is_empty() {
                    0.0
                } else {
                    value.parse::<f64>().with_context(|| {
                        format!(
                            "Invalid feature '{}' at row {}",
                            headers.get(idx).unwrap_or(""),
                            row_idx + 1
                        )
                    })?
                };
                features.push(parsed);
            }
        }

        let x = Array2::from_shape_vec((sample_ids.len(), feature_indices.len()), features)
            .context("Failed to build feature matrix")?;
        let observation_columns = observation_indices
            .iter()
            .map(|&idx| headers.get(idx).unwrap_or("").to_string())
            .collect();
        let feature_ids = feature_indices
            .iter()
            .map(|&idx| headers.get(idx).unwrap_or("").to_string())
            .collect();

        let label_column = headers.get(label_idx).unwrap_or("").to_string();
        let dataset = TableDataset::new(
            sample_ids,
            &label_column,
            observation_columns,
            observations,
            feature_ids,
            x,
        )
        .with_context(|| format!("Invalid sample table: {}", path.display()))?;
        dataset.log_summary();
        Ok(dataset)
    }
}

fn find_column(headers: &StringRecord, name: &str) -> Option<usize> {
    headers
        .iter()
        .position(|header| header.eq_ignore_ascii_case(name))
}

fn resolve_feature_indices(
    headers: &StringRecord,
    layout: &TableLayout,
    id_idx: usize,
    observation_indices: &[usize],
) -> Result<Vec<usize>> {
    if let Some(names) = &layout.feature_columns {
        let mut indices = Vec::with_capacity(names.len());
        for name in names {
            let idx = find_column(headers, name)
                .ok_or_else(|| anyhow!("Missing feature column '{}'", name))?;
            indices.push(idx);
        }
        return Ok(indices);
    }

    let mut ignore: HashSet<usize> = observation_indices.iter().copied().collect();
    ignore.insert(id_idx);

    Ok((0..headers.len()).filter(|idx| !ignore.contains(idx)).collect())
}
