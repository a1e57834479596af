use anyhow::{Context, Result};
use clap::ArgMatches;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

use alfs_selection::config::{ClassifierKind, SelectionConfig};
use alfs_selection::io::TableLayout;

use crate::util::validate_tsv_or_csv_file;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    /// Sample table, `.tsv` or `.csv`.
    pub data: String,
    pub layout: TableLayout,
    /// Candidate features; every feature column when absent.
    pub features: Option<Vec<String>>,
    pub output_dir: String,
    pub selection: SelectionConfig,
    /// Apply `ln(1 + x)` before standardising. Disable for data that is
    /// already normalised.
    pub log_transform: bool,
}

impl Default for RunConfig {
    fn default() -> Self {
        RunConfig {
            data: String::new(),
            layout: TableLayout::default(),
            features: None,
            output_dir: String::from("alfs_output"),
            selection: SelectionConfig::default(),
            log_transform: true,
        }
    }
}

impl RunConfig {
    pub fn from_arguments(config_path: &PathBuf, matches: &ArgMatches) -> Result<Self> {
        let config_json = fs::read_to_string(config_path)
            .with_context(|| format!("Failed to read config file: {:?}", config_path))?;

        let mut config: RunConfig = serde_json::from_str(&config_json)
            .with_context(|| format!("Failed to parse config file: {:?}", config_path))?;

        // Apply CLI overrides
        if let Some(data) = matches.get_one::<String>("data") {
            validate_tsv_or_csv_file(data)?;
            config.data = data.clone();
        } else {
            validate_tsv_or_csv_file(&config.data)?;
        }

        if let Some(output_dir) = matches.get_one::<String>("output_dir") {
            config.output_dir = output_dir.clone();
        }

        if let Some(name) = matches.get_one::<String>("classifier") {
            let kind: ClassifierKind = name.parse().map_err(anyhow::Error::msg)?;
            // Keep tuned hyper-parameters when the family does not change.
            if kind.name() != config.selection.classifier.name() {
                config.selection.classifier = kind;
            }
        }

        if matches.get_flag("balance") {
            config.selection.balance = true;
        }

        if let Some(&seed) = matches.get_one::<u64>("seed") {
            config.selection.seed = Some(seed);
        }

        if let Some(&threads) = matches.get_one::<usize>("threads") {
            config.selection.num_threads = Some(threads);
        }

        config.selection.validate()?;
        Ok(config)
    }
}
