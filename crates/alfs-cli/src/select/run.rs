use anyhow::{Context, Result};

use alfs_selection::data::TableDataset;
use alfs_selection::io::CsvResultSink;
use alfs_selection::preprocessing::{Identity, LogScaler, Preprocessor};
use alfs_selection::{ActiveLearner, SelectionOutcome};

use crate::select::input::RunConfig;

/// Load the sample table named by `config` and run the selection loop,
/// writing results into `config.output_dir`.
pub fn run_selection(config: &RunConfig) -> Result<SelectionOutcome> {
    let dataset = TableDataset::from_delimited(&config.data, &config.layout)
        .with_context(|| format!("Failed to load sample table: {}", config.data))?;
    let universe = match &config.features {
        Some(features) => features.clone(),
        None => dataset.feature_ids().to_vec(),
    };
    let sink = CsvResultSink::new(&config.output_dir)?;

    log::info!(
        "Selecting {} of {} features with the {} classifier (balance: {})",
        config.selection.num_features,
        universe.len(),
        config.selection.classifier.name(),
        config.selection.balance
    );

    let outcome = if config.log_transform {
        run_with(config, dataset, LogScaler, sink, &universe)?
    } else {
        run_with(config, dataset, Identity, sink, &universe)?
    };

    log::info!("Selected features: {}", outcome.selected_features.join(", "));
    if outcome.stopped_early {
        log::info!(
            "Stopped after {} of {} features",
            outcome.selected_features.len(),
            config.selection.num_features
        );
    }
    Ok(outcome)
}

fn run_with<P: Preprocessor>(
    config: &RunConfig,
    dataset: TableDataset,
    preprocessor: P,
    sink: CsvResultSink,
    universe: &[String],
) -> Result<SelectionOutcome> {
    let mut learner = ActiveLearner::new(config.selection.clone(), dataset, preprocessor, sink);
    learner.run(universe)
}
