//! Active feature and sample selection loop.
//!
//! A run partitions the labelled samples into a train and a test pool,
//! seeds a sample subset, picks a bootstrap feature on it and then alternates
//! between drawing samples the current model misclassifies and picking the
//! feature that rotates the model's boundary the most on those samples.

use std::collections::{BTreeSet, HashSet};
use std::time::Instant;

use anyhow::{anyhow, Result};
use ndarray::Array2;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

use crate::config::SelectionConfig;
use crate::data::{DatasetReader, LabelEncoding};
use crate::error::SelectionError;
use crate::feature_selection::{bootstrap_feature, select_feature};
use crate::io::ResultSink;
use crate::metrics::{class_counts, sample_weights, weighted_mse};
use crate::models::{build_classifier, LinearClassifier};
use crate::preprocessing::Preprocessor;
use crate::sampling::{draw_seed_samples, select_samples};

/// Metrics of the model built on the selected features at one iteration.
#[derive(Debug, Clone, PartialEq)]
pub struct IterationRecord {
    /// Identifier of the most recently selected feature.
    pub feature: String,
    pub train_accuracy: f64,
    pub test_accuracy: f64,
    pub train_error: f64,
    pub test_error: f64,
    /// Size of the accumulated sample set after this iteration.
    pub num_samples: usize,
}

/// Shuffled partition of the labelled samples. The first `n_test` entries of
/// `shuffle_index` form the test pool, the rest the train pool.
#[derive(Debug, Clone, PartialEq)]
pub struct TrainTestSplit {
    /// Labelled sample ids in dataset order.
    pub sample_ids: Vec<String>,
    /// Permutation of `0..sample_ids.len()`.
    pub shuffle_index: Vec<usize>,
    pub n_test: usize,
}

impl TrainTestSplit {
    /// Shuffle `sample_ids` and hold out `ceil(test_fraction * n)` of them,
    /// keeping at least one sample on each side.
    pub fn new(sample_ids: Vec<String>, test_fraction: f64, rng: &mut StdRng) -> Result<Self> {
        let n = sample_ids.len();
        if n < 2 {
            return Err(anyhow!(
                "Need at least 2 labelled samples for a train/test split, found {}",
                n
            ));
        }
        let mut shuffle_index: Vec<usize> = (0..n).collect();
        shuffle_index.shuffle(rng);
        let n_test = ((test_fraction * n as f64).ceil() as usize).clamp(1, n - 1);
        Ok(TrainTestSplit {
            sample_ids,
            shuffle_index,
            n_test,
        })
    }

    pub fn test_ids(&self) -> Vec<String> {
        self.ids(&self.shuffle_index[..self.n_test])
    }

    pub fn train_ids(&self) -> Vec<String> {
        self.ids(&self.shuffle_index[self.n_test..])
    }

    fn ids(&self, positions: &[usize]) -> Vec<String> {
        positions
            .iter()
            .map(|&i| self.sample_ids[i].clone())
            .collect()
    }
}

/// Mutable state threaded through the iterations of a run.
#[derive(Debug, Clone)]
pub struct LoopState {
    rng: StdRng,
    /// Selected features as indices into the universe, in selection order.
    selected: Vec<usize>,
    /// Positions in the train pool drawn so far.
    accumulated: BTreeSet<usize>,
    records: Vec<IterationRecord>,
}

impl LoopState {
    pub fn selected(&self) -> &[usize] {
        &self.selected
    }

    pub fn accumulated(&self) -> &BTreeSet<usize> {
        &self.accumulated
    }

    pub fn records(&self) -> &[IterationRecord] {
        &self.records
    }
}

/// Result of one `ActiveLearner::step`.
#[derive(Debug)]
pub enum StepOutcome {
    /// A new feature was selected.
    Continue(LoopState),
    /// No informative samples remain; the state is final.
    Finished(LoopState),
}

/// Everything a completed run reports.
#[derive(Debug, Clone, PartialEq)]
pub struct SelectionOutcome {
    pub selected_features: Vec<String>,
    pub sample_counts: Vec<usize>,
    pub train_errors: Vec<f64>,
    pub test_errors: Vec<f64>,
    pub train_accuracies: Vec<f64>,
    pub test_accuracies: Vec<f64>,
    pub test_ids: Vec<String>,
    pub records: Vec<IterationRecord>,
    /// The loop ended before `num_features` features were selected.
    pub stopped_early: bool,
}

impl SelectionOutcome {
    fn from_records(
        records: Vec<IterationRecord>,
        test_ids: Vec<String>,
        stopped_early: bool,
    ) -> Self {
        SelectionOutcome {
            selected_features: records.iter().map(|r| r.feature.clone()).collect(),
            sample_counts: records.iter().map(|r| r.num_samples).collect(),
            train_errors: records.iter().map(|r| r.train_error).collect(),
            test_errors: records.iter().map(|r| r.test_error).collect(),
            train_accuracies: records.iter().map(|r| r.train_accuracy).collect(),
            test_accuracies: records.iter().map(|r| r.test_accuracy).collect(),
            test_ids,
            records,
            stopped_early,
        }
    }
}

/// Fixed inputs of a run, built once during initialisation.
struct Pools {
    universe: Vec<String>,
    train_ids: Vec<String>,
    /// Encoded labels aligned with `train_ids`.
    train_labels: Vec<usize>,
    test_ids: Vec<String>,
    encoding: LabelEncoding,
}

impl Pools {
    fn feature_ids(&self, selected: &[usize]) -> Vec<String> {
        selected.iter().map(|&i| self.universe[i].clone()).collect()
    }
}

/// Drives a selection run against a dataset, writing its audit trail to a
/// `ResultSink` as it goes.
pub struct ActiveLearner<D, P, S> {
    config: SelectionConfig,
    reader: D,
    preprocessor: P,
    sink: S,
}

impl<D, P, S> ActiveLearner<D, P, S>
where
    D: DatasetReader,
    P: Preprocessor,
    S: ResultSink,
{
    pub fn new(config: SelectionConfig, reader: D, preprocessor: P, sink: S) -> Self {
        ActiveLearner {
            config,
            reader,
            preprocessor,
            sink,
        }
    }

    pub fn config(&self) -> &SelectionConfig {
        &self.config
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    /// Select up to `num_features` features from `universe`.
    pub fn run(&mut self, universe: &[String]) -> Result<SelectionOutcome> {
        let start = Instant::now();
        self.config.validate()?;
        check_universe(universe)?;

        let mut rng = match self.config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let pools = self.init(universe, &mut rng)?;

        let target = if self.config.num_features > universe.len() {
            log::warn!(
                "Requested {} features but the universe only has {}",
                self.config.num_features,
                universe.len()
            );
            universe.len()
        } else {
            self.config.num_features
        };

        let mut state = self.bootstrap(&pools, rng)?;
        let mut stopped_early = false;
        while state.selected.len() < target {
            match self.step(&pools, state)? {
                StepOutcome::Continue(next) => state = next,
                StepOutcome::Finished(last) => {
                    state = last;
                    stopped_early = true;
                    break;
                }
            }
        }
        if !stopped_early {
            state = self.finalize(&pools, state)?;
        }

        let elapsed = start.elapsed();
        self.sink.write_elapsed(elapsed)?;
        log::info!(
            "Selected {} features in {:.2}s",
            state.selected.len(),
            elapsed.as_secs_f64()
        );

        Ok(SelectionOutcome::from_records(
            state.records,
            pools.test_ids,
            stopped_early,
        ))
    }

    /// Partition the labelled samples and fit the label encoding.
    fn init(&mut self, universe: &[String], rng: &mut StdRng) -> Result<Pools> {
        let label_column = self.reader.label_column().to_string();
        let labelled = self.reader.read_observations(
            &|row| row.get(&label_column).map_or(false, |l| !l.trim().is_empty()),
            &[label_column.as_str()],
        )?;
        let labels = labelled
            .column(&label_column)
            .ok_or_else(|| anyhow!("Label column '{}' missing from observations", label_column))?;
        let encoding = LabelEncoding::fit(&labels);
        if encoding.len() < 2 {
            return Err(anyhow!(
                "Need at least 2 classes in '{}', found {}",
                label_column,
                encoding.len()
            ));
        }

        let encoded = encoding.encode_all(&labels)?;
        let split = TrainTestSplit::new(labelled.sample_ids, self.config.test_fraction, rng)?;
        self.sink.write_split(&split)?;

        log::info!(
            "{} labelled samples in {} classes: {} train, {} test",
            split.sample_ids.len(),
            encoding.len(),
            split.sample_ids.len() - split.n_test,
            split.n_test
        );

        Ok(Pools {
            universe: universe.to_vec(),
            train_ids: split.train_ids(),
            train_labels: split.shuffle_index[split.n_test..]
                .iter()
                .map(|&i| encoded[i])
                .collect(),
            test_ids: split.test_ids(),
            encoding,
        })
    }

    /// Draw the seed samples and pick the first feature on them.
    fn bootstrap(&mut self, pools: &Pools, mut rng: StdRng) -> Result<LoopState> {
        let seeds = draw_seed_samples(
            &pools.train_labels,
            self.config.init_samples(),
            self.config.balance,
            &mut rng,
        );
        let seed_labels: Vec<usize> = seeds.iter().map(|&i| pools.train_labels[i]).collect();
        log::debug!("Seed class counts: {:?}", class_counts(&seed_labels));

        let seed_ids: Vec<String> = seeds.iter().map(|&i| pools.train_ids[i].clone()).collect();
        let (x, y) = self.fetch(&seed_ids, &pools.universe, &pools.encoding)?;
        let first = bootstrap_feature(
            &x,
            &y,
            &self.config.classifier,
            self.config.weighting(),
            self.config.num_threads,
        )?;
        log::info!(
            "Bootstrap feature {} from {} seed samples",
            pools.universe[first],
            seeds.len()
        );

        Ok(LoopState {
            rng,
            selected: vec![first],
            accumulated: seeds.into_iter().collect(),
            records: Vec::new(),
        })
    }

    /// One iteration: draw misclassified samples with the current features,
    /// record the model's metrics and pick the next feature on the drawn
    /// samples. Appends exactly one record.
    fn step(&mut self, pools: &Pools, mut state: LoopState) -> Result<StepOutcome> {
        let iteration = state.records.len() + 1;
        let feature_ids = pools.feature_ids(&state.selected);
        let (train_x, train_y) = self.fetch(&pools.train_ids, &feature_ids, &pools.encoding)?;
        let (test_x, test_y) = self.fetch(&pools.test_ids, &feature_ids, &pools.encoding)?;

        let selection = select_samples(
            &train_x,
            &train_y,
            self.config.num_samples,
            self.config.balance,
            &self.config.classifier,
            &mut state.rng,
        )?;

        let previous = state.accumulated.len();
        let union_size = previous
            + selection
                .indices
                .iter()
                .filter(|&&i| !state.accumulated.contains(&i))
                .count();

        let mut record = self.evaluate(
            selection.model.as_ref(),
            (&train_x, &train_y[..]),
            (&test_x, &test_y[..]),
            feature_ids.last().cloned().unwrap_or_default(),
            union_size,
        )?;

        let subset = if selection.indices.is_empty() {
            log::info!(
                "Iteration {}: no misclassified training samples left, stopping",
                iteration
            );
            None
        } else {
            let subset_ids: Vec<String> = selection
                .indices
                .iter()
                .map(|&i| pools.train_ids[i].clone())
                .collect();
            let (x, y) = self.fetch(&subset_ids, &pools.universe, &pools.encoding)?;
            if self.config.balance && class_counts(&y).len() < 2 {
                log::info!(
                    "Iteration {}: drawn samples all belong to one class, stopping",
                    iteration
                );
                None
            } else {
                Some((x, y))
            }
        };

        let (x, y) = match subset {
            Some(subset) => subset,
            None => {
                record.num_samples = previous;
                state.records.push(record);
                self.sink.write_history(&state.records)?;
                return Ok(StepOutcome::Finished(state));
            }
        };

        state.accumulated.extend(selection.indices.iter().copied());
        state.records.push(record);
        self.sink.write_history(&state.records)?;

        let next = select_feature(
            &x,
            &y,
            &state.selected,
            &self.config.classifier,
            self.config.num_threads,
        )?;
        state.selected.push(next);

        if let Some(last) = state.records.last() {
            log::info!(
                "Iteration {}: train acc {:.4}, test acc {:.4}, {} samples; next feature {}",
                iteration,
                last.train_accuracy,
                last.test_accuracy,
                last.num_samples,
                pools.universe[next]
            );
        }
        Ok(StepOutcome::Continue(state))
    }

    /// Fit one last model on the full train pool with every selected feature.
    fn finalize(&mut self, pools: &Pools, mut state: LoopState) -> Result<LoopState> {
        let feature_ids = pools.feature_ids(&state.selected);
        let (train_x, train_y) = self.fetch(&pools.train_ids, &feature_ids, &pools.encoding)?;
        let (test_x, test_y) = self.fetch(&pools.test_ids, &feature_ids, &pools.encoding)?;

        let mut model = build_classifier(&self.config.classifier);
        model.fit(&train_x, &train_y)?;
        let record = self.evaluate(
            model.as_ref(),
            (&train_x, &train_y[..]),
            (&test_x, &test_y[..]),
            feature_ids.last().cloned().unwrap_or_default(),
            state.accumulated.len(),
        )?;
        log::info!(
            "Final model on {} features: train acc {:.4}, test acc {:.4}",
            feature_ids.len(),
            record.train_accuracy,
            record.test_accuracy
        );
        state.records.push(record);
        self.sink.write_history(&state.records)?;
        Ok(state)
    }

    fn evaluate(
        &self,
        model: &dyn LinearClassifier,
        train: (&Array2<f64>, &[usize]),
        test: (&Array2<f64>, &[usize]),
        feature: String,
        num_samples: usize,
    ) -> Result<IterationRecord, SelectionError> {
        let policy = self.config.weighting();
        let (train_x, train_y) = train;
        let (test_x, test_y) = test;

        let train_w = sample_weights(train_y, policy);
        let test_w = sample_weights(test_y, policy);
        let train_pred = model.predict(train_x)?;
        let test_pred = model.predict(test_x)?;

        Ok(IterationRecord {
            feature,
            train_accuracy: model.score(train_x, train_y, train_w.as_deref())?,
            test_accuracy: model.score(test_x, test_y, test_w.as_deref())?,
            train_error: weighted_mse(&train_pred, train_y, train_w.as_deref()),
            test_error: weighted_mse(&test_pred, test_y, test_w.as_deref()),
            num_samples,
        })
    }

    /// Read and preprocess `sample_ids` x `feature_ids`, encoding the labels.
    fn fetch(
        &self,
        sample_ids: &[String],
        feature_ids: &[String],
        encoding: &LabelEncoding,
    ) -> Result<(Array2<f64>, Vec<usize>)> {
        let fm = self.reader.read_feature_matrix(sample_ids, feature_ids)?;
        let y = encoding.encode_all(&fm.labels)?;
        Ok((self.preprocessor.transform(&fm.matrix), y))
    }
}

fn check_universe(universe: &[String]) -> Result<()> {
    if universe.is_empty() {
        return Err(SelectionError::EmptyInput.into());
    }
    let mut seen = HashSet::with_capacity(universe.len());
    for id in universe {
        if !seen.insert(id.as_str()) {
            return Err(anyhow!("Feature '{}' appears twice in the universe", id));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::TableDataset;
    use crate::io::CsvResultSink;
    use crate::preprocessing::Identity;
    use rand::Rng;

    fn dataset(n: usize, rng: &mut StdRng) -> TableDataset {
        let ids: Vec<String> = (0..n).map(|i| format!("s{}", i)).collect();
        let mut values = Vec::with_capacity(n * 3);
        let mut observations = Vec::with_capacity(n);
        for i in 0..n {
            let class = i % 2;
            let signal = if class == 1 { 1.0 } else { -1.0 };
            values.push(signal + rng.gen_range(-1.5..1.5));
            values.push(rng.gen_range(-1.0..1.0));
            values.push(0.0);
            // Every tenth sample is unlabelled.
            let label = if i % 10 == 9 { String::new() } else { format!("c{}", class) };
            observations.push(vec![label]);
        }
        TableDataset::new(
            ids,
            "label",
            vec!["label".to_string()],
            observations,
            vec!["f0".into(), "f1".into(), "zero".into()],
            Array2::from_shape_vec((n, 3), values).unwrap(),
        )
        .unwrap()
    }

    #[test]
    fn split_sizes_and_disjointness() {
        let mut rng = StdRng::seed_from_u64(5);
        let ids: Vec<String> = (0..10).map(|i| i.to_string()).collect();
        let split = TrainTestSplit::new(ids, 0.25, &mut rng).unwrap();
        assert_eq!(split.n_test, 3);
        let test = split.test_ids();
        let train = split.train_ids();
        assert_eq!(test.len() + train.len(), 10);
        assert!(test.iter().all(|id| !train.contains(id)));

        assert!(TrainTestSplit::new(vec!["a".into()], 0.5, &mut rng).is_err());
    }

    #[test]
    fn run_skips_unlabelled_rows_and_records_every_feature() {
        let mut rng = StdRng::seed_from_u64(21);
        let ds = dataset(60, &mut rng);
        let universe = ds.feature_ids().to_vec();
        let dir = tempfile::tempdir().unwrap();
        let config = SelectionConfig {
            num_features: 2,
            num_samples: 10,
            balance: true,
            seed: Some(3),
            num_threads: Some(2),
            ..Default::default()
        };

        let mut learner =
            ActiveLearner::new(config, ds, Identity, CsvResultSink::new(dir.path()).unwrap());
        let outcome = learner.run(&universe).unwrap();

        assert_eq!(outcome.records.len(), outcome.selected_features.len());
        assert!(!outcome.selected_features.is_empty());
        assert_eq!(outcome.test_ids.len(), 11);
        assert!(outcome.test_ids.iter().all(|id| {
            let i: usize = id[1..].parse().unwrap();
            i % 10 != 9
        }));
        if !outcome.stopped_early {
            assert_eq!(outcome.selected_features.len(), 2);
        }
    }

    #[test]
    fn duplicate_universe_is_rejected() {
        let mut rng = StdRng::seed_from_u64(1);
        let ds = dataset(20, &mut rng);
        let dir = tempfile::tempdir().unwrap();
        let mut learner = ActiveLearner::new(
            SelectionConfig::default(),
            ds,
            Identity,
            CsvResultSink::new(dir.path()).unwrap(),
        );
        let repeated = vec!["f0".to_string(), "f0".to_string()];
        assert!(learner.run(&repeated).is_err());
        assert!(learner.run(&Vec::<String>::new()).is_err());
    }
}
