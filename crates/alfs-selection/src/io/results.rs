//! Result persistence for a selection run.
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::Serialize;

use crate::active_loop::{IterationRecord, TrainTestSplit};

/// Destination for the audit trail of a run. Every write failure is fatal
/// to the run.
pub trait ResultSink {
    /// Rewrite the full history table; called after every iteration.
    fn write_history(&mut self, records: &[IterationRecord]) -> Result<()>;
    fn write_split(&mut self, split: &TrainTestSplit) -> Result<()>;
    fn write_elapsed(&mut self, elapsed: Duration) -> Result<()>;
}

#[derive(Serialize)]
struct HistoryRow<'a> {
    feature: &'a str,
    train_accuracy: f64,
    test_accuracy: f64,
    train_error: f64,
    test_error: f64,
    num_samples: usize,
}

#[derive(Serialize)]
struct SplitRow<'a> {
    position: usize,
    sample_index: usize,
    sample_id: &'a str,
    partition: &'a str,
}

/// Writes CSV tables and a plain-text timing file into one directory.
#[derive(Debug, Clone)]
pub struct CsvResultSink {
    dir: PathBuf,
}

impl CsvResultSink {
    pub const HISTORY_FILE: &'static str = "selection_history.csv";
    pub const SPLIT_FILE: &'static str = "train_test_split.csv";
    pub const ELAPSED_FILE: &'static str = "elapsed_time.txt";

    /// Create the sink, creating `dir` if it does not exist yet.
    pub fn new<P: AsRef<Path>>(dir: P) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir)
            .with_context(|| format!("Failed to create output directory: {}", dir.display()))?;
        Ok(CsvResultSink { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn writer(&self, name: &str) -> Result<(csv::Writer<fs::File>, PathBuf)> {
        let path = self.dir.join(name);
        let writer = csv::Writer::from_path(&path)
            .with_context(|| format!("Failed to open {}", path.display()))?;
        Ok((writer, path))
    }
}

impl ResultSink for CsvResultSink {
    fn write_history(&mut self, records: &[IterationRecord]) -> Result<()> {
        let (mut writer, path) = self.writer(Self::HISTORY_FILE)?;
        for record in records {
            writer
                .serialize(HistoryRow {
                    feature: &record.feature,
                    train_accuracy: record.train_accuracy,
                    test_accuracy: record.test_accuracy,
                    train_error: record.train_error,
                    test_error: record.test_error,
                    num_samples: record.num_samples,
                })
                .with_context(|| format!("Failed to write {}", path.display()))?;
        }
        writer
            .flush()
            .with_context(|| format!("Failed to flush {}", path.display()))?;
        log::debug!("Wrote {} history rows to {}", records.len(), path.display());
        Ok(())
    }

    fn write_split(&mut self, split: &TrainTestSplit) -> Result<()> {
        let (mut writer, path) = self.writer(Self::SPLIT_FILE)?;
        for (position, &sample_index) in split.shuffle_index.iter().enumerate() {
            writer
                .serialize(SplitRow {
                    position,
                    sample_index,
                    sample_id: &split.sample_ids[sample_index],
                    partition: if position < split.n_test { "test" } else { "train" },
                })
                .with_context(|| format!("Failed to write {}", path.display()))?;
        }
        writer
            .flush()
            .with_context(|| format!("Failed to flush {}", path.display()))?;
        Ok(())
    }

    fn write_elapsed(&mut self, elapsed: Duration) -> Result<()> {
        let path = self.dir.join(Self::ELAPSED_FILE);
        fs::write(&path, format!("{:.3}\n", elapsed.as_secs_f64()))
            .with_context(|| format!("Failed to write {}", path.display()))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(feature: &str, num_samples: usize) -> IterationRecord {
        IterationRecord {
            feature: feature.to_string(),
            train_accuracy: 0.75,
            test_accuracy: 0.5,
            train_error: 0.25,
            test_error: 0.5,
            num_samples,
        }
    }

    #[test]
    fn history_is_rewritten_not_appended() {
        let dir = tempfile::tempdir().unwrap();
        let mut sink = CsvResultSink::new(dir.path().join("out")).unwrap();

        sink.write_history(&[record("g1", 10)]).unwrap();
        sink.write_history(&[record("g1", 10), record("g7", 14)]).unwrap();

        let text = fs::read_to_string(sink.dir().join(CsvResultSink::HISTORY_FILE)).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(
            lines[0],
            "feature,train_accuracy,test_accuracy,train_error,test_error,num_samples"
        );
        assert_eq!(lines.len(), 3);
        assert!(lines[2].starts_with("g7,"));
        assert!(lines[2].ends_with(",14"));
    }

    #[test]
    fn split_marks_leading_positions_as_test() {
        let dir = tempfile::tempdir().unwrap();
        let mut sink = CsvResultSink::new(dir.path()).unwrap();
        let split = TrainTestSplit {
            sample_ids: vec!["a".into(), "b".into(), "c".into()],
            shuffle_index: vec![2, 0, 1],
            n_test: 1,
        };
        sink.write_split(&split).unwrap();
        sink.write_elapsed(Duration::from_millis(1500)).unwrap();

        let text = fs::read_to_string(dir.path().join(CsvResultSink::SPLIT_FILE)).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "position,sample_index,sample_id,partition");
        assert_eq!(lines[1], "0,2,c,test");
        assert_eq!(lines[3], "2,1,b,train");

        let elapsed = fs::read_to_string(dir.path().join(CsvResultSink::ELAPSED_FILE)).unwrap();
        assert_eq!(elapsed.trim(), "1.500");
    }
}
