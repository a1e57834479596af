//! Integration tests for CLI config parsing, util helpers, and a full run.

use std::io::Write;
use std::path::Path;

use alfs_cli::select;
use alfs_cli::select::input::RunConfig;
use alfs_cli::select::run::run_selection;
use alfs_cli::util::validate_tsv_or_csv_file;
use alfs_selection::config::ClassifierKind;

// ---------------------------------------------------------------------------
// validate_tsv_or_csv_file
// ---------------------------------------------------------------------------

#[test]
fn validate_tsv_file_exists() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("data.tsv");
    std::fs::File::create(&path).unwrap();
    assert!(validate_tsv_or_csv_file(path.to_str().unwrap()).is_ok());
}

#[test]
fn validate_wrong_extension_errors() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("data.txt");
    std::fs::File::create(&path).unwrap();
    assert!(validate_tsv_or_csv_file(path.to_str().unwrap()).is_err());
}

#[test]
fn validate_nonexistent_file_errors() {
    assert!(validate_tsv_or_csv_file("/nonexistent/path/data.csv").is_err());
}

// ---------------------------------------------------------------------------
// RunConfig
// ---------------------------------------------------------------------------

#[test]
fn run_config_default_values() {
    let cfg = RunConfig::default();
    assert!(cfg.log_transform);
    assert!(cfg.features.is_none());
    assert_eq!(cfg.layout.label_column, "label");
    assert_eq!(cfg.selection.num_features, 10);
}

#[test]
fn partial_json_keeps_defaults() {
    let cfg: RunConfig = serde_json::from_str(
        r#"{
            "data": "table.tsv",
            "selection": { "num_features": 4, "balance": true,
                           "classifier": { "LinearProgrammingLinear": { "alpha": 0.01 } } }
        }"#,
    )
    .unwrap();
    assert_eq!(cfg.selection.num_features, 4);
    assert_eq!(cfg.selection.num_samples, 100);
    assert!(cfg.selection.balance);
    match cfg.selection.classifier {
        ClassifierKind::LinearProgrammingLinear(p) => {
            assert!((p.alpha - 0.01).abs() < 1e-12);
            assert_eq!(p.max_iter, 2000);
        }
        other => panic!("unexpected classifier {:?}", other),
    }
}

fn write_table(path: &Path) {
    let mut file = std::fs::File::create(path).unwrap();
    writeln!(file, "sample_id,label,tissue,g0,g1,g2").unwrap();
    for i in 0..40 {
        let class = i % 2;
        let label = if class == 1 { "tumor" } else { "normal" };
        // g0 separates the classes with a little overlap, g1/g2 are filler.
        let g0 = if class == 1 { 30.0 + (i % 7) as f64 * 3.0 } else { 5.0 + (i % 5) as f64 * 6.0 };
        let g1 = 10.0 + (i % 3) as f64;
        let g2 = 4.0 + (i % 4) as f64;
        writeln!(file, "s{},{},lung,{},{},{}", i, label, g0, g1, g2).unwrap();
    }
}

fn write_config(dir: &Path, data: &Path) -> std::path::PathBuf {
    let config = RunConfig {
        data: data.to_str().unwrap().to_string(),
        output_dir: dir.join("out").to_str().unwrap().to_string(),
        layout: alfs_selection::io::TableLayout {
            observation_columns: vec!["tissue".to_string()],
            ..Default::default()
        },
        ..Default::default()
    };
    let path = dir.join("config.json");
    std::fs::write(&path, serde_json::to_string_pretty(&config).unwrap()).unwrap();
    path
}

#[test]
fn cli_overrides_apply_on_top_of_config_file() {
    let dir = tempfile::tempdir().unwrap();
    let data = dir.path().join("table.csv");
    write_table(&data);
    let config_path = write_config(dir.path(), &data);

    let matches = select::command()
        .try_get_matches_from([
            "select",
            config_path.to_str().unwrap(),
            "--classifier",
            "lp",
            "--balance",
            "--seed",
            "12",
            "--threads",
            "2",
            "-o",
            "elsewhere",
        ])
        .unwrap();
    let cfg = RunConfig::from_arguments(&config_path, &matches).unwrap();

    assert!(matches!(
        cfg.selection.classifier,
        ClassifierKind::LinearProgrammingLinear(_)
    ));
    assert!(cfg.selection.balance);
    assert_eq!(cfg.selection.seed, Some(12));
    assert_eq!(cfg.selection.num_threads, Some(2));
    assert_eq!(cfg.output_dir, "elsewhere");
}

#[test]
fn missing_data_file_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let config_path = write_config(dir.path(), &dir.path().join("absent.csv"));
    let matches = select::command()
        .try_get_matches_from(["select", config_path.to_str().unwrap()])
        .unwrap();
    assert!(RunConfig::from_arguments(&config_path, &matches).is_err());
}

#[test]
fn run_selection_writes_outputs() {
    let dir = tempfile::tempdir().unwrap();
    let data = dir.path().join("table.csv");
    write_table(&data);
    let config_path = write_config(dir.path(), &data);
    let matches = select::command()
        .try_get_matches_from([
            "select",
            config_path.to_str().unwrap(),
            "--balance",
            "--seed",
            "5",
        ])
        .unwrap();
    let mut cfg = RunConfig::from_arguments(&config_path, &matches).unwrap();
    cfg.selection.num_features = 2;
    cfg.selection.num_samples = 8;

    let outcome = run_selection(&cfg).unwrap();
    assert!(!outcome.selected_features.is_empty());
    assert_eq!(outcome.records.len(), outcome.selected_features.len());
    assert_eq!(outcome.test_ids.len(), 8);

    let out = Path::new(&cfg.output_dir);
    assert!(out.join("selection_history.csv").exists());
    assert!(out.join("train_test_split.csv").exists());
    assert!(out.join("elapsed_time.txt").exists());
}
