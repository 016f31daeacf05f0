//! End-to-end tests for the evaluation pipeline over CSV snapshot files.
//!
//! Each test writes a results directory into a `TempDir` and runs
//! list → group → aggregate exactly as the command-line tool does.
//!
//! Run with: `cargo test -p activerank-core --test integration_tests`

use activerank_core::{
    aggregate, group_sources, CorrelationMethod, CsvTableSource, EvalConfig, EvalError, GroupKey,
    MetricStore, TableSource,
};
use std::fs;
use std::path::Path;
use tempfile::TempDir;

// ============================================================================
// Fixtures
// ============================================================================

/// Writes a snapshot with an extra leading column, the way the experiment
/// harness dumps them.
fn write_snapshot(dir: &Path, name: &str, pairs: &[(f64, f64)]) {
    let mut contents = String::from("item,scoreApprox,scoreOracle\n");
    for (i, (approx, oracle)) in pairs.iter().enumerate() {
        contents.push_str(&format!("{},{},{}\n", i, approx, oracle));
    }
    fs::write(dir.join(name), contents).unwrap();
}

/// Twenty items; the approximate ranking agrees with the oracle on the top
/// `agreeing` positions and is reversed below that.
fn scores(agreeing: usize) -> Vec<(f64, f64)> {
    (0..20)
        .map(|i| {
            let oracle = (20 - i) as f64;
            let approx = if i < agreeing { oracle } else { i as f64 * 0.01 };
            (approx, oracle)
        })
        .collect()
}

fn run(dir: &Path, config: &EvalConfig) -> Result<MetricStore, EvalError> {
    let source = CsvTableSource::new(dir);
    let grouping = group_sources(source.list_sources()?, config.schema);
    aggregate(&grouping, &source, config)
}

fn key(dataset: &str, norm: Option<&str>, oracle: &str, algorithm: &str, fold: &str) -> GroupKey {
    GroupKey {
        dataset: dataset.to_string(),
        norm_method: norm.map(str::to_string),
        oracle: oracle.to_string(),
        algorithm: algorithm.to_string(),
        fold: fold.to_string(),
    }
}

// ============================================================================
// Active learning (simple grammar)
// ============================================================================

#[test]
fn test_active_learning_directory() {
    let dir = TempDir::new().unwrap();
    write_snapshot(dir.path(), "iris_0_Hss_OWA_30.csv", &scores(20));
    write_snapshot(dir.path(), "iris_0_Hss_OWA_10.csv", &scores(0));
    write_snapshot(dir.path(), "iris_0_Hss_OWA_20.csv", &scores(2));
    write_snapshot(dir.path(), "iris_1_Hss_OWA_10.csv", &scores(20));
    write_snapshot(dir.path(), "iris_0_GUS_OWA_10.csv", &scores(20));
    fs::write(dir.path().join("notes.txt"), "not a snapshot").unwrap();
    fs::create_dir(dir.path().join("plots")).unwrap();

    let store = run(dir.path(), &EvalConfig::active_learning()).unwrap();

    assert_eq!(store.len(), 3);
    assert!(store.skipped().is_empty());
    assert!(store.rejected().is_empty());
    assert_eq!(store.algorithms(), vec!["GUS", "Hss"]);

    let timeline = store.get(&key("iris", None, "OWA", "Hss", "0")).unwrap();
    assert_eq!(timeline.timestamps, vec![10, 20, 30]);
    // 20 items: precision@1% uses k = 1, precision@10% uses k = 2.
    assert_eq!(timeline.series("precision@1%").unwrap(), &[0.0, 1.0, 1.0]);
    assert_eq!(timeline.series("precision@10%").unwrap(), &[0.0, 1.0, 1.0]);
}

#[test]
fn test_malformed_and_broken_sources_are_reported() {
    let dir = TempDir::new().unwrap();
    write_snapshot(dir.path(), "iris_0_Hss_OWA_1.csv", &scores(20));
    write_snapshot(dir.path(), "bad.csv", &scores(20));
    write_snapshot(dir.path(), "iris_0_Hss_OWA_late.csv", &scores(20));
    fs::write(
        dir.path().join("iris_0_Hss_OWA_2.csv"),
        "item,scoreApprox\n0,1.0\n",
    )
    .unwrap();
    fs::write(
        dir.path().join("iris_0_Hss_OWA_3.csv"),
        "scoreApprox,scoreOracle\n1.0,oops\n",
    )
    .unwrap();

    let store = run(dir.path(), &EvalConfig::active_learning()).unwrap();

    assert_eq!(
        store.rejected(),
        &["bad.csv".to_string(), "iris_0_Hss_OWA_late.csv".to_string()]
    );
    let skipped: Vec<&str> = store.skipped().iter().map(|s| s.source.as_str()).collect();
    assert_eq!(skipped, vec!["iris_0_Hss_OWA_2.csv", "iris_0_Hss_OWA_3.csv"]);

    let timeline = store.get(&key("iris", None, "OWA", "Hss", "0")).unwrap();
    assert_eq!(timeline.timestamps, vec![1]);
}

#[test]
fn test_directory_without_snapshots() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("readme.md"), "# results").unwrap();

    let result = run(dir.path(), &EvalConfig::active_learning());
    assert!(matches!(result, Err(EvalError::EmptyInput(_))));
}

#[test]
fn test_missing_directory() {
    let dir = TempDir::new().unwrap();
    let missing = dir.path().join("does-not-exist");

    let result = run(&missing, &EvalConfig::active_learning());
    assert!(matches!(result, Err(EvalError::SourceDirectory { .. })));
}

// ============================================================================
// Active normalization (extended grammar)
// ============================================================================

#[test]
fn test_active_normalization_directory() {
    let dir = TempDir::new().unwrap();
    write_snapshot(dir.path(), "wine_2_Thurstone-0.5-minmax_Chi_2.csv", &scores(20));
    write_snapshot(dir.path(), "wine_2_Thurstone-0.5-minmax_Chi_1.csv", &scores(20));
    write_snapshot(dir.path(), "wine_2_Thurstone-0.5-zscore_Chi_1.csv", &scores(0));
    write_snapshot(dir.path(), "wine_2_Borda_Chi_1.csv", &scores(20));

    let config = EvalConfig::active_normalization();
    let store = run(dir.path(), &config).unwrap();

    assert_eq!(store.norm_methods(), vec!["", "minmax", "zscore"]);
    assert_eq!(store.algorithms(), vec!["Borda", "Thurstone-0.5"]);

    let minmax = store
        .get(&key("wine", Some("minmax"), "Chi", "Thurstone-0.5", "2"))
        .unwrap();
    assert_eq!(minmax.timestamps, vec![1, 2]);
    // Cumulative: two perfect snapshots.
    assert_eq!(minmax.series("precision@10%").unwrap(), &[1.0, 2.0]);
    let kendall = minmax.series("kendall").unwrap();
    assert!((kendall[0] - 1.0).abs() < 1e-12);
    assert!((kendall[1] - 2.0).abs() < 1e-12);

    let zscore = store
        .get(&key("wine", Some("zscore"), "Chi", "Thurstone-0.5", "2"))
        .unwrap();
    assert_eq!(zscore.series("precision@10%").unwrap(), &[0.0]);

    let json = store.to_nested_json().unwrap();
    assert_eq!(
        json["wine"]["minmax"]["Chi"]["Thurstone-0.5"]["2"]["timestamps"],
        serde_json::json!([1, 2])
    );
    assert!(json["wine"][""]["Chi"]["Borda"]["2"]["kendall"].is_array());
}

// ============================================================================
// Configuration
// ============================================================================

#[test]
fn test_optional_metrics_from_json_config() {
    let dir = TempDir::new().unwrap();
    write_snapshot(dir.path(), "iris_0_Hss_OWA_1.csv", &scores(20));
    write_snapshot(dir.path(), "iris_0_Hss_OWA_2.csv", &[(1.0, 1.0), (2.0, 1.0)]);

    let config = EvalConfig::from_json(
        r#"{"top_percentages": [0.5], "regret": true, "unique_ratio": true, "correlation": "spearman"}"#,
    )
    .unwrap();
    assert_eq!(config.correlation, Some(CorrelationMethod::Spearman));
    assert_eq!(
        config.metric_names(),
        vec!["precision@50%", "regret@50%", "unique_ratio", "spearman"]
    );

    let store = run(dir.path(), &config).unwrap();
    let timeline = store.get(&key("iris", None, "OWA", "Hss", "0")).unwrap();

    assert_eq!(timeline.series("regret@50%").unwrap()[0], 0.0);
    assert_eq!(timeline.series("unique_ratio").unwrap(), &[100.0, 50.0]);
    assert!((timeline.series("spearman").unwrap()[0] - 1.0).abs() < 1e-12);
}

#[test]
fn test_fold_summary_over_csv_results() {
    let dir = TempDir::new().unwrap();
    for fold in 0..4 {
        let agreeing = if fold % 2 == 0 { 20 } else { 0 };
        write_snapshot(dir.path(), &format!("iris_{}_Hss_OWA_1.csv", fold), &scores(agreeing));
    }

    let store = run(dir.path(), &EvalConfig::active_learning()).unwrap();
    let summary = store.iteration_summary("precision@10%");
    let stats = summary.values().next().unwrap();

    assert_eq!(stats.len(), 1);
    assert_eq!(stats[0].folds, 4);
    assert!((stats[0].mean - 0.5).abs() < 1e-12);
    assert!(stats[0].lower >= 0.0 && stats[0].upper <= 1.0);
}
