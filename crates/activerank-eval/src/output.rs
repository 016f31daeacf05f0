//! Output formatting for evaluation results.
//!
//! Supports both human-readable terminal output and JSON for scripting.

use activerank_core::{EvalConfig, IterationStat, MetricStore, SeriesKey, SkippedSource};
use anyhow::Result;
use serde::Serialize;
use std::path::Path;

/// Width of the report banners
const RULE_WIDTH: usize = 80;

/// JSON output structure for an evaluation run
#[derive(Serialize)]
pub struct JsonOutput<'a> {
    pub results_dir: String,
    pub config: &'a EvalConfig,
    /// Nested `dataset → [norm →] oracle → algorithm → fold` series
    pub metrics: serde_json::Value,
    pub skipped: &'a [SkippedSource],
    pub rejected: &'a [String],
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<Vec<JsonSeriesSummary>>,
}

/// Cross-fold statistics for one metric of one series
#[derive(Serialize)]
pub struct JsonSeriesSummary {
    pub metric: String,
    pub series: SeriesKey,
    pub iterations: Vec<IterationStat>,
}

/// Fold summaries for every configured metric, metric-major.
fn collect_summaries(store: &MetricStore) -> Vec<JsonSeriesSummary> {
    store
        .metric_names()
        .iter()
        .flat_map(|metric| {
            store
                .iteration_summary(metric)
                .into_iter()
                .map(move |(series, iterations)| JsonSeriesSummary {
                    metric: metric.clone(),
                    series,
                    iterations,
                })
        })
        .collect()
}

/// Formats the store as pretty-printed JSON.
pub fn format_json(results_dir: &Path, store: &MetricStore, summary: bool) -> Result<String> {
    let output = JsonOutput {
        results_dir: results_dir.display().to_string(),
        config: store.config(),
        metrics: store.to_nested_json()?,
        skipped: store.skipped(),
        rejected: store.rejected(),
        summary: summary.then(|| collect_summaries(store)),
    };
    Ok(serde_json::to_string_pretty(&output)?)
}

/// Formats the store for human-readable terminal output.
pub fn format_human(results_dir: &Path, store: &MetricStore, summary: bool) -> String {
    let mut output = String::new();
    let config = store.config();

    output.push_str(&format!("{}\n", "=".repeat(RULE_WIDTH)));
    output.push_str("RANKING QUALITY EVALUATION\n");
    output.push_str(&format!("{}\n", "=".repeat(RULE_WIDTH)));
    output.push_str(&format!("Results:   {}\n", results_dir.display()));
    output.push_str(&format!(
        "Schema:    {}{}\n",
        config.schema,
        if config.cumulative { " (cumulative)" } else { "" }
    ));
    output.push_str(&format!("Metrics:   {}\n", store.metric_names().join(", ")));
    output.push_str(&format!(
        "Timelines: {} ({} algorithm{}: {})\n",
        store.len(),
        store.algorithms().len(),
        plural(store.algorithms().len()),
        store.algorithms().join(", ")
    ));

    output.push_str(&format!("\n{}\n", "-".repeat(RULE_WIDTH)));
    output.push_str("FINAL VALUES\n");
    for (key, timeline) in store.iter() {
        output.push_str(&format!(
            "{} ({} iteration{})\n",
            key,
            timeline.len(),
            plural(timeline.len())
        ));
        let values: Vec<String> = store
            .metric_names()
            .iter()
            .map(|name| match timeline.last_value(name) {
                Some(value) => format!("{}={}", name, format_value(value)),
                None => format!("{}=-", name),
            })
            .collect();
        output.push_str(&format!("   {}\n", values.join("  ")));
    }

    if summary {
        output.push_str(&format!("\n{}\n", "-".repeat(RULE_WIDTH)));
        output.push_str("FOLD SUMMARY (last iteration, mean [95% CI])\n");
        for entry in collect_summaries(store) {
            if let Some(last) = entry.iterations.last() {
                output.push_str(&format!(
                    "{:<40} {:<16} it={:<4} folds={:<3} defined={:<3} {} [{}, {}]\n",
                    entry.series.to_string(),
                    entry.metric,
                    last.iteration,
                    last.folds,
                    last.samples,
                    format_value(last.mean),
                    format_value(last.lower),
                    format_value(last.upper)
                ));
            }
        }
    }

    if !store.skipped().is_empty() || !store.rejected().is_empty() {
        output.push_str(&format!("\n{}\n", "-".repeat(RULE_WIDTH)));
        output.push_str(&format!(
            "SKIPPED SOURCES ({})\n",
            store.skipped().len() + store.rejected().len()
        ));
        for name in store.rejected() {
            output.push_str(&format!(
                "   {}: name does not match the {} grammar\n",
                name, config.schema
            ));
        }
        for skipped in store.skipped() {
            output.push_str(&format!("   {}: {}\n", skipped.source, skipped.reason));
        }
    }

    output.push_str(&"=".repeat(RULE_WIDTH));
    output
}

fn format_value(value: f64) -> String {
    if value.is_nan() {
        "NaN".to_string()
    } else {
        format!("{:.4}", value)
    }
}

fn plural(count: usize) -> &'static str {
    if count == 1 {
        ""
    } else {
        "s"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use activerank_core::{aggregate, group_sources, InMemoryTableSource, RawTable};

    fn perfect() -> RawTable {
        RawTable::from_scores(&[(3.0, 3.0), (2.0, 2.0), (1.0, 1.0)])
    }

    fn make_store(config: &EvalConfig) -> MetricStore {
        let names = [
            "iris_0_Hss_OWA_1.csv",
            "iris_0_Hss_OWA_2.csv",
            "iris_1_Hss_OWA_1.csv",
            "bad.csv",
        ];
        let source = InMemoryTableSource::new()
            .with(names[0], perfect())
            .with(names[1], RawTable::from_scores(&[(1.0, 3.0), (2.0, 2.0), (3.0, 1.0)]))
            .with(names[2], RawTable::new(vec!["scoreApprox".to_string()], vec![]));
        let grouping = group_sources(names, config.schema);
        aggregate(&grouping, &source, config).unwrap()
    }

    #[test]
    fn test_format_human_lists_groups_and_skips() {
        let store = make_store(&EvalConfig::active_learning());
        let output = format_human(Path::new("results"), &store, false);

        assert!(output.contains("RANKING QUALITY EVALUATION"));
        assert!(output.contains("Results:   results"));
        assert!(output.contains("iris/OWA/Hss/0 (2 iterations)"));
        assert!(output.contains("iris/OWA/Hss/1 (0 iterations)"));
        assert!(output.contains("precision@10%=0.0000"));
        assert!(output.contains("precision@1%=-"));
        assert!(output.contains("1 algorithm: Hss"));
        assert!(output.contains("SKIPPED SOURCES (2)"));
        assert!(output.contains("bad.csv: name does not match the simple grammar"));
        assert!(output.contains("iris_1_Hss_OWA_1.csv"));
        assert!(!output.contains("FOLD SUMMARY"));
    }

    #[test]
    fn test_format_human_with_summary() {
        let mut config = EvalConfig::active_learning();
        config.correlation = Some(activerank_core::CorrelationMethod::Kendall);
        let store = make_store(&config);
        let output = format_human(Path::new("results"), &store, true);

        assert!(output.contains("FOLD SUMMARY"));
        assert!(output.contains("kendall"));
        assert!(output.contains("folds=1   defined=1"));
        assert!(output.contains("-1.0000"));
    }

    #[test]
    fn test_format_json_structure() {
        let store = make_store(&EvalConfig::active_learning());
        let json = format_json(Path::new("results"), &store, true).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert_eq!(value["results_dir"], "results");
        assert_eq!(value["config"]["schema"], "simple");
        assert_eq!(
            value["metrics"]["iris"]["OWA"]["Hss"]["0"]["timestamps"],
            serde_json::json!([1, 2])
        );
        assert_eq!(value["rejected"], serde_json::json!(["bad.csv"]));
        assert_eq!(value["skipped"][0]["source"], "iris_1_Hss_OWA_1.csv");
        assert_eq!(value["summary"][0]["metric"], "precision@1%");
        assert_eq!(value["summary"][0]["series"]["algorithm"], "Hss");
    }

    #[test]
    fn test_format_json_without_summary() {
        let store = make_store(&EvalConfig::active_learning());
        let json = format_json(Path::new("results"), &store, false).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert!(value.get("summary").is_none());
    }

    #[test]
    fn test_format_value() {
        assert_eq!(format_value(f64::NAN), "NaN");
        assert_eq!(format_value(0.5), "0.5000");
    }
}
