//! Per-group aggregation of snapshot metrics into timelines.
//!
//! For every [`GroupKey`] the aggregator loads each source, ranks it,
//! evaluates the configured metrics, and orders the results by timestamp.
//! The resulting [`MetricStore`] is a flat map from group to [`Timeline`];
//! the nested `dataset → [norm →] oracle → algorithm → fold` shape only
//! exists at serialization time ([`MetricStore::to_nested_json`]).
//!
//! Groups are processed one at a time, in key order. A source that cannot be
//! loaded is skipped and recorded; it never aborts the run.

use crate::config::{EvalConfig, SUMMARY_BOOTSTRAP_SAMPLES, SUMMARY_BOOTSTRAP_SEED};
use crate::error::{EvalError, SnapshotError};
use crate::evaluation::{bootstrap_ci, MetricKind};
use crate::grouping::{GroupKey, Grouping, SourceEntry};
use crate::ranking::RankedSnapshot;
use crate::snapshot::{Snapshot, TableSource};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use tracing::{debug, info, warn};

// ============================================================================
// Timeline
// ============================================================================

/// Metric series of one experiment timeline, in ascending timestamp order.
///
/// Every configured metric has an entry in `metrics`, even when the
/// timeline is empty. Index `i` of every series belongs to iteration `i + 1`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Timeline {
    pub timestamps: Vec<i64>,
    /// Surviving source names, aligned with `timestamps`
    pub sources: Vec<String>,
    pub metrics: BTreeMap<String, Vec<f64>>,
}

impl Timeline {
    /// An empty timeline with a series for each metric name.
    pub fn new(metric_names: &[String]) -> Self {
        Self {
            timestamps: Vec::new(),
            sources: Vec::new(),
            metrics: metric_names
                .iter()
                .map(|name| (name.clone(), Vec::new()))
                .collect(),
        }
    }

    /// Number of iterations.
    pub fn len(&self) -> usize {
        self.timestamps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timestamps.is_empty()
    }

    pub fn series(&self, metric: &str) -> Option<&[f64]> {
        self.metrics.get(metric).map(Vec::as_slice)
    }

    /// Value of `metric` at the last iteration.
    pub fn last_value(&self, metric: &str) -> Option<f64> {
        self.series(metric).and_then(|values| values.last().copied())
    }

    fn push(&mut self, timestamp: i64, source: &str, names: &[String], values: Vec<f64>) {
        self.timestamps.push(timestamp);
        self.sources.push(source.to_string());
        for (name, value) in names.iter().zip(values) {
            self.metrics.entry(name.clone()).or_default().push(value);
        }
    }

    /// Replaces every series with its running prefix sum.
    fn accumulate(&mut self) {
        for values in self.metrics.values_mut() {
            let mut total = 0.0;
            for value in values.iter_mut() {
                total += *value;
                *value = total;
            }
        }
    }
}

/// A source dropped during aggregation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkippedSource {
    pub source: String,
    pub group: GroupKey,
    pub reason: String,
}

// ============================================================================
// Fold summary types
// ============================================================================

/// A [`GroupKey`] without the fold: one curve in a per-algorithm plot.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SeriesKey {
    pub dataset: String,
    pub norm_method: Option<String>,
    pub oracle: String,
    pub algorithm: String,
}

impl From<&GroupKey> for SeriesKey {
    fn from(key: &GroupKey) -> Self {
        Self {
            dataset: key.dataset.clone(),
            norm_method: key.norm_method.clone(),
            oracle: key.oracle.clone(),
            algorithm: key.algorithm.clone(),
        }
    }
}

impl fmt::Display for SeriesKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.dataset)?;
        if let Some(norm) = &self.norm_method {
            write!(f, "/{}", norm)?;
        }
        write!(f, "/{}/{}", self.oracle, self.algorithm)
    }
}

/// Cross-fold statistics of one metric at one iteration.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IterationStat {
    /// 1-based iteration number
    pub iteration: usize,
    /// Folds that reached this iteration
    pub folds: usize,
    /// Folds with a defined (non-NaN) value; the statistics use only these
    pub samples: usize,
    pub mean: f64,
    pub lower: f64,
    pub upper: f64,
}

// ============================================================================
// MetricStore
// ============================================================================

/// All timelines of one evaluation run.
#[derive(Debug, Clone)]
pub struct MetricStore {
    config: EvalConfig,
    metric_names: Vec<String>,
    timelines: BTreeMap<GroupKey, Timeline>,
    skipped: Vec<SkippedSource>,
    rejected: Vec<String>,
}

impl MetricStore {
    fn new(config: EvalConfig, metric_names: Vec<String>) -> Self {
        Self {
            config,
            metric_names,
            timelines: BTreeMap::new(),
            skipped: Vec::new(),
            rejected: Vec::new(),
        }
    }

    pub fn config(&self) -> &EvalConfig {
        &self.config
    }

    /// Metric series names in reporting order.
    pub fn metric_names(&self) -> &[String] {
        &self.metric_names
    }

    pub fn get(&self, key: &GroupKey) -> Option<&Timeline> {
        self.timelines.get(key)
    }

    /// Timelines in `GroupKey` order.
    pub fn iter(&self) -> impl Iterator<Item = (&GroupKey, &Timeline)> {
        self.timelines.iter()
    }

    pub fn len(&self) -> usize {
        self.timelines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timelines.is_empty()
    }

    /// Sources whose contents could not be used.
    pub fn skipped(&self) -> &[SkippedSource] {
        &self.skipped
    }

    /// Source names that did not match the naming grammar.
    pub fn rejected(&self) -> &[String] {
        &self.rejected
    }

    pub fn datasets(&self) -> Vec<String> {
        self.distinct(|key| Some(key.dataset.as_str()))
    }

    /// Empty unless the extended grammar was used.
    pub fn norm_methods(&self) -> Vec<String> {
        self.distinct(|key| key.norm_method.as_deref())
    }

    pub fn oracles(&self) -> Vec<String> {
        self.distinct(|key| Some(key.oracle.as_str()))
    }

    pub fn algorithms(&self) -> Vec<String> {
        self.distinct(|key| Some(key.algorithm.as_str()))
    }

    pub fn folds(&self) -> Vec<String> {
        self.distinct(|key| Some(key.fold.as_str()))
    }

    fn distinct<'a, F>(&'a self, field: F) -> Vec<String>
    where
        F: Fn(&'a GroupKey) -> Option<&'a str>,
    {
        self.timelines
            .keys()
            .filter_map(field)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .map(str::to_string)
            .collect()
    }

    /// Serializes the store as
    /// `dataset → [norm_method →] oracle → algorithm → fold → {metric: [..], "timestamps": [..]}`.
    ///
    /// The norm-method level is present only for the extended grammar.
    /// `NaN` values become `null`.
    pub fn to_nested_json(&self) -> Result<serde_json::Value, EvalError> {
        let mut by_norm: BTreeMap<&str, BTreeMap<&str, OracleLevel<'_>>> = BTreeMap::new();

        for (key, timeline) in &self.timelines {
            let norm = key.norm_method.as_deref().unwrap_or("");
            by_norm
                .entry(norm)
                .or_default()
                .entry(key.dataset.as_str())
                .or_default()
                .entry(key.oracle.as_str())
                .or_default()
                .entry(key.algorithm.as_str())
                .or_default()
                .insert(
                    key.fold.as_str(),
                    FoldSeries {
                        metrics: &timeline.metrics,
                        timestamps: &timeline.timestamps,
                    },
                );
        }

        if !self.config.schema.has_norm_method() {
            let flat: BTreeMap<&str, OracleLevel<'_>> =
                by_norm.into_values().flatten().collect();
            return Ok(serde_json::to_value(flat)?);
        }

        // Regroup so the dataset level comes first.
        let mut nested: BTreeMap<&str, BTreeMap<&str, OracleLevel<'_>>> = BTreeMap::new();
        for (norm, datasets) in by_norm {
            for (dataset, oracles) in datasets {
                nested.entry(dataset).or_default().insert(norm, oracles);
            }
        }
        Ok(serde_json::to_value(nested)?)
    }

    /// Mean and 95% bootstrap band of `metric` at every iteration, across the
    /// folds of each [`SeriesKey`].
    ///
    /// Folds of different length contribute only to the iterations they
    /// reached. Unknown metric names yield an empty map.
    pub fn iteration_summary(&self, metric: &str) -> BTreeMap<SeriesKey, Vec<IterationStat>> {
        let mut folds_by_series: BTreeMap<SeriesKey, Vec<&[f64]>> = BTreeMap::new();
        for (key, timeline) in &self.timelines {
            if let Some(series) = timeline.series(metric) {
                folds_by_series
                    .entry(SeriesKey::from(key))
                    .or_default()
                    .push(series);
            }
        }

        folds_by_series
            .into_iter()
            .map(|(series_key, folds)| {
                let iterations = folds.iter().map(|s| s.len()).max().unwrap_or(0);
                let stats = (0..iterations)
                    .map(|i| {
                        let values: Vec<f64> =
                            folds.iter().filter_map(|s| s.get(i).copied()).collect();
                        let ci = bootstrap_ci(
                            &values,
                            SUMMARY_BOOTSTRAP_SAMPLES,
                            SUMMARY_BOOTSTRAP_SEED,
                        );
                        IterationStat {
                            iteration: i + 1,
                            folds: values.len(),
                            samples: ci.samples,
                            mean: ci.mean,
                            lower: ci.lower,
                            upper: ci.upper,
                        }
                    })
                    .collect();
                (series_key, stats)
            })
            .collect()
    }
}

type FoldLevel<'a> = BTreeMap<&'a str, FoldSeries<'a>>;
type OracleLevel<'a> = BTreeMap<&'a str, BTreeMap<&'a str, FoldLevel<'a>>>;

#[derive(Serialize)]
struct FoldSeries<'a> {
    #[serde(flatten)]
    metrics: &'a BTreeMap<String, Vec<f64>>,
    timestamps: &'a [i64],
}

// ============================================================================
// Aggregation
// ============================================================================

/// Builds the [`MetricStore`] for `grouping`, reading tables from `source`.
///
/// # Errors
///
/// - [`EvalError::InvalidConfig`] if `config` fails validation or its
///   schema differs from the one `grouping` was built with
/// - [`EvalError::EmptyInput`] if the grouping is empty or no timeline
///   received a single snapshot
pub fn aggregate<T>(
    grouping: &Grouping,
    source: &T,
    config: &EvalConfig,
) -> Result<MetricStore, EvalError>
where
    T: TableSource + ?Sized,
{
    aggregate_with_progress(grouping, source, config, |_, _| {})
}

/// Like [`aggregate`], calling `on_group` after each group is complete.
pub fn aggregate_with_progress<T, F>(
    grouping: &Grouping,
    source: &T,
    config: &EvalConfig,
    mut on_group: F,
) -> Result<MetricStore, EvalError>
where
    T: TableSource + ?Sized,
    F: FnMut(&GroupKey, &Timeline),
{
    config.validate()?;
    if grouping.schema != config.schema {
        return Err(EvalError::InvalidConfig(format!(
            "sources were grouped with the {} grammar but the configuration uses {}",
            grouping.schema, config.schema
        )));
    }
    if grouping.is_empty() {
        return Err(EvalError::EmptyInput(format!(
            "no source names match the {} naming grammar",
            config.schema
        )));
    }

    let metrics = config.metrics();
    let names: Vec<String> = metrics.iter().map(MetricKind::name).collect();
    let mut store = MetricStore::new(config.clone(), names.clone());
    store.rejected = grouping.rejected.clone();

    for (key, entries) in &grouping.groups {
        debug!(group = %key, sources = entries.len(), "Aggregating timeline");

        let mut measured: Vec<(&SourceEntry, Vec<f64>)> = Vec::with_capacity(entries.len());
        for entry in entries {
            match measure_source(source, entry, &metrics) {
                Ok(values) => measured.push((entry, values)),
                Err(e) => {
                    warn!(group = %key, "{}; skipping", e);
                    store.skipped.push(SkippedSource {
                        source: entry.name.clone(),
                        group: key.clone(),
                        reason: e.to_string(),
                    });
                }
            }
        }

        measured.sort_by_key(|(entry, _)| (entry.timestamp(), entry.order));

        let mut timeline = Timeline::new(&names);
        for (entry, values) in measured {
            timeline.push(entry.timestamp(), &entry.name, &names, values);
        }
        if config.cumulative {
            timeline.accumulate();
        }

        on_group(key, &timeline);
        store.timelines.insert(key.clone(), timeline);
    }

    if store.timelines.values().all(Timeline::is_empty) {
        return Err(EvalError::EmptyInput(format!(
            "all {} sources in {} groups were skipped",
            grouping.source_count(),
            grouping.group_count()
        )));
    }

    info!(
        groups = store.len(),
        skipped = store.skipped.len(),
        rejected = store.rejected.len(),
        "Aggregation complete"
    );
    Ok(store)
}

fn measure_source<T>(
    source: &T,
    entry: &SourceEntry,
    metrics: &[MetricKind],
) -> Result<Vec<f64>, SnapshotError>
where
    T: TableSource + ?Sized,
{
    let table = source.load(&entry.name)?;
    let snapshot = Snapshot::new(entry.meta.clone(), table.score_items(&entry.name)?);
    let ranked = RankedSnapshot::from_snapshot(&snapshot);
    debug!(source = %entry.name, items = snapshot.len(), "Ranked snapshot");
    Ok(metrics.iter().map(|metric| metric.evaluate(&ranked)).collect())
}
