//! Classification of snapshot sources into experiment timelines.
//!
//! Grouping only looks at names: each source name is parsed with the
//! configured grammar and filed under its [`GroupKey`]. Names that do not
//! parse are reported and dropped; no partial key is ever created.

use crate::config::DimensionSchema;
use crate::snapshot::{parse_source_name, SnapshotMeta};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use tracing::{debug, warn};

/// Experiment dimensions identifying one timeline.
///
/// Field order is the dimension order `dataset → [norm_method →] oracle →
/// algorithm → fold`; the derived `Ord` therefore iterates groups in that
/// hierarchy.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct GroupKey {
    pub dataset: String,
    /// Present only for the extended grammar
    pub norm_method: Option<String>,
    pub oracle: String,
    pub algorithm: String,
    pub fold: String,
}

impl GroupKey {
    pub fn from_meta(meta: &SnapshotMeta) -> Self {
        Self {
            dataset: meta.dataset.clone(),
            norm_method: meta.norm_method.clone(),
            oracle: meta.oracle.clone(),
            algorithm: meta.algorithm.clone(),
            fold: meta.fold.clone(),
        }
    }
}

impl fmt::Display for GroupKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.dataset)?;
        if let Some(norm) = &self.norm_method {
            write!(f, "/{}", norm)?;
        }
        write!(f, "/{}/{}/{}", self.oracle, self.algorithm, self.fold)
    }
}

/// One source filed under a group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceEntry {
    /// Source name as enumerated
    pub name: String,
    pub meta: SnapshotMeta,
    /// Position in the enumeration; breaks duplicate-timestamp ties
    pub order: usize,
}

impl SourceEntry {
    pub fn timestamp(&self) -> i64 {
        self.meta.timestamp
    }
}

/// Result of grouping a collection of source names.
#[derive(Debug, Clone, Default)]
pub struct Grouping {
    pub schema: DimensionSchema,
    pub groups: BTreeMap<GroupKey, Vec<SourceEntry>>,
    /// Names that did not match the grammar
    pub rejected: Vec<String>,
}

impl Grouping {
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    pub fn group_count(&self) -> usize {
        self.groups.len()
    }

    pub fn source_count(&self) -> usize {
        self.groups.values().map(Vec::len).sum()
    }
}

/// Files every parsable name under its [`GroupKey`].
///
/// Enumeration order is preserved within each group (as `order`), which is
/// what makes the later timestamp sort deterministic for duplicate
/// timestamps.
pub fn group_sources<I, S>(names: I, schema: DimensionSchema) -> Grouping
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut grouping = Grouping {
        schema,
        ..Grouping::default()
    };

    for (order, name) in names.into_iter().enumerate() {
        let name = name.as_ref();
        match parse_source_name(name, schema) {
            Ok(meta) => {
                let key = GroupKey::from_meta(&meta);
                debug!(source = name, group = %key, "Grouped snapshot source");
                grouping.groups.entry(key).or_default().push(SourceEntry {
                    name: name.to_string(),
                    meta,
                    order,
                });
            }
            Err(e) => {
                warn!("{}; skipping", e);
                grouping.rejected.push(name.to_string());
            }
        }
    }

    grouping
}
