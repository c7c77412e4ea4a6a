use std::collections::BTreeSet;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::predicate::PredicateSummary;
use crate::util::float_div;

/// Raw JSON object as written by the producer, key order preserved.
pub type JsonMap = Map<String, Value>;

/// Statistics computed at one point of a session's timeline.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct DerivedStats {
    pub items_processed: i64,
    pub items_shown: i64,
    pub new_hits: usize,
    #[serde(rename = "pass_rate(%)")]
    pub pass_rate: f64,
    #[serde(rename = "precision(%)")]
    pub precision: f64,
    #[serde(rename = "elapsed_time(min)")]
    pub elapsed_time_min: f64,
    pub productivity: f64,
}

impl DerivedStats {
    /// Column names, in serialized order.
    pub const KEYS: [&'static str; 7] = [
        "items_processed",
        "items_shown",
        "new_hits",
        "pass_rate(%)",
        "precision(%)",
        "elapsed_time(min)",
        "productivity",
    ];

    pub fn compute(items_processed: i64, items_shown: i64, new_hits: usize, elapsed_ms: i64) -> Self {
        let elapsed_time_min = elapsed_ms as f64 / 60_000.0;
        Self {
            items_processed,
            items_shown,
            new_hits,
            pass_rate: float_div(items_shown as f64, items_processed as f64) * 100.0,
            precision: float_div(new_hits as f64, items_shown as f64) * 100.0,
            elapsed_time_min,
            productivity: float_div(new_hits as f64, elapsed_time_min),
        }
    }

    /// Every field zero, used for chart reset points.
    pub fn zero() -> Self {
        Self::default()
    }

    pub fn is_zero(&self) -> bool {
        *self == Self::zero()
    }
}

/// One image as logged by the producer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageRecord {
    pub index: u64,
    pub attributes: JsonMap,
    pub stats: JsonMap,
    /// Relative to the root: `<session>/thumbnail/<image>.jpeg`.
    pub img_path: String,
    pub arrival_time_ms: i64,
    pub derived_stats: DerivedStats,
}

/// The synthesized final point of an ended session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EndRecord {
    /// The session end time, standing in for an arrival time.
    pub arrival_time_ms: i64,
    pub stats: JsonMap,
    pub derived_stats: DerivedStats,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DerivedInfo {
    pub start_time: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_time: Option<String>,
}

/// A fully parsed session directory.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionRecord {
    pub index: u64,
    pub predicate_path: PathBuf,
    pub predicates: Value,
    pub predicate_summaries: Vec<PredicateSummary>,
    pub start_info: JsonMap,
    pub start_time_ms: i64,
    pub derived_info: DerivedInfo,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_info: Option<JsonMap>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_stats: Option<EndRecord>,
    /// `None` until the first image arrives.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub per_img: Option<Vec<ImageRecord>>,
    pub positive_ids: BTreeSet<String>,
    pub negative_ids: BTreeSet<String>,
}

impl SessionRecord {
    pub fn is_ended(&self) -> bool {
        self.end_stats.is_some()
    }

    pub fn images(&self) -> &[ImageRecord] {
        self.per_img.as_deref().unwrap_or(&[])
    }

    /// Derived stats of the most recent point: the end record if the session
    /// ended, otherwise the last image.
    pub fn latest_stats(&self) -> Option<&DerivedStats> {
        self.end_stats
            .as_ref()
            .map(|end| &end.derived_stats)
            .or_else(|| self.images().last().map(|img| &img.derived_stats))
    }
}

/// Every session of one candidate root, in session order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RootData {
    pub root: PathBuf,
    pub sessions: Vec<SessionRecord>,
}

impl RootData {
    /// Stat column names, once any session has at least one image.
    pub fn stat_keys(&self) -> Option<Vec<String>> {
        self.sessions
            .iter()
            .any(|s| !s.images().is_empty())
            .then(|| DerivedStats::KEYS.iter().map(|k| k.to_string()).collect())
    }

    pub fn session(&self, index: u64) -> Option<&SessionRecord> {
        self.sessions.iter().find(|s| s.index == index)
    }
}
