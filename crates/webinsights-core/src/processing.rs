//! Processing stage: shares, trend, anomalies and page names derived from a
//! raw bundle.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::bundle::{OrderedMap, RawMetricsBundle, TopPage};
use crate::error::PipelineError;

/// A point is anomalous when it sits at least this many population standard
/// deviations away from the series mean.
pub const ANOMALY_STDDEV_FACTOR: f64 = 2.0;

pub const MIN_TREND_POINTS: usize = 2;
pub const MIN_ANOMALY_POINTS: usize = 3;

const DEFAULT_REPORT_TITLE: &str = "Website analysis";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrendDirection {
    Growth,
    Decline,
}

impl TrendDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Growth => "growth",
            Self::Decline => "decline",
        }
    }
}

impl fmt::Display for TrendDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Trend {
    pub direction: TrendDirection,
    /// Absolute change between the two half-period means, in percent.
    pub magnitude: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnomalyKind {
    Spike,
    Drop,
}

impl AnomalyKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Spike => "spike",
            Self::Drop => "drop",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Anomaly {
    pub kind: AnomalyKind,
    pub date: String,
    pub value: u64,
    pub deviation_percent: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportInfo {
    pub title: String,
    pub period: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CoreMetrics {
    pub visitors: u64,
    pub pageviews: u64,
    pub pages_per_session: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShareEntry {
    pub name: String,
    pub value: u64,
    pub percentage: f64,
}

/// Per-category percentages plus the category with the largest raw count.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShareBreakdown {
    pub entries: Vec<ShareEntry>,
    pub dominant: Option<ShareEntry>,
}

impl ShareBreakdown {
    pub fn share_of(&self, name: &str) -> Option<f64> {
        self.entries
            .iter()
            .find(|entry| entry.name == name)
            .map(|entry| entry.percentage)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageSummary {
    pub name: String,
    pub path: String,
    pub pageviews: u64,
    pub avg_time: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyPoint {
    pub date: String,
    pub value: u64,
}

/// Output of the processing stage. Built once per run and only read afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessedMetrics {
    pub report_info: ReportInfo,
    pub core_metrics: Option<CoreMetrics>,
    pub trend: Option<Trend>,
    pub traffic_share: Option<ShareBreakdown>,
    pub device_share: Option<ShareBreakdown>,
    pub top_pages_simplified: Vec<PageSummary>,
    pub anomalies: Vec<Anomaly>,
    pub visitor_series: Vec<DailyPoint>,
}

/// Validate an untyped bundle, then process it.
pub fn process_value(value: Value) -> Result<ProcessedMetrics, PipelineError> {
    let raw = RawMetricsBundle::from_value(value)?;
    Ok(process(&raw))
}

pub fn process(raw: &RawMetricsBundle) -> ProcessedMetrics {
    let visitor_series: Vec<DailyPoint> = raw
        .metrics
        .as_ref()
        .map(|metrics| {
            metrics
                .visitors
                .daily
                .iter()
                .map(|(date, value)| DailyPoint {
                    date: date.to_string(),
                    value: *value,
                })
                .collect()
        })
        .unwrap_or_default();
    let daily_values: Vec<u64> = visitor_series.iter().map(|point| point.value).collect();

    let processed = ProcessedMetrics {
        report_info: report_info(raw),
        core_metrics: raw.metrics.as_ref().map(|metrics| CoreMetrics {
            visitors: metrics.visitors.total,
            pageviews: metrics.pageviews.total,
            pages_per_session: metrics.pages_per_session,
        }),
        trend: detect_trend(&daily_values),
        traffic_share: raw.traffic_sources.as_ref().map(share_breakdown),
        device_share: raw.devices.as_ref().map(share_breakdown),
        top_pages_simplified: raw
            .top_pages
            .iter()
            .flatten()
            .map(summarize_page)
            .collect(),
        anomalies: detect_anomalies(&visitor_series),
        visitor_series,
    };

    debug!(
        days = processed.visitor_series.len(),
        trend = ?processed.trend.map(|t| t.direction),
        anomalies = processed.anomalies.len(),
        "Processed raw metrics bundle"
    );
    processed
}

fn report_info(raw: &RawMetricsBundle) -> ReportInfo {
    ReportInfo {
        title: raw
            .report_name
            .clone()
            .unwrap_or_else(|| DEFAULT_REPORT_TITLE.to_string()),
        period: format!(
            "From {} to {}",
            raw.start_date.as_deref().unwrap_or("unknown"),
            raw.end_date.as_deref().unwrap_or("unknown")
        ),
    }
}

fn summarize_page(page: &TopPage) -> PageSummary {
    PageSummary {
        name: simplify_page_path(&page.path),
        path: page.path.clone(),
        pageviews: page.pageviews,
        avg_time: page.avg_time.clone(),
    }
}

pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// `round(100 * value / total, 2)` per key, in mapping order. An all-zero
/// mapping yields 0 for every key.
pub fn percentage_shares(counts: &OrderedMap<u64>) -> Vec<ShareEntry> {
    let total: f64 = counts.values().map(|value| *value as f64).sum();
    counts
        .iter()
        .map(|(name, value)| ShareEntry {
            name: name.to_string(),
            value: *value,
            percentage: if total > 0.0 {
                round2(100.0 * *value as f64 / total)
            } else {
                0.0
            },
        })
        .collect()
}

/// Key with the largest raw count; the first one wins a tie.
pub fn dominant_key(counts: &OrderedMap<u64>) -> Option<&str> {
    let mut best: Option<(&str, u64)> = None;
    for (name, value) in counts.iter() {
        match best {
            Some((_, best_value)) if *value <= best_value => {}
            _ => best = Some((name, *value)),
        }
    }
    best.map(|(name, _)| name)
}

pub fn share_breakdown(counts: &OrderedMap<u64>) -> ShareBreakdown {
    let entries = percentage_shares(counts);
    let dominant = dominant_key(counts)
        .and_then(|name| entries.iter().find(|entry| entry.name == name))
        .cloned();
    ShareBreakdown { entries, dominant }
}

fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

fn stddev(values: &[f64], mean_value: f64) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let variance = values
        .iter()
        .map(|v| {
            let diff = *v - mean_value;
            diff * diff
        })
        .sum::<f64>()
        / values.len() as f64;
    Some(variance.sqrt())
}

/// Compare the mean of the first half of the series with the mean of the
/// second half. The midpoint is `len / 2`, so an odd-length series puts its
/// extra point in the second half.
///
/// Returns `None` with fewer than [`MIN_TREND_POINTS`] values or when the first
/// half averages zero.
pub fn detect_trend(values: &[u64]) -> Option<Trend> {
    if values.len() < MIN_TREND_POINTS {
        return None;
    }
    let values: Vec<f64> = values.iter().map(|v| *v as f64).collect();
    let (first, second) = values.split_at(values.len() / 2);
    let first_mean = mean(first)?;
    let second_mean = mean(second)?;
    if first_mean <= 0.0 {
        return None;
    }

    let growth_rate = (second_mean - first_mean) / first_mean * 100.0;
    Some(Trend {
        direction: if growth_rate > 0.0 {
            TrendDirection::Growth
        } else {
            TrendDirection::Decline
        },
        magnitude: round2(growth_rate.abs()),
    })
}

/// Flag points at least [`ANOMALY_STDDEV_FACTOR`] population standard
/// deviations from the mean, in series order.
///
/// Needs [`MIN_ANOMALY_POINTS`] points. A zero mean or a zero deviation
/// (constant series) yields no anomalies.
pub fn detect_anomalies(series: &[DailyPoint]) -> Vec<Anomaly> {
    if series.len() < MIN_ANOMALY_POINTS {
        return Vec::new();
    }
    let values: Vec<f64> = series.iter().map(|point| point.value as f64).collect();
    let Some(mean_value) = mean(&values) else {
        return Vec::new();
    };
    if mean_value <= f64::EPSILON {
        return Vec::new();
    }
    let deviation = stddev(&values, mean_value).unwrap_or(0.0);
    if deviation <= f64::EPSILON {
        return Vec::new();
    }
    let threshold = ANOMALY_STDDEV_FACTOR * deviation;

    series
        .iter()
        .filter_map(|point| {
            let diff = point.value as f64 - mean_value;
            if diff.abs() < threshold {
                return None;
            }
            Some(Anomaly {
                kind: if diff > 0.0 {
                    AnomalyKind::Spike
                } else {
                    AnomalyKind::Drop
                },
                date: point.date.clone(),
                value: point.value,
                deviation_percent: round2((diff / mean_value).abs() * 100.0),
            })
        })
        .collect()
}

/// Uppercase the first character and lowercase the rest.
pub fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first
            .to_uppercase()
            .chain(chars.flat_map(char::to_lowercase))
            .collect(),
        None => String::new(),
    }
}

/// Human label for a mapping key: `paid_search` becomes `Paid search`.
pub fn display_label(key: &str) -> String {
    capitalize(&key.replace('_', " "))
}

/// `/` is the home page; anything else loses its outer slashes, turns `-` and
/// `_` into spaces and is title-cased word by word. Text that is already a
/// readable name comes back unchanged apart from casing.
pub fn simplify_page_path(path: &str) -> String {
    if path == "/" {
        return "Home Page".to_string();
    }
    path.trim_matches('/')
        .replace(['-', '_'], " ")
        .split_whitespace()
        .map(capitalize)
        .collect::<Vec<_>>()
        .join(" ")
}
