//! Raw metrics bundle as produced by a metrics source.

use std::fmt;
use std::marker::PhantomData;

use indexmap::IndexMap;
use serde::de::{Deserializer, MapAccess, Visitor};
use serde::ser::{SerializeMap, Serializer};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::PipelineError;
use crate::pipeline::PipelineStage;

/// A string-keyed mapping that keeps the order its entries were inserted in.
///
/// Daily series rely on this for chronological order and share breakdowns rely
/// on it for first-encountered tie-breaking. A repeated key keeps its original
/// position and takes the later value. Equality is order-sensitive.
#[derive(Debug, Clone)]
pub struct OrderedMap<V> {
    entries: IndexMap<String, V>,
}

impl<V> Default for OrderedMap<V> {
    fn default() -> Self {
        Self {
            entries: IndexMap::new(),
        }
    }
}

impl<V: PartialEq> PartialEq for OrderedMap<V> {
    fn eq(&self, other: &Self) -> bool {
        self.entries.len() == other.entries.len() && self.iter().eq(other.iter())
    }
}

impl<V> OrderedMap<V> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: IndexMap::with_capacity(capacity),
        }
    }

    pub fn insert(&mut self, key: impl Into<String>, value: V) {
        self.entries.insert(key.into(), value);
    }

    pub fn get(&self, key: &str) -> Option<&V> {
        self.entries.get(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &V)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn values(&self) -> impl Iterator<Item = &V> {
        self.entries.values()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K: Into<String>, V> FromIterator<(K, V)> for OrderedMap<V> {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = OrderedMap::new();
        for (key, value) in iter {
            map.insert(key, value);
        }
        map
    }
}

impl<V: Serialize> Serialize for OrderedMap<V> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (key, value) in &self.entries {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

struct OrderedMapVisitor<V>(PhantomData<V>);

impl<'de, V: Deserialize<'de>> Visitor<'de> for OrderedMapVisitor<V> {
    type Value = OrderedMap<V>;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str("a map of string keys")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
        let mut map = OrderedMap::with_capacity(access.size_hint().unwrap_or(0).min(4096));
        while let Some((key, value)) = access.next_entry::<String, V>()? {
            map.insert(key, value);
        }
        Ok(map)
    }
}

impl<'de, V: Deserialize<'de>> Deserialize<'de> for OrderedMap<V> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_map(OrderedMapVisitor(PhantomData))
    }
}

/// Total plus per-day breakdown, days in chronological order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SeriesMetric {
    pub total: u64,
    pub daily: OrderedMap<u64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MetricsBlock {
    pub visitors: SeriesMetric,
    pub pageviews: SeriesMetric,
    pub pages_per_session: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopPage {
    pub path: String,
    pub pageviews: u64,
    /// `HH:MM:SS` as reported by the source.
    #[serde(default)]
    pub avg_time: String,
}

/// Everything a metrics source reports for one property and date range.
///
/// Every section is optional so a partial bundle degrades to empty output
/// instead of failing; a section with the wrong shape is rejected.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RawMetricsBundle {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub report_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metrics: Option<MetricsBlock>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub traffic_sources: Option<OrderedMap<u64>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_pages: Option<Vec<TopPage>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub devices: Option<OrderedMap<u64>>,
}

impl RawMetricsBundle {
    /// Validate an untyped document and convert it into a bundle.
    ///
    /// A non-object document, a section of the wrong type, a negative count or
    /// a non-finite/negative pages-per-session value is `InvalidInputFormat`.
    /// `{}` is a valid, empty bundle.
    pub fn from_value(value: Value) -> Result<Self, PipelineError> {
        if !value.is_object() {
            return Err(PipelineError::invalid_input(
                PipelineStage::Extracted,
                format!("expected a JSON object, found {}", value_kind(&value)),
            ));
        }

        let bundle: Self = serde_json::from_value(value)
            .map_err(|e| PipelineError::invalid_input(PipelineStage::Extracted, e.to_string()))?;
        bundle.validate()?;
        Ok(bundle)
    }

    pub fn from_json_str(raw: &str) -> Result<Self, PipelineError> {
        let value: Value = serde_json::from_str(raw).map_err(|e| {
            PipelineError::invalid_input(PipelineStage::Extracted, format!("malformed JSON: {e}"))
        })?;
        Self::from_value(value)
    }

    fn validate(&self) -> Result<(), PipelineError> {
        if let Some(metrics) = &self.metrics {
            let pps = metrics.pages_per_session;
            if !pps.is_finite() || pps < 0.0 {
                return Err(PipelineError::invalid_input(
                    PipelineStage::Extracted,
                    format!("pages_per_session must be a non-negative number, got {pps}"),
                ));
            }
        }
        Ok(())
    }
}

fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn ordered_map_keeps_document_order() {
        let map: OrderedMap<u64> =
            serde_json::from_str(r#"{"organic": 5, "direct": 9, "email": 1}"#).expect("parse");
        let keys: Vec<&str> = map.keys().collect();
        assert_eq!(keys, vec!["organic", "direct", "email"]);
    }

    #[test]
    fn ordered_map_repeated_key_keeps_first_position() {
        let mut map = OrderedMap::new();
        map.insert("a", 1);
        map.insert("b", 2);
        map.insert("a", 3);
        assert_eq!(map.len(), 2);
        assert_eq!(map.get("a"), Some(&3));
        assert_eq!(map.keys().next(), Some("a"));
    }

    #[test]
    fn ordered_map_equality_follows_order() {
        let ab: OrderedMap<u64> = [("a", 1), ("b", 2)].into_iter().collect();
        let ba: OrderedMap<u64> = [("b", 2), ("a", 1)].into_iter().collect();
        assert_ne!(ab, ba);
        assert_eq!(ab, ab.clone());
    }

    #[test]
    fn long_daily_series_parses_in_order() {
        let days = 100_000;
        let daily: serde_json::Map<String, Value> =
            (0..days).map(|i| (format!("d{i:06}"), json!(i))).collect();
        let raw = json!({ "metrics": { "visitors": { "daily": daily } } }).to_string();

        let started = std::time::Instant::now();
        let bundle = RawMetricsBundle::from_json_str(&raw).expect("valid");
        assert!(started.elapsed() < std::time::Duration::from_secs(5));

        let series = bundle.metrics.expect("metrics").visitors.daily;
        assert_eq!(series.len(), days);
        assert_eq!(series.keys().next(), Some("d000000"));
        assert_eq!(series.get("d099999"), Some(&99_999));
    }

    #[test]
    fn empty_object_is_a_valid_empty_bundle() {
        let bundle = RawMetricsBundle::from_value(json!({})).expect("valid");
        assert_eq!(bundle, RawMetricsBundle::default());
    }

    #[test]
    fn non_object_is_rejected() {
        let err = RawMetricsBundle::from_value(json!([1, 2, 3])).expect_err("array");
        assert_eq!(err.stage(), PipelineStage::Extracted);
        assert!(err.to_string().contains("an array"));
    }

    #[test]
    fn wrong_section_type_is_rejected() {
        let err = RawMetricsBundle::from_value(json!({ "traffic_sources": "direct" }))
            .expect_err("string section");
        assert!(matches!(err, PipelineError::InvalidInputFormat { .. }));
    }

    #[test]
    fn negative_count_is_rejected() {
        let result = RawMetricsBundle::from_value(json!({ "devices": { "mobile": -4 } }));
        assert!(result.is_err());
    }

    #[test]
    fn negative_pages_per_session_is_rejected() {
        let result =
            RawMetricsBundle::from_value(json!({ "metrics": { "pages_per_session": -1.0 } }));
        assert!(result.is_err());
    }

    #[test]
    fn malformed_json_is_rejected() {
        assert!(RawMetricsBundle::from_json_str("{not json").is_err());
    }

    #[test]
    fn partial_metrics_default_to_zero() {
        let bundle = RawMetricsBundle::from_value(json!({
            "metrics": { "visitors": { "total": 12 } }
        }))
        .expect("valid");
        let metrics = bundle.metrics.expect("metrics block");
        assert_eq!(metrics.visitors.total, 12);
        assert!(metrics.visitors.daily.is_empty());
        assert_eq!(metrics.pageviews.total, 0);
        assert_eq!(metrics.pages_per_session, 0.0);
    }
}
