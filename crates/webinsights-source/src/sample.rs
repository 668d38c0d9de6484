//! Deterministic sample data, shaped like a typical small business site.

use anyhow::Result;
use chrono::Datelike;
use tracing::debug;

use webinsights_core::bundle::{MetricsBlock, OrderedMap, RawMetricsBundle, SeriesMetric, TopPage};
use webinsights_core::processing::round2;
use webinsights_core::source::{MetricsRequest, DATE_FORMAT};
use webinsights_core::MetricsSource;

const WEEKDAY_VISITORS: u64 = 100;
const WEEKEND_VISITORS: u64 = 70;
const VISITORS_PER_WEEKDAY_INDEX: u64 = 10;

/// `(source, percent of total visitors)`
const TRAFFIC_MIX: [(&str, u64); 5] = [
    ("direct", 35),
    ("organic", 25),
    ("referral", 20),
    ("social", 15),
    ("email", 5),
];

/// `(device, percent of total visitors)`
const DEVICE_MIX: [(&str, u64); 3] = [("desktop", 55), ("mobile", 35), ("tablet", 10)];

/// `(path, percent of total pageviews, average time on page)`
const PAGES: [(&str, u64, &str); 5] = [
    ("/", 40, "00:02:15"),
    ("/products", 20, "00:01:45"),
    ("/about", 15, "00:01:20"),
    ("/contact", 10, "00:00:55"),
    ("/blog", 15, "00:03:10"),
];

/// Generates the same bundle for the same request, every time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SampleMetricsSource;

impl SampleMetricsSource {
    pub fn generate(request: &MetricsRequest) -> RawMetricsBundle {
        let mut visitors = SeriesMetric::default();
        let mut pageviews = SeriesMetric::default();

        for day in request.days() {
            let index = u64::from(day.weekday().num_days_from_monday());
            let base = if index < 5 {
                WEEKDAY_VISITORS
            } else {
                WEEKEND_VISITORS
            };
            let day_visitors = base + VISITORS_PER_WEEKDAY_INDEX * index;
            let day_pageviews = day_visitors * 7 / 2;
            let key = day.format(DATE_FORMAT).to_string();

            visitors.total += day_visitors;
            visitors.daily.insert(key.clone(), day_visitors);
            pageviews.total += day_pageviews;
            pageviews.daily.insert(key, day_pageviews);
        }

        let pages_per_session = if visitors.total > 0 {
            round2(pageviews.total as f64 / visitors.total as f64)
        } else {
            0.0
        };
        let mix = |total: u64, mix: &[(&str, u64)]| -> OrderedMap<u64> {
            mix.iter()
                .map(|(name, percent)| (*name, total * percent / 100))
                .collect()
        };

        RawMetricsBundle {
            report_name: Some(format!("Website analysis: {}", request.property_id)),
            start_date: Some(request.start_date.format(DATE_FORMAT).to_string()),
            end_date: Some(request.end_date.format(DATE_FORMAT).to_string()),
            traffic_sources: Some(mix(visitors.total, &TRAFFIC_MIX)),
            devices: Some(mix(visitors.total, &DEVICE_MIX)),
            top_pages: Some(
                PAGES
                    .iter()
                    .take(request.top_pages_limit)
                    .map(|(path, percent, avg_time)| TopPage {
                        path: path.to_string(),
                        pageviews: pageviews.total * percent / 100,
                        avg_time: avg_time.to_string(),
                    })
                    .collect(),
            ),
            metrics: Some(MetricsBlock {
                visitors,
                pageviews,
                pages_per_session,
            }),
        }
    }
}

#[async_trait::async_trait]
impl MetricsSource for SampleMetricsSource {
    fn name(&self) -> &'static str {
        "sample"
    }

    async fn fetch(&self, request: &MetricsRequest) -> Result<RawMetricsBundle> {
        let bundle = Self::generate(request);
        debug!(
            property_id = %request.property_id,
            start = %request.start_date,
            end = %request.end_date,
            "Generated sample metrics"
        );
        Ok(bundle)
    }
}
