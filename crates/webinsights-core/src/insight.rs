//! Insight stage: rule-based natural-language synthesis over processed
//! metrics.
//!
//! Every rule is an independent predicate plus template evaluated against a
//! [`ProcessedMetrics`]. [`RULES`] fixes the order in which they run, which is
//! also the order of the sentences and bullets they produce.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::processing::{display_label, ProcessedMetrics, ShareEntry};

/// Non-dominant sources below this share are flagged as growth opportunities.
pub const LOW_SOURCE_SHARE: f64 = 15.0;
pub const LOW_MOBILE_SHARE: f64 = 30.0;
pub const HIGH_MOBILE_SHARE: f64 = 50.0;
pub const LOW_PAGES_PER_SESSION: f64 = 2.0;
pub const LOW_ORGANIC_SHARE: f64 = 20.0;
pub const LOW_SOCIAL_SHARE: f64 = 10.0;

const TOP_PAGES_IN_KEY_POINTS: usize = 3;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InsightBundle {
    pub summary: String,
    pub key_points: Vec<String>,
    pub opportunities: Vec<String>,
    pub practical_advice: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsightSection {
    Summary,
    KeyPoints,
    Opportunities,
    PracticalAdvice,
}

pub struct InsightRule {
    pub id: &'static str,
    pub section: InsightSection,
    pub apply: fn(&ProcessedMetrics) -> Vec<String>,
}

impl InsightRule {
    pub fn evaluate(&self, processed: &ProcessedMetrics) -> Vec<String> {
        (self.apply)(processed)
    }
}

pub const RULES: &[InsightRule] = &[
    InsightRule {
        id: "summary_totals",
        section: InsightSection::Summary,
        apply: summary_totals,
    },
    InsightRule {
        id: "summary_trend",
        section: InsightSection::Summary,
        apply: summary_trend,
    },
    InsightRule {
        id: "summary_dominant_source",
        section: InsightSection::Summary,
        apply: summary_dominant_source,
    },
    InsightRule {
        id: "traffic_source_ranking",
        section: InsightSection::KeyPoints,
        apply: traffic_source_ranking,
    },
    InsightRule {
        id: "device_ranking",
        section: InsightSection::KeyPoints,
        apply: device_ranking,
    },
    InsightRule {
        id: "top_pages",
        section: InsightSection::KeyPoints,
        apply: top_pages,
    },
    InsightRule {
        id: "anomaly_summary",
        section: InsightSection::KeyPoints,
        apply: anomaly_summary,
    },
    InsightRule {
        id: "low_share_sources",
        section: InsightSection::Opportunities,
        apply: low_share_sources,
    },
    InsightRule {
        id: "mobile_share",
        section: InsightSection::Opportunities,
        apply: mobile_share,
    },
    InsightRule {
        id: "internal_linking",
        section: InsightSection::PracticalAdvice,
        apply: internal_linking,
    },
    InsightRule {
        id: "seo",
        section: InsightSection::PracticalAdvice,
        apply: seo,
    },
    InsightRule {
        id: "social_presence",
        section: InsightSection::PracticalAdvice,
        apply: social_presence,
    },
    InsightRule {
        id: "weakest_page",
        section: InsightSection::PracticalAdvice,
        apply: weakest_page,
    },
];

pub fn rule(id: &str) -> Option<&'static InsightRule> {
    RULES.iter().find(|rule| rule.id == id)
}

pub fn generate_insights(processed: &ProcessedMetrics) -> InsightBundle {
    let mut summary = Vec::new();
    let mut bundle = InsightBundle::default();

    for rule in RULES {
        let produced = rule.evaluate(processed);
        match rule.section {
            InsightSection::Summary => summary.extend(produced),
            InsightSection::KeyPoints => bundle.key_points.extend(produced),
            InsightSection::Opportunities => bundle.opportunities.extend(produced),
            InsightSection::PracticalAdvice => bundle.practical_advice.extend(produced),
        }
    }
    bundle.summary = summary.join(" ");

    debug!(
        key_points = bundle.key_points.len(),
        opportunities = bundle.opportunities.len(),
        advice = bundle.practical_advice.len(),
        "Generated insights"
    );
    bundle
}

/// Seconds in an `HH:MM:SS`, `MM:SS` or `SS` duration. Anything else is 0.
pub fn time_to_seconds(raw: &str) -> u64 {
    let parts: Option<Vec<u64>> = raw
        .trim()
        .split(':')
        .map(|part| part.trim().parse::<u64>().ok())
        .collect();
    match parts.as_deref() {
        Some([hours, minutes, seconds]) => hours
            .saturating_mul(3600)
            .saturating_add(minutes.saturating_mul(60))
            .saturating_add(*seconds),
        Some([minutes, seconds]) => minutes.saturating_mul(60).saturating_add(*seconds),
        Some([seconds]) => *seconds,
        _ => 0,
    }
}

fn traffic_share_of(processed: &ProcessedMetrics, source: &str) -> Option<f64> {
    processed
        .traffic_share
        .as_ref()
        .and_then(|share| share.share_of(source))
}

fn ranked(entries: &[ShareEntry]) -> Vec<&ShareEntry> {
    let mut sorted: Vec<&ShareEntry> = entries.iter().collect();
    sorted.sort_by(|a, b| b.percentage.total_cmp(&a.percentage));
    sorted
}

fn ranking_text(entries: &[ShareEntry]) -> String {
    ranked(entries)
        .iter()
        .map(|entry| format!("{} ({}%)", display_label(&entry.name), entry.percentage))
        .collect::<Vec<_>>()
        .join(", ")
}

fn summary_totals(processed: &ProcessedMetrics) -> Vec<String> {
    let (visitors, pageviews, pages_per_session) = processed
        .core_metrics
        .map(|core| (core.visitors, core.pageviews, core.pages_per_session))
        .unwrap_or((0, 0, 0.0));
    vec![format!(
        "During the analysed period the site received {visitors} visitors who viewed \
         {pageviews} pages, with an average of {pages_per_session} pages per session."
    )]
}

fn summary_trend(processed: &ProcessedMetrics) -> Vec<String> {
    processed
        .trend
        .map(|trend| {
            format!(
                "Traffic shows a {}% {} compared with the first half of the period.",
                trend.magnitude, trend.direction
            )
        })
        .into_iter()
        .collect()
}

fn summary_dominant_source(processed: &ProcessedMetrics) -> Vec<String> {
    processed
        .traffic_share
        .as_ref()
        .and_then(|share| share.dominant.as_ref())
        .map(|dominant| {
            format!(
                "The main traffic source is {} ({}% of the total).",
                display_label(&dominant.name),
                dominant.percentage
            )
        })
        .into_iter()
        .collect()
}

fn traffic_source_ranking(processed: &ProcessedMetrics) -> Vec<String> {
    match &processed.traffic_share {
        Some(share) if !share.is_empty() => vec![format!(
            "The main traffic sources are: {}.",
            ranking_text(&share.entries)
        )],
        _ => Vec::new(),
    }
}

fn device_ranking(processed: &ProcessedMetrics) -> Vec<String> {
    match &processed.device_share {
        Some(share) if !share.is_empty() => vec![format!(
            "Visitors mainly reach the site from: {}.",
            ranking_text(&share.entries)
        )],
        _ => Vec::new(),
    }
}

fn top_pages(processed: &ProcessedMetrics) -> Vec<String> {
    if processed.top_pages_simplified.is_empty() {
        return Vec::new();
    }
    let pages = processed
        .top_pages_simplified
        .iter()
        .take(TOP_PAGES_IN_KEY_POINTS)
        .map(|page| format!("{} ({} views)", page.name, page.pageviews))
        .collect::<Vec<_>>()
        .join(", ");
    vec![format!("The most visited pages are: {pages}.")]
}

fn anomaly_summary(processed: &ProcessedMetrics) -> Vec<String> {
    if processed.anomalies.is_empty() {
        return Vec::new();
    }
    let anomalies = processed
        .anomalies
        .iter()
        .map(|anomaly| {
            format!(
                "{} of {}% on {}",
                anomaly.kind.as_str(),
                anomaly.deviation_percent,
                anomaly.date
            )
        })
        .collect::<Vec<_>>()
        .join(", ");
    vec![format!("The following anomalies were detected: {anomalies}.")]
}

fn low_share_sources(processed: &ProcessedMetrics) -> Vec<String> {
    let Some(share) = &processed.traffic_share else {
        return Vec::new();
    };
    let dominant = share.dominant.as_ref().map(|entry| entry.name.as_str());
    share
        .entries
        .iter()
        .filter(|entry| Some(entry.name.as_str()) != dominant)
        .filter(|entry| entry.percentage < LOW_SOURCE_SHARE)
        .map(|entry| {
            format!(
                "Growth potential from the {} channel (currently only {}% of traffic).",
                display_label(&entry.name),
                entry.percentage
            )
        })
        .collect()
}

fn mobile_share(processed: &ProcessedMetrics) -> Vec<String> {
    let Some(mobile) = processed
        .device_share
        .as_ref()
        .and_then(|share| share.share_of("mobile"))
    else {
        return Vec::new();
    };
    if mobile < LOW_MOBILE_SHARE {
        vec![format!(
            "Improving the mobile experience could increase traffic \
             (currently only {mobile}% from mobile devices)."
        )]
    } else if mobile > HIGH_MOBILE_SHARE {
        vec![format!(
            "With {mobile}% of traffic from mobile devices, further optimising the \
             experience on these devices could improve conversions."
        )]
    } else {
        Vec::new()
    }
}

fn internal_linking(processed: &ProcessedMetrics) -> Vec<String> {
    match processed.core_metrics {
        Some(core) if core.pages_per_session < LOW_PAGES_PER_SESSION => vec![
            "Improve internal links between pages to increase the number of pages \
             viewed per session."
                .to_string(),
        ],
        _ => Vec::new(),
    }
}

fn seo(processed: &ProcessedMetrics) -> Vec<String> {
    match traffic_share_of(processed, "organic") {
        Some(organic) if organic < LOW_ORGANIC_SHARE => vec![
            "Improve the site's SEO to increase organic traffic from search engines."
                .to_string(),
        ],
        _ => Vec::new(),
    }
}

fn social_presence(processed: &ProcessedMetrics) -> Vec<String> {
    match traffic_share_of(processed, "social") {
        Some(social) if social < LOW_SOCIAL_SHARE => vec![
            "Increase social media presence to grow traffic from those platforms.".to_string(),
        ],
        _ => Vec::new(),
    }
}

fn weakest_page(processed: &ProcessedMetrics) -> Vec<String> {
    // First page wins a tie, matching the order the source reported them in.
    let mut weakest = None;
    for page in &processed.top_pages_simplified {
        let seconds = time_to_seconds(&page.avg_time);
        match weakest {
            Some((_, best)) if seconds >= best => {}
            _ => weakest = Some((page, seconds)),
        }
    }
    weakest
        .map(|(page, _)| {
            format!(
                "Improve the content of the page '{}' to increase time on page.",
                page.name
            )
        })
        .into_iter()
        .collect()
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::processing::process_value;

    fn processed(value: serde_json::Value) -> ProcessedMetrics {
        process_value(value).expect("valid bundle")
    }

    fn sample() -> ProcessedMetrics {
        processed(json!({
            "metrics": {
                "visitors": {
                    "total": 700,
                    "daily": {
                        "2025-05-01": 100, "2025-05-02": 100, "2025-05-03": 100,
                        "2025-05-04": 100, "2025-05-05": 300
                    }
                },
                "pageviews": { "total": 1200 },
                "pages_per_session": 1.71
            },
            "traffic_sources": {
                "direct": 350, "organic": 250, "referral": 200, "social": 150, "email": 50
            },
            "devices": { "desktop": 550, "mobile": 350, "tablet": 100 },
            "top_pages": [
                { "path": "/", "pageviews": 400, "avg_time": "00:02:15" },
                { "path": "/products", "pageviews": 200, "avg_time": "00:01:45" },
                { "path": "/about", "pageviews": 150, "avg_time": "00:01:20" },
                { "path": "/contact", "pageviews": 100, "avg_time": "00:00:55" }
            ]
        }))
    }

    #[test]
    fn rules_run_in_fixed_order() {
        let ids: Vec<&str> = RULES.iter().map(|rule| rule.id).collect();
        assert_eq!(ids.first(), Some(&"summary_totals"));
        assert_eq!(ids.last(), Some(&"weakest_page"));
        assert!(rule("device_ranking").is_some());
        assert!(rule("unknown").is_none());
    }

    #[test]
    fn summary_has_totals_trend_and_dominant_source() {
        let insights = generate_insights(&sample());
        assert!(insights
            .summary
            .starts_with("During the analysed period the site received 700 visitors"));
        assert!(insights.summary.contains("1.71 pages per session"));
        assert!(insights.summary.contains("growth"));
        assert!(insights
            .summary
            .ends_with("The main traffic source is Direct (35% of the total)."));
    }

    #[test]
    fn summary_without_data_is_only_the_totals_sentence() {
        let insights = generate_insights(&processed(json!({})));
        assert_eq!(
            insights.summary,
            "During the analysed period the site received 0 visitors who viewed 0 pages, \
             with an average of 0 pages per session."
        );
        assert!(insights.key_points.is_empty());
        assert!(insights.opportunities.is_empty());
        assert!(insights.practical_advice.is_empty());
    }

    #[test]
    fn key_points_follow_rule_order() {
        let insights = generate_insights(&sample());
        assert_eq!(insights.key_points.len(), 4);
        assert_eq!(
            insights.key_points[0],
            "The main traffic sources are: Direct (35%), Organic (25%), Referral (20%), \
             Social (15%), Email (5%)."
        );
        assert_eq!(
            insights.key_points[1],
            "Visitors mainly reach the site from: Desktop (55%), Mobile (35%), Tablet (10%)."
        );
        assert_eq!(
            insights.key_points[2],
            "The most visited pages are: Home Page (400 views), Products (200 views), \
             About (150 views)."
        );
        assert!(insights.key_points[3].starts_with("The following anomalies were detected: spike"));
    }

    #[test]
    fn ranking_is_stable_for_equal_shares() {
        let text = traffic_source_ranking(&processed(json!({
            "traffic_sources": { "email": 10, "direct": 30, "social": 10 }
        })));
        assert_eq!(
            text,
            vec!["The main traffic sources are: Direct (60%), Email (20%), Social (20%)."]
        );
    }

    #[test]
    fn low_share_sources_skip_the_dominant_one() {
        let bullets = low_share_sources(&processed(json!({
            "traffic_sources": { "direct": 5, "organic": 2, "email": 93 }
        })));
        assert_eq!(
            bullets,
            vec![
                "Growth potential from the Direct channel (currently only 5% of traffic).",
                "Growth potential from the Organic channel (currently only 2% of traffic).",
            ]
        );
    }

    #[test]
    fn lone_source_is_never_an_opportunity() {
        let bullets = low_share_sources(&processed(json!({ "traffic_sources": { "direct": 0 } })));
        assert!(bullets.is_empty());
    }

    #[test]
    fn mobile_bullet_depends_on_band() {
        let low = mobile_share(&processed(json!({ "devices": { "desktop": 80, "mobile": 20 } })));
        assert_eq!(low.len(), 1);
        assert!(low[0].starts_with("Improving the mobile experience"));

        let mid = mobile_share(&processed(json!({ "devices": { "desktop": 60, "mobile": 40 } })));
        assert!(mid.is_empty());

        let high = mobile_share(&processed(json!({ "devices": { "desktop": 40, "mobile": 60 } })));
        assert_eq!(high.len(), 1);
        assert!(high[0].starts_with("With 60% of traffic from mobile devices"));

        let absent = mobile_share(&processed(json!({ "devices": { "desktop": 1 } })));
        assert!(absent.is_empty());
    }

    #[test]
    fn advice_rules_fire_on_thresholds() {
        let insights = generate_insights(&processed(json!({
            "metrics": { "pages_per_session": 1.5 },
            "traffic_sources": { "direct": 85, "organic": 10, "social": 5 }
        })));
        assert_eq!(insights.practical_advice.len(), 3);
        assert!(insights.practical_advice[0].starts_with("Improve internal links"));
        assert!(insights.practical_advice[1].contains("SEO"));
        assert!(insights.practical_advice[2].contains("social media"));
    }

    #[test]
    fn internal_linking_needs_core_metrics() {
        assert!(internal_linking(&processed(json!({}))).is_empty());
        assert!(internal_linking(&processed(json!({ "metrics": { "pages_per_session": 3.2 } })))
            .is_empty());
    }

    #[test]
    fn weakest_page_uses_lowest_average_time() {
        let advice = weakest_page(&sample());
        assert_eq!(
            advice,
            vec!["Improve the content of the page 'Contact' to increase time on page."]
        );
    }

    #[test]
    fn unparsable_time_counts_as_zero() {
        let advice = weakest_page(&processed(json!({
            "top_pages": [
                { "path": "/pricing", "pageviews": 10, "avg_time": "00:00:05" },
                { "path": "/faq", "pageviews": 8, "avg_time": "n/a" }
            ]
        })));
        assert_eq!(
            advice,
            vec!["Improve the content of the page 'Faq' to increase time on page."]
        );
    }

    #[test]
    fn time_parsing_accepts_short_forms() {
        assert_eq!(time_to_seconds("01:02:03"), 3723);
        assert_eq!(time_to_seconds("02:30"), 150);
        assert_eq!(time_to_seconds("45"), 45);
        assert_eq!(time_to_seconds(""), 0);
        assert_eq!(time_to_seconds("1:2:3:4"), 0);
        assert_eq!(time_to_seconds("ab:cd:ef"), 0);
    }
}
