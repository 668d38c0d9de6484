use proptest::prelude::*;
use serde_json::json;
use webinsights_core::{
    bundle::OrderedMap,
    processing::{
        detect_anomalies, detect_trend, percentage_shares, share_breakdown, simplify_page_path,
        AnomalyKind, DailyPoint, TrendDirection,
    },
    run_analysis,
    visualization::{ChartKind, MAIN_METRICS_CHART, VISITORS_TREND_CHART},
    PipelineStage,
};

fn daily(values: &[u64]) -> serde_json::Value {
    let days: serde_json::Map<String, serde_json::Value> = values
        .iter()
        .enumerate()
        .map(|(i, v)| (format!("2024-05-{:02}", i + 1), json!(v)))
        .collect();
    serde_json::Value::Object(days)
}

fn points(values: &[u64]) -> Vec<DailyPoint> {
    values
        .iter()
        .enumerate()
        .map(|(i, v)| DailyPoint {
            date: format!("day-{i}"),
            value: *v,
        })
        .collect()
}

#[test]
fn seven_day_scenario_runs_end_to_end() {
    let values = [100, 110, 120, 130, 140, 70, 80];
    let result = run_analysis(json!({
        "report_name": "Weekly report",
        "start_date": "2024-05-01",
        "end_date": "2024-05-07",
        "metrics": {
            "visitors": { "total": 750, "daily": daily(&values) },
            "pageviews": { "total": 2100, "daily": daily(&[300; 7]) },
            "pages_per_session": 2.8
        },
        "traffic_sources": { "direct": 300, "organic": 250, "referral": 100, "social": 60, "email": 40 },
        "devices": { "desktop": 450, "mobile": 250, "tablet": 50 },
        "top_pages": [
            { "path": "/", "pageviews": 900, "avg_time": "00:02:10" },
            { "path": "/pricing", "pageviews": 400, "avg_time": "00:01:05" },
            { "path": "/about-us", "pageviews": 200, "avg_time": "00:00:40" }
        ]
    }))
    .expect("valid bundle");

    // Halves are [100,110,120] and [130,140,70,80]: means 110 and 105.
    let trend = result.processed.trend.expect("trend present");
    assert_eq!(trend.direction, TrendDirection::Decline);
    assert_eq!(trend.magnitude, 4.55);
    assert!(result.processed.anomalies.is_empty());

    assert!(!result.insights.key_points.is_empty());
    assert!(result.insights.summary.contains("750 visitors"));
    assert!(result.insights.summary.contains("4.55% decline"));
    assert!(result
        .insights
        .practical_advice
        .iter()
        .any(|advice| advice.contains("'About Us'")));

    let viz = &result.visualizations;
    assert_eq!(
        viz.chart(MAIN_METRICS_CHART).map(|c| c.kind),
        Some(ChartKind::Bar)
    );
    let trend_chart = viz.chart(VISITORS_TREND_CHART).expect("trend chart");
    assert_eq!(trend_chart.kind, ChartKind::Line);
    assert_eq!(trend_chart.data.series[0].data.len(), 7);
    assert_eq!(trend_chart.data.labels[0], "2024-05-01");

    assert_eq!(result.raw.report_name.as_deref(), Some("Weekly report"));
    assert_eq!(result.processed.report_info.period, "From 2024-05-01 to 2024-05-07");
}

#[test]
fn spike_in_last_point_is_flagged() {
    let anomalies = detect_anomalies(&points(&[100, 100, 100, 100, 500]));
    assert_eq!(anomalies.len(), 1);
    assert_eq!(anomalies[0].kind, AnomalyKind::Spike);
    assert_eq!(anomalies[0].value, 500);
}

#[test]
fn tie_for_dominant_source_goes_to_first_key() {
    let counts: OrderedMap<u64> = [("direct", 50), ("organic", 50)].into_iter().collect();
    let share = share_breakdown(&counts);
    assert_eq!(share.dominant.map(|d| d.name), Some("direct".to_string()));
}

#[test]
fn simplification_accepts_clean_names() {
    let once = simplify_page_path("/about-us");
    assert_eq!(once, "About Us");
    assert_eq!(simplify_page_path(&once), "About Us");
}

#[test]
fn result_serializes_every_stage() {
    let result = run_analysis(json!({ "devices": { "mobile": 1 } })).expect("valid");
    let value = serde_json::to_value(&result).expect("serialize");
    for key in [
        "run_id",
        "generated_at",
        "raw",
        "processed",
        "insights",
        "recommendations",
        "visualizations",
    ] {
        assert!(value.get(key).is_some(), "missing {key}");
    }
}

#[test]
fn wrong_shape_is_distinguished_from_empty() {
    assert!(run_analysis(json!({})).is_ok());
    let err = run_analysis(json!({ "metrics": { "visitors": { "daily": [1, 2, 3] } } }))
        .expect_err("daily must be a mapping");
    assert_eq!(err.stage(), PipelineStage::Extracted);
}

proptest! {
    #[test]
    fn percentages_sum_to_one_hundred(values in prop::collection::vec(0u64..1_000_000, 1..10)) {
        let counts: OrderedMap<u64> = values
            .iter()
            .enumerate()
            .map(|(i, v)| (format!("source_{i}"), *v))
            .collect();
        let shares = percentage_shares(&counts);
        let sum: f64 = shares.iter().map(|s| s.percentage).sum();
        if values.iter().all(|v| *v == 0) {
            prop_assert!(shares.iter().all(|s| s.percentage == 0.0));
        } else {
            prop_assert!((sum - 100.0).abs() <= 0.1, "sum was {}", sum);
        }
    }

    #[test]
    fn increasing_series_is_growth(
        start in 1u64..1_000,
        steps in prop::collection::vec(1u64..100, 1..30),
    ) {
        let mut series = vec![start];
        for step in steps {
            let last = series[series.len() - 1];
            series.push(last + step);
        }
        let trend = detect_trend(&series).expect("at least two points");
        prop_assert_eq!(trend.direction, TrendDirection::Growth);
    }

    #[test]
    fn decreasing_series_is_decline(
        start in 10_000u64..20_000,
        steps in prop::collection::vec(1u64..100, 1..30),
    ) {
        let mut series = vec![start];
        for step in steps {
            let last = series[series.len() - 1];
            series.push(last - step);
        }
        let trend = detect_trend(&series).expect("at least two points");
        prop_assert_eq!(trend.direction, TrendDirection::Decline);
    }

    #[test]
    fn constant_series_has_no_anomalies(value in 0u64..100_000, len in 3usize..40) {
        prop_assert!(detect_anomalies(&points(&vec![value; len])).is_empty());
    }
}
