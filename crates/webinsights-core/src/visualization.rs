//! Visualization stage: declarative chart and report-section descriptors.
//!
//! Nothing here renders. Each available data category becomes one chart and
//! each non-empty insight category becomes one section; missing categories
//! are skipped.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::insight::InsightBundle;
use crate::processing::{display_label, ProcessedMetrics, ShareBreakdown};

pub const PALETTE: [&str; 5] = ["#4285F4", "#34A853", "#FBBC05", "#EA4335", "#5F6368"];

pub const MAIN_METRICS_CHART: &str = "main_metrics";
pub const VISITORS_TREND_CHART: &str = "visitors_trend";
pub const TRAFFIC_SOURCES_CHART: &str = "traffic_sources";
pub const DEVICES_CHART: &str = "devices";
pub const TOP_PAGES_CHART: &str = "top_pages";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChartKind {
    Bar,
    Line,
    Pie,
    Doughnut,
    HorizontalBar,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartSeries {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    pub data: Vec<f64>,
    pub colors: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartData {
    pub labels: Vec<String>,
    pub series: Vec<ChartSeries>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartDescriptor {
    pub kind: ChartKind,
    pub id: String,
    pub title: String,
    pub data: ChartData,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dashboard {
    pub title: String,
    pub description: String,
    pub charts: Vec<ChartDescriptor>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricTile {
    pub name: String,
    pub value: f64,
    pub icon: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ReportSection {
    Summary {
        title: String,
        text: String,
    },
    Metrics {
        title: String,
        metrics: Vec<MetricTile>,
    },
    Chart {
        title: String,
        chart_id: String,
    },
    Table {
        title: String,
        columns: Vec<String>,
        rows: Vec<Vec<String>>,
    },
    Insights {
        title: String,
        items: Vec<String>,
    },
    Opportunities {
        title: String,
        items: Vec<String>,
    },
    Recommendations {
        title: String,
        items: Vec<String>,
    },
}

impl ReportSection {
    pub fn title(&self) -> &str {
        match self {
            Self::Summary { title, .. }
            | Self::Metrics { title, .. }
            | Self::Chart { title, .. }
            | Self::Table { title, .. }
            | Self::Insights { title, .. }
            | Self::Opportunities { title, .. }
            | Self::Recommendations { title, .. } => title.as_str(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VisualizationBundle {
    pub dashboard: Dashboard,
    pub sections: Vec<ReportSection>,
}

impl VisualizationBundle {
    pub fn charts(&self) -> &[ChartDescriptor] {
        &self.dashboard.charts
    }

    pub fn chart(&self, id: &str) -> Option<&ChartDescriptor> {
        self.dashboard.charts.iter().find(|chart| chart.id == id)
    }
}

pub fn build_visualizations(
    processed: &ProcessedMetrics,
    insights: &InsightBundle,
) -> VisualizationBundle {
    let charts: Vec<ChartDescriptor> = [
        main_metrics_chart(processed),
        visitors_trend_chart(processed),
        share_chart(
            processed.traffic_share.as_ref(),
            ChartKind::Pie,
            TRAFFIC_SOURCES_CHART,
            "Traffic sources",
        ),
        share_chart(
            processed.device_share.as_ref(),
            ChartKind::Doughnut,
            DEVICES_CHART,
            "Devices",
        ),
        top_pages_chart(processed),
    ]
    .into_iter()
    .flatten()
    .collect();

    let sections = report_sections(processed, insights, &charts);
    debug!(
        charts = charts.len(),
        sections = sections.len(),
        "Built visualizations"
    );

    VisualizationBundle {
        dashboard: Dashboard {
            title: processed.report_info.title.clone(),
            description: processed.report_info.period.clone(),
            charts,
        },
        sections,
    }
}

fn single_series(label: &str, data: Vec<f64>, color: &str) -> Vec<ChartSeries> {
    vec![ChartSeries {
        label: Some(label.to_string()),
        data,
        colors: vec![color.to_string()],
    }]
}

fn palette_colors(count: usize) -> Vec<String> {
    PALETTE
        .iter()
        .cycle()
        .take(count)
        .map(|color| color.to_string())
        .collect()
}

fn main_metrics_chart(processed: &ProcessedMetrics) -> Option<ChartDescriptor> {
    let core = processed.core_metrics?;
    Some(ChartDescriptor {
        kind: ChartKind::Bar,
        id: MAIN_METRICS_CHART.to_string(),
        title: "Main metrics".to_string(),
        data: ChartData {
            labels: vec!["Visitors".to_string(), "Pageviews".to_string()],
            series: single_series(
                "Total",
                vec![core.visitors as f64, core.pageviews as f64],
                PALETTE[0],
            ),
        },
    })
}

fn visitors_trend_chart(processed: &ProcessedMetrics) -> Option<ChartDescriptor> {
    if processed.visitor_series.is_empty() {
        return None;
    }
    let (labels, data): (Vec<String>, Vec<f64>) = processed
        .visitor_series
        .iter()
        .map(|point| (point.date.clone(), point.value as f64))
        .unzip();
    Some(ChartDescriptor {
        kind: ChartKind::Line,
        id: VISITORS_TREND_CHART.to_string(),
        title: "Daily visitors".to_string(),
        data: ChartData {
            labels,
            series: single_series("Visitors", data, PALETTE[0]),
        },
    })
}

fn share_chart(
    share: Option<&ShareBreakdown>,
    kind: ChartKind,
    id: &str,
    title: &str,
) -> Option<ChartDescriptor> {
    let share = share.filter(|share| !share.is_empty())?;
    let labels = share
        .entries
        .iter()
        .map(|entry| display_label(&entry.name))
        .collect();
    let data = share.entries.iter().map(|entry| entry.percentage).collect();
    Some(ChartDescriptor {
        kind,
        id: id.to_string(),
        title: title.to_string(),
        data: ChartData {
            labels,
            series: vec![ChartSeries {
                label: None,
                data,
                colors: palette_colors(share.entries.len()),
            }],
        },
    })
}

fn top_pages_chart(processed: &ProcessedMetrics) -> Option<ChartDescriptor> {
    if processed.top_pages_simplified.is_empty() {
        return None;
    }
    let (labels, data): (Vec<String>, Vec<f64>) = processed
        .top_pages_simplified
        .iter()
        .map(|page| (page.name.clone(), page.pageviews as f64))
        .unzip();
    Some(ChartDescriptor {
        kind: ChartKind::HorizontalBar,
        id: TOP_PAGES_CHART.to_string(),
        title: "Most visited pages".to_string(),
        data: ChartData {
            labels,
            series: single_series("Pageviews", data, PALETTE[1]),
        },
    })
}

fn report_sections(
    processed: &ProcessedMetrics,
    insights: &InsightBundle,
    charts: &[ChartDescriptor],
) -> Vec<ReportSection> {
    let mut sections = vec![ReportSection::Summary {
        title: "Summary".to_string(),
        text: insights.summary.clone(),
    }];

    if let Some(core) = processed.core_metrics {
        sections.push(ReportSection::Metrics {
            title: "Main metrics".to_string(),
            metrics: vec![
                tile("Visitors", core.visitors as f64, "users"),
                tile("Pageviews", core.pageviews as f64, "eye"),
                tile("Pages per session", core.pages_per_session, "layers"),
            ],
        });
    }

    sections.extend(charts.iter().map(|chart| ReportSection::Chart {
        title: chart.title.clone(),
        chart_id: chart.id.clone(),
    }));

    if !processed.top_pages_simplified.is_empty() {
        sections.push(ReportSection::Table {
            title: "Top pages".to_string(),
            columns: vec![
                "Page".to_string(),
                "Path".to_string(),
                "Pageviews".to_string(),
                "Average time".to_string(),
            ],
            rows: processed
                .top_pages_simplified
                .iter()
                .map(|page| {
                    vec![
                        page.name.clone(),
                        page.path.clone(),
                        page.pageviews.to_string(),
                        page.avg_time.clone(),
                    ]
                })
                .collect(),
        });
    }

    if !insights.key_points.is_empty() {
        sections.push(ReportSection::Insights {
            title: "Key points".to_string(),
            items: insights.key_points.clone(),
        });
    }
    if !insights.opportunities.is_empty() {
        sections.push(ReportSection::Opportunities {
            title: "Opportunities".to_string(),
            items: insights.opportunities.clone(),
        });
    }
    if !insights.practical_advice.is_empty() {
        sections.push(ReportSection::Recommendations {
            title: "Practical advice".to_string(),
            items: insights.practical_advice.clone(),
        });
    }
    sections
}

fn tile(name: &str, value: f64, icon: &str) -> MetricTile {
    MetricTile {
        name: name.to_string(),
        value,
        icon: icon.to_string(),
    }
}
