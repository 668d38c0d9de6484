//! Report rendering: the analysis result as pretty JSON or a plain HTML page.

use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

use webinsights_core::{visualization::ReportSection, AnalysisResult};

pub const REPORT_FILE_STEM: &str = "webinsights_report";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ReportFormat {
    #[default]
    Html,
    Json,
}

impl ReportFormat {
    pub fn content_type(&self) -> &'static str {
        match self {
            Self::Html => "text/html; charset=utf-8",
            Self::Json => "application/json",
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            Self::Html => "html",
            Self::Json => "json",
        }
    }
}

pub fn render(result: &AnalysisResult, format: ReportFormat) -> Result<String> {
    match format {
        ReportFormat::Json => {
            serde_json::to_string_pretty(result).context("failed to serialize report")
        }
        ReportFormat::Html => render_html(result),
    }
}

/// Render and write `webinsights_report.<ext>` into `dir`, creating it if
/// needed. Returns the written path.
pub async fn write_report(
    result: &AnalysisResult,
    format: ReportFormat,
    dir: &Path,
) -> Result<PathBuf> {
    let body = render(result, format)?;
    tokio::fs::create_dir_all(dir)
        .await
        .with_context(|| format!("failed to create {}", dir.display()))?;
    let path = dir.join(format!("{REPORT_FILE_STEM}.{}", format.extension()));
    tokio::fs::write(&path, body)
        .await
        .with_context(|| format!("failed to write {}", path.display()))?;
    Ok(path)
}

fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

fn list(out: &mut String, items: &[String]) {
    out.push_str("<ul>\n");
    for item in items {
        let _ = writeln!(out, "<li>{}</li>", escape(item));
    }
    out.push_str("</ul>\n");
}

fn render_html(result: &AnalysisResult) -> Result<String> {
    let viz = &result.visualizations;
    let mut out = String::new();
    let _ = write!(
        out,
        "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n\
         <title>{title}</title>\n</head>\n<body>\n<h1>{title}</h1>\n<p>{period}</p>\n",
        title = escape(&viz.dashboard.title),
        period = escape(&viz.dashboard.description),
    );

    for section in &viz.sections {
        let _ = writeln!(out, "<section>\n<h2>{}</h2>", escape(section.title()));
        match section {
            ReportSection::Summary { text, .. } => {
                let _ = writeln!(out, "<p>{}</p>", escape(text));
            }
            ReportSection::Metrics { metrics, .. } => {
                out.push_str("<dl>\n");
                for metric in metrics {
                    let _ = writeln!(
                        out,
                        "<dt>{}</dt><dd>{}</dd>",
                        escape(&metric.name),
                        metric.value
                    );
                }
                out.push_str("</dl>\n");
            }
            ReportSection::Chart { chart_id, .. } => {
                let chart = viz.chart(chart_id);
                let json = serde_json::to_string(&chart).context("failed to serialize chart")?;
                // `</` would end the script element early.
                let _ = writeln!(
                    out,
                    "<figure data-chart-id=\"{}\">\n<script type=\"application/json\">{}</script>\n</figure>",
                    escape(chart_id),
                    json.replace("</", "<\\/")
                );
            }
            ReportSection::Table { columns, rows, .. } => {
                out.push_str("<table>\n<tr>");
                for column in columns {
                    let _ = write!(out, "<th>{}</th>", escape(column));
                }
                out.push_str("</tr>\n");
                for row in rows {
                    out.push_str("<tr>");
                    for cell in row {
                        let _ = write!(out, "<td>{}</td>", escape(cell));
                    }
                    out.push_str("</tr>\n");
                }
                out.push_str("</table>\n");
            }
            ReportSection::Insights { items, .. }
            | ReportSection::Opportunities { items, .. }
            | ReportSection::Recommendations { items, .. } => list(&mut out, items),
        }
        out.push_str("</section>\n");
    }

    let recs = &result.recommendations;
    let _ = writeln!(
        out,
        "<section>\n<h2>Strategic focus</h2>\n<p><strong>{}</strong> / {}</p>\n<p>{}</p>",
        escape(&recs.strategic_focus.primary),
        escape(&recs.strategic_focus.secondary),
        escape(&recs.strategic_focus.rationale),
    );
    let technologies: Vec<String> = recs
        .technology_recommendations
        .iter()
        .map(|t| format!("{}: {}", t.name, t.description))
        .collect();
    list(&mut out, &technologies);
    list(&mut out, &recs.strategy_adjustments);
    out.push_str("</section>\n</body>\n</html>\n");
    Ok(out)
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use webinsights_core::run_analysis;

    use super::*;

    fn sample() -> AnalysisResult {
        run_analysis(json!({
            "report_name": "Shop <beta>",
            "metrics": {
                "visitors": { "total": 30, "daily": { "d1": 10, "d2": 20 } },
                "pageviews": { "total": 60 },
                "pages_per_session": 2.0
            },
            "top_pages": [{ "path": "/</script>", "pageviews": 5, "avg_time": "00:00:05" }]
        }))
        .expect("valid bundle")
    }

    #[test]
    fn html_escapes_text_and_embeds_charts() {
        let html = render(&sample(), ReportFormat::Html).expect("render");
        assert!(html.starts_with("<!DOCTYPE html>"));
        assert!(html.contains("<h1>Shop &lt;beta&gt;</h1>"));
        assert!(html.contains("data-chart-id=\"main_metrics\""));
        assert_eq!(
            html.matches("</script>").count(),
            html.matches("<script type=").count()
        );
        assert!(html.contains("Strategic focus"));
    }

    #[test]
    fn json_round_trips_to_the_result() {
        let result = sample();
        let body = render(&result, ReportFormat::Json).expect("render");
        let parsed: AnalysisResult = serde_json::from_str(&body).expect("parse");
        assert_eq!(parsed, result);
    }

    #[test]
    fn format_metadata() {
        assert_eq!(ReportFormat::default(), ReportFormat::Html);
        assert_eq!(ReportFormat::Json.extension(), "json");
        assert!(ReportFormat::Html.content_type().starts_with("text/html"));
    }
}
