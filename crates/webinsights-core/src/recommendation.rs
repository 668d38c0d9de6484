//! Recommendation stage: threshold-driven strategy and technology templates.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::insight::{
    InsightBundle, LOW_ORGANIC_SHARE, LOW_PAGES_PER_SESSION, LOW_SOCIAL_SHARE, LOW_SOURCE_SHARE,
};
use crate::processing::{
    display_label, AnomalyKind, ProcessedMetrics, ShareEntry, TrendDirection,
};

/// Mobile share at or above which the mobile experience becomes the focus.
pub const MOBILE_FOCUS_SHARE: f64 = 40.0;
/// A decline at least this steep triggers recovery recommendations.
pub const DECLINE_ALERT_PERCENT: f64 = 10.0;
/// A dominant source above this share means the audience is concentrated.
pub const CONCENTRATED_SOURCE_SHARE: f64 = 50.0;

const FALLBACK_FOCUS: [&str; 2] = ["Content Engagement Enhancement", "Sustained Growth"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Level {
    High,
    Medium,
    Low,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrategicFocus {
    pub primary: String,
    pub secondary: String,
    pub rationale: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TechnologyRecommendation {
    pub name: String,
    pub relevance: Level,
    pub impact: String,
    pub difficulty: Level,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InnovativeSolution {
    pub name: String,
    pub relevance: String,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecommendationBundle {
    pub strategic_focus: StrategicFocus,
    pub technology_recommendations: Vec<TechnologyRecommendation>,
    pub strategy_adjustments: Vec<String>,
    pub innovative_solutions: Vec<InnovativeSolution>,
}

/// The handful of numbers every recommendation rule looks at.
struct Signals<'a> {
    mobile: Option<f64>,
    desktop: Option<f64>,
    organic: Option<f64>,
    social: Option<f64>,
    pages_per_session: Option<f64>,
    decline: Option<f64>,
    dominant: Option<&'a ShareEntry>,
    opportunities: usize,
}

impl<'a> Signals<'a> {
    fn read(processed: &'a ProcessedMetrics, insights: &InsightBundle) -> Self {
        let device = |name: &str| {
            processed
                .device_share
                .as_ref()
                .and_then(|share| share.share_of(name))
        };
        let source = |name: &str| {
            processed
                .traffic_share
                .as_ref()
                .and_then(|share| share.share_of(name))
        };
        Self {
            mobile: device("mobile"),
            desktop: device("desktop"),
            organic: source("organic"),
            social: source("social"),
            pages_per_session: processed.core_metrics.map(|core| core.pages_per_session),
            decline: processed
                .trend
                .filter(|trend| trend.direction == TrendDirection::Decline)
                .map(|trend| trend.magnitude),
            dominant: processed
                .traffic_share
                .as_ref()
                .and_then(|share| share.dominant.as_ref()),
            opportunities: insights.opportunities.len(),
        }
    }

    fn mobile_focused(&self) -> bool {
        self.mobile.is_some_and(|share| share >= MOBILE_FOCUS_SHARE)
    }

    fn steep_decline(&self) -> bool {
        self.decline.is_some_and(|pct| pct >= DECLINE_ALERT_PERCENT)
    }

    fn low_engagement(&self) -> bool {
        self.pages_per_session
            .is_some_and(|pps| pps < LOW_PAGES_PER_SESSION)
    }

    fn weak_organic(&self) -> bool {
        self.organic.is_some_and(|share| share < LOW_ORGANIC_SHARE)
    }

    fn weak_social(&self) -> bool {
        self.social.is_some_and(|share| share < LOW_SOCIAL_SHARE)
    }
}

/// Focus candidates in priority order: each returns its name and the evidence
/// that selected it.
const FOCUS_CANDIDATES: &[fn(&Signals) -> Option<(&'static str, String)>] = &[
    |s| {
        s.mobile.filter(|_| s.mobile_focused()).map(|share| {
            (
                "Mobile Experience Optimization",
                format!("{share}% of visits come from mobile devices"),
            )
        })
    },
    |s| {
        s.decline.filter(|_| s.steep_decline()).map(|pct| {
            (
                "Traffic Recovery",
                format!("traffic declined by {pct}% across the period"),
            )
        })
    },
    |s| {
        s.pages_per_session.filter(|_| s.low_engagement()).map(|pps| {
            (
                "Content Engagement Enhancement",
                format!("visitors view only {pps} pages per session"),
            )
        })
    },
    |s| {
        s.organic.filter(|_| s.weak_organic()).map(|share| {
            (
                "Search Visibility",
                format!("organic search brings only {share}% of traffic"),
            )
        })
    },
    |s| {
        s.dominant
            .filter(|entry| entry.percentage > CONCENTRATED_SOURCE_SHARE)
            .map(|entry| {
                (
                    "Audience Diversification",
                    format!(
                        "{} alone accounts for {}% of traffic",
                        display_label(&entry.name),
                        entry.percentage
                    ),
                )
            })
    },
];

pub fn recommend(processed: &ProcessedMetrics, insights: &InsightBundle) -> RecommendationBundle {
    let signals = Signals::read(processed, insights);
    let bundle = RecommendationBundle {
        strategic_focus: strategic_focus(&signals),
        technology_recommendations: technology_recommendations(&signals),
        strategy_adjustments: strategy_adjustments(processed, &signals),
        innovative_solutions: innovative_solutions(processed, &signals),
    };
    debug!(
        primary = %bundle.strategic_focus.primary,
        technologies = bundle.technology_recommendations.len(),
        adjustments = bundle.strategy_adjustments.len(),
        "Generated recommendations"
    );
    bundle
}

fn strategic_focus(signals: &Signals) -> StrategicFocus {
    let matched: Vec<(&'static str, String)> = FOCUS_CANDIDATES
        .iter()
        .filter_map(|candidate| candidate(signals))
        .collect();

    let primary = matched
        .first()
        .map(|(name, _)| *name)
        .unwrap_or(FALLBACK_FOCUS[0]);
    let secondary = matched
        .iter()
        .map(|(name, _)| *name)
        .chain(FALLBACK_FOCUS)
        .find(|name| *name != primary)
        .unwrap_or(FALLBACK_FOCUS[1]);

    let evidence = match matched.first() {
        Some((_, evidence)) => capitalize_first(evidence),
        None => "No metric crossed an alert threshold".to_string(),
    };
    let opportunities = match signals.opportunities {
        0 => "no additional growth opportunities were identified".to_string(),
        1 => "1 additional growth opportunity was identified".to_string(),
        n => format!("{n} additional growth opportunities were identified"),
    };

    StrategicFocus {
        primary: primary.to_string(),
        secondary: secondary.to_string(),
        rationale: format!(
            "{evidence}. Focusing on {primary} first should give the highest return; \
             {opportunities}."
        ),
    }
}

fn capitalize_first(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn technology(
    name: &str,
    relevance: Level,
    impact: &str,
    difficulty: Level,
    description: &str,
) -> TechnologyRecommendation {
    TechnologyRecommendation {
        name: name.to_string(),
        relevance,
        impact: impact.to_string(),
        difficulty,
        description: description.to_string(),
    }
}

fn technology_recommendations(signals: &Signals) -> Vec<TechnologyRecommendation> {
    let mut recommendations = vec![
        technology(
            "Progressive Web App (PWA)",
            if signals.mobile_focused() {
                Level::High
            } else {
                Level::Medium
            },
            "Improve mobile experience and engagement",
            Level::Medium,
            "Serving the site as a PWA shortens load times on mobile networks and \
             enables offline access to key pages.",
        ),
        technology(
            "AI-Powered Content Recommendations",
            if signals.low_engagement() {
                Level::High
            } else {
                Level::Medium
            },
            "Increase page views and session duration",
            Level::Medium,
            "Suggesting related content on every page encourages visitors to continue \
             their session instead of leaving after the first page.",
        ),
        technology(
            "Automated A/B Testing",
            Level::Medium,
            "Optimize conversion rates",
            Level::Low,
            "Continuously testing calls to action and page layouts finds the variants \
             that convert best.",
        ),
    ];

    if signals.weak_organic() {
        recommendations.push(technology(
            "SEO Auditing Platform",
            Level::High,
            "Grow organic search traffic",
            Level::Low,
            "Automated crawling and keyword tracking surface the technical and content \
             issues holding back search rankings.",
        ));
    }
    if signals.weak_social() {
        recommendations.push(technology(
            "Social Media Scheduling and Automation",
            Level::Medium,
            "Grow traffic from social platforms",
            Level::Low,
            "Scheduling tools keep a steady publishing cadence across networks and \
             report which posts drive visits.",
        ));
    }
    recommendations
}

fn strategy_adjustments(processed: &ProcessedMetrics, signals: &Signals) -> Vec<String> {
    let mut adjustments = Vec::new();

    if signals.mobile_focused() {
        adjustments.push("Adopt a mobile-first design approach for all new features".to_string());
    }
    if let (Some(mobile), Some(desktop)) = (signals.mobile, signals.desktop) {
        if mobile > desktop {
            adjustments.push(
                "Shift part of the desktop-focused advertising budget to mobile platforms"
                    .to_string(),
            );
        }
    }
    if let Some(page) = processed.top_pages_simplified.first() {
        adjustments.push(format!(
            "Develop a content strategy around the topics of the '{}' page, which draws \
             the most views",
            page.name
        ));
    }
    if let Some(share) = &processed.traffic_share {
        let dominant = signals.dominant.map(|entry| entry.name.as_str());
        for entry in share
            .entries
            .iter()
            .filter(|entry| Some(entry.name.as_str()) != dominant)
            .filter(|entry| entry.percentage < LOW_SOURCE_SHARE)
        {
            adjustments.push(format!(
                "Create a dedicated strategy for {} traffic, which shows growth potential",
                display_label(&entry.name)
            ));
        }
    }
    for anomaly in &processed.anomalies {
        let cause = match anomaly.kind {
            AnomalyKind::Spike => "what drove the spike",
            AnomalyKind::Drop => "the cause of the drop",
        };
        adjustments.push(format!("Investigate {cause} on {}", anomaly.date));
    }
    if signals.steep_decline() {
        adjustments.push(
            "Launch a retention campaign to win back returning visitors".to_string(),
        );
    }

    if adjustments.is_empty() {
        adjustments.push(
            "Keep monitoring the current metrics; no adjustment is needed yet".to_string(),
        );
    }
    adjustments
}

fn innovative_solutions(processed: &ProcessedMetrics, signals: &Signals) -> Vec<InnovativeSolution> {
    let mut solutions = vec![InnovativeSolution {
        name: "Micro-Conversion Tracking".to_string(),
        relevance: "High".to_string(),
        description: "Tracking small steps such as scroll depth, sign-up starts and \
                      video plays shows where visitors drop out of the journey."
            .to_string(),
    }];

    if signals.weak_organic() || signals.mobile_focused() {
        solutions.push(InnovativeSolution {
            name: "Voice Search Optimization".to_string(),
            relevance: "Growing".to_string(),
            description: "Answer-style content and structured data help the site appear \
                          in voice assistant results."
                .to_string(),
        });
    }
    if processed
        .top_pages_simplified
        .iter()
        .any(|page| page.path.to_lowercase().contains("product"))
    {
        solutions.push(InnovativeSolution {
            name: "AR Product Visualization".to_string(),
            relevance: "Emerging".to_string(),
            description: "Letting visitors preview products in their own space can lift \
                          engagement on product pages and reduce returns."
                .to_string(),
        });
    }
    solutions
}
