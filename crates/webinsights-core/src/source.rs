//! Metrics source abstraction.

use anyhow::{anyhow, Result};
use chrono::{Days, NaiveDate};

use crate::bundle::RawMetricsBundle;

/// Date format every source and query parameter uses.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Longest range a request may cover, in days, both ends included.
pub const MAX_RANGE_DAYS: i64 = 3_660;

/// What to fetch: one property over an inclusive date range.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetricsRequest {
    pub property_id: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub top_pages_limit: usize,
}

impl MetricsRequest {
    /// Build a request from optional `YYYY-MM-DD` strings.
    ///
    /// A missing end date is `today`; a missing start date is
    /// `range_days` days before the end date. Start after end, a range longer
    /// than [`MAX_RANGE_DAYS`] or a lookback before the earliest
    /// representable date is rejected.
    pub fn parse(
        property_id: impl Into<String>,
        start_date: Option<&str>,
        end_date: Option<&str>,
        today: NaiveDate,
        range_days: u32,
        top_pages_limit: usize,
    ) -> Result<Self> {
        let end_date = match end_date {
            Some(raw) => parse_date("end_date", raw)?,
            None => today,
        };
        let start_date = match start_date {
            Some(raw) => parse_date("start_date", raw)?,
            None => end_date
                .checked_sub_days(Days::new(u64::from(range_days)))
                .ok_or_else(|| {
                    anyhow!("lookback of {range_days} days from {end_date} is out of range")
                })?,
        };
        if start_date > end_date {
            return Err(anyhow!(
                "start_date {start_date} is after end_date {end_date}"
            ));
        }
        let span = (end_date - start_date).num_days() + 1;
        if span > MAX_RANGE_DAYS {
            return Err(anyhow!(
                "range of {span} days exceeds the maximum of {MAX_RANGE_DAYS}"
            ));
        }
        Ok(Self {
            property_id: property_id.into(),
            start_date,
            end_date,
            top_pages_limit,
        })
    }

    /// Days in the range, both ends included.
    pub fn days(&self) -> impl Iterator<Item = NaiveDate> {
        let end = self.end_date;
        self.start_date.iter_days().take_while(move |day| *day <= end)
    }
}

pub fn parse_date(field: &str, raw: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), DATE_FORMAT)
        .map_err(|e| anyhow!("invalid {field} '{raw}': expected YYYY-MM-DD ({e})"))
}

/// Supplies the raw bundle a pipeline run starts from.
///
/// Fetching and authentication are the implementation's business; the pipeline
/// only sees the bundle.
#[async_trait::async_trait]
pub trait MetricsSource: Send + Sync + 'static {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    async fn fetch(&self, request: &MetricsRequest) -> Result<RawMetricsBundle>;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(raw: &str) -> NaiveDate {
        NaiveDate::parse_from_str(raw, DATE_FORMAT).expect("valid date")
    }

    #[test]
    fn explicit_range_is_kept() {
        let request = MetricsRequest::parse(
            "prop",
            Some("2024-01-01"),
            Some("2024-01-07"),
            day("2024-06-01"),
            7,
            10,
        )
        .expect("valid range");
        assert_eq!(request.start_date, day("2024-01-01"));
        assert_eq!(request.days().count(), 7);
    }

    #[test]
    fn missing_dates_default_to_lookback() {
        let request =
            MetricsRequest::parse("prop", None, None, day("2024-06-10"), 7, 10).expect("defaults");
        assert_eq!(request.end_date, day("2024-06-10"));
        assert_eq!(request.start_date, day("2024-06-03"));
    }

    #[test]
    fn single_day_range_is_valid() {
        let request = MetricsRequest::parse(
            "prop",
            Some("2024-02-29"),
            Some("2024-02-29"),
            day("2024-06-10"),
            7,
            10,
        )
        .expect("same day");
        assert_eq!(request.days().collect::<Vec<_>>(), vec![day("2024-02-29")]);
    }

    #[test]
    fn reversed_range_is_rejected() {
        let err = MetricsRequest::parse(
            "prop",
            Some("2024-01-08"),
            Some("2024-01-01"),
            day("2024-06-10"),
            7,
            10,
        )
        .expect_err("reversed");
        assert!(err.to_string().contains("after end_date"));
    }

    #[test]
    fn lookback_past_the_calendar_start_is_rejected() {
        let err = MetricsRequest::parse(
            "prop",
            None,
            Some("-262143-01-01"),
            day("2024-06-10"),
            7,
            10,
        )
        .expect_err("underflow");
        assert!(err.to_string().contains("out of range"));

        let err =
            MetricsRequest::parse("prop", None, None, day("2024-06-10"), 4_000_000_000, 10)
                .expect_err("huge lookback");
        assert!(err.to_string().contains("out of range"));
    }

    #[test]
    fn overlong_range_is_rejected() {
        let err = MetricsRequest::parse(
            "prop",
            Some("0001-01-01"),
            Some("2024-06-10"),
            day("2024-06-10"),
            7,
            10,
        )
        .expect_err("too long");
        assert!(err.to_string().contains("exceeds the maximum"));

        let longest = MetricsRequest::parse(
            "prop",
            None,
            None,
            day("2024-06-10"),
            (MAX_RANGE_DAYS - 1) as u32,
            10,
        )
        .expect("at the limit");
        assert_eq!(longest.days().count() as i64, MAX_RANGE_DAYS);
    }

    #[test]
    fn malformed_date_names_the_field() {
        let err = MetricsRequest::parse("prop", Some("01/02/2024"), None, day("2024-06-10"), 7, 10)
            .expect_err("bad format");
        assert!(err.to_string().contains("invalid start_date"));
    }
}
