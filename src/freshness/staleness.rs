//! Staleness evaluation for last-updated dates

use chrono::{DateTime, Months, NaiveDate, NaiveDateTime, Utc};
use tracing::warn;

use crate::config::DEFAULT_THRESHOLD_YEARS;

/// Zone suffixes the registry appends to otherwise zone-less dates
const UTC_SUFFIXES: &[&str] = &[" GMT", " UTC"];

/// Zone-less date-time layouts, tried in order
const DATE_TIME_FORMATS: &[&str] = &[
    // Registry format, e.g. "2024-03-05 2:15pm"
    "%Y-%m-%d %I:%M%p",
    "%Y-%m-%d %I:%M %p",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
];

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Result of classifying a last-updated value
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StalenessVerdict {
    pub is_stale: bool,
    /// The value the verdict was computed from
    pub raw_timestamp: String,
}

/// The age rule applied to last-updated dates
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StalenessPolicy {
    pub threshold_years: u32,
}

impl Default for StalenessPolicy {
    fn default() -> Self {
        Self {
            threshold_years: DEFAULT_THRESHOLD_YEARS,
        }
    }
}

impl StalenessPolicy {
    pub fn new(threshold_years: u32) -> Self {
        Self { threshold_years }
    }

    /// The instant `threshold_years` calendar years before `now`.
    ///
    /// Feb 29 maps to Feb 28 when the target year is not a leap year.
    pub fn threshold(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        now.checked_sub_months(Months::new(self.threshold_years.saturating_mul(12)))
            .unwrap_or(DateTime::<Utc>::MIN_UTC)
    }

    /// Classify `timestamp` as of `now`.
    ///
    /// A value strictly before the threshold is stale. A value that cannot be
    /// parsed is evaluated as the Unix epoch and is therefore stale.
    pub fn classify(&self, timestamp: &str, now: DateTime<Utc>) -> StalenessVerdict {
        let parsed = parse_last_updated(timestamp);
        if parsed.is_none() {
            warn!("Unparseable last-updated value {:?}, treating as stale", timestamp);
        }

        let effective = parsed
            .or_else(|| DateTime::from_timestamp(0, 0))
            .unwrap_or(DateTime::<Utc>::MIN_UTC);

        StalenessVerdict {
            is_stale: effective < self.threshold(now),
            raw_timestamp: timestamp.to_string(),
        }
    }
}

/// Classify with the default two-year threshold
pub fn classify(timestamp: &str, now: DateTime<Utc>) -> StalenessVerdict {
    StalenessPolicy::default().classify(timestamp, now)
}

/// Best-effort parse of a last-updated value. Zone-less values are UTC.
pub fn parse_last_updated(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.with_timezone(&Utc));
    }

    if let Ok(dt) = DateTime::parse_from_rfc2822(value) {
        return Some(dt.with_timezone(&Utc));
    }

    let naive = strip_utc_suffix(value);

    DATE_TIME_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(naive, format).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(naive, DATE_FORMAT)
                .ok()
                .and_then(|date| date.and_hms_opt(0, 0, 0))
        })
        .map(|dt| dt.and_utc())
}

fn strip_utc_suffix(value: &str) -> &str {
    UTC_SUFFIXES
        .iter()
        .find_map(|suffix| {
            let split = value.len().checked_sub(suffix.len())?;
            let (head, tail) = (value.get(..split)?, value.get(split..)?);
            tail.eq_ignore_ascii_case(suffix).then_some(head)
        })
        .unwrap_or(value)
        .trim_end()
}
