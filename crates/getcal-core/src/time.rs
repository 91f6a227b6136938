//! Date windows for single-day calendar queries.
//!
//! A [`DateWindow`] is the half-open UTC interval `[local midnight, next local
//! midnight)` for one calendar date in a named timezone. The span is derived
//! through the timezone's rules, so a day crossing a DST transition is 23 or
//! 25 wall-clock hours but always exactly one calendar date.

use chrono::{DateTime, Duration, LocalResult, NaiveDate, NaiveDateTime, TimeZone, Utc};
use chrono_tz::Tz;
use thiserror::Error;

/// Errors from date parsing and window construction.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DateWindowError {
    /// The date string was not a well-formed ISO `YYYY-MM-DD` date.
    #[error("invalid date '{0}': expected YYYY-MM-DD")]
    InvalidDate(String),

    /// No valid local instant could be resolved near midnight.
    #[error("could not resolve local midnight for {date} in {timezone}")]
    UnresolvableMidnight { date: NaiveDate, timezone: String },
}

/// Parses a strict ISO `YYYY-MM-DD` date string.
pub fn parse_date(input: &str) -> Result<NaiveDate, DateWindowError> {
    NaiveDate::parse_from_str(input, "%Y-%m-%d")
        .map_err(|_| DateWindowError::InvalidDate(input.to_string()))
}

/// The UTC query range covering one local calendar day.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DateWindow {
    /// The local calendar date this window covers.
    pub date: NaiveDate,
    /// Start of the window (inclusive), local midnight in UTC.
    pub start: DateTime<Utc>,
    /// End of the window (exclusive), the next local midnight in UTC.
    pub end: DateTime<Utc>,
}

impl DateWindow {
    /// Builds the window for `date` in the given timezone.
    pub fn for_date(date: NaiveDate, tz: Tz) -> Result<Self, DateWindowError> {
        let start = local_midnight(date, tz)?;
        let next = date
            .succ_opt()
            .ok_or_else(|| DateWindowError::InvalidDate(date.to_string()))?;
        let end = local_midnight(next, tz)?;
        Ok(Self { date, start, end })
    }

    /// Returns the wall-clock duration of this window.
    pub fn duration(&self) -> Duration {
        self.end - self.start
    }

    /// Checks if a UTC instant falls within this window (`[start, end)`).
    pub fn contains(&self, dt: DateTime<Utc>) -> bool {
        self.start <= dt && dt < self.end
    }
}

/// Resolves local midnight of `date` to a UTC instant.
///
/// Ambiguous midnights (a fall-back transition at 00:00) take the earlier
/// offset. Skipped midnights (a spring-forward transition at 00:00, as in
/// America/Santiago) resolve to the first valid wall-clock instant after,
/// probed in 15-minute steps.
fn local_midnight(date: NaiveDate, tz: Tz) -> Result<DateTime<Utc>, DateWindowError> {
    let midnight = date.and_hms_opt(0, 0, 0).expect("valid time");
    resolve_local(midnight, tz, 0).ok_or_else(|| DateWindowError::UnresolvableMidnight {
        date,
        timezone: tz.name().to_string(),
    })
}

fn resolve_local(naive: NaiveDateTime, tz: Tz, depth: u32) -> Option<DateTime<Utc>> {
    // DST gaps are at most a few hours; 3 hours of probing covers them all.
    if depth > 12 {
        return None;
    }
    match tz.from_local_datetime(&naive) {
        LocalResult::Single(dt) => Some(dt.with_timezone(&Utc)),
        LocalResult::Ambiguous(earliest, _) => Some(earliest.with_timezone(&Utc)),
        LocalResult::None => resolve_local(naive + Duration::minutes(15), tz, depth + 1),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Timelike;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn parse_valid_date() {
        assert_eq!(parse_date("2025-11-01"), Ok(date(2025, 11, 1)));
        assert_eq!(parse_date("2024-02-29"), Ok(date(2024, 2, 29)));
    }

    #[test]
    fn parse_rejects_malformed_dates() {
        assert!(parse_date("2025-13-40").is_err());
        assert!(parse_date("2025-02-30").is_err());
        assert!(parse_date("not-a-date").is_err());
        assert!(parse_date("2025/11/01").is_err());
        assert!(parse_date("").is_err());
    }

    #[test]
    fn window_covers_exactly_one_utc_day() {
        let window = DateWindow::for_date(date(2025, 11, 1), chrono_tz::UTC).unwrap();
        assert_eq!(window.duration(), Duration::hours(24));
        assert_eq!(window.start.date_naive(), date(2025, 11, 1));
        assert_eq!(window.end.date_naive(), date(2025, 11, 2));
    }

    #[test]
    fn window_is_half_open() {
        let window = DateWindow::for_date(date(2025, 11, 1), chrono_tz::UTC).unwrap();
        assert!(window.contains(window.start));
        assert!(!window.contains(window.end));
    }

    #[test]
    fn spring_forward_day_is_23_hours() {
        // US DST starts 2025-03-09 at 02:00 in America/Los_Angeles.
        let tz: Tz = "America/Los_Angeles".parse().unwrap();
        let window = DateWindow::for_date(date(2025, 3, 9), tz).unwrap();
        assert_eq!(window.duration(), Duration::hours(23));
    }

    #[test]
    fn fall_back_day_is_25_hours() {
        // US DST ends 2025-11-02 at 02:00 in America/Los_Angeles.
        let tz: Tz = "America/Los_Angeles".parse().unwrap();
        let window = DateWindow::for_date(date(2025, 11, 2), tz).unwrap();
        assert_eq!(window.duration(), Duration::hours(25));
    }

    #[test]
    fn window_starts_at_local_midnight() {
        let tz: Tz = "America/Los_Angeles".parse().unwrap();
        let window = DateWindow::for_date(date(2025, 11, 1), tz).unwrap();
        let local_start = window.start.with_timezone(&tz);
        assert_eq!(local_start.hour(), 0);
        assert_eq!(local_start.minute(), 0);
        assert_eq!(local_start.date_naive(), date(2025, 11, 1));
    }

    #[test]
    fn skipped_midnight_resolves_to_first_valid_instant() {
        // Chile springs forward at midnight: 2025-09-07 00:00 does not exist
        // in America/Santiago, the day starts at 01:00.
        let tz: Tz = "America/Santiago".parse().unwrap();
        let window = DateWindow::for_date(date(2025, 9, 7), tz).unwrap();
        let local_start = window.start.with_timezone(&tz);
        assert_eq!(local_start.date_naive(), date(2025, 9, 7));
        assert_eq!(window.duration(), Duration::hours(23));
    }
}
