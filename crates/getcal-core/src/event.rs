//! Calendar event records.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// The start of a calendar event.
///
/// Timed events carry a specific instant (stored as UTC); all-day events carry
/// only a date and render without a clock time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value")]
pub enum EventTime {
    /// A specific instant, stored in UTC.
    DateTime(DateTime<Utc>),
    /// An all-day event date.
    AllDay(NaiveDate),
}

impl EventTime {
    /// Returns `true` if this is an all-day marker.
    pub fn is_all_day(&self) -> bool {
        matches!(self, Self::AllDay(_))
    }

    /// Returns the date portion of this event time.
    pub fn date(&self) -> NaiveDate {
        match self {
            Self::DateTime(dt) => dt.date_naive(),
            Self::AllDay(date) => *date,
        }
    }
}

/// One calendar entry as returned by the query source.
///
/// Records carry no ordering invariant; formatting preserves source order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventRecord {
    /// When the event starts.
    pub start: EventTime,
    /// Event title. Events with no title use the empty string.
    pub title: String,
    /// Canonical link to the event, when the source provides one.
    pub link: Option<String>,
}

impl EventRecord {
    /// Creates a timed event record.
    pub fn timed(start: DateTime<Utc>, title: impl Into<String>) -> Self {
        Self {
            start: EventTime::DateTime(start),
            title: title.into(),
            link: None,
        }
    }

    /// Creates an all-day event record.
    pub fn all_day(date: NaiveDate, title: impl Into<String>) -> Self {
        Self {
            start: EventTime::AllDay(date),
            title: title.into(),
            link: None,
        }
    }

    /// Attaches the canonical link.
    pub fn with_link(mut self, link: impl Into<String>) -> Self {
        self.link = Some(link.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn timed_record() {
        let start = Utc.with_ymd_and_hms(2025, 11, 1, 22, 0, 0).unwrap();
        let record = EventRecord::timed(start, "Standup").with_link("https://cal/x");
        assert!(!record.start.is_all_day());
        assert_eq!(record.start.date(), start.date_naive());
        assert_eq!(record.title, "Standup");
        assert_eq!(record.link.as_deref(), Some("https://cal/x"));
    }

    #[test]
    fn all_day_record() {
        let date = NaiveDate::from_ymd_opt(2025, 11, 1).unwrap();
        let record = EventRecord::all_day(date, "Holiday");
        assert!(record.start.is_all_day());
        assert_eq!(record.start.date(), date);
        assert!(record.link.is_none());
    }

    #[test]
    fn serde_roundtrip() {
        let start = Utc.with_ymd_and_hms(2025, 11, 1, 22, 0, 0).unwrap();
        let record = EventRecord::timed(start, "Standup").with_link("https://cal/x");
        let json = serde_json::to_string(&record).unwrap();
        let parsed: EventRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(record, parsed);
    }
}
