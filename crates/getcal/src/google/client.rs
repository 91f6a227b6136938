//! Google Calendar API client.
//!
//! A thin HTTP client for the `events.list` endpoint of the Calendar API v3,
//! querying one calendar over one day window and flattening pagination into a
//! single order-preserving event list.

use std::time::Duration;

use chrono::{DateTime, NaiveDate, Utc};
use serde::Deserialize;
use tracing::{debug, warn};

use getcal_core::{DateWindow, EventRecord, EventTime};

use crate::error::{Error, Result};

const CALENDAR_API_BASE: &str = "https://www.googleapis.com/calendar/v3";

/// Google Calendar API client, bound to one access token.
#[derive(Debug)]
pub struct CalendarClient {
    http_client: reqwest::Client,
    access_token: String,
}

impl CalendarClient {
    /// Creates a client with the given access token.
    pub fn new(access_token: impl Into<String>, timeout: Duration) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::Internal(format!("failed to create HTTP client: {}", e)))?;

        Ok(Self {
            http_client,
            access_token: access_token.into(),
        })
    }

    /// Fetches all events overlapping the window, in source order.
    ///
    /// Recurring events are expanded (`singleEvents=true`) and pagination is
    /// followed transparently, one page at a time. Cancelled events are
    /// dropped. A 401 mid-flight surfaces as [`Error::CredentialRevoked`] so
    /// the caller can decide whether to re-authenticate.
    pub async fn list_events(
        &self,
        calendar_id: &str,
        window: &DateWindow,
    ) -> Result<Vec<EventRecord>> {
        let mut events = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let page = self
                .list_events_page(calendar_id, window, page_token.as_deref())
                .await?;

            page_token = collect_page(&mut events, page);
            if page_token.is_none() {
                break;
            }
        }

        debug!(
            "fetched {} events from calendar {} for {}",
            events.len(),
            calendar_id,
            window.date
        );
        Ok(events)
    }

    async fn list_events_page(
        &self,
        calendar_id: &str,
        window: &DateWindow,
        page_token: Option<&str>,
    ) -> Result<EventListResponse> {
        let url = format!(
            "{}/calendars/{}/events",
            CALENDAR_API_BASE,
            urlencoding::encode(calendar_id)
        );

        let mut request = self
            .http_client
            .get(&url)
            .bearer_auth(&self.access_token)
            .query(&[
                ("timeMin", window.start.to_rfc3339()),
                ("timeMax", window.end.to_rfc3339()),
                ("singleEvents", "true".to_string()),
                ("orderBy", "startTime".to_string()),
            ]);

        if let Some(token) = page_token {
            request = request.query(&[("pageToken", token.to_string())]);
        }

        let response = request.send().await.map_err(|e| {
            if e.is_timeout() {
                Error::QueryFailed("request timeout".into())
            } else if e.is_connect() {
                Error::QueryFailed(format!("connection failed: {}", e))
            } else {
                Error::QueryFailed(format!("request failed: {}", e))
            }
        })?;

        let status = response.status();

        if status == reqwest::StatusCode::UNAUTHORIZED {
            return Err(Error::CredentialRevoked(
                "access token rejected by the API".into(),
            ));
        }

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::QueryFailed(format!("API error ({}): {}", status, body)));
        }

        let body = response
            .text()
            .await
            .map_err(|e| Error::QueryFailed(format!("failed to read response: {}", e)))?;

        serde_json::from_str(&body)
            .map_err(|e| Error::QueryFailed(format!("failed to parse response: {}", e)))
    }
}

/// Appends one page's usable events in source order.
///
/// Returns the token for the next page, `None` on the last one.
fn collect_page(events: &mut Vec<EventRecord>, page: EventListResponse) -> Option<String> {
    for item in page.items {
        if let Some(record) = convert_event(item) {
            events.push(record);
        }
    }
    page.next_page_token
}

/// Converts a Google Calendar API event to an [`EventRecord`].
///
/// Returns `None` for cancelled events or events without a parseable start.
fn convert_event(event: ApiEvent) -> Option<EventRecord> {
    if event.status.as_deref() == Some("cancelled") {
        return None;
    }

    let start = match (event.start.date_time, event.start.date) {
        (Some(dt), _) => {
            let parsed = DateTime::parse_from_rfc3339(&dt)
                .map_err(|e| warn!("failed to parse start time: {}", e))
                .ok()?;
            EventTime::DateTime(parsed.with_timezone(&Utc))
        }
        (None, Some(date)) => {
            let parsed = NaiveDate::parse_from_str(&date, "%Y-%m-%d")
                .map_err(|e| warn!("failed to parse start date: {}", e))
                .ok()?;
            EventTime::AllDay(parsed)
        }
        (None, None) => {
            warn!("event without a start time, skipping");
            return None;
        }
    };

    Some(EventRecord {
        start,
        // Untitled events keep an empty title rather than failing.
        title: event.summary.unwrap_or_default(),
        link: event.html_link,
    })
}

/// Response from the events.list endpoint.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct EventListResponse {
    #[serde(default)]
    items: Vec<ApiEvent>,
    next_page_token: Option<String>,
}

/// A single event from the Google Calendar API.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiEvent {
    summary: Option<String>,
    #[serde(default)]
    start: ApiEventTime,
    html_link: Option<String>,
    status: Option<String>,
}

/// Event start/end from the API: either a date or a datetime.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiEventTime {
    date: Option<String>,
    date_time: Option<String>,
}
