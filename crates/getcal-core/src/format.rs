//! Rendering of event records into plain and rich text.
//!
//! Both formatters are pure: the same input list always produces byte-identical
//! output. Timestamps are converted into the supplied timezone; the caller
//! decides which zone is "local".

use chrono_tz::Tz;

use crate::event::{EventRecord, EventTime};

/// Sentinel text rendered for an empty event list.
pub const NO_EVENTS: &str = "No events.";

/// Renders events as markdown-style lines joined by newlines.
///
/// Timed events render as `YYYY-MM-DD HH:MM (ZONEABBR) - [title](link)`,
/// all-day events without the clock time. Events without a link render the
/// bare title. An empty list yields exactly [`NO_EVENTS`].
pub fn format_text(events: &[EventRecord], tz: Tz) -> String {
    if events.is_empty() {
        return NO_EVENTS.to_string();
    }

    events
        .iter()
        .map(|event| {
            let stamp = format_start(&event.start, tz);
            match &event.link {
                Some(link) => format!("{} - [{}]({})", stamp, event.title, link),
                None => format!("{} - {}", stamp, event.title),
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Renders events as an HTML fragment for the rich-text clipboard flavor.
///
/// Links become `<a>` anchors so pasted output keeps clickable hyperlinks.
pub fn format_html(events: &[EventRecord], tz: Tz) -> String {
    let mut parts = vec!["<html><body>".to_string()];

    if events.is_empty() {
        parts.push(format!("<p>{}</p>", NO_EVENTS));
    }

    for event in events {
        let stamp = html_escape(&format_start(&event.start, tz));
        let title = html_escape(&event.title);
        let body = match &event.link {
            Some(link) => format!("<a href=\"{}\">{}</a>", html_escape(link), title),
            None => title,
        };
        parts.push(format!("<p><strong>{}</strong> - {}</p>", stamp, body));
    }

    parts.push("</body></html>".to_string());
    parts.concat()
}

/// Escapes the HTML special characters `& < > " '`.
pub fn html_escape(input: &str) -> String {
    let mut escaped = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

fn format_start(start: &EventTime, tz: Tz) -> String {
    match start {
        EventTime::DateTime(dt) => dt.with_timezone(&tz).format("%Y-%m-%d %H:%M (%Z)").to_string(),
        EventTime::AllDay(date) => date.format("%Y-%m-%d").to_string(),
    }
}
