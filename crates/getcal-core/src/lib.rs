//! Core types: event times, date windows, output formatting

pub mod event;
pub mod format;
pub mod time;

pub use event::{EventRecord, EventTime};
pub use format::{format_html, format_text, html_escape, NO_EVENTS};
pub use time::{parse_date, DateWindow, DateWindowError};
