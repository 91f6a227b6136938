//! Output sink: system clipboard or standard output.
//!
//! Delivery is all-or-nothing: the caller only reaches this point with the
//! fully formatted text, and dry-run mode never touches the clipboard.

use tracing::warn;

use crate::error::{Error, Result};

/// Where the formatted text goes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SinkMode {
    /// Write to the system clipboard, rich text preferred.
    Clipboard,
    /// Print to stdout only.
    DryRun,
}

/// Delivers the formatted text to its destination.
///
/// In clipboard mode the HTML flavor is written with the plain text as the
/// alternate, so pasting into rich-text targets keeps clickable hyperlinks.
/// If the rich-text write fails, falls back to a plain-text write with a
/// non-fatal warning.
pub fn deliver(plain: &str, html: &str, mode: SinkMode) -> Result<()> {
    match mode {
        SinkMode::DryRun => {
            println!("{}", plain);
            Ok(())
        }
        SinkMode::Clipboard => copy_to_clipboard(plain, html),
    }
}

fn copy_to_clipboard(plain: &str, html: &str) -> Result<()> {
    let mut clipboard = arboard::Clipboard::new()
        .map_err(|e| Error::SinkUnavailable(format!("failed to access clipboard: {}", e)))?;

    if let Err(e) = clipboard.set_html(html, Some(plain)) {
        warn!("rich-text clipboard write failed: {}", e);
        eprintln!("Falling back to plain-text clipboard copy.");
        clipboard
            .set_text(plain)
            .map_err(|e| Error::SinkUnavailable(format!("failed to copy to clipboard: {}", e)))?;
    }

    Ok(())
}
