//! Shared presentation helpers.

use crate::task::{Provenance, TaskOutcome};
use owo_colors::OwoColorize;
use serde::Serialize;

/// Pretty JSON for any serializable result.
pub fn format_json<T: Serialize + ?Sized>(value: &T) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| "{}".to_string())
}

/// Format a section heading with bold/underline.
pub fn format_section_heading(title: &str) -> String {
    format!("{}", title.bold().underline())
}

/// Short provenance label for a table cell.
pub fn provenance_label<T>(outcome: &TaskOutcome<T>) -> String {
    match &outcome.provenance {
        Provenance::Agent { defaulted } if defaulted.is_empty() => "agent".to_string(),
        Provenance::Agent { defaulted } => format!("agent (defaulted: {})", defaulted.join(", ")),
        Provenance::Fallback { fault } => {
            format!("fallback ({})", fault.as_str()).yellow().to_string()
        }
    }
}

pub fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let head: String = text.chars().take(max_chars.saturating_sub(3)).collect();
    format!("{}...", head)
}
