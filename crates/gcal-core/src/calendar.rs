//! Calendar and event view types.

use serde::{Deserialize, Serialize};

use crate::format::ellipsis;
use crate::time::EventTime;

/// Width at which event descriptions and locations are cut in listings.
pub const FIELD_PREVIEW_CHARS: usize = 50;

/// A calendar as shown by `get-calendar`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalendarSummary {
    pub id: String,
    pub summary: String,
    #[serde(default)]
    pub timezone: Option<String>,
    #[serde(default)]
    pub primary: bool,
    #[serde(default)]
    pub role: Option<String>,
}

impl CalendarSummary {
    /// Creates a summary with just an id and a title.
    pub fn new(id: impl Into<String>, summary: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            summary: summary.into(),
            timezone: None,
            primary: false,
            role: None,
        }
    }

    /// Label used in selection prompts.
    pub fn label(&self) -> String {
        if self.primary {
            format!("{} (primary)", self.summary)
        } else {
            self.summary.clone()
        }
    }
}

/// An event instance as listed by the event commands.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventSummary {
    pub id: String,
    pub summary: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    pub start: EventTime,
    pub end: EventTime,
    #[serde(default)]
    pub color_id: Option<String>,
}

impl EventSummary {
    /// Description cut to the preview width, or a placeholder.
    pub fn description_preview(&self) -> String {
        preview(self.description.as_deref(), "Description not specified")
    }

    /// Location cut to the preview width, or a placeholder.
    pub fn location_preview(&self) -> String {
        preview(self.location.as_deref(), "Location not specified")
    }

    /// Label used in selection prompts.
    pub fn label(&self) -> String {
        format!("{} ({} -- {})", self.summary, self.start, self.end)
    }
}

fn preview(value: Option<&str>, placeholder: &str) -> String {
    match value {
        Some(v) if !v.is_empty() => ellipsis(v, FIELD_PREVIEW_CHARS).into_owned(),
        _ => placeholder.to_string(),
    }
}
