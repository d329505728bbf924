//! Pointer to the checked-out calendar.

use std::path::{Path, PathBuf};

use gcal_core::CalendarSummary;
use serde::{Deserialize, Serialize};

use crate::config::ClientConfig;
use crate::error::{ClientError, ClientResult};

const FILE_NAME: &str = "current_calendar.json";

/// Calendar the event commands operate on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrentCalendar {
    pub id: String,
    pub summary: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timezone: Option<String>,
}

impl From<&CalendarSummary> for CurrentCalendar {
    fn from(calendar: &CalendarSummary) -> Self {
        Self {
            id: calendar.id.clone(),
            summary: calendar.summary.clone(),
            timezone: calendar.timezone.clone(),
        }
    }
}

impl CurrentCalendar {
    /// Default location, next to `config.toml`.
    pub fn default_path() -> PathBuf {
        ClientConfig::default_config_dir().join(FILE_NAME)
    }

    /// Reads the pointer; `None` if nothing has been checked out.
    pub fn load(path: &Path) -> ClientResult<Option<Self>> {
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        serde_json::from_str(&content).map(Some).map_err(|e| {
            ClientError::Config(format!("failed to parse {}: {}", path.display(), e))
        })
    }

    /// Writes the pointer, creating the parent directory.
    pub fn save(&self, path: &Path) -> ClientResult<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| ClientError::Config(format!("failed to serialize calendar: {}", e)))?;
        std::fs::write(path, json)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_is_none() {
        let dir = tempfile::tempdir().unwrap();
        assert!(CurrentCalendar::load(&dir.path().join(FILE_NAME)).unwrap().is_none());
    }

    #[test]
    fn save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join(FILE_NAME);
        let mut summary = CalendarSummary::new("team@group.calendar.google.com", "Team");
        summary.timezone = Some("Europe/Paris".into());

        CurrentCalendar::from(&summary).save(&path).unwrap();
        let loaded = CurrentCalendar::load(&path).unwrap().unwrap();
        assert_eq!(loaded.id, "team@group.calendar.google.com");
        assert_eq!(loaded.timezone.as_deref(), Some("Europe/Paris"));
    }

    #[test]
    fn corrupt_file_is_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(FILE_NAME);
        std::fs::write(&path, "{").unwrap();
        assert!(matches!(CurrentCalendar::load(&path), Err(ClientError::Config(_))));
    }
}
