//! Client configuration.
//!
//! All settings live in a single `config.toml` file at
//! `~/.config/remote-gcal/config.toml` by default. Every section is optional.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use gcal_providers::google::CALENDAR_API_BASE;
use gcal_providers::{HttpClientConfig, ProviderResult};
use serde::{Deserialize, Serialize};

use crate::error::{ClientError, ClientResult};

/// Directory name under the platform config directory.
const APP_DIR: &str = "remote-gcal";

// ---------------------------------------------------------------------------
// ClientConfig (config.toml)
// ---------------------------------------------------------------------------

/// Configuration for the `gcal` client.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Token broker settings.
    pub broker: BrokerSettings,

    /// Google Calendar API settings.
    pub google: GoogleSettings,

    /// Local OAuth redirect listener.
    pub callback: CallbackSettings,

    /// Secure storage settings.
    pub keyring: KeyringSettings,

    /// Event color names mapped to Google color ids.
    pub event_colors: EventColors,
}

/// Token broker settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BrokerSettings {
    /// Base URL of the broker.
    pub url: String,

    /// Request timeout in seconds.
    pub timeout: u64,
}

impl Default for BrokerSettings {
    fn default() -> Self {
        Self {
            url: "http://localhost:8000".to_string(),
            timeout: 5,
        }
    }
}

/// Google Calendar API settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GoogleSettings {
    /// Base URL of the calendar API.
    pub api_base: String,

    /// Request timeout in seconds.
    pub timeout: u64,
}

impl Default for GoogleSettings {
    fn default() -> Self {
        Self {
            api_base: CALENDAR_API_BASE.to_string(),
            timeout: 5,
        }
    }
}

/// Where the browser is redirected after consent.
///
/// Has to match the redirect URL registered with the broker's OAuth client.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CallbackSettings {
    pub host: String,
    pub port: u16,
    pub path: String,

    /// Give up waiting for the redirect after this many seconds.
    /// Unset means wait until interrupted.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,
}

impl Default for CallbackSettings {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 3000,
            path: "/oauth/callback".to_string(),
            timeout_secs: None,
        }
    }
}

impl CallbackSettings {
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }
}

/// Secure storage settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct KeyringSettings {
    /// Service name the tokens are stored under.
    pub service: String,
}

impl Default for KeyringSettings {
    fn default() -> Self {
        Self {
            service: "remote-gcal-cli".to_string(),
        }
    }
}

/// Event color names mapped to Google color ids.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EventColors(BTreeMap<String, String>);

impl Default for EventColors {
    fn default() -> Self {
        let colors = [
            ("lavender", "1"),
            ("sage", "2"),
            ("grape", "3"),
            ("flamingo", "4"),
            ("banana", "5"),
            ("tangerine", "6"),
            ("peacock", "7"),
            ("graphite", "8"),
            ("blueberry", "9"),
            ("basil", "10"),
            ("tomato", "11"),
        ];
        Self(
            colors
                .into_iter()
                .map(|(name, id)| (name.to_string(), id.to_string()))
                .collect(),
        )
    }
}

impl EventColors {
    /// Color id used when none is requested.
    pub const DEFAULT_ID: &'static str = "1";

    /// Looks up a color by name, case-insensitively.
    pub fn id_for(&self, name: &str) -> Option<&str> {
        self.0.get(&name.to_lowercase()).map(String::as_str)
    }

    /// Resolves an optional color name to an id.
    pub fn resolve(&self, name: Option<&str>) -> ClientResult<String> {
        match name {
            None => Ok(Self::DEFAULT_ID.to_string()),
            Some(name) => self.id_for(name).map(str::to_string).ok_or_else(|| {
                ClientError::Input(format!(
                    "unknown color '{}', expected one of: {}",
                    name,
                    self.names().collect::<Vec<_>>().join(", ")
                ))
            }),
        }
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl ClientConfig {
    /// Loads configuration from the default path.
    pub fn load() -> ClientResult<Self> {
        let path = Self::default_path();
        if path.exists() {
            Self::load_from(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Loads configuration from a specific path.
    pub fn load_from(path: &Path) -> ClientResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            ClientError::Config(format!("failed to read config {}: {}", path.display(), e))
        })?;
        toml::from_str(&content)
            .map_err(|e| ClientError::Config(format!("failed to parse config: {}", e)))
    }

    /// Returns the default configuration file path.
    pub fn default_path() -> PathBuf {
        Self::default_config_dir().join("config.toml")
    }

    /// Returns the default configuration directory.
    pub fn default_config_dir() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(APP_DIR)
    }

    /// HTTP settings for talking to the broker.
    pub fn broker_http(&self) -> ProviderResult<HttpClientConfig> {
        Ok(HttpClientConfig::new(&self.broker.url)?
            .with_timeout(Duration::from_secs(self.broker.timeout))
            .with_provider("broker"))
    }

    /// HTTP settings for the Google Calendar API.
    pub fn google_http(&self) -> ProviderResult<HttpClientConfig> {
        Ok(HttpClientConfig::new(&self.google.api_base)?
            .with_timeout(Duration::from_secs(self.google.timeout)))
    }

    /// Checks values that only fail at use time.
    pub fn validate(&self) -> ClientResult<()> {
        self.broker_http()
            .map_err(|e| ClientError::Config(format!("broker.url: {}", e)))?;
        self.google_http()
            .map_err(|e| ClientError::Config(format!("google.api_base: {}", e)))?;
        if !self.callback.path.starts_with('/') {
            return Err(ClientError::Config(
                "callback.path must start with '/'".to_string(),
            ));
        }
        if self.keyring.service.trim().is_empty() {
            return Err(ClientError::Config(
                "keyring.service must not be empty".to_string(),
            ));
        }
        if self.event_colors.is_empty() {
            return Err(ClientError::Config(
                "event_colors must define at least one color".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_broker_and_redirect() {
        let config = ClientConfig::default();
        assert_eq!(config.broker.url, "http://localhost:8000");
        assert_eq!(config.callback.port, 3000);
        assert_eq!(config.callback.path, "/oauth/callback");
        assert!(config.callback.timeout().is_none());
        assert_eq!(config.keyring.service, "remote-gcal-cli");
        assert_eq!(config.google.api_base, CALENDAR_API_BASE);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn partial_toml_keeps_other_defaults() {
        let config: ClientConfig = toml::from_str(
            r#"
[broker]
url = "https://broker.example.com"

[callback]
timeout_secs = 120
"#,
        )
        .unwrap();
        assert_eq!(config.broker.url, "https://broker.example.com");
        assert_eq!(config.broker.timeout, 5);
        assert_eq!(config.callback.port, 3000);
        assert_eq!(config.callback.timeout(), Some(Duration::from_secs(120)));
    }

    #[test]
    fn event_colors_default_to_google_palette() {
        let colors = EventColors::default();
        assert_eq!(colors.names().count(), 11);
        assert_eq!(colors.id_for("Tomato"), Some("11"));
        assert_eq!(colors.resolve(None).unwrap(), "1");
        assert_eq!(colors.resolve(Some("basil")).unwrap(), "10");
    }

    #[test]
    fn unknown_color_is_rejected() {
        let err = EventColors::default().resolve(Some("mauve")).unwrap_err();
        assert!(matches!(err, ClientError::Input(_)));
        assert!(err.to_string().contains("lavender"));
    }

    #[test]
    fn event_colors_can_be_replaced() {
        let config: ClientConfig = toml::from_str(
            r#"
[event_colors]
work = "9"
"#,
        )
        .unwrap();
        assert_eq!(config.event_colors.id_for("work"), Some("9"));
        assert!(config.event_colors.id_for("tomato").is_none());
    }

    #[test]
    fn load_from_reads_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[keyring]\nservice = \"test-service\"\n").unwrap();

        let config = ClientConfig::load_from(&path).unwrap();
        assert_eq!(config.keyring.service, "test-service");
    }

    #[test]
    fn load_from_reports_parse_errors() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[broker\n").unwrap();

        let err = ClientConfig::load_from(&path).unwrap_err();
        assert!(matches!(err, ClientError::Config(_)));
    }

    #[test]
    fn validate_rejects_relative_callback_path() {
        let mut config = ClientConfig::default();
        config.callback.path = "oauth".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_bad_broker_url() {
        let mut config = ClientConfig::default();
        config.broker.url = "not a url".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn default_path_ends_with_app_dir() {
        let path = ClientConfig::default_path();
        assert!(path.ends_with("remote-gcal/config.toml"));
    }
}
