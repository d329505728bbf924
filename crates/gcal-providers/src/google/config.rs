//! Google OAuth client settings.

use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

use crate::error::{ProviderError, ProviderResult};

/// Consent page.
pub const GOOGLE_AUTH_URL: &str = "https://accounts.google.com/o/oauth2/v2/auth";
/// Token endpoint for code and refresh grants.
pub const GOOGLE_TOKEN_URL: &str = "https://oauth2.googleapis.com/token";
/// Root of the Calendar v3 REST API.
pub const CALENDAR_API_BASE: &str = "https://www.googleapis.com/calendar/v3/";
/// Where Google sends the browser after consent.
pub const DEFAULT_REDIRECT_URL: &str = "http://localhost:3000/oauth/callback";

/// Scopes requested at consent time.
pub const DEFAULT_SCOPES: &[&str] = &[
    "https://www.googleapis.com/auth/calendar",
    "https://www.googleapis.com/auth/calendar.events",
    "https://www.googleapis.com/auth/calendar.settings.readonly",
];

/// OAuth 2.0 client id and secret.
#[derive(Clone)]
pub struct OAuthCredentials {
    pub client_id: String,
    pub client_secret: String,
}

impl std::fmt::Debug for OAuthCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OAuthCredentials")
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .finish()
    }
}

/// Shape of the credentials JSON downloaded from Google Cloud Console.
#[derive(Debug, Deserialize)]
struct CredentialsFile {
    installed: Option<NestedCredentials>,
    web: Option<NestedCredentials>,
    client_id: Option<String>,
    client_secret: Option<String>,
}

#[derive(Debug, Deserialize)]
struct NestedCredentials {
    client_id: String,
    client_secret: String,
}

impl OAuthCredentials {
    pub fn new(client_id: impl Into<String>, client_secret: impl Into<String>) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
        }
    }

    /// Loads credentials from a Google Cloud Console JSON file.
    pub fn from_file(path: impl AsRef<Path>) -> ProviderResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            ProviderError::configuration(format!(
                "failed to read credentials file {}: {}",
                path.display(),
                e
            ))
        })?;
        Self::from_json(&content)
    }

    /// Parses `{"web":{..}}`, `{"installed":{..}}` or a flat
    /// `{"client_id":..,"client_secret":..}` document.
    pub fn from_json(json: &str) -> ProviderResult<Self> {
        let file: CredentialsFile = serde_json::from_str(json).map_err(|e| {
            ProviderError::configuration(format!("failed to parse credentials JSON: {}", e))
        })?;

        if let Some(creds) = file.web.or(file.installed) {
            return Ok(Self::new(creds.client_id, creds.client_secret));
        }
        if let (Some(id), Some(secret)) = (file.client_id, file.client_secret) {
            return Ok(Self::new(id, secret));
        }

        Err(ProviderError::configuration(
            "credentials must contain a 'web'/'installed' section or 'client_id'/'client_secret'",
        ))
    }

    /// Checks that both values are present.
    pub fn validate(&self) -> Result<(), &'static str> {
        if self.client_id.trim().is_empty() {
            return Err("client_id is required");
        }
        if self.client_secret.trim().is_empty() {
            return Err("client_secret is required");
        }
        Ok(())
    }
}

/// Endpoints, scopes and redirect used by the OAuth client.
#[derive(Debug, Clone)]
pub struct GoogleOAuthConfig {
    pub credentials: OAuthCredentials,
    pub auth_url: String,
    pub token_url: String,
    pub redirect_url: String,
    pub scopes: Vec<String>,
    pub timeout: Duration,
}

impl GoogleOAuthConfig {
    /// Upstream timeout used by the broker.
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(2);

    pub fn new(credentials: OAuthCredentials) -> Self {
        Self {
            credentials,
            auth_url: GOOGLE_AUTH_URL.to_string(),
            token_url: GOOGLE_TOKEN_URL.to_string(),
            redirect_url: DEFAULT_REDIRECT_URL.to_string(),
            scopes: DEFAULT_SCOPES.iter().map(|s| s.to_string()).collect(),
            timeout: Self::DEFAULT_TIMEOUT,
        }
    }

    pub fn with_redirect_url(mut self, url: impl Into<String>) -> Self {
        self.redirect_url = url.into();
        self
    }

    pub fn with_token_url(mut self, url: impl Into<String>) -> Self {
        self.token_url = url.into();
        self
    }

    pub fn with_auth_url(mut self, url: impl Into<String>) -> Self {
        self.auth_url = url.into();
        self
    }

    pub fn with_scopes(mut self, scopes: Vec<String>) -> Self {
        self.scopes = scopes;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn credentials_from_json_web() {
        let json = r#"{"web":{"client_id":"id.apps.googleusercontent.com","client_secret":"s","project_id":"p"}}"#;
        let creds = OAuthCredentials::from_json(json).unwrap();
        assert_eq!(creds.client_id, "id.apps.googleusercontent.com");
        assert_eq!(creds.client_secret, "s");
    }

    #[test]
    fn credentials_from_json_flat() {
        let creds = OAuthCredentials::from_json(r#"{"client_id":"a","client_secret":"b"}"#).unwrap();
        assert_eq!(creds.client_id, "a");
    }

    #[test]
    fn credentials_from_json_missing() {
        assert!(OAuthCredentials::from_json(r#"{"client_id":"a"}"#).is_err());
    }

    #[test]
    fn credentials_validation() {
        assert!(OAuthCredentials::new("id", "secret").validate().is_ok());
        assert!(OAuthCredentials::new("", "secret").validate().is_err());
        assert!(OAuthCredentials::new("id", " ").validate().is_err());
    }

    #[test]
    fn debug_redacts_secret() {
        let debug = format!("{:?}", OAuthCredentials::new("id", "hunter2"));
        assert!(!debug.contains("hunter2"));
    }

    #[test]
    fn default_config() {
        let config = GoogleOAuthConfig::new(OAuthCredentials::new("id", "s"));
        assert_eq!(config.redirect_url, "http://localhost:3000/oauth/callback");
        assert_eq!(config.scopes.len(), 3);
        assert_eq!(config.timeout, Duration::from_secs(2));
    }
}
