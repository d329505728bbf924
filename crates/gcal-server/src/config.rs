//! Broker configuration.
//!
//! Values come from, in increasing priority: built-in defaults, an optional
//! TOML file, then command-line flags and their environment fallbacks.
//! Client id and secret may be `pass::` or `env::` references.

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use gcal_providers::google::{
    CALENDAR_API_BASE, DEFAULT_REDIRECT_URL, GOOGLE_AUTH_URL, GOOGLE_TOKEN_URL, GoogleOAuthConfig,
    OAuthClient, OAuthCredentials,
};
use gcal_providers::HttpClientConfig;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::cli::BrokerArgs;
use crate::error::{ServerError, ServerResult};
use crate::exchange::TokenExchangeService;
use crate::secret;

/// Default listen address.
pub const DEFAULT_BIND: &str = "127.0.0.1:8000";

/// On-disk configuration file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BrokerFile {
    pub bind: Option<String>,
    pub google: GoogleSection,
}

/// `[google]` section.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GoogleSection {
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
    pub credentials_file: Option<PathBuf>,
    pub redirect_url: Option<String>,
    pub api_base: Option<String>,
    pub auth_url: Option<String>,
    pub token_url: Option<String>,
    pub timeout_secs: Option<u64>,
}

impl BrokerFile {
    pub fn load(path: &Path) -> ServerResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            ServerError::config(format!("failed to read {}: {}", path.display(), e))
        })?;
        toml::from_str(&content)
            .map_err(|e| ServerError::config(format!("failed to parse {}: {}", path.display(), e)))
    }
}

/// Fully resolved broker settings.
#[derive(Debug, Clone)]
pub struct BrokerConfig {
    pub bind: SocketAddr,
    pub credentials: OAuthCredentials,
    pub redirect_url: String,
    pub api_base: String,
    pub auth_url: String,
    pub token_url: String,
    pub upstream_timeout: Duration,
}

impl Default for BrokerConfig {
    fn default() -> Self {
        Self {
            bind: SocketAddr::from(([127, 0, 0, 1], 8000)),
            credentials: OAuthCredentials::new("", ""),
            redirect_url: DEFAULT_REDIRECT_URL.to_string(),
            api_base: CALENDAR_API_BASE.to_string(),
            auth_url: GOOGLE_AUTH_URL.to_string(),
            token_url: GOOGLE_TOKEN_URL.to_string(),
            upstream_timeout: GoogleOAuthConfig::DEFAULT_TIMEOUT,
        }
    }
}

impl BrokerConfig {
    /// Merges the config file named by `args` (if any) with the flags.
    pub fn resolve(args: &BrokerArgs) -> ServerResult<Self> {
        let file = match args.config {
            Some(ref path) => BrokerFile::load(path)?,
            None => BrokerFile::default(),
        };
        Self::from_parts(file, args)
    }

    /// Merges an already-loaded file with the flags.
    pub fn from_parts(file: BrokerFile, args: &BrokerArgs) -> ServerResult<Self> {
        let defaults = Self::default();
        let google = file.google;

        let bind_str = args.bind.clone().or(file.bind);
        let bind = match bind_str {
            Some(s) => s
                .parse()
                .map_err(|e| ServerError::config(format!("invalid bind address '{}': {}", s, e)))?,
            None => defaults.bind,
        };

        let mut credentials = match args.credentials_file.as_ref().or(google.credentials_file.as_ref()) {
            Some(path) => OAuthCredentials::from_file(path)?,
            None => OAuthCredentials::new("", ""),
        };
        if let Some(id) = args.client_id.clone().or(google.client_id) {
            credentials.client_id = secret::resolve("client_id", &id)?;
        }
        if let Some(sec) = args.client_secret.clone().or(google.client_secret) {
            credentials.client_secret = secret::resolve("client_secret", &sec)?;
        }

        let upstream_timeout = args
            .upstream_timeout
            .or(google.timeout_secs)
            .map(Duration::from_secs)
            .unwrap_or(defaults.upstream_timeout);

        Ok(Self {
            bind,
            credentials,
            redirect_url: args
                .redirect_url
                .clone()
                .or(google.redirect_url)
                .unwrap_or(defaults.redirect_url),
            api_base: google.api_base.unwrap_or(defaults.api_base),
            auth_url: google.auth_url.unwrap_or(defaults.auth_url),
            token_url: google.token_url.unwrap_or(defaults.token_url),
            upstream_timeout,
        })
    }

    /// Builds the exchange service described by this config.
    pub fn exchange_service(&self) -> ServerResult<TokenExchangeService> {
        if let Err(reason) = self.credentials.validate() {
            warn!(reason, "Google OAuth credentials incomplete; auth routes will fail");
        }

        let oauth = OAuthClient::new(
            GoogleOAuthConfig::new(self.credentials.clone())
                .with_auth_url(self.auth_url.clone())
                .with_token_url(self.token_url.clone())
                .with_redirect_url(self.redirect_url.clone())
                .with_timeout(self.upstream_timeout),
        )?;
        let api = HttpClientConfig::new(&self.api_base)?.with_timeout(self.upstream_timeout);
        Ok(TokenExchangeService::new(oauth, api))
    }
}
