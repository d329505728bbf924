//! Authorization-code and refresh-token grants against Google.
//!
//! The broker is the only holder of the client secret, so this client is
//! used server-side. The consent URL it builds is handed to the CLI, which
//! opens it in a browser and later posts the returned code back.

use gcal_core::TokenPair;
use serde::Deserialize;
use tracing::{debug, info};
use url::Url;

use crate::error::{ProviderError, ProviderResult};
use crate::http::extract_error_message;

use super::config::GoogleOAuthConfig;

/// OAuth client for Google's consent page and token endpoint.
#[derive(Debug, Clone)]
pub struct OAuthClient {
    config: GoogleOAuthConfig,
    http_client: reqwest::Client,
}

impl OAuthClient {
    pub fn new(config: GoogleOAuthConfig) -> ProviderResult<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| {
                ProviderError::configuration(format!("failed to create HTTP client: {}", e))
                    .with_source(e)
            })?;

        Ok(Self {
            config,
            http_client,
        })
    }

    pub fn config(&self) -> &GoogleOAuthConfig {
        &self.config
    }

    /// Builds the consent URL requesting offline access.
    pub fn authorization_url(&self) -> ProviderResult<String> {
        if self.config.credentials.client_id.trim().is_empty() {
            return Err(ProviderError::configuration("OAuth client id is not configured"));
        }

        let scope = self.config.scopes.join(" ");
        let url = Url::parse_with_params(
            &self.config.auth_url,
            &[
                ("access_type", "offline"),
                ("response_type", "code"),
                ("client_id", self.config.credentials.client_id.as_str()),
                ("redirect_uri", self.config.redirect_url.as_str()),
                ("scope", scope.as_str()),
            ],
        )
        .map_err(|e| ProviderError::configuration(format!("invalid auth URL: {}", e)))?;

        Ok(url.into())
    }

    /// Exchanges an authorization code for a token pair.
    pub async fn exchange_code(&self, code: &str) -> ProviderResult<TokenPair> {
        let params = [
            ("client_id", self.config.credentials.client_id.as_str()),
            ("client_secret", self.config.credentials.client_secret.as_str()),
            ("code", code),
            ("grant_type", "authorization_code"),
            ("redirect_uri", self.config.redirect_url.as_str()),
        ];

        let token = self.post_token_form(&params, "token exchange").await?;
        info!("obtained tokens from authorization code");
        Ok(token)
    }

    /// Mints a new access token from a refresh token.
    ///
    /// Google usually omits `refresh_token` here; the returned pair then
    /// carries only the new access token.
    pub async fn refresh_token(&self, refresh_token: &str) -> ProviderResult<TokenPair> {
        let params = [
            ("client_id", self.config.credentials.client_id.as_str()),
            ("client_secret", self.config.credentials.client_secret.as_str()),
            ("refresh_token", refresh_token),
            ("grant_type", "refresh_token"),
        ];

        let token = self.post_token_form(&params, "token refresh").await?;
        info!("refreshed access token");
        Ok(token)
    }

    async fn post_token_form(
        &self,
        params: &[(&str, &str)],
        what: &str,
    ) -> ProviderResult<TokenPair> {
        let response = self
            .http_client
            .post(&self.config.token_url)
            .form(params)
            .send()
            .await
            .map_err(|e| {
                ProviderError::network(format!("{} request failed: {}", what, e))
                    .with_provider("google")
                    .with_source(e)
            })?;

        let status = response.status();
        let body = response.text().await.map_err(|e| {
            ProviderError::network(format!("failed to read response: {}", e))
                .with_provider("google")
                .with_source(e)
        })?;

        if !status.is_success() {
            debug!(status = status.as_u16(), "{} rejected", what);
            let detail = extract_error_message(&body).unwrap_or_default();
            return Err(ProviderError::from_status(
                status.as_u16(),
                format!("{} failed ({}): {}", what, status, detail),
            )
            .with_provider("google"));
        }

        let response: TokenResponse = serde_json::from_str(&body).map_err(|e| {
            ProviderError::invalid_response(format!("invalid token response: {}", e))
                .with_provider("google")
        })?;

        if response.access_token.is_empty() {
            return Err(ProviderError::invalid_response("token response has no access token")
                .with_provider("google"));
        }

        Ok(TokenPair {
            access_token: response.access_token,
            refresh_token: response.refresh_token,
            expires_in: response.expires_in,
            scope: response.scope,
            token_type: response.token_type,
        })
    }
}

/// Response from Google's token endpoint.
#[derive(Debug, Deserialize)]
struct TokenResponse {
    #[serde(default)]
    access_token: String,
    #[serde(default)]
    refresh_token: Option<String>,
    #[serde(default)]
    expires_in: Option<i64>,
    #[serde(default)]
    scope: Option<String>,
    #[serde(default)]
    token_type: Option<String>,
}
