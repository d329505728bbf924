//! Token exchange service.
//!
//! Stateless wrapper around the Google OAuth client. Nothing is persisted
//! here; every call is independent and the CLI owns the resulting tokens.

use gcal_core::{RefreshOutcome, TokenPair, ValidationOutcome};
use gcal_providers::google::{CalendarApi, OAuthClient};
use gcal_providers::{HttpClientConfig, ProviderResult};
use thiserror::Error;
use tracing::{debug, info, warn};

/// Failures surfaced to broker callers.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExchangeError {
    /// Input rejected before any network call.
    #[error("{0}")]
    Validation(String),

    /// Code exchange or its liveness check failed. Details are only logged.
    #[error("Failed to authenticate Google account")]
    AuthenticationFailed,

    /// The service is not configured for this operation.
    #[error("{0}")]
    Unavailable(String),
}

/// Brokers authorization-code and refresh-token grants.
#[derive(Debug, Clone)]
pub struct TokenExchangeService {
    oauth: OAuthClient,
    api_config: HttpClientConfig,
}

impl TokenExchangeService {
    /// `api_config` points at the Calendar API used for liveness checks.
    pub fn new(oauth: OAuthClient, api_config: HttpClientConfig) -> Self {
        Self { oauth, api_config }
    }

    /// Consent URL for the configured client.
    pub fn oauth_url(&self) -> Result<String, ExchangeError> {
        self.oauth.authorization_url().map_err(|e| {
            warn!(error = %e, "cannot build consent URL");
            ExchangeError::Unavailable("Failed to fetch Google OAuth URL".to_string())
        })
    }

    /// Exchanges a single-use authorization code for a token pair.
    ///
    /// The new access token is checked against the settings endpoint before
    /// it is handed out. Any failure collapses into
    /// [`ExchangeError::AuthenticationFailed`].
    pub async fn exchange_code(&self, code: &str) -> Result<TokenPair, ExchangeError> {
        if code.trim().is_empty() {
            return Err(ExchangeError::Validation("code is required".to_string()));
        }

        let pair = self.oauth.exchange_code(code).await.map_err(|e| {
            warn!(error = %e, status = ?e.status(), "authorization code exchange failed");
            ExchangeError::AuthenticationFailed
        })?;

        if let Err(e) = self.check_liveness(&pair.access_token).await {
            warn!(error = %e, status = ?e.status(), "new access token failed liveness check");
            return Err(ExchangeError::AuthenticationFailed);
        }

        info!("Google account authenticated");
        Ok(pair)
    }

    /// Mints a new access token.
    ///
    /// Provider rejections and transport failures both come back as
    /// [`RefreshOutcome::InvalidRefreshToken`]; the `cause` log field tells
    /// them apart.
    pub async fn refresh_access_token(
        &self,
        refresh_token: &str,
    ) -> Result<RefreshOutcome, ExchangeError> {
        if refresh_token.trim().is_empty() {
            return Err(ExchangeError::Validation("refresh_token is required".to_string()));
        }

        match self.oauth.refresh_token(refresh_token).await {
            Ok(pair) => Ok(RefreshOutcome::Refreshed(pair)),
            Err(e) => {
                let cause = if e.status().is_some() { "rejected" } else { "transport" };
                warn!(error = %e, cause, "refresh token exchange failed");
                Ok(RefreshOutcome::InvalidRefreshToken)
            }
        }
    }

    /// Checks an access token with one authenticated call.
    pub async fn validate_token(
        &self,
        access_token: &str,
    ) -> Result<ValidationOutcome, ExchangeError> {
        if access_token.trim().is_empty() {
            return Err(ExchangeError::Validation("access_token is required".to_string()));
        }

        match self.check_liveness(access_token).await {
            Ok(()) => Ok(ValidationOutcome::Valid),
            Err(e) => {
                debug!(error = %e, "access token rejected");
                Ok(ValidationOutcome::Invalid)
            }
        }
    }

    /// Config for calendar calls made on behalf of a caller.
    pub fn api_config(&self) -> &HttpClientConfig {
        &self.api_config
    }

    async fn check_liveness(&self, access_token: &str) -> ProviderResult<()> {
        CalendarApi::new(self.api_config.clone(), access_token)?
            .settings()
            .await?;
        Ok(())
    }
}
