//! OAuth token data model.
//!
//! [`TokenPair`] is what the broker hands out after a grant or a refresh.
//! [`ValidationOutcome`] and [`RefreshOutcome`] are the typed forms of the
//! string sentinels the broker puts on the wire.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Access and refresh tokens returned by the provider's token endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenPair {
    /// Short-lived credential for calendar API calls.
    pub access_token: String,

    /// Long-lived credential used only to mint new access tokens.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,

    /// Lifetime of the access token in seconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_in: Option<i64>,

    /// Space-separated scopes granted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,

    /// Token type, normally `Bearer`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_type: Option<String>,
}

impl TokenPair {
    /// Creates a token pair with only an access token.
    pub fn new(access_token: impl Into<String>) -> Self {
        Self {
            access_token: access_token.into(),
            refresh_token: None,
            expires_in: None,
            scope: None,
            token_type: None,
        }
    }

    /// Sets the refresh token.
    pub fn with_refresh_token(mut self, refresh_token: impl Into<String>) -> Self {
        self.refresh_token = Some(refresh_token.into());
        self
    }

    /// Sets the access token lifetime.
    pub fn with_expires_in(mut self, secs: i64) -> Self {
        self.expires_in = Some(secs);
        self
    }

    /// Returns true if the access token is non-empty.
    pub fn has_access_token(&self) -> bool {
        !self.access_token.is_empty()
    }

    /// Returns the refresh token if one was issued and it is non-empty.
    pub fn refresh_token(&self) -> Option<&str> {
        self.refresh_token.as_deref().filter(|t| !t.is_empty())
    }
}

/// Result of checking an access token against the provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationOutcome {
    /// The provider accepted the token.
    Valid,
    /// The provider rejected the token; a refresh should follow.
    Invalid,
    /// The check itself could not be completed.
    Error(String),
}

impl ValidationOutcome {
    /// Returns true for [`ValidationOutcome::Valid`].
    pub fn is_valid(&self) -> bool {
        matches!(self, Self::Valid)
    }
}

/// Result of exchanging a refresh token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// A new token pair was minted.
    Refreshed(TokenPair),
    /// The refresh token is no longer usable.
    InvalidRefreshToken,
}

/// Authentication state of the local client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AuthState {
    /// No usable tokens are stored.
    Unauthenticated,
    /// Stored access token is known to work.
    AuthenticatedValid,
    /// Stored access token was rejected; a refresh is pending.
    AuthenticatedNeedsRefresh,
}

impl AuthState {
    /// Returns a stable lowercase name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Unauthenticated => "unauthenticated",
            Self::AuthenticatedValid => "authenticated",
            Self::AuthenticatedNeedsRefresh => "needs_refresh",
        }
    }
}

impl fmt::Display for AuthState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
