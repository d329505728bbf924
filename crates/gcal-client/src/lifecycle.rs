//! OAuth token lifecycle.
//!
//! ```text
//!                 authenticate()
//! Unauthenticated ──────────────▶ AuthenticatedValid
//!       ▲                            │        ▲
//!       │ invalid_refresh_token      │ 401 /  │ refreshed
//!       │                            ▼ invalid│
//!       └──────────────────── AuthenticatedNeedsRefresh
//! ```
//!
//! Each transition runs at most once per command. A rejected refresh token
//! clears the store and the user has to run `gcal auth` again.

use std::sync::atomic::{AtomicBool, Ordering};

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use gcal_core::{AuthState, RefreshOutcome, TokenPair, ValidationOutcome};
use rand::Rng;
use tracing::{debug, info, warn};
use url::Url;

use crate::broker::TokenBroker;
use crate::browser::BrowserOpener;
use crate::callback::CallbackListener;
use crate::config::CallbackSettings;
use crate::error::{ClientError, ClientResult};
use crate::store::{StoreKey, TokenStore};

const REAUTHENTICATE: &str = "run `gcal auth` to sign in";

/// Drives grant, validation, refresh and logout against a token store.
pub struct TokenLifecycle {
    store: Box<dyn TokenStore>,
    broker: Box<dyn TokenBroker>,
    browser: Box<dyn BrowserOpener>,
    callback: CallbackSettings,
    needs_refresh: AtomicBool,
}

impl TokenLifecycle {
    pub fn new(
        store: Box<dyn TokenStore>,
        broker: Box<dyn TokenBroker>,
        browser: Box<dyn BrowserOpener>,
        callback: CallbackSettings,
    ) -> Self {
        Self {
            store,
            broker,
            browser,
            callback,
            needs_refresh: AtomicBool::new(false),
        }
    }

    /// Current state as far as the local store knows.
    ///
    /// Unauthenticated unless both tokens are stored.
    pub async fn state(&self) -> ClientResult<AuthState> {
        let access = self.stored(StoreKey::AccessToken).await?;
        let refresh = self.stored(StoreKey::RefreshToken).await?;
        Ok(match (access, refresh) {
            (Some(_), Some(_)) if self.needs_refresh.load(Ordering::Relaxed) => {
                AuthState::AuthenticatedNeedsRefresh
            }
            (Some(_), Some(_)) => AuthState::AuthenticatedValid,
            _ => AuthState::Unauthenticated,
        })
    }

    /// Runs the interactive grant and stores the resulting tokens.
    ///
    /// The callback listener is bound before the browser opens and is
    /// released when this returns, whatever the outcome.
    pub async fn authenticate(&self) -> ClientResult<TokenPair> {
        let listener = CallbackListener::bind(&self.callback).await?;

        let consent = self
            .broker
            .oauth_url()
            .await
            .map_err(|e| ClientError::Broker(format!("failed to fetch consent URL: {}", e)))?;
        let state = generate_state();
        let url = with_state(&consent, &state)?;
        let redirect = listener.redirect_url()?;
        if !redirects_to(&url, &redirect) {
            warn!(
                expected = %redirect,
                "broker consent URL redirects elsewhere; check the broker's redirect URL"
            );
        }

        self.browser.open(url.as_str()).await;
        info!("waiting for OAuth redirect");

        let pending = listener.wait().await?;
        let code = match pending.request.clone().into_code(&state) {
            Ok(code) => code,
            Err(e) => {
                answer(pending.respond(false).await);
                return Err(e.into());
            }
        };

        let pair = match self.broker.exchange_code(&code).await {
            Ok(pair) => pair,
            Err(e) => {
                answer(pending.respond(false).await);
                return Err(ClientError::AuthRequired(format!(
                    "code exchange failed: {}",
                    e.message()
                )));
            }
        };

        if let Err(e) = self.persist(&pair).await {
            answer(pending.respond(false).await);
            return Err(e);
        }
        if pair.refresh_token().is_none() {
            warn!("no refresh token was issued; revoke the app's access and run `gcal auth` again");
        }

        answer(pending.respond(true).await);
        info!("authenticated");
        Ok(pair)
    }

    /// Validates the stored access token, refreshing it if rejected.
    pub async fn ensure_valid(&self) -> ClientResult<AuthState> {
        let access = self.access_token().await?;
        if self.stored(StoreKey::RefreshToken).await?.is_none() {
            return Err(ClientError::AuthRequired(format!(
                "no refresh token stored, {}",
                REAUTHENTICATE
            )));
        }

        match self.broker.validate_token(&access).await {
            ValidationOutcome::Valid => {
                debug!("stored access token is valid");
                self.needs_refresh.store(false, Ordering::Relaxed);
                Ok(AuthState::AuthenticatedValid)
            }
            ValidationOutcome::Invalid => {
                info!("stored access token was rejected, refreshing");
                self.needs_refresh.store(true, Ordering::Relaxed);
                self.refresh().await?;
                Ok(AuthState::AuthenticatedValid)
            }
            ValidationOutcome::Error(reason) => Err(ClientError::Broker(format!(
                "token validation failed: {}",
                reason
            ))),
        }
    }

    /// Trades the stored refresh token for a new access token.
    ///
    /// A rejected refresh token clears both tokens.
    pub async fn refresh(&self) -> ClientResult<TokenPair> {
        let refresh = self.stored(StoreKey::RefreshToken).await?.ok_or_else(|| {
            ClientError::AuthRequired(format!("no refresh token stored, {}", REAUTHENTICATE))
        })?;

        let outcome = self
            .broker
            .refresh_token(&refresh)
            .await
            .map_err(|e| ClientError::Broker(format!("token refresh failed: {}", e)))?;

        match outcome {
            RefreshOutcome::Refreshed(pair) if pair.has_access_token() => {
                self.persist(&pair).await?;
                self.needs_refresh.store(false, Ordering::Relaxed);
                info!("access token refreshed");
                Ok(pair)
            }
            RefreshOutcome::Refreshed(_) => Err(ClientError::Broker(
                "broker returned an empty access token".to_string(),
            )),
            RefreshOutcome::InvalidRefreshToken => {
                warn!("refresh token rejected, clearing stored tokens");
                self.clear().await?;
                Err(ClientError::AuthRequired(format!(
                    "refresh token is no longer valid, {}",
                    REAUTHENTICATE
                )))
            }
        }
    }

    /// Handles a 401 from the calendar API.
    ///
    /// Refreshes once. The failed call is not retried, so the returned error
    /// asks for the command to be run again.
    pub async fn handle_unauthorized(&self) -> ClientError {
        self.needs_refresh.store(true, Ordering::Relaxed);
        match self.refresh().await {
            Ok(_) => ClientError::TokenRefreshed,
            Err(e) => e,
        }
    }

    /// Removes both tokens. Safe to call when nothing is stored.
    pub async fn logout(&self) -> ClientResult<()> {
        self.clear().await?;
        self.needs_refresh.store(false, Ordering::Relaxed);
        info!("stored tokens removed");
        Ok(())
    }

    /// The stored access token.
    pub async fn access_token(&self) -> ClientResult<String> {
        self.stored(StoreKey::AccessToken).await?.ok_or_else(|| {
            ClientError::AuthRequired(format!("no access token found, {}", REAUTHENTICATE))
        })
    }

    async fn stored(&self, key: StoreKey) -> ClientResult<Option<String>> {
        Ok(self.store.get(key).await?.filter(|v| !v.is_empty()))
    }

    async fn persist(&self, pair: &TokenPair) -> ClientResult<()> {
        self.store
            .set(StoreKey::AccessToken, &pair.access_token)
            .await?;
        if let Some(refresh) = pair.refresh_token() {
            self.store.set(StoreKey::RefreshToken, refresh).await?;
        }
        Ok(())
    }

    async fn clear(&self) -> ClientResult<()> {
        for key in StoreKey::ALL {
            self.store.remove(key).await?;
        }
        Ok(())
    }
}

/// Random value carried through the consent redirect.
fn generate_state() -> String {
    let mut rng = rand::rng();
    let bytes: Vec<u8> = (0..16).map(|_| rng.random()).collect();
    URL_SAFE_NO_PAD.encode(&bytes)
}

/// Whether the consent URL's `redirect_uri` is `redirect`.
fn redirects_to(consent: &Url, redirect: &str) -> bool {
    consent
        .query_pairs()
        .any(|(key, value)| key == "redirect_uri" && value == redirect)
}

fn with_state(consent: &str, state: &str) -> ClientResult<Url> {
    let mut url = Url::parse(consent)
        .map_err(|e| ClientError::Broker(format!("invalid consent URL '{}': {}", consent, e)))?;
    url.query_pairs_mut().append_pair("state", state);
    Ok(url)
}

fn answer(result: Result<(), crate::callback::CallbackError>) {
    if let Err(e) = result {
        debug!(error = %e, "failed to answer browser");
    }
}
