//! Subcommand implementations.

pub mod auth;
pub mod calendar;
pub mod config;
pub mod event;

use std::path::PathBuf;

use gcal_providers::google::CalendarApi;
use gcal_providers::ProviderResult;

use crate::config::ClientConfig;
use crate::current::CurrentCalendar;
use crate::error::{ClientError, ClientResult};
use crate::lifecycle::TokenLifecycle;
use crate::prompt::Picker;

/// Everything a calendar or event command needs, loaded once per run.
pub struct Context {
    pub config: ClientConfig,
    pub lifecycle: TokenLifecycle,
    pub picker: Box<dyn Picker>,
    pub current_path: PathBuf,
    current: Option<CurrentCalendar>,
}

impl Context {
    /// Builds a context, reading the current-calendar pointer from
    /// `current_path`.
    pub fn new(
        config: ClientConfig,
        lifecycle: TokenLifecycle,
        picker: Box<dyn Picker>,
        current_path: PathBuf,
    ) -> ClientResult<Self> {
        let current = CurrentCalendar::load(&current_path)?;
        Ok(Self {
            config,
            lifecycle,
            picker,
            current_path,
            current,
        })
    }

    /// Calendar API client carrying the stored access token.
    pub async fn calendar_api(&self) -> ClientResult<CalendarApi> {
        let token = self.lifecycle.access_token().await?;
        Ok(CalendarApi::new(self.config.google_http()?, &token)?)
    }

    /// Converts an API result, running the refresh path on a 401.
    pub async fn checked<T>(&self, result: ProviderResult<T>) -> ClientResult<T> {
        match result {
            Ok(value) => Ok(value),
            Err(e) if e.is_unauthorized() => {
                tracing::debug!(error = %e, "calendar API rejected the access token");
                Err(self.lifecycle.handle_unauthorized().await)
            }
            Err(e) => Err(e.into()),
        }
    }

    /// The checked-out calendar.
    pub fn current_calendar(&self) -> ClientResult<&CurrentCalendar> {
        self.current.as_ref().ok_or_else(|| {
            ClientError::Config("no calendar checked out, run `gcal checkout` first".to_string())
        })
    }

    fn set_current(&mut self, current: Option<CurrentCalendar>) {
        self.current = current;
    }

    /// Asks the user to choose one of `labels`.
    fn pick(&self, prompt: &str, labels: Vec<String>) -> ClientResult<usize> {
        self.picker.pick(prompt, &labels)
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use std::sync::Mutex;

    use gcal_core::{RefreshOutcome, TokenPair, ValidationOutcome};
    use gcal_providers::ProviderResult;
    use tempfile::TempDir;
    use wiremock::MockServer;

    use super::*;
    use crate::broker::TokenBroker;
    use crate::browser::BrowserOpener;
    use crate::config::CallbackSettings;
    use crate::store::{BoxFuture, MemoryStore, StoreKey, TokenStore};

    /// Picks a fixed index and records the offered labels.
    pub struct FixedPicker {
        pub index: usize,
        pub offered: Mutex<Vec<String>>,
    }

    impl Picker for FixedPicker {
        fn pick(&self, _prompt: &str, items: &[String]) -> ClientResult<usize> {
            self.offered.lock().unwrap().extend(items.iter().cloned());
            Ok(self.index)
        }
    }

    /// Broker that refreshes every token to `ya29.fresh`.
    pub struct RefreshingBroker;

    impl TokenBroker for RefreshingBroker {
        fn oauth_url(&self) -> BoxFuture<'_, ProviderResult<String>> {
            Box::pin(async { Ok("https://accounts.google.com/o/oauth2/v2/auth".into()) })
        }

        fn exchange_code<'a>(&'a self, _code: &'a str) -> BoxFuture<'a, ProviderResult<TokenPair>> {
            Box::pin(async { Ok(TokenPair::new("ya29.good")) })
        }

        fn validate_token<'a>(&'a self, _token: &'a str) -> BoxFuture<'a, ValidationOutcome> {
            Box::pin(async { ValidationOutcome::Valid })
        }

        fn refresh_token<'a>(
            &'a self,
            _refresh_token: &'a str,
        ) -> BoxFuture<'a, ProviderResult<RefreshOutcome>> {
            Box::pin(async { Ok(RefreshOutcome::Refreshed(TokenPair::new("ya29.fresh"))) })
        }
    }

    struct NoBrowser;

    impl BrowserOpener for NoBrowser {
        fn open<'a>(&'a self, _url: &'a str) -> BoxFuture<'a, ()> {
            Box::pin(async {})
        }
    }

    /// A signed-in context whose calendar API is `google`.
    pub async fn context(google: &MockServer, pick: usize) -> (Context, MemoryStore, TempDir) {
        let store = MemoryStore::new();
        store.set(StoreKey::AccessToken, "tok").await.unwrap();
        store.set(StoreKey::RefreshToken, "1//refresh").await.unwrap();

        let mut config = ClientConfig::default();
        config.google.api_base = google.uri();

        let lifecycle = TokenLifecycle::new(
            Box::new(store.clone()),
            Box::new(RefreshingBroker),
            Box::new(NoBrowser),
            CallbackSettings::default(),
        );
        let picker = FixedPicker {
            index: pick,
            offered: Mutex::new(Vec::new()),
        };
        let dir = tempfile::tempdir().unwrap();
        let ctx = Context::new(
            config,
            lifecycle,
            Box::new(picker),
            dir.path().join("current_calendar.json"),
        )
        .unwrap();
        (ctx, store, dir)
    }

    /// Same as [`context`] with `calendar` checked out.
    pub async fn context_with_current(
        google: &MockServer,
        pick: usize,
        calendar: &str,
    ) -> (Context, MemoryStore, TempDir) {
        let (mut ctx, store, dir) = context(google, pick).await;
        ctx.set_current(Some(CurrentCalendar {
            id: calendar.to_string(),
            summary: "Work".to_string(),
            timezone: None,
        }));
        (ctx, store, dir)
    }
}
