//! Token persistence.
//!
//! [`KeyringStore`] keeps the two tokens in the OS credential store;
//! [`MemoryStore`] keeps them in process for tests. Both sit behind
//! [`TokenStore`] so the lifecycle controller does not care which one it has.

use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex};

use thiserror::Error;
use tracing::debug;

/// A boxed future for async trait methods.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Names of the stored secrets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreKey {
    AccessToken,
    RefreshToken,
}

impl StoreKey {
    pub const ALL: [StoreKey; 2] = [Self::AccessToken, Self::RefreshToken];

    /// Account name used in the credential store.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AccessToken => "access_token",
            Self::RefreshToken => "refresh_token",
        }
    }
}

impl fmt::Display for StoreKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors from a token store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("secure storage unavailable: {0}")]
    Unavailable(String),

    #[error("failed to {action} {key}: {message}")]
    Operation {
        action: &'static str,
        key: StoreKey,
        message: String,
    },
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Key/value storage for OAuth tokens.
///
/// `remove` of an absent key succeeds.
pub trait TokenStore: Send + Sync {
    fn get(&self, key: StoreKey) -> BoxFuture<'_, StoreResult<Option<String>>>;

    fn set<'a>(&'a self, key: StoreKey, value: &'a str) -> BoxFuture<'a, StoreResult<()>>;

    fn remove(&self, key: StoreKey) -> BoxFuture<'_, StoreResult<()>>;
}

/// OS credential storage through the `keyring` crate.
#[derive(Debug, Clone)]
pub struct KeyringStore {
    service: String,
}

impl KeyringStore {
    pub fn new(service: impl Into<String>) -> Self {
        Self {
            service: service.into(),
        }
    }

    pub fn service(&self) -> &str {
        &self.service
    }

    /// Runs a blocking keyring call off the async runtime.
    async fn with_entry<T, F>(&self, key: StoreKey, action: &'static str, f: F) -> StoreResult<T>
    where
        T: Send + 'static,
        F: FnOnce(keyring::Entry) -> Result<T, keyring::Error> + Send + 'static,
    {
        let service = self.service.clone();
        let joined = tokio::task::spawn_blocking(move || {
            let entry = keyring::Entry::new(&service, key.as_str())?;
            f(entry)
        })
        .await
        .map_err(|e| StoreError::Unavailable(format!("keyring task failed: {}", e)))?;

        joined.map_err(|e| match e {
            keyring::Error::NoStorageAccess(inner) => StoreError::Unavailable(inner.to_string()),
            keyring::Error::PlatformFailure(inner) => StoreError::Unavailable(inner.to_string()),
            other => StoreError::Operation {
                action,
                key,
                message: other.to_string(),
            },
        })
    }
}

impl TokenStore for KeyringStore {
    fn get(&self, key: StoreKey) -> BoxFuture<'_, StoreResult<Option<String>>> {
        Box::pin(async move {
            self.with_entry(key, "read", |entry| match entry.get_password() {
                Ok(value) => Ok(Some(value)),
                Err(keyring::Error::NoEntry) => Ok(None),
                Err(e) => Err(e),
            })
            .await
        })
    }

    fn set<'a>(&'a self, key: StoreKey, value: &'a str) -> BoxFuture<'a, StoreResult<()>> {
        let value = value.to_string();
        Box::pin(async move {
            self.with_entry(key, "write", move |entry| entry.set_password(&value))
                .await?;
            debug!(key = %key, "stored token");
            Ok(())
        })
    }

    fn remove(&self, key: StoreKey) -> BoxFuture<'_, StoreResult<()>> {
        Box::pin(async move {
            self.with_entry(key, "remove", |entry| match entry.delete_credential() {
                Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
                Err(e) => Err(e),
            })
            .await?;
            debug!(key = %key, "removed token");
            Ok(())
        })
    }
}

/// In-process token store.
///
/// Clones share the same map.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: Arc<Mutex<HashMap<StoreKey, String>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> StoreResult<std::sync::MutexGuard<'_, HashMap<StoreKey, String>>> {
        self.entries
            .lock()
            .map_err(|_| StoreError::Unavailable("memory store lock poisoned".to_string()))
    }

    /// Returns true if no key is stored.
    pub fn is_empty(&self) -> bool {
        self.lock().map(|entries| entries.is_empty()).unwrap_or(true)
    }
}

impl TokenStore for MemoryStore {
    fn get(&self, key: StoreKey) -> BoxFuture<'_, StoreResult<Option<String>>> {
        Box::pin(async move { Ok(self.lock()?.get(&key).cloned()) })
    }

    fn set<'a>(&'a self, key: StoreKey, value: &'a str) -> BoxFuture<'a, StoreResult<()>> {
        Box::pin(async move {
            self.lock()?.insert(key, value.to_string());
            Ok(())
        })
    }

    fn remove(&self, key: StoreKey) -> BoxFuture<'_, StoreResult<()>> {
        Box::pin(async move {
            self.lock()?.remove(&key);
            Ok(())
        })
    }
}
