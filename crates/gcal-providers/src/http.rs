//! Configurable HTTP client shared by every upstream call.
//!
//! A [`ProviderClient`] is built from an explicit [`HttpClientConfig`] and
//! keeps a separate set of default headers for each verb. Installing an
//! `Authorization` header for GET does not authenticate POST requests.

use std::collections::HashMap;
use std::time::Duration;

use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderName, HeaderValue};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::debug;
use url::Url;

use crate::error::{ProviderError, ProviderResult};

/// Default request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

/// HTTP verbs with their own default header set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HttpVerb {
    Get,
    Post,
    Put,
    Delete,
}

impl HttpVerb {
    /// All verbs, in declaration order.
    pub const ALL: [HttpVerb; 4] = [Self::Get, Self::Post, Self::Put, Self::Delete];

    fn method(self) -> reqwest::Method {
        match self {
            Self::Get => reqwest::Method::GET,
            Self::Post => reqwest::Method::POST,
            Self::Put => reqwest::Method::PUT,
            Self::Delete => reqwest::Method::DELETE,
        }
    }
}

/// Connection settings for a [`ProviderClient`].
#[derive(Debug, Clone)]
pub struct HttpClientConfig {
    base_url: Url,
    timeout: Duration,
    user_agent: String,
    provider: String,
}

impl HttpClientConfig {
    /// Creates a config rooted at `base_url`.
    ///
    /// Relative request paths are joined onto the base, so a trailing slash
    /// is added when missing.
    pub fn new(base_url: &str) -> ProviderResult<Self> {
        let normalized = if base_url.ends_with('/') {
            base_url.to_string()
        } else {
            format!("{}/", base_url)
        };
        let base_url = Url::parse(&normalized).map_err(|e| {
            ProviderError::configuration(format!("invalid base URL '{}': {}", base_url, e))
        })?;

        Ok(Self {
            base_url,
            timeout: DEFAULT_TIMEOUT,
            user_agent: format!("gcal/{}", env!("CARGO_PKG_VERSION")),
            provider: "http".to_string(),
        })
    }

    /// Sets the request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Sets the User-Agent header.
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Sets the upstream name attached to errors.
    pub fn with_provider(mut self, provider: impl Into<String>) -> Self {
        self.provider = provider.into();
        self
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

/// Status and body of a successful response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderResponse {
    pub status: u16,
    pub body: String,
}

impl ProviderResponse {
    /// Deserializes the body as JSON.
    pub fn json<T: DeserializeOwned>(&self) -> ProviderResult<T> {
        serde_json::from_str(&self.body).map_err(|e| {
            ProviderError::invalid_response(format!("failed to parse response: {}", e))
                .with_source(e)
        })
    }
}

/// HTTP client with a base URL, a timeout and per-verb default headers.
#[derive(Debug, Clone)]
pub struct ProviderClient {
    config: HttpClientConfig,
    http: reqwest::Client,
    headers: HashMap<HttpVerb, HeaderMap>,
}

impl ProviderClient {
    /// Builds a client from the given config.
    pub fn new(config: HttpClientConfig) -> ProviderResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| {
                ProviderError::configuration(format!("failed to create HTTP client: {}", e))
                    .with_source(e)
            })?;

        Ok(Self {
            config,
            http,
            headers: HashMap::new(),
        })
    }

    pub fn config(&self) -> &HttpClientConfig {
        &self.config
    }

    /// Installs `Authorization: Bearer <token>` for one verb.
    pub fn set_authorization_header(&mut self, verb: HttpVerb, token: &str) -> ProviderResult<()> {
        let value = HeaderValue::from_str(&format!("Bearer {}", token)).map_err(|e| {
            ProviderError::configuration("access token is not a valid header value").with_source(e)
        })?;
        self.headers.entry(verb).or_default().insert(AUTHORIZATION, value);
        Ok(())
    }

    /// Installs a default header for one verb.
    pub fn set_header(&mut self, verb: HttpVerb, name: &str, value: &str) -> ProviderResult<()> {
        let name = HeaderName::from_bytes(name.as_bytes()).map_err(|e| {
            ProviderError::configuration(format!("invalid header name '{}'", name)).with_source(e)
        })?;
        let value = HeaderValue::from_str(value).map_err(|e| {
            ProviderError::configuration(format!("invalid value for header '{}'", name))
                .with_source(e)
        })?;
        self.headers.entry(verb).or_default().insert(name, value);
        Ok(())
    }

    /// Returns the default headers installed for `verb`.
    pub fn headers(&self, verb: HttpVerb) -> Option<&HeaderMap> {
        self.headers.get(&verb)
    }

    pub async fn get(&self, path: &str) -> ProviderResult<ProviderResponse> {
        self.send::<()>(HttpVerb::Get, path, &[], None).await
    }

    /// GET with query parameters.
    pub async fn get_with_query(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> ProviderResult<ProviderResponse> {
        self.send::<()>(HttpVerb::Get, path, query, None).await
    }

    pub async fn post<B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> ProviderResult<ProviderResponse> {
        self.send(HttpVerb::Post, path, &[], Some(body)).await
    }

    pub async fn put<B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> ProviderResult<ProviderResponse> {
        self.send(HttpVerb::Put, path, &[], Some(body)).await
    }

    pub async fn delete(&self, path: &str) -> ProviderResult<ProviderResponse> {
        self.send::<()>(HttpVerb::Delete, path, &[], None).await
    }

    /// Resolves `path` against the base URL.
    pub fn url(&self, path: &str) -> ProviderResult<Url> {
        self.config
            .base_url
            .join(path.trim_start_matches('/'))
            .map_err(|e| ProviderError::configuration(format!("invalid path '{}': {}", path, e)))
    }

    async fn send<B: Serialize + ?Sized>(
        &self,
        verb: HttpVerb,
        path: &str,
        query: &[(&str, String)],
        body: Option<&B>,
    ) -> ProviderResult<ProviderResponse> {
        let url = self.url(path)?;
        debug!(method = %verb.method(), url = %url, "sending request");

        let mut request = self.http.request(verb.method(), url);
        if let Some(headers) = self.headers.get(&verb) {
            request = request.headers(headers.clone());
        }
        if !query.is_empty() {
            request = request.query(query);
        }
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await.map_err(|e| {
            let message = if e.is_timeout() {
                "request timeout".to_string()
            } else if e.is_connect() {
                format!("connection failed: {}", e)
            } else {
                format!("request failed: {}", e)
            };
            ProviderError::network(message)
                .with_provider(self.config.provider.clone())
                .with_source(e)
        })?;

        let status = response.status();
        let body = response.text().await.map_err(|e| {
            ProviderError::network(format!("failed to read response: {}", e))
                .with_provider(self.config.provider.clone())
                .with_source(e)
        })?;

        debug!(status = status.as_u16(), "received response");

        if !status.is_success() {
            let message = extract_error_message(&body)
                .unwrap_or_else(|| status.canonical_reason().unwrap_or("request failed").to_string());
            return Err(ProviderError::from_status(status.as_u16(), message)
                .with_provider(self.config.provider.clone()));
        }

        Ok(ProviderResponse {
            status: status.as_u16(),
            body,
        })
    }
}

/// Pulls a human-readable message out of an error body.
///
/// Understands Google's `{"error":{"message":..}}`, OAuth's
/// `{"error":..,"error_description":..}`, `{"message":..}`, a bare JSON
/// string, and falls back to the raw text.
pub fn extract_error_message(body: &str) -> Option<String> {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return None;
    }

    let Ok(value) = serde_json::from_str::<serde_json::Value>(trimmed) else {
        return Some(trimmed.to_string());
    };

    let text = |v: Option<&serde_json::Value>| v.and_then(|v| v.as_str()).map(String::from);

    match &value {
        serde_json::Value::String(s) => Some(s.clone()),
        serde_json::Value::Object(map) => {
            if let Some(error) = map.get("error") {
                if let Some(msg) = text(error.get("message")) {
                    return Some(msg);
                }
                if let Some(desc) = text(map.get("error_description")) {
                    return Some(desc);
                }
                if let Some(code) = error.as_str() {
                    return Some(code.to_string());
                }
            }
            text(map.get("message")).or_else(|| Some(trimmed.to_string()))
        }
        _ => Some(trimmed.to_string()),
    }
}
