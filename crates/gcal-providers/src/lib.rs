//! Upstream HTTP plumbing.
//!
//! - [`ProviderClient`]: base URL, timeout and per-verb default headers
//! - [`google::OAuthClient`]: consent URL, code exchange, refresh
//! - [`google::CalendarApi`]: calendar and event resources
//! - [`ProviderError`]: normalized upstream failures

pub mod error;
pub mod google;
pub mod http;

pub use error::{ProviderError, ProviderErrorCode, ProviderResult};
pub use http::{HttpClientConfig, HttpVerb, ProviderClient, ProviderResponse, extract_error_message};
