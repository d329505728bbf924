//! HTTP surface of the token broker.
//!
//! Both the broker and the CLI depend on this crate so route paths and JSON
//! shapes cannot drift apart.
//!
//! The broker answers token validation and refresh with bare JSON strings
//! (`"valid_token"`, `"invalid_token"`, `"invalid_refresh_token"`). Those
//! strings only exist here; callers see [`TokenVerdict`] and
//! [`RefreshTokenResponse`] and convert them into the core outcome enums.

pub mod routes;
mod types;

pub use types::{
    CalendarPayload, ErrorBody, ExchangeCodeRequest, ExchangeCodeResponse, HealthResponse,
    MutationResponse, OAuthUrlResponse, RefreshSentinel, RefreshTokenRequest,
    RefreshTokenResponse, TokenVerdict, ValidateTokenRequest,
};

/// Message the broker returns for any rejected bearer token.
pub const INVALID_CREDENTIALS: &str = "Invalid credentials";

/// Message the broker returns when a code exchange fails.
pub const AUTHENTICATION_FAILED: &str = "Failed to authenticate Google account";
