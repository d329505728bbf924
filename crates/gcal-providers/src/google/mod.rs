//! Google OAuth and Calendar v3 clients.

pub mod client;
pub mod config;
pub mod oauth;

pub use client::{CalendarApi, CalendarResource, EventDateTime, EventDraft};
pub use config::{
    CALENDAR_API_BASE, DEFAULT_REDIRECT_URL, DEFAULT_SCOPES, GOOGLE_AUTH_URL, GOOGLE_TOKEN_URL,
    GoogleOAuthConfig, OAuthCredentials,
};
pub use oauth::OAuthClient;
