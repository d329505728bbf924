//! Route paths served by the broker.

pub const OAUTH_URL: &str = "/api/auth/oauthUrl";
pub const EXCHANGE_CODE: &str = "/api/auth/getAuthTokenFromCode";
pub const VALIDATE_TOKEN: &str = "/api/auth/isTokenValid";
pub const REFRESH_TOKEN: &str = "/api/auth/refreshToken";
pub const HEALTH: &str = "/health";

pub const CALENDAR_LIST: &str = "/api/calendars/list";
/// Router pattern for a single calendar lookup.
pub const CALENDAR_GET: &str = "/api/calendars/list/{id}";
pub const CALENDARS: &str = "/api/calendars";
/// Router pattern for a calendar update.
pub const CALENDAR_UPDATE: &str = "/api/calendars/{id}";

/// Concrete path for fetching one calendar.
pub fn calendar_get(id: &str) -> String {
    format!("{}/{}", CALENDAR_LIST, urlencoding::encode(id))
}

/// Concrete path for updating one calendar.
pub fn calendar_update(id: &str) -> String {
    format!("{}/{}", CALENDARS, urlencoding::encode(id))
}
