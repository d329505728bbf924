//! Request and response bodies for the broker routes.

use gcal_core::{RefreshOutcome, TokenPair, ValidationOutcome};
use serde::{Deserialize, Serialize};

/// Error body used by every non-200 broker response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub message: String,
}

impl ErrorBody {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// `GET /api/auth/oauthUrl`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OAuthUrlResponse {
    pub url: String,
}

/// `POST /api/auth/getAuthTokenFromCode`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExchangeCodeRequest {
    #[serde(default)]
    pub code: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExchangeCodeResponse {
    pub token: TokenPair,
    pub message: String,
}

/// `POST /api/auth/isTokenValid`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidateTokenRequest {
    #[serde(default)]
    pub access_token: String,
}

/// Verdict of a token validation, serialized as a bare string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TokenVerdict {
    #[serde(rename = "valid_token")]
    Valid,
    #[serde(rename = "invalid_token")]
    Invalid,
}

impl From<TokenVerdict> for ValidationOutcome {
    fn from(verdict: TokenVerdict) -> Self {
        match verdict {
            TokenVerdict::Valid => ValidationOutcome::Valid,
            TokenVerdict::Invalid => ValidationOutcome::Invalid,
        }
    }
}

/// `POST /api/auth/refreshToken`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefreshTokenRequest {
    #[serde(default)]
    pub refresh_token: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RefreshSentinel {
    #[serde(rename = "invalid_refresh_token")]
    InvalidRefreshToken,
}

/// Either a fresh token pair or the invalid-refresh-token sentinel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RefreshTokenResponse {
    Refreshed { message: String, data: TokenPair },
    Sentinel(RefreshSentinel),
}

impl From<RefreshOutcome> for RefreshTokenResponse {
    fn from(outcome: RefreshOutcome) -> Self {
        match outcome {
            RefreshOutcome::Refreshed(data) => Self::Refreshed {
                message: "Access token refreshed".to_string(),
                data,
            },
            RefreshOutcome::InvalidRefreshToken => {
                Self::Sentinel(RefreshSentinel::InvalidRefreshToken)
            }
        }
    }
}

impl From<RefreshTokenResponse> for RefreshOutcome {
    fn from(response: RefreshTokenResponse) -> Self {
        match response {
            RefreshTokenResponse::Refreshed { data, .. } => RefreshOutcome::Refreshed(data),
            RefreshTokenResponse::Sentinel(RefreshSentinel::InvalidRefreshToken) => {
                RefreshOutcome::InvalidRefreshToken
            }
        }
    }
}

/// `GET /health`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

/// Body of `POST /api/calendars` and `PUT /api/calendars/{id}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalendarPayload {
    #[serde(default)]
    pub summary: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timezone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
}

/// Success body of calendar mutations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MutationResponse<T> {
    pub message: String,
    pub data: T,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verdicts_are_bare_strings() {
        assert_eq!(
            serde_json::to_string(&TokenVerdict::Valid).unwrap(),
            r#""valid_token""#
        );
        let v: TokenVerdict = serde_json::from_str(r#""invalid_token""#).unwrap();
        assert_eq!(ValidationOutcome::from(v), ValidationOutcome::Invalid);
    }

    #[test]
    fn refresh_sentinel_parses() {
        let r: RefreshTokenResponse = serde_json::from_str(r#""invalid_refresh_token""#).unwrap();
        assert_eq!(RefreshOutcome::from(r), RefreshOutcome::InvalidRefreshToken);
    }

    #[test]
    fn refresh_success_parses() {
        let json = r#"{"message":"ok","data":{"access_token":"new","expires_in":3599}}"#;
        let r: RefreshTokenResponse = serde_json::from_str(json).unwrap();
        match RefreshOutcome::from(r) {
            RefreshOutcome::Refreshed(pair) => {
                assert_eq!(pair.access_token, "new");
                assert!(pair.refresh_token.is_none());
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn unknown_sentinel_is_rejected() {
        assert!(serde_json::from_str::<RefreshTokenResponse>(r#""nope""#).is_err());
    }

    #[test]
    fn missing_code_defaults_to_empty() {
        let req: ExchangeCodeRequest = serde_json::from_str("{}").unwrap();
        assert!(req.code.is_empty());
    }

    #[test]
    fn calendar_payload_omits_unset_fields() {
        let payload = CalendarPayload {
            summary: "Team".into(),
            ..Default::default()
        };
        assert_eq!(serde_json::to_string(&payload).unwrap(), r#"{"summary":"Team"}"#);
    }
}
