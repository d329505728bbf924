//! Client error types.

use std::fmt;

use gcal_core::TimeError;
use gcal_providers::ProviderError;

use crate::callback::CallbackError;
use crate::store::StoreError;

/// Result type for client operations.
pub type ClientResult<T> = Result<T, ClientError>;

/// Errors that can occur in the client.
#[derive(Debug)]
pub enum ClientError {
    /// Configuration error.
    Config(String),
    /// Calendar API error.
    Provider(String),
    /// Broker returned an error or could not be reached.
    Broker(String),
    /// IO error.
    Io(std::io::Error),
    /// Authentication required.
    AuthRequired(String),
    /// The access token was refreshed; the command has to be run again.
    TokenRefreshed,
    /// Secure storage failure.
    Store(StoreError),
    /// Local OAuth callback failure.
    Callback(CallbackError),
    /// Invalid user input.
    Input(String),
    /// Action failed (prompt, browser).
    Action(String),
}

impl fmt::Display for ClientError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Config(msg) => write!(f, "configuration error: {}", msg),
            Self::Provider(msg) => write!(f, "provider error: {}", msg),
            Self::Broker(msg) => write!(f, "broker error: {}", msg),
            Self::Io(err) => write!(f, "IO error: {}", err),
            Self::AuthRequired(msg) => write!(f, "authentication required: {}", msg),
            Self::TokenRefreshed => {
                write!(f, "access token was refreshed, please run the command again")
            }
            Self::Store(err) => write!(f, "token store error: {}", err),
            Self::Callback(err) => write!(f, "OAuth callback error: {}", err),
            Self::Input(msg) => write!(f, "invalid input: {}", msg),
            Self::Action(msg) => write!(f, "action failed: {}", msg),
        }
    }
}

impl std::error::Error for ClientError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            Self::Store(err) => Some(err),
            Self::Callback(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for ClientError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<ProviderError> for ClientError {
    fn from(err: ProviderError) -> Self {
        Self::Provider(err.to_string())
    }
}

impl From<StoreError> for ClientError {
    fn from(err: StoreError) -> Self {
        Self::Store(err)
    }
}

impl From<CallbackError> for ClientError {
    fn from(err: CallbackError) -> Self {
        Self::Callback(err)
    }
}

impl From<TimeError> for ClientError {
    fn from(err: TimeError) -> Self {
        Self::Input(err.to_string())
    }
}

impl From<dialoguer::Error> for ClientError {
    fn from(err: dialoguer::Error) -> Self {
        Self::Action(format!("prompt failed: {}", err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_is_prefixed_by_kind() {
        let err = ClientError::AuthRequired("run `gcal auth`".into());
        assert_eq!(err.to_string(), "authentication required: run `gcal auth`");
    }

    #[test]
    fn provider_error_keeps_status_text() {
        let err: ClientError = ProviderError::from_status(404, "Not Found")
            .with_provider("google")
            .into();
        assert!(err.to_string().contains("Not Found"));
    }

    #[test]
    fn time_error_is_input_error() {
        let err: ClientError = TimeError::Unparseable("tomorrow".into()).into();
        assert!(matches!(err, ClientError::Input(_)));
    }
}
