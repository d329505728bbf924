//! HTTP client for the token broker.

use gcal_core::{RefreshOutcome, TokenPair, ValidationOutcome};
use gcal_protocol::{
    ExchangeCodeRequest, ExchangeCodeResponse, OAuthUrlResponse, RefreshTokenRequest,
    RefreshTokenResponse, TokenVerdict, ValidateTokenRequest, routes,
};
use gcal_providers::{HttpClientConfig, HttpVerb, ProviderClient, ProviderError, ProviderResult};
use tracing::debug;

use crate::store::BoxFuture;

/// Token operations the lifecycle controller delegates to the broker.
pub trait TokenBroker: Send + Sync {
    /// Consent URL to send the user to.
    fn oauth_url(&self) -> BoxFuture<'_, ProviderResult<String>>;

    /// Trades an authorization code for a token pair.
    fn exchange_code<'a>(&'a self, code: &'a str) -> BoxFuture<'a, ProviderResult<TokenPair>>;

    /// Checks an access token. Transport failures become
    /// [`ValidationOutcome::Error`].
    fn validate_token<'a>(&'a self, access_token: &'a str) -> BoxFuture<'a, ValidationOutcome>;

    /// Trades a refresh token for a new access token.
    fn refresh_token<'a>(
        &'a self,
        refresh_token: &'a str,
    ) -> BoxFuture<'a, ProviderResult<RefreshOutcome>>;
}

/// [`TokenBroker`] over the broker's HTTP routes.
#[derive(Debug, Clone)]
pub struct BrokerClient {
    client: ProviderClient,
}

impl BrokerClient {
    pub fn new(config: HttpClientConfig) -> ProviderResult<Self> {
        let mut client = ProviderClient::new(config)?;
        for verb in [HttpVerb::Post, HttpVerb::Put] {
            client.set_header(verb, "Content-Type", "application/json")?;
        }
        Ok(Self { client })
    }
}

impl TokenBroker for BrokerClient {
    fn oauth_url(&self) -> BoxFuture<'_, ProviderResult<String>> {
        Box::pin(async move {
            let response: OAuthUrlResponse = self.client.get(routes::OAUTH_URL).await?.json()?;
            Ok(response.url)
        })
    }

    fn exchange_code<'a>(&'a self, code: &'a str) -> BoxFuture<'a, ProviderResult<TokenPair>> {
        Box::pin(async move {
            let request = ExchangeCodeRequest {
                code: code.to_string(),
            };
            let response: ExchangeCodeResponse = self
                .client
                .post(routes::EXCHANGE_CODE, &request)
                .await?
                .json()?;
            if !response.token.has_access_token() {
                return Err(ProviderError::invalid_response(
                    "broker returned an empty access token",
                ));
            }
            debug!(message = %response.message, "code exchanged");
            Ok(response.token)
        })
    }

    fn validate_token<'a>(&'a self, access_token: &'a str) -> BoxFuture<'a, ValidationOutcome> {
        Box::pin(async move {
            let request = ValidateTokenRequest {
                access_token: access_token.to_string(),
            };
            let verdict = self
                .client
                .post(routes::VALIDATE_TOKEN, &request)
                .await
                .and_then(|response| response.json::<TokenVerdict>());
            match verdict {
                Ok(verdict) => verdict.into(),
                Err(e) => ValidationOutcome::Error(e.to_string()),
            }
        })
    }

    fn refresh_token<'a>(
        &'a self,
        refresh_token: &'a str,
    ) -> BoxFuture<'a, ProviderResult<RefreshOutcome>> {
        Box::pin(async move {
            let request = RefreshTokenRequest {
                refresh_token: refresh_token.to_string(),
            };
            let response: RefreshTokenResponse = self
                .client
                .post(routes::REFRESH_TOKEN, &request)
                .await?
                .json()?;
            Ok(response.into())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client(server: &MockServer) -> BrokerClient {
        BrokerClient::new(HttpClientConfig::new(&server.uri()).unwrap()).unwrap()
    }

    #[tokio::test]
    async fn oauth_url_reads_url_field() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/auth/oauthUrl"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"url": "https://accounts.google.com/o/oauth2/v2/auth?x=1"})),
            )
            .mount(&server)
            .await;

        let url = client(&server).oauth_url().await.unwrap();
        assert!(url.starts_with("https://accounts.google.com/"));
    }

    #[tokio::test]
    async fn exchange_code_returns_token_pair() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/auth/getAuthTokenFromCode"))
            .and(body_json(json!({"code": "abc123"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "token": {"access_token": "ya29.good", "refresh_token": "1//refresh"},
                "message": "Successfully authenticated"
            })))
            .mount(&server)
            .await;

        let pair = client(&server).exchange_code("abc123").await.unwrap();
        assert_eq!(pair.access_token, "ya29.good");
        assert_eq!(pair.refresh_token(), Some("1//refresh"));
    }

    #[tokio::test]
    async fn exchange_code_failure_carries_broker_message() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/auth/getAuthTokenFromCode"))
            .respond_with(ResponseTemplate::new(403).set_body_json(
                json!({"message": "Failed to authenticate Google account"}),
            ))
            .mount(&server)
            .await;

        let err = client(&server).exchange_code("used").await.unwrap_err();
        assert_eq!(err.status(), Some(403));
        assert_eq!(err.message(), "Failed to authenticate Google account");
    }

    #[tokio::test]
    async fn validate_token_maps_verdicts() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/auth/isTokenValid"))
            .and(body_json(json!({"access_token": "ya29.good"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!("valid_token")))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/api/auth/isTokenValid"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!("invalid_token")))
            .mount(&server)
            .await;

        let broker = client(&server);
        assert_eq!(broker.validate_token("ya29.good").await, ValidationOutcome::Valid);
        assert_eq!(broker.validate_token("ya29.old").await, ValidationOutcome::Invalid);
    }

    #[tokio::test]
    async fn validate_token_unreachable_broker_is_error() {
        let server = MockServer::start().await;
        let uri = server.uri();
        drop(server);

        let broker = BrokerClient::new(HttpClientConfig::new(&uri).unwrap()).unwrap();
        assert!(matches!(
            broker.validate_token("ya29.good").await,
            ValidationOutcome::Error(_)
        ));
    }

    #[tokio::test]
    async fn refresh_token_handles_both_shapes() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/auth/refreshToken"))
            .and(body_json(json!({"refresh_token": "1//refresh"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "message": "Access token refreshed",
                "data": {"access_token": "ya29.fresh"}
            })))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/api/auth/refreshToken"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!("invalid_refresh_token")))
            .mount(&server)
            .await;

        let broker = client(&server);
        assert_eq!(
            broker.refresh_token("1//refresh").await.unwrap(),
            RefreshOutcome::Refreshed(TokenPair::new("ya29.fresh"))
        );
        assert_eq!(
            broker.refresh_token("deadbeef").await.unwrap(),
            RefreshOutcome::InvalidRefreshToken
        );
    }
}
