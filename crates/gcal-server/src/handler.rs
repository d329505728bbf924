//! HTTP routes of the broker.

use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::HeaderMap;
use axum::http::header::AUTHORIZATION;
use axum::routing::{get, post, put};
use axum::{Json, Router};
use gcal_core::CalendarSummary;
use gcal_protocol::{
    CalendarPayload, ExchangeCodeRequest, ExchangeCodeResponse, HealthResponse, MutationResponse,
    OAuthUrlResponse, RefreshTokenRequest, RefreshTokenResponse, TokenVerdict,
    ValidateTokenRequest, routes,
};
use gcal_providers::google::{CalendarApi, CalendarResource};
use tower_http::trace::TraceLayer;
use tracing::debug;

use crate::error::ApiError;
use crate::exchange::TokenExchangeService;

/// State shared by all handlers. Read-only after startup.
#[derive(Debug, Clone)]
pub struct AppState {
    pub exchange: TokenExchangeService,
}

pub type SharedState = Arc<AppState>;

/// Builds the broker router.
pub fn router(state: SharedState) -> Router {
    Router::new()
        .route(routes::HEALTH, get(health))
        .route(routes::OAUTH_URL, get(oauth_url))
        .route(routes::EXCHANGE_CODE, post(exchange_code))
        .route(routes::VALIDATE_TOKEN, post(validate_token))
        .route(routes::REFRESH_TOKEN, post(refresh_token))
        .route(routes::CALENDAR_LIST, get(list_calendars))
        .route(routes::CALENDAR_GET, get(get_calendar))
        .route(routes::CALENDARS, post(create_calendar))
        .route(routes::CALENDAR_UPDATE, put(update_calendar))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

type ApiResult<T> = Result<Json<T>, ApiError>;

fn body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, ApiError> {
    payload
        .map(|Json(value)| value)
        .map_err(|rejection| ApiError::bad_request(rejection.body_text()))
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

async fn oauth_url(State(state): State<SharedState>) -> ApiResult<OAuthUrlResponse> {
    let url = state.exchange.oauth_url()?;
    Ok(Json(OAuthUrlResponse { url }))
}

async fn exchange_code(
    State(state): State<SharedState>,
    payload: Result<Json<ExchangeCodeRequest>, JsonRejection>,
) -> ApiResult<ExchangeCodeResponse> {
    let request = body(payload)?;
    let token = state.exchange.exchange_code(&request.code).await?;
    Ok(Json(ExchangeCodeResponse {
        token,
        message: "Google account authenticated successfully".to_string(),
    }))
}

async fn validate_token(
    State(state): State<SharedState>,
    payload: Result<Json<ValidateTokenRequest>, JsonRejection>,
) -> ApiResult<TokenVerdict> {
    let request = body(payload)?;
    let outcome = state.exchange.validate_token(&request.access_token).await?;
    let verdict = if outcome.is_valid() {
        TokenVerdict::Valid
    } else {
        TokenVerdict::Invalid
    };
    Ok(Json(verdict))
}

async fn refresh_token(
    State(state): State<SharedState>,
    payload: Result<Json<RefreshTokenRequest>, JsonRejection>,
) -> ApiResult<RefreshTokenResponse> {
    let request = body(payload)?;
    let outcome = state
        .exchange
        .refresh_access_token(&request.refresh_token)
        .await?;
    Ok(Json(outcome.into()))
}

/// Extracts the token from `Authorization: Bearer <token>`.
fn bearer_token(headers: &HeaderMap) -> Result<&str, ApiError> {
    headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split_once(' '))
        .filter(|(scheme, _)| scheme.eq_ignore_ascii_case("bearer"))
        .map(|(_, token)| token.trim())
        .filter(|token| !token.is_empty())
        .ok_or_else(|| ApiError::bad_request("Invalid authorization header"))
}

fn calendar_api(state: &AppState, headers: &HeaderMap) -> Result<CalendarApi, ApiError> {
    let token = bearer_token(headers)?;
    CalendarApi::new(state.exchange.api_config().clone(), token)
        .map_err(|e| ApiError::bad_request(e.message().to_string()))
}

async fn list_calendars(
    State(state): State<SharedState>,
    headers: HeaderMap,
) -> ApiResult<Vec<CalendarSummary>> {
    let api = calendar_api(&state, &headers)?;
    let calendars = api
        .list_calendars()
        .await
        .map_err(|e| ApiError::from_upstream(&e, None))?;
    Ok(Json(calendars))
}

async fn get_calendar(
    State(state): State<SharedState>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> ApiResult<CalendarSummary> {
    let api = calendar_api(&state, &headers)?;
    let calendar = api
        .get_calendar(&id)
        .await
        .map_err(|e| ApiError::from_upstream(&e, None))?;
    Ok(Json(calendar))
}

fn to_resource(payload: CalendarPayload) -> CalendarResource {
    CalendarResource {
        id: None,
        summary: payload.summary,
        description: payload.description,
        time_zone: payload.timezone,
        location: payload.location,
    }
}

const CREATE_FAILED: &str = "Failed to create calendar. Check provided arguments!";
const UPDATE_FAILED: &str = "Failed to update calendar. Check provided arguments!";

/// Parses a calendar body, rejecting a missing or blank summary.
fn calendar_body(
    payload: Result<Json<CalendarPayload>, JsonRejection>,
    failed: &str,
) -> Result<CalendarResource, ApiError> {
    let payload = body(payload).map_err(|_| ApiError::bad_request(failed))?;
    if payload.summary.trim().is_empty() {
        return Err(ApiError::bad_request(failed));
    }
    Ok(to_resource(payload))
}

async fn create_calendar(
    State(state): State<SharedState>,
    headers: HeaderMap,
    payload: Result<Json<CalendarPayload>, JsonRejection>,
) -> ApiResult<MutationResponse<CalendarResource>> {
    let api = calendar_api(&state, &headers)?;
    let resource = calendar_body(payload, CREATE_FAILED)?;
    let created = api
        .create_calendar(&resource)
        .await
        .map_err(|e| ApiError::from_upstream(&e, Some(CREATE_FAILED)))?;
    debug!(calendar = ?created.id, "calendar created");
    Ok(Json(MutationResponse {
        message: format!("Calendar \"{}\" was created successfully!", created.summary),
        data: created,
    }))
}

async fn update_calendar(
    State(state): State<SharedState>,
    Path(id): Path<String>,
    headers: HeaderMap,
    payload: Result<Json<CalendarPayload>, JsonRejection>,
) -> ApiResult<MutationResponse<CalendarResource>> {
    let api = calendar_api(&state, &headers)?;
    let mut resource = calendar_body(payload, UPDATE_FAILED)?;
    resource.id = Some(id.clone());
    let updated = api
        .update_calendar(&id, &resource)
        .await
        .map_err(|e| ApiError::from_upstream(&e, Some(UPDATE_FAILED)))?;
    Ok(Json(MutationResponse {
        message: format!("Calendar \"{}\" was updated successfully!", updated.summary),
        data: updated,
    }))
}
