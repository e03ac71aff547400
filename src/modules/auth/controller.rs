use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use serde::Serialize;
use tracing::instrument;
use utoipa::ToSchema;

use crate::modules::identity::model::Role;
use crate::state::AppState;
use crate::utils::errors::AppError;
use crate::validator::ValidatedJson;

use super::model::{
    LoginRequest, LoginResponse, RefreshRequest, RefreshResponse, RegisterRequestDto,
    RegisteredIdentity,
};
use super::service::AuthService;

#[derive(Serialize, ToSchema)]
pub struct ErrorResponse {
    pub error: String,
}

/// Register a new listener account
#[utoipa::path(
    post,
    path = "/api/auth/register/listener",
    request_body = RegisterRequestDto,
    responses(
        (status = 201, description = "Listener registered", body = RegisteredIdentity),
        (status = 409, description = "Email is already registered", body = ErrorResponse),
        (status = 422, description = "Validation error", body = ErrorResponse)
    ),
    tag = "Authentication"
)]
#[instrument(skip(state, dto))]
pub async fn register_listener(
    State(state): State<AppState>,
    ValidatedJson(dto): ValidatedJson<RegisterRequestDto>,
) -> Result<(StatusCode, Json<RegisteredIdentity>), AppError> {
    let identity = AuthService::register(&state, Role::Listener, dto).await?;
    Ok((StatusCode::CREATED, Json(identity)))
}

/// Register a new specialist account
#[utoipa::path(
    post,
    path = "/api/auth/register/specialist",
    request_body = RegisterRequestDto,
    responses(
        (status = 201, description = "Specialist registered", body = RegisteredIdentity),
        (status = 409, description = "Email is already registered", body = ErrorResponse),
        (status = 422, description = "Validation error", body = ErrorResponse)
    ),
    tag = "Authentication"
)]
#[instrument(skip(state, dto))]
pub async fn register_specialist(
    State(state): State<AppState>,
    ValidatedJson(dto): ValidatedJson<RegisterRequestDto>,
) -> Result<(StatusCode, Json<RegisteredIdentity>), AppError> {
    let identity = AuthService::register(&state, Role::Specialist, dto).await?;
    Ok((StatusCode::CREATED, Json(identity)))
}

/// Login and receive an access/refresh token pair
#[utoipa::path(
    post,
    path = "/api/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = LoginResponse),
        (status = 401, description = "Invalid credentials", body = ErrorResponse),
        (status = 422, description = "Validation error", body = ErrorResponse)
    ),
    tag = "Authentication"
)]
#[instrument(skip(state, dto))]
pub async fn login(
    State(state): State<AppState>,
    ValidatedJson(dto): ValidatedJson<LoginRequest>,
) -> Result<Json<LoginResponse>, AppError> {
    let response = AuthService::login(&state, dto).await?;
    Ok(Json(response))
}

/// Exchange a refresh token for a new access token
#[utoipa::path(
    post,
    path = "/api/auth/refresh",
    request_body = RefreshRequest,
    responses(
        (status = 200, description = "New access token issued", body = RefreshResponse),
        (status = 401, description = "Invalid or expired refresh token", body = ErrorResponse)
    ),
    tag = "Authentication"
)]
#[instrument(skip(state, dto))]
pub async fn refresh(
    State(state): State<AppState>,
    ValidatedJson(dto): ValidatedJson<RefreshRequest>,
) -> Result<Json<RefreshResponse>, AppError> {
    let response = AuthService::refresh(&state, dto).await?;
    Ok(Json(response))
}
