use crate::AppState;
use crate::api::error::AppError;
use crate::api::extract::Json;
use crate::models::auth::{LoginRequest, RefreshTokenRequest, RegisterRequest, TokenResponse};
use axum::{extract::State, http::StatusCode};
use validator::Validate;

pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<TokenResponse>), AppError> {
    let tokens = state.auth.register(payload).await?;
    Ok((StatusCode::CREATED, Json(tokens)))
}

pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<TokenResponse>, AppError> {
    Ok(Json(state.auth.login(payload).await?))
}

pub async fn refresh(
    State(state): State<AppState>,
    Json(payload): Json<RefreshTokenRequest>,
) -> Result<Json<TokenResponse>, AppError> {
    payload
        .validate()
        .map_err(|_| AppError::Unauthorized("Invalid or expired refresh token".to_string()))?;
    Ok(Json(state.auth.refresh(&payload.refresh_token).await?))
}

pub async fn revoke(
    State(state): State<AppState>,
    Json(payload): Json<RefreshTokenRequest>,
) -> Result<StatusCode, AppError> {
    state.auth.revoke(&payload.refresh_token).await?;
    Ok(StatusCode::NO_CONTENT)
}
