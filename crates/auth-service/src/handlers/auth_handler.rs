use crate::errors::ApiError;
use crate::handlers::AppState;
use crate::models::TokenResponse;
use crate::services::token_service;
use axum::{extract::State, Json};
use secrecy::SecretString;
use serde::Deserialize;
use std::sync::Arc;

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: SecretString,
}

/// Handle login request
///
/// POST /api/v1/auth/login
///
/// Validates the credential pair and issues a bearer token signed with
/// the newest valid key. Wrong email and wrong password produce the
/// same response.
pub async fn handle_login(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<TokenResponse>, ApiError> {
    let token = token_service::issue_token(&state.pool, &payload.email, &payload.password).await?;
    Ok(Json(token))
}
