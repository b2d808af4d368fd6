use crate::errors::ApiError;
use crate::services::token_service;
use axum::{
    extract::{Request, State},
    middleware::Next,
    response::IntoResponse,
};
use sqlx::PgPool;
use std::sync::Arc;

/// Middleware state containing the database pool
#[derive(Clone)]
pub struct AuthMiddlewareState {
    pub pool: PgPool,
}

/// Authentication middleware that validates bearer tokens.
///
/// Extracts the Bearer token from the Authorization header and runs
/// the full multi-key verification. A missing or malformed header is
/// rejected with the same response as a bad token. Verified claims are
/// stored in request extensions for downstream handlers.
pub async fn require_auth(
    State(state): State<Arc<AuthMiddlewareState>>,
    mut req: Request,
    next: Next,
) -> Result<impl IntoResponse, ApiError> {
    let auth_header = req
        .headers()
        .get("authorization")
        .and_then(|h| h.to_str().ok())
        .ok_or(ApiError::Unauthorized)?;

    let token = auth_header
        .strip_prefix("Bearer ")
        .ok_or(ApiError::Unauthorized)?;

    let claims = token_service::verify_token(&state.pool, token).await?;

    req.extensions_mut().insert(claims);

    Ok(next.run(req).await)
}
