use crate::errors::ApiError;
use crate::handlers::AppState;
use crate::models::UserResponse;
use crate::services::user_service::{self, CreateUserRequest, UpdateUserRequest};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use std::sync::Arc;
use uuid::Uuid;

/// Handle user creation
///
/// POST /api/v1/users
pub async fn handle_create_user(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<CreateUserRequest>,
) -> Result<(StatusCode, Json<UserResponse>), ApiError> {
    let user = user_service::create_user(&state.pool, payload).await?;
    Ok((StatusCode::CREATED, Json(user)))
}

/// Handle user listing
///
/// GET /api/v1/users
pub async fn handle_list_users(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<UserResponse>>, ApiError> {
    let users = user_service::list_users(&state.pool).await?;
    Ok(Json(users))
}

/// Handle single user fetch
///
/// GET /api/v1/users/:id
pub async fn handle_get_user(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<Uuid>,
) -> Result<Json<UserResponse>, ApiError> {
    let user = user_service::get_user(&state.pool, user_id).await?;
    Ok(Json(user))
}

/// Handle user update
///
/// PATCH /api/v1/users/:id
pub async fn handle_update_user(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<Uuid>,
    Json(payload): Json<UpdateUserRequest>,
) -> Result<Json<UserResponse>, ApiError> {
    let user = user_service::update_user(&state.pool, user_id, payload).await?;
    Ok(Json(user))
}

/// Handle user deletion
///
/// DELETE /api/v1/users/:id
pub async fn handle_delete_user(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    user_service::delete_user(&state.pool, user_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
