//! User account lifecycle: create, list, fetch, update, delete.
//!
//! Passwords are hashed before they reach the repository layer and
//! never appear in responses or logs. Deleting a user implicitly
//! revokes their outstanding tokens, since verification re-resolves the
//! identity on every request.

use crate::config::DEFAULT_BCRYPT_COST;
use crate::crypto;
use crate::errors::ApiError;
use crate::models::{User, UserResponse};
use crate::observability::hash_for_correlation;
use crate::repositories::users;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use sqlx::PgPool;
use tracing::{info, instrument};
use uuid::Uuid;

const MIN_PASSWORD_LENGTH: usize = 8;
const MAX_NAME_LENGTH: usize = 256;

#[derive(Debug, Deserialize)]
pub struct CreateUserRequest {
    pub name: String,
    pub email: String,
    pub password: SecretString,
}

#[derive(Debug, Deserialize)]
pub struct UpdateUserRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password: Option<SecretString>,
}

fn validate_email(email: &str) -> Result<(), ApiError> {
    let trimmed = email.trim();
    if trimmed.is_empty() || trimmed.len() > 320 {
        return Err(ApiError::Validation("Invalid email address".to_string()));
    }
    let mut parts = trimmed.splitn(2, '@');
    let local = parts.next().unwrap_or("");
    let domain = parts.next().unwrap_or("");
    if local.is_empty() || domain.is_empty() || !domain.contains('.') {
        return Err(ApiError::Validation("Invalid email address".to_string()));
    }
    Ok(())
}

fn validate_password(password: &SecretString) -> Result<(), ApiError> {
    if password.expose_secret().len() < MIN_PASSWORD_LENGTH {
        return Err(ApiError::Validation(format!(
            "Password must be at least {MIN_PASSWORD_LENGTH} characters"
        )));
    }
    Ok(())
}

fn validate_name(name: &str) -> Result<(), ApiError> {
    if name.trim().is_empty() || name.len() > MAX_NAME_LENGTH {
        return Err(ApiError::Validation("Invalid name".to_string()));
    }
    Ok(())
}

#[instrument(skip_all)]
pub async fn create_user(pool: &PgPool, req: CreateUserRequest) -> Result<UserResponse, ApiError> {
    validate_name(&req.name)?;
    validate_email(&req.email)?;
    validate_password(&req.password)?;

    let hash = crypto::hash_password(req.password.expose_secret(), DEFAULT_BCRYPT_COST)?;
    let email = req.email.trim().to_lowercase();
    let user = users::create_user(pool, req.name.trim(), &email, &hash).await?;

    info!(
        user_id = %user.user_id,
        email_hash = %hash_for_correlation(&user.email),
        "Created user"
    );

    Ok(UserResponse::from(user))
}

#[instrument(skip_all)]
pub async fn list_users(pool: &PgPool) -> Result<Vec<UserResponse>, ApiError> {
    let all = users::get_all(pool).await?;
    Ok(all.into_iter().map(UserResponse::from).collect())
}

#[instrument(skip_all, fields(user_id = %user_id))]
pub async fn get_user(pool: &PgPool, user_id: Uuid) -> Result<UserResponse, ApiError> {
    users::get_by_id(pool, user_id)
        .await?
        .map(UserResponse::from)
        .ok_or(ApiError::NotFound("user"))
}

#[instrument(skip_all, fields(user_id = %user_id))]
pub async fn update_user(
    pool: &PgPool,
    user_id: Uuid,
    req: UpdateUserRequest,
) -> Result<UserResponse, ApiError> {
    if let Some(name) = &req.name {
        validate_name(name)?;
    }
    let email = match &req.email {
        Some(email) => {
            validate_email(email)?;
            Some(email.trim().to_lowercase())
        }
        None => None,
    };
    let hash = match &req.password {
        Some(password) => {
            validate_password(password)?;
            Some(crypto::hash_password(password.expose_secret(), DEFAULT_BCRYPT_COST)?)
        }
        None => None,
    };

    let updated = users::update_user(
        pool,
        user_id,
        req.name.as_deref().map(str::trim),
        email.as_deref(),
        hash.as_deref(),
    )
    .await?
    .ok_or(ApiError::NotFound("user"))?;

    info!(user_id = %updated.user_id, "Updated user");
    Ok(UserResponse::from(updated))
}

#[instrument(skip_all, fields(user_id = %user_id))]
pub async fn delete_user(pool: &PgPool, user_id: Uuid) -> Result<(), ApiError> {
    let deleted = users::delete_user(pool, user_id).await?;
    if !deleted {
        return Err(ApiError::NotFound("user"));
    }
    info!(user_id = %user_id, "Deleted user");
    Ok(())
}

/// Fetch the raw user row for internal callers that need the stored
/// password hash. Handlers should use the `UserResponse` paths instead.
pub async fn get_user_record(pool: &PgPool, user_id: Uuid) -> Result<Option<User>, ApiError> {
    users::get_by_id(pool, user_id).await
}
