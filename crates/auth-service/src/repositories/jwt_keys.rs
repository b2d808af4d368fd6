//! Append-only store for signing keys.
//!
//! Keys are written once by the key rotation task and never updated or
//! deleted; "which keys count" is always derived from the validity
//! window at read time. Postgres MVCC makes the concurrent
//! append-while-scan safe without application-level locking: a scan
//! racing an insert may or may not see the new key, which is fine
//! because no outstanding token can be signed by a key that did not
//! exist yet.

use crate::errors::ApiError;
use crate::models::JwtKey;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

/// Append a new signing key. Pure insert; existing rows are untouched.
pub async fn insert_key(
    pool: &PgPool,
    secret: &str,
    created_at: DateTime<Utc>,
    expires_at: DateTime<Utc>,
) -> Result<JwtKey, ApiError> {
    let key = sqlx::query_as::<_, JwtKey>(
        r#"
        INSERT INTO jwt_keys (key, created_at, expires_at)
        VALUES ($1, $2, $3)
        RETURNING id, key, created_at, expires_at
        "#,
    )
    .bind(secret)
    .bind(created_at)
    .bind(expires_at)
    .fetch_one(pool)
    .await
    .map_err(|e| ApiError::Database(format!("Failed to insert signing key: {}", e)))?;

    Ok(key)
}

/// All keys whose validity window contains the current time, newest
/// first. `id DESC` breaks ties for keys created in the same instant,
/// newest insert winning, so the trial order is deterministic.
pub async fn get_valid_keys(pool: &PgPool) -> Result<Vec<JwtKey>, ApiError> {
    let keys = sqlx::query_as::<_, JwtKey>(
        r#"
        SELECT id, key, created_at, expires_at
        FROM jwt_keys
        WHERE created_at <= NOW() AND expires_at >= NOW()
        ORDER BY created_at DESC, id DESC
        "#,
    )
    .fetch_all(pool)
    .await
    .map_err(|e| ApiError::Database(format!("Failed to fetch valid keys: {}", e)))?;

    Ok(keys)
}

/// The key new tokens are signed with: latest `created_at` among
/// currently-valid keys.
pub async fn get_newest_valid_key(pool: &PgPool) -> Result<Option<JwtKey>, ApiError> {
    let key = sqlx::query_as::<_, JwtKey>(
        r#"
        SELECT id, key, created_at, expires_at
        FROM jwt_keys
        WHERE created_at <= NOW() AND expires_at >= NOW()
        ORDER BY created_at DESC, id DESC
        LIMIT 1
        "#,
    )
    .fetch_optional(pool)
    .await
    .map_err(|e| ApiError::Database(format!("Failed to fetch newest valid key: {}", e)))?;

    Ok(key)
}
