//! Key issuance.
//!
//! Each rotation appends a fresh signing key to the store; nothing is
//! deactivated or deleted. A new key is usable for signing and
//! verification the instant the insert commits. Old keys keep verifying
//! until their window closes, which is what lets rotation happen with
//! no verification gap and no coordination with in-flight requests.

use crate::config::KEY_VALIDITY_DAYS;
use crate::crypto;
use crate::errors::ApiError;
use crate::models::JwtKey;
use crate::observability::metrics::{record_key_rotation, set_valid_signing_keys};
use crate::repositories::jwt_keys;
use chrono::{Duration, Utc};
use sqlx::PgPool;
use tracing::{info, instrument};

/// Generate and append a new signing key.
///
/// Secret comes from the system CSPRNG; the window is exactly
/// `[now, now + KEY_VALIDITY_DAYS]`. Store failures propagate to the
/// caller — the scheduled wrapper logs them and the next tick retries.
#[instrument(skip_all)]
pub async fn create_key(pool: &PgPool) -> Result<JwtKey, ApiError> {
    let secret = crypto::generate_key_secret()?;

    let created_at = Utc::now();
    let expires_at = created_at + Duration::days(KEY_VALIDITY_DAYS);

    let key = jwt_keys::insert_key(pool, &secret, created_at, expires_at).await?;

    info!(
        key_id = key.id,
        expires_at = %key.expires_at,
        "Signing key created"
    );

    Ok(key)
}

/// Create a signing key at startup if none is currently valid.
///
/// Covers first boot and the pathological case where the process was
/// down long enough for every key to expire.
#[instrument(skip_all)]
pub async fn ensure_bootstrap_key(pool: &PgPool) -> Result<(), ApiError> {
    if jwt_keys::get_newest_valid_key(pool).await?.is_some() {
        return Ok(());
    }

    info!("No valid signing key found, creating bootstrap key");
    create_key(pool).await?;

    Ok(())
}

/// Scheduled rotation body. Wraps `create_key` with metrics; the
/// scheduler takes care of catching and logging the error.
pub async fn rotate(pool: &PgPool) -> Result<(), ApiError> {
    match create_key(pool).await {
        Ok(_) => {
            record_key_rotation("success");
            let valid = jwt_keys::get_valid_keys(pool).await?;
            set_valid_signing_keys(valid.len() as u64);
            Ok(())
        }
        Err(e) => {
            record_key_rotation("error");
            Err(e)
        }
    }
}
