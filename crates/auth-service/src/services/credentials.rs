//! Credential validation boundary.
//!
//! Resolves an identity by email and, when a password is supplied,
//! checks it against the stored bcrypt hash. "User not found" and
//! "wrong password" are indistinguishable to the caller, in error shape
//! and in timing: a dummy hash is always verified when the lookup
//! misses so both paths pay the bcrypt cost.

use crate::crypto;
use crate::errors::ApiError;
use crate::models::User;
use crate::observability::hash_for_correlation;
use crate::repositories::users;
use secrecy::{ExposeSecret, SecretString};
use sqlx::PgPool;
use tracing::{debug, instrument};

// A syntactically valid bcrypt hash that matches no password.
const DUMMY_BCRYPT_HASH: &str = "$2b$12$LQv3c1yqBWVHxkd0LHAkCOYz6TtxMQJqhN8/LewY5GyYqExt7YD3a";

/// Resolve a user and optionally check a presented password.
///
/// Without a password this only confirms the identity still exists
/// (used on every token verification). With one it authenticates a
/// login attempt.
#[instrument(skip_all)]
pub async fn resolve_and_check(
    pool: &PgPool,
    email: &str,
    password: Option<&SecretString>,
) -> Result<User, ApiError> {
    let user = users::get_by_email(pool, email).await?;

    if let Some(password) = password {
        let hash_to_verify = match &user {
            Some(u) => u.password_hash.as_str(),
            None => DUMMY_BCRYPT_HASH,
        };

        let is_valid = crypto::verify_password(password.expose_secret(), hash_to_verify)?;

        return match user {
            Some(u) if is_valid => Ok(u),
            _ => {
                debug!(
                    email_hash = %hash_for_correlation(email),
                    "Credential check failed"
                );
                Err(ApiError::InvalidCredentials)
            }
        };
    }

    user.ok_or(ApiError::InvalidCredentials)
}
