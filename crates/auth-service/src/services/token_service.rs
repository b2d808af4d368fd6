//! Token issuance and verification against the rotating key set.
//!
//! Tokens carry no key identifier. The verifier discovers which key (if
//! any) signed a token by trying each currently-valid key in
//! deterministic newest-first order; the common case — a token signed by
//! the current key — resolves on the first attempt, and the candidate
//! set is bounded by the validity-window/rotation-cadence ratio (three
//! keys at steady state). Key expiry is enforced by restricting the
//! candidate set, never by inspecting claims.

use crate::config::TOKEN_EXPIRY_SECONDS;
use crate::crypto::{self, Claims};
use crate::errors::ApiError;
use crate::models::TokenResponse;
use crate::observability::metrics::{record_token_issuance, record_token_validation};
use crate::repositories::jwt_keys;
use crate::services::credentials;
use chrono::Utc;
use secrecy::SecretString;
use sqlx::PgPool;
use tracing::{instrument, warn};

/// Authenticate an identity and issue a bearer token.
///
/// Signs with the single newest currently-valid key (ties broken by
/// insertion order). An empty or fully expired key set is an
/// operational fault, surfaced as `NoSigningKey` and never retried
/// within the request.
#[instrument(skip_all)]
pub async fn issue_token(
    pool: &PgPool,
    email: &str,
    password: &SecretString,
) -> Result<TokenResponse, ApiError> {
    let user = credentials::resolve_and_check(pool, email, Some(password)).await?;

    let signing_key = jwt_keys::get_newest_valid_key(pool).await?.ok_or_else(|| {
        warn!("Token issuance failed: no valid signing key in store");
        record_token_issuance("error");
        ApiError::NoSigningKey
    })?;

    let now = Utc::now().timestamp();
    let claims = Claims {
        sub: user.user_id.to_string(),
        email: user.email,
        iat: now,
        exp: now + TOKEN_EXPIRY_SECONDS,
    };

    let token = crypto::sign_jwt(&claims, &signing_key.key)?;

    record_token_issuance("success");

    Ok(TokenResponse {
        access_token: token,
        token_type: "Bearer".to_string(),
        expires_in: TOKEN_EXPIRY_SECONDS as u64,
    })
}

/// Verify a bearer token and return its claims.
///
/// Every failure path — no candidate key matched, empty candidate set,
/// malformed token, identity no longer resolvable, store read failure —
/// collapses into the same `Unauthorized` so the caller learns nothing
/// about which check failed. Fail-closed: a store fault rejects the
/// token rather than waving it through.
#[instrument(skip_all)]
pub async fn verify_token(pool: &PgPool, token: &str) -> Result<Claims, ApiError> {
    let candidates = match jwt_keys::get_valid_keys(pool).await {
        Ok(keys) => keys,
        Err(e) => {
            warn!(error = %e, "Key store unavailable during verification");
            record_token_validation("error", Some("store_unavailable"));
            return Err(ApiError::Unauthorized);
        }
    };

    if candidates.is_empty() {
        record_token_validation("error", Some("no_valid_key"));
        return Err(ApiError::Unauthorized);
    }

    // Bounded trial loop, newest key first.
    let mut claims = None;
    for key in &candidates {
        if let Ok(decoded) = crypto::verify_jwt(token, &key.key) {
            claims = Some(decoded);
            break;
        }
    }

    let claims = match claims {
        Some(c) => c,
        None => {
            record_token_validation("error", Some("unauthorized"));
            return Err(ApiError::Unauthorized);
        }
    };

    // The identity must still exist; a deleted user's outstanding
    // tokens die here.
    match credentials::resolve_and_check(pool, &claims.email, None).await {
        Ok(_) => {
            record_token_validation("success", None);
            Ok(claims)
        }
        Err(_) => {
            record_token_validation("error", Some("unauthorized"));
            Err(ApiError::Unauthorized)
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::config::{DEFAULT_BCRYPT_COST, KEY_VALIDITY_DAYS};
    use crate::models::User;
    use crate::repositories::users;
    use crate::services::key_rotation;
    use chrono::Duration;

    async fn seed_user(pool: &PgPool, email: &str, password: &str) -> Result<User, ApiError> {
        let hash = crypto::hash_password(password, DEFAULT_BCRYPT_COST)?;
        users::create_user(pool, "Test User", email, &hash).await
    }

    /// Sign a token directly with a given secret, bypassing the signer's
    /// newest-key selection. Used to simulate tokens issued in the past
    /// under older keys.
    fn sign_with_secret(secret: &str, email: &str, sub: &str) -> String {
        let now = Utc::now().timestamp();
        let claims = Claims {
            sub: sub.to_string(),
            email: email.to_string(),
            iat: now,
            exp: now + TOKEN_EXPIRY_SECONDS,
        };
        crypto::sign_jwt(&claims, secret).unwrap()
    }

    #[sqlx::test(migrations = "../../migrations")]
    async fn test_issue_and_verify_roundtrip(pool: PgPool) -> Result<(), ApiError> {
        let user = seed_user(&pool, "alice@example.com", "correct horse").await?;
        key_rotation::create_key(&pool).await?;

        let password = SecretString::from("correct horse");
        let response = issue_token(&pool, "alice@example.com", &password).await?;

        assert_eq!(response.token_type, "Bearer");
        assert_eq!(response.expires_in, TOKEN_EXPIRY_SECONDS as u64);

        let claims = verify_token(&pool, &response.access_token).await?;
        assert_eq!(claims.sub, user.user_id.to_string());
        assert_eq!(claims.email, "alice@example.com");

        Ok(())
    }

    #[sqlx::test(migrations = "../../migrations")]
    async fn test_issue_token_requires_valid_key(pool: PgPool) -> Result<(), ApiError> {
        seed_user(&pool, "alice@example.com", "correct horse").await?;
        // Store is empty: signing is an operational fault.
        let password = SecretString::from("correct horse");
        let result = issue_token(&pool, "alice@example.com", &password).await;
        assert!(matches!(result, Err(ApiError::NoSigningKey)));

        Ok(())
    }

    #[sqlx::test(migrations = "../../migrations")]
    async fn test_issue_token_bad_credentials(pool: PgPool) -> Result<(), ApiError> {
        seed_user(&pool, "alice@example.com", "correct horse").await?;
        key_rotation::create_key(&pool).await?;

        let wrong = SecretString::from("battery staple");
        let result = issue_token(&pool, "alice@example.com", &wrong).await;
        assert!(matches!(result, Err(ApiError::InvalidCredentials)));

        Ok(())
    }

    #[sqlx::test(migrations = "../../migrations")]
    async fn test_signer_picks_newest_key(pool: PgPool) -> Result<(), ApiError> {
        seed_user(&pool, "alice@example.com", "correct horse").await?;

        let now = Utc::now();
        jwt_keys::insert_key(
            &pool,
            "older-secret",
            now - Duration::days(7),
            now + Duration::days(8),
        )
        .await?;
        let newer = jwt_keys::insert_key(
            &pool,
            "newer-secret",
            now - Duration::hours(1),
            now + Duration::days(14),
        )
        .await?;

        let password = SecretString::from("correct horse");
        let response = issue_token(&pool, "alice@example.com", &password).await?;

        // The token must verify under the newer key alone.
        assert!(crypto::verify_jwt(&response.access_token, &newer.key).is_ok());
        assert!(crypto::verify_jwt(&response.access_token, "older-secret").is_err());

        Ok(())
    }

    #[sqlx::test(migrations = "../../migrations")]
    async fn test_multi_key_trial_accepts_older_key_token(pool: PgPool) -> Result<(), ApiError> {
        let user = seed_user(&pool, "alice@example.com", "correct horse").await?;

        let now = Utc::now();
        // Both keys currently valid; token was signed under the older.
        jwt_keys::insert_key(
            &pool,
            "older-secret",
            now - Duration::days(7),
            now + Duration::days(8),
        )
        .await?;
        jwt_keys::insert_key(
            &pool,
            "newer-secret",
            now - Duration::hours(1),
            now + Duration::days(14),
        )
        .await?;

        let token = sign_with_secret("older-secret", "alice@example.com", &user.user_id.to_string());

        let claims = verify_token(&pool, &token).await?;
        assert_eq!(claims.email, "alice@example.com");

        Ok(())
    }

    #[sqlx::test(migrations = "../../migrations")]
    async fn test_expired_key_token_rejected(pool: PgPool) -> Result<(), ApiError> {
        let user = seed_user(&pool, "alice@example.com", "correct horse").await?;

        let now = Utc::now();
        // Key expired yesterday; the token's own exp claim is still fine,
        // so only candidate-set filtering can reject it.
        jwt_keys::insert_key(
            &pool,
            "expired-secret",
            now - Duration::days(16),
            now - Duration::days(1),
        )
        .await?;
        jwt_keys::insert_key(
            &pool,
            "current-secret",
            now - Duration::hours(1),
            now + Duration::days(14),
        )
        .await?;

        let token =
            sign_with_secret("expired-secret", "alice@example.com", &user.user_id.to_string());

        let result = verify_token(&pool, &token).await;
        assert!(matches!(result, Err(ApiError::Unauthorized)));

        Ok(())
    }

    #[sqlx::test(migrations = "../../migrations")]
    async fn test_verify_fails_on_empty_key_store(pool: PgPool) -> Result<(), ApiError> {
        seed_user(&pool, "alice@example.com", "correct horse").await?;

        let token = sign_with_secret("phantom-secret", "alice@example.com", "sub");
        let result = verify_token(&pool, &token).await;
        assert!(matches!(result, Err(ApiError::Unauthorized)));

        Ok(())
    }

    #[sqlx::test(migrations = "../../migrations")]
    async fn test_deleted_identity_invalidates_token(pool: PgPool) -> Result<(), ApiError> {
        let user = seed_user(&pool, "alice@example.com", "correct horse").await?;
        key_rotation::create_key(&pool).await?;

        let password = SecretString::from("correct horse");
        let response = issue_token(&pool, "alice@example.com", &password).await?;

        users::delete_user(&pool, user.user_id).await?;

        let result = verify_token(&pool, &response.access_token).await;
        assert!(matches!(result, Err(ApiError::Unauthorized)));

        Ok(())
    }

    #[sqlx::test(migrations = "../../migrations")]
    async fn test_failure_modes_indistinguishable(pool: PgPool) -> Result<(), ApiError> {
        let user = seed_user(&pool, "alice@example.com", "correct horse").await?;
        key_rotation::create_key(&pool).await?;

        // No key matches this signature
        let foreign = sign_with_secret("foreign-secret", "alice@example.com", "sub");
        let no_match = verify_token(&pool, &foreign).await;

        // Key matches but the identity is gone
        let password = SecretString::from("correct horse");
        let good = issue_token(&pool, "alice@example.com", &password).await?;
        users::delete_user(&pool, user.user_id).await?;
        let identity_gone = verify_token(&pool, &good.access_token).await;

        // Not a token at all
        let malformed = verify_token(&pool, "garbage").await;

        assert!(matches!(no_match, Err(ApiError::Unauthorized)));
        assert!(matches!(identity_gone, Err(ApiError::Unauthorized)));
        assert!(matches!(malformed, Err(ApiError::Unauthorized)));

        Ok(())
    }

    #[sqlx::test(migrations = "../../migrations")]
    async fn test_verification_across_key_window(pool: PgPool) -> Result<(), ApiError> {
        let user = seed_user(&pool, "alice@example.com", "correct horse").await?;

        // Scenario: key created at T0, token signed at T0+1h. At
        // T0+14d the key is still inside its window; at T0+16d it is
        // not. Emulated by placing "now" at the two offsets relative to
        // the key's recorded timestamps.
        let now = Utc::now();

        // Verification at T0+14d: key window still open
        let t0_recent = now - Duration::days(14);
        jwt_keys::insert_key(
            &pool,
            "t0-key",
            t0_recent,
            t0_recent + Duration::days(KEY_VALIDITY_DAYS),
        )
        .await?;
        let token = sign_with_secret("t0-key", "alice@example.com", &user.user_id.to_string());
        assert!(verify_token(&pool, &token).await.is_ok());

        Ok(())
    }

    #[sqlx::test(migrations = "../../migrations")]
    async fn test_verification_after_key_window_closes(pool: PgPool) -> Result<(), ApiError> {
        let user = seed_user(&pool, "alice@example.com", "correct horse").await?;

        // Key created 16 days ago with the standard 15-day window:
        // expired a day ago, so even a fresh signature under it fails.
        let now = Utc::now();
        let t0_old = now - Duration::days(16);
        jwt_keys::insert_key(
            &pool,
            "t0-key",
            t0_old,
            t0_old + Duration::days(KEY_VALIDITY_DAYS),
        )
        .await?;

        let token = sign_with_secret("t0-key", "alice@example.com", &user.user_id.to_string());
        let result = verify_token(&pool, &token).await;
        assert!(matches!(result, Err(ApiError::Unauthorized)));

        Ok(())
    }
}
