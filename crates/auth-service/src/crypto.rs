use crate::config::{MAX_BCRYPT_COST, MIN_BCRYPT_COST};
use crate::errors::ApiError;
use base64::{engine::general_purpose, Engine as _};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use ring::rand::{SecureRandom, SystemRandom};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::instrument;

/// Maximum allowed JWT size in bytes (4KB).
///
/// Oversized tokens are rejected before any base64 decoding or
/// signature work. Typical tokens here are ~300 bytes.
pub const MAX_JWT_SIZE_BYTES: usize = 4096;

/// Entropy of a freshly generated signing-key secret, in raw bytes
/// (base64-encoded for storage).
const KEY_SECRET_BYTES: usize = 32;

/// JWT claims structure.
///
/// `sub` and `email` identify a user and are redacted from Debug output.
#[derive(Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,   // Subject (user_id)
    pub email: String, // Identity reference, re-resolved on verification
    pub iat: i64,      // Issued at timestamp
    pub exp: i64,      // Expiration timestamp
}

impl fmt::Debug for Claims {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Claims")
            .field("sub", &"[REDACTED]")
            .field("email", &"[REDACTED]")
            .field("iat", &self.iat)
            .field("exp", &self.exp)
            .finish()
    }
}

/// Generate a fresh signing-key secret from the system CSPRNG.
///
/// 32 random bytes, base64-encoded for the durable store. Never derived
/// from timestamps or counters, never reused between keys.
#[instrument(skip_all)]
pub fn generate_key_secret() -> Result<String, ApiError> {
    let rng = SystemRandom::new();
    let mut bytes = [0u8; KEY_SECRET_BYTES];
    rng.fill(&mut bytes)
        .map_err(|e| ApiError::Crypto(format!("Secret generation failed: {}", e)))?;
    Ok(general_purpose::STANDARD.encode(bytes))
}

/// Sign JWT claims with a key secret (HS256).
#[instrument(skip_all)]
pub fn sign_jwt(claims: &Claims, secret: &str) -> Result<String, ApiError> {
    let encoding_key = EncodingKey::from_secret(secret.as_bytes());

    let mut header = Header::new(Algorithm::HS256);
    header.typ = Some("JWT".to_string());

    encode(&header, claims, &encoding_key)
        .map_err(|e| ApiError::Crypto(format!("JWT signing operation failed: {}", e)))
}

/// Verify a JWT against one candidate key secret.
///
/// Validates the HS256 signature and the token's own `exp` claim. Which
/// keys are candidates at all is the verifier's job; this function only
/// answers "does this secret make the token check out".
#[instrument(skip_all)]
pub fn verify_jwt(token: &str, secret: &str) -> Result<Claims, ApiError> {
    // Size check before any parsing or signature work
    if token.len() > MAX_JWT_SIZE_BYTES {
        tracing::debug!(
            target: "crypto",
            token_size = token.len(),
            max_size = MAX_JWT_SIZE_BYTES,
            "Token rejected: size exceeds maximum allowed"
        );
        return Err(ApiError::Unauthorized);
    }

    let decoding_key = DecodingKey::from_secret(secret.as_bytes());

    let mut validation = Validation::new(Algorithm::HS256);
    validation.validate_exp = true;

    let token_data = decode::<Claims>(token, &decoding_key, &validation).map_err(|e| {
        tracing::debug!(target: "crypto", error = %e, "Token verification failed");
        ApiError::Unauthorized
    })?;

    Ok(token_data.claims)
}

/// Hash a password with bcrypt using a validated cost factor.
///
/// Cost outside 10-14 is rejected even if a caller bypasses config.
#[instrument(skip_all)]
pub fn hash_password(password: &str, cost: u32) -> Result<String, ApiError> {
    if !(MIN_BCRYPT_COST..=MAX_BCRYPT_COST).contains(&cost) {
        return Err(ApiError::Crypto(format!(
            "Invalid bcrypt cost: {} (must be {}-{})",
            cost, MIN_BCRYPT_COST, MAX_BCRYPT_COST
        )));
    }

    bcrypt::hash(password, cost)
        .map_err(|e| ApiError::Crypto(format!("Password hashing failed: {}", e)))
}

/// Verify a password against a bcrypt hash
#[instrument(skip_all)]
pub fn verify_password(password: &str, hash: &str) -> Result<bool, ApiError> {
    bcrypt::verify(password, hash)
        .map_err(|e| ApiError::Crypto(format!("Password verification failed: {}", e)))
}
