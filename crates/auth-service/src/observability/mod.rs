//! Observability helpers.
//!
//! Instrumentation is privacy-by-default: spans use
//! `#[instrument(skip_all)]`, identities never appear in logs in
//! plaintext, and metric labels are bounded to fixed vocabularies.

pub mod metrics;

use sha2::{Digest, Sha256};

/// Hash an identifier for correlation in logs (SHA-256, first 8 hex chars).
///
/// Lets log lines about the same email or user be correlated without
/// storing the value itself. Not a secrecy mechanism; one-way
/// correlation only.
pub fn hash_for_correlation(value: &str) -> String {
    let digest = Sha256::digest(value.as_bytes());
    let mut encoded = hex::encode(digest);
    encoded.truncate(8);
    encoded
}
