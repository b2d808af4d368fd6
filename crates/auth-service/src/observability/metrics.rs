//! Metric definitions.
//!
//! Prometheus naming conventions: `auth_` prefix, `_total` suffix for
//! counters. Labels are bounded:
//! - `status`: success | error
//! - `reason`: none | no_valid_key | unauthorized | store_unavailable

use metrics::{counter, gauge};

/// Record a token issuance outcome.
///
/// Metric: `auth_token_issuance_total`
pub fn record_token_issuance(status: &str) {
    counter!("auth_token_issuance_total", "status" => status.to_string()).increment(1);
}

/// Record a token verification outcome.
///
/// Metric: `auth_token_validations_total`
pub fn record_token_validation(status: &str, reason: Option<&str>) {
    let reason = reason.unwrap_or("none");
    counter!("auth_token_validations_total", "status" => status.to_string(), "reason" => reason.to_string())
        .increment(1);
}

/// Record a key rotation run.
///
/// Metric: `auth_key_rotation_total`
pub fn record_key_rotation(status: &str) {
    counter!("auth_key_rotation_total", "status" => status.to_string()).increment(1);
}

/// Record a scheduled task failure.
///
/// Metric: `auth_scheduled_task_failures_total`, labeled by task name
/// (bounded: tasks are registered from a fixed set at startup).
pub fn record_task_failure(task: &'static str) {
    counter!("auth_scheduled_task_failures_total", "task" => task).increment(1);
}

/// Update the count of currently-valid signing keys.
///
/// Metric: `auth_valid_signing_keys`
pub fn set_valid_signing_keys(count: u64) {
    gauge!("auth_valid_signing_keys").set(count as f64);
}
