//! HMAC-SHA256 webhook signatures.
//!
//! Signatures are generated as lowercase hex; hex digits are matched without
//! regard to case when verifying. The timestamped variant signs
//! `"{timestamp}.{payload}"` so a captured delivery cannot be replayed
//! outside the tolerance window.

use chrono::Utc;
use constant_time_eq::constant_time_eq;
use hmac::{Hmac, Mac};
use sha2::Sha256;
use std::time::Duration;

type HmacSha256 = Hmac<Sha256>;

fn hmac_hex(secret: &str, parts: &[&[u8]]) -> String {
    let mut mac =
        HmacSha256::new_from_slice(secret.as_bytes()).expect("HMAC can take key of any size");
    for part in parts {
        mac.update(part);
    }
    hex::encode(mac.finalize().into_bytes())
}

/// Constant-time comparison of a lowercase `expected` against a provided
/// hex signature in either case.
fn signatures_match(expected: &str, provided: &str) -> bool {
    constant_time_eq(expected.as_bytes(), provided.to_ascii_lowercase().as_bytes())
}

/// Signs `payload` with `secret`.
pub fn generate(payload: &[u8], secret: &str) -> String {
    hmac_hex(secret, &[payload])
}

/// Signs `"{timestamp}.{payload}"` with `secret`.
pub fn generate_with_timestamp(payload: &[u8], secret: &str, timestamp: i64) -> String {
    let prefix = format!("{}.", timestamp);
    hmac_hex(secret, &[prefix.as_bytes(), payload])
}

/// Checks `signature` against the signature of `payload`.
pub fn verify(payload: &[u8], signature: &str, secret: &str) -> bool {
    signatures_match(&generate(payload, secret), signature)
}

/// Returns true if `timestamp` lies within `tolerance` of `now`, inclusive.
pub fn timestamp_within_tolerance(timestamp: i64, tolerance: Duration, now: i64) -> bool {
    let tolerance = i64::try_from(tolerance.as_secs()).unwrap_or(i64::MAX);
    now.saturating_sub(timestamp).saturating_abs() <= tolerance
}

/// Checks a timestamped signature against the current time.
pub fn verify_with_timestamp(
    payload: &[u8],
    signature: &str,
    secret: &str,
    timestamp: i64,
    tolerance: Duration,
) -> bool {
    verify_with_timestamp_at(payload, signature, secret, timestamp, tolerance, Utc::now().timestamp())
}

/// Checks a timestamped signature against `now` (Unix seconds).
///
/// A timestamp outside the tolerance fails before any HMAC is computed.
pub fn verify_with_timestamp_at(
    payload: &[u8],
    signature: &str,
    secret: &str,
    timestamp: i64,
    tolerance: Duration,
    now: i64,
) -> bool {
    if !timestamp_within_tolerance(timestamp, tolerance, now) {
        return false;
    }
    signatures_match(&generate_with_timestamp(payload, secret, timestamp), signature)
}
