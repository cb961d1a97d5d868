//! Stripe webhook signature verification (HMAC-SHA256)

use hmac::{Hmac, Mac};
use sha2::Sha256;
use thiserror::Error;

/// Maximum age (either direction) of a signed event, in seconds
pub const TIMESTAMP_TOLERANCE_SECS: i64 = 300;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SignatureError {
    #[error("Invalid Stripe-Signature header")]
    MalformedHeader,
    #[error("Invalid timestamp")]
    InvalidTimestamp,
    #[error("Webhook timestamp outside tolerance")]
    TimestampOutOfTolerance,
    #[error("Webhook signature mismatch")]
    Mismatch,
}

/// Verify a `Stripe-Signature` header (`t=...,v1=...[,v1=...]`) against the raw body.
///
/// Any `v1` entry may match; Stripe sends several while a secret is being rolled.
pub fn verify_webhook_signature(
    payload: &[u8],
    sig_header: &str,
    secret: &str,
    now: i64,
) -> Result<(), SignatureError> {
    let mut timestamp = None;
    let mut signatures = Vec::new();
    for part in sig_header.split(',').map(str::trim) {
        if let Some(t) = part.strip_prefix("t=") {
            timestamp = Some(t);
        } else if let Some(v) = part.strip_prefix("v1=") {
            signatures.push(v);
        }
    }

    let timestamp = timestamp
        .filter(|t| !t.is_empty())
        .ok_or(SignatureError::MalformedHeader)?;
    if signatures.is_empty() {
        return Err(SignatureError::MalformedHeader);
    }

    let mut mac = Hmac::<Sha256>::new_from_slice(secret.as_bytes())
        .map_err(|_| SignatureError::Mismatch)?;
    mac.update(timestamp.as_bytes());
    mac.update(b".");
    mac.update(payload);

    // Constant-time comparison via verify_slice
    let matched = signatures
        .iter()
        .filter_map(|sig| hex::decode(sig).ok())
        .any(|bytes| mac.clone().verify_slice(&bytes).is_ok());
    if !matched {
        return Err(SignatureError::Mismatch);
    }

    let ts: i64 = timestamp
        .parse()
        .map_err(|_| SignatureError::InvalidTimestamp)?;
    if now.abs_diff(ts) > TIMESTAMP_TOLERANCE_SECS as u64 {
        return Err(SignatureError::TimestampOutOfTolerance);
    }

    Ok(())
}

/// Build a header value the way Stripe signs `payload`.
#[cfg(test)]
pub(crate) fn sign_payload(payload: &[u8], secret: &str, timestamp: i64) -> String {
    let mut mac = Hmac::<Sha256>::new_from_slice(secret.as_bytes()).unwrap();
    mac.update(timestamp.to_string().as_bytes());
    mac.update(b".");
    mac.update(payload);
    format!("t={timestamp},v1={}", hex::encode(mac.finalize().into_bytes()))
}
