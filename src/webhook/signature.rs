//! GitHub webhook signature verification using HMAC-SHA1.
//!
//! The signature arrives in the `X-Hub-Signature` header as `sha1=<hex>`,
//! computed over the raw request body with the shared webhook secret.

use hmac::digest::InvalidLength;
use hmac::{Hmac, Mac};
use sha1::Sha1;

type HmacSha1 = Hmac<Sha1>;

/// Parses a signature header (e.g. "sha1=abc123...") into raw bytes.
///
/// Returns `None` for a missing prefix or invalid hex.
pub fn parse_signature_header(header: &str) -> Option<Vec<u8>> {
    let hex_sig = header.strip_prefix("sha1=")?;
    hex::decode(hex_sig).ok()
}

/// Computes the HMAC-SHA1 of `payload` and formats it as a header value.
pub fn sign(payload: &[u8], secret: &[u8]) -> Result<String, InvalidLength> {
    let mut mac = HmacSha1::new_from_slice(secret)?;
    mac.update(payload);
    Ok(format!("sha1={}", hex::encode(mac.finalize().into_bytes())))
}

/// Verifies `signature_header` against the payload and secret in constant time.
pub fn verify_signature(payload: &[u8], signature_header: &str, secret: &[u8]) -> bool {
    let Some(expected) = parse_signature_header(signature_header) else {
        return false;
    };

    let Ok(mut mac) = HmacSha1::new_from_slice(secret) else {
        return false;
    };
    mac.update(payload);
    mac.verify_slice(&expected).is_ok()
}
