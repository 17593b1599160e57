//! Webhook signature verification using HMAC-SHA256.
//!
//! GitHub signs each delivery with a shared secret and puts the digest in
//! the `X-Hub-Signature-256` header as `sha256=<hex>`. Verification is the
//! first step of webhook processing: a delivery that fails it is rejected
//! before the body is parsed.

use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Parse a `sha256=<hex>` signature header into raw bytes.
///
/// Returns `None` for malformed headers — wrong prefix, bad hex. Never
/// panics.
///
/// # Examples
///
/// ```
/// use heimdall_server::parse_signature_header;
///
/// assert!(parse_signature_header("sha256=abcd1234").is_some());
/// assert!(parse_signature_header("sha1=abcd1234").is_none());
/// assert!(parse_signature_header("sha256=zzzz").is_none());
/// ```
pub fn parse_signature_header(header: &str) -> Option<Vec<u8>> {
    let hex_digest = header.strip_prefix("sha256=")?;
    hex::decode(hex_digest).ok()
}

/// Compute the HMAC-SHA256 digest of a payload under a secret.
///
/// Exposed so tests can build valid signature headers.
pub fn compute_signature(payload: &[u8], secret: &[u8]) -> Vec<u8> {
    let mut mac = HmacSha256::new_from_slice(secret).expect("HMAC accepts any key length");
    mac.update(payload);
    mac.finalize().into_bytes().to_vec()
}

/// Format a digest as a `sha256=<hex>` header value.
pub fn format_signature_header(signature: &[u8]) -> String {
    format!("sha256={}", hex::encode(signature))
}

/// Verify a webhook payload against its signature header.
///
/// Comparison is constant-time via the HMAC library.
///
/// # Examples
///
/// ```
/// use heimdall_server::{compute_signature, format_signature_header, verify_signature};
///
/// let payload = b"{}";
/// let secret = b"shared-secret";
/// let header = format_signature_header(&compute_signature(payload, secret));
///
/// assert!(verify_signature(payload, &header, secret));
/// assert!(!verify_signature(payload, &header, b"other-secret"));
/// ```
pub fn verify_signature(payload: &[u8], signature_header: &str, secret: &[u8]) -> bool {
    let Some(expected) = parse_signature_header(signature_header) else {
        return false;
    };

    let Ok(mut mac) = HmacSha256::new_from_slice(secret) else {
        return false;
    };
    mac.update(payload);
    mac.verify_slice(&expected).is_ok()
}
