//! Webhook signature verification.
//!
//! Viber signs each callback body with HMAC-SHA256 keyed by the bot auth
//! token and sends the hex digest in the `X-Viber-Content-Signature`
//! header (no prefix, unlike some other platforms).

use {
    hmac::{Hmac, Mac},
    sha2::Sha256,
    tracing::warn,
};

type HmacSha256 = Hmac<Sha256>;

/// Check the signature header against the raw request body.
pub fn verify_signature(body: &[u8], signature_hex: &str, auth_token: &str) -> bool {
    let mut mac = match HmacSha256::new_from_slice(auth_token.as_bytes()) {
        Ok(m) => m,
        Err(_) => {
            warn!("failed to create HMAC");
            return false;
        },
    };

    mac.update(body);
    let computed = hex::encode(mac.finalize().into_bytes());

    // Constant-time comparison to prevent timing attacks.
    constant_time_eq(&computed, signature_hex)
}

/// Constant-time string comparison.
fn constant_time_eq(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.bytes()
        .zip(b.bytes())
        .fold(0, |acc, (x, y)| acc | (x ^ y))
        == 0
}
