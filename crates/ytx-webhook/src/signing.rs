//! HMAC-SHA256 sign/verify over `body || "." || timestamp` (§4.10).
//!
//! Follows this codebase's existing signed-delivery-token module: sign with
//! `Hmac<Sha256>`, verify with `mac.verify_slice` for a constant-time
//! comparison rather than a manual byte-by-byte `==`.

use hmac::{Hmac, Mac};
use sha2::Sha256;

use crate::error::{WebhookError, WebhookResult};

type HmacSha256 = Hmac<Sha256>;

fn signing_input(body: &[u8], timestamp: &str) -> Vec<u8> {
    let mut input = Vec::with_capacity(body.len() + 1 + timestamp.len());
    input.extend_from_slice(body);
    input.push(b'.');
    input.extend_from_slice(timestamp.as_bytes());
    input
}

/// Returns the `sha256=<hex>` header value.
pub fn sign(secret: &str, body: &[u8], timestamp: &str) -> WebhookResult<String> {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|e| WebhookError::InvalidKey(e.to_string()))?;
    mac.update(&signing_input(body, timestamp));
    let digest = mac.finalize().into_bytes();
    Ok(format!("sha256={}", hex_encode(&digest)))
}

/// Verify a `sha256=<hex>` header against `body`/`timestamp`. The receiving
/// side should use this; a constant-time comparison is performed internally.
pub fn verify(secret: &str, body: &[u8], timestamp: &str, header: &str) -> WebhookResult<bool> {
    let Some(hex_sig) = header.strip_prefix("sha256=") else { return Ok(false) };
    let Ok(sig_bytes) = hex_decode(hex_sig) else { return Ok(false) };

    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|e| WebhookError::InvalidKey(e.to_string()))?;
    mac.update(&signing_input(body, timestamp));
    Ok(mac.verify_slice(&sig_bytes).is_ok())
}

fn hex_encode(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

fn hex_decode(s: &str) -> Result<Vec<u8>, ()> {
    if s.len() % 2 != 0 {
        return Err(());
    }
    (0..s.len())
        .step_by(2)
        .map(|i| u8::from_str_radix(&s[i..i + 2], 16).map_err(|_| ()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sign_then_verify_round_trips() {
        let secret = "test-secret";
        let body = br#"{"event":"job.completed"}"#;
        let timestamp = "1700000000";
        let header = sign(secret, body, timestamp).unwrap();
        assert!(verify(secret, body, timestamp, &header).unwrap());
    }

    #[test]
    fn verify_rejects_wrong_secret() {
        let body = b"payload";
        let timestamp = "1700000000";
        let header = sign("secret-a", body, timestamp).unwrap();
        assert!(!verify("secret-b", body, timestamp, &header).unwrap());
    }

    #[test]
    fn verify_rejects_tampered_body() {
        let secret = "test-secret";
        let timestamp = "1700000000";
        let header = sign(secret, b"original", timestamp).unwrap();
        assert!(!verify(secret, b"tampered", timestamp, &header).unwrap());
    }

    #[test]
    fn verify_rejects_malformed_header() {
        assert!(!verify("secret", b"body", "123", "not-a-signature").unwrap());
    }
}
