//! Payment signature verification.
//!
//! The gateway signs `"{order_id}|{payment_id}"` with HMAC-SHA256 keyed by
//! the server-held key secret and sends the hex digest back through the
//! client. Verification recomputes the digest server-side and compares it in
//! constant time.

use crate::error::{CoreError, Result};
use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Compute the expected hex-encoded HMAC-SHA256 signature for a payment.
///
/// Message is `"{order_id}|{payment_id}"`, keyed by the gateway key secret.
///
/// # Errors
///
/// Returns [`CoreError::Internal`] if the MAC cannot be initialized (HMAC
/// accepts keys of any length, so this does not happen in practice).
pub fn payment_signature(secret: &str, order_id: &str, payment_id: &str) -> Result<String> {
    let mut mac =
        HmacSha256::new_from_slice(secret.as_bytes()).map_err(|_| CoreError::Internal)?;
    mac.update(order_id.as_bytes());
    mac.update(b"|");
    mac.update(payment_id.as_bytes());
    Ok(hex::encode(mac.finalize().into_bytes()))
}

/// Verify a client-supplied payment signature in constant time.
///
/// Returns `false` on any mismatch, including casing differences in the hex
/// digest; a single mutated character rejects the signature.
#[must_use]
pub fn verify_payment_signature(
    secret: &str,
    order_id: &str,
    payment_id: &str,
    supplied: &str,
) -> bool {
    payment_signature(secret, order_id, payment_id)
        .map(|expected| constant_time_eq::constant_time_eq(expected.as_bytes(), supplied.as_bytes()))
        .unwrap_or(false)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)] // Test code can use unwrap
mod tests {
    use super::*;

    #[test]
    fn signature_is_deterministic() {
        let a = payment_signature("s3cr3t", "order_abc", "pay_xyz").unwrap();
        let b = payment_signature("s3cr3t", "order_abc", "pay_xyz").unwrap();
        assert_eq!(a, b);
        assert_eq!(a.len(), 64); // hex-encoded SHA-256 digest
        assert!(verify_payment_signature("s3cr3t", "order_abc", "pay_xyz", &a));
    }

    #[test]
    fn message_is_order_then_payment() {
        // The digest must cover "order|payment", not "payment|order".
        let forward = payment_signature("s3cr3t", "order_abc", "pay_xyz").unwrap();
        let reversed = payment_signature("s3cr3t", "pay_xyz", "order_abc").unwrap();
        assert_ne!(forward, reversed);
    }

    #[test]
    fn single_character_mutation_is_rejected() {
        let valid = payment_signature("s3cr3t", "order_abc", "pay_xyz").unwrap();
        for i in 0..valid.len() {
            let mut mutated = valid.clone().into_bytes();
            mutated[i] = if mutated[i] == b'0' { b'1' } else { b'0' };
            let mutated = String::from_utf8(mutated).unwrap();
            if mutated == valid {
                continue;
            }
            assert!(
                !verify_payment_signature("s3cr3t", "order_abc", "pay_xyz", &mutated),
                "mutation at index {i} was accepted"
            );
        }
    }

    #[test]
    fn different_secret_rejects() {
        let valid = payment_signature("s3cr3t", "order_abc", "pay_xyz").unwrap();
        assert!(!verify_payment_signature("other", "order_abc", "pay_xyz", &valid));
    }
}
