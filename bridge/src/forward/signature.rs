//! Webhook request signing.
//!
//! Every outbound envelope carries a SHA-256 hash of its body plus a
//! canonical string `timestamp.nonce.hash`; when a shared secret is
//! configured the canonical string is additionally signed with HMAC-SHA256.
//! Verification (including replay rejection) happens on the receiver side.

use hmac::{Hmac, Mac};
use sha2::{Digest, Sha256};

type HmacSha256 = Hmac<Sha256>;

/// Hex-encoded SHA-256 digest of `data`.
pub fn sha256_hex(data: &[u8]) -> String {
    hex::encode(Sha256::digest(data))
}

/// Hex-encoded HMAC-SHA256 of `data` under `secret`.
pub fn hmac_sha256_hex(secret: &str, data: &str) -> String {
    let mut mac =
        HmacSha256::new_from_slice(secret.as_bytes()).expect("HMAC accepts keys of any length");
    mac.update(data.as_bytes());
    hex::encode(mac.finalize().into_bytes())
}

/// Per-request authentication bundle attached to a webhook POST.
#[derive(Debug, Clone)]
pub struct AuthProof {
    /// Unix milliseconds at signing time
    pub timestamp: String,
    /// Fresh random nonce
    pub nonce: String,
    /// Hex SHA-256 of the exact serialized body
    pub payload_hash: String,
    /// `timestamp.nonce.payload_hash`
    pub canonical: String,
    /// HMAC over `canonical`; `None` when no shared secret is configured
    pub signature: Option<String>,
}

impl AuthProof {
    /// Build the proof for one serialized body.
    pub fn new(secret: Option<&str>, body: &[u8], timestamp: String, nonce: String) -> Self {
        let payload_hash = sha256_hex(body);
        let canonical = format!("{timestamp}.{nonce}.{payload_hash}");
        let signature = secret.map(|s| hmac_sha256_hex(s, &canonical));

        Self {
            timestamp,
            nonce,
            payload_hash,
            canonical,
            signature,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sha256_hex_known_vectors() {
        assert_eq!(
            sha256_hex(b""),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
        assert_eq!(
            sha256_hex(b"abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn test_hmac_is_deterministic() {
        let a = hmac_sha256_hex("secret", "1700000000.nonce.hash");
        let b = hmac_sha256_hex("secret", "1700000000.nonce.hash");
        assert_eq!(a, b);
        assert_eq!(a.len(), 64);

        let other_key = hmac_sha256_hex("secret2", "1700000000.nonce.hash");
        assert_ne!(a, other_key);
    }

    #[test]
    fn test_proof_canonical_format() {
        let proof = AuthProof::new(
            Some("secret"),
            b"{\"text\":\"hi\"}",
            "1700000000000".to_string(),
            "nonce-1".to_string(),
        );

        assert_eq!(proof.payload_hash, sha256_hex(b"{\"text\":\"hi\"}"));
        assert_eq!(
            proof.canonical,
            format!("1700000000000.nonce-1.{}", proof.payload_hash)
        );
        assert_eq!(
            proof.signature.as_deref(),
            Some(hmac_sha256_hex("secret", &proof.canonical).as_str())
        );
    }

    #[test]
    fn test_proof_without_secret_has_no_signature() {
        let proof = AuthProof::new(None, b"{}", "1".to_string(), "n".to_string());
        assert!(proof.signature.is_none());
        assert!(!proof.payload_hash.is_empty());
        assert!(!proof.canonical.is_empty());
    }

    #[test]
    fn test_body_change_changes_hash() {
        let a = AuthProof::new(None, b"{\"text\":\"hi\"}", "1".to_string(), "n".to_string());
        let b = AuthProof::new(None, b"{\"text\":\"hj\"}", "1".to_string(), "n".to_string());
        assert_ne!(a.payload_hash, b.payload_hash);
    }
}
