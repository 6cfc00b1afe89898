//! Slack request signature verification.
//!
//! Slack signs `v0:{timestamp}:{raw body}` with HMAC-SHA256 and sends
//! `v0={hex digest}` alongside the timestamp. A request verifies only if the
//! timestamp is within the tolerance of our clock and the signature matches.
//! Callers get a single `bool`; which check failed is not exposed.

use hmac::{Hmac, Mac};
use sha2::Sha256;
use subtle::ConstantTimeEq;

use crate::security::unix_secs;

pub const SIGNATURE_HEADER: &str = "x-slack-signature";
pub const TIMESTAMP_HEADER: &str = "x-slack-request-timestamp";

/// Five minutes, both directions.
pub const DEFAULT_TOLERANCE_SECS: u64 = 300;

const VERSION: &str = "v0";

type HmacSha256 = Hmac<Sha256>;

/// Compute the `v0=` signature for `body` sent at `timestamp`.
pub fn sign(secret: &str, timestamp: &str, body: &[u8]) -> String {
    let mut mac =
        HmacSha256::new_from_slice(secret.as_bytes()).expect("HMAC accepts keys of any length");
    mac.update(VERSION.as_bytes());
    mac.update(b":");
    mac.update(timestamp.as_bytes());
    mac.update(b":");
    mac.update(body);
    format!("{VERSION}={}", hex::encode(mac.finalize().into_bytes()))
}

#[derive(Clone)]
pub struct SignatureVerifier {
    secret: Option<String>,
    tolerance_secs: u64,
}

impl std::fmt::Debug for SignatureVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SignatureVerifier")
            .field("secret", &self.secret.as_ref().map(|_| "<redacted>"))
            .field("tolerance_secs", &self.tolerance_secs)
            .finish()
    }
}

impl SignatureVerifier {
    /// An empty secret is treated as missing, so every request fails.
    pub fn new(secret: Option<String>, tolerance_secs: u64) -> Self {
        Self {
            secret: secret.filter(|s| !s.is_empty()),
            tolerance_secs,
        }
    }

    pub fn has_secret(&self) -> bool {
        self.secret.is_some()
    }

    pub fn verify(&self, signature: Option<&str>, timestamp: Option<&str>, body: &[u8]) -> bool {
        self.verify_at(signature, timestamp, body, unix_secs())
    }

    /// Same as [`verify`](Self::verify) with an explicit clock, in epoch seconds.
    pub fn verify_at(
        &self,
        signature: Option<&str>,
        timestamp: Option<&str>,
        body: &[u8],
        now: u64,
    ) -> bool {
        let (Some(signature), Some(timestamp), Some(secret)) = (
            signature.filter(|s| !s.is_empty()),
            timestamp.filter(|t| !t.is_empty()),
            self.secret.as_deref(),
        ) else {
            return false;
        };

        let Ok(sent_at) = timestamp.trim().parse::<i64>() else {
            return false;
        };
        let skew = i128::from(now).abs_diff(i128::from(sent_at));
        if skew > u128::from(self.tolerance_secs) {
            return false;
        }

        let expected = sign(secret, timestamp, body);
        signature.as_bytes().ct_eq(expected.as_bytes()).into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "test-signing-secret";
    const NOW: u64 = 1_700_000_000;
    const BODY: &[u8] = b"token=x&command=%2Fincident&text=start+SEV-1+Database+down";

    fn verifier() -> SignatureVerifier {
        SignatureVerifier::new(Some(SECRET.to_string()), DEFAULT_TOLERANCE_SECS)
    }

    #[test]
    fn test_valid_signature() {
        let ts = NOW.to_string();
        let sig = sign(SECRET, &ts, BODY);
        assert!(sig.starts_with("v0="));
        assert_eq!(sig.len(), 3 + 64);
        assert!(verifier().verify_at(Some(&sig), Some(&ts), BODY, NOW));
    }

    #[test]
    fn test_known_vector() {
        // Example from Slack's request verification documentation.
        let secret = "8f742231b10e8888abcd99yyyzzz85a5";
        let ts = "1531420618";
        let body = b"token=xyzz0WbapA4vBCDEFasx0q6G&team_id=T1DC2JH3J&team_domain=testteamnow&channel_id=G8PSS9T3V&channel_name=foobar&user_id=U2CERLKJA&user_name=roadrunner&command=%2Fwebhook-collect&text=&response_url=https%3A%2F%2Fhooks.slack.com%2Fcommands%2FT1DC2JH3J%2F397700885554%2F96rGlfmibIGlgcZRskXaIFfN&trigger_id=398738663015.47445629121.803a0bc887a14d10d2c447fce8b6703c";
        assert_eq!(
            sign(secret, ts, body),
            "v0=a2114d57b48eac39b9ad189dd8316235a7b4a8d21a10bd27519666489c69b503"
        );
    }

    #[test]
    fn test_replayed_timestamp_rejected() {
        let old = (NOW - 600).to_string();
        let sig = sign(SECRET, &old, BODY);
        assert!(!verifier().verify_at(Some(&sig), Some(&old), BODY, NOW));
        assert!(!verifier().verify_at(Some(&sig), Some(&old), b"other", NOW));
    }

    #[test]
    fn test_future_timestamp_rejected() {
        let future = (NOW + 301).to_string();
        let sig = sign(SECRET, &future, BODY);
        assert!(!verifier().verify_at(Some(&sig), Some(&future), BODY, NOW));

        let edge = (NOW + 300).to_string();
        let sig = sign(SECRET, &edge, BODY);
        assert!(verifier().verify_at(Some(&sig), Some(&edge), BODY, NOW));
    }

    #[test]
    fn test_single_byte_mutation_rejected() {
        let ts = NOW.to_string();
        let sig = sign(SECRET, &ts, BODY);

        for i in 0..sig.len() {
            let mut bytes = sig.clone().into_bytes();
            bytes[i] = if bytes[i] == b'0' { b'1' } else { b'0' };
            let mutated = String::from_utf8(bytes).unwrap();
            assert!(!verifier().verify_at(Some(&mutated), Some(&ts), BODY, NOW), "byte {i}");
        }
    }

    #[test]
    fn test_body_tampering_rejected() {
        let ts = NOW.to_string();
        let sig = sign(SECRET, &ts, BODY);
        assert!(!verifier().verify_at(Some(&sig), Some(&ts), b"token=x&text=resolve+1", NOW));
    }

    #[test]
    fn test_missing_inputs_rejected() {
        let ts = NOW.to_string();
        let sig = sign(SECRET, &ts, BODY);

        assert!(!verifier().verify_at(None, Some(&ts), BODY, NOW));
        assert!(!verifier().verify_at(Some(&sig), None, BODY, NOW));
        assert!(!verifier().verify_at(Some(""), Some(&ts), BODY, NOW));

        let no_secret = SignatureVerifier::new(Some(String::new()), DEFAULT_TOLERANCE_SECS);
        assert!(!no_secret.has_secret());
        assert!(!no_secret.verify_at(Some(&sig), Some(&ts), BODY, NOW));
    }

    #[test]
    fn test_wrong_secret_and_length_mismatch() {
        let ts = NOW.to_string();
        let sig = sign("another-secret", &ts, BODY);
        assert!(!verifier().verify_at(Some(&sig), Some(&ts), BODY, NOW));

        let truncated = &sign(SECRET, &ts, BODY)[..40];
        assert!(!verifier().verify_at(Some(truncated), Some(&ts), BODY, NOW));
        assert!(!verifier().verify_at(Some("v0="), Some(&ts), BODY, NOW));
    }

    #[test]
    fn test_unparseable_timestamp_rejected() {
        let ts = "12abc";
        let sig = sign(SECRET, ts, BODY);
        assert!(!verifier().verify_at(Some(&sig), Some(ts), BODY, NOW));
    }

    #[test]
    fn test_debug_redacts_secret() {
        let rendered = format!("{:?}", verifier());
        assert!(!rendered.contains(SECRET));
    }
}
