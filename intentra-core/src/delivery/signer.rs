//! HMAC request signing for the self-hosted server
//!
//! The signature covers `<unix timestamp>.<body>` so a captured request cannot
//! be replayed with a different payload or, server-side, outside its window.

use hmac::{Hmac, Mac};
use sha2::Sha256;

pub const KEY_ID_HEADER: &str = "X-Intentra-Key-Id";
pub const TIMESTAMP_HEADER: &str = "X-Intentra-Timestamp";
pub const SIGNATURE_HEADER: &str = "X-Intentra-Signature";

type HmacSha256 = Hmac<Sha256>;

/// Header values for one signed request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignatureHeaders {
    pub key_id: String,
    pub timestamp: String,
    pub signature: String,
}

impl SignatureHeaders {
    pub fn pairs(&self) -> [(&'static str, &str); 3] {
        [
            (KEY_ID_HEADER, self.key_id.as_str()),
            (TIMESTAMP_HEADER, self.timestamp.as_str()),
            (SIGNATURE_HEADER, self.signature.as_str()),
        ]
    }
}

#[derive(Clone)]
pub struct HmacSigner {
    key_id: String,
    secret: String,
}

impl std::fmt::Debug for HmacSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HmacSigner")
            .field("key_id", &self.key_id)
            .field("secret", &"<redacted>")
            .finish()
    }
}

impl HmacSigner {
    pub fn new(key_id: impl Into<String>, secret: impl Into<String>) -> Self {
        Self {
            key_id: key_id.into(),
            secret: secret.into(),
        }
    }

    /// Sign `body` at the current time.
    pub fn sign(&self, body: &[u8]) -> SignatureHeaders {
        self.sign_at(body, chrono::Utc::now().timestamp())
    }

    pub fn sign_at(&self, body: &[u8], timestamp: i64) -> SignatureHeaders {
        let timestamp = timestamp.to_string();
        let mut message = Vec::with_capacity(timestamp.len() + 1 + body.len());
        message.extend_from_slice(timestamp.as_bytes());
        message.push(b'.');
        message.extend_from_slice(body);

        SignatureHeaders {
            key_id: self.key_id.clone(),
            signature: hmac_sha256_hex(self.secret.as_bytes(), &message),
            timestamp,
        }
    }
}

pub fn hmac_sha256_hex(key: &[u8], message: &[u8]) -> String {
    let mut mac = match HmacSha256::new_from_slice(key) {
        Ok(mac) => mac,
        Err(_) => unreachable!("HMAC accepts keys of any length"),
    };
    mac.update(message);
    hex::encode(mac.finalize().into_bytes())
}
