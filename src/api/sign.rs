//! Signed-request headers for the Uplyfile API
//!
//! Every authenticated request carries the public key, an expiry timestamp,
//! and a hex SHA-256 signature of `secret_key + expiry`.

use chrono::Utc;
use sha2::{Digest, Sha256};

pub const PUBLIC_KEY_HEADER: &str = "Uply-Public-Key";
pub const EXPIRES_HEADER: &str = "Uply-Expires";
pub const SIGNATURE_HEADER: &str = "Uply-Signature";

/// Header set authenticating one request until `expires`.
#[derive(Debug, Clone)]
pub struct SignedHeaders {
    pub public_key: String,
    pub expires: String,
    pub signature: String,
}

impl SignedHeaders {
    /// Sign a request expiring `expiration_secs` from now.
    pub fn new(public_key: &str, secret_key: &str, expiration_secs: i64) -> Self {
        let now = Utc::now().timestamp_micros() as f64 / 1_000_000.0;
        let expires = format!("{:.6}", now + expiration_secs as f64);
        Self::at(public_key, secret_key, expires)
    }

    /// Sign a request with an explicit expiry timestamp string.
    pub fn at(public_key: &str, secret_key: &str, expires: String) -> Self {
        let signature = signature_for(secret_key, &expires);
        Self {
            public_key: public_key.to_string(),
            expires,
            signature,
        }
    }
}

/// Hex SHA-256 of `secret_key + expires`. This is the full auth scheme.
pub fn signature_for(secret_key: &str, expires: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(secret_key.as_bytes());
    hasher.update(expires.as_bytes());
    hex::encode(hasher.finalize())
}
