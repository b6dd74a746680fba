//! HMAC-SHA256 request signing.

use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Sign a message with the account secret, hex-encoded lowercase.
pub fn hmac_sha256(secret_key: &str, message: &str) -> String {
    let mut mac = HmacSha256::new_from_slice(secret_key.as_bytes())
        .expect("HMAC accepts keys of any length");
    mac.update(message.as_bytes());
    hex::encode(mac.finalize().into_bytes())
}

/// Append the signature parameter to an assembled query string.
pub fn sign_query(secret_key: &str, query: &str) -> String {
    let signature = hmac_sha256(secret_key, query);
    format!("{query}&signature={signature}")
}
