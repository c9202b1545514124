//! Bearer token helpers
//!
//! Tokens are handed to an actor once, at registration. Only the SHA-256 of
//! the token is persisted, so a leaked database does not leak credentials.
//!
//! Pure functions only; the axum extractor lives in the service crate.

use rand::Rng;
use sha2::{Digest, Sha256};

/// Token length in bytes before hex encoding
const TOKEN_BYTES: usize = 32;

/// Generate a random bearer token (64 hex characters)
///
/// # Examples
///
/// ```
/// use spotter_common::token::generate_token;
///
/// let token = generate_token();
/// assert_eq!(token.len(), 64);
/// assert_ne!(token, generate_token());
/// ```
pub fn generate_token() -> String {
    let mut rng = rand::thread_rng();
    let bytes: [u8; TOKEN_BYTES] = rng.gen();
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}

/// SHA-256 of a token as 64 lowercase hex characters
///
/// # Examples
///
/// ```
/// use spotter_common::token::hash_token;
///
/// let hash = hash_token("secret-token");
/// assert_eq!(hash.len(), 64);
/// assert_eq!(hash, hash_token("secret-token"));
/// ```
pub fn hash_token(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Extract the token from an `Authorization` header value
///
/// Accepts `Bearer <token>` with any casing of the scheme. Returns `None`
/// for other schemes or an empty token.
pub fn parse_bearer(header_value: &str) -> Option<&str> {
    let (scheme, token) = header_value.trim().split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    let token = token.trim();
    (!token.is_empty()).then_some(token)
}
