//! Password hashing and bearer-token helpers.
//!
//! Tokens are opaque random values stored server-side; passwords are salted
//! SHA-256 digests.

use sha2::{Digest, Sha256};
use uuid::Uuid;

pub fn generate_salt() -> String {
    Uuid::new_v4().simple().to_string()
}

pub fn generate_token() -> String {
    Uuid::new_v4().simple().to_string()
}

pub fn hash_password(password: &str, salt: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(salt.as_bytes());
    hasher.update(password.as_bytes());
    format!("{:x}", hasher.finalize())
}

pub fn verify_password(password: &str, salt: &str, expected_hash: &str) -> bool {
    hash_password(password, salt) == expected_hash
}

/// Extract the token from an `Authorization: Bearer <token>` header value.
pub fn bearer_token(header: Option<&str>) -> Option<&str> {
    header
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_is_stable_and_salted() {
        let hash = hash_password("secret", "salt-a");
        assert_eq!(hash, hash_password("secret", "salt-a"));
        assert_ne!(hash, hash_password("secret", "salt-b"));
        assert_ne!(hash, hash_password("other", "salt-a"));
    }

    #[test]
    fn test_verify_password() {
        let salt = generate_salt();
        let hash = hash_password("hunter2", &salt);

        assert!(verify_password("hunter2", &salt, &hash));
        assert!(!verify_password("hunter3", &salt, &hash));
    }

    #[test]
    fn test_generated_tokens_are_unique() {
        assert_ne!(generate_token(), generate_token());
    }

    #[test]
    fn test_bearer_token_parsing() {
        assert_eq!(bearer_token(Some("Bearer abc123")), Some("abc123"));
        assert_eq!(bearer_token(Some("Bearer   abc123  ")), Some("abc123"));
        assert_eq!(bearer_token(Some("Basic abc123")), None);
        assert_eq!(bearer_token(Some("Bearer ")), None);
        assert_eq!(bearer_token(None), None);
    }
}
