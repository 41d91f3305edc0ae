//! Admin session tokens
//!
//! A token is `<expires_ms>.<signature>` where the signature is the
//! SHA-256 (64 hex chars) of the canonical claims string followed by the
//! server secret. Tokens carry no other state; the server keeps no session
//! table.
//!
//! # Pure Functions
//!
//! This module contains ONLY pure functions.
//! No HTTP framework dependencies (Axum, etc.) - those are in service code.

use sha2::{Digest, Sha256};

/// Admin tokens are valid for 24 hours
pub const TOKEN_TTL_MS: i64 = 24 * 60 * 60 * 1000;

// ========================================
// Error Types
// ========================================

/// Token verification failures
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AdminTokenError {
    /// Not of the form `<expires_ms>.<64 hex chars>`
    Malformed,

    /// Signature does not match the claims
    InvalidSignature,

    /// Signature is valid but the token is past its expiry
    Expired { expires_ms: i64, now_ms: i64 },
}

impl std::fmt::Display for AdminTokenError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AdminTokenError::Malformed => write!(f, "Malformed token"),
            AdminTokenError::InvalidSignature => write!(f, "Invalid token signature"),
            AdminTokenError::Expired { expires_ms, now_ms } => {
                write!(f, "Token expired {}ms ago", now_ms - expires_ms)
            }
        }
    }
}

impl std::error::Error for AdminTokenError {}

// ========================================
// Signing
// ========================================

/// Calculate the signature for a token expiring at `expires_ms`
///
/// # Algorithm
///
/// 1. Build canonical claims `role=admin;exp=<expires_ms>`
/// 2. Append the secret
/// 3. SHA-256 of the concatenation, as 64 hex characters
///
/// # Examples
///
/// ```
/// use requestline_common::api::auth::calculate_signature;
///
/// let signature = calculate_signature(1730000000000, "secret");
/// assert_eq!(signature.len(), 64);
/// ```
pub fn calculate_signature(expires_ms: i64, secret: &str) -> String {
    let to_hash = format!("role=admin;exp={}{}", expires_ms, secret);

    let mut hasher = Sha256::new();
    hasher.update(to_hash.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Compare two secrets without short-circuiting on the first mismatch
///
/// Both inputs are hashed first so the comparison time does not depend on
/// where they differ or on their lengths.
pub fn secrets_match(a: &str, b: &str) -> bool {
    let a = Sha256::digest(a.as_bytes());
    let b = Sha256::digest(b.as_bytes());
    a.iter().zip(b.iter()).fold(0u8, |diff, (x, y)| diff | (x ^ y)) == 0
}

/// Issue a token valid for `TOKEN_TTL_MS` from `now_ms`
pub fn issue_token(secret: &str, now_ms: i64) -> String {
    let expires_ms = now_ms + TOKEN_TTL_MS;
    format!("{}.{}", expires_ms, calculate_signature(expires_ms, secret))
}

/// Verify a token against the secret and the current time
///
/// # Examples
///
/// ```
/// use requestline_common::api::auth::{issue_token, verify_token};
///
/// let token = issue_token("secret", 1_000);
/// assert!(verify_token(&token, "secret", 2_000).is_ok());
/// assert!(verify_token(&token, "other", 2_000).is_err());
/// ```
pub fn verify_token(token: &str, secret: &str, now_ms: i64) -> Result<(), AdminTokenError> {
    let (expires, signature) = token.split_once('.').ok_or(AdminTokenError::Malformed)?;

    let expires_ms: i64 = expires.parse().map_err(|_| AdminTokenError::Malformed)?;
    if signature.len() != 64 || !signature.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(AdminTokenError::Malformed);
    }

    let calculated = calculate_signature(expires_ms, secret);
    if !secrets_match(&signature.to_ascii_lowercase(), &calculated) {
        return Err(AdminTokenError::InvalidSignature);
    }

    if now_ms >= expires_ms {
        return Err(AdminTokenError::Expired { expires_ms, now_ms });
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_secrets_match() {
        assert!(secrets_match("hunter2", "hunter2"));
        assert!(!secrets_match("hunter2", "hunter3"));
        assert!(!secrets_match("hunter2", "hunter22"));
        assert!(!secrets_match("", "x"));
    }

    #[test]
    fn test_uppercase_signature_accepted() {
        let token = issue_token("secret", 0).to_uppercase();
        assert!(verify_token(&token, "secret", 1).is_ok());
    }

    #[test]
    fn test_signature_is_deterministic() {
        assert_eq!(calculate_signature(42, "s"), calculate_signature(42, "s"));
        assert_ne!(calculate_signature(42, "s"), calculate_signature(43, "s"));
        assert_ne!(calculate_signature(42, "s"), calculate_signature(42, "t"));
    }

    #[test]
    fn test_token_valid_until_expiry() {
        let token = issue_token("secret", 0);
        assert!(verify_token(&token, "secret", TOKEN_TTL_MS - 1).is_ok());
        assert_eq!(
            verify_token(&token, "secret", TOKEN_TTL_MS),
            Err(AdminTokenError::Expired {
                expires_ms: TOKEN_TTL_MS,
                now_ms: TOKEN_TTL_MS
            })
        );
    }

    #[test]
    fn test_tampered_expiry_is_rejected() {
        let token = issue_token("secret", 0);
        let (_, signature) = token.split_once('.').unwrap();
        let forged = format!("{}.{}", i64::MAX, signature);
        assert_eq!(
            verify_token(&forged, "secret", 1),
            Err(AdminTokenError::InvalidSignature)
        );
    }

    #[test]
    fn test_malformed_tokens() {
        for token in ["", "abc", "123", "123.", "x.0000", "123.zz"] {
            assert_eq!(
                verify_token(token, "secret", 0),
                Err(AdminTokenError::Malformed),
                "token {:?}",
                token
            );
        }
    }
}
