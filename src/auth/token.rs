/// Opaque Token Management
///
/// Remember-me and activation tokens are:
/// - 32 random bytes from the OS-seeded CSPRNG, URL-safe base64 without padding
/// - Shown to their holder exactly once, as a `PlainToken`
/// - Stored only as a digest (bcrypt through the password vault, or SHA-256)

use std::fmt;

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use rand::rngs::OsRng;
use rand::RngCore;
use serde::Deserialize;
use sha2::{Digest, Sha256};

use crate::auth::password::PasswordVault;
use crate::error::VaultError;

const TOKEN_BYTES: usize = 32;

/// A plaintext token on its way to a cookie or an outbound message
///
/// Never persisted, and redacted from `Debug` output so it cannot leak into logs.
#[derive(Clone, PartialEq, Eq)]
pub struct PlainToken(String);

impl PlainToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for PlainToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("PlainToken(<redacted>)")
    }
}

/// Freshly issued token with the digest to persist
#[derive(Debug)]
pub struct IssuedToken {
    pub token: PlainToken,
    pub digest: String,
}

/// How token digests are computed at rest
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DigestScheme {
    /// Salted bcrypt digest through the password vault.
    #[default]
    Bcrypt,
    /// Unsalted SHA-256 hex digest. Token entropy alone resists brute force.
    Sha256,
}

#[derive(Debug, Clone)]
pub struct TokenIssuer {
    scheme: DigestScheme,
    vault: PasswordVault,
}

impl TokenIssuer {
    pub fn new(scheme: DigestScheme, vault: PasswordVault) -> Self {
        Self { scheme, vault }
    }

    pub fn scheme(&self) -> DigestScheme {
        self.scheme
    }

    /// Generate a new token and its digest
    pub fn issue(&self) -> Result<IssuedToken, VaultError> {
        let token = generate_token();
        let digest = self.digest(&token)?;

        Ok(IssuedToken {
            token: PlainToken(token),
            digest,
        })
    }

    /// Check a presented token against a stored digest
    ///
    /// An absent digest means no token is outstanding, so nothing matches it.
    /// An unreadable digest never matches either.
    pub fn matches(&self, token: &str, digest: Option<&str>) -> bool {
        let Some(digest) = digest else {
            return false;
        };

        if token.is_empty() {
            return false;
        }

        match self.scheme {
            DigestScheme::Bcrypt => match self.vault.verify(token, digest) {
                Ok(matched) => matched,
                Err(e) => {
                    tracing::warn!(error = %e, "Stored token digest is unreadable");
                    false
                }
            },
            DigestScheme::Sha256 => {
                constant_time_eq(sha256_hex(token).as_bytes(), digest.as_bytes())
            }
        }
    }

    fn digest(&self, token: &str) -> Result<String, VaultError> {
        match self.scheme {
            DigestScheme::Bcrypt => self.vault.hash(token),
            DigestScheme::Sha256 => Ok(sha256_hex(token)),
        }
    }
}

fn generate_token() -> String {
    let mut bytes = [0u8; TOKEN_BYTES];
    OsRng.fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

fn sha256_hex(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    format!("{:x}", hasher.finalize())
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut diff = 0u8;
    for (x, y) in a.iter().zip(b.iter()) {
        diff |= x ^ y;
    }
    diff == 0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::password::Cost;

    fn issuer(scheme: DigestScheme) -> TokenIssuer {
        TokenIssuer::new(scheme, PasswordVault::new(Cost::TEST))
    }

    #[test]
    fn test_generate_token() {
        let token = generate_token();

        // 32 bytes -> 43 base64 characters without padding
        assert_eq!(token.len(), 43);
        assert!(token
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'));
    }

    #[test]
    fn test_tokens_are_unique() {
        assert_ne!(generate_token(), generate_token());
    }

    #[test]
    fn test_issued_token_matches_its_digest() {
        for scheme in [DigestScheme::Bcrypt, DigestScheme::Sha256] {
            let issuer = issuer(scheme);
            let issued = issuer.issue().unwrap();

            assert_ne!(issued.token.expose(), issued.digest);
            assert!(issuer.matches(issued.token.expose(), Some(&issued.digest)));
        }
    }

    #[test]
    fn test_other_token_does_not_match() {
        for scheme in [DigestScheme::Bcrypt, DigestScheme::Sha256] {
            let issuer = issuer(scheme);
            let first = issuer.issue().unwrap();
            let second = issuer.issue().unwrap();

            assert!(!issuer.matches(second.token.expose(), Some(&first.digest)));
        }
    }

    #[test]
    fn test_absent_digest_never_matches() {
        for scheme in [DigestScheme::Bcrypt, DigestScheme::Sha256] {
            let issuer = issuer(scheme);
            let issued = issuer.issue().unwrap();

            assert!(!issuer.matches(issued.token.expose(), None));
            assert!(!issuer.matches("", None));
        }
    }

    #[test]
    fn test_empty_token_never_matches() {
        let issuer = issuer(DigestScheme::Sha256);
        let empty_digest = sha256_hex("");

        assert!(!issuer.matches("", Some(&empty_digest)));
    }

    #[test]
    fn test_unreadable_digest_does_not_match() {
        let issuer = issuer(DigestScheme::Bcrypt);
        assert!(!issuer.matches("some-token", Some("garbage")));
    }

    #[test]
    fn test_sha256_digest_is_deterministic() {
        let token = generate_token();
        assert_eq!(sha256_hex(&token), sha256_hex(&token));
        assert_eq!(sha256_hex(&token).len(), 64);
    }

    #[test]
    fn test_plain_token_debug_is_redacted() {
        let token = PlainToken::new("super-secret");
        assert_eq!(format!("{:?}", token), "PlainToken(<redacted>)");
        assert_eq!(token.expose(), "super-secret");
    }

    #[test]
    fn test_constant_time_eq_on_digests() {
        let digest = sha256_hex("token-a");

        assert!(constant_time_eq(digest.as_bytes(), sha256_hex("token-a").as_bytes()));
        assert!(!constant_time_eq(digest.as_bytes(), sha256_hex("token-b").as_bytes()));
        // truncated digest has a different length
        assert!(!constant_time_eq(digest.as_bytes(), digest[..32].as_bytes()));
    }
}
