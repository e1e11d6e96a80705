/// Account entity
///
/// Holds the persisted digests of one user and exposes the identity
/// operations in terms of `PasswordVault` and `TokenIssuer`. Plaintext
/// passwords and tokens pass through these methods and are never kept.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::auth::{PasswordVault, PlainToken, TokenIssuer};
use crate::error::{AccountError, AppError, VaultError};
use crate::validators::{normalize_email, validate_password};

/// Which stored token digest a presented token is checked against
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Remember,
    Activation,
}

/// Activation state. `Active` carries its timestamp, so one cannot be set without the other.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum Activation {
    Pending,
    Active { at: DateTime<Utc> },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    id: Uuid,
    email: String,
    password_digest: String,
    remember_digest: Option<String>,
    activation_digest: String,
    activation: Activation,
    created_at: DateTime<Utc>,
}

impl Account {
    /// Create a pending account
    ///
    /// Returns the account together with the plaintext activation token. The
    /// caller hands the token to the notifier once; only its digest is kept.
    pub fn register(
        email: &str,
        password: &str,
        vault: &PasswordVault,
        issuer: &TokenIssuer,
    ) -> Result<(Account, PlainToken), AppError> {
        let email = normalize_email(email)?;
        validate_password(password)?;

        let password_digest = vault.hash(password)?;
        let activation = issuer.issue()?;

        let account = Account {
            id: Uuid::new_v4(),
            email,
            password_digest,
            remember_digest: None,
            activation_digest: activation.digest,
            activation: Activation::Pending,
            created_at: Utc::now(),
        };

        Ok((account, activation.token))
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn email(&self) -> &str {
        &self.email
    }

    pub fn password_digest(&self) -> &str {
        &self.password_digest
    }

    pub fn remember_digest(&self) -> Option<&str> {
        self.remember_digest.as_deref()
    }

    pub fn activation_digest(&self) -> &str {
        &self.activation_digest
    }

    pub fn activation(&self) -> Activation {
        self.activation
    }

    pub fn activated(&self) -> bool {
        matches!(self.activation, Activation::Active { .. })
    }

    pub fn activated_at(&self) -> Option<DateTime<Utc>> {
        match self.activation {
            Activation::Pending => None,
            Activation::Active { at } => Some(at),
        }
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Same stored identity, regardless of field values loaded at different times.
    pub fn is_same_account(&self, other: &Account) -> bool {
        self.id == other.id
    }

    /// Issue a remember-me token, replacing any previous one
    pub fn remember(&mut self, issuer: &TokenIssuer) -> Result<PlainToken, VaultError> {
        let issued = issuer.issue()?;
        self.remember_digest = Some(issued.digest);
        Ok(issued.token)
    }

    /// Invalidate the outstanding remember-me token, if any
    pub fn forget(&mut self) {
        self.remember_digest = None;
    }

    pub fn authenticate(&self, kind: TokenKind, token: &str, issuer: &TokenIssuer) -> bool {
        let digest = match kind {
            TokenKind::Remember => self.remember_digest.as_deref(),
            TokenKind::Activation => Some(self.activation_digest.as_str()),
        };
        issuer.matches(token, digest)
    }

    pub fn authenticate_remember(&self, token: &str, issuer: &TokenIssuer) -> bool {
        self.authenticate(TokenKind::Remember, token, issuer)
    }

    /// Check a password against the stored digest
    ///
    /// # Errors
    /// Only when the stored digest is not a vault digest.
    pub fn authenticate_password(
        &self,
        password: &str,
        vault: &PasswordVault,
    ) -> Result<bool, VaultError> {
        vault.verify(password, &self.password_digest)
    }

    /// Move from `Pending` to `Active`
    ///
    /// A second call fails with `AlreadyActivated` and leaves the original
    /// activation time in place.
    pub fn activate(&mut self) -> Result<DateTime<Utc>, AccountError> {
        match self.activation {
            Activation::Active { .. } => Err(AccountError::AlreadyActivated),
            Activation::Pending => {
                let at = Utc::now();
                self.activation = Activation::Active { at };
                Ok(at)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{Cost, DigestScheme};
    use crate::error::ValidationError;

    fn tools() -> (PasswordVault, TokenIssuer) {
        let vault = PasswordVault::new(Cost::TEST);
        let issuer = TokenIssuer::new(DigestScheme::Bcrypt, vault.clone());
        (vault, issuer)
    }

    fn registered() -> (Account, PlainToken, PasswordVault, TokenIssuer) {
        let (vault, issuer) = tools();
        let (account, token) =
            Account::register("a@B.COM", "secret1", &vault, &issuer).expect("register");
        (account, token, vault, issuer)
    }

    #[test]
    fn test_register_normalizes_and_hashes() {
        let (account, _, vault, _) = registered();

        assert_eq!(account.email(), "a@b.com");
        assert_ne!(account.password_digest(), "secret1");
        assert!(account.authenticate_password("secret1", &vault).unwrap());
        assert!(!account.authenticate_password("wrong", &vault).unwrap());
        assert!(!account.activated());
        assert!(account.activated_at().is_none());
        assert!(account.remember_digest().is_none());
    }

    #[test]
    fn test_register_rejects_bad_input() {
        let (vault, issuer) = tools();

        let err = Account::register("a@b.com", "", &vault, &issuer).unwrap_err();
        assert_eq!(
            err,
            AppError::Validation(ValidationError::EmptyField("password".to_string()))
        );

        let err = Account::register("not-an-email", "secret1", &vault, &issuer).unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[test]
    fn test_activation_token_authenticates() {
        let (account, token, _, issuer) = registered();

        assert_ne!(account.activation_digest(), token.expose());
        assert!(account.authenticate(TokenKind::Activation, token.expose(), &issuer));
        assert!(!account.authenticate(TokenKind::Activation, "wrong", &issuer));
        // activation token is not a remember token
        assert!(!account.authenticate(TokenKind::Remember, token.expose(), &issuer));
    }

    #[test]
    fn test_remember_then_authenticate() {
        let (mut account, _, _, issuer) = registered();

        let token = account.remember(&issuer).unwrap();
        assert!(account.remember_digest().is_some());
        assert!(account.authenticate_remember(token.expose(), &issuer));
    }

    #[test]
    fn test_second_remember_invalidates_first() {
        let (mut account, _, _, issuer) = registered();

        let first = account.remember(&issuer).unwrap();
        let second = account.remember(&issuer).unwrap();

        assert!(!account.authenticate_remember(first.expose(), &issuer));
        assert!(account.authenticate_remember(second.expose(), &issuer));
    }

    #[test]
    fn test_forget_invalidates_token() {
        let (mut account, _, _, issuer) = registered();

        let token = account.remember(&issuer).unwrap();
        account.forget();

        assert!(account.remember_digest().is_none());
        assert!(!account.authenticate_remember(token.expose(), &issuer));
        assert!(!account.authenticate_remember("", &issuer));
    }

    #[test]
    fn test_activate_once() {
        let (mut account, _, _, _) = registered();

        let at = account.activate().unwrap();
        assert!(account.activated());
        assert_eq!(account.activated_at(), Some(at));

        assert_eq!(account.activate(), Err(AccountError::AlreadyActivated));
        assert_eq!(account.activated_at(), Some(at));
    }

    #[test]
    fn test_is_same_account() {
        let (account, _, vault, issuer) = registered();
        let (other, _) = Account::register("b@b.com", "secret1", &vault, &issuer).unwrap();

        let mut reloaded = account.clone();
        reloaded.forget();

        assert!(account.is_same_account(&reloaded));
        assert!(!account.is_same_account(&other));
    }

    #[test]
    fn test_serialized_account_holds_no_plaintext() {
        let (vault, issuer) = tools();
        let (mut account, activation) =
            Account::register("a@b.com", "secret1", &vault, &issuer).unwrap();
        let remember = account.remember(&issuer).unwrap();
        account.activate().unwrap();

        let json = serde_json::to_string(&account).unwrap();
        assert!(!json.contains("secret1"));
        assert!(!json.contains(activation.expose()));
        assert!(!json.contains(remember.expose()));

        let restored: Account = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, account);
        assert!(restored.activated());
    }
}
