/// Account Service
///
/// Wires `Account` to its two collaborators: the account store and the
/// activation notifier. Sign-up, log-in, remember-me and activation flows
/// live here so that callers never handle digests directly.

use std::sync::OnceLock;

use uuid::Uuid;

use crate::account::{Account, TokenKind};
use crate::auth::{PasswordVault, PlainToken, TokenIssuer};
use crate::error::{AccountError, AppError, ErrorContext, StoreError};
use crate::notify::ActivationNotifier;
use crate::store::AccountStore;

/// Result of a password log-in attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoginOutcome {
    Authenticated(Account),
    /// Correct password, but the email address was never confirmed.
    NotActivated,
    /// Unknown email or wrong password. Both run one bcrypt verification.
    InvalidCredentials,
}

/// Result of following an activation link
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActivationOutcome {
    Activated(Account),
    AlreadyActive,
    InvalidLink,
}

pub struct AccountService<S, N> {
    store: S,
    notifier: N,
    vault: PasswordVault,
    issuer: TokenIssuer,
    /// Digest verified against on unknown-email log-ins, so both failure paths cost one bcrypt run.
    dummy_digest: OnceLock<Option<String>>,
}

impl<S, N> AccountService<S, N>
where
    S: AccountStore,
    N: ActivationNotifier,
{
    pub fn new(store: S, notifier: N, vault: PasswordVault, issuer: TokenIssuer) -> Self {
        Self {
            store,
            notifier,
            vault,
            issuer,
            dummy_digest: OnceLock::new(),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn notifier(&self) -> &N {
        &self.notifier
    }

    /// Register a pending account and send its activation token
    ///
    /// # Errors
    /// - Validation errors for a malformed email or password
    /// - `DuplicateEmail` if the address is already registered
    /// - Notifier errors; the account stays stored and pending
    pub fn sign_up(&self, email: &str, password: &str) -> Result<Account, AppError> {
        let context = ErrorContext::new("sign_up");

        let (account, activation_token) =
            Account::register(email, password, &self.vault, &self.issuer).map_err(|e| {
                context.log_error(&e);
                e
            })?;
        let context = context.with_account_id(account.id());

        self.store.insert(&account).map_err(|e| {
            let e = AppError::from(e);
            context.log_error(&e);
            e
        })?;

        self.notifier
            .deliver(account.email(), &activation_token)
            .map_err(|e| {
                let e = AppError::from(e);
                context.log_error(&e);
                e
            })?;

        tracing::info!(
            request_id = %context.request_id,
            account_id = %account.id(),
            "Account registered"
        );

        Ok(account)
    }

    /// Check an email and password pair
    pub fn log_in(&self, email: &str, password: &str) -> Result<LoginOutcome, AppError> {
        let Some(account) = self.store.find_by_email(email)? else {
            tracing::warn!("Log-in attempt for unknown email");
            self.burn_verification(password);
            return Ok(LoginOutcome::InvalidCredentials);
        };

        let matched = account
            .authenticate_password(password, &self.vault)
            .map_err(|e| {
                let e = AppError::from(e);
                ErrorContext::new("log_in")
                    .with_account_id(account.id())
                    .log_error(&e);
                e
            })?;

        if !matched {
            tracing::warn!(account_id = %account.id(), "Invalid password");
            return Ok(LoginOutcome::InvalidCredentials);
        }

        if !account.activated() {
            tracing::info!(account_id = %account.id(), "Log-in refused for pending account");
            return Ok(LoginOutcome::NotActivated);
        }

        tracing::info!(account_id = %account.id(), "Account logged in");
        Ok(LoginOutcome::Authenticated(account))
    }

    /// Issue a fresh remember-me token for the account
    pub fn remember(&self, id: Uuid) -> Result<PlainToken, AppError> {
        let mut account = self.load(id)?;
        let token = account.remember(&self.issuer)?;
        self.store.update(&account)?;

        tracing::info!(account_id = %id, "Remember-me token issued");
        Ok(token)
    }

    /// Invalidate the account's remember-me token
    pub fn forget(&self, id: Uuid) -> Result<(), AppError> {
        let mut account = self.load(id)?;
        account.forget();
        self.store.update(&account)?;

        tracing::info!(account_id = %id, "Remember-me token cleared");
        Ok(())
    }

    /// Resolve a remember-me cookie pair to its account
    pub fn recall(&self, id: Uuid, token: &str) -> Result<Option<Account>, AppError> {
        let Some(account) = self.store.find(id)? else {
            return Ok(None);
        };

        if account.authenticate_remember(token, &self.issuer) {
            Ok(Some(account))
        } else {
            tracing::warn!(account_id = %id, "Remember-me token rejected");
            Ok(None)
        }
    }

    /// Activate the account an activation link was sent to
    pub fn activate(&self, email: &str, token: &str) -> Result<ActivationOutcome, AppError> {
        let Some(mut account) = self.store.find_by_email(email)? else {
            return Ok(ActivationOutcome::InvalidLink);
        };

        if !account.authenticate(TokenKind::Activation, token, &self.issuer) {
            tracing::warn!(account_id = %account.id(), "Activation token rejected");
            return Ok(ActivationOutcome::InvalidLink);
        }

        match account.activate() {
            Ok(at) => {
                self.store.update(&account)?;
                tracing::info!(account_id = %account.id(), activated_at = %at, "Account activated");
                Ok(ActivationOutcome::Activated(account))
            }
            Err(AccountError::AlreadyActivated) => Ok(ActivationOutcome::AlreadyActive),
        }
    }

    fn burn_verification(&self, password: &str) {
        let digest = self
            .dummy_digest
            .get_or_init(|| self.vault.hash("unknown-account").ok());
        if let Some(digest) = digest {
            let _ = self.vault.verify(password, digest);
        }
    }

    fn load(&self, id: Uuid) -> Result<Account, AppError> {
        self.store
            .find(id)?
            .ok_or_else(|| AppError::Store(StoreError::NotFound(format!("account {}", id))))
    }
}
