/// Error Handling Module
///
/// Unified error types for the identity core:
/// 1. Domain-specific error types (validation, vault, account, store, notifier, config)
/// 2. A single `AppError` that every operation maps to
/// 3. Defect classification for integration errors
/// 4. Structured error logging with context
///
/// Authentication mismatches are not represented here: they are plain `false`
/// values or outcome enums, never errors.

use std::error::Error as StdError;
use std::fmt;

/// ============================================================================
/// 1. DOMAIN-SPECIFIC ERROR TYPES
/// ============================================================================

/// Validation errors for user-supplied input
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    EmptyField(String),
    TooShort(String, usize),
    TooLong(String, usize),
    InvalidFormat(String),
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::EmptyField(field) => write!(f, "{} is empty", field),
            ValidationError::TooShort(field, min) => {
                write!(f, "{} is too short (minimum {} characters)", field, min)
            }
            ValidationError::TooLong(field, max) => {
                write!(f, "{} is too long (maximum {} characters)", field, max)
            }
            ValidationError::InvalidFormat(field) => write!(f, "{} has invalid format", field),
        }
    }
}

impl StdError for ValidationError {}

/// Password vault errors
///
/// `InvalidInput` and `MalformedDigest` mean the vault was handed data it never
/// produced or can never accept. Callers treat them as defects.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VaultError {
    InvalidInput(String),
    MalformedDigest,
    HashFailed(String),
}

impl fmt::Display for VaultError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VaultError::InvalidInput(msg) => write!(f, "Invalid vault input: {}", msg),
            VaultError::MalformedDigest => write!(f, "Digest was not produced by this vault"),
            VaultError::HashFailed(msg) => write!(f, "Password hashing failed: {}", msg),
        }
    }
}

impl StdError for VaultError {}

/// Account state errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccountError {
    AlreadyActivated,
}

impl fmt::Display for AccountError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AccountError::AlreadyActivated => write!(f, "Account is already activated"),
        }
    }
}

impl StdError for AccountError {}

/// Persistence collaborator errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    DuplicateEmail(String),
    NotFound(String),
    Unavailable(String),
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreError::DuplicateEmail(email) => write!(f, "Email already registered: {}", email),
            StoreError::NotFound(what) => write!(f, "Not found: {}", what),
            StoreError::Unavailable(msg) => write!(f, "Account store unavailable: {}", msg),
        }
    }
}

impl StdError for StoreError {}

/// Notification collaborator errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotifyError {
    DeliveryFailed(String),
    InvalidRecipient(String),
}

impl fmt::Display for NotifyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NotifyError::DeliveryFailed(msg) => write!(f, "Failed to deliver notification: {}", msg),
            NotifyError::InvalidRecipient(msg) => write!(f, "Invalid recipient: {}", msg),
        }
    }
}

impl StdError for NotifyError {}

/// Configuration errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    InvalidValue(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidValue(msg) => write!(f, "Invalid config value: {}", msg),
        }
    }
}

impl StdError for ConfigError {}

/// ============================================================================
/// 2. UNIFIED APPLICATION ERROR TYPE
/// ============================================================================

/// Central error type that all identity-core errors map to
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppError {
    Validation(ValidationError),
    Vault(VaultError),
    Account(AccountError),
    Store(StoreError),
    Notify(NotifyError),
    Config(ConfigError),
}

impl AppError {
    /// True for errors that indicate an integration defect rather than bad user input.
    pub fn is_defect(&self) -> bool {
        matches!(
            self,
            AppError::Vault(VaultError::InvalidInput(_)) | AppError::Vault(VaultError::MalformedDigest)
        )
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Validation(e) => write!(f, "{}", e),
            AppError::Vault(e) => write!(f, "{}", e),
            AppError::Account(e) => write!(f, "{}", e),
            AppError::Store(e) => write!(f, "{}", e),
            AppError::Notify(e) => write!(f, "{}", e),
            AppError::Config(e) => write!(f, "{}", e),
        }
    }
}

impl StdError for AppError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            AppError::Validation(e) => Some(e),
            AppError::Vault(e) => Some(e),
            AppError::Account(e) => Some(e),
            AppError::Store(e) => Some(e),
            AppError::Notify(e) => Some(e),
            AppError::Config(e) => Some(e),
        }
    }
}

// ============================================================================
// FROM IMPLEMENTATIONS
// ============================================================================

impl From<ValidationError> for AppError {
    fn from(err: ValidationError) -> Self {
        AppError::Validation(err)
    }
}

impl From<VaultError> for AppError {
    fn from(err: VaultError) -> Self {
        AppError::Vault(err)
    }
}

impl From<AccountError> for AppError {
    fn from(err: AccountError) -> Self {
        AppError::Account(err)
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        AppError::Store(err)
    }
}

impl From<NotifyError> for AppError {
    fn from(err: NotifyError) -> Self {
        AppError::Notify(err)
    }
}

impl From<ConfigError> for AppError {
    fn from(err: ConfigError) -> Self {
        AppError::Config(err)
    }
}

// ============================================================================
// 3. ERROR CONTEXT ENRICHMENT
// ============================================================================

/// Error context for structured logging
#[derive(Debug, Clone)]
pub struct ErrorContext {
    pub request_id: String,
    pub account_id: Option<String>,
    pub operation: String,
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

impl ErrorContext {
    pub fn new(operation: impl Into<String>) -> Self {
        Self {
            request_id: uuid::Uuid::new_v4().to_string(),
            account_id: None,
            operation: operation.into(),
            timestamp: chrono::Utc::now(),
        }
    }

    pub fn with_account_id(mut self, account_id: impl ToString) -> Self {
        self.account_id = Some(account_id.to_string());
        self
    }

    pub fn log_error(&self, error: &AppError) {
        let context = serde_json::json!({
            "request_id": self.request_id,
            "operation": self.operation,
            "account_id": self.account_id,
            "timestamp": self.timestamp.to_rfc3339(),
        });

        if error.is_defect() {
            tracing::error!(
                error = %error,
                context = ?context,
                "Integration defect"
            );
            return;
        }

        match error {
            AppError::Validation(_) | AppError::Account(_) => {
                tracing::warn!(
                    error = %error,
                    context = ?context,
                    "Rejected request"
                );
            }
            AppError::Store(StoreError::DuplicateEmail(_)) => {
                tracing::warn!(
                    error = %error,
                    context = ?context,
                    "Duplicate entry attempt"
                );
            }
            AppError::Store(_) => {
                tracing::error!(
                    error = %error,
                    context = ?context,
                    "Account store error"
                );
            }
            AppError::Notify(_) => {
                tracing::error!(
                    error = %error,
                    context = ?context,
                    "Notification error"
                );
            }
            AppError::Vault(_) | AppError::Config(_) => {
                tracing::error!(
                    error = %error,
                    context = ?context,
                    "Internal error"
                );
            }
        }
    }
}
