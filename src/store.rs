/// Account persistence contract
///
/// A store durably keeps accounts keyed by id and enforces case-insensitive
/// email uniqueness. It provides no versioning: concurrent updates to the same
/// account are last-writer-wins.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use uuid::Uuid;

use crate::account::Account;
use crate::error::StoreError;

pub trait AccountStore {
    /// Insert a new account. Fails with `DuplicateEmail` if the email is taken.
    fn insert(&self, account: &Account) -> Result<(), StoreError>;

    fn find(&self, id: Uuid) -> Result<Option<Account>, StoreError>;

    /// Look an account up by email, ignoring case.
    fn find_by_email(&self, email: &str) -> Result<Option<Account>, StoreError>;

    /// Overwrite a stored account. Fails with `NotFound` if it was never inserted.
    fn update(&self, account: &Account) -> Result<(), StoreError>;
}

#[derive(Default)]
struct Tables {
    accounts: HashMap<Uuid, Account>,
    by_email: HashMap<String, Uuid>,
}

/// Mutex-guarded in-process store
#[derive(Default)]
pub struct InMemoryAccountStore {
    tables: Mutex<Tables>,
}

impl InMemoryAccountStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.lock().map(|t| t.accounts.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> Result<MutexGuard<'_, Tables>, StoreError> {
        self.tables
            .lock()
            .map_err(|_| StoreError::Unavailable("store lock poisoned".to_string()))
    }
}

fn email_key(email: &str) -> String {
    email.trim().to_lowercase()
}

impl AccountStore for InMemoryAccountStore {
    fn insert(&self, account: &Account) -> Result<(), StoreError> {
        let mut tables = self.lock()?;
        let key = email_key(account.email());

        if tables.by_email.contains_key(&key) {
            return Err(StoreError::DuplicateEmail(key));
        }

        tables.by_email.insert(key, account.id());
        tables.accounts.insert(account.id(), account.clone());
        Ok(())
    }

    fn find(&self, id: Uuid) -> Result<Option<Account>, StoreError> {
        Ok(self.lock()?.accounts.get(&id).cloned())
    }

    fn find_by_email(&self, email: &str) -> Result<Option<Account>, StoreError> {
        let tables = self.lock()?;
        Ok(tables
            .by_email
            .get(&email_key(email))
            .and_then(|id| tables.accounts.get(id))
            .cloned())
    }

    fn update(&self, account: &Account) -> Result<(), StoreError> {
        let mut tables = self.lock()?;
        match tables.accounts.get_mut(&account.id()) {
            Some(stored) => {
                *stored = account.clone();
                Ok(())
            }
            None => Err(StoreError::NotFound(format!("account {}", account.id()))),
        }
    }
}
