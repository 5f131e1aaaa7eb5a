use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;
use uuid::Uuid;

use super::{Account, AccountStore};
use crate::error::AppError;

/// Process-local account store for tests and local development.
#[derive(Debug, Default)]
pub struct InMemoryAccountStore {
    accounts: RwLock<HashMap<Uuid, Account>>,
}

impl InMemoryAccountStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace an account.
    pub fn upsert(&self, account: Account) {
        self.write().insert(account.id, account);
    }

    pub fn remove(&self, id: Uuid) -> Option<Account> {
        self.write().remove(&id)
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, HashMap<Uuid, Account>> {
        self.accounts.write().unwrap_or_else(|e| e.into_inner())
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, HashMap<Uuid, Account>> {
        self.accounts.read().unwrap_or_else(|e| e.into_inner())
    }
}

#[async_trait]
impl AccountStore for InMemoryAccountStore {
    async fn get_by_id(&self, id: Uuid) -> Result<Option<Account>, AppError> {
        Ok(self.read().get(&id).cloned())
    }

    async fn get_by_email(&self, email: &str) -> Result<Option<Account>, AppError> {
        Ok(self
            .read()
            .values()
            .find(|account| account.email.eq_ignore_ascii_case(email))
            .cloned())
    }
}
