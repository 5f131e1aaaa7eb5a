/// Account lookup
///
/// Accounts are owned by an external user store. This module only defines
/// the projection the auth flow needs and the lookup seam it calls through.

mod memory;
mod postgres;

use std::fmt;
use std::str::FromStr;

use async_trait::async_trait;
use serde::Serialize;
use uuid::Uuid;

use crate::auth::Role;
use crate::error::AppError;

pub use memory::InMemoryAccountStore;
pub use postgres::PgAccountStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AccountStatus {
    Active,
    Inactive,
    Suspended,
}

impl AccountStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AccountStatus::Active => "active",
            AccountStatus::Inactive => "inactive",
            AccountStatus::Suspended => "suspended",
        }
    }
}

impl fmt::Display for AccountStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AccountStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(AccountStatus::Active),
            "inactive" => Ok(AccountStatus::Inactive),
            "suspended" => Ok(AccountStatus::Suspended),
            other => Err(format!("unknown account status '{}'", other)),
        }
    }
}

/// An account as seen by the auth flow. Serializes as the public profile.
#[derive(Debug, Clone, Serialize)]
pub struct Account {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub role: Role,
    pub status: AccountStatus,
}

impl Account {
    pub fn is_active(&self) -> bool {
        self.status == AccountStatus::Active
    }
}

/// Read-only account lookup. `Ok(None)` is "not found"; `Err` is a store
/// failure.
#[async_trait]
pub trait AccountStore: Send + Sync {
    async fn get_by_id(&self, id: Uuid) -> Result<Option<Account>, AppError>;
    async fn get_by_email(&self, email: &str) -> Result<Option<Account>, AppError>;
}
