use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use super::{Account, AccountStatus, AccountStore};
use crate::auth::Role;
use crate::error::{AppError, DatabaseError};

/// (id, name, email, password_hash, role, status)
type AccountRow = (Uuid, String, String, String, String, String);

/// Account lookup against the `users` table.
#[derive(Debug, Clone)]
pub struct PgAccountStore {
    pool: PgPool,
}

impl PgAccountStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AccountStore for PgAccountStore {
    async fn get_by_id(&self, id: Uuid) -> Result<Option<Account>, AppError> {
        let row = sqlx::query_as::<_, AccountRow>(
            r#"
            SELECT id, name, email, password_hash, role, status
            FROM users
            WHERE id = $1 AND deleted_at IS NULL
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(into_account).transpose()
    }

    async fn get_by_email(&self, email: &str) -> Result<Option<Account>, AppError> {
        let row = sqlx::query_as::<_, AccountRow>(
            r#"
            SELECT id, name, email, password_hash, role, status
            FROM users
            WHERE lower(email) = lower($1) AND deleted_at IS NULL
            "#,
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        row.map(into_account).transpose()
    }
}

fn into_account(row: AccountRow) -> Result<Account, AppError> {
    let (id, name, email, password_hash, role, status) = row;

    let role = role.parse::<Role>().map_err(|e| {
        tracing::error!(user_id = %id, error = %e, "Account row has an unknown role");
        DatabaseError::CorruptRecord(e)
    })?;
    let status = status.parse::<AccountStatus>().map_err(|e| {
        tracing::error!(user_id = %id, error = %e, "Account row has an unknown status");
        DatabaseError::CorruptRecord(e)
    })?;

    Ok(Account {
        id,
        name,
        email,
        password_hash,
        role,
        status,
    })
}
