//! User persistence.
//!
//! The authenticator only sees [`UserStore`]; unique-constraint violations are
//! classified here so callers never inspect driver error codes.

use async_trait::async_trait;
use sqlx::{
    sqlite::{Sqlite, SqlitePool},
    Transaction,
};
use thiserror::Error;

use crate::models::user::User;

const CREATE_USERS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS users (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    email TEXT NOT NULL UNIQUE,
    password_hash TEXT NOT NULL,
    created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
)
"#;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("duplicate key")]
    DuplicateKey,
    #[error(transparent)]
    Database(sqlx::Error),
}

impl From<sqlx::Error> for StoreError {
    fn from(inner: sqlx::Error) -> Self {
        if let Some(db_err) = inner.as_database_error() {
            if db_err.is_unique_violation() {
                return StoreError::DuplicateKey;
            }
        }
        StoreError::Database(inner)
    }
}

/// A user row written but not yet committed. Dropping it discards the row.
#[async_trait]
pub trait PendingUser: Send {
    fn user(&self) -> &User;

    async fn commit(self) -> Result<User, StoreError>;
}

#[async_trait]
pub trait UserStore: Send + Sync {
    type Pending: PendingUser;

    /// Insert a user inside an open transaction. Fails with
    /// [`StoreError::DuplicateKey`] if the email is already registered.
    async fn create_user(
        &self,
        email: &str,
        password_hash: &str,
    ) -> Result<Self::Pending, StoreError>;

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, sqlx::Error>;
}

#[derive(Clone)]
pub struct SqliteUserStore {
    db: SqlitePool,
}

impl SqliteUserStore {
    pub fn new(db: SqlitePool) -> Self {
        Self { db }
    }

    /// Create the `users` table if it does not exist yet.
    pub async fn ensure_schema(&self) -> Result<(), StoreError> {
        sqlx::query(CREATE_USERS_TABLE).execute(&self.db).await?;
        Ok(())
    }

    #[cfg(test)]
    pub(crate) async fn count_by_email(&self, email: &str) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM users WHERE email = ?")
            .bind(email)
            .fetch_one(&self.db)
            .await
    }
}

pub struct SqlitePendingUser {
    tx: Transaction<'static, Sqlite>,
    user: User,
}

#[async_trait]
impl PendingUser for SqlitePendingUser {
    fn user(&self) -> &User {
        &self.user
    }

    async fn commit(self) -> Result<User, StoreError> {
        self.tx.commit().await?;
        Ok(self.user)
    }
}

#[async_trait]
impl UserStore for SqliteUserStore {
    type Pending = SqlitePendingUser;

    async fn create_user(
        &self,
        email: &str,
        password_hash: &str,
    ) -> Result<SqlitePendingUser, StoreError> {
        let mut tx = self.db.begin().await?;

        let user = sqlx::query_as::<_, User>(
            "INSERT INTO users (email, password_hash) VALUES (?, ?) \
             RETURNING id, email, password_hash, created_at",
        )
        .bind(email)
        .bind(password_hash)
        .fetch_one(&mut *tx)
        .await?;

        Ok(SqlitePendingUser { tx, user })
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, sqlx::Error> {
        sqlx::query_as::<_, User>(
            "SELECT id, email, password_hash, created_at FROM users WHERE email = ?",
        )
        .bind(email)
        .fetch_optional(&self.db)
        .await
    }
}
