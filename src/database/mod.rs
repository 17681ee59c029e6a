//! Database layer: PostgreSQL connection pooling, models, and migrations.

pub mod connection;
pub mod migrations;
pub mod models;

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use models::{Session, User};

/// Persistence seam for user records. The production implementation is
/// [`connection::DatabaseConnection`]; tests substitute an in-memory store.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Insert a user, failing with [`StoreError::Duplicate`] when the
    /// username is already taken.
    async fn insert_user(&self, username: &str, password_hash: &str) -> Result<User, StoreError>;

    /// Look up a user by username
    async fn find_by_username(&self, username: &str) -> Result<Option<User>, StoreError>;
}

/// Persistence seam for server-side sessions. A session proves identity
/// only while unexpired; lookups must never return expired rows, and
/// expired rows are reclaimed by [`SessionStore::purge_expired`].
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Create a session valid for `ttl_hours`
    async fn create_session(
        &self,
        user_id: Uuid,
        username: &str,
        ttl_hours: i64,
    ) -> Result<Session, StoreError>;

    /// Look up a session by id, excluding expired rows
    async fn find_live_session(&self, id: Uuid) -> Result<Option<Session>, StoreError>;

    /// Destroy a session; absent or expired ids are not an error
    async fn delete_session(&self, id: Uuid) -> Result<(), StoreError>;

    /// Remove every expired session, returning how many were reclaimed
    async fn purge_expired(&self) -> Result<u64, StoreError>;
}

/// Store-layer failure. The store is the sole arbiter of uniqueness:
/// a unique-constraint violation surfaces as `Duplicate` so callers can
/// report a conflict instead of a generic failure.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("duplicate record")]
    Duplicate,

    #[error(transparent)]
    Backend(#[from] anyhow::Error),
}

impl From<deadpool_postgres::PoolError> for StoreError {
    fn from(err: deadpool_postgres::PoolError) -> Self {
        StoreError::Backend(anyhow::anyhow!("Failed to get DB connection: {err}"))
    }
}

impl From<tokio_postgres::Error> for StoreError {
    fn from(err: tokio_postgres::Error) -> Self {
        // SQLSTATE 23505: unique_violation
        if err
            .code()
            .is_some_and(|code| code == &tokio_postgres::error::SqlState::UNIQUE_VIOLATION)
        {
            StoreError::Duplicate
        } else {
            StoreError::Backend(anyhow::anyhow!("Database query failed: {err}"))
        }
    }
}
