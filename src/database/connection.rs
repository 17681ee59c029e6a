// Database Connection Management
//
// Handles PostgreSQL connection pooling using tokio-postgres and deadpool,
// and exposes the store operations for users, sessions, and car listings.

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{Duration, Utc};
use deadpool_postgres::{Manager, ManagerConfig, Pool, RecyclingMethod};
use native_tls::TlsConnector;
use postgres_native_tls::MakeTlsConnector;
use std::str::FromStr;
use uuid::Uuid;

use crate::config::DatabaseConfig;
use crate::database::models::{Car, CarInput, FromRow, Session, User};
use crate::database::{CredentialStore, SessionStore, StoreError};

/// Database connection wrapper holding the shared pool
#[derive(Clone)]
pub struct DatabaseConnection {
    pool: Pool,
}

impl DatabaseConnection {
    /// Create a new connection pool from the provided configuration and
    /// verify connectivity with a test query. Startup aborts if this fails.
    pub async fn connect(config: &DatabaseConfig) -> Result<Self> {
        let pg_config = tokio_postgres::Config::from_str(&config.url)
            .context("Failed to parse DATABASE_URL")?;

        let masked = format!(
            "{:?}/{}",
            pg_config.get_hosts(),
            pg_config.get_dbname().unwrap_or_default()
        );
        tracing::info!("Connecting to database: {}", masked);

        let tls_connector = TlsConnector::builder()
            .build()
            .context("Failed to build TLS connector")?;
        let tls = MakeTlsConnector::new(tls_connector);

        let mgr_config = ManagerConfig {
            recycling_method: RecyclingMethod::Fast,
        };
        let mgr = Manager::from_config(pg_config, tls, mgr_config);

        let pool = Pool::builder(mgr)
            .max_size(config.max_connections)
            .runtime(deadpool_postgres::Runtime::Tokio1)
            .build()
            .context("Failed to create database pool")?;

        // Test the connection
        let client = pool
            .get()
            .await
            .context("Failed to get connection from pool")?;
        client
            .query("SELECT 1", &[])
            .await
            .context("Failed to test database connection")?;

        tracing::info!("Database connection established");

        Ok(Self { pool })
    }

    /// Get a reference to the connection pool
    pub fn pool(&self) -> &Pool {
        &self.pool
    }

    // ------------------------------------------------------------------
    // Users
    // ------------------------------------------------------------------

    /// Insert a new user. The `username` unique constraint is the only
    /// enforcement of uniqueness; a violation maps to `StoreError::Duplicate`.
    pub async fn create_user(
        &self,
        username: &str,
        password_hash: &str,
    ) -> Result<User, StoreError> {
        let client = self.pool.get().await?;
        let row = client
            .query_one(
                "INSERT INTO users (id, username, password_hash) \
                 VALUES ($1, $2, $3) RETURNING *",
                &[&Uuid::new_v4(), &username, &password_hash],
            )
            .await?;
        Ok(User::from_row(&row)?)
    }

    /// Fetch a user by username
    pub async fn find_user_by_username(
        &self,
        username: &str,
    ) -> Result<Option<User>, StoreError> {
        let client = self.pool.get().await?;
        let row = client
            .query_opt("SELECT * FROM users WHERE username = $1", &[&username])
            .await?;
        row.map(|r| User::from_row(&r)).transpose().map_err(Into::into)
    }

    // ------------------------------------------------------------------
    // Sessions
    // ------------------------------------------------------------------

    /// Create a server-side session for a user, valid for `ttl_hours`.
    /// Each login also reclaims whatever sessions have expired since the
    /// last one, so the table does not grow without bound.
    pub async fn create_session(
        &self,
        user_id: Uuid,
        username: &str,
        ttl_hours: i64,
    ) -> Result<Session, StoreError> {
        self.purge_expired_sessions().await?;

        let expires_at = Utc::now() + Duration::hours(ttl_hours);
        let client = self.pool.get().await?;
        let row = client
            .query_one(
                "INSERT INTO sessions (id, user_id, username, expires_at) \
                 VALUES ($1, $2, $3, $4) RETURNING *",
                &[&Uuid::new_v4(), &user_id, &username, &expires_at],
            )
            .await?;
        Ok(Session::from_row(&row)?)
    }

    /// Fetch a session by id, ignoring expired rows.
    pub async fn find_live_session(&self, id: Uuid) -> Result<Option<Session>, StoreError> {
        let client = self.pool.get().await?;
        let row = client
            .query_opt(
                "SELECT * FROM sessions WHERE id = $1 AND expires_at > NOW()",
                &[&id],
            )
            .await?;
        row.map(|r| Session::from_row(&r)).transpose().map_err(Into::into)
    }

    /// Destroy a session. Deleting an absent or expired session is not an
    /// error; logout always succeeds.
    pub async fn delete_session(&self, id: Uuid) -> Result<(), StoreError> {
        let client = self.pool.get().await?;
        client
            .execute("DELETE FROM sessions WHERE id = $1", &[&id])
            .await?;
        Ok(())
    }

    /// Reclaim expired session rows. `sessions_expires_at_idx` keeps this
    /// cheap; runs at startup and on every login.
    pub async fn purge_expired_sessions(&self) -> Result<u64, StoreError> {
        let client = self.pool.get().await?;
        let purged = client
            .execute("DELETE FROM sessions WHERE expires_at <= NOW()", &[])
            .await?;
        if purged > 0 {
            tracing::debug!("Purged {} expired sessions", purged);
        }
        Ok(purged)
    }

    // ------------------------------------------------------------------
    // Cars
    // ------------------------------------------------------------------

    /// List all car listings, newest first
    pub async fn list_cars(&self) -> Result<Vec<Car>, StoreError> {
        let client = self.pool.get().await?;
        let rows = client
            .query("SELECT * FROM cars ORDER BY created_at DESC", &[])
            .await?;
        rows.iter()
            .map(|row| Car::from_row(row).map_err(Into::into))
            .collect()
    }

    /// Insert a new car listing
    pub async fn insert_car(&self, input: &CarInput) -> Result<Car, StoreError> {
        let client = self.pool.get().await?;
        let row = client
            .query_one(
                "INSERT INTO cars (id, make, model, year, price, mileage, color, description) \
                 VALUES ($1, $2, $3, $4, $5, $6, $7, $8) RETURNING *",
                &[
                    &Uuid::new_v4(),
                    &input.make,
                    &input.model,
                    &input.year,
                    &input.price,
                    &input.mileage,
                    &input.color,
                    &input.description,
                ],
            )
            .await?;
        Ok(Car::from_row(&row)?)
    }

    /// Update a car listing by id, returning `None` if no such car exists
    pub async fn update_car(
        &self,
        id: Uuid,
        input: &CarInput,
    ) -> Result<Option<Car>, StoreError> {
        let client = self.pool.get().await?;
        let row = client
            .query_opt(
                "UPDATE cars SET make = $2, model = $3, year = $4, price = $5, \
                 mileage = $6, color = $7, description = $8, updated_at = NOW() \
                 WHERE id = $1 RETURNING *",
                &[
                    &id,
                    &input.make,
                    &input.model,
                    &input.year,
                    &input.price,
                    &input.mileage,
                    &input.color,
                    &input.description,
                ],
            )
            .await?;
        row.map(|r| Car::from_row(&r)).transpose().map_err(Into::into)
    }

    /// Delete a car listing by id, returning whether a row was removed
    pub async fn delete_car(&self, id: Uuid) -> Result<bool, StoreError> {
        let client = self.pool.get().await?;
        let deleted = client
            .execute("DELETE FROM cars WHERE id = $1", &[&id])
            .await?;
        Ok(deleted > 0)
    }
}

#[async_trait]
impl CredentialStore for DatabaseConnection {
    async fn insert_user(&self, username: &str, password_hash: &str) -> Result<User, StoreError> {
        self.create_user(username, password_hash).await
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>, StoreError> {
        self.find_user_by_username(username).await
    }
}

#[async_trait]
impl SessionStore for DatabaseConnection {
    async fn create_session(
        &self,
        user_id: Uuid,
        username: &str,
        ttl_hours: i64,
    ) -> Result<Session, StoreError> {
        DatabaseConnection::create_session(self, user_id, username, ttl_hours).await
    }

    async fn find_live_session(&self, id: Uuid) -> Result<Option<Session>, StoreError> {
        DatabaseConnection::find_live_session(self, id).await
    }

    async fn delete_session(&self, id: Uuid) -> Result<(), StoreError> {
        DatabaseConnection::delete_session(self, id).await
    }

    async fn purge_expired(&self) -> Result<u64, StoreError> {
        self.purge_expired_sessions().await
    }
}
