//! Authentication Service
//!
//! Orchestrates registration and login over the credential store, the
//! password hasher, and the JWT service. Route handlers stay thin; all
//! credential decisions happen here.

use std::sync::Arc;
use thiserror::Error;

use crate::auth::jwt::JwtService;
use crate::auth::models::AuthUser;
use crate::auth::password;
use crate::database::{CredentialStore, StoreError};
use crate::error::FieldError;

/// Why an auth operation failed
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("validation failed")]
    Validation(Vec<FieldError>),

    #[error("username is already taken")]
    UsernameTaken,

    /// Unknown username and wrong password both land here. Keeping them
    /// indistinguishable closes the account-enumeration channel the
    /// distinct messages would open.
    #[error("invalid credentials")]
    BadCredential,

    #[error("credential store failure")]
    Store(anyhow::Error),

    #[error("password hashing failure")]
    Hash(anyhow::Error),
}

/// Authentication service over an arbitrary credential store
#[derive(Clone)]
pub struct AuthService {
    store: Arc<dyn CredentialStore>,
    jwt: JwtService,
}

impl AuthService {
    pub fn new(store: Arc<dyn CredentialStore>, jwt: JwtService) -> Self {
        Self { store, jwt }
    }

    /// Register a new user. The password is hashed before it ever reaches
    /// the store; plaintext is never persisted. Username uniqueness is
    /// enforced by the store's own constraint, not checked here first.
    pub async fn register(&self, username: &str, password: &str) -> Result<AuthUser, AuthError> {
        let username = username.trim();
        let mut errors = Vec::new();
        if username.is_empty() {
            errors.push(FieldError::new("username", "Username is required"));
        }
        if password.is_empty() {
            errors.push(FieldError::new("password", "Password is required"));
        }
        if !errors.is_empty() {
            return Err(AuthError::Validation(errors));
        }

        let password_hash = password::hash_password(password).map_err(AuthError::Hash)?;

        let user = self
            .store
            .insert_user(username, &password_hash)
            .await
            .map_err(|err| match err {
                StoreError::Duplicate => AuthError::UsernameTaken,
                StoreError::Backend(cause) => AuthError::Store(cause),
            })?;

        tracing::info!("Registered user {}", user.username);
        Ok(AuthUser {
            id: user.id,
            username: user.username,
        })
    }

    /// Log a user in, issuing a bearer token on success
    pub async fn login(
        &self,
        username: &str,
        password: &str,
    ) -> Result<(String, AuthUser), AuthError> {
        let username = username.trim();

        let user = self
            .store
            .find_by_username(username)
            .await
            .map_err(|err| match err {
                StoreError::Duplicate => AuthError::Store(anyhow::anyhow!("unexpected duplicate")),
                StoreError::Backend(cause) => AuthError::Store(cause),
            })?
            .ok_or(AuthError::BadCredential)?;

        if !password::verify_password(password, &user.password_hash) {
            tracing::warn!("Failed login attempt for {}", username);
            return Err(AuthError::BadCredential);
        }

        let token = self
            .jwt
            .issue(user.id, &user.username)
            .map_err(AuthError::Store)?;

        Ok((
            token,
            AuthUser {
                id: user.id,
                username: user.username,
            },
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::models::User;
    use async_trait::async_trait;
    use chrono::Utc;
    use std::collections::HashMap;
    use std::sync::Mutex;
    use uuid::Uuid;

    /// In-memory credential store mirroring the unique-username constraint
    #[derive(Default)]
    struct MemoryStore {
        users: Mutex<HashMap<String, User>>,
    }

    #[async_trait]
    impl CredentialStore for MemoryStore {
        async fn insert_user(
            &self,
            username: &str,
            password_hash: &str,
        ) -> Result<User, StoreError> {
            let mut users = self.users.lock().unwrap();
            if users.contains_key(username) {
                return Err(StoreError::Duplicate);
            }
            let user = User {
                id: Uuid::new_v4(),
                username: username.to_string(),
                password_hash: password_hash.to_string(),
                created_at: Utc::now(),
            };
            users.insert(username.to_string(), user.clone());
            Ok(user)
        }

        async fn find_by_username(&self, username: &str) -> Result<Option<User>, StoreError> {
            Ok(self.users.lock().unwrap().get(username).cloned())
        }
    }

    fn service() -> AuthService {
        AuthService::new(
            Arc::new(MemoryStore::default()),
            JwtService::new("test_secret", 3600),
        )
    }

    #[tokio::test]
    async fn register_then_login_roundtrip() {
        let auth = service();
        let registered = auth.register("alice", "correct").await.unwrap();

        let (token, user) = auth.login("alice", "correct").await.unwrap();
        assert_eq!(user.id, registered.id);

        // The issued token maps back to alice's identifier.
        let claims = JwtService::new("test_secret", 3600).verify(&token).unwrap();
        assert_eq!(claims.sub, registered.id);
        assert_eq!(claims.username, "alice");
    }

    #[tokio::test]
    async fn duplicate_username_is_a_conflict_not_a_second_record() {
        let auth = service();
        auth.register("alice", "pw1").await.unwrap();

        let result = auth.register("alice", "pw2").await;
        assert!(matches!(result, Err(AuthError::UsernameTaken)));

        // Original credentials still work.
        assert!(auth.login("alice", "pw1").await.is_ok());
    }

    #[tokio::test]
    async fn wrong_password_and_unknown_user_are_indistinguishable() {
        let auth = service();
        auth.register("alice", "correct").await.unwrap();

        let wrong_password = auth.login("alice", "wrong").await;
        let unknown_user = auth.login("bob", "whatever").await;

        assert!(matches!(wrong_password, Err(AuthError::BadCredential)));
        assert!(matches!(unknown_user, Err(AuthError::BadCredential)));
    }

    #[tokio::test]
    async fn stored_record_survives_failed_login() {
        let auth = service();
        auth.register("alice", "correct").await.unwrap();
        let _ = auth.login("alice", "wrong").await;

        assert!(auth.login("alice", "correct").await.is_ok());
    }

    #[tokio::test]
    async fn empty_fields_fail_validation() {
        let auth = service();

        let result = auth.register("  ", "").await;
        let Err(AuthError::Validation(errors)) = result else {
            panic!("expected validation error");
        };
        let fields: Vec<_> = errors.iter().map(|e| e.field).collect();
        assert_eq!(fields, vec!["username", "password"]);
    }

    #[tokio::test]
    async fn plaintext_password_is_never_stored() {
        let store = Arc::new(MemoryStore::default());
        let auth = AuthService::new(store.clone(), JwtService::new("test_secret", 3600));
        auth.register("alice", "supersecret").await.unwrap();

        let stored = store.find_by_username("alice").await.unwrap().unwrap();
        assert_ne!(stored.password_hash, "supersecret");
        assert!(!stored.password_hash.contains("supersecret"));
    }
}
