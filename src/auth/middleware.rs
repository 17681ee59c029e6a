//! Authorization Middleware
//!
//! Axum middleware gating the car write endpoints. A request is allowed
//! through when it carries either a verified bearer token or a live
//! server-side session; everything else is rejected with a generic 401
//! before the handler runs.

use axum::{
    extract::{Request, State},
    http::{HeaderMap, header},
    middleware::Next,
    response::Response,
};
use axum_extra::extract::cookie::CookieJar;
use uuid::Uuid;

use crate::auth::jwt::JwtService;
use crate::auth::models::AuthUser;
use crate::database::SessionStore;
use crate::error::ApiError;
use crate::server::AppState;

/// Name of the cookie carrying the session id
pub const SESSION_COOKIE: &str = "session_id";

/// Pull the token out of an `Authorization: Bearer <token>` header.
pub(crate) fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
}

/// Authorization middleware over bearer tokens and sessions
pub struct AuthMiddleware;

impl AuthMiddleware {
    /// Require an authenticated identity, trying the bearer token first and
    /// falling back to the session cookie when no token is presented. On
    /// success the identity is attached to request extensions for
    /// downstream handlers; on failure the request terminates here.
    pub async fn require_auth(
        State(state): State<AppState>,
        jar: CookieJar,
        mut req: Request,
        next: Next,
    ) -> Result<Response, ApiError> {
        let identity = match bearer_token(req.headers()) {
            Some(token) => Self::bearer_identity(&state.jwt_service, token)?,
            None => Self::session_identity(state.db.as_ref(), &jar).await?,
        };

        req.extensions_mut().insert(identity);
        Ok(next.run(req).await)
    }

    /// Bearer-token variant: verify the presented JWT. The rejection reason
    /// is logged but never surfaced to the client.
    fn bearer_identity(jwt: &JwtService, token: &str) -> Result<AuthUser, ApiError> {
        match jwt.verify(token) {
            Ok(claims) => Ok(AuthUser {
                id: claims.sub,
                username: claims.username,
            }),
            Err(reason) => {
                tracing::warn!("Rejected bearer token: {reason}");
                Err(ApiError::Unauthorized)
            }
        }
    }

    /// Session variant: resolve the `session_id` cookie to a live,
    /// non-expired session record.
    async fn session_identity(
        sessions: &dyn SessionStore,
        jar: &CookieJar,
    ) -> Result<AuthUser, ApiError> {
        let session_id = jar
            .get(SESSION_COOKIE)
            .and_then(|cookie| Uuid::parse_str(cookie.value()).ok())
            .ok_or(ApiError::Unauthorized)?;

        let session = sessions
            .find_live_session(session_id)
            .await?
            .ok_or_else(|| {
                tracing::warn!("Rejected unknown or expired session {session_id}");
                ApiError::Unauthorized
            })?;

        Ok(AuthUser {
            id: session.user_id,
            username: session.username,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::StoreError;
    use crate::database::models::Session;
    use async_trait::async_trait;
    use axum::http::HeaderValue;
    use axum_extra::extract::cookie::Cookie;
    use chrono::{Duration, Utc};
    use std::collections::HashMap;
    use std::sync::Mutex;

    fn headers_with_auth(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_str(value).unwrap());
        headers
    }

    #[test]
    fn extracts_bearer_token() {
        let headers = headers_with_auth("Bearer abc.def.ghi");
        assert_eq!(bearer_token(&headers), Some("abc.def.ghi"));
    }

    #[test]
    fn missing_header_yields_none() {
        assert_eq!(bearer_token(&HeaderMap::new()), None);
    }

    #[test]
    fn non_bearer_scheme_yields_none() {
        let headers = headers_with_auth("Basic dXNlcjpwYXNz");
        assert_eq!(bearer_token(&headers), None);
    }

    /// In-memory session store mirroring the SQL contract: expired rows are
    /// invisible to lookups and reclaimed by purge.
    #[derive(Default)]
    struct MemorySessions {
        sessions: Mutex<HashMap<Uuid, Session>>,
    }

    #[async_trait]
    impl SessionStore for MemorySessions {
        async fn create_session(
            &self,
            user_id: Uuid,
            username: &str,
            ttl_hours: i64,
        ) -> Result<Session, StoreError> {
            let session = Session {
                id: Uuid::new_v4(),
                user_id,
                username: username.to_string(),
                expires_at: Utc::now() + Duration::hours(ttl_hours),
            };
            self.sessions
                .lock()
                .unwrap()
                .insert(session.id, session.clone());
            Ok(session)
        }

        async fn find_live_session(&self, id: Uuid) -> Result<Option<Session>, StoreError> {
            Ok(self
                .sessions
                .lock()
                .unwrap()
                .get(&id)
                .filter(|session| session.expires_at > Utc::now())
                .cloned())
        }

        async fn delete_session(&self, id: Uuid) -> Result<(), StoreError> {
            self.sessions.lock().unwrap().remove(&id);
            Ok(())
        }

        async fn purge_expired(&self) -> Result<u64, StoreError> {
            let mut sessions = self.sessions.lock().unwrap();
            let before = sessions.len();
            sessions.retain(|_, session| session.expires_at > Utc::now());
            Ok((before - sessions.len()) as u64)
        }
    }

    fn jar_with_session(value: &str) -> CookieJar {
        CookieJar::new().add(Cookie::new(SESSION_COOKIE, value.to_string()))
    }

    #[tokio::test]
    async fn live_session_authenticates() {
        let store = MemorySessions::default();
        let user_id = Uuid::new_v4();
        let session = store.create_session(user_id, "alice", 24).await.unwrap();

        let jar = jar_with_session(&session.id.to_string());
        let identity = AuthMiddleware::session_identity(&store, &jar).await.unwrap();

        assert_eq!(identity.id, user_id);
        assert_eq!(identity.username, "alice");
    }

    #[tokio::test]
    async fn expired_session_is_rejected() {
        let store = MemorySessions::default();
        let session = store
            .create_session(Uuid::new_v4(), "alice", -1)
            .await
            .unwrap();

        let jar = jar_with_session(&session.id.to_string());
        let result = AuthMiddleware::session_identity(&store, &jar).await;

        assert!(matches!(result, Err(ApiError::Unauthorized)));
    }

    #[tokio::test]
    async fn non_uuid_session_cookie_is_rejected() {
        let store = MemorySessions::default();
        let jar = jar_with_session("not-a-uuid");

        let result = AuthMiddleware::session_identity(&store, &jar).await;
        assert!(matches!(result, Err(ApiError::Unauthorized)));
    }

    #[tokio::test]
    async fn missing_session_cookie_is_rejected() {
        let store = MemorySessions::default();
        let result = AuthMiddleware::session_identity(&store, &CookieJar::new()).await;
        assert!(matches!(result, Err(ApiError::Unauthorized)));
    }

    #[tokio::test]
    async fn purge_reclaims_only_expired_sessions() {
        let store = MemorySessions::default();
        let live = store.create_session(Uuid::new_v4(), "alice", 24).await.unwrap();
        let expired = store
            .create_session(Uuid::new_v4(), "bob", -1)
            .await
            .unwrap();

        assert_eq!(store.purge_expired().await.unwrap(), 1);
        assert!(store.find_live_session(live.id).await.unwrap().is_some());
        assert!(store.find_live_session(expired.id).await.unwrap().is_none());
    }
}
