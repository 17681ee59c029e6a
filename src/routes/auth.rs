//! Auth routes for registration, login, and logout

use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::{Router, extract::State, routing::post};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use serde_json::json;
use uuid::Uuid;

use crate::auth::middleware::SESSION_COOKIE;
use crate::auth::models::{LoginRequest, LoginResponse, RegisterRequest};
use crate::error::ApiError;
use crate::extract::Json;
use crate::server::AppState;

/// `POST /auth/register`: create a user account.
///
/// Returns 201 on success, 400 on missing fields, 409 when the username is
/// already taken.
pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> Result<impl IntoResponse, ApiError> {
    state
        .auth_service
        .register(&payload.username, &payload.password)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({ "message": "User registered successfully" })),
    ))
}

/// `POST /auth/login`: verify credentials and establish identity.
///
/// On success the response carries a bearer token in the body and a
/// `session_id` cookie backed by a server-side session, so clients may use
/// either mechanism on subsequent requests. Bad credentials of any kind
/// yield the same 401.
pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(payload): Json<LoginRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let (token, user) = state
        .auth_service
        .login(&payload.username, &payload.password)
        .await?;

    let session = state
        .db
        .create_session(user.id, &user.username, state.session_ttl_hours)
        .await?;

    let cookie = Cookie::build((SESSION_COOKIE, session.id.to_string()))
        .http_only(true)
        .same_site(SameSite::Lax)
        .path("/")
        .max_age(time::Duration::hours(state.session_ttl_hours))
        .build();

    tracing::info!("User {} logged in", user.username);

    Ok((
        jar.add(cookie),
        Json(LoginResponse {
            message: "Login successful".to_string(),
            token,
        }),
    ))
}

/// `POST /auth/logout`: destroy the server-side session and clear its
/// cookie.
///
/// Bearer tokens are stateless and stay valid until they expire; there is
/// no revocation list. Logout therefore only revokes the session half of a
/// login, a known limitation of the token design.
pub async fn logout(
    State(state): State<AppState>,
    jar: CookieJar,
) -> Result<impl IntoResponse, ApiError> {
    if let Some(session_id) = jar
        .get(SESSION_COOKIE)
        .and_then(|cookie| Uuid::parse_str(cookie.value()).ok())
    {
        state.db.delete_session(session_id).await?;
    }

    let jar = jar.remove(Cookie::build((SESSION_COOKIE, "")).path("/"));

    Ok((jar, Json(json!({ "message": "Logout successful" }))))
}

pub fn create_auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
        .route("/auth/logout", post(logout))
}
