//! Authentication Models
//!
//! Data structures for authentication requests, responses, and the
//! authenticated identity attached to requests.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Authenticated user identity, extracted from a verified JWT or a live
/// session and injected into request extensions by the auth middleware.
/// This is the only user-shaped value that ever crosses the HTTP boundary;
/// it carries no password material.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthUser {
    pub id: Uuid,
    pub username: String,
}

/// Registration request payload. Missing fields deserialize as empty and
/// fail presence validation with a 400 rather than a serde rejection.
#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

/// Login request payload
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

/// Login response body
#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub message: String,
    pub token: String,
}
