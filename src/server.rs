//! # Server Module
//!
//! HTTP server setup and route configuration for the carlot server.

use anyhow::{Context, Result};
use axum::{
    Router, middleware,
    routing::{get, post, put},
};
use std::sync::Arc;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::cors::{AllowOrigin, CorsLayer};

use crate::auth::jwt::JwtService;
use crate::auth::middleware::AuthMiddleware;
use crate::auth::service::AuthService;
use crate::config::Config;
use crate::database::connection::DatabaseConnection;
use crate::database::migrations;
use crate::routes;
use crate::routes::health::ping;

/// Application state shared across all route handlers
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<DatabaseConnection>,
    pub jwt_service: Arc<JwtService>,
    pub auth_service: AuthService,
    pub session_ttl_hours: i64,
}

/// Starts the carlot HTTP server.
///
/// Connects to the database, runs migrations, assembles the application
/// state and routers, then serves until the process is terminated. A failed
/// database connection aborts startup; everything after that is handled at
/// the request boundary.
pub async fn start(config: Config) -> Result<()> {
    let db = Arc::new(DatabaseConnection::connect(&config.database).await?);
    migrations::run_migrations(db.pool()).await?;

    let purged = db.purge_expired_sessions().await?;
    if purged > 0 {
        tracing::info!("Purged {} expired sessions at startup", purged);
    }

    let jwt_service = Arc::new(JwtService::new(
        &config.auth.jwt_secret,
        config.auth.token_ttl_secs,
    ));
    let auth_service = AuthService::new(db.clone(), (*jwt_service).clone());

    let app_state = AppState {
        db,
        jwt_service,
        auth_service,
        session_ttl_hours: config.auth.session_ttl_hours,
    };

    // Write operations on the inventory require an authenticated identity;
    // listing stays public.
    let protected_car_routes = Router::new()
        .route("/api/cars", post(routes::cars::create_car))
        .route(
            "/api/cars/{id}",
            put(routes::cars::update_car).delete(routes::cars::delete_car),
        )
        .layer(middleware::from_fn_with_state(
            app_state.clone(),
            AuthMiddleware::require_auth,
        ));

    // Credentialed CORS so browsers send the session cookie; a wildcard
    // origin is incompatible with allow_credentials.
    let origins: Vec<axum::http::HeaderValue> = config
        .server
        .allowed_origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin: {}", origin);
                None
            }
        })
        .collect();

    let app = Router::new()
        .route("/ping", get(ping))
        .route("/api/cars", get(routes::cars::list_cars))
        .merge(protected_car_routes)
        .merge(routes::auth::create_auth_routes())
        .layer(
            ServiceBuilder::new().layer(
                CorsLayer::new()
                    .allow_origin(AllowOrigin::list(origins))
                    .allow_methods([
                        axum::http::Method::GET,
                        axum::http::Method::POST,
                        axum::http::Method::PUT,
                        axum::http::Method::DELETE,
                        axum::http::Method::OPTIONS,
                    ])
                    .allow_headers([
                        axum::http::header::ORIGIN,
                        axum::http::header::CONTENT_TYPE,
                        axum::http::header::ACCEPT,
                        axum::http::header::AUTHORIZATION,
                    ])
                    .allow_credentials(true),
            ),
        )
        .with_state(app_state);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {addr} - port may already be in use"))?;

    tracing::info!("Listening on http://{}", addr);
    tracing::info!("Health check available at http://{}/ping", addr);
    tracing::info!("Car listings available at http://{}/api/cars", addr);

    axum::serve(listener, app)
        .await
        .context("Server terminated unexpectedly")
}
