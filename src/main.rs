//! # Carlot Server
//!
//! A car listing API server built with Rust, Axum, and Tokio. Users register
//! and log in with a username and password; a successful login produces a
//! JWT bearer token (and a server-side session) that gates all write
//! operations on the car inventory.
//!
//! ## Architecture
//! The server is organized into modules:
//! - `server`: Core server initialization and route wiring
//! - `config`: Environment variable configuration management
//! - `auth`: Password hashing, JWT issuance/verification, auth middleware
//! - `database`: PostgreSQL connection pool, models, and migrations
//! - `routes`: HTTP route handlers organized by functionality
//!   - `health`: Health check endpoint
//!   - `auth`: Registration, login, and logout endpoints
//!   - `cars`: Car inventory CRUD endpoints
//!
//! ## Environment Setup
//! Copy `.env.example` to `.env` and configure `DATABASE_URL` and
//! `JWT_SECRET` before starting:
//! ```bash
//! cp .env.example .env
//! cargo run
//! ```

mod auth;
mod config;
mod database;
mod error;
mod extract;
mod routes;
mod server;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Application entry point.
///
/// Initializes the tracing subscriber, loads configuration from the
/// environment, and starts the HTTP server. Failure to load configuration or
/// to reach the database aborts startup; any later per-request failure is
/// mapped to an HTTP response instead of crashing the process.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false) // Don't show module targets for cleaner output
                .compact(),
        )
        .init();

    tracing::info!(
        "Starting {} v{}",
        env!("CARGO_PKG_NAME"),
        env!("CARGO_PKG_VERSION")
    );

    let config = config::Config::from_env()?;
    server::start(config).await
}
