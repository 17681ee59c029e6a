//! Configuration module for environment variables and application settings

use anyhow::{Result, anyhow};
use std::env;

/// Application configuration, loaded once at startup and passed explicitly
/// into each component. Nothing reads the environment after this point.
#[derive(Debug, Clone)]
pub struct Config {
    /// Server listen address configuration
    pub server: ServerConfig,

    /// Database configuration
    pub database: DatabaseConfig,

    /// Authentication configuration
    pub auth: AuthConfig,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Origins allowed by CORS. The session cookie requires credentialed
    /// requests, which rules out a wildcard origin.
    pub allowed_origins: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    /// PostgreSQL connection URI
    pub url: String,
    /// Maximum pooled connections
    pub max_connections: usize,
}

#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// Secret used to sign and verify JWTs. Rotating it invalidates every
    /// outstanding token.
    pub jwt_secret: String,
    /// Bearer token lifetime in seconds
    pub token_ttl_secs: i64,
    /// Server-side session lifetime in hours
    pub session_ttl_hours: i64,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            server: ServerConfig {
                host: env::var("SERVER_HOST").unwrap_or_else(|_| "127.0.0.1".to_string()),
                // $PORT (Heroku-style) takes precedence over SERVER_PORT
                port: env::var("PORT")
                    .or_else(|_| env::var("SERVER_PORT"))
                    .unwrap_or_else(|_| "3000".to_string())
                    .parse()
                    .unwrap_or(3000),
                allowed_origins: parse_origins(
                    &env::var("ALLOWED_ORIGINS")
                        .unwrap_or_else(|_| "http://localhost:3001".to_string()),
                ),
            },

            database: DatabaseConfig {
                url: env::var("DATABASE_URL")
                    .map_err(|_| anyhow!("DATABASE_URL environment variable is required"))?,
                max_connections: env::var("DATABASE_MAX_CONNECTIONS")
                    .unwrap_or_else(|_| "16".to_string())
                    .parse()
                    .unwrap_or(16),
            },

            auth: AuthConfig {
                jwt_secret: env::var("JWT_SECRET")
                    .map_err(|_| anyhow!("JWT_SECRET environment variable is required"))?,
                token_ttl_secs: env::var("TOKEN_TTL_SECS")
                    .unwrap_or_else(|_| "3600".to_string())
                    .parse()
                    .unwrap_or(3600),
                session_ttl_hours: env::var("SESSION_TTL_HOURS")
                    .unwrap_or_else(|_| "24".to_string())
                    .parse()
                    .unwrap_or(24),
            },
        })
    }
}

/// Split a comma-separated origin list, trimming whitespace and dropping
/// empty entries.
fn parse_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|origin| !origin.is_empty())
        .map(String::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_comma_separated_origins() {
        assert_eq!(
            parse_origins("http://localhost:3001, https://cars.example.com"),
            vec!["http://localhost:3001", "https://cars.example.com"]
        );
    }

    #[test]
    fn drops_empty_entries() {
        assert_eq!(parse_origins("http://localhost:3001,,"), vec!["http://localhost:3001"]);
        assert!(parse_origins("  ").is_empty());
    }
}
