// # Routes Module
//
// - This module contains all HTTP route handlers for the carlot server.
// - Routes are organized by functionality into separate submodules.
//
// ## Route Organization
// - Group related endpoints in the same module
// - Keep route handlers thin; credential decisions live in the auth service
//   and persistence in the database layer
// - Register routers in `server.rs`

/// Health check endpoint
pub mod health;

/// Registration, login, and logout endpoints
pub mod auth;

/// Car inventory CRUD endpoints
pub mod cars;
