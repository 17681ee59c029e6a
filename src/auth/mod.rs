//! # Authentication Module
//!
//! Password hashing, JWT issuance and validation, the authentication
//! service orchestrating register/login, and the middleware that secures
//! write endpoints.

pub mod jwt;
pub mod middleware;
pub mod models;
pub mod password;
pub mod service;
