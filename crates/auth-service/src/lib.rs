//! Auth Service Library
//!
//! Multi-tenant user backend built around a rotating JWT signing-key
//! trust chain. Keys live in an append-only store with overlapping
//! validity windows; a background task appends a fresh key weekly, and
//! token verification trials every currently-valid key newest-first so
//! tokens survive rotation without re-login.
//!
//! # Modules
//!
//! - `config` - Service configuration and rotation constants
//! - `crypto` - JWT signing/verification and password hashing
//! - `errors` - Error types and their HTTP mapping
//! - `handlers` - HTTP request handlers
//! - `middleware` - Bearer-token authentication middleware
//! - `models` - Data models
//! - `observability` - Metrics and log-correlation helpers
//! - `repositories` - Database access layer
//! - `routes` - Router assembly
//! - `services` - Business logic layer
//! - `tasks` - Background task scheduler and rotation task

pub mod config;
pub mod crypto;
pub mod errors;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod observability;
pub mod repositories;
pub mod routes;
pub mod services;
pub mod tasks;
