//! Shared types, errors, and configuration for Carteira.
//!
//! This crate provides common types used across all other crates:
//! - Money helpers with decimal precision
//! - Typed IDs for type-safe entity references
//! - Cursor pagination types for history endpoints
//! - Application-wide error types
//! - Configuration management
//! - Bearer token issuing and verification

pub mod auth;
pub mod config;
pub mod error;
pub mod jwt;
pub mod types;

pub use auth::Claims;
pub use config::AppConfig;
pub use error::{AppError, AppResult};
pub use jwt::{JwtConfig, JwtError, JwtService};
