//! HTTP API layer with Axum routes and middleware.
//!
//! This crate provides:
//! - REST API routes
//! - Bearer token middleware
//! - Request extractors
//! - Error responses

pub mod error;
pub mod extractors;
pub mod middleware;
pub mod routes;

use std::sync::Arc;

use axum::Router;
use axum::extract::DefaultBodyLimit;
use carteira_core::auth::AccountService;
use carteira_core::ledger::LedgerService;
use carteira_core::statement::StatementService;
use carteira_core::store::{TransactionRepository, UserRepository};
use carteira_db::{TransactionRepository as PgTransactions, UserRepository as PgUsers};
use carteira_shared::{AppConfig, JwtService};
use sea_orm::DatabaseConnection;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Room left in the body limit for the non-file multipart fields.
const MULTIPART_OVERHEAD_BYTES: usize = 16 * 1024;

/// Application state shared across handlers.
pub struct AppState<U, T> {
    /// Balance-changing operations.
    pub ledger: LedgerService<U, T>,
    /// Read-only statement queries.
    pub statements: StatementService<U, T>,
    /// Registration and login.
    pub accounts: AccountService<U>,
    /// JWT service for token validation.
    pub jwt_service: Arc<JwtService>,
    /// Number of transactions on the statement endpoint.
    pub statement_size: u64,
    /// Largest accepted receipt image.
    pub max_attachment_bytes: usize,
}

impl<U, T> Clone for AppState<U, T> {
    fn clone(&self) -> Self {
        Self {
            ledger: self.ledger.clone(),
            statements: self.statements.clone(),
            accounts: self.accounts.clone(),
            jwt_service: Arc::clone(&self.jwt_service),
            statement_size: self.statement_size,
            max_attachment_bytes: self.max_attachment_bytes,
        }
    }
}

/// State backed by the Postgres repositories.
pub type PgAppState = AppState<PgUsers, PgTransactions>;

impl<U: UserRepository, T: TransactionRepository> AppState<U, T> {
    /// Wires the services over the given repositories.
    pub fn new(
        users: Arc<U>,
        transactions: Arc<T>,
        jwt_service: JwtService,
        config: &AppConfig,
    ) -> Self {
        Self {
            ledger: LedgerService::new(Arc::clone(&users), Arc::clone(&transactions))
                .with_max_conflict_retries(config.ledger.max_conflict_retries),
            statements: StatementService::new(Arc::clone(&users), transactions),
            accounts: AccountService::new(users, jwt_service.clone()),
            jwt_service: Arc::new(jwt_service),
            statement_size: config.ledger.statement_size,
            max_attachment_bytes: config.uploads.max_attachment_bytes,
        }
    }
}

impl PgAppState {
    /// Builds the state over a database connection pool.
    pub fn from_database(db: DatabaseConnection, jwt_service: JwtService, config: &AppConfig) -> Self {
        Self::new(
            Arc::new(PgUsers::new(db.clone())),
            Arc::new(PgTransactions::new(db)),
            jwt_service,
            config,
        )
    }
}

/// Creates the main application router.
pub fn create_router<U, T>(state: AppState<U, T>) -> Router
where
    U: UserRepository + 'static,
    T: TransactionRepository + 'static,
{
    let body_limit = state.max_attachment_bytes + MULTIPART_OVERHEAD_BYTES;

    Router::new()
        .merge(routes::api_routes(&state))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any)
                .expose_headers(Any),
        )
        .with_state(state)
}
