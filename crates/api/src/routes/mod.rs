//! API route definitions.

use std::sync::Arc;

use axum::{Router, middleware};
use carteira_core::store::{TransactionRepository, UserRepository};

use crate::{AppState, middleware::auth::auth_middleware};

pub mod auth;
pub mod health;
pub mod transactions;

/// Creates the API router; transaction routes require a bearer token.
pub fn api_routes<U, T>(state: &AppState<U, T>) -> Router<AppState<U, T>>
where
    U: UserRepository + 'static,
    T: TransactionRepository + 'static,
{
    let protected_routes = Router::new()
        .merge(transactions::routes())
        .layer(middleware::from_fn_with_state(
            Arc::clone(&state.jwt_service),
            auth_middleware,
        ));

    Router::new()
        .merge(health::routes())
        .merge(auth::routes())
        .merge(protected_routes)
}
