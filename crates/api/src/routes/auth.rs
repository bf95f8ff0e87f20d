//! Account routes for registration and login.

use axum::{Json, Router, extract::State, http::StatusCode, routing::post};
use carteira_core::store::{TransactionRepository, UserRepository};
use carteira_shared::auth::{AuthResponse, LoginRequest, RegisterRequest};
use tracing::info;

use crate::AppState;
use crate::error::ApiResult;
use crate::extractors::ValidatedJson;

/// Creates the account router.
pub fn routes<U, T>() -> Router<AppState<U, T>>
where
    U: UserRepository + 'static,
    T: TransactionRepository + 'static,
{
    Router::new()
        .route("/user/login", post(login::<U, T>))
        .route("/user/register", post(register::<U, T>))
}

/// POST /user/login - Verify credentials and issue a token.
async fn login<U, T>(
    State(state): State<AppState<U, T>>,
    ValidatedJson(payload): ValidatedJson<LoginRequest>,
) -> ApiResult<Json<AuthResponse>>
where
    U: UserRepository + 'static,
    T: TransactionRepository + 'static,
{
    let response = state.accounts.login(payload).await?;
    info!(user_id = %response.user.id, "user logged in");
    Ok(Json(response))
}

/// POST /user/register - Create an account with a zero balance.
async fn register<U, T>(
    State(state): State<AppState<U, T>>,
    ValidatedJson(payload): ValidatedJson<RegisterRequest>,
) -> ApiResult<(StatusCode, Json<AuthResponse>)>
where
    U: UserRepository + 'static,
    T: TransactionRepository + 'static,
{
    let response = state.accounts.register(payload).await?;
    Ok((StatusCode::CREATED, Json(response)))
}
