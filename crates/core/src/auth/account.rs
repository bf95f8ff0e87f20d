//! Registration and login.

use std::sync::Arc;

use carteira_shared::auth::{AuthResponse, LoginRequest, RegisterRequest};
use carteira_shared::{AppError, JwtError, JwtService};
use thiserror::Error;

use super::password::{PasswordError, hash_password, verify_password};
use crate::ledger::types::{NewUser, User};
use crate::store::{StoreError, UserRepository};

/// Errors from account operations.
#[derive(Debug, Error)]
pub enum AccountError {
    /// The email is already registered.
    #[error("email already registered")]
    EmailTaken,

    /// Unknown email or wrong password.
    #[error("invalid credentials")]
    InvalidCredentials,

    /// Password hashing failed.
    #[error(transparent)]
    Password(#[from] PasswordError),

    /// Token issuing failed.
    #[error(transparent)]
    Token(#[from] JwtError),

    /// Store failure.
    #[error(transparent)]
    Store(StoreError),
}

impl From<StoreError> for AccountError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Duplicate(_) => Self::EmailTaken,
            other => Self::Store(other),
        }
    }
}

impl AccountError {
    /// Returns the error code for API responses.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::EmailTaken => "EMAIL_TAKEN",
            Self::InvalidCredentials => "INVALID_CREDENTIALS",
            Self::Password(_) | Self::Token(_) | Self::Store(_) => "INTERNAL_ERROR",
        }
    }
}

impl From<AccountError> for AppError {
    fn from(err: AccountError) -> Self {
        match err {
            AccountError::EmailTaken => Self::Conflict("E-mail já cadastrado".to_string()),
            // Mobile clients key off this exact text and status.
            AccountError::InvalidCredentials => {
                Self::NotFound("E-mail e/ou Senha incorretos".to_string())
            }
            AccountError::Store(e) => Self::Database(e.to_string()),
            e @ (AccountError::Password(_) | AccountError::Token(_)) => Self::Internal(e.to_string()),
        }
    }
}

/// Registers users and issues bearer tokens.
#[derive(Debug)]
pub struct AccountService<U> {
    users: Arc<U>,
    jwt: JwtService,
}

impl<U> Clone for AccountService<U> {
    fn clone(&self) -> Self {
        Self {
            users: Arc::clone(&self.users),
            jwt: self.jwt.clone(),
        }
    }
}

impl<U: UserRepository> AccountService<U> {
    /// Creates an account service.
    #[must_use]
    pub fn new(users: Arc<U>, jwt: JwtService) -> Self {
        Self { users, jwt }
    }

    /// Registers a user with a zero balance and logs them in.
    ///
    /// The request is expected to be validated already.
    ///
    /// # Errors
    ///
    /// Returns `EmailTaken` for a duplicate email.
    pub async fn register(&self, request: RegisterRequest) -> Result<AuthResponse, AccountError> {
        if self.users.find_by_email(&request.email).await?.is_some() {
            return Err(AccountError::EmailTaken);
        }

        let password_hash = hash_password(&request.password)?;
        let user = self
            .users
            .create(NewUser {
                name: request.name,
                email: request.email,
                password_hash,
            })
            .await?;

        tracing::info!(user_id = %user.id, "user registered");
        self.issue(&user)
    }

    /// Verifies credentials and issues a token.
    ///
    /// # Errors
    ///
    /// Returns `InvalidCredentials` for an unknown email or a wrong password.
    pub async fn login(&self, request: LoginRequest) -> Result<AuthResponse, AccountError> {
        let Some(user) = self.users.find_by_email(&request.email).await? else {
            return Err(AccountError::InvalidCredentials);
        };

        if !verify_password(&request.password, &user.password_hash)? {
            tracing::debug!(user_id = %user.id, "wrong password");
            return Err(AccountError::InvalidCredentials);
        }

        self.issue(&user)
    }

    fn issue(&self, user: &User) -> Result<AuthResponse, AccountError> {
        let token = self
            .jwt
            .generate_access_token(user.id.into_inner(), &user.email)?;
        Ok(AuthResponse {
            user: user.profile(),
            token,
        })
    }
}
