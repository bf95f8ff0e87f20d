//! Authentication types for JWT and account requests.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::{Validate, ValidationError};

/// JWT claims for access tokens.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (user ID).
    pub sub: Uuid,
    /// User email, the lookup key for every ledger operation.
    pub email: String,
    /// Issued at timestamp.
    pub iat: i64,
    /// Expiration timestamp.
    pub exp: i64,
}

impl Claims {
    /// Creates new claims for a user.
    #[must_use]
    pub fn new(user_id: Uuid, email: &str, expires_at: DateTime<Utc>) -> Self {
        let now = Utc::now();
        Self {
            sub: user_id,
            email: email.to_string(),
            iat: now.timestamp(),
            exp: expires_at.timestamp(),
        }
    }

    /// Returns the user ID from claims.
    #[must_use]
    pub const fn user_id(&self) -> Uuid {
        self.sub
    }

    /// Returns the email from claims.
    #[must_use]
    pub fn email(&self) -> &str {
        &self.email
    }
}

/// Login request payload.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct LoginRequest {
    /// User email.
    #[validate(email(message = "O E-mail deve estar em um formato válido"))]
    pub email: String,
    /// User password.
    #[validate(length(min = 1, message = "A senha é obrigatória"))]
    pub password: String,
}

/// Registration request payload.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct RegisterRequest {
    /// User email.
    #[validate(email(message = "O E-mail deve estar em um formato válido"))]
    pub email: String,
    /// User password.
    #[validate(custom(function = "validate_password_strength"))]
    pub password: String,
    /// User display name.
    #[validate(length(min = 1, message = "O nome é obrigatório"))]
    pub name: String,
}

/// User info returned in auth and statement responses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserInfo {
    /// User ID.
    pub id: Uuid,
    /// User display name.
    pub name: String,
    /// User email.
    pub email: String,
    /// Current balance.
    pub balance: Decimal,
    /// Registration timestamp.
    pub created_at: DateTime<Utc>,
}

/// Response for login and registration.
#[derive(Debug, Clone, Serialize)]
pub struct AuthResponse {
    /// Authenticated user.
    pub user: UserInfo,
    /// Bearer token.
    pub token: String,
}

/// Checks the password policy: 8+ chars with lowercase, uppercase, digit and symbol.
///
/// # Errors
///
/// Returns a `ValidationError` with code `weak_password` when any rule fails.
pub fn validate_password_strength(password: &str) -> Result<(), ValidationError> {
    let strong = password.chars().count() >= 8
        && password.chars().any(|c| c.is_ascii_lowercase())
        && password.chars().any(|c| c.is_ascii_uppercase())
        && password.chars().any(|c| c.is_ascii_digit())
        && password.chars().any(|c| !c.is_ascii_alphanumeric());

    if strong {
        Ok(())
    } else {
        Err(ValidationError::new("weak_password").with_message(
            "A senha deve conter pelo menos 8 caracteres, sendo pelo menos uma letra minúscula, \
             uma maiúscula, um número e um caractere especial"
                .into(),
        ))
    }
}
