//! Accounts: password hashing, registration and login.

mod account;
mod password;

pub use account::{AccountError, AccountService};
pub use password::{PasswordError, hash_password, verify_password};
