//! Core business logic for Carteira.
//!
//! This crate contains pure business logic with no web or database
//! dependencies. Stores are reached through the traits in [`store`].
//!
//! # Modules
//!
//! - `ledger` - Transactions, sign policy and the running balance
//! - `statement` - Statement, history search and investment breakdown
//! - `auth` - Password hashing, registration and login
//! - `receipt` - Receipt image validation
//! - `store` - Repository traits (and an in-memory store for tests)

pub mod auth;
pub mod ledger;
pub mod receipt;
pub mod statement;
pub mod store;
