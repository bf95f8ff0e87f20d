//! Initial database migration.
//!
//! Creates the category enum, the users table (balance plus optimistic
//! version) and the transactions table with its history indexes.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();

        // ============================================================
        // PART 1: ENUMS
        // ============================================================
        db.execute_unprepared(ENUMS_SQL).await?;

        // ============================================================
        // PART 2: TABLES
        // ============================================================
        db.execute_unprepared(USERS_SQL).await?;
        db.execute_unprepared(TRANSACTIONS_SQL).await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();
        db.execute_unprepared(DROP_SQL).await?;
        Ok(())
    }
}

const ENUMS_SQL: &str = r"
-- Transaction categories; the sign of `value` follows the category
CREATE TYPE transaction_category AS ENUM (
    'deposit',
    'income',
    'withdrawal',
    'transfer',
    'fund_investment',
    'treasury_investment',
    'retirement_investment',
    'stock_investment',
    'interest_income'
);
";

const USERS_SQL: &str = r"
CREATE TABLE users (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    name VARCHAR(255) NOT NULL,
    email VARCHAR(255) NOT NULL UNIQUE,
    password_hash VARCHAR(255) NOT NULL,
    balance NUMERIC(14, 2) NOT NULL DEFAULT 0,
    version BIGINT NOT NULL DEFAULT 0,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),

    CONSTRAINT chk_users_balance_non_negative CHECK (balance >= 0)
);
";

const TRANSACTIONS_SQL: &str = r"
CREATE TABLE transactions (
    id UUID PRIMARY KEY,
    user_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
    category transaction_category NOT NULL,
    value NUMERIC(14, 2) NOT NULL,
    file TEXT,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),

    CONSTRAINT chk_transactions_value_sign CHECK (
        (category IN ('deposit', 'income', 'interest_income') AND value >= 0)
        OR (category NOT IN ('deposit', 'income', 'interest_income') AND value <= 0)
    )
);

-- Statement and history pagination: newest first, id breaks ties
CREATE INDEX idx_transactions_user_created
    ON transactions(user_id, created_at DESC, id DESC);

CREATE INDEX idx_transactions_user_category_created
    ON transactions(user_id, category, created_at DESC, id DESC);
";

const DROP_SQL: &str = r"
DROP TABLE IF EXISTS transactions CASCADE;
DROP TABLE IF EXISTS users CASCADE;
DROP TYPE IF EXISTS transaction_category CASCADE;
";
