//! In-memory store used by unit tests and router tests.

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use carteira_shared::types::{TransactionId, UserId, money::to_money_scale};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use super::{StoreError, TransactionQuery, TransactionRepository, UserRepository};
use crate::ledger::category::TransactionCategory;
use crate::ledger::types::{BalanceCommit, NewUser, Transaction, TransactionWrite, User};

#[derive(Debug, Default)]
struct State {
    users: HashMap<UserId, User>,
    transactions: HashMap<TransactionId, Transaction>,
    /// Foreign balance writes applied right before the next commit.
    interference: Vec<(UserId, Decimal)>,
    commits: usize,
}

impl State {
    fn sorted_desc(&self, filter: impl Fn(&Transaction) -> bool) -> Vec<Transaction> {
        let mut found: Vec<Transaction> = self
            .transactions
            .values()
            .filter(|tx| filter(tx))
            .cloned()
            .collect();
        found.sort_by(|a, b| (b.created_at, b.id).cmp(&(a.created_at, a.id)));
        found
    }
}

/// Store backed by hash maps behind a mutex.
///
/// Implements both repository traits with the same atomicity guarantees as
/// the database implementation.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    state: Mutex<State>,
    fail_history: AtomicBool,
}

impl InMemoryStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Inserts a user with the given balance.
    pub fn seed_user(&self, name: &str, email: &str, balance: Decimal) -> User {
        let user = User {
            id: UserId::new(),
            name: name.to_string(),
            email: email.to_string(),
            password_hash: String::new(),
            balance: to_money_scale(balance),
            version: 0,
            created_at: Utc::now(),
        };
        self.lock().users.insert(user.id, user.clone());
        user
    }

    /// Inserts a transaction directly, bypassing the balance.
    pub fn seed_transaction(
        &self,
        user_id: UserId,
        category: TransactionCategory,
        value: Decimal,
        created_at: DateTime<Utc>,
    ) -> Transaction {
        let tx = Transaction {
            id: TransactionId::new(),
            category,
            value: to_money_scale(value),
            created_at,
            user_id,
            file: None,
        };
        self.lock().transactions.insert(tx.id, tx.clone());
        tx
    }

    /// Returns a snapshot of a user.
    pub fn user(&self, id: UserId) -> Option<User> {
        self.lock().users.get(&id).cloned()
    }

    /// Returns a snapshot of the user with this email.
    pub fn user_by_email(&self, email: &str) -> Option<User> {
        self.lock().users.values().find(|u| u.email == email).cloned()
    }

    /// Returns a snapshot of a transaction.
    pub fn transaction(&self, id: TransactionId) -> Option<Transaction> {
        self.lock().transactions.get(&id).cloned()
    }

    /// Number of stored transactions.
    pub fn transaction_count(&self) -> usize {
        self.lock().transactions.len()
    }

    /// Number of commits that were applied.
    pub fn commit_count(&self) -> usize {
        self.lock().commits
    }

    /// Makes history reads (`recent`, `search`) fail until reset.
    pub fn fail_history_reads(&self, fail: bool) {
        self.fail_history.store(fail, Ordering::SeqCst);
    }

    /// Simulates another writer changing the balance right before the next commit.
    pub fn interfere_before_next_commit(&self, user_id: UserId, delta: Decimal) {
        self.lock().interference.push((user_id, delta));
    }

    fn check_history(&self) -> Result<(), StoreError> {
        if self.fail_history.load(Ordering::SeqCst) {
            return Err(StoreError::Backend("history unavailable".to_string()));
        }
        Ok(())
    }
}

impl UserRepository for InMemoryStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        Ok(self
            .lock()
            .users
            .values()
            .find(|u| u.email == email)
            .cloned())
    }

    async fn create(&self, input: NewUser) -> Result<User, StoreError> {
        let mut state = self.lock();
        if state.users.values().any(|u| u.email == input.email) {
            return Err(StoreError::Duplicate(format!("email {}", input.email)));
        }
        let user = User {
            id: UserId::new(),
            name: input.name,
            email: input.email,
            password_hash: input.password_hash,
            balance: to_money_scale(Decimal::ZERO),
            version: 0,
            created_at: Utc::now(),
        };
        state.users.insert(user.id, user.clone());
        Ok(user)
    }
}

impl TransactionRepository for InMemoryStore {
    async fn find_by_id(
        &self,
        user_id: UserId,
        id: TransactionId,
    ) -> Result<Option<Transaction>, StoreError> {
        Ok(self
            .lock()
            .transactions
            .get(&id)
            .filter(|tx| tx.user_id == user_id)
            .cloned())
    }

    async fn recent(&self, user_id: UserId, limit: u64) -> Result<Vec<Transaction>, StoreError> {
        self.check_history()?;
        let limit = usize::try_from(limit).unwrap_or(usize::MAX);
        let mut found = self.lock().sorted_desc(move |tx| tx.user_id == user_id);
        found.truncate(limit);
        Ok(found)
    }

    async fn search(&self, query: &TransactionQuery) -> Result<Vec<Transaction>, StoreError> {
        self.check_history()?;
        let limit = usize::try_from(query.limit).unwrap_or(usize::MAX);
        let mut found = self.lock().sorted_desc(|tx| query.matches(tx));
        found.truncate(limit);
        Ok(found)
    }

    async fn sum_by_category(
        &self,
        user_id: UserId,
        categories: &[TransactionCategory],
    ) -> Result<BTreeMap<TransactionCategory, Decimal>, StoreError> {
        let state = self.lock();
        let mut sums = BTreeMap::new();
        for tx in state
            .transactions
            .values()
            .filter(|tx| tx.user_id == user_id && categories.contains(&tx.category))
        {
            *sums.entry(tx.category).or_insert(Decimal::ZERO) += tx.value;
        }
        Ok(sums)
    }

    async fn commit(&self, commit: BalanceCommit) -> Result<User, StoreError> {
        let mut state = self.lock();

        for (user_id, delta) in std::mem::take(&mut state.interference) {
            if let Some(user) = state.users.get_mut(&user_id) {
                user.balance += delta;
                user.version += 1;
            }
        }

        let current = state
            .users
            .get(&commit.user_id)
            .ok_or_else(|| StoreError::Backend(format!("user {} missing", commit.user_id)))?;
        if current.version != commit.expected_version {
            return Err(StoreError::StaleVersion(commit.user_id));
        }

        match commit.write {
            TransactionWrite::Insert(tx) => {
                if state.transactions.contains_key(&tx.id) {
                    return Err(StoreError::Duplicate(format!("transaction {}", tx.id)));
                }
                state.transactions.insert(tx.id, tx);
            }
            TransactionWrite::UpdateValue { id, value } => {
                let tx = state
                    .transactions
                    .get_mut(&id)
                    .filter(|tx| tx.user_id == commit.user_id)
                    .ok_or(StoreError::MissingTransaction(id))?;
                tx.value = value;
            }
            TransactionWrite::Delete(id) => {
                let owned = state
                    .transactions
                    .get(&id)
                    .is_some_and(|tx| tx.user_id == commit.user_id);
                if !owned {
                    return Err(StoreError::MissingTransaction(id));
                }
                state.transactions.remove(&id);
            }
        }

        state.commits += 1;
        let user = state
            .users
            .get_mut(&commit.user_id)
            .ok_or_else(|| StoreError::Backend(format!("user {} missing", commit.user_id)))?;
        user.balance = commit.new_balance;
        user.version += 1;
        Ok(user.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn deposit(user: &User, value: Decimal) -> Transaction {
        Transaction {
            id: TransactionId::new(),
            category: TransactionCategory::Deposit,
            value,
            created_at: Utc::now(),
            user_id: user.id,
            file: None,
        }
    }

    #[tokio::test]
    async fn test_commit_bumps_version_and_balance() {
        let store = InMemoryStore::new();
        let user = store.seed_user("Ana", "ana@example.com", dec!(10));

        let updated = store
            .commit(BalanceCommit {
                user_id: user.id,
                expected_version: 0,
                new_balance: dec!(15.00),
                write: TransactionWrite::Insert(deposit(&user, dec!(5.00))),
            })
            .await
            .unwrap();

        assert_eq!(updated.balance, dec!(15.00));
        assert_eq!(updated.version, 1);
        assert_eq!(store.transaction_count(), 1);
    }

    #[tokio::test]
    async fn test_stale_version_writes_nothing() {
        let store = InMemoryStore::new();
        let user = store.seed_user("Ana", "ana@example.com", dec!(10));
        store.interfere_before_next_commit(user.id, dec!(1));

        let err = store
            .commit(BalanceCommit {
                user_id: user.id,
                expected_version: 0,
                new_balance: dec!(15.00),
                write: TransactionWrite::Insert(deposit(&user, dec!(5.00))),
            })
            .await
            .unwrap_err();

        assert_eq!(err, StoreError::StaleVersion(user.id));
        assert_eq!(store.transaction_count(), 0);
        let after = store.user(user.id).unwrap();
        assert_eq!(after.balance, dec!(11.00));
        assert_eq!(after.version, 1);
    }

    #[tokio::test]
    async fn test_delete_of_foreign_transaction_is_missing() {
        let store = InMemoryStore::new();
        let owner = store.seed_user("Ana", "ana@example.com", dec!(10));
        let other = store.seed_user("Bia", "bia@example.com", dec!(10));
        let tx = store.seed_transaction(owner.id, TransactionCategory::Deposit, dec!(10), Utc::now());

        let err = store
            .commit(BalanceCommit {
                user_id: other.id,
                expected_version: 0,
                new_balance: dec!(0.00),
                write: TransactionWrite::Delete(tx.id),
            })
            .await
            .unwrap_err();

        assert_eq!(err, StoreError::MissingTransaction(tx.id));
        assert!(store.transaction(tx.id).is_some());
        assert_eq!(store.user(other.id).unwrap().balance, dec!(10.00));
    }

    #[tokio::test]
    async fn test_duplicate_email_rejected() {
        let store = InMemoryStore::new();
        store.seed_user("Ana", "ana@example.com", Decimal::ZERO);

        let err = UserRepository::create(
            &store,
            NewUser {
                name: "Outra Ana".into(),
                email: "ana@example.com".into(),
                password_hash: "hash".into(),
            },
        )
        .await
        .unwrap_err();

        assert!(matches!(err, StoreError::Duplicate(_)));
    }
}
