// SPDX-License-Identifier: AGPL-3.0-or-later

//! Transaction repository over the flat-file store.
//!
//! Transactions are append-only; nothing here mutates or deletes a row. The
//! credit-and-record sequence for payment captures lives in the wallet
//! service, which needs the transactions guard across the uniqueness check
//! and the balance update.

use crate::models::Transaction;

use super::super::{Collection, JsonStore, StorageResult};

/// Repository for wallet credit records.
pub struct TransactionRepository<'a> {
    store: &'a JsonStore,
}

impl<'a> TransactionRepository<'a> {
    pub fn new(store: &'a JsonStore) -> Self {
        Self { store }
    }

    pub async fn append(&self, transaction: &Transaction) -> StorageResult<()> {
        let guard = self.store.collection(Collection::Transactions).await;
        let mut transactions: Vec<Transaction> = guard.read()?;
        transactions.push(transaction.clone());
        guard.write(&transactions)?;
        Ok(())
    }

    /// Find the transaction recorded for a `(user, order)` pair, if any.
    pub async fn find_by_order(
        &self,
        user_id: &str,
        order_id: &str,
    ) -> StorageResult<Option<Transaction>> {
        let guard = self.store.collection(Collection::Transactions).await;
        let transactions: Vec<Transaction> = guard.read()?;
        Ok(transactions
            .into_iter()
            .find(|t| t.user_id == user_id && t.order_id == order_id))
    }

    /// All transactions for a user, newest first.
    pub async fn list_for_user(&self, user_id: &str) -> StorageResult<Vec<Transaction>> {
        let guard = self.store.collection(Collection::Transactions).await;
        let transactions: Vec<Transaction> = guard.read()?;
        let mut for_user: Vec<Transaction> = transactions
            .into_iter()
            .filter(|t| t.user_id == user_id)
            .collect();
        for_user.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(for_user)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::StoragePaths;
    use chrono::{Duration, Utc};
    use tempfile::TempDir;

    fn test_store() -> (JsonStore, TempDir) {
        let dir = TempDir::new().expect("tempdir");
        let store = JsonStore::new(StoragePaths::new(dir.path()));
        store.initialize().expect("initialize");
        (store, dir)
    }

    #[tokio::test]
    async fn append_and_find_by_order() {
        let (store, _dir) = test_store();
        let repo = TransactionRepository::new(&store);

        let tx = Transaction::new("u1", "ORDER-1", 10.0, 10.0, "EUR", "COMPLETED");
        repo.append(&tx).await.unwrap();

        let found = repo.find_by_order("u1", "ORDER-1").await.unwrap();
        assert_eq!(found, Some(tx));
        assert!(repo.find_by_order("u2", "ORDER-1").await.unwrap().is_none());
        assert!(repo.find_by_order("u1", "ORDER-2").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn list_is_per_user_newest_first() {
        let (store, _dir) = test_store();
        let repo = TransactionRepository::new(&store);

        let mut older = Transaction::new("u1", "O-1", 5.0, 5.0, "EUR", "COMPLETED");
        older.created_at = Utc::now() - Duration::hours(2);
        let newer = Transaction::new("u1", "O-2", 7.0, 7.0, "EUR", "COMPLETED");
        let other = Transaction::new("u2", "O-3", 9.0, 9.0, "EUR", "COMPLETED");

        repo.append(&older).await.unwrap();
        repo.append(&newer).await.unwrap();
        repo.append(&other).await.unwrap();

        let listed = repo.list_for_user("u1").await.unwrap();
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].order_id, "O-2");
        assert_eq!(listed[1].order_id, "O-1");
    }
}
