//! In-process implementation of TransactionRepository.

use async_trait::async_trait;
use chrono::Utc;
use std::collections::BTreeMap;
use tokio::sync::RwLock;

use crate::domain::{NewTransaction, Transaction, TransactionStatus};
use crate::ports::{RepositoryError, RepositoryResult, TransactionRepository};

#[derive(Debug)]
struct Inner {
    next_id: i64,
    rows: BTreeMap<i64, Transaction>,
}

/// Volatile repository for tests and zero-dependency runs.
/// Id assignment and insertion happen under one write guard.
#[derive(Debug)]
pub struct MemoryTransactionRepository {
    inner: RwLock<Inner>,
}

impl MemoryTransactionRepository {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(Inner {
                next_id: 1,
                rows: BTreeMap::new(),
            }),
        }
    }
}

impl Default for MemoryTransactionRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TransactionRepository for MemoryTransactionRepository {
    fn backend(&self) -> &'static str {
        "memory"
    }

    async fn create(&self, tx: NewTransaction) -> RepositoryResult<Transaction> {
        let mut inner = self.inner.write().await;
        let id = inner.next_id;
        inner.next_id += 1;

        let stored = Transaction::from_new(id, tx, Utc::now());
        inner.rows.insert(id, stored.clone());
        tracing::debug!(id, "stored transaction in memory");

        Ok(stored)
    }

    async fn list(&self) -> RepositoryResult<Vec<Transaction>> {
        let inner = self.inner.read().await;
        let mut rows: Vec<Transaction> = inner.rows.values().cloned().collect();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(rows)
    }

    async fn get_by_id(&self, id: i64) -> RepositoryResult<Transaction> {
        self.inner
            .read()
            .await
            .rows
            .get(&id)
            .cloned()
            .ok_or(RepositoryError::NotFound(id))
    }

    async fn update_status(
        &self,
        id: i64,
        status: TransactionStatus,
    ) -> RepositoryResult<Transaction> {
        let mut inner = self.inner.write().await;
        let row = inner
            .rows
            .get_mut(&id)
            .ok_or(RepositoryError::NotFound(id))?;
        row.status = status;
        tracing::debug!(id, status = %status, "updated transaction status in memory");

        Ok(row.clone())
    }

    async fn health_check(&self) -> RepositoryResult<()> {
        Ok(())
    }
}
