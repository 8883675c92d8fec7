//! Storage port for transactions.
//! Handlers and use cases depend on this trait, never on a concrete backend.

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::{NewTransaction, Transaction, TransactionStatus};

#[derive(Error, Debug)]
pub enum RepositoryError {
    #[error("Transaction {0} not found")]
    NotFound(i64),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Corrupt record {id}: {reason}")]
    Corrupt { id: i64, reason: String },
}

pub type RepositoryResult<T> = Result<T, RepositoryError>;

/// Canonical collection of transaction records.
///
/// Implementations hand out clones; callers never get mutable access to a
/// stored record. `list` returns newest first (`created_at` descending, ties
/// broken by `id` descending).
#[async_trait]
pub trait TransactionRepository: Send + Sync {
    /// Human readable backend name, reported by `/health`.
    fn backend(&self) -> &'static str;

    async fn create(&self, tx: NewTransaction) -> RepositoryResult<Transaction>;

    async fn list(&self) -> RepositoryResult<Vec<Transaction>>;

    async fn get_by_id(&self, id: i64) -> RepositoryResult<Transaction>;

    /// Overwrites `status` only. Every other field, `created_at` included,
    /// is left untouched.
    async fn update_status(
        &self,
        id: i64,
        status: TransactionStatus,
    ) -> RepositoryResult<Transaction>;

    async fn health_check(&self) -> RepositoryResult<()>;
}
