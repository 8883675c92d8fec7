//! Postgres implementation of TransactionRepository.

use async_trait::async_trait;
use sqlx::PgPool;

use crate::domain::{Cryptocurrency, NewTransaction, Transaction, TransactionStatus};
use crate::ports::{RepositoryError, RepositoryResult, TransactionRepository};

const COLUMNS: &str = "id, amount, cryptocurrency, sender_address, recipient_address, \
                       status, price_at_transaction, created_at";

/// Postgres-backed transaction repository.
#[derive(Clone)]
pub struct PostgresTransactionRepository {
    pool: PgPool,
}

impl PostgresTransactionRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TransactionRepository for PostgresTransactionRepository {
    fn backend(&self) -> &'static str {
        "postgres"
    }

    async fn create(&self, tx: NewTransaction) -> RepositoryResult<Transaction> {
        let row = sqlx::query_as::<_, TransactionRow>(&format!(
            r#"
            INSERT INTO transactions (
                amount, cryptocurrency, sender_address, recipient_address,
                status, price_at_transaction
            ) VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {COLUMNS}
            "#
        ))
        .bind(&tx.amount)
        .bind(tx.cryptocurrency.as_str())
        .bind(&tx.sender_address)
        .bind(&tx.recipient_address)
        .bind(tx.status.as_str())
        .bind(&tx.price_at_transaction)
        .fetch_one(&self.pool)
        .await?;

        tracing::debug!(id = row.id, "inserted transaction");
        row.into_domain()
    }

    async fn list(&self) -> RepositoryResult<Vec<Transaction>> {
        let rows = sqlx::query_as::<_, TransactionRow>(&format!(
            "SELECT {COLUMNS} FROM transactions ORDER BY created_at DESC, id DESC"
        ))
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(TransactionRow::into_domain).collect()
    }

    async fn get_by_id(&self, id: i64) -> RepositoryResult<Transaction> {
        let row = sqlx::query_as::<_, TransactionRow>(&format!(
            "SELECT {COLUMNS} FROM transactions WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.ok_or(RepositoryError::NotFound(id))?.into_domain()
    }

    async fn update_status(
        &self,
        id: i64,
        status: TransactionStatus,
    ) -> RepositoryResult<Transaction> {
        let row = sqlx::query_as::<_, TransactionRow>(&format!(
            "UPDATE transactions SET status = $1 WHERE id = $2 RETURNING {COLUMNS}"
        ))
        .bind(status.as_str())
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        let row = row.ok_or(RepositoryError::NotFound(id))?;
        tracing::debug!(id, status = %status, "updated transaction status");
        row.into_domain()
    }

    async fn health_check(&self) -> RepositoryResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

/// Internal row type for SQLx. Not exposed outside the adapter.
#[derive(Debug, sqlx::FromRow)]
struct TransactionRow {
    id: i64,
    amount: bigdecimal::BigDecimal,
    cryptocurrency: String,
    sender_address: String,
    recipient_address: String,
    status: String,
    price_at_transaction: bigdecimal::BigDecimal,
    created_at: chrono::DateTime<chrono::Utc>,
}

impl TransactionRow {
    fn into_domain(self) -> RepositoryResult<Transaction> {
        let id = self.id;
        let corrupt = |reason: String| RepositoryError::Corrupt { id, reason };
        let cryptocurrency = self
            .cryptocurrency
            .parse::<Cryptocurrency>()
            .map_err(|e| corrupt(format!("cryptocurrency: {}", e)))?;
        let status = self
            .status
            .parse::<TransactionStatus>()
            .map_err(|e| corrupt(format!("status: {}", e)))?;

        Ok(Transaction {
            id,
            amount: self.amount,
            cryptocurrency,
            sender_address: self.sender_address,
            recipient_address: self.recipient_address,
            status,
            price_at_transaction: self.price_at_transaction,
            created_at: self.created_at,
        })
    }
}
