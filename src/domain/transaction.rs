//! Transaction domain entity.
//! Framework-agnostic representation of a crypto payment record.

use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Currencies a payment can be made in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Cryptocurrency {
    #[serde(rename = "SOL")]
    Sol,
    #[serde(rename = "USDC")]
    Usdc,
    #[serde(rename = "ETH")]
    Eth,
    #[serde(rename = "BTC")]
    Btc,
}

impl Cryptocurrency {
    pub const ALL: [Cryptocurrency; 4] = [
        Cryptocurrency::Sol,
        Cryptocurrency::Usdc,
        Cryptocurrency::Eth,
        Cryptocurrency::Btc,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Cryptocurrency::Sol => "SOL",
            Cryptocurrency::Usdc => "USDC",
            Cryptocurrency::Eth => "ETH",
            Cryptocurrency::Btc => "BTC",
        }
    }
}

impl fmt::Display for Cryptocurrency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Cryptocurrency {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Cryptocurrency::ALL
            .into_iter()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| UnknownVariant(s.to_string()))
    }
}

/// Lifecycle state of a transaction. Any state may overwrite any other.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionStatus {
    Pending,
    Completed,
    Failed,
}

impl TransactionStatus {
    pub const ALL: [TransactionStatus; 3] = [
        TransactionStatus::Pending,
        TransactionStatus::Completed,
        TransactionStatus::Failed,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionStatus::Pending => "pending",
            TransactionStatus::Completed => "completed",
            TransactionStatus::Failed => "failed",
        }
    }
}

impl fmt::Display for TransactionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TransactionStatus {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TransactionStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| UnknownVariant(s.to_string()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownVariant(pub String);

impl fmt::Display for UnknownVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown value '{}'", self.0)
    }
}

impl std::error::Error for UnknownVariant {}

/// Validated input for a new transaction. `id` and `created_at` are assigned
/// by the repository.
#[derive(Debug, Clone, PartialEq)]
pub struct NewTransaction {
    pub amount: BigDecimal,
    pub cryptocurrency: Cryptocurrency,
    pub sender_address: String,
    pub recipient_address: String,
    pub status: TransactionStatus,
    pub price_at_transaction: BigDecimal,
}

/// Domain entity representing a stored transaction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    pub id: i64,
    pub amount: BigDecimal,
    pub cryptocurrency: Cryptocurrency,
    pub sender_address: String,
    pub recipient_address: String,
    pub status: TransactionStatus,
    pub price_at_transaction: BigDecimal,
    pub created_at: DateTime<Utc>,
}

impl Transaction {
    pub fn from_new(id: i64, new: NewTransaction, created_at: DateTime<Utc>) -> Self {
        Self {
            id,
            amount: new.amount,
            cryptocurrency: new.cryptocurrency,
            sender_address: new.sender_address,
            recipient_address: new.recipient_address,
            status: new.status,
            price_at_transaction: new.price_at_transaction,
            created_at,
        }
    }

    /// Value of the transfer in USD at the recorded price.
    pub fn value_at_transaction(&self) -> BigDecimal {
        &self.amount * &self.price_at_transaction
    }
}
