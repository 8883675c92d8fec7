//! HTTP client for the transaction API.

use reqwest::{Response, StatusCode};
use serde::Deserialize;
use serde_json::{json, Value};
use std::time::Duration;
use thiserror::Error;

use crate::domain::{Cryptocurrency, NewTransaction, Transaction, TransactionStatus};
use crate::services::{PriceFeed, TransferRequest, WalletAdapter};
use crate::validation::RawTransactionInput;

#[derive(Error, Debug)]
pub enum ClientError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Invalid base URL: {0}")]
    Url(#[from] url::ParseError),

    #[error("Server returned {status}: {message}")]
    Api {
        status: StatusCode,
        message: String,
        body: Option<Value>,
    },
}

impl ClientError {
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            ClientError::Api { status, .. } => Some(*status),
            ClientError::Http(e) => e.status(),
            ClientError::Url(_) => None,
        }
    }
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: String,
}

/// Builds the wire form of a payment request.
pub fn payment_request(tx: &NewTransaction) -> RawTransactionInput {
    RawTransactionInput {
        amount: Some(Value::String(tx.amount.to_string())),
        cryptocurrency: Some(tx.cryptocurrency.to_string()),
        sender_address: Some(tx.sender_address.clone()),
        recipient_address: Some(tx.recipient_address.clone()),
        status: Some(tx.status.to_string()),
        price_at_transaction: Some(Value::String(tx.price_at_transaction.to_string())),
    }
}

#[derive(Debug, Clone)]
pub struct ApiClient {
    base_url: url::Url,
    http: reqwest::Client,
}

impl ApiClient {
    pub fn new(base_url: &str) -> Result<Self, ClientError> {
        let mut base_url = url::Url::parse(base_url)?;
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }
        Ok(Self {
            base_url,
            http: reqwest::Client::new(),
        })
    }

    fn endpoint(&self, path: &str) -> Result<url::Url, ClientError> {
        Ok(self.base_url.join(path)?)
    }

    pub async fn create_transaction(
        &self,
        input: &RawTransactionInput,
    ) -> Result<Transaction, ClientError> {
        let response = self
            .http
            .post(self.endpoint("transactions")?)
            .json(input)
            .send()
            .await?;
        decode(response).await
    }

    pub async fn list_transactions(&self) -> Result<Vec<Transaction>, ClientError> {
        let response = self.http.get(self.endpoint("transactions")?).send().await?;
        decode(response).await
    }

    pub async fn get_transaction(&self, id: i64) -> Result<Transaction, ClientError> {
        let response = self
            .http
            .get(self.endpoint(&format!("transactions/{}", id))?)
            .send()
            .await?;
        decode(response).await
    }

    pub async fn update_status(
        &self,
        id: i64,
        status: TransactionStatus,
    ) -> Result<Transaction, ClientError> {
        let response = self
            .http
            .patch(self.endpoint(&format!("transactions/{}/status", id))?)
            .json(&json!({ "status": status }))
            .send()
            .await?;
        decode(response).await
    }
}

/// Polls a transaction until it leaves `pending`.
pub async fn await_settlement(
    api: &ApiClient,
    id: i64,
    interval: Duration,
) -> Result<Transaction, ClientError> {
    loop {
        let tx = api.get_transaction(id).await?;
        if tx.status != TransactionStatus::Pending {
            return Ok(tx);
        }
        tracing::debug!(id, "transaction still pending");
        tokio::time::sleep(interval).await;
    }
}

/// Payment flow: sign with the connected wallet, stamp the current price,
/// submit as `pending`.
pub async fn submit_payment(
    api: &ApiClient,
    wallet: &dyn WalletAdapter,
    prices: &dyn PriceFeed,
    amount: bigdecimal::BigDecimal,
    cryptocurrency: Cryptocurrency,
    recipient_address: String,
) -> anyhow::Result<Transaction> {
    let sender_address = wallet.get_address().await?;
    let request = TransferRequest {
        amount,
        cryptocurrency,
        recipient_address,
    };
    let signature = wallet.sign_transaction(&request).await?;
    tracing::debug!(signature = %signature, "transfer signed");

    let price_at_transaction = prices
        .quote(cryptocurrency)
        .map(|quote| quote.price_decimal())
        .unwrap_or_else(|| bigdecimal::BigDecimal::from(1));

    let new_tx = NewTransaction {
        amount: request.amount,
        cryptocurrency,
        sender_address,
        recipient_address: request.recipient_address,
        status: TransactionStatus::Pending,
        price_at_transaction,
    };

    Ok(api.create_transaction(&payment_request(&new_tx)).await?)
}

async fn decode<T: serde::de::DeserializeOwned>(response: Response) -> Result<T, ClientError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response.json().await?);
    }

    let text = response.text().await.unwrap_or_default();
    let body = serde_json::from_str::<Value>(&text).ok();
    let message = body
        .as_ref()
        .and_then(|b| serde_json::from_value::<ErrorBody>(b.clone()).ok())
        .map(|b| b.error)
        .unwrap_or(text);

    Err(ClientError::Api {
        status,
        message,
        body,
    })
}
