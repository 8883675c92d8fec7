//! Wallet adapter seam and a mock implementation.
//! The produced signature is opaque: nothing persists or verifies it.

use async_trait::async_trait;
use bigdecimal::BigDecimal;
use rand::distributions::Alphanumeric;
use rand::Rng;
use thiserror::Error;
use tokio::sync::Mutex;

use crate::domain::Cryptocurrency;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum WalletError {
    #[error("Wallet not connected")]
    NotConnected,

    #[error("Invalid transfer request: {0}")]
    InvalidRequest(String),
}

/// What the user asks the wallet to sign.
#[derive(Debug, Clone, PartialEq)]
pub struct TransferRequest {
    pub amount: BigDecimal,
    pub cryptocurrency: Cryptocurrency,
    pub recipient_address: String,
}

impl TransferRequest {
    pub fn validate(&self) -> Result<(), WalletError> {
        if self.amount <= BigDecimal::from(0) {
            return Err(WalletError::InvalidRequest(
                "amount must be greater than zero".to_string(),
            ));
        }
        if self.recipient_address.trim().is_empty() {
            return Err(WalletError::InvalidRequest(
                "recipient address is required".to_string(),
            ));
        }
        Ok(())
    }
}

#[async_trait]
pub trait WalletAdapter: Send + Sync {
    async fn connect(&self) -> Result<String, WalletError>;

    async fn disconnect(&self) -> Result<(), WalletError>;

    async fn get_address(&self) -> Result<String, WalletError>;

    async fn sign_transaction(&self, request: &TransferRequest) -> Result<String, WalletError>;
}

fn random_suffix() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(11)
        .map(char::from)
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

/// Stand-in wallet producing random addresses and signatures.
#[derive(Debug, Default)]
pub struct MockWallet {
    address: Mutex<Option<String>>,
}

impl MockWallet {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl WalletAdapter for MockWallet {
    async fn connect(&self) -> Result<String, WalletError> {
        let address = format!("mock_{}", random_suffix());
        *self.address.lock().await = Some(address.clone());
        tracing::debug!(address = %address, "mock wallet connected");
        Ok(address)
    }

    async fn disconnect(&self) -> Result<(), WalletError> {
        *self.address.lock().await = None;
        Ok(())
    }

    async fn get_address(&self) -> Result<String, WalletError> {
        self.address
            .lock()
            .await
            .clone()
            .ok_or(WalletError::NotConnected)
    }

    async fn sign_transaction(&self, request: &TransferRequest) -> Result<String, WalletError> {
        if self.address.lock().await.is_none() {
            return Err(WalletError::NotConnected);
        }
        request.validate()?;
        Ok(format!("mock_signed_tx_{}", random_suffix()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn transfer() -> TransferRequest {
        TransferRequest {
            amount: BigDecimal::from(3),
            cryptocurrency: Cryptocurrency::Sol,
            recipient_address: "recipient".to_string(),
        }
    }

    #[tokio::test]
    async fn connect_then_sign() {
        let wallet = MockWallet::new();
        let address = wallet.connect().await.unwrap();
        assert!(address.starts_with("mock_"));
        assert_eq!(wallet.get_address().await.unwrap(), address);

        let signature = wallet.sign_transaction(&transfer()).await.unwrap();
        assert!(signature.starts_with("mock_signed_tx_"));
    }

    #[tokio::test]
    async fn disconnected_wallet_refuses_requests() {
        let wallet = MockWallet::new();
        assert_eq!(wallet.get_address().await, Err(WalletError::NotConnected));
        assert_eq!(
            wallet.sign_transaction(&transfer()).await,
            Err(WalletError::NotConnected)
        );

        wallet.connect().await.unwrap();
        wallet.disconnect().await.unwrap();
        assert_eq!(wallet.get_address().await, Err(WalletError::NotConnected));
    }

    #[tokio::test]
    async fn rejects_invalid_transfer() {
        let wallet = MockWallet::new();
        wallet.connect().await.unwrap();

        let mut request = transfer();
        request.amount = BigDecimal::from(0);
        assert!(matches!(
            wallet.sign_transaction(&request).await,
            Err(WalletError::InvalidRequest(_))
        ));

        let mut request = transfer();
        request.recipient_address = "  ".to_string();
        assert!(matches!(
            wallet.sign_transaction(&request).await,
            Err(WalletError::InvalidRequest(_))
        ));
    }
}
