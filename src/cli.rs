use bigdecimal::BigDecimal;
use clap::{Parser, Subcommand};
use std::sync::Arc;
use std::time::Duration;

use crate::client::{await_settlement, submit_payment, ApiClient};
use crate::config::{Config, StorageBackend};
use crate::domain::{Cryptocurrency, Transaction, TransactionStatus};
use crate::ports::TransactionRepository;
use crate::services::{MockPriceFeed, MockWallet, PriceFeed, WalletAdapter};
use crate::validation::{parse_cryptocurrency, parse_positive_decimal, parse_status};

#[derive(Parser)]
#[command(name = "cryptopay")]
#[command(about = "CryptoPay - crypto payment transaction service", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the HTTP server (default)
    Serve,

    /// Transaction management commands against the configured store
    #[command(subcommand)]
    Tx(TxCommands),

    /// Database management commands
    #[command(subcommand)]
    Db(DbCommands),

    /// Print the current mock market prices
    Prices {
        /// Keep printing on every feed refresh until interrupted
        #[arg(long)]
        watch: bool,
    },

    /// Sign a payment with the mock wallet and submit it to the API
    Pay {
        /// Amount to send
        #[arg(long)]
        amount: String,

        /// SOL, USDC, ETH or BTC
        #[arg(long, default_value = "USDC")]
        currency: String,

        /// Recipient address
        #[arg(long)]
        to: String,
    },

    /// Show transaction history from the API with current values
    History,

    /// Check the status of a submitted payment via the API
    Status {
        #[arg(value_name = "TX_ID")]
        tx_id: i64,

        /// Poll until the transaction is no longer pending
        #[arg(long)]
        watch: bool,
    },

    /// Configuration validation
    Config,
}

#[derive(Subcommand)]
pub enum TxCommands {
    /// List all transactions, newest first
    List,

    /// Show one transaction
    Get {
        #[arg(value_name = "TX_ID")]
        tx_id: i64,
    },

    /// Overwrite the status of a transaction
    SetStatus {
        #[arg(value_name = "TX_ID")]
        tx_id: i64,

        /// pending, completed or failed
        #[arg(value_name = "STATUS")]
        status: String,
    },
}

#[derive(Subcommand)]
pub enum DbCommands {
    /// Run database migrations
    Migrate,
}

const STATUS_POLL_INTERVAL: Duration = Duration::from_secs(2);

/// The in-memory store lives only as long as one process, so `tx` commands
/// need Postgres to see anything the server wrote.
pub fn require_persistent_store(config: &Config) -> anyhow::Result<()> {
    if config.storage_backend == StorageBackend::Memory {
        anyhow::bail!(
            "tx commands need a persistent store: set STORAGE_BACKEND=postgres and DATABASE_URL"
        );
    }
    Ok(())
}

pub fn format_transaction(tx: &Transaction) -> String {
    format!(
        "#{:<5} {:>18} {:<4} {:<9} {} -> {} @ ${} ({})",
        tx.id,
        tx.amount.to_string(),
        tx.cryptocurrency.as_str(),
        tx.status.as_str(),
        tx.sender_address,
        tx.recipient_address,
        tx.price_at_transaction.with_scale(2),
        tx.created_at.format("%b %-d, %Y %H:%M")
    )
}

pub async fn handle_tx_list(repo: &dyn TransactionRepository) -> anyhow::Result<()> {
    let transactions = repo.list().await?;
    if transactions.is_empty() {
        println!("No transactions found");
        return Ok(());
    }
    for tx in &transactions {
        println!("{}", format_transaction(tx));
    }
    Ok(())
}

pub async fn handle_tx_get(repo: &dyn TransactionRepository, tx_id: i64) -> anyhow::Result<()> {
    let tx = repo.get_by_id(tx_id).await?;
    println!("{}", serde_json::to_string_pretty(&tx)?);
    Ok(())
}

pub async fn handle_tx_set_status(
    repo: &dyn TransactionRepository,
    tx_id: i64,
    status: &str,
) -> anyhow::Result<()> {
    let status: TransactionStatus = parse_status(Some(status))?;
    let tx = repo.update_status(tx_id, status).await?;

    tracing::info!("Transaction {} marked as {}", tx_id, status);
    println!("✓ Transaction {} marked as {}", tx.id, tx.status);
    Ok(())
}

pub async fn handle_db_migrate(config: &Config) -> anyhow::Result<()> {
    let pool = crate::db::create_pool(
        config.require_database_url()?,
        config.database_max_connections,
    )
    .await?;

    tracing::info!("Running database migrations...");
    crate::db::run_migrations(&pool).await?;
    println!("✓ Database migrations completed");

    Ok(())
}

pub async fn handle_prices(config: &Config, watch: bool) -> anyhow::Result<()> {
    if !watch {
        print_prices(MockPriceFeed::once().as_ref());
        return Ok(());
    }

    let interval = config.price_refresh_interval();
    let (feed, refresher) = MockPriceFeed::start(interval);
    loop {
        print_prices(feed.as_ref());
        println!();
        tokio::select! {
            _ = tokio::time::sleep(interval) => {}
            _ = tokio::signal::ctrl_c() => break,
        }
    }
    refresher.abort();
    Ok(())
}

pub fn print_prices(feed: &dyn PriceFeed) {
    let snapshot = feed.snapshot();
    for currency in Cryptocurrency::ALL {
        if let Some(quote) = snapshot.get(&currency) {
            println!(
                "{:<5} ${:>12.2} {:>+6.2}%",
                currency.as_str(),
                quote.price,
                quote.change_24h
            );
        }
    }
}

pub async fn handle_pay(
    config: &Config,
    amount: &str,
    currency: &str,
    to: &str,
) -> anyhow::Result<()> {
    let amount: BigDecimal =
        parse_positive_decimal("amount", Some(&serde_json::Value::String(amount.to_string())))?;
    let cryptocurrency = parse_cryptocurrency(Some(currency))?;

    let api = ApiClient::new(&config.api_base_url)?;
    let wallet = MockWallet::new();
    let prices: Arc<MockPriceFeed> = MockPriceFeed::once();

    let address = wallet.connect().await?;
    println!("Wallet connected: {}", address);

    let tx = submit_payment(
        &api,
        &wallet,
        prices.as_ref(),
        amount,
        cryptocurrency,
        to.to_string(),
    )
    .await?;
    wallet.disconnect().await?;

    println!("✓ Payment initiated");
    println!("{}", format_transaction(&tx));
    Ok(())
}

pub async fn handle_history(config: &Config) -> anyhow::Result<()> {
    let api = ApiClient::new(&config.api_base_url)?;
    let prices = MockPriceFeed::once();
    let transactions = api.list_transactions().await?;

    if transactions.is_empty() {
        println!("No transactions found");
        return Ok(());
    }

    for tx in &transactions {
        let current = prices
            .quote(tx.cryptocurrency)
            .map(|quote| (&tx.amount * &quote.price_decimal()).with_scale(2).to_string())
            .unwrap_or_else(|| "n/a".to_string());
        println!(
            "{}  value then ${} now ${}",
            format_transaction(tx),
            tx.value_at_transaction().with_scale(2),
            current
        );
    }
    Ok(())
}

pub async fn handle_status(config: &Config, tx_id: i64, watch: bool) -> anyhow::Result<()> {
    let api = ApiClient::new(&config.api_base_url)?;
    let tx = if watch {
        tokio::select! {
            tx = await_settlement(&api, tx_id, STATUS_POLL_INTERVAL) => tx?,
            _ = tokio::signal::ctrl_c() => return Ok(()),
        }
    } else {
        api.get_transaction(tx_id).await?
    };

    println!("Transaction {}: {}", tx.id, tx.status);
    Ok(())
}

pub fn handle_config_validate(config: &Config) -> anyhow::Result<()> {
    tracing::info!("Validating configuration...");

    println!("Configuration:");
    println!("  Server Port: {}", config.server_port);
    println!("  Storage Backend: {:?}", config.storage_backend);
    if let Some(url) = &config.database_url {
        println!("  Database URL: {}", mask_password(url));
    }
    println!("  API Base URL: {}", config.api_base_url);
    println!("  Price Refresh: {}s", config.price_refresh_secs);

    tracing::info!("Configuration is valid");
    println!("✓ Configuration is valid");

    Ok(())
}

fn mask_password(url: &str) -> String {
    if let Some(at_pos) = url.rfind('@') {
        if let Some(colon_pos) = url[..at_pos].rfind(':') {
            if let Some(slash_pos) = url[..colon_pos].rfind("//") {
                let prefix = &url[..slash_pos + 2];
                let user = &url[slash_pos + 2..colon_pos];
                let suffix = &url[at_pos..];
                return format!("{}{}:****{}", prefix, user, suffix);
            }
        }
    }
    url.to_string()
}
