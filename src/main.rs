use clap::Parser;
use cryptopay_core::cli::{self, Cli, Commands, DbCommands, TxCommands};
use cryptopay_core::config::{Config, LogFormat};
use cryptopay_core::{build_repository, cors_layer, create_app, AppState};
use std::net::SocketAddr;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env()?;

    // Setup logging
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into());
    match config.log_format {
        LogFormat::Json => tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init(),
        LogFormat::Text => tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init(),
    }

    let cli = Cli::parse();
    match cli.command.unwrap_or(Commands::Serve) {
        Commands::Serve => serve(config).await,
        Commands::Tx(tx) => {
            cli::require_persistent_store(&config)?;
            let repo = build_repository(&config).await?;
            match tx {
                TxCommands::List => cli::handle_tx_list(repo.as_ref()).await,
                TxCommands::Get { tx_id } => cli::handle_tx_get(repo.as_ref(), tx_id).await,
                TxCommands::SetStatus { tx_id, status } => {
                    cli::handle_tx_set_status(repo.as_ref(), tx_id, &status).await
                }
            }
        }
        Commands::Db(DbCommands::Migrate) => cli::handle_db_migrate(&config).await,
        Commands::Prices { watch } => cli::handle_prices(&config, watch).await,
        Commands::Pay {
            amount,
            currency,
            to,
        } => cli::handle_pay(&config, &amount, &currency, &to).await,
        Commands::History => cli::handle_history(&config).await,
        Commands::Status { tx_id, watch } => cli::handle_status(&config, tx_id, watch).await,
        Commands::Config => cli::handle_config_validate(&config),
    }
}

async fn serve(config: Config) -> anyhow::Result<()> {
    let repository = build_repository(&config).await?;
    let app = create_app(AppState::new(repository)).layer(cors_layer(&config));

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server_port));
    tracing::info!("listening on {}", addr);

    axum::Server::bind(&addr)
        .serve(app.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("shutdown signal received");
}
