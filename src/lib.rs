pub mod adapters;
pub mod cli;
pub mod client;
pub mod config;
pub mod db;
pub mod domain;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod ports;
pub mod services;
pub mod validation;

use axum::{
    http::{header, HeaderValue, Method},
    routing::{get, patch},
    Router,
};
use std::sync::Arc;
use std::time::Instant;
use tower_http::cors::{AllowOrigin, CorsLayer};

use crate::adapters::{MemoryTransactionRepository, PostgresTransactionRepository};
use crate::config::{Config, StorageBackend};
use crate::ports::TransactionRepository;

#[derive(Clone)]
pub struct AppState {
    pub transactions: Arc<dyn TransactionRepository>,
    pub start_time: Instant,
}

impl AppState {
    pub fn new(transactions: Arc<dyn TransactionRepository>) -> Self {
        Self {
            transactions,
            start_time: Instant::now(),
        }
    }
}

pub fn create_app(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .route(
            "/transactions",
            get(handlers::transactions::list_transactions)
                .post(handlers::transactions::create_transaction),
        )
        .route(
            "/transactions/:id",
            get(handlers::transactions::get_transaction),
        )
        .route(
            "/transactions/:id/status",
            patch(handlers::transactions::update_transaction_status),
        )
        .layer(axum::middleware::from_fn(
            middleware::request_logger_middleware,
        ))
        .with_state(state)
}

/// Any origin when none are configured, otherwise only the listed ones.
pub fn cors_layer(config: &Config) -> CorsLayer {
    match &config.cors_allowed_origins {
        None => CorsLayer::permissive(),
        Some(origins) => {
            let origins = origins
                .iter()
                .filter_map(|origin| match origin.parse::<HeaderValue>() {
                    Ok(value) => Some(value),
                    Err(_) => {
                        tracing::warn!(origin = %origin, "ignoring invalid CORS origin");
                        None
                    }
                })
                .collect::<Vec<_>>();
            CorsLayer::new()
                .allow_origin(AllowOrigin::list(origins))
                .allow_methods([Method::GET, Method::POST, Method::PATCH])
                .allow_headers([header::CONTENT_TYPE])
        }
    }
}

/// Constructs the storage backend selected by configuration.
pub async fn build_repository(config: &Config) -> anyhow::Result<Arc<dyn TransactionRepository>> {
    match config.storage_backend {
        StorageBackend::Memory => {
            tracing::info!("Using in-memory transaction store");
            Ok(Arc::new(MemoryTransactionRepository::new()))
        }
        StorageBackend::Postgres => {
            let pool =
                db::create_pool(config.require_database_url()?, config.database_max_connections)
                    .await?;
            db::run_migrations(&pool).await?;
            tracing::info!("Using Postgres transaction store");
            Ok(Arc::new(PostgresTransactionRepository::new(pool)))
        }
    }
}
