//! Mock market price feed.
//!
//! Publishes a `{price, change24h}` quote per currency and refreshes it on a
//! fixed interval. Only the client side reads it; the store never does.

use arc_swap::ArcSwap;
use bigdecimal::BigDecimal;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;

use crate::domain::Cryptocurrency;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PriceQuote {
    pub price: f64,
    #[serde(rename = "change24h")]
    pub change_24h: f64,
}

impl PriceQuote {
    /// Price rounded to cents, as recorded on a transaction.
    pub fn price_decimal(&self) -> BigDecimal {
        BigDecimal::from_str(&format!("{:.2}", self.price)).unwrap_or_else(|_| BigDecimal::from(0))
    }
}

pub type PriceSnapshot = HashMap<Cryptocurrency, PriceQuote>;

pub trait PriceFeed: Send + Sync {
    fn snapshot(&self) -> Arc<PriceSnapshot>;

    fn quote(&self, currency: Cryptocurrency) -> Option<PriceQuote> {
        self.snapshot().get(&currency).copied()
    }
}

/// Generates random quotes around fixed reference prices.
pub fn mock_snapshot<R: Rng>(rng: &mut R) -> PriceSnapshot {
    Cryptocurrency::ALL
        .into_iter()
        .map(|currency| {
            let quote = match currency {
                Cryptocurrency::Sol => PriceQuote {
                    price: 95.0 + rng.gen::<f64>() * 5.0,
                    change_24h: -2.5 + rng.gen::<f64>() * 5.0,
                },
                Cryptocurrency::Usdc => PriceQuote {
                    price: 1.0,
                    change_24h: 0.0,
                },
                Cryptocurrency::Eth => PriceQuote {
                    price: 2500.0 + rng.gen::<f64>() * 100.0,
                    change_24h: 1.5 + rng.gen::<f64>() * 3.0,
                },
                Cryptocurrency::Btc => PriceQuote {
                    price: 43000.0 + rng.gen::<f64>() * 1000.0,
                    change_24h: 0.8 + rng.gen::<f64>() * 4.0,
                },
            };
            (currency, quote)
        })
        .collect()
}

pub struct MockPriceFeed {
    inner: ArcSwap<PriceSnapshot>,
}

impl MockPriceFeed {
    /// A feed holding one snapshot that never refreshes.
    pub fn once() -> Arc<Self> {
        Arc::new(MockPriceFeed {
            inner: ArcSwap::from_pointee(mock_snapshot(&mut rand::thread_rng())),
        })
    }

    /// Publishes a snapshot immediately, then refreshes it every `refresh_interval`
    /// on a background task. Abort the returned handle to stop refreshing.
    pub fn start(refresh_interval: Duration) -> (Arc<Self>, JoinHandle<()>) {
        let feed = Self::once();

        let feed_clone = feed.clone();
        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(refresh_interval);
            // The first tick fires immediately and the snapshot is already fresh.
            ticker.tick().await;
            loop {
                ticker.tick().await;
                feed_clone.refresh();
                tracing::debug!("refreshed mock price feed");
            }
        });

        (feed, handle)
    }

    pub fn refresh(&self) {
        self.inner.store(Arc::new(mock_snapshot(&mut rand::thread_rng())));
    }
}

impl PriceFeed for MockPriceFeed {
    fn snapshot(&self) -> Arc<PriceSnapshot> {
        self.inner.load_full()
    }
}
