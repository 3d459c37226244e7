//! Simulated price feed for demos and local runs

use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::mpsc;
use tokio::time::sleep;

use crate::core::error::FeedError;
use crate::core::traits::PriceFeed;
use crate::core::types::{PriceTick, Symbol};

/// Random-price feed: emits an integer price below `max_price` at a
/// random interval up to `max_interval`, with the occasional transient
/// error on the error stream to exercise the reporting path.
pub struct SimulatedFeed {
    max_price: u32,
    max_interval: Duration,
}

impl SimulatedFeed {
    pub fn new(max_price: u32, max_interval: Duration) -> Self {
        Self {
            max_price,
            max_interval,
        }
    }
}

impl Default for SimulatedFeed {
    fn default() -> Self {
        Self::new(50_000, Duration::from_secs(10))
    }
}

#[async_trait]
impl PriceFeed for SimulatedFeed {
    async fn subscribe_price_stream(
        &self,
        symbol: &Symbol,
    ) -> (mpsc::Receiver<PriceTick>, mpsc::Receiver<FeedError>) {
        let (tick_tx, tick_rx) = mpsc::channel(1);
        let (err_tx, err_rx) = mpsc::channel(1);
        let symbol = symbol.clone();
        let max_price = self.max_price;
        let max_interval_ms = self.max_interval.as_millis() as u64;

        tokio::spawn(async move {
            loop {
                if rand::random_range(0..25u8) == 0 {
                    let report = err_tx
                        .send(FeedError::Connection("simulated transient drop".into()))
                        .await;
                    if report.is_err() {
                        return;
                    }
                }
                let price = rand::random_range(0..max_price).to_string();
                let tick = PriceTick::new(symbol.clone(), Utc::now(), price);
                if tick_tx.send(tick).await.is_err() {
                    return;
                }
                sleep(Duration::from_millis(rand::random_range(0..=max_interval_ms))).await;
            }
        });

        (tick_rx, err_rx)
    }
}
