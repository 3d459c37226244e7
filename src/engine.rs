//! Aggregation engine - instrument registry, source adapters, subscriptions

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::aggregator::Aggregator;
use crate::core::config::EngineConfig;
use crate::core::error::{AggregationError, Error, Result};
use crate::core::traits::PriceFeed;
use crate::core::types::{CombinedPrice, SourcePrice, Symbol};

/// The combined output streams for one instrument: a price once per
/// evaluation period when computable, an error whenever a period fails.
///
/// Keep consuming both. The aggregator hands results off with the same
/// unbuffered discipline as the rest of the pipeline, so a stalled
/// subscriber eventually stalls the source adapters too.
pub struct Subscription {
    pub prices: mpsc::Receiver<CombinedPrice>,
    pub errors: mpsc::Receiver<AggregationError>,
}

struct Instrument {
    updates: mpsc::Sender<SourcePrice>,
    outputs: Option<Subscription>,
}

/// Fair price aggregation engine.
///
/// Holds the process-wide instrument registry; construct one per process
/// (or per test) and share it behind an `Arc`. The first `attach` or
/// `subscribe` for an instrument creates its update queue and spawns its
/// aggregator task; both live until the engine is dropped.
pub struct Engine {
    config: EngineConfig,
    instruments: Mutex<HashMap<Symbol, Instrument>>,
}

impl Engine {
    pub fn new(config: EngineConfig) -> Self {
        Self {
            config,
            instruments: Mutex::new(HashMap::new()),
        }
    }

    /// Look up or create the instrument entry, returning a handle to its
    /// update queue. The lock covers only the map step; queue traffic
    /// never happens under it.
    fn queue(&self, symbol: &Symbol) -> mpsc::Sender<SourcePrice> {
        let mut instruments = self.instruments.lock();
        instruments
            .entry(symbol.clone())
            .or_insert_with(|| spawn_instrument(symbol.clone(), self.config))
            .updates
            .clone()
    }

    /// Register a named source for an instrument. Fire and forget: a
    /// background adapter task tags each tick with `source` and forwards
    /// it into the instrument queue. Feed errors are logged and survived;
    /// the adapter exits only when the feed closes its tick stream.
    pub async fn attach(&self, symbol: Symbol, source: impl Into<String>, feed: Arc<dyn PriceFeed>) {
        let source = source.into();
        let (mut ticks, mut feed_errors) = feed.subscribe_price_stream(&symbol).await;
        let updates = self.queue(&symbol);

        tokio::spawn(async move {
            let mut errors_done = false;
            loop {
                tokio::select! {
                    tick = ticks.recv() => match tick {
                        Some(tick) => {
                            let update = SourcePrice {
                                source: source.clone(),
                                tick,
                            };
                            // unbuffered handoff: blocks until the
                            // aggregator takes it, backpressuring the feed
                            if updates.send(update).await.is_err() {
                                break;
                            }
                        }
                        None => {
                            debug!(source = %source, symbol = %symbol, "feed stream closed, detaching source");
                            break;
                        }
                    },
                    err = feed_errors.recv(), if !errors_done => match err {
                        Some(err) => warn!(source = %source, symbol = %symbol, "feed error: {}", err),
                        None => errors_done = true,
                    },
                }
            }
        });
    }

    /// Claim the combined output streams for an instrument, creating its
    /// queue and aggregator if this is the instrument's first use. Each
    /// instrument's streams can be claimed exactly once.
    pub fn subscribe(&self, symbol: &Symbol) -> Result<Subscription> {
        let mut instruments = self.instruments.lock();
        instruments
            .entry(symbol.clone())
            .or_insert_with(|| spawn_instrument(symbol.clone(), self.config))
            .outputs
            .take()
            .ok_or_else(|| Error::AlreadySubscribed(symbol.clone()))
    }
}

/// Capacity 1 is the closest tokio analogue of an unbuffered handoff;
/// every stage blocks until the next one takes the value.
fn spawn_instrument(symbol: Symbol, config: EngineConfig) -> Instrument {
    let (update_tx, update_rx) = mpsc::channel(1);
    let (price_tx, price_rx) = mpsc::channel(1);
    let (error_tx, error_rx) = mpsc::channel(1);

    tokio::spawn(Aggregator::new(symbol, config, update_rx, price_tx, error_tx).run());

    Instrument {
        updates: update_tx,
        outputs: Some(Subscription {
            prices: price_rx,
            errors: error_rx,
        }),
    }
}
