//! Core traits - the collaborator contract required of every price feed

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::core::error::FeedError;
use crate::core::types::{PriceTick, Symbol};

/// Price feed trait - implemented by concrete feed adapters.
///
/// A feed hands back two independent streams for the instrument: one of
/// price ticks, one of errors. Either may stay idle, but both must exist.
/// Closing the tick stream is the feed's way of ending the subscription;
/// errors alone never end it.
#[async_trait]
pub trait PriceFeed: Send + Sync {
    /// Subscribe to live prices for an instrument
    async fn subscribe_price_stream(
        &self,
        symbol: &Symbol,
    ) -> (mpsc::Receiver<PriceTick>, mpsc::Receiver<FeedError>);
}
