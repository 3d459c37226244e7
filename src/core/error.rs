//! Error handling - Zero-cost, hierarchical errors

use thiserror::Error;

use crate::core::types::Symbol;

pub type Result<T> = std::result::Result<T, Error>;

/// Fairprice error hierarchy
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// An instrument's combined output streams were already claimed
    #[error("Already subscribed to {0}")]
    AlreadySubscribed(Symbol),
}

/// Periodic evaluation failures, delivered on the error stream of
/// [`subscribe`](crate::engine::Engine::subscribe).
///
/// None of these are fatal: the aggregator keeps running and the next
/// period may succeed once better data arrives.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AggregationError {
    /// No sources have ever delivered a price for this instrument
    #[error("no sources")]
    NoSources,

    /// Sources exist but every stored price is stale or unparsable
    #[error("no valid sources")]
    NoValidSources,

    /// A source delivered a price that does not parse as a decimal;
    /// diagnostic only, the source is skipped for the round
    #[error("invalid price for {0}")]
    InvalidPrice(String),
}

/// Failures reported by an upstream price feed on its error stream.
///
/// Source adapters log these and keep consuming; a feed error never
/// terminates the adapter or the aggregator.
#[derive(Debug, Clone, Error)]
pub enum FeedError {
    /// Transport-level failure (disconnect, timeout, ...)
    #[error("feed connection error: {0}")]
    Connection(String),

    /// The feed produced data it could not turn into a tick
    #[error("malformed feed data: {0}")]
    Malformed(String),
}
