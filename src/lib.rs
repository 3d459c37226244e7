//! Fairprice - Core Library
//! Confidence-weighted price aggregation across unreliable feeds

// Public modules
pub mod core;
pub mod engine;
pub mod feeds;

mod aggregator;

// Re-exports
pub use crate::core::{AggregationError, Config, EngineConfig, Error, FeedError, PriceFeed, Result};
pub use crate::engine::{Engine, Subscription};
