//! Core module - Common types, traits, and error handling

pub mod config;
pub mod error;
pub mod traits;
pub mod types;

pub use config::{Config, EngineConfig};
pub use error::{AggregationError, Error, FeedError, Result};
pub use traits::PriceFeed;
pub use types::*;
