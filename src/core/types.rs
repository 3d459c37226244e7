//! Core types - Strong typing for safety

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Priced instrument (e.g., "BTC_USD")
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Symbol(String);

impl Symbol {
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into().to_uppercase())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Symbol {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One price observation from a feed.
///
/// The price stays a raw decimal string (e.g. "0", "12.2", "13.2345122")
/// until evaluation time: parsing there keeps full precision and lets a
/// bad value surface as a per-source diagnostic instead of killing the
/// feed subscription.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PriceTick {
    pub symbol: Symbol,
    pub timestamp: DateTime<Utc>,
    pub price: String,
}

impl PriceTick {
    pub fn new(symbol: Symbol, timestamp: DateTime<Utc>, price: impl Into<String>) -> Self {
        Self {
            symbol,
            timestamp,
            price: price.into(),
        }
    }
}

/// A tick tagged with the name of the source that produced it.
/// This is the unit flowing through an instrument's update queue.
#[derive(Debug, Clone)]
pub struct SourcePrice {
    pub source: String,
    pub tick: PriceTick,
}

/// The aggregator's periodic consolidated output: the decay-weighted
/// average across fresh sources, rounded to 2 decimal places, stamped
/// with the evaluation wall-clock time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CombinedPrice {
    pub symbol: Symbol,
    pub timestamp: DateTime<Utc>,
    pub price: Decimal,
}
