//! Per-instrument aggregation task and the decay-weighted average

use std::collections::HashMap;
use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use rust_decimal::{Decimal, RoundingStrategy};
use tokio::sync::mpsc;
use tokio::time::{Instant, sleep};
use tracing::debug;

use crate::core::config::EngineConfig;
use crate::core::error::AggregationError;
use crate::core::types::{CombinedPrice, PriceTick, SourcePrice, Symbol};

/// One long-lived task per instrument. Owns the latest-known tick per
/// source and a restartable period timer; everything it touches is local
/// to the task, so no locking anywhere.
pub(crate) struct Aggregator {
    symbol: Symbol,
    period: Duration,
    horizon: TimeDelta,
    latest: HashMap<String, PriceTick>,
    updates: mpsc::Receiver<SourcePrice>,
    prices: mpsc::Sender<CombinedPrice>,
    errors: mpsc::Sender<AggregationError>,
}

impl Aggregator {
    pub(crate) fn new(
        symbol: Symbol,
        config: EngineConfig,
        updates: mpsc::Receiver<SourcePrice>,
        prices: mpsc::Sender<CombinedPrice>,
        errors: mpsc::Sender<AggregationError>,
    ) -> Self {
        Self {
            symbol,
            period: config.evaluation_period,
            horizon: TimeDelta::from_std(config.staleness_horizon).unwrap_or(TimeDelta::MAX),
            latest: HashMap::new(),
            updates,
            prices,
            errors,
        }
    }

    /// Event loop: strictly one event at a time, either a queue update or
    /// a timer firing. Exits only when every update sender is gone (the
    /// engine itself was dropped).
    pub(crate) async fn run(mut self) {
        let timer = sleep(self.period);
        tokio::pin!(timer);
        loop {
            tokio::select! {
                _ = timer.as_mut() => {
                    self.evaluate(Utc::now()).await;
                    // full period from the end of emission: emitting to a
                    // slow subscriber delays the next evaluation instead
                    // of queueing catch-up ticks
                    timer.as_mut().reset(Instant::now() + self.period);
                }
                update = self.updates.recv() => match update {
                    Some(SourcePrice { source, tick }) => {
                        // last delivered wins, no timestamp comparison
                        self.latest.insert(source, tick);
                    }
                    None => break,
                },
            }
        }
        debug!(symbol = %self.symbol, "update queue closed, aggregator exiting");
    }

    async fn evaluate(&mut self, now: DateTime<Utc>) {
        if self.latest.is_empty() {
            let _ = self.errors.send(AggregationError::NoSources).await;
            return;
        }

        let evaluation = weighted_average(&self.latest, now, self.horizon);
        for source in evaluation.invalid {
            let _ = self
                .errors
                .send(AggregationError::InvalidPrice(source))
                .await;
        }
        match evaluation.price {
            Some(price) => {
                let combined = CombinedPrice {
                    symbol: self.symbol.clone(),
                    timestamp: now,
                    price,
                };
                let _ = self.prices.send(combined).await;
            }
            None => {
                let _ = self.errors.send(AggregationError::NoValidSources).await;
            }
        }
    }
}

pub(crate) struct Evaluation {
    /// 2-dp rounded weighted average, or `None` when no source carried
    /// positive weight this round
    pub(crate) price: Option<Decimal>,
    /// Sources whose stored price failed decimal parsing
    pub(crate) invalid: Vec<String>,
}

/// Decay-weighted average over the latest tick per source.
///
/// A tick's weight is the whole seconds of freshness it has left before
/// the staleness horizon; at or past the horizon it is excluded for the
/// round but retained in state. Unparsable prices are skipped and
/// reported back by source name.
pub(crate) fn weighted_average(
    latest: &HashMap<String, PriceTick>,
    now: DateTime<Utc>,
    horizon: TimeDelta,
) -> Evaluation {
    let mut sum = Decimal::ZERO;
    let mut weight_total = Decimal::ZERO;
    let mut invalid = Vec::new();

    for (source, tick) in latest {
        let price = match tick.price.parse::<Decimal>() {
            Ok(price) => price,
            Err(_) => {
                invalid.push(source.clone());
                continue;
            }
        };
        let age = now.signed_duration_since(tick.timestamp);
        if age >= horizon {
            continue;
        }
        let weight = Decimal::from((horizon - age).num_seconds());
        sum += price * weight;
        weight_total += weight;
    }

    let price = if weight_total > Decimal::ZERO {
        Some((sum / weight_total).round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero))
    } else {
        None
    };
    Evaluation { price, invalid }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn horizon() -> TimeDelta {
        TimeDelta::seconds(10)
    }

    fn state(entries: &[(&str, &str, i64)], now: DateTime<Utc>) -> HashMap<String, PriceTick> {
        entries
            .iter()
            .map(|(source, price, age_secs)| {
                let tick = PriceTick::new(
                    Symbol::new("BTC_USD"),
                    now - TimeDelta::seconds(*age_secs),
                    *price,
                );
                (source.to_string(), tick)
            })
            .collect()
    }

    #[test]
    fn test_equal_weights_average() {
        let now = Utc::now();
        let latest = state(&[("a", "100", 2), ("b", "200", 2)], now);
        let eval = weighted_average(&latest, now, horizon());
        assert_eq!(eval.price, Some(Decimal::from(150)));
        assert!(eval.invalid.is_empty());
    }

    #[test]
    fn test_weight_floors_to_whole_seconds() {
        let now = Utc::now();
        let mut latest = state(&[("a", "100", 0)], now);
        // 8.5s of freshness left floors to weight 8
        latest.insert(
            "b".to_string(),
            PriceTick::new(
                Symbol::new("BTC_USD"),
                now - TimeDelta::milliseconds(1500),
                "200",
            ),
        );
        let eval = weighted_average(&latest, now, horizon());
        // (100*10 + 200*8) / 18
        assert_eq!(eval.price, Some(Decimal::new(14444, 2)));
    }

    #[test]
    fn test_stale_source_excluded() {
        let now = Utc::now();
        // "b" is exactly at the horizon: zero weight, out of both sums
        let latest = state(&[("a", "100", 2), ("b", "999", 10)], now);
        let eval = weighted_average(&latest, now, horizon());
        assert_eq!(eval.price, Some(Decimal::from(100)));
    }

    #[test]
    fn test_all_stale_fails() {
        let now = Utc::now();
        let latest = state(&[("a", "100", 10), ("b", "200", 60)], now);
        let eval = weighted_average(&latest, now, horizon());
        assert_eq!(eval.price, None);
        assert!(eval.invalid.is_empty());
    }

    #[test]
    fn test_invalid_price_skipped() {
        let now = Utc::now();
        let latest = state(&[("a", "not-a-price", 2), ("b", "50", 2)], now);
        let eval = weighted_average(&latest, now, horizon());
        assert_eq!(eval.price, Some(Decimal::from(50)));
        assert_eq!(eval.invalid, vec!["a".to_string()]);
    }

    #[test]
    fn test_all_invalid_fails() {
        let now = Utc::now();
        let latest = state(&[("a", "", 2), ("b", "12,5", 2)], now);
        let eval = weighted_average(&latest, now, horizon());
        assert_eq!(eval.price, None);
        assert_eq!(eval.invalid.len(), 2);
    }

    #[test]
    fn test_precision_survives_until_final_rounding() {
        let now = Utc::now();
        let latest = state(&[("a", "13.2345122", 0)], now);
        let eval = weighted_average(&latest, now, horizon());
        assert_eq!(eval.price, Some(Decimal::new(1323, 2)));
    }

    #[test]
    fn test_half_up_rounding() {
        let now = Utc::now();
        let latest = state(&[("a", "10.005", 0)], now);
        let eval = weighted_average(&latest, now, horizon());
        // half-up, not banker's
        assert_eq!(eval.price, Some(Decimal::new(1001, 2)));
    }

    #[test]
    fn test_sub_second_freshness_is_zero_weight() {
        let now = Utc::now();
        let mut latest = HashMap::new();
        latest.insert(
            "a".to_string(),
            PriceTick::new(
                Symbol::new("BTC_USD"),
                now - TimeDelta::milliseconds(9500),
                "100",
            ),
        );
        let eval = weighted_average(&latest, now, horizon());
        assert_eq!(eval.price, None);
    }
}
