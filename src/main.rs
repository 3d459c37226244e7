use std::path::PathBuf;
use std::sync::Arc;

use tracing_subscriber::{EnvFilter, fmt};

use fairprice::core::{Config, Symbol};
use fairprice::engine::Engine;
use fairprice::feeds::SimulatedFeed;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. Config: optional TOML path as first argument
    let config = match std::env::args().nth(1) {
        Some(path) => Config::load(&PathBuf::from(path))?,
        None => Config::default(),
    };

    // 2. Logging
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("{},fairprice=debug", config.app.log_level)));
    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_level(true)
        .init();

    tracing::info!("fairprice engine starting...");

    let engine = Arc::new(Engine::new(config.engine()));
    let symbol = Symbol::new(&config.app.instrument);

    // 3. Wire up price sources (simulated; real adapters implement PriceFeed)
    let names: Vec<String> = if config.sources.is_empty() {
        (0..100).map(|i| format!("source{}", i)).collect()
    } else {
        config
            .sources
            .iter()
            .filter(|s| s.enabled)
            .map(|s| s.name.clone())
            .collect()
    };
    tracing::info!("attaching {} sources for {}", names.len(), symbol);
    for name in names {
        engine
            .attach(symbol.clone(), name, Arc::new(SimulatedFeed::default()))
            .await;
    }

    // 4. Consume the combined output forever
    let mut subscription = engine.subscribe(&symbol)?;
    loop {
        tokio::select! {
            Some(combined) = subscription.prices.recv() => {
                println!("{}, {}", combined.timestamp.timestamp(), combined.price);
            }
            Some(err) = subscription.errors.recv() => {
                tracing::warn!(symbol = %symbol, "{}", err);
            }
            else => break,
        }
    }
    Ok(())
}
