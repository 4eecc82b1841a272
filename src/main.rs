use anyhow::Result;
use futures::future::join_all;
use std::sync::Arc;
use rainguard::config::{Config, EnvConfig};
use rainguard::data::cache::WeatherCache;
use rainguard::data::weather::{OpenWeatherSource, WeatherClient};
use rainguard::monitoring::logger::CsvLogger;
use rainguard::monitoring::metrics;
use rainguard::oracle::{OracleAggregator, OracleNetwork};
use rainguard::policy::premium;
use rainguard::settlement::SettlementEngine;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    tracing::info!("🌧️ RainGuard settlement starting...");

    let env_config = EnvConfig::load()?;
    tracing::info!("Loading configuration from {}", env_config.config_path);
    let config = Config::load(&env_config.config_path)?;

    if env_config.weather_api_key.is_none() {
        tracing::warn!("WEATHER_API_KEY not set, every reading will use the fallback generator");
    }

    let api_url = env_config.weather_api_url
        .clone()
        .unwrap_or_else(|| config.weather.api_url.clone());
    let source = OpenWeatherSource::new(
        api_url,
        env_config.weather_api_key.clone(),
        config.weather.request_timeout(),
    )?;
    let weather = WeatherClient::new(Arc::new(source), WeatherCache::new(config.weather.cache_ttl()));

    let network = OracleNetwork::new(&config.oracle.network)?;
    tracing::info!(
        "Oracle network: {} nodes, quorum {}, signature verification {}",
        network.len(),
        config.oracle.aggregator.quorum,
        config.oracle.aggregator.verify_signatures
    );
    let aggregator = OracleAggregator::new(config.oracle.aggregator.clone());

    let audit = if config.monitoring.csv_logging {
        tracing::info!("Settlement audit log: {}", config.monitoring.csv_log_path);
        Some(CsvLogger::new(&config.monitoring.csv_log_path)?)
    } else {
        None
    };

    let engine = SettlementEngine::new(weather, network, aggregator, audit);

    tracing::info!("Settling {} policies", config.policies.len());

    for policy in &config.policies {
        match premium::quote(policy, &config.premium) {
            Ok(quote) => tracing::info!("Premium for {}: {}", quote.policy_id, quote.premium),
            Err(e) => tracing::warn!("Cannot quote {}: {}", policy.id, e),
        }
    }

    let results = join_all(config.policies.iter().map(|p| engine.settle(p))).await;

    let mut failures = 0;
    for (policy, result) in config.policies.iter().zip(results) {
        match result {
            Ok(outcome) => println!("{}", serde_json::to_string(&outcome)?),
            Err(e) => {
                failures += 1;
                tracing::error!("Policy {} not settled: {:#}", policy.id, e);
            }
        }
    }

    let exposition = metrics::gather();
    if !exposition.is_empty() {
        tracing::info!("Metrics:\n{}", exposition);
    }

    tracing::info!(
        "✅ Done: {} settled, {} failed",
        config.policies.len() - failures,
        failures
    );

    Ok(())
}
