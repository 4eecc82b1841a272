use anyhow::{Context, Result};
use serde::Serialize;
use tracing::{info, warn};
use crate::data::types::{ConsensusReading, OracleResponse, WeatherReading};
use crate::data::weather::WeatherClient;
use crate::error::OracleError;
use crate::monitoring::logger::CsvLogger;
use crate::monitoring::metrics;
use crate::oracle::{OracleAggregator, OracleNetwork};
use crate::policy::premium::check_policy;
use crate::policy::types::{ParametricPolicy, PayoutResult, ProductType};

/// Everything one settlement pass produced for a policy.
#[derive(Debug, Clone, Serialize)]
pub struct SettlementOutcome {
    pub policy_id: String,
    pub product_type: ProductType,
    pub reading: WeatherReading,
    pub consensus: ConsensusReading,
    pub payout: PayoutResult,
}

pub struct SettlementEngine {
    weather: WeatherClient,
    network: OracleNetwork,
    aggregator: OracleAggregator,
    audit: Option<CsvLogger>,
}

impl SettlementEngine {
    pub fn new(
        weather: WeatherClient,
        network: OracleNetwork,
        aggregator: OracleAggregator,
        audit: Option<CsvLogger>,
    ) -> Self {
        Self {
            weather,
            network,
            aggregator,
            audit,
        }
    }

    /// Run the full pipeline once for `policy`:
    /// 1. Fetch current weather at the coverage area (cached, never fails)
    /// 2. Collect signed observations from the oracle network
    /// 3. Validate signatures and quorum
    /// 4. Aggregate into a consensus reading
    /// 5. Evaluate trigger and payout
    ///
    /// A quorum failure is returned as [`OracleError::QuorumNotReached`]
    /// inside the `anyhow` error; nothing is retried.
    pub async fn settle(&self, policy: &ParametricPolicy) -> Result<SettlementOutcome> {
        check_policy(policy)?;

        let area = &policy.coverage_area;
        let reading = self.weather
            .get_current_weather(area.latitude, area.longitude)
            .await;

        let responses = self.network
            .collect(&reading)
            .context("Oracle network failed to sign observations")?;

        let (consensus, payout) = self
            .evaluate_responses(policy, &responses)
            .with_context(|| format!("Settlement aborted for policy {}", policy.id))?;

        let outcome = SettlementOutcome {
            policy_id: policy.id.clone(),
            product_type: policy.product_type,
            reading,
            consensus,
            payout,
        };

        if let Some(audit) = &self.audit {
            if let Err(e) = audit.log_settlement(&outcome) {
                warn!("Failed to write settlement audit for {}: {:#}", policy.id, e);
            }
        }

        Ok(outcome)
    }

    /// Validate, aggregate and evaluate an externally collected batch.
    pub fn evaluate_responses(
        &self,
        policy: &ParametricPolicy,
        responses: &[OracleResponse],
    ) -> Result<(ConsensusReading, PayoutResult), OracleError> {
        let consensus = self.aggregator.consensus(responses)?;
        let payout = crate::policy::evaluate(&consensus, policy);

        if payout.triggered {
            metrics::record_payout(payout.payout_amount);
        }

        info!(
            "Policy {} ({}): index={} triggered={} payout={} ({:.1}%) from {} oracles",
            policy.id,
            policy.product_type,
            payout.weather_index,
            payout.triggered,
            payout.payout_amount,
            payout.payout_percentage,
            consensus.oracle_count
        );

        Ok((consensus, payout))
    }

    pub fn weather(&self) -> &WeatherClient {
        &self.weather
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::cache::WeatherCache;
    use crate::data::types::{Rainfall, ReadingSource};
    use crate::data::weather::WeatherSource;
    use crate::oracle::{AggregatorConfig, OracleNetworkConfig};
    use crate::policy::types::CoverageArea;
    use async_trait::async_trait;
    use chrono::Utc;
    use std::sync::Arc;

    struct FixedSource {
        cumulative: f64,
        last_24h: f64,
    }

    #[async_trait]
    impl WeatherSource for FixedSource {
        async fn fetch_current(&self, lat: f64, lng: f64) -> Result<WeatherReading> {
            Ok(WeatherReading {
                timestamp: Utc::now(),
                latitude: lat,
                longitude: lng,
                temperature: 26.0,
                humidity: 72.0,
                rainfall: Rainfall {
                    current: 0.5,
                    last_24h: self.last_24h,
                    cumulative: self.cumulative,
                },
                source: ReadingSource::Upstream,
            })
        }
    }

    fn engine(unsigned_nodes: usize, verify: bool, cumulative: f64) -> SettlementEngine {
        let weather = WeatherClient::new(
            Arc::new(FixedSource { cumulative, last_24h: 30.0 }),
            WeatherCache::default(),
        );
        let network = OracleNetwork::new(&OracleNetworkConfig {
            unsigned_nodes,
            rainfall_noise: 0.0,
            ..Default::default()
        }).unwrap();
        let aggregator = OracleAggregator::new(AggregatorConfig {
            quorum: 3,
            verify_signatures: verify,
        });
        SettlementEngine::new(weather, network, aggregator, None)
    }

    fn policy(product_type: ProductType, trigger: f64, saturation: f64) -> ParametricPolicy {
        ParametricPolicy {
            id: "kisumu-maize".to_string(),
            product_type,
            coverage_amount: 40_000,
            trigger_threshold: trigger,
            saturation_threshold: saturation,
            coverage_area: CoverageArea {
                latitude: -0.0917,
                longitude: 34.768,
                label: Some("Kisumu".to_string()),
            },
        }
    }

    #[tokio::test]
    async fn test_settle_partial_payout() {
        let engine = engine(0, true, 250.0);
        let outcome = engine
            .settle(&policy(ProductType::Seasonal, 200.0, 300.0))
            .await
            .unwrap();

        assert_eq!(outcome.consensus.cumulative_rainfall, 250.0);
        assert!(outcome.consensus.quorum_reached);
        assert_eq!(outcome.consensus.oracle_count, 5);
        assert!(outcome.payout.triggered);
        assert_eq!(outcome.payout.payout_amount, 20_000);
    }

    #[tokio::test]
    async fn test_event_product_uses_24h_rainfall() {
        let engine = engine(0, false, 250.0);
        let outcome = engine
            .settle(&policy(ProductType::Event, 40.0, 80.0))
            .await
            .unwrap();

        assert_eq!(outcome.payout.weather_index, 30.0);
        assert!(!outcome.payout.triggered);
    }

    #[tokio::test]
    async fn test_quorum_failure_surfaces() {
        let engine = engine(3, false, 250.0);
        let err = engine
            .settle(&policy(ProductType::Seasonal, 200.0, 300.0))
            .await
            .unwrap_err();

        assert_eq!(
            err.downcast_ref::<OracleError>(),
            Some(&OracleError::QuorumNotReached { valid: 2, required: 3 })
        );
    }

    #[tokio::test]
    async fn test_zero_coverage_rejected_before_fetch() {
        let engine = engine(0, false, 250.0);
        let mut p = policy(ProductType::Seasonal, 200.0, 300.0);
        p.coverage_amount = 0;

        assert!(engine.settle(&p).await.is_err());
        assert!(engine.weather().cache().is_empty());
    }
}
