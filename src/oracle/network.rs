//! Simulated oracle network.
//!
//! Each node holds a secp256k1 key derived from the network seed, observes
//! the fetched reading with a little seeded measurement noise and signs the
//! observation as an EIP-191 personal message. Nodes configured as unsigned
//! return their observation without a signature.

use ethers::signers::{LocalWallet, Signer};
use ethers::types::Address;
use ethers::utils::{hash_message, to_checksum};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Deserialize;
use tracing::debug;
use crate::data::types::{OracleResponse, Rainfall, WeatherReading};
use crate::error::{OracleError, Result};

#[derive(Debug, Clone, Deserialize)]
pub struct OracleNetworkConfig {
    #[serde(default = "default_node_count")]
    pub node_count: usize,
    /// Nodes (counted from the end) that answer without a signature
    #[serde(default)]
    pub unsigned_nodes: usize,
    #[serde(default = "default_seed")]
    pub seed: u64,
    /// Relative measurement noise applied to rainfall, e.g. 0.03 = ±3%
    #[serde(default = "default_noise")]
    pub rainfall_noise: f64,
}

fn default_node_count() -> usize { 5 }
fn default_seed() -> u64 { 0x5241_494E }
fn default_noise() -> f64 { 0.03 }

impl Default for OracleNetworkConfig {
    fn default() -> Self {
        Self {
            node_count: default_node_count(),
            unsigned_nodes: 0,
            seed: default_seed(),
            rainfall_noise: default_noise(),
        }
    }
}

struct OracleNode {
    index: usize,
    wallet: LocalWallet,
    signs: bool,
}

pub struct OracleNetwork {
    nodes: Vec<OracleNode>,
    seed: u64,
    rainfall_noise: f64,
}

impl OracleNetwork {
    pub fn new(config: &OracleNetworkConfig) -> Result<Self> {
        let signed_count = config.node_count.saturating_sub(config.unsigned_nodes);
        let mut nodes = Vec::with_capacity(config.node_count);

        for index in 0..config.node_count {
            let mut key_rng = StdRng::seed_from_u64(config.seed ^ ((index as u64 + 1) << 32));
            let mut key = [0u8; 32];
            key_rng.fill(&mut key);

            let wallet = LocalWallet::from_bytes(&key)
                .map_err(|e| OracleError::Signing(format!("node {}: {}", index, e)))?;

            debug!("Oracle node {} at {}", index, to_checksum(&wallet.address(), None));
            nodes.push(OracleNode {
                index,
                wallet,
                signs: index < signed_count,
            });
        }

        Ok(Self {
            nodes,
            seed: config.seed,
            rainfall_noise: config.rainfall_noise.abs(),
        })
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn addresses(&self) -> Vec<Address> {
        self.nodes.iter().map(|n| n.wallet.address()).collect()
    }

    /// Ask every node for its signed observation of `reading`.
    pub fn collect(&self, reading: &WeatherReading) -> Result<Vec<OracleResponse>> {
        self.nodes
            .iter()
            .map(|node| self.observe(node, reading))
            .collect()
    }

    fn observe(&self, node: &OracleNode, reading: &WeatherReading) -> Result<OracleResponse> {
        let mut rng = StdRng::seed_from_u64(
            self.seed
                ^ (node.index as u64).wrapping_mul(0x9E37_79B9_7F4A_7C15)
                ^ reading.timestamp.timestamp() as u64,
        );

        let mut jitter = |value: f64| -> f64 {
            let factor = if self.rainfall_noise > 0.0 {
                1.0 + rng.gen_range(-self.rainfall_noise..=self.rainfall_noise)
            } else {
                1.0
            };
            ((value * factor).max(0.0) * 10.0).round() / 10.0
        };

        let rainfall = Rainfall {
            current: jitter(reading.rainfall.current),
            last_24h: jitter(reading.rainfall.last_24h),
            cumulative: jitter(reading.rainfall.cumulative),
        };
        let confidence_score = rng.gen_range(70.0_f64..=95.0).round();

        let mut response = OracleResponse {
            oracle_address: to_checksum(&node.wallet.address(), None),
            signature: None,
            timestamp: reading.timestamp,
            latitude: reading.latitude,
            longitude: reading.longitude,
            temperature: reading.temperature,
            humidity: reading.humidity,
            rainfall,
            confidence_score: Some(confidence_score),
        };

        if node.signs {
            let digest = hash_message(response.signing_payload());
            let signature = node.wallet
                .sign_hash(digest)
                .map_err(|e| OracleError::Signing(e.to_string()))?;
            response.signature = Some(signature.to_string());
        }

        Ok(response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::types::ReadingSource;
    use chrono::{TimeZone, Utc};

    fn reading() -> WeatherReading {
        WeatherReading {
            timestamp: Utc.with_ymd_and_hms(2026, 5, 1, 9, 0, 0).unwrap(),
            latitude: -1.2921,
            longitude: 36.8219,
            temperature: 22.0,
            humidity: 65.0,
            rainfall: Rainfall { current: 2.0, last_24h: 40.0, cumulative: 180.0 },
            source: ReadingSource::Upstream,
        }
    }

    #[test]
    fn test_collect_one_response_per_node() {
        let network = OracleNetwork::new(&OracleNetworkConfig::default()).unwrap();
        let responses = network.collect(&reading()).unwrap();

        assert_eq!(responses.len(), 5);
        assert!(responses.iter().all(|r| r.is_signed()));

        // Distinct keys per node
        let mut addrs: Vec<_> = responses.iter().map(|r| r.oracle_address.clone()).collect();
        addrs.sort();
        addrs.dedup();
        assert_eq!(addrs.len(), 5);
    }

    #[test]
    fn test_unsigned_nodes() {
        let config = OracleNetworkConfig { unsigned_nodes: 2, ..Default::default() };
        let network = OracleNetwork::new(&config).unwrap();
        let responses = network.collect(&reading()).unwrap();

        assert_eq!(responses.iter().filter(|r| r.is_signed()).count(), 3);
    }

    #[test]
    fn test_noise_stays_within_bounds() {
        let network = OracleNetwork::new(&OracleNetworkConfig::default()).unwrap();
        for r in network.collect(&reading()).unwrap() {
            assert!((r.rainfall.cumulative - 180.0).abs() <= 180.0 * 0.03 + 0.1);
            let confidence = r.confidence_score.unwrap();
            assert!((70.0..=95.0).contains(&confidence));
        }
    }

    #[test]
    fn test_collect_is_reproducible() {
        let a = OracleNetwork::new(&OracleNetworkConfig::default()).unwrap();
        let b = OracleNetwork::new(&OracleNetworkConfig::default()).unwrap();
        assert_eq!(a.collect(&reading()).unwrap(), b.collect(&reading()).unwrap());
    }
}
