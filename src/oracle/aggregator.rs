//! Oracle Aggregator
//!
//! Combines a validated batch of oracle responses into one consensus reading
//! using confidence-weighted averaging.
//!
//! ```text
//! oracle A (conf 90) → 180mm ┐
//! oracle B (conf 60) → 170mm ├→ [validate: signatures, quorum] → [weighted mean] → 177mm
//! oracle C (conf 90) → 178mm ┘
//! ```

use serde::Deserialize;
use tracing::debug;
use crate::data::types::{ConsensusReading, OracleResponse};
use crate::error::{OracleError, Result};
use crate::oracle::validator::{self, DEFAULT_QUORUM};

/// Confidence assumed for a response that does not report one
pub const DEFAULT_CONFIDENCE: f64 = 50.0;

#[derive(Debug, Clone, Deserialize)]
pub struct AggregatorConfig {
    #[serde(default = "default_quorum")]
    pub quorum: usize,
    /// Also require signatures to recover to the oracle address
    #[serde(default)]
    pub verify_signatures: bool,
}

fn default_quorum() -> usize { DEFAULT_QUORUM }

impl Default for AggregatorConfig {
    fn default() -> Self {
        Self {
            quorum: DEFAULT_QUORUM,
            verify_signatures: false,
        }
    }
}

/// Per-response weights: confidence divided by the batch's total confidence.
///
/// The weights sum to 1. A batch whose confidences are all zero is weighted
/// equally.
pub fn weights(responses: &[OracleResponse]) -> Vec<f64> {
    let scores: Vec<f64> = responses
        .iter()
        .map(|r| r.confidence_score.unwrap_or(DEFAULT_CONFIDENCE).max(0.0))
        .collect();
    let total: f64 = scores.iter().sum();

    if total <= 0.0 {
        let equal = 1.0 / responses.len().max(1) as f64;
        return vec![equal; responses.len()];
    }

    scores.iter().map(|s| s / total).collect()
}

/// Weighted consensus of an already-validated batch.
///
/// Rainfall figures and confidence are weight-sums rounded to the nearest
/// integer. The timestamp is the latest in the batch; the location is taken
/// from the first response without checking that the others agree.
pub fn aggregate(valid: &[OracleResponse], quorum: usize) -> Result<ConsensusReading> {
    let first = valid.first().ok_or(OracleError::EmptyBatch)?;
    let w = weights(valid);

    let mut cumulative = 0.0;
    let mut last_24h = 0.0;
    let mut confidence = 0.0;
    for (response, weight) in valid.iter().zip(&w) {
        cumulative += response.rainfall.cumulative * weight;
        last_24h += response.rainfall.last_24h * weight;
        confidence += response.confidence_score.unwrap_or(DEFAULT_CONFIDENCE) * weight;
    }

    let timestamp = valid
        .iter()
        .map(|r| r.timestamp)
        .max()
        .unwrap_or(first.timestamp);

    Ok(ConsensusReading {
        timestamp,
        latitude: first.latitude,
        longitude: first.longitude,
        cumulative_rainfall: cumulative.round(),
        rainfall_24h: last_24h.round(),
        confidence_score: confidence.round(),
        oracle_count: valid.len(),
        quorum_reached: valid.len() >= quorum,
    })
}

/// Validation and aggregation with a fixed configuration.
pub struct OracleAggregator {
    config: AggregatorConfig,
}

impl OracleAggregator {
    pub fn new(config: AggregatorConfig) -> Self {
        Self { config }
    }

    pub fn quorum(&self) -> usize {
        self.config.quorum
    }

    pub fn validate(&self, responses: &[OracleResponse]) -> Result<Vec<OracleResponse>> {
        if self.config.verify_signatures {
            validator::validate_verified(responses, self.config.quorum)
        } else {
            validator::validate(responses, self.config.quorum)
        }
    }

    /// Validate `responses` then aggregate the survivors.
    pub fn consensus(&self, responses: &[OracleResponse]) -> Result<ConsensusReading> {
        let valid = self.validate(responses)?;
        let consensus = aggregate(&valid, self.config.quorum)?;

        debug!(
            "Consensus from {}/{} oracles: cumulative={}mm 24h={}mm confidence={}",
            valid.len(),
            responses.len(),
            consensus.cumulative_rainfall,
            consensus.rainfall_24h,
            consensus.confidence_score
        );

        Ok(consensus)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::types::Rainfall;
    use chrono::{DateTime, TimeZone, Utc};

    fn ts(hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 6, 1, hour, 0, 0).unwrap()
    }

    fn response(cumulative: f64, last_24h: f64, confidence: Option<f64>, hour: u32) -> OracleResponse {
        OracleResponse {
            oracle_address: format!("oracle-{}", hour),
            signature: Some("0x01".to_string()),
            timestamp: ts(hour),
            latitude: 9.0 + hour as f64,
            longitude: 38.0,
            temperature: 25.0,
            humidity: 60.0,
            rainfall: Rainfall { current: 0.0, last_24h, cumulative },
            confidence_score: confidence,
        }
    }

    #[test]
    fn test_weights_sum_to_one() {
        let batches = vec![
            vec![response(1.0, 1.0, Some(90.0), 1), response(1.0, 1.0, Some(60.0), 2)],
            vec![
                response(1.0, 1.0, Some(33.3), 1),
                response(1.0, 1.0, None, 2),
                response(1.0, 1.0, Some(71.7), 3),
                response(1.0, 1.0, Some(0.1), 4),
            ],
            vec![response(1.0, 1.0, Some(0.0), 1), response(1.0, 1.0, Some(0.0), 2)],
        ];

        for batch in batches {
            let total: f64 = weights(&batch).iter().sum();
            assert!((total - 1.0).abs() < 1e-9);
        }
    }

    #[test]
    fn test_missing_confidence_defaults_to_fifty() {
        let batch = vec![response(0.0, 0.0, None, 1), response(0.0, 0.0, Some(150.0), 2)];
        let w = weights(&batch);
        assert!((w[0] - 0.25).abs() < 1e-12);
        assert!((w[1] - 0.75).abs() < 1e-12);
    }

    #[test]
    fn test_weighted_average_rounded() {
        let batch = vec![
            response(180.0, 40.0, Some(90.0), 1),
            response(170.0, 30.0, Some(60.0), 2),
            response(178.0, 36.0, Some(90.0), 3),
        ];
        let consensus = aggregate(&batch, 3).unwrap();

        // (180*90 + 170*60 + 178*90) / 240 = 176.75
        assert_eq!(consensus.cumulative_rainfall, 177.0);
        // (40*90 + 30*60 + 36*90) / 240 = 36.0
        assert_eq!(consensus.rainfall_24h, 36.0);
        // (90*90 + 60*60 + 90*90) / 240 = 82.5
        assert_eq!(consensus.confidence_score, 83.0);
        assert_eq!(consensus.oracle_count, 3);
        assert!(consensus.quorum_reached);
    }

    #[test]
    fn test_latest_timestamp_and_first_location() {
        let batch = vec![
            response(10.0, 1.0, Some(50.0), 4),
            response(10.0, 1.0, Some(50.0), 9),
            response(10.0, 1.0, Some(50.0), 2),
        ];
        let consensus = aggregate(&batch, 3).unwrap();

        assert_eq!(consensus.timestamp, ts(9));
        assert_eq!(consensus.latitude, 13.0);
    }

    #[test]
    fn test_quorum_flag_tracks_count() {
        let batch = vec![response(10.0, 1.0, Some(50.0), 1), response(12.0, 1.0, Some(50.0), 2)];
        assert!(!aggregate(&batch, 3).unwrap().quorum_reached);
        assert!(aggregate(&batch, 2).unwrap().quorum_reached);
    }

    #[test]
    fn test_empty_batch() {
        assert_eq!(aggregate(&[], 3), Err(OracleError::EmptyBatch));
    }

    #[test]
    fn test_aggregate_is_deterministic() {
        let batch = vec![
            response(123.4, 11.1, Some(77.7), 1),
            response(119.9, 13.3, Some(81.2), 2),
            response(130.2, 9.8, None, 3),
        ];
        assert_eq!(aggregate(&batch, 3).unwrap(), aggregate(&batch.clone(), 3).unwrap());
    }

    #[test]
    fn test_consensus_rejects_below_quorum() {
        let aggregator = OracleAggregator::new(AggregatorConfig::default());
        let mut batch = vec![
            response(10.0, 1.0, Some(50.0), 1),
            response(12.0, 1.0, Some(50.0), 2),
            response(14.0, 1.0, Some(50.0), 3),
        ];
        assert!(aggregator.consensus(&batch).is_ok());

        batch[2].signature = None;
        assert_eq!(
            aggregator.consensus(&batch),
            Err(OracleError::QuorumNotReached { valid: 2, required: 3 })
        );
    }
}
