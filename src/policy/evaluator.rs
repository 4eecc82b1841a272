use tracing::{debug, warn};
use crate::data::types::ConsensusReading;
use crate::policy::types::{ParametricPolicy, PayoutResult, ProductType};

/// Index a policy is settled on.
pub fn weather_index(consensus: &ConsensusReading, product_type: ProductType) -> f64 {
    match product_type {
        ProductType::Seasonal => consensus.cumulative_rainfall,
        ProductType::Event => consensus.rainfall_24h,
    }
}

/// Compare the consensus index with the policy's thresholds.
///
/// Below trigger pays nothing, at or above saturation pays full coverage,
/// and anything in between pays linearly. The checks run in that order, so
/// equal thresholds resolve to a full payout and the interpolation divisor
/// is always positive.
///
/// Payout grows with rainfall. A policy whose saturation sits below its
/// trigger (the drought-style dashboard defaults) is evaluated literally
/// and only ever pays 0 or full; a warning is logged because the intended
/// direction for such policies is unresolved.
pub fn evaluate(consensus: &ConsensusReading, policy: &ParametricPolicy) -> PayoutResult {
    let index = weather_index(consensus, policy.product_type);

    if policy.has_inverted_thresholds() {
        warn!(
            "Policy {} has saturation {} below trigger {}; evaluating literally",
            policy.id, policy.saturation_threshold, policy.trigger_threshold
        );
    }

    if index < policy.trigger_threshold {
        debug!(
            "Policy {} not triggered: index {} < trigger {}",
            policy.id, index, policy.trigger_threshold
        );
        return PayoutResult::none(index);
    }

    if index >= policy.saturation_threshold {
        return PayoutResult {
            triggered: true,
            payout_amount: policy.coverage_amount,
            weather_index: index,
            payout_percentage: 100.0,
        };
    }

    let span = policy.saturation_threshold - policy.trigger_threshold;
    let payout_percentage = (index - policy.trigger_threshold) / span * 100.0;
    let payout_amount = (policy.coverage_amount as f64 * payout_percentage / 100.0).round() as u64;

    PayoutResult {
        triggered: true,
        payout_amount,
        weather_index: index,
        payout_percentage,
    }
}
