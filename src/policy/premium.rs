use serde::Deserialize;
use tracing::info;
use crate::error::PolicyError;
use crate::policy::types::{ParametricPolicy, PremiumQuote, ProductType};

/// Flat premium rates per product, as a fraction of coverage.
#[derive(Debug, Clone, Deserialize)]
pub struct PremiumRates {
    #[serde(default = "default_seasonal_rate")]
    pub seasonal: f64,
    #[serde(default = "default_event_rate")]
    pub event: f64,
}

fn default_seasonal_rate() -> f64 { 0.05 }
fn default_event_rate() -> f64 { 0.03 }

impl Default for PremiumRates {
    fn default() -> Self {
        Self {
            seasonal: default_seasonal_rate(),
            event: default_event_rate(),
        }
    }
}

impl PremiumRates {
    pub fn rate_for(&self, product_type: ProductType) -> f64 {
        match product_type {
            ProductType::Seasonal => self.seasonal,
            ProductType::Event => self.event,
        }
    }
}

/// Check the fields a policy needs before it can be quoted or settled.
pub fn check_policy(policy: &ParametricPolicy) -> Result<(), PolicyError> {
    if policy.coverage_amount == 0 {
        return Err(PolicyError::ZeroCoverage(policy.id.clone()));
    }
    if !policy.trigger_threshold.is_finite() || !policy.saturation_threshold.is_finite() {
        return Err(PolicyError::NonFiniteThreshold(policy.id.clone()));
    }
    Ok(())
}

/// premium = round(coverage × product rate)
pub fn quote(policy: &ParametricPolicy, rates: &PremiumRates) -> Result<PremiumQuote, PolicyError> {
    check_policy(policy)?;

    let rate = rates.rate_for(policy.product_type);
    if !(0.0..=1.0).contains(&rate) {
        return Err(PolicyError::InvalidRate(rate));
    }

    let premium = (policy.coverage_amount as f64 * rate).round() as u64;

    info!(
        "Quoted {} policy {}: coverage {} at {:.2}% = premium {}",
        policy.product_type, policy.id, policy.coverage_amount, rate * 100.0, premium
    );

    Ok(PremiumQuote {
        policy_id: policy.id.clone(),
        product_type: policy.product_type,
        coverage_amount: policy.coverage_amount,
        rate,
        premium,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::types::CoverageArea;

    fn policy(product_type: ProductType, coverage: u64) -> ParametricPolicy {
        ParametricPolicy {
            id: "farm-7".to_string(),
            product_type,
            coverage_amount: coverage,
            trigger_threshold: 100.0,
            saturation_threshold: 200.0,
            coverage_area: CoverageArea { latitude: 0.0, longitude: 0.0, label: None },
        }
    }

    #[test]
    fn test_quote_uses_product_rate() {
        let rates = PremiumRates::default();

        let seasonal = quote(&policy(ProductType::Seasonal, 50_000), &rates).unwrap();
        assert_eq!(seasonal.premium, 2_500);

        let event = quote(&policy(ProductType::Event, 50_000), &rates).unwrap();
        assert_eq!(event.premium, 1_500);
    }

    #[test]
    fn test_quote_rounds() {
        let rates = PremiumRates { seasonal: 0.045, event: 0.03 };
        assert_eq!(quote(&policy(ProductType::Seasonal, 1_111), &rates).unwrap().premium, 50);
    }

    #[test]
    fn test_rejects_bad_inputs() {
        let rates = PremiumRates::default();
        assert_eq!(
            quote(&policy(ProductType::Event, 0), &rates),
            Err(PolicyError::ZeroCoverage("farm-7".to_string()))
        );

        let mut p = policy(ProductType::Event, 10);
        p.saturation_threshold = f64::NAN;
        assert_eq!(quote(&p, &rates), Err(PolicyError::NonFiniteThreshold("farm-7".to_string())));

        let rates = PremiumRates { seasonal: 1.5, event: 0.03 };
        assert_eq!(
            quote(&policy(ProductType::Seasonal, 10), &rates),
            Err(PolicyError::InvalidRate(1.5))
        );
    }
}
