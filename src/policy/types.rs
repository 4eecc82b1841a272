use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProductType {
    /// Indexed on cumulative seasonal rainfall
    Seasonal,
    /// Indexed on 24-hour rainfall
    Event,
}

impl std::fmt::Display for ProductType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProductType::Seasonal => write!(f, "seasonal"),
            ProductType::Event => write!(f, "event"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoverageArea {
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default)]
    pub label: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParametricPolicy {
    pub id: String,
    pub product_type: ProductType,
    pub coverage_amount: u64,
    pub trigger_threshold: f64,
    pub saturation_threshold: f64,
    pub coverage_area: CoverageArea,
}

impl ParametricPolicy {
    /// Saturation below trigger: payout can only ever be 0 or full.
    pub fn has_inverted_thresholds(&self) -> bool {
        self.saturation_threshold < self.trigger_threshold
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PayoutResult {
    pub triggered: bool,
    pub payout_amount: u64,
    /// Index value the thresholds were compared against
    pub weather_index: f64,
    /// 0-100
    pub payout_percentage: f64,
}

impl PayoutResult {
    pub fn none(weather_index: f64) -> Self {
        Self {
            triggered: false,
            payout_amount: 0,
            weather_index,
            payout_percentage: 0.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PremiumQuote {
    pub policy_id: String,
    pub product_type: ProductType,
    pub coverage_amount: u64,
    pub rate: f64,
    pub premium: u64,
}
