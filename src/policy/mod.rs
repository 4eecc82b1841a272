pub mod evaluator;
pub mod premium;
pub mod types;

pub use evaluator::{evaluate, weather_index};
pub use premium::{quote, PremiumRates};
pub use types::{CoverageArea, ParametricPolicy, PayoutResult, PremiumQuote, ProductType};
