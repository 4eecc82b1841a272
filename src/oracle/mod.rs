pub mod aggregator;
pub mod network;
pub mod validator;

pub use aggregator::{aggregate, weights, AggregatorConfig, OracleAggregator};
pub use network::{OracleNetwork, OracleNetworkConfig};
pub use validator::{validate, validate_verified, DEFAULT_QUORUM};
