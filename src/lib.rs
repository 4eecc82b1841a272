//! Parametric rainfall-insurance settlement.
//!
//! Weather is fetched once per location (cached, with a deterministic
//! fallback), observed and signed by a set of oracles, validated against a
//! quorum, aggregated by confidence weight and finally compared with each
//! policy's trigger and saturation thresholds.

pub mod config;
pub mod data;
pub mod error;
pub mod monitoring;
pub mod oracle;
pub mod policy;
pub mod settlement;
