use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Where a reading came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReadingSource {
    Upstream,
    Fallback,
}

/// Rainfall in millimetres over three windows.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rainfall {
    pub current: f64,
    pub last_24h: f64,
    pub cumulative: f64,
}

/// A single location's current conditions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherReading {
    pub timestamp: DateTime<Utc>,
    pub latitude: f64,
    pub longitude: f64,
    /// Degrees Celsius
    pub temperature: f64,
    /// Relative humidity, 0-100
    pub humidity: f64,
    pub rainfall: Rainfall,
    pub source: ReadingSource,
}

/// One oracle's signed observation of a location.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OracleResponse {
    pub oracle_address: String,
    pub signature: Option<String>,
    pub timestamp: DateTime<Utc>,
    pub latitude: f64,
    pub longitude: f64,
    pub temperature: f64,
    pub humidity: f64,
    pub rainfall: Rainfall,
    /// 0-100; treated as 50 when absent
    pub confidence_score: Option<f64>,
}

impl OracleResponse {
    /// Canonical text that an oracle signs for this observation.
    ///
    /// The address and signature are excluded; everything the aggregator
    /// consumes is included.
    pub fn signing_payload(&self) -> String {
        format!(
            "rainguard:{}:{:.6}:{:.6}:{:.2}:{:.2}:{:.2}:{:.2}:{:.2}:{}",
            self.timestamp.timestamp(),
            self.latitude,
            self.longitude,
            self.temperature,
            self.humidity,
            self.rainfall.current,
            self.rainfall.last_24h,
            self.rainfall.cumulative,
            self.confidence_score
                .map(|c| format!("{:.2}", c))
                .unwrap_or_else(|| "-".to_string()),
        )
    }

    pub fn is_signed(&self) -> bool {
        self.signature
            .as_deref()
            .map(|s| !s.trim().is_empty())
            .unwrap_or(false)
    }
}

/// Weighted consensus of a validated oracle batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConsensusReading {
    pub timestamp: DateTime<Utc>,
    pub latitude: f64,
    pub longitude: f64,
    pub cumulative_rainfall: f64,
    pub rainfall_24h: f64,
    pub confidence_score: f64,
    pub oracle_count: usize,
    pub quorum_reached: bool,
}
