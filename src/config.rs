use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::time::Duration;
use crate::oracle::{AggregatorConfig, OracleNetworkConfig};
use crate::policy::{ParametricPolicy, PremiumRates};

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub weather: WeatherConfig,
    #[serde(default)]
    pub oracle: OracleConfig,
    #[serde(default)]
    pub premium: PremiumRates,
    #[serde(default)]
    pub monitoring: MonitoringConfig,
    #[serde(default)]
    pub policies: Vec<ParametricPolicy>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WeatherConfig {
    #[serde(default = "default_api_url")]
    pub api_url: String,
    #[serde(default = "default_cache_ttl")]
    pub cache_ttl_secs: u64,
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

fn default_api_url() -> String { "https://api.openweathermap.org/data/2.5/weather".to_string() }
fn default_cache_ttl() -> u64 { 300 }
fn default_request_timeout() -> u64 { 10 }

impl Default for WeatherConfig {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            cache_ttl_secs: default_cache_ttl(),
            request_timeout_secs: default_request_timeout(),
        }
    }
}

impl WeatherConfig {
    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct OracleConfig {
    #[serde(flatten)]
    pub aggregator: AggregatorConfig,
    #[serde(default)]
    pub network: OracleNetworkConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MonitoringConfig {
    #[serde(default)]
    pub csv_logging: bool,
    #[serde(default = "default_csv_path")]
    pub csv_log_path: String,
}

fn default_csv_path() -> String { "settlements.csv".to_string() }

impl Default for MonitoringConfig {
    fn default() -> Self {
        Self {
            csv_logging: false,
            csv_log_path: default_csv_path(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct EnvConfig {
    pub config_path: String,
    pub weather_api_key: Option<String>,
    pub weather_api_url: Option<String>,
}

impl Config {
    pub fn load(path: &str) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path))?;

        Self::parse(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path))
    }

    pub fn parse(contents: &str) -> Result<Self> {
        let config: Config = toml::from_str(contents)?;
        Ok(config)
    }
}

impl EnvConfig {
    pub fn load() -> Result<Self> {
        dotenv::dotenv().ok();

        Ok(Self {
            config_path: std::env::var("RAINGUARD_CONFIG")
                .unwrap_or_else(|_| "config.toml".to_string()),
            weather_api_key: std::env::var("WEATHER_API_KEY")
                .ok()
                .filter(|k| !k.trim().is_empty()),
            weather_api_url: std::env::var("WEATHER_API_URL").ok(),
        })
    }
}
