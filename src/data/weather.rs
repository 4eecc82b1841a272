use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use reqwest::Client;
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};
use crate::data::cache::WeatherCache;
use crate::data::fallback::synthetic_reading;
use crate::data::types::{Rainfall, ReadingSource, WeatherReading};
use crate::monitoring::metrics;

/// Upstream provider of current conditions.
#[async_trait]
pub trait WeatherSource: Send + Sync {
    async fn fetch_current(&self, lat: f64, lng: f64) -> Result<WeatherReading>;
}

/// OpenWeatherMap-style "current weather" endpoint.
pub struct OpenWeatherSource {
    client: Client,
    base_url: String,
    api_key: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CurrentWeatherResponse {
    #[serde(default)]
    dt: Option<i64>,
    main: CurrentMain,
    #[serde(default)]
    rain: Option<CurrentRain>,
}

#[derive(Debug, Deserialize)]
struct CurrentMain {
    temp: f64,
    humidity: f64,
}

#[derive(Debug, Deserialize)]
struct CurrentRain {
    #[serde(rename = "1h", default)]
    one_hour: Option<f64>,
    #[serde(rename = "3h", default)]
    three_hour: Option<f64>,
}

impl OpenWeatherSource {
    pub fn new(base_url: String, api_key: Option<String>, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build weather HTTP client")?;

        Ok(Self {
            client,
            base_url,
            api_key,
        })
    }
}

#[async_trait]
impl WeatherSource for OpenWeatherSource {
    async fn fetch_current(&self, lat: f64, lng: f64) -> Result<WeatherReading> {
        let api_key = self.api_key
            .as_deref()
            .context("WEATHER_API_KEY not configured")?;

        let response: CurrentWeatherResponse = self.client
            .get(&self.base_url)
            .query(&[
                ("lat", lat.to_string()),
                ("lon", lng.to_string()),
                ("appid", api_key.to_string()),
                ("units", "metric".to_string()),
            ])
            .send()
            .await
            .context("Failed to fetch current weather")?
            .error_for_status()
            .context("Weather API returned an error status")?
            .json()
            .await
            .context("Failed to parse weather response")?;

        Ok(map_response(response, lat, lng, Utc::now()))
    }
}

/// Map provider fields into a reading.
///
/// Rain volumes are optional in the payload and default to 0. The 24h
/// figure is extrapolated from the 3h window when present, else from 1h.
fn map_response(
    response: CurrentWeatherResponse,
    lat: f64,
    lng: f64,
    received_at: DateTime<Utc>,
) -> WeatherReading {
    let (one_hour, three_hour) = response.rain
        .map(|r| (r.one_hour, r.three_hour))
        .unwrap_or((None, None));

    let current = one_hour
        .or(three_hour.map(|v| v / 3.0))
        .unwrap_or(0.0);
    let last_24h = three_hour
        .map(|v| v * 8.0)
        .or(one_hour.map(|v| v * 24.0))
        .unwrap_or(0.0);

    let timestamp = response.dt
        .and_then(|dt| Utc.timestamp_opt(dt, 0).single())
        .unwrap_or(received_at);

    WeatherReading {
        timestamp,
        latitude: lat,
        longitude: lng,
        temperature: response.main.temp,
        humidity: response.main.humidity,
        rainfall: Rainfall {
            current,
            last_24h,
            cumulative: last_24h,
        },
        source: ReadingSource::Upstream,
    }
}

/// Cached weather fetcher with a deterministic fallback.
pub struct WeatherClient {
    source: Arc<dyn WeatherSource>,
    cache: WeatherCache,
}

impl WeatherClient {
    pub fn new(source: Arc<dyn WeatherSource>, cache: WeatherCache) -> Self {
        Self { source, cache }
    }

    /// Current conditions for a location. Never fails: an unreachable or
    /// malformed upstream yields the synthetic reading for this hour.
    pub async fn get_current_weather(&self, lat: f64, lng: f64) -> WeatherReading {
        self.get_current_weather_at(lat, lng, Utc::now()).await
    }

    pub async fn get_current_weather_at(
        &self,
        lat: f64,
        lng: f64,
        now: DateTime<Utc>,
    ) -> WeatherReading {
        let key = WeatherCache::key(lat, lng);

        if let Some(cached) = self.cache.get(&key) {
            debug!("Weather cache HIT for {}", key);
            metrics::record_cache_hit();
            return cached;
        }

        debug!("Weather cache MISS for {}", key);
        metrics::record_cache_miss();

        match self.source.fetch_current(lat, lng).await {
            Ok(reading) => {
                info!(
                    "Fetched weather for {}: {:.1}°C, {:.0}% humidity, {:.1}mm/24h",
                    key, reading.temperature, reading.humidity, reading.rainfall.last_24h
                );
                self.cache.insert(key, reading.clone());
                reading
            }
            Err(e) => {
                warn!("Weather upstream unavailable for {} ({:#}), using fallback", key, e);
                metrics::record_fallback();
                synthetic_reading(lat, lng, now)
            }
        }
    }

    pub fn cache(&self) -> &WeatherCache {
        &self.cache
    }
}
