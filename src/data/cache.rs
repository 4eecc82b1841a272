use dashmap::DashMap;
use std::time::{Duration, Instant};
use crate::data::types::WeatherReading;

/// Default freshness window for a cached reading (5 minutes)
pub const DEFAULT_WEATHER_TTL: Duration = Duration::from_secs(300);

/// Readings keyed by coordinates rounded to 4 decimal places.
pub struct WeatherCache {
    cache: DashMap<String, CachedReading>,
    ttl: Duration,
}

struct CachedReading {
    reading: WeatherReading,
    timestamp: Instant,
}

impl WeatherCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            cache: DashMap::new(),
            ttl,
        }
    }

    /// Cache key for a coordinate pair, e.g. "40.7128,-74.0060"
    pub fn key(lat: f64, lng: f64) -> String {
        format!("{:.4},{:.4}", lat, lng)
    }

    pub fn insert(&self, key: String, reading: WeatherReading) {
        self.cache.insert(key, CachedReading {
            reading,
            timestamp: Instant::now(),
        });
    }

    /// Get reading if not expired (evict on read)
    pub fn get(&self, key: &str) -> Option<WeatherReading> {
        self.cache.get(key).and_then(|entry| {
            if entry.timestamp.elapsed() > self.ttl {
                drop(entry); // Drop the read lock
                self.cache.remove(key);
                None
            } else {
                Some(entry.reading.clone())
            }
        })
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn clear(&self) {
        self.cache.clear();
    }

    pub fn len(&self) -> usize {
        self.cache.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cache.is_empty()
    }
}

impl Default for WeatherCache {
    fn default() -> Self {
        Self::new(DEFAULT_WEATHER_TTL)
    }
}
