//! Deterministic fallback readings.
//!
//! When the upstream weather API is unavailable the fetcher substitutes a
//! synthetic reading. The values come from a PRNG seeded purely from
//! (latitude, longitude, hour-of-day, month), so repeated failures for the
//! same place and hour return identical readings.

use chrono::{DateTime, Datelike, TimeZone, Timelike, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::f64::consts::PI;
use crate::data::types::{Rainfall, ReadingSource, WeatherReading};

/// Seed for a location and time bucket.
///
/// Coordinates are quantised to 4 decimal places, matching the cache key,
/// so readings that share a cache slot also share a seed.
pub fn fallback_seed(lat: f64, lng: f64, hour: u32, month: u32) -> u64 {
    let lat_q = (lat * 10_000.0).round() as i64 as u64;
    let lng_q = (lng * 10_000.0).round() as i64 as u64;

    let mut seed: u64 = 0x9E37_79B9_7F4A_7C15;
    for part in [lat_q, lng_q, hour as u64, month as u64] {
        seed ^= part
            .wrapping_add(0x9E37_79B9_7F4A_7C15)
            .wrapping_add(seed << 6)
            .wrapping_add(seed >> 2);
    }
    seed
}

/// Build the synthetic reading for `lat`/`lng` at time `at`.
pub fn synthetic_reading(lat: f64, lng: f64, at: DateTime<Utc>) -> WeatherReading {
    let hour = at.hour();
    let month = at.month();
    let mut rng = StdRng::seed_from_u64(fallback_seed(lat, lng, hour, month));

    // Climate shape: warm equator, hemisphere-aware seasons, afternoon peak
    let abs_lat = lat.abs().min(90.0);
    let base = 28.0 - 0.45 * abs_lat;
    let hemisphere = if lat >= 0.0 { 1.0 } else { -1.0 };
    let season_amp = 0.25 * abs_lat.min(60.0);
    let season = hemisphere * season_amp * ((month as f64 - 7.0) * 2.0 * PI / 12.0).cos();
    let diurnal = 4.0 * ((hour as f64 - 15.0) * 2.0 * PI / 24.0).cos();
    let temperature = round_to(base + season + diurnal + rng.gen_range(-1.5..1.5), 1);

    let humidity = rng.gen_range(35.0_f64..95.0).round();

    let wet = rng.gen_bool(0.3);
    let (current, last_24h) = if wet {
        let current = rng.gen_range(0.2..8.0);
        (current, current + rng.gen_range(0.0..20.0))
    } else {
        (0.0, rng.gen_range(0.0..2.0))
    };
    let last_24h = round_to(last_24h, 1);

    WeatherReading {
        timestamp: truncate_to_hour(at),
        latitude: lat,
        longitude: lng,
        temperature,
        humidity,
        rainfall: Rainfall {
            current: round_to(current, 1),
            last_24h,
            cumulative: last_24h,
        },
        source: ReadingSource::Fallback,
    }
}

fn truncate_to_hour(at: DateTime<Utc>) -> DateTime<Utc> {
    let secs = at.timestamp();
    Utc.timestamp_opt(secs - secs.rem_euclid(3600), 0)
        .single()
        .unwrap_or(at)
}

fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10_f64.powi(places);
    (value * factor).round() / factor
}
