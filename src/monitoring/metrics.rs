//! Prometheus counters, compiled in with the `metrics` feature.
//!
//! Without the feature every recorder is a no-op and `gather` returns an
//! empty string, so call sites never need their own `cfg` guards.

#[cfg(feature = "metrics")]
mod imp {
    use prometheus::{Counter, Encoder, IntCounter, Registry, TextEncoder};
    use std::sync::OnceLock;
    use tracing::warn;

    pub struct Metrics {
        registry: Registry,
        pub cache_hits: IntCounter,
        pub cache_misses: IntCounter,
        pub fallbacks: IntCounter,
        pub quorum_failures: IntCounter,
        pub payouts: IntCounter,
        pub payout_amount: Counter,
    }

    impl Metrics {
        fn build() -> prometheus::Result<Self> {
            let registry = Registry::new();

            let cache_hits = IntCounter::new("rainguard_weather_cache_hits_total", "Weather cache hits")?;
            let cache_misses = IntCounter::new("rainguard_weather_cache_misses_total", "Weather cache misses")?;
            let fallbacks = IntCounter::new("rainguard_weather_fallbacks_total", "Synthetic readings served")?;
            let quorum_failures = IntCounter::new("rainguard_quorum_failures_total", "Oracle batches below quorum")?;
            let payouts = IntCounter::new("rainguard_payouts_total", "Triggered payouts")?;
            let payout_amount = Counter::new("rainguard_payout_amount_total", "Sum of triggered payout amounts")?;

            registry.register(Box::new(cache_hits.clone()))?;
            registry.register(Box::new(cache_misses.clone()))?;
            registry.register(Box::new(fallbacks.clone()))?;
            registry.register(Box::new(quorum_failures.clone()))?;
            registry.register(Box::new(payouts.clone()))?;
            registry.register(Box::new(payout_amount.clone()))?;

            Ok(Self {
                registry,
                cache_hits,
                cache_misses,
                fallbacks,
                quorum_failures,
                payouts,
                payout_amount,
            })
        }
    }

    static METRICS: OnceLock<Option<Metrics>> = OnceLock::new();

    pub fn get() -> Option<&'static Metrics> {
        METRICS
            .get_or_init(|| match Metrics::build() {
                Ok(m) => Some(m),
                Err(e) => {
                    warn!("Failed to register metrics: {}", e);
                    None
                }
            })
            .as_ref()
    }

    pub fn gather() -> String {
        let Some(m) = get() else {
            return String::new();
        };
        let mut buf = Vec::new();
        if let Err(e) = TextEncoder::new().encode(&m.registry.gather(), &mut buf) {
            warn!("Failed to encode metrics: {}", e);
            return String::new();
        }
        String::from_utf8(buf).unwrap_or_default()
    }
}

#[cfg(feature = "metrics")]
pub fn record_cache_hit() {
    if let Some(m) = imp::get() {
        m.cache_hits.inc();
    }
}

#[cfg(feature = "metrics")]
pub fn record_cache_miss() {
    if let Some(m) = imp::get() {
        m.cache_misses.inc();
    }
}

#[cfg(feature = "metrics")]
pub fn record_fallback() {
    if let Some(m) = imp::get() {
        m.fallbacks.inc();
    }
}

#[cfg(feature = "metrics")]
pub fn record_quorum_failure() {
    if let Some(m) = imp::get() {
        m.quorum_failures.inc();
    }
}

#[cfg(feature = "metrics")]
pub fn record_payout(amount: u64) {
    if let Some(m) = imp::get() {
        m.payouts.inc();
        m.payout_amount.inc_by(amount as f64);
    }
}

/// Text exposition of all counters
#[cfg(feature = "metrics")]
pub fn gather() -> String {
    imp::gather()
}

#[cfg(not(feature = "metrics"))]
pub fn record_cache_hit() {}

#[cfg(not(feature = "metrics"))]
pub fn record_cache_miss() {}

#[cfg(not(feature = "metrics"))]
pub fn record_fallback() {}

#[cfg(not(feature = "metrics"))]
pub fn record_quorum_failure() {}

#[cfg(not(feature = "metrics"))]
pub fn record_payout(_amount: u64) {}

#[cfg(not(feature = "metrics"))]
pub fn gather() -> String {
    String::new()
}

#[cfg(all(test, feature = "metrics"))]
mod tests {
    use super::*;

    #[test]
    fn test_counters_exported() {
        record_fallback();
        record_payout(1200);

        let text = gather();
        assert!(text.contains("rainguard_weather_fallbacks_total"));
        assert!(text.contains("rainguard_payouts_total"));
    }
}
