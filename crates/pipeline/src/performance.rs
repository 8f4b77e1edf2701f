//! Performance monitor (C4): rolling per-service statistics, bounded
//! history, and advisory threshold alerts.

use std::collections::{HashMap, VecDeque};

use parking_lot::Mutex;

use scry_domain::config::PerformanceConfig;
use scry_domain::performance::{PerformanceSample, ServiceHealth, ServiceStats};
use scry_domain::trace::TraceEvent;

struct ServiceRecord {
    total: u64,
    successes: u64,
    failures: u64,
    /// Durations of the last `rolling_window` *successful* samples.
    recent: VecDeque<f64>,
}

impl ServiceRecord {
    fn new() -> Self {
        Self {
            total: 0,
            successes: 0,
            failures: 0,
            recent: VecDeque::new(),
        }
    }

    fn stats(&self) -> ServiceStats {
        if self.recent.is_empty() {
            return ServiceStats {
                count: 0,
                min_secs: 0.0,
                max_secs: 0.0,
                avg_secs: 0.0,
                success_rate: success_rate(self.successes, self.total),
            };
        }
        let min = self.recent.iter().cloned().fold(f64::INFINITY, f64::min);
        let max = self.recent.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
        let sum: f64 = self.recent.iter().sum();
        ServiceStats {
            count: self.recent.len(),
            min_secs: min,
            max_secs: max,
            avg_secs: sum / self.recent.len() as f64,
            success_rate: success_rate(self.successes, self.total),
        }
    }
}

fn success_rate(successes: u64, total: u64) -> f64 {
    if total == 0 {
        0.0
    } else {
        successes as f64 / total as f64
    }
}

/// Scoped timer: construct at the start of an operation, call
/// [`PerformanceMonitor::record`] with the elapsed duration on completion.
/// Mirrors the monitor's own "acquire start instant, record on exit" shape
/// so callers don't have to thread `Instant::now()` through by hand.
pub struct PerformanceTimer {
    start: std::time::Instant,
}

impl PerformanceTimer {
    pub fn start() -> Self {
        Self {
            start: std::time::Instant::now(),
        }
    }

    pub fn elapsed_secs(&self) -> f64 {
        self.start.elapsed().as_secs_f64()
    }
}

pub struct PerformanceMonitor {
    config: PerformanceConfig,
    services: Mutex<HashMap<String, ServiceRecord>>,
    history: Mutex<VecDeque<PerformanceSample>>,
}

impl PerformanceMonitor {
    pub fn new(config: PerformanceConfig) -> Self {
        Self {
            config,
            services: Mutex::new(HashMap::new()),
            history: Mutex::new(VecDeque::new()),
        }
    }

    pub fn record(
        &self,
        service: impl Into<String>,
        operation: impl Into<String>,
        duration_secs: f64,
        success: bool,
        metadata: serde_json::Value,
    ) {
        let service = service.into();

        {
            let mut history = self.history.lock();
            history.push_back(PerformanceSample {
                service: service.clone(),
                operation: operation.into(),
                duration_secs,
                success,
                timestamp: chrono::Utc::now(),
                metadata,
            });
            while history.len() > self.config.max_history {
                history.pop_front();
            }
        }

        let mut services = self.services.lock();
        let record = services.entry(service.clone()).or_insert_with(ServiceRecord::new);
        record.total += 1;
        if success {
            record.successes += 1;
            record.recent.push_back(duration_secs);
            while record.recent.len() > self.config.rolling_window {
                record.recent.pop_front();
            }
        } else {
            record.failures += 1;
        }
        drop(services);

        if let Some(threshold) = self.config.thresholds_secs.get(&service) {
            if duration_secs > *threshold {
                tracing::warn!(service = %service, duration_secs, threshold, "performance threshold exceeded");
                TraceEvent::PerformanceAlert {
                    service,
                    duration_secs,
                    threshold_secs: *threshold,
                }
                .emit();
            }
        }
    }

    /// Per-service health derived from success rate and avg-vs-threshold.
    pub fn summary(&self) -> HashMap<String, (ServiceStats, ServiceHealth)> {
        let services = self.services.lock();
        services
            .iter()
            .map(|(name, record)| {
                let stats = record.stats();
                let health = self.health_for(name, &stats);
                (name.clone(), (stats, health))
            })
            .collect()
    }

    fn health_for(&self, service: &str, stats: &ServiceStats) -> ServiceHealth {
        if stats.count == 0 {
            return ServiceHealth::Unknown;
        }
        let Some(threshold) = self.config.thresholds_secs.get(service) else {
            return ServiceHealth::Unknown;
        };
        if stats.success_rate >= 0.95 && stats.avg_secs <= *threshold {
            ServiceHealth::Good
        } else if stats.success_rate >= 0.8 && stats.avg_secs <= threshold * 1.5 {
            ServiceHealth::Fair
        } else {
            ServiceHealth::Poor
        }
    }

    /// Natural-language hints for services classified as fair or poor.
    pub fn recommendations(&self) -> Vec<String> {
        self.summary()
            .into_iter()
            .filter_map(|(service, (stats, health))| match health {
                ServiceHealth::Poor => Some(format!(
                    "{service} is performing poorly (avg {:.2}s, {:.0}% success) — investigate upstream latency or failures",
                    stats.avg_secs,
                    stats.success_rate * 100.0
                )),
                ServiceHealth::Fair => Some(format!(
                    "{service} is trending slow (avg {:.2}s) — consider caching or batching",
                    stats.avg_secs
                )),
                _ => None,
            })
            .collect()
    }

    pub fn history_len(&self) -> usize {
        self.history.lock().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn monitor() -> PerformanceMonitor {
        PerformanceMonitor::new(PerformanceConfig::default())
    }

    #[test]
    fn history_is_capped_at_max_history() {
        let mon = PerformanceMonitor::new(PerformanceConfig {
            max_history: 5,
            ..PerformanceConfig::default()
        });
        for _ in 0..10 {
            mon.record("stt", "transcribe", 0.1, true, serde_json::Value::Null);
        }
        assert_eq!(mon.history_len(), 5);
    }

    #[test]
    fn rolling_window_caps_recent_samples() {
        let mon = monitor();
        for i in 0..150 {
            mon.record("stt", "transcribe", i as f64 * 0.01, true, serde_json::Value::Null);
        }
        let summary = mon.summary();
        let (stats, _) = &summary["stt"];
        assert_eq!(stats.count, 100);
    }

    #[test]
    fn failures_do_not_enter_rolling_window_but_count_toward_rate() {
        let mon = monitor();
        mon.record("tts", "synthesize", 1.0, true, serde_json::Value::Null);
        mon.record("tts", "synthesize", 1.0, false, serde_json::Value::Null);
        let summary = mon.summary();
        let (stats, _) = &summary["tts"];
        assert_eq!(stats.count, 1);
        assert_eq!(stats.success_rate, 0.5);
    }

    #[test]
    fn unknown_service_without_threshold_is_unknown_health() {
        let mon = monitor();
        mon.record("custom_service", "call", 0.1, true, serde_json::Value::Null);
        let summary = mon.summary();
        assert_eq!(summary["custom_service"].1, ServiceHealth::Unknown);
    }

    #[test]
    fn good_health_when_fast_and_reliable() {
        let mon = monitor();
        for _ in 0..10 {
            mon.record("stt", "transcribe", 1.0, true, serde_json::Value::Null);
        }
        let summary = mon.summary();
        assert_eq!(summary["stt"].1, ServiceHealth::Good);
    }

    #[test]
    fn poor_health_when_slow() {
        let mon = monitor();
        for _ in 0..10 {
            mon.record("stt", "transcribe", 500.0, true, serde_json::Value::Null);
        }
        let summary = mon.summary();
        assert_eq!(summary["stt"].1, ServiceHealth::Poor);
    }
}
