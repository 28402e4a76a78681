//! Live search statistics

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use sshvanity_pattern::{format_duration, estimate_time_50pct};

/// Thread-safe search statistics shared by all workers
#[derive(Debug)]
pub struct SearchStats {
    keys_tested: AtomicU64,
    start_time: Instant,
    running: AtomicBool,
    found: AtomicBool,
}

/// Point-in-time copy of [`SearchStats`] for reporting
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StatsSnapshot {
    pub keys_tested: u64,
    pub elapsed_secs: f64,
    pub keys_per_second: f64,
    /// Chance a match would have turned up by now, 0.0 to 1.0
    pub probability: f64,
}

impl SearchStats {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Add candidates that were actually generated
    pub fn add_keys(&self, count: u64) {
        // fetch_update so the counter saturates instead of wrapping
        let _ = self
            .keys_tested
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |n| {
                Some(n.saturating_add(count))
            });
    }

    pub fn total_keys(&self) -> u64 {
        self.keys_tested.load(Ordering::Relaxed)
    }

    pub fn elapsed(&self) -> Duration {
        self.start_time.elapsed()
    }

    pub fn keys_per_second(&self) -> f64 {
        let elapsed = self.elapsed().as_secs_f64();
        if elapsed > 0.0 {
            self.total_keys() as f64 / elapsed
        } else {
            0.0
        }
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Relaxed)
    }

    pub fn stop(&self) {
        self.running.store(false, Ordering::Relaxed);
    }

    /// Record a match and stop the other workers
    pub fn mark_found(&self) {
        self.found.store(true, Ordering::Relaxed);
        self.stop();
    }

    pub fn is_found(&self) -> bool {
        self.found.load(Ordering::Relaxed)
    }

    /// Probability that at least one of the keys tested so far would match
    pub fn probability(&self, difficulty: f64) -> f64 {
        if difficulty > 0.0 && difficulty.is_finite() {
            1.0 - (-(self.total_keys() as f64) / difficulty).exp()
        } else {
            0.0
        }
    }

    /// Seconds until the cumulative match probability reaches 50%, at the current rate
    /// NaN when the difficulty is unknown.
    pub fn eta_50pct(&self, difficulty: f64) -> f64 {
        if difficulty.is_nan() {
            return f64::NAN;
        }
        let kps = self.keys_per_second();
        if kps <= 0.0 {
            return f64::INFINITY;
        }
        let remaining = estimate_time_50pct(difficulty, kps) - self.total_keys() as f64 / kps;
        remaining.max(0.0)
    }

    pub fn snapshot(&self, difficulty: f64) -> StatsSnapshot {
        StatsSnapshot {
            keys_tested: self.total_keys(),
            elapsed_secs: self.elapsed().as_secs_f64(),
            keys_per_second: self.keys_per_second(),
            probability: self.probability(difficulty),
        }
    }

    /// One-line status, e.g. `[0.12 Mkey/s][Total 1.20M][Prob 3.1%][50% in 4.2m]`
    pub fn format(&self, difficulty: f64) -> String {
        let eta = self.eta_50pct(difficulty);
        let eta = if eta <= 0.0 {
            "now".to_string()
        } else {
            format_duration(eta)
        };

        format!(
            "[{:.2} Mkey/s][Total {}][Prob {:.1}%][50% in {}]",
            self.keys_per_second() / 1_000_000.0,
            format_keys(self.total_keys()),
            self.probability(difficulty) * 100.0,
            eta
        )
    }
}

impl Default for SearchStats {
    fn default() -> Self {
        Self {
            keys_tested: AtomicU64::new(0),
            start_time: Instant::now(),
            running: AtomicBool::new(true),
            found: AtomicBool::new(false),
        }
    }
}

fn format_keys(keys: u64) -> String {
    if keys >= 1_000_000_000_000 {
        format!("{:.2}T", keys as f64 / 1e12)
    } else if keys >= 1_000_000_000 {
        format!("{:.2}G", keys as f64 / 1e9)
    } else if keys >= 1_000_000 {
        format!("{:.2}M", keys as f64 / 1e6)
    } else if keys >= 1000 {
        format!("{:.2}K", keys as f64 / 1e3)
    } else {
        format!("{}", keys)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counter_accumulates_and_saturates() {
        let stats = SearchStats::new();
        stats.add_keys(10);
        stats.add_keys(5);
        assert_eq!(stats.total_keys(), 15);

        stats.add_keys(u64::MAX);
        assert_eq!(stats.total_keys(), u64::MAX);
    }

    #[test]
    fn test_mark_found_stops() {
        let stats = SearchStats::new();
        assert!(stats.is_running());
        stats.mark_found();
        assert!(stats.is_found());
        assert!(!stats.is_running());
    }

    #[test]
    fn test_probability() {
        let stats = SearchStats::new();
        assert_eq!(stats.probability(1000.0), 0.0);
        stats.add_keys(1000);
        let p = stats.probability(1000.0);
        assert!((p - (1.0 - (-1.0f64).exp())).abs() < 1e-12);
        assert_eq!(stats.probability(f64::INFINITY), 0.0);
    }

    #[test]
    fn test_unknown_difficulty() {
        let stats = SearchStats::new();
        stats.add_keys(10);
        assert_eq!(stats.probability(f64::NAN), 0.0);
        assert!(stats.eta_50pct(f64::NAN).is_nan());
        assert!(stats.format(f64::NAN).ends_with("[50% in unknown]"));
    }

    #[test]
    fn test_format_keys() {
        assert_eq!(format_keys(999), "999");
        assert_eq!(format_keys(1_500), "1.50K");
        assert_eq!(format_keys(2_000_000), "2.00M");
    }

    #[test]
    fn test_snapshot_serializes() {
        let stats = SearchStats::new();
        stats.add_keys(42);
        let json = serde_json::to_value(stats.snapshot(100.0)).unwrap();
        assert_eq!(json["keys_tested"], 42);
    }
}
