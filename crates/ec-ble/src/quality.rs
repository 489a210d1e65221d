//! Connection quality monitor (§4.3).
//!
//! Score formula: `clamp(100 + α·(avg_rssi + 60) + β·success_ratio, 0, 100)`.
//! Constants are implementation-defined per §4.3's text; chosen here so that
//! a peer at the nominal BLE sensitivity floor (-60 dBm) with perfect
//! reliability lands near the top of the range while still leaving headroom
//! for stronger signal.
use std::collections::HashMap;

const ALPHA: f64 = 0.5;
const BETA: f64 = 20.0;

/// Failure ratio at or above this fraction marks a peer blacklisted for
/// routing purposes (§4.3).
const BLACKLIST_FAIL_RATIO: f64 = 0.5;
/// Minimum sample count before the failure ratio is trusted — a single
/// failed attempt should not immediately blacklist a peer.
const BLACKLIST_MIN_SAMPLES: u32 = 3;

#[derive(Debug, Clone, Copy, Default)]
struct PeerStats {
    rssi_sum: i64,
    rssi_samples: u32,
    successes: u32,
    failures: u32,
}

impl PeerStats {
    fn avg_rssi(&self) -> Option<f64> {
        if self.rssi_samples == 0 {
            None
        } else {
            Some(self.rssi_sum as f64 / self.rssi_samples as f64)
        }
    }

    fn success_ratio(&self) -> f64 {
        let total = self.successes + self.failures;
        if total == 0 {
            1.0
        } else {
            self.successes as f64 / total as f64
        }
    }

    fn fail_ratio(&self) -> f64 {
        let total = self.successes + self.failures;
        if total == 0 {
            0.0
        } else {
            self.failures as f64 / total as f64
        }
    }

    fn score(&self) -> f64 {
        let Some(avg_rssi) = self.avg_rssi() else {
            // A silent peer with no RSSI samples yet always scores 100.
            return 100.0;
        };
        (100.0 + ALPHA * (avg_rssi + 60.0) + BETA * self.success_ratio()).clamp(0.0, 100.0)
    }
}

/// Tracks rolling RSSI and success/failure counters per peer.
#[derive(Debug, Default)]
pub struct ConnectionQualityMonitor {
    peers: HashMap<String, PeerStats>,
}

impl ConnectionQualityMonitor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_rssi(&mut self, peer_id: &str, rssi: i32) {
        let stats = self.peers.entry(peer_id.to_string()).or_default();
        stats.rssi_sum += rssi as i64;
        stats.rssi_samples += 1;
    }

    pub fn record_result(&mut self, peer_id: &str, success: bool) {
        let stats = self.peers.entry(peer_id.to_string()).or_default();
        if success {
            stats.successes += 1;
        } else {
            stats.failures += 1;
        }
    }

    /// Score in `[0, 100]`; unknown peers default to 100 (no evidence against them).
    pub fn score(&self, peer_id: &str) -> f64 {
        self.peers.get(peer_id).map(|s| s.score()).unwrap_or(100.0)
    }

    pub fn should_blacklist(&self, peer_id: &str) -> bool {
        match self.peers.get(peer_id) {
            Some(stats) => {
                let total = stats.successes + stats.failures;
                total >= BLACKLIST_MIN_SAMPLES && stats.fail_ratio() >= BLACKLIST_FAIL_RATIO
            }
            None => false,
        }
    }
}
