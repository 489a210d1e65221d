//! BLE peer capability advertisement (§3 "BLE peer capability", §4.4).

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DeviceType {
    Phone,
    Laptop,
    Workstation,
}

/// Capability + health snapshot advertised by a BLE peer.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BleCapability {
    pub agent_id: String,
    pub model: String,
    /// Model parameter count, in billions (matches cost-formula units, §4.5).
    pub model_param_size: f64,
    pub memory_mb: u64,
    pub battery_pct: u8,
    pub current_load: u32,
    pub device_type: DeviceType,
    /// Last sampled RSSI, in dBm (negative).
    pub rssi: i32,
    pub task_success_count: u64,
    pub task_fail_count: u64,
    /// Optional partitioning tag; peers whose tag differs are not selected.
    pub mesh_token_hash: Option<String>,
    pub last_seen_ms: u64,
}

impl BleCapability {
    pub fn fail_ratio(&self) -> f64 {
        let total = self.task_success_count + self.task_fail_count;
        if total == 0 {
            0.0
        } else {
            self.task_fail_count as f64 / total as f64
        }
    }

    pub fn is_stale(&self, now_ms: u64, ttl_ms: u64) -> bool {
        now_ms.saturating_sub(self.last_seen_ms) >= ttl_ms
    }
}

/// Identity payload read once from the `peer_identity` characteristic (§4.4).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BleIdentity {
    pub agent_id: String,
    pub model: String,
    pub model_param_size: f64,
    pub mesh_token_hash: Option<String>,
}

/// Canonical EdgeCoder BLE GATT service UUID (Design Notes §9 open question —
/// this deployment fixes this single spelling).
pub const BLE_SERVICE_UUID: &str = "0000edc0-0000-1000-8000-00805f9b34fb";
