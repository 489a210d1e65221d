//! Peer records shared by the gossip overlay (§4.8) and, in spirit, the BLE
//! mesh (§3 "Peer record").

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PeerRole {
    Coordinator,
    Agent,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum NetworkMode {
    PublicMesh,
    EnterpriseOverlay,
}

/// A gossiped peer identity (§3 Peer record, §4.8).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PeerRecord {
    pub peer_id: String,
    pub public_key_pem: String,
    /// URL for gossip peers; opaque handle for BLE peers.
    pub address: String,
    pub role: PeerRole,
    pub network_mode: NetworkMode,
    /// Monotone, updated on receipt of any signed message from this peer.
    pub last_seen_ms: u64,
}

impl PeerRecord {
    pub fn is_stale(&self, now_ms: u64, ttl_ms: u64) -> bool {
        now_ms.saturating_sub(self.last_seen_ms) >= ttl_ms
    }
}

/// TTL for gossip peer eviction (§3).
pub const GOSSIP_PEER_TTL_MS: u64 = 120_000;
/// TTL for BLE peer eviction (§3, §4.4).
pub const BLE_PEER_TTL_MS: u64 = 60_000;
