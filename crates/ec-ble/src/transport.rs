//! BLE transport abstraction (§4.4).
//!
//! Real GATT access goes through platform BLE stacks that this workspace
//! cannot link against in a test environment, so the transport is a closed
//! trait with two implementations: [`MockBleTransport`] drives an in-memory
//! peer set for tests and offline development, [`NullBleTransport`] is the
//! no-op used when a node has no BLE radio at all.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use ec_proto::BleCapability;

use crate::error::BleError;

/// GATT characteristic identifiers exposed by every EdgeCoder BLE peer.
pub mod characteristic {
    pub const PEER_IDENTITY: &str = "peer_identity";
    pub const CAPABILITIES: &str = "capabilities";
    pub const TASK_REQUEST: &str = "task_request";
    pub const TASK_RESPONSE: &str = "task_response";
}

/// Stale peers (no advertisement seen for this long) are evicted from the
/// discovery cache (§4.4).
pub const STALE_PEER_MS: u64 = 60_000;

/// What a peer hands back over the `task_response` characteristic: the
/// model output plus the `cpu_seconds` it reports having spent on the work,
/// which is what gets credited (§4.7 step 3) rather than our own wall-clock
/// round-trip time.
#[derive(Debug, Clone, PartialEq)]
pub struct BleTaskResponse {
    pub payload: Vec<u8>,
    pub cpu_seconds: f64,
}

#[async_trait]
pub trait BleTransport: Send + Sync {
    /// Begin advertising this node's own identity and capability characteristics.
    async fn advertise(&self, identity: &[u8], capabilities: &[u8]) -> Result<(), BleError>;

    /// Scan for nearby peers, returning their advertised capability payloads.
    /// Implementations cache the `peer_identity` characteristic after the
    /// first successful read so subsequent scans don't re-read it.
    async fn scan(&self) -> Result<Vec<BleCapability>, BleError>;

    /// Write a `task_request` payload to a peer's characteristic and await
    /// the `task_response` notification.
    async fn send_task(&self, peer_id: &str, payload: &[u8]) -> Result<BleTaskResponse, BleError>;

    /// Drop any cached discovery state for peers not seen in over
    /// [`STALE_PEER_MS`], given the current time.
    async fn evict_stale(&self, now_ms: u64);
}

/// In-memory transport for tests and offline development: peers and their
/// scripted responses are registered up front, `send_task` looks up a
/// canned response (or fails) instead of touching real hardware.
#[derive(Default)]
pub struct MockBleTransport {
    peers: Mutex<HashMap<String, BleCapability>>,
    responses: Mutex<HashMap<String, Result<BleTaskResponse, BleError>>>,
}

impl MockBleTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_peer(&self, cap: BleCapability) {
        self.peers
            .lock()
            .unwrap()
            .insert(cap.agent_id.clone(), cap);
    }

    /// Scripts a peer's response to the next `send_task` call, including the
    /// `cpu_seconds` it claims to have spent on the work.
    pub fn script_response(&self, peer_id: &str, response: Result<BleTaskResponse, BleError>) {
        self.responses
            .lock()
            .unwrap()
            .insert(peer_id.to_string(), response);
    }
}

#[async_trait]
impl BleTransport for MockBleTransport {
    async fn advertise(&self, _identity: &[u8], _capabilities: &[u8]) -> Result<(), BleError> {
        Ok(())
    }

    async fn scan(&self) -> Result<Vec<BleCapability>, BleError> {
        Ok(self.peers.lock().unwrap().values().cloned().collect())
    }

    async fn send_task(&self, peer_id: &str, _payload: &[u8]) -> Result<BleTaskResponse, BleError> {
        let mut responses = self.responses.lock().unwrap();
        match responses.remove(peer_id) {
            Some(result) => result,
            None => Err(BleError::PeerNotFound(peer_id.to_string())),
        }
    }

    async fn evict_stale(&self, now_ms: u64) {
        let mut peers = self.peers.lock().unwrap();
        peers.retain(|_, cap| now_ms.saturating_sub(cap.last_seen_ms) < STALE_PEER_MS);
    }
}

/// No-op transport for nodes without a BLE radio: always reports no peers
/// and rejects every send as unreachable.
#[derive(Default)]
pub struct NullBleTransport;

impl NullBleTransport {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl BleTransport for NullBleTransport {
    async fn advertise(&self, _identity: &[u8], _capabilities: &[u8]) -> Result<(), BleError> {
        Ok(())
    }

    async fn scan(&self) -> Result<Vec<BleCapability>, BleError> {
        Ok(Vec::new())
    }

    async fn send_task(&self, peer_id: &str, _payload: &[u8]) -> Result<BleTaskResponse, BleError> {
        Err(BleError::PeerNotFound(peer_id.to_string()))
    }

    async fn evict_stale(&self, _now_ms: u64) {}
}
