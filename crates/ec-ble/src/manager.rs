//! BLE mesh manager (C7): glues the quality monitor, router, transport, and
//! offline ledger into one "route this task over BLE" operation (§4.7).

use std::sync::Arc;

use ec_proto::BleCapability;
use uuid::Uuid;

use crate::error::BleError;
use crate::ledger::{BleCreditTx, OfflineLedger};
use crate::quality::ConnectionQualityMonitor;
use crate::router::{select_peers, RankedPeer};
use crate::transport::BleTransport;

/// `model_quality_multiplier()` — the single canonical lookup from a peer's
/// declared model size to the credit multiplier paid for its work (§10).
pub fn model_quality_multiplier(model_param_size: f64) -> f64 {
    if model_param_size >= 7.0 {
        1.0
    } else if model_param_size >= 3.0 {
        0.7
    } else if model_param_size >= 1.5 {
        0.5
    } else {
        0.3
    }
}

fn base_rate(resource_class: &str) -> f64 {
    match resource_class {
        "gpu" => 4.0,
        _ => 1.0,
    }
}

/// Outcome of successfully routing one task to a BLE peer.
#[derive(Debug, Clone)]
pub struct BleTaskOutcome {
    pub peer_id: String,
    pub response: Vec<u8>,
    pub credited_amount: f64,
    pub tx_id: String,
}

pub struct BleMeshManager {
    transport: Arc<dyn BleTransport>,
    quality: ConnectionQualityMonitor,
    ledger: OfflineLedger,
    own_agent_id: String,
    own_mesh_token_hash: Option<String>,
}

impl BleMeshManager {
    pub fn new(
        transport: Arc<dyn BleTransport>,
        ledger: OfflineLedger,
        own_agent_id: impl Into<String>,
        own_mesh_token_hash: Option<String>,
    ) -> Self {
        Self {
            transport,
            quality: ConnectionQualityMonitor::new(),
            ledger,
            own_agent_id: own_agent_id.into(),
            own_mesh_token_hash,
        }
    }

    pub fn quality_monitor(&self) -> &ConnectionQualityMonitor {
        &self.quality
    }

    /// Re-scan for nearby peers and drop stale discovery state.
    pub async fn refresh_peers(&self, now_ms: u64) -> Result<Vec<BleCapability>, BleError> {
        self.transport.evict_stale(now_ms).await;
        self.transport.scan().await
    }

    /// Rank currently-known peers for a single task using the C5 cost formula.
    pub fn rank_peers(&self, peers: &[BleCapability], top_k: usize) -> Vec<RankedPeer> {
        select_peers(
            peers,
            &self.quality,
            self.own_mesh_token_hash.as_deref(),
            top_k,
        )
    }

    /// Route one task payload to the best-ranked reachable peer, trying the
    /// next-ranked candidate on failure. Returns `Ok(None)` only when every
    /// ranked candidate failed or there were none to try.
    pub async fn route_task(
        &mut self,
        payload: &[u8],
        resource_class: &str,
        peers: &[BleCapability],
        top_k: usize,
        now_ms: u64,
    ) -> Result<Option<BleTaskOutcome>, BleError> {
        let ranked = self.rank_peers(peers, top_k);
        for candidate in ranked {
            match self
                .transport
                .send_task(&candidate.capability.agent_id, payload)
                .await
            {
                Ok(response) => {
                    self.quality.record_rssi(
                        &candidate.capability.agent_id,
                        candidate.capability.rssi,
                    );
                    self.quality
                        .record_result(&candidate.capability.agent_id, true);

                    let multiplier = model_quality_multiplier(candidate.capability.model_param_size);
                    let credited_amount = response.cpu_seconds * base_rate(resource_class) * multiplier;

                    let tx = BleCreditTx {
                        tx_id: Uuid::new_v4().to_string(),
                        payer_agent_id: self.own_agent_id.clone(),
                        payee_agent_id: candidate.capability.agent_id.clone(),
                        amount: credited_amount,
                        resource_class: resource_class.to_string(),
                        recorded_at_ms: now_ms,
                        synced: false,
                    };
                    self.ledger.record(tx.clone())?;

                    return Ok(Some(BleTaskOutcome {
                        peer_id: candidate.capability.agent_id,
                        response: response.payload,
                        credited_amount,
                        tx_id: tx.tx_id,
                    }));
                }
                Err(_) => {
                    self.quality
                        .record_result(&candidate.capability.agent_id, false);
                    continue;
                }
            }
        }
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::MockBleTransport;
    use ec_proto::ble::DeviceType;

    fn cap(agent_id: &str, param_size: f64) -> BleCapability {
        BleCapability {
            agent_id: agent_id.to_string(),
            model: "llama".to_string(),
            model_param_size: param_size,
            memory_mb: 8192,
            battery_pct: 90,
            current_load: 0,
            device_type: DeviceType::Laptop,
            rssi: -40,
            task_success_count: 5,
            task_fail_count: 0,
            mesh_token_hash: None,
            last_seen_ms: 0,
        }
    }

    #[test]
    fn multiplier_tiers_match_table() {
        assert_eq!(model_quality_multiplier(7.0), 1.0);
        assert_eq!(model_quality_multiplier(13.0), 1.0);
        assert_eq!(model_quality_multiplier(3.0), 0.7);
        assert_eq!(model_quality_multiplier(1.5), 0.5);
        assert_eq!(model_quality_multiplier(0.5), 0.3);
    }

    #[tokio::test]
    async fn routes_to_best_peer_and_records_credit() {
        let transport = Arc::new(MockBleTransport::new());
        transport.register_peer(cap("p1", 7.0));
        transport.script_response(
            "p1",
            Ok(crate::transport::BleTaskResponse { payload: b"ok".to_vec(), cpu_seconds: 5.0 }),
        );

        let dir = tempfile::tempdir().unwrap();
        let ledger = OfflineLedger::open(dir.path().join("l.jsonl")).unwrap();
        let mut manager = BleMeshManager::new(transport.clone(), ledger, "me", None);

        let peers = manager.refresh_peers(0).await.unwrap();
        let outcome = manager
            .route_task(b"task", "cpu", &peers, 3, 0)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(outcome.peer_id, "p1");
        assert_eq!(outcome.response, b"ok");
        assert!((outcome.credited_amount - 5.0).abs() < 1e-9);
        assert!(manager.ledger.pending().iter().any(|t| t.tx_id == outcome.tx_id));
    }

    #[tokio::test]
    async fn falls_through_to_next_peer_on_failure() {
        let transport = Arc::new(MockBleTransport::new());
        let mut failing = cap("bad", 7.0);
        failing.last_seen_ms = 0;
        let mut good = cap("good", 7.0);
        good.last_seen_ms = 1;
        transport.register_peer(failing);
        transport.register_peer(good);
        transport.script_response(
            "bad",
            Err(crate::error::BleError::Timeout),
        );
        transport.script_response(
            "good",
            Ok(crate::transport::BleTaskResponse { payload: b"done".to_vec(), cpu_seconds: 1.0 }),
        );

        let dir = tempfile::tempdir().unwrap();
        let ledger = OfflineLedger::open(dir.path().join("l.jsonl")).unwrap();
        let mut manager = BleMeshManager::new(transport.clone(), ledger, "me", None);
        let peers = manager.refresh_peers(0).await.unwrap();
        let outcome = manager
            .route_task(b"task", "cpu", &peers, 3, 0)
            .await
            .unwrap();
        assert!(outcome.is_some());
    }

    #[tokio::test]
    async fn returns_none_when_no_peers() {
        let transport = Arc::new(MockBleTransport::new());
        let dir = tempfile::tempdir().unwrap();
        let ledger = OfflineLedger::open(dir.path().join("l.jsonl")).unwrap();
        let mut manager = BleMeshManager::new(transport.clone(), ledger, "me", None);
        let peers = manager.refresh_peers(0).await.unwrap();
        let outcome = manager.route_task(b"task", "cpu", &peers, 3, 0).await.unwrap();
        assert!(outcome.is_none());
    }
}
