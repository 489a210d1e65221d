//! Cost-based BLE peer selection (§4.5).

use ec_proto::{BleCapability, DeviceType};

use crate::quality::ConnectionQualityMonitor;

/// Cost threshold: a peer at or above this cost is never selected (§4.5, §8 property 10).
pub const COST_THRESHOLD: f64 = 200.0;

/// `cost = model_preference_penalty + load_penalty + battery_penalty
///        + signal_penalty + reliability_penalty + quality_penalty` (§4.5).
pub fn compute_cost(cap: &BleCapability, connection_score: f64) -> f64 {
    let model_preference_penalty = (7.0 - cap.model_param_size).max(0.0) * 8.0;
    let load_penalty = cap.current_load as f64 * 20.0;
    let battery_penalty = if matches!(cap.device_type, DeviceType::Phone) {
        (100.0 - cap.battery_pct as f64) * 0.5
    } else {
        0.0
    };
    let signal_penalty = ((-cap.rssi as f64 - 30.0) * 0.5).clamp(0.0, 30.0);
    let reliability_penalty = cap.fail_ratio() * 60.0;
    let quality_penalty = (100.0 - connection_score) * 0.3;

    model_preference_penalty
        + load_penalty
        + battery_penalty
        + signal_penalty
        + reliability_penalty
        + quality_penalty
}

/// A peer ranked for selection, ascending by cost.
#[derive(Debug, Clone)]
pub struct RankedPeer {
    pub capability: BleCapability,
    pub cost: f64,
}

/// Filter, cost, and rank BLE peers for routing one task.
///
/// - Peers whose `mesh_token_hash` differs from `our_mesh_token_hash` (when
///   we have one configured) are excluded.
/// - Peers `quality.should_blacklist()` are excluded.
/// - Peers at or above [`COST_THRESHOLD`] are excluded.
/// - Remaining peers are sorted ascending by cost; ties break by earliest
///   `last_seen_ms` (stable sort preserves that when the input is already
///   ordered that way, but we sort explicitly to be order-independent).
/// - At most `top_k` peers are returned.
pub fn select_peers(
    peers: &[BleCapability],
    quality: &ConnectionQualityMonitor,
    our_mesh_token_hash: Option<&str>,
    top_k: usize,
) -> Vec<RankedPeer> {
    let mut ranked: Vec<RankedPeer> = peers
        .iter()
        .filter(|p| match (our_mesh_token_hash, &p.mesh_token_hash) {
            (Some(ours), Some(theirs)) => ours == theirs,
            (Some(_), None) => false,
            (None, _) => true,
        })
        .filter(|p| !quality.should_blacklist(&p.agent_id))
        .map(|p| {
            let cost = compute_cost(p, quality.score(&p.agent_id));
            RankedPeer {
                capability: p.clone(),
                cost,
            }
        })
        .filter(|rp| rp.cost < COST_THRESHOLD)
        .collect();

    ranked.sort_by(|a, b| {
        a.cost
            .partial_cmp(&b.cost)
            .unwrap()
            .then(a.capability.last_seen_ms.cmp(&b.capability.last_seen_ms))
    });
    ranked.truncate(top_k);
    ranked
}
