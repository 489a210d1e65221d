//! In-memory gossip peer table (§4.8).

use std::collections::HashMap;
use std::sync::Mutex;

use ec_proto::peer::GOSSIP_PEER_TTL_MS;
use ec_proto::PeerRecord;

/// The number of freshest peers exchanged in one gossip round.
pub const PEER_EXCHANGE_BATCH: usize = 50;

#[derive(Default)]
pub struct PeerTable {
    peers: Mutex<HashMap<String, PeerRecord>>,
}

impl PeerTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or update a peer record, keeping the newer `last_seen_ms` on conflict.
    pub fn upsert(&self, record: PeerRecord) {
        let mut peers = self.peers.lock().unwrap();
        match peers.get(&record.peer_id) {
            Some(existing) if existing.last_seen_ms >= record.last_seen_ms => {}
            _ => {
                peers.insert(record.peer_id.clone(), record);
            }
        }
    }

    pub fn get(&self, peer_id: &str) -> Option<PeerRecord> {
        self.peers.lock().unwrap().get(peer_id).cloned()
    }

    pub fn all(&self) -> Vec<PeerRecord> {
        self.peers.lock().unwrap().values().cloned().collect()
    }

    /// The `PEER_EXCHANGE_BATCH` most recently seen peers, freshest first.
    pub fn most_recent(&self, limit: usize) -> Vec<PeerRecord> {
        let mut all: Vec<PeerRecord> = self.all();
        all.sort_by(|a, b| b.last_seen_ms.cmp(&a.last_seen_ms));
        all.truncate(limit);
        all
    }

    /// Drop peers not seen within `GOSSIP_PEER_TTL_MS` of `now_ms`.
    pub fn evict_stale(&self, now_ms: u64) {
        let mut peers = self.peers.lock().unwrap();
        peers.retain(|_, record| !record.is_stale(now_ms, GOSSIP_PEER_TTL_MS));
    }

    pub fn len(&self) -> usize {
        self.peers.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
