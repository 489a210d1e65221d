//! Outbound gossip: bootstrap against a seed peer and periodic peer exchange
//! (§4.8, §7 bootstrap flow).

use std::sync::Arc;
use std::time::Duration;

use ec_proto::PeerRecord;
use reqwest::Client;

use crate::envelope::SignedEnvelope;
use crate::error::GossipError;
use crate::server::AppState;

/// Gossip broadcasts run on this cadence (§4.8).
pub const GOSSIP_INTERVAL: Duration = Duration::from_secs(30);
/// Stale peers are swept on this cadence (§4.8).
pub const EVICTION_INTERVAL: Duration = Duration::from_secs(60);

pub struct GossipClient {
    http: Client,
}

impl Default for GossipClient {
    fn default() -> Self {
        Self::new()
    }
}

impl GossipClient {
    pub fn new() -> Self {
        Self {
            http: Client::new(),
        }
    }

    /// Contact a seed peer's `/mesh/peers`, merge the result into our table,
    /// then register ourselves with that seed.
    pub async fn bootstrap(
        &self,
        seed_address: &str,
        self_record: PeerRecord,
        state: &Arc<AppState>,
        mesh_token: Option<&str>,
    ) -> Result<usize, GossipError> {
        let mut request = self.http.get(format!("{seed_address}/mesh/peers"));
        if let Some(token) = mesh_token {
            request = request.header("x-mesh-token", token);
        }
        let response = request.send().await?;
        let peers: Vec<PeerRecord> = response.json().await?;
        let count = peers.len();
        for peer in peers {
            state.peers.upsert(peer);
        }

        let mut register = self.http.post(format!("{seed_address}/mesh/register-peer"));
        if let Some(token) = mesh_token {
            register = register.header("x-mesh-token", token);
        }
        register.json(&self_record).send().await?;

        Ok(count)
    }

    /// Push our freshest peers to one known peer's `/mesh/ingest`.
    pub async fn broadcast_to(
        &self,
        peer_address: &str,
        peers: Vec<PeerRecord>,
        state: &Arc<AppState>,
        mesh_token: Option<&str>,
    ) -> Result<(), GossipError> {
        let envelope = SignedEnvelope::sign(peers, &state.identity);
        let mut request = self.http.post(format!("{peer_address}/mesh/ingest"));
        if let Some(token) = mesh_token {
            request = request.header("x-mesh-token", token);
        }
        request.json(&envelope).send().await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn intervals_match_spec() {
        assert_eq!(GOSSIP_INTERVAL, Duration::from_secs(30));
        assert_eq!(EVICTION_INTERVAL, Duration::from_secs(60));
    }
}
