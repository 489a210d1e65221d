//! Gossip HTTP surface (§4.8): `GET /identity`, `GET /mesh/peers`,
//! `POST /mesh/register-peer`, `POST /mesh/ingest`.

use std::sync::Arc;

use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::routing::{get, post};
use axum::{Json, Router};
use ec_proto::identity::LocalIdentity;
use ec_proto::{NetworkMode, PeerRecord, PeerRole};
use serde::Serialize;
use subtle::ConstantTimeEq;

use crate::envelope::SignedEnvelope;
use crate::state::{PeerTable, PEER_EXCHANGE_BATCH};

pub struct AppState {
    pub identity: LocalIdentity,
    pub peers: PeerTable,
    pub mesh_token: Option<String>,
    pub self_peer_id: String,
    pub network_mode: NetworkMode,
}

#[derive(Debug, Serialize)]
pub struct IdentityResponse {
    pub peer_id: String,
    pub public_key_pem: String,
    pub role: PeerRole,
    pub network_mode: NetworkMode,
}

/// Constant-time comparison of the `x-mesh-token` header against the
/// configured token, so a timing side channel can't leak it byte-by-byte.
fn token_authorized(state: &AppState, headers: &HeaderMap) -> bool {
    let Some(expected) = &state.mesh_token else {
        return true;
    };
    let Some(provided) = headers.get("x-mesh-token").and_then(|v| v.to_str().ok()) else {
        return false;
    };
    let expected = expected.as_bytes();
    let provided = provided.as_bytes();
    expected.len() == provided.len() && bool::from(expected.ct_eq(provided))
}

async fn get_identity(State(state): State<Arc<AppState>>) -> Json<IdentityResponse> {
    Json(IdentityResponse {
        peer_id: state.self_peer_id.clone(),
        public_key_pem: state.identity.public_key_pem(),
        role: PeerRole::Agent,
        network_mode: state.network_mode,
    })
}

async fn get_peers(State(state): State<Arc<AppState>>) -> Json<Vec<PeerRecord>> {
    Json(state.peers.most_recent(PEER_EXCHANGE_BATCH))
}

async fn register_peer(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(record): Json<PeerRecord>,
) -> Result<StatusCode, StatusCode> {
    if !token_authorized(&state, &headers) {
        return Err(StatusCode::UNAUTHORIZED);
    }
    if record.peer_id != state.self_peer_id {
        state.peers.upsert(record);
    }
    Ok(StatusCode::OK)
}

async fn ingest(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(envelope): Json<SignedEnvelope<Vec<PeerRecord>>>,
) -> Result<StatusCode, StatusCode> {
    if !token_authorized(&state, &headers) {
        return Err(StatusCode::UNAUTHORIZED);
    }
    let peers = envelope.verify().map_err(|_| StatusCode::BAD_REQUEST)?;
    for peer in peers.clone() {
        if peer.peer_id != state.self_peer_id {
            state.peers.upsert(peer);
        }
    }
    Ok(StatusCode::OK)
}

pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/identity", get(get_identity))
        .route("/mesh/peers", get(get_peers))
        .route("/mesh/register-peer", post(register_peer))
        .route("/mesh/ingest", post(ingest))
        .with_state(state)
}
