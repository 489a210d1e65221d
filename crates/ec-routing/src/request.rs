//! Shared request/decision types for the routing waterfall (§4.9).

use ec_proto::ResourceClass;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RouteRequest {
    pub task_id: String,
    pub prompt: String,
    pub language: String,
    pub submitter_account_id: String,
    pub project_id: String,
    pub resource_class: ResourceClass,
    pub priority: u8,
    pub requested_model: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RouteKind {
    BluetoothLocal,
    LocalInference,
    Swarm,
    OfflineStub,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RouteDecision {
    pub route: RouteKind,
    pub output: String,
    pub credits_spent: Option<f64>,
    pub task_id: Option<String>,
}

/// A canned, deterministic response so the waterfall's floor step always
/// succeeds (§4.9 step 4, §7 "the offline stub is the floor").
pub fn offline_stub_answer(request: &RouteRequest) -> String {
    format!(
        "[offline] no peer, local, or swarm route is currently available for task {}; retry once connectivity returns",
        request.task_id
    )
}
