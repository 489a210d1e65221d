//! Swarm coordinator HTTP surface (§6 "Swarm coordinator HTTP", consumed by
//! `ec-routing`'s `SwarmCoordinatorClient`): `POST /tasks` enqueues a task's
//! subtasks and hands them to an injected [`SubtaskWorker`]; `GET
//! /tasks/{task_id}/subtasks/{subtask_id}/result` polls for the outcome.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::routing::{get, post};
use axum::{Json, Router};
use ec_proto::{ProjectMeta, Subtask};
use serde::{Deserialize, Serialize};
use subtle::ConstantTimeEq;

use crate::SwarmQueue;

/// Runs one subtask to completion. Implemented at the binary level so this
/// crate never has to know about model providers or the credit engine —
/// mirrors the `BleTransport`/`AnchorProvider` closed-trait-plus-injection
/// pattern used elsewhere in this mesh.
#[async_trait]
pub trait SubtaskWorker: Send + Sync {
    async fn execute(&self, subtask: &Subtask) -> SubtaskOutcome;
}

#[derive(Debug, Clone)]
pub struct SubtaskOutcome {
    pub output: String,
    pub ok: bool,
    pub credits_spent: f64,
}

/// Always succeeds with an empty echo and charges nothing; used when a node
/// runs the coordinator surface without a real worker attached.
#[derive(Default)]
pub struct NullSubtaskWorker;

#[async_trait]
impl SubtaskWorker for NullSubtaskWorker {
    async fn execute(&self, subtask: &Subtask) -> SubtaskOutcome {
        SubtaskOutcome {
            output: subtask.input.clone(),
            ok: true,
            credits_spent: 0.0,
        }
    }
}

#[derive(Debug, Deserialize)]
struct SubtaskDescriptor {
    prompt: String,
    language: String,
}

#[derive(Debug, Deserialize)]
pub struct SubmitTaskRequest {
    task_id: String,
    #[allow(dead_code)]
    submitter_account_id: String,
    project_id: String,
    resource_class: ec_proto::ResourceClass,
    priority: u8,
    subtasks: Vec<SubtaskDescriptor>,
}

#[derive(Debug, Serialize)]
struct SubmitTaskResponse {
    task_id: String,
    subtasks: Vec<u64>,
}

#[derive(Debug, Serialize, Deserialize)]
struct SubtaskResultView {
    output: String,
    ok: bool,
    credits_spent: f64,
}

pub struct SwarmServerState {
    queue: Arc<SwarmQueue>,
    worker: Arc<dyn SubtaskWorker>,
    mesh_token: Option<String>,
    /// `credits_spent` isn't part of `ec_proto::SubtaskResult`, so the
    /// server tracks it alongside the queue's own completion record.
    credits: Mutex<HashMap<u64, f64>>,
}

impl SwarmServerState {
    pub fn new(queue: Arc<SwarmQueue>, worker: Arc<dyn SubtaskWorker>, mesh_token: Option<String>) -> Self {
        Self {
            queue,
            worker,
            mesh_token,
            credits: Mutex::new(HashMap::new()),
        }
    }
}

fn token_authorized(state: &SwarmServerState, headers: &HeaderMap) -> bool {
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

/// Enqueues every descriptor as its own subtask, then spawns a task per
/// subtask that claims, runs, and completes it immediately — this node acts
/// as both coordinator and sole worker (§4.9 step 3, §4.10).
async fn submit_task(
    State(state): State<Arc<SwarmServerState>>,
    headers: HeaderMap,
    Json(request): Json<SubmitTaskRequest>,
) -> Result<Json<SubmitTaskResponse>, StatusCode> {
    if !token_authorized(&state, &headers) {
        return Err(StatusCode::UNAUTHORIZED);
    }

    let project_meta = ProjectMeta {
        project_id: request.project_id,
        resource_class: request.resource_class,
        priority: request.priority,
    };

    let mut subtask_ids = Vec::with_capacity(request.subtasks.len());
    for descriptor in request.subtasks {
        let id = state.queue.enqueue_subtask(
            request.task_id.clone(),
            "inference",
            descriptor.language,
            descriptor.prompt,
            90_000,
            None,
            project_meta.clone(),
            0,
        );
        subtask_ids.push(id);

        let task_state = state.clone();
        tokio::spawn(async move {
            let Some(subtask) = task_state.queue.claim("local-worker", 0) else {
                return;
            };
            let outcome = task_state.worker.execute(&subtask).await;
            let subtask_id = subtask.id;
            let task_id = subtask.task_id.clone();
            task_state
                .credits
                .lock()
                .unwrap()
                .insert(subtask_id, outcome.credits_spent);
            if task_state
                .queue
                .complete(ec_proto::SubtaskResult {
                    subtask_id,
                    task_id,
                    agent_id: "local-worker".to_string(),
                    ok: outcome.ok,
                    output: outcome.output,
                    error: None,
                    duration_ms: 0,
                })
                .is_err()
            {
                tracing::warn!(subtask_id, "subtask completed twice or already requeued");
            }
        });
    }

    Ok(Json(SubmitTaskResponse {
        task_id: request.task_id,
        subtasks: subtask_ids,
    }))
}

async fn subtask_result(
    State(state): State<Arc<SwarmServerState>>,
    headers: HeaderMap,
    Path((_task_id, subtask_id)): Path<(String, u64)>,
) -> Result<Json<SubtaskResultView>, StatusCode> {
    if !token_authorized(&state, &headers) {
        return Err(StatusCode::UNAUTHORIZED);
    }
    match state.queue.completed_result(subtask_id) {
        Some(result) => {
            let credits_spent = state
                .credits
                .lock()
                .unwrap()
                .get(&subtask_id)
                .copied()
                .unwrap_or(0.0);
            Ok(Json(SubtaskResultView {
                output: result.output,
                ok: result.ok,
                credits_spent,
            }))
        }
        None => Err(StatusCode::ACCEPTED),
    }
}

pub fn build_router(state: Arc<SwarmServerState>) -> Router {
    Router::new()
        .route("/tasks", post(submit_task))
        .route("/tasks/:task_id/subtasks/:subtask_id/result", get(subtask_result))
        .with_state(state)
}
