//! Streaming variant of the routing waterfall (§4.9): determines the route
//! with the same predicates as [`crate::engine::RoutingEngine::route`], then
//! either streams raw token deltas (local inference) or synthesizes a
//! single-chunk stream from the corresponding non-streaming path.

use std::sync::Arc;
use std::time::Instant;

use tokio::sync::{mpsc, Mutex};

use crate::engine::RoutingEngine;
use crate::request::{offline_stub_answer, RouteKind, RouteRequest};

/// One emitted piece of a streaming response.
#[derive(Debug, Clone)]
pub struct StreamChunk {
    pub text: String,
    pub is_final: bool,
}

/// A point-in-time snapshot of an in-flight stream, for progress display.
#[derive(Debug, Clone)]
pub struct StreamProgress {
    pub tokens: u32,
    pub elapsed_ms: u64,
    pub route: RouteKind,
    pub label: String,
    pub model: Option<String>,
    pub credits_spent: Option<f64>,
}

impl StreamProgress {
    fn new(route: RouteKind, label: String, model: Option<String>) -> Self {
        Self {
            tokens: 0,
            elapsed_ms: 0,
            route,
            label,
            model,
            credits_spent: None,
        }
    }
}

pub struct StreamHandle {
    progress: Arc<Mutex<StreamProgress>>,
}

impl StreamHandle {
    pub async fn get_progress(&self) -> StreamProgress {
        self.progress.lock().await.clone()
    }
}

fn route_label(route: RouteKind) -> &'static str {
    match route {
        RouteKind::BluetoothLocal => "bluetooth-local",
        RouteKind::LocalInference => "local-inference",
        RouteKind::Swarm => "swarm",
        RouteKind::OfflineStub => "offline-stub",
    }
}

/// Stream a response for `request`, returning a channel of [`StreamChunk`]s
/// and a progress handle the caller can poll concurrently.
pub async fn route_stream(
    engine: &RoutingEngine,
    request: RouteRequest,
) -> (mpsc::Receiver<StreamChunk>, StreamHandle) {
    let (tx, rx) = mpsc::channel(32);

    let started = Instant::now();
    let decision = engine.route(&request).await;
    let label = route_label(decision.route).to_string();
    let progress = Arc::new(Mutex::new(StreamProgress::new(
        decision.route,
        label,
        request.requested_model.clone(),
    )));
    let handle = StreamHandle {
        progress: progress.clone(),
    };

    tokio::spawn(async move {
        let deltas: Vec<String> = if decision.route == RouteKind::LocalInference {
            // The engine already ran generate() to produce decision.output;
            // re-split it the same way the default generate_stream() would,
            // since the waterfall has no way to hand back a live token
            // stream once routing has already committed to an outcome.
            decision
                .output
                .split_inclusive(' ')
                .map(|s| s.to_string())
                .collect()
        } else if decision.route == RouteKind::OfflineStub {
            vec![offline_stub_answer(&request)]
        } else {
            vec![decision.output.clone()]
        };

        for delta in &deltas {
            {
                let mut p = progress.lock().await;
                p.tokens += 1;
                p.elapsed_ms = started.elapsed().as_millis() as u64;
            }
            if tx
                .send(StreamChunk {
                    text: delta.clone(),
                    is_final: false,
                })
                .await
                .is_err()
            {
                return;
            }
        }

        {
            let mut p = progress.lock().await;
            p.elapsed_ms = started.elapsed().as_millis() as u64;
            p.credits_spent = decision.credits_spent;
        }
        let _ = tx
            .send(StreamChunk {
                text: String::new(),
                is_final: true,
            })
            .await;
    });

    (rx, handle)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bluetooth::NullBluetoothProxy;
    use crate::model::ModelProvider;
    use async_trait::async_trait;
    use ec_proto::ResourceClass;

    struct WordyProvider;
    #[async_trait]
    impl ModelProvider for WordyProvider {
        async fn health(&self) -> bool {
            true
        }
        async fn generate(
            &self,
            _request: &RouteRequest,
        ) -> Result<String, crate::error::RoutingError> {
            Ok("alpha beta gamma".to_string())
        }
    }

    fn request() -> RouteRequest {
        RouteRequest {
            task_id: "t1".to_string(),
            prompt: "hi".to_string(),
            language: "en".to_string(),
            submitter_account_id: "acct".to_string(),
            project_id: "proj".to_string(),
            resource_class: ResourceClass::Cpu,
            priority: 50,
            requested_model: None,
        }
    }

    #[tokio::test]
    async fn local_inference_streams_word_chunks_and_marks_final() {
        let engine = RoutingEngine::new(
            Arc::new(NullBluetoothProxy),
            Arc::new(WordyProvider),
            None,
            4,
            8_000,
        );
        let (mut rx, handle) = route_stream(&engine, request()).await;

        let mut collected = String::new();
        let mut saw_final = false;
        while let Some(chunk) = rx.recv().await {
            if chunk.is_final {
                saw_final = true;
                break;
            }
            collected.push_str(&chunk.text);
        }

        assert!(saw_final);
        assert_eq!(collected, "alpha beta gamma");
        let progress = handle.get_progress().await;
        assert_eq!(progress.route, RouteKind::LocalInference);
        assert_eq!(progress.tokens, 3);
    }

    #[tokio::test]
    async fn offline_stub_streams_a_single_chunk() {
        let engine = RoutingEngine::new(
            Arc::new(NullBluetoothProxy),
            Arc::new(crate::model::StubModelProvider),
            None,
            4,
            8_000,
        );
        let (mut rx, handle) = route_stream(&engine, request()).await;

        let mut chunks = Vec::new();
        while let Some(chunk) = rx.recv().await {
            if chunk.is_final {
                break;
            }
            chunks.push(chunk.text);
        }

        assert_eq!(chunks.len(), 1);
        let progress = handle.get_progress().await;
        assert_eq!(progress.route, RouteKind::OfflineStub);
    }
}
