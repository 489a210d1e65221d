//! The routing waterfall (§4.9): bluetooth-local, then local inference,
//! then swarm, then the offline stub. Never errors to the caller (§7).

use std::sync::Arc;
use std::sync::Mutex;
use std::time::Instant;

use ec_latency::LatencyTracker;

use crate::bluetooth::BluetoothLocalProxy;
use crate::model::ModelProvider;
use crate::request::{offline_stub_answer, RouteDecision, RouteKind, RouteRequest};
use crate::swarm_client::SwarmCoordinatorClient;

pub struct RoutingEngine {
    bluetooth_proxy: Arc<dyn BluetoothLocalProxy>,
    model_provider: Arc<dyn ModelProvider>,
    swarm_client: Option<SwarmCoordinatorClient>,
    latency: Mutex<LatencyTracker>,
    active_concurrent: Mutex<u32>,
    concurrency_cap: u32,
    latency_threshold_ms: f64,
}

impl RoutingEngine {
    pub fn new(
        bluetooth_proxy: Arc<dyn BluetoothLocalProxy>,
        model_provider: Arc<dyn ModelProvider>,
        swarm_client: Option<SwarmCoordinatorClient>,
        concurrency_cap: u32,
        latency_threshold_ms: u64,
    ) -> Self {
        Self {
            bluetooth_proxy,
            model_provider,
            swarm_client,
            latency: Mutex::new(LatencyTracker::new()),
            active_concurrent: Mutex::new(0),
            concurrency_cap,
            latency_threshold_ms: latency_threshold_ms as f64,
        }
    }

    fn concurrency_available(&self) -> bool {
        *self.active_concurrent.lock().unwrap() < self.concurrency_cap
    }

    fn latency_within_budget(&self) -> bool {
        self.latency.lock().unwrap().p95_estimate() <= self.latency_threshold_ms
    }

    pub fn latency_tracker_p95(&self) -> f64 {
        self.latency.lock().unwrap().p95_estimate()
    }

    /// Run the four-step waterfall once for `request`.
    pub async fn route(&self, request: &RouteRequest) -> RouteDecision {
        if let Some(decision) = self.try_bluetooth_local(request).await {
            return decision;
        }
        if let Some(decision) = self.try_local_inference(request).await {
            return decision;
        }
        if let Some(decision) = self.try_swarm(request).await {
            return decision;
        }

        RouteDecision {
            route: RouteKind::OfflineStub,
            output: offline_stub_answer(request),
            credits_spent: None,
            task_id: None,
        }
    }

    async fn try_bluetooth_local(&self, request: &RouteRequest) -> Option<RouteDecision> {
        let status = self.bluetooth_proxy.status().await;
        if !status.is_active() {
            return None;
        }
        let output = self.bluetooth_proxy.forward(request).await.ok()?;
        Some(RouteDecision {
            route: RouteKind::BluetoothLocal,
            output,
            credits_spent: None,
            task_id: None,
        })
    }

    async fn try_local_inference(&self, request: &RouteRequest) -> Option<RouteDecision> {
        if !self.concurrency_available() || !self.latency_within_budget() {
            return None;
        }
        if !self.model_provider.health().await {
            return None;
        }

        *self.active_concurrent.lock().unwrap() += 1;
        let started = Instant::now();
        let result = self.model_provider.generate(request).await;
        let elapsed_ms = started.elapsed().as_millis() as f64;
        self.latency.lock().unwrap().record(elapsed_ms);
        *self.active_concurrent.lock().unwrap() -= 1;

        let output = result.ok()?;
        Some(RouteDecision {
            route: RouteKind::LocalInference,
            output,
            credits_spent: Some(0.0),
            task_id: None,
        })
    }

    async fn try_swarm(&self, request: &RouteRequest) -> Option<RouteDecision> {
        let client = self.swarm_client.as_ref()?;
        let outcome = client.submit_and_await(request).await.ok()?;
        Some(RouteDecision {
            route: RouteKind::Swarm,
            output: outcome.output,
            credits_spent: Some(outcome.credits_spent),
            task_id: Some(outcome.task_id),
        })
    }
}
