//! Binds the swarm coordinator's subtask execution to a local model
//! provider and the credit engine, so a coordinator node also acts as the
//! sole worker for whatever it enqueues (§4.9 step 3, §4.11).

use std::sync::Arc;

use async_trait::async_trait;
use ec_credit::CreditEngine;
use ec_proto::credit::LoadSnapshot;
use ec_proto::{ContributionReport, ResourceClass, Subtask};
use ec_routing::model::ModelProvider;
use ec_routing::request::RouteRequest;
use ec_swarm::{SubtaskOutcome, SubtaskWorker};

pub struct LocalInferenceWorker {
    model: Arc<dyn ModelProvider>,
    credit: Arc<CreditEngine>,
    agent_id: String,
}

impl LocalInferenceWorker {
    pub fn new(model: Arc<dyn ModelProvider>, credit: Arc<CreditEngine>, agent_id: impl Into<String>) -> Self {
        Self {
            model,
            credit,
            agent_id: agent_id.into(),
        }
    }
}

#[async_trait]
impl SubtaskWorker for LocalInferenceWorker {
    async fn execute(&self, subtask: &Subtask) -> SubtaskOutcome {
        let request = RouteRequest {
            task_id: subtask.task_id.clone(),
            prompt: subtask.input.clone(),
            language: subtask.language.clone(),
            submitter_account_id: subtask.project_meta.project_id.clone(),
            project_id: subtask.project_meta.project_id.clone(),
            resource_class: subtask.project_meta.resource_class,
            priority: subtask.project_meta.priority,
            requested_model: None,
        };

        let started = std::time::Instant::now();
        let generated = self.model.generate(&request).await;
        let elapsed_seconds = started.elapsed().as_secs_f64();

        match generated {
            Ok(output) => {
                let report = ContributionReport {
                    report_id: uuid::Uuid::new_v4().to_string(),
                    agent_id: self.agent_id.clone(),
                    task_id: subtask.task_id.clone(),
                    resource_class: subtask.project_meta.resource_class,
                    cpu_seconds: if subtask.project_meta.resource_class == ResourceClass::Cpu {
                        elapsed_seconds
                    } else {
                        0.0
                    },
                    gpu_seconds: if subtask.project_meta.resource_class == ResourceClass::Gpu {
                        elapsed_seconds
                    } else {
                        0.0
                    },
                    success: true,
                    quality_score: 1.0,
                    timestamp_ms: 0,
                };
                let credits_spent = self
                    .credit
                    .record_report(&report, LoadSnapshot { queued_tasks: 0, active_agents: 1 })
                    .map(|tx| tx.credits)
                    .unwrap_or(0.0);
                SubtaskOutcome {
                    output,
                    ok: true,
                    credits_spent,
                }
            }
            Err(err) => SubtaskOutcome {
                output: err.to_string(),
                ok: false,
                credits_spent: 0.0,
            },
        }
    }
}
