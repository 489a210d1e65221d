//! Swarm coordinator HTTP client (§4.9 step 3, §6 "Swarm coordinator HTTP").

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::RoutingError;
use crate::request::RouteRequest;

#[derive(Debug, Serialize)]
struct SubtaskDescriptor {
    prompt: String,
    language: String,
}

#[derive(Debug, Serialize)]
struct SubmitTaskRequest {
    task_id: String,
    prompt: String,
    language: String,
    submitter_account_id: String,
    project_id: String,
    resource_class: ec_proto::ResourceClass,
    priority: u8,
    requested_model: Option<String>,
    subtasks: Vec<SubtaskDescriptor>,
}

#[derive(Debug, Deserialize)]
struct SubmitTaskResponse {
    task_id: String,
    subtasks: Vec<u64>,
}

#[derive(Debug, Deserialize)]
struct SubtaskResultResponse {
    output: String,
    #[allow(dead_code)]
    ok: bool,
    credits_spent: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SwarmOutcome {
    pub task_id: String,
    pub output: String,
    pub credits_spent: f64,
}

pub struct SwarmCoordinatorClient {
    http: reqwest::Client,
    coordinator_url: String,
    mesh_auth_token: String,
    poll_interval: Duration,
    poll_deadline: Duration,
}

impl SwarmCoordinatorClient {
    pub fn new(
        coordinator_url: impl Into<String>,
        mesh_auth_token: impl Into<String>,
        poll_interval: Duration,
        poll_deadline: Duration,
    ) -> Self {
        Self {
            http: reqwest::Client::new(),
            coordinator_url: coordinator_url.into(),
            mesh_auth_token: mesh_auth_token.into(),
            poll_interval,
            poll_deadline,
        }
    }

    /// Submit the task, then poll its single subtask's result endpoint
    /// every `poll_interval` up to `poll_deadline` (§4.9 step 3, §5).
    pub async fn submit_and_await(
        &self,
        request: &RouteRequest,
    ) -> Result<SwarmOutcome, RoutingError> {
        let submit_body = SubmitTaskRequest {
            task_id: request.task_id.clone(),
            prompt: request.prompt.clone(),
            language: request.language.clone(),
            submitter_account_id: request.submitter_account_id.clone(),
            project_id: request.project_id.clone(),
            resource_class: request.resource_class,
            priority: request.priority,
            requested_model: request.requested_model.clone(),
            subtasks: vec![SubtaskDescriptor {
                prompt: request.prompt.clone(),
                language: request.language.clone(),
            }],
        };

        let response = self
            .http
            .post(format!("{}/tasks", self.coordinator_url))
            .header("x-mesh-token", &self.mesh_auth_token)
            .json(&submit_body)
            .send()
            .await
            .map_err(|e| RoutingError::SwarmUnavailable(e.to_string()))?;

        if !response.status().is_success() {
            return Err(RoutingError::SwarmUnavailable(format!(
                "/tasks returned {}",
                response.status()
            )));
        }

        let submitted: SubmitTaskResponse = response
            .json()
            .await
            .map_err(|e| RoutingError::SwarmUnavailable(e.to_string()))?;
        let subtask_id = submitted
            .subtasks
            .first()
            .copied()
            .ok_or_else(|| RoutingError::SwarmUnavailable("no subtask id returned".to_string()))?;

        let deadline = tokio::time::Instant::now() + self.poll_deadline;
        loop {
            let response = self
                .http
                .get(format!(
                    "{}/tasks/{}/subtasks/{}/result",
                    self.coordinator_url, submitted.task_id, subtask_id
                ))
                .header("x-mesh-token", &self.mesh_auth_token)
                .send()
                .await
                .map_err(|e| RoutingError::SwarmUnavailable(e.to_string()))?;

            if response.status() == reqwest::StatusCode::OK {
                let result: SubtaskResultResponse = response
                    .json()
                    .await
                    .map_err(|e| RoutingError::SwarmUnavailable(e.to_string()))?;
                return Ok(SwarmOutcome {
                    task_id: submitted.task_id,
                    output: result.output,
                    credits_spent: result.credits_spent,
                });
            }

            if tokio::time::Instant::now() >= deadline {
                return Err(RoutingError::Timeout);
            }
            tokio::time::sleep(self.poll_interval).await;
        }
    }
}
