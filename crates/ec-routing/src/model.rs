//! Local inference backend (§4.9 step 2, §6 "Inference backend").
//!
//! The on-device runtime itself is a black-box external collaborator
//! (out of scope, §1); this is the narrow interface the routing engine
//! drives it through, closed over two implementations (§9): a stub used
//! when no runtime is configured, and an HTTP client against a real one.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::RoutingError;
use crate::request::RouteRequest;

#[async_trait]
pub trait ModelProvider: Send + Sync {
    /// `GET /api/tags` health probe: any 2xx means healthy.
    async fn health(&self) -> bool;

    /// `POST /api/chat` with `stream=false`, returning `message.content`.
    async fn generate(&self, request: &RouteRequest) -> Result<String, RoutingError>;

    /// Newline-delimited token deltas from `POST /api/chat` with
    /// `stream=true`. The default synthesizes deltas by word-splitting the
    /// non-streaming response, for providers with no native streaming mode.
    async fn generate_stream(&self, request: &RouteRequest) -> Result<Vec<String>, RoutingError> {
        let full = self.generate(request).await?;
        Ok(full
            .split_inclusive(' ')
            .map(|word| word.to_string())
            .collect())
    }
}

/// Always-unhealthy provider: used when no local runtime is configured, so
/// the waterfall falls through to swarm/offline without attempting step 2.
#[derive(Default)]
pub struct StubModelProvider;

#[async_trait]
impl ModelProvider for StubModelProvider {
    async fn health(&self) -> bool {
        false
    }

    async fn generate(&self, _request: &RouteRequest) -> Result<String, RoutingError> {
        Err(RoutingError::InferenceUnavailable(
            "no local model provider configured".to_string(),
        ))
    }
}

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: &'static str,
    content: String,
}

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    stream: bool,
}

#[derive(Debug, Deserialize)]
struct ChatResponseMessage {
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    message: ChatResponseMessage,
}

pub struct HttpModelProvider {
    http: reqwest::Client,
    base_url: String,
    default_model: String,
}

impl HttpModelProvider {
    pub fn new(base_url: impl Into<String>, default_model: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into(),
            default_model: default_model.into(),
        }
    }
}

#[async_trait]
impl ModelProvider for HttpModelProvider {
    async fn health(&self) -> bool {
        self.http
            .get(format!("{}/api/tags", self.base_url))
            .send()
            .await
            .map(|r| r.status().is_success())
            .unwrap_or(false)
    }

    async fn generate(&self, request: &RouteRequest) -> Result<String, RoutingError> {
        let body = ChatRequest {
            model: request
                .requested_model
                .clone()
                .unwrap_or_else(|| self.default_model.clone()),
            messages: vec![ChatMessage {
                role: "user",
                content: request.prompt.clone(),
            }],
            stream: false,
        };
        let response = self
            .http
            .post(format!("{}/api/chat", self.base_url))
            .json(&body)
            .send()
            .await
            .map_err(|e| RoutingError::InferenceUnavailable(e.to_string()))?;

        if !response.status().is_success() {
            return Err(RoutingError::InferenceUnavailable(format!(
                "chat endpoint returned {}",
                response.status()
            )));
        }

        let parsed: ChatResponse = response
            .json()
            .await
            .map_err(|e| RoutingError::InferenceUnavailable(e.to_string()))?;
        Ok(parsed.message.content)
    }

    /// `stream=true` returns newline-delimited JSON token deltas (§6).
    async fn generate_stream(&self, request: &RouteRequest) -> Result<Vec<String>, RoutingError> {
        use futures::StreamExt;

        let body = ChatRequest {
            model: request
                .requested_model
                .clone()
                .unwrap_or_else(|| self.default_model.clone()),
            messages: vec![ChatMessage {
                role: "user",
                content: request.prompt.clone(),
            }],
            stream: true,
        };
        let response = self
            .http
            .post(format!("{}/api/chat", self.base_url))
            .json(&body)
            .send()
            .await
            .map_err(|e| RoutingError::InferenceUnavailable(e.to_string()))?;

        if !response.status().is_success() {
            return Err(RoutingError::InferenceUnavailable(format!(
                "chat endpoint returned {}",
                response.status()
            )));
        }

        let mut buffer = String::new();
        let mut deltas = Vec::new();
        let mut bytes_stream = response.bytes_stream();
        while let Some(chunk) = bytes_stream.next().await {
            let chunk = chunk.map_err(|e| RoutingError::InferenceUnavailable(e.to_string()))?;
            buffer.push_str(&String::from_utf8_lossy(&chunk));
            while let Some(newline_pos) = buffer.find('\n') {
                let line = buffer[..newline_pos].trim().to_string();
                buffer.drain(..=newline_pos);
                if line.is_empty() {
                    continue;
                }
                if let Ok(parsed) = serde_json::from_str::<ChatResponse>(&line) {
                    deltas.push(parsed.message.content);
                }
            }
        }
        Ok(deltas)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn stub_provider_is_never_healthy() {
        let provider = StubModelProvider;
        assert!(!provider.health().await);
    }

    struct WordyProvider;
    #[async_trait]
    impl ModelProvider for WordyProvider {
        async fn health(&self) -> bool {
            true
        }
        async fn generate(&self, _request: &RouteRequest) -> Result<String, RoutingError> {
            Ok("one two three".to_string())
        }
    }

    #[tokio::test]
    async fn default_generate_stream_splits_on_spaces() {
        let provider = WordyProvider;
        let request = RouteRequest {
            task_id: "t".to_string(),
            prompt: "p".to_string(),
            language: "en".to_string(),
            submitter_account_id: "a".to_string(),
            project_id: "proj".to_string(),
            resource_class: ec_proto::ResourceClass::Cpu,
            priority: 0,
            requested_model: None,
        };
        let deltas = provider.generate_stream(&request).await.unwrap();
        assert_eq!(deltas.concat(), "one two three");
        assert_eq!(deltas.len(), 3);
    }
}
