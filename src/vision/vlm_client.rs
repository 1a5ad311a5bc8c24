// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Vision-language model client for an OpenAI-compatible chat completions API

use reqwest::{Client, StatusCode};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, warn};

use super::prompts;
use crate::config::LlmConfig;

/// Backend messages that mean the model could not load the image
const IMAGE_ACCESS_MARKERS: [&str; 3] = [
    "Could not retrieve image",
    "Failed to download image",
    "invalid_image_url",
];

#[derive(Debug, Error)]
pub enum VlmError {
    #[error("OpenAI API key not configured.")]
    NotConfigured,

    #[error("The model failed to access the image at {image}")]
    ImageInaccessible { image: String },

    #[error("The API rejected the request: {0}")]
    BadRequest(String),

    #[error("The API returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Timed out waiting for the model after {0:?}")]
    Timeout(Duration),

    #[error("Request to the model failed: {0}")]
    Transport(String),

    #[error("Unreadable chat completion envelope: {0}")]
    InvalidEnvelope(String),

    #[error("The model returned no content")]
    EmptyResponse,
}

// --- OpenAI-compatible serde structs ---

#[derive(serde::Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<ResponseFormat>,
}

#[derive(serde::Serialize)]
struct ChatMessage {
    role: String,
    content: serde_json::Value,
}

#[derive(serde::Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(serde::Deserialize)]
struct ChatUsage {
    total_tokens: u32,
}

#[derive(serde::Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
    usage: Option<ChatUsage>,
}

#[derive(serde::Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(serde::Deserialize)]
struct ChatResponseMessage {
    content: Option<String>,
}

#[derive(serde::Deserialize)]
struct ApiErrorEnvelope {
    error: ApiErrorBody,
}

#[derive(serde::Deserialize)]
struct ApiErrorBody {
    message: String,
}

/// Client for the hosted multimodal model
pub struct VlmClient {
    client: Client,
    endpoint: String,
    api_key: String,
    model_name: String,
    timeout: Duration,
}

impl VlmClient {
    /// Create a client; fails with `NotConfigured` when no API key is set
    pub fn new(config: &LlmConfig) -> Result<Self, VlmError> {
        let api_key = config.api_key.clone().ok_or(VlmError::NotConfigured)?;

        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| VlmError::Transport(e.to_string()))?;

        let endpoint = config.api_base.trim_end_matches('/').to_string();
        info!(
            "VLM client configured: endpoint={}, model={}",
            endpoint, config.model
        );

        Ok(Self {
            client,
            endpoint,
            api_key,
            model_name: config.model.clone(),
            timeout: config.timeout,
        })
    }

    pub fn model_name(&self) -> &str {
        &self.model_name
    }

    /// Free-text description of the diagram at `image_url`
    pub async fn describe(&self, image_url: &str) -> Result<String, VlmError> {
        self.complete(
            prompts::DESCRIBE_SYSTEM,
            prompts::DESCRIBE_USER,
            image_url,
            false,
        )
        .await
    }

    /// Raw JSON text listing `{id, label}` nodes
    pub async fn extract_nodes(&self, image_url: &str) -> Result<String, VlmError> {
        self.complete(prompts::NODES_SYSTEM, prompts::NODES_USER, image_url, true)
            .await
    }

    /// Raw JSON text listing `{id, source, target}` edges
    pub async fn extract_edges(
        &self,
        image_url: &str,
        reference_context: &str,
    ) -> Result<String, VlmError> {
        let user = prompts::edges_user(reference_context);
        self.complete(prompts::EDGES_SYSTEM, &user, image_url, true)
            .await
    }

    /// Raw JSON text holding both `nodes` and `edges`
    pub async fn extract_graph(&self, image_url: &str) -> Result<String, VlmError> {
        self.complete(prompts::GRAPH_SYSTEM, prompts::GRAPH_USER, image_url, true)
            .await
    }

    async fn complete(
        &self,
        system: &str,
        user_text: &str,
        image_url: &str,
        json_output: bool,
    ) -> Result<String, VlmError> {
        let start = std::time::Instant::now();

        let request = ChatRequest {
            model: self.model_name.clone(),
            messages: vec![
                ChatMessage {
                    role: "system".to_string(),
                    content: serde_json::Value::String(system.to_string()),
                },
                ChatMessage {
                    role: "user".to_string(),
                    content: serde_json::json!([
                        {"type": "text", "text": user_text},
                        {"type": "image_url", "image_url": {"url": image_url}}
                    ]),
                },
            ],
            response_format: json_output.then_some(ResponseFormat {
                kind: "json_object",
            }),
        };

        let response = self
            .client
            .post(format!("{}/chat/completions", self.endpoint))
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| self.classify_transport(e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(classify_status(status, body, image_url));
        }

        let chat_response: ChatResponse = response
            .json()
            .await
            .map_err(|e| self.classify_transport(e))?;

        let content = chat_response
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or(VlmError::EmptyResponse)?;

        debug!(
            "VLM completion: {} chars in {}ms ({} tokens)",
            content.len(),
            start.elapsed().as_millis(),
            chat_response.usage.map(|u| u.total_tokens).unwrap_or(0)
        );

        Ok(content)
    }

    fn classify_transport(&self, e: reqwest::Error) -> VlmError {
        if e.is_timeout() {
            VlmError::Timeout(self.timeout)
        } else if e.is_decode() {
            VlmError::InvalidEnvelope(e.to_string())
        } else {
            VlmError::Transport(e.to_string())
        }
    }
}

/// Map a non-success status to a typed error
///
/// A 400 is the backend refusing this particular request, which for
/// vision calls is almost always an image it could not load.
fn classify_status(status: StatusCode, body: String, image_url: &str) -> VlmError {
    if status != StatusCode::BAD_REQUEST {
        warn!("VLM backend returned {}: {}", status, body);
        return VlmError::Status {
            status: status.as_u16(),
            body,
        };
    }

    if IMAGE_ACCESS_MARKERS.iter().any(|m| body.contains(m)) {
        let image = if image_url.starts_with("data:") {
            "uploaded image".to_string()
        } else {
            image_url.to_string()
        };
        return VlmError::ImageInaccessible { image };
    }

    let detail = serde_json::from_str::<ApiErrorEnvelope>(&body)
        .map(|env| env.error.message)
        .unwrap_or(body);
    VlmError::BadRequest(detail)
}
