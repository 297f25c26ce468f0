// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Claude vision client for product classification via the Messages API

use anyhow::Result;
use async_trait::async_trait;
use reqwest::Client;
use std::time::{Duration, Instant};
use tracing::{debug, error, info};

use super::classifier::{ClassificationError, VisionClassifier};
use super::image_utils::{encode_base64, prepare_for_upload, ImageMediaType};
use super::prompt::{parse_classification, SYSTEM_PROMPT, USER_PROMPT};
use crate::marketplace::ClassificationResult;

pub const DEFAULT_BASE_URL: &str = "https://api.anthropic.com";
pub const DEFAULT_MODEL: &str = "claude-sonnet-4-20250514";
const ANTHROPIC_VERSION: &str = "2023-06-01";
const MAX_TOKENS: u32 = 1000;

// --- Messages API serde structs ---

#[derive(serde::Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    system: &'a str,
    messages: Vec<Message>,
}

#[derive(serde::Serialize)]
struct Message {
    role: &'static str,
    content: serde_json::Value,
}

#[derive(serde::Deserialize)]
struct MessagesResponse {
    content: Vec<ContentBlock>,
    usage: Option<Usage>,
}

#[derive(serde::Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    text: Option<String>,
}

#[derive(serde::Deserialize)]
struct Usage {
    input_tokens: u32,
    output_tokens: u32,
}

#[derive(serde::Deserialize)]
struct ApiErrorBody {
    error: ApiErrorDetail,
}

#[derive(serde::Deserialize)]
struct ApiErrorDetail {
    message: String,
}

/// Client for Claude's image understanding
pub struct ClaudeVisionClient {
    client: Client,
    base_url: String,
    api_key: String,
    model: String,
}

impl ClaudeVisionClient {
    /// Create a new client against the public API
    pub fn new(api_key: &str, model: &str, timeout: Duration) -> Result<Self> {
        Self::with_base_url(api_key, model, timeout, DEFAULT_BASE_URL)
    }

    /// Create a new client against a custom endpoint
    pub fn with_base_url(
        api_key: &str,
        model: &str,
        timeout: Duration,
        base_url: &str,
    ) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;

        let base_url = base_url.trim_end_matches('/').to_string();
        info!(
            "Vision client configured: endpoint={}, model={}",
            base_url, model
        );

        Ok(Self {
            client,
            base_url,
            api_key: api_key.to_string(),
            model: model.to_string(),
        })
    }

    /// Get the model name
    pub fn model(&self) -> &str {
        &self.model
    }

    fn build_request<'a>(&'a self, base64_image: &str, media_type: ImageMediaType) -> MessagesRequest<'a> {
        MessagesRequest {
            model: &self.model,
            max_tokens: MAX_TOKENS,
            system: SYSTEM_PROMPT,
            messages: vec![Message {
                role: "user",
                content: serde_json::json!([
                    {
                        "type": "image",
                        "source": {
                            "type": "base64",
                            "media_type": media_type.as_str(),
                            "data": base64_image,
                        }
                    },
                    {"type": "text", "text": USER_PROMPT}
                ]),
            }],
        }
    }

    fn map_transport_error(e: reqwest::Error) -> ClassificationError {
        if e.is_timeout() {
            error!("Vision API timeout: {}", e);
            ClassificationError::Timeout
        } else {
            error!("Vision API transport error: {}", e);
            ClassificationError::Transport(e.to_string())
        }
    }
}

#[async_trait]
impl VisionClassifier for ClaudeVisionClient {
    async fn classify(
        &self,
        image: &[u8],
        media_type: ImageMediaType,
    ) -> Result<ClassificationResult, ClassificationError> {
        let start = Instant::now();

        let owned = image.to_vec();
        let prepared = tokio::task::spawn_blocking(move || prepare_for_upload(owned, media_type))
            .await
            .map_err(|e| ClassificationError::Transport(format!("resize task failed: {}", e)))??;

        let request = self.build_request(&encode_base64(&prepared), media_type);

        let response = self
            .client
            .post(format!("{}/v1/messages", self.base_url))
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(&request)
            .send()
            .await
            .map_err(Self::map_transport_error)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ApiErrorBody>(&body)
                .map(|b| b.error.message)
                .unwrap_or(body);
            error!("Vision API error: {} - {}", status, message);
            return Err(ClassificationError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let body: MessagesResponse = response
            .json()
            .await
            .map_err(|e| ClassificationError::MalformedJson(e.to_string()))?;

        let text = body
            .content
            .into_iter()
            .find(|block| block.kind == "text")
            .and_then(|block| block.text)
            .ok_or(ClassificationError::EmptyResponse)?;
        debug!("Raw API response: {}", text);

        let analysis = parse_classification(&text)?;

        let tokens_used = body
            .usage
            .map(|u| u.input_tokens + u.output_tokens)
            .unwrap_or(0);
        info!(
            "Analysis complete: {} ({:.2}) in {}ms, {} tokens",
            analysis.object_type,
            analysis.confidence,
            start.elapsed().as_millis(),
            tokens_used
        );

        Ok(analysis)
    }

    fn name(&self) -> &'static str {
        "claude"
    }
}
