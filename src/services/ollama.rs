use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::services::judge::{Judge, JudgeCall, JudgeError};

/// Upper bound for the `/api/tags` request behind `GET /health`
const HEALTH_CHECK_TIMEOUT: Duration = Duration::from_secs(3);

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
    format: &'static str,
    options: GenerateOptions,
}

#[derive(Debug, Serialize)]
struct GenerateOptions {
    temperature: f32,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    response: Option<String>,
}

/// Judge backed by a local Ollama server
///
/// Each call is a non-streaming `POST /api/generate` in JSON mode; the model's
/// `response` text is handed back untouched.
pub struct OllamaJudge {
    base_url: String,
    model: String,
    temperature: f32,
    client: Client,
}

impl OllamaJudge {
    /// Create a new Ollama judge
    ///
    /// `request_timeout` bounds the HTTP exchange itself; the tournament engine
    /// applies its own per-call timeout on top.
    pub fn new(
        base_url: impl Into<String>,
        model: impl Into<String>,
        temperature: f32,
        request_timeout: Duration,
    ) -> Result<Self, JudgeError> {
        let client = Client::builder()
            .timeout(request_timeout)
            .build()
            .map_err(|e| JudgeError::Unavailable(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            base_url: base_url.into(),
            model: model.into(),
            temperature,
            client,
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), path)
    }
}

fn map_transport_error(e: reqwest::Error) -> JudgeError {
    if e.is_timeout() {
        JudgeError::Unavailable(format!("request timed out: {}", e))
    } else {
        JudgeError::Unavailable(e.to_string())
    }
}

#[async_trait]
impl Judge for OllamaJudge {
    async fn judge(&self, call: &JudgeCall<'_>) -> Result<String, JudgeError> {
        let url = self.endpoint("api/generate");
        let body = GenerateRequest {
            model: &self.model,
            prompt: call.instruction,
            stream: false,
            format: "json",
            options: GenerateOptions {
                temperature: self.temperature,
            },
        };

        tracing::debug!(
            category = %call.category,
            chunk_len = call.chunk.len(),
            attempt = call.attempt,
            "Sending judge call to {}",
            url
        );

        let response = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(map_transport_error)?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(if status.is_server_error() || status == StatusCode::TOO_MANY_REQUESTS {
                JudgeError::Unavailable(format!("{}: {}", status, message))
            } else {
                JudgeError::Rejected {
                    status: status.as_u16(),
                    message,
                }
            });
        }

        let parsed: GenerateResponse = response
            .json()
            .await
            .map_err(|e| JudgeError::InvalidResponse(e.to_string()))?;

        parsed
            .response
            .ok_or_else(|| JudgeError::InvalidResponse("missing 'response' field".into()))
    }

    fn name(&self) -> &str {
        &self.model
    }

    async fn health_check(&self) -> bool {
        let tags = self
            .client
            .get(self.endpoint("api/tags"))
            .timeout(HEALTH_CHECK_TIMEOUT)
            .send()
            .await;

        match tags {
            Ok(response) => response.status().is_success(),
            Err(e) => {
                tracing::warn!("Judge health check failed: {}", e);
                false
            }
        }
    }
}
