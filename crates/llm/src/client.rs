use std::time::Duration;

use async_trait::async_trait;
use pipeline::{Capability, CapabilityError, GenerationCapability, GenerationRequest};
use serde::{Deserialize, Serialize};
use tracing::debug;

pub const DEFAULT_BASE_URL: &str = "http://localhost:11434";
pub const DEFAULT_MODEL: &str = "llama3.1:latest";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(300);

/// Connection settings for an Ollama daemon.
#[derive(Debug, Clone, PartialEq)]
pub struct OllamaConfig {
    pub base_url: String,
    pub model: String,
    /// Applied to each generate and list call. Pulls are not bounded.
    pub timeout: Duration,
}

impl Default for OllamaConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

#[derive(Debug, Serialize)]
struct GenerateBody<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
    options: GenerateOptions,
}

#[derive(Debug, Serialize)]
struct GenerateOptions {
    temperature: f64,
}

#[derive(Debug, Deserialize)]
struct GenerateReply {
    response: String,
    #[serde(default)]
    eval_count: Option<u64>,
    #[serde(default)]
    total_duration: Option<u64>,
}

/// Generation capability backed by Ollama's `/api/generate`.
pub struct OllamaClient {
    config: OllamaConfig,
    http_client: reqwest::Client,
}

impl OllamaClient {
    pub fn new(config: OllamaConfig) -> Self {
        Self {
            config,
            http_client: reqwest::Client::new(),
        }
    }

    pub fn model(&self) -> &str {
        &self.config.model
    }

    pub(crate) fn config(&self) -> &OllamaConfig {
        &self.config
    }

    pub(crate) fn http(&self) -> &reqwest::Client {
        &self.http_client
    }

    pub(crate) fn url(&self, path: &str) -> String {
        format!("{}{}", self.config.base_url.trim_end_matches('/'), path)
    }

    fn build_body<'a>(&'a self, request: &'a GenerationRequest) -> GenerateBody<'a> {
        GenerateBody {
            model: &self.config.model,
            prompt: &request.prompt,
            stream: false,
            options: GenerateOptions {
                temperature: request.temperature.as_f64(),
            },
        }
    }
}

#[async_trait]
impl GenerationCapability for OllamaClient {
    async fn generate(&self, request: GenerationRequest) -> Result<String, CapabilityError> {
        let response = self
            .http_client
            .post(self.url("/api/generate"))
            .timeout(self.config.timeout)
            .json(&self.build_body(&request))
            .send()
            .await
            .map_err(transport_error)?;

        let response = reject_unless_success(response).await?;

        let reply: GenerateReply = response.json().await.map_err(|e| {
            CapabilityError::InvalidResponse {
                capability: Capability::Generation,
                message: format!("failed to parse Ollama reply: {e}"),
            }
        })?;

        debug!(
            model = %self.config.model,
            temperature = %request.temperature,
            eval_count = ?reply.eval_count,
            total_duration_ns = ?reply.total_duration,
            "Generation complete"
        );
        Ok(reply.response)
    }
}

pub(crate) fn transport_error(error: reqwest::Error) -> CapabilityError {
    CapabilityError::Unavailable {
        capability: Capability::Generation,
        message: if error.is_timeout() {
            format!("request to Ollama timed out: {error}")
        } else {
            format!("Ollama request failed: {error}")
        },
    }
}

pub(crate) async fn reject_unless_success(
    response: reqwest::Response,
) -> Result<reqwest::Response, CapabilityError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(CapabilityError::Rejected {
        capability: Capability::Generation,
        status: status.as_u16(),
        body,
    })
}
