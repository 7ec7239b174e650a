//! Model management on the Ollama daemon: listing installed models and
//! pulling new ones with streamed progress.

use pipeline::{Capability, CapabilityError, ModelName};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::client::{reject_unless_success, transport_error, OllamaClient};

/// An installed model as reported by `/api/tags`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ModelSummary {
    pub name: ModelName,
    #[serde(default)]
    pub size: Option<u64>,
    #[serde(default)]
    pub modified_at: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TagsReply {
    #[serde(default)]
    models: Vec<ModelSummary>,
}

#[derive(Debug, Serialize)]
struct PullBody<'a> {
    model: &'a str,
    stream: bool,
}

/// One line of the `/api/pull` progress stream.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PullProgress {
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub digest: Option<String>,
    #[serde(default)]
    pub completed: Option<u64>,
    #[serde(default)]
    pub total: Option<u64>,
    #[serde(default)]
    pub error: Option<String>,
}

impl PullProgress {
    /// Download percentage for layer transfers; `None` for status-only lines.
    pub fn percent(&self) -> Option<f64> {
        match (self.completed, self.total) {
            (Some(completed), Some(total)) if total > 0 => {
                Some(completed as f64 / total as f64 * 100.0)
            }
            _ => None,
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == "success"
    }
}

/// Splits a byte stream into complete newline-terminated lines.
#[derive(Debug, Default)]
struct LineBuffer {
    pending: Vec<u8>,
}

impl LineBuffer {
    fn push(&mut self, chunk: &[u8]) -> Vec<String> {
        self.pending.extend_from_slice(chunk);
        let mut lines = Vec::new();
        while let Some(pos) = self.pending.iter().position(|b| *b == b'\n') {
            let line: Vec<u8> = self.pending.drain(..=pos).collect();
            let text = String::from_utf8_lossy(&line).trim().to_string();
            if !text.is_empty() {
                lines.push(text);
            }
        }
        lines
    }

    fn finish(self) -> Option<String> {
        let text = String::from_utf8_lossy(&self.pending).trim().to_string();
        (!text.is_empty()).then_some(text)
    }
}

fn parse_progress(line: &str) -> Result<PullProgress, CapabilityError> {
    serde_json::from_str(line).map_err(|e| CapabilityError::InvalidResponse {
        capability: Capability::Generation,
        message: format!("unreadable pull progress line {line:?}: {e}"),
    })
}

fn check_progress(progress: &PullProgress) -> Result<(), CapabilityError> {
    match &progress.error {
        Some(error) => Err(CapabilityError::Rejected {
            capability: Capability::Generation,
            status: 200,
            body: error.clone(),
        }),
        None => Ok(()),
    }
}

impl OllamaClient {
    /// Lists the models installed on the daemon.
    pub async fn list_models(&self) -> Result<Vec<ModelSummary>, CapabilityError> {
        let response = self
            .http()
            .get(self.url("/api/tags"))
            .timeout(self.config().timeout)
            .send()
            .await
            .map_err(transport_error)?;

        let reply: TagsReply = reject_unless_success(response)
            .await?
            .json()
            .await
            .map_err(|e| CapabilityError::InvalidResponse {
                capability: Capability::Generation,
                message: format!("failed to parse model list: {e}"),
            })?;

        debug!(count = reply.models.len(), "Listed models");
        Ok(reply.models)
    }

    /// Pulls `model`, reporting every progress line to `on_progress`.
    ///
    /// Not subject to the client timeout: large models take minutes.
    pub async fn pull_model(
        &self,
        model: &ModelName,
        mut on_progress: impl FnMut(&PullProgress) + Send,
    ) -> Result<(), CapabilityError> {
        info!(model = %model, "Pulling model");

        let response = self
            .http()
            .post(self.url("/api/pull"))
            .json(&PullBody {
                model: model.as_str(),
                stream: true,
            })
            .send()
            .await
            .map_err(transport_error)?;
        let mut response = reject_unless_success(response).await?;

        let mut buffer = LineBuffer::default();
        let mut succeeded = false;

        while let Some(chunk) = response.chunk().await.map_err(transport_error)? {
            for line in buffer.push(&chunk) {
                let progress = parse_progress(&line)?;
                check_progress(&progress)?;
                succeeded |= progress.is_success();
                on_progress(&progress);
            }
        }
        if let Some(line) = buffer.finish() {
            let progress = parse_progress(&line)?;
            check_progress(&progress)?;
            succeeded |= progress.is_success();
            on_progress(&progress);
        }

        if succeeded {
            info!(model = %model, "Pull complete");
            Ok(())
        } else {
            Err(CapabilityError::InvalidResponse {
                capability: Capability::Generation,
                message: format!("pull of {model} ended without a success status"),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tags_reply_parses_model_names() {
        let reply: TagsReply = serde_json::from_str(
            r#"{"models":[{"name":"llama3.1:latest","size":4661224676,"digest":"abc"},{"name":"mistral:7b"}]}"#,
        )
        .unwrap();
        let names: Vec<&str> = reply.models.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(names, vec!["llama3.1:latest", "mistral:7b"]);
        assert_eq!(reply.models[0].size, Some(4_661_224_676));
    }

    #[test]
    fn empty_tags_reply_is_an_empty_list() {
        let reply: TagsReply = serde_json::from_str("{}").unwrap();
        assert!(reply.models.is_empty());
    }

    #[test]
    fn progress_percent_only_for_transfers() {
        let downloading = parse_progress(
            r#"{"status":"pulling abc","digest":"abc","total":200,"completed":50}"#,
        )
        .unwrap();
        assert_eq!(downloading.percent(), Some(25.0));

        let status = parse_progress(r#"{"status":"verifying sha256 digest"}"#).unwrap();
        assert_eq!(status.percent(), None);

        let zero_total = parse_progress(r#"{"status":"x","total":0,"completed":0}"#).unwrap();
        assert_eq!(zero_total.percent(), None);
    }

    #[test]
    fn error_line_is_rejected() {
        let progress = parse_progress(r#"{"error":"pull model manifest: file does not exist"}"#)
            .unwrap();
        let err = check_progress(&progress).unwrap_err();
        assert!(err.to_string().contains("file does not exist"));
    }

    #[test]
    fn line_buffer_reassembles_split_chunks() {
        let mut buffer = LineBuffer::default();
        assert!(buffer.push(br#"{"status":"pulling ma"#).is_empty());
        let lines = buffer.push(b"nifest\"}\n{\"status\":\"success\"}\n\n{\"sta");
        assert_eq!(
            lines,
            vec![
                r#"{"status":"pulling manifest"}"#.to_string(),
                r#"{"status":"success"}"#.to_string()
            ]
        );
        assert_eq!(buffer.finish().as_deref(), Some(r#"{"sta"#));
    }

    #[test]
    fn success_status_is_recognised() {
        assert!(parse_progress(r#"{"status":"success"}"#).unwrap().is_success());
        assert!(!parse_progress(r#"{"status":"writing manifest"}"#)
            .unwrap()
            .is_success());
    }
}
