use std::time::Duration;

use async_trait::async_trait;
use pipeline::{Capability, CapabilityError, PublishCapability, PublishRequest, PublishedArticle};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

pub const DEFAULT_BASE_URL: &str = "https://dev.to";
pub const DEFAULT_SERIES: &str = "AI Agents 101";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Environment variable the API key is read from.
pub const API_KEY_ENV: &str = "DEVTO_API_KEY";

#[derive(Clone, PartialEq)]
pub struct DevToConfig {
    pub base_url: String,
    pub api_key: Option<String>,
    /// Series every submission is filed under; `None` omits the field.
    pub series: Option<String>,
    pub timeout: Duration,
}

impl Default for DevToConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key: None,
            series: Some(DEFAULT_SERIES.to_string()),
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

impl std::fmt::Debug for DevToConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DevToConfig")
            .field("base_url", &self.base_url)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("series", &self.series)
            .field("timeout", &self.timeout)
            .finish()
    }
}

#[derive(Debug, Serialize)]
struct ArticleEnvelope<'a> {
    article: ArticleBody<'a>,
}

#[derive(Debug, Serialize)]
struct ArticleBody<'a> {
    title: &'a str,
    body_markdown: &'a str,
    published: bool,
    tags: Vec<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    series: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
struct CreatedArticle {
    url: String,
    #[serde(default)]
    id: Option<u64>,
}

/// Publish capability backed by `POST /api/articles`.
pub struct DevToClient {
    config: DevToConfig,
    http_client: reqwest::Client,
}

impl DevToClient {
    pub fn new(config: DevToConfig) -> Self {
        Self {
            config,
            http_client: reqwest::Client::new(),
        }
    }

    pub fn is_configured(&self) -> bool {
        self.config.api_key.is_some()
    }

    fn articles_url(&self) -> String {
        format!("{}/api/articles", self.config.base_url.trim_end_matches('/'))
    }

    fn build_body<'a>(&'a self, request: &'a PublishRequest) -> ArticleEnvelope<'a> {
        ArticleEnvelope {
            article: ArticleBody {
                title: &request.title,
                body_markdown: &request.body_markdown,
                published: !request.draft,
                tags: request.tags.iter().map(|t| t.as_str()).collect(),
                series: self.config.series.as_deref(),
            },
        }
    }
}

#[async_trait]
impl PublishCapability for DevToClient {
    async fn publish(&self, request: PublishRequest) -> Result<PublishedArticle, CapabilityError> {
        let api_key = self
            .config
            .api_key
            .as_deref()
            .ok_or_else(|| CapabilityError::NotConfigured {
                capability: Capability::Publish,
                message: format!("{API_KEY_ENV} is not set"),
            })?;

        debug!(title = %request.title, draft = request.draft, "Submitting article");

        let response = self
            .http_client
            .post(self.articles_url())
            .header("api-key", api_key)
            .timeout(self.config.timeout)
            .json(&self.build_body(&request))
            .send()
            .await
            .map_err(|e| CapabilityError::Unavailable {
                capability: Capability::Publish,
                message: format!("dev.to request failed: {e}"),
            })?;

        let status = response.status();
        if status != reqwest::StatusCode::CREATED {
            let body = response.text().await.unwrap_or_default();
            return Err(CapabilityError::Rejected {
                capability: Capability::Publish,
                status: status.as_u16(),
                body,
            });
        }

        let created: CreatedArticle =
            response
                .json()
                .await
                .map_err(|e| CapabilityError::InvalidResponse {
                    capability: Capability::Publish,
                    message: format!("failed to parse dev.to reply: {e}"),
                })?;

        info!(url = %created.url, id = ?created.id, "Article created on dev.to");
        Ok(PublishedArticle { url: created.url })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pipeline::Tag;
    use std::collections::BTreeSet;

    fn request(draft: bool) -> PublishRequest {
        PublishRequest {
            title: "Rust in 2026".into(),
            body_markdown: "# Rust\n\nBody".into(),
            tags: ["rust", "ai"].into_iter().filter_map(Tag::new).collect(),
            draft,
        }
    }

    fn configured() -> DevToClient {
        DevToClient::new(DevToConfig {
            api_key: Some("secret".into()),
            ..DevToConfig::default()
        })
    }

    #[test]
    fn draft_body_matches_forem_format() {
        let client = configured();
        let req = request(true);
        let json = serde_json::to_value(client.build_body(&req)).unwrap();

        assert_eq!(json["article"]["title"], "Rust in 2026");
        assert_eq!(json["article"]["body_markdown"], "# Rust\n\nBody");
        assert_eq!(json["article"]["published"], false);
        assert_eq!(json["article"]["tags"], serde_json::json!(["ai", "rust"]));
        assert_eq!(json["article"]["series"], "AI Agents 101");
    }

    #[test]
    fn non_draft_is_published() {
        let client = configured();
        let req = request(false);
        let json = serde_json::to_value(client.build_body(&req)).unwrap();
        assert_eq!(json["article"]["published"], true);
    }

    #[test]
    fn series_is_omitted_when_unset() {
        let client = DevToClient::new(DevToConfig {
            series: None,
            ..DevToConfig::default()
        });
        let req = PublishRequest {
            tags: BTreeSet::new(),
            ..request(true)
        };
        let json = serde_json::to_value(client.build_body(&req)).unwrap();
        assert!(json["article"].get("series").is_none());
        assert_eq!(json["article"]["tags"], serde_json::json!([]));
    }

    #[test]
    fn articles_url_is_joined_cleanly() {
        let client = DevToClient::new(DevToConfig {
            base_url: "http://localhost:3000/".into(),
            ..DevToConfig::default()
        });
        assert_eq!(client.articles_url(), "http://localhost:3000/api/articles");
    }

    #[test]
    fn created_reply_parses_url() {
        let created: CreatedArticle = serde_json::from_str(
            r#"{"type_of":"article","id":42,"title":"Rust in 2026","url":"https://dev.to/me/rust-in-2026-1abc"}"#,
        )
        .unwrap();
        assert_eq!(created.url, "https://dev.to/me/rust-in-2026-1abc");
        assert_eq!(created.id, Some(42));
    }

    #[test]
    fn debug_output_redacts_the_key() {
        let rendered = format!("{:?}", configured().config);
        assert!(!rendered.contains("secret"));
        assert!(rendered.contains("<redacted>"));
    }

    #[tokio::test]
    async fn missing_key_is_not_configured() {
        let client = DevToClient::new(DevToConfig::default());
        assert!(!client.is_configured());

        let err = client.publish(request(true)).await.unwrap_err();
        assert!(matches!(
            err,
            CapabilityError::NotConfigured {
                capability: Capability::Publish,
                ..
            }
        ));
        assert!(err.to_string().contains("DEVTO_API_KEY"));
    }
}
