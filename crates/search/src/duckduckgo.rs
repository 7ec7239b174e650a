use std::time::Duration;

use async_trait::async_trait;
use pipeline::{Capability, CapabilityError, SearchCapability};
use scraper::{ElementRef, Html, Selector};
use tracing::debug;

pub const DEFAULT_ENDPOINT: &str = "https://html.duckduckgo.com/html/";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(15);

/// Upper bound on snippets returned for one query.
pub const MAX_SNIPPETS: usize = 8;

// The HTML endpoint serves an empty page to clients without a browser agent.
const USER_AGENT: &str = "Mozilla/5.0 (X11; Linux x86_64; rv:128.0) Gecko/20100101 Firefox/128.0";

#[derive(Debug, Clone, PartialEq)]
pub struct DuckDuckGoConfig {
    pub endpoint: String,
    pub timeout: Duration,
}

impl Default for DuckDuckGoConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

/// One organic web result.
#[derive(Debug, Clone, PartialEq, Eq)]
struct SearchHit {
    title: String,
    snippet: String,
}

impl SearchHit {
    fn render(&self) -> String {
        match (self.title.is_empty(), self.snippet.is_empty()) {
            (false, false) => format!("{}: {}", self.title, self.snippet),
            (true, _) => self.snippet.clone(),
            (false, true) => self.title.clone(),
        }
    }
}

fn selector(css: &str) -> Result<Selector, CapabilityError> {
    Selector::parse(css).map_err(|e| CapabilityError::InvalidResponse {
        capability: Capability::Search,
        message: format!("invalid result selector {css:?}: {e}"),
    })
}

/// Collapses the element's text into single-spaced words.
fn text_of(element: ElementRef<'_>) -> String {
    element
        .text()
        .flat_map(|t| t.split_whitespace())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Extracts up to [`MAX_SNIPPETS`] organic results, skipping sponsored ones.
fn parse_results(html: &str) -> Result<Vec<SearchHit>, CapabilityError> {
    let result = selector("div.result")?;
    let title = selector("a.result__a")?;
    let snippet = selector(".result__snippet")?;

    let document = Html::parse_document(html);
    let hits = document
        .select(&result)
        .filter(|el| !el.value().classes().any(|c| c == "result--ad"))
        .map(|el| SearchHit {
            title: el.select(&title).next().map(text_of).unwrap_or_default(),
            snippet: el.select(&snippet).next().map(text_of).unwrap_or_default(),
        })
        .filter(|hit| !hit.snippet.is_empty() || !hit.title.is_empty())
        .take(MAX_SNIPPETS)
        .collect();
    Ok(hits)
}

fn parse_reply(html: &str) -> Result<String, CapabilityError> {
    let hits = parse_results(html)?;
    if hits.is_empty() {
        return Err(CapabilityError::EmptyResult {
            capability: Capability::Search,
        });
    }
    Ok(hits
        .iter()
        .map(SearchHit::render)
        .collect::<Vec<_>>()
        .join("\n"))
}

/// Search capability backed by DuckDuckGo's HTML results page.
pub struct DuckDuckGoClient {
    config: DuckDuckGoConfig,
    http_client: reqwest::Client,
}

impl DuckDuckGoClient {
    pub fn new(config: DuckDuckGoConfig) -> Self {
        Self {
            config,
            http_client: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl SearchCapability for DuckDuckGoClient {
    async fn search(&self, query: &str) -> Result<String, CapabilityError> {
        let response = self
            .http_client
            .get(&self.config.endpoint)
            .query(&[("q", query)])
            .header(reqwest::header::USER_AGENT, USER_AGENT)
            .timeout(self.config.timeout)
            .send()
            .await
            .map_err(|e| CapabilityError::Unavailable {
                capability: Capability::Search,
                message: format!("DuckDuckGo request failed: {e}"),
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(CapabilityError::Rejected {
                capability: Capability::Search,
                status: status.as_u16(),
                body,
            });
        }

        let body = response
            .text()
            .await
            .map_err(|e| CapabilityError::InvalidResponse {
                capability: Capability::Search,
                message: format!("failed to read DuckDuckGo reply: {e}"),
            })?;
        let joined = parse_reply(&body)?;
        debug!(query, bytes = joined.len(), "Search complete");
        Ok(joined)
    }
}
