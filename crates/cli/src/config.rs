//! `blogsmith.toml` loading, environment overrides and validation.
//!
//! Every field has a default, so a missing file is not an error unless the
//! path was given explicitly with `--config`. Secrets never come from the
//! file: the dev.to key is read from `DEVTO_API_KEY` only.

use std::collections::BTreeSet;
use std::net::SocketAddr;
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use nodes::PipelineSettings;
use pipeline::{PipelineError, RevisionBudget, Tag, Temperature};
use serde::Deserialize;

/// Looked up in the working directory when `--config` is not given.
pub const DEFAULT_CONFIG_FILE: &str = "blogsmith.toml";

pub const OLLAMA_HOST_ENV: &str = "OLLAMA_HOST";
pub const MODEL_ENV: &str = "BLOGSMITH_MODEL";
pub const OTLP_ENDPOINT_ENV: &str = "OTEL_EXPORTER_OTLP_ENDPOINT";

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BlogsmithConfig {
    pub llm: LlmSection,
    pub search: SearchSection,
    pub publisher: PublisherSection,
    pub pipeline: PipelineSection,
    pub server: ServerSection,
    pub telemetry: TelemetrySection,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LlmSection {
    pub base_url: String,
    pub model: String,
    pub writer_temperature: f64,
    pub reviewer_temperature: f64,
    pub timeout_secs: u64,
}

impl Default for LlmSection {
    fn default() -> Self {
        Self {
            base_url: llm::DEFAULT_BASE_URL.to_string(),
            model: llm::DEFAULT_MODEL.to_string(),
            writer_temperature: Temperature::CREATIVE.as_f64(),
            reviewer_temperature: Temperature::DETERMINISTIC.as_f64(),
            timeout_secs: llm::DEFAULT_TIMEOUT.as_secs(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SearchSection {
    pub endpoint: String,
    pub timeout_secs: u64,
}

impl Default for SearchSection {
    fn default() -> Self {
        Self {
            endpoint: search::DEFAULT_ENDPOINT.to_string(),
            timeout_secs: search::DEFAULT_TIMEOUT.as_secs(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PublisherSection {
    pub base_url: String,
    pub tags: Vec<String>,
    /// An empty string files articles under no series.
    pub series: String,
    pub timeout_secs: u64,
}

impl Default for PublisherSection {
    fn default() -> Self {
        Self {
            base_url: publisher::DEFAULT_BASE_URL.to_string(),
            tags: nodes::default_tags()
                .into_iter()
                .map(String::from)
                .collect(),
            series: publisher::DEFAULT_SERIES.to_string(),
            timeout_secs: publisher::DEFAULT_TIMEOUT.as_secs(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PipelineSection {
    pub max_revisions: u32,
    pub publish: bool,
}

impl Default for PipelineSection {
    fn default() -> Self {
        Self {
            max_revisions: RevisionBudget::default().as_u32(),
            publish: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServerSection {
    pub bind: String,
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1:8000".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TelemetrySection {
    pub otlp_endpoint: Option<String>,
    pub service_name: String,
}

impl Default for TelemetrySection {
    fn default() -> Self {
        Self {
            otlp_endpoint: None,
            service_name: "blogsmith".to_string(),
        }
    }
}

/// Loads the configuration file, if any, and applies environment overrides.
pub fn load_config(path: Option<&Path>) -> Result<BlogsmithConfig> {
    let mut config = match path {
        Some(path) => read_config(path)?,
        None if Path::new(DEFAULT_CONFIG_FILE).exists() => {
            read_config(Path::new(DEFAULT_CONFIG_FILE))?
        }
        None => BlogsmithConfig::default(),
    };
    config.apply_overrides(|key| std::env::var(key).ok());
    Ok(config)
}

fn read_config(path: &Path) -> Result<BlogsmithConfig> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("reading config: {}", path.display()))?;
    let config: BlogsmithConfig =
        toml::from_str(&content).with_context(|| format!("parsing config: {}", path.display()))?;
    Ok(config)
}

fn invalid(message: impl Into<String>) -> PipelineError {
    PipelineError::Configuration {
        message: message.into(),
    }
}

fn non_zero_timeout(section: &str, secs: u64) -> Result<Duration, PipelineError> {
    if secs == 0 {
        return Err(invalid(format!("{section}.timeout_secs must be at least 1")));
    }
    Ok(Duration::from_secs(secs))
}

fn non_blank<'a>(field: &str, value: &'a str) -> Result<&'a str, PipelineError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(invalid(format!("{field} must not be empty")));
    }
    Ok(trimmed)
}

impl BlogsmithConfig {
    /// Applies `OLLAMA_HOST`, `BLOGSMITH_MODEL` and
    /// `OTEL_EXPORTER_OTLP_ENDPOINT` on top of the file values.
    pub fn apply_overrides(&mut self, env: impl Fn(&str) -> Option<String>) {
        let set = |key: &str| env(key).filter(|v| !v.trim().is_empty());

        if let Some(host) = set(OLLAMA_HOST_ENV) {
            // Ollama itself accepts a bare `host:port`.
            self.llm.base_url = if host.contains("://") {
                host
            } else {
                format!("http://{host}")
            };
        }
        if let Some(model) = set(MODEL_ENV) {
            self.llm.model = model;
        }
        if let Some(endpoint) = set(OTLP_ENDPOINT_ENV) {
            self.telemetry.otlp_endpoint = Some(endpoint);
        }
    }

    pub fn ollama(&self) -> Result<llm::OllamaConfig, PipelineError> {
        Ok(llm::OllamaConfig {
            base_url: non_blank("llm.base_url", &self.llm.base_url)?.to_string(),
            model: non_blank("llm.model", &self.llm.model)?.to_string(),
            timeout: non_zero_timeout("llm", self.llm.timeout_secs)?,
        })
    }

    pub fn search(&self) -> Result<search::DuckDuckGoConfig, PipelineError> {
        Ok(search::DuckDuckGoConfig {
            endpoint: non_blank("search.endpoint", &self.search.endpoint)?.to_string(),
            timeout: non_zero_timeout("search", self.search.timeout_secs)?,
        })
    }

    /// `api_key` comes from the environment, never from the file.
    pub fn devto(&self, api_key: Option<String>) -> Result<publisher::DevToConfig, PipelineError> {
        let series = self.publisher.series.trim();
        Ok(publisher::DevToConfig {
            base_url: non_blank("publisher.base_url", &self.publisher.base_url)?.to_string(),
            api_key: api_key.filter(|k| !k.trim().is_empty()),
            series: (!series.is_empty()).then(|| series.to_string()),
            timeout: non_zero_timeout("publisher", self.publisher.timeout_secs)?,
        })
    }

    pub fn tags(&self) -> Result<BTreeSet<Tag>, PipelineError> {
        self.publisher
            .tags
            .iter()
            .map(|t| Tag::new(t.trim()).ok_or_else(|| invalid("publisher.tags must not contain blank tags")))
            .collect()
    }

    pub fn pipeline_settings(&self) -> Result<PipelineSettings, PipelineError> {
        let temperature = |field: &str, value: f64| {
            Temperature::new(value)
                .ok_or_else(|| invalid(format!("{field} = {value} is outside [0.0, 1.0]")))
        };
        Ok(PipelineSettings {
            writer_temperature: temperature("llm.writer_temperature", self.llm.writer_temperature)?,
            reviewer_temperature: temperature(
                "llm.reviewer_temperature",
                self.llm.reviewer_temperature,
            )?,
            max_revisions: RevisionBudget::new(self.pipeline.max_revisions)
                .ok_or_else(|| invalid("pipeline.max_revisions must be at least 1"))?,
            tags: self.tags()?,
            publish: self.pipeline.publish,
        })
    }

    pub fn bind_addr(&self) -> Result<SocketAddr, PipelineError> {
        self.server
            .bind
            .parse()
            .map_err(|e| invalid(format!("server.bind {:?} is not an address: {e}", self.server.bind)))
    }

    /// Checks every section without building anything.
    pub fn validate(&self) -> Result<(), PipelineError> {
        self.ollama()?;
        self.search()?;
        self.devto(None)?;
        self.pipeline_settings()?;
        self.bind_addr()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn parse(toml: &str) -> BlogsmithConfig {
        toml::from_str(toml).unwrap()
    }

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn empty_file_gives_defaults() {
        let config = parse("");
        assert_eq!(config, BlogsmithConfig::default());
        config.validate().unwrap();

        let settings = config.pipeline_settings().unwrap();
        assert_eq!(settings, PipelineSettings::default());
        assert_eq!(config.ollama().unwrap(), llm::OllamaConfig::default());
        assert_eq!(config.bind_addr().unwrap().port(), 8000);
    }

    #[test]
    fn sections_override_defaults() {
        let config = parse(
            r#"
            [llm]
            model = "mistral:7b"
            writer_temperature = 0.9

            [pipeline]
            max_revisions = 5
            publish = false

            [publisher]
            tags = ["rust", "ai"]
            series = ""
            "#,
        );

        let settings = config.pipeline_settings().unwrap();
        assert_eq!(settings.max_revisions.as_u32(), 5);
        assert!(!settings.publish);
        assert_eq!(settings.writer_temperature.as_f64(), 0.9);
        assert_eq!(
            settings.tags.iter().map(|t| t.as_str()).collect::<Vec<_>>(),
            vec!["ai", "rust"]
        );
        assert_eq!(config.ollama().unwrap().model, "mistral:7b");
        assert_eq!(config.devto(None).unwrap().series, None);
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let result: Result<BlogsmithConfig, _> = toml::from_str("[llm]\napi_key = \"x\"\n");
        assert!(result.is_err());
    }

    #[test]
    fn zero_revision_budget_is_a_configuration_error() {
        let config = parse("[pipeline]\nmax_revisions = 0\n");
        let err = config.validate().unwrap_err();
        assert!(matches!(err, PipelineError::Configuration { .. }));
        assert!(err.to_string().contains("max_revisions"));
    }

    #[test]
    fn out_of_range_temperature_is_a_configuration_error() {
        let config = parse("[llm]\nreviewer_temperature = 1.5\n");
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("llm.reviewer_temperature"));
    }

    #[test]
    fn zero_timeout_and_bad_bind_are_rejected() {
        assert!(parse("[search]\ntimeout_secs = 0\n").validate().is_err());
        assert!(parse("[server]\nbind = \"localhost\"\n").validate().is_err());
        assert!(parse("[publisher]\ntags = [\" \"]\n").validate().is_err());
    }

    #[test]
    fn environment_overrides_file_values() {
        let mut config = parse("[llm]\nbase_url = \"http://file:11434\"\nmodel = \"file-model\"\n");
        config.apply_overrides(env(&[
            ("OLLAMA_HOST", "gpu-box:11434"),
            ("BLOGSMITH_MODEL", "llama3.2"),
            ("OTEL_EXPORTER_OTLP_ENDPOINT", "http://collector:4317"),
        ]));

        assert_eq!(config.llm.base_url, "http://gpu-box:11434");
        assert_eq!(config.llm.model, "llama3.2");
        assert_eq!(
            config.telemetry.otlp_endpoint.as_deref(),
            Some("http://collector:4317")
        );
    }

    #[test]
    fn blank_environment_values_are_ignored() {
        let mut config = BlogsmithConfig::default();
        config.apply_overrides(env(&[("BLOGSMITH_MODEL", "  ")]));
        assert_eq!(config.llm.model, llm::DEFAULT_MODEL);
    }

    #[test]
    fn api_key_only_from_argument() {
        let config = BlogsmithConfig::default();
        assert_eq!(config.devto(None).unwrap().api_key, None);
        assert_eq!(config.devto(Some(String::new())).unwrap().api_key, None);
        assert_eq!(
            config.devto(Some("k".into())).unwrap().api_key.as_deref(),
            Some("k")
        );
    }

    #[test]
    fn explicit_missing_file_is_an_error() {
        let err = load_config(Some(Path::new("/nonexistent/blogsmith.toml"))).unwrap_err();
        assert!(err.to_string().contains("reading config"));
    }
}
