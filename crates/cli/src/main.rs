//! Blogsmith CLI entry point.
//!
//! This binary is the composition root for the entire system:
//!
//! 1. **Parse configuration**: load `blogsmith.toml`, apply environment
//!    overrides and validate it.
//! 2. **Wire observability**: install `tracing-subscriber` with a pretty or
//!    JSON formatter and, when an endpoint is configured, an OpenTelemetry
//!    OTLP exporter.
//! 3. **Construct infrastructure**: create the Ollama, DuckDuckGo and dev.to
//!    adapters and inject them into [`nodes::PipelineExecutor`].
//! 4. **Dispatch**: run one article, serve the HTTP API, or manage models.

mod cli;
mod config;
mod telemetry;

use std::io::Write;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use nodes::{draft_submission, PipelineExecutor, RunReport};
use pipeline::{ArticleRequest, ModelName, PublishCapability, Topic};
use tracing::info;

use crate::cli::{Cli, Command, GenerateArgs, PublishArgs, PullArgs, ServeArgs};
use crate::config::BlogsmithConfig;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = config::load_config(cli.config.as_deref())?;
    if let Command::Generate(args) = &cli.command {
        apply_generate_overrides(&mut config, args);
    }
    config.validate().context("invalid configuration")?;

    let _telemetry = telemetry::init_telemetry(&config.telemetry, cli.log_format)?;

    match cli.command {
        Command::Generate(args) => generate(&config, args).await,
        Command::Serve(args) => serve(&config, args).await,
        Command::Models => list_models(&config).await,
        Command::Pull(args) => pull(&config, args).await,
        Command::Publish(args) => publish(&config, args).await,
        Command::CheckConfig => {
            println!("config is valid");
            Ok(())
        }
    }
}

fn apply_generate_overrides(config: &mut BlogsmithConfig, args: &GenerateArgs) {
    if let Some(model) = &args.model {
        config.llm.model = model.clone();
    }
    if let Some(max_revisions) = args.max_revisions {
        config.pipeline.max_revisions = max_revisions;
    }
    if args.no_publish {
        config.pipeline.publish = false;
    }
}

fn devto_client(config: &BlogsmithConfig) -> Result<publisher::DevToClient> {
    let api_key = std::env::var(publisher::API_KEY_ENV).ok();
    Ok(publisher::DevToClient::new(config.devto(api_key)?))
}

fn build_executor(config: &BlogsmithConfig) -> Result<PipelineExecutor> {
    let settings = config.pipeline_settings()?;
    let devto = devto_client(config)?;
    if settings.publish && !devto.is_configured() {
        tracing::warn!(
            "{} is not set; approved articles will not be published",
            publisher::API_KEY_ENV
        );
    }

    Ok(PipelineExecutor::standard(
        Arc::new(search::DuckDuckGoClient::new(config.search()?)),
        Arc::new(llm::OllamaClient::new(config.ollama()?)),
        Arc::new(devto),
        settings,
    ))
}

async fn generate(config: &BlogsmithConfig, args: GenerateArgs) -> Result<()> {
    let topic = Topic::new(args.topic).context("topic must not be empty")?;
    let executor = build_executor(config)?;

    info!(topic = %topic, model = %config.llm.model, "Starting multi-agent run");
    let report = executor
        .run(ArticleRequest { topic })
        .await
        .context("article run failed")?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report.response())?);
    } else {
        print_report(&report);
    }
    Ok(())
}

fn print_report(report: &RunReport) {
    let rule = "=".repeat(50);
    println!("{rule}\nFINAL POLISHED POST:\n{rule}\n");
    println!("{}\n", report.state.blog_post);
    println!("{rule}");
    println!("Revisions:       {}", report.state.revision_count);
    println!("Review feedback: {}", report.state.review_feedback);
    println!(
        "Steps:           {}",
        report
            .trace
            .iter()
            .map(|s| s.as_str())
            .collect::<Vec<_>>()
            .join(" -> ")
    );
    println!(
        "Elapsed:         {:.1}s",
        report.started_at.millis_until(report.finished_at) as f64 / 1000.0
    );
}

async fn serve(config: &BlogsmithConfig, args: ServeArgs) -> Result<()> {
    let addr = match args.bind {
        Some(addr) => addr,
        None => config.bind_addr()?,
    };
    let executor = Arc::new(build_executor(config)?);
    let publisher: Arc<dyn PublishCapability> = Arc::new(devto_client(config)?);
    let state = server::AppState::new(executor, publisher).with_tags(config.tags()?);

    // Returning normally lets the telemetry guard flush buffered spans.
    server::serve(Arc::new(state), addr, server::shutdown_signal())
        .await
        .context("API server failed")
}

async fn list_models(config: &BlogsmithConfig) -> Result<()> {
    let client = llm::OllamaClient::new(config.ollama()?);
    let models = client
        .list_models()
        .await
        .with_context(|| format!("listing models at {}", config.llm.base_url))?;

    if models.is_empty() {
        println!("No models installed. Try `blogsmith pull {}`.", client.model());
        return Ok(());
    }
    println!("Available models:");
    for model in models {
        println!("- {}", model.name);
    }
    Ok(())
}

async fn pull(config: &BlogsmithConfig, args: PullArgs) -> Result<()> {
    let name = args.model.unwrap_or_else(|| config.llm.model.clone());
    let model = ModelName::new(name).context("model name must not be empty")?;
    let client = llm::OllamaClient::new(config.ollama()?);

    let mut stdout = std::io::stdout();
    client
        .pull_model(&model, |progress| {
            if let Err(e) = render_progress(&mut stdout, progress) {
                tracing::debug!(error = %e, "Could not render pull progress");
            }
        })
        .await
        .with_context(|| format!("pulling {model}"))?;

    println!("\nPull complete: {model}");
    Ok(())
}

/// Redraws the progress line in place, padded to clear a longer previous one.
fn render_progress(out: &mut impl Write, progress: &llm::PullProgress) -> std::io::Result<()> {
    let line = match progress.percent() {
        Some(percent) => format!("{}: {percent:.1}%", progress.status),
        None => progress.status.clone(),
    };
    write!(out, "\r{line:<60}")?;
    out.flush()
}

async fn publish(config: &BlogsmithConfig, args: PublishArgs) -> Result<()> {
    let body = std::fs::read_to_string(&args.file)
        .with_context(|| format!("reading {}", args.file.display()))?;
    let devto = devto_client(config)?;

    let request = draft_submission(&args.title, &body, &config.tags()?);
    let article = devto
        .publish(request)
        .await
        .context("publishing to dev.to")?;

    println!("Draft created: {}", article.url);
    Ok(())
}
