use std::net::SocketAddr;
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::telemetry::LogFormat;

/// Topic used when `generate` is run without one.
pub const DEFAULT_TOPIC: &str = "The Impact of Quantum Computing on AI";

#[derive(Debug, Parser)]
#[command(
    name = "blogsmith",
    version,
    about = "Research, write, review and publish a blog article with a local LLM"
)]
pub struct Cli {
    /// Config file path (default: ./blogsmith.toml if present).
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Log output format.
    #[arg(long, value_enum, default_value_t = LogFormat::Pretty, global = true)]
    pub log_format: LogFormat,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run the full pipeline for one topic and print the article.
    Generate(GenerateArgs),
    /// Serve the HTTP API.
    Serve(ServeArgs),
    /// List the models installed on the Ollama daemon.
    Models,
    /// Download a model onto the Ollama daemon.
    Pull(PullArgs),
    /// Submit an existing markdown file to dev.to as a draft.
    Publish(PublishArgs),
    /// Load and validate the configuration, then exit.
    CheckConfig,
}

#[derive(Debug, Args)]
pub struct GenerateArgs {
    #[arg(default_value = DEFAULT_TOPIC)]
    pub topic: String,

    /// End the run on approval instead of publishing.
    #[arg(long)]
    pub no_publish: bool,

    /// Override `pipeline.max_revisions`.
    #[arg(long)]
    pub max_revisions: Option<u32>,

    /// Override `llm.model`.
    #[arg(long)]
    pub model: Option<String>,

    /// Print the response as JSON instead of text.
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Args)]
pub struct ServeArgs {
    /// Override `server.bind`.
    #[arg(long)]
    pub bind: Option<SocketAddr>,
}

#[derive(Debug, Args)]
pub struct PullArgs {
    /// Model to pull (default: the configured model).
    pub model: Option<String>,
}

#[derive(Debug, Args)]
pub struct PublishArgs {
    #[arg(long)]
    pub title: String,

    /// Markdown file holding the article body.
    #[arg(long)]
    pub file: PathBuf,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn generate_defaults_topic() {
        let cli = Cli::parse_from(["blogsmith", "generate"]);
        match cli.command {
            Command::Generate(args) => {
                assert_eq!(args.topic, DEFAULT_TOPIC);
                assert!(!args.no_publish);
                assert_eq!(args.max_revisions, None);
            }
            other => panic!("unexpected command: {other:?}"),
        }
        assert_eq!(cli.log_format, LogFormat::Pretty);
    }

    #[test]
    fn global_flags_follow_subcommand() {
        let cli = Cli::parse_from([
            "blogsmith",
            "generate",
            "Rust async",
            "--no-publish",
            "--max-revisions",
            "2",
            "--log-format",
            "json",
            "--config",
            "custom.toml",
        ]);
        assert_eq!(cli.log_format, LogFormat::Json);
        assert_eq!(cli.config, Some(PathBuf::from("custom.toml")));
        match cli.command {
            Command::Generate(args) => {
                assert_eq!(args.topic, "Rust async");
                assert!(args.no_publish);
                assert_eq!(args.max_revisions, Some(2));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn publish_requires_title_and_file() {
        assert!(Cli::try_parse_from(["blogsmith", "publish", "--title", "T"]).is_err());
        let cli =
            Cli::try_parse_from(["blogsmith", "publish", "--title", "T", "--file", "a.md"]).unwrap();
        assert!(matches!(cli.command, Command::Publish(_)));
    }

    #[test]
    fn serve_parses_bind_address() {
        let cli = Cli::parse_from(["blogsmith", "serve", "--bind", "0.0.0.0:9000"]);
        match cli.command {
            Command::Serve(args) => assert_eq!(args.bind.unwrap().port(), 9000),
            other => panic!("unexpected command: {other:?}"),
        }
    }
}
