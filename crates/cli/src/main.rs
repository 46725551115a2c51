//! docchat CLI
//!
//! Main entry point for the docchat command-line tool.
//! Answers questions about stored documents with a local model.

mod commands;

use clap::{Parser, Subcommand};
use commands::{AskCommand, ServeCommand, StatsCommand};
use docchat_core::config::{AppConfig, ConfigOverrides, LogFormat};
use docchat_core::{logging, AppResult};
use std::path::PathBuf;

/// docchat - grounded answers about your documents from a local model
#[derive(Parser, Debug)]
#[command(name = "docchat")]
#[command(about = "Grounded answers about your documents from a local model", long_about = None)]
#[command(version)]
struct Cli {
    /// Path to config file
    #[arg(short, long, global = true, env = "DOCCHAT_CONFIG")]
    config: Option<PathBuf>,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, global = true, env = "RUST_LOG")]
    log_level: Option<String>,

    /// Log output format (text, json)
    #[arg(long, global = true)]
    log_format: Option<LogFormat>,

    /// Enable verbose output (sets log level to debug)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Disable colored output
    #[arg(long, global = true, env = "NO_COLOR")]
    no_color: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the HTTP chat server
    Serve(ServeCommand),

    /// Ask a single question
    Ask(AskCommand),

    /// Show passage store statistics
    Stats(StatsCommand),
}

#[tokio::main]
async fn main() -> AppResult<()> {
    // Parse command-line arguments first (needed for logging config)
    let cli = Cli::parse();

    // Defaults, config file, then environment
    let config = AppConfig::load(cli.config.as_deref())?;

    // Apply CLI overrides
    let bind = match &cli.command {
        Commands::Serve(cmd) => cmd.bind.clone(),
        _ => None,
    };
    let config = config.with_overrides(ConfigOverrides {
        bind,
        log_level: cli.log_level,
        log_format: cli.log_format,
        verbose: cli.verbose,
        no_color: cli.no_color,
    });

    // Initialize logging with final configuration
    logging::init_logging(
        config.logging.level.as_deref(),
        config.logging.no_color,
        config.logging.format,
    )?;

    // Log startup
    tracing::info!("docchat starting");
    tracing::debug!("Config file: {:?}", config.config_file);
    tracing::debug!("Embedding model: {}", config.embedding.model);
    tracing::debug!("Completion model: {}", config.completion.model);

    let command_name = match &cli.command {
        Commands::Serve(_) => "serve",
        Commands::Ask(_) => "ask",
        Commands::Stats(_) => "stats",
    };
    let _span = tracing::info_span!("command", name = command_name).entered();

    // Route to command handlers
    let result = match cli.command {
        Commands::Serve(cmd) => cmd.execute(&config).await,
        Commands::Ask(cmd) => cmd.execute(&config).await,
        Commands::Stats(cmd) => cmd.execute(&config).await,
    };

    // Log completion
    match &result {
        Ok(_) => tracing::info!("Command completed successfully"),
        Err(e) => tracing::error!("Command failed: {}", e),
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_serve_with_bind() {
        let cli = Cli::try_parse_from(["docchat", "serve", "--bind", "0.0.0.0:8080"]).unwrap();
        match cli.command {
            Commands::Serve(cmd) => assert_eq!(cmd.bind.as_deref(), Some("0.0.0.0:8080")),
            other => panic!("Expected serve, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_ask_joins_words() {
        let cli =
            Cli::try_parse_from(["docchat", "--log-format", "json", "ask", "Do", "que", "trata?"])
                .unwrap();
        assert_eq!(cli.log_format, Some(LogFormat::Json));
        match cli.command {
            Commands::Ask(cmd) => assert_eq!(cmd.question.join(" "), "Do que trata?"),
            other => panic!("Expected ask, got {:?}", other),
        }
    }

    #[test]
    fn test_ask_requires_question() {
        assert!(Cli::try_parse_from(["docchat", "ask"]).is_err());
    }
}
