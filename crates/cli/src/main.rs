//! DocIA CLI — the main entry point.
//!
//! Commands:
//! - `serve`   — Start the HTTP gateway
//! - `ask`     — Answer one question with the retrieval-augmented pipeline
//! - `chat`    — Answer one message with the keyword fallback
//! - `doctor`  — Diagnose the installation
//! - `config`  — Print or validate configuration

use clap::{Parser, Subcommand};
use docia_core::Language;

mod commands;

#[derive(Parser)]
#[command(
    name = "docia",
    about = "DocIA — medical question-answering assistant",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit logs as JSON lines
    #[arg(long, global = true, env = "DOCIA_LOG_JSON")]
    log_json: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP gateway server
    Serve {
        /// Override the port
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Ask a medical question
    Ask {
        /// The question
        text: String,

        /// Answer language (en or fr)
        #[arg(short, long)]
        language: Option<Language>,
    },

    /// Send a message to the keyword assistant (French diabetes topics)
    Chat {
        /// The message
        message: String,
    },

    /// Diagnose configuration, knowledge base and models
    Doctor,

    /// Print the default configuration
    Config {
        /// Load and validate the active configuration instead
        #[arg(long)]
        validate: bool,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize tracing
    let filter = if cli.verbose { "debug" } else { "info" };
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter));
    if cli.log_json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(env_filter)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_target(false)
            .init();
    }

    match cli.command {
        Commands::Serve { port } => commands::serve::run(port).await?,
        Commands::Ask { text, language } => commands::ask::run(text, language).await?,
        Commands::Chat { message } => commands::chat::run(message).await?,
        Commands::Doctor => commands::doctor::run().await?,
        Commands::Config { validate } => {
            if validate {
                commands::config_cmd::validate().await?
            } else {
                commands::config_cmd::show_default()
            }
        }
    }

    Ok(())
}
