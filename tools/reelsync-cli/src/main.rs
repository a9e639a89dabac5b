//! Reelsync CLI: effects, filter graphs and session replay.
//!
//! Usage:
//!   reelsync effects                   List the effect catalog
//!   reelsync graph <EFFECT>            Print the ffmpeg filter graph of an effect
//!   reelsync apply <INPUT> -e <EFFECT> Render a filtered copy with ffmpeg
//!   reelsync simulate <SCRIPT>         Replay an editing session script
//!   reelsync check                     Check external tools and configuration

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use reelsync_common::config::AppConfig;

mod commands;

use commands::simulate::ExecutorKind;

#[derive(Parser)]
#[command(
    name = "reelsync",
    about = "Trim, sync, overlay and filter short videos",
    version,
    author
)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List available effects
    Effects,

    /// Print the filter graph for an effect
    Graph {
        /// Effect name (case-insensitive)
        effect: String,

        /// Print the transform description as JSON instead
        #[arg(long)]
        json: bool,
    },

    /// Render a filtered copy of a video
    Apply {
        /// Input video
        input: PathBuf,

        /// Effect name (case-insensitive)
        #[arg(short, long)]
        effect: String,

        /// Output file (defaults to the render cache directory)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Replay a JSON session script and print what the engine emits
    Simulate {
        /// Path to the script
        script: PathBuf,

        /// Transform executor used for filter jobs
        #[arg(long, value_enum, default_value = "instant")]
        executor: ExecutorKind,

        /// Deliver job results this many events after submission
        #[arg(long, default_value = "0")]
        job_latency: usize,

        /// Print the final session snapshot as JSON
        #[arg(long)]
        json: bool,
    },

    /// Check external tools and configuration
    Check,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let (config, config_error) = match AppConfig::try_load() {
        Ok(config) => (config, None),
        Err(e) => (AppConfig::default(), Some(e)),
    };

    // Initialize logging
    let mut logging = config.logging.clone();
    if cli.verbose {
        logging.level = "debug".to_string();
    }
    reelsync_common::logging::init_logging(&logging);

    if let Some(e) = config_error {
        tracing::warn!(error = %e, "Using default configuration");
    }

    match cli.command {
        Commands::Effects => commands::effects::run(),
        Commands::Graph { effect, json } => commands::graph::run(&effect, json),
        Commands::Apply {
            input,
            effect,
            output,
        } => commands::apply::run(&config, input, &effect, output).await,
        Commands::Simulate {
            script,
            executor,
            job_latency,
            json,
        } => commands::simulate::run(config, script, executor, job_latency, json).await,
        Commands::Check => commands::check::run(&config).await,
    }
}
