//! The `ecotutor` command-line interface.

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};

mod commands;
mod console;

#[derive(Parser)]
#[command(name = "ecotutor", version, about = "Console quiz tutor with small talk")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start a tutoring session
    Start {
        /// Question dataset (JSON array)
        #[arg(long)]
        dataset: Option<PathBuf>,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,

        /// Seed for question order and small-talk timing
        #[arg(long)]
        seed: Option<u64>,

        /// Chance of small talk before each question (0.0 to 1.0)
        #[arg(long)]
        small_talk_probability: Option<f64>,

        /// Never ask the dialogue model for small talk
        #[arg(long)]
        no_small_talk: bool,
    },

    /// Check a question dataset without starting a session
    Validate {
        /// Question dataset (JSON array)
        #[arg(long)]
        dataset: Option<PathBuf>,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// List models available to the configured dialogue backend
    Models {
        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Create a starter config and sample dataset
    Init,
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let mut filter = tracing_subscriber::EnvFilter::from_default_env();
    if let Ok(directive) = "ecotutor=warn".parse::<tracing_subscriber::filter::Directive>() {
        filter = filter.add_directive(directive);
    }
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Start {
            dataset,
            config,
            seed,
            small_talk_probability,
            no_small_talk,
        } => {
            commands::start::execute(
                dataset,
                config,
                seed,
                small_talk_probability,
                no_small_talk,
            )
            .await
        }
        Commands::Validate { dataset, config } => commands::validate::execute(dataset, config),
        Commands::Models { config } => commands::models::execute(config).await,
        Commands::Init => commands::init::execute(),
    };

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}
