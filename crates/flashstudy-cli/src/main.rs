//! flashstudy CLI: the user-facing command-line interface.

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};
use flashstudy_core::Mode;

mod commands;

#[derive(Parser)]
#[command(name = "flashstudy", version, about = "Terminal flashcard trainer")]
struct Cli {
    /// Config file path
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start an interactive study session
    Study {
        /// Subject id to open directly
        #[arg(long)]
        subject: Option<String>,

        /// Mode to start in: flashcards, learn, test, match
        #[arg(long, requires = "subject")]
        mode: Option<Mode>,

        /// Keep progress in memory only
        #[arg(long)]
        ephemeral: bool,
    },

    /// List available subjects
    Subjects,

    /// Validate a dataset file or directory
    Validate {
        /// Dataset file or directory (defaults to the configured dataset)
        #[arg(long)]
        dataset: Option<PathBuf>,
    },

    /// Show saved progress
    Progress,

    /// Clear saved progress
    Reset,

    /// Create a starter config and example dataset
    Init,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("flashstudy=info")),
        )
        .init();

    let cli = Cli::parse();
    let config = cli.config;

    let result = match cli.command {
        Commands::Study {
            subject,
            mode,
            ephemeral,
        } => commands::study::execute(config, subject, mode, ephemeral).await,
        Commands::Subjects => commands::subjects::execute(config).await,
        Commands::Validate { dataset } => commands::validate::execute(dataset, config).await,
        Commands::Progress => commands::progress::execute(config).await,
        Commands::Reset => commands::reset::execute(config).await,
        Commands::Init => commands::init::execute(),
    };

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}
