//! CLI application for business card OCR extraction.

mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

use commands::{batch, classify, config, extract, home, models, records};

/// Business card OCR - Extract contact details from business card photos
#[derive(Parser)]
#[command(name = "bizcard")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Path to config file
    #[arg(short, long, global = true)]
    config: Option<String>,

    /// Path to the SQLite database (overrides the config file)
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show what bizcard does and where it keeps its data
    Home,

    /// Extract and save the details of one business card image
    Extract(extract::ExtractArgs),

    /// Classify already-recognized text without running OCR
    Classify(classify::ClassifyArgs),

    /// Extract many business card images
    Batch(batch::BatchArgs),

    /// List saved cards
    List(records::ListArgs),

    /// Delete a saved card by id
    Delete(records::DeleteArgs),

    /// Manage OCR models
    Models(models::ModelsArgs),

    /// Manage configuration
    Config(config::ConfigArgs),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Set up logging based on verbosity
    let level = match cli.verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    let settings = || config::load(cli.config.as_deref(), cli.db.clone());

    // Execute command
    match cli.command {
        Commands::Home => home::run(&settings()?),
        Commands::Extract(args) => extract::run(args, &settings()?),
        Commands::Classify(args) => classify::run(args, &settings()?),
        Commands::Batch(args) => batch::run(args, &settings()?),
        Commands::List(args) => records::list(args, &settings()?),
        Commands::Delete(args) => records::delete(args, &settings()?),
        Commands::Models(args) => models::run(args, &settings()?).await,
        Commands::Config(args) => config::run(args, cli.config.as_deref()),
    }
}
