//! Classify command - run the field rules over already-recognized text.

use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

use clap::Args;
use tracing::info;

use bizcard_core::BizcardConfig;

use super::extract::emit;
use super::output::OutputFormat;
use super::records::SaveTarget;

/// Arguments for the classify command.
#[derive(Args)]
pub struct ClassifyArgs {
    /// Text fragments in reading order (the first two are name and designation)
    #[arg(required_unless_present = "file", allow_hyphen_values = true)]
    tokens: Vec<String>,

    /// Read fragments from a file, one per line ("-" for stdin)
    #[arg(long, conflicts_with = "tokens")]
    file: Option<PathBuf>,

    /// Output file (default: stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "json")]
    format: OutputFormat,

    /// Do not save the record to the database
    #[arg(long)]
    no_save: bool,

    /// Print which rule claimed each token
    #[arg(long)]
    explain: bool,
}

pub fn run(args: ClassifyArgs, config: &BizcardConfig) -> anyhow::Result<()> {
    let tokens = match &args.file {
        Some(path) => read_tokens(path)?,
        None => args.tokens.clone(),
    };
    info!("Classifying {} tokens", tokens.len());

    let target = SaveTarget::resolve(config, args.no_save);
    let mut extraction = target.pipeline().run_tokens(tokens)?;
    target.annotate(&mut extraction);

    emit(&extraction, args.format, args.output.as_deref(), args.explain)
}

fn read_tokens(path: &Path) -> anyhow::Result<Vec<String>> {
    let text = if path.as_os_str() == "-" {
        let mut buf = String::new();
        io::stdin().read_to_string(&mut buf)?;
        buf
    } else {
        fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("Cannot read {}: {}", path.display(), e))?
    };
    Ok(split_lines(&text))
}

/// One token per line; blank lines are dropped.
fn split_lines(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(String::from)
        .collect()
}
