//! Extract command - read, classify and save a single business card.

use std::path::{Path, PathBuf};
use std::time::Instant;

use clap::Args;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{debug, info};

use bizcard_core::{open_image, BizcardConfig, BizcardError, CardExtraction};

use super::models::load_engine;
use super::output::{format_explain, format_record, report_store, write_output, OutputFormat};
use super::records::SaveTarget;

pub(crate) const IMAGE_EXTENSIONS: [&str; 7] = ["png", "jpg", "jpeg", "bmp", "tif", "tiff", "webp"];

/// Arguments for the extract command.
#[derive(Args)]
pub struct ExtractArgs {
    /// Business card image
    #[arg(required = true)]
    input: PathBuf,

    /// Output file (default: stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "json")]
    format: OutputFormat,

    /// Model directory
    #[arg(short, long)]
    model_dir: Option<PathBuf>,

    /// Do not save the record to the database
    #[arg(long)]
    no_save: bool,

    /// Print which rule claimed each token
    #[arg(long)]
    explain: bool,
}

pub fn is_image(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| IMAGE_EXTENSIONS.contains(&e.to_lowercase().as_str()))
        .unwrap_or(false)
}

pub fn run(args: ExtractArgs, config: &BizcardConfig) -> anyhow::Result<()> {
    let start = Instant::now();

    if !args.input.exists() {
        anyhow::bail!("Input file not found: {}", args.input.display());
    }
    if !is_image(&args.input) {
        anyhow::bail!(
            "Unsupported file format: {} (expected one of {})",
            args.input.display(),
            IMAGE_EXTENSIONS.join(", ")
        );
    }

    info!("Processing card: {}", args.input.display());

    let pb = ProgressBar::new_spinner();
    pb.set_style(ProgressStyle::default_spinner().template("{spinner:.green} {msg}")?);
    pb.enable_steady_tick(std::time::Duration::from_millis(100));

    pb.set_message("Loading OCR models...");
    let engine = load_engine(config, args.model_dir.as_deref()).inspect_err(|_| pb.finish_and_clear())?;

    pb.set_message("Loading image...");
    let image = open_image(&args.input).inspect_err(|_| pb.finish_and_clear())?;
    debug!("Image size: {}x{}", image.width(), image.height());

    let target = SaveTarget::resolve(config, args.no_save);

    pb.set_message("Reading card...");
    let result = target.pipeline().run(&engine, &image);
    pb.finish_and_clear();

    let mut extraction = match result {
        Ok(extraction) => extraction,
        Err(BizcardError::Ocr(e)) if e.is_retryable() => {
            anyhow::bail!("Could not read the card: {}. Try again with a sharper photo.", e)
        }
        Err(e) => return Err(e.into()),
    };
    target.annotate(&mut extraction);

    emit(&extraction, args.format, args.output.as_deref(), args.explain)?;

    debug!("Total processing time: {:?}", start.elapsed());
    Ok(())
}

/// Print the record, then the store outcome and optional trace on stderr.
pub(crate) fn emit(
    extraction: &CardExtraction,
    format: OutputFormat,
    output: Option<&Path>,
    explain: bool,
) -> anyhow::Result<()> {
    let content = format_record(&extraction.classification.record, format)?;
    write_output(&content, output)?;

    report_store(&extraction.store);

    if explain {
        eprintln!();
        eprintln!("{}", style("Token assignments:").bold());
        eprint!("{}", format_explain(&extraction.classification));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_image() {
        assert!(is_image(Path::new("card.png")));
        assert!(is_image(Path::new("scans/CARD.JPG")));
        assert!(!is_image(Path::new("card.pdf")));
        assert!(!is_image(Path::new("card")));
    }
}
