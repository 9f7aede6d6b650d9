//! Batch command - extract many business cards in one run.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use clap::Args;
use console::style;
use glob::glob;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{debug, error, warn};

use bizcard_core::{
    open_image, BizcardConfig, CardExtraction, CardOcrEngine, CardPipeline, FieldName,
};

use super::extract::is_image;
use super::models::load_engine;
use super::output::{format_record, store_status, OutputFormat};
use super::records::SaveTarget;

/// Arguments for the batch command.
#[derive(Args)]
pub struct BatchArgs {
    /// Input glob pattern, e.g. "cards/*.jpg"
    #[arg(required = true)]
    input: String,

    /// Write one output file per card into this directory
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Output format for each card
    #[arg(short, long, value_enum, default_value = "json")]
    format: OutputFormat,

    /// Also write summary.csv
    #[arg(long)]
    summary: bool,

    /// Continue on error
    #[arg(long)]
    continue_on_error: bool,

    /// Model directory
    #[arg(short, long)]
    model_dir: Option<PathBuf>,

    /// Do not save records to the database
    #[arg(long)]
    no_save: bool,
}

/// Result of processing a single card.
struct CardResult {
    path: PathBuf,
    extraction: Option<CardExtraction>,
    error: Option<String>,
    processing_time_ms: u64,
}

pub fn run(args: BatchArgs, config: &BizcardConfig) -> anyhow::Result<()> {
    let start = Instant::now();

    let files: Vec<PathBuf> = glob(&args.input)?
        .filter_map(|r| r.ok())
        .filter(|p| is_image(p))
        .collect();

    if files.is_empty() {
        anyhow::bail!("No matching images found for pattern: {}", args.input);
    }

    eprintln!(
        "{} Found {} cards to process",
        style("ℹ").blue(),
        files.len()
    );

    if let Some(ref output_dir) = args.output_dir {
        fs::create_dir_all(output_dir)?;
    }

    let engine = load_engine(config, args.model_dir.as_deref())?;
    let target = SaveTarget::resolve(config, args.no_save);
    let pipeline = target.pipeline();

    let pb = ProgressBar::new(files.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} cards")?
            .progress_chars("=>-"),
    );

    let mut results = Vec::with_capacity(files.len());

    for path in files {
        let file_start = Instant::now();
        let result = process_card(&path, &engine, &pipeline);
        let processing_time_ms = file_start.elapsed().as_millis() as u64;

        match result {
            Ok(mut extraction) => {
                target.annotate(&mut extraction);
                if let Some(ref output_dir) = args.output_dir {
                    write_card(output_dir, &path, &extraction, args.format)?;
                }
                results.push(CardResult {
                    path,
                    extraction: Some(extraction),
                    error: None,
                    processing_time_ms,
                });
            }
            Err(e) => {
                let error_msg = e.to_string();
                if args.continue_on_error {
                    warn!("Failed to process {}: {}", path.display(), error_msg);
                    results.push(CardResult {
                        path,
                        extraction: None,
                        error: Some(error_msg),
                        processing_time_ms,
                    });
                } else {
                    pb.abandon();
                    error!("Failed to process {}: {}", path.display(), error_msg);
                    anyhow::bail!("Processing failed for {}: {}", path.display(), error_msg);
                }
            }
        }

        pb.inc(1);
    }

    pb.finish_and_clear();

    if args.summary {
        let summary_path = args
            .output_dir
            .as_ref()
            .map(|d| d.join("summary.csv"))
            .unwrap_or_else(|| PathBuf::from("summary.csv"));

        write_summary(&summary_path, &results)?;
        eprintln!(
            "{} Summary written to {}",
            style("✓").green(),
            summary_path.display()
        );
    }

    let failed = results.iter().filter(|r| r.error.is_some()).count();
    let saved = results
        .iter()
        .filter_map(|r| r.extraction.as_ref())
        .filter(|e| matches!(e.store, bizcard_core::StoreOutcome::Inserted(_)))
        .count();

    eprintln!();
    eprintln!(
        "{} Processed {} cards in {:?}",
        style("✓").green(),
        results.len(),
        start.elapsed()
    );
    eprintln!("  Saved:  {}", style(saved).green());
    if failed > 0 {
        eprintln!("  Failed: {}", style(failed).red());
        for result in results.iter().filter(|r| r.error.is_some()) {
            eprintln!(
                "    {} {}: {}",
                style("✗").red(),
                result.path.display(),
                result.error.as_deref().unwrap_or("")
            );
        }
    }

    Ok(())
}

fn process_card(
    path: &Path,
    engine: &CardOcrEngine,
    pipeline: &CardPipeline<'_>,
) -> anyhow::Result<CardExtraction> {
    let image = open_image(path)?;
    debug!("{}: {}x{}", path.display(), image.width(), image.height());
    Ok(pipeline.run(engine, &image)?)
}

fn write_card(
    output_dir: &Path,
    input: &Path,
    extraction: &CardExtraction,
    format: OutputFormat,
) -> anyhow::Result<()> {
    let stem = input
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("card");
    let output_path = output_dir.join(format!("{}.{}", stem, format.extension()));

    let content = format_record(&extraction.classification.record, format)?;
    fs::write(&output_path, content)?;
    debug!("Wrote output to {}", output_path.display());
    Ok(())
}

fn write_summary(path: &Path, results: &[CardResult]) -> anyhow::Result<()> {
    let mut wtr = csv::Writer::from_path(path)?;

    let mut header = vec!["filename", "status", "store"];
    header.extend(FieldName::ALL.map(FieldName::column));
    header.extend(["processing_time_ms", "error"]);
    wtr.write_record(&header)?;

    for result in results {
        let filename = result
            .path
            .file_name()
            .and_then(|s| s.to_str())
            .unwrap_or("");

        let mut row: Vec<String> = vec![filename.to_string()];
        match &result.extraction {
            Some(extraction) => {
                row.push("success".to_string());
                row.push(store_status(&extraction.store));
                row.extend(
                    extraction
                        .classification
                        .record
                        .fields()
                        .map(|(_, value)| value.to_string()),
                );
            }
            None => {
                row.push("failed".to_string());
                row.push(String::new());
                row.extend(FieldName::ALL.iter().map(|_| String::new()));
            }
        }
        row.push(result.processing_time_ms.to_string());
        row.push(result.error.clone().unwrap_or_default());

        wtr.write_record(&row)?;
    }

    wtr.flush()?;
    Ok(())
}
