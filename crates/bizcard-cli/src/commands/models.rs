//! Models command - download and manage OCR models.

use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use clap::{Args, Subcommand};
use console::style;
use futures_util::StreamExt;
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};

use bizcard_core::models::config::ModelConfig;
use bizcard_core::{BizcardConfig, CardOcrEngine};

/// Arguments for the models command.
#[derive(Args)]
pub struct ModelsArgs {
    #[command(subcommand)]
    command: ModelsCommand,
}

#[derive(Subcommand)]
enum ModelsCommand {
    /// Check which model files are present
    Status,

    /// Download models
    Download(DownloadArgs),

    /// Remove downloaded models
    Clean,
}

#[derive(Args)]
struct DownloadArgs {
    /// Output directory
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Force re-download even if files exist
    #[arg(long)]
    force: bool,

    /// Download from this base URL instead of the configured one
    #[arg(long)]
    base_url: Option<String>,
}

/// Directory the OCR models are read from.
pub fn model_dir(config: &BizcardConfig) -> PathBuf {
    config.models.model_dir.clone().unwrap_or_else(|| {
        dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("bizcard")
            .join("models")
    })
}

/// Load the OCR engine, pointing at `models download` when files are missing.
pub fn load_engine(config: &BizcardConfig, dir: Option<&Path>) -> anyhow::Result<CardOcrEngine> {
    let dir = dir.map(Path::to_path_buf).unwrap_or_else(|| model_dir(config));

    if missing_files(&config.models, &dir).next().is_some() {
        anyhow::bail!(
            "OCR models not found at {}.\n\n\
             Run 'bizcard models download' to download them.",
            dir.display()
        );
    }

    CardOcrEngine::from_dir(&dir, &config.models, config.ocr.clone())
        .map_err(|e| anyhow::anyhow!("Failed to load OCR models: {}", e))
}

fn missing_files<'a>(models: &'a ModelConfig, dir: &'a Path) -> impl Iterator<Item = &'a str> + 'a {
    models
        .files()
        .into_iter()
        .filter(move |file| !dir.join(file).exists())
}

pub async fn run(args: ModelsArgs, config: &BizcardConfig) -> anyhow::Result<()> {
    match args.command {
        ModelsCommand::Status => check_status(config, &model_dir(config)),
        ModelsCommand::Download(download_args) => download_models(download_args, config).await,
        ModelsCommand::Clean => clean_models(config),
    }
}

/// Whether every model file is present in the configured directory.
pub fn models_ready(config: &BizcardConfig) -> bool {
    missing_files(&config.models, &model_dir(config)).next().is_none()
}

async fn download_models(args: DownloadArgs, config: &BizcardConfig) -> anyhow::Result<()> {
    let output_dir = args.output.unwrap_or_else(|| model_dir(config));
    fs::create_dir_all(&output_dir)?;

    let base_url = args
        .base_url
        .as_deref()
        .unwrap_or(&config.models.download_base_url)
        .trim_end_matches('/')
        .to_string();

    println!(
        "{} Downloading OCR models to {}",
        style("ℹ").blue(),
        output_dir.display()
    );
    println!();

    let client = reqwest::Client::builder()
        .user_agent(concat!("bizcard-cli/", env!("CARGO_PKG_VERSION")))
        .timeout(std::time::Duration::from_secs(300))
        .build()?;

    let multi_progress = MultiProgress::new();
    let mut failed = Vec::new();

    for file in config.models.files() {
        let path = output_dir.join(file);

        if path.exists() && !args.force && fs::metadata(&path)?.len() > 0 {
            println!("  {} {} (already exists)", style("✓").green(), file);
            continue;
        }

        let pb = multi_progress.add(ProgressBar::new(0));
        pb.set_style(
            ProgressStyle::default_bar()
                .template("  {spinner:.green} {msg:<30} [{bar:25.cyan/blue}] {bytes}/{total_bytes}")?
                .progress_chars("=>-"),
        );
        pb.set_message(file.to_string());

        let url = format!("{}/{}", base_url, file);
        match download_file(&client, &url, &path, &pb).await {
            Ok(()) => pb.finish_with_message(format!("{} {}", style("✓").green(), file)),
            Err(e) => {
                pb.finish_with_message(format!("{} {} - {}", style("✗").red(), file, e));
                failed.push(file.to_string());
            }
        }
    }

    println!();

    if failed.is_empty() {
        println!("{} Models ready.", style("✓").green().bold());
        Ok(())
    } else {
        anyhow::bail!(
            "Failed to download {}. Retry with: bizcard models download --force",
            failed.join(", ")
        )
    }
}

async fn download_file(
    client: &reqwest::Client,
    url: &str,
    path: &Path,
    pb: &ProgressBar,
) -> anyhow::Result<()> {
    let response = client.get(url).send().await?;

    if !response.status().is_success() {
        anyhow::bail!("HTTP {}", response.status());
    }

    if let Some(content_length) = response.content_length() {
        pb.set_length(content_length);
    }

    // Download into a temp file so an interrupted transfer never looks complete
    let temp_path = path.with_extension("tmp");
    let mut file = File::create(&temp_path)?;

    let mut stream = response.bytes_stream();
    let mut downloaded: u64 = 0;

    while let Some(chunk) = stream.next().await {
        let chunk = chunk?;
        file.write_all(&chunk)?;
        downloaded += chunk.len() as u64;
        pb.set_position(downloaded);
    }

    file.flush()?;
    drop(file);

    fs::rename(&temp_path, path)?;

    Ok(())
}

fn check_status(config: &BizcardConfig, dir: &Path) -> anyhow::Result<()> {
    println!("{}", style("Model Status").bold());
    println!("Directory: {}", dir.display());
    println!();

    let mut all_present = true;
    for file in config.models.files() {
        let path = dir.join(file);
        if path.exists() {
            let size = fs::metadata(&path)?.len();
            println!("    {} {:<25} {:>10}", style("✓").green(), file, format_size(size));
        } else {
            all_present = false;
            println!("    {} {:<25} {:>10}", style("✗").red(), file, "missing");
        }
    }

    println!();
    if all_present {
        println!("{} Ready", style("✓").green());
    } else {
        println!(
            "{} Run 'bizcard models download' to download",
            style("⚠").yellow()
        );
    }

    Ok(())
}

fn clean_models(config: &BizcardConfig) -> anyhow::Result<()> {
    let dir = model_dir(config);

    let mut removed = 0;
    let mut freed: u64 = 0;

    for file in config.models.files() {
        let path = dir.join(file);
        if path.exists() {
            freed += fs::metadata(&path).map(|m| m.len()).unwrap_or(0);
            fs::remove_file(&path)?;
            removed += 1;
            println!("  {} Removed {}", style("✓").green(), file);
        }
    }

    // Leftovers from interrupted downloads
    if let Ok(entries) = fs::read_dir(&dir) {
        for entry in entries.flatten() {
            let path = entry.path();
            if path.extension().is_some_and(|e| e == "tmp") {
                let _ = fs::remove_file(&path);
            }
        }
    }

    if removed > 0 {
        println!();
        println!(
            "{} Removed {} files, freed {}",
            style("✓").green(),
            removed,
            format_size(freed)
        );
    } else {
        println!("{} No model files to remove.", style("ℹ").blue());
    }

    Ok(())
}

fn format_size(bytes: u64) -> String {
    if bytes >= 1_000_000 {
        format!("{:.1}MB", bytes as f64 / 1_000_000.0)
    } else if bytes >= 1_000 {
        format!("{:.1}KB", bytes as f64 / 1_000.0)
    } else {
        format!("{}B", bytes)
    }
}
