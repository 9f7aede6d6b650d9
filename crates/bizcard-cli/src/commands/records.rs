//! List and delete commands - manage saved cards.

use std::path::{Path, PathBuf};

use clap::Args;
use console::style;
use tracing::warn;

use bizcard_core::{
    BizcardConfig, CardExtraction, CardPipeline, RecordStore, SqliteStore, StoreError,
    StoreOutcome,
};

use super::output::{format_rows, write_output, ListFormat};

/// Arguments for the list command.
#[derive(Args)]
pub struct ListArgs {
    /// Output format
    #[arg(short, long, value_enum, default_value = "table")]
    format: ListFormat,

    /// Output file (default: stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,
}

/// Arguments for the delete command.
#[derive(Args)]
pub struct DeleteArgs {
    /// Id of the card to delete (see `bizcard list`)
    id: i64,
}

pub fn database_path(config: &BizcardConfig) -> PathBuf {
    config.store.database_path.clone().unwrap_or_else(|| {
        dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("bizcard")
            .join("extracted_info.db")
    })
}

pub fn open_store(config: &BizcardConfig) -> Result<SqliteStore, StoreError> {
    SqliteStore::open(&database_path(config))
}

/// Where extracted cards are saved.
///
/// A store that fails to open does not stop extraction; the record is still
/// shown and reported as not saved.
pub enum SaveTarget {
    Disabled,
    Open(SqliteStore),
    Unavailable(String),
}

impl SaveTarget {
    pub fn resolve(config: &BizcardConfig, no_save: bool) -> Self {
        if no_save {
            return SaveTarget::Disabled;
        }
        match open_store(config) {
            Ok(store) => SaveTarget::Open(store),
            Err(e) => {
                warn!("Record store unavailable: {}", e);
                SaveTarget::Unavailable(e.to_string())
            }
        }
    }

    pub fn pipeline(&self) -> CardPipeline<'_> {
        match self {
            SaveTarget::Open(store) => CardPipeline::new().with_store(store),
            _ => CardPipeline::new(),
        }
    }

    /// Replace "skipped" with the reason the store could not be used.
    pub fn annotate(&self, extraction: &mut CardExtraction) {
        if let SaveTarget::Unavailable(reason) = self {
            extraction.store = StoreOutcome::Unavailable(reason.clone());
        }
    }
}

fn open_for_management(config: &BizcardConfig) -> anyhow::Result<SqliteStore> {
    let path = database_path(config);
    SqliteStore::open(&path)
        .map_err(|e| anyhow::anyhow!("Cannot open database {}: {}", path.display(), e))
}

pub fn list(args: ListArgs, config: &BizcardConfig) -> anyhow::Result<()> {
    let store = open_for_management(config)?;
    let rows = store.list()?;

    if rows.is_empty() && matches!(args.format, ListFormat::Table) {
        eprintln!("{} No data available in the database.", style("ℹ").blue());
        return Ok(());
    }

    let content = format_rows(&rows, args.format)?;
    write_output(&content, args.output.as_deref())
}

pub fn delete(args: DeleteArgs, config: &BizcardConfig) -> anyhow::Result<()> {
    let store = open_for_management(config)?;

    let name = store.get(args.id)?.map(|row| row.record.name);
    store.delete_by_id(args.id)?;

    println!(
        "{} Deleted entry {} - {}",
        style("✓").green(),
        args.id,
        name.as_deref().unwrap_or("")
    );
    Ok(())
}

/// Row count for status displays; `None` when the database does not exist yet.
pub fn stored_count(path: &Path) -> Result<Option<usize>, StoreError> {
    if !path.exists() {
        return Ok(None);
    }
    SqliteStore::open(path)?.count().map(Some)
}
