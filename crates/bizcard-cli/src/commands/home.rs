//! Home command - what the tool does and where its data lives.

use console::style;

use bizcard_core::{BizcardConfig, FieldName};

use super::models::{model_dir, models_ready};
use super::records::{database_path, stored_count};

pub fn run(config: &BizcardConfig) -> anyhow::Result<()> {
    println!("{}", style("Bizcard - business card data extraction").bold());
    println!();
    println!("Reads the text on a business card photo, sorts each fragment into a");
    println!("contact field and saves the result to a local SQLite database.");
    println!();

    println!("{}", style("Fields").bold());
    let labels: Vec<&str> = FieldName::ALL.iter().map(|f| f.label()).collect();
    println!("  {}", labels.join(", "));
    println!();

    let db = database_path(config);
    println!("{}", style("Database").bold());
    println!("  Path:    {}", db.display());
    match stored_count(&db) {
        Ok(Some(count)) => println!("  Entries: {}", count),
        Ok(None) => println!("  Entries: {}", style("not created yet").dim()),
        Err(e) => println!("  Entries: {} {}", style("unavailable:").red(), e),
    }
    println!();

    println!("{}", style("OCR models").bold());
    println!("  Path:    {}", model_dir(config).display());
    if models_ready(config) {
        println!("  Status:  {}", style("ready").green());
    } else {
        println!(
            "  Status:  {} (run 'bizcard models download')",
            style("missing").yellow()
        );
    }
    println!();

    println!("{}", style("Getting started").bold());
    println!("  bizcard extract card.jpg          read and save one card");
    println!("  bizcard classify NAME TITLE ...   classify text you already have");
    println!("  bizcard list                      show saved cards");

    Ok(())
}
