//! Rendering of records, traces and store outcomes.

use std::fs;
use std::path::Path;

use console::style;

use bizcard_core::{Classification, ExtractionRecord, FieldName, PersistedRow, StoreOutcome};

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    /// JSON output
    Json,
    /// CSV output
    Csv,
    /// Plain text summary
    Text,
}

impl OutputFormat {
    pub fn extension(self) -> &'static str {
        match self {
            OutputFormat::Json => "json",
            OutputFormat::Csv => "csv",
            OutputFormat::Text => "txt",
        }
    }
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum ListFormat {
    /// Aligned table
    Table,
    /// JSON array
    Json,
    /// CSV with a header row
    Csv,
}

pub fn format_record(record: &ExtractionRecord, format: OutputFormat) -> anyhow::Result<String> {
    match format {
        OutputFormat::Json => Ok(serde_json::to_string_pretty(record)?),
        OutputFormat::Csv => format_csv(record),
        OutputFormat::Text => Ok(format_text(record)),
    }
}

fn format_csv(record: &ExtractionRecord) -> anyhow::Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record(FieldName::ALL.map(FieldName::column))?;
    wtr.write_record(record.fields().map(|(_, value)| value))?;
    Ok(String::from_utf8(wtr.into_inner()?)?)
}

fn format_text(record: &ExtractionRecord) -> String {
    let width = FieldName::ALL
        .iter()
        .map(|f| f.title().len())
        .max()
        .unwrap_or(0);

    let mut output = String::new();
    for (field, value) in record.fields() {
        output.push_str(&format!("{:<width$}  {}\n", field.title(), value, width = width));
    }
    output
}

/// Per-token trace: which rule claimed each token.
pub fn format_explain(classification: &Classification) -> String {
    let mut output = String::new();
    for a in &classification.assignments {
        let changed = if a.value != a.token {
            format!(" -> {:?}", a.value)
        } else {
            String::new()
        };
        output.push_str(&format!(
            "  [{:>2}] {:<14} {:<18} {:?}{}\n",
            a.index,
            a.field.label(),
            a.rule,
            a.token,
            changed
        ));
    }
    output
}

/// Write `content` to `path`, or stdout when no path is given.
pub fn write_output(content: &str, path: Option<&Path>) -> anyhow::Result<()> {
    match path {
        Some(path) => {
            fs::write(path, content)?;
            eprintln!(
                "{} Output written to {}",
                style("✓").green(),
                path.display()
            );
        }
        None => println!("{}", content.trim_end()),
    }
    Ok(())
}

/// Tell the user whether the record was saved.
pub fn report_store(outcome: &StoreOutcome) {
    match outcome {
        StoreOutcome::Inserted(id) => eprintln!(
            "{} Saved to database with id {}",
            style("✓").green(),
            style(id).cyan().bold()
        ),
        StoreOutcome::Duplicate => eprintln!(
            "{} Duplicate entry detected (same name and designation). Data not inserted.",
            style("⚠").yellow()
        ),
        StoreOutcome::Skipped => {}
        StoreOutcome::Unavailable(reason) => eprintln!(
            "{} Record not saved: {}",
            style("⚠").yellow(),
            reason
        ),
    }
}

pub fn store_status(outcome: &StoreOutcome) -> String {
    match outcome {
        StoreOutcome::Inserted(id) => format!("saved:{}", id),
        StoreOutcome::Duplicate => "duplicate".to_string(),
        StoreOutcome::Skipped => "not saved".to_string(),
        StoreOutcome::Unavailable(_) => "unavailable".to_string(),
    }
}

pub fn format_rows(rows: &[PersistedRow], format: ListFormat) -> anyhow::Result<String> {
    match format {
        ListFormat::Json => Ok(serde_json::to_string_pretty(rows)?),
        ListFormat::Csv => {
            let mut wtr = csv::Writer::from_writer(vec![]);
            let mut header = vec!["id"];
            header.extend(FieldName::ALL.map(FieldName::column));
            wtr.write_record(&header)?;
            for row in rows {
                let mut record = vec![row.id.to_string()];
                record.extend(row.record.fields().map(|(_, v)| v.to_string()));
                wtr.write_record(&record)?;
            }
            Ok(String::from_utf8(wtr.into_inner()?)?)
        }
        ListFormat::Table => Ok(format_table(rows)),
    }
}

fn format_table(rows: &[PersistedRow]) -> String {
    let mut headers = vec!["ID"];
    headers.extend(FieldName::ALL.map(FieldName::title));

    let cells: Vec<Vec<String>> = rows
        .iter()
        .map(|row| {
            let mut cells = vec![row.id.to_string()];
            cells.extend(row.record.fields().map(|(_, v)| v.to_string()));
            cells
        })
        .collect();

    let widths: Vec<usize> = headers
        .iter()
        .enumerate()
        .map(|(i, h)| {
            cells
                .iter()
                .map(|c| c[i].chars().count())
                .chain(std::iter::once(h.len()))
                .max()
                .unwrap_or(0)
        })
        .collect();

    let render = |values: Vec<String>| -> String {
        values
            .iter()
            .zip(&widths)
            .map(|(v, w)| format!("{:<w$}", v, w = *w))
            .collect::<Vec<_>>()
            .join("  ")
            .trim_end()
            .to_string()
    };

    let mut output = String::new();
    let header_line = render(headers.iter().map(|h| h.to_string()).collect());
    output.push_str(&format!("{}\n", style(header_line).bold()));
    for row in cells {
        output.push_str(&render(row));
        output.push('\n');
    }
    output
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record() -> ExtractionRecord {
        bizcard_core::classify(&["Jane Doe", "Manager", "Acme, Inc", "600001"]).unwrap()
    }

    #[test]
    fn test_csv_quotes_commas() {
        let csv = format_record(&record(), OutputFormat::Csv).unwrap();
        let mut lines = csv.lines();
        assert_eq!(
            lines.next().unwrap(),
            "name,designation,company_name,contact,email,website,address,city,pincode,state"
        );
        assert_eq!(
            lines.next().unwrap(),
            "Jane Doe,Manager,\"Acme, Inc\",,NA,NA,NA,NA,600001,NA"
        );
    }

    #[test]
    fn test_text_lists_every_field() {
        let text = format_record(&record(), OutputFormat::Text).unwrap();
        assert_eq!(text.lines().count(), 10);
        assert!(text.contains("Company Name  Acme, Inc"));
    }

    #[test]
    fn test_table_has_header_and_rows() {
        let rows = vec![PersistedRow { id: 3, record: record() }];
        let table = format_rows(&rows, ListFormat::Table).unwrap();
        assert_eq!(table.lines().count(), 2);
        assert!(table.lines().nth(1).unwrap().starts_with("3 "));
    }
}
