//! Rendering of facade results for the terminal.

use std::collections::BTreeSet;

use clap::ValueEnum;
use tabled::builder::Builder;
use tabled::settings::Style;
use tabled::{Table, Tabled};

use crate::cli::error::CliResult;
use crate::db::{Record, Scalar};

/// Output format for records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Json,
    Table,
}

#[derive(Tabled)]
struct FieldRow {
    #[tabled(rename = "Field")]
    name: String,
    #[tabled(rename = "Value")]
    value: String,
}

/// Apply consistent table styling
pub fn apply_table_style(table: &mut Table) {
    table.with(Style::rounded());
}

fn cell(value: Option<&Scalar>) -> String {
    match value {
        None | Some(Scalar::Null) => "-".to_string(),
        Some(value) => value.to_string(),
    }
}

/// Render one record. An empty record means nothing was created or matched.
pub fn render_record(record: &Record, format: OutputFormat) -> CliResult<String> {
    match format {
        OutputFormat::Json => Ok(serde_json::to_string_pretty(record)?),
        OutputFormat::Table if record.is_empty() => Ok("No record.".to_string()),
        OutputFormat::Table => {
            let rows = record.iter().map(|(name, value)| FieldRow {
                name: name.clone(),
                value: cell(Some(value)),
            });
            let mut table = Table::new(rows);
            apply_table_style(&mut table);
            Ok(table.to_string())
        }
    }
}

/// Render a list of records, one column per property seen in any of them.
pub fn render_records(records: &[Record], format: OutputFormat) -> CliResult<String> {
    match format {
        OutputFormat::Json => Ok(serde_json::to_string_pretty(records)?),
        OutputFormat::Table if records.is_empty() => Ok("No records found.".to_string()),
        OutputFormat::Table => {
            let columns: BTreeSet<&str> = records
                .iter()
                .flat_map(|r| r.keys().map(String::as_str))
                .collect();

            let mut builder = Builder::default();
            builder.push_record(columns.iter().copied());
            for record in records {
                builder.push_record(columns.iter().map(|c| cell(record.get(*c))));
            }

            let mut table = builder.build();
            apply_table_style(&mut table);
            Ok(table.to_string())
        }
    }
}
