//! Output formatters for fetched records.

use clap::ValueEnum;
use comfy_table::{Cell, Table};
use shapemap_core::{format_uuid, Record, ShapeHandle, Value};

/// Output format for results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// ASCII table format
    Table,
    /// JSON format
    Json,
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Table => write!(f, "table"),
            OutputFormat::Json => write!(f, "json"),
        }
    }
}

/// Trait for formatting output.
pub trait Formatter {
    /// Format the records of one shape under a title.
    fn format_records(&self, title: &str, shape: &ShapeHandle, records: &[Record]) -> String;

    /// Format a simple message.
    fn format_message(&self, message: &str) -> String;
}

/// Create a formatter for the given output format.
pub fn create_formatter(format: OutputFormat) -> Box<dyn Formatter> {
    match format {
        OutputFormat::Table => Box::new(TableFormatter),
        OutputFormat::Json => Box::new(JsonFormatter),
    }
}

/// Table formatter using comfy-table.
pub struct TableFormatter;

impl Formatter for TableFormatter {
    fn format_records(&self, title: &str, shape: &ShapeHandle, records: &[Record]) -> String {
        let mut table = Table::new();

        let mut headers: Vec<Cell> = vec![Cell::new("key")];
        headers.extend(shape.field_names().map(Cell::new));
        table.set_header(headers);

        for record in records {
            let key = record
                .physical_key()
                .map(|k| k.to_string())
                .unwrap_or_default();
            let mut cells: Vec<Cell> = vec![Cell::new(key)];
            for (_, value) in record.fields() {
                cells.push(Cell::new(value.to_string()));
            }
            table.add_row(cells);
        }

        format!("{}\n{}\n{} row(s)", title, table, records.len())
    }

    fn format_message(&self, message: &str) -> String {
        message.to_string()
    }
}

/// JSON formatter.
pub struct JsonFormatter;

impl Formatter for JsonFormatter {
    fn format_records(&self, title: &str, _shape: &ShapeHandle, records: &[Record]) -> String {
        let rows: Vec<serde_json::Value> = records.iter().map(record_to_json).collect();
        let output = serde_json::json!({
            "title": title,
            "rows": rows,
        });
        serde_json::to_string_pretty(&output).unwrap_or_else(|_| "{}".to_string())
    }

    fn format_message(&self, message: &str) -> String {
        serde_json::json!({
            "message": message
        })
        .to_string()
    }
}

/// Convert a record to a JSON object.
fn record_to_json(record: &Record) -> serde_json::Value {
    let mut obj = serde_json::Map::new();
    if let Some(key) = record.physical_key() {
        obj.insert("key".to_string(), serde_json::Value::Number(key.into()));
    }
    for (name, value) in record.fields() {
        obj.insert(name.to_string(), value_to_json(value));
    }
    serde_json::Value::Object(obj)
}

/// Convert a Value to JSON.
fn value_to_json(value: &Value) -> serde_json::Value {
    match value {
        Value::Int(i) => serde_json::Value::Number((*i).into()),
        Value::Uuid(bytes) => serde_json::Value::String(format_uuid(bytes)),
        Value::String(s) => serde_json::Value::String(s.clone()),
        Value::Bool(b) => serde_json::Value::Bool(*b),
    }
}
