//! Table serialization: CSV for payloads and files, JSON records for tools.

use crate::error::ExportError;
use crate::extractor::{Cell, Table};
use crate::model::Value;
use std::fmt;
use std::io::Write;
use std::str::FromStr;

/// Supported output formats
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExportFormat {
    #[default]
    Csv,
    Json,
}

impl ExportFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Csv => "csv",
            ExportFormat::Json => "json",
        }
    }
}

impl FromStr for ExportFormat {
    type Err = ExportError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "csv" => Ok(ExportFormat::Csv),
            "json" => Ok(ExportFormat::Json),
            other => Err(ExportError::UnsupportedFormat(other.to_string())),
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

/// Encode one record as a CSV line terminated by `\n`.
///
/// Fields containing the delimiter, quotes or line breaks are quoted.
pub fn encode_record<I, S>(fields: I) -> Result<String, ExportError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<[u8]>,
{
    let mut writer = csv::WriterBuilder::new()
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(Vec::new());
    writer.write_record(fields)?;
    let bytes = writer
        .into_inner()
        .map_err(|e| ExportError::Csv(csv::Error::from(e.into_error())))?;
    String::from_utf8(bytes).map_err(|e| ExportError::InvalidUtf8(e.to_string()))
}

/// The header line shared by every payload built from `table`
pub fn header_line(table: &Table) -> Result<String, ExportError> {
    encode_record(table.columns())
}

pub fn row_line(cells: &[Cell]) -> Result<String, ExportError> {
    encode_record(cells.iter().map(Cell::render))
}

/// Write the whole table as CSV
pub fn write_csv<W: Write>(table: &Table, out: W) -> Result<(), ExportError> {
    let mut writer = csv::WriterBuilder::new()
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(out);
    writer.write_record(table.columns())?;
    for row in table.rows() {
        writer.write_record(row.iter().map(Cell::render))?;
    }
    writer.flush().map_err(csv::Error::from)?;
    Ok(())
}

pub fn to_csv(table: &Table) -> Result<String, ExportError> {
    let mut buf = Vec::new();
    write_csv(table, &mut buf)?;
    String::from_utf8(buf).map_err(|e| ExportError::InvalidUtf8(e.to_string()))
}

fn json_value(cell: &Cell) -> serde_json::Value {
    match cell.value() {
        None => serde_json::Value::Null,
        Some(Value::Bool(b)) => serde_json::Value::Bool(*b),
        Some(Value::Integer(v)) => serde_json::Value::from(*v),
        Some(Value::Real(v)) => serde_json::Number::from_f64(*v)
            .map(serde_json::Value::Number)
            .unwrap_or_else(|| serde_json::Value::String(v.to_string())),
        Some(Value::Text(s)) => serde_json::Value::String(s.clone()),
    }
}

/// Table as an array of objects, one per row, keys in column order
pub fn to_json_value(table: &Table) -> serde_json::Value {
    let records = table
        .rows()
        .iter()
        .map(|row| {
            let object: serde_json::Map<String, serde_json::Value> = table
                .columns()
                .iter()
                .zip(row)
                .map(|(column, cell)| (column.clone(), json_value(cell)))
                .collect();
            serde_json::Value::Object(object)
        })
        .collect();
    serde_json::Value::Array(records)
}

pub fn to_json(table: &Table) -> Result<String, ExportError> {
    Ok(serde_json::to_string_pretty(&to_json_value(table))?)
}

/// Render the table in `format`
pub fn export(table: &Table, format: ExportFormat) -> Result<String, ExportError> {
    match format {
        ExportFormat::Csv => to_csv(table),
        ExportFormat::Json => to_json(table),
    }
}
