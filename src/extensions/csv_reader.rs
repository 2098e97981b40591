//! CSV Reading Functionality
//!
//! Reads a headed CSV file into a row source, inferring one column type per
//! column from its non-empty fields: BIGINT, then DOUBLE, then BOOLEAN,
//! falling back to VARCHAR. Empty fields are NULL.

use crate::common::error::{Result, WindowError};
use crate::source::MaterializedRows;
use crate::types::{LogicalType, Row, Schema, Value};
use csv::{ReaderBuilder, StringRecord};
use std::io::Cursor;
use std::path::Path;
use tracing::debug;

/// CSV reader that auto-detects schema
pub struct CsvReader {
    data: Vec<u8>,
    delimiter: u8,
}

impl CsvReader {
    /// Create a new CSV reader from bytes
    pub fn new(data: Vec<u8>) -> Self {
        Self {
            data,
            delimiter: b',',
        }
    }

    /// Create a CSV reader over a file's contents
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        Ok(Self::new(std::fs::read(path)?))
    }

    pub fn with_delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = delimiter;
        self
    }

    fn reader(&self) -> csv::Reader<Cursor<&Vec<u8>>> {
        ReaderBuilder::new()
            .has_headers(true)
            .delimiter(self.delimiter)
            .from_reader(Cursor::new(&self.data))
    }

    /// Read the CSV into an in-memory row source
    pub fn read(&self) -> Result<MaterializedRows> {
        let mut csv_reader = self.reader();
        let header_names = read_headers(&mut csv_reader)?;
        let column_count = header_names.len();

        let mut records = Vec::new();
        for (line, result) in csv_reader.records().enumerate() {
            let record = result
                .map_err(|e| WindowError::Parse(format!("Failed to read CSV record: {}", e)))?;
            if record.len() != column_count {
                return Err(WindowError::Parse(format!(
                    "CSV record {} has {} fields, expected {}",
                    line + 1,
                    record.len(),
                    column_count
                )));
            }
            records.push(record);
        }

        let column_types: Vec<LogicalType> = (0..column_count)
            .map(|col| infer_column_type(records.iter().map(|r| &r[col])))
            .collect();
        let schema = Schema::from_pairs(header_names.into_iter().zip(column_types.iter().cloned()));
        debug!(rows = records.len(), schema = %schema, "read CSV input");

        let rows = records
            .iter()
            .map(|record| convert_record(record, &column_types))
            .collect::<Result<Vec<Row>>>()?;

        Ok(MaterializedRows::new(schema, rows))
    }

    /// Get column names from CSV header
    pub fn get_column_names(&self) -> Result<Vec<String>> {
        read_headers(&mut self.reader())
    }
}

fn read_headers<R: std::io::Read>(reader: &mut csv::Reader<R>) -> Result<Vec<String>> {
    let headers = reader
        .headers()
        .map_err(|e| WindowError::Parse(format!("Failed to read CSV headers: {}", e)))?;
    Ok(headers.iter().map(|h| h.trim().to_string()).collect())
}

fn parse_bool(field: &str) -> Option<bool> {
    match field.to_lowercase().as_str() {
        "true" => Some(true),
        "false" => Some(false),
        _ => None,
    }
}

/// Narrowest type every non-empty field parses as
fn infer_column_type<'a>(fields: impl Iterator<Item = &'a str>) -> LogicalType {
    let mut all_integer = true;
    let mut all_double = true;
    let mut all_boolean = true;
    let mut saw_value = false;

    for field in fields.map(str::trim).filter(|f| !f.is_empty()) {
        saw_value = true;
        all_integer &= field.parse::<i64>().is_ok();
        all_double &= field.parse::<f64>().is_ok();
        all_boolean &= parse_bool(field).is_some();
        if !(all_integer || all_double || all_boolean) {
            break;
        }
    }

    match (saw_value, all_integer, all_double, all_boolean) {
        (false, ..) => LogicalType::Varchar,
        (true, true, _, _) => LogicalType::BigInt,
        (true, false, true, _) => LogicalType::Double,
        (true, false, false, true) => LogicalType::Boolean,
        _ => LogicalType::Varchar,
    }
}

fn convert_field(field: &str, logical_type: &LogicalType) -> Result<Value> {
    let trimmed = field.trim();
    if trimmed.is_empty() {
        return Ok(Value::Null);
    }
    let invalid = || {
        WindowError::InvalidValue(format!("'{}' is not a valid {}", trimmed, logical_type))
    };
    match logical_type {
        LogicalType::BigInt => trimmed.parse().map(Value::BigInt).map_err(|_| invalid()),
        LogicalType::Double => trimmed.parse().map(Value::Double).map_err(|_| invalid()),
        LogicalType::Boolean => parse_bool(trimmed).map(Value::Boolean).ok_or_else(invalid),
        _ => Ok(Value::Varchar(trimmed.to_string())),
    }
}

fn convert_record(record: &StringRecord, column_types: &[LogicalType]) -> Result<Row> {
    record
        .iter()
        .zip(column_types)
        .map(|(field, logical_type)| convert_field(field, logical_type))
        .collect()
}
