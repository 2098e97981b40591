//! Output assembly
//!
//! Each output row is its input row with the ranking values appended, one
//! column per window function call. Rows keep the partition order the
//! orderer produced.

use crate::common::error::Result;
use crate::internal_err;
use crate::types::{Row, Schema, Value};

/// Append per-row function results to the ordered partition rows
pub fn assemble_partition<R: AsRef<[Value]>>(
    ordered_rows: &[R],
    results: Vec<Vec<Value>>,
) -> Result<Vec<Row>> {
    if ordered_rows.len() != results.len() {
        return Err(internal_err!(
            "{} result rows for a partition of {} rows",
            results.len(),
            ordered_rows.len()
        ));
    }

    Ok(ordered_rows
        .iter()
        .zip(results)
        .map(|(row, appended)| {
            let row = row.as_ref();
            let mut out = Vec::with_capacity(row.len() + appended.len());
            out.extend_from_slice(row);
            out.extend(appended);
            out
        })
        .collect())
}

/// The evaluated rows of one partition
#[derive(Debug, Clone, PartialEq)]
pub struct PartitionBatch {
    /// Position of the partition in emission order
    pub partition_id: usize,
    /// Partition-key values
    pub key: Vec<Value>,
    /// Output rows in partition order
    pub rows: Vec<Row>,
}

impl PartitionBatch {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Execution statistics
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExecutionStats {
    pub rows_processed: usize,
    pub partitions_evaluated: usize,
    pub execution_time_ms: u64,
}

/// Fully materialized result of a window evaluation
#[derive(Debug, Clone)]
pub struct WindowOutput {
    pub schema: Schema,
    pub rows: Vec<Row>,
    pub stats: ExecutionStats,
}

impl WindowOutput {
    /// Get the number of rows
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Get the number of columns
    pub fn column_count(&self) -> usize {
        self.schema.len()
    }

    /// Get a specific row
    pub fn get_row(&self, index: usize) -> Option<&[Value]> {
        self.rows.get(index).map(|row| row.as_slice())
    }

    /// Get a specific value
    pub fn get_value(&self, row: usize, col: usize) -> Option<&Value> {
        self.rows.get(row).and_then(|r| r.get(col))
    }

    /// All values of a named column, in row order
    pub fn column(&self, name: &str) -> Result<Vec<Value>> {
        let index = self.schema.index_of(name)?;
        Ok(self.rows.iter().map(|row| row[index].clone()).collect())
    }

    /// Convert to a table-like string representation
    pub fn to_table_string(&self) -> String {
        let header: Vec<String> = self.schema.column_names();
        let cells: Vec<Vec<String>> = self
            .rows
            .iter()
            .map(|row| row.iter().map(|v| v.to_string()).collect())
            .collect();

        let mut widths: Vec<usize> = header.iter().map(|h| h.len()).collect();
        for row in &cells {
            for (i, cell) in row.iter().enumerate() {
                if i < widths.len() {
                    widths[i] = widths[i].max(cell.len());
                }
            }
        }

        let render = |values: &[String]| -> String {
            values
                .iter()
                .zip(&widths)
                .map(|(v, w)| format!("{:<width$}", v, width = *w))
                .collect::<Vec<_>>()
                .join(" | ")
                .trim_end()
                .to_string()
        };

        let mut result = String::new();
        result.push_str(&render(&header));
        result.push('\n');
        result.push_str(
            &widths
                .iter()
                .map(|w| "-".repeat(*w))
                .collect::<Vec<_>>()
                .join("-+-"),
        );
        result.push('\n');
        if cells.is_empty() {
            result.push_str("(no rows)\n");
        }
        for row in &cells {
            result.push_str(&render(row));
            result.push('\n');
        }
        result
    }

    /// One JSON object per row, keyed by column name
    pub fn to_json_lines(&self) -> String {
        let names = self.schema.column_names();
        let mut result = String::new();
        for row in &self.rows {
            let object: serde_json::Map<String, serde_json::Value> = names
                .iter()
                .cloned()
                .zip(row.iter().map(|v| v.to_json()))
                .collect();
            result.push_str(&serde_json::Value::Object(object).to_string());
            result.push('\n');
        }
        result
    }
}
