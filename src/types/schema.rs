//! Row schemas
//!
//! A schema is the fixed, ordered list of named and typed columns shared by
//! every row of a row sequence.

use crate::common::error::{Result, WindowError};
use crate::types::{LogicalType, Value};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A row is an ordered tuple of typed fields; its identity is its input position
pub type Row = Vec<Value>;

/// Column definition
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnDefinition {
    pub name: String,
    pub logical_type: LogicalType,
}

impl ColumnDefinition {
    pub fn new(name: impl Into<String>, logical_type: LogicalType) -> Self {
        Self {
            name: name.into(),
            logical_type,
        }
    }
}

/// Ordered list of columns
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Schema {
    columns: Vec<ColumnDefinition>,
}

impl Schema {
    pub fn new(columns: Vec<ColumnDefinition>) -> Self {
        Self { columns }
    }

    /// Build a schema from `(name, type)` pairs
    pub fn from_pairs<S: Into<String>>(pairs: impl IntoIterator<Item = (S, LogicalType)>) -> Self {
        Self {
            columns: pairs
                .into_iter()
                .map(|(name, logical_type)| ColumnDefinition::new(name, logical_type))
                .collect(),
        }
    }

    pub fn columns(&self) -> &[ColumnDefinition] {
        &self.columns
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn column(&self, index: usize) -> Result<&ColumnDefinition> {
        self.columns.get(index).ok_or_else(|| {
            WindowError::ColumnNotFound(format!(
                "column index {} out of range for schema with {} columns",
                index,
                self.columns.len()
            ))
        })
    }

    /// Resolve a column name (case-insensitive) to its index
    pub fn index_of(&self, name: &str) -> Result<usize> {
        self.columns
            .iter()
            .position(|column| column.name.eq_ignore_ascii_case(name))
            .ok_or_else(|| WindowError::ColumnNotFound(name.to_string()))
    }

    pub fn column_names(&self) -> Vec<String> {
        self.columns.iter().map(|c| c.name.clone()).collect()
    }

    /// Schema extended with trailing columns
    pub fn extended(&self, extra: impl IntoIterator<Item = ColumnDefinition>) -> Schema {
        let mut columns = self.columns.clone();
        columns.extend(extra);
        Schema { columns }
    }

    /// Schema extended with trailing columns, renaming any whose name is
    /// already taken to `name_N` with the smallest free `N`
    pub fn extended_unique(&self, extra: impl IntoIterator<Item = ColumnDefinition>) -> Schema {
        let mut schema = self.clone();
        for column in extra {
            let name = schema.unique_name(&column.name);
            schema.columns.push(ColumnDefinition::new(name, column.logical_type));
        }
        schema
    }

    fn unique_name(&self, name: &str) -> String {
        if self.index_of(name).is_err() {
            return name.to_string();
        }
        (1..)
            .map(|n| format!("{}_{}", name, n))
            .find(|candidate| self.index_of(candidate).is_err())
            .unwrap_or_else(|| name.to_string())
    }

    /// Check that a row has the right arity for this schema
    pub fn check_row(&self, row: &[Value]) -> Result<()> {
        if row.len() != self.columns.len() {
            return Err(WindowError::InvalidArgument(format!(
                "row has {} fields but schema has {} columns",
                row.len(),
                self.columns.len()
            )));
        }
        Ok(())
    }
}

impl fmt::Display for Schema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(")?;
        for (i, column) in self.columns.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{} {}", column.name, column.logical_type)?;
        }
        write!(f, ")")
    }
}
