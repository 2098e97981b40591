//! Type system module
//!
//! This module contains the core type system components:
//! - LogicalType: SQL-level type abstractions and key capabilities
//! - Value: Single value containers with ordering and grouping identity
//! - Schema: Named, typed column lists shared by a row sequence

pub mod logical_type;
pub mod schema;
pub mod value;

// Re-export main types for convenience
pub use logical_type::LogicalType;
pub use schema::{ColumnDefinition, Row, Schema};
pub use value::Value;

/// Type system utilities
pub mod utils {
    use super::*;
    use crate::common::constants::ROW_OVERHEAD_BYTES;

    /// Estimate the bytes needed to hold a row in a materialized partition
    pub fn estimate_row_size(row: &[Value]) -> usize {
        ROW_OVERHEAD_BYTES + row.iter().map(|v| v.estimated_size()).sum::<usize>()
    }
}
