//! PrismDB Window - Partitioned ranking window functions
//!
//! Evaluates `row_number`, `rank`, `dense_rank`, `percent_rank` and
//! `cume_dist` over a row sequence: rows are hash-partitioned on the
//! partition key, each partition is stably ordered on the order key, peer
//! groups of equal order-key values are detected, and every requested
//! function is computed in a single pass over each partition. Results are
//! appended to the input rows as new columns.
//!
pub mod common;
pub mod execution;
pub mod expression;
pub mod extensions;
pub mod source;
pub mod types;

// Re-export common types for convenience
pub use common::{Result, WindowError, WindowResult};

// Re-export type system for convenience
pub use types::{ColumnDefinition, LogicalType, Row, Schema, Value};

// Re-export expression system for convenience
pub use expression::{EvaluatorState, WindowExpression, WindowFunctionType, WindowSpec};

// Re-export execution engine for convenience
pub use execution::{
    evaluate_window_functions, CancellationToken, ExecutionContext, ExecutionStats,
    PartitionBatch, PartitionOrder, WindowConfig, WindowOperator, WindowOutput, WindowRowStream,
    WindowStream,
};

// Re-export sources for convenience
pub use extensions::CsvReader;
pub use source::{BoxedRowSource, MaterializedRows, RowSource};
