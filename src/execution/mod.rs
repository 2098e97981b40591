//! Execution engine module
//!
//! Runs window operators over row sources:
//! - partitioner: hash partitioning on the partition key
//! - orderer: stable per-partition sort on the order key
//! - peer_groups: runs of equal order-key values
//! - output: appending ranking columns and collecting results
//! - parallel: rayon pool for independent partitions
//! - window_operator: the operator, its lazy stream and multi-clause chaining

pub mod context;
pub mod orderer;
pub mod output;
pub mod parallel;
pub mod partitioner;
pub mod peer_groups;
pub mod window_operator;

pub use context::{CancellationToken, ExecutionContext, PartitionOrder, WindowConfig};
pub use output::{ExecutionStats, PartitionBatch, WindowOutput};
pub use parallel::ParallelContext;
pub use partitioner::{Partition, PartitionKey, Partitioner};
pub use window_operator::{
    evaluate_window_functions, WindowOperator, WindowRowStream, WindowStream,
};
