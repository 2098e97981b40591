//! Constants used throughout the window engine

/// Row count above which partitions are evaluated on the rayon pool
pub const DEFAULT_PARALLEL_ROW_THRESHOLD: usize = 102400;

/// Fixed per-row bookkeeping charged against the partition memory ceiling
pub const ROW_OVERHEAD_BYTES: usize = 24;

/// Fixed per-value bookkeeping charged against the partition memory ceiling
pub const VALUE_OVERHEAD_BYTES: usize = 8;

/// Maximum threads for parallel partition evaluation
pub const MAX_THREADS: usize = 64;

/// Setting name for the per-partition memory ceiling
pub const SETTING_PARTITION_MEMORY_LIMIT: &str = "partition_memory_limit";

/// Setting name for the worker thread count
pub const SETTING_THREADS: &str = "threads";

/// Setting name for the parallel row threshold
pub const SETTING_PARALLEL_ROW_THRESHOLD: &str = "parallel_row_threshold";

/// Setting name for the partition emission order
pub const SETTING_PARTITION_ORDER: &str = "partition_order";
