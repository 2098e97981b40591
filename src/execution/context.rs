//! Execution Context
//!
//! Configuration, cancellation and worker resources shared by the window
//! operators of one evaluation.

use crate::common::constants::{
    DEFAULT_PARALLEL_ROW_THRESHOLD, MAX_THREADS, SETTING_PARALLEL_ROW_THRESHOLD,
    SETTING_PARTITION_MEMORY_LIMIT, SETTING_PARTITION_ORDER, SETTING_THREADS,
};
use crate::common::error::{Result, WindowError};
use crate::execution::parallel::ParallelContext;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, info};

/// Order in which partitions are emitted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PartitionOrder {
    /// Ascending partition key when every key column is totally ordered,
    /// first appearance otherwise
    KeyOrder,
    /// First appearance in the input
    FirstSeen,
}

impl FromStr for PartitionOrder {
    type Err = WindowError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "key_order" | "key" => Ok(PartitionOrder::KeyOrder),
            "first_seen" | "input" => Ok(PartitionOrder::FirstSeen),
            other => Err(WindowError::InvalidValue(format!(
                "unknown partition order '{}'",
                other
            ))),
        }
    }
}

impl fmt::Display for PartitionOrder {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            PartitionOrder::KeyOrder => write!(f, "key_order"),
            PartitionOrder::FirstSeen => write!(f, "first_seen"),
        }
    }
}

/// Window evaluation configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    /// Estimated bytes a single partition may hold (None for unlimited)
    pub partition_memory_limit: Option<usize>,
    /// Number of threads for parallel partition evaluation
    pub threads: usize,
    /// Minimum input rows before partitions are evaluated in parallel
    pub parallel_row_threshold: usize,
    /// Partition emission order
    pub partition_order: PartitionOrder,
}

impl Default for WindowConfig {
    fn default() -> Self {
        WindowConfig {
            partition_memory_limit: None,
            threads: num_cpus::get().clamp(1, MAX_THREADS),
            parallel_row_threshold: DEFAULT_PARALLEL_ROW_THRESHOLD,
            partition_order: PartitionOrder::KeyOrder,
        }
    }
}

impl WindowConfig {
    /// Single-threaded configuration
    pub fn sequential() -> Self {
        Self {
            threads: 1,
            ..Default::default()
        }
    }

    /// Parse a configuration from JSON; missing fields take their defaults
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: WindowConfig = serde_json::from_str(json)
            .map_err(|e| WindowError::Parse(format!("invalid window config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Load a configuration from a JSON file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let text = std::fs::read_to_string(path.as_ref())?;
        let config = Self::from_json_str(&text)?;
        info!(path = %path.as_ref().display(), "loaded window config");
        Ok(config)
    }

    pub fn to_json_string(&self) -> Result<String> {
        serde_json::to_string_pretty(self)
            .map_err(|e| WindowError::Internal(format!("config serialization failed: {}", e)))
    }

    pub fn validate(&self) -> Result<()> {
        if self.threads == 0 || self.threads > MAX_THREADS {
            return Err(WindowError::InvalidValue(format!(
                "threads must be between 1 and {}, got {}",
                MAX_THREADS, self.threads
            )));
        }
        if self.partition_memory_limit == Some(0) {
            return Err(WindowError::InvalidValue(
                "partition_memory_limit must be positive".to_string(),
            ));
        }
        Ok(())
    }

    /// Apply a `SET key = value` style setting
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        let key = key.trim().to_lowercase();
        let value = value.trim().trim_matches('\'');
        let mut updated = self.clone();
        match key.as_str() {
            SETTING_PARTITION_MEMORY_LIMIT => {
                updated.partition_memory_limit = parse_memory_limit(value)?;
            }
            SETTING_THREADS => {
                updated.threads = parse_count(&key, value)?;
            }
            SETTING_PARALLEL_ROW_THRESHOLD => {
                updated.parallel_row_threshold = parse_count(&key, value)?;
            }
            SETTING_PARTITION_ORDER => {
                updated.partition_order = value.parse()?;
            }
            _ => {
                return Err(WindowError::InvalidArgument(format!(
                    "unknown setting '{}'",
                    key
                )))
            }
        }
        updated.validate()?;
        *self = updated;
        debug!(setting = %key, value, "SET");
        Ok(())
    }

    /// Current value of a setting
    pub fn get(&self, key: &str) -> Option<String> {
        match key.trim().to_lowercase().as_str() {
            SETTING_PARTITION_MEMORY_LIMIT => Some(
                self.partition_memory_limit
                    .map(|limit| limit.to_string())
                    .unwrap_or_else(|| "unlimited".to_string()),
            ),
            SETTING_THREADS => Some(self.threads.to_string()),
            SETTING_PARALLEL_ROW_THRESHOLD => Some(self.parallel_row_threshold.to_string()),
            SETTING_PARTITION_ORDER => Some(self.partition_order.to_string()),
            _ => None,
        }
    }

    /// List all settings
    pub fn list_all(&self) -> Vec<(String, String)> {
        [
            SETTING_PARTITION_MEMORY_LIMIT,
            SETTING_THREADS,
            SETTING_PARALLEL_ROW_THRESHOLD,
            SETTING_PARTITION_ORDER,
        ]
        .iter()
        .filter_map(|key| self.get(key).map(|value| (key.to_string(), value)))
        .collect()
    }
}

fn parse_count(key: &str, value: &str) -> Result<usize> {
    value
        .parse::<usize>()
        .map_err(|_| WindowError::InvalidValue(format!("{} expects a count, got '{}'", key, value)))
}

/// Parse a byte size such as `4096`, `512KB`, `64MB`, `1GB`, or `unlimited`
fn parse_memory_limit(value: &str) -> Result<Option<usize>> {
    let upper = value.to_uppercase();
    if upper == "UNLIMITED" || upper == "NONE" {
        return Ok(None);
    }

    let (digits, multiplier) = if let Some(n) = upper.strip_suffix("GB") {
        (n, 1024 * 1024 * 1024)
    } else if let Some(n) = upper.strip_suffix("MB") {
        (n, 1024 * 1024)
    } else if let Some(n) = upper.strip_suffix("KB") {
        (n, 1024)
    } else if let Some(n) = upper.strip_suffix('B') {
        (n, 1)
    } else {
        (upper.as_str(), 1)
    };

    let amount = digits.trim().parse::<usize>().map_err(|_| {
        WindowError::InvalidValue(format!("invalid memory limit '{}'", value))
    })?;
    amount
        .checked_mul(multiplier)
        .map(Some)
        .ok_or_else(|| WindowError::InvalidValue(format!("memory limit '{}' overflows", value)))
}

/// Cooperative cancellation flag shared between a caller and running operators
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation; operators stop at the next partition boundary
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    /// Fail with [`WindowError::Cancelled`] once cancellation was requested
    pub fn check(&self) -> Result<()> {
        if self.is_cancelled() {
            Err(WindowError::Cancelled)
        } else {
            Ok(())
        }
    }
}

/// Execution context for window evaluation
#[derive(Debug, Clone)]
pub struct ExecutionContext {
    /// Evaluation settings
    pub config: WindowConfig,
    /// Cancellation flag observed at partition boundaries
    pub cancellation: CancellationToken,
    /// Parallel execution context
    pub parallel_context: ParallelContext,
}

impl ExecutionContext {
    /// Create a new execution context
    pub fn new(config: WindowConfig) -> Self {
        let parallel_context = ParallelContext::new(config.threads);
        Self {
            config,
            cancellation: CancellationToken::new(),
            parallel_context,
        }
    }

    /// Replace the cancellation token with one the caller holds
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = token;
        self
    }

    pub fn check_cancelled(&self) -> Result<()> {
        self.cancellation.check()
    }

    /// Whether an input of `total_rows` rows should be evaluated on the worker pool
    pub fn should_parallelize(&self, total_rows: usize, partitions: usize) -> bool {
        self.parallel_context.parallel_enabled
            && partitions > 1
            && total_rows >= self.config.parallel_row_threshold
    }
}

impl Default for ExecutionContext {
    fn default() -> Self {
        Self::new(WindowConfig::default())
    }
}
