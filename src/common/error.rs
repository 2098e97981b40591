//! Error handling for window evaluation

use thiserror::Error;

/// Main error type for window evaluation
#[derive(Error, Debug)]
pub enum WindowError {
    /// A key column cannot serve as a partition or order key
    #[error("Invalid key type: {0}")]
    InvalidKeyType(String),

    /// A partition does not fit under the configured memory ceiling
    #[error("Resource exhausted: partition {partition} needs ~{required} bytes, limit is {limit} bytes")]
    ResourceExhausted {
        partition: usize,
        required: usize,
        limit: usize,
    },

    #[error("Evaluation cancelled")]
    Cancelled,

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Column not found: {0}")]
    ColumnNotFound(String),

    #[error("Invalid type: {0}")]
    InvalidType(String),

    #[error("Invalid value: {0}")]
    InvalidValue(String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl WindowError {
    /// Whether the error is tied to a single partition rather than the whole evaluation
    pub fn is_partition_local(&self) -> bool {
        matches!(self, WindowError::ResourceExhausted { .. })
    }
}

/// Result type alias for convenience
pub type Result<T> = std::result::Result<T, WindowError>;

/// Result type alias for window operations (alias for Result)
pub type WindowResult<T> = std::result::Result<T, WindowError>;

/// Macro for creating internal errors
#[macro_export]
macro_rules! internal_err {
    ($msg:expr) => {
        $crate::common::error::WindowError::Internal($msg.to_string())
    };
    ($fmt:expr, $($arg:tt)*) => {
        $crate::common::error::WindowError::Internal(format!($fmt, $($arg)*))
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resource_exhausted_message() {
        let err = WindowError::ResourceExhausted {
            partition: 3,
            required: 4096,
            limit: 1024,
        };
        assert!(err.is_partition_local());
        assert_eq!(
            err.to_string(),
            "Resource exhausted: partition 3 needs ~4096 bytes, limit is 1024 bytes"
        );
    }

    #[test]
    fn test_internal_err_macro() {
        let err = internal_err!("bad offset {}", 7);
        assert_eq!(err.to_string(), "Internal error: bad offset 7");
        assert!(!err.is_partition_local());
    }
}
