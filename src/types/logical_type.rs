use crate::common::error::{Result, WindowError};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Logical types represent the SQL-level types of the columns flowing through
/// a window operator
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LogicalType {
    /// NULL type (column with no known type, all values NULL)
    Null,
    /// Boolean type (TRUE/FALSE)
    Boolean,
    /// 8-bit signed integer
    TinyInt,
    /// 16-bit signed integer
    SmallInt,
    /// 32-bit signed integer
    Integer,
    /// 64-bit signed integer
    BigInt,
    /// 32-bit floating point
    Float,
    /// 64-bit double precision
    Double,
    /// Decimal with precision and scale
    Decimal { precision: u8, scale: u8 },
    /// Variable length string
    Varchar,
    /// Date value (days since 1970-01-01)
    Date,
    /// Time value (microseconds since midnight)
    Time,
    /// Timestamp value (microseconds since 1970-01-01 00:00:00 UTC)
    Timestamp,
    /// Interval type
    Interval,
    /// Binary large object
    Blob,
    /// JSON document
    JSON,
    /// List/array type with element type
    List(Box<LogicalType>),
    /// Struct type with named fields
    Struct(Vec<(String, LogicalType)>),
}

impl LogicalType {
    /// Check if this type is numeric
    pub fn is_numeric(&self) -> bool {
        matches!(
            self,
            LogicalType::TinyInt
                | LogicalType::SmallInt
                | LogicalType::Integer
                | LogicalType::BigInt
                | LogicalType::Float
                | LogicalType::Double
                | LogicalType::Decimal { .. }
        )
    }

    /// Check if this type is a nested type (contains other types)
    pub fn is_nested(&self) -> bool {
        matches!(self, LogicalType::List(_) | LogicalType::Struct(_))
    }

    /// Whether values of this type can be grouped on (usable as a partition key)
    pub fn is_equality_comparable(&self) -> bool {
        !self.is_nested() && !matches!(self, LogicalType::JSON)
    }

    /// Whether values of this type have a total order (usable as an order key)
    ///
    /// Floating point values are ordered with NaN sorting above every number.
    /// Intervals compare equal or not, but `1 month` vs `30 days` has no order.
    pub fn is_totally_ordered(&self) -> bool {
        self.is_equality_comparable() && !matches!(self, LogicalType::Interval)
    }

    /// Validate that a column of this type can be used as a partition key
    pub fn check_partition_key(&self, column: &str) -> Result<()> {
        if self.is_equality_comparable() {
            Ok(())
        } else {
            Err(WindowError::InvalidKeyType(format!(
                "partition key '{}' has type {} which is not equality-comparable",
                column, self
            )))
        }
    }

    /// Validate that a column of this type can be used as an order key
    pub fn check_order_key(&self, column: &str) -> Result<()> {
        if self.is_totally_ordered() {
            Ok(())
        } else {
            Err(WindowError::InvalidKeyType(format!(
                "order key '{}' has type {} which is not totally ordered",
                column, self
            )))
        }
    }
}

impl fmt::Display for LogicalType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogicalType::Boolean => write!(f, "BOOLEAN"),
            LogicalType::TinyInt => write!(f, "TINYINT"),
            LogicalType::SmallInt => write!(f, "SMALLINT"),
            LogicalType::Integer => write!(f, "INTEGER"),
            LogicalType::BigInt => write!(f, "BIGINT"),
            LogicalType::Float => write!(f, "FLOAT"),
            LogicalType::Double => write!(f, "DOUBLE"),
            LogicalType::Decimal { precision, scale } => {
                write!(f, "DECIMAL({},{})", precision, scale)
            }
            LogicalType::Varchar => write!(f, "VARCHAR"),
            LogicalType::Date => write!(f, "DATE"),
            LogicalType::Time => write!(f, "TIME"),
            LogicalType::Timestamp => write!(f, "TIMESTAMP"),
            LogicalType::Interval => write!(f, "INTERVAL"),
            LogicalType::Blob => write!(f, "BLOB"),
            LogicalType::JSON => write!(f, "JSON"),
            LogicalType::List(element_type) => write!(f, "{}[]", element_type),
            LogicalType::Struct(fields) => {
                write!(f, "STRUCT(")?;
                for (i, (name, field_type)) in fields.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{} {}", name, field_type)?;
                }
                write!(f, ")")
            }
            LogicalType::Null => write!(f, "NULL"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_numeric_types() {
        assert!(LogicalType::Integer.is_numeric());
        assert!(LogicalType::Decimal { precision: 12, scale: 2 }.is_numeric());
        assert!(!LogicalType::Varchar.is_numeric());
        assert!(!LogicalType::Interval.is_numeric());
    }

    #[test]
    fn test_key_capabilities() {
        assert!(LogicalType::Varchar.is_totally_ordered());
        assert!(LogicalType::Double.is_totally_ordered());
        assert!(LogicalType::Interval.is_equality_comparable());
        assert!(!LogicalType::Interval.is_totally_ordered());
        assert!(!LogicalType::JSON.is_equality_comparable());

        let list_type = LogicalType::List(Box::new(LogicalType::Integer));
        assert!(list_type.is_nested());
        assert!(matches!(
            list_type.check_partition_key("tags"),
            Err(WindowError::InvalidKeyType(_))
        ));
        assert!(matches!(
            LogicalType::Interval.check_order_key("gap"),
            Err(WindowError::InvalidKeyType(_))
        ));
        assert!(LogicalType::Interval.check_partition_key("gap").is_ok());
    }

    #[test]
    fn test_display() {
        let struct_type = LogicalType::Struct(vec![
            ("id".to_string(), LogicalType::Integer),
            ("name".to_string(), LogicalType::Varchar),
        ]);
        assert_eq!(struct_type.to_string(), "STRUCT(id INTEGER, name VARCHAR)");
        assert_eq!(
            LogicalType::Decimal { precision: 12, scale: 2 }.to_string(),
            "DECIMAL(12,2)"
        );
    }
}
