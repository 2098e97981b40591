use crate::common::constants::VALUE_OVERHEAD_BYTES;
use crate::common::error::{Result, WindowError};
use crate::types::logical_type::LogicalType;
use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};

/// Represents a single typed field of a row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    /// Null value (type is stored in the schema)
    Null,
    /// Boolean value
    Boolean(bool),
    /// 8-bit signed integer
    TinyInt(i8),
    /// 16-bit signed integer
    SmallInt(i16),
    /// 32-bit signed integer
    Integer(i32),
    /// 64-bit signed integer
    BigInt(i64),
    /// 32-bit floating point
    Float(f32),
    /// 64-bit double precision
    Double(f64),
    /// Decimal value (stored as integer with scale)
    Decimal {
        value: i128,
        scale: u8,
        precision: u8,
    },
    /// String value
    Varchar(String),
    /// Date value (days since 1970-01-01)
    Date(i32),
    /// Time value (microseconds since midnight)
    Time(i64),
    /// Timestamp value (microseconds since 1970-01-01 00:00:00 UTC)
    Timestamp(i64),
    /// Interval value
    Interval { months: i32, days: i32, micros: i64 },
    /// Binary data
    Blob(Vec<u8>),
    /// JSON value
    JSON(String),
    /// List value
    List(Vec<Value>),
    /// Struct value with field values
    Struct(Vec<(String, Value)>),
}

impl Value {
    /// Check if this value is null
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Get the logical type of this value
    pub fn get_type(&self) -> LogicalType {
        match self {
            Value::Null => LogicalType::Null,
            Value::Boolean(_) => LogicalType::Boolean,
            Value::TinyInt(_) => LogicalType::TinyInt,
            Value::SmallInt(_) => LogicalType::SmallInt,
            Value::Integer(_) => LogicalType::Integer,
            Value::BigInt(_) => LogicalType::BigInt,
            Value::Float(_) => LogicalType::Float,
            Value::Double(_) => LogicalType::Double,
            Value::Decimal {
                precision, scale, ..
            } => LogicalType::Decimal {
                precision: *precision,
                scale: *scale,
            },
            Value::Varchar(_) => LogicalType::Varchar,
            Value::Date(_) => LogicalType::Date,
            Value::Time(_) => LogicalType::Time,
            Value::Timestamp(_) => LogicalType::Timestamp,
            Value::Interval { .. } => LogicalType::Interval,
            Value::Blob(_) => LogicalType::Blob,
            Value::JSON(_) => LogicalType::JSON,
            Value::List(values) => match values.first() {
                Some(first) => LogicalType::List(Box::new(first.get_type())),
                None => LogicalType::List(Box::new(LogicalType::Null)),
            },
            Value::Struct(fields) => LogicalType::Struct(
                fields
                    .iter()
                    .map(|(name, value)| (name.clone(), value.get_type()))
                    .collect(),
            ),
        }
    }

    /// Try to extract an i64 value
    pub fn try_as_i64(&self) -> Result<i64> {
        match self {
            Value::BigInt(value) => Ok(*value),
            Value::Integer(value) => Ok(*value as i64),
            Value::SmallInt(value) => Ok(*value as i64),
            Value::TinyInt(value) => Ok(*value as i64),
            Value::Null => Err(WindowError::InvalidValue(
                "Cannot extract i64 from NULL".to_string(),
            )),
            _ => Err(WindowError::InvalidType(format!(
                "Cannot extract i64 from {}",
                self.get_type()
            ))),
        }
    }

    /// Try to extract an f64 value
    pub fn try_as_f64(&self) -> Result<f64> {
        match self {
            Value::Double(value) => Ok(*value),
            Value::Float(value) => Ok(*value as f64),
            Value::BigInt(value) => Ok(*value as f64),
            Value::Integer(value) => Ok(*value as f64),
            Value::SmallInt(value) => Ok(*value as f64),
            Value::TinyInt(value) => Ok(*value as f64),
            Value::Decimal { value, scale, .. } => Ok(*value as f64 / 10_f64.powi(*scale as i32)),
            Value::Null => Err(WindowError::InvalidValue(
                "Cannot extract f64 from NULL".to_string(),
            )),
            _ => Err(WindowError::InvalidType(format!(
                "Cannot extract f64 from {}",
                self.get_type()
            ))),
        }
    }

    /// Create a boolean value
    pub fn boolean(value: bool) -> Self {
        Value::Boolean(value)
    }

    /// Create an integer value
    pub fn integer(value: i32) -> Self {
        Value::Integer(value)
    }

    /// Create a big integer value
    pub fn bigint(value: i64) -> Self {
        Value::BigInt(value)
    }

    /// Create a double value
    pub fn double(value: f64) -> Self {
        Value::Double(value)
    }

    /// Create a string value
    pub fn varchar(value: impl Into<String>) -> Self {
        Value::Varchar(value.into())
    }

    fn as_integral(&self) -> Option<i64> {
        match self {
            Value::TinyInt(v) => Some(*v as i64),
            Value::SmallInt(v) => Some(*v as i64),
            Value::Integer(v) => Some(*v as i64),
            Value::BigInt(v) => Some(*v),
            _ => None,
        }
    }

    fn as_floating(&self) -> Option<OrderedFloat<f64>> {
        match self {
            Value::Float(v) => Some(OrderedFloat(*v as f64)),
            Value::Double(v) => Some(OrderedFloat(*v)),
            _ => None,
        }
    }

    /// Compare two values for ordering
    ///
    /// NULL sorts before every non-NULL value and floating point values use a
    /// total order (NaN greatest). Incompatible types are an error.
    pub fn compare(&self, other: &Value) -> Result<Ordering> {
        match (self, other) {
            (Value::Null, Value::Null) => return Ok(Ordering::Equal),
            (Value::Null, _) => return Ok(Ordering::Less),
            (_, Value::Null) => return Ok(Ordering::Greater),
            _ => {}
        }

        if let (Some(a), Some(b)) = (self.as_integral(), other.as_integral()) {
            return Ok(a.cmp(&b));
        }
        if let (Some(a), Some(b)) = (self.as_floating(), other.as_floating()) {
            return Ok(a.cmp(&b));
        }

        match (self, other) {
            (Value::Boolean(a), Value::Boolean(b)) => Ok(a.cmp(b)),
            (Value::Varchar(a), Value::Varchar(b)) => Ok(a.cmp(b)),
            (Value::Date(a), Value::Date(b)) => Ok(a.cmp(b)),
            (Value::Time(a), Value::Time(b)) => Ok(a.cmp(b)),
            (Value::Timestamp(a), Value::Timestamp(b)) => Ok(a.cmp(b)),
            (Value::Blob(a), Value::Blob(b)) => Ok(a.cmp(b)),
            (
                Value::Decimal {
                    value: a, scale: sa, ..
                },
                Value::Decimal {
                    value: b, scale: sb, ..
                },
            ) => Ok(compare_decimals(*a, *sa, *b, *sb)),

            // Mixed numeric classes fall back to a total order over f64
            (a, b) if a.get_type().is_numeric() && b.get_type().is_numeric() => {
                let a = OrderedFloat(a.try_as_f64()?);
                let b = OrderedFloat(b.try_as_f64()?);
                Ok(a.cmp(&b))
            }

            (Value::Interval { .. }, Value::Interval { .. }) => Err(WindowError::InvalidType(
                "INTERVAL values are not totally ordered".to_string(),
            )),

            _ => Err(WindowError::InvalidType(format!(
                "Cannot compare {} and {}",
                self.get_type(),
                other.get_type()
            ))),
        }
    }

    /// Grouping equality used for partition keys
    ///
    /// NULL equals NULL. Integers of any width compare by value, as do floats of
    /// either width; an integer never equals a float. Consistent with
    /// [`Value::hash_key`].
    pub fn key_equals(&self, other: &Value) -> bool {
        if let (Some(a), Some(b)) = (self.as_integral(), other.as_integral()) {
            return a == b;
        }
        if let (Some(a), Some(b)) = (self.as_floating(), other.as_floating()) {
            return a == b;
        }
        match (self, other) {
            (
                Value::Decimal {
                    value: a, scale: sa, ..
                },
                Value::Decimal {
                    value: b, scale: sb, ..
                },
            ) => compare_decimals(*a, *sa, *b, *sb) == Ordering::Equal,
            (Value::Decimal { .. }, _) | (_, Value::Decimal { .. }) => false,
            _ => self == other,
        }
    }

    /// Feed the grouping identity of this value into a hasher
    pub fn hash_key<H: Hasher>(&self, state: &mut H) {
        if let Some(v) = self.as_integral() {
            1u8.hash(state);
            v.hash(state);
            return;
        }
        if let Some(v) = self.as_floating() {
            2u8.hash(state);
            v.hash(state);
            return;
        }
        match self {
            Value::Null => 0u8.hash(state),
            Value::Boolean(v) => {
                3u8.hash(state);
                v.hash(state);
            }
            Value::Decimal { value, scale, .. } => {
                4u8.hash(state);
                let (value, scale) = normalize_decimal(*value, *scale);
                value.hash(state);
                scale.hash(state);
            }
            Value::Varchar(v) | Value::JSON(v) => {
                5u8.hash(state);
                v.hash(state);
            }
            Value::Date(v) => {
                6u8.hash(state);
                v.hash(state);
            }
            Value::Time(v) => {
                7u8.hash(state);
                v.hash(state);
            }
            Value::Timestamp(v) => {
                8u8.hash(state);
                v.hash(state);
            }
            Value::Interval {
                months,
                days,
                micros,
            } => {
                9u8.hash(state);
                months.hash(state);
                days.hash(state);
                micros.hash(state);
            }
            Value::Blob(v) => {
                10u8.hash(state);
                v.hash(state);
            }
            Value::List(values) => {
                11u8.hash(state);
                values.len().hash(state);
                for value in values {
                    value.hash_key(state);
                }
            }
            Value::Struct(fields) => {
                12u8.hash(state);
                for (name, value) in fields {
                    name.hash(state);
                    value.hash_key(state);
                }
            }
            // Handled above
            Value::TinyInt(_)
            | Value::SmallInt(_)
            | Value::Integer(_)
            | Value::BigInt(_)
            | Value::Float(_)
            | Value::Double(_) => {}
        }
    }

    /// Get the size of this value's payload in bytes (approximate)
    pub fn get_size(&self) -> usize {
        match self {
            Value::Null => 0,
            Value::Boolean(_) | Value::TinyInt(_) => 1,
            Value::SmallInt(_) => 2,
            Value::Integer(_) | Value::Float(_) | Value::Date(_) => 4,
            Value::BigInt(_) | Value::Double(_) | Value::Time(_) | Value::Timestamp(_) => 8,
            Value::Decimal { .. } | Value::Interval { .. } => 16,
            Value::Varchar(s) | Value::JSON(s) => s.len(),
            Value::Blob(data) => data.len(),
            Value::List(values) => values.iter().map(|v| v.get_size()).sum(),
            Value::Struct(fields) => fields.iter().map(|(n, v)| n.len() + v.get_size()).sum(),
        }
    }

    /// Bytes charged for holding this value in a materialized partition
    pub fn estimated_size(&self) -> usize {
        VALUE_OVERHEAD_BYTES + self.get_size()
    }

    /// Convert to a JSON value for line-oriented output
    pub fn to_json(&self) -> serde_json::Value {
        use serde_json::Value as Json;
        match self {
            Value::Null => Json::Null,
            Value::Boolean(v) => Json::Bool(*v),
            Value::TinyInt(_) | Value::SmallInt(_) | Value::Integer(_) | Value::BigInt(_) => {
                Json::from(self.as_integral().unwrap_or_default())
            }
            Value::Float(v) => serde_json::Number::from_f64(*v as f64)
                .map(Json::Number)
                .unwrap_or(Json::Null),
            Value::Double(v) => serde_json::Number::from_f64(*v)
                .map(Json::Number)
                .unwrap_or(Json::Null),
            Value::Date(v) => Json::from(*v),
            Value::Time(v) | Value::Timestamp(v) => Json::from(*v),
            Value::Varchar(s) => Json::String(s.clone()),
            Value::JSON(s) => serde_json::from_str(s).unwrap_or_else(|_| Json::String(s.clone())),
            Value::List(values) => Json::Array(values.iter().map(|v| v.to_json()).collect()),
            Value::Struct(fields) => Json::Object(
                fields
                    .iter()
                    .map(|(name, value)| (name.clone(), value.to_json()))
                    .collect(),
            ),
            Value::Decimal { .. } | Value::Interval { .. } | Value::Blob(_) => {
                Json::String(self.to_string())
            }
        }
    }
}

fn normalize_decimal(mut value: i128, mut scale: u8) -> (i128, u8) {
    while scale > 0 && value % 10 == 0 {
        value /= 10;
        scale -= 1;
    }
    (value, scale)
}

fn compare_decimals(a: i128, scale_a: u8, b: i128, scale_b: u8) -> Ordering {
    let (a, scale_a) = normalize_decimal(a, scale_a);
    let (b, scale_b) = normalize_decimal(b, scale_b);
    let target = scale_a.max(scale_b);
    let a_scaled = 10_i128
        .checked_pow((target - scale_a) as u32)
        .and_then(|factor| a.checked_mul(factor));
    let b_scaled = 10_i128
        .checked_pow((target - scale_b) as u32)
        .and_then(|factor| b.checked_mul(factor));
    match (a_scaled, b_scaled) {
        (Some(a), Some(b)) => a.cmp(&b),
        _ => {
            let a = OrderedFloat(a as f64 / 10_f64.powi(scale_a as i32));
            let b = OrderedFloat(b as f64 / 10_f64.powi(scale_b as i32));
            a.cmp(&b)
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "NULL"),
            Value::Boolean(value) => write!(f, "{}", value),
            Value::TinyInt(value) => write!(f, "{}", value),
            Value::SmallInt(value) => write!(f, "{}", value),
            Value::Integer(value) => write!(f, "{}", value),
            Value::BigInt(value) => write!(f, "{}", value),
            Value::Float(value) => write!(f, "{}", value),
            Value::Double(value) => write!(f, "{}", value),
            Value::Decimal { value, scale, .. } => {
                let Some(divisor) = 10_i128.checked_pow(*scale as u32) else {
                    return write!(f, "{}e-{}", value, scale);
                };
                let integer_part = value / divisor;
                let fractional_part = (value % divisor).abs();
                let sign = if *value < 0 && integer_part == 0 { "-" } else { "" };
                if *scale == 0 {
                    write!(f, "{}", value)
                } else {
                    write!(
                        f,
                        "{}{}.{:0width$}",
                        sign,
                        integer_part,
                        fractional_part,
                        width = *scale as usize
                    )
                }
            }
            Value::Varchar(value) => write!(f, "{}", value),
            Value::Date(value) => write!(f, "DATE({})", value),
            Value::Time(value) => write!(f, "TIME({})", value),
            Value::Timestamp(value) => write!(f, "TIMESTAMP({})", value),
            Value::Interval {
                months,
                days,
                micros,
            } => write!(
                f,
                "INTERVAL {} months {} days {} micros",
                months, days, micros
            ),
            Value::Blob(data) => write!(f, "BLOB({:?})", data),
            Value::JSON(value) => write!(f, "{}", value),
            Value::List(values) => {
                write!(f, "[")?;
                for (i, value) in values.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", value)?;
                }
                write!(f, "]")
            }
            Value::Struct(fields) => {
                write!(f, "{{")?;
                for (i, (name, value)) in fields.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}: {}", name, value)?;
                }
                write!(f, "}}")
            }
        }
    }
}
