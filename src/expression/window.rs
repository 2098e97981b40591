//! Window Functions and Expressions
//!
//! This module defines the ranking window functions (ROW_NUMBER(), RANK(),
//! DENSE_RANK(), PERCENT_RANK(), CUME_DIST()) and the per-partition state they
//! are computed from.

use crate::common::error::{Result, WindowError};
use crate::internal_err;
use crate::types::{ColumnDefinition, LogicalType, Schema, Value};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::Range;
use std::str::FromStr;

/// Window function types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WindowFunctionType {
    RowNumber,
    Rank,
    DenseRank,
    PercentRank,
    CumeDist,
}

impl WindowFunctionType {
    pub const ALL: [WindowFunctionType; 5] = [
        WindowFunctionType::RowNumber,
        WindowFunctionType::Rank,
        WindowFunctionType::DenseRank,
        WindowFunctionType::PercentRank,
        WindowFunctionType::CumeDist,
    ];

    /// SQL name of the function
    pub fn name(&self) -> &'static str {
        match self {
            WindowFunctionType::RowNumber => "row_number",
            WindowFunctionType::Rank => "rank",
            WindowFunctionType::DenseRank => "dense_rank",
            WindowFunctionType::PercentRank => "percent_rank",
            WindowFunctionType::CumeDist => "cume_dist",
        }
    }

    pub fn return_type(&self) -> LogicalType {
        match self {
            WindowFunctionType::RowNumber
            | WindowFunctionType::Rank
            | WindowFunctionType::DenseRank => LogicalType::BigInt,
            WindowFunctionType::PercentRank | WindowFunctionType::CumeDist => LogicalType::Double,
        }
    }

    /// Whether the value for a row is known before the rest of its partition is read
    pub fn is_streamable(&self) -> bool {
        matches!(self, WindowFunctionType::RowNumber)
    }

    /// Compute this function's value for the row `state` is positioned on
    pub fn evaluate(&self, state: &EvaluatorState) -> Value {
        match self {
            WindowFunctionType::RowNumber => Value::BigInt(state.row_number()),
            WindowFunctionType::Rank => Value::BigInt(state.rank()),
            WindowFunctionType::DenseRank => Value::BigInt(state.dense_rank()),
            WindowFunctionType::PercentRank => Value::Double(state.percent_rank()),
            WindowFunctionType::CumeDist => Value::Double(state.cume_dist()),
        }
    }
}

impl FromStr for WindowFunctionType {
    type Err = WindowError;

    fn from_str(name: &str) -> Result<Self> {
        let normalized = name.trim().trim_end_matches("()").to_lowercase();
        WindowFunctionType::ALL
            .iter()
            .copied()
            .find(|f| f.name() == normalized)
            .ok_or_else(|| {
                WindowError::InvalidArgument(format!("Unknown window function: {}", name))
            })
    }
}

impl fmt::Display for WindowFunctionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}()", self.name())
    }
}

/// Partition and order keys of an OVER clause, as resolved column indexes
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WindowSpec {
    pub partition_by: Vec<usize>,
    pub order_by: Vec<usize>,
}

impl WindowSpec {
    pub fn new(partition_by: Vec<usize>, order_by: Vec<usize>) -> Self {
        Self {
            partition_by,
            order_by,
        }
    }

    /// Check key columns exist and have usable types
    pub fn validate(&self, schema: &Schema) -> Result<()> {
        for &index in &self.partition_by {
            let column = schema.column(index)?;
            column.logical_type.check_partition_key(&column.name)?;
        }
        for &index in &self.order_by {
            let column = schema.column(index)?;
            column.logical_type.check_order_key(&column.name)?;
        }
        Ok(())
    }

    /// Render as an OVER clause against a schema
    pub fn display(&self, schema: &Schema) -> String {
        let names = |indexes: &[usize]| -> String {
            indexes
                .iter()
                .map(|&i| {
                    schema
                        .column(i)
                        .map(|c| c.name.clone())
                        .unwrap_or_else(|_| format!("#{}", i))
                })
                .collect::<Vec<_>>()
                .join(", ")
        };
        let mut parts = Vec::new();
        if !self.partition_by.is_empty() {
            parts.push(format!("PARTITION BY {}", names(&self.partition_by)));
        }
        if !self.order_by.is_empty() {
            parts.push(format!("ORDER BY {}", names(&self.order_by)));
        }
        format!("OVER ({})", parts.join(" "))
    }
}

/// Window expression: one window function call
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WindowExpression {
    pub function_type: WindowFunctionType,
    pub spec: WindowSpec,
    /// Output column name (defaults to the function name)
    pub alias: Option<String>,
}

impl WindowExpression {
    pub fn new(function_type: WindowFunctionType, partition_by: Vec<usize>, order_by: Vec<usize>) -> Self {
        Self {
            function_type,
            spec: WindowSpec::new(partition_by, order_by),
            alias: None,
        }
    }

    /// Resolve partition and order column names against a schema
    pub fn bind<S: AsRef<str>>(
        schema: &Schema,
        function_type: WindowFunctionType,
        partition_by: &[S],
        order_by: &[S],
    ) -> Result<Self> {
        let partition_by = partition_by
            .iter()
            .map(|name| schema.index_of(name.as_ref()))
            .collect::<Result<Vec<_>>>()?;
        let order_by = order_by
            .iter()
            .map(|name| schema.index_of(name.as_ref()))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self::new(function_type, partition_by, order_by))
    }

    pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
        self.alias = Some(alias.into());
        self
    }

    pub fn output_name(&self) -> String {
        self.alias
            .clone()
            .unwrap_or_else(|| self.function_type.name().to_string())
    }

    /// Column appended to the output schema for this call
    pub fn output_column(&self) -> ColumnDefinition {
        ColumnDefinition::new(self.output_name(), self.function_type.return_type())
    }
}

/// Per-partition ranking state
///
/// Tracks the position of the current row and of its peer group inside one
/// ordered partition. Created at partition start, dropped at partition end.
#[derive(Debug, Clone)]
pub struct EvaluatorState {
    partition_size: usize,
    /// 0-based position of the current row
    row_index: usize,
    /// Rows in peer groups before the current one
    group_start: usize,
    /// `group_start` plus the size of the current peer group
    group_end: usize,
    /// 1-based index of the current peer group
    dense_rank: usize,
}

impl EvaluatorState {
    pub fn new(partition_size: usize) -> Self {
        Self {
            partition_size,
            row_index: 0,
            group_start: 0,
            group_end: 0,
            dense_rank: 0,
        }
    }

    /// Move onto the next peer group; it must start at the current row
    pub fn enter_peer_group(&mut self, group: &Range<usize>) -> Result<()> {
        if group.start != self.row_index || group.start != self.group_end {
            return Err(internal_err!(
                "peer group {:?} does not continue at row {}",
                group,
                self.row_index
            ));
        }
        if group.is_empty() || group.end > self.partition_size {
            return Err(internal_err!(
                "peer group {:?} invalid for partition of {} rows",
                group,
                self.partition_size
            ));
        }
        self.group_start = group.start;
        self.group_end = group.end;
        self.dense_rank += 1;
        Ok(())
    }

    /// Move onto the next row of the current peer group
    pub fn advance_row(&mut self) {
        self.row_index += 1;
    }

    pub fn partition_size(&self) -> usize {
        self.partition_size
    }

    pub fn row_number(&self) -> i64 {
        (self.row_index + 1) as i64
    }

    pub fn rank(&self) -> i64 {
        (self.group_start + 1) as i64
    }

    pub fn dense_rank(&self) -> i64 {
        self.dense_rank as i64
    }

    pub fn percent_rank(&self) -> f64 {
        if self.partition_size > 1 {
            self.group_start as f64 / (self.partition_size - 1) as f64
        } else {
            0.0
        }
    }

    pub fn cume_dist(&self) -> f64 {
        self.group_end as f64 / self.partition_size as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_function_names_round_trip() {
        for function in WindowFunctionType::ALL {
            assert_eq!(function.name().parse::<WindowFunctionType>().unwrap(), function);
        }
        assert_eq!(
            "PERCENT_RANK()".parse::<WindowFunctionType>().unwrap(),
            WindowFunctionType::PercentRank
        );
        assert!(matches!(
            "ntile".parse::<WindowFunctionType>(),
            Err(WindowError::InvalidArgument(_))
        ));
        assert_eq!(WindowFunctionType::CumeDist.to_string(), "cume_dist()");
    }

    #[test]
    fn test_return_types() {
        assert_eq!(WindowFunctionType::Rank.return_type(), LogicalType::BigInt);
        assert_eq!(WindowFunctionType::CumeDist.return_type(), LogicalType::Double);
        assert!(WindowFunctionType::RowNumber.is_streamable());
        assert!(!WindowFunctionType::PercentRank.is_streamable());
    }

    #[test]
    fn test_bind_and_display() {
        let schema = Schema::from_pairs([
            ("orderkey", LogicalType::BigInt),
            ("orderstatus", LogicalType::Varchar),
        ]);
        let expr = WindowExpression::bind(
            &schema,
            WindowFunctionType::PercentRank,
            &["orderstatus"],
            &["orderkey"],
        )
        .unwrap();
        assert_eq!(expr.spec, WindowSpec::new(vec![1], vec![0]));
        assert_eq!(
            expr.spec.display(&schema),
            "OVER (PARTITION BY orderstatus ORDER BY orderkey)"
        );
        assert_eq!(expr.output_column().logical_type, LogicalType::Double);
        assert_eq!(expr.clone().with_alias("pr").output_name(), "pr");

        assert!(WindowExpression::bind(
            &schema,
            WindowFunctionType::Rank,
            &["missing"],
            &[]
        )
        .is_err());
    }

    #[test]
    fn test_spec_validation() {
        let schema = Schema::from_pairs([
            ("doc", LogicalType::JSON),
            ("gap", LogicalType::Interval),
        ]);
        assert!(matches!(
            WindowSpec::new(vec![0], vec![]).validate(&schema),
            Err(WindowError::InvalidKeyType(_))
        ));
        assert!(WindowSpec::new(vec![1], vec![]).validate(&schema).is_ok());
        assert!(matches!(
            WindowSpec::new(vec![], vec![1]).validate(&schema),
            Err(WindowError::InvalidKeyType(_))
        ));
        assert!(matches!(
            WindowSpec::new(vec![5], vec![]).validate(&schema),
            Err(WindowError::ColumnNotFound(_))
        ));
    }

    #[test]
    fn test_evaluator_state_walk() -> Result<()> {
        // Peer groups of sizes 2 and 1
        let mut state = EvaluatorState::new(3);
        state.enter_peer_group(&(0..2))?;
        assert_eq!((state.row_number(), state.rank(), state.dense_rank()), (1, 1, 1));
        state.advance_row();
        assert_eq!((state.row_number(), state.rank(), state.dense_rank()), (2, 1, 1));
        assert_eq!(state.cume_dist(), 2.0 / 3.0);
        state.advance_row();
        state.enter_peer_group(&(2..3))?;
        assert_eq!((state.row_number(), state.rank(), state.dense_rank()), (3, 3, 2));
        assert_eq!(state.percent_rank(), 1.0);
        assert_eq!(state.cume_dist(), 1.0);
        Ok(())
    }

    #[test]
    fn test_evaluator_state_rejects_gaps() {
        let mut state = EvaluatorState::new(4);
        assert!(state.enter_peer_group(&(1..2)).is_err());
        assert!(state.enter_peer_group(&(0..5)).is_err());
    }

    #[test]
    fn test_single_row_percent_rank() -> Result<()> {
        let mut state = EvaluatorState::new(1);
        state.enter_peer_group(&(0..1))?;
        assert_eq!(state.percent_rank(), 0.0);
        assert_eq!(state.cume_dist(), 1.0);
        Ok(())
    }
}
