//! Window Functions
//!
//! Single forward pass over an ordered partition with known peer-group
//! boundaries. Every requested ranking function is computed from the same
//! [`EvaluatorState`], so several calls over one OVER clause share a scan.

use super::window::{EvaluatorState, WindowFunctionType};
use crate::common::error::Result;
use crate::internal_err;
use crate::types::Value;
use std::ops::Range;

/// Evaluate `functions` over one ordered partition
///
/// Returns one result row per partition row, in partition order; result row
/// `i` holds one value per function, in the order of `functions`.
pub fn evaluate_partition(
    functions: &[WindowFunctionType],
    partition_size: usize,
    peer_groups: &[Range<usize>],
) -> Result<Vec<Vec<Value>>> {
    let mut state = EvaluatorState::new(partition_size);
    let mut results = Vec::with_capacity(partition_size);

    for group in peer_groups {
        state.enter_peer_group(group)?;
        for _ in group.clone() {
            results.push(functions.iter().map(|f| f.evaluate(&state)).collect());
            state.advance_row();
        }
    }

    if results.len() != partition_size {
        return Err(internal_err!(
            "peer groups cover {} of {} partition rows",
            results.len(),
            partition_size
        ));
    }
    Ok(results)
}

/// Evaluate a single function over one ordered partition
pub fn evaluate_function(
    function: WindowFunctionType,
    partition_size: usize,
    peer_groups: &[Range<usize>],
) -> Result<Vec<Value>> {
    Ok(evaluate_partition(&[function], partition_size, peer_groups)?
        .into_iter()
        .flatten()
        .collect())
}

/// ROW_NUMBER - Assign unique sequential integers starting from 1
pub fn row_number(partition_size: usize, peer_groups: &[Range<usize>]) -> Result<Vec<Value>> {
    evaluate_function(WindowFunctionType::RowNumber, partition_size, peer_groups)
}

/// RANK - Tied rows share a rank; the next group's rank skips by the tie count
pub fn rank(partition_size: usize, peer_groups: &[Range<usize>]) -> Result<Vec<Value>> {
    evaluate_function(WindowFunctionType::Rank, partition_size, peer_groups)
}

/// DENSE_RANK - Like RANK but consecutive ranks with no gaps
pub fn dense_rank(partition_size: usize, peer_groups: &[Range<usize>]) -> Result<Vec<Value>> {
    evaluate_function(WindowFunctionType::DenseRank, partition_size, peer_groups)
}

/// PERCENT_RANK - (rank - 1) / (total_rows - 1), 0 for single-row partitions
pub fn percent_rank(partition_size: usize, peer_groups: &[Range<usize>]) -> Result<Vec<Value>> {
    evaluate_function(WindowFunctionType::PercentRank, partition_size, peer_groups)
}

/// CUME_DIST - (number of rows <= current row) / total_rows
pub fn cume_dist(partition_size: usize, peer_groups: &[Range<usize>]) -> Result<Vec<Value>> {
    evaluate_function(WindowFunctionType::CumeDist, partition_size, peer_groups)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::execution::peer_groups::detect_peer_groups;

    fn create_test_partition(values: Vec<i32>) -> Vec<Vec<Value>> {
        values
            .into_iter()
            .map(|v| vec![Value::Integer(v)])
            .collect()
    }

    fn groups_of(data: &[Vec<Value>]) -> Vec<Range<usize>> {
        detect_peer_groups(data, &[0]).unwrap()
    }

    fn as_f64(values: &[Value]) -> Vec<f64> {
        values
            .iter()
            .map(|v| v.try_as_f64().unwrap())
            .collect()
    }

    #[test]
    fn test_row_number() -> Result<()> {
        let data = create_test_partition(vec![10, 20, 20, 40]);
        let result = row_number(data.len(), &groups_of(&data))?;

        assert_eq!(
            result,
            vec![
                Value::BigInt(1),
                Value::BigInt(2),
                Value::BigInt(3),
                Value::BigInt(4)
            ]
        );
        Ok(())
    }

    #[test]
    fn test_rank() -> Result<()> {
        // Test data: 10, 20, 20, 30, 30, 30, 40
        let data = create_test_partition(vec![10, 20, 20, 30, 30, 30, 40]);
        let result = rank(data.len(), &groups_of(&data))?;

        assert_eq!(result[0], Value::BigInt(1)); // 10
        assert_eq!(result[1], Value::BigInt(2)); // 20
        assert_eq!(result[2], Value::BigInt(2)); // 20 (same rank)
        assert_eq!(result[3], Value::BigInt(4)); // 30 (gap)
        assert_eq!(result[4], Value::BigInt(4)); // 30
        assert_eq!(result[5], Value::BigInt(4)); // 30
        assert_eq!(result[6], Value::BigInt(7)); // 40 (gap)

        Ok(())
    }

    #[test]
    fn test_dense_rank() -> Result<()> {
        let data = create_test_partition(vec![10, 20, 20, 30, 30, 30, 40]);
        let result = dense_rank(data.len(), &groups_of(&data))?;

        assert_eq!(result[0], Value::BigInt(1)); // 10
        assert_eq!(result[1], Value::BigInt(2)); // 20
        assert_eq!(result[2], Value::BigInt(2)); // 20 (same rank)
        assert_eq!(result[3], Value::BigInt(3)); // 30 (no gap)
        assert_eq!(result[4], Value::BigInt(3)); // 30
        assert_eq!(result[5], Value::BigInt(3)); // 30
        assert_eq!(result[6], Value::BigInt(4)); // 40 (no gap)

        Ok(())
    }

    #[test]
    fn test_percent_rank() -> Result<()> {
        let data = create_test_partition(vec![10, 20, 20, 30]);
        let result = as_f64(&percent_rank(data.len(), &groups_of(&data))?);

        assert_eq!(result[0], 0.0);
        assert!((result[1] - 1.0 / 3.0).abs() < 1e-12);
        assert!((result[2] - 1.0 / 3.0).abs() < 1e-12);
        assert_eq!(result[3], 1.0);

        Ok(())
    }

    #[test]
    fn test_cume_dist() -> Result<()> {
        let data = create_test_partition(vec![10, 20, 30, 40]);
        let result = cume_dist(data.len(), &groups_of(&data))?;

        assert_eq!(result[0], Value::Double(0.25)); // 1/4
        assert_eq!(result[1], Value::Double(0.5)); // 2/4
        assert_eq!(result[2], Value::Double(0.75)); // 3/4
        assert_eq!(result[3], Value::Double(1.0)); // 4/4

        let tied = create_test_partition(vec![10, 20, 20, 30, 30]);
        let result = as_f64(&cume_dist(tied.len(), &groups_of(&tied))?);
        assert_eq!(result, vec![0.2, 0.6, 0.6, 1.0, 1.0]);

        Ok(())
    }

    #[test]
    fn test_single_peer_group() -> Result<()> {
        // No ORDER BY: one peer group spanning the whole partition
        let groups = vec![0..3];
        let results = evaluate_partition(&WindowFunctionType::ALL, 3, &groups)?;

        for (i, row) in results.iter().enumerate() {
            assert_eq!(row[0], Value::BigInt(i as i64 + 1));
            assert_eq!(row[1], Value::BigInt(1));
            assert_eq!(row[2], Value::BigInt(1));
            assert_eq!(row[3], Value::Double(0.0));
            assert_eq!(row[4], Value::Double(1.0));
        }
        Ok(())
    }

    #[test]
    fn test_empty_partition() -> Result<()> {
        assert!(evaluate_partition(&WindowFunctionType::ALL, 0, &[])?.is_empty());
        Ok(())
    }

    #[test]
    fn test_uncovered_rows_rejected() {
        assert!(evaluate_partition(&[WindowFunctionType::Rank], 4, &[0..2]).is_err());
    }

    #[test]
    fn test_idempotent() -> Result<()> {
        let data = create_test_partition(vec![5, 5, 6, 9, 9, 9, 12]);
        let groups = groups_of(&data);
        let first = evaluate_partition(&WindowFunctionType::ALL, data.len(), &groups)?;
        let second = evaluate_partition(&WindowFunctionType::ALL, data.len(), &groups)?;
        assert_eq!(first, second);
        Ok(())
    }
}
