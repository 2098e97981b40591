//! Partition ordering
//!
//! Sorts the rows of one partition ascending by the order key. The sort is
//! stable, so rows with equal keys keep the order the partitioner produced
//! (arrival order). Without an order key the partition passes through.

use crate::common::error::{Result, WindowError};
use crate::types::{Row, Value};
use std::cmp::Ordering;

/// Order indexes into a partition's rows in place
pub fn order_partition(rows: &[Row], row_ids: &mut [usize], order_by: &[usize]) -> Result<()> {
    if order_by.is_empty() || row_ids.len() <= 1 {
        return Ok(());
    }

    let mut sort_err: Option<WindowError> = None;
    row_ids.sort_by(|&left, &right| {
        if sort_err.is_some() {
            return Ordering::Equal;
        }
        match compare_on_keys(&rows[left], &rows[right], order_by) {
            Ok(ord) => ord,
            Err(e) => {
                sort_err = Some(e);
                Ordering::Equal
            }
        }
    });

    match sort_err {
        Some(err) => Err(err),
        None => Ok(()),
    }
}

/// Lexicographic comparison of two rows on the given key columns
pub fn compare_on_keys(left: &[Value], right: &[Value], keys: &[usize]) -> Result<Ordering> {
    for &key in keys {
        let ord = left[key].compare(&right[key])?;
        if ord != Ordering::Equal {
            return Ok(ord);
        }
    }
    Ok(Ordering::Equal)
}
