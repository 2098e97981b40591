//! Peer-group detection
//!
//! A peer group is a maximal run of rows with equal order key inside an
//! ordered partition. Boundaries come from one left-to-right scan comparing
//! each row with its predecessor.

use crate::common::error::Result;
use crate::types::Value;
use std::cmp::Ordering;
use std::ops::Range;

/// Find the peer groups of an ordered partition
///
/// With no order key the whole partition is a single peer group. An empty
/// partition has no peer groups.
pub fn detect_peer_groups<R: AsRef<[Value]>>(
    rows: &[R],
    order_by: &[usize],
) -> Result<Vec<Range<usize>>> {
    if rows.is_empty() {
        return Ok(Vec::new());
    }
    if order_by.is_empty() {
        return Ok(vec![0..rows.len()]);
    }

    let mut groups = Vec::new();
    let mut start = 0usize;
    for i in 1..rows.len() {
        if !rows_equal_on_keys(rows[i - 1].as_ref(), rows[i].as_ref(), order_by)? {
            groups.push(start..i);
            start = i;
        }
    }
    groups.push(start..rows.len());
    Ok(groups)
}

fn rows_equal_on_keys(left: &[Value], right: &[Value], keys: &[usize]) -> Result<bool> {
    for &key in keys {
        if left[key].compare(&right[key])? != Ordering::Equal {
            return Ok(false);
        }
    }
    Ok(true)
}
