//! Hash partitioning
//!
//! Groups input rows by their partition-key values while the input is read.
//! Each partition owns its rows in arrival order and keeps a running
//! estimate of their size. A partition whose estimate crosses the memory
//! ceiling is marked exhausted: its rows are released, later rows for it
//! are counted and dropped. Partition emission order follows
//! [`PartitionOrder`].

use crate::common::error::{Result, WindowError};
use crate::execution::context::PartitionOrder;
use crate::execution::orderer::compare_on_keys;
use crate::types::utils::estimate_row_size;
use crate::types::{Row, Schema, Value};
use ahash::AHashMap;
use std::cmp::Ordering;
use std::hash::{Hash, Hasher};
use tracing::{debug, warn};

/// Partition-key tuple with grouping equality (NULL equals NULL)
#[derive(Debug, Clone)]
pub struct PartitionKey(pub Vec<Value>);

impl PartitionKey {
    pub fn from_row(row: &[Value], partition_by: &[usize]) -> Self {
        PartitionKey(partition_by.iter().map(|&i| row[i].clone()).collect())
    }

    pub fn values(&self) -> &[Value] {
        &self.0
    }
}

impl PartialEq for PartitionKey {
    fn eq(&self, other: &Self) -> bool {
        self.0.len() == other.0.len()
            && self.0.iter().zip(other.0.iter()).all(|(a, b)| a.key_equals(b))
    }
}

impl Eq for PartitionKey {}

impl Hash for PartitionKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.len().hash(state);
        for value in &self.0 {
            value.hash_key(state);
        }
    }
}

/// One partition of the input
#[derive(Debug, Clone)]
pub struct Partition {
    /// Position in emission order
    pub id: usize,
    /// Partition-key values shared by every row
    pub key: PartitionKey,
    /// Rows in arrival order; empty once the partition is exhausted
    pub rows: Vec<Row>,
    /// Rows assigned to the partition, retained or not
    pub row_count: usize,
    /// Estimated bytes needed to materialize every assigned row
    pub estimated_bytes: usize,
    exhausted: bool,
}

impl Partition {
    fn new(id: usize, key: PartitionKey) -> Self {
        Self {
            id,
            key,
            rows: Vec::new(),
            row_count: 0,
            estimated_bytes: 0,
            exhausted: false,
        }
    }

    pub fn len(&self) -> usize {
        self.row_count
    }

    pub fn is_empty(&self) -> bool {
        self.row_count == 0
    }

    /// Whether the partition crossed the memory ceiling and dropped its rows
    pub fn is_exhausted(&self) -> bool {
        self.exhausted
    }

    fn push(&mut self, row: Row, limit: Option<usize>) {
        self.row_count += 1;
        self.estimated_bytes += estimate_row_size(&row);
        if self.exhausted {
            return;
        }
        match limit {
            Some(limit) if self.estimated_bytes > limit => {
                warn!(
                    key = ?self.key.values(),
                    rows = self.row_count,
                    required = self.estimated_bytes,
                    limit,
                    "partition exceeds memory ceiling, releasing its rows"
                );
                self.exhausted = true;
                self.rows = Vec::new();
            }
            _ => self.rows.push(row),
        }
    }
}

/// Splits an input stream into partitions
#[derive(Debug, Clone)]
pub struct Partitioner {
    partition_by: Vec<usize>,
    order: PartitionOrder,
    keys_ordered: bool,
    memory_limit: Option<usize>,
}

impl Partitioner {
    pub fn new(schema: &Schema, partition_by: Vec<usize>, order: PartitionOrder) -> Result<Self> {
        let mut keys_ordered = true;
        for &index in &partition_by {
            let column = schema.column(index)?;
            column.logical_type.check_partition_key(&column.name)?;
            keys_ordered &= column.logical_type.is_totally_ordered();
        }
        Ok(Self {
            partition_by,
            order,
            keys_ordered,
            memory_limit: None,
        })
    }

    /// Per-partition ceiling on estimated bytes
    pub fn with_memory_limit(mut self, limit: Option<usize>) -> Self {
        self.memory_limit = limit;
        self
    }

    /// Whether partitions will be emitted in ascending key order
    pub fn emits_key_order(&self) -> bool {
        self.order == PartitionOrder::KeyOrder && self.keys_ordered
    }

    /// Partition `rows` as they arrive; every row lands in exactly one partition
    pub fn partition<I>(&self, rows: I) -> Result<Vec<Partition>>
    where
        I: IntoIterator<Item = Result<Row>>,
    {
        let mut index: AHashMap<PartitionKey, usize> = AHashMap::new();
        let mut partitions: Vec<Partition> = Vec::new();
        let mut total_rows = 0usize;

        for row in rows {
            let row = row?;
            total_rows += 1;
            let key = PartitionKey::from_row(&row, &self.partition_by);
            let slot = match index.get(&key) {
                Some(&slot) => slot,
                None => {
                    let slot = partitions.len();
                    index.insert(key.clone(), slot);
                    partitions.push(Partition::new(slot, key));
                    slot
                }
            };
            partitions[slot].push(row, self.memory_limit);
        }

        if self.emits_key_order() {
            sort_by_key(&mut partitions)?;
            for (id, partition) in partitions.iter_mut().enumerate() {
                partition.id = id;
            }
        }

        debug!(
            rows = total_rows,
            partitions = partitions.len(),
            exhausted = partitions.iter().filter(|p| p.is_exhausted()).count(),
            key_order = self.emits_key_order(),
            "partitioned input"
        );
        Ok(partitions)
    }
}

fn sort_by_key(partitions: &mut [Partition]) -> Result<()> {
    let width = partitions.first().map(|p| p.key.0.len()).unwrap_or(0);
    let positions: Vec<usize> = (0..width).collect();

    let mut sort_err: Option<WindowError> = None;
    partitions.sort_by(|left, right| {
        if sort_err.is_some() {
            return Ordering::Equal;
        }
        match compare_on_keys(&left.key.0, &right.key.0, &positions) {
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


#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::LogicalType;

    fn schema() -> Schema {
        Schema::from_pairs([
            ("orderkey", LogicalType::BigInt),
            ("orderstatus", LogicalType::Varchar),
        ])
    }

    fn orders() -> Vec<Row> {
        [(1, "O"), (2, "O"), (3, "F"), (4, "O"), (5, "F"), (6, "F"), (7, "O")]
            .iter()
            .map(|(k, s)| vec![Value::bigint(*k), Value::varchar(*s)])
            .collect()
    }

    fn input(rows: Vec<Row>) -> impl Iterator<Item = Result<Row>> {
        rows.into_iter().map(Ok)
    }

    fn keys(partition: &Partition) -> Vec<i64> {
        partition
            .rows
            .iter()
            .map(|r| r[0].try_as_i64().unwrap())
            .collect()
    }

    #[test]
    fn test_partition_by_status_in_key_order() -> Result<()> {
        let partitioner = Partitioner::new(&schema(), vec![1], PartitionOrder::KeyOrder)?;
        let partitions = partitioner.partition(input(orders()))?;

        assert_eq!(partitions.len(), 2);
        assert_eq!(partitions[0].key.values(), &[Value::varchar("F")]);
        assert_eq!(keys(&partitions[0]), vec![3, 5, 6]);
        assert_eq!(partitions[1].key.values(), &[Value::varchar("O")]);
        assert_eq!(keys(&partitions[1]), vec![1, 2, 4, 7]);
        assert_eq!(partitions[1].id, 1);
        Ok(())
    }

    #[test]
    fn test_first_seen_order() -> Result<()> {
        let partitioner = Partitioner::new(&schema(), vec![1], PartitionOrder::FirstSeen)?;
        let partitions = partitioner.partition(input(orders()))?;
        assert_eq!(partitions[0].key.values(), &[Value::varchar("O")]);
        assert_eq!(partitions[1].key.values(), &[Value::varchar("F")]);
        Ok(())
    }

    #[test]
    fn test_no_partition_key_is_one_partition() -> Result<()> {
        let partitioner = Partitioner::new(&schema(), vec![], PartitionOrder::KeyOrder)?;
        let partitions = partitioner.partition(input(orders()))?;
        assert_eq!(partitions.len(), 1);
        assert_eq!(keys(&partitions[0]), vec![1, 2, 3, 4, 5, 6, 7]);
        Ok(())
    }

    #[test]
    fn test_empty_input_has_no_partitions() -> Result<()> {
        let partitioner = Partitioner::new(&schema(), vec![1], PartitionOrder::KeyOrder)?;
        assert!(partitioner.partition(input(Vec::new()))?.is_empty());
        Ok(())
    }

    #[test]
    fn test_source_error_stops_partitioning() -> Result<()> {
        let partitioner = Partitioner::new(&schema(), vec![1], PartitionOrder::KeyOrder)?;
        let rows = vec![
            Ok(vec![Value::bigint(1), Value::varchar("O")]),
            Err(WindowError::InvalidValue("bad row".to_string())),
        ];
        assert!(matches!(
            partitioner.partition(rows),
            Err(WindowError::InvalidValue(_))
        ));
        Ok(())
    }

    #[test]
    fn test_null_keys_group_together_and_sort_first() -> Result<()> {
        let rows = vec![
            vec![Value::bigint(1), Value::varchar("O")],
            vec![Value::bigint(2), Value::Null],
            vec![Value::bigint(3), Value::Null],
        ];
        let partitioner = Partitioner::new(&schema(), vec![1], PartitionOrder::KeyOrder)?;
        let partitions = partitioner.partition(input(rows))?;
        assert_eq!(partitions.len(), 2);
        assert_eq!(partitions[0].key.values(), &[Value::Null]);
        assert_eq!(keys(&partitions[0]), vec![2, 3]);
        Ok(())
    }

    #[test]
    fn test_every_row_in_exactly_one_partition() -> Result<()> {
        let rows: Vec<Row> = (0..100)
            .map(|i| vec![Value::bigint(i), Value::varchar(format!("k{}", i % 7))])
            .collect();
        let partitioner = Partitioner::new(&schema(), vec![1], PartitionOrder::KeyOrder)?;
        let partitions = partitioner.partition(input(rows))?;
        assert_eq!(partitions.len(), 7);
        let mut seen: Vec<i64> = partitions.iter().flat_map(keys).collect();
        seen.sort_unstable();
        assert_eq!(seen, (0..100).collect::<Vec<_>>());
        Ok(())
    }

    #[test]
    fn test_interval_keys_use_first_seen_order() -> Result<()> {
        let schema = Schema::from_pairs([("span", LogicalType::Interval)]);
        let partitioner = Partitioner::new(&schema, vec![0], PartitionOrder::KeyOrder)?;
        assert!(!partitioner.emits_key_order());

        let interval = |days| Value::Interval {
            months: 0,
            days,
            micros: 0,
        };
        let rows = vec![vec![interval(5)], vec![interval(1)], vec![interval(5)]];
        let partitions = partitioner.partition(input(rows))?;
        assert_eq!(partitions.len(), 2);
        assert_eq!(partitions[0].len(), 2);
        assert_eq!(partitions[0].key.values(), &[interval(5)]);
        Ok(())
    }

    #[test]
    fn test_json_key_rejected() {
        let schema = Schema::from_pairs([("doc", LogicalType::JSON)]);
        assert!(matches!(
            Partitioner::new(&schema, vec![0], PartitionOrder::KeyOrder),
            Err(WindowError::InvalidKeyType(_))
        ));
    }

    #[test]
    fn test_estimated_bytes_counts_rows() -> Result<()> {
        let rows = orders();
        let expected: usize = rows.iter().map(|r| estimate_row_size(r)).sum();
        let partitioner = Partitioner::new(&schema(), vec![1], PartitionOrder::KeyOrder)?;
        let partitions = partitioner.partition(input(rows))?;
        let total: usize = partitions.iter().map(|p| p.estimated_bytes).sum();
        assert_eq!(total, expected);
        Ok(())
    }

    #[test]
    fn test_exhausted_partition_releases_rows() -> Result<()> {
        // 49 estimated bytes per row: F holds 3 rows (147), O reaches 196
        let partitioner = Partitioner::new(&schema(), vec![1], PartitionOrder::KeyOrder)?
            .with_memory_limit(Some(150));
        let partitions = partitioner.partition(input(orders()))?;

        let f = &partitions[0];
        assert!(!f.is_exhausted());
        assert_eq!(keys(f), vec![3, 5, 6]);
        assert_eq!(f.estimated_bytes, 147);

        let o = &partitions[1];
        assert!(o.is_exhausted());
        assert!(o.rows.is_empty());
        assert_eq!(o.rows.capacity(), 0);
        assert_eq!(o.len(), 4);
        assert_eq!(o.estimated_bytes, 196);
        Ok(())
    }

    #[test]
    fn test_rows_after_exhaustion_are_dropped() -> Result<()> {
        let rows: Vec<Row> = (0..50)
            .map(|i| vec![Value::bigint(i), Value::varchar("O")])
            .collect();
        let partitioner = Partitioner::new(&schema(), vec![1], PartitionOrder::KeyOrder)?
            .with_memory_limit(Some(100));
        let partitions = partitioner.partition(input(rows))?;

        assert_eq!(partitions.len(), 1);
        assert!(partitions[0].is_exhausted());
        assert!(partitions[0].rows.is_empty());
        assert_eq!(partitions[0].len(), 50);
        assert_eq!(partitions[0].estimated_bytes, 50 * 49);
        Ok(())
    }
}
