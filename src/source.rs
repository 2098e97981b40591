//! Row sources
//!
//! A row source is a finite, fallible stream of rows sharing one schema.
//! Window operators consume sources and the lazy operator output is itself a
//! source, so operators chain.

use crate::common::error::Result;
use crate::types::{Row, Schema};

/// Stream of rows with a known schema
pub trait RowSource: Iterator<Item = Result<Row>> + Send {
    /// Schema every row conforms to
    fn schema(&self) -> &Schema;
}

/// Boxed row source
pub type BoxedRowSource = Box<dyn RowSource>;

impl RowSource for BoxedRowSource {
    fn schema(&self) -> &Schema {
        (**self).schema()
    }
}

/// Rows of a source, each checked against the source schema
pub fn checked_rows<S: RowSource>(source: S) -> impl Iterator<Item = Result<Row>> {
    let schema = source.schema().clone();
    source.map(move |row| {
        let row = row?;
        schema.check_row(&row)?;
        Ok(row)
    })
}

/// Row source over rows already in memory
#[derive(Debug, Clone)]
pub struct MaterializedRows {
    schema: Schema,
    rows: std::vec::IntoIter<Row>,
}

impl MaterializedRows {
    pub fn new(schema: Schema, rows: Vec<Row>) -> Self {
        Self {
            schema,
            rows: rows.into_iter(),
        }
    }

    pub fn empty(schema: Schema) -> Self {
        Self::new(schema, Vec::new())
    }
}

impl Iterator for MaterializedRows {
    type Item = Result<Row>;

    fn next(&mut self) -> Option<Self::Item> {
        self.rows.next().map(Ok)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.rows.size_hint()
    }
}

impl RowSource for MaterializedRows {
    fn schema(&self) -> &Schema {
        &self.schema
    }
}
