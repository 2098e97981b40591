//! Window operator
//!
//! Evaluates one or more ranking functions that share an OVER clause:
//!
//! 1. hash-partition the source as it is read, releasing any partition
//!    that crosses the memory ceiling
//! 2. per partition: order, detect peer groups, evaluate every function in
//!    one pass and append the results
//!
//! Partitions are independent, so step 3 runs on the worker pool for large
//! inputs. The lazy [`WindowStream`] evaluates one partition per `next()`.

use crate::common::error::{Result, WindowError};
use crate::execution::context::{CancellationToken, ExecutionContext};
use crate::execution::orderer::order_partition;
use crate::execution::output::{assemble_partition, ExecutionStats, PartitionBatch, WindowOutput};
use crate::execution::partitioner::{Partition, Partitioner};
use crate::execution::peer_groups::detect_peer_groups;
use crate::expression::{evaluate_partition, WindowExpression, WindowFunctionType, WindowSpec};
use crate::source::{checked_rows, BoxedRowSource, RowSource};
use crate::types::{Row, Schema};
use std::time::Instant;
use tracing::{debug, info, trace};

/// Per-partition evaluation steps shared by the batch and streaming paths
#[derive(Debug, Clone)]
struct PartitionEvaluator {
    spec: WindowSpec,
    functions: Vec<WindowFunctionType>,
    memory_limit: Option<usize>,
    needs_peer_groups: bool,
}

impl PartitionEvaluator {
    fn evaluate(&self, partition: &Partition) -> Result<PartitionBatch> {
        if let Some(limit) = self.memory_limit {
            if partition.is_exhausted() || partition.estimated_bytes > limit {
                return Err(WindowError::ResourceExhausted {
                    partition: partition.id,
                    required: partition.estimated_bytes,
                    limit,
                });
            }
        }

        let rows = &partition.rows;
        let mut ordered: Vec<usize> = (0..rows.len()).collect();
        order_partition(rows, &mut ordered, &self.spec.order_by)?;
        let view: Vec<&Row> = ordered.iter().map(|&i| &rows[i]).collect();

        // row_number alone does not depend on peers
        let peer_groups = if self.needs_peer_groups {
            detect_peer_groups(&view, &self.spec.order_by)?
        } else if view.is_empty() {
            Vec::new()
        } else {
            vec![0..view.len()]
        };

        let results = evaluate_partition(&self.functions, view.len(), &peer_groups)?;
        let rows = assemble_partition(&view, results)?;
        trace!(
            partition = partition.id,
            rows = rows.len(),
            peer_groups = peer_groups.len(),
            "evaluated partition"
        );

        Ok(PartitionBatch {
            partition_id: partition.id,
            key: partition.key.values().to_vec(),
            rows,
        })
    }
}

/// Window operator over a single OVER clause
#[derive(Debug, Clone)]
pub struct WindowOperator {
    input_schema: Schema,
    output_schema: Schema,
    expressions: Vec<WindowExpression>,
    partitioner: Partitioner,
    evaluator: PartitionEvaluator,
    context: ExecutionContext,
}

impl WindowOperator {
    /// Create an operator; key columns are validated here, before any row is read
    pub fn new(
        input_schema: Schema,
        expressions: Vec<WindowExpression>,
        context: ExecutionContext,
    ) -> Result<Self> {
        let spec = match expressions.first() {
            Some(first) => first.spec.clone(),
            None => {
                return Err(WindowError::InvalidArgument(
                    "window operator needs at least one function".to_string(),
                ))
            }
        };
        if let Some(other) = expressions.iter().find(|e| e.spec != spec) {
            return Err(WindowError::InvalidArgument(format!(
                "{} uses {} but the operator evaluates {}",
                other.function_type,
                other.spec.display(&input_schema),
                spec.display(&input_schema)
            )));
        }

        spec.validate(&input_schema)?;
        let partitioner = Partitioner::new(
            &input_schema,
            spec.partition_by.clone(),
            context.config.partition_order,
        )?
        .with_memory_limit(context.config.partition_memory_limit);

        let functions: Vec<WindowFunctionType> =
            expressions.iter().map(|e| e.function_type).collect();
        let output_schema =
            input_schema.extended_unique(expressions.iter().map(|e| e.output_column()));
        let evaluator = PartitionEvaluator {
            needs_peer_groups: !functions.iter().all(|f| f.is_streamable()),
            spec,
            functions,
            memory_limit: context.config.partition_memory_limit,
        };

        debug!(
            functions = ?evaluator.functions,
            over = %evaluator.spec.display(&input_schema),
            "created window operator"
        );

        Ok(Self {
            input_schema,
            output_schema,
            expressions,
            partitioner,
            evaluator,
            context,
        })
    }

    pub fn input_schema(&self) -> &Schema {
        &self.input_schema
    }

    /// Input columns followed by one column per function
    ///
    /// An appended name that is already taken gets a `_N` suffix.
    pub fn output_schema(&self) -> &Schema {
        &self.output_schema
    }

    pub fn spec(&self) -> &WindowSpec {
        &self.evaluator.spec
    }

    pub fn expressions(&self) -> &[WindowExpression] {
        &self.expressions
    }

    /// Read and partition the whole input, returning the row count and partitions
    fn prepare<S: RowSource>(&self, source: S) -> Result<(usize, Vec<Partition>)> {
        if source.schema() != &self.input_schema {
            return Err(WindowError::InvalidArgument(format!(
                "source schema {} does not match operator schema {}",
                source.schema(),
                self.input_schema
            )));
        }

        let partitions = self.partitioner.partition(checked_rows(source))?;
        self.context.check_cancelled()?;
        let total_rows = partitions.iter().map(Partition::len).sum();
        Ok((total_rows, partitions))
    }

    /// Evaluate lazily, one partition per item
    pub fn execute<S: RowSource>(&self, source: S) -> Result<WindowStream> {
        let started = Instant::now();
        let (total_rows, partitions) = self.prepare(source)?;
        Ok(WindowStream {
            schema: self.output_schema.clone(),
            stats: ExecutionStats {
                rows_processed: total_rows,
                ..Default::default()
            },
            partitions: partitions.into_iter(),
            evaluator: self.evaluator.clone(),
            cancellation: self.context.cancellation.clone(),
            finished: false,
            started,
        })
    }

    /// Evaluate every partition and collect the output
    ///
    /// Any failing partition fails the whole evaluation.
    pub fn execute_collect<S: RowSource>(&self, source: S) -> Result<WindowOutput> {
        let started = Instant::now();
        let (total_rows, partitions) = self.prepare(source)?;

        let evaluate = |partition: &Partition| -> Result<PartitionBatch> {
            self.context.check_cancelled()?;
            self.evaluator.evaluate(partition)
        };

        let batches = if self.context.should_parallelize(total_rows, partitions.len()) {
            debug!(
                rows = total_rows,
                partitions = partitions.len(),
                threads = self.context.parallel_context.num_threads,
                "evaluating partitions in parallel"
            );
            self.context
                .parallel_context
                .try_map_ordered(&partitions, evaluate)
        } else {
            partitions.iter().map(evaluate).collect::<Result<Vec<_>>>()
        };
        let batches = batches.map_err(|e| {
            if matches!(e, WindowError::Cancelled) {
                info!("window evaluation cancelled");
            }
            e
        })?;

        let stats = ExecutionStats {
            rows_processed: total_rows,
            partitions_evaluated: batches.len(),
            execution_time_ms: started.elapsed().as_millis() as u64,
        };
        debug!(?stats, "window evaluation finished");

        Ok(WindowOutput {
            schema: self.output_schema.clone(),
            rows: batches.into_iter().flat_map(|b| b.rows).collect(),
            stats,
        })
    }
}

/// Lazily evaluated window output, one partition batch per item
///
/// A partition over the memory ceiling yields `ResourceExhausted` and the
/// stream moves on to the next partition. Cancellation yields `Cancelled`
/// once, after which the stream ends.
#[derive(Debug)]
pub struct WindowStream {
    schema: Schema,
    partitions: std::vec::IntoIter<Partition>,
    evaluator: PartitionEvaluator,
    cancellation: CancellationToken,
    finished: bool,
    stats: ExecutionStats,
    started: Instant,
}

impl WindowStream {
    /// Output schema of every batch row
    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// Partitions not yet evaluated
    pub fn remaining_partitions(&self) -> usize {
        if self.finished {
            0
        } else {
            self.partitions.len()
        }
    }

    /// Statistics for the partitions evaluated so far
    pub fn stats(&self) -> ExecutionStats {
        ExecutionStats {
            execution_time_ms: self.started.elapsed().as_millis() as u64,
            ..self.stats.clone()
        }
    }

    /// Flatten into a row source, so another operator can consume it
    pub fn into_rows(self) -> WindowRowStream {
        WindowRowStream {
            schema: self.schema.clone(),
            stream: self,
            current: Vec::new().into_iter(),
        }
    }

    /// Drain the stream, failing on the first error
    pub fn collect_output(mut self) -> Result<WindowOutput> {
        let mut rows = Vec::new();
        for batch in self.by_ref() {
            rows.extend(batch?.rows);
        }
        Ok(WindowOutput {
            schema: self.schema.clone(),
            rows,
            stats: self.stats(),
        })
    }
}

impl Iterator for WindowStream {
    type Item = Result<PartitionBatch>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }
        if self.partitions.len() == 0 {
            self.finished = true;
            return None;
        }
        if self.cancellation.is_cancelled() {
            self.finished = true;
            info!(
                remaining = self.partitions.len(),
                "window evaluation cancelled"
            );
            return Some(Err(WindowError::Cancelled));
        }

        let partition = self.partitions.next()?;
        match self.evaluator.evaluate(&partition) {
            Ok(batch) => {
                self.stats.partitions_evaluated += 1;
                Some(Ok(batch))
            }
            Err(e) if e.is_partition_local() => Some(Err(e)),
            Err(e) => {
                self.finished = true;
                Some(Err(e))
            }
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.remaining_partitions();
        (0, Some(remaining + 1))
    }
}

/// Row-at-a-time view of a [`WindowStream`]
#[derive(Debug)]
pub struct WindowRowStream {
    schema: Schema,
    stream: WindowStream,
    current: std::vec::IntoIter<Row>,
}

impl WindowRowStream {
    pub fn stats(&self) -> ExecutionStats {
        self.stream.stats()
    }
}

impl Iterator for WindowRowStream {
    type Item = Result<Row>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(row) = self.current.next() {
                return Some(Ok(row));
            }
            match self.stream.next()? {
                Ok(batch) => self.current = batch.rows.into_iter(),
                Err(e) => return Some(Err(e)),
            }
        }
    }
}

impl RowSource for WindowRowStream {
    fn schema(&self) -> &Schema {
        &self.schema
    }
}

/// Evaluate window function calls that may use different OVER clauses
///
/// Calls are grouped by OVER clause in order of first use; one operator per
/// group is chained onto the previous one. The appended columns are laid
/// out in call order. Rows come out in the order of the last group's
/// partitioning and ordering.
pub fn evaluate_window_functions<S: RowSource + 'static>(
    source: S,
    expressions: &[WindowExpression],
    context: &ExecutionContext,
) -> Result<WindowOutput> {
    if expressions.is_empty() {
        return Err(WindowError::InvalidArgument(
            "no window functions to evaluate".to_string(),
        ));
    }

    let mut groups: Vec<(WindowSpec, Vec<usize>)> = Vec::new();
    for (i, expr) in expressions.iter().enumerate() {
        match groups.iter_mut().find(|(spec, _)| spec == &expr.spec) {
            Some((_, members)) => members.push(i),
            None => groups.push((expr.spec.clone(), vec![i])),
        }
    }
    debug!(
        calls = expressions.len(),
        operators = groups.len(),
        "planning window evaluation"
    );

    // Settle output names in call order so chained operators never rename
    let base_width = source.schema().len();
    let named = source
        .schema()
        .extended_unique(expressions.iter().map(|e| e.output_column()));
    let expressions: Vec<WindowExpression> = expressions
        .iter()
        .zip(&named.columns()[base_width..])
        .map(|(expr, column)| expr.clone().with_alias(column.name.clone()))
        .collect();

    let started = Instant::now();
    let mut appended: Vec<usize> = Vec::with_capacity(expressions.len());
    let mut current: BoxedRowSource = Box::new(source);
    let last = groups.len() - 1;

    for (g, (_, members)) in groups.iter().enumerate() {
        let group_exprs: Vec<WindowExpression> =
            members.iter().map(|&i| expressions[i].clone()).collect();
        let operator = WindowOperator::new(current.schema().clone(), group_exprs, context.clone())?;
        appended.extend(members);

        if g < last {
            current = Box::new(operator.execute(current)?.into_rows());
            continue;
        }

        let mut output = operator.execute_collect(current)?;
        if groups.len() > 1 {
            reorder_appended(&mut output, base_width, &appended);
        }
        output.stats.execution_time_ms = started.elapsed().as_millis() as u64;
        return Ok(output);
    }

    Err(WindowError::Internal(
        "window evaluation produced no operator".to_string(),
    ))
}

/// Move appended columns from operator order into call order
///
/// `appended[k]` is the call whose value sits at column `base_width + k`.
fn reorder_appended(output: &mut WindowOutput, base_width: usize, appended: &[usize]) {
    let mut position = vec![0usize; appended.len()];
    for (k, &call) in appended.iter().enumerate() {
        position[call] = k;
    }

    let columns = output.schema.columns();
    let reordered = position
        .iter()
        .map(|&k| columns[base_width + k].clone())
        .collect::<Vec<_>>();
    output.schema = Schema::new(columns[..base_width].to_vec()).extended(reordered);

    for row in output.rows.iter_mut() {
        let tail: Vec<_> = row.drain(base_width..).collect();
        row.extend(position.iter().map(|&k| tail[k].clone()));
    }
}
