//! Chunked parallel materialization on a dedicated rayon pool.

use std::ops::Range;

use rayon::prelude::*;
use rayon::ThreadPoolBuilder;
use tracing::debug;

use crate::error::SheetResult;
use crate::schema::Record;

use super::{CancelToken, Interrupt, RowMaterializer};

/// Configuration for parallel materialization.
#[derive(Debug, Clone)]
pub struct ExecutionOptions {
    /// Number of worker threads.
    ///
    /// If `None`, uses the platform's available parallelism.
    pub num_threads: Option<usize>,
    /// Number of rows per chunk. Cancellation is checked once per chunk.
    pub chunk_size: usize,
}

impl Default for ExecutionOptions {
    fn default() -> Self {
        let n = std::thread::available_parallelism().map(|n| n.get()).unwrap_or(1);
        Self {
            num_threads: Some(n),
            chunk_size: 4_096,
        }
    }
}

/// Materialize every row of `rows` in order.
///
/// `first_display_row` is the display row of `rows[0]`. Returns the first row fault in row
/// order, or the interruption if the token fired while chunks were running.
pub fn materialize_parallel<R: Record>(
    materializer: &RowMaterializer<R>,
    rows: &[Vec<String>],
    first_display_row: usize,
    cancel: &CancelToken,
    opts: &ExecutionOptions,
) -> SheetResult<Vec<R>> {
    let n_threads = opts
        .num_threads
        .unwrap_or_else(|| std::thread::available_parallelism().map(|n| n.get()).unwrap_or(1))
        .max(1);
    let pool = ThreadPoolBuilder::new().num_threads(n_threads).build()?;
    let ranges = chunk_ranges(rows.len(), opts.chunk_size.max(1));
    debug!(rows = rows.len(), chunks = ranges.len(), threads = n_threads, "materializing in parallel");

    let per_chunk: Vec<Result<SheetResult<Vec<R>>, Interrupt>> = pool.install(|| {
        ranges
            .into_par_iter()
            .map(|range| -> Result<SheetResult<Vec<R>>, Interrupt> {
                cancel.check()?;
                let start = range.start;
                Ok(rows[range]
                    .iter()
                    .enumerate()
                    .map(|(i, row)| materializer.materialize(row, first_display_row + start + i))
                    .collect())
            })
            .collect()
    });

    if let Some(interrupt) = per_chunk.iter().find_map(|chunk| chunk.as_ref().err()) {
        return Err((*interrupt).into());
    }

    let mut out = Vec::with_capacity(rows.len());
    for chunk in per_chunk.into_iter().flatten() {
        out.extend(chunk?);
    }
    Ok(out)
}

fn chunk_ranges(row_count: usize, chunk_size: usize) -> Vec<Range<usize>> {
    let mut out = Vec::with_capacity(row_count.div_ceil(chunk_size));
    let mut start = 0usize;
    while start < row_count {
        let end = (start + chunk_size).min(row_count);
        out.push(start..end);
        start = end;
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::convert::datetime_layouts;
    use crate::error::SheetError;
    use crate::schema::{resolve, walk, Fields, ResolveOptions};

    #[derive(Debug, Default, PartialEq)]
    struct Num {
        n: i64,
    }

    impl Record for Num {
        fn describe(fields: &mut Fields<Self>) {
            fields.field("n", |r: &mut Num| &mut r.n);
        }
    }

    fn materializer() -> RowMaterializer<Num> {
        let mappings = resolve(&walk::<Num>("sheet"), &["n".to_string()], "Num", ResolveOptions::default()).unwrap();
        RowMaterializer::new(mappings, datetime_layouts(&[], &[]), "nums")
    }

    fn opts() -> ExecutionOptions {
        ExecutionOptions {
            num_threads: Some(4),
            chunk_size: 7,
        }
    }

    #[test]
    fn chunk_ranges_cover_all_rows() {
        assert!(chunk_ranges(0, 3).is_empty());
        assert_eq!(chunk_ranges(7, 3), vec![0..3, 3..6, 6..7]);
    }

    #[test]
    fn keeps_row_order() {
        let rows: Vec<Vec<String>> = (0..100).map(|i| vec![i.to_string()]).collect();
        let out = materialize_parallel(&materializer(), &rows, 2, &CancelToken::new(), &opts()).unwrap();
        assert_eq!(out.len(), 100);
        assert!(out.iter().enumerate().all(|(i, r)| r.n == i as i64));
    }

    #[test]
    fn first_fault_in_row_order_wins() {
        let mut rows: Vec<Vec<String>> = (0..50).map(|i| vec![i.to_string()]).collect();
        rows[40][0] = "late".to_string();
        rows[9][0] = "early".to_string();
        let err = materialize_parallel(&materializer(), &rows, 2, &CancelToken::new(), &opts()).unwrap_err();
        assert_eq!(err.cell_error().unwrap().cell, "A11");
    }

    #[test]
    fn cancelled_token_interrupts() {
        let rows: Vec<Vec<String>> = (0..10).map(|i| vec![i.to_string()]).collect();
        let token = CancelToken::new();
        token.cancel();
        let err = materialize_parallel(&materializer(), &rows, 2, &token, &opts()).unwrap_err();
        assert!(matches!(err, SheetError::Cancelled));
    }
}
