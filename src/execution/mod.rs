//! Row materialization.
//!
//! This module sits between [`crate::schema`] and the entrypoints in [`crate::ingestion`]:
//!
//! - [`RowMaterializer`] turns one grid row into a record using resolved mappings
//! - [`Rows`] is the lazy, cancellable, single-pass row sequence returned by
//!   [`crate::ingestion::parse_all`]
//! - [`parallel`] materializes a whole grid on a rayon pool

mod cancel;
pub mod parallel;

use std::fmt;

use crate::error::{CellError, SheetResult};
use crate::grid::{cell_label, Grid};
use crate::ingestion::observability::{ParseStats, Reporter};
use crate::schema::{Conversion, Mapping, Record};

pub use cancel::{CancelToken, Interrupt};
pub use parallel::ExecutionOptions;

/// Display row of the first data row (row 1 is the header).
pub const FIRST_DATA_ROW: usize = 2;

/// Applies a resolved mapping list to grid rows.
pub struct RowMaterializer<R> {
    mappings: Vec<Mapping<R>>,
    layouts: Vec<String>,
    sheet: String,
    record: &'static str,
}

impl<R: Record> RowMaterializer<R> {
    /// `layouts` is the full ordered timestamp layout list.
    pub fn new(mappings: Vec<Mapping<R>>, layouts: Vec<String>, sheet: impl Into<String>) -> Self {
        Self {
            mappings,
            layouts,
            sheet: sheet.into(),
            record: R::record_name(),
        }
    }

    pub fn mappings(&self) -> &[Mapping<R>] {
        &self.mappings
    }

    pub fn sheet(&self) -> &str {
        &self.sheet
    }

    /// Build one record from `row`.
    ///
    /// Empty cells leave their field at its default and allocate nothing. The first failing cell
    /// aborts the row; `display_row` is the one-based grid row used in its cell label.
    pub fn materialize(&self, row: &[String], display_row: usize) -> SheetResult<R> {
        let mut record = R::default();
        for mapping in &self.mappings {
            // Unsupported leaves never survive resolution.
            let Conversion::Convert(converter) = mapping.binding.conversion else {
                continue;
            };
            let raw = row.get(mapping.column).map(String::as_str).unwrap_or_default();

            match converter.convert(raw, &self.layouts) {
                Ok(Some(value)) => mapping.binding.write(&mut record, value),
                Ok(None) => {}
                Err(fault) => {
                    return Err(CellError::new(
                        self.sheet.as_str(),
                        cell_label(mapping.column, display_row),
                        mapping.binding.qualified_name(self.record),
                        fault,
                    )
                    .into());
                }
            }
        }
        Ok(record)
    }
}

impl<R> fmt::Debug for RowMaterializer<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RowMaterializer")
            .field("record", &self.record)
            .field("sheet", &self.sheet)
            .field("mappings", &self.mappings.len())
            .field("layouts", &self.layouts)
            .finish()
    }
}

/// Lazy sequence of `(display row, record or row fault)` pairs.
///
/// Each call to `next` checks the cancellation token and then converts exactly one row.
/// Dropping the iterator early converts nothing further. Once halted by cancellation the
/// sequence ends and [`Rows::status`] reports why.
pub struct Rows<R> {
    materializer: RowMaterializer<R>,
    grid: Grid,
    next: usize,
    cancel: CancelToken,
    halted: Option<Interrupt>,
    done: bool,
    stats: ParseStats,
    reporter: Reporter,
}

impl<R: Record> Rows<R> {
    pub(crate) fn new(materializer: RowMaterializer<R>, grid: Grid, cancel: CancelToken, reporter: Reporter) -> Self {
        Self {
            materializer,
            grid,
            next: 0,
            cancel,
            halted: None,
            done: false,
            stats: ParseStats::default(),
            reporter,
        }
    }

    /// `Err` if production was stopped by cancellation or a deadline.
    pub fn status(&self) -> SheetResult<()> {
        match self.halted {
            Some(interrupt) => Err(interrupt.into()),
            None => Ok(()),
        }
    }

    /// Rows produced so far.
    pub fn stats(&self) -> ParseStats {
        self.stats
    }

    /// Data rows not yet produced.
    pub fn remaining(&self) -> usize {
        if self.done {
            0
        } else {
            self.grid.row_count() - self.next
        }
    }

    pub fn materializer(&self) -> &RowMaterializer<R> {
        &self.materializer
    }
}

impl<R: Record> Iterator for Rows<R> {
    type Item = (usize, SheetResult<R>);

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        if self.next >= self.grid.row_count() {
            self.done = true;
            self.reporter.success(self.stats);
            return None;
        }
        if let Err(interrupt) = self.cancel.check() {
            self.done = true;
            self.halted = Some(interrupt);
            self.reporter.failure(&interrupt.into());
            return None;
        }

        let index = self.next;
        self.next += 1;
        let display_row = index + FIRST_DATA_ROW;
        let result = self
            .materializer
            .materialize(&self.grid.data_rows()[index], display_row);

        self.stats.rows += 1;
        if let Err(err) = &result {
            self.stats.failed_rows += 1;
            self.reporter.failure(err);
        }
        Some((display_row, result))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (0, Some(self.remaining()))
    }
}

impl<R> fmt::Debug for Rows<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Rows")
            .field("materializer", &self.materializer)
            .field("next", &self.next)
            .field("rows", &self.grid.row_count())
            .field("halted", &self.halted)
            .field("done", &self.done)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::convert::datetime_layouts;
    use crate::error::{ErrorKind, SheetError};
    use crate::ingestion::observability::ParseContext;
    use crate::schema::{resolve, walk, Fields, ResolveOptions};

    #[derive(Debug, Default, PartialEq)]
    struct Inner {
        x: i8,
        y: Option<String>,
    }

    impl Record for Inner {
        fn describe(fields: &mut Fields<Self>) {
            fields.field("x", |r: &mut Inner| &mut r.x);
            fields.field("y", |r: &mut Inner| &mut r.y);
        }
    }

    #[derive(Debug, Default, PartialEq)]
    struct Outer {
        id: u32,
        inner: Option<Inner>,
    }

    impl Record for Outer {
        fn describe(fields: &mut Fields<Self>) {
            fields.field("id", |r: &mut Outer| &mut r.id);
            fields.nested_option("inner", |r: &mut Outer| &mut r.inner);
        }
    }

    fn materializer(header: &[&str]) -> RowMaterializer<Outer> {
        let header: Vec<String> = header.iter().map(|s| s.to_string()).collect();
        let mappings = resolve(&walk::<Outer>("sheet"), &header, "Outer", ResolveOptions::default()).unwrap();
        RowMaterializer::new(mappings, datetime_layouts(&[], &[]), "outers")
    }

    fn row(cells: &[&str]) -> Vec<String> {
        cells.iter().map(|s| s.to_string()).collect()
    }

    fn rows(grid: Grid, cancel: CancelToken) -> Rows<Outer> {
        let reporter = Reporter::new(
            None,
            crate::ingestion::ParseSeverity::Critical,
            ParseContext {
                source_id: "mem".to_string(),
                sheet: "outers".to_string(),
                record: "Outer".to_string(),
            },
        );
        Rows::new(materializer(&["id", "x", "y"]), grid, cancel, reporter)
    }

    #[test]
    fn empty_leaves_keep_optional_record_unallocated() {
        let m = materializer(&["id", "x", "y"]);
        let rec = m.materialize(&row(&["7", "", ""]), 2).unwrap();
        assert_eq!(rec, Outer { id: 7, inner: None });

        let rec = m.materialize(&row(&["", "", "hi"]), 3).unwrap();
        assert_eq!(
            rec,
            Outer {
                id: 0,
                inner: Some(Inner {
                    x: 0,
                    y: Some("hi".to_string())
                })
            }
        );
    }

    #[test]
    fn cell_fault_is_located() {
        let m = materializer(&["y", "id", "x"]);
        let err = m.materialize(&row(&["a", "1", "200"]), 5).unwrap_err();
        let cell = err.cell_error().unwrap();
        assert_eq!(cell.sheet, "outers");
        assert_eq!(cell.cell, "C5");
        assert_eq!(cell.field, "Outer.inner.x");
        assert_eq!(err.kind(), ErrorKind::Conversion);
    }

    #[test]
    fn rows_are_numbered_from_the_first_data_row() {
        let grid = Grid::from_rows([vec!["id", "x", "y"], vec!["1", "", ""], vec!["2", "1", ""]]);
        let out: Vec<(usize, Outer)> = rows(grid, CancelToken::new())
            .map(|(n, r)| (n, r.unwrap()))
            .collect();
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].0, 2);
        assert_eq!(out[1].0, 3);
        assert_eq!(out[1].1.inner.as_ref().map(|i| i.x), Some(1));
    }

    #[test]
    fn cancelled_sequence_stops_and_reports_status() {
        let grid = Grid::from_rows([vec!["id", "x", "y"], vec!["1", "", ""], vec!["2", "", ""], vec!["3", "", ""]]);
        let token = CancelToken::new();
        let mut seq = rows(grid, token.clone());

        assert!(seq.next().unwrap().1.is_ok());
        token.cancel();
        assert!(seq.next().is_none());
        assert!(seq.next().is_none());
        assert!(matches!(seq.status(), Err(SheetError::Cancelled)));
        assert_eq!(seq.stats().rows, 1);
        assert_eq!(seq.remaining(), 0);
    }
}
