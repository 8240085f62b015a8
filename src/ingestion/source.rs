//! The fetch collaborator: anything that can hand over a sheet as a text grid.

use std::collections::HashMap;
use std::fmt;

use thiserror::Error;

use crate::error::BoxError;
use crate::grid::Grid;

/// Delivers the raw grid of one sheet. Row 0 is the header.
///
/// Implemented for closures, so tests and adapters can supply a source inline:
///
/// ```rust
/// use sheetbind::error::BoxError;
/// use sheetbind::grid::Grid;
/// use sheetbind::ingestion::GridSource;
///
/// let source = |_id: &str, sheet: &str| -> Result<Grid, BoxError> {
///     Ok(Grid::from_rows([vec!["sheet"], vec![sheet]]))
/// };
/// let grid = source.fetch("any", "orders").unwrap();
/// assert_eq!(grid.data_rows()[0][0], "orders");
/// ```
pub trait GridSource: Send + Sync {
    fn fetch(&self, source_id: &str, sheet: &str) -> Result<Grid, BoxError>;
}

impl<F> GridSource for F
where
    F: Fn(&str, &str) -> Result<Grid, BoxError> + Send + Sync,
{
    fn fetch(&self, source_id: &str, sheet: &str) -> Result<Grid, BoxError> {
        self(source_id, sheet)
    }
}

/// Returned by [`MemorySource`] for unknown workbooks or sheets.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("sheet {sheet:?} not found in source {source_id:?}")]
pub struct SheetNotFound {
    pub source_id: String,
    pub sheet: String,
}

/// In-memory workbooks, keyed by source id and sheet name.
#[derive(Default, Clone)]
pub struct MemorySource {
    books: HashMap<String, HashMap<String, Grid>>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add (or replace) a sheet, builder style.
    pub fn with_sheet(mut self, source_id: impl Into<String>, sheet: impl Into<String>, grid: Grid) -> Self {
        self.insert(source_id, sheet, grid);
        self
    }

    pub fn insert(&mut self, source_id: impl Into<String>, sheet: impl Into<String>, grid: Grid) {
        self.books
            .entry(source_id.into())
            .or_default()
            .insert(sheet.into(), grid);
    }
}

impl fmt::Debug for MemorySource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut sheets: Vec<(&str, &str)> = self
            .books
            .iter()
            .flat_map(|(id, book)| book.keys().map(move |sheet| (id.as_str(), sheet.as_str())))
            .collect();
        sheets.sort_unstable();
        f.debug_struct("MemorySource").field("sheets", &sheets).finish()
    }
}

impl GridSource for MemorySource {
    fn fetch(&self, source_id: &str, sheet: &str) -> Result<Grid, BoxError> {
        self.books
            .get(source_id)
            .and_then(|book| book.get(sheet))
            .cloned()
            .ok_or_else(|| {
                SheetNotFound {
                    source_id: source_id.to_string(),
                    sheet: sheet.to_string(),
                }
                .into()
            })
    }
}
