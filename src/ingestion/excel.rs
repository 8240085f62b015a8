#![cfg(feature = "excel")]

use std::path::Path;

use calamine::{open_workbook_auto, Data, Range, Reader};
use chrono::Timelike;

use crate::error::BoxError;
use crate::grid::Grid;

use super::source::GridSource;

/// Reads sheets from workbooks (`.xlsx`, `.xls`, `.ods`, etc.): the source id is the workbook
/// path and the sheet is a worksheet name.
///
/// Behavior:
/// - Every cell is rendered to text the way the converters expect it
/// - The used range is padded with empty rows/cells up to `A1`, so row 0 is the sheet's first
///   row and cell labels match the workbook
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExcelSource;

impl ExcelSource {
    pub fn new() -> Self {
        Self
    }

    /// Read one worksheet into a grid.
    pub fn read_sheet(&self, path: impl AsRef<Path>, sheet: &str) -> Result<Grid, calamine::Error> {
        let mut workbook = open_workbook_auto(path)?;
        let range = workbook.worksheet_range(sheet)?;
        Ok(range_to_grid(&range))
    }
}

impl GridSource for ExcelSource {
    fn fetch(&self, source_id: &str, sheet: &str) -> Result<Grid, BoxError> {
        Ok(self.read_sheet(source_id, sheet)?)
    }
}

fn range_to_grid(range: &Range<Data>) -> Grid {
    let (skip_rows, skip_cols) = range
        .start()
        .map(|(row, col)| (row as usize, col as usize))
        .unwrap_or_default();

    let mut rows: Vec<Vec<String>> = vec![Vec::new(); skip_rows];
    for row in range.rows() {
        let mut out = vec![String::new(); skip_cols];
        out.extend(row.iter().map(cell_to_string));
        rows.push(out);
    }
    Grid::new(rows)
}

fn cell_to_string(c: &Data) -> String {
    match c {
        Data::String(s) => s.clone(),
        Data::Int(i) => i.to_string(),
        Data::Float(f) => {
            if f.fract() == 0.0 && f.abs() < 1e15 {
                (*f as i64).to_string()
            } else {
                f.to_string()
            }
        }
        Data::Bool(b) => b.to_string(),
        Data::DateTime(dt) => match dt.as_datetime() {
            Some(naive) if naive.num_seconds_from_midnight() == 0 => naive.format("%Y-%m-%d").to_string(),
            Some(naive) => naive.format("%Y-%m-%d %H:%M:%S").to_string(),
            None => dt.to_string(),
        },
        Data::DateTimeIso(s) => s.clone(),
        Data::DurationIso(s) => s.clone(),
        Data::Error(e) => format!("{e:?}"),
        Data::Empty => String::new(),
    }
}
