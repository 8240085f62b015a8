//! CSV-backed grid source.

use std::io::Read;
use std::path::{Path, PathBuf};

use crate::error::BoxError;
use crate::grid::Grid;

use super::source::GridSource;

/// Reads sheets from CSV files: the source id is a directory and each sheet is
/// `<directory>/<sheet>.csv`.
///
/// Records may have differing lengths; every cell is kept verbatim (no trimming), and the
/// first line is the header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CsvSource {
    /// Field delimiter.
    pub delimiter: u8,
}

impl Default for CsvSource {
    fn default() -> Self {
        Self { delimiter: b',' }
    }
}

impl CsvSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_delimiter(delimiter: u8) -> Self {
        Self { delimiter }
    }

    /// Path of `sheet` inside `source_id`.
    pub fn sheet_path(source_id: impl AsRef<Path>, sheet: &str) -> PathBuf {
        source_id.as_ref().join(format!("{sheet}.csv"))
    }

    /// Read a grid from a CSV file.
    pub fn read_path(&self, path: impl AsRef<Path>) -> Result<Grid, csv::Error> {
        let mut rdr = self.builder().from_path(path)?;
        read_grid(&mut rdr)
    }

    /// Read a grid from any reader.
    pub fn read_from<R: Read>(&self, input: R) -> Result<Grid, csv::Error> {
        let mut rdr = self.builder().from_reader(input);
        read_grid(&mut rdr)
    }

    fn builder(&self) -> csv::ReaderBuilder {
        let mut builder = csv::ReaderBuilder::new();
        builder.has_headers(false).flexible(true).delimiter(self.delimiter);
        builder
    }
}

impl GridSource for CsvSource {
    fn fetch(&self, source_id: &str, sheet: &str) -> Result<Grid, BoxError> {
        Ok(self.read_path(Self::sheet_path(source_id, sheet))?)
    }
}

/// Collect every record of `rdr` (header included) into a grid.
///
/// The reader should be built with `has_headers(false)` so the header stays row 0.
pub fn read_grid<R: Read>(rdr: &mut csv::Reader<R>) -> Result<Grid, csv::Error> {
    let mut rows = Vec::new();
    for record in rdr.records() {
        let record = record?;
        rows.push(record.iter().map(str::to_owned).collect());
    }
    Ok(Grid::new(rows))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keeps_ragged_rows_and_whitespace() {
        let grid = CsvSource::new()
            .read_from("a,b,c\n1\n x ,2,3,4\n".as_bytes())
            .unwrap();
        assert_eq!(grid.rows().len(), 3);
        assert_eq!(grid.rows()[1], vec!["1"]);
        assert_eq!(grid.rows()[2][0], " x ");
        assert_eq!(grid.width(), 4);
    }

    #[test]
    fn custom_delimiter() {
        let grid = CsvSource::with_delimiter(b';').read_from("a;b\n1;2\n".as_bytes()).unwrap();
        assert_eq!(grid.header().unwrap(), ["a", "b"]);
    }

    #[test]
    fn missing_file_is_a_fetch_error() {
        let err = CsvSource::new().fetch("/definitely/not/here", "orders").unwrap_err();
        assert!(err.downcast_ref::<csv::Error>().is_some());
    }
}
