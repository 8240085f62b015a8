//! Raw text grids as delivered by a [`crate::ingestion::GridSource`].
//!
//! Row 0 is the header. Sources may omit trailing blank cells, so a fetched grid can be ragged;
//! [`Grid::normalize`] pads it to a rectangle before rows are materialized.

/// A 2-D grid of text cells.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Grid {
    rows: Vec<Vec<String>>,
}

impl Grid {
    /// Create a grid from owned rows.
    pub fn new(rows: Vec<Vec<String>>) -> Self {
        Self { rows }
    }

    /// Create a grid from anything that yields rows of string-like cells.
    ///
    /// ```rust
    /// use sheetbind::grid::Grid;
    ///
    /// let grid = Grid::from_rows([vec!["id", "name"], vec!["1"]]);
    /// assert_eq!(grid.width(), 2);
    /// assert_eq!(grid.data_rows().len(), 1);
    /// ```
    pub fn from_rows<I, R, S>(rows: I) -> Self
    where
        I: IntoIterator<Item = R>,
        R: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            rows: rows
                .into_iter()
                .map(|row| row.into_iter().map(Into::into).collect())
                .collect(),
        }
    }

    /// All rows, header included.
    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    /// The header row, if the grid has any rows.
    pub fn header(&self) -> Option<&[String]> {
        self.rows.first().map(Vec::as_slice)
    }

    /// Rows after the header.
    pub fn data_rows(&self) -> &[Vec<String>] {
        self.rows.get(1..).unwrap_or_default()
    }

    /// Number of rows after the header.
    pub fn row_count(&self) -> usize {
        self.data_rows().len()
    }

    /// Width of the widest row.
    pub fn width(&self) -> usize {
        self.rows.iter().map(Vec::len).max().unwrap_or(0)
    }

    pub fn is_rectangular(&self) -> bool {
        let width = self.width();
        self.rows.iter().all(|row| row.len() == width)
    }

    /// Pad every row with empty cells up to the width of the widest row.
    pub fn normalize(&mut self) {
        let width = self.width();
        for row in &mut self.rows {
            row.resize(width, String::new());
        }
    }

    pub fn into_rows(self) -> Vec<Vec<String>> {
        self.rows
    }
}

/// Spreadsheet-style label for a zero-based column index: 0 → `A`, 25 → `Z`, 26 → `AA`.
pub fn column_label(index: usize) -> String {
    let mut buf = Vec::new();
    let mut col = index;
    loop {
        buf.push(b'A' + (col % 26) as u8);
        col /= 26;
        if col == 0 {
            break;
        }
        col -= 1;
    }
    buf.reverse();
    buf.into_iter().map(char::from).collect()
}

/// Label for a cell given its zero-based column and one-based row, e.g. `C7`.
pub fn cell_label(column: usize, row: usize) -> String {
    format!("{}{row}", column_label(column))
}
