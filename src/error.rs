use std::fmt;
use std::num::{ParseFloatError, ParseIntError};

use thiserror::Error;

use crate::types::CellKind;

/// Convenience result type for parse operations.
pub type SheetResult<T> = Result<T, SheetError>;

/// Boxed error returned by [`crate::ingestion::GridSource`] implementations.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Error type returned by every parse entrypoint.
///
/// Variants fall into three groups:
///
/// - configuration faults (`NoSource`, `NoSourceId`, `NoSheetName`, `Settings`), raised before any fetch
/// - schema faults (`UnsupportedType`, `FieldNotFoundInSheet`, `FieldNotFoundInRecord`, `NoMapping`,
///   `Multiple`), raised once before any row is produced
/// - row faults (`Cell`), embedded in the result of the affected row only
#[derive(Debug, Error)]
pub enum SheetError {
    /// No [`crate::ingestion::GridSource`] was configured.
    #[error("no grid source registered")]
    NoSource,

    /// The data source identifier is empty.
    #[error("no source id provided")]
    NoSourceId,

    /// Neither an explicit sheet name nor a record name to derive one from.
    #[error("no sheet name provided")]
    NoSheetName,

    /// The grid source failed to deliver the sheet.
    #[error("failed to fetch sheet {sheet:?} from source {source_id:?}: {source}")]
    Fetch {
        source_id: String,
        sheet: String,
        source: BoxError,
    },

    /// The fetched sheet does not even contain a header row.
    #[error("sheet {sheet:?} has no header row")]
    EmptySheet { sheet: String },

    /// A field participating in a mapping has a type the converters cannot fill.
    #[error("unsupported type: field {field:?} of type {type_name:?} is unsupported")]
    UnsupportedType { field: String, type_name: &'static str },

    /// A record field has no matching header column (and skipping fields is disabled).
    #[error("field not found in sheet: {field:?} expects column {column:?}")]
    FieldNotFoundInSheet { field: String, column: String },

    /// A header column has no destination field (and skipping columns is disabled).
    #[error("field not found in record: column {column:?} at {cell}")]
    FieldNotFoundInRecord { column: String, cell: String },

    /// Column resolution produced zero mappings.
    #[error("no mapping found between record {record:?} and the sheet header")]
    NoMapping { record: String },

    /// Several faults reported together (e.g. every unmapped column).
    #[error(transparent)]
    Multiple(#[from] ErrorList),

    /// A single cell could not be converted; scoped to one row.
    #[error(transparent)]
    Cell(#[from] CellError),

    /// The cancellation token was triggered.
    #[error("parsing cancelled")]
    Cancelled,

    /// The configured deadline passed.
    #[error("parsing deadline exceeded")]
    DeadlineExceeded,

    /// Settings could not be decoded.
    #[error("invalid settings: {0}")]
    Settings(#[from] serde_json::Error),

    /// Underlying I/O error (e.g. settings file not found).
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// The worker pool for parallel materialization could not be built.
    #[error("failed to build worker pool: {0}")]
    WorkerPool(#[from] rayon::ThreadPoolBuildError),
}

/// Coarse classification of a [`SheetError`], for programmatic matching.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    NoSource,
    NoSourceId,
    NoSheetName,
    Fetch,
    EmptySheet,
    UnsupportedType,
    FieldNotFoundInSheet,
    FieldNotFoundInRecord,
    NoMapping,
    Multiple,
    Conversion,
    InvalidTimestamp,
    Cancelled,
    DeadlineExceeded,
    Settings,
    Io,
    WorkerPool,
}

impl SheetError {
    /// Classify this error. Cell errors report the kind of their underlying fault.
    pub fn kind(&self) -> ErrorKind {
        match self {
            SheetError::NoSource => ErrorKind::NoSource,
            SheetError::NoSourceId => ErrorKind::NoSourceId,
            SheetError::NoSheetName => ErrorKind::NoSheetName,
            SheetError::Fetch { .. } => ErrorKind::Fetch,
            SheetError::EmptySheet { .. } => ErrorKind::EmptySheet,
            SheetError::UnsupportedType { .. } => ErrorKind::UnsupportedType,
            SheetError::FieldNotFoundInSheet { .. } => ErrorKind::FieldNotFoundInSheet,
            SheetError::FieldNotFoundInRecord { .. } => ErrorKind::FieldNotFoundInRecord,
            SheetError::NoMapping { .. } => ErrorKind::NoMapping,
            SheetError::Multiple(_) => ErrorKind::Multiple,
            SheetError::Cell(cell) => match cell.fault() {
                CellFault::Convert(_) => ErrorKind::Conversion,
                CellFault::Timestamp(_) => ErrorKind::InvalidTimestamp,
            },
            SheetError::Cancelled => ErrorKind::Cancelled,
            SheetError::DeadlineExceeded => ErrorKind::DeadlineExceeded,
            SheetError::Settings(_) => ErrorKind::Settings,
            SheetError::Io(_) => ErrorKind::Io,
            SheetError::WorkerPool(_) => ErrorKind::WorkerPool,
        }
    }

    /// True if this error, or any error aggregated inside it, is of `kind`.
    pub fn has_kind(&self, kind: ErrorKind) -> bool {
        if self.kind() == kind {
            return true;
        }
        match self {
            SheetError::Multiple(list) => list.iter().any(|e| e.has_kind(kind)),
            _ => false,
        }
    }

    /// Faults detected while matching the record against the header.
    pub fn is_schema_fault(&self) -> bool {
        matches!(
            self,
            SheetError::UnsupportedType { .. }
                | SheetError::FieldNotFoundInSheet { .. }
                | SheetError::FieldNotFoundInRecord { .. }
                | SheetError::NoMapping { .. }
                | SheetError::EmptySheet { .. }
                | SheetError::Multiple(_)
        )
    }

    /// Faults scoped to a single data row.
    pub fn is_row_fault(&self) -> bool {
        matches!(self, SheetError::Cell(_))
    }

    /// The located cell error, if this is a row fault.
    pub fn cell_error(&self) -> Option<&CellError> {
        match self {
            SheetError::Cell(cell) => Some(cell),
            _ => None,
        }
    }
}

/// A list of faults reported as one error.
#[derive(Debug, Default)]
pub struct ErrorList(Vec<SheetError>);

impl ErrorList {
    pub fn new(errors: Vec<SheetError>) -> Self {
        Self(errors)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, SheetError> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn into_inner(self) -> Vec<SheetError> {
        self.0
    }
}

impl fmt::Display for ErrorList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, err) in self.0.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{err}")?;
        }
        Ok(())
    }
}

impl std::error::Error for ErrorList {}

impl<'a> IntoIterator for &'a ErrorList {
    type Item = &'a SheetError;
    type IntoIter = std::slice::Iter<'a, SheetError>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// A conversion fault located at a sheet cell and a record field.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{source}\n\tsheet: {sheet:?}\n\tcell: {cell:?}\n\tfield: {field:?}")]
pub struct CellError {
    /// Sheet name.
    pub sheet: String,
    /// Spreadsheet-style cell label, e.g. `B7`.
    pub cell: String,
    /// Dotted, fully qualified field path, e.g. `Order.customer.name`.
    pub field: String,
    source: CellFault,
}

impl CellError {
    pub fn new(
        sheet: impl Into<String>,
        cell: impl Into<String>,
        field: impl Into<String>,
        source: CellFault,
    ) -> Self {
        Self {
            sheet: sheet.into(),
            cell: cell.into(),
            field: field.into(),
            source,
        }
    }

    pub fn fault(&self) -> &CellFault {
        &self.source
    }
}

/// Why a cell could not be converted.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CellFault {
    #[error(transparent)]
    Convert(#[from] ConvertError),
    #[error(transparent)]
    Timestamp(#[from] InvalidTimestampError),
}

/// A literal that does not parse as the destination kind.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("conversion error, could not convert value {raw:?} into type \"{kind}\"")]
pub struct ConvertError {
    /// Offending cell text.
    pub raw: String,
    /// Destination kind.
    pub kind: CellKind,
    #[source]
    pub fault: ParseFault,
}

impl ConvertError {
    pub fn new(raw: impl Into<String>, kind: CellKind, fault: impl Into<ParseFault>) -> Self {
        Self {
            raw: raw.into(),
            kind,
            fault: fault.into(),
        }
    }
}

/// Underlying parser failure for a [`ConvertError`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseFault {
    #[error(transparent)]
    Int(#[from] ParseIntError),
    #[error(transparent)]
    Float(#[from] ParseFloatError),
    #[error("expected bool (true/false/t/f/1/0/yes/no)")]
    Bool,
    #[error("number out of range for {0}")]
    OutOfRange(CellKind),
}

/// No configured layout matched a timestamp literal.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid datetime format in value {raw:?}, recognized formats are: {formats:?}")]
pub struct InvalidTimestampError {
    /// Offending cell text.
    pub raw: String,
    /// Every layout that was tried, in order.
    pub formats: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn convert_error_message() {
        let err = ConvertError::new("test", CellKind::Bool, ParseFault::Bool);
        assert_eq!(
            err.to_string(),
            r#"conversion error, could not convert value "test" into type "bool""#
        );
        let source = std::error::Error::source(&err).unwrap();
        assert_eq!(source.to_string(), ParseFault::Bool.to_string());
    }

    #[test]
    fn invalid_timestamp_message_lists_formats() {
        let err = InvalidTimestampError {
            raw: "2024-12-31".to_string(),
            formats: vec!["%d.%m.%Y".to_string(), "%m/%d/%Y".to_string()],
        };
        assert_eq!(
            err.to_string(),
            r#"invalid datetime format in value "2024-12-31", recognized formats are: ["%d.%m.%Y", "%m/%d/%Y"]"#
        );
    }

    #[test]
    fn cell_error_renders_location_lines() {
        let fault = CellFault::from(ConvertError::new("x", CellKind::I32, "x".parse::<i32>().unwrap_err()));
        let err = CellError::new("test", "A1", "Type.Field", fault.clone());

        let expected = format!("{fault}\n\tsheet: \"test\"\n\tcell: \"A1\"\n\tfield: \"Type.Field\"");
        assert_eq!(err.to_string(), expected);
        assert_eq!(err.fault(), &fault);
    }

    #[test]
    fn has_kind_walks_aggregated_errors() {
        let err = SheetError::Multiple(ErrorList::new(vec![
            SheetError::FieldNotFoundInRecord {
                column: "a".to_string(),
                cell: "A1".to_string(),
            },
            SheetError::FieldNotFoundInRecord {
                column: "b".to_string(),
                cell: "B1".to_string(),
            },
        ]));
        assert_eq!(err.kind(), ErrorKind::Multiple);
        assert!(err.has_kind(ErrorKind::FieldNotFoundInRecord));
        assert!(!err.has_kind(ErrorKind::NoMapping));
        assert!(err.is_schema_fault());
        assert!(!err.is_row_fault());
    }

    #[test]
    fn cell_kind_reflects_fault() {
        let err = SheetError::from(CellError::new(
            "s",
            "B3",
            "T.f",
            CellFault::from(InvalidTimestampError {
                raw: "nope".to_string(),
                formats: vec![],
            }),
        ));
        assert_eq!(err.kind(), ErrorKind::InvalidTimestamp);
        assert!(err.is_row_fault());
        assert_eq!(err.cell_error().map(|c| c.cell.as_str()), Some("B3"));
    }
}
