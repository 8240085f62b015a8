//! `sheetbind` binds spreadsheet-like grids (a header row followed by rows of text cells) into
//! strongly-typed Rust records.
//!
//! The primary entrypoints are [`ingestion::parse_all`] (a lazy sequence with one result per
//! row) and [`ingestion::parse_all_into_list`] (all records, or the first fault).
//!
//! ## How a sheet is bound
//!
//! 1. A record type implements [`schema::Record`] and lists its fields once. Nested records are
//!    flattened into their leaf fields; `Option<SubRecord>` fields are only allocated when one
//!    of their leaves actually receives a value.
//! 2. The flattened leaves are matched against the header by column name (the field name, or an
//!    annotation such as `.tag("sheet", "Display Name")`).
//! 3. Each data row is converted cell by cell. An empty cell leaves its field at the default.
//!
//! **Supported leaf types:** `bool`, every signed/unsigned integer width, `f32`, `f64`,
//! `String`, [`types::Timestamp`], `chrono::DateTime<Utc>`, and `Option` of each.
//!
//! ## Quick example
//!
//! ```rust
//! use std::sync::Arc;
//!
//! use sheetbind::grid::Grid;
//! use sheetbind::ingestion::{parse_all_into_list, MemorySource, ParseOptions};
//! use sheetbind::schema::{Fields, Record};
//!
//! #[derive(Debug, Default, PartialEq)]
//! struct Address {
//!     city: String,
//! }
//!
//! impl Record for Address {
//!     fn describe(fields: &mut Fields<Self>) {
//!         fields.field("city", |a: &mut Address| &mut a.city);
//!     }
//! }
//!
//! #[derive(Debug, Default, PartialEq)]
//! struct Customer {
//!     id: u32,
//!     name: String,
//!     address: Option<Address>,
//! }
//!
//! impl Record for Customer {
//!     fn describe(fields: &mut Fields<Self>) {
//!         fields.field("id", |c: &mut Customer| &mut c.id);
//!         fields.field("name", |c: &mut Customer| &mut c.name).tag("sheet", "Full Name");
//!         fields.nested_option("address", |c: &mut Customer| &mut c.address);
//!     }
//! }
//!
//! # fn main() -> Result<(), sheetbind::SheetError> {
//! let grid = Grid::from_rows([
//!     vec!["Full Name", "id", "city"],
//!     vec!["Ada", "1", "London"],
//!     vec!["Alan", "2", ""],
//! ]);
//! let source = MemorySource::new().with_sheet("crm", "Customers", grid);
//! let options = ParseOptions::new(Arc::new(source), "crm");
//!
//! let customers = parse_all_into_list::<Customer>(&options)?;
//! assert_eq!(customers[0].address, Some(Address { city: "London".to_string() }));
//! assert_eq!(customers[1].address, None);
//! # Ok(())
//! # }
//! ```
//!
//! ## Modules
//!
//! - [`ingestion`]: parse entrypoints, options, observers and grid sources (memory, CSV, Excel)
//! - [`schema`]: record description, field flattening and column resolution
//! - [`execution`]: row materialization, the lazy row sequence, cancellation, parallel runs
//! - [`convert`]: cell converters and timestamp layouts
//! - [`grid`]: raw text grids and cell labels
//! - [`error`]: error types used across parsing
//!
//! ## Errors
//!
//! Configuration and schema faults are returned before any row is produced. Conversion faults
//! are scoped to their row and carry the sheet, cell label (e.g. `C7`) and field path:
//!
//! ```text
//! conversion error, could not convert value "abc" into type "u32"
//! 	sheet: "Customers"
//! 	cell: "B3"
//! 	field: "Customer.id"
//! ```
//!
//! Use [`SheetError::kind`] / [`SheetError::has_kind`] to match on categories.

pub mod convert;
pub mod error;
pub mod execution;
pub mod grid;
pub mod ingestion;
pub mod naming;
pub mod schema;
pub mod types;

pub use error::{ErrorKind, SheetError, SheetResult};
pub use ingestion::{parse_all, parse_all_into_list, parse_all_parallel, ParseOptions};
pub use schema::{Fields, Record};
