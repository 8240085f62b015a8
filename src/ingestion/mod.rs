//! Parse entrypoints and grid sources.
//!
//! Most callers should use [`parse_all`] or [`parse_all_into_list`] (from [`unified`]) which:
//!
//! - fetch a sheet from a [`GridSource`] (in-memory, CSV directory, or workbook)
//! - bind its header to a [`crate::schema::Record`] and convert every data row
//! - optionally report success/failure/alerts to a [`ParseObserver`]
//!
//! Grid sources are available under:
//! - [`source`] ([`MemorySource`], closures)
//! - [`csv`]
//! - `excel` (feature `excel`)

pub mod csv;
#[cfg(feature = "excel")]
pub mod excel;
pub mod observability;
pub mod settings;
pub mod source;
pub mod unified;

pub use csv::CsvSource;
#[cfg(feature = "excel")]
pub use excel::ExcelSource;
pub use observability::{
    CompositeObserver, FileObserver, ParseContext, ParseObserver, ParseSeverity, ParseStats, StdErrObserver,
    TracingObserver,
};
pub use settings::ParseSettings;
pub use source::{GridSource, MemorySource, SheetNotFound};
pub use unified::{parse_all, parse_all_into_list, parse_all_parallel, ParseOptions, DEFAULT_TAG};
