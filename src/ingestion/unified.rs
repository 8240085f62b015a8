//! Parse entrypoints.
//!
//! Most callers should use [`parse_all`] (lazy, one result per row) or
//! [`parse_all_into_list`] (eager, all-or-nothing). Both:
//!
//! - validate the configuration before fetching anything
//! - fetch the sheet through [`ParseOptions::source`]
//! - resolve the record's fields against the header once, before any row is produced
//! - report outcomes to [`ParseOptions::observer`] when one is set

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use crate::convert::datetime_layouts;
use crate::error::{SheetError, SheetResult};
use crate::execution::parallel::materialize_parallel;
use crate::execution::{CancelToken, ExecutionOptions, RowMaterializer, Rows, FIRST_DATA_ROW};
use crate::grid::Grid;
use crate::naming::pluralize;
use crate::schema::{bindings_for, resolve, Record, ResolveOptions};

use super::observability::{ParseContext, ParseObserver, ParseSeverity, ParseStats, Reporter};
use super::source::GridSource;

/// Annotation tag looked up for column-name overrides unless configured otherwise.
pub const DEFAULT_TAG: &str = "sheet";

/// Options controlling a parse call.
///
/// Options are plain values: the `with_*` helpers consume and return a copy, so deriving
/// per-call variants from a shared base never changes the base.
#[derive(Clone)]
pub struct ParseOptions {
    /// Where sheets are fetched from. Required.
    pub source: Option<Arc<dyn GridSource>>,
    /// Data source identifier (workbook id, directory, path). Required.
    pub source_id: String,
    /// Sheet to read. If `None` or empty, the pluralized record name is used.
    pub sheet_name: Option<String>,
    /// Annotation tag holding column-name overrides.
    pub tag_name: String,
    /// Timestamp layouts (chrono strftime syntax) tried first, in order.
    pub datetime_formats: Vec<String>,
    /// Timestamp layouts tried after `datetime_formats` and before the built-in defaults.
    pub extra_datetime_formats: Vec<String>,
    /// Record fields without a matching column are left at their default instead of failing.
    pub allow_skip_fields: bool,
    /// Header columns without a matching field are ignored instead of failing.
    pub allow_skip_columns: bool,
    /// Cancellation signal checked before the fetch and before every row.
    pub cancel: CancelToken,
    /// Deadline relative to the start of the call.
    pub timeout: Option<Duration>,
    /// Optional observer for logging/alerts.
    pub observer: Option<Arc<dyn ParseObserver>>,
    /// Severity threshold at which `on_alert` is invoked.
    pub alert_at_or_above: ParseSeverity,
}

impl fmt::Debug for ParseOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ParseOptions")
            .field("source_set", &self.source.is_some())
            .field("source_id", &self.source_id)
            .field("sheet_name", &self.sheet_name)
            .field("tag_name", &self.tag_name)
            .field("datetime_formats", &self.datetime_formats)
            .field("extra_datetime_formats", &self.extra_datetime_formats)
            .field("allow_skip_fields", &self.allow_skip_fields)
            .field("allow_skip_columns", &self.allow_skip_columns)
            .field("cancel", &self.cancel)
            .field("timeout", &self.timeout)
            .field("observer_set", &self.observer.is_some())
            .field("alert_at_or_above", &self.alert_at_or_above)
            .finish()
    }
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            source: None,
            source_id: String::new(),
            sheet_name: None,
            tag_name: DEFAULT_TAG.to_string(),
            datetime_formats: Vec::new(),
            extra_datetime_formats: Vec::new(),
            allow_skip_fields: false,
            allow_skip_columns: false,
            cancel: CancelToken::default(),
            timeout: None,
            observer: None,
            alert_at_or_above: ParseSeverity::Critical,
        }
    }
}

impl ParseOptions {
    pub fn new(source: Arc<dyn GridSource>, source_id: impl Into<String>) -> Self {
        Self {
            source: Some(source),
            source_id: source_id.into(),
            ..Self::default()
        }
    }

    pub fn with_sheet_name(mut self, sheet: impl Into<String>) -> Self {
        self.sheet_name = Some(sheet.into());
        self
    }

    pub fn with_tag_name(mut self, tag: impl Into<String>) -> Self {
        self.tag_name = tag.into();
        self
    }

    pub fn with_datetime_formats<I, S>(mut self, formats: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.datetime_formats = formats.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_extra_datetime_formats<I, S>(mut self, formats: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.extra_datetime_formats = formats.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_skip_fields(mut self, allow: bool) -> Self {
        self.allow_skip_fields = allow;
        self
    }

    pub fn with_skip_columns(mut self, allow: bool) -> Self {
        self.allow_skip_columns = allow;
        self
    }

    pub fn with_cancel(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn with_observer(mut self, observer: Arc<dyn ParseObserver>) -> Self {
        self.observer = Some(observer);
        self
    }

    /// Sheet name this call reads for record `R`.
    pub fn sheet_for<R: Record>(&self) -> String {
        match self.sheet_name.as_deref() {
            Some(name) if !name.is_empty() => name.to_string(),
            _ => pluralize(R::record_name()),
        }
    }

    fn tag(&self) -> &str {
        if self.tag_name.is_empty() {
            DEFAULT_TAG
        } else {
            &self.tag_name
        }
    }

    fn cancel_token(&self) -> CancelToken {
        match self.timeout {
            Some(timeout) => self.cancel.clone().with_timeout(timeout),
            None => self.cancel.clone(),
        }
    }
}

/// Parse every data row of the configured sheet into `R`, lazily.
///
/// Configuration and schema faults are returned here, before any row is produced. Row faults
/// are yielded in place of the affected row and do not stop the sequence.
///
/// # Examples
///
/// ```rust
/// use std::sync::Arc;
///
/// use sheetbind::grid::Grid;
/// use sheetbind::ingestion::{parse_all, MemorySource, ParseOptions};
/// use sheetbind::schema::{Fields, Record};
///
/// #[derive(Debug, Default)]
/// struct Workout {
///     day: String,
///     minutes: u16,
/// }
///
/// impl Record for Workout {
///     fn describe(fields: &mut Fields<Self>) {
///         fields.field("day", |w: &mut Workout| &mut w.day);
///         fields.field("minutes", |w: &mut Workout| &mut w.minutes);
///     }
/// }
///
/// # fn main() -> Result<(), sheetbind::SheetError> {
/// let source = MemorySource::new().with_sheet(
///     "book",
///     "Workouts",
///     Grid::from_rows([vec!["day", "minutes"], vec!["mon", "30"], vec!["tue", "x"]]),
/// );
/// let options = ParseOptions::new(Arc::new(source), "book");
///
/// let mut ok = 0;
/// for (row, result) in parse_all::<Workout>(&options)? {
///     match result {
///         Ok(workout) => ok += workout.minutes,
///         Err(err) => assert_eq!(row, 3, "{err}"),
///     }
/// }
/// assert_eq!(ok, 30);
/// # Ok(())
/// # }
/// ```
pub fn parse_all<R: Record>(options: &ParseOptions) -> SheetResult<Rows<R>> {
    let prepared = prepare::<R>(options)?;
    Ok(Rows::new(
        prepared.materializer,
        prepared.grid,
        prepared.cancel,
        prepared.reporter,
    ))
}

/// Parse every row, returning all records or the first fault.
///
/// A row fault discards every record; a cancelled run returns
/// [`SheetError::Cancelled`] or [`SheetError::DeadlineExceeded`].
pub fn parse_all_into_list<R: Record>(options: &ParseOptions) -> SheetResult<Vec<R>> {
    let mut rows = parse_all::<R>(options)?;
    let mut out = Vec::with_capacity(rows.remaining());
    for (_, result) in rows.by_ref() {
        out.push(result?);
    }
    rows.status()?;
    Ok(out)
}

/// Eager variant of [`parse_all_into_list`] that materializes rows on a rayon pool.
///
/// Row order is preserved and the first fault in row order is returned.
pub fn parse_all_parallel<R: Record>(options: &ParseOptions, exec: &ExecutionOptions) -> SheetResult<Vec<R>> {
    let prepared = prepare::<R>(options)?;
    let result = materialize_parallel(
        &prepared.materializer,
        prepared.grid.data_rows(),
        FIRST_DATA_ROW,
        &prepared.cancel,
        exec,
    );
    match &result {
        Ok(records) => prepared.reporter.success(ParseStats {
            rows: records.len(),
            failed_rows: 0,
        }),
        Err(e) => prepared.reporter.failure(e),
    }
    result
}

struct Prepared<R> {
    materializer: RowMaterializer<R>,
    grid: Grid,
    cancel: CancelToken,
    reporter: Reporter,
}

fn prepare<R: Record>(options: &ParseOptions) -> SheetResult<Prepared<R>> {
    let sheet = options.sheet_for::<R>();
    let reporter = Reporter::new(
        options.observer.clone(),
        options.alert_at_or_above,
        ParseContext {
            source_id: options.source_id.clone(),
            sheet: sheet.clone(),
            record: R::record_name().to_string(),
        },
    );
    let cancel = options.cancel_token();

    match setup::<R>(options, &sheet, &cancel) {
        Ok((materializer, grid)) => Ok(Prepared {
            materializer,
            grid,
            cancel,
            reporter,
        }),
        Err(e) => {
            reporter.failure(&e);
            Err(e)
        }
    }
}

fn setup<R: Record>(
    options: &ParseOptions,
    sheet: &str,
    cancel: &CancelToken,
) -> SheetResult<(RowMaterializer<R>, Grid)> {
    let source = options.source.as_ref().ok_or(SheetError::NoSource)?;
    if options.source_id.is_empty() {
        return Err(SheetError::NoSourceId);
    }
    if sheet.is_empty() {
        return Err(SheetError::NoSheetName);
    }
    cancel.check()?;

    let mut grid = source
        .fetch(&options.source_id, sheet)
        .map_err(|source| SheetError::Fetch {
            source_id: options.source_id.clone(),
            sheet: sheet.to_string(),
            source,
        })?;
    let header = grid.header().ok_or_else(|| SheetError::EmptySheet {
        sheet: sheet.to_string(),
    })?;

    let bindings = bindings_for::<R>(options.tag());
    let mappings = resolve(
        &bindings,
        header,
        R::record_name(),
        ResolveOptions {
            allow_skip_fields: options.allow_skip_fields,
            allow_skip_columns: options.allow_skip_columns,
        },
    )?;

    grid.normalize();
    let layouts = datetime_layouts(&options.datetime_formats, &options.extra_datetime_formats);
    Ok((RowMaterializer::new(mappings, layouts, sheet), grid))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingestion::MemorySource;
    use crate::schema::Fields;

    #[derive(Debug, Default)]
    struct Person {
        name: String,
    }

    impl Record for Person {
        fn describe(fields: &mut Fields<Self>) {
            fields.field("name", |p: &mut Person| &mut p.name);
        }
    }

    #[test]
    fn default_sheet_is_pluralized_record_name() {
        let options = ParseOptions::default();
        assert_eq!(options.sheet_for::<Person>(), "People");
        assert_eq!(options.clone().with_sheet_name("").sheet_for::<Person>(), "People");
        assert_eq!(options.with_sheet_name("staff").sheet_for::<Person>(), "staff");
    }

    #[test]
    fn overrides_do_not_touch_the_base() {
        let base = ParseOptions::new(Arc::new(MemorySource::new()), "book");
        let derived = base.clone().with_skip_fields(true).with_tag_name("csv");
        assert!(!base.allow_skip_fields);
        assert_eq!(base.tag_name, DEFAULT_TAG);
        assert!(derived.allow_skip_fields);
        assert_eq!(derived.tag(), "csv");
    }

    #[test]
    fn configuration_faults_come_first() {
        let err = parse_all::<Person>(&ParseOptions::default()).unwrap_err();
        assert!(matches!(err, SheetError::NoSource));

        let err = parse_all::<Person>(&ParseOptions::new(Arc::new(MemorySource::new()), "")).unwrap_err();
        assert!(matches!(err, SheetError::NoSourceId));
    }

    #[test]
    fn header_only_sheet_yields_no_rows() {
        let source = MemorySource::new().with_sheet("book", "People", Grid::from_rows([vec!["name"]]));
        let options = ParseOptions::new(Arc::new(source), "book");
        let people = parse_all_into_list::<Person>(&options).unwrap();
        assert!(people.is_empty());
    }

    #[test]
    fn missing_header_row_is_an_empty_sheet() {
        let source = MemorySource::new().with_sheet("book", "People", Grid::default());
        let options = ParseOptions::new(Arc::new(source), "book");
        let err = parse_all::<Person>(&options).unwrap_err();
        assert!(matches!(err, SheetError::EmptySheet { sheet } if sheet == "People"));
    }
}
