use std::fmt;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::{SystemTime, UNIX_EPOCH};

use crate::error::SheetError;

/// Severity classification used for observer callbacks and alerting thresholds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ParseSeverity {
    /// Informational event.
    Info,
    /// Warning-level event (a single row failed, or the run was cancelled).
    Warning,
    /// Error-level event (configuration or schema fault; no rows produced).
    Error,
    /// Critical error (the sheet could not be fetched).
    Critical,
}

impl ParseSeverity {
    /// Severity assigned to an error surfaced by a parse call.
    pub fn for_error(error: &SheetError) -> Self {
        match error {
            SheetError::Fetch { .. } | SheetError::Io(_) | SheetError::WorkerPool(_) => ParseSeverity::Critical,
            SheetError::Cell(_) | SheetError::Cancelled | SheetError::DeadlineExceeded => ParseSeverity::Warning,
            _ => ParseSeverity::Error,
        }
    }
}

/// Context about a parse call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseContext {
    /// Data source identifier.
    pub source_id: String,
    /// Resolved sheet name (empty if it could not be determined).
    pub sheet: String,
    /// Record name rows are materialized into.
    pub record: String,
}

/// Stats reported once every row has been produced.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ParseStats {
    /// Number of data rows produced.
    pub rows: usize,
    /// Rows that produced an error instead of a record.
    pub failed_rows: usize,
}

/// Observer interface for parse outcomes.
///
/// Implementors can record metrics, logs, or trigger alerts.
pub trait ParseObserver: Send + Sync {
    /// Called when every row has been produced.
    fn on_success(&self, _ctx: &ParseContext, _stats: ParseStats) {}

    /// Called for setup failures, row faults and interruptions.
    fn on_failure(&self, _ctx: &ParseContext, _severity: ParseSeverity, _error: &SheetError) {}

    /// Called when a failure meets the alert threshold.
    ///
    /// Default behavior forwards to [`Self::on_failure`].
    fn on_alert(&self, ctx: &ParseContext, severity: ParseSeverity, error: &SheetError) {
        self.on_failure(ctx, severity, error)
    }
}

/// An observer that fans out callbacks to a list of observers.
#[derive(Default)]
pub struct CompositeObserver {
    observers: Vec<Arc<dyn ParseObserver>>,
}

impl CompositeObserver {
    pub fn new(observers: Vec<Arc<dyn ParseObserver>>) -> Self {
        Self { observers }
    }
}

impl fmt::Debug for CompositeObserver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompositeObserver")
            .field("observers_len", &self.observers.len())
            .finish()
    }
}

impl ParseObserver for CompositeObserver {
    fn on_success(&self, ctx: &ParseContext, stats: ParseStats) {
        for o in &self.observers {
            o.on_success(ctx, stats);
        }
    }

    fn on_failure(&self, ctx: &ParseContext, severity: ParseSeverity, error: &SheetError) {
        for o in &self.observers {
            o.on_failure(ctx, severity, error);
        }
    }

    fn on_alert(&self, ctx: &ParseContext, severity: ParseSeverity, error: &SheetError) {
        for o in &self.observers {
            o.on_alert(ctx, severity, error);
        }
    }
}

/// Logs parse events to stderr.
#[derive(Debug, Default)]
pub struct StdErrObserver;

impl ParseObserver for StdErrObserver {
    fn on_success(&self, ctx: &ParseContext, stats: ParseStats) {
        eprintln!(
            "[sheet][ok] source={} sheet={} record={} rows={} failed_rows={}",
            ctx.source_id, ctx.sheet, ctx.record, stats.rows, stats.failed_rows
        );
    }

    fn on_failure(&self, ctx: &ParseContext, severity: ParseSeverity, error: &SheetError) {
        eprintln!(
            "[sheet][{:?}] source={} sheet={} record={} err={}",
            severity, ctx.source_id, ctx.sheet, ctx.record, error
        );
    }

    fn on_alert(&self, ctx: &ParseContext, severity: ParseSeverity, error: &SheetError) {
        eprintln!(
            "[ALERT][sheet][{:?}] source={} sheet={} record={} err={}",
            severity, ctx.source_id, ctx.sheet, ctx.record, error
        );
    }
}

/// Appends parse events to a local log file.
#[derive(Debug)]
pub struct FileObserver {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FileObserver {
    /// Create a file observer that appends events to `path`.
    ///
    /// Writes are best-effort; failures to open/write the log file are ignored.
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            lock: Mutex::new(()),
        }
    }

    fn append_line(&self, line: &str) {
        let _guard = self.lock.lock().ok();
        if let Ok(mut f) = OpenOptions::new().create(true).append(true).open(&self.path) {
            let _ = writeln!(f, "{line}");
        }
    }
}

// Cell errors render across several lines; log files keep one event per line.
fn one_line(error: &SheetError) -> String {
    error.to_string().replace("\n\t", " ").replace('\n', "; ")
}

impl ParseObserver for FileObserver {
    fn on_success(&self, ctx: &ParseContext, stats: ParseStats) {
        self.append_line(&format!(
            "{} ok source={} sheet={} record={} rows={} failed_rows={}",
            unix_ts(),
            ctx.source_id,
            ctx.sheet,
            ctx.record,
            stats.rows,
            stats.failed_rows
        ));
    }

    fn on_failure(&self, ctx: &ParseContext, severity: ParseSeverity, error: &SheetError) {
        self.append_line(&format!(
            "{} fail severity={:?} source={} sheet={} record={} err={}",
            unix_ts(),
            severity,
            ctx.source_id,
            ctx.sheet,
            ctx.record,
            one_line(error)
        ));
    }

    fn on_alert(&self, ctx: &ParseContext, severity: ParseSeverity, error: &SheetError) {
        self.append_line(&format!(
            "{} ALERT severity={:?} source={} sheet={} record={} err={}",
            unix_ts(),
            severity,
            ctx.source_id,
            ctx.sheet,
            ctx.record,
            one_line(error)
        ));
    }
}

/// Emits parse events through `tracing`.
#[derive(Debug, Default)]
pub struct TracingObserver;

impl ParseObserver for TracingObserver {
    fn on_success(&self, ctx: &ParseContext, stats: ParseStats) {
        tracing::info!(
            source_id = %ctx.source_id,
            sheet = %ctx.sheet,
            record = %ctx.record,
            rows = stats.rows,
            failed_rows = stats.failed_rows,
            "sheet parsed"
        );
    }

    fn on_failure(&self, ctx: &ParseContext, severity: ParseSeverity, error: &SheetError) {
        match severity {
            ParseSeverity::Info => {
                tracing::info!(source_id = %ctx.source_id, sheet = %ctx.sheet, record = %ctx.record, %error, "sheet event")
            }
            ParseSeverity::Warning => {
                tracing::warn!(source_id = %ctx.source_id, sheet = %ctx.sheet, record = %ctx.record, %error, "sheet row failed")
            }
            ParseSeverity::Error | ParseSeverity::Critical => {
                tracing::error!(
                    source_id = %ctx.source_id,
                    sheet = %ctx.sheet,
                    record = %ctx.record,
                    ?severity,
                    %error,
                    "sheet parse failed"
                )
            }
        }
    }

    fn on_alert(&self, ctx: &ParseContext, severity: ParseSeverity, error: &SheetError) {
        tracing::error!(
            source_id = %ctx.source_id,
            sheet = %ctx.sheet,
            record = %ctx.record,
            ?severity,
            %error,
            alert = true,
            "sheet parse alert"
        );
    }
}

/// Routes outcomes of one parse call to the configured observer.
#[derive(Clone)]
pub(crate) struct Reporter {
    observer: Option<Arc<dyn ParseObserver>>,
    alert_at_or_above: ParseSeverity,
    ctx: ParseContext,
}

impl Reporter {
    pub(crate) fn new(
        observer: Option<Arc<dyn ParseObserver>>,
        alert_at_or_above: ParseSeverity,
        ctx: ParseContext,
    ) -> Self {
        Self {
            observer,
            alert_at_or_above,
            ctx,
        }
    }

    pub(crate) fn success(&self, stats: ParseStats) {
        if let Some(obs) = self.observer.as_ref() {
            obs.on_success(&self.ctx, stats);
        }
    }

    pub(crate) fn failure(&self, error: &SheetError) {
        if let Some(obs) = self.observer.as_ref() {
            let sev = ParseSeverity::for_error(error);
            obs.on_failure(&self.ctx, sev, error);
            if sev >= self.alert_at_or_above {
                obs.on_alert(&self.ctx, sev, error);
            }
        }
    }
}

impl fmt::Debug for Reporter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Reporter")
            .field("observer_set", &self.observer.is_some())
            .field("alert_at_or_above", &self.alert_at_or_above)
            .field("ctx", &self.ctx)
            .finish()
    }
}

fn unix_ts() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}
