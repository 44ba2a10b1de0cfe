//! Pipeline observers.
//!
//! Every public entry point that reads, cleans, consolidates or writes data can report its
//! outcome to an [`PipelineObserver`]: `on_success` with row stats, `on_failure` with a
//! [`Severity`], and `on_alert` when that severity reaches the caller's threshold.
//!
//! Sinks provided here: [`StdErrObserver`], [`FileObserver`], [`TracingObserver`], and
//! [`CompositeObserver`] to fan out to several of them.

use std::fmt;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::{SystemTime, UNIX_EPOCH};

use crate::error::{EngineError, EngineResult};

/// Severity classification used for observer callbacks and alerting thresholds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    /// Informational event.
    Info,
    /// Warning-level event (non-fatal).
    Warning,
    /// Error-level event (operation failed).
    Error,
    /// Critical error (typically I/O or other infrastructure failures).
    Critical,
}

/// Pipeline stage an event belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Ingest,
    Clean,
    Consolidate,
    Export,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Ingest => "ingest",
            Self::Clean => "clean",
            Self::Consolidate => "consolidate",
            Self::Export => "export",
        };
        f.write_str(s)
    }
}

/// Context about a single stage run.
#[derive(Debug, Clone)]
pub struct EventContext {
    pub stage: Stage,
    /// Path or dataset name the stage worked on.
    pub target: String,
}

impl EventContext {
    pub fn new(stage: Stage, target: impl Into<String>) -> Self {
        Self {
            stage,
            target: target.into(),
        }
    }

    pub fn for_path(stage: Stage, path: &Path) -> Self {
        Self::new(stage, path.display().to_string())
    }
}

/// Minimal stats reported on success.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StageStats {
    /// Rows produced (or written) by the stage.
    pub rows: usize,
}

/// Observer interface for pipeline outcomes.
pub trait PipelineObserver: Send + Sync {
    /// Called when a stage succeeds.
    fn on_success(&self, _ctx: &EventContext, _stats: StageStats) {}

    /// Called when a stage fails.
    fn on_failure(&self, _ctx: &EventContext, _severity: Severity, _error: &EngineError) {}

    /// Called when a failure meets the alert threshold.
    ///
    /// Default behavior forwards to [`Self::on_failure`].
    fn on_alert(&self, ctx: &EventContext, severity: Severity, error: &EngineError) {
        self.on_failure(ctx, severity, error)
    }
}

/// Classify an error for observers: infrastructure failures are `Critical`, everything else
/// (bad input, bad configuration) is `Error`.
pub fn severity_for_error(e: &EngineError) -> Severity {
    match e {
        EngineError::Io(_) => Severity::Critical,
        EngineError::Csv(err) => match err.kind() {
            ::csv::ErrorKind::Io(_) => Severity::Critical,
            _ => Severity::Error,
        },
        EngineError::ThreadPool(_) => Severity::Critical,
        _ => Severity::Error,
    }
}

/// Report `result` to `observer` (if any), alerting at or above `alert_at_or_above`.
pub(crate) fn report_outcome<T>(
    observer: Option<&Arc<dyn PipelineObserver>>,
    alert_at_or_above: Severity,
    ctx: &EventContext,
    result: &EngineResult<T>,
    rows: impl FnOnce(&T) -> usize,
) {
    let Some(obs) = observer else {
        return;
    };
    match result {
        Ok(value) => obs.on_success(ctx, StageStats { rows: rows(value) }),
        Err(e) => {
            let sev = severity_for_error(e);
            obs.on_failure(ctx, sev, e);
            if sev >= alert_at_or_above {
                obs.on_alert(ctx, sev, e);
            }
        }
    }
}

/// An observer that fans out callbacks to a list of observers.
#[derive(Default)]
pub struct CompositeObserver {
    observers: Vec<Arc<dyn PipelineObserver>>,
}

impl CompositeObserver {
    /// Create a new composite observer from a list of observers.
    pub fn new(observers: Vec<Arc<dyn PipelineObserver>>) -> Self {
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

impl PipelineObserver for CompositeObserver {
    fn on_success(&self, ctx: &EventContext, stats: StageStats) {
        for o in &self.observers {
            o.on_success(ctx, stats);
        }
    }

    fn on_failure(&self, ctx: &EventContext, severity: Severity, error: &EngineError) {
        for o in &self.observers {
            o.on_failure(ctx, severity, error);
        }
    }

    fn on_alert(&self, ctx: &EventContext, severity: Severity, error: &EngineError) {
        for o in &self.observers {
            o.on_alert(ctx, severity, error);
        }
    }
}

/// Logs pipeline events to stderr.
#[derive(Debug, Default)]
pub struct StdErrObserver;

impl PipelineObserver for StdErrObserver {
    fn on_success(&self, ctx: &EventContext, stats: StageStats) {
        eprintln!("[{}][ok] target={} rows={}", ctx.stage, ctx.target, stats.rows);
    }

    fn on_failure(&self, ctx: &EventContext, severity: Severity, error: &EngineError) {
        eprintln!("[{}][{severity:?}] target={} err={error}", ctx.stage, ctx.target);
    }

    fn on_alert(&self, ctx: &EventContext, severity: Severity, error: &EngineError) {
        eprintln!("[ALERT][{}][{severity:?}] target={} err={error}", ctx.stage, ctx.target);
    }
}

/// Forwards pipeline events to the `tracing` ecosystem.
///
/// Successes are `info`, failures `warn` (`error` when critical), alerts `error`.
#[derive(Debug, Default)]
pub struct TracingObserver;

impl PipelineObserver for TracingObserver {
    fn on_success(&self, ctx: &EventContext, stats: StageStats) {
        tracing::info!(stage = %ctx.stage, subject = %ctx.target, rows = stats.rows, "stage finished");
    }

    fn on_failure(&self, ctx: &EventContext, severity: Severity, error: &EngineError) {
        if severity >= Severity::Critical {
            tracing::error!(stage = %ctx.stage, subject = %ctx.target, ?severity, %error, "stage failed");
        } else {
            tracing::warn!(stage = %ctx.stage, subject = %ctx.target, ?severity, %error, "stage failed");
        }
    }

    fn on_alert(&self, ctx: &EventContext, severity: Severity, error: &EngineError) {
        tracing::error!(stage = %ctx.stage, subject = %ctx.target, ?severity, %error, "alert");
    }
}

/// Appends pipeline events to a local log file.
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

impl PipelineObserver for FileObserver {
    fn on_success(&self, ctx: &EventContext, stats: StageStats) {
        self.append_line(&format!(
            "{} ok stage={} target={} rows={}",
            unix_ts(),
            ctx.stage,
            ctx.target,
            stats.rows
        ));
    }

    fn on_failure(&self, ctx: &EventContext, severity: Severity, error: &EngineError) {
        self.append_line(&format!(
            "{} fail severity={severity:?} stage={} target={} err={error}",
            unix_ts(),
            ctx.stage,
            ctx.target
        ));
    }

    fn on_alert(&self, ctx: &EventContext, severity: Severity, error: &EngineError) {
        self.append_line(&format!(
            "{} ALERT severity={severity:?} stage={} target={} err={error}",
            unix_ts(),
            ctx.stage,
            ctx.target
        ));
    }
}

fn unix_ts() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}
