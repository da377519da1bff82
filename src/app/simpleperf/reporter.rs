use std::ffi::OsString;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;

use tempfile::{Builder, TempPath};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::app::config::SimpleperfSettings;
use crate::app::error::AppError;
use crate::app::runner::run_command_with_timeout;
use crate::app::simpleperf::command::{normalize_symbols_dir, report_sample_args};
use crate::app::simpleperf::locator::resolve_binary_path;
use crate::app::simpleperf::platform::Platform;

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(120);

pub type SymbolsDirProvider = Box<dyn Fn() -> Option<String> + Send + Sync>;

/// Output of `simpleperf record`, as pulled from the device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawTrace(Vec<u8>);

impl RawTrace {
    pub fn new(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProcessedTrace {
    /// Protobuf report exactly as written by `report-sample`.
    Report(Vec<u8>),
    Failure,
}

impl ProcessedTrace {
    pub fn is_failure(&self) -> bool {
        matches!(self, ProcessedTrace::Failure)
    }

    pub fn into_bytes(self) -> Option<Vec<u8>> {
        match self {
            ProcessedTrace::Report(bytes) => Some(bytes),
            ProcessedTrace::Failure => None,
        }
    }
}

/// Converts raw simpleperf traces by shelling out to `simpleperf report-sample`.
pub struct SampleReporter {
    home_path: PathBuf,
    platform: Platform,
    symbols_dir: SymbolsDirProvider,
    timeout: Duration,
    scratch_dir: PathBuf,
}

impl SampleReporter {
    /// Fails only when the host platform has no simpleperf build.
    pub fn new<F>(home_path: impl Into<PathBuf>, symbols_dir: F) -> Result<Self, AppError>
    where
        F: Fn() -> Option<String> + Send + Sync + 'static,
    {
        Ok(Self::with_platform(home_path, Platform::current()?, symbols_dir))
    }

    pub fn with_platform<F>(home_path: impl Into<PathBuf>, platform: Platform, symbols_dir: F) -> Self
    where
        F: Fn() -> Option<String> + Send + Sync + 'static,
    {
        Self {
            home_path: home_path.into(),
            platform,
            symbols_dir: Box::new(symbols_dir),
            timeout: DEFAULT_TIMEOUT,
            scratch_dir: std::env::temp_dir(),
        }
    }

    /// The configured symbols directory is fixed for the reporter's lifetime.
    pub fn from_settings(settings: &SimpleperfSettings) -> Result<Self, AppError> {
        let symbols_dir = settings.symbols_dir.clone();
        let mut reporter = Self::new(settings.resolved_home_path(), move || Some(symbols_dir.clone()))?
            .with_timeout(Duration::from_secs(settings.timeout_secs));
        if let Some(dir) = settings.resolved_scratch_dir() {
            reporter = reporter.with_scratch_dir(dir);
        }
        Ok(reporter)
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_scratch_dir(mut self, scratch_dir: impl Into<PathBuf>) -> Self {
        self.scratch_dir = scratch_dir.into();
        self
    }

    pub fn platform(&self) -> Platform {
        self.platform
    }

    pub fn binary_path(&self) -> PathBuf {
        resolve_binary_path(&self.home_path, &self.platform)
    }

    /// Program and argv for one conversion. The symbols directory is looked up on every call.
    pub fn report_sample_command(&self, input: &Path, output: &Path) -> (PathBuf, Vec<OsString>) {
        let symbols_dir = normalize_symbols_dir((self.symbols_dir)());
        (
            self.binary_path(),
            report_sample_args(input, output, symbols_dir.as_deref()),
        )
    }

    /// Never fails past this point: every problem is logged and collapses to
    /// [`ProcessedTrace::Failure`].
    pub fn preprocess(&self, trace: &RawTrace) -> ProcessedTrace {
        let trace_id = Uuid::new_v4().to_string();
        match self.convert(trace, &trace_id) {
            Ok(bytes) => {
                info!(
                    trace_id = %trace_id,
                    raw_bytes = trace.as_bytes().len(),
                    report_bytes = bytes.len(),
                    "simpleperf report-sample succeeded"
                );
                ProcessedTrace::Report(bytes)
            }
            Err(err) => {
                warn!(
                    trace_id = %trace_id,
                    code = %err.code,
                    error = %err.error,
                    "simpleperf report-sample failed"
                );
                ProcessedTrace::Failure
            }
        }
    }

    fn convert(&self, trace: &RawTrace, trace_id: &str) -> Result<Vec<u8>, AppError> {
        let input = self.write_input(trace, trace_id)?;
        let output = self.scratch_file("trace-", trace_id)?;

        let (program, args) = self.report_sample_command(&input, &output);
        debug!(
            trace_id = %trace_id,
            program = %program.display(),
            args = ?args,
            "running simpleperf report-sample"
        );

        let result = run_command_with_timeout(&program, &args, self.timeout, trace_id)?;
        if !result.success() {
            return Err(AppError::dependency(
                format!(
                    "simpleperf report-sample exited unsuccessfully (exit code {:?}): {}",
                    result.exit_code,
                    result.stderr.trim()
                ),
                trace_id,
            ));
        }

        let bytes = fs::read(&output).map_err(|err| {
            AppError::system(format!("Failed to read processed trace: {err}"), trace_id)
        })?;
        if bytes.is_empty() {
            return Err(AppError::dependency(
                "simpleperf report-sample produced no output",
                trace_id,
            ));
        }

        if let Err(err) = output.close() {
            warn!(trace_id = %trace_id, error = %err, "Failed to remove processed trace file");
        }
        Ok(bytes)
    }

    fn write_input(&self, trace: &RawTrace, trace_id: &str) -> Result<TempPath, AppError> {
        let mut file = Builder::new()
            .prefix("cpu_trace_")
            .suffix(".trace")
            .tempfile_in(&self.scratch_dir)
            .map_err(|err| AppError::system(format!("Failed to create trace file: {err}"), trace_id))?;
        file.write_all(trace.as_bytes())
            .and_then(|_| file.flush())
            .map_err(|err| AppError::system(format!("Failed to write trace file: {err}"), trace_id))?;
        Ok(file.into_temp_path())
    }

    fn scratch_file(&self, prefix: &str, trace_id: &str) -> Result<TempPath, AppError> {
        Builder::new()
            .prefix(prefix)
            .suffix(".trace")
            .tempfile_in(&self.scratch_dir)
            .map(|file| file.into_temp_path())
            .map_err(|err| AppError::system(format!("Failed to create output file: {err}"), trace_id))
    }
}
