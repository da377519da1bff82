use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Instant;

use chrono::Utc;
use droidperf_lib::app::config::{load_config, MAX_TIMEOUT_SECS};
use droidperf_lib::app::logging::init_logging;
use droidperf_lib::app::models::ReportSampleSummary;
use droidperf_lib::app::simpleperf::reporter::{ProcessedTrace, RawTrace, SampleReporter};
use tracing::error;
use uuid::Uuid;

#[derive(Debug, Clone)]
struct Args {
    input: PathBuf,
    output: Option<PathBuf>,
    home: Option<String>,
    symdir: Option<String>,
    timeout_secs: Option<u64>,
    json: bool,
}

const USAGE: &str = "Usage: report_sample --input RAW_TRACE [--output REPORT] [--home DIR] [--symdir DIR] [--timeout-secs N] [--json]\n";

fn parse_args() -> Result<Args, String> {
    let mut input: Option<PathBuf> = None;
    let mut output: Option<PathBuf> = None;
    let mut home: Option<String> = None;
    let mut symdir: Option<String> = None;
    let mut timeout_secs: Option<u64> = None;
    let mut json = false;

    let mut it = std::env::args().skip(1);
    while let Some(arg) = it.next() {
        match arg.as_str() {
            "--input" | "-i" => {
                let value = it
                    .next()
                    .ok_or_else(|| "--input requires a value".to_string())?;
                input = Some(PathBuf::from(value));
            }
            "--output" | "-o" => {
                let value = it
                    .next()
                    .ok_or_else(|| "--output requires a value".to_string())?;
                output = Some(PathBuf::from(value));
            }
            "--home" => {
                home = it
                    .next()
                    .map(|v| v.trim().to_string())
                    .filter(|v| !v.is_empty());
                if home.is_none() {
                    return Err("--home requires a value".to_string());
                }
            }
            "--symdir" => {
                let value = it
                    .next()
                    .ok_or_else(|| "--symdir requires a value".to_string())?;
                symdir = Some(value);
            }
            "--timeout-secs" => {
                let value = it
                    .next()
                    .ok_or_else(|| "--timeout-secs requires a value".to_string())?;
                timeout_secs = Some(parse_timeout_secs(&value)?);
            }
            "--json" => {
                json = true;
            }
            "-h" | "--help" => return Err(USAGE.to_string()),
            other => return Err(format!("Unknown arg: {other}")),
        }
    }

    let input = input.ok_or_else(|| format!("--input is required\n{USAGE}"))?;
    Ok(Args {
        input,
        output,
        home,
        symdir,
        timeout_secs,
        json,
    })
}

/// Same bounds the config file is held to.
fn parse_timeout_secs(value: &str) -> Result<u64, String> {
    value
        .trim()
        .parse::<u64>()
        .ok()
        .filter(|secs| (1..=MAX_TIMEOUT_SECS).contains(secs))
        .ok_or_else(|| {
            format!("Invalid --timeout-secs: {value} (expected 1..={MAX_TIMEOUT_SECS})")
        })
}

fn default_output_path(input: &Path) -> PathBuf {
    input.with_extension("report.pb")
}

/// Writes next to the destination first so a crash never leaves a truncated report behind.
fn write_report(path: &Path, bytes: &[u8]) -> Result<(), String> {
    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let mut staged = tempfile::NamedTempFile::new_in(dir)
        .map_err(|err| format!("Failed to stage report in {}: {err}", dir.display()))?;
    staged
        .write_all(bytes)
        .map_err(|err| format!("Failed to write report: {err}"))?;
    staged
        .persist(path)
        .map_err(|err| format!("Failed to move report to {}: {err}", path.display()))?;
    Ok(())
}

fn print_summary(summary: &ReportSampleSummary, json: bool) {
    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(summary).unwrap_or_default()
        );
        return;
    }
    println!(
        "{} {} -> {} ({} bytes, {} ms)",
        summary.status,
        summary.input,
        summary.output.as_deref().unwrap_or("-"),
        summary.report_bytes.unwrap_or(0),
        summary.duration_ms
    );
}

fn main() {
    let args = match parse_args() {
        Ok(v) => v,
        Err(msg) => {
            eprintln!("{msg}");
            std::process::exit(2);
        }
    };

    let trace_id = Uuid::new_v4().to_string();
    let mut config = match load_config(&trace_id) {
        Ok(cfg) => cfg,
        Err(err) => {
            eprintln!("{err}");
            std::process::exit(1);
        }
    };
    init_logging(&config.logging.log_level);

    if let Some(home) = args.home.clone() {
        config.simpleperf.home_path = home;
    }
    if let Some(symdir) = args.symdir.clone() {
        config.simpleperf.symbols_dir = symdir;
    }
    if let Some(timeout_secs) = args.timeout_secs {
        config.simpleperf.timeout_secs = timeout_secs;
    }

    let reporter = match SampleReporter::from_settings(&config.simpleperf) {
        Ok(reporter) => reporter,
        Err(err) => {
            error!(trace_id = %trace_id, code = %err.code, error = %err.error, "Cannot run simpleperf on this host");
            eprintln!("{err}");
            std::process::exit(1);
        }
    };

    let raw = match fs::read(&args.input) {
        Ok(bytes) => RawTrace::new(bytes),
        Err(err) => {
            eprintln!("Failed to read {}: {err}", args.input.display());
            std::process::exit(1);
        }
    };

    let output = args
        .output
        .clone()
        .unwrap_or_else(|| default_output_path(&args.input));
    let started = Instant::now();
    let processed = reporter.preprocess(&raw);
    let duration_ms = started.elapsed().as_millis();

    let mut summary = ReportSampleSummary {
        tool: "report_sample".to_string(),
        status: "fail".to_string(),
        input: args.input.to_string_lossy().to_string(),
        output: None,
        binary_path: reporter.binary_path().to_string_lossy().to_string(),
        platform_subdirectory: reporter.platform().subdirectory(),
        report_bytes: None,
        duration_ms,
        timestamp_utc: Utc::now().to_rfc3339(),
    };

    let ProcessedTrace::Report(bytes) = processed else {
        print_summary(&summary, args.json);
        std::process::exit(1);
    };

    if let Err(err) = write_report(&output, &bytes) {
        eprintln!("{err}");
        print_summary(&summary, args.json);
        std::process::exit(1);
    }

    summary.status = "pass".to_string();
    summary.output = Some(output.to_string_lossy().to_string());
    summary.report_bytes = Some(bytes.len());
    print_summary(&summary, args.json);
}
