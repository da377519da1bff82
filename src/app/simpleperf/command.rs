use std::ffi::OsString;
use std::path::Path;

pub const REPORT_SAMPLE_FLAGS: [&str; 3] = ["report-sample", "--protobuf", "--show-callchain"];

/// A blank symbols directory is treated the same as none at all.
pub fn normalize_symbols_dir(value: Option<String>) -> Option<String> {
    value
        .map(|dir| dir.trim().to_string())
        .filter(|dir| !dir.is_empty())
}

/// Paths are passed through untouched, non-UTF-8 bytes included.
pub fn report_sample_args(input: &Path, output: &Path, symbols_dir: Option<&str>) -> Vec<OsString> {
    let mut args: Vec<OsString> = REPORT_SAMPLE_FLAGS.iter().map(OsString::from).collect();
    args.push("-i".into());
    args.push(input.as_os_str().to_os_string());
    args.push("-o".into());
    args.push(output.as_os_str().to_os_string());
    if let Some(dir) = symbols_dir {
        args.push("--symdir".into());
        args.push(dir.into());
    }
    args
}
