use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::app::error::AppError;

pub const CONFIG_PATH_ENV: &str = "DROIDPERF_CONFIG_PATH";
pub const DEFAULT_TIMEOUT_SECS: u64 = 120;
pub const MAX_TIMEOUT_SECS: u64 = 3600;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SimpleperfSettings {
    /// Install root of the host tooling; empty means the directory of the running executable.
    pub home_path: String,
    pub symbols_dir: String,
    pub timeout_secs: u64,
    /// Where scratch trace files go; empty means the system temp dir.
    pub scratch_dir: String,
}

impl Default for SimpleperfSettings {
    fn default() -> Self {
        Self {
            home_path: String::new(),
            symbols_dir: String::new(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            scratch_dir: String::new(),
        }
    }
}

impl SimpleperfSettings {
    pub fn resolved_home_path(&self) -> PathBuf {
        let trimmed = self.home_path.trim();
        if !trimmed.is_empty() {
            return PathBuf::from(trimmed);
        }
        std::env::current_exe()
            .ok()
            .and_then(|exe| exe.parent().map(Path::to_path_buf))
            .unwrap_or_else(|| PathBuf::from("."))
    }

    pub fn resolved_scratch_dir(&self) -> Option<PathBuf> {
        let trimmed = self.scratch_dir.trim();
        (!trimmed.is_empty()).then(|| PathBuf::from(trimmed))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LoggingSettings {
    pub log_level: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct AppConfig {
    #[serde(default)]
    pub simpleperf: SimpleperfSettings,
    #[serde(default)]
    pub logging: LoggingSettings,
}

pub fn config_path() -> PathBuf {
    if let Ok(path) = std::env::var(CONFIG_PATH_ENV) {
        return PathBuf::from(path);
    }
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".droidperf_config.json")
}

pub fn load_config(trace_id: &str) -> Result<AppConfig, AppError> {
    load_config_from_path(&config_path(), trace_id)
}

pub fn load_config_from_path(path: &Path, trace_id: &str) -> Result<AppConfig, AppError> {
    if !path.exists() {
        return Ok(AppConfig::default());
    }
    let raw = fs::read_to_string(path)
        .map_err(|err| AppError::system(format!("Failed to read config: {err}"), trace_id))?;
    let config: AppConfig = serde_json::from_str(&raw)
        .map_err(|err| AppError::validation(format!("Failed to parse config: {err}"), trace_id))?;
    Ok(validate_config(config))
}

fn validate_config(mut config: AppConfig) -> AppConfig {
    if config.simpleperf.timeout_secs == 0 || config.simpleperf.timeout_secs > MAX_TIMEOUT_SECS {
        config.simpleperf.timeout_secs = DEFAULT_TIMEOUT_SECS;
    }
    let level = config.logging.log_level.trim().to_lowercase();
    config.logging.log_level = match level.as_str() {
        "trace" | "debug" | "info" | "warn" | "error" | "off" => level,
        _ => "info".to_string(),
    };
    config
}
