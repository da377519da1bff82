use serde::Serialize;

use crate::app::error::AppError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OsFamily {
    Linux,
    MacOs,
    Windows,
}

impl OsFamily {
    /// Maps a `std::env::consts::OS` value.
    pub fn from_os_name(name: &str) -> Option<Self> {
        match name {
            "linux" => Some(Self::Linux),
            "macos" => Some(Self::MacOs),
            "windows" => Some(Self::Windows),
            _ => None,
        }
    }
}

/// Host platform that selects which prebuilt simpleperf binary to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Platform {
    pub os: OsFamily,
    pub is_64_bit: bool,
}

impl Platform {
    pub fn new(os: OsFamily, is_64_bit: bool) -> Self {
        Self { os, is_64_bit }
    }

    pub fn current() -> Result<Self, AppError> {
        Self::for_os_name(std::env::consts::OS, cfg!(target_pointer_width = "64"))
    }

    pub fn for_os_name(name: &str, is_64_bit: bool) -> Result<Self, AppError> {
        let os = OsFamily::from_os_name(name).ok_or_else(|| {
            AppError::unsupported_platform(format!("Unknown operating system: {name}"), "")
        })?;
        Ok(Self::new(os, is_64_bit))
    }

    pub fn subdirectory(&self) -> String {
        let os = match self.os {
            OsFamily::Linux => "linux-x86",
            OsFamily::MacOs => "darwin-x86",
            OsFamily::Windows => "windows",
        };
        let suffix = match (self.is_64_bit, self.os) {
            (false, _) => "",
            (true, OsFamily::Windows) => "-x86_64",
            (true, _) => "_64",
        };
        format!("{os}{suffix}")
    }

    pub fn binary_name(&self) -> &'static str {
        match self.os {
            OsFamily::Windows => "simpleperf.exe",
            OsFamily::Linux | OsFamily::MacOs => "simpleperf",
        }
    }
}
