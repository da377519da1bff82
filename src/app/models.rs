use serde::{Deserialize, Serialize};

/// A client VM process reported by a connected device.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ClientProcess {
    pub pid: u32,
    /// Present only while a debugger is attached.
    pub debugger_listen_port: Option<u16>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CodeSwapOutcome {
    pub application_id: String,
    pub skipped_install: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ApplyChangesReport {
    pub trace_id: String,
    pub outcomes: Vec<CodeSwapOutcome>,
    pub message: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ReportSampleSummary {
    pub tool: String,
    pub status: String,
    pub input: String,
    pub output: Option<String>,
    pub binary_path: String,
    pub platform_subdirectory: String,
    pub report_bytes: Option<usize>,
    pub duration_ms: u128,
    pub timestamp_utc: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_without_debugger_port_is_not_attached() {
        let attached: ClientProcess =
            serde_json::from_str(r#"{"pid":42,"debugger_listen_port":8600}"#).expect("parse");
        assert_eq!(attached.debugger_listen_port, Some(8600));

        let detached: ClientProcess = serde_json::from_str(r#"{"pid":43}"#).expect("parse");
        assert_eq!(
            detached,
            ClientProcess {
                pid: 43,
                debugger_listen_port: None
            }
        );
    }
}
