use std::collections::BTreeMap;

use serde::Serialize;
use tracing::debug;

use crate::app::models::ClientProcess;

/// A connected device as seen through the device bridge.
pub trait Device {
    fn serial(&self) -> &str;
    fn clients(&self) -> Vec<ClientProcess>;
}

/// Debugger sessions the owning project currently holds, keyed by listen port.
pub trait DebuggerRegistry {
    fn project_name(&self) -> &str;
    fn has_debuggers_attached(&self) -> bool;
    fn has_session(&self, port: u16) -> bool;
}

/// Redefines classes through the project's debugger session on `port`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DebuggerRedefiner {
    pub project: String,
    pub port: u16,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Redefiner<'a> {
    Debugger(&'a DebuggerRedefiner),
    /// The deployer's own redefinition channel, used when no debugger owns the process.
    Generic,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RedefinerMap(BTreeMap<u32, DebuggerRedefiner>);

impl RedefinerMap {
    pub fn get(&self, pid: u32) -> Option<&DebuggerRedefiner> {
        self.0.get(&pid)
    }

    pub fn redefiner_for(&self, pid: u32) -> Redefiner<'_> {
        match self.0.get(&pid) {
            Some(redefiner) => Redefiner::Debugger(redefiner),
            None => Redefiner::Generic,
        }
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Picks a debugger-backed redefiner for every client whose attached debugger
/// belongs to `project`. The device is not queried when the project has no
/// debuggers at all.
pub fn select_redefiners(project: &dyn DebuggerRegistry, device: &dyn Device) -> RedefinerMap {
    if !project.has_debuggers_attached() {
        return RedefinerMap::default();
    }

    let mut selected = BTreeMap::new();
    for client in device.clients() {
        let Some(port) = client.debugger_listen_port else {
            continue;
        };
        if project.has_session(port) {
            selected.insert(
                client.pid,
                DebuggerRedefiner {
                    project: project.project_name().to_string(),
                    port,
                },
            );
        }
    }

    debug!(
        serial = %device.serial(),
        project = %project.project_name(),
        count = selected.len(),
        "selected debugger redefiners"
    );
    RedefinerMap(selected)
}
