//! Automation server state.

use serde::{Deserialize, Serialize};

use super::process::ProcessRecord;

/// Readiness of an automation server instance.
///
/// `Starting -> Ready` when the log marker is seen, `Starting -> Failed` on
/// timeout or spawn error, and any state `-> Stopped` on explicit stop.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ServerReadiness {
    Starting,
    Ready,
    Failed,
    #[default]
    Stopped,
}

impl ServerReadiness {
    #[must_use]
    pub const fn is_ready(&self) -> bool {
        matches!(self, Self::Ready)
    }
}

/// Snapshot of the automation server managed by an orchestrator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AutomationServerInstance {
    pub port: u16,
    pub process: ProcessRecord,
    pub readiness: ServerReadiness,
}
