//! Keyed arena of process supervisors.

use std::collections::HashMap;

use devbridge_core::{ProcessError, ProcessOutput, ProcessRecord};
use tracing::{debug, info};

use super::supervisor::{ProcessSupervisor, StreamHandles};

/// Owns any number of supervisors addressed by caller-chosen keys.
///
/// Callers pass the registry by reference; there is no global instance.
#[derive(Debug, Default)]
pub struct ProcessRegistry {
    entries: HashMap<String, ProcessSupervisor>,
}

impl ProcessRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `command` under `key` without spawning it.
    pub fn add<I, S>(&mut self, key: &str, command: &str, args: I) -> Result<(), ProcessError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        if self.entries.contains_key(key) {
            return Err(ProcessError::DuplicateKey(key.to_string()));
        }
        let mut supervisor = ProcessSupervisor::new();
        supervisor.add(command, args)?;
        self.entries.insert(key.to_string(), supervisor);
        debug!(%key, "process registered");
        Ok(())
    }

    /// Insert a pre-configured supervisor (e.g. one carrying an env overlay).
    pub fn insert(&mut self, key: &str, supervisor: ProcessSupervisor) -> Result<(), ProcessError> {
        if self.entries.contains_key(key) {
            return Err(ProcessError::DuplicateKey(key.to_string()));
        }
        self.entries.insert(key.to_string(), supervisor);
        Ok(())
    }

    pub fn start(&mut self, key: &str) -> Result<StreamHandles, ProcessError> {
        self.get_mut(key)?.start_registered()
    }

    pub async fn run(&mut self, key: &str) -> Result<ProcessOutput, ProcessError> {
        self.get_mut(key)?.run_registered().await
    }

    /// Stop the process under `key`; `Ok(false)` if it was not live.
    pub async fn stop(&mut self, key: &str) -> Result<bool, ProcessError> {
        Ok(self.get_mut(key)?.stop().await)
    }

    /// Stop and forget the process under `key`, returning its final record.
    pub async fn remove(&mut self, key: &str) -> Result<ProcessRecord, ProcessError> {
        let mut supervisor = self
            .entries
            .remove(key)
            .ok_or_else(|| ProcessError::UnknownKey(key.to_string()))?;
        supervisor.stop().await;
        Ok(supervisor.info())
    }

    pub fn info(&self, key: &str) -> Option<ProcessRecord> {
        self.entries.get(key).map(ProcessSupervisor::info)
    }

    /// Snapshot of every record, sorted by key.
    pub fn list(&mut self) -> Vec<(String, ProcessRecord)> {
        let mut records: Vec<_> = self
            .entries
            .iter_mut()
            .map(|(key, supervisor)| {
                supervisor.refresh();
                (key.clone(), supervisor.info())
            })
            .collect();
        records.sort_by(|a, b| a.0.cmp(&b.0));
        records
    }

    /// Stop every live process. Returns how many were stopped.
    pub async fn stop_all(&mut self) -> usize {
        let mut stopped = 0;
        for (key, supervisor) in &mut self.entries {
            if supervisor.stop().await {
                debug!(%key, "process stopped");
                stopped += 1;
            }
        }
        if stopped > 0 {
            info!(count = stopped, "stopped registered processes");
        }
        stopped
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn get_mut(&mut self, key: &str) -> Result<&mut ProcessSupervisor, ProcessError> {
        self.entries
            .get_mut(key)
            .ok_or_else(|| ProcessError::UnknownKey(key.to_string()))
    }
}
