//! Per-process resident memory
//!
//! Snapshots are racy by nature: a process listed by the OS may exit or
//! deny access before its fields are read. Such entries come back as
//! [`ProbeError`] and are skipped by [`collect`].

use serde::{Deserialize, Serialize};
use std::cmp::Reverse;
use sysinfo::{ProcessRefreshKind, ProcessStatus, ProcessesToUpdate, System};
use thiserror::Error;

/// Why a listed process could not be read
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ProbeError {
    #[error("process {0} no longer exists")]
    Vanished(u32),

    #[error("access denied to process {0}")]
    AccessDenied(u32),

    #[error("process {0} is a zombie")]
    Zombie(u32),
}

/// One process and its resident set size
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ProcessRecord {
    pub pid: u32,
    pub name: String,
    pub rss_bytes: u64,
}

/// Memory held by every process sharing one executable name
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AppUsage {
    pub name: String,
    /// Matching processes, largest first
    pub processes: Vec<ProcessRecord>,
    /// Exact sum of `rss_bytes` over `processes`
    pub total_bytes: u64,
}

/// Something that can list running processes
pub trait ProcessSource {
    /// Take a fresh snapshot. Entries that failed mid-read are `Err`.
    fn snapshot(&self) -> Vec<Result<ProcessRecord, ProbeError>>;
}

/// Live process table from sysinfo
pub struct SysinfoProcesses;

impl ProcessSource for SysinfoProcesses {
    fn snapshot(&self) -> Vec<Result<ProcessRecord, ProbeError>> {
        let mut sys = System::new();
        sys.refresh_processes_specifics(
            ProcessesToUpdate::All,
            true,
            ProcessRefreshKind::nothing().with_memory(),
        );

        // Linux lists every task of a process alongside it, each carrying the
        // owner's resident memory
        sys.processes()
            .iter()
            .filter(|(_, process)| process.thread_kind().is_none())
            .map(|(pid, process)| {
                let pid = pid.as_u32();
                match process.status() {
                    ProcessStatus::Zombie => return Err(ProbeError::Zombie(pid)),
                    ProcessStatus::Dead => return Err(ProbeError::Vanished(pid)),
                    _ => {}
                }

                let name = process.name().to_string_lossy().into_owned();
                if name.is_empty() {
                    return Err(ProbeError::AccessDenied(pid));
                }

                Ok(ProcessRecord {
                    pid,
                    name,
                    rss_bytes: process.memory(),
                })
            })
            .collect()
    }
}

/// Take a snapshot and drop the entries that could not be read
pub fn collect(source: &dyn ProcessSource) -> Vec<ProcessRecord> {
    source
        .snapshot()
        .into_iter()
        .filter_map(|entry| match entry {
            Ok(record) => Some(record),
            Err(err) => {
                tracing::trace!(error = %err, "skipping process");
                None
            }
        })
        .collect()
}

/// Sort records largest resident memory first
pub fn sort_by_rss_desc(records: &mut [ProcessRecord]) {
    records.sort_by_key(|r| Reverse(r.rss_bytes));
}

/// Processes named exactly `name`, largest first, with their total
pub fn app_usage(records: &[ProcessRecord], name: &str) -> AppUsage {
    let mut processes: Vec<ProcessRecord> =
        records.iter().filter(|r| r.name == name).cloned().collect();
    sort_by_rss_desc(&mut processes);
    let total_bytes = processes.iter().map(|r| r.rss_bytes).sum();

    AppUsage {
        name: name.to_string(),
        processes,
        total_bytes,
    }
}

/// The `n` processes with the largest resident memory, largest first
pub fn top_by_rss(mut records: Vec<ProcessRecord>, n: usize) -> Vec<ProcessRecord> {
    sort_by_rss_desc(&mut records);
    records.truncate(n);
    records
}
