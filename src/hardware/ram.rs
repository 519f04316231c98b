//! System-wide RAM statistics

use serde::{Deserialize, Serialize};
use sysinfo::System;

/// RAM usage snapshot in bytes
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct SystemMemory {
    pub total_bytes: u64,
    pub used_bytes: u64,
    pub available_bytes: u64,
}

/// Source of RAM statistics
pub trait MemorySource {
    fn system_memory(&self) -> SystemMemory;
}

/// Live RAM statistics from sysinfo
pub struct SysinfoMemory;

impl MemorySource for SysinfoMemory {
    fn system_memory(&self) -> SystemMemory {
        let mut sys = System::new();
        sys.refresh_memory();

        SystemMemory {
            total_bytes: sys.total_memory(),
            used_bytes: sys.used_memory(),
            available_bytes: sys.available_memory(),
        }
    }
}
