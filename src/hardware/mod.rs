//! Hardware and process detection
//!
//! Detects OS, CPU, GPU, RAM, and per-process memory using sysinfo
//! and platform-specific tools (NVML or nvidia-smi for NVIDIA, wmic on Windows).

pub mod cpu;
pub mod gpu;
pub mod os;
pub mod process;
pub mod ram;
mod system;

pub use system::{write_report, MemoryReport, Probes, ReportOptions, SystemReport};

/// Printed in place of a value that could not be retrieved
pub const RETRIEVAL_FAILED: &str = "retrieval failed";

const GIB: f64 = 1024.0 * 1024.0 * 1024.0;

/// Convert bytes to gigabytes (binary)
pub fn bytes_to_gb(bytes: u64) -> f64 {
    bytes as f64 / GIB
}

/// Format bytes as gigabytes with two decimals, e.g. `"1.50 GB"`
pub fn format_gb(bytes: u64) -> String {
    format!("{:.2} GB", bytes_to_gb(bytes))
}
