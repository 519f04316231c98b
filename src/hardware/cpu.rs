//! CPU model detection
//!
//! Tries, in order:
//! - Windows: `wmic cpu get Name`
//! - Linux: /proc/cpuinfo
//! - Cross-platform: sysinfo brand string
//!
//! The first strategy that yields a non-empty name wins.

use anyhow::{Context, Result};
#[cfg(target_os = "linux")]
use std::fs;
#[cfg(target_os = "windows")]
use std::process::Command;
use sysinfo::System;

use super::RETRIEVAL_FAILED;

/// A named way of discovering the CPU model
struct CpuStrategy {
    label: &'static str,
    run: fn() -> Result<String>,
}

/// Strategies available on this platform, in order of preference
fn strategies() -> Vec<CpuStrategy> {
    let mut list: Vec<CpuStrategy> = Vec::new();

    #[cfg(target_os = "windows")]
    list.push(CpuStrategy {
        label: "wmic",
        run: detect_wmic,
    });

    #[cfg(target_os = "linux")]
    list.push(CpuStrategy {
        label: "cpuinfo",
        run: detect_cpuinfo,
    });

    list.push(CpuStrategy {
        label: "sysinfo",
        run: detect_sysinfo,
    });
    list
}

/// Detect the CPU model name, or the placeholder when every strategy fails
pub fn detect_cpu_name() -> String {
    first_success(&strategies()).unwrap_or_else(|| RETRIEVAL_FAILED.to_string())
}

/// Run strategies in order and return the first non-empty name
fn first_success(strategies: &[CpuStrategy]) -> Option<String> {
    for CpuStrategy { label, run } in strategies {
        match run() {
            Ok(name) if !name.is_empty() => {
                tracing::debug!(strategy = label, cpu = %name, "cpu model detected");
                return Some(name);
            }
            Ok(_) => tracing::debug!(strategy = label, "cpu strategy returned nothing"),
            Err(err) => tracing::debug!(strategy = label, error = %err, "cpu strategy failed"),
        }
    }
    None
}

/// Parse `wmic cpu get Name` output.
///
/// Skips blank lines and lines starting with the `Name` header; the last
/// remaining line, trimmed, is the CPU name.
pub fn parse_wmic_name(output: &str) -> Option<String> {
    output
        .split('\n')
        .filter(|line| !line.trim().is_empty() && !line.starts_with("Name"))
        .last()
        .map(|line| line.trim().to_string())
}

/// Parse the first `model name` entry of /proc/cpuinfo
pub fn parse_cpuinfo_model(content: &str) -> Option<String> {
    content
        .lines()
        .filter(|line| line.starts_with("model name"))
        .find_map(|line| line.split_once(':'))
        .map(|(_, value)| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

#[cfg(target_os = "windows")]
fn detect_wmic() -> Result<String> {
    let output = Command::new("wmic")
        .args(["cpu", "get", "Name"])
        .output()
        .context("wmic not found")?;

    let stdout = String::from_utf8_lossy(&output.stdout);
    parse_wmic_name(&stdout).context("No CPU name in wmic output")
}

#[cfg(target_os = "linux")]
fn detect_cpuinfo() -> Result<String> {
    let content =
        fs::read_to_string("/proc/cpuinfo").context("Failed to read /proc/cpuinfo")?;
    parse_cpuinfo_model(&content).context("No model name in /proc/cpuinfo")
}

fn detect_sysinfo() -> Result<String> {
    let mut sys = System::new();
    sys.refresh_cpu_all();

    let cpu = sys.cpus().first().context("No CPU detected")?;
    Ok(cpu.brand().trim().to_string())
}
