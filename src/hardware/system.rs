//! System report aggregator

use anyhow::{Context, Result};
use colored::Colorize;
use serde::{Deserialize, Serialize};
use std::io::Write;

use super::gpu::{self, GpuDriver, GpuReport};
use super::process::{self, AppUsage, ProcessRecord, ProcessSource};
use super::ram::{MemorySource, SystemMemory};
use super::{cpu, format_gb, os};

const RULE_WIDTH: usize = 80;

/// Printed when the GPU driver cannot be initialized
pub const GPU_UNAVAILABLE: &str =
    "Unable to initialize the NVIDIA driver; check that a GPU and the NVIDIA driver are installed";

/// What the memory section aggregates
#[derive(Debug, Clone)]
pub struct ReportOptions {
    /// Process name whose memory is summed separately
    pub target_process: String,
    /// How many processes the top-by-memory list shows
    pub top_n: usize,
}

/// Data sources behind a report
pub struct Probes<'a> {
    pub os_version: fn() -> String,
    pub cpu_name: fn() -> String,
    pub gpu: &'a dyn GpuDriver,
    pub memory: &'a dyn MemorySource,
    pub processes: &'a dyn ProcessSource,
}

impl<'a> Probes<'a> {
    /// Live OS and CPU detection with the given GPU, RAM, and process sources
    pub fn live(
        gpu: &'a dyn GpuDriver,
        memory: &'a dyn MemorySource,
        processes: &'a dyn ProcessSource,
    ) -> Self {
        Self {
            os_version: os::detect_os_version,
            cpu_name: cpu::detect_cpu_name,
            gpu,
            memory,
            processes,
        }
    }
}

/// RAM section of the report
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryReport {
    pub system: SystemMemory,
    /// Aggregate of the target application
    pub target: AppUsage,
    /// Largest processes, largest first
    pub top: Vec<ProcessRecord>,
}

impl MemoryReport {
    /// Query RAM, then snapshot processes twice: once for the target
    /// application and once for the top list.
    pub fn detect(
        memory: &dyn MemorySource,
        processes: &dyn ProcessSource,
        options: &ReportOptions,
    ) -> Self {
        let system = memory.system_memory();
        let target = process::app_usage(&process::collect(processes), &options.target_process);
        let top = process::top_by_rss(process::collect(processes), options.top_n);

        MemoryReport {
            system,
            target,
            top,
        }
    }
}

/// Complete system report
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SystemReport {
    /// Platform descriptor
    pub os: String,
    /// CPU model name
    pub cpu: String,
    /// GPU devices or the reason they are unknown
    pub gpu: GpuReport,
    /// RAM and process memory
    pub memory: MemoryReport,
}

impl SystemReport {
    /// Collect every section
    pub fn detect(probes: &Probes<'_>, options: &ReportOptions) -> Result<Self> {
        Ok(SystemReport {
            os: (probes.os_version)(),
            cpu: (probes.cpu_name)(),
            gpu: gpu::query(probes.gpu).context("GPU device query failed")?,
            memory: MemoryReport::detect(probes.memory, probes.processes, options),
        })
    }
}

/// Detect and print each section in turn, so everything gathered before an
/// unexpected failure has already been written.
pub fn write_report(
    out: &mut dyn Write,
    probes: &Probes<'_>,
    options: &ReportOptions,
) -> Result<()> {
    write_rule(out)?;
    write_os_section(out, &(probes.os_version)())?;
    write_cpu_section(out, &(probes.cpu_name)())?;

    let gpu = gpu::query(probes.gpu).context("GPU device query failed")?;
    write_gpu_section(out, &gpu)?;

    let memory = MemoryReport::detect(probes.memory, probes.processes, options);
    write_memory_section(out, &memory)?;

    write_rule(out)?;
    writeln!(out)?;
    out.flush()?;
    Ok(())
}

fn write_rule(out: &mut dyn Write) -> std::io::Result<()> {
    writeln!(out, "{}", "=".repeat(RULE_WIDTH).cyan().bold())
}

fn write_os_section(out: &mut dyn Write, os: &str) -> std::io::Result<()> {
    writeln!(out, "1. Operating system: {os}\n")
}

fn write_cpu_section(out: &mut dyn Write, cpu: &str) -> std::io::Result<()> {
    writeln!(out, "2. CPU model: {cpu}\n")
}

fn write_gpu_section(out: &mut dyn Write, gpu: &GpuReport) -> std::io::Result<()> {
    match gpu {
        GpuReport::Unavailable { .. } => writeln!(out, "{GPU_UNAVAILABLE}"),
        GpuReport::Devices { devices } => {
            for device in devices {
                writeln!(out, "3. GPU model: {}", device.name)?;
                writeln!(
                    out,
                    "   Total VRAM: {}  Used VRAM: {}  Free VRAM: {}\n",
                    format_gb(device.total_bytes),
                    format_gb(device.used_bytes),
                    format_gb(device.free_bytes)
                )?;
            }
            Ok(())
        }
    }
}

fn write_process_line(out: &mut dyn Write, record: &ProcessRecord) -> std::io::Result<()> {
    writeln!(
        out,
        "   PID: {}  Name: {}  Memory: {}",
        record.pid,
        record.name,
        format_gb(record.rss_bytes)
    )
}

fn write_memory_section(out: &mut dyn Write, memory: &MemoryReport) -> std::io::Result<()> {
    writeln!(
        out,
        "4. Memory size: {}  Used memory: {}  Available memory: {}",
        format_gb(memory.system.total_bytes),
        format_gb(memory.system.used_bytes),
        format_gb(memory.system.available_bytes)
    )?;

    for record in &memory.target.processes {
        write_process_line(out, record)?;
    }
    writeln!(
        out,
        "   {} total memory: {}",
        memory.target.name,
        format_gb(memory.target.total_bytes)
    )?;

    writeln!(out, "   Top {} processes by memory:", memory.top.len())?;
    for record in &memory.top {
        write_process_line(out, record)?;
    }
    Ok(())
}
