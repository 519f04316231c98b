//! host-report - print OS, CPU, GPU, RAM, and per-process memory usage
//!
//! Every section is best-effort: a missing GPU driver, an unsupported CPU
//! query, or a process exiting mid-scan degrades that section only.

use anyhow::Result;
use clap::Parser;
use hostprobe::config::{Config, GpuBackend};
use hostprobe::hardware::gpu;
use hostprobe::hardware::process::SysinfoProcesses;
use hostprobe::hardware::ram::SysinfoMemory;
use hostprobe::hardware::{write_report, Probes, ReportOptions, SystemReport};
use hostprobe::terminal::{init_logging, wait_for_keypress};
use std::io;
use std::path::PathBuf;

/// Host Report - OS, CPU, GPU, and memory at a glance
#[derive(Parser)]
#[command(name = "host-report")]
#[command(version)]
#[command(about = "Print operating system, CPU, GPU, and memory usage of this machine")]
struct Cli {
    /// Config file (defaults to the platform config directory)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Process name whose memory is summed separately, e.g. chrome.exe
    #[arg(short, long)]
    target: Option<String>,

    /// Number of processes in the top-by-memory list
    #[arg(short = 'n', long)]
    top: Option<usize>,

    /// GPU query backend
    #[arg(long, value_enum)]
    gpu_backend: Option<GpuBackend>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "text")]
    format: OutputFormat,

    /// Exit without waiting for a key press
    #[arg(long, default_value_t = false)]
    no_pause: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

fn main() -> Result<()> {
    init_logging();
    let cli = Cli::parse();
    let config = Config::load_or_default(cli.config.as_deref())?;

    let options = ReportOptions {
        target_process: cli.target.unwrap_or(config.report.target_process),
        top_n: cli.top.unwrap_or(config.report.top_n),
    };
    let backend = cli.gpu_backend.unwrap_or(config.report.gpu_backend);
    tracing::debug!(?backend, target = %options.target_process, top_n = options.top_n, "starting report");

    let driver = gpu::driver_for(backend);
    let probes = Probes::live(driver.as_ref(), &SysinfoMemory, &SysinfoProcesses);

    match cli.format {
        OutputFormat::Text => {
            write_report(&mut io::stdout().lock(), &probes, &options)?;
            if config.report.pause_on_exit && !cli.no_pause {
                wait_for_keypress("Press any key to exit...")?;
            }
        }
        OutputFormat::Json => {
            let report = SystemReport::detect(&probes, &options)?;
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
    }

    Ok(())
}
