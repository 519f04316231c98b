//! GPU memory detection
//!
//! Driver access is modelled as a scoped session: [`GpuDriver::open`] acquires
//! the vendor library, [`GpuSession::shutdown`] releases it. Backends:
//! - NVML through `nvml-wrapper` (library loaded at runtime)
//! - `nvidia-smi` CSV queries (cross-platform, needs the tool on PATH)

use nvml_wrapper::Nvml;
use serde::{Deserialize, Serialize};
use std::process::Command;
use thiserror::Error;

use crate::config::GpuBackend;

/// Errors raised by GPU backends
#[derive(Debug, Error)]
pub enum GpuError {
    #[error("driver initialization failed: {0}")]
    Init(String),

    #[error("device query failed: {0}")]
    Query(String),

    #[error("driver shutdown failed: {0}")]
    Shutdown(String),
}

/// Memory statistics of one GPU device
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct GpuDevice {
    /// Device name (e.g., "NVIDIA GeForce RTX 4070")
    pub name: String,
    /// Total dedicated memory in bytes
    pub total_bytes: u64,
    /// Used dedicated memory in bytes
    pub used_bytes: u64,
    /// Free dedicated memory in bytes
    pub free_bytes: u64,
}

/// Outcome of a GPU query
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum GpuReport {
    /// Driver could not be initialized; nothing else is known
    Unavailable { reason: String },
    /// Devices enumerated by the driver, in driver order
    Devices { devices: Vec<GpuDevice> },
}

/// A GPU vendor library that can be opened for queries
pub trait GpuDriver {
    /// Initialize the library and return a live session
    fn open(&self) -> Result<Box<dyn GpuSession + '_>, GpuError>;
}

/// An initialized driver. Dropping a session also releases it.
pub trait GpuSession {
    fn device_count(&self) -> Result<u32, GpuError>;

    fn device(&self, index: u32) -> Result<GpuDevice, GpuError>;

    /// Release the driver explicitly
    fn shutdown(self: Box<Self>) -> Result<(), GpuError>;
}

/// Build the driver for the configured backend
pub fn driver_for(backend: GpuBackend) -> Box<dyn GpuDriver> {
    match backend {
        GpuBackend::Nvml => Box::new(NvmlDriver),
        GpuBackend::NvidiaSmi => Box::new(NvidiaSmiDriver),
    }
}

/// Query every device.
///
/// Failure to open the driver or to read the device count is tolerated and
/// reported as [`GpuReport::Unavailable`]. A failing device query after that
/// is returned as an error. The session is shut down on every path.
pub fn query(driver: &dyn GpuDriver) -> Result<GpuReport, GpuError> {
    let session = match driver.open() {
        Ok(session) => session,
        Err(err) => {
            tracing::debug!(error = %err, "gpu driver unavailable");
            return Ok(GpuReport::Unavailable {
                reason: err.to_string(),
            });
        }
    };

    let count = match session.device_count() {
        Ok(count) => count,
        Err(err) => {
            tracing::debug!(error = %err, "gpu device count unavailable");
            close(session);
            return Ok(GpuReport::Unavailable {
                reason: err.to_string(),
            });
        }
    };

    let devices = (0..count)
        .map(|index| session.device(index))
        .collect::<Result<Vec<_>, _>>();
    close(session);

    Ok(GpuReport::Devices { devices: devices? })
}

fn close(session: Box<dyn GpuSession + '_>) {
    if let Err(err) = session.shutdown() {
        tracing::warn!(error = %err, "gpu driver shutdown failed");
    }
}

/// NVIDIA Management Library backend
pub struct NvmlDriver;

impl GpuDriver for NvmlDriver {
    fn open(&self) -> Result<Box<dyn GpuSession + '_>, GpuError> {
        let nvml = Nvml::init().map_err(|e| GpuError::Init(e.to_string()))?;
        Ok(Box::new(NvmlSession { nvml }))
    }
}

struct NvmlSession {
    nvml: Nvml,
}

impl GpuSession for NvmlSession {
    fn device_count(&self) -> Result<u32, GpuError> {
        self.nvml
            .device_count()
            .map_err(|e| GpuError::Init(e.to_string()))
    }

    fn device(&self, index: u32) -> Result<GpuDevice, GpuError> {
        let device = self
            .nvml
            .device_by_index(index)
            .map_err(|e| GpuError::Query(e.to_string()))?;
        let name = device.name().map_err(|e| GpuError::Query(e.to_string()))?;
        let memory = device
            .memory_info()
            .map_err(|e| GpuError::Query(e.to_string()))?;

        Ok(GpuDevice {
            name,
            total_bytes: memory.total,
            used_bytes: memory.used,
            free_bytes: memory.free,
        })
    }

    fn shutdown(self: Box<Self>) -> Result<(), GpuError> {
        self.nvml
            .shutdown()
            .map_err(|e| GpuError::Shutdown(e.to_string()))
    }
}

/// `nvidia-smi` backend; the whole table is read when the session opens
pub struct NvidiaSmiDriver;

impl GpuDriver for NvidiaSmiDriver {
    fn open(&self) -> Result<Box<dyn GpuSession + '_>, GpuError> {
        let output = Command::new("nvidia-smi")
            .args([
                "--query-gpu=name,memory.total,memory.used,memory.free",
                "--format=csv,noheader,nounits",
            ])
            .output()
            .map_err(|e| GpuError::Init(format!("nvidia-smi not found: {e}")))?;

        if !output.status.success() {
            return Err(GpuError::Init(format!(
                "nvidia-smi failed: {}",
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        Ok(Box::new(NvidiaSmiSession {
            rows: stdout.lines().map(str::to_string).collect(),
        }))
    }
}

struct NvidiaSmiSession {
    rows: Vec<String>,
}

impl GpuSession for NvidiaSmiSession {
    fn device_count(&self) -> Result<u32, GpuError> {
        let count = self.rows.iter().filter(|r| !r.trim().is_empty()).count();
        u32::try_from(count).map_err(|e| GpuError::Init(e.to_string()))
    }

    fn device(&self, index: u32) -> Result<GpuDevice, GpuError> {
        let row = self
            .rows
            .iter()
            .filter(|r| !r.trim().is_empty())
            .nth(index as usize)
            .ok_or_else(|| GpuError::Query(format!("no device at index {index}")))?;
        parse_smi_row(row)
    }

    fn shutdown(self: Box<Self>) -> Result<(), GpuError> {
        Ok(())
    }
}

const MIB: u64 = 1024 * 1024;

/// Parse one `name, total, used, free` row (memory in MiB)
fn parse_smi_row(row: &str) -> Result<GpuDevice, GpuError> {
    let parts: Vec<&str> = row.split(", ").map(str::trim).collect();
    if parts.len() < 4 {
        return Err(GpuError::Query(format!("invalid nvidia-smi row: {row}")));
    }

    let mib = |value: &str| -> Result<u64, GpuError> {
        value
            .parse::<u64>()
            .map(|v| v * MIB)
            .map_err(|_| GpuError::Query(format!("invalid memory value: {value}")))
    };

    Ok(GpuDevice {
        name: parts[0].to_string(),
        total_bytes: mib(parts[1])?,
        used_bytes: mib(parts[2])?,
        free_bytes: mib(parts[3])?,
    })
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::cell::Cell;

    /// Scripted driver for tests; counts shutdowns
    pub(crate) struct FakeDriver {
        pub init_fails: bool,
        pub count_fails: bool,
        pub device_fails: bool,
        pub devices: Vec<GpuDevice>,
        pub shutdowns: Cell<u32>,
    }

    impl FakeDriver {
        pub(crate) fn with_devices(devices: Vec<GpuDevice>) -> Self {
            Self {
                init_fails: false,
                count_fails: false,
                device_fails: false,
                devices,
                shutdowns: Cell::new(0),
            }
        }

        pub(crate) fn failing_init() -> Self {
            Self {
                init_fails: true,
                ..Self::with_devices(Vec::new())
            }
        }
    }

    struct FakeSession<'a> {
        driver: &'a FakeDriver,
    }

    impl GpuDriver for FakeDriver {
        fn open(&self) -> Result<Box<dyn GpuSession + '_>, GpuError> {
            if self.init_fails {
                return Err(GpuError::Init("NVML shared library not found".to_string()));
            }
            Ok(Box::new(FakeSession { driver: self }))
        }
    }

    impl GpuSession for FakeSession<'_> {
        fn device_count(&self) -> Result<u32, GpuError> {
            if self.driver.count_fails {
                return Err(GpuError::Init("driver not loaded".to_string()));
            }
            Ok(self.driver.devices.len() as u32)
        }

        fn device(&self, index: u32) -> Result<GpuDevice, GpuError> {
            if self.driver.device_fails {
                return Err(GpuError::Query("gpu is lost".to_string()));
            }
            Ok(self.driver.devices[index as usize].clone())
        }

        fn shutdown(self: Box<Self>) -> Result<(), GpuError> {
            self.driver.shutdowns.set(self.driver.shutdowns.get() + 1);
            Ok(())
        }
    }

    pub(crate) fn sample_device(name: &str) -> GpuDevice {
        GpuDevice {
            name: name.to_string(),
            total_bytes: 8 * 1024 * MIB,
            used_bytes: 2 * 1024 * MIB,
            free_bytes: 6 * 1024 * MIB,
        }
    }

    #[test]
    fn init_failure_is_reported_as_unavailable() {
        let driver = FakeDriver::failing_init();
        let report = query(&driver).unwrap();
        assert!(matches!(report, GpuReport::Unavailable { .. }));
        assert_eq!(driver.shutdowns.get(), 0);
    }

    #[test]
    fn count_failure_is_unavailable_and_releases_driver() {
        let driver = FakeDriver {
            count_fails: true,
            ..FakeDriver::with_devices(vec![sample_device("A")])
        };
        let report = query(&driver).unwrap();
        assert!(matches!(report, GpuReport::Unavailable { .. }));
        assert_eq!(driver.shutdowns.get(), 1);
    }

    #[test]
    fn devices_are_listed_in_driver_order() {
        let driver = FakeDriver::with_devices(vec![sample_device("A"), sample_device("B")]);
        let report = query(&driver).unwrap();
        match report {
            GpuReport::Devices { devices } => {
                let names: Vec<_> = devices.iter().map(|d| d.name.as_str()).collect();
                assert_eq!(names, ["A", "B"]);
            }
            other => panic!("expected devices, got {other:?}"),
        }
        assert_eq!(driver.shutdowns.get(), 1);
    }

    #[test]
    fn device_query_failure_propagates_after_shutdown() {
        let driver = FakeDriver {
            device_fails: true,
            ..FakeDriver::with_devices(vec![sample_device("A")])
        };
        assert!(matches!(query(&driver), Err(GpuError::Query(_))));
        assert_eq!(driver.shutdowns.get(), 1);
    }

    #[test]
    fn smi_row_is_parsed_from_mib() {
        let device = parse_smi_row("NVIDIA GeForce RTX 3070, 8192, 1024, 7168").unwrap();
        assert_eq!(device.name, "NVIDIA GeForce RTX 3070");
        assert_eq!(device.total_bytes, 8192 * MIB);
        assert_eq!(device.used_bytes, 1024 * MIB);
        assert_eq!(device.free_bytes, 7168 * MIB);
    }

    #[test]
    fn smi_row_rejects_short_or_garbled_rows() {
        assert!(parse_smi_row("NVIDIA GeForce RTX 3070, 8192").is_err());
        assert!(parse_smi_row("GPU, [N/A], 1, 2").is_err());
    }

    #[test]
    fn smi_session_skips_blank_rows() {
        let session = NvidiaSmiSession {
            rows: vec![
                "Tesla T4, 15360, 0, 15360".to_string(),
                String::new(),
                "Tesla T4, 15360, 512, 14848".to_string(),
            ],
        };
        assert_eq!(session.device_count().unwrap(), 2);
        assert_eq!(session.device(1).unwrap().used_bytes, 512 * MIB);
    }
}
