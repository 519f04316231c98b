//! Operating system descriptor

use sysinfo::System;

use super::RETRIEVAL_FAILED;

/// Detect a human-readable platform descriptor, e.g.
/// `Windows-11-10.0.22631-x86_64` or `Ubuntu-24.04-6.8.0-45-generic-x86_64`.
///
/// Falls back to the long OS version, then to the placeholder.
pub fn detect_os_version() -> String {
    platform_descriptor(
        System::name(),
        System::os_version(),
        System::kernel_version(),
        std::env::consts::ARCH,
    )
    .or_else(System::long_os_version)
    .unwrap_or_else(|| RETRIEVAL_FAILED.to_string())
}

/// Join whatever descriptor parts are known. The OS name is required.
fn platform_descriptor(
    name: Option<String>,
    version: Option<String>,
    kernel: Option<String>,
    arch: &str,
) -> Option<String> {
    let name = name.filter(|n| !n.trim().is_empty())?;

    let mut parts = vec![name.trim().to_string()];
    parts.extend(
        [version, kernel]
            .into_iter()
            .flatten()
            .map(|p| p.trim().to_string())
            .filter(|p| !p.is_empty()),
    );
    if !arch.is_empty() {
        parts.push(arch.to_string());
    }

    Some(parts.join("-"))
}
