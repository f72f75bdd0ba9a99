//! Platform and device discovery.

use crate::{BenchError, DeviceFilter, Result};

use opencl3::{
    device::{
        CL_DEVICE_TYPE_ACCELERATOR, CL_DEVICE_TYPE_ALL, CL_DEVICE_TYPE_CPU, CL_DEVICE_TYPE_GPU,
        Device,
    },
    platform::{get_platforms, Platform},
    types::{cl_device_id, cl_device_type, cl_int},
};
use std::fmt::{self, Write as _};
use tracing::{debug, warn};

/// Returned by the ICD loader when no platform is installed.
const CL_PLATFORM_NOT_FOUND_KHR: cl_int = -1001;

/// Device type bits as reported by `CL_DEVICE_TYPE`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DeviceKind(pub cl_device_type);

impl DeviceKind {
    pub fn is_gpu(self) -> bool {
        self.0 & CL_DEVICE_TYPE_GPU != 0
    }

    pub fn is_cpu(self) -> bool {
        self.0 & CL_DEVICE_TYPE_CPU != 0
    }

    pub fn is_accelerator(self) -> bool {
        self.0 & CL_DEVICE_TYPE_ACCELERATOR != 0
    }
}

impl fmt::Display for DeviceKind {
    /// Every set bit, space separated: `"CPU GPU"`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let labels: Vec<&str> = [
            (self.is_cpu(), "CPU"),
            (self.is_gpu(), "GPU"),
            (self.is_accelerator(), "ACCELERATOR"),
        ]
        .into_iter()
        .filter_map(|(set, label)| set.then_some(label))
        .collect();
        f.write_str(&labels.join(" "))
    }
}

#[derive(Clone, Debug)]
pub struct DeviceInfo {
    pub id: cl_device_id,
    pub name: String,
    pub kind: DeviceKind,
    pub global_mem_bytes: Option<u64>,
    pub compute_units: Option<u32>,
    pub max_work_group_size: Option<usize>,
}

impl DeviceInfo {
    /// Queries the descriptive properties of one device. A missing name is
    /// rendered as `<error>`, other properties stay `None`.
    pub fn query(id: cl_device_id) -> Self {
        let device = Device::new(id);
        Self {
            id,
            name: device
                .name()
                .map(|n| n.trim_end_matches('\0').trim().to_string())
                .unwrap_or_else(|_| "<error>".to_string()),
            kind: DeviceKind(device.dev_type().unwrap_or(0)),
            global_mem_bytes: device.global_mem_size().ok(),
            compute_units: device.max_compute_units().ok(),
            max_work_group_size: device.max_work_group_size().ok(),
        }
    }

    pub fn device(&self) -> Device {
        Device::new(self.id)
    }

    pub fn global_mem_mb(&self) -> Option<u64> {
        self.global_mem_bytes.map(|b| b / (1024 * 1024))
    }
}

#[derive(Debug)]
pub struct PlatformInfo {
    pub index: usize,
    pub name: String,
    pub vendor: String,
    pub version: String,
    /// OpenCL status code when the device query for this platform failed.
    pub devices: std::result::Result<Vec<DeviceInfo>, i32>,
}

fn info_or_error(value: opencl3::Result<String>) -> String {
    value
        .map(|s| s.trim_end_matches('\0').trim().to_string())
        .unwrap_or_else(|_| "<error>".to_string())
}

fn describe_platform(index: usize, platform: &Platform) -> PlatformInfo {
    let devices = match platform.get_devices(CL_DEVICE_TYPE_ALL) {
        Ok(ids) => Ok(ids.into_iter().map(DeviceInfo::query).collect()),
        Err(e) => {
            warn!(platform = index, code = e.0, "device query failed");
            Err(e.0)
        }
    };
    PlatformInfo {
        index,
        name: info_or_error(platform.name()),
        vendor: info_or_error(platform.vendor()),
        version: info_or_error(platform.version()),
        devices,
    }
}

/// Every platform with its devices. Per-platform failures are kept on the
/// platform entry; only a missing ICD or zero platforms is an error.
pub fn enumerate_platforms() -> Result<Vec<PlatformInfo>> {
    let platforms = get_platforms().map_err(|e| match e.0 {
        CL_PLATFORM_NOT_FOUND_KHR => BenchError::NoPlatforms,
        code => BenchError::Api(code),
    })?;
    if platforms.is_empty() {
        return Err(BenchError::NoPlatforms);
    }
    debug!(count = platforms.len(), "found OpenCL platforms");
    Ok(platforms
        .iter()
        .enumerate()
        .map(|(i, p)| describe_platform(i, p))
        .collect())
}

/// All devices on all platforms that pass `filter`, in platform order.
pub fn all_devices(filter: DeviceFilter) -> Result<Vec<DeviceInfo>> {
    let devices: Vec<DeviceInfo> = enumerate_platforms()?
        .into_iter()
        .filter_map(|p| p.devices.ok())
        .flatten()
        .filter(|d| filter.accepts(d.kind.0))
        .collect();
    debug!(count = devices.len(), ?filter, "selected devices");
    Ok(devices)
}

/// First GPU that passes `filter`, otherwise the first device at all.
pub fn preferred_device(filter: DeviceFilter) -> Result<DeviceInfo> {
    let mut devices = all_devices(filter)?;
    if devices.is_empty() {
        return Err(BenchError::NoDevices);
    }
    let pick = devices.iter().position(|d| d.kind.is_gpu()).unwrap_or(0);
    Ok(devices.swap_remove(pick))
}

/// The device enumeration report, banner to closing line.
pub fn render_report(platforms: &[PlatformInfo]) -> String {
    let mut out = String::new();
    let _ = write_report(&mut out, platforms);
    out
}

fn write_report(out: &mut String, platforms: &[PlatformInfo]) -> fmt::Result {
    writeln!(out, "=== OpenCL Device Enumeration ===\n")?;
    writeln!(out, "Found {} OpenCL platform(s)\n", platforms.len())?;
    for p in platforms {
        writeln!(out, "Platform {}:", p.index)?;
        writeln!(out, "  Name: {}", p.name)?;
        writeln!(out, "  Vendor: {}", p.vendor)?;
        writeln!(out, "  Version: {}", p.version)?;

        let devices = match &p.devices {
            Ok(devices) => devices,
            Err(code) => {
                writeln!(out, "  Devices: <error {code}, skipping>\n")?;
                continue;
            }
        };
        writeln!(out, "  Devices: {}", devices.len())?;

        for (j, d) in devices.iter().enumerate() {
            writeln!(out, "    Device {j}:")?;
            writeln!(out, "      Name: {}", d.name)?;
            writeln!(out, "      Type: {}", d.kind)?;
            if let Some(mb) = d.global_mem_mb() {
                writeln!(out, "      Global Memory: {mb} MB")?;
            }
            if let Some(cu) = d.compute_units {
                writeln!(out, "      Compute Units: {cu}")?;
            }
            if let Some(wg) = d.max_work_group_size {
                writeln!(out, "      Max Work-Group Size: {wg}")?;
            }
        }
        writeln!(out)?;
    }
    writeln!(out, "Enumeration complete!")
}

pub fn print_report(platforms: &[PlatformInfo]) {
    print!("{}", render_report(platforms));
}
