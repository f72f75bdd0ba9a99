//! Run-wide settings shared by every workload.

use opencl3::{
    device::{
        CL_DEVICE_TYPE_ACCELERATOR, CL_DEVICE_TYPE_ALL, CL_DEVICE_TYPE_CPU, CL_DEVICE_TYPE_GPU,
    },
    types::cl_device_type,
};
use std::path::PathBuf;

use crate::consts::BEST_OF;

/// Which OpenCL device types take part in a run.
#[derive(clap::ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum DeviceFilter {
    #[default]
    All,
    Gpu,
    Cpu,
    Accelerator,
}

impl DeviceFilter {
    pub fn device_type(self) -> cl_device_type {
        match self {
            DeviceFilter::All => CL_DEVICE_TYPE_ALL,
            DeviceFilter::Gpu => CL_DEVICE_TYPE_GPU,
            DeviceFilter::Cpu => CL_DEVICE_TYPE_CPU,
            DeviceFilter::Accelerator => CL_DEVICE_TYPE_ACCELERATOR,
        }
    }

    /// Whether a device reporting `ty` passes the filter.
    pub fn accepts(self, ty: cl_device_type) -> bool {
        match self {
            DeviceFilter::All => true,
            other => ty & other.device_type() != 0,
        }
    }
}

#[derive(Clone, Debug)]
pub struct BenchConfig {
    pub devices: DeviceFilter,
    /// Runs per best-of measurement, at least 1.
    pub iterations: usize,
    /// Load `*.cl` from here instead of the embedded sources.
    pub kernel_dir: Option<PathBuf>,
}

impl Default for BenchConfig {
    fn default() -> Self {
        Self {
            devices: DeviceFilter::All,
            iterations: BEST_OF,
            kernel_dir: None,
        }
    }
}
