//! OpenCL device benchmarks.
//!
//! Every workload in [`workloads`] follows the same flat pattern: enumerate
//! devices, build a program per device, move the inputs over, dispatch one
//! kernel, time it and print a comparison against serial and parallel CPU
//! baselines. The CPU paths are plain functions so they can be tested and
//! benchmarked without an OpenCL runtime.

// ─── Modules ─────────────────────────────────────────────────────────
pub mod buffer;
pub mod config;
pub mod consts;
pub mod cpu;
pub mod device;
pub mod program;
pub mod report;
pub mod session;
pub mod timing;
pub mod verify;
pub mod workloads;

// ─── Feature modules ─────────────────────────────────────────────────
#[cfg(feature = "metrics")]
mod metrics;
#[cfg(feature = "metrics")]
pub use metrics::{summary, ALLOCS, ALLOC_BYTES};

#[cfg(feature = "memtrace")]
mod memtracer;
#[cfg(feature = "memtrace")]
pub use memtracer::{flush_csv, start as trace_start, CopyToken, Dir};

pub use buffer::{GpuBuffer, GpuEventGuard, InFlight, Queued, Ready};
pub use config::{BenchConfig, DeviceFilter};
pub use device::{DeviceInfo, DeviceKind, PlatformInfo};
pub use program::ProgramSource;
pub use session::DeviceSession;

use std::{io, path::PathBuf};

// ─── Error type ──────────────────────────────────────────────────────
#[derive(thiserror::Error, Debug)]
pub enum BenchError {
    #[error("OpenCL API error: {0}")]
    Api(i32),
    #[error("program build failed on {device}:\n{log}")]
    Build { device: String, log: String },
    #[error("no OpenCL platforms found")]
    NoPlatforms,
    #[error("no OpenCL devices match the requested device type")]
    NoDevices,
    #[error("invalid buffer size: {0}")]
    InvalidSize(usize),
    #[error("host slice has {host} elements, device buffer has {device}")]
    LengthMismatch { host: usize, device: usize },
    #[error("failed to read kernel source {}: {source}", path.display())]
    KernelSource {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error(transparent)]
    Io(#[from] io::Error),
}

pub type Result<T, E = BenchError> = std::result::Result<T, E>;

impl From<opencl3::error_codes::ClError> for BenchError {
    #[inline]
    fn from(err: opencl3::error_codes::ClError) -> Self {
        BenchError::Api(err.0)
    }
}

impl From<i32> for BenchError {
    #[inline]
    fn from(code: i32) -> Self {
        BenchError::Api(code)
    }
}
