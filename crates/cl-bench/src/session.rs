//! One device, one context, one built program.

use crate::{
    device::{all_devices, DeviceInfo},
    BenchConfig, BenchError, ProgramSource, Result,
};

use opencl3::{
    command_queue::{CommandQueue, CL_QUEUE_PROFILING_ENABLE},
    context::Context,
    kernel::Kernel,
    program::Program,
};
use tracing::{debug, info, warn};

pub struct DeviceSession {
    pub info: DeviceInfo,
    pub context: Context,
    pub program: Program,
}

impl DeviceSession {
    /// Creates a context for `info` and builds `source` for it. A failed
    /// build comes back as [`BenchError::Build`] carrying the build log.
    pub fn open(info: DeviceInfo, source: &str) -> Result<Self> {
        let context = Context::from_device(&info.device())?;
        let program = Program::create_and_build_from_source(&context, source, "").map_err(
            |log| BenchError::Build {
                device: info.name.clone(),
                log,
            },
        )?;
        debug!(device = %info.name, "program built");
        Ok(Self { info, context, program })
    }

    /// One session per device passing the filter. Devices whose build
    /// fails are logged and skipped; no platform at all gives no sessions.
    pub fn open_all(config: &BenchConfig, program: ProgramSource) -> Result<Vec<Self>> {
        let source = program.load(config)?;
        let devices = match all_devices(config.devices) {
            Ok(devices) => devices,
            Err(BenchError::NoPlatforms) => {
                warn!("no OpenCL platform installed");
                Vec::new()
            }
            Err(e) => return Err(e),
        };
        let mut sessions = Vec::new();
        for info in devices {
            match Self::open(info, &source) {
                Ok(session) => sessions.push(session),
                Err(BenchError::Build { device, log }) => {
                    warn!(%device, "build failed, skipping device:\n{log}");
                }
                Err(e) => return Err(e),
            }
        }
        info!(devices = sessions.len(), program = program.file_name(), "sessions ready");
        Ok(sessions)
    }

    /// Fresh in-order queue; `profiling` enables event timestamps.
    pub fn queue(&self, profiling: bool) -> Result<CommandQueue> {
        let props = if profiling { CL_QUEUE_PROFILING_ENABLE } else { 0 };
        #[allow(deprecated)]
        let queue = CommandQueue::create_default(&self.context, props)?;
        Ok(queue)
    }

    pub fn kernel(&self, name: &str) -> Result<Kernel> {
        Ok(Kernel::create(&self.program, name)?)
    }

    pub fn name(&self) -> &str {
        &self.info.name
    }
}
