//! Smallest possible round trip: one work-item writes a greeting.

use crate::{
    consts::HELLO_MESSAGE_LEN,
    device::preferred_device,
    BenchConfig, DeviceSession, GpuBuffer, GpuEventGuard, ProgramSource, Queued, Result,
};

use opencl3::{kernel::ExecuteKernel, memory::CL_MEM_WRITE_ONLY, platform::Platform};
use tracing::info;

/// Text up to the first NUL byte, lossily decoded.
pub fn decode_message(bytes: &[u8]) -> String {
    let end = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());
    String::from_utf8_lossy(&bytes[..end]).into_owned()
}

/// Builds and runs `hello_kernel` on the preferred device and returns the message.
pub fn say_hello(config: &BenchConfig) -> Result<String> {
    let info = preferred_device(config.devices)?;
    let source = ProgramSource::Hello.load(config)?;
    let session = DeviceSession::open(info, &source)?;
    let platform = session
        .info
        .device()
        .platform()
        .and_then(|id| Platform::new(id).name())
        .unwrap_or_else(|_| "<error>".to_string());
    println!("Using platform: {}", platform.trim_end_matches('\0'));
    println!("Using device: {}\n", session.name());

    let queue = session.queue(false)?;
    let kernel = session.kernel("hello_kernel")?;
    let message =
        GpuBuffer::<u8, Queued>::new(&session.context, HELLO_MESSAGE_LEN, CL_MEM_WRITE_ONLY)?
            .launch();

    println!("Executing kernel...");
    let evt = unsafe {
        ExecuteKernel::new(&kernel)
            .set_arg(message.raw())
            .set_global_work_size(1)
            .enqueue_nd_range(&queue)?
    };
    let message = message.into_ready(GpuEventGuard::kernel(evt))?;

    let mut host = [0_u8; HELLO_MESSAGE_LEN];
    message.read(&queue, &mut host)?;
    Ok(decode_message(&host))
}

pub fn run(config: &BenchConfig) -> Result<()> {
    println!("=== OpenCL Hello World ===\n");
    let text = say_hello(config)?;
    info!(%text, "kernel finished");
    println!("Kernel output: {text}\n");
    println!("Success!");
    Ok(())
}
