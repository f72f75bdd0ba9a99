//! One integer vector add split across every device, launched before any
//! of them is waited on, with a profiling-based concurrency check.

use crate::{
    consts::MULTI_DEVICE_PREVIEW,
    timing::ns_to_ms,
    verify::verify_exact,
    BenchConfig, BenchError, DeviceSession, GpuBuffer, GpuEventGuard, InFlight, ProgramSource,
    Queued, Result,
};

use opencl3::{
    command_queue::CommandQueue,
    kernel::{ExecuteKernel, Kernel},
    memory::{CL_MEM_READ_ONLY, CL_MEM_WRITE_ONLY},
    types::cl_uint,
};
use std::ops::Range;
use tracing::{debug, info};

/// Splits `0..total` into `parts` contiguous ranges of `total / parts`
/// elements; the last range also takes the remainder.
pub fn partition(total: usize, parts: usize) -> Vec<Range<usize>> {
    if parts == 0 {
        return Vec::new();
    }
    let chunk = total / parts;
    (0..parts)
        .map(|i| {
            let start = i * chunk;
            let end = if i + 1 == parts { total } else { start + chunk };
            start..end
        })
        .collect()
}

/// Closed intervals `[a.0, a.1]` and `[b.0, b.1]` share at least one point.
pub fn intervals_overlap(a: (u64, u64), b: (u64, u64)) -> bool {
    !(a.1 < b.0 || b.1 < a.0)
}

/// `A[i] = i`, `B[i] = n - i`, so every sum is `n`.
pub fn inputs(n: usize) -> (Vec<i32>, Vec<i32>) {
    let a = (0..n).map(|i| i as i32).collect();
    let b = (0..n).map(|i| (n - i) as i32).collect();
    (a, b)
}

/// Kernel execution window of one device, in device profiling nanoseconds.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct KernelSpan {
    pub device: String,
    pub start_ns: u64,
    pub end_ns: u64,
}

impl KernelSpan {
    pub fn duration_ms(&self) -> f64 {
        ns_to_ms(self.start_ns, self.end_ns)
    }

    pub fn overlaps(&self, other: &KernelSpan) -> bool {
        intervals_overlap((self.start_ns, self.end_ns), (other.start_ns, other.end_ns))
    }
}

/// Latest end minus earliest start across all spans.
pub fn wall_clock_ms(spans: &[KernelSpan]) -> f64 {
    let start = spans.iter().map(|s| s.start_ns).min();
    let end = spans.iter().map(|s| s.end_ns).max();
    match (start, end) {
        (Some(s), Some(e)) => ns_to_ms(s, e),
        _ => 0.0,
    }
}

/// Everything one device holds while its chunk is in flight.
struct Lane<'h> {
    session: DeviceSession,
    queue: CommandQueue,
    range: Range<usize>,
    a: GpuBuffer<i32, InFlight>,
    b: GpuBuffer<i32, InFlight>,
    c: GpuBuffer<i32, InFlight>,
    uploads: [GpuEventGuard<'h>; 2],
    launched: GpuEventGuard<'static>,
    _kernel: Kernel,
}

/// Queues both uploads and the kernel for one chunk without waiting.
fn launch<'h>(
    session: DeviceSession,
    range: Range<usize>,
    a: &'h [i32],
    b: &'h [i32],
) -> Result<Lane<'h>> {
    let n = range.len();
    let queue = session.queue(true)?;
    let kernel = session.kernel("vector_add_int")?;
    let ctx = &session.context;

    let (buf_a, up_a) =
        GpuBuffer::<i32, Queued>::new(ctx, n, CL_MEM_READ_ONLY)?.enqueue_write(&queue, &a[range.clone()])?;
    let (buf_b, up_b) =
        GpuBuffer::<i32, Queued>::new(ctx, n, CL_MEM_READ_ONLY)?.enqueue_write(&queue, &b[range.clone()])?;
    let buf_c = GpuBuffer::<i32, Queued>::new(ctx, n, CL_MEM_WRITE_ONLY)?.launch();

    let n_arg = n as cl_uint;
    // In-order queue: the kernel starts after both uploads.
    let evt = unsafe {
        ExecuteKernel::new(&kernel)
            .set_arg(buf_a.raw())
            .set_arg(buf_b.raw())
            .set_arg(buf_c.raw())
            .set_arg(&n_arg)
            .set_global_work_size(n)
            .enqueue_nd_range(&queue)?
    };
    queue.flush()?;
    debug!(device = %session.name(), start = range.start, len = n, "chunk launched");

    Ok(Lane {
        session,
        queue,
        range,
        a: buf_a,
        b: buf_b,
        c: buf_c,
        uploads: [up_a, up_b],
        launched: GpuEventGuard::kernel(evt),
        _kernel: kernel,
    })
}

pub fn run(config: &BenchConfig, n: usize) -> Result<()> {
    let sessions = DeviceSession::open_all(config, ProgramSource::VectorAdd)?;
    println!("Found {} OpenCL device(s) total\n", sessions.len());
    if sessions.is_empty() {
        return Err(BenchError::NoDevices);
    }

    let ranges = partition(n, sessions.len());
    let (a, b) = inputs(n);

    println!("=== Asynchronous Multi-Device Execution ===");
    println!("Total array size: {n} elements");
    println!("Chunk size per device: {} elements\n", n / sessions.len());

    for (i, s) in sessions.iter().enumerate() {
        println!("Setting up device {i}: {}", s.name());
    }

    println!("\nLaunching kernels on all devices simultaneously...");
    let mut lanes = Vec::with_capacity(sessions.len());
    for (session, range) in sessions.into_iter().zip(ranges) {
        lanes.push(launch(session, range, &a, &b)?);
    }

    let mut spans = Vec::with_capacity(lanes.len());
    let mut finished = Vec::with_capacity(lanes.len());
    for lane in lanes {
        let Lane { session, queue, range, a: buf_a, b: buf_b, c, uploads, launched, _kernel } = lane;
        let [up_a, up_b] = uploads;
        let _inputs = (buf_a.into_ready(up_a)?, buf_b.into_ready(up_b)?);
        let (c, evt) = c.complete(launched)?;
        spans.push(KernelSpan {
            device: session.name().to_string(),
            start_ns: evt.profiling_command_start()?,
            end_ns: evt.profiling_command_end()?,
        });
        finished.push((queue, range, c));
    }

    println!("\n=== Execution Timeline ===");
    for (i, span) in spans.iter().enumerate() {
        println!("Device {i} ({}):", span.device);
        println!("  Start: {} ns", span.start_ns);
        println!("  End:   {} ns", span.end_ns);
        println!("  Duration: {:.3} ms\n", span.duration_ms());
    }
    let wall = wall_clock_ms(&spans);
    println!("Total wall-clock time: {wall:.3} ms");
    info!(devices = spans.len(), wall_ms = wall, "multi-device run finished");

    println!("\n=== Concurrency Analysis ===");
    for i in 0..spans.len() {
        for j in i + 1..spans.len() {
            let verdict = if spans[i].overlaps(&spans[j]) {
                "CONCURRENT EXECUTION"
            } else {
                "Sequential"
            };
            println!("Device {i} and {j}: {verdict}");
        }
    }

    let mut out = vec![0_i32; n];
    let mut rest = out.as_mut_slice();
    for (queue, range, c) in &finished {
        let (head, tail) = std::mem::take(&mut rest).split_at_mut(range.len());
        c.read(queue, head)?;
        rest = tail;
    }

    println!("\n=== Verification (first {MULTI_DEVICE_PREVIEW} elements) ===");
    let expected: Vec<i32> = a.iter().zip(&b).map(|(x, y)| x + y).collect();
    for i in 0..MULTI_DEVICE_PREVIEW.min(n) {
        if out[i] == expected[i] {
            println!("{} + {} = {}", a[i], b[i], out[i]);
        } else {
            println!("Error at {i}: expected {}, got {}", expected[i], out[i]);
        }
    }

    let check = verify_exact(&expected, &out);
    if check.passed() {
        println!("\nVerification PASSED");
    } else {
        check.report_mismatches("multi-device output");
        println!("\nVerification FAILED ({} errors)", check.errors);
    }
    Ok(())
}
