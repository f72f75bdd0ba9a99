//! `c = a + b` once per device, against a single-threaded host loop.

use crate::{
    consts::VECTOR_ADD_EPS,
    report::{fmt_fixed, fmt_speedup, section, Column, Table},
    timing::{elapsed_ms, speedup, time_ms},
    verify::verify,
    BenchConfig, DeviceSession, GpuBuffer, GpuEventGuard, ProgramSource, Queued, Result,
};

use opencl3::{
    kernel::ExecuteKernel,
    memory::{CL_MEM_READ_ONLY, CL_MEM_WRITE_ONLY},
    types::cl_uint,
};
use std::time::Instant;

/// `a[i] = i`, `b[i] = 2i`.
pub fn inputs(n: usize) -> (Vec<f32>, Vec<f32>) {
    let a = (0..n).map(|i| i as f32).collect();
    let b = (0..n).map(|i| (i * 2) as f32).collect();
    (a, b)
}

pub fn add_serial(a: &[f32], b: &[f32], out: &mut [f32]) {
    for ((o, x), y) in out.iter_mut().zip(a).zip(b) {
        *o = x + y;
    }
}

/// Uploads both inputs, runs `vector_add` and downloads into `out`.
/// Returns the kernel time (enqueue to `finish`) in ms.
pub fn add_opencl(session: &DeviceSession, a: &[f32], b: &[f32], out: &mut [f32]) -> Result<f64> {
    let n = a.len();
    let queue = session.queue(false)?;
    let kernel = session.kernel("vector_add")?;

    let buf_a = GpuBuffer::<f32, Queued>::from_slice(&session.context, &queue, a, CL_MEM_READ_ONLY)?;
    let buf_b = GpuBuffer::<f32, Queued>::from_slice(&session.context, &queue, b, CL_MEM_READ_ONLY)?;
    let buf_c = GpuBuffer::<f32, Queued>::new(&session.context, n, CL_MEM_WRITE_ONLY)?.launch();

    let n_arg = n as cl_uint;
    let start = Instant::now();
    let evt = unsafe {
        ExecuteKernel::new(&kernel)
            .set_arg(buf_a.raw())
            .set_arg(buf_b.raw())
            .set_arg(buf_c.raw())
            .set_arg(&n_arg)
            .set_global_work_size(n)
            .enqueue_nd_range(&queue)?
    };
    queue.finish()?;
    let ms = elapsed_ms(start);

    let buf_c = buf_c.into_ready(GpuEventGuard::kernel(evt))?;
    buf_c.read(&queue, out)?;
    Ok(ms)
}

pub fn run(config: &BenchConfig, n: usize) -> Result<()> {
    println!("=== Vector Addition Performance Comparison ===\n");
    println!("Vector size: {n} elements");
    println!(
        "Memory per vector: {:.2} MB\n",
        (n * std::mem::size_of::<f32>()) as f64 / (1024.0 * 1024.0)
    );

    let (a, b) = inputs(n);
    let sessions = DeviceSession::open_all(config, ProgramSource::VectorAdd)?;

    println!("{}", section("1. Serial Rust (single-threaded CPU)"));
    let mut expected = vec![0.0_f32; n];
    let ((), cpu_ms) = time_ms(|| add_serial(&a, &b, &mut expected));
    println!("Time: {cpu_ms:.2} ms");
    println!("Speedup: 1.00x (baseline)\n");
    super::note_no_sessions(&sessions);

    let mut table = Table::new(vec![
        Column::left("Device", 40),
        Column::right("Time (ms)", 12),
        Column::right("Speedup", 12),
    ]);
    table.push(["Serial Rust".to_string(), fmt_fixed(cpu_ms, 2), fmt_speedup(1.0)]);

    let mut out = vec![0.0_f32; n];
    for (i, session) in sessions.iter().enumerate() {
        println!("{}", section(&format!("{}. OpenCL: {}", i + 2, session.name())));
        out.fill(0.0);
        let ms = add_opencl(session, &a, &b, &mut out)?;
        println!("Time: {ms:.2} ms");
        println!("Speedup: {}", fmt_speedup(speedup(cpu_ms, ms)));

        let check = verify(&expected, &out, VECTOR_ADD_EPS);
        if check.passed() {
            println!("  ✓ Results verified correct");
        } else {
            check.report_mismatches(session.name());
            println!("{check}");
        }
        println!();

        table.push([
            session.name().to_string(),
            fmt_fixed(ms, 2),
            fmt_speedup(speedup(cpu_ms, ms)),
        ]);
    }

    println!("{}", section("Summary"));
    print!("{table}");
    Ok(())
}
