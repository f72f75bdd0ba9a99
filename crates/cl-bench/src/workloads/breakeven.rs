//! Sweeps the vector length to find where each device overtakes the host loop.

use crate::{
    consts::VECTOR_ADD_EPS,
    report::{fmt_fixed, short_name, size_label, Column, Table},
    timing::{best_of, elapsed_ms},
    verify::verify,
    workloads::vector_add::add_serial,
    BenchConfig, DeviceSession, GpuBuffer, GpuEventGuard, ProgramSource, Queued, Result,
};

use opencl3::{
    kernel::ExecuteKernel,
    memory::{CL_MEM_READ_ONLY, CL_MEM_WRITE_ONLY},
    types::cl_uint,
};
use std::time::Instant;
use tracing::{debug, warn};

/// `a[i] = i % 1000`, `b[i] = 2i % 1000`; keeps values exact in f32 at any length.
pub fn inputs(n: usize) -> (Vec<f32>, Vec<f32>) {
    let a = (0..n).map(|i| (i % 1000) as f32).collect();
    let b = (0..n).map(|i| ((i * 2) % 1000) as f32).collect();
    (a, b)
}

/// Best-of-`iterations` host time in ms.
pub fn cpu_best(a: &[f32], b: &[f32], out: &mut [f32], iterations: usize) -> Result<f64> {
    best_of(iterations, |_| {
        let start = Instant::now();
        add_serial(a, b, out);
        Ok(elapsed_ms(start))
    })
}

/// Best-of-`iterations` kernel time in ms. Inputs are re-uploaded before
/// every run, outside the timed region; the output is read back once.
pub fn device_best(
    session: &DeviceSession,
    a: &[f32],
    b: &[f32],
    out: &mut [f32],
    iterations: usize,
) -> Result<f64> {
    let n = a.len();
    let queue = session.queue(false)?;
    let kernel = session.kernel("vector_add")?;
    let ctx = &session.context;

    let mut buf_a = GpuBuffer::<f32, Queued>::from_slice(ctx, &queue, a, CL_MEM_READ_ONLY)?;
    let mut buf_b = GpuBuffer::<f32, Queued>::from_slice(ctx, &queue, b, CL_MEM_READ_ONLY)?;
    let mut buf_c = GpuBuffer::<f32, Queued>::new(ctx, n, CL_MEM_WRITE_ONLY)?.launch();
    let n_arg = n as cl_uint;

    let mut best = f64::INFINITY;
    for iter in 0..iterations.max(1) {
        // from_slice already covered the first upload
        if iter > 0 {
            let (pending, guard) = buf_a.rewrite(&queue, a)?;
            buf_a = pending.into_ready(guard)?;
            let (pending, guard) = buf_b.rewrite(&queue, b)?;
            buf_b = pending.into_ready(guard)?;
        }

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
        best = best.min(elapsed_ms(start));

        let done = buf_c.into_ready(GpuEventGuard::kernel(evt))?;
        if iter == 0 {
            done.read(&queue, out)?;
        }
        buf_c = done.relaunch();
    }
    Ok(best)
}

/// First problem size at which the device beat the host, given
/// `(size, cpu_ms, device_ms)` rows in increasing size order.
pub fn find_breakeven(rows: &[(usize, f64, f64)]) -> Option<usize> {
    rows.iter()
        .find(|(_, cpu, dev)| dev < cpu)
        .map(|&(size, _, _)| size)
}

pub fn run(config: &BenchConfig, sizes: &[usize]) -> Result<()> {
    println!("=== OpenCL Breakeven Point Analysis ===\n");
    println!("Finding the vector size where OpenCL becomes faster than serial Rust\n");

    let sessions = DeviceSession::open_all(config, ProgramSource::VectorAdd)?;
    println!("Testing on {} OpenCL device(s):", sessions.len());
    for (i, s) in sessions.iter().enumerate() {
        let mut line = format!("  {}. {}", i + 1, s.name());
        if s.info.kind.is_gpu() {
            line.push_str(" (GPU)");
        }
        if s.info.kind.is_cpu() {
            line.push_str(" (CPU)");
        }
        println!("{line}");
    }
    println!();

    let iterations = config.iterations.max(1);
    println!("Running tests (best of {iterations} iterations per size)...\n");

    let mut columns = vec![
        Column::left("Size", 12),
        Column::right("Elements", 12),
        Column::right("CPU (ms)", 12),
    ];
    columns.extend(sessions.iter().map(|s| Column::right(short_name(s.name(), 10), 12)));
    let table = Table::new(columns);
    println!("{}", table.header());

    let mut history: Vec<Vec<(usize, f64, f64)>> = vec![Vec::new(); sessions.len()];
    let mut any_failed = false;

    for &size in sizes {
        let (a, b) = inputs(size);
        let mut expected = vec![0.0_f32; size];
        let cpu_ms = cpu_best(&a, &b, &mut expected, iterations)?;

        let mut out = vec![0.0_f32; size];
        let mut cells = vec![size_label(size), size.to_string(), fmt_fixed(cpu_ms, 3)];
        for (i, session) in sessions.iter().enumerate() {
            out.fill(0.0);
            let dev_ms = device_best(session, &a, &b, &mut out, iterations)?;
            debug!(device = %session.name(), size, cpu_ms, dev_ms, "measured");
            history[i].push((size, cpu_ms, dev_ms));

            let check = verify(&expected, &out, VECTOR_ADD_EPS);
            let mut cell = fmt_fixed(dev_ms, 3);
            if !check.passed() {
                warn!(device = %session.name(), size, errors = check.errors, "wrong result");
                check.report_mismatches(session.name());
                cell.push('!');
                any_failed = true;
            }
            cells.push(cell);
        }
        println!("{}", table.line(&cells));
    }

    if any_failed {
        println!("\n(! marks a device result that failed verification)");
    }
    println!("\n=== Breakeven Points (where OpenCL becomes faster) ===\n");
    for (session, rows) in sessions.iter().zip(&history) {
        match find_breakeven(rows) {
            Some(size) => println!("{}: {size} elements", session.name()),
            None => println!(
                "{}: Not reached (OpenCL slower for all tested sizes)",
                session.name()
            ),
        }
    }
    Ok(())
}
