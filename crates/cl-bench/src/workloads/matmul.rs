//! Square matrix multiply reported in GFLOPS: host strategies against the
//! naive and the 16x16 tiled kernel.

use super::{check_cell, cpu_runs, round_up, supports_group};
use crate::{
    consts::{MATMUL_TILE, MATRIX_EPS},
    cpu::{threads, Strategy},
    report::{fmt_fixed, fmt_speedup, short_name, Column, Table},
    timing::{elapsed_ms, gflops, speedup},
    verify::verify,
    BenchConfig, DeviceSession, GpuBuffer, GpuEventGuard, ProgramSource, Queued, Result,
};

use opencl3::{
    kernel::ExecuteKernel,
    memory::{CL_MEM_READ_ONLY, CL_MEM_WRITE_ONLY},
    types::cl_int,
};
use std::{io::Write, mem::size_of, time::Instant};
use tracing::debug;

/// Problem shape: `C (m x k) = A (m x n) * B (n x k)`, all row-major.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Dims {
    pub m: usize,
    pub n: usize,
    pub k: usize,
}

impl Dims {
    pub fn square(size: usize) -> Self {
        Self { m: size, n: size, k: size }
    }

    /// Multiply-adds counted as two operations.
    pub fn flop(&self) -> f64 {
        2.0 * self.m as f64 * self.n as f64 * self.k as f64
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MatmulKernel {
    Naive,
    Tiled,
}

impl MatmulKernel {
    pub fn kernel_name(self) -> &'static str {
        match self {
            MatmulKernel::Naive => "matrix_multiply",
            MatmulKernel::Tiled => "matrix_multiply_tiled",
        }
    }
}

/// `A[i] = B[i] = (i % 100) / 100`.
pub fn inputs(dims: Dims) -> (Vec<f32>, Vec<f32>) {
    let fill = |len: usize| (0..len).map(|i| (i % 100) as f32 / 100.0).collect::<Vec<f32>>();
    (fill(dims.m * dims.n), fill(dims.n * dims.k))
}

#[inline]
fn fill_row(a: &[f32], b: &[f32], dims: Dims, row: usize, out: &mut [f32]) {
    let a_row = &a[row * dims.n..(row + 1) * dims.n];
    for (col, c) in out.iter_mut().enumerate() {
        let mut sum = 0.0_f32;
        for (i, &x) in a_row.iter().enumerate() {
            sum += x * b[i * dims.k + col];
        }
        *c = sum;
    }
}

/// Host multiply into `out` (`m * k` elements).
pub fn matmul_cpu(strategy: Strategy, a: &[f32], b: &[f32], dims: Dims, out: &mut [f32]) {
    strategy.run_rows(out, dims.k, |row, r| fill_row(a, b, dims, row, r));
}

/// Runs one of the multiply kernels and downloads into `out`. Returns
/// kernel ms (enqueue to `finish`).
pub fn matmul_opencl(
    session: &DeviceSession,
    variant: MatmulKernel,
    a: &[f32],
    b: &[f32],
    dims: Dims,
    out: &mut [f32],
) -> Result<f64> {
    let queue = session.queue(false)?;
    let kernel = session.kernel(variant.kernel_name())?;
    let ctx = &session.context;

    let buf_a = GpuBuffer::<f32, Queued>::from_slice(ctx, &queue, a, CL_MEM_READ_ONLY)?;
    let buf_b = GpuBuffer::<f32, Queued>::from_slice(ctx, &queue, b, CL_MEM_READ_ONLY)?;
    let buf_c = GpuBuffer::<f32, Queued>::new(ctx, dims.m * dims.k, CL_MEM_WRITE_ONLY)?.launch();

    let (m, n, k) = (dims.m as cl_int, dims.n as cl_int, dims.k as cl_int);
    let tile_bytes = MATMUL_TILE * MATMUL_TILE * size_of::<f32>();

    let start = Instant::now();
    let evt = unsafe {
        let mut exec = ExecuteKernel::new(&kernel);
        exec.set_arg(buf_a.raw())
            .set_arg(buf_b.raw())
            .set_arg(buf_c.raw())
            .set_arg(&m)
            .set_arg(&n)
            .set_arg(&k);
        match variant {
            MatmulKernel::Naive => exec.set_global_work_sizes(&[dims.m, dims.k]),
            MatmulKernel::Tiled => exec
                .set_arg_local_buffer(tile_bytes)
                .set_arg_local_buffer(tile_bytes)
                .set_global_work_sizes(&[
                    round_up(dims.m, MATMUL_TILE),
                    round_up(dims.k, MATMUL_TILE),
                ])
                .set_local_work_sizes(&[MATMUL_TILE, MATMUL_TILE]),
        };
        exec.enqueue_nd_range(&queue)?
    };
    queue.finish()?;
    let ms = elapsed_ms(start);

    let buf_c = buf_c.into_ready(GpuEventGuard::kernel(evt))?;
    buf_c.read(&queue, out)?;
    Ok(ms)
}

/// `"label... 12.34 ms"` progress line, flushed before the next measurement.
fn progress(label: &str, ms: f64) {
    println!("{label}... {ms:.2} ms");
    let _ = std::io::stdout().flush();
}

pub fn run(config: &BenchConfig, sizes: &[usize]) -> Result<()> {
    println!("=== Matrix Multiplication Performance Comparison ===\n");

    let sessions = DeviceSession::open_all(config, ProgramSource::Matmul)?;
    println!("CPU threads: {}", threads());
    println!("OpenCL Devices: {}\n", sessions.len());
    super::note_no_sessions(&sessions);

    for &size in sizes {
        let dims = Dims::square(size);
        let gflop = dims.flop() / 1e9;
        let rule = "=".repeat(40);
        println!("{rule}");
        println!("Matrix size: {}x{} × {}x{}", dims.m, dims.n, dims.n, dims.k);
        println!("Operations: {gflop} GFLOP");
        println!("{rule}\n");

        let mut table = Table::new(vec![
            Column::left("Implementation", 35),
            Column::right("Time (ms)", 12),
            Column::right("GFLOPS", 12),
            Column::right("Speedup", 12),
            Column::right("Check", 8),
        ]);

        let (a, b) = inputs(dims);
        let runs = cpu_runs(dims.m * dims.k, dims.k, |row, r| fill_row(&a, &b, dims, row, r));
        let (expected, serial_ms) = (&runs[0].out, runs[0].ms);

        for run in &runs {
            let label = run.strategy.label();
            progress(label, run.ms);
            table.push([
                label.to_string(),
                fmt_fixed(run.ms, 2),
                fmt_fixed(gflops(dims.flop(), run.ms), 2),
                fmt_speedup(speedup(serial_ms, run.ms)),
                check_cell(label, &verify(expected, &run.out, MATRIX_EPS)),
            ]);
        }

        let mut out = vec![0.0_f32; dims.m * dims.k];
        for session in &sessions {
            for variant in [MatmulKernel::Naive, MatmulKernel::Tiled] {
                if variant == MatmulKernel::Tiled
                    && !supports_group(session, "tiled", MATMUL_TILE * MATMUL_TILE)
                {
                    continue;
                }
                out.fill(0.0);
                let ms = matmul_opencl(session, variant, &a, &b, dims, &mut out)?;
                let mut name = format!("OpenCL: {}", short_name(session.name(), 22));
                if variant == MatmulKernel::Tiled {
                    name.push_str(" (tiled)");
                }
                progress(&name, ms);
                debug!(device = %session.name(), ?variant, size, ms, "matmul done");
                let check = check_cell(&name, &verify(expected, &out, MATRIX_EPS));
                table.push([
                    name,
                    fmt_fixed(ms, 2),
                    fmt_fixed(gflops(dims.flop(), ms), 2),
                    fmt_speedup(speedup(serial_ms, ms)),
                    check,
                ]);
            }
        }

        println!();
        println!("{table}");
    }
    Ok(())
}
