//! Dense matrix-vector product: serial, rayon, scoped threads and one
//! OpenCL work-item per row.

use super::{check_cell, cpu_runs, print_row};
use crate::{
    consts::MATRIX_EPS,
    cpu::{rayon_threads, threads, Strategy},
    report::{fmt_fixed, fmt_speedup, short_name, Column, Table},
    timing::{elapsed_ms, speedup},
    verify::verify,
    BenchConfig, DeviceSession, GpuBuffer, GpuEventGuard, ProgramSource, Queued, Result,
};

use opencl3::{
    kernel::ExecuteKernel,
    memory::{CL_MEM_READ_ONLY, CL_MEM_WRITE_ONLY},
    types::cl_int,
};
use std::time::Instant;

/// `M[i] = (i % 100) / 100`, `v[i] = (i % 50) / 50`.
pub fn inputs(rows: usize, cols: usize) -> (Vec<f32>, Vec<f32>) {
    let matrix = (0..rows * cols).map(|i| (i % 100) as f32 / 100.0).collect();
    let vector = (0..cols).map(|i| (i % 50) as f32 / 50.0).collect();
    (matrix, vector)
}

#[inline]
fn dot_row(matrix: &[f32], vector: &[f32], row: usize) -> f32 {
    let cols = vector.len();
    matrix[row * cols..(row + 1) * cols]
        .iter()
        .zip(vector)
        .map(|(m, v)| m * v)
        .sum()
}

/// `out = matrix * vector` on the host; `out.len()` is the row count.
pub fn matvec_cpu(strategy: Strategy, matrix: &[f32], vector: &[f32], out: &mut [f32]) {
    strategy.run_rows(out, 1, |row, r| r[0] = dot_row(matrix, vector, row));
}

/// Runs `matvec_multiply` and downloads into `out`. Returns kernel ms.
pub fn matvec_opencl(
    session: &DeviceSession,
    matrix: &[f32],
    vector: &[f32],
    out: &mut [f32],
) -> Result<f64> {
    let rows = out.len();
    let queue = session.queue(false)?;
    let kernel = session.kernel("matvec_multiply")?;
    let ctx = &session.context;

    let buf_m = GpuBuffer::<f32, Queued>::from_slice(ctx, &queue, matrix, CL_MEM_READ_ONLY)?;
    let buf_v = GpuBuffer::<f32, Queued>::from_slice(ctx, &queue, vector, CL_MEM_READ_ONLY)?;
    let buf_r = GpuBuffer::<f32, Queued>::new(ctx, rows, CL_MEM_WRITE_ONLY)?.launch();

    let (rows_arg, cols_arg) = (rows as cl_int, vector.len() as cl_int);
    let start = Instant::now();
    let evt = unsafe {
        ExecuteKernel::new(&kernel)
            .set_arg(buf_m.raw())
            .set_arg(buf_v.raw())
            .set_arg(buf_r.raw())
            .set_arg(&rows_arg)
            .set_arg(&cols_arg)
            .set_global_work_size(rows)
            .enqueue_nd_range(&queue)?
    };
    queue.finish()?;
    let ms = elapsed_ms(start);

    let buf_r = buf_r.into_ready(GpuEventGuard::kernel(evt))?;
    buf_r.read(&queue, out)?;
    Ok(ms)
}

pub fn run(config: &BenchConfig, sizes: &[usize]) -> Result<()> {
    println!("=== Parallelization Comparison: Matrix-Vector Multiplication ===\n");

    let sessions = DeviceSession::open_all(config, ProgramSource::Matvec)?;
    println!("Rayon threads available: {}", rayon_threads());
    println!("Hardware threads: {}", threads());
    println!("OpenCL devices: {}\n", sessions.len());
    super::note_no_sessions(&sessions);

    let table = Table::new(vec![
        Column::left("Implementation", 28),
        Column::right("Time (ms)", 10),
        Column::right("Speedup", 10),
        Column::right("Check", 8),
    ]);

    for &size in sizes {
        let (rows, cols) = (size, size);
        let rule = "=".repeat(40);
        println!("{rule}\nMatrix size: {rows}x{cols}\n{rule}");

        let (matrix, vector) = inputs(rows, cols);
        let runs = cpu_runs(rows, 1, |row, r| r[0] = dot_row(&matrix, &vector, row));
        let (expected, serial_ms) = (&runs[0].out, runs[0].ms);

        println!();
        println!("{}", table.header());
        for run in &runs {
            let label = run.strategy.label();
            let check = check_cell(label, &verify(expected, &run.out, MATRIX_EPS));
            print_row(
                &table,
                &[
                    label.to_string(),
                    fmt_fixed(run.ms, 3),
                    fmt_speedup(speedup(serial_ms, run.ms)),
                    check,
                ],
            );
        }

        let mut out = vec![0.0_f32; rows];
        for session in &sessions {
            out.fill(0.0);
            let ms = matvec_opencl(session, &matrix, &vector, &mut out)?;
            let name = format!("OpenCL: {}", short_name(session.name(), 18));
            let check = check_cell(&name, &verify(expected, &out, MATRIX_EPS));
            print_row(
                &table,
                &[name, fmt_fixed(ms, 3), fmt_speedup(speedup(serial_ms, ms)), check],
            );
        }
        println!();
    }
    Ok(())
}
