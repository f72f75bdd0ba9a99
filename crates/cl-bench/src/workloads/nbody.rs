//! All-pairs gravitational accelerations for a seeded particle system.
//!
//! Positions and accelerations travel as `float4` (xyz plus padding), so
//! host buffers are flat `f32` slices of length `4 * n`.

use super::{check_cell, cpu_runs, print_row, round_up};
use crate::{
    consts::{NBODY_LOCAL_SIZE, NBODY_REL_EPS, NBODY_SEED},
    cpu::{threads, Strategy},
    report::{fmt_fixed, fmt_speedup, short_name, Column, Table},
    timing::{elapsed_ms, speedup},
    verify::{verify_relative, Verification},
    BenchConfig, DeviceSession, GpuBuffer, GpuEventGuard, ProgramSource, Queued, Result,
};

use opencl3::{
    kernel::ExecuteKernel,
    memory::{CL_MEM_READ_ONLY, CL_MEM_WRITE_ONLY},
    types::{cl_float, cl_int},
};
use rand::{rngs::SmallRng, Rng, SeedableRng};
use std::{mem::size_of, time::Instant};
use tracing::debug;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Body {
    pub pos: [f32; 3],
    pub vel: [f32; 3],
    pub mass: f32,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ForceKernel {
    Simple,
    Tiled,
}

impl ForceKernel {
    pub fn kernel_name(self) -> &'static str {
        match self {
            ForceKernel::Simple => "compute_forces",
            ForceKernel::Tiled => "compute_forces_tiled",
        }
    }
}

/// `n` bodies drawn from a generator seeded with `seed`: positions in
/// [-100, 100), velocities in [-1, 1), masses in [1, 10).
pub fn init_bodies(n: usize, seed: u64) -> Vec<Body> {
    let mut rng = SmallRng::seed_from_u64(seed);
    (0..n)
        .map(|_| {
            let pos = [(); 3].map(|_| rng.gen_range(-100.0_f32..100.0));
            let vel = [(); 3].map(|_| rng.gen_range(-1.0_f32..1.0));
            let mass = rng.gen_range(1.0_f32..10.0);
            Body { pos, vel, mass }
        })
        .collect()
}

/// `(positions as xyz0, masses)` in the device layout.
pub fn device_layout(bodies: &[Body]) -> (Vec<f32>, Vec<f32>) {
    let positions = bodies
        .iter()
        .flat_map(|b| [b.pos[0], b.pos[1], b.pos[2], 0.0])
        .collect();
    let masses = bodies.iter().map(|b| b.mass).collect();
    (positions, masses)
}

/// Acceleration of body `i` into `acc[..3]`; `acc[3]` is zeroed.
#[inline]
fn accelerate(bodies: &[Body], i: usize, softening: f32, acc: &mut [f32]) {
    let soft_sq = softening * softening;
    let pi = bodies[i].pos;
    let mut a = [0.0_f32; 3];
    for (j, bj) in bodies.iter().enumerate() {
        if j == i {
            continue;
        }
        let d = [bj.pos[0] - pi[0], bj.pos[1] - pi[1], bj.pos[2] - pi[2]];
        let dist_sq = d[0] * d[0] + d[1] * d[1] + d[2] * d[2] + soft_sq;
        let inv = bj.mass / (dist_sq * dist_sq.sqrt());
        for (ak, dk) in a.iter_mut().zip(d) {
            *ak += dk * inv;
        }
    }
    acc[..3].copy_from_slice(&a);
    acc[3] = 0.0;
}

/// Host accelerations into `out` (`4 * bodies.len()` elements).
pub fn forces_cpu(strategy: Strategy, bodies: &[Body], softening: f32, out: &mut [f32]) {
    strategy.run_rows(out, 4, |i, acc| accelerate(bodies, i, softening, acc));
}

/// Relative check with an absolute floor scaled to the largest component,
/// so near-cancelling sums are not held to a relative bound.
pub fn verify_forces(expected: &[f32], actual: &[f32]) -> Verification {
    let peak = expected.iter().fold(0.0_f32, |m, v| m.max(v.abs()));
    verify_relative(expected, actual, NBODY_REL_EPS, NBODY_REL_EPS * peak)
}

/// Work-group size for the tiled kernel on this device.
fn tile_size(session: &DeviceSession) -> usize {
    session
        .info
        .max_work_group_size
        .map_or(NBODY_LOCAL_SIZE, |max| max.min(NBODY_LOCAL_SIZE))
        .max(1)
}

/// Runs one force kernel and downloads into `out`. Returns kernel ms.
pub fn forces_opencl(
    session: &DeviceSession,
    variant: ForceKernel,
    positions: &[f32],
    masses: &[f32],
    softening: f32,
    out: &mut [f32],
) -> Result<f64> {
    let n = masses.len();
    let queue = session.queue(false)?;
    let kernel = session.kernel(variant.kernel_name())?;
    let ctx = &session.context;

    let buf_pos = GpuBuffer::<f32, Queued>::from_slice(ctx, &queue, positions, CL_MEM_READ_ONLY)?;
    let buf_mass = GpuBuffer::<f32, Queued>::from_slice(ctx, &queue, masses, CL_MEM_READ_ONLY)?;
    let buf_acc = GpuBuffer::<f32, Queued>::new(ctx, 4 * n, CL_MEM_WRITE_ONLY)?.launch();

    let n_arg = n as cl_int;
    let soft_arg = softening as cl_float;
    let local = tile_size(session);

    let start = Instant::now();
    let evt = unsafe {
        let mut exec = ExecuteKernel::new(&kernel);
        exec.set_arg(buf_pos.raw())
            .set_arg(buf_mass.raw())
            .set_arg(buf_acc.raw())
            .set_arg(&n_arg)
            .set_arg(&soft_arg);
        match variant {
            ForceKernel::Simple => exec.set_global_work_size(n),
            ForceKernel::Tiled => {
                debug!(device = %session.name(), local, "tiled force kernel");
                exec.set_arg_local_buffer(local * 4 * size_of::<f32>())
                    .set_arg_local_buffer(local * size_of::<f32>())
                    .set_global_work_size(round_up(n, local))
                    .set_local_work_size(local)
            }
        };
        exec.enqueue_nd_range(&queue)?
    };
    queue.finish()?;
    let ms = elapsed_ms(start);

    let buf_acc = buf_acc.into_ready(GpuEventGuard::kernel(evt))?;
    buf_acc.read(&queue, out)?;
    Ok(ms)
}

pub fn run(config: &BenchConfig, counts: &[usize], softening: f32) -> Result<()> {
    println!("=== N-Body Simulation Performance Comparison ===\n");

    let sessions = DeviceSession::open_all(config, ProgramSource::Nbody)?;
    println!("CPU threads: {}", threads());
    println!("OpenCL devices: {}\n", sessions.len());
    super::note_no_sessions(&sessions);

    let table = Table::new(vec![
        Column::left("Implementation", 40),
        Column::right("Time (ms)", 12),
        Column::right("Speedup", 12),
        Column::right("Check", 8),
    ]);

    for &n in counts {
        let rule = "=".repeat(40);
        println!("{rule}");
        println!("N-Body with {n} particles");
        println!("Force calculations: {} (O(n²))", n * n.saturating_sub(1));
        println!("{rule}");

        let bodies = init_bodies(n, NBODY_SEED);
        let (positions, masses) = device_layout(&bodies);

        let runs = cpu_runs(4 * n, 4, |i, acc| accelerate(&bodies, i, softening, acc));
        let (expected, serial_ms) = (&runs[0].out, runs[0].ms);

        println!();
        println!("{}", table.header());
        for run in &runs {
            let label = run.strategy.label();
            let check = check_cell(label, &verify_forces(expected, &run.out));
            print_row(
                &table,
                &[
                    label.to_string(),
                    fmt_fixed(run.ms, 2),
                    fmt_speedup(speedup(serial_ms, run.ms)),
                    check,
                ],
            );
        }

        let mut out = vec![0.0_f32; 4 * n];
        for session in &sessions {
            for variant in [ForceKernel::Simple, ForceKernel::Tiled] {
                out.fill(0.0);
                let ms = forces_opencl(session, variant, &positions, &masses, softening, &mut out)?;
                let name = match variant {
                    ForceKernel::Simple => format!("OpenCL: {}", short_name(session.name(), 22)),
                    ForceKernel::Tiled => format!("OpenCL: {} (tiled)", short_name(session.name(), 22)),
                };
                let check = check_cell(&name, &verify_forces(expected, &out));
                print_row(
                    &table,
                    &[name, fmt_fixed(ms, 2), fmt_speedup(speedup(serial_ms, ms)), check],
                );
            }
        }
        println!();
    }
    Ok(())
}
