//! Gaussian blur with clamp-to-edge borders. Host strategies run the direct
//! 2D stencil; the device runs it directly, through a local-memory tile,
//! and as two separable 1D passes.

use super::{check_cell, cpu_runs, print_row, round_up, supports_group};
use crate::{
    consts::{CONV_EPS, CONV_LOCAL_SIZE},
    cpu::{threads, Strategy},
    report::{fmt_fixed, fmt_speedup, short_name, Column, Table},
    timing::{elapsed_ms, speedup},
    verify::verify,
    BenchConfig, BenchError, DeviceSession, GpuBuffer, GpuEventGuard, ProgramSource, Queued, Result,
};

use opencl3::{
    kernel::ExecuteKernel,
    memory::{CL_MEM_READ_ONLY, CL_MEM_READ_WRITE, CL_MEM_WRITE_ONLY},
    types::cl_int,
};
use std::{mem::size_of, time::Instant};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Image {
    pub width: usize,
    pub height: usize,
}

impl Image {
    pub fn square(size: usize) -> Self {
        Self { width: size, height: size }
    }

    pub fn pixels(&self) -> usize {
        self.width * self.height
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConvKernel {
    Direct,
    Local,
    Separable,
}

impl ConvKernel {
    pub const ALL: [ConvKernel; 3] = [ConvKernel::Direct, ConvKernel::Local, ConvKernel::Separable];

    /// Row label: device name cut so the suffix still fits the column.
    fn label(self, device: &str) -> String {
        match self {
            ConvKernel::Direct => format!("OpenCL: {}", short_name(device, 22)),
            ConvKernel::Local => format!("OpenCL: {} (local)", short_name(device, 18)),
            ConvKernel::Separable => format!("OpenCL: {} (separable)", short_name(device, 16)),
        }
    }
}

/// Synthetic gradient image, `(i % 256) / 255`.
pub fn synthetic_image(image: Image) -> Vec<f32> {
    (0..image.pixels()).map(|i| (i % 256) as f32 / 255.0).collect()
}

/// Stencil widths must be odd so the kernel has a centre tap.
pub fn check_kernel_size(ksize: usize) -> Result<()> {
    if ksize % 2 == 0 {
        return Err(BenchError::InvalidSize(ksize));
    }
    Ok(())
}

fn sigma(ksize: usize) -> f32 {
    ksize as f32 / 6.0
}

fn normalise(mut w: Vec<f32>) -> Vec<f32> {
    let sum: f32 = w.iter().sum();
    w.iter_mut().for_each(|v| *v /= sum);
    w
}

/// `ksize * ksize` Gaussian weights, row-major, summing to 1.
pub fn gaussian_2d(ksize: usize) -> Vec<f32> {
    let half = (ksize / 2) as i32;
    let two_s2 = 2.0 * sigma(ksize) * sigma(ksize);
    let w = (-half..=half)
        .flat_map(|y| (-half..=half).map(move |x| (-((x * x + y * y) as f32) / two_s2).exp()))
        .collect();
    normalise(w)
}

/// `ksize` Gaussian weights summing to 1; their outer product is [`gaussian_2d`].
pub fn gaussian_1d(ksize: usize) -> Vec<f32> {
    let half = (ksize / 2) as i32;
    let two_s2 = 2.0 * sigma(ksize) * sigma(ksize);
    let w = (-half..=half).map(|i| (-((i * i) as f32) / two_s2).exp()).collect();
    normalise(w)
}

#[inline]
fn clamp_index(v: isize, len: usize) -> usize {
    v.clamp(0, len as isize - 1) as usize
}

#[inline]
fn convolve_row(input: &[f32], weights: &[f32], ksize: usize, image: Image, y: usize, out: &mut [f32]) {
    let half = (ksize / 2) as isize;
    for (x, px) in out.iter_mut().enumerate() {
        let mut sum = 0.0_f32;
        for ky in -half..=half {
            let iy = clamp_index(y as isize + ky, image.height);
            let w_row = &weights[(ky + half) as usize * ksize..];
            for kx in -half..=half {
                let ix = clamp_index(x as isize + kx, image.width);
                sum += input[iy * image.width + ix] * w_row[(kx + half) as usize];
            }
        }
        *px = sum;
    }
}

/// Direct 2D convolution on the host.
pub fn convolve_cpu(
    strategy: Strategy,
    input: &[f32],
    weights: &[f32],
    ksize: usize,
    image: Image,
    out: &mut [f32],
) {
    strategy.run_rows(out, image.width, |y, row| {
        convolve_row(input, weights, ksize, image, y, row)
    });
}

/// Runs one device variant and downloads into `out`. `weights` is 2D for
/// `Direct`/`Local` and 1D for `Separable`. Returns kernel ms.
pub fn convolve_opencl(
    session: &DeviceSession,
    variant: ConvKernel,
    input: &[f32],
    weights: &[f32],
    ksize: usize,
    image: Image,
    out: &mut [f32],
) -> Result<f64> {
    let queue = session.queue(false)?;
    let ctx = &session.context;
    let n = image.pixels();

    let buf_in = GpuBuffer::<f32, Queued>::from_slice(ctx, &queue, input, CL_MEM_READ_ONLY)?;
    let buf_w = GpuBuffer::<f32, Queued>::from_slice(ctx, &queue, weights, CL_MEM_READ_ONLY)?;
    let buf_out = GpuBuffer::<f32, Queued>::new(ctx, n, CL_MEM_WRITE_ONLY)?.launch();

    let (w, h, k) = (image.width as cl_int, image.height as cl_int, ksize as cl_int);
    let exact = [image.width, image.height];

    let start = Instant::now();
    let evt = match variant {
        ConvKernel::Direct => {
            let kernel = session.kernel("convolve_2d")?;
            unsafe {
                ExecuteKernel::new(&kernel)
                    .set_arg(buf_in.raw())
                    .set_arg(buf_out.raw())
                    .set_arg(buf_w.raw())
                    .set_arg(&w)
                    .set_arg(&h)
                    .set_arg(&k)
                    .set_global_work_sizes(&exact)
                    .enqueue_nd_range(&queue)?
            }
        }
        ConvKernel::Local => {
            let kernel = session.kernel("convolve_2d_local")?;
            let tile_dim = CONV_LOCAL_SIZE + 2 * (ksize / 2);
            unsafe {
                ExecuteKernel::new(&kernel)
                    .set_arg(buf_in.raw())
                    .set_arg(buf_out.raw())
                    .set_arg(buf_w.raw())
                    .set_arg(&w)
                    .set_arg(&h)
                    .set_arg(&k)
                    .set_arg_local_buffer(tile_dim * tile_dim * size_of::<f32>())
                    .set_global_work_sizes(&[
                        round_up(image.width, CONV_LOCAL_SIZE),
                        round_up(image.height, CONV_LOCAL_SIZE),
                    ])
                    .set_local_work_sizes(&[CONV_LOCAL_SIZE, CONV_LOCAL_SIZE])
                    .enqueue_nd_range(&queue)?
            }
        }
        ConvKernel::Separable => {
            let horizontal = session.kernel("convolve_h")?;
            let vertical = session.kernel("convolve_v")?;
            let tmp = GpuBuffer::<f32, Queued>::new(ctx, n, CL_MEM_READ_WRITE)?.launch();
            let first = unsafe {
                ExecuteKernel::new(&horizontal)
                    .set_arg(buf_in.raw())
                    .set_arg(tmp.raw())
                    .set_arg(buf_w.raw())
                    .set_arg(&w)
                    .set_arg(&h)
                    .set_arg(&k)
                    .set_global_work_sizes(&exact)
                    .enqueue_nd_range(&queue)?
            };
            // In-order queue: the vertical pass sees the finished temporary.
            let tmp = tmp.into_ready(GpuEventGuard::kernel(first))?;
            unsafe {
                ExecuteKernel::new(&vertical)
                    .set_arg(tmp.raw())
                    .set_arg(buf_out.raw())
                    .set_arg(buf_w.raw())
                    .set_arg(&w)
                    .set_arg(&h)
                    .set_arg(&k)
                    .set_global_work_sizes(&exact)
                    .enqueue_nd_range(&queue)?
            }
        }
    };
    queue.finish()?;
    let ms = elapsed_ms(start);

    let buf_out = buf_out.into_ready(GpuEventGuard::kernel(evt))?;
    buf_out.read(&queue, out)?;
    Ok(ms)
}

pub fn run(config: &BenchConfig, image_sizes: &[usize], kernel_sizes: &[usize]) -> Result<()> {
    for &ksize in kernel_sizes {
        check_kernel_size(ksize)?;
    }
    println!("=== Image Convolution Performance Comparison ===\n");

    let sessions = DeviceSession::open_all(config, ProgramSource::Convolution)?;
    println!("CPU threads: {}", threads());
    println!("OpenCL devices: {}\n", sessions.len());
    super::note_no_sessions(&sessions);

    let table = Table::new(vec![
        Column::left("Implementation", 40),
        Column::right("Time (ms)", 12),
        Column::right("Speedup", 12),
        Column::right("Check", 8),
    ]);

    for &size in image_sizes {
        let image = Image::square(size);
        let input = synthetic_image(image);

        for &ksize in kernel_sizes {
            let rule = "=".repeat(40);
            let per_pixel = ksize * ksize;
            println!("{rule}");
            println!("Image: {}x{}, Kernel: {ksize}x{ksize}", image.width, image.height);
            println!("Operations per pixel: {per_pixel}");
            println!(
                "Total operations: {} million",
                (image.pixels() * per_pixel) as f64 / 1e6
            );
            println!("{rule}");

            let w2d = gaussian_2d(ksize);
            let w1d = gaussian_1d(ksize);

            let runs = cpu_runs(image.pixels(), image.width, |y, row| {
                convolve_row(&input, &w2d, ksize, image, y, row)
            });
            let (expected, serial_ms) = (&runs[0].out, runs[0].ms);

            println!();
            println!("{}", table.header());
            for run in &runs {
                let label = run.strategy.label();
                let check = check_cell(label, &verify(expected, &run.out, CONV_EPS));
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

            let mut out = vec![0.0_f32; image.pixels()];
            for session in &sessions {
                for variant in ConvKernel::ALL {
                    if variant == ConvKernel::Local
                        && !supports_group(session, "local", CONV_LOCAL_SIZE * CONV_LOCAL_SIZE)
                    {
                        continue;
                    }
                    let weights = if variant == ConvKernel::Separable { &w1d } else { &w2d };
                    out.fill(0.0);
                    let ms = convolve_opencl(session, variant, &input, weights, ksize, image, &mut out)?;
                    let name = variant.label(session.name());
                    let check = check_cell(&name, &verify(expected, &out, CONV_EPS));
                    print_row(
                        &table,
                        &[name, fmt_fixed(ms, 2), fmt_speedup(speedup(serial_ms, ms)), check],
                    );
                }
            }
            println!();
        }
    }
    Ok(())
}
