//! Command line surface of the `cl-bench` binary.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use cl_bench::{
    consts::{
        BEST_OF, BREAKEVEN_SIZES, CONV_IMAGE_SIZES, CONV_KERNEL_SIZES, MATMUL_SIZES,
        MATVEC_SIZES, MULTI_DEVICE_LEN, NBODY_COUNTS, NBODY_SOFTENING, VECTOR_ADD_LEN,
    },
    workloads::convolution::check_kernel_size,
    BenchConfig, DeviceFilter,
};
use tracing::Level;

/// OpenCL device benchmarks against serial and parallel CPU baselines.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Device types taking part in the run
    #[arg(long, value_enum, global = true, default_value_t = DeviceFilter::All)]
    pub device_type: DeviceFilter,

    /// Runs per best-of measurement
    #[arg(long, global = true, default_value_t = BEST_OF)]
    pub iterations: usize,

    /// Load kernel sources from this directory instead of the built-in ones
    #[arg(long, global = true)]
    pub kernel_dir: Option<PathBuf>,

    /// More log output on stderr (-v info, -vv debug, -vvv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Where to write the transfer timeline
    #[cfg(feature = "memtrace")]
    #[arg(long, global = true, default_value = "memtrace.csv")]
    pub trace_csv: PathBuf,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// List every platform and device with its properties
    Devices,
    /// Run a one work-item kernel and print its greeting
    Hello,
    /// Single vector add per device against a serial loop
    VectorAdd {
        #[arg(long, default_value_t = VECTOR_ADD_LEN)]
        len: usize,
    },
    /// Find the vector length where each device beats the CPU
    Breakeven {
        /// Comma separated element counts
        #[arg(long, value_delimiter = ',', default_values_t = BREAKEVEN_SIZES)]
        sizes: Vec<usize>,
    },
    /// Split one integer vector add across all devices at once
    MultiDevice {
        #[arg(long, default_value_t = MULTI_DEVICE_LEN)]
        len: usize,
    },
    /// Matrix-vector multiply
    Matvec {
        #[arg(long, value_delimiter = ',', default_values_t = MATVEC_SIZES)]
        sizes: Vec<usize>,
    },
    /// Square matrix multiply, naive and tiled kernels
    Matmul {
        #[arg(long, value_delimiter = ',', default_values_t = MATMUL_SIZES)]
        sizes: Vec<usize>,
    },
    /// Gaussian blur: direct, local-memory and separable kernels
    Convolution {
        #[arg(long, value_delimiter = ',', default_values_t = CONV_IMAGE_SIZES)]
        image_sizes: Vec<usize>,
        /// Odd stencil widths
        #[arg(
            long,
            value_delimiter = ',',
            value_parser = odd_width,
            default_values_t = CONV_KERNEL_SIZES
        )]
        kernel_sizes: Vec<usize>,
    },
    /// All-pairs N-body accelerations
    Nbody {
        #[arg(long, value_delimiter = ',', default_values_t = NBODY_COUNTS)]
        counts: Vec<usize>,
        #[arg(long, default_value_t = NBODY_SOFTENING)]
        softening: f32,
    },
}

fn odd_width(s: &str) -> Result<usize, String> {
    let ksize: usize = s.parse().map_err(|e| format!("{e}"))?;
    check_kernel_size(ksize).map_err(|_| format!("{ksize} is not an odd stencil width"))?;
    Ok(ksize)
}

impl Args {
    pub fn config(&self) -> BenchConfig {
        BenchConfig {
            devices: self.device_type,
            iterations: self.iterations.max(1),
            kernel_dir: self.kernel_dir.clone(),
        }
    }

    pub fn log_level(&self) -> Level {
        match self.verbose {
            0 => Level::WARN,
            1 => Level::INFO,
            2 => Level::DEBUG,
            _ => Level::TRACE,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_constants() {
        let args = Args::parse_from(["cl-bench", "matmul"]);
        assert_eq!(args.iterations, BEST_OF);
        assert_eq!(args.device_type, DeviceFilter::All);
        match args.command {
            Command::Matmul { sizes } => assert_eq!(sizes, MATMUL_SIZES),
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn global_options_after_subcommand() {
        let args = Args::parse_from([
            "cl-bench",
            "convolution",
            "--image-sizes",
            "64,128",
            "--kernel-sizes",
            "3",
            "--device-type",
            "gpu",
            "-vv",
        ]);
        assert_eq!(args.device_type, DeviceFilter::Gpu);
        assert_eq!(args.log_level(), Level::DEBUG);
        match args.command {
            Command::Convolution { image_sizes, kernel_sizes } => {
                assert_eq!(image_sizes, [64, 128]);
                assert_eq!(kernel_sizes, [3]);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn even_or_zero_stencil_widths_are_rejected() {
        for widths in ["4", "0", "3,6"] {
            let parsed =
                Args::try_parse_from(["cl-bench", "convolution", "--kernel-sizes", widths]);
            assert!(parsed.is_err(), "accepted {widths}");
        }
        let args = Args::try_parse_from(["cl-bench", "convolution", "--kernel-sizes", "1,3,15"]);
        assert!(args.is_ok());
    }

    #[test]
    fn zero_iterations_still_runs_once() {
        let args = Args::parse_from(["cl-bench", "--iterations", "0", "hello"]);
        assert_eq!(args.config().iterations, 1);
    }
}
