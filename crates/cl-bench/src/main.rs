mod cli;

use clap::Parser;
use cl_bench::{
    device::{enumerate_platforms, print_report},
    workloads::{breakeven, convolution, hello, matmul, matvec, multi_device, nbody, vector_add},
    BenchError,
};
use cli::{Args, Command};
use std::io;
use tracing::debug;
use tracing_subscriber::FmtSubscriber;

fn main() -> Result<(), BenchError> {
    let args = Args::parse();

    let subscriber = FmtSubscriber::builder()
        .with_max_level(args.log_level())
        .with_writer(io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber).map_err(io::Error::other)?;

    let config = args.config();
    debug!(?config, "starting");

    let outcome = match &args.command {
        Command::Devices => enumerate_platforms().map(|p| print_report(&p)),
        Command::Hello => hello::run(&config),
        Command::VectorAdd { len } => vector_add::run(&config, *len),
        Command::Breakeven { sizes } => breakeven::run(&config, sizes),
        Command::MultiDevice { len } => multi_device::run(&config, *len),
        Command::Matvec { sizes } => matvec::run(&config, sizes),
        Command::Matmul { sizes } => matmul::run(&config, sizes),
        Command::Convolution { image_sizes, kernel_sizes } => {
            convolution::run(&config, image_sizes, kernel_sizes)
        }
        Command::Nbody { counts, softening } => nbody::run(&config, counts, *softening),
    };

    #[cfg(feature = "metrics")]
    cl_bench::summary();

    #[cfg(feature = "memtrace")]
    cl_bench::flush_csv(&args.trace_csv)?;

    outcome
}
