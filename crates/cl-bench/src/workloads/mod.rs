//! One module per benchmark. Each exposes its host reference paths as
//! plain functions and a `run` entry point that prints the comparison.

pub mod breakeven;
pub mod convolution;
pub mod hello;
pub mod matmul;
pub mod matvec;
pub mod multi_device;
pub mod nbody;
pub mod vector_add;

use crate::{
    cpu::Strategy, report::Table, session::DeviceSession, timing::time_ms, verify::Verification,
};
use tracing::warn;

/// Smallest multiple of `local` that is at least `n`; NDRange global sizes
/// must divide evenly by the work-group size.
pub fn round_up(n: usize, local: usize) -> usize {
    n.div_ceil(local) * local
}

/// Whether a work-group of `items` fits the device limit. An unknown limit
/// is assumed to fit; the enqueue reports it otherwise.
pub fn fits_work_group(limit: Option<usize>, items: usize) -> bool {
    limit.map_or(true, |max| items <= max)
}

/// Warns and returns false when `session` cannot run a `items`-wide
/// work-group, so the caller skips that kernel variant.
pub(crate) fn supports_group(session: &DeviceSession, variant: &str, items: usize) -> bool {
    let limit = session.info.max_work_group_size;
    if fits_work_group(limit, items) {
        return true;
    }
    warn!(
        device = %session.name(),
        variant,
        items,
        limit = limit.unwrap_or(0),
        "work-group too large for device, skipping"
    );
    false
}

/// Shared footer when no device survived discovery and program build.
pub(crate) fn note_no_sessions(sessions: &[DeviceSession]) {
    if sessions.is_empty() {
        println!("(no OpenCL devices available, showing CPU results only)\n");
    }
}

/// Prints `table`'s row for one measured implementation.
pub(crate) fn print_row<S: AsRef<str>>(table: &Table, cells: &[S]) {
    println!("{}", table.line(cells));
}

/// One timed host run and the output it produced.
pub(crate) struct CpuRun {
    pub strategy: Strategy,
    pub ms: f64,
    pub out: Vec<f32>,
}

/// Fills a fresh `len`-element output with `row` under every strategy,
/// serial first.
pub(crate) fn cpu_runs<F>(len: usize, row_len: usize, row: F) -> Vec<CpuRun>
where
    F: Fn(usize, &mut [f32]) + Sync,
{
    Strategy::ALL
        .iter()
        .map(|&strategy| {
            let mut out = vec![0.0_f32; len];
            let ((), ms) = time_ms(|| strategy.run_rows(&mut out, row_len, &row));
            CpuRun { strategy, ms, out }
        })
        .collect()
}

/// Table cell for a verification; failures are also logged.
pub(crate) fn check_cell(label: &str, check: &Verification) -> String {
    if check.passed() {
        "✓".to_string()
    } else {
        check.report_mismatches(label);
        format!("✗ {}", check.errors)
    }
}
