//! Wall-clock helpers. Everything is reported in milliseconds.

use std::time::Instant;

use crate::Result;

#[inline]
pub fn elapsed_ms(start: Instant) -> f64 {
    start.elapsed().as_secs_f64() * 1e3
}

/// Runs `f` once and returns its output with the time it took.
pub fn time_ms<R>(f: impl FnOnce() -> R) -> (R, f64) {
    let start = Instant::now();
    let out = f();
    (out, elapsed_ms(start))
}

/// Fastest of `iterations` runs (at least one). `f` reports its own time so
/// callers can leave setup and transfers out of the measurement.
pub fn best_of(iterations: usize, mut f: impl FnMut(usize) -> Result<f64>) -> Result<f64> {
    let mut best = f64::INFINITY;
    for i in 0..iterations.max(1) {
        best = best.min(f(i)?);
    }
    Ok(best)
}

/// How many times faster `t` is than `baseline`.
#[inline]
pub fn speedup(baseline_ms: f64, t_ms: f64) -> f64 {
    baseline_ms / t_ms
}

/// Throughput for `flop` floating point operations done in `ms`.
#[inline]
pub fn gflops(flop: f64, ms: f64) -> f64 {
    flop / 1e9 / (ms / 1e3)
}

/// Device profiling counter span in milliseconds.
#[inline]
pub fn ns_to_ms(start_ns: u64, end_ns: u64) -> f64 {
    end_ns.saturating_sub(start_ns) as f64 / 1e6
}
