//! Host-side latency samples per stage plus live device allocation counters.

use once_cell::sync::Lazy;
use std::{
    collections::BTreeMap,
    sync::{
        Mutex, PoisonError,
        atomic::{AtomicUsize, Ordering},
    },
    time::Instant,
};

/* ───────────── Raw latencies ───────────────────────────────── */

static TIMES: Lazy<Mutex<Vec<(&'static str, u128)>>> = Lazy::new(|| Mutex::new(Vec::new()));

/// `record("enqueue_write", t)` where `t` was taken right before the call.
pub fn record(name: &'static str, start: Instant) {
    let dur = start.elapsed().as_micros();
    TIMES
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .push((name, dur));
}

/* ───────────── Buffer allocations ──────────────────────────── */

pub static ALLOCS: AtomicUsize = AtomicUsize::new(0);
pub static ALLOC_BYTES: AtomicUsize = AtomicUsize::new(0);
static PEAK_BYTES: AtomicUsize = AtomicUsize::new(0);

pub(crate) fn note_peak() {
    PEAK_BYTES.fetch_max(ALLOC_BYTES.load(Ordering::Relaxed), Ordering::Relaxed);
}

/// p95 of an ascending sample list, nearest-rank.
fn p95(sorted: &[u128]) -> u128 {
    sorted[((sorted.len() * 95) / 100).saturating_sub(1)]
}

/* ───────────── Summary ─────────────────────────────────────── */

/// Prints mean/p95 per stage and drains the samples. Call once at exit.
pub fn summary() {
    let mut map: BTreeMap<&str, Vec<u128>> = BTreeMap::new();
    {
        let mut times = TIMES.lock().unwrap_or_else(PoisonError::into_inner);
        for (name, us) in times.drain(..) {
            map.entry(name).or_default().push(us);
        }
    }

    println!("── metrics summary ──");
    for (name, mut v) in map {
        v.sort_unstable();
        let mean = v.iter().sum::<u128>() / v.len() as u128;
        println!(
            "{:<18} n={:<5} mean={:>7} µs   p95={:>7} µs",
            name,
            v.len(),
            mean,
            p95(&v)
        );
    }

    let live = ALLOCS.load(Ordering::Relaxed);
    let peak = PEAK_BYTES.load(Ordering::Relaxed);
    println!(
        "live device buffers: {}   peak device memory: {} MiB",
        live,
        peak / 1024 / 1024
    );
}
