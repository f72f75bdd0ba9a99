//! Host-side execution strategies the device numbers are compared against.
//!
//! Every CPU workload is written as "fill one output row", so the same row
//! function runs serially, through rayon's work stealing, or on a fixed set
//! of scoped threads with a static row split.

use rayon::prelude::*;
use std::{num::NonZeroUsize, thread};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Strategy {
    Serial,
    Rayon,
    /// `available_parallelism()` scoped threads, contiguous row blocks.
    Threads,
}

impl Strategy {
    pub const ALL: [Strategy; 3] = [Strategy::Serial, Strategy::Rayon, Strategy::Threads];

    pub fn label(self) -> &'static str {
        match self {
            Strategy::Serial => "Serial Rust",
            Strategy::Rayon => "Rayon par_iter",
            Strategy::Threads => "Scoped threads (static)",
        }
    }

    /// Calls `f(row_index, row)` for every `row_len`-sized row of `out`.
    /// A trailing partial row is passed as-is.
    pub fn run_rows<F>(self, out: &mut [f32], row_len: usize, f: F)
    where
        F: Fn(usize, &mut [f32]) + Sync,
    {
        if out.is_empty() || row_len == 0 {
            return;
        }
        match self {
            Strategy::Serial => out
                .chunks_mut(row_len)
                .enumerate()
                .for_each(|(i, row)| f(i, row)),
            Strategy::Rayon => out
                .par_chunks_mut(row_len)
                .enumerate()
                .for_each(|(i, row)| f(i, row)),
            Strategy::Threads => static_rows(out, row_len, threads(), &f),
        }
    }
}

/// Hardware threads as seen by the standard library.
pub fn threads() -> usize {
    thread::available_parallelism()
        .map(NonZeroUsize::get)
        .unwrap_or(1)
}

/// Size of rayon's global pool.
pub fn rayon_threads() -> usize {
    rayon::current_num_threads()
}

fn static_rows<F>(out: &mut [f32], row_len: usize, workers: usize, f: &F)
where
    F: Fn(usize, &mut [f32]) + Sync,
{
    let rows = out.len().div_ceil(row_len);
    let workers = workers.clamp(1, rows);
    let rows_per_worker = rows.div_ceil(workers);

    thread::scope(|s| {
        for (block, chunk) in out.chunks_mut(rows_per_worker * row_len).enumerate() {
            s.spawn(move || {
                let first_row = block * rows_per_worker;
                for (r, row) in chunk.chunks_mut(row_len).enumerate() {
                    f(first_row + r, row);
                }
            });
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn static_split_visits_every_row_once() {
        let mut out = vec![0.0_f32; 7 * 3];
        static_rows(&mut out, 3, 4, &|i, row: &mut [f32]| row.fill(i as f32));
        for (i, row) in out.chunks(3).enumerate() {
            assert!(row.iter().all(|&v| v == i as f32), "row {i}: {row:?}");
        }
    }

    #[test]
    fn more_workers_than_rows() {
        let mut out = vec![0.0_f32; 2];
        static_rows(&mut out, 1, 64, &|i, row: &mut [f32]| row[0] = i as f32 + 1.0);
        assert_eq!(out, [1.0, 2.0]);
    }
}
