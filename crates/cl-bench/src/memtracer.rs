//! Transfer/kernel timeline, written out as CSV at the end of a run.

use once_cell::sync::Lazy;
use std::{
    fs::File,
    io::{self, BufWriter, Write},
    path::Path,
    sync::{Mutex, PoisonError},
    time::Instant,
};

/// Transfer direction or kernel execution.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Dir {
    H2D,
    D2H,
    Kernel,
}

impl Dir {
    fn as_str(self) -> &'static str {
        match self {
            Dir::H2D => "H2D",
            Dir::D2H => "D2H",
            Dir::Kernel => "Kernel",
        }
    }
}

/// Origin of the timeline, fixed by the first `start()`.
static T0: Lazy<Instant> = Lazy::new(Instant::now);

struct Entry {
    start_us: u128,
    end_us: u128,
    bytes: usize,
    dir: Dir,
    idle_us: u128,
}

static LOG: Lazy<Mutex<Vec<Entry>>> = Lazy::new(|| Mutex::new(Vec::new()));

/// Start time, size and direction of one command.
#[derive(Debug)]
pub struct CopyToken {
    start: Instant,
    bytes: usize,
    dir: Dir,
}

pub fn start(dir: Dir, bytes: usize) -> CopyToken {
    Lazy::force(&T0);
    CopyToken { start: Instant::now(), bytes, dir }
}

impl CopyToken {
    /// Closes the interval; idle time is the gap since the previous entry ended.
    pub fn finish(self) {
        let t0 = *T0;
        let start_us = self.start.duration_since(t0).as_micros();
        let end_us = Instant::now().duration_since(t0).as_micros();

        let mut log = LOG.lock().unwrap_or_else(PoisonError::into_inner);
        let prev_end = log.last().map(|e| e.end_us).unwrap_or(0);
        log.push(Entry {
            start_us,
            end_us,
            bytes: self.bytes,
            dir: self.dir,
            idle_us: start_us.saturating_sub(prev_end),
        });
    }
}

/// Writes the recorded timeline to `path`.
pub fn flush_csv(path: &Path) -> io::Result<()> {
    let mut f = BufWriter::new(File::create(path)?);
    writeln!(f, "t_start_us,t_end_us,bytes,dir,idle_us")?;
    for e in LOG.lock().unwrap_or_else(PoisonError::into_inner).iter() {
        writeln!(
            f,
            "{},{},{},{},{}",
            e.start_us,
            e.end_us,
            e.bytes,
            e.dir.as_str(),
            e.idle_us
        )?;
    }
    f.flush()
}
