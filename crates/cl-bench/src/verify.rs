//! Element-wise comparison of device output against a host reference.

use std::fmt;

use tracing::warn;

use crate::consts::MAX_REPORTED_MISMATCHES;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Mismatch {
    pub index: usize,
    pub expected: f64,
    pub actual: f64,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Verification {
    /// Total number of elements outside tolerance.
    pub errors: usize,
    /// The first few of them, in index order.
    pub first: Vec<Mismatch>,
}

impl Verification {
    pub fn passed(&self) -> bool {
        self.errors == 0
    }

    fn collect<I>(pairs: I) -> Self
    where
        I: Iterator<Item = (usize, f64, f64, bool)>,
    {
        let mut v = Verification::default();
        for (index, expected, actual, ok) in pairs {
            if ok {
                continue;
            }
            if v.first.len() < MAX_REPORTED_MISMATCHES {
                v.first.push(Mismatch { index, expected, actual });
            }
            v.errors += 1;
        }
        v
    }

    /// One line per recorded mismatch, prefixed with `label`.
    pub fn mismatch_lines(&self, label: &str) -> Vec<String> {
        self.first
            .iter()
            .map(|m| {
                format!(
                    "Mismatch in {label} at {}: expected {}, got {}",
                    m.index, m.expected, m.actual
                )
            })
            .collect()
    }

    /// Logs the recorded mismatches as warnings.
    pub fn report_mismatches(&self, label: &str) {
        for line in self.mismatch_lines(label) {
            warn!("{line}");
        }
    }
}

impl fmt::Display for Verification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.passed() {
            write!(f, "  ✓ Verified")
        } else {
            write!(f, "  ✗ Failed ({} errors)", self.errors)
        }
    }
}

/// `|expected - actual| <= eps` for every element. Each element one side
/// has and the other lacks counts as an error. NaN never matches.
pub fn verify(expected: &[f32], actual: &[f32], eps: f32) -> Verification {
    let mut v = Verification::collect(
        expected
            .iter()
            .zip(actual)
            .enumerate()
            .map(|(i, (&e, &a))| (i, f64::from(e), f64::from(a), (e - a).abs() <= eps)),
    );
    v.errors += expected.len().abs_diff(actual.len());
    v
}

/// Relative comparison for values spanning several magnitudes:
/// `|e - a| <= rel * |e|`, with `abs_floor` as the minimum allowance.
pub fn verify_relative(expected: &[f32], actual: &[f32], rel: f32, abs_floor: f32) -> Verification {
    let mut v = Verification::collect(expected.iter().zip(actual).enumerate().map(
        |(i, (&e, &a))| {
            let allowed = (rel * e.abs()).max(abs_floor);
            (i, f64::from(e), f64::from(a), (e - a).abs() <= allowed)
        },
    ));
    v.errors += expected.len().abs_diff(actual.len());
    v
}

/// Exact comparison for integer results.
pub fn verify_exact(expected: &[i32], actual: &[i32]) -> Verification {
    let mut v = Verification::collect(
        expected
            .iter()
            .zip(actual)
            .enumerate()
            .map(|(i, (&e, &a))| (i, f64::from(e), f64::from(a), e == a)),
    );
    v.errors += expected.len().abs_diff(actual.len());
    v
}
