//! Crate-level constants.

/// Default number of runs per measurement; the fastest one is reported.
pub const BEST_OF: usize = 5;

/// Seed for the synthetic N-body system.
pub const NBODY_SEED: u64 = 42;

/// Default softening length for the N-body force calculation.
pub const NBODY_SOFTENING: f32 = 0.1;

/// Work-group size of the tiled N-body kernel.
pub const NBODY_LOCAL_SIZE: usize = 256;

/// Tile edge of the tiled matrix multiply; must match `TILE_SIZE` in matmul.cl.
pub const MATMUL_TILE: usize = 16;

/// Work-group edge of the local-memory convolution; must match `LOCAL_SIZE` in convolution.cl.
pub const CONV_LOCAL_SIZE: usize = 16;

/// Size of the hello-world message buffer in bytes.
pub const HELLO_MESSAGE_LEN: usize = 16;

/// Vector length for the single-shot vector add.
pub const VECTOR_ADD_LEN: usize = 10_000_000;

/// Vector lengths probed when looking for the breakeven point.
pub const BREAKEVEN_SIZES: [usize; 10] = [
    1 << 10,
    1 << 12,
    1 << 14,
    1 << 16,
    1 << 18,
    1 << 20,
    1 << 22,
    1 << 24,
    1 << 26,
    1 << 27,
];

/// Total element count split across all devices.
pub const MULTI_DEVICE_LEN: usize = 1 << 24;

/// Elements echoed after the multi-device run.
pub const MULTI_DEVICE_PREVIEW: usize = 10;

pub const MATVEC_SIZES: [usize; 4] = [512, 1024, 2048, 4096];

pub const MATMUL_SIZES: [usize; 4] = [256, 512, 1024, 2048];

pub const CONV_IMAGE_SIZES: [usize; 4] = [512, 1024, 2048, 4096];

pub const CONV_KERNEL_SIZES: [usize; 5] = [3, 5, 7, 11, 15];

pub const NBODY_COUNTS: [usize; 6] = [128, 256, 512, 1024, 2048, 4096];

/// Absolute tolerance of the vector add check.
pub const VECTOR_ADD_EPS: f32 = 1e-3;

/// Absolute tolerance used for matrix results.
pub const MATRIX_EPS: f32 = 1e-2;

/// Absolute tolerance used for convolution results.
pub const CONV_EPS: f32 = 1e-3;

/// Relative tolerance used for N-body accelerations.
pub const NBODY_REL_EPS: f32 = 1e-3;

/// Mismatches printed before a verification gives up listing them.
pub const MAX_REPORTED_MISMATCHES: usize = 5;
