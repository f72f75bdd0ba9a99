//! OpenCL C sources for every workload.

use crate::{BenchConfig, BenchError, Result};

use std::{borrow::Cow, fs};
use tracing::debug;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ProgramSource {
    Hello,
    VectorAdd,
    Matvec,
    Matmul,
    Convolution,
    Nbody,
}

impl ProgramSource {
    pub fn file_name(self) -> &'static str {
        match self {
            ProgramSource::Hello => "hello.cl",
            ProgramSource::VectorAdd => "vector_add.cl",
            ProgramSource::Matvec => "matvec.cl",
            ProgramSource::Matmul => "matmul.cl",
            ProgramSource::Convolution => "convolution.cl",
            ProgramSource::Nbody => "nbody.cl",
        }
    }

    pub fn embedded(self) -> &'static str {
        match self {
            ProgramSource::Hello => include_str!("../kernels/hello.cl"),
            ProgramSource::VectorAdd => include_str!("../kernels/vector_add.cl"),
            ProgramSource::Matvec => include_str!("../kernels/matvec.cl"),
            ProgramSource::Matmul => include_str!("../kernels/matmul.cl"),
            ProgramSource::Convolution => include_str!("../kernels/convolution.cl"),
            ProgramSource::Nbody => include_str!("../kernels/nbody.cl"),
        }
    }

    /// Source text, read from `config.kernel_dir` when one is set.
    pub fn load(self, config: &BenchConfig) -> Result<Cow<'static, str>> {
        let Some(dir) = &config.kernel_dir else {
            return Ok(Cow::Borrowed(self.embedded()));
        };
        let path = dir.join(self.file_name());
        debug!(path = %path.display(), "loading kernel source from disk");
        fs::read_to_string(&path)
            .map(Cow::Owned)
            .map_err(|source| BenchError::KernelSource { path, source })
    }
}
