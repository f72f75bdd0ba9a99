//! Typed device buffers with a compile-time transfer state.
//!
//! A buffer starts out `Queued` (allocated, contents undefined), becomes
//! `InFlight` while an upload or a kernel writing it is pending and turns
//! `Ready` once the matching [`GpuEventGuard`] has been waited on. Only
//! `Ready` buffers can be read back to the host.

use crate::{BenchError, Result};

use bytemuck::Pod;
use opencl3::{
    command_queue::CommandQueue,
    context::Context,
    error_codes::CL_INVALID_EVENT,
    event::Event,
    memory::Buffer,
    types::{cl_mem_flags, CL_BLOCKING, CL_NON_BLOCKING},
};
use std::{marker::PhantomData, ptr};

#[cfg(feature = "metrics")]
use crate::metrics::{note_peak, record, ALLOCS, ALLOC_BYTES};
#[cfg(feature = "metrics")]
use std::{sync::atomic::Ordering, time::Instant};

#[cfg(feature = "memtrace")]
use crate::memtracer::{start as trace_start, CopyToken, Dir};

// ─── Typestate markers ───────────────────────────────────────────────
mod sealed {
    pub trait Sealed {}
}

pub trait State: sealed::Sealed {}

pub struct Queued;
impl sealed::Sealed for Queued {}
impl State for Queued {}

pub struct InFlight;
impl sealed::Sealed for InFlight {}
impl State for InFlight {}

pub struct Ready;
impl sealed::Sealed for Ready {}
impl State for Ready {}

// ─── Allocation accounting ───────────────────────────────────────────

/// Keeps the allocation counters balanced no matter which state the
/// owning buffer is dropped in.
#[cfg(feature = "metrics")]
struct AllocToken {
    bytes: usize,
}

#[cfg(feature = "metrics")]
impl AllocToken {
    fn new(bytes: usize) -> Self {
        ALLOCS.fetch_add(1, Ordering::Relaxed);
        ALLOC_BYTES.fetch_add(bytes, Ordering::Relaxed);
        note_peak();
        Self { bytes }
    }
}

#[cfg(feature = "metrics")]
impl Drop for AllocToken {
    fn drop(&mut self) {
        ALLOCS.fetch_sub(1, Ordering::Relaxed);
        ALLOC_BYTES.fetch_sub(self.bytes, Ordering::Relaxed);
    }
}

// ─── GPU buffer ──────────────────────────────────────────────────────
pub struct GpuBuffer<T: Pod, S: State> {
    buf: Buffer<T>,
    len: usize,
    #[cfg(feature = "metrics")]
    _alloc: AllocToken,
    _state: PhantomData<S>,
}

impl<T: Pod, S: State> std::fmt::Debug for GpuBuffer<T, S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GpuBuffer")
            .field("len", &self.len)
            .field("elem", &std::any::type_name::<T>())
            .field("state", &std::any::type_name::<S>())
            .finish()
    }
}

impl<T: Pod, S: State> GpuBuffer<T, S> {
    #[inline(always)]
    fn transition<N: State>(self) -> GpuBuffer<T, N> {
        GpuBuffer {
            buf: self.buf,
            len: self.len,
            #[cfg(feature = "metrics")]
            _alloc: self._alloc,
            _state: PhantomData,
        }
    }

    /// Underlying OpenCL buffer, e.g. for kernel arguments.
    #[inline(always)]
    pub fn raw(&self) -> &Buffer<T> {
        &self.buf
    }

    /// Length in elements.
    #[inline(always)]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline(always)]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Length in bytes.
    #[inline(always)]
    pub fn size_bytes(&self) -> usize {
        self.len * std::mem::size_of::<T>()
    }

    fn check_len(&self, host: usize) -> Result<()> {
        if host != self.len {
            return Err(BenchError::LengthMismatch { host, device: self.len });
        }
        Ok(())
    }

    fn start_write<'h>(
        mut self,
        queue: &CommandQueue,
        host: &'h [T],
    ) -> Result<(GpuBuffer<T, InFlight>, GpuEventGuard<'h>)> {
        self.check_len(host.len())?;

        #[cfg(feature = "metrics")]
        let t = Instant::now();
        #[cfg(feature = "memtrace")]
        let token = trace_start(Dir::H2D, self.size_bytes());

        let evt = unsafe {
            queue.enqueue_write_buffer(&mut self.buf, CL_NON_BLOCKING, 0, host, &[])?
        };

        #[cfg(feature = "metrics")]
        record("enqueue_write", t);

        let guard = GpuEventGuard {
            evt: Some(evt),
            #[cfg(feature = "memtrace")]
            token: Some(token),
            _host: PhantomData,
        };
        Ok((self.transition(), guard))
    }
}

// ── Queued ───────────────────────────────────────────────────────────
impl<T: Pod> GpuBuffer<T, Queued> {
    /// Allocates `len` elements on the context's device. Contents are undefined.
    pub fn new(ctx: &Context, len: usize, flags: cl_mem_flags) -> Result<Self> {
        if len == 0 {
            return Err(BenchError::InvalidSize(len));
        }

        #[cfg(feature = "metrics")]
        let t = Instant::now();

        let buf = unsafe { Buffer::<T>::create(ctx, flags, len, ptr::null_mut())? };

        #[cfg(feature = "metrics")]
        record("buffer_create", t);

        Ok(Self {
            buf,
            len,
            #[cfg(feature = "metrics")]
            _alloc: AllocToken::new(len * std::mem::size_of::<T>()),
            _state: PhantomData,
        })
    }

    /// Allocate, upload and wait in one go.
    pub fn from_slice(
        ctx: &Context,
        queue: &CommandQueue,
        data: &[T],
        flags: cl_mem_flags,
    ) -> Result<GpuBuffer<T, Ready>> {
        let (in_flight, guard) = Self::new(ctx, data.len(), flags)?.enqueue_write(queue, data)?;
        in_flight.into_ready(guard)
    }

    /// Starts a non-blocking upload of `host`. The returned guard borrows
    /// `host`, so the slice outlives the transfer.
    pub fn enqueue_write<'h>(
        self,
        queue: &CommandQueue,
        host: &'h [T],
    ) -> Result<(GpuBuffer<T, InFlight>, GpuEventGuard<'h>)> {
        self.start_write(queue, host)
    }

    /// Marks the buffer as the target of a kernel that is about to be enqueued.
    #[inline(always)]
    pub fn launch(self) -> GpuBuffer<T, InFlight> {
        self.transition()
    }
}

// ── InFlight ─────────────────────────────────────────────────────────
impl<T: Pod> GpuBuffer<T, InFlight> {
    /// Waits for the pending command and moves to `Ready`.
    pub fn into_ready(self, guard: GpuEventGuard<'_>) -> Result<GpuBuffer<T, Ready>> {
        guard.wait()?;
        Ok(self.transition())
    }

    /// Like [`into_ready`](Self::into_ready) but hands back the completed
    /// event so its profiling counters can be read.
    pub fn complete(self, guard: GpuEventGuard<'_>) -> Result<(GpuBuffer<T, Ready>, Event)> {
        let evt = guard.wait()?;
        Ok((self.transition(), evt))
    }
}

// ── Ready → Host (D2H) ───────────────────────────────────────────────
impl<T: Pod> GpuBuffer<T, Ready> {
    /// Blocking download into `out`, which must match the buffer length.
    pub fn read(&self, queue: &CommandQueue, out: &mut [T]) -> Result<()> {
        self.check_len(out.len())?;

        #[cfg(feature = "metrics")]
        let t = Instant::now();
        #[cfg(feature = "memtrace")]
        let token = trace_start(Dir::D2H, self.size_bytes());

        let evt = unsafe { queue.enqueue_read_buffer(&self.buf, CL_BLOCKING, 0, out, &[])? };
        evt.wait()?;

        #[cfg(feature = "memtrace")]
        token.finish();
        #[cfg(feature = "metrics")]
        record("enqueue_read", t);

        Ok(())
    }

    /// Uploads fresh contents into an already populated buffer.
    pub fn rewrite<'h>(
        self,
        queue: &CommandQueue,
        host: &'h [T],
    ) -> Result<(GpuBuffer<T, InFlight>, GpuEventGuard<'h>)> {
        self.start_write(queue, host)
    }

    /// Hands the buffer to another kernel launch that overwrites it.
    #[inline(always)]
    pub fn relaunch(self) -> GpuBuffer<T, InFlight> {
        self.transition()
    }
}

// ── Guard (waits for its event on drop) ──────────────────────────────
#[must_use = "dropping the guard blocks until the command completes"]
pub struct GpuEventGuard<'h> {
    evt: Option<Event>,
    #[cfg(feature = "memtrace")]
    token: Option<CopyToken>,
    _host: PhantomData<&'h [u8]>,
}

impl GpuEventGuard<'static> {
    /// Wraps a kernel launch event. Kernels only touch device memory, so
    /// the guard borrows nothing from the host.
    pub fn kernel(evt: Event) -> Self {
        Self {
            evt: Some(evt),
            #[cfg(feature = "memtrace")]
            token: Some(trace_start(Dir::Kernel, 0)),
            _host: PhantomData,
        }
    }
}

impl GpuEventGuard<'_> {
    /// Blocks until the command finished and returns its event.
    pub fn wait(mut self) -> Result<Event> {
        let evt = self.evt.take().ok_or(BenchError::Api(CL_INVALID_EVENT))?;
        evt.wait()?;
        #[cfg(feature = "memtrace")]
        if let Some(token) = self.token.take() {
            token.finish();
        }
        Ok(evt)
    }
}

impl Drop for GpuEventGuard<'_> {
    #[inline]
    fn drop(&mut self) {
        if let Some(evt) = self.evt.take() {
            let _ = evt.wait();
        }
    }
}
