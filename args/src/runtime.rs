//! The native-call interface consumed from the compute runtime.
//!
//! The runtime itself (devices, contexts, queues, kernel compilation) is
//! external to this layer. Everything the argument layer needs from it is
//! captured by the [`NativeRuntime`] trait: allocate a resource for an
//! argument, release it, and attach a handle to a kernel invocation.
//!
//! Two implementations live here:
//!
//! - [`HostRuntime`], an in-process reference runtime backed by a handle
//!   table. Used by tests and as a stand-in where no accelerator exists.
//! - [`TrackingRuntime`], a safety wrapper around any runtime that refuses
//!   double releases and reports still-live handles at teardown.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::Mutex;
use smallvec::SmallVec;
use tracing::warn;

use oxec_dtype::{AccessMode, ImageKind, ScalarType};

use crate::error::{NativeAllocationSnafu, NativeReleaseSnafu, Result};
use crate::handle::NativeHandle;

/// One allocation/registration request, issued once per argument
/// construction. Mirrors the argument kinds plus the scalar staging bytes.
#[derive(Debug, Clone)]
pub enum AllocRequest<'a> {
    Scalar { elem: ScalarType, bytes: &'a [u8] },
    Buffer { elem: ScalarType, size: usize, access: AccessMode },
    Local { size: usize },
    Image { kind: ImageKind, extents: SmallVec<[usize; 3]>, access: AccessMode },
}

impl AllocRequest<'_> {
    /// Kind label for diagnostics and error messages.
    pub const fn kind_name(&self) -> &'static str {
        match self {
            Self::Scalar { .. } => "scalar",
            Self::Buffer { .. } => "buffer",
            Self::Local { .. } => "local",
            Self::Image { .. } => "image",
        }
    }
}

/// Narrow boundary to the out-of-scope native compute runtime.
///
/// Allocation and release are synchronous, potentially blocking calls.
/// `bind` belongs to the executor's binding step; it lives on this trait so
/// the executor and the argument layer share one boundary.
pub trait NativeRuntime: Send + Sync + std::fmt::Debug {
    /// Allocate or register a resource for the given request.
    ///
    /// A successful call never returns the null handle.
    fn allocate(&self, request: AllocRequest<'_>) -> Result<NativeHandle>;

    /// Release a previously allocated resource.
    ///
    /// Called at most once per live handle; callers guarantee the handle is
    /// non-null.
    fn release(&self, handle: NativeHandle) -> Result<()>;

    /// Attach an argument handle to a kernel invocation at `position`.
    fn bind(&self, kernel: NativeHandle, position: usize, arg: NativeHandle) -> Result<()>;

    /// Runtime name for diagnostics.
    fn name(&self) -> &str;
}

#[derive(Debug)]
enum HostResource {
    Scalar { bytes: Box<[u8]> },
    Buffer { data: Box<[u8]> },
    Local { size: usize },
    Image { data: Box<[u8]> },
}

impl HostResource {
    fn footprint(&self) -> usize {
        match self {
            Self::Scalar { bytes } => bytes.len(),
            Self::Buffer { data } | Self::Image { data } => data.len(),
            Self::Local { size } => *size,
        }
    }
}

/// In-process reference runtime backed by a handle table.
///
/// Scalars keep their staging bytes, buffers and images allocate host
/// memory, locals only record their size (scratch memory has no host
/// backing). Handles are monotonically increasing and never reused, so a
/// released handle can be told apart from one that never existed.
#[derive(Debug)]
pub struct HostRuntime {
    next: AtomicU64,
    resources: Mutex<HashMap<NativeHandle, HostResource>>,
    bindings: Mutex<Vec<(NativeHandle, usize, NativeHandle)>>,
}

impl HostRuntime {
    pub fn new() -> Self {
        Self { next: AtomicU64::new(0), resources: Mutex::new(HashMap::new()), bindings: Mutex::new(Vec::new()) }
    }

    /// Number of resources that have been allocated but not released.
    pub fn live_handles(&self) -> usize {
        self.resources.lock().len()
    }

    /// Footprint in bytes of a live resource.
    pub fn resource_bytes(&self, handle: NativeHandle) -> Option<usize> {
        self.resources.lock().get(&handle).map(HostResource::footprint)
    }

    fn vend(&self) -> NativeHandle {
        // Starts at 1: zero is the null sentinel.
        NativeHandle::from_raw(self.next.fetch_add(1, Ordering::Relaxed) + 1)
    }

    /// Staging bytes of a scalar resource, for checking marshalled payloads.
    #[cfg(test)]
    pub(crate) fn scalar_bytes(&self, handle: NativeHandle) -> Option<Vec<u8>> {
        match self.resources.lock().get(&handle) {
            Some(HostResource::Scalar { bytes }) => Some(bytes.to_vec()),
            _ => None,
        }
    }

    /// Recorded `(kernel, position, argument)` bind calls.
    #[cfg(test)]
    pub(crate) fn bindings(&self) -> Vec<(NativeHandle, usize, NativeHandle)> {
        self.bindings.lock().clone()
    }
}

impl Default for HostRuntime {
    fn default() -> Self {
        Self::new()
    }
}

impl NativeRuntime for HostRuntime {
    fn allocate(&self, request: AllocRequest<'_>) -> Result<NativeHandle> {
        let kind = request.kind_name();
        let resource = match request {
            AllocRequest::Scalar { bytes, .. } => HostResource::Scalar { bytes: bytes.into() },
            AllocRequest::Buffer { size, .. } => {
                snafu::ensure!(size > 0, NativeAllocationSnafu { kind, reason: "zero-size allocation" });
                HostResource::Buffer { data: vec![0u8; size].into_boxed_slice() }
            }
            AllocRequest::Local { size } => {
                snafu::ensure!(size > 0, NativeAllocationSnafu { kind, reason: "zero-size allocation" });
                HostResource::Local { size }
            }
            AllocRequest::Image { kind: image, extents, .. } => {
                let footprint = extents.iter().product::<usize>() * image.channel_bytes();
                snafu::ensure!(footprint > 0, NativeAllocationSnafu { kind, reason: "empty image" });
                HostResource::Image { data: vec![0u8; footprint].into_boxed_slice() }
            }
        };

        let handle = self.vend();
        self.resources.lock().insert(handle, resource);
        Ok(handle)
    }

    fn release(&self, handle: NativeHandle) -> Result<()> {
        match self.resources.lock().remove(&handle) {
            Some(_) => Ok(()),
            None => NativeReleaseSnafu { handle, reason: "unknown or already released handle" }.fail(),
        }
    }

    fn bind(&self, kernel: NativeHandle, position: usize, arg: NativeHandle) -> Result<()> {
        snafu::ensure!(
            self.resources.lock().contains_key(&arg),
            NativeReleaseSnafu { handle: arg, reason: "bind of unknown or released handle" }
        );
        self.bindings.lock().push((kernel, position, arg));
        Ok(())
    }

    fn name(&self) -> &str {
        "host"
    }
}

/// Safety wrapper around any [`NativeRuntime`].
///
/// Records every handle the inner runtime vends. A release of a handle it
/// does not know is reported as a release error *without* forwarding to the
/// inner runtime, since double release is undefined behavior in many native
/// runtimes. Handles still live when the wrapper is dropped are reported as
/// leak diagnostics, never as a crash.
#[derive(Debug)]
pub struct TrackingRuntime {
    inner: Box<dyn NativeRuntime>,
    live: Mutex<HashMap<NativeHandle, &'static str>>,
    name: String,
}

impl TrackingRuntime {
    pub fn new(inner: Box<dyn NativeRuntime>) -> Self {
        let name = inner.name().to_string();
        Self { inner, live: Mutex::new(HashMap::new()), name }
    }

    /// Number of handles vended and not yet released.
    pub fn live(&self) -> usize {
        self.live.lock().len()
    }

    /// Handles that were vended but never released, with their kinds.
    pub fn leaked(&self) -> Vec<(NativeHandle, &'static str)> {
        let mut leaked: Vec<_> = self.live.lock().iter().map(|(h, k)| (*h, *k)).collect();
        leaked.sort();
        leaked
    }
}

impl NativeRuntime for TrackingRuntime {
    fn allocate(&self, request: AllocRequest<'_>) -> Result<NativeHandle> {
        let kind = request.kind_name();
        let handle = self.inner.allocate(request)?;
        self.live.lock().insert(handle, kind);
        Ok(handle)
    }

    fn release(&self, handle: NativeHandle) -> Result<()> {
        // Refuse to forward a second release for the same handle.
        snafu::ensure!(
            self.live.lock().remove(&handle).is_some(),
            NativeReleaseSnafu { handle, reason: "release of unknown or already released handle" }
        );
        self.inner.release(handle)
    }

    fn bind(&self, kernel: NativeHandle, position: usize, arg: NativeHandle) -> Result<()> {
        self.inner.bind(kernel, position, arg)
    }

    fn name(&self) -> &str {
        &self.name
    }
}

impl Drop for TrackingRuntime {
    fn drop(&mut self) {
        for (handle, kind) in self.live.get_mut().drain() {
            warn!(%handle, kind, runtime = %self.name, "native resource leaked at teardown");
        }
    }
}
