//! Kernel arguments: typed owners of native resource handles.

use std::sync::Arc;

use smallvec::SmallVec;
use snafu::ensure;
use tracing::{debug, warn};

use oxec_dtype::{AccessMode, ImageKind, ScalarType};

use crate::error::{InvalidArgumentSnafu, Result, UseAfterDisposeSnafu};
use crate::handle::NativeHandle;
use crate::runtime::{AllocRequest, NativeRuntime};

/// Bind-time metadata for one kernel argument.
///
/// A closed enumeration: the executor selects marshalling per kind, and no
/// open-ended subtyping exists beyond these four.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArgKind {
    /// A by-value scalar, staged in a runtime-side area of `elem` width.
    Scalar { elem: ScalarType },
    /// A device buffer of `size` bytes.
    Buffer { elem: ScalarType, size: usize, access: AccessMode },
    /// Work-group local scratch of `size` bytes. No host backing.
    Local { size: usize },
    /// An image with up to three extents.
    Image { kind: ImageKind, extents: SmallVec<[usize; 3]>, access: AccessMode },
}

impl ArgKind {
    /// Kind label for diagnostics and error messages.
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Scalar { .. } => "scalar",
            Self::Buffer { .. } => "buffer",
            Self::Local { .. } => "local",
            Self::Image { .. } => "image",
        }
    }
}

/// One value bound to a kernel formal parameter, guarding its native
/// resource.
///
/// A `KernelArg` exclusively owns the handle it wraps: constructors are the
/// only way to pair a live handle with an argument, and arguments are not
/// `Clone`. Disposal releases the handle exactly once; dropping a live
/// argument disposes it, with the idempotence of [`dispose`] as the safety
/// net against double invocation.
///
/// Disposal takes `&mut self`, so concurrent disposal of one instance is
/// ruled out by exclusive borrows rather than an atomic flag. Distinct
/// arguments may be disposed concurrently with no coordination.
///
/// [`dispose`]: KernelArg::dispose
pub struct KernelArg {
    runtime: Arc<dyn NativeRuntime>,
    handle: NativeHandle,
    kind: ArgKind,
    disposed: bool,
}

impl std::fmt::Debug for KernelArg {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KernelArg")
            .field("handle", &self.handle)
            .field("kind", &self.kind)
            .field("disposed", &self.disposed)
            .finish()
    }
}

impl KernelArg {
    /// Construct a scalar argument from its host bytes.
    ///
    /// The payload must be exactly as wide as `elem`.
    pub fn scalar(runtime: Arc<dyn NativeRuntime>, elem: ScalarType, bytes: &[u8]) -> Result<Self> {
        ensure!(
            bytes.len() == elem.bytes(),
            InvalidArgumentSnafu {
                reason: format!("scalar payload is {} bytes, {elem} expects {}", bytes.len(), elem.bytes()),
            }
        );
        Self::allocate(runtime, ArgKind::Scalar { elem }, AllocRequest::Scalar { elem, bytes })
    }

    /// Construct a device buffer argument of `size` bytes.
    pub fn buffer(runtime: Arc<dyn NativeRuntime>, elem: ScalarType, size: usize, access: AccessMode) -> Result<Self> {
        ensure!(size > 0, InvalidArgumentSnafu { reason: "buffer size must be non-zero" });
        ensure!(
            size % elem.bytes() == 0,
            InvalidArgumentSnafu {
                reason: format!("buffer size {size} is not a multiple of {elem} width {}", elem.bytes()),
            }
        );
        Self::allocate(runtime, ArgKind::Buffer { elem, size, access }, AllocRequest::Buffer { elem, size, access })
    }

    /// Construct a local-memory argument of `size` bytes.
    ///
    /// `device_limit` is the device's local-memory capacity, supplied by the
    /// caller; computing it belongs to the runtime. Both checks happen
    /// before any native call.
    pub fn local(runtime: Arc<dyn NativeRuntime>, size: usize, device_limit: usize) -> Result<Self> {
        ensure!(size > 0, InvalidArgumentSnafu { reason: "local allocation size must be non-zero" });
        ensure!(
            size <= device_limit,
            InvalidArgumentSnafu {
                reason: format!("local allocation of {size} bytes exceeds device limit of {device_limit}"),
            }
        );
        Self::allocate(runtime, ArgKind::Local { size }, AllocRequest::Local { size })
    }

    /// Construct an image argument with the given extents (1-3 dimensions).
    pub fn image(
        runtime: Arc<dyn NativeRuntime>,
        kind: ImageKind,
        extents: &[usize],
        access: AccessMode,
    ) -> Result<Self> {
        ensure!(
            (1..=3).contains(&extents.len()),
            InvalidArgumentSnafu { reason: format!("image must have 1-3 extents, got {}", extents.len()) }
        );
        ensure!(
            extents.iter().all(|&extent| extent > 0),
            InvalidArgumentSnafu { reason: format!("image extents must be non-zero, got {extents:?}") }
        );
        let extents = SmallVec::from_slice(extents);
        Self::allocate(
            runtime,
            ArgKind::Image { kind, extents: extents.clone(), access },
            AllocRequest::Image { kind, extents, access },
        )
    }

    /// Adopt a handle returned by a prior native call.
    ///
    /// The caller transfers ownership: the handle must not be wrapped by any
    /// other argument, and must not be released behind this one's back.
    pub fn from_raw(runtime: Arc<dyn NativeRuntime>, handle: NativeHandle, kind: ArgKind) -> Result<Self> {
        ensure!(!handle.is_null(), InvalidArgumentSnafu { reason: "cannot adopt the null handle" });
        Ok(Self { runtime, handle, kind, disposed: false })
    }

    fn allocate(runtime: Arc<dyn NativeRuntime>, kind: ArgKind, request: AllocRequest<'_>) -> Result<Self> {
        let handle = runtime.allocate(request)?;
        debug!(%handle, kind = kind.name(), runtime = runtime.name(), "allocated kernel argument");
        Ok(Self { runtime, handle, kind, disposed: false })
    }

    /// The native handle, for the executor's binding step.
    pub fn handle(&self) -> Result<NativeHandle> {
        ensure!(!self.disposed, UseAfterDisposeSnafu { kind: self.kind.name() });
        Ok(self.handle)
    }

    pub fn kind(&self) -> &ArgKind {
        &self.kind
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    /// Release the native resource.
    ///
    /// Idempotent: the first call performs the native release; any further
    /// call is a no-op and never reaches the runtime. The argument is
    /// retired even when the native release reports failure — the error is
    /// surfaced (and logged) but the handle is cleared and the argument must
    /// not be reused.
    pub fn dispose(&mut self) -> Result<()> {
        if self.disposed {
            return Ok(());
        }
        let handle = std::mem::replace(&mut self.handle, NativeHandle::NULL);
        self.disposed = true;

        let released = self.runtime.release(handle);
        if let Err(error) = &released {
            warn!(%handle, kind = self.kind.name(), %error, "native release failed; argument retired anyway");
        }
        released
    }
}

impl Drop for KernelArg {
    fn drop(&mut self) {
        // Scope exit releases the resource; dispose already logged any
        // release failure.
        let _ = self.dispose();
    }
}
