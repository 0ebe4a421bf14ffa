//! Argument binding for heterogeneous-compute kernel execution.
//!
//! Values passed to an accelerator kernel — scalars, device buffers,
//! local-memory allocations, images — live in a native runtime outside the
//! Rust allocator. This crate wraps each such resource in a typed
//! [`KernelArg`] that owns one opaque [`NativeHandle`], releases it exactly
//! once, and refuses access after release. An [`ArgSet`] aggregates
//! heterogeneous arguments by kernel parameter position so the executor can
//! bind them uniformly before a launch.
//!
//! The native runtime itself is external; everything this crate needs from
//! it is the narrow [`NativeRuntime`] trait. [`HostRuntime`] is an
//! in-process reference implementation, and [`TrackingRuntime`] wraps any
//! runtime with double-release refusal and teardown leak diagnostics.

pub mod arg;
pub mod error;
pub mod handle;
pub mod registry;
pub mod runtime;
pub mod set;

#[cfg(test)]
pub mod test;

pub use arg::{ArgKind, KernelArg};
pub use error::{Error, ReleaseFailure, Result};
pub use handle::NativeHandle;
pub use registry::{RuntimeRegistry, host, registry};
pub use runtime::{AllocRequest, HostRuntime, NativeRuntime, TrackingRuntime};
pub use set::ArgSet;
