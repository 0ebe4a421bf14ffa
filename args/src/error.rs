//! Error types for the argument layer.

use snafu::Snafu;

use crate::handle::NativeHandle;

/// Result type for argument operations.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// A release failure recorded at its argument-set position.
///
/// Collected by [`crate::set::ArgSet::dispose_all`] so that one failing
/// resource does not mask leaks of its siblings.
#[derive(Debug)]
pub struct ReleaseFailure {
    /// Kernel parameter position of the failing argument.
    pub position: usize,
    /// The underlying release error.
    pub error: Error,
}

/// Errors that can occur while constructing, binding, or disposing
/// kernel arguments.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum Error {
    /// The native runtime could not allocate or register the resource.
    ///
    /// Recoverable: the caller may retry with a smaller request or report
    /// the failure upward. No handle was stored and no disposal is owed.
    #[snafu(display("native allocation failed for {kind} argument: {reason}"))]
    NativeAllocation { kind: &'static str, reason: String },

    /// Local payload validation failed before any native call was made.
    #[snafu(display("invalid argument: {reason}"))]
    InvalidArgument { reason: String },

    /// The native release call reported failure.
    ///
    /// Non-fatal: the argument still transitions to disposed and must not
    /// be reused.
    #[snafu(display("native release failed for handle {handle}: {reason}"))]
    NativeRelease { handle: NativeHandle, reason: String },

    /// An argument's handle was requested after disposal.
    #[snafu(display("use after dispose on {kind} argument"))]
    UseAfterDispose { kind: &'static str },

    /// The argument set does not match the kernel's parameter count.
    #[snafu(display("arity mismatch: kernel declares {expected} parameters, set populates {populated}"))]
    ArityMismatch { expected: usize, populated: usize },

    /// One or more release failures while disposing an argument set.
    #[snafu(display("disposal failed for {} of {total} arguments", failures.len()))]
    SetDispose { failures: Vec<ReleaseFailure>, total: usize },

    /// No runtime registered under the requested name.
    #[snafu(display("unknown runtime '{name}'"))]
    UnknownRuntime { name: String },
}
