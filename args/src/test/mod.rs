//! Test suites and shared fixtures for the argument layer.

pub mod unit;

use std::collections::HashSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

use parking_lot::Mutex;

use crate::error::{NativeReleaseSnafu, Result};
use crate::handle::NativeHandle;
use crate::runtime::{AllocRequest, NativeRuntime};

/// Native runtime double that counts calls and can be told to fail the
/// release of chosen handles.
#[derive(Debug, Default)]
pub struct MockRuntime {
    next: AtomicU64,
    allocations: AtomicUsize,
    releases: AtomicUsize,
    fail_release: Mutex<HashSet<NativeHandle>>,
}

impl MockRuntime {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Total native allocation calls observed.
    pub fn allocations(&self) -> usize {
        self.allocations.load(Ordering::Relaxed)
    }

    /// Total native release calls observed, including failed ones.
    pub fn releases(&self) -> usize {
        self.releases.load(Ordering::Relaxed)
    }

    /// Make the next release of `handle` report failure.
    pub fn fail_release_of(&self, handle: NativeHandle) {
        self.fail_release.lock().insert(handle);
    }
}

impl NativeRuntime for MockRuntime {
    fn allocate(&self, _request: AllocRequest<'_>) -> Result<NativeHandle> {
        self.allocations.fetch_add(1, Ordering::Relaxed);
        Ok(NativeHandle::from_raw(self.next.fetch_add(1, Ordering::Relaxed) + 1))
    }

    fn release(&self, handle: NativeHandle) -> Result<()> {
        self.releases.fetch_add(1, Ordering::Relaxed);
        if self.fail_release.lock().contains(&handle) {
            return NativeReleaseSnafu { handle, reason: "injected failure" }.fail();
        }
        Ok(())
    }

    fn bind(&self, _kernel: NativeHandle, _position: usize, _arg: NativeHandle) -> Result<()> {
        Ok(())
    }

    fn name(&self) -> &str {
        "mock"
    }
}
