//! Process-global registry of native runtimes.
//!
//! Mirrors the executor's view of the world: runtimes are registered by
//! name (by whichever component owns device discovery) and looked up when
//! arguments are constructed. The built-in `host` runtime is created on
//! first use, wrapped in [`TrackingRuntime`] so anything leaked through it
//! is reported at teardown.

use std::collections::HashMap;
use std::sync::Arc;

use once_cell::sync::Lazy;
use parking_lot::RwLock;

use crate::error::{Result, UnknownRuntimeSnafu};
use crate::runtime::{HostRuntime, NativeRuntime, TrackingRuntime};

pub struct RuntimeRegistry {
    runtimes: RwLock<HashMap<String, Arc<dyn NativeRuntime>>>,
}

impl RuntimeRegistry {
    fn new() -> Self {
        Self { runtimes: RwLock::new(HashMap::new()) }
    }

    /// Register a runtime under `name`, replacing any previous entry.
    pub fn register(&self, name: impl Into<String>, runtime: Arc<dyn NativeRuntime>) {
        self.runtimes.write().insert(name.into(), runtime);
    }

    /// Look up a registered runtime.
    pub fn get(&self, name: &str) -> Result<Arc<dyn NativeRuntime>> {
        self.runtimes.read().get(name).cloned().map_or_else(|| UnknownRuntimeSnafu { name }.fail(), Ok)
    }

    /// The shared host runtime, created on first use.
    pub fn host(&self) -> Arc<dyn NativeRuntime> {
        // Fast path: read lock.
        {
            let runtimes = self.runtimes.read();
            if let Some(runtime) = runtimes.get("host") {
                return Arc::clone(runtime);
            }
        }

        // Slow path: write lock, double-check after acquiring it.
        let mut runtimes = self.runtimes.write();
        if let Some(runtime) = runtimes.get("host") {
            return Arc::clone(runtime);
        }

        let runtime: Arc<dyn NativeRuntime> = Arc::new(TrackingRuntime::new(Box::new(HostRuntime::new())));
        runtimes.insert("host".to_string(), Arc::clone(&runtime));
        runtime
    }
}

/// Global runtime registry instance.
static REGISTRY: Lazy<RuntimeRegistry> = Lazy::new(RuntimeRegistry::new);

/// Get the global runtime registry.
pub fn registry() -> &'static RuntimeRegistry {
    &REGISTRY
}

/// Convenience function to get the shared host runtime.
pub fn host() -> Arc<dyn NativeRuntime> {
    registry().host()
}
