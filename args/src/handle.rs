/// Opaque identifier for a resource owned by the native runtime.
///
/// The value is meaningful only to the runtime that issued it; this layer
/// never dereferences it. Zero is the "no resource" sentinel and must never
/// reach a native release call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NativeHandle(u64);

impl NativeHandle {
    /// The "no resource" sentinel.
    pub const NULL: Self = Self(0);

    /// Wrap a raw identifier returned by a native call.
    pub const fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    /// Raw identifier, as expected by the native call interface.
    pub const fn into_raw(self) -> u64 {
        self.0
    }

    pub const fn is_null(&self) -> bool {
        self.0 == 0
    }
}

impl std::fmt::Display for NativeHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:#x}", self.0)
    }
}
