//! Ordered, position-indexed collections of kernel arguments.

use snafu::ensure;
use tracing::debug;

use crate::arg::KernelArg;
use crate::error::{ArityMismatchSnafu, ReleaseFailure, Result, SetDisposeSnafu};
use crate::handle::NativeHandle;

/// The arguments of one kernel invocation, indexed by parameter position.
///
/// Arguments are held by value, so no two positions can reference the same
/// instance. Dropping a set disposes every remaining argument through each
/// argument's own drop.
#[derive(Debug, Default)]
pub struct ArgSet {
    slots: Vec<Option<KernelArg>>,
}

impl ArgSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self { slots: Vec::with_capacity(capacity) }
    }

    /// Append an argument at the next position; returns that position.
    pub fn push(&mut self, arg: KernelArg) -> usize {
        self.slots.push(Some(arg));
        self.slots.len() - 1
    }

    /// Place an argument at `position`, growing the set as needed.
    ///
    /// Returns the argument previously at that position, if any; the caller
    /// now owes its disposal (dropping it is enough).
    pub fn insert(&mut self, position: usize, arg: KernelArg) -> Option<KernelArg> {
        if position >= self.slots.len() {
            self.slots.resize_with(position + 1, || None);
        }
        self.slots[position].replace(arg)
    }

    pub fn get(&self, position: usize) -> Option<&KernelArg> {
        self.slots.get(position).and_then(Option::as_ref)
    }

    pub fn get_mut(&mut self, position: usize) -> Option<&mut KernelArg> {
        self.slots.get_mut(position).and_then(Option::as_mut)
    }

    /// Number of populated positions.
    pub fn populated(&self) -> usize {
        self.slots.iter().filter(|slot| slot.is_some()).count()
    }

    /// Number of positions, populated or not.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Populated positions and their arguments, in position order.
    pub fn iter(&self) -> impl Iterator<Item = (usize, &KernelArg)> {
        self.slots.iter().enumerate().filter_map(|(position, slot)| slot.as_ref().map(|arg| (position, arg)))
    }

    /// Validate the set against the kernel's declared parameter count and
    /// collect the handles to bind, in position order.
    ///
    /// Fails with an arity mismatch if the populated count differs from
    /// `param_count` or any position below `param_count` is a gap; nothing
    /// is bound on failure. A disposed argument surfaces its use-after-
    /// dispose error.
    pub fn bind(&self, param_count: usize) -> Result<Vec<NativeHandle>> {
        let populated = self.populated();
        ensure!(populated == param_count, ArityMismatchSnafu { expected: param_count, populated });

        let mut handles = Vec::with_capacity(param_count);
        for position in 0..param_count {
            match self.get(position) {
                Some(arg) => handles.push(arg.handle()?),
                // Populated count matches but a position is missing, so some
                // argument sits past the declared range.
                None => return ArityMismatchSnafu { expected: param_count, populated }.fail(),
            }
        }
        Ok(handles)
    }

    /// Dispose every contained argument, in position order.
    ///
    /// Continues past release failures so a single failing resource cannot
    /// leak the rest; all failures are collected with their positions into
    /// one error.
    pub fn dispose_all(&mut self) -> Result<()> {
        let total = self.populated();
        let mut failures = Vec::new();

        for (position, slot) in self.slots.iter_mut().enumerate() {
            if let Some(arg) = slot
                && let Err(error) = arg.dispose()
            {
                failures.push(ReleaseFailure { position, error });
            }
        }

        debug!(total, failed = failures.len(), "disposed argument set");
        ensure!(failures.is_empty(), SetDisposeSnafu { failures, total });
        Ok(())
    }
}
