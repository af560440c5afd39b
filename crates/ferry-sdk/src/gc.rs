//! Scoped GC pause

use crate::runtime::ForeignRuntime;

/// Suspends foreign garbage collection for as long as it lives.
///
/// Raw foreign values held on the native stack are invisible to the foreign
/// collector; hold a `GcPause` across any sequence of runtime calls that keeps
/// such values between calls.
#[must_use = "collection resumes as soon as the guard is dropped"]
pub struct GcPause<'a> {
    rt: &'a dyn ForeignRuntime,
}

impl<'a> GcPause<'a> {
    /// Pause collection on `rt` until the guard is dropped
    pub fn new(rt: &'a dyn ForeignRuntime) -> Self {
        rt.pause_gc();
        Self { rt }
    }
}

impl Drop for GcPause<'_> {
    fn drop(&mut self) {
        self.rt.resume_gc();
    }
}
