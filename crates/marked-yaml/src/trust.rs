//! Trust suppression for `!unsafe` subtrees.
//!
//! Strings constructed from a trusted input stream are marked
//! `TrustedAsTemplate`, which makes them eligible for downstream template
//! expansion. An `!unsafe` tag suppresses that marker for its entire subtree.
//! This is a security boundary: a value that escapes marking here can never
//! regain eligibility later.

use std::cell::Cell;

/// Per-parse trust state: the stream-level trust flag plus the `!unsafe`
/// nesting depth.
#[derive(Debug)]
pub(crate) struct TrustTracker {
    trusted_source: bool,
    unsafe_depth: Cell<usize>,
}

impl TrustTracker {
    pub fn new(trusted_source: bool) -> Self {
        Self {
            trusted_source,
            unsafe_depth: Cell::new(0),
        }
    }

    /// Whether a string constructed right now receives `TrustedAsTemplate`.
    pub fn grants_trust(&self) -> bool {
        self.trusted_source && self.unsafe_depth.get() == 0
    }

    /// Enter an `!unsafe` subtree. The returned guard decrements the depth
    /// on drop, so the suppression cannot leak past the subtree even when
    /// its construction fails partway.
    pub fn enter_unsafe(&self) -> UnsafeScope<'_> {
        self.unsafe_depth.set(self.unsafe_depth.get() + 1);
        UnsafeScope { tracker: self }
    }

    #[cfg(test)]
    pub fn depth(&self) -> usize {
        self.unsafe_depth.get()
    }
}

/// RAII guard bracketing one `!unsafe` subtree.
pub(crate) struct UnsafeScope<'a> {
    tracker: &'a TrustTracker,
}

impl Drop for UnsafeScope<'_> {
    fn drop(&mut self) {
        let depth = self.tracker.unsafe_depth.get();
        self.tracker.unsafe_depth.set(depth.saturating_sub(1));
    }
}
