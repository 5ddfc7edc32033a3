//! Suppression of host code reloads during multi-file writes.
//!
//! A host that recompiles and reloads code whenever sources change would see
//! a half-written artifact set if it reloaded in the middle of generation.
//! The generator holds a [`ReloadGuard`] for the whole write sequence; reload
//! requests arriving meanwhile are deferred until the last guard is dropped.

use std::cell::Cell;
use tracing::debug;

/// Host reload gate. Single-threaded by construction.
#[derive(Debug, Default)]
pub struct ReloadLock {
    depth: Cell<u32>,
    deferred: Cell<bool>,
}

impl ReloadLock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Suppress reloads until the returned guard is dropped. Nestable.
    pub fn suppress(&self) -> ReloadGuard<'_> {
        self.depth.set(self.depth.get() + 1);
        debug!(depth = self.depth.get(), "Reload suppressed");
        ReloadGuard { lock: self }
    }

    pub fn is_suppressed(&self) -> bool {
        self.depth.get() > 0
    }

    /// Host hook, called before reloading compiled code.
    ///
    /// Returns `true` if the reload may proceed now. While suppressed the
    /// request is remembered and `false` is returned.
    pub fn request_reload(&self) -> bool {
        if self.is_suppressed() {
            self.deferred.set(true);
            debug!("Reload deferred while writes are in progress");
            false
        } else {
            true
        }
    }

    /// Consume a reload request that arrived while suppressed.
    pub fn take_deferred(&self) -> bool {
        !self.is_suppressed() && self.deferred.replace(false)
    }
}

/// Scope of reload suppression. Released on drop, including on error paths.
#[must_use = "reloads are only suppressed while the guard is alive"]
#[derive(Debug)]
pub struct ReloadGuard<'a> {
    lock: &'a ReloadLock,
}

impl Drop for ReloadGuard<'_> {
    fn drop(&mut self) {
        let depth = self.lock.depth.get().saturating_sub(1);
        self.lock.depth.set(depth);
        if depth == 0 {
            debug!("Reload suppression released");
        }
    }
}
