//! Active-Process Registry
//!
//! Tracks the pid of every child the supervisor currently has in flight so
//! that the interrupt path can force-kill all of them. Injectable (one
//! instance per harness run, created at startup) rather than an ambient
//! singleton, so tests construct fresh registries per case.

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

/// Registry of pids with a live supervised invocation.
///
/// Keyed by pid, not by slot: safe under concurrent `run` calls even though
/// the execution matrix never issues two at once.
#[derive(Debug, Default)]
pub struct ProcessRegistry {
    active: Mutex<HashSet<u32>>,
}

impl ProcessRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a child pid for the duration of one invocation. The returned
    /// guard deregisters exactly once, on drop or explicit release.
    pub fn register(self: &Arc<Self>, pid: u32) -> RegistrationGuard {
        self.lock().insert(pid);
        RegistrationGuard {
            registry: Arc::clone(self),
            pid,
            released: AtomicBool::new(false),
        }
    }

    /// Number of currently registered pids.
    pub fn active_count(&self) -> usize {
        self.lock().len()
    }

    /// Force-kill every registered process group. Returns how many pids were
    /// signalled. Used by the interrupt path; signal errors are swallowed (a
    /// process that is already gone is not an error).
    pub fn kill_all(&self) -> usize {
        let pids: Vec<u32> = self.lock().iter().copied().collect();
        for &pid in &pids {
            crate::supervisor::terminate(pid);
        }
        pids.len()
    }

    fn deregister(&self, pid: u32) {
        self.lock().remove(&pid);
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashSet<u32>> {
        self.active.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Guard tying a pid registration to one invocation's lifetime.
#[derive(Debug)]
pub struct RegistrationGuard {
    registry: Arc<ProcessRegistry>,
    pid: u32,
    released: AtomicBool,
}

impl RegistrationGuard {
    /// Deregister the pid. Idempotent; the drop handler becomes a no-op
    /// afterwards.
    pub fn release(&self) {
        if !self.released.swap(true, Ordering::SeqCst) {
            self.registry.deregister(self.pid);
        }
    }
}

impl Drop for RegistrationGuard {
    fn drop(&mut self) {
        self.release();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn guard_deregisters_on_drop() {
        let registry = Arc::new(ProcessRegistry::new());
        {
            let _guard = registry.register(4242);
            assert_eq!(registry.active_count(), 1);
        }
        assert_eq!(registry.active_count(), 0);
    }

    #[test]
    fn release_is_idempotent() {
        let registry = Arc::new(ProcessRegistry::new());
        let guard = registry.register(4242);
        guard.release();
        guard.release();
        assert_eq!(registry.active_count(), 0);
        drop(guard); // must not underflow or panic
        assert_eq!(registry.active_count(), 0);
    }

    #[test]
    fn concurrent_registrations_are_independent() {
        let registry = Arc::new(ProcessRegistry::new());
        let a = registry.register(1);
        let b = registry.register(2);
        assert_eq!(registry.active_count(), 2);
        a.release();
        assert_eq!(registry.active_count(), 1);
        b.release();
        assert_eq!(registry.active_count(), 0);
    }
}
