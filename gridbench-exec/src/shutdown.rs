//! Interrupt Shutdown Path
//!
//! A process-wide interrupt (Ctrl-C) must force-kill every registered child
//! process group and remove temporary artifacts, exactly once. A second
//! interrupt while shutdown is in progress is a no-op.

use crate::registry::ProcessRegistry;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

/// One-shot shutdown handler.
pub struct Shutdown {
    registry: Arc<ProcessRegistry>,
    scratch_dir: Mutex<Option<PathBuf>>,
    fired: AtomicBool,
}

impl Shutdown {
    /// Create a shutdown handler over the shared process registry.
    pub fn new(registry: Arc<ProcessRegistry>) -> Arc<Self> {
        Arc::new(Self {
            registry,
            scratch_dir: Mutex::new(None),
            fired: AtomicBool::new(false),
        })
    }

    /// Register a temporary directory to scrub during shutdown (the artifact
    /// build area).
    pub fn set_scratch_dir(&self, dir: PathBuf) {
        let mut guard = self
            .scratch_dir
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        *guard = Some(dir);
    }

    /// Spawn the Ctrl-C listener. The first interrupt runs the shutdown path
    /// and exits with the conventional interrupt status; later interrupts are
    /// ignored by the one-shot guard.
    pub fn install(self: &Arc<Self>) {
        let shutdown = Arc::clone(self);
        tokio::spawn(async move {
            loop {
                if tokio::signal::ctrl_c().await.is_err() {
                    return;
                }
                if shutdown.fire() {
                    std::process::exit(130);
                }
            }
        });
    }

    /// Run the shutdown path. Returns `true` only for the caller that
    /// actually performed it; every other call is a no-op.
    pub fn fire(&self) -> bool {
        if self.fired.swap(true, Ordering::SeqCst) {
            return false;
        }

        let killed = self.registry.kill_all();
        if killed > 0 {
            tracing::warn!(killed, "interrupted; terminated active process groups");
        }

        let dir = self
            .scratch_dir
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .take();
        if let Some(dir) = dir {
            let _ = std::fs::remove_dir_all(&dir);
        }

        true
    }
}
