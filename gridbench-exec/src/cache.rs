//! Artifact Cache
//!
//! Memoizes expensive one-time build steps (compilations) keyed by an opaque
//! string identifying tool + flags + input. At most one successful build runs
//! per key within a process; failed builds leave no entry, so a later request
//! for the same key retries.

use gridbench_core::BenchError;
use std::collections::HashMap;
use std::future::Future;
use std::path::PathBuf;
use std::sync::Mutex;

/// Process-scoped build memoization. Injectable; lives from process start to
/// process exit, never invalidated or evicted in between.
#[derive(Debug, Default)]
pub struct ArtifactCache {
    entries: Mutex<HashMap<String, PathBuf>>,
}

impl ArtifactCache {
    /// Create an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the cached artifact for `key`, running `build` on first
    /// request. Only successes are memoized; a build failure is reported as
    /// `BenchError::CacheBuild` wrapping the underlying invocation error and
    /// leaves the key absent.
    pub async fn get_or_build<F, Fut>(&self, key: &str, build: F) -> Result<PathBuf, BenchError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<PathBuf, BenchError>>,
    {
        if let Some(path) = self.lock().get(key).cloned() {
            return Ok(path);
        }

        let path = build().await.map_err(|e| BenchError::CacheBuild {
            key: key.to_string(),
            source: Box::new(e),
        })?;

        self.lock().insert(key.to_string(), path.clone());
        Ok(path)
    }

    /// Number of memoized artifacts.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Whether the cache holds no entries.
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, PathBuf>> {
        self.entries.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
