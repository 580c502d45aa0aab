// src/crawl/registry.rs
// =============================================================================
// Remembers which URLs have already been scheduled for a probe.
//
// The registry is owned by a crawl session and handed to whoever needs it;
// there is no global state. It is shared by the probe workers, so the set
// sits behind a Mutex and `insert` is a single check-and-add under the lock.
// =============================================================================

use std::collections::HashSet;
use std::sync::{Mutex, MutexGuard, PoisonError};

#[derive(Debug, Default)]
pub struct DedupRegistry {
    seen: Mutex<HashSet<String>>,
}

impl DedupRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, url: &str) -> bool {
        self.lock().contains(url)
    }

    /// Adds the URL. Returns true if it was not already present.
    pub fn insert(&self, url: &str) -> bool {
        self.lock().insert(url.to_string())
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    // A panic while holding the lock can't leave a HashSet half-updated in a
    // way that matters here, so a poisoned lock is simply reused.
    fn lock(&self) -> MutexGuard<'_, HashSet<String>> {
        self.seen.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
