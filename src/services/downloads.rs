//! Download progress registry.
//!
//! DESIGN
//! ======
//! Lets any number of observers track a named pull without touching the
//! network layer. Entries are created lazily on first reference and never
//! removed; the registry lives for the process lifetime, bounded by the
//! number of distinct models touched in a session. A failed pull marks the
//! entry done without forcing progress to 100, so subscribers cannot
//! distinguish "completed" from "failed" by the progress value alone; the
//! error travels back to the `start_download` caller instead.

use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex};

use crate::ollama::ProgressFn;

// =============================================================================
// TYPES
// =============================================================================

struct DownloadEntry {
    progress: u8,
    callbacks: Vec<(u64, ProgressFn)>,
    done: bool,
}

impl DownloadEntry {
    fn new() -> Self {
        Self { progress: 0, callbacks: Vec::new(), done: false }
    }
}

struct Registry {
    entries: HashMap<String, DownloadEntry>,
    next_callback_id: u64,
}

/// Cloneable handle to the shared registry. Constructed once at startup and
/// injected wherever pull progress is observed.
#[derive(Clone)]
pub struct DownloadRegistry {
    inner: Arc<Mutex<Registry>>,
}

/// Handle returned by [`DownloadRegistry::subscribe_progress`]; consuming it
/// removes exactly the registered callback.
pub struct Subscription {
    registry: DownloadRegistry,
    name: String,
    id: u64,
}

impl Subscription {
    pub fn unsubscribe(self) {
        let mut registry = self.registry.lock();
        if let Some(entry) = registry.entries.get_mut(&self.name) {
            entry.callbacks.retain(|(id, _)| *id != self.id);
        }
    }
}

// =============================================================================
// REGISTRY
// =============================================================================

impl DownloadRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self { inner: Arc::new(Mutex::new(Registry { entries: HashMap::new(), next_callback_id: 0 })) }
    }

    /// Run `runner` for the named download, reporting progress to all
    /// subscribers. Success forces progress to 100 and notifies; failure
    /// marks the entry done with progress untouched and rethrows.
    ///
    /// # Errors
    ///
    /// Propagates whatever error `runner` returns.
    pub async fn start_download<F, Fut, E>(&self, name: &str, runner: F) -> Result<(), E>
    where
        F: FnOnce(ProgressFn) -> Fut,
        Fut: Future<Output = Result<(), E>>,
    {
        self.ensure_entry(name);

        let report: ProgressFn = {
            let registry = self.clone();
            let name = name.to_string();
            Arc::new(move |progress| registry.record_progress(&name, progress))
        };

        match runner(report).await {
            Ok(()) => {
                self.record_progress(name, 100);
                self.mark_done(name);
                Ok(())
            }
            Err(e) => {
                self.mark_done(name);
                Err(e)
            }
        }
    }

    /// Register a progress listener for the named download, creating the
    /// entry if absent.
    pub fn subscribe_progress(&self, name: &str, callback: ProgressFn) -> Subscription {
        let mut registry = self.lock();
        let id = registry.next_callback_id;
        registry.next_callback_id += 1;
        registry
            .entries
            .entry(name.to_string())
            .or_insert_with(DownloadEntry::new)
            .callbacks
            .push((id, callback));
        Subscription { registry: self.clone(), name: name.to_string(), id }
    }

    /// Last known percentage for the named download, 0 if unknown.
    #[must_use]
    pub fn get_progress(&self, name: &str) -> u8 {
        self.lock().entries.get(name).map_or(0, |entry| entry.progress)
    }

    /// True while an entry exists and has not finished (either way).
    #[must_use]
    pub fn is_downloading(&self, name: &str) -> bool {
        self.lock().entries.get(name).is_some_and(|entry| !entry.done)
    }

    fn ensure_entry(&self, name: &str) {
        self.lock()
            .entries
            .entry(name.to_string())
            .or_insert_with(DownloadEntry::new);
    }

    fn record_progress(&self, name: &str, progress: u8) {
        // Snapshot callbacks under the lock, invoke outside it so a listener
        // may call back into the registry.
        let callbacks: Vec<ProgressFn> = {
            let mut registry = self.lock();
            let Some(entry) = registry.entries.get_mut(name) else {
                return;
            };
            entry.progress = progress;
            entry.callbacks.iter().map(|(_, cb)| cb.clone()).collect()
        };
        for callback in callbacks {
            callback(progress);
        }
    }

    fn mark_done(&self, name: &str) {
        if let Some(entry) = self.lock().entries.get_mut(name) {
            entry.done = true;
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Registry> {
        self.inner.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

impl Default for DownloadRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[path = "downloads_test.rs"]
mod tests;
