//! Scoped preview handles for converted images
//!
//! A [`PreviewHandle`] registers a displayable rendering of a record's output
//! in a [`PreviewRegistry`] and unregisters it when dropped. Records own
//! their handle exclusively, so removing a record, clearing the batch or
//! dropping the converter always releases the rendering; no explicit
//! revocation call exists or is needed.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use crate::types::OutputFormat;

const URL_SCHEME: &str = "preview://";

/// A live preview rendering
#[derive(Clone, Debug)]
pub struct Preview {
    /// Media type of `bytes`
    pub media_type: &'static str,
    /// Displayable image bytes
    pub bytes: Arc<[u8]>,
}

#[derive(Default)]
struct RegistryInner {
    entries: Mutex<HashMap<u64, Preview>>,
    next_key: AtomicU64,
}

impl RegistryInner {
    fn entries(&self) -> MutexGuard<'_, HashMap<u64, Preview>> {
        // A panic while holding the lock cannot leave the map half-updated
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Registry of live preview renderings, addressed by URL
///
/// Cloning is cheap; clones share the same registry.
#[derive(Clone, Default)]
pub struct PreviewRegistry {
    inner: Arc<RegistryInner>,
}

impl PreviewRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a rendering and return the handle that owns it
    pub fn register(&self, bytes: Arc<[u8]>, format: OutputFormat) -> PreviewHandle {
        let key = self.inner.next_key.fetch_add(1, Ordering::Relaxed);
        self.inner.entries().insert(
            key,
            Preview {
                media_type: format.mime_type(),
                bytes,
            },
        );

        tracing::trace!(preview_key = key, "Preview registered");

        PreviewHandle {
            key,
            url: format!("{}{}", URL_SCHEME, key),
            registry: Arc::downgrade(&self.inner),
        }
    }

    /// Look up a rendering by URL; `None` once its handle has been dropped
    pub fn resolve(&self, url: &str) -> Option<Preview> {
        let key: u64 = url.strip_prefix(URL_SCHEME)?.parse().ok()?;
        self.inner.entries().get(&key).cloned()
    }

    /// Number of renderings currently registered
    pub fn live_count(&self) -> usize {
        self.inner.entries().len()
    }
}

impl std::fmt::Debug for PreviewRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PreviewRegistry")
            .field("live", &self.live_count())
            .finish()
    }
}

/// Exclusive owner of one registered rendering
///
/// Not `Clone`: exactly one handle exists per rendering, and dropping it
/// releases the rendering.
#[derive(Debug)]
pub struct PreviewHandle {
    key: u64,
    url: String,
    registry: Weak<RegistryInner>,
}

impl PreviewHandle {
    /// URL resolvable through [`PreviewRegistry::resolve`]
    pub fn url(&self) -> &str {
        &self.url
    }
}

impl Drop for PreviewHandle {
    fn drop(&mut self) {
        if let Some(inner) = self.registry.upgrade() {
            inner.entries().remove(&self.key);
            tracing::trace!(preview_key = self.key, "Preview released");
        }
    }
}
