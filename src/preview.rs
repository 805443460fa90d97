//! Preview references.
//!
//! A [`PreviewHandle`] makes a picked file renderable by URL without
//! re-reading it. The bytes live in a shared [`PreviewStore`] for exactly as
//! long as some handle refers to them: dropping the last handle releases the
//! entry. Keys are derived from the file contents, so re-picking the same
//! file yields the same URL.

use std::collections::hash_map::DefaultHasher;
use std::collections::HashMap;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use axum::body::Bytes;

use crate::file::SelectedFile;

/// Route prefix under which previews are served.
pub const PREVIEW_ROUTE_PREFIX: &str = "/preview/";

struct PreviewEntry {
    content_type: String,
    bytes: Bytes,
    refs: usize,
}

#[derive(Clone, Default)]
pub struct PreviewStore {
    entries: Arc<Mutex<HashMap<String, PreviewEntry>>>,
}

impl PreviewStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, PreviewEntry>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Registers a preview for `file` and returns the handle owning it.
    pub fn create(&self, file: &SelectedFile) -> PreviewHandle {
        let key = preview_key(file);
        let mut entries = self.lock();
        entries
            .entry(key.clone())
            .and_modify(|entry| entry.refs += 1)
            .or_insert_with(|| PreviewEntry {
                content_type: file.content_type.clone(),
                bytes: file.bytes.clone(),
                refs: 1,
            });
        tracing::debug!(%key, live = entries.len(), "preview created");

        PreviewHandle {
            key,
            store: self.clone(),
        }
    }

    /// Returns the MIME type and bytes behind a live preview.
    pub fn get(&self, key: &str) -> Option<(String, Bytes)> {
        self.lock()
            .get(key)
            .map(|entry| (entry.content_type.clone(), entry.bytes.clone()))
    }

    /// Number of live preview entries.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn release(&self, key: &str) {
        let mut entries = self.lock();
        let remove = match entries.get_mut(key) {
            Some(entry) => {
                entry.refs = entry.refs.saturating_sub(1);
                entry.refs == 0
            }
            None => false,
        };
        if remove {
            entries.remove(key);
            tracing::debug!(%key, live = entries.len(), "preview released");
        }
    }
}

impl fmt::Debug for PreviewStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PreviewStore")
            .field("live", &self.len())
            .finish()
    }
}

/// Owning reference to a preview entry; releases it on drop.
pub struct PreviewHandle {
    key: String,
    store: PreviewStore,
}

impl PreviewHandle {
    pub fn key(&self) -> &str {
        &self.key
    }

    /// URL under which the web host serves this preview.
    pub fn url(&self) -> String {
        format!("{PREVIEW_ROUTE_PREFIX}{}", self.key)
    }
}

impl Drop for PreviewHandle {
    fn drop(&mut self) {
        self.store.release(&self.key);
    }
}

impl PartialEq for PreviewHandle {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key
    }
}

impl Eq for PreviewHandle {}

impl fmt::Debug for PreviewHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("PreviewHandle").field(&self.url()).finish()
    }
}

fn preview_key(file: &SelectedFile) -> String {
    let mut hasher = DefaultHasher::new();
    file.name.hash(&mut hasher);
    file.content_type.hash(&mut hasher);
    file.bytes.hash(&mut hasher);
    format!("{:016x}", hasher.finish())
}
