//! Locally generated previews of staged uploads.
//!
//! When a file is staged, the presentation layer needs something it can
//! render before the upload exists anywhere. A [`PreviewStore`] hands out an
//! opaque [`PreviewRef`] for the staged bytes and releases it again when the
//! staging entry is removed, cancelled, or committed. Release is idempotent:
//! the session may release a reference it already released without error, so
//! no teardown path has to track what was freed before it.

use std::collections::HashSet;
use std::sync::Mutex;

/// Opaque handle to a locally generated preview.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PreviewRef(String);

impl PreviewRef {
    /// Returns the reference as a string, suitable for use as an image
    /// source by the presentation layer.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Creates and releases preview references for staged upload bytes.
pub trait PreviewStore: Send + Sync {
    /// Creates a preview reference for the given payload.
    fn create(&self, bytes: &[u8], content_type: &str) -> PreviewRef;

    /// Releases a reference. Releasing an unknown or already-released
    /// reference is a no-op.
    fn release(&self, preview: &PreviewRef);
}

/// In-memory preview store.
///
/// Tracks live references so tests (and debug assertions) can verify that
/// every staged preview is eventually released.
#[derive(Debug, Default)]
pub struct MemoryPreviewStore {
    live: Mutex<HashSet<PreviewRef>>,
}

impl MemoryPreviewStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of references created but not yet released.
    pub fn live_count(&self) -> usize {
        self.live.lock().expect("preview store lock poisoned").len()
    }
}

impl PreviewStore for MemoryPreviewStore {
    fn create(&self, bytes: &[u8], content_type: &str) -> PreviewRef {
        let preview = PreviewRef(format!(
            "preview://{}/{}/{}",
            content_type.replace('/', "."),
            bytes.len(),
            uuid::Uuid::new_v4().simple()
        ));
        self.live
            .lock()
            .expect("preview store lock poisoned")
            .insert(preview.clone());
        preview
    }

    fn release(&self, preview: &PreviewRef) {
        self.live
            .lock()
            .expect("preview store lock poisoned")
            .remove(preview);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_then_release_leaves_nothing_live() {
        let store = MemoryPreviewStore::new();
        let preview = store.create(b"jpegbytes", "image/jpeg");
        assert_eq!(store.live_count(), 1);

        store.release(&preview);
        assert_eq!(store.live_count(), 0);
    }

    #[test]
    fn release_is_idempotent() {
        let store = MemoryPreviewStore::new();
        let preview = store.create(b"x", "image/png");

        store.release(&preview);
        store.release(&preview);
        assert_eq!(store.live_count(), 0);
    }

    #[test]
    fn references_are_distinct_for_identical_payloads() {
        let store = MemoryPreviewStore::new();
        let a = store.create(b"same", "image/png");
        let b = store.create(b"same", "image/png");
        assert_ne!(a, b);
        assert_eq!(store.live_count(), 2);
    }
}
