/// Revocable preview references
///
/// A `PreviewRef` lets the UI show a thumbnail and lets the measurement
/// routine reach the file content without holding either forever. Once
/// revoked, a reference never resolves again.
use iced::widget::image::Handle;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tracing::debug;

use super::data::{FileSource, SelectedFile};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PreviewRef(u64);

impl PreviewRef {
    pub fn id(&self) -> u64 {
        self.0
    }
}

struct Entry {
    source: FileSource,
    handle: Handle,
}

/// Issues and tracks preview references. Cheap to clone, shared with tasks.
#[derive(Clone, Default)]
pub struct PreviewRegistry {
    entries: Arc<Mutex<HashMap<u64, Entry>>>,
    next_id: Arc<AtomicU64>,
}

impl PreviewRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<u64, Entry>> {
        // A panic while holding the lock leaves the map itself intact
        self.entries.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn insert(&self, source: FileSource) -> PreviewRef {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed) + 1;
        let handle = match &source {
            FileSource::Disk(path) => Handle::from_path(path),
            FileSource::Memory(bytes) => Handle::from_bytes(bytes.to_vec()),
        };
        self.lock().insert(id, Entry { source, handle });
        PreviewRef(id)
    }

    /// Issue a reference to a selected file
    pub fn create(&self, file: &SelectedFile) -> PreviewRef {
        self.insert(file.source.clone())
    }

    /// Issue a reference to bytes held in memory (e.g. read back from the cache)
    pub fn create_from_bytes(&self, bytes: Arc<[u8]>) -> PreviewRef {
        self.insert(FileSource::Memory(bytes))
    }

    pub fn resolve(&self, preview: PreviewRef) -> Option<FileSource> {
        self.lock().get(&preview.0).map(|entry| entry.source.clone())
    }

    /// Thumbnail handle for the UI
    pub fn handle(&self, preview: PreviewRef) -> Option<Handle> {
        self.lock().get(&preview.0).map(|entry| entry.handle.clone())
    }

    /// Invalidate a reference. Revoking twice is a no-op.
    pub fn revoke(&self, preview: PreviewRef) {
        if self.lock().remove(&preview.0).is_some() {
            debug!("🗑️  Revoked preview {}", preview.0);
        }
    }

    pub fn revoke_all<'a>(&self, previews: impl IntoIterator<Item = &'a PreviewRef>) {
        let mut entries = self.lock();
        for preview in previews {
            entries.remove(&preview.0);
        }
    }

    /// Revoke after a grace period, so consumers still in flight can finish.
    /// Without a tokio runtime the reference is revoked right away.
    pub fn release_after(&self, preview: PreviewRef, grace: Duration) {
        match tokio::runtime::Handle::try_current() {
            Ok(runtime) => {
                let registry = self.clone();
                runtime.spawn(async move {
                    tokio::time::sleep(grace).await;
                    registry.revoke(preview);
                });
            }
            Err(_) => self.revoke(preview),
        }
    }

    /// Number of live references
    pub fn live_count(&self) -> usize {
        self.lock().len()
    }
}

impl std::fmt::Debug for PreviewRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PreviewRegistry")
            .field("live", &self.live_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_revoked_reference_does_not_resolve() {
        let registry = PreviewRegistry::new();
        let file = SelectedFile::from_bytes("a.png", vec![1u8, 2, 3]);
        let preview = registry.create(&file);

        let bytes = registry.resolve(preview).unwrap().read().await.unwrap();
        assert_eq!(&bytes[..], &[1, 2, 3]);
        assert!(registry.handle(preview).is_some());

        registry.revoke(preview);
        assert!(registry.resolve(preview).is_none());
        assert!(registry.handle(preview).is_none());
        registry.revoke(preview);
    }

    #[test]
    fn test_ids_are_never_reused() {
        let registry = PreviewRegistry::new();
        let first = registry.create_from_bytes(Arc::from(&b"x"[..]));
        registry.revoke(first);
        let second = registry.create_from_bytes(Arc::from(&b"y"[..]));
        assert_ne!(first, second);
        assert!(registry.resolve(first).is_none());
    }

    #[test]
    fn test_release_without_runtime_is_immediate() {
        let registry = PreviewRegistry::new();
        let preview = registry.create_from_bytes(Arc::from(&b"x"[..]));
        registry.release_after(preview, Duration::from_secs(30));
        assert!(registry.resolve(preview).is_none());
    }

    #[tokio::test]
    async fn test_release_after_grace_period() {
        let registry = PreviewRegistry::new();
        let preview = registry.create_from_bytes(Arc::from(&b"x"[..]));
        registry.release_after(preview, Duration::from_millis(20));

        assert!(registry.resolve(preview).is_some());
        tokio::time::sleep(Duration::from_millis(200)).await;
        assert!(registry.resolve(preview).is_none());
    }
}
