//! In-Memory Library Cache Implementation
//!
//! 进程级曲库快照，读者拿到的是 `Arc` 克隆，替换时不阻塞正在使用旧快照的读者

use std::sync::{Arc, RwLock};

use crate::application::ports::LibraryCachePort;
use crate::domain::discovery::LibrarySnapshot;

/// 内存曲库缓存
pub struct InMemoryLibraryCache {
    snapshot: RwLock<Arc<LibrarySnapshot>>,
}

impl InMemoryLibraryCache {
    pub fn new() -> Self {
        Self {
            snapshot: RwLock::new(Arc::new(LibrarySnapshot::default())),
        }
    }

    pub fn arc(self) -> Arc<Self> {
        Arc::new(self)
    }

    fn swap(&self, next: LibrarySnapshot) {
        let mut guard = self
            .snapshot
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        *guard = Arc::new(next);
    }
}

impl Default for InMemoryLibraryCache {
    fn default() -> Self {
        Self::new()
    }
}

impl LibraryCachePort for InMemoryLibraryCache {
    fn snapshot(&self) -> Arc<LibrarySnapshot> {
        self.snapshot
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    fn replace(&self, snapshot: LibrarySnapshot) {
        let count = snapshot.len();
        self.swap(snapshot);
        tracing::debug!(artist_count = count, "Library snapshot replaced");
    }

    fn insert_artist(&self, name: &str) {
        let mut guard = self
            .snapshot
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if guard.contains(name) {
            return;
        }
        *guard = Arc::new(guard.with_artist(name));
        tracing::debug!(artist = %name, "Artist inserted into library snapshot");
    }
}
