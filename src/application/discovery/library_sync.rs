//! 曲库同步
//!
//! 从曲库管理器拉取艺术家列表，整体替换进程级快照

use std::sync::Arc;
use std::time::Instant;

use crate::application::ports::{LibraryCachePort, LibraryClientPort};
use crate::domain::discovery::{DiscoveryError, LibrarySnapshot};

pub struct LibrarySync {
    client: Arc<dyn LibraryClientPort>,
    cache: Arc<dyn LibraryCachePort>,
}

impl LibrarySync {
    pub fn new(client: Arc<dyn LibraryClientPort>, cache: Arc<dyn LibraryCachePort>) -> Self {
        Self { client, cache }
    }

    pub fn snapshot(&self) -> Arc<LibrarySnapshot> {
        self.cache.snapshot()
    }

    pub fn client(&self) -> &Arc<dyn LibraryClientPort> {
        &self.client
    }

    /// 刷新曲库，失败时保留旧快照
    pub async fn refresh(&self) -> Result<Arc<LibrarySnapshot>, DiscoveryError> {
        let start = Instant::now();
        let names = self.client.list_artists().await.map_err(|e| {
            tracing::error!(error = %e, "Failed to list library artists");
            DiscoveryError::LibraryUnavailable(e.to_string())
        })?;

        self.cache.replace(LibrarySnapshot::new(names));
        let snapshot = self.cache.snapshot();
        tracing::info!(
            artists = snapshot.len(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Library refreshed"
        );
        Ok(snapshot)
    }

    /// 快照为空时先刷新一次
    pub async fn ensure_loaded(&self) -> Result<Arc<LibrarySnapshot>, DiscoveryError> {
        let snapshot = self.cache.snapshot();
        if !snapshot.is_empty() {
            return Ok(snapshot);
        }
        self.refresh().await
    }

    /// 同 `ensure_loaded`，失败时退回当前（可能为空的）快照
    pub async fn best_effort(&self) -> Arc<LibrarySnapshot> {
        match self.ensure_loaded().await {
            Ok(snapshot) => snapshot,
            Err(e) => {
                tracing::warn!(error = %e, "Continuing without a fresh library snapshot");
                self.cache.snapshot()
            }
        }
    }

    pub fn insert_artist(&self, name: &str) {
        self.cache.insert_artist(name);
    }
}
