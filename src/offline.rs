// Copyright 2025 coScene
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

// Offline region packages
//
// Downloading a region records a package in the manifest and then kicks off
// a best-effort trail catalog sync in the background.

use async_trait::async_trait;
use chrono::Utc;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::config::{default_offline_root, StorageConfig};
use crate::error::Result;
use crate::package::{OfflinePackage, PackageStatus, TilesetReference};
use crate::storage::OfflineManifestStore;

pub const TILESET_VERSION: &str = "2024.10";
pub const MIN_ZOOM: u8 = 6;
pub const MAX_ZOOM: u8 = 16;
/// Reported size of a downloaded region bundle
pub const REGION_BUNDLE_BYTES: i64 = 280 * 1024 * 1024;

/// Remote trail catalog refresh
#[async_trait]
pub trait SyncService: Send + Sync {
    async fn sync_trail_catalog(&self) -> anyhow::Result<()>;
}

pub struct OfflineDownloads {
    store: Arc<OfflineManifestStore>,
    sync: Option<Arc<dyn SyncService>>,
    root: PathBuf,
}

impl OfflineDownloads {
    pub fn new(
        store: Arc<OfflineManifestStore>,
        sync: Option<Arc<dyn SyncService>>,
        root: impl Into<PathBuf>,
    ) -> Self {
        Self {
            store,
            sync,
            root: root.into(),
        }
    }

    /// Region files live next to the manifest for the filesystem backend
    pub fn from_config(
        store: Arc<OfflineManifestStore>,
        sync: Option<Arc<dyn SyncService>>,
        config: &StorageConfig,
    ) -> Self {
        let root = config
            .backend_config
            .as_filesystem()
            .map(|fs| fs.resolve_base_path())
            .unwrap_or_else(default_offline_root);
        Self::new(store, sync, root)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn store(&self) -> &Arc<OfflineManifestStore> {
        &self.store
    }

    pub fn region_path(&self, region: &str) -> PathBuf {
        self.root.join(region)
    }

    /// Record the region as downloaded and return the saved package.
    ///
    /// An existing package for the region keeps its id.
    pub async fn download(&self, region: &str) -> Result<OfflinePackage> {
        let dir = self.region_path(region);
        let path_of = |name: &str| dir.join(name).to_string_lossy().to_string();

        let mut package = OfflinePackage::new(
            region,
            TilesetReference::new(
                region,
                TILESET_VERSION,
                MIN_ZOOM..=MAX_ZOOM,
                path_of("tiles.mbtiles"),
            ),
            path_of("elevation.tiff"),
            path_of("weather.json"),
        );
        if let Some(existing) = self.store.get(region).await? {
            package.id = existing.id;
            package.gpx_files = existing.gpx_files;
        }

        let now = Utc::now();
        package.bytes = REGION_BUNDLE_BYTES;
        package.last_synced = Some(now);
        package.status = PackageStatus::Downloaded { at: now };

        self.store.save(package.clone()).await?;
        info!("Region '{}' available offline ({})", region, package.id);

        self.spawn_catalog_sync();
        Ok(package)
    }

    pub async fn remove(&self, region: &str) -> Result<()> {
        self.store.remove(region).await
    }

    /// Refresh the catalog in the background. Failures are only logged.
    fn spawn_catalog_sync(&self) -> Option<JoinHandle<()>> {
        let sync = self.sync.clone()?;
        Some(tokio::spawn(async move {
            match sync.sync_trail_catalog().await {
                Ok(()) => info!("Trail catalog synced"),
                Err(e) => warn!("Trail catalog sync failed: {:#}", e),
            }
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CorruptManifestPolicy;
    use crate::storage::MemoryBackend;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    struct CountingSync {
        calls: AtomicUsize,
        fail: bool,
    }

    #[async_trait]
    impl SyncService for CountingSync {
        async fn sync_trail_catalog(&self) -> anyhow::Result<()> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                anyhow::bail!("catalog unreachable");
            }
            Ok(())
        }
    }

    fn downloads(sync: Option<Arc<dyn SyncService>>) -> OfflineDownloads {
        let store = OfflineManifestStore::new(
            Arc::new(MemoryBackend::new()),
            CorruptManifestPolicy::Fail,
        );
        OfflineDownloads::new(Arc::new(store), sync, "/offline")
    }

    async fn wait_for_calls(sync: &CountingSync, n: usize) {
        for _ in 0..100 {
            if sync.calls.load(Ordering::SeqCst) >= n {
                return;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("sync not called {} times", n);
    }

    #[tokio::test]
    async fn test_download_builds_package() {
        let downloads = downloads(None);
        let package = downloads.download("alps").await.unwrap();

        assert_eq!(package.region, "alps");
        assert_eq!(package.tileset.version, TILESET_VERSION);
        assert_eq!(package.tileset.zoom_range(), 6..=16);
        assert!(package.tileset.tile_path.ends_with("alps/tiles.mbtiles"));
        assert!(package.elevation_data_url.ends_with("alps/elevation.tiff"));
        assert!(package.weather_cache_url.ends_with("alps/weather.json"));
        assert_eq!(package.bytes, 280 * 1024 * 1024);
        assert!(package.status.is_available_offline());
        assert!(package.last_synced.is_some());

        let stored = downloads.store().get("alps").await.unwrap().unwrap();
        assert_eq!(stored, package);
    }

    #[tokio::test]
    async fn test_redownload_keeps_id() {
        let downloads = downloads(None);
        let first = downloads.download("alps").await.unwrap();
        let second = downloads.download("alps").await.unwrap();

        assert_eq!(first.id, second.id);
        assert_eq!(downloads.store().list().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_sync_failure_does_not_fail_download() {
        let sync = Arc::new(CountingSync {
            calls: AtomicUsize::new(0),
            fail: true,
        });
        let downloads = downloads(Some(sync.clone()));

        assert!(downloads.download("alps").await.is_ok());
        wait_for_calls(&sync, 1).await;
    }

    #[tokio::test]
    async fn test_remove() {
        let sync = Arc::new(CountingSync {
            calls: AtomicUsize::new(0),
            fail: false,
        });
        let downloads = downloads(Some(sync.clone()));
        downloads.download("alps").await.unwrap();
        downloads.remove("alps").await.unwrap();
        downloads.remove("alps").await.unwrap();

        assert!(downloads.store().get("alps").await.unwrap().is_none());
        wait_for_calls(&sync, 1).await;
    }

    #[test]
    fn test_region_path() {
        let downloads = downloads(None);
        assert_eq!(downloads.region_path("alps"), PathBuf::from("/offline/alps"));
    }
}
