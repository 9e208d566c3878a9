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

// Offline package manifest store

use super::backend::ManifestBackend;
use super::factory::BackendFactory;
use crate::config::{CorruptManifestPolicy, StorageConfig};
use crate::error::{RecorderError, Result};
use crate::package::OfflinePackage;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, error, info};

/// Durable list of offline packages, at most one per region.
///
/// The cache is the single owner of the package list; every mutation
/// rewrites the whole manifest through the backend and only then replaces
/// the cache, so a failed commit leaves both unchanged.
pub struct OfflineManifestStore {
    backend: Arc<dyn ManifestBackend>,
    cache: Mutex<Vec<OfflinePackage>>,
    on_corrupt: CorruptManifestPolicy,
}

impl OfflineManifestStore {
    pub fn new(backend: Arc<dyn ManifestBackend>, on_corrupt: CorruptManifestPolicy) -> Self {
        Self {
            backend,
            cache: Mutex::new(Vec::new()),
            on_corrupt,
        }
    }

    pub fn from_config(config: &StorageConfig) -> anyhow::Result<Self> {
        let backend = BackendFactory::create(config)?;
        Ok(Self::new(backend, config.on_corrupt))
    }

    pub fn backend(&self) -> &Arc<dyn ManifestBackend> {
        &self.backend
    }

    /// Ensure the backing location exists. Loading stays lazy.
    pub async fn prepare(&self) -> Result<()> {
        self.backend.initialize().await
    }

    /// All packages, loading the manifest when the cache is empty
    pub async fn list(&self) -> Result<Vec<OfflinePackage>> {
        let mut cache = self.cache.lock().await;
        self.fill(&mut cache).await?;
        Ok(cache.clone())
    }

    pub async fn get(&self, region: &str) -> Result<Option<OfflinePackage>> {
        Ok(self.list().await?.into_iter().find(|p| p.region == region))
    }

    /// Insert or replace by id, then commit.
    ///
    /// Another package already holding the same region is replaced as well.
    pub async fn save(&self, package: OfflinePackage) -> Result<()> {
        let mut cache = self.cache.lock().await;
        self.fill(&mut cache).await?;

        let mut next: Vec<OfflinePackage> = cache
            .iter()
            .filter(|p| p.id == package.id || p.region != package.region)
            .cloned()
            .collect();

        match next.iter_mut().find(|p| p.id == package.id) {
            Some(existing) => *existing = package.clone(),
            None => next.push(package.clone()),
        }

        self.persist(&next).await?;
        *cache = next;

        info!("Saved offline package {} for region '{}'", package.id, package.region);
        Ok(())
    }

    /// Remove every package for the region, then commit
    pub async fn remove(&self, region: &str) -> Result<()> {
        let mut cache = self.cache.lock().await;
        self.fill(&mut cache).await?;

        if !cache.iter().any(|p| p.region == region) {
            debug!("No offline package for region '{}'", region);
            return Ok(());
        }

        let next: Vec<OfflinePackage> = cache
            .iter()
            .filter(|p| p.region != region)
            .cloned()
            .collect();

        self.persist(&next).await?;
        *cache = next;

        info!("Removed offline package for region '{}'", region);
        Ok(())
    }

    async fn fill(&self, cache: &mut Vec<OfflinePackage>) -> Result<()> {
        if cache.is_empty() {
            *cache = self.load().await?;
        }
        Ok(())
    }

    async fn load(&self) -> Result<Vec<OfflinePackage>> {
        let Some(data) = self.backend.read_manifest().await? else {
            return Ok(Vec::new());
        };

        match serde_json::from_slice::<Vec<OfflinePackage>>(&data) {
            Ok(packages) => {
                debug!(
                    "Loaded {} offline packages from {}",
                    packages.len(),
                    self.backend.manifest_path().display()
                );
                Ok(packages)
            }
            Err(source) => match self.on_corrupt {
                CorruptManifestPolicy::Fail => {
                    error!(
                        "Manifest at {} is corrupt: {}",
                        self.backend.manifest_path().display(),
                        source
                    );
                    Err(RecorderError::ManifestCorrupt {
                        path: self.backend.manifest_path(),
                        source,
                    })
                }
                CorruptManifestPolicy::Discard => {
                    error!(
                        "Manifest at {} is corrupt ({}), starting empty",
                        self.backend.manifest_path().display(),
                        source
                    );
                    self.backend.quarantine_manifest().await?;
                    Ok(Vec::new())
                }
            },
        }
    }

    async fn persist(&self, packages: &[OfflinePackage]) -> Result<()> {
        let data = serde_json::to_vec_pretty(packages)?;
        self.backend.commit_manifest(&data).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::package::{PackageStatus, TilesetReference};
    use crate::storage::MemoryBackend;

    fn package(region: &str) -> OfflinePackage {
        OfflinePackage::new(
            region,
            TilesetReference::new(region, "2024.10", 6..=16, format!("/offline/{}/tiles.mbtiles", region)),
            format!("/offline/{}/elevation.tiff", region),
            format!("/offline/{}/weather.json", region),
        )
    }

    fn memory_store() -> (OfflineManifestStore, Arc<MemoryBackend>) {
        let backend = Arc::new(MemoryBackend::new());
        let store = OfflineManifestStore::new(backend.clone(), CorruptManifestPolicy::Fail);
        (store, backend)
    }

    #[tokio::test]
    async fn test_empty_store() {
        let (store, _) = memory_store();
        store.prepare().await.unwrap();
        assert!(store.list().await.unwrap().is_empty());
        assert!(store.get("alps").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_save_is_upsert_by_id() {
        let (store, backend) = memory_store();
        let mut pkg = package("alps");
        store.save(pkg.clone()).await.unwrap();

        pkg.status = PackageStatus::downloading(0.5);
        pkg.bytes = 1024;
        store.save(pkg.clone()).await.unwrap();

        let reloaded = OfflineManifestStore::new(backend, CorruptManifestPolicy::Fail);
        let packages = reloaded.list().await.unwrap();
        assert_eq!(packages.len(), 1);
        assert_eq!(packages[0], pkg);
    }

    #[tokio::test]
    async fn test_save_replaces_same_region_with_new_id() {
        let (store, _) = memory_store();
        store.save(package("alps")).await.unwrap();
        let replacement = package("alps");
        store.save(replacement.clone()).await.unwrap();

        let packages = store.list().await.unwrap();
        assert_eq!(packages.len(), 1);
        assert_eq!(packages[0].id, replacement.id);
    }

    #[tokio::test]
    async fn test_save_loads_existing_manifest_first() {
        let (store, backend) = memory_store();
        store.save(package("alps")).await.unwrap();

        let fresh = OfflineManifestStore::new(backend, CorruptManifestPolicy::Fail);
        fresh.save(package("dolomites")).await.unwrap();

        let regions: Vec<_> = fresh.list().await.unwrap().into_iter().map(|p| p.region).collect();
        assert_eq!(regions, vec!["alps", "dolomites"]);
    }

    #[tokio::test]
    async fn test_remove_unknown_region_is_noop() {
        let (store, backend) = memory_store();
        store.save(package("alps")).await.unwrap();
        let before = backend.read_manifest().await.unwrap();

        store.remove("pyrenees").await.unwrap();

        assert_eq!(backend.read_manifest().await.unwrap(), before);
        assert_eq!(store.list().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_remove_region() {
        let (store, _) = memory_store();
        store.save(package("alps")).await.unwrap();
        store.save(package("dolomites")).await.unwrap();

        store.remove("alps").await.unwrap();

        let packages = store.list().await.unwrap();
        assert_eq!(packages.len(), 1);
        assert_eq!(packages[0].region, "dolomites");
    }

    #[tokio::test]
    async fn test_corrupt_manifest_fails() {
        let backend = Arc::new(MemoryBackend::with_document("[{\"id\":"));
        let store = OfflineManifestStore::new(backend, CorruptManifestPolicy::Fail);

        let err = store.list().await.unwrap_err();
        assert!(matches!(err, RecorderError::ManifestCorrupt { .. }));
        assert_eq!(err.code(), "MANIFEST_CORRUPT");
    }

    #[tokio::test]
    async fn test_corrupt_manifest_discarded() {
        let backend = Arc::new(MemoryBackend::with_document("not json"));
        let store = OfflineManifestStore::new(backend.clone(), CorruptManifestPolicy::Discard);

        assert!(store.list().await.unwrap().is_empty());
        assert!(backend.read_manifest().await.unwrap().is_none());

        store.save(package("alps")).await.unwrap();
        assert_eq!(store.list().await.unwrap().len(), 1);
    }
}
