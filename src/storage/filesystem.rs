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

// Filesystem backend implementation

use super::backend::ManifestBackend;
use crate::config::FilesystemConfig;
use crate::error::Result;
use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, warn};

/// Keeps the manifest as one JSON file, replaced by write-then-rename
pub struct FilesystemBackend {
    base_path: PathBuf,
    manifest_path: PathBuf,
    temp_path: PathBuf,
}

impl FilesystemBackend {
    pub fn new(config: FilesystemConfig) -> Self {
        let base_path = config.resolve_base_path();
        let manifest_path = base_path.join(&config.manifest_file);
        let temp_path = base_path.join(format!("{}.tmp", config.manifest_file));

        info!(
            "Initializing filesystem manifest backend at: {}",
            manifest_path.display()
        );

        Self {
            base_path,
            manifest_path,
            temp_path,
        }
    }

    /// Backend rooted at `base_path` with the default manifest file name
    pub fn at<P: AsRef<Path>>(base_path: P) -> Self {
        Self::new(FilesystemConfig {
            base_path: base_path.as_ref().to_string_lossy().to_string(),
            ..Default::default()
        })
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    pub fn temp_path(&self) -> &Path {
        &self.temp_path
    }

    /// Write and fsync the staging file without publishing it.
    ///
    /// A crash after this returns leaves the committed manifest untouched.
    pub async fn write_staged(&self, data: &[u8]) -> Result<()> {
        debug!(
            "Writing {} bytes to {}",
            data.len(),
            self.temp_path.display()
        );

        let mut file = fs::File::create(&self.temp_path).await?;
        file.write_all(data).await?;
        file.flush().await?;
        file.sync_all().await?;
        Ok(())
    }

    /// Atomically publish the staging file as the manifest
    async fn publish_staged(&self) -> Result<()> {
        fs::rename(&self.temp_path, &self.manifest_path).await?;
        self.sync_base_directory().await;
        Ok(())
    }

    // Persist the rename itself; best effort, not every platform can open
    // a directory for syncing.
    async fn sync_base_directory(&self) {
        if !cfg!(unix) {
            return;
        }
        match fs::File::open(&self.base_path).await {
            Ok(dir) => {
                if let Err(e) = dir.sync_all().await {
                    debug!("Directory sync failed for {}: {}", self.base_path.display(), e);
                }
            }
            Err(e) => debug!("Cannot open {} for sync: {}", self.base_path.display(), e),
        }
    }
}

#[async_trait]
impl ManifestBackend for FilesystemBackend {
    async fn initialize(&self) -> Result<()> {
        if !self.base_path.exists() {
            info!("Creating base directory: {}", self.base_path.display());
            fs::create_dir_all(&self.base_path).await?;
        } else {
            debug!(
                "Base directory already exists: {}",
                self.base_path.display()
            );
        }
        Ok(())
    }

    async fn read_manifest(&self) -> Result<Option<Vec<u8>>> {
        match fs::read(&self.manifest_path).await {
            Ok(data) => Ok(Some(data)),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("No manifest at {}", self.manifest_path.display());
                Ok(None)
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn commit_manifest(&self, data: &[u8]) -> Result<()> {
        self.write_staged(data).await?;
        self.publish_staged().await?;

        info!(
            "Committed manifest ({} bytes) to {}",
            data.len(),
            self.manifest_path.display()
        );
        Ok(())
    }

    async fn quarantine_manifest(&self) -> Result<Option<PathBuf>> {
        let target = self.base_path.join(format!(
            "{}.corrupt-{}",
            self.manifest_path
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_default(),
            chrono::Utc::now().timestamp()
        ));

        match fs::rename(&self.manifest_path, &target).await {
            Ok(()) => {
                warn!("Moved corrupt manifest to {}", target.display());
                Ok(Some(target))
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn health_check(&self) -> Result<bool> {
        // Check if base directory is accessible and writable
        match fs::metadata(&self.base_path).await {
            Ok(metadata) if metadata.is_dir() => {
                let test_file = self.base_path.join(".health_check_test");
                match fs::File::create(&test_file).await {
                    Ok(mut f) => {
                        if let Err(e) = f.write_all(b"test").await {
                            warn!("Health check failed - cannot write: {}", e);
                            return Ok(false);
                        }
                        let _ = fs::remove_file(&test_file).await;
                        Ok(true)
                    }
                    Err(e) => {
                        warn!("Health check failed - cannot create file: {}", e);
                        Ok(false)
                    }
                }
            }
            Ok(_) => {
                warn!(
                    "Health check failed - base path is not a directory: {}",
                    self.base_path.display()
                );
                Ok(false)
            }
            Err(e) => {
                warn!(
                    "Health check failed - cannot access base path {}: {}",
                    self.base_path.display(),
                    e
                );
                Ok(false)
            }
        }
    }

    fn manifest_path(&self) -> PathBuf {
        self.manifest_path.clone()
    }

    fn backend_type(&self) -> &str {
        "filesystem"
    }
}
