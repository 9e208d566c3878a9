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

// In-memory backend, for ephemeral stores and tests

use super::backend::ManifestBackend;
use crate::error::Result;
use async_trait::async_trait;
use std::path::PathBuf;
use tokio::sync::RwLock;
use tracing::warn;

#[derive(Default)]
pub struct MemoryBackend {
    document: RwLock<Option<Vec<u8>>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Backend that starts with the given committed document
    pub fn with_document(data: impl Into<Vec<u8>>) -> Self {
        Self {
            document: RwLock::new(Some(data.into())),
        }
    }
}

#[async_trait]
impl ManifestBackend for MemoryBackend {
    async fn initialize(&self) -> Result<()> {
        Ok(())
    }

    async fn read_manifest(&self) -> Result<Option<Vec<u8>>> {
        Ok(self.document.read().await.clone())
    }

    async fn commit_manifest(&self, data: &[u8]) -> Result<()> {
        *self.document.write().await = Some(data.to_vec());
        Ok(())
    }

    async fn quarantine_manifest(&self) -> Result<Option<PathBuf>> {
        warn!("Discarding in-memory manifest");
        *self.document.write().await = None;
        Ok(None)
    }

    async fn health_check(&self) -> Result<bool> {
        Ok(true)
    }

    fn manifest_path(&self) -> PathBuf {
        PathBuf::from("memory://manifest.json")
    }

    fn backend_type(&self) -> &str {
        "memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_commit_and_read() {
        let backend = MemoryBackend::new();
        assert!(backend.read_manifest().await.unwrap().is_none());

        backend.commit_manifest(b"[]").await.unwrap();
        assert_eq!(backend.read_manifest().await.unwrap().unwrap(), b"[]");
    }

    #[tokio::test]
    async fn test_quarantine_clears_document() {
        let backend = MemoryBackend::with_document("garbage");
        assert_eq!(backend.quarantine_manifest().await.unwrap(), None);
        assert!(backend.read_manifest().await.unwrap().is_none());
    }
}
