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

// Storage backend trait for the package manifest

use async_trait::async_trait;
use std::path::PathBuf;

use crate::error::Result;

/// Durable home of the manifest document
///
/// Implementations must make `commit_manifest` atomic: a reader sees either
/// the previous document or the new one, never a mix or a truncation.
#[async_trait]
pub trait ManifestBackend: Send + Sync {
    /// Prepare the backend (create directories if needed). Does not load.
    async fn initialize(&self) -> Result<()>;

    /// Raw committed manifest, or `None` if nothing was ever committed
    async fn read_manifest(&self) -> Result<Option<Vec<u8>>>;

    /// Atomically replace the committed manifest
    async fn commit_manifest(&self, data: &[u8]) -> Result<()>;

    /// Move an unreadable manifest out of the way.
    ///
    /// Returns where it was moved, if the backend keeps it.
    async fn quarantine_manifest(&self) -> Result<Option<PathBuf>>;

    /// Health check
    async fn health_check(&self) -> Result<bool>;

    /// Location of the manifest, for logs and errors
    fn manifest_path(&self) -> PathBuf;

    /// Get backend type identifier
    fn backend_type(&self) -> &str;
}
