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

use std::path::PathBuf;
use thiserror::Error;

/// Errors surfaced by the recording engine and the manifest store
#[derive(Error, Debug)]
pub enum RecorderError {
    /// `stop()` was called with no recording in progress
    #[error("no active recording session")]
    NoActiveSession,

    #[error("manifest persistence failed: {0}")]
    PersistenceFailure(#[from] std::io::Error),

    #[error("manifest at {} is corrupt: {source}", path.display())]
    ManifestCorrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("sample source error: {0}")]
    Source(String),
}

impl RecorderError {
    /// Short machine-readable code, used in CLI output and logs
    pub fn code(&self) -> &'static str {
        match self {
            RecorderError::NoActiveSession => "NO_ACTIVE_SESSION",
            RecorderError::PersistenceFailure(_) => "PERSISTENCE_FAILURE",
            RecorderError::ManifestCorrupt { .. } => "MANIFEST_CORRUPT",
            RecorderError::Serialization(_) => "SERIALIZATION_ERROR",
            RecorderError::Source(_) => "SOURCE_ERROR",
        }
    }
}

pub type Result<T> = std::result::Result<T, RecorderError>;
