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

// Trail recording engine with an offline package manifest
//
// This crate:
// - Records a trail from a periodic location sample source
// - Aggregates distance, ascent and duration across pause/resume
// - Fans samples out to any number of cancellable subscribers
// - Persists offline region packages in an atomically written JSON manifest

pub mod broadcast;
pub mod config;
pub mod controller;
pub mod error;
pub mod geo;
pub mod model;
pub mod offline;
pub mod package;
pub mod session;
pub mod source;
pub mod storage;

// Re-export main types
pub use broadcast::{SampleBroadcast, SampleSubscription};
pub use config::{load_config, load_config_with_env, RecorderConfig};
pub use controller::{RecordingController, SourceProvider};
pub use error::{RecorderError, Result};
pub use model::{Coordinate, LocationSample, RecordingState, TrailRecording};
pub use offline::{OfflineDownloads, SyncService};
pub use package::{OfflinePackage, PackageStatus, TilesetReference};
pub use session::RecordingSession;
pub use source::{SampleSource, SourceFactory};
pub use storage::{BackendFactory, ManifestBackend, OfflineManifestStore};
