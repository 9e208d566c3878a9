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

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::ops::RangeInclusive;
use uuid::Uuid;

/// Download state of an offline package
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
#[serde(tag = "state", rename_all = "camelCase")]
pub enum PackageStatus {
    #[default]
    NotDownloaded,
    Downloading { progress: f64 },
    Downloaded { at: DateTime<Utc> },
    Outdated,
}

impl PackageStatus {
    /// Downloading status with progress clamped to `0.0..=1.0`
    pub fn downloading(progress: f64) -> Self {
        let progress = if progress.is_nan() {
            0.0
        } else {
            progress.clamp(0.0, 1.0)
        };
        PackageStatus::Downloading { progress }
    }

    pub fn is_available_offline(&self) -> bool {
        matches!(self, PackageStatus::Downloaded { .. })
    }
}

/// Versioned, zoom-bounded set of map tiles for a region
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TilesetReference {
    pub region_identifier: String,
    pub version: String,
    pub zoom_lower: u8,
    pub zoom_upper: u8,
    pub tile_path: String,
}

impl TilesetReference {
    pub fn new(
        region_identifier: impl Into<String>,
        version: impl Into<String>,
        zoom_range: RangeInclusive<u8>,
        tile_path: impl Into<String>,
    ) -> Self {
        Self {
            region_identifier: region_identifier.into(),
            version: version.into(),
            zoom_lower: *zoom_range.start(),
            zoom_upper: *zoom_range.end(),
            tile_path: tile_path.into(),
        }
    }

    pub fn zoom_range(&self) -> RangeInclusive<u8> {
        self.zoom_lower..=self.zoom_upper
    }
}

/// One downloadable region bundle
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct OfflinePackage {
    pub id: Uuid,
    pub region: String,
    pub tileset: TilesetReference,
    #[serde(rename = "elevationDataURL")]
    pub elevation_data_url: String,
    #[serde(rename = "weatherCacheURL")]
    pub weather_cache_url: String,
    #[serde(default)]
    pub gpx_files: Vec<String>,
    #[serde(default)]
    pub last_synced: Option<DateTime<Utc>>,
    pub bytes: i64,
    #[serde(default)]
    pub status: PackageStatus,
}

impl OfflinePackage {
    pub fn new(
        region: impl Into<String>,
        tileset: TilesetReference,
        elevation_data_url: impl Into<String>,
        weather_cache_url: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            region: region.into(),
            tileset,
            elevation_data_url: elevation_data_url.into(),
            weather_cache_url: weather_cache_url.into(),
            gpx_files: Vec::new(),
            last_synced: None,
            bytes: 0,
            status: PackageStatus::NotDownloaded,
        }
    }
}
