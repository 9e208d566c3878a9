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
use std::fmt;
use uuid::Uuid;

use crate::geo;

/// Recording lifecycle state
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum RecordingState {
    #[default]
    Idle,
    Recording,
    Paused,
    Completed,
}

impl RecordingState {
    /// True while a recording exists and has not been stopped
    pub fn is_active(self) -> bool {
        matches!(self, RecordingState::Recording | RecordingState::Paused)
    }
}

impl fmt::Display for RecordingState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RecordingState::Idle => "idle",
            RecordingState::Recording => "recording",
            RecordingState::Paused => "paused",
            RecordingState::Completed => "completed",
        };
        f.write_str(name)
    }
}

/// WGS84 position in decimal degrees
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Coordinate {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinate {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Great-circle distance in meters
    pub fn distance_to(&self, other: &Coordinate) -> f64 {
        geo::great_circle_distance(self, other)
    }
}

/// One positional fix
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LocationSample {
    pub id: Uuid,
    #[serde(flatten)]
    pub coordinate: Coordinate,
    #[serde(rename = "altitudeMeters")]
    pub altitude: f64,
    pub timestamp: DateTime<Utc>,
    pub horizontal_accuracy: f64,
    pub vertical_accuracy: f64,
}

impl LocationSample {
    pub fn new(
        coordinate: Coordinate,
        altitude: f64,
        timestamp: DateTime<Utc>,
        horizontal_accuracy: f64,
        vertical_accuracy: f64,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            coordinate,
            altitude,
            timestamp,
            horizontal_accuracy,
            vertical_accuracy,
        }
    }
}

/// One recorded hike
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TrailRecording {
    pub id: Uuid,
    #[serde(rename = "trailID")]
    pub trail_id: Option<String>,
    pub started_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Meters
    #[serde(rename = "totalDistanceMeters")]
    pub total_distance: f64,
    /// Meters
    #[serde(rename = "totalAscentMeters")]
    pub total_ascent: f64,
    /// Seconds spent in the recording state
    #[serde(rename = "durationSeconds")]
    pub duration: f64,
    pub samples: Vec<LocationSample>,
    #[serde(default)]
    pub notes: Option<String>,
    pub state: RecordingState,
}

impl TrailRecording {
    /// Fresh recording with zeroed accumulators, stamped now
    pub fn new(trail_id: Option<String>, state: RecordingState) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            trail_id,
            started_at: now,
            updated_at: now,
            total_distance: 0.0,
            total_ascent: 0.0,
            duration: 0.0,
            samples: Vec::new(),
            notes: None,
            state,
        }
    }

    pub fn last_sample(&self) -> Option<&LocationSample> {
        self.samples.last()
    }

    /// Average moving speed in meters per second, if any time was recorded
    pub fn average_speed(&self) -> Option<f64> {
        (self.duration > 0.0).then(|| self.total_distance / self.duration)
    }
}
