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

// Replays a previously captured track

use super::SampleSource;
use crate::error::Result;
use crate::model::{LocationSample, TrailRecording};
use anyhow::Context;
use async_trait::async_trait;
use chrono::Utc;
use std::collections::VecDeque;
use std::path::Path;
use tracing::info;

pub struct ReplaySource {
    samples: VecDeque<LocationSample>,
    restamp: bool,
}

impl ReplaySource {
    /// Replay the given samples in order, keeping their timestamps
    pub fn new(samples: Vec<LocationSample>) -> Self {
        Self {
            samples: samples.into(),
            restamp: false,
        }
    }

    /// Stamp every replayed sample with the time it is produced
    pub fn restamped(mut self) -> Self {
        self.restamp = true;
        self
    }

    /// Load a track from disk.
    ///
    /// Accepts either a JSON array of samples or a completed recording
    /// written by `record --output`.
    pub fn from_path<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read replay track {}", path.display()))?;

        let samples = match serde_json::from_str::<Vec<LocationSample>>(&content) {
            Ok(samples) => samples,
            Err(_) => {
                serde_json::from_str::<TrailRecording>(&content)
                    .with_context(|| format!("Failed to parse replay track {}", path.display()))?
                    .samples
            }
        };

        info!(
            "Loaded {} samples for replay from {}",
            samples.len(),
            path.display()
        );
        Ok(Self::new(samples).restamped())
    }

    pub fn remaining(&self) -> usize {
        self.samples.len()
    }
}

#[async_trait]
impl SampleSource for ReplaySource {
    async fn next_sample(&mut self) -> Result<Option<LocationSample>> {
        Ok(self.samples.pop_front().map(|mut sample| {
            if self.restamp {
                sample.timestamp = Utc::now();
            }
            sample
        }))
    }

    fn source_type(&self) -> &str {
        "replay"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Coordinate, RecordingState};
    use tempfile::TempDir;

    fn track(n: usize) -> Vec<LocationSample> {
        (0..n)
            .map(|i| {
                LocationSample::new(
                    Coordinate::new(46.0 + i as f64 * 0.001, 7.0),
                    1500.0 + i as f64,
                    Utc::now(),
                    4.0,
                    6.0,
                )
            })
            .collect()
    }

    #[tokio::test]
    async fn test_replays_in_order() {
        let samples = track(3);
        let mut source = ReplaySource::new(samples.clone());

        for expected in &samples {
            let got = source.next_sample().await.unwrap().unwrap();
            assert_eq!(got.id, expected.id);
            assert_eq!(got.timestamp, expected.timestamp);
        }
        assert!(source.next_sample().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_load_sample_array() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("track.json");
        std::fs::write(&path, serde_json::to_string(&track(4)).unwrap()).unwrap();

        let source = ReplaySource::from_path(&path).unwrap();
        assert_eq!(source.remaining(), 4);
    }

    #[tokio::test]
    async fn test_load_recording_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("recording.json");
        let mut recording = TrailRecording::new(None, RecordingState::Completed);
        recording.samples = track(5);
        std::fs::write(&path, serde_json::to_string(&recording).unwrap()).unwrap();

        let source = ReplaySource::from_path(&path).unwrap();
        assert_eq!(source.remaining(), 5);
    }

    #[test]
    fn test_load_invalid_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("bad.json");
        std::fs::write(&path, "{not json").unwrap();

        let err = ReplaySource::from_path(&path).err().unwrap();
        assert!(err.to_string().contains("Failed to parse replay track"));
    }
}
