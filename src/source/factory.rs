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

// Source factory for creating sample sources from configuration

use super::replay::ReplaySource;
use super::simulated::SimulatedSource;
use super::SampleSource;
use crate::config::SourceConfig;
use anyhow::{bail, Result};

pub struct SourceFactory;

impl SourceFactory {
    /// Create a fresh sample source; called once per recording
    pub fn create(config: &SourceConfig) -> Result<Box<dyn SampleSource>> {
        match config.kind.as_str() {
            "simulated" => Ok(Box::new(SimulatedSource::new(config.simulated.clone()))),

            "replay" => {
                let replay = config
                    .replay
                    .as_ref()
                    .ok_or_else(|| anyhow::anyhow!("Replay source config missing"))?;
                Ok(Box::new(ReplaySource::from_path(&replay.path)?))
            }

            unknown => bail!(
                "Unknown sample source: '{}'. Supported: simulated, replay",
                unknown
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ReplaySourceConfig;

    #[test]
    fn test_create_simulated_source() {
        let source = SourceFactory::create(&SourceConfig::default()).unwrap();
        assert_eq!(source.source_type(), "simulated");
    }

    #[test]
    fn test_create_replay_without_section() {
        let config = SourceConfig {
            kind: "replay".to_string(),
            ..Default::default()
        };
        let err = SourceFactory::create(&config).err().unwrap();
        assert!(err.to_string().contains("Replay source config missing"));
    }

    #[test]
    fn test_create_replay_missing_file() {
        let config = SourceConfig {
            kind: "replay".to_string(),
            replay: Some(ReplaySourceConfig {
                path: "/nonexistent/track.json".to_string(),
            }),
            ..Default::default()
        };
        assert!(SourceFactory::create(&config).is_err());
    }

    #[test]
    fn test_create_unknown_source() {
        let config = SourceConfig {
            kind: "nmea".to_string(),
            ..Default::default()
        };
        let err = SourceFactory::create(&config).err().unwrap();
        assert!(err.to_string().contains("Unknown sample source"));
    }
}
