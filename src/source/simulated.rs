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

// Deterministic walk generator

use super::SampleSource;
use crate::config::SimulatedSourceConfig;
use crate::error::Result;
use crate::model::{Coordinate, LocationSample};
use async_trait::async_trait;
use chrono::Utc;
use tracing::debug;

/// Walks north-east from an origin, climbing a fixed amount per fix
pub struct SimulatedSource {
    config: SimulatedSourceConfig,
    index: u32,
}

impl SimulatedSource {
    pub fn new(config: SimulatedSourceConfig) -> Self {
        Self { config, index: 0 }
    }

    pub fn produced(&self) -> u32 {
        self.index
    }
}

#[async_trait]
impl SampleSource for SimulatedSource {
    async fn next_sample(&mut self) -> Result<Option<LocationSample>> {
        if self.index >= self.config.max_samples {
            debug!("Simulated source exhausted after {} samples", self.index);
            return Ok(None);
        }

        let step = f64::from(self.index);
        let sample = LocationSample::new(
            Coordinate::new(
                self.config.origin_latitude + step * self.config.step_degrees,
                self.config.origin_longitude + step * self.config.step_degrees,
            ),
            self.config.origin_altitude_m + step * self.config.climb_per_tick_m,
            Utc::now(),
            self.config.horizontal_accuracy_m,
            self.config.vertical_accuracy_m,
        );
        self.index += 1;
        Ok(Some(sample))
    }

    fn source_type(&self) -> &str {
        "simulated"
    }
}
