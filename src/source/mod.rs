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

// Location sample sources
//
// A source is a pure producer: it knows nothing about recording state.
// The controller drives it once per tick and decides what to do with the
// sample.

pub mod factory;
pub mod replay;
pub mod simulated;

use async_trait::async_trait;

use crate::error::Result;
use crate::model::LocationSample;

pub use factory::SourceFactory;
pub use replay::ReplaySource;
pub use simulated::SimulatedSource;

#[async_trait]
pub trait SampleSource: Send {
    /// Produce the next fix.
    ///
    /// `Ok(None)` means the source is exhausted and will produce nothing
    /// more for this recording.
    async fn next_sample(&mut self) -> Result<Option<LocationSample>>;

    /// Source type identifier, for logs
    fn source_type(&self) -> &str;
}
