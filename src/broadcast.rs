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

// Multi-subscriber sample fan-out
//
// One SampleBroadcast exists per recording. The channel closes once every
// clone of it is dropped, which ends all subscriptions after they have
// drained the samples already sent.

use futures::stream::{self, Stream};
use tokio::sync::broadcast;
use tracing::{debug, warn};

use crate::model::LocationSample;

#[derive(Clone)]
pub struct SampleBroadcast {
    tx: broadcast::Sender<LocationSample>,
}

impl SampleBroadcast {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    /// Send a sample to every current subscriber. Never blocks.
    ///
    /// Returns the number of subscribers reached; zero is not an error.
    pub fn publish(&self, sample: LocationSample) -> usize {
        match self.tx.send(sample) {
            Ok(n) => n,
            Err(_) => {
                debug!("No sample subscribers");
                0
            }
        }
    }

    /// New subscription that sees samples published from now on
    pub fn subscribe(&self) -> SampleSubscription {
        SampleSubscription {
            rx: Some(self.tx.subscribe()),
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

/// A consumer's view of the sample stream.
///
/// Dropping it, or calling [`SampleSubscription::cancel`], unsubscribes
/// without affecting the producer or other subscribers.
pub struct SampleSubscription {
    rx: Option<broadcast::Receiver<LocationSample>>,
}

impl SampleSubscription {
    /// A subscription that is already finished
    pub fn closed() -> Self {
        Self { rx: None }
    }

    /// Next sample, or `None` once the recording has stopped.
    ///
    /// A subscriber that falls more than the channel capacity behind skips
    /// ahead to the oldest retained sample.
    pub async fn recv(&mut self) -> Option<LocationSample> {
        let rx = self.rx.as_mut()?;
        loop {
            match rx.recv().await {
                Ok(sample) => return Some(sample),
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    warn!("Sample subscriber lagged, skipped {} samples", n);
                }
                Err(broadcast::error::RecvError::Closed) => {
                    self.rx = None;
                    return None;
                }
            }
        }
    }

    /// Stop receiving. Safe to call more than once.
    pub fn cancel(&mut self) {
        self.rx = None;
    }

    pub fn is_closed(&self) -> bool {
        self.rx.is_none()
    }

    pub fn into_stream(self) -> impl Stream<Item = LocationSample> + Send + 'static {
        stream::unfold(self, |mut sub| async move {
            sub.recv().await.map(|sample| (sample, sub))
        })
    }
}
