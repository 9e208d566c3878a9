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

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::broadcast::{SampleBroadcast, SampleSubscription};
use crate::config::{RecorderConfig, RecorderSettings, SourceConfig};
use crate::error::{RecorderError, Result};
use crate::model::{RecordingState, TrailRecording};
use crate::session::RecordingSession;
use crate::source::{SampleSource, SourceFactory};

/// Builds a fresh sample source for each recording
pub type SourceProvider = Arc<dyn Fn() -> anyhow::Result<Box<dyn SampleSource>> + Send + Sync>;

/// Background production for one recording
struct ActiveRecording {
    broadcast: SampleBroadcast,
    cancel: CancellationToken,
    producer: JoinHandle<()>,
}

/// Entry point for a UI layer: start, pause, resume, stop and observe a
/// recording.
///
/// All recording state lives in one `RecordingSession` behind a mutex. The
/// producer task only reaches it through that mutex, so every mutation is
/// serialized.
pub struct RecordingController {
    session: Arc<Mutex<RecordingSession>>,
    active: Mutex<Option<ActiveRecording>>,
    state_tx: watch::Sender<RecordingState>,
    settings: RecorderSettings,
    source_provider: SourceProvider,
}

impl RecordingController {
    /// A zero tick interval is raised to one millisecond
    pub fn new(mut settings: RecorderSettings, source_provider: SourceProvider) -> Self {
        if settings.tick_interval_ms == 0 {
            warn!("tick_interval_ms of 0 raised to 1");
            settings.tick_interval_ms = 1;
        }
        let (state_tx, _) = watch::channel(RecordingState::Idle);
        Self {
            session: Arc::new(Mutex::new(RecordingSession::new(settings.tick_interval()))),
            active: Mutex::new(None),
            state_tx,
            settings,
            source_provider,
        }
    }

    /// Controller whose sources are built by `SourceFactory` from `source`
    pub fn with_source_config(settings: RecorderSettings, source: SourceConfig) -> Self {
        let provider: SourceProvider = Arc::new(move || SourceFactory::create(&source));
        Self::new(settings, provider)
    }

    pub fn from_config(config: &RecorderConfig) -> Self {
        Self::with_source_config(config.recorder.clone(), config.source.clone())
    }

    /// Start recording, or return the recording already in progress
    pub async fn start(&self, trail_id: Option<String>) -> Result<TrailRecording> {
        let mut active = self.active.lock().await;

        if let Some(existing) = self.session.lock().await.current() {
            debug!("Recording {} already in progress", existing.id);
            return Ok(existing.clone());
        }

        // Sources may read files; keep that off the async workers and outside
        // the session lock
        let provider = self.source_provider.clone();
        let source = tokio::task::spawn_blocking(move || provider())
            .await
            .map_err(|e| RecorderError::Source(format!("source construction aborted: {}", e)))?
            .map_err(|e| RecorderError::Source(e.to_string()))?;

        let mut session = self.session.lock().await;
        session.start(trail_id);
        let recording = session
            .current()
            .cloned()
            .ok_or(RecorderError::NoActiveSession)?;
        drop(session);

        let broadcast = SampleBroadcast::new(self.settings.broadcast_capacity);
        let cancel = CancellationToken::new();
        let producer = tokio::spawn(run_producer(
            source,
            self.session.clone(),
            broadcast.clone(),
            self.state_tx.subscribe(),
            cancel.clone(),
            self.settings.tick_interval(),
        ));

        *active = Some(ActiveRecording {
            broadcast,
            cancel,
            producer,
        });
        self.state_tx.send_replace(RecordingState::Recording);

        Ok(recording)
    }

    /// Pause accumulation. No-op unless recording.
    pub async fn pause(&self) {
        let mut session = self.session.lock().await;
        if session.pause() {
            self.state_tx.send_replace(RecordingState::Paused);
        }
    }

    /// Resume accumulation. No-op unless paused.
    pub async fn resume(&self) {
        let mut session = self.session.lock().await;
        if session.resume() {
            self.state_tx.send_replace(RecordingState::Recording);
        }
    }

    /// Stop the recording and return its final snapshot.
    ///
    /// The producer has fully terminated before the snapshot is taken, so no
    /// sample is applied after it. Subscriptions end once they have drained
    /// the samples already delivered.
    pub async fn stop(&self) -> Result<TrailRecording> {
        let mut active = self.active.lock().await;

        if !self.session.lock().await.state().is_active() {
            return Err(RecorderError::NoActiveSession);
        }

        if let Some(recording) = active.take() {
            recording.cancel.cancel();
            if let Err(e) = recording.producer.await {
                error!("Sample producer terminated abnormally: {}", e);
            }
            // Dropping the last sender closes every subscription
            drop(recording.broadcast);
        }

        let snapshot = self.session.lock().await.stop()?;
        self.state_tx.send_replace(RecordingState::Completed);
        Ok(snapshot)
    }

    /// Observe samples applied from now on.
    ///
    /// With no recording in progress the subscription is already finished.
    pub async fn subscribe_to_samples(&self) -> SampleSubscription {
        match self.active.lock().await.as_ref() {
            Some(recording) => recording.broadcast.subscribe(),
            None => SampleSubscription::closed(),
        }
    }

    /// Snapshot of the recording in progress
    pub async fn current(&self) -> Option<TrailRecording> {
        self.session.lock().await.current().cloned()
    }

    pub async fn state(&self) -> RecordingState {
        self.session.lock().await.state()
    }

    /// Follow state transitions
    pub fn state_changes(&self) -> watch::Receiver<RecordingState> {
        self.state_tx.subscribe()
    }
}

impl Drop for RecordingController {
    fn drop(&mut self) {
        if let Some(recording) = self.active.get_mut().take() {
            recording.cancel.cancel();
        }
    }
}

/// Produce one sample per tick while recording, until cancelled.
///
/// A sample is applied and broadcast inside one critical section, so
/// subscribers observe exactly the applied order. Cancellation is only
/// observed between samples.
async fn run_producer(
    mut source: Box<dyn SampleSource>,
    session: Arc<Mutex<RecordingSession>>,
    broadcast: SampleBroadcast,
    mut state_rx: watch::Receiver<RecordingState>,
    cancel: CancellationToken,
    tick_interval: Duration,
) {
    info!(
        "Sample producer started ({} source, {:?} ticks)",
        source.source_type(),
        tick_interval
    );

    let mut ticker = interval_at(Instant::now() + tick_interval, tick_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut applied: u64 = 0;

    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = ticker.tick() => {}
        }

        if *state_rx.borrow_and_update() == RecordingState::Paused {
            debug!("Producer suspended while paused");
            tokio::select! {
                _ = cancel.cancelled() => break,
                changed = state_rx.wait_for(|s| *s != RecordingState::Paused) => {
                    if changed.is_err() {
                        break;
                    }
                }
            }
            ticker.reset();
            continue;
        }

        let next = tokio::select! {
            _ = cancel.cancelled() => break,
            next = source.next_sample() => next,
        };

        match next {
            Ok(Some(sample)) => {
                let mut session = session.lock().await;
                if session.apply(sample.clone()) {
                    applied += 1;
                    broadcast.publish(sample);
                }
            }
            Ok(None) => {
                info!("Sample source exhausted, waiting for stop");
                cancel.cancelled().await;
                break;
            }
            Err(e) => {
                warn!("Sample source error, skipping tick: {}", e);
            }
        }
    }

    info!("Sample producer stopped after {} samples", applied);
}
