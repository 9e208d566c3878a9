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

// Recording state machine and metric aggregation
//
// The session owns the canonical TrailRecording. It has no I/O and no
// clock of its own except for stamping transitions; the controller
// serializes every call through a single mutex.

use chrono::Utc;
use std::time::Duration;
use tracing::{debug, info};

use crate::error::{RecorderError, Result};
use crate::geo;
use crate::model::{LocationSample, RecordingState, TrailRecording};

pub struct RecordingSession {
    recording: Option<TrailRecording>,
    tick_interval: Duration,
    // Set by resume(); the next sample starts a new segment
    segment_break: bool,
}

impl RecordingSession {
    pub fn new(tick_interval: Duration) -> Self {
        Self {
            recording: None,
            tick_interval,
            segment_break: false,
        }
    }

    pub fn state(&self) -> RecordingState {
        self.recording
            .as_ref()
            .map(|r| r.state)
            .unwrap_or(RecordingState::Idle)
    }

    /// The recording in progress, if any (recording or paused)
    pub fn current(&self) -> Option<&TrailRecording> {
        self.recording.as_ref().filter(|r| r.state.is_active())
    }

    /// The last stopped recording, kept until the next start
    pub fn completed(&self) -> Option<&TrailRecording> {
        self.recording
            .as_ref()
            .filter(|r| r.state == RecordingState::Completed)
    }

    /// Begin a new recording.
    ///
    /// Returns `true` when a new recording was allocated. While a recording
    /// is already in progress this is a no-op and returns `false`; the
    /// in-flight recording is never reset.
    pub fn start(&mut self, trail_id: Option<String>) -> bool {
        if let Some(existing) = self.current() {
            debug!(
                "start ignored: recording {} already {}",
                existing.id, existing.state
            );
            return false;
        }

        let recording = TrailRecording::new(trail_id, RecordingState::Recording);
        info!("Recording {} started", recording.id);
        self.recording = Some(recording);
        self.segment_break = false;
        true
    }

    /// Returns `true` if the session moved from recording to paused
    pub fn pause(&mut self) -> bool {
        match self.recording.as_mut() {
            Some(rec) if rec.state == RecordingState::Recording => {
                rec.state = RecordingState::Paused;
                rec.updated_at = Utc::now();
                info!("Recording {} paused", rec.id);
                true
            }
            _ => false,
        }
    }

    /// Returns `true` if the session moved from paused to recording
    pub fn resume(&mut self) -> bool {
        match self.recording.as_mut() {
            Some(rec) if rec.state == RecordingState::Paused => {
                rec.state = RecordingState::Recording;
                rec.updated_at = Utc::now();
                self.segment_break = true;
                info!("Recording {} resumed", rec.id);
                true
            }
            _ => false,
        }
    }

    /// Finalize the active recording and return its snapshot
    pub fn stop(&mut self) -> Result<TrailRecording> {
        let rec = self
            .recording
            .as_mut()
            .filter(|r| r.state.is_active())
            .ok_or(RecorderError::NoActiveSession)?;

        rec.state = RecordingState::Completed;
        rec.updated_at = Utc::now();
        info!(
            "Recording {} completed: {} samples, {:.1} m, {:.1} m ascent, {:.1} s",
            rec.id,
            rec.samples.len(),
            rec.total_distance,
            rec.total_ascent,
            rec.duration
        );
        Ok(rec.clone())
    }

    /// Apply one sample. Returns `false` (sample dropped) unless recording.
    pub fn apply(&mut self, sample: LocationSample) -> bool {
        let tick = self.tick_interval.as_secs_f64();
        let segment_break = self.segment_break;
        let state = self.state();

        let Some(rec) = self
            .recording
            .as_mut()
            .filter(|r| r.state == RecordingState::Recording)
        else {
            debug!("Dropping sample {}: session is {}", sample.id, state);
            return false;
        };

        let (distance, ascent, elapsed) = match rec.last_sample() {
            Some(prev) if !segment_break => {
                let elapsed = (sample.timestamp - prev.timestamp)
                    .to_std()
                    .map(|d| d.as_secs_f64())
                    .unwrap_or(0.0);
                (
                    prev.coordinate.distance_to(&sample.coordinate),
                    geo::ascent_between(prev.altitude, sample.altitude),
                    elapsed,
                )
            }
            _ => (0.0, 0.0, tick),
        };

        rec.total_distance += distance;
        rec.total_ascent += ascent;
        rec.duration += elapsed;
        rec.updated_at = Utc::now().max(sample.timestamp);
        rec.samples.push(sample);
        self.segment_break = false;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Coordinate;
    use chrono::{DateTime, TimeZone};

    const TICK: Duration = Duration::from_millis(200);

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000 + secs, 0).unwrap()
    }

    fn sample(lat: f64, lon: f64, alt: f64, secs: i64) -> LocationSample {
        LocationSample::new(Coordinate::new(lat, lon), alt, at(secs), 5.0, 8.0)
    }

    #[test]
    fn test_start_stop_without_samples() {
        let mut session = RecordingSession::new(TICK);
        assert!(session.start(None));

        let rec = session.stop().unwrap();
        assert_eq!(rec.state, RecordingState::Completed);
        assert_eq!(rec.total_distance, 0.0);
        assert_eq!(rec.total_ascent, 0.0);
        assert_eq!(rec.duration, 0.0);
        assert!(rec.samples.is_empty());
    }

    #[test]
    fn test_second_stop_fails() {
        let mut session = RecordingSession::new(TICK);
        session.start(None);
        session.stop().unwrap();

        let err = session.stop().unwrap_err();
        assert!(matches!(err, RecorderError::NoActiveSession));
    }

    #[test]
    fn test_stop_when_idle_fails() {
        let mut session = RecordingSession::new(TICK);
        assert!(matches!(session.stop(), Err(RecorderError::NoActiveSession)));
    }

    #[test]
    fn test_start_while_active_keeps_recording() {
        let mut session = RecordingSession::new(TICK);
        session.start(Some("a".to_string()));
        let id = session.current().unwrap().id;
        session.apply(sample(0.0, 0.0, 0.0, 0));

        assert!(!session.start(Some("b".to_string())));
        let current = session.current().unwrap();
        assert_eq!(current.id, id);
        assert_eq!(current.trail_id.as_deref(), Some("a"));
        assert_eq!(current.samples.len(), 1);

        session.pause();
        assert!(!session.start(None));
        assert_eq!(session.current().unwrap().id, id);
    }

    #[test]
    fn test_start_after_completed_is_fresh() {
        let mut session = RecordingSession::new(TICK);
        session.start(None);
        session.apply(sample(0.0, 0.0, 0.0, 0));
        let first = session.stop().unwrap();
        assert_eq!(session.state(), RecordingState::Completed);
        assert!(session.completed().is_some());

        assert!(session.start(None));
        let second = session.current().unwrap();
        assert_ne!(second.id, first.id);
        assert!(second.samples.is_empty());
    }

    #[test]
    fn test_distance_matches_great_circle() {
        let mut session = RecordingSession::new(TICK);
        session.start(None);
        session.apply(sample(0.0, 0.0, 0.0, 0));
        session.apply(sample(0.0, 0.001, 0.0, 1));

        let rec = session.current().unwrap();
        let expected = Coordinate::new(0.0, 0.0).distance_to(&Coordinate::new(0.0, 0.001));
        assert!((rec.total_distance - expected).abs() < 1e-9);
        assert!((rec.total_distance - 111.195).abs() < 0.01);
    }

    #[test]
    fn test_ascent_and_duration() {
        let mut session = RecordingSession::new(TICK);
        session.start(None);
        session.apply(sample(0.0, 0.0, 100.0, 0));
        session.apply(sample(0.0, 0.0001, 103.0, 2));
        session.apply(sample(0.0, 0.0002, 101.0, 5));
        session.apply(sample(0.0, 0.0003, 102.5, 6));

        let rec = session.current().unwrap();
        assert!((rec.total_ascent - 4.5).abs() < 1e-9);
        // first sample counts one tick, then 2 + 3 + 1 seconds
        assert!((rec.duration - (0.2 + 6.0)).abs() < 1e-9);
        assert!(rec.updated_at >= rec.started_at);
    }

    #[test]
    fn test_updated_at_advances_on_every_sample() {
        let mut session = RecordingSession::new(TICK);
        session.start(None);
        let mut previous = session.current().unwrap().updated_at;

        // Fix timestamps lag far behind the wall clock
        for i in 0..3 {
            std::thread::sleep(Duration::from_millis(2));
            assert!(session.apply(sample(0.0, i as f64 * 0.0001, 0.0, i)));

            let rec = session.current().unwrap();
            assert!(rec.updated_at > previous, "updated_at did not advance on sample {}", i);
            assert_eq!(rec.last_sample().unwrap().timestamp, at(i));
            previous = rec.updated_at;
        }
    }

    #[test]
    fn test_updated_at_follows_future_timestamp() {
        let mut session = RecordingSession::new(TICK);
        session.start(None);
        let ahead = Utc::now() + chrono::Duration::hours(1);
        session.apply(LocationSample::new(Coordinate::new(0.0, 0.0), 0.0, ahead, 5.0, 8.0));

        assert_eq!(session.current().unwrap().updated_at, ahead);
    }

    #[test]
    fn test_samples_dropped_while_paused() {
        let mut session = RecordingSession::new(TICK);
        session.start(None);
        session.apply(sample(0.0, 0.0, 100.0, 0));
        assert!(session.pause());

        assert!(!session.apply(sample(0.0, 0.01, 150.0, 10)));
        let rec = session.current().unwrap();
        assert_eq!(rec.samples.len(), 1);
        assert_eq!(rec.total_distance, 0.0);
        assert_eq!(rec.total_ascent, 0.0);
    }

    #[test]
    fn test_paused_interval_not_counted() {
        let mut session = RecordingSession::new(TICK);
        session.start(None);
        session.apply(sample(0.0, 0.0, 100.0, 0));
        session.apply(sample(0.0, 0.001, 100.0, 1));
        session.pause();
        session.resume();
        // 100 seconds later and somewhere else
        session.apply(sample(0.0, 0.5, 300.0, 101));
        session.apply(sample(0.0, 0.501, 300.0, 102));

        let rec = session.current().unwrap();
        assert!((rec.duration - (0.2 + 1.0 + 0.2 + 1.0)).abs() < 1e-9);
        assert!((rec.total_distance - 2.0 * 111.195).abs() < 0.05);
        assert_eq!(rec.total_ascent, 0.0);
    }

    #[test]
    fn test_clock_going_backwards_adds_no_duration() {
        let mut session = RecordingSession::new(TICK);
        session.start(None);
        session.apply(sample(0.0, 0.0, 0.0, 10));
        session.apply(sample(0.0, 0.0, 0.0, 5));

        assert!((session.current().unwrap().duration - 0.2).abs() < 1e-9);
    }

    #[test]
    fn test_noop_transitions() {
        let mut session = RecordingSession::new(TICK);
        assert!(!session.pause());
        assert!(!session.resume());
        assert!(!session.apply(sample(0.0, 0.0, 0.0, 0)));

        session.start(None);
        assert!(!session.resume());
        assert!(session.pause());
        assert!(!session.pause());
        assert!(session.resume());
        assert_eq!(session.state(), RecordingState::Recording);
    }

    #[test]
    fn test_accumulators_monotonic_under_interleaving() {
        let mut session = RecordingSession::new(TICK);
        session.start(None);

        let mut last = (0.0, 0.0, 0.0);
        for i in 0..60i64 {
            match i % 7 {
                3 => {
                    session.pause();
                }
                5 => {
                    session.resume();
                }
                _ => {}
            }
            let was_recording = session.state() == RecordingState::Recording;
            let alt = 100.0 + ((i * 37) % 11) as f64;
            session.apply(sample(i as f64 * 0.0001, 0.0, alt, i));

            let rec = session.current().unwrap();
            assert!(rec.total_distance >= last.0);
            assert!(rec.total_ascent >= last.1);
            assert!(rec.duration >= last.2);
            if !was_recording {
                assert_eq!(rec.duration, last.2);
            }
            last = (rec.total_distance, rec.total_ascent, rec.duration);
        }
    }
}
