//! Per-user simulation state: loaded track, parameters and clock
//!
//! A `Session` is owned by whoever serves a user. Nothing here is shared or
//! global; concurrent users each get their own record.

use crate::amplitude::sample_amplitude;
use crate::audio::AudioTrack;
use crate::current::map_current;
use crate::error::SimError;
use crate::field::{evaluate_field, FieldFrame, FieldVector, SpatialSample};
use crate::params::{ParameterUpdate, SimulationParameters};
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info};

/// Simulation time in seconds. Only moves when set explicitly.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SimulationClock {
    pub current_time: f64,
}

impl SimulationClock {
    /// Set the time, clamped to [0, duration]. Non-finite input resets to 0.
    pub fn set(&mut self, time: f64, duration: f64) -> f64 {
        self.current_time = if time.is_finite() {
            time.clamp(0.0, duration.max(0.0))
        } else {
            0.0
        };
        self.current_time
    }
}

/// Clones share the loaded track, so a copy is cheap to take and hand off.
#[derive(Debug, Clone, Default)]
pub struct Session {
    track: Option<Arc<AudioTrack>>,
    params: SimulationParameters,
    clock: SimulationClock,
}

/// Session state reported to clients
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSummary {
    pub parameters: SimulationParameters,
    pub current_time: f64,
    pub duration: f64,
    pub has_audio: bool,
    pub amplitude: f64,
    pub current: f64,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_parameters(params: SimulationParameters) -> Result<Self, SimError> {
        params.validate()?;
        Ok(Self {
            params,
            ..Self::default()
        })
    }

    pub fn track(&self) -> Option<&AudioTrack> {
        self.track.as_deref()
    }

    pub fn parameters(&self) -> &SimulationParameters {
        &self.params
    }

    pub fn current_time(&self) -> f64 {
        self.clock.current_time
    }

    /// Track duration, 0 when nothing is loaded
    pub fn duration(&self) -> f64 {
        self.track().map(AudioTrack::duration).unwrap_or(0.0)
    }

    /// Replace the track and rewind the clock
    pub fn load_track(&mut self, track: AudioTrack) {
        info!(
            "Session track loaded: {} samples, {:.2}s",
            track.len(),
            track.duration()
        );
        self.track = Some(Arc::new(track));
        self.clock = SimulationClock::default();
    }

    /// Move the clock; returns the clamped time actually set
    pub fn set_time(&mut self, time: f64) -> f64 {
        let duration = self.duration();
        let set = self.clock.set(time, duration);
        debug!("Clock set to {:.4}s (requested {})", set, time);
        set
    }

    pub fn update_parameters(&mut self, update: &ParameterUpdate) -> Result<&SimulationParameters, SimError> {
        self.params.apply(update)?;
        info!("Parameters updated: {:?}", self.params);
        Ok(&self.params)
    }

    /// Audio amplitude at `time` (full scale when no track is loaded)
    pub fn amplitude_at(&self, time: f64) -> f64 {
        match self.track() {
            Some(track) => sample_amplitude(track, time),
            None => sample_amplitude(&AudioTrack::empty(), time),
        }
    }

    pub fn amplitude(&self) -> f64 {
        self.amplitude_at(self.clock.current_time)
    }

    pub fn drive_current(&self) -> f64 {
        map_current(self.amplitude(), &self.params)
    }

    /// Field at the current clock time
    pub fn evaluate(&self, points: &[SpatialSample]) -> Result<Vec<FieldVector>, SimError> {
        evaluate_field(points, self.drive_current(), self.params.frequency, self.clock.current_time)
    }

    /// Field at `time` (clamped like the clock) without moving the clock
    pub fn evaluate_at(&self, points: &[SpatialSample], time: f64) -> Result<FieldFrame, SimError> {
        let time = SimulationClock::default().set(time, self.duration());
        let amplitude = self.amplitude_at(time);
        let current = map_current(amplitude, &self.params);
        let vectors = evaluate_field(points, current, self.params.frequency, time)?;

        Ok(FieldFrame {
            time,
            amplitude,
            current,
            frequency: self.params.frequency,
            points: points.to_vec(),
            vectors,
        })
    }

    /// Frame at the current clock time
    pub fn frame(&self, points: &[SpatialSample]) -> Result<FieldFrame, SimError> {
        self.evaluate_at(points, self.clock.current_time)
    }

    /// `count` frames at `duration * i / count`, leaving the clock untouched
    pub fn frames(&self, points: &[SpatialSample], count: usize) -> Result<Vec<FieldFrame>, SimError> {
        let duration = self.duration();
        (0..count)
            .map(|i| self.evaluate_at(points, duration * i as f64 / count as f64))
            .collect()
    }

    pub fn summary(&self) -> SessionSummary {
        SessionSummary {
            parameters: self.params,
            current_time: self.clock.current_time,
            duration: self.duration(),
            has_audio: self.track.is_some(),
            amplitude: self.amplitude(),
            current: self.drive_current(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use nalgebra::Vector3;

    fn session_with_track() -> Session {
        // 4 samples at 2 Hz: duration 2s
        let mut session = Session::new();
        session.load_track(AudioTrack::new(vec![0.0, 0.5, 1.0, -0.25], 2).unwrap());
        session
    }

    #[test]
    fn test_clock_clamps_to_duration() {
        let mut session = session_with_track();
        assert_eq!(session.set_time(1.0), 1.0);
        assert_eq!(session.set_time(-5.0), 0.0);
        assert_eq!(session.set_time(10.0), 2.0);
        assert_eq!(session.set_time(f64::NAN), 0.0);
    }

    #[test]
    fn test_clock_without_audio_stays_at_zero() {
        let mut session = Session::new();
        assert_eq!(session.duration(), 0.0);
        assert_eq!(session.set_time(3.0), 0.0);
        // no audio: full-scale amplitude, so max current
        assert_eq!(session.amplitude(), 1.0);
        assert_eq!(session.drive_current(), session.parameters().max_current);
    }

    #[test]
    fn test_loading_track_rewinds_clock() {
        let mut session = session_with_track();
        session.set_time(1.5);
        session.load_track(AudioTrack::new(vec![1.0; 10], 10).unwrap());
        assert_eq!(session.current_time(), 0.0);
        assert_abs_diff_eq!(session.duration(), 1.0);
    }

    #[test]
    fn test_drive_current_follows_audio() {
        let mut session = session_with_track();
        session
            .update_parameters(&ParameterUpdate {
                min_current: Some(0.0),
                max_current: Some(2.0),
                ..Default::default()
            })
            .unwrap();

        session.set_time(0.0);
        assert_abs_diff_eq!(session.drive_current(), 0.0);
        // 1.0 / 2.0 * 4 = 2 -> sample 1.0
        session.set_time(1.0);
        assert_abs_diff_eq!(session.drive_current(), 2.0);
    }

    #[test]
    fn test_rejected_update_keeps_state() {
        let mut session = Session::new();
        let before = *session.parameters();
        assert!(session
            .update_parameters(&ParameterUpdate {
                antenna_radius: Some(-0.1),
                ..Default::default()
            })
            .is_err());
        assert_eq!(*session.parameters(), before);
    }

    #[test]
    fn test_evaluate_at_does_not_move_clock() {
        let mut session = session_with_track();
        session.set_time(0.5);
        let points = [Vector3::new(1.0, 1.0, 0.0)];

        let frame = session.evaluate_at(&points, 1.0).unwrap();
        assert_eq!(frame.time, 1.0);
        assert_eq!(session.current_time(), 0.5);

        let at_clock = session.evaluate(&points).unwrap();
        assert_eq!(session.frame(&points).unwrap().vectors, at_clock);
    }

    #[test]
    fn test_frames_span_track() {
        let session = session_with_track();
        let points = [Vector3::new(0.0, 1.0, 0.0)];
        let frames = session.frames(&points, 4).unwrap();

        let times: Vec<f64> = frames.iter().map(|f| f.time).collect();
        assert_eq!(times, vec![0.0, 0.5, 1.0, 1.5]);
        assert_eq!(session.current_time(), 0.0);
        assert!(frames.iter().all(|f| f.vectors.len() == 1));
    }

    #[test]
    fn test_clone_shares_track() {
        let session = session_with_track();
        let copy = session.clone();
        assert!(std::ptr::eq(session.track().unwrap(), copy.track().unwrap()));
    }

    #[test]
    fn test_sessions_are_independent() {
        let mut a = session_with_track();
        let b = session_with_track();
        a.set_time(1.0);
        a.update_parameters(&ParameterUpdate {
            frequency: Some(4.0),
            ..Default::default()
        })
        .unwrap();

        assert_eq!(b.current_time(), 0.0);
        assert_eq!(b.parameters().frequency, 1.0);
    }
}
