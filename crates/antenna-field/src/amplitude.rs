//! Audio amplitude lookup at a simulation time

use crate::audio::AudioTrack;

/// Amplitude used when no audio is loaded, so the drive current sits at its maximum
pub const NEUTRAL_AMPLITUDE: f64 = 1.0;

/// |sample| of the track at `time` seconds, in [0, 1].
///
/// `time` is clamped to [0, duration]; a non-finite time reads as 0. The
/// index is `round(time / duration * len)` clamped to the last sample. This
/// is a nearest-sample lookup, not an interpolation, so neighbouring frames
/// can jump between sample values.
pub fn sample_amplitude(track: &AudioTrack, time: f64) -> f64 {
    let duration = track.duration();
    if track.is_empty() || duration <= 0.0 {
        return NEUTRAL_AMPLITUDE;
    }

    let time = if time.is_finite() { time.clamp(0.0, duration) } else { 0.0 };
    let len = track.len();
    let index = ((time / duration) * len as f64).round() as usize;
    let index = index.min(len - 1);

    track.samples()[index].abs() as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn track(samples: Vec<f32>, rate: u32) -> AudioTrack {
        AudioTrack::new(samples, rate).unwrap()
    }

    #[test]
    fn test_empty_track_returns_full_scale() {
        let empty = AudioTrack::empty();
        for t in [-1.0, 0.0, 0.5, 100.0, f64::NAN] {
            assert_eq!(sample_amplitude(&empty, t), 1.0);
        }
    }

    #[test]
    fn test_nearest_sample_lookup() {
        // 4 samples at 4 Hz: duration 1s
        let t = track(vec![0.25, -1.0, 0.5, -0.75], 4);

        assert_abs_diff_eq!(sample_amplitude(&t, 0.0), 0.25);
        // 0.3 * 4 = 1.2 -> index 1
        assert_abs_diff_eq!(sample_amplitude(&t, 0.3), 1.0);
        // 0.4 * 4 = 1.6 -> rounds to index 2
        assert_abs_diff_eq!(sample_amplitude(&t, 0.4), 0.5);
        // end of track clamps to the last sample
        assert_abs_diff_eq!(sample_amplitude(&t, 1.0), 0.75);
    }

    #[test]
    fn test_time_is_clamped() {
        let t = track(vec![0.25, -1.0, 0.5, -0.75], 4);
        assert_eq!(sample_amplitude(&t, -3.0), sample_amplitude(&t, 0.0));
        assert_eq!(sample_amplitude(&t, 42.0), sample_amplitude(&t, 1.0));
        assert_eq!(sample_amplitude(&t, f64::INFINITY), sample_amplitude(&t, 0.0));
    }

    #[test]
    fn test_result_within_unit_range() {
        let samples: Vec<f32> = (0..1000).map(|i| ((i as f32) * 0.37).sin() * 3.0).collect();
        let t = track(samples, 1000);
        let duration = t.duration();
        for step in 0..=200 {
            let a = sample_amplitude(&t, duration * step as f64 / 200.0);
            assert!((0.0..=1.0).contains(&a), "amplitude {} out of range", a);
        }
    }

    #[test]
    fn test_silent_track_is_zero_amplitude() {
        let t = track(vec![0.0; 16], 16);
        assert_eq!(sample_amplitude(&t, 0.5), 0.0);
    }
}
