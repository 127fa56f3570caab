//! antenna-field: audio-modulated dipole field visualization core
//!
//! This crate provides:
//! - WAV/MP3 decoding to normalized mono tracks
//! - FFT magnitude spectrum of a track
//! - Amplitude lookup and drive-current mapping
//! - A closed-form, illustrative dipole field evaluated over sample points
//! - Per-user simulation sessions (track, parameters, clock)
//! - Antenna display mesh and SVG frame rendering
//!
//! The field model is a visualization aid, not an electromagnetic solver.

pub mod amplitude;
pub mod audio;
pub mod current;
pub mod error;
pub mod field;
pub mod geometry;
pub mod params;
pub mod points;
pub mod render;
pub mod session;
pub mod spectrum;

pub use amplitude::sample_amplitude;
pub use audio::{decode_bytes, is_allowed_extension, load_file, normalize, AudioTrack, TrackSummary};
pub use current::map_current;
pub use error::{DecodeError, RenderError, SimError};
pub use field::{evaluate_field, FieldFrame, FieldVector, SpatialSample};
pub use geometry::{build_antenna, MeshData};
pub use params::{ParameterUpdate, SimulationParameters};
pub use points::{default_grid, preview_grid, spherical_grid};
pub use session::{Session, SessionSummary, SimulationClock};
pub use spectrum::{magnitude_spectrum, Spectrum};

/// Output sizes and frame count for a rendered upload
#[derive(Debug, Clone, Copy)]
pub struct RenderConfig {
    /// Field frames spread evenly over the track
    pub frames: usize,
    /// Field frame size in pixels
    pub frame_width: u32,
    pub frame_height: u32,
    /// Waveform and spectrum plot size in pixels
    pub waveform_width: u32,
    pub waveform_height: u32,
    /// Bins in the waveform envelope sent to clients
    pub envelope_bins: usize,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            frames: 30,
            frame_width: 800,
            frame_height: 400,
            waveform_width: 1000,
            waveform_height: 400,
            envelope_bins: 1000,
        }
    }
}

/// Everything produced for one loaded track
#[derive(Debug, Clone)]
pub struct RenderedTrack {
    pub envelope: Vec<f64>,
    pub waveform_svg: String,
    pub spectrum_svg: String,
    pub frames: Vec<FieldFrame>,
    pub frame_svgs: Vec<String>,
}

/// Render the waveform, spectrum and `config.frames` field frames for the session's
/// track over the preview sample grid. The session clock is not moved.
pub fn render_session(session: &Session, config: &RenderConfig) -> Result<RenderedTrack, RenderError> {
    let empty = AudioTrack::empty();
    let track = session.track().unwrap_or(&empty);

    let frames = session.frames(&preview_grid(), config.frames)?;
    let frame_svgs = render::render_frames(
        &frames,
        session.parameters(),
        config.frame_width,
        config.frame_height,
    )?;

    tracing::info!(
        "Rendered {} frames over {:.2}s of audio",
        frames.len(),
        track.duration()
    );

    Ok(RenderedTrack {
        envelope: track.envelope(config.envelope_bins),
        waveform_svg: render::waveform_svg(track, config.waveform_width, config.waveform_height)?,
        spectrum_svg: render::spectrum_svg(&track.spectrum(), config.waveform_width, config.waveform_height)?,
        frames,
        frame_svgs,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_session_counts() {
        let mut session = Session::new();
        session.load_track(AudioTrack::new(vec![0.2, -0.9, 0.4, 1.0, -0.1, 0.0], 3).unwrap());
        session.set_time(1.0);

        let config = RenderConfig {
            frames: 3,
            envelope_bins: 50,
            ..Default::default()
        };
        let rendered = render_session(&session, &config).unwrap();

        assert_eq!(rendered.frames.len(), 3);
        assert_eq!(rendered.frame_svgs.len(), 3);
        assert_eq!(rendered.envelope.len(), 50);
        assert!(rendered.waveform_svg.contains("2.00 s"));
        assert!(rendered.spectrum_svg.contains("Audio Spectrum"));
        assert_eq!(session.current_time(), 1.0);
    }

    #[test]
    fn test_render_session_without_audio() {
        let rendered = render_session(&Session::new(), &RenderConfig { frames: 1, ..Default::default() }).unwrap();
        assert!(rendered.envelope.iter().all(|&e| e == 0.0));
        assert_eq!(rendered.frames[0].current, SimulationParameters::default().max_current);
    }

    #[test]
    fn test_zero_frames_rejected() {
        let config = RenderConfig { frames: 0, ..Default::default() };
        assert!(matches!(render_session(&Session::new(), &config), Err(RenderError::NoFrames)));
    }
}
