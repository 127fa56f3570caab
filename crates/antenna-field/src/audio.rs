//! Audio loading: WAV/MP3 decode, mono down-mix and peak normalization
//!
//! Decoding goes through symphonia. Every track handed to the field model
//! is mono and peak-normalized to [-1, 1].

use crate::error::DecodeError;
use crate::spectrum::{magnitude_spectrum, Spectrum};
use serde::Serialize;
use std::io::{Cursor, ErrorKind};
use std::path::Path;
use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::{DecoderOptions, CODEC_TYPE_NULL};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;
use tracing::{debug, info};

/// File extensions accepted for upload
pub const ALLOWED_EXTENSIONS: [&str; 2] = ["wav", "mp3"];

/// Mono audio samples plus sample rate. Immutable once built.
#[derive(Debug, Clone, PartialEq)]
pub struct AudioTrack {
    samples: Vec<f32>,
    sample_rate: u32,
}

/// Track metadata returned to clients
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackSummary {
    pub duration: f64,
    pub sample_rate: u32,
    pub sample_count: usize,
}

impl AudioTrack {
    /// Build a track from raw mono samples. Samples are peak-normalized.
    pub fn new(samples: Vec<f32>, sample_rate: u32) -> Result<Self, DecodeError> {
        if sample_rate == 0 {
            return Err(DecodeError::MissingSampleRate);
        }
        Ok(Self {
            samples: normalize(samples),
            sample_rate,
        })
    }

    /// Placeholder track used when no audio has been loaded (duration 0)
    pub fn empty() -> Self {
        Self {
            samples: Vec::new(),
            sample_rate: 1,
        }
    }

    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Duration in seconds (samples / rate)
    pub fn duration(&self) -> f64 {
        self.samples.len() as f64 / self.sample_rate as f64
    }

    pub fn summary(&self) -> TrackSummary {
        TrackSummary {
            duration: self.duration(),
            sample_rate: self.sample_rate,
            sample_count: self.samples.len(),
        }
    }

    /// Peak |sample| per bin, for drawing a waveform overview.
    /// An empty track gives `bins` zeros.
    pub fn envelope(&self, bins: usize) -> Vec<f64> {
        let len = self.samples.len();
        if len == 0 {
            return vec![0.0; bins];
        }

        (0..bins)
            .map(|b| {
                let start = b * len / bins;
                let end = ((b + 1) * len / bins).max(start + 1).min(len);
                self.samples[start..end]
                    .iter()
                    .fold(0.0f32, |peak, s| peak.max(s.abs())) as f64
            })
            .collect()
    }

    /// One-sided FFT magnitude spectrum of the whole track
    pub fn spectrum(&self) -> Spectrum {
        magnitude_spectrum(&self.samples, self.sample_rate)
    }
}

/// Scale samples so the largest magnitude is 1.0.
/// Silent (all-zero) or empty input is returned unchanged.
pub fn normalize(mut samples: Vec<f32>) -> Vec<f32> {
    let peak = samples.iter().fold(0.0f32, |peak, s| peak.max(s.abs()));
    if peak > 0.0 {
        for s in &mut samples {
            *s /= peak;
        }
    }
    samples
}

/// True if `filename` ends in an allowed audio extension (case-insensitive)
pub fn is_allowed_extension(filename: &str) -> bool {
    extension_of(filename)
        .map(|ext| ALLOWED_EXTENSIONS.contains(&ext.as_str()))
        .unwrap_or(false)
}

/// Lowercase suffix after the last `.`, if any
pub fn extension_of(filename: &str) -> Option<String> {
    filename
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
}

/// Read and decode an audio file, dispatching on its extension
pub fn load_file(path: &Path) -> Result<AudioTrack, DecodeError> {
    let name = path.to_string_lossy();
    let extension = extension_of(&name).unwrap_or_default();
    let bytes = std::fs::read(path)?;
    decode_bytes(&bytes, &extension)
}

/// Decode an in-memory WAV or MP3 file into a normalized mono track
pub fn decode_bytes(bytes: &[u8], extension: &str) -> Result<AudioTrack, DecodeError> {
    let extension = extension.to_ascii_lowercase();
    if !ALLOWED_EXTENSIONS.contains(&extension.as_str()) {
        return Err(DecodeError::UnsupportedExtension(extension));
    }
    if bytes.is_empty() {
        return Err(DecodeError::EmptyInput);
    }

    let source = MediaSourceStream::new(Box::new(Cursor::new(bytes.to_vec())), Default::default());
    let mut hint = Hint::new();
    hint.with_extension(&extension);

    let probed = symphonia::default::get_probe().format(
        &hint,
        source,
        &FormatOptions::default(),
        &MetadataOptions::default(),
    )?;
    let mut format = probed.format;

    let track = format
        .tracks()
        .iter()
        .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
        .ok_or(DecodeError::NoTrack)?;
    let track_id = track.id;
    let mut sample_rate = track.codec_params.sample_rate;
    let mut decoder = symphonia::default::get_codecs().make(&track.codec_params, &DecoderOptions::default())?;

    let mut mono = Vec::new();
    loop {
        let packet = match format.next_packet() {
            Ok(packet) => packet,
            Err(SymphoniaError::IoError(e)) if e.kind() == ErrorKind::UnexpectedEof => break,
            Err(e) => return Err(e.into()),
        };
        if packet.track_id() != track_id {
            continue;
        }

        let decoded = match decoder.decode(&packet) {
            Ok(decoded) => decoded,
            Err(SymphoniaError::DecodeError(msg)) => {
                debug!("Skipping undecodable packet: {}", msg);
                continue;
            }
            Err(e) => return Err(e.into()),
        };

        let spec = *decoded.spec();
        if sample_rate.is_none() {
            sample_rate = Some(spec.rate);
        }
        let mut buffer = SampleBuffer::<f32>::new(decoded.capacity() as u64, spec);
        buffer.copy_interleaved_ref(decoded);
        downmix_into(buffer.samples(), spec.channels.count(), &mut mono);
    }

    let sample_rate = sample_rate.ok_or(DecodeError::MissingSampleRate)?;
    if mono.is_empty() {
        return Err(DecodeError::NoSamples);
    }

    info!(
        "Decoded {} audio: {} samples, {}Hz, {:.2}s",
        extension,
        mono.len(),
        sample_rate,
        mono.len() as f64 / sample_rate as f64
    );

    AudioTrack::new(mono, sample_rate)
}

/// Average interleaved frames down to one channel
fn downmix_into(interleaved: &[f32], channels: usize, out: &mut Vec<f32>) {
    let channels = channels.max(1);
    out.extend(
        interleaved
            .chunks_exact(channels)
            .map(|frame| frame.iter().sum::<f32>() / channels as f32),
    );
}
