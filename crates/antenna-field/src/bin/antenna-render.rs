//! antenna-render: render an audio file to waveform, spectrum and field-frame SVGs

use anyhow::{Context, Result};
use antenna_field::{load_file, render_session, RenderConfig, Session, SimulationParameters};
use clap::{builder::RangedU64ValueParser, Parser};
use serde::Serialize;
use std::fs;
use std::path::PathBuf;
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "antenna-render")]
#[command(about = "Render an audio-driven antenna field animation as SVG frames")]
#[command(version)]
struct Args {
    /// Input audio file (wav or mp3)
    #[arg(short, long)]
    input: PathBuf,

    /// Output directory for SVG files
    #[arg(short, long)]
    output: PathBuf,

    /// Number of field frames spread over the track
    #[arg(long, default_value = "30", value_parser = RangedU64ValueParser::<usize>::new().range(1..))]
    frames: usize,

    /// Drive frequency in Hz
    #[arg(long, default_value = "1.0")]
    frequency: f64,

    /// Current at full-scale amplitude (A)
    #[arg(long, default_value = "1.0")]
    max_current: f64,

    /// Current at silence (A)
    #[arg(long, default_value = "0.1")]
    min_current: f64,

    /// Antenna length in meters
    #[arg(long, default_value = "1.0")]
    antenna_length: f64,

    /// Frame width in pixels
    #[arg(long, default_value = "800")]
    width: u32,

    /// Frame height in pixels
    #[arg(long, default_value = "400")]
    height: u32,

    /// Also write frames.json with per-frame time, amplitude and current
    #[arg(long)]
    json: bool,
}

#[derive(Serialize)]
struct FrameInfo {
    index: usize,
    time: f64,
    amplitude: f64,
    current: f64,
    peak_magnitude: f64,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct RenderManifest {
    generated: String,
    source: String,
    duration: f64,
    sample_rate: u32,
    parameters: SimulationParameters,
    frames: Vec<FrameInfo>,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt::init();
    run(&Args::parse())
}

/// Render `args.input` into `args.output`
fn run(args: &Args) -> Result<()> {
    let params = SimulationParameters {
        antenna_length: args.antenna_length,
        max_current: args.max_current,
        min_current: args.min_current,
        frequency: args.frequency,
        ..Default::default()
    };
    let mut session = Session::with_parameters(params).context("Invalid simulation parameters")?;

    let track = load_file(&args.input)
        .with_context(|| format!("Failed to load audio: {:?}", args.input))?;
    let (duration, sample_rate) = (track.duration(), track.sample_rate());
    session.load_track(track);

    let config = RenderConfig {
        frames: args.frames,
        frame_width: args.width,
        frame_height: args.height,
        ..Default::default()
    };
    let rendered = render_session(&session, &config).context("Rendering failed")?;

    fs::create_dir_all(&args.output)
        .with_context(|| format!("Failed to create output directory: {:?}", args.output))?;

    for (name, svg) in [
        ("waveform.svg", &rendered.waveform_svg),
        ("spectrum.svg", &rendered.spectrum_svg),
    ] {
        let path = args.output.join(name);
        fs::write(&path, svg).with_context(|| format!("Failed to write {:?}", path))?;
    }

    for (i, svg) in rendered.frame_svgs.iter().enumerate() {
        let path = args.output.join(format!("frame_{:03}.svg", i));
        fs::write(&path, svg).with_context(|| format!("Failed to write {:?}", path))?;
    }

    if args.json {
        let manifest = RenderManifest {
            generated: chrono::Utc::now().to_rfc3339(),
            source: args.input.display().to_string(),
            duration,
            sample_rate,
            parameters: *session.parameters(),
            frames: rendered
                .frames
                .iter()
                .enumerate()
                .map(|(index, f)| FrameInfo {
                    index,
                    time: f.time,
                    amplitude: f.amplitude,
                    current: f.current,
                    peak_magnitude: f.peak_magnitude(),
                })
                .collect(),
        };
        let path = args.output.join("frames.json");
        fs::write(&path, serde_json::to_string_pretty(&manifest)?)
            .with_context(|| format!("Failed to write {:?}", path))?;
    }

    info!(
        "Wrote {} frames, waveform and spectrum to {:?}",
        rendered.frame_svgs.len(),
        args.output
    );

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    /// 16-bit mono PCM WAV
    fn write_wav(path: &std::path::Path, sample_rate: u32, samples: &[i16]) {
        let data_len = (samples.len() * 2) as u32;
        let mut data = Vec::new();
        data.extend_from_slice(b"RIFF");
        data.extend_from_slice(&(36 + data_len).to_le_bytes());
        data.extend_from_slice(b"WAVEfmt ");
        data.extend_from_slice(&16u32.to_le_bytes());
        data.extend_from_slice(&1u16.to_le_bytes());
        data.extend_from_slice(&1u16.to_le_bytes());
        data.extend_from_slice(&sample_rate.to_le_bytes());
        data.extend_from_slice(&(sample_rate * 2).to_le_bytes());
        data.extend_from_slice(&2u16.to_le_bytes());
        data.extend_from_slice(&16u16.to_le_bytes());
        data.extend_from_slice(b"data");
        data.extend_from_slice(&data_len.to_le_bytes());
        for s in samples {
            data.extend_from_slice(&s.to_le_bytes());
        }
        fs::write(path, data).unwrap();
    }

    fn args_for(input: PathBuf, output: PathBuf, extra: &[&str]) -> Args {
        let mut argv = vec![
            "antenna-render".to_string(),
            "--input".to_string(),
            input.display().to_string(),
            "--output".to_string(),
            output.display().to_string(),
        ];
        argv.extend(extra.iter().map(|s| s.to_string()));
        Args::try_parse_from(argv).unwrap()
    }

    #[test]
    fn test_run_writes_svgs_and_manifest() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("tone.wav");
        let samples: Vec<i16> = (0..400).map(|i| if i % 20 < 10 { 8000 } else { -8000 }).collect();
        write_wav(&input, 4000, &samples);
        let output = dir.path().join("out");

        let args = args_for(input, output.clone(), &["--frames", "3", "--json", "--width", "200", "--height", "100"]);
        run(&args).unwrap();

        assert!(output.join("waveform.svg").exists());
        assert!(output.join("spectrum.svg").exists());
        for i in 0..3 {
            let svg = fs::read_to_string(output.join(format!("frame_{:03}.svg", i))).unwrap();
            assert!(svg.starts_with("<svg"));
        }
        assert!(!output.join("frame_003.svg").exists());

        let manifest: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(output.join("frames.json")).unwrap()).unwrap();
        assert_eq!(manifest["sampleRate"], 4000);
        assert_eq!(manifest["frames"].as_array().unwrap().len(), 3);
        assert_eq!(manifest["frames"][1]["time"], 0.1 / 3.0);
    }

    #[test]
    fn test_run_without_json_skips_manifest() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("clip.wav");
        write_wav(&input, 8000, &[1000, -1000, 500, 0]);
        let output = dir.path().join("out");

        run(&args_for(input, output.clone(), &["--frames", "1"])).unwrap();
        assert!(output.join("frame_000.svg").exists());
        assert!(!output.join("frames.json").exists());
    }

    #[test]
    fn test_zero_frames_rejected_by_parser() {
        let argv = ["antenna-render", "-i", "a.wav", "-o", "out", "--frames", "0"];
        assert!(Args::try_parse_from(argv).is_err());
    }

    #[test]
    fn test_run_rejects_bad_inputs() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing.wav");
        assert!(run(&args_for(missing, dir.path().join("out"), &[])).is_err());

        let input = dir.path().join("clip.wav");
        write_wav(&input, 8000, &[1000, -1000]);
        let err = run(&args_for(input, dir.path().join("out"), &["--min-current", "5"])).unwrap_err();
        assert!(format!("{:#}", err).contains("minCurrent"));
    }
}
