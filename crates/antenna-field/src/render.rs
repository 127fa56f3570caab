//! SVG rendering of the waveform overview, spectrum and field frames

use crate::audio::AudioTrack;
use crate::error::RenderError;
use crate::field::{FieldFrame, SpatialSample};
use crate::params::SimulationParameters;
use crate::spectrum::Spectrum;
use minijinja::{context, Environment};
use serde::Serialize;
use std::f64::consts::FRAC_PI_6;

const WAVEFORM_TEMPLATE: &str = r##"<svg xmlns="http://www.w3.org/2000/svg" width="{{ width }}" height="{{ height }}" viewBox="0 0 {{ width }} {{ height }}">
<rect width="100%" height="100%" fill="#ffffff"/>
{% for x in grid_x %}<line x1="{{ x }}" y1="0" x2="{{ x }}" y2="{{ plot_height }}" stroke="#eeeeee" stroke-width="1"/>
{% endfor %}{% for y in grid_y %}<line x1="0" y1="{{ y }}" x2="{{ width }}" y2="{{ y }}" stroke="#eeeeee" stroke-width="1"/>
{% endfor %}<polygon points="{{ outline }}" fill="#2196F3" fill-opacity="0.35" stroke="#2196F3" stroke-width="1"/>
<line x1="0" y1="{{ mid }}" x2="{{ width }}" y2="{{ mid }}" stroke="#2196F3" stroke-width="0.5"/>
{% for tick in ticks %}<text x="{{ tick.x }}" y="{{ height - 4 }}" fill="#555555" font-size="10" text-anchor="middle">{{ tick.label }}</text>
{% endfor %}<text x="8" y="14" fill="#333333" font-size="12">Audio Waveform ({{ duration }} s, {{ sample_rate }} Hz)</text>
</svg>
"##;

const SPECTRUM_TEMPLATE: &str = r##"<svg xmlns="http://www.w3.org/2000/svg" width="{{ width }}" height="{{ height }}" viewBox="0 0 {{ width }} {{ height }}">
<rect width="100%" height="100%" fill="#ffffff"/>
{% for x in grid_x %}<line x1="{{ x }}" y1="0" x2="{{ x }}" y2="{{ plot_height }}" stroke="#eeeeee" stroke-width="1"/>
{% endfor %}{% for y in grid_y %}<line x1="0" y1="{{ y }}" x2="{{ width }}" y2="{{ y }}" stroke="#eeeeee" stroke-width="1"/>
{% endfor %}<polyline points="{{ line }}" fill="none" stroke="#F44336" stroke-width="1"/>
{% for tick in ticks %}<text x="{{ tick.x }}" y="{{ height - 4 }}" fill="#555555" font-size="10" text-anchor="middle">{{ tick.label }}</text>
{% endfor %}<text x="8" y="14" fill="#333333" font-size="12">Audio Spectrum (peak {{ peak }} Hz)</text>
</svg>
"##;

const FIELD_TEMPLATE: &str = r##"<svg xmlns="http://www.w3.org/2000/svg" width="{{ width }}" height="{{ height }}" viewBox="0 0 {{ width }} {{ height }}">
<rect width="100%" height="100%" fill="#000000"/>
<line x1="{{ antenna.base_x1 }}" y1="{{ antenna.base_y1 }}" x2="{{ antenna.base_x2 }}" y2="{{ antenna.base_y2 }}" stroke="#b0b0b0" stroke-width="{{ antenna.base_width }}" stroke-linecap="round"/>
<line x1="{{ antenna.body_x1 }}" y1="{{ antenna.body_y1 }}" x2="{{ antenna.body_x2 }}" y2="{{ antenna.body_y2 }}" stroke="#c0c0c0" stroke-width="{{ antenna.body_width }}" stroke-linecap="round"/>
<circle cx="{{ antenna.top_x }}" cy="{{ antenna.top_y }}" r="{{ antenna.top_r }}" fill="#d8d8d8"/>
<g stroke-width="1.2" stroke-opacity="0.7" fill-opacity="0.7">
{% for a in arrows %}<line x1="{{ a.x1 }}" y1="{{ a.y1 }}" x2="{{ a.x2 }}" y2="{{ a.y2 }}" stroke="{{ a.color }}"/><circle cx="{{ a.x2 }}" cy="{{ a.y2 }}" r="1.2" fill="{{ a.color }}"/>
{% endfor %}</g>
<text x="8" y="16" fill="#ffffff" font-size="12">t = {{ time }} s  I = {{ current }} A  f = {{ frequency }} Hz</text>
</svg>
"##;

const GRID_SPACING: f64 = 20.0;
const WAVEFORM_TICKS: usize = 5;
const SPECTRUM_TICKS: usize = 4;

#[derive(Serialize)]
struct Tick {
    x: String,
    label: String,
}

#[derive(Serialize)]
struct Arrow {
    x1: String,
    y1: String,
    x2: String,
    y2: String,
    color: String,
}

#[derive(Serialize)]
struct AntennaOutline {
    body_x1: String,
    body_y1: String,
    body_x2: String,
    body_y2: String,
    body_width: String,
    base_x1: String,
    base_y1: String,
    base_x2: String,
    base_y2: String,
    base_width: String,
    top_x: String,
    top_y: String,
    top_r: String,
}

fn px(v: f64) -> String {
    format!("{:.1}", v)
}

fn template_env() -> Result<Environment<'static>, RenderError> {
    let mut env = Environment::new();
    env.add_template("waveform.svg", WAVEFORM_TEMPLATE)?;
    env.add_template("spectrum.svg", SPECTRUM_TEMPLATE)?;
    env.add_template("field.svg", FIELD_TEMPLATE)?;
    Ok(env)
}

/// Background grid positions up to `width` and `height`
fn grid_lines(width: f64, height: f64) -> (Vec<String>, Vec<String>) {
    let lines = |limit: f64| -> Vec<String> {
        (1..)
            .map(|i| i as f64 * GRID_SPACING)
            .take_while(|&v| v < limit)
            .map(px)
            .collect()
    };
    (lines(width), lines(height))
}

/// Evenly spaced axis labels from 0 to `max`
fn axis_ticks(width: f64, count: usize, max: f64, decimals: usize) -> Vec<Tick> {
    (0..=count)
        .map(|i| {
            let frac = i as f64 / count as f64;
            Tick {
                x: px((frac * width).clamp(12.0, (width - 12.0).max(12.0))),
                label: format!("{:.*}", decimals, frac * max),
            }
        })
        .collect()
}

/// Envelope plot of a track with a seconds axis
pub fn waveform_svg(track: &AudioTrack, width: u32, height: u32) -> Result<String, RenderError> {
    let (w, h) = (width.max(1) as f64, height.max(1) as f64);
    let plot_height = (h - 16.0).max(1.0);
    let mid = plot_height / 2.0;

    let bins = width.max(1) as usize;
    let envelope = track.envelope(bins);
    let step = w / bins as f64;

    // Upper edge left to right, then lower edge back
    let upper = envelope
        .iter()
        .enumerate()
        .map(|(i, e)| format!("{},{}", px(i as f64 * step), px(mid - e * mid)));
    let lower = envelope
        .iter()
        .enumerate()
        .rev()
        .map(|(i, e)| format!("{},{}", px(i as f64 * step), px(mid + e * mid)));
    let outline = upper.chain(lower).collect::<Vec<_>>().join(" ");

    let (grid_x, grid_y) = grid_lines(w, plot_height);

    let duration = track.duration();
    let ticks = axis_ticks(w, WAVEFORM_TICKS, duration, 2);

    let env = template_env()?;
    let svg = env.get_template("waveform.svg")?.render(context! {
        width => width,
        height => height,
        plot_height => px(plot_height),
        mid => px(mid),
        outline => outline,
        grid_x => grid_x,
        grid_y => grid_y,
        ticks => ticks,
        duration => format!("{:.2}", duration),
        sample_rate => track.sample_rate(),
    })?;
    Ok(svg)
}

/// Magnitude spectrum up to Nyquist, scaled to its own peak
pub fn spectrum_svg(spectrum: &Spectrum, width: u32, height: u32) -> Result<String, RenderError> {
    let (w, h) = (width.max(1) as f64, height.max(1) as f64);
    let plot_height = (h - 16.0).max(1.0);
    let top = 20.0f64.min(plot_height);

    let buckets = width.max(2) as usize;
    let values = spectrum.downsample(buckets);
    let peak = values.iter().fold(0.0f64, |p, &v| p.max(v));
    let scale = if peak > 0.0 { (plot_height - top) / peak } else { 0.0 };
    let step = w / (buckets - 1) as f64;

    let line = values
        .iter()
        .enumerate()
        .map(|(i, v)| format!("{},{}", px(i as f64 * step), px(plot_height - v * scale)))
        .collect::<Vec<_>>()
        .join(" ");

    let (grid_x, grid_y) = grid_lines(w, plot_height);
    let ticks = axis_ticks(w, SPECTRUM_TICKS, spectrum.max_frequency(), 0);
    let peak_frequency = spectrum.peak().map(|(f, _)| f).unwrap_or(0.0);

    let env = template_env()?;
    let svg = env.get_template("spectrum.svg")?.render(context! {
        width => width,
        height => height,
        plot_height => px(plot_height),
        line => line,
        grid_x => grid_x,
        grid_y => grid_y,
        ticks => ticks,
        peak => format!("{:.1}", peak_frequency),
    })?;
    Ok(svg)
}

/// Isometric view: x and y recede at 30 degrees, z points up
struct Projection {
    cx: f64,
    cy: f64,
    scale: f64,
}

impl Projection {
    fn fit(extent: f64, width: f64, height: f64) -> Self {
        let extent = extent.max(1e-6);
        Self {
            cx: width / 2.0,
            cy: height / 2.0,
            scale: width.min(height) * 0.42 / extent,
        }
    }

    fn project(&self, x: f64, y: f64, z: f64) -> (f64, f64) {
        let sx = (x - y) * FRAC_PI_6.cos();
        let sy = z + (x + y) * FRAC_PI_6.sin();
        (self.cx + sx * self.scale, self.cy - sy * self.scale)
    }
}

/// Blue (weak) to red (strong)
fn magnitude_color(fraction: f64) -> String {
    let hue = 240.0 * (1.0 - fraction.clamp(0.0, 1.0));
    format!("hsl({:.0},100%,50%)", hue)
}

/// One frame as SVG: antenna outline plus an arrow per sample point.
///
/// Arrow length and colour are relative to the strongest vector the
/// parameters allow (`√2 · max_current`), so frames are comparable.
pub fn field_svg(
    frame: &FieldFrame,
    params: &SimulationParameters,
    width: u32,
    height: u32,
) -> Result<String, RenderError> {
    let (w, h) = (width.max(1) as f64, height.max(1) as f64);
    let length = params.antenna_length;
    let extent = scene_extent(&frame.points, length);
    let projection = Projection::fit(extent, w, h);

    let reference = params.max_current * std::f64::consts::SQRT_2;
    let reference = if reference > 0.0 { reference } else { 1.0 };
    let arrow_world = 0.15 * extent;

    let arrows: Vec<Arrow> = frame
        .points
        .iter()
        .zip(&frame.vectors)
        .map(|(p, v)| {
            let fraction = v.norm() / reference;
            let tip = p + v * (arrow_world / reference);
            let (x1, y1) = projection.project(p.x, p.y, p.z);
            let (x2, y2) = projection.project(tip.x, tip.y, tip.z);
            Arrow {
                x1: px(x1),
                y1: px(y1),
                x2: px(x2),
                y2: px(y2),
                color: magnitude_color(fraction),
            }
        })
        .collect();

    let (body_x1, body_y1) = projection.project(0.0, 0.0, -length / 2.0);
    let (body_x2, body_y2) = projection.project(0.0, 0.0, length / 2.0);
    let (base_x1, base_y1) = projection.project(0.0, 0.0, -length / 10.0);
    let (base_x2, base_y2) = projection.project(0.0, 0.0, 0.0);
    let (top_x, top_y) = projection.project(0.0, 0.0, length);
    let radius_px = params.antenna_radius * projection.scale;

    let antenna = AntennaOutline {
        body_x1: px(body_x1),
        body_y1: px(body_y1),
        body_x2: px(body_x2),
        body_y2: px(body_y2),
        body_width: px((2.0 * radius_px).max(1.5)),
        base_x1: px(base_x1),
        base_y1: px(base_y1),
        base_x2: px(base_x2),
        base_y2: px(base_y2),
        base_width: px((6.0 * radius_px).max(3.0)),
        top_x: px(top_x),
        top_y: px(top_y),
        top_r: px((1.5 * radius_px).max(2.0)),
    };

    let env = template_env()?;
    let svg = env.get_template("field.svg")?.render(context! {
        width => width,
        height => height,
        antenna => antenna,
        arrows => arrows,
        time => format!("{:.2}", frame.time),
        current => format!("{:.3}", frame.current),
        frequency => format!("{:.2}", frame.frequency),
    })?;
    Ok(svg)
}

/// Farthest sample point from the origin, at least the antenna length
fn scene_extent(points: &[SpatialSample], antenna_length: f64) -> f64 {
    points.iter().fold(antenna_length, |acc, p| acc.max(p.norm()))
}

/// Render each frame to SVG
pub fn render_frames(
    frames: &[FieldFrame],
    params: &SimulationParameters,
    width: u32,
    height: u32,
) -> Result<Vec<String>, RenderError> {
    if frames.is_empty() {
        return Err(RenderError::NoFrames);
    }
    frames.iter().map(|f| field_svg(f, params, width, height)).collect()
}
