//! Amplitude to drive-current mapping

use crate::params::SimulationParameters;

/// Linear map of an amplitude in [0, 1] onto [min_current, max_current].
///
/// Out-of-range amplitudes are clamped to [0, 1] (NaN reads as 0) so the
/// result never leaves the configured current range.
pub fn map_current(amplitude: f64, params: &SimulationParameters) -> f64 {
    let amplitude = if amplitude.is_nan() { 0.0 } else { amplitude.clamp(0.0, 1.0) };
    params.min_current + (params.max_current - params.min_current) * amplitude
}
