//! Spherical sample-point grids around the antenna

use crate::field::SpatialSample;
use std::f64::consts::PI;

pub const DEFAULT_RADII: usize = 10;
pub const DEFAULT_THETAS: usize = 15;
pub const DEFAULT_PHIS: usize = 30;
pub const DEFAULT_R_MIN: f64 = 0.2;
pub const DEFAULT_R_MAX: f64 = 2.0;

/// Evenly spaced values over [start, end], both ends included
fn linspace(start: f64, end: f64, n: usize) -> impl Iterator<Item = f64> {
    let step = if n > 1 { (end - start) / (n - 1) as f64 } else { 0.0 };
    (0..n).map(move |i| start + step * i as f64)
}

/// Points `r (sinθ cosφ, sinθ sinφ, cosθ)` for r in [r_min, r_max],
/// θ in [0, π] and φ in [0, 2π]. Radius varies slowest, φ fastest.
pub fn spherical_grid(radii: usize, thetas: usize, phis: usize, r_min: f64, r_max: f64) -> Vec<SpatialSample> {
    let mut points = Vec::with_capacity(radii * thetas * phis);
    for r in linspace(r_min, r_max, radii) {
        for theta in linspace(0.0, PI, thetas) {
            for phi in linspace(0.0, 2.0 * PI, phis) {
                points.push(SpatialSample::new(
                    r * theta.sin() * phi.cos(),
                    r * theta.sin() * phi.sin(),
                    r * theta.cos(),
                ));
            }
        }
    }
    points
}

/// 10 shells from 0.2 to 2.0, 15 polar by 30 azimuthal samples each
pub fn default_grid() -> Vec<SpatialSample> {
    spherical_grid(DEFAULT_RADII, DEFAULT_THETAS, DEFAULT_PHIS, DEFAULT_R_MIN, DEFAULT_R_MAX)
}

/// Coarser grid for rendered frames, keeping SVG output small
pub fn preview_grid() -> Vec<SpatialSample> {
    spherical_grid(5, 9, 16, DEFAULT_R_MIN, DEFAULT_R_MAX)
}
