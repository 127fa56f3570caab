//! Illustrative dipole field driven by the audio-derived current
//!
//! Not a Maxwell solver. Each point gets a closed-form oscillating vector:
//! x and y follow `sin(phase)` scaled along the radial direction, z follows
//! `cos(phase)` weighted by `cos(atan2(distance, z))`. The x/y vs z asymmetry
//! is part of the reference output and must stay as is.

use crate::error::SimError;
use nalgebra::Vector3;
use std::f64::consts::PI;

/// Point at which the field is sampled
pub type SpatialSample = Vector3<f64>;

/// Field value at one sample point
pub type FieldVector = Vector3<f64>;

/// Distances below this are floored to keep the x/y terms bounded near the origin
pub const MIN_DISTANCE: f64 = 0.1;

/// Evaluate the field at every point, in input order.
///
/// Fails on an empty batch, non-finite inputs, or a negative frequency.
/// A zero frequency gives a static pattern.
pub fn evaluate_field(
    points: &[SpatialSample],
    current: f64,
    frequency: f64,
    time: f64,
) -> Result<Vec<FieldVector>, SimError> {
    if points.is_empty() {
        return Err(SimError::InvalidInput("point batch is empty".into()));
    }
    if !current.is_finite() {
        return Err(SimError::InvalidInput(format!("current must be finite, got {}", current)));
    }
    if !frequency.is_finite() || frequency < 0.0 {
        return Err(SimError::InvalidInput(format!(
            "frequency must be finite and non-negative, got {}",
            frequency
        )));
    }
    if !time.is_finite() {
        return Err(SimError::InvalidInput(format!("time must be finite, got {}", time)));
    }
    if let Some(i) = points.iter().position(|p| !p.iter().all(|c| c.is_finite())) {
        return Err(SimError::InvalidInput(format!("point {} has a non-finite coordinate", i)));
    }

    Ok(points
        .iter()
        .map(|p| field_at(p, current, frequency, time))
        .collect())
}

fn field_at(p: &SpatialSample, current: f64, frequency: f64, time: f64) -> FieldVector {
    let distance = p.norm();
    let safe_distance = distance.max(MIN_DISTANCE);
    let phase = 2.0 * PI * (frequency * time - distance / 2.0);

    let radial = current * phase.sin() / safe_distance;
    Vector3::new(
        radial * p.x,
        radial * p.y,
        current * phase.cos() * distance.atan2(p.z).cos(),
    )
}

/// One evaluated time step, ready to encode or render
#[derive(Debug, Clone, PartialEq)]
pub struct FieldFrame {
    pub time: f64,
    pub amplitude: f64,
    pub current: f64,
    pub frequency: f64,
    pub points: Vec<SpatialSample>,
    pub vectors: Vec<FieldVector>,
}

impl FieldFrame {
    pub fn magnitudes(&self) -> Vec<f64> {
        self.vectors.iter().map(|v| v.norm()).collect()
    }

    /// Largest vector magnitude in the frame (0 for an all-zero frame)
    pub fn peak_magnitude(&self) -> f64 {
        self.vectors.iter().fold(0.0, |peak, v| peak.max(v.norm()))
    }

    pub fn to_binary(&self) -> Vec<u8> {
        let count = self.points.len();
        let mut data = Vec::with_capacity(28 + count * 28);

        // Header: type marker
        data.extend_from_slice(b"FIELD\0\0\0");

        data.extend_from_slice(&(self.time as f32).to_le_bytes());
        data.extend_from_slice(&(self.current as f32).to_le_bytes());
        data.extend_from_slice(&(self.frequency as f32).to_le_bytes());
        data.extend_from_slice(&(count as u32).to_le_bytes());

        for p in &self.points {
            for &c in p.iter() {
                data.extend_from_slice(&(c as f32).to_le_bytes());
            }
        }
        for v in &self.vectors {
            for &c in v.iter() {
                data.extend_from_slice(&(c as f32).to_le_bytes());
            }
        }
        for m in self.magnitudes() {
            data.extend_from_slice(&(m as f32).to_le_bytes());
        }

        data
    }
}
