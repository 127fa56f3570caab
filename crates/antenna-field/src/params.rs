//! Simulation parameters and partial updates

use crate::error::SimError;
use serde::{Deserialize, Serialize};

/// Antenna and drive configuration for one session
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SimulationParameters {
    /// Physical antenna length (m)
    pub antenna_length: f64,
    /// Antenna radius (m)
    pub antenna_radius: f64,
    /// Drive current at full-scale amplitude (A)
    pub max_current: f64,
    /// Drive current at silence (A)
    pub min_current: f64,
    /// Drive frequency (Hz)
    pub frequency: f64,
}

impl Default for SimulationParameters {
    fn default() -> Self {
        Self {
            antenna_length: 1.0,
            antenna_radius: 0.02,
            max_current: 1.0,
            min_current: 0.1,
            frequency: 1.0,
        }
    }
}

impl SimulationParameters {
    /// Check every parameter invariant
    pub fn validate(&self) -> Result<(), SimError> {
        let fields = [
            ("antennaLength", self.antenna_length),
            ("antennaRadius", self.antenna_radius),
            ("maxCurrent", self.max_current),
            ("minCurrent", self.min_current),
            ("frequency", self.frequency),
        ];
        for (name, value) in fields {
            if !value.is_finite() {
                return Err(SimError::parameter(name, format!("must be finite, got {}", value)));
            }
        }

        if self.antenna_length <= 0.0 {
            return Err(SimError::parameter("antennaLength", "must be positive"));
        }
        if self.antenna_radius <= 0.0 {
            return Err(SimError::parameter("antennaRadius", "must be positive"));
        }
        if self.min_current < 0.0 {
            return Err(SimError::parameter("minCurrent", "must not be negative"));
        }
        if self.min_current > self.max_current {
            return Err(SimError::parameter(
                "minCurrent",
                format!(
                    "min current {} exceeds max current {}",
                    self.min_current, self.max_current
                ),
            ));
        }
        if self.frequency < 0.0 {
            return Err(SimError::parameter("frequency", "must not be negative"));
        }
        Ok(())
    }

    /// Apply a partial update. The merged values are validated first and
    /// nothing changes if they are rejected.
    pub fn apply(&mut self, update: &ParameterUpdate) -> Result<(), SimError> {
        let merged = update.merged_onto(self);
        merged.validate()?;
        *self = merged;
        Ok(())
    }
}

/// Partial parameter update; omitted fields keep their current value
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParameterUpdate {
    #[serde(default, alias = "length", skip_serializing_if = "Option::is_none")]
    pub antenna_length: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub antenna_radius: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub frequency: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_current: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_current: Option<f64>,
}

impl ParameterUpdate {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    fn merged_onto(&self, base: &SimulationParameters) -> SimulationParameters {
        SimulationParameters {
            antenna_length: self.antenna_length.unwrap_or(base.antenna_length),
            antenna_radius: self.antenna_radius.unwrap_or(base.antenna_radius),
            max_current: self.max_current.unwrap_or(base.max_current),
            min_current: self.min_current.unwrap_or(base.min_current),
            frequency: self.frequency.unwrap_or(base.frequency),
        }
    }
}
