use gcodescarf_core::ParameterError;
use serde::{Deserialize, Serialize};

/// Tuning parameters for the scarfing pass, all in printer units (mm)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScarfParameters {
    /// Height the starting taper ramps down from
    pub layer_height: f64,
    /// Arc length of the tapered overlap
    pub overlap: f64,
    /// Largest end-to-start gap still treated as a closed loop
    pub loop_tolerance: f64,
    /// Longest resampled step inside a taper
    pub taper_resolution: f64,
}

impl Default for ScarfParameters {
    fn default() -> Self {
        Self {
            layer_height: 0.2,
            overlap: 2.0,
            loop_tolerance: 0.1,
            taper_resolution: 0.5,
        }
    }
}

impl ScarfParameters {
    /// Every parameter must be a finite, strictly positive number
    pub fn validate(&self) -> Result<(), ParameterError> {
        for (name, value) in [
            ("layer_height", self.layer_height),
            ("overlap", self.overlap),
            ("loop_tolerance", self.loop_tolerance),
            ("taper_resolution", self.taper_resolution),
        ] {
            if !value.is_finite() {
                return Err(ParameterError::InvalidValue {
                    name: name.to_string(),
                    reason: format!("{} is not a finite number", value),
                });
            }
            if value <= 0.0 {
                return Err(ParameterError::OutOfRange {
                    name: name.to_string(),
                    value,
                    min: 0.0,
                });
            }
        }
        Ok(())
    }
}
