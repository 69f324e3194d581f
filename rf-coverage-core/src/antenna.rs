//! The transmitter and its polarization/gain hooks.

use nalgebra::{Point2, Vector2};
use serde::{Deserialize, Serialize};

use crate::constants::SPEED_OF_LIGHT;
use crate::error::{CoverageError, CoverageResult};

/// Polarization of the launched wavefront; selects which Fresnel formula pair applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Polarization {
    /// Transverse electric (s-polarized).
    Te,
    /// Transverse magnetic (p-polarized).
    Tm,
}

impl Default for Polarization {
    fn default() -> Self {
        Polarization::Te
    }
}

/// Per-direction gain hook. Isotropic is the only implementation shipped; directional patterns
/// are out of scope but the trait seam is kept so adapters can plug one in later.
pub trait GainPattern: Send + Sync {
    fn gain_db(&self, direction: Vector2<f64>) -> f64;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct IsotropicGain;

impl GainPattern for IsotropicGain {
    fn gain_db(&self, _direction: Vector2<f64>) -> f64 {
        0.0
    }
}

/// A single fixed transmitter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Antenna {
    pub location: Point2<f64>,
    /// Transmit power in Watts.
    pub tx_power: f64,
    /// Carrier frequency in Hz.
    pub frequency: f64,
}

impl Antenna {
    pub fn new(location: Point2<f64>, tx_power: f64, frequency: f64) -> CoverageResult<Self> {
        if !(location.x.is_finite() && location.y.is_finite()) {
            return Err(CoverageError::InvalidGeometry(
                "antenna location must be finite".into(),
            ));
        }
        if !(tx_power.is_finite() && tx_power > 0.0) {
            return Err(CoverageError::InvalidBudget(format!(
                "tx_power must be positive and finite, got {tx_power}"
            )));
        }
        if !(frequency.is_finite() && frequency > 0.0) {
            return Err(CoverageError::InvalidBudget(format!(
                "frequency must be positive and finite, got {frequency}"
            )));
        }
        Ok(Self { location, tx_power, frequency })
    }

    pub fn wavelength(&self) -> f64 {
        SPEED_OF_LIGHT / self.frequency
    }
}
