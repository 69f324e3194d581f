//! Run-wide knobs: termination budgets and the open-question policy toggles.

use serde::{Deserialize, Serialize};

use crate::antenna::Polarization;
use crate::error::{CoverageError, CoverageResult};

/// Termination and resolution limits for a single simulation run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Budgets {
    pub num_rays: u32,
    pub max_reflections: u32,
    pub max_transmissions: u32,
    pub max_path_loss: f64,
    pub polarization: Polarization,
    /// Receiver grid resolution per axis.
    pub resolution: u32,
    /// Half-width, in grid cells, of the near-transmitter guard zone.
    pub tx_zone_radius: f64,
    /// Use rayon to partition work across threads; disabled gives a fully sequential,
    /// single-threaded run.
    pub parallel: bool,
}

impl Default for Budgets {
    fn default() -> Self {
        Self {
            num_rays: 360,
            max_reflections: 2,
            max_transmissions: 1,
            max_path_loss: 1e6,
            polarization: Polarization::Te,
            resolution: 50,
            tx_zone_radius: 0.1,
            parallel: false,
        }
    }
}

impl Budgets {
    pub fn validate(&self) -> CoverageResult<()> {
        if self.num_rays == 0 {
            return Err(CoverageError::InvalidBudget("num_rays must be >= 1".into()));
        }
        if self.resolution == 0 {
            return Err(CoverageError::InvalidBudget("resolution must be >= 1".into()));
        }
        if !(self.max_path_loss.is_finite() && self.max_path_loss > 0.0) {
            return Err(CoverageError::InvalidBudget(format!(
                "max_path_loss must be positive and finite, got {}",
                self.max_path_loss
            )));
        }
        if !(self.tx_zone_radius.is_finite() && self.tx_zone_radius >= 0.0) {
            return Err(CoverageError::InvalidBudget(format!(
                "tx_zone_radius must be non-negative and finite, got {}",
                self.tx_zone_radius
            )));
        }
        Ok(())
    }
}

/// Toggles for propagation behaviors that admit more than one reasonable convention.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PropagationPolicy {
    /// Use the fixed 0.8 / 0.6 amplitude multipliers instead of computed Fresnel magnitudes.
    pub legacy_fixed_coefficients: bool,
    /// Only spawn a refracted child from a ray that has not yet reflected.
    pub refract_only_on_direct_path: bool,
    /// Bend the transmitted ray toward the Snell refraction angle instead of keeping it straight.
    pub apply_snell_on_transmission: bool,
}

impl Default for PropagationPolicy {
    fn default() -> Self {
        Self {
            legacy_fixed_coefficients: false,
            refract_only_on_direct_path: true,
            apply_snell_on_transmission: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_budgets_are_valid() {
        assert!(Budgets::default().validate().is_ok());
    }

    #[test]
    fn zero_rays_is_rejected() {
        let mut budgets = Budgets::default();
        budgets.num_rays = 0;
        assert!(budgets.validate().is_err());
    }
}
