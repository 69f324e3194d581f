//! Complex Fresnel reflection/transmission coefficients for a lossy dielectric slab.

use num_complex::Complex64;
use std::f64::consts::PI;

use crate::antenna::Polarization;
use crate::constants::{EPSILON_0, SPEED_OF_LIGHT};
use crate::geometry::Material;

/// Smallest |cos θ| treated as non-grazing; below this the incidence is clamped to avoid a
/// division blow-up in the reflection/transmission denominators.
const GRAZING_EPSILON: f64 = 1e-12;

#[derive(Debug, Clone, Copy)]
pub struct FresnelResult {
    pub reflection: Complex64,
    pub transmission: Complex64,
    /// Refraction angle in radians, measured from the wall normal.
    pub refracted_angle: f64,
}

pub struct FresnelKernel;

impl FresnelKernel {
    /// `incidence_angle` is in `[0, π/2]`, measured between the incoming ray and the wall
    /// normal (sign of the normal does not matter).
    pub fn evaluate(
        incidence_angle: f64,
        material: &Material,
        frequency: f64,
        polarization: Polarization,
    ) -> FresnelResult {
        let omega_eps0 = 2.0 * PI * frequency * EPSILON_0;
        let epsilon_c = Complex64::new(material.permittivity, -material.conductivity / omega_eps0);

        let mut cos_i = incidence_angle.cos();
        if cos_i.abs() < GRAZING_EPSILON {
            cos_i = GRAZING_EPSILON.copysign(cos_i);
        }
        let sin_i = incidence_angle.sin();

        let sin_t = (sin_i / epsilon_c.re.sqrt()).clamp(-1.0, 1.0);
        let cos_t = (1.0 - sin_t * sin_t).sqrt();
        let refracted_angle = sin_t.asin();

        let sqrt_term = (epsilon_c - Complex64::new(sin_i * sin_i, 0.0)).sqrt();

        let (reflection, mut transmission) = match polarization {
            Polarization::Te => {
                let denom = cos_i + sqrt_term;
                ((cos_i - sqrt_term) / denom, Complex64::new(2.0 * cos_i, 0.0) / denom)
            }
            Polarization::Tm => {
                let denom = epsilon_c * cos_i + sqrt_term;
                (
                    (epsilon_c * cos_i - sqrt_term) / denom,
                    (epsilon_c * Complex64::new(2.0 * cos_i, 0.0)) / denom,
                )
            }
        };

        let k = epsilon_c.sqrt() * Complex64::new(2.0 * PI * frequency / SPEED_OF_LIGHT, 0.0);
        let phase = Complex64::new(0.0, -1.0) * k * Complex64::new(material.thickness * cos_t, 0.0);
        transmission *= phase.exp();

        FresnelResult { reflection, transmission, refracted_angle }
    }
}
