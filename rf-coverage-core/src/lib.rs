//! 2D ray-launching engine for indoor RF coverage.
//!
//! A transmitter launches a fan of rays across a floor plan of straight walls. Each ray
//! reflects and refracts recursively, accumulating a complex amplitude from Fresnel
//! coefficients, until a termination budget (reflection count, transmission count, or path
//! loss) is exceeded. A receiver grid then sums the linear power of every ray segment crossing
//! each cell and reports the result in dBm.
//!
//! ```
//! use nalgebra::Point2;
//! use rf_coverage_core::prelude::*;
//!
//! let mut environment = Environment::new((10.0, 8.0))?;
//! environment.add_wall(Wall::new(
//!     Point2::new(5.0, 0.0),
//!     Point2::new(5.0, 8.0),
//!     Material::default_wall(),
//! )?);
//!
//! let antenna = Antenna::new(Point2::new(2.0, 4.0), 0.03, 2.4e9)?;
//! let simulation = Simulation::new(environment, antenna, Budgets::default(), PropagationPolicy::default())?;
//! let output = simulation.run(&mut NullProgress, &CancellationToken::new())?;
//! assert_eq!(output.received_power.len(), Budgets::default().resolution as usize);
//! # Ok::<(), CoverageError>(())
//! ```

pub mod antenna;
pub mod config;
pub mod error;
pub mod fresnel;
pub mod geometry;
pub mod grid;
pub mod progress;
pub mod ray;
pub mod simulator;
pub mod tracer;

/// Physical constants used throughout the engine.
pub mod constants {
    /// Speed of light in vacuum, m/s.
    pub const SPEED_OF_LIGHT: f64 = 299_792_458.0;
    /// Vacuum permittivity, F/m.
    pub const EPSILON_0: f64 = 8.854_187_817e-12;
}

/// Commonly used types re-exported for convenience.
pub mod prelude {
    pub use crate::antenna::{Antenna, GainPattern, IsotropicGain, Polarization};
    pub use crate::config::{Budgets, PropagationPolicy};
    pub use crate::error::{CoverageError, CoverageResult};
    pub use crate::fresnel::{FresnelKernel, FresnelResult};
    pub use crate::geometry::{Collision, Environment, Material, Wall};
    pub use crate::grid::{PowerAggregator, ReceiverGrid};
    pub use crate::progress::{CancellationToken, FnProgress, NullProgress, Phase, ProgressSink};
    pub use crate::ray::{RayArena, RayId, RayRecord, SpawnKind};
    pub use crate::simulator::{RunOutput, Simulation};
}
