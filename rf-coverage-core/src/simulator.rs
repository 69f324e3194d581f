//! Top-level facade: wires the tracer and the receiver grid into a single run.

use std::time::Instant;

use nalgebra::Point2;
use serde::{Deserialize, Serialize};

use crate::antenna::Antenna;
use crate::config::{Budgets, PropagationPolicy};
use crate::error::CoverageResult;
use crate::geometry::Environment;
use crate::grid::{PowerAggregator, ReceiverGrid};
use crate::progress::{CancellationToken, ProgressSink};
use crate::tracer::RayTracer;

/// Everything a single run produces: the coverage matrix plus enough geometry to render it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunOutput {
    /// `[row][col]` received power in dBm.
    pub received_power: Vec<Vec<f64>>,
    pub rays: Vec<(Point2<f64>, Point2<f64>)>,
    pub walls: Vec<(Point2<f64>, Point2<f64>)>,
    pub skipped_rays: u32,
}

/// A fully specified simulation: geometry, transmitter, and run budgets.
pub struct Simulation {
    pub environment: Environment,
    pub antenna: Antenna,
    pub budgets: Budgets,
    pub policy: PropagationPolicy,
}

impl Simulation {
    pub fn new(
        environment: Environment,
        antenna: Antenna,
        budgets: Budgets,
        policy: PropagationPolicy,
    ) -> CoverageResult<Self> {
        budgets.validate()?;
        Ok(Self { environment, antenna, budgets, policy })
    }

    pub fn run(&self, progress: &mut dyn ProgressSink, cancel: &CancellationToken) -> CoverageResult<RunOutput> {
        self.budgets.validate()?;
        let start = Instant::now();
        tracing::info!(
            num_rays = self.budgets.num_rays,
            resolution = self.budgets.resolution,
            "starting coverage run"
        );

        let tracer = RayTracer::new(&self.environment, &self.antenna, &self.budgets, &self.policy);
        let arena = tracer.launch(progress, cancel)?;
        tracing::debug!(rays = arena.len(), "ray launch complete");

        let mut grid = ReceiverGrid::new(self.environment.dimensions, self.budgets.resolution)?;
        let aggregator = PowerAggregator::new(&self.antenna, self.budgets.tx_zone_radius);
        aggregator.fill(&mut grid, &arena, progress, cancel, self.budgets.parallel)?;

        let rays = arena
            .records()
            .iter()
            .filter_map(|r| r.end_point.map(|end| (r.origin, end)))
            .collect();
        let walls = self.environment.walls.iter().map(|w| (w.a, w.b)).collect();

        let (min_dbm, max_dbm) = summarize(&grid.received_power);
        tracing::info!(
            min_dbm,
            max_dbm,
            elapsed_ms = start.elapsed().as_millis() as u64,
            skipped_rays = arena.skipped(),
            "coverage run complete"
        );

        Ok(RunOutput {
            received_power: grid.received_power,
            rays,
            walls,
            skipped_rays: arena.skipped(),
        })
    }
}

fn summarize(matrix: &[Vec<f64>]) -> (f64, f64) {
    let mut min = f64::INFINITY;
    let mut max = f64::NEG_INFINITY;
    for row in matrix {
        for &v in row {
            min = min.min(v);
            max = max.max(v);
        }
    }
    (min, max)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{Material, Wall};
    use crate::progress::NullProgress;

    #[test]
    fn end_to_end_run_produces_a_full_grid() {
        let mut env = Environment::new((10.0, 10.0)).unwrap();
        env.add_wall(Wall::new(Point2::new(7.0, 0.0), Point2::new(7.0, 10.0), Material::default_wall()).unwrap());
        let antenna = Antenna::new(Point2::new(5.0, 5.0), 0.03, 2.4e9).unwrap();
        let budgets = Budgets { num_rays: 72, resolution: 20, ..Budgets::default() };
        let sim = Simulation::new(env, antenna, budgets, PropagationPolicy::default()).unwrap();

        let output = sim.run(&mut NullProgress, &CancellationToken::new()).unwrap();
        assert_eq!(output.received_power.len(), 20);
        assert_eq!(output.received_power[0].len(), 20);
        assert_eq!(output.walls.len(), 1);
        assert!(!output.rays.is_empty());
    }

    #[test]
    fn cancellation_before_launch_aborts_the_run() {
        let env = Environment::new((10.0, 10.0)).unwrap();
        let antenna = Antenna::new(Point2::new(5.0, 5.0), 0.03, 2.4e9).unwrap();
        let sim = Simulation::new(env, antenna, Budgets::default(), PropagationPolicy::default()).unwrap();
        let cancel = CancellationToken::new();
        cancel.cancel();

        assert!(sim.run(&mut NullProgress, &cancel).is_err());
    }
}
