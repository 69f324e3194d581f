//! Ray launching: spawns primary rays around the transmitter and recursively reflects/refracts
//! them off walls until a termination budget is hit.

use std::f64::consts::PI;
use std::sync::atomic::{AtomicBool, Ordering};

use nalgebra::Vector2;
use num_complex::Complex64;
use rayon::prelude::*;

use crate::antenna::Antenna;
use crate::config::{Budgets, PropagationPolicy};
use crate::error::CoverageResult;
use crate::fresnel::FresnelKernel;
use crate::geometry::{self, Environment};
use crate::progress::{CancellationToken, Phase, ProgressSink};
use crate::ray::{RayArena, RayId, RayRecord, SpawnKind};

pub struct RayTracer<'a> {
    environment: &'a Environment,
    antenna: &'a Antenna,
    budgets: &'a Budgets,
    policy: &'a PropagationPolicy,
}

impl<'a> RayTracer<'a> {
    pub fn new(
        environment: &'a Environment,
        antenna: &'a Antenna,
        budgets: &'a Budgets,
        policy: &'a PropagationPolicy,
    ) -> Self {
        Self { environment, antenna, budgets, policy }
    }

    pub fn launch(
        &self,
        progress: &mut dyn ProgressSink,
        cancel: &CancellationToken,
    ) -> CoverageResult<RayArena> {
        if self.budgets.parallel && self.budgets.num_rays > 1 {
            self.launch_parallel(progress, cancel)
        } else {
            self.launch_sequential(progress, cancel)
        }
    }

    fn root_record(&self, index: u32) -> RayRecord {
        let angle = 2.0 * PI * index as f64 / self.budgets.num_rays as f64;
        RayRecord {
            parent: None,
            kind: SpawnKind::Primary,
            origin: self.antenna.location,
            direction: Vector2::new(angle.cos(), angle.sin()),
            amplitude: Complex64::new(1.0, 0.0),
            polarization: self.budgets.polarization,
            distance: 0.0,
            path_loss: 0.0,
            num_reflections: 0,
            num_transmissions: 0,
            power: self.antenna.tx_power / self.budgets.num_rays as f64,
            end_point: None,
        }
    }

    fn launch_sequential(
        &self,
        progress: &mut dyn ProgressSink,
        cancel: &CancellationToken,
    ) -> CoverageResult<RayArena> {
        let mut arena = RayArena::new();
        let n = self.budgets.num_rays;
        for i in 0..n {
            if cancel.is_cancelled() {
                return Err(crate::error::CoverageError::Cancelled);
            }
            let root = arena.push(self.root_record(i));
            self.propagate(&mut arena, root);
            progress.on_progress(Phase::RayLaunch, (i + 1) as u64, n as u64);
        }
        Ok(arena)
    }

    fn launch_parallel(
        &self,
        progress: &mut dyn ProgressSink,
        cancel: &CancellationToken,
    ) -> CoverageResult<RayArena> {
        let n = self.budgets.num_rays;
        let cancelled = AtomicBool::new(false);

        let shards: Vec<Option<Vec<RayRecord>>> = (0..n)
            .into_par_iter()
            .map(|i| {
                if cancel.is_cancelled() {
                    cancelled.store(true, Ordering::Relaxed);
                    return None;
                }
                let mut local = RayArena::new();
                let root = local.push(self.root_record(i));
                self.propagate(&mut local, root);
                Some(local.into_records())
            })
            .collect();

        if cancelled.load(Ordering::Relaxed) || shards.iter().any(Option::is_none) {
            return Err(crate::error::CoverageError::Cancelled);
        }

        let mut arena = RayArena::new();
        for records in shards.into_iter().flatten() {
            let offset = arena.len() as u32;
            for mut record in records {
                record.parent = record.parent.map(|RayId(p)| RayId(p + offset));
                arena.push(record);
            }
        }
        progress.on_progress(Phase::RayLaunch, n as u64, n as u64);
        Ok(arena)
    }

    /// Drives one primary ray and every descendant it spawns to termination, depth-first.
    fn propagate(&self, arena: &mut RayArena, root: RayId) {
        let mut pending = vec![root];
        while let Some(id) = pending.pop() {
            self.step(arena, id, &mut pending);
        }
    }

    fn step(&self, arena: &mut RayArena, id: RayId, pending: &mut Vec<RayId>) {
        let (num_reflections, num_transmissions, path_loss, origin, direction, distance, polarization, amplitude, power) = {
            let rec = arena.get(id);
            (
                rec.num_reflections,
                rec.num_transmissions,
                rec.path_loss,
                rec.origin,
                rec.direction,
                rec.distance,
                rec.polarization,
                rec.amplitude,
                rec.power,
            )
        };

        if num_reflections > self.budgets.max_reflections
            || num_transmissions > self.budgets.max_transmissions
            || path_loss > self.budgets.max_path_loss
        {
            arena.get_mut(id).end_point = Some(origin);
            return;
        }

        match geometry::closest_hit(origin, direction, &self.environment.walls) {
            None => {
                arena.get_mut(id).end_point = Some(self.environment.boundary_exit(origin, direction));
            }
            Some(collision) => {
                let wall = &self.environment.walls[collision.wall_index];
                let new_distance = distance + collision.distance;
                let wavelength = self.antenna.wavelength();
                let new_path_loss = (4.0 * PI * new_distance / wavelength).powi(2);

                {
                    let rec = arena.get_mut(id);
                    rec.distance = new_distance;
                    rec.path_loss = new_path_loss;
                    rec.end_point = Some(collision.point);
                }

                if new_path_loss > self.budgets.max_path_loss {
                    return;
                }

                let normal = wall.normal();
                let cos_i = direction.dot(&normal).clamp(-1.0, 1.0).abs();
                let incidence_angle = cos_i.acos();

                if !incidence_angle.is_finite() {
                    arena.record_skipped();
                    tracing::warn!(wall = collision.wall_index, "non-finite incidence angle, dropping ray branch");
                    return;
                }

                let fresnel =
                    FresnelKernel::evaluate(incidence_angle, &wall.material, self.antenna.frequency, polarization);

                let reflected_direction = direction - normal * (2.0 * direction.dot(&normal));
                // |Γ| rather than the complex Γ: only the squared magnitude of the accumulated
                // amplitude ever reaches the power sum, so phase carries no information here.
                let reflection_amp = if self.policy.legacy_fixed_coefficients {
                    Complex64::new(0.8, 0.0)
                } else {
                    Complex64::new(fresnel.reflection.norm(), 0.0)
                };
                let reflected_amplitude = amplitude * reflection_amp;

                let reflection_budget_exhausted = num_reflections >= self.budgets.max_reflections;

                if !reflection_budget_exhausted {
                    if reflected_amplitude.re.is_finite() && reflected_amplitude.im.is_finite() {
                        let reflected = RayRecord {
                            parent: Some(id),
                            kind: SpawnKind::Reflected,
                            origin: collision.point,
                            direction: reflected_direction,
                            amplitude: reflected_amplitude,
                            polarization,
                            distance: new_distance,
                            path_loss: new_path_loss,
                            num_reflections: num_reflections + 1,
                            num_transmissions,
                            power,
                            end_point: None,
                        };
                        pending.push(arena.push(reflected));
                    } else {
                        arena.record_skipped();
                    }
                }

                let refraction_budget_exhausted = num_transmissions >= self.budgets.max_transmissions;
                let should_refract = !refraction_budget_exhausted
                    && if self.policy.refract_only_on_direct_path {
                        num_reflections == 0
                    } else {
                        true
                    };

                if should_refract {
                    let refracted_direction = if self.policy.apply_snell_on_transmission {
                        rotate(direction, fresnel.refracted_angle - incidence_angle)
                    } else {
                        direction
                    };
                    let transmission_amp = if self.policy.legacy_fixed_coefficients {
                        Complex64::new(0.6, 0.0)
                    } else {
                        Complex64::new(fresnel.transmission.norm(), 0.0)
                    };
                    let refracted_amplitude = amplitude * transmission_amp;

                    if refracted_amplitude.re.is_finite() && refracted_amplitude.im.is_finite() {
                        let refracted = RayRecord {
                            parent: Some(id),
                            kind: SpawnKind::Refracted,
                            origin: collision.point,
                            direction: refracted_direction,
                            amplitude: refracted_amplitude,
                            polarization,
                            distance: new_distance,
                            path_loss: new_path_loss,
                            num_reflections,
                            num_transmissions: num_transmissions + 1,
                            power,
                            end_point: None,
                        };
                        pending.push(arena.push(refracted));
                    } else {
                        arena.record_skipped();
                    }
                }
            }
        }
    }
}

/// Rotates a 2D direction vector by `angle` radians.
fn rotate(direction: Vector2<f64>, angle: f64) -> Vector2<f64> {
    let (s, c) = angle.sin_cos();
    Vector2::new(direction.x * c - direction.y * s, direction.x * s + direction.y * c)
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::Point2;

    use crate::antenna::Antenna;
    use crate::geometry::{Environment, Material, Wall};
    use crate::progress::NullProgress;

    fn antenna() -> Antenna {
        Antenna::new(Point2::new(5.0, 5.0), 0.03, 2.4e9).unwrap()
    }

    #[test]
    fn empty_room_rays_terminate_at_the_boundary() {
        let env = Environment::new((10.0, 10.0)).unwrap();
        let antenna = antenna();
        let budgets = Budgets { num_rays: 8, ..Budgets::default() };
        let policy = PropagationPolicy::default();
        let tracer = RayTracer::new(&env, &antenna, &budgets, &policy);
        let arena = tracer.launch(&mut NullProgress, &CancellationToken::new()).unwrap();

        assert_eq!(arena.len(), 8);
        for record in arena.records() {
            assert!(record.end_point.is_some());
            assert_eq!(record.num_reflections, 0);
        }
    }

    #[test]
    fn a_wall_spawns_reflected_and_refracted_children() {
        let mut env = Environment::new((10.0, 10.0)).unwrap();
        env.add_wall(Wall::new(Point2::new(7.0, 0.0), Point2::new(7.0, 10.0), Material::default_wall()).unwrap());
        let antenna = antenna();
        let budgets = Budgets { num_rays: 4, max_reflections: 1, max_transmissions: 1, ..Budgets::default() };
        let policy = PropagationPolicy::default();
        let tracer = RayTracer::new(&env, &antenna, &budgets, &policy);
        let arena = tracer.launch(&mut NullProgress, &CancellationToken::new()).unwrap();

        // The rightward-pointing primary ray should hit the wall and spawn at least one child.
        assert!(arena.len() > 4);
        assert!(arena.records().iter().any(|r| r.kind == SpawnKind::Reflected));
    }

    #[test]
    fn reflection_budget_caps_reflection_count() {
        let mut env = Environment::new((10.0, 10.0)).unwrap();
        env.add_wall(Wall::new(Point2::new(6.0, 0.0), Point2::new(6.0, 10.0), Material::default_wall()).unwrap());
        env.add_wall(Wall::new(Point2::new(4.0, 0.0), Point2::new(4.0, 10.0), Material::default_wall()).unwrap());
        let antenna = antenna();
        let budgets = Budgets { num_rays: 4, max_reflections: 1, max_transmissions: 0, max_path_loss: 1e12, ..Budgets::default() };
        let policy = PropagationPolicy::default();
        let tracer = RayTracer::new(&env, &antenna, &budgets, &policy);
        let arena = tracer.launch(&mut NullProgress, &CancellationToken::new()).unwrap();

        for record in arena.records() {
            assert!(record.num_reflections <= budgets.max_reflections + 1);
        }
    }

    #[test]
    fn sequential_and_parallel_launches_agree_on_ray_count() {
        let mut env = Environment::new((10.0, 10.0)).unwrap();
        env.add_wall(Wall::new(Point2::new(7.0, 0.0), Point2::new(7.0, 10.0), Material::default_wall()).unwrap());
        let antenna = antenna();
        let sequential_budgets = Budgets { num_rays: 16, parallel: false, ..Budgets::default() };
        let parallel_budgets = Budgets { num_rays: 16, parallel: true, ..Budgets::default() };
        let policy = PropagationPolicy::default();

        let seq_arena = RayTracer::new(&env, &antenna, &sequential_budgets, &policy)
            .launch(&mut NullProgress, &CancellationToken::new())
            .unwrap();
        let par_arena = RayTracer::new(&env, &antenna, &parallel_budgets, &policy)
            .launch(&mut NullProgress, &CancellationToken::new())
            .unwrap();

        assert_eq!(seq_arena.len(), par_arena.len());
    }
}
