//! Walls, materials and the line-segment intersection kernel.

use nalgebra::{Point2, Vector2};
use serde::{Deserialize, Serialize};

use crate::error::{CoverageError, CoverageResult};

/// Below this ray parameter a hit is treated as touching its own origin and discarded.
pub const INTERSECTION_EPSILON: f64 = 1e-9;

/// Electrical properties of a wall slab.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Material {
    /// Relative permittivity (εr), must be > 0.
    pub permittivity: f64,
    /// Conductivity (σ) in S/m, must be >= 0.
    pub conductivity: f64,
    /// Slab thickness in meters, must be > 0.
    pub thickness: f64,
}

impl Material {
    pub fn new(permittivity: f64, conductivity: f64, thickness: f64) -> CoverageResult<Self> {
        if !(permittivity.is_finite() && permittivity > 0.0) {
            return Err(CoverageError::InvalidGeometry(format!(
                "permittivity must be positive and finite, got {permittivity}"
            )));
        }
        if !(conductivity.is_finite() && conductivity >= 0.0) {
            return Err(CoverageError::InvalidGeometry(format!(
                "conductivity must be non-negative and finite, got {conductivity}"
            )));
        }
        if !(thickness.is_finite() && thickness > 0.0) {
            return Err(CoverageError::InvalidGeometry(format!(
                "thickness must be positive and finite, got {thickness}"
            )));
        }
        Ok(Self {
            permittivity,
            conductivity,
            thickness,
        })
    }

    /// The interior wall material observed in the reference floor plans.
    pub fn default_wall() -> Self {
        Self {
            permittivity: 2.8,
            conductivity: 1e-4,
            thickness: 0.15,
        }
    }
}

/// A straight reflecting/transmitting obstacle between two endpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Wall {
    pub a: Point2<f64>,
    pub b: Point2<f64>,
    pub material: Material,
    normal: Vector2<f64>,
}

impl Wall {
    pub fn new(a: Point2<f64>, b: Point2<f64>, material: Material) -> CoverageResult<Self> {
        if !(a.x.is_finite() && a.y.is_finite() && b.x.is_finite() && b.y.is_finite()) {
            return Err(CoverageError::InvalidGeometry(
                "wall endpoints must be finite".into(),
            ));
        }
        let d = b - a;
        if d.norm() < f64::EPSILON {
            return Err(CoverageError::InvalidGeometry(
                "wall endpoints must be distinct".into(),
            ));
        }
        let normal = Vector2::new(-d.y, d.x).normalize();
        Ok(Self { a, b, material, normal })
    }

    /// Unit normal. Sign is unspecified (depends on endpoint order); callers that need an
    /// incidence angle must use its absolute cosine, see [`Wall::normal`] callers in `tracer`.
    pub fn normal(&self) -> Vector2<f64> {
        self.normal
    }
}

/// The bounded rectangular floor plan and its walls.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Environment {
    pub dimensions: (f64, f64),
    pub walls: Vec<Wall>,
}

impl Environment {
    pub fn new(dimensions: (f64, f64)) -> CoverageResult<Self> {
        if !(dimensions.0.is_finite() && dimensions.0 > 0.0 && dimensions.1.is_finite() && dimensions.1 > 0.0) {
            return Err(CoverageError::InvalidGeometry(
                "environment dimensions must be positive and finite".into(),
            ));
        }
        Ok(Self { dimensions, walls: Vec::new() })
    }

    pub fn with_walls(dimensions: (f64, f64), walls: Vec<Wall>) -> CoverageResult<Self> {
        let mut env = Self::new(dimensions)?;
        env.walls = walls;
        Ok(env)
    }

    pub fn add_wall(&mut self, wall: Wall) {
        self.walls.push(wall);
    }

    /// Diagonal length of the bounding rectangle.
    pub fn extent(&self) -> f64 {
        (self.dimensions.0.powi(2) + self.dimensions.1.powi(2)).sqrt()
    }

    /// Where a ray that hits no wall exits the floor plan's bounding rectangle.
    pub fn boundary_exit(&self, origin: Point2<f64>, direction: Vector2<f64>) -> Point2<f64> {
        let (w, h) = self.dimensions;
        let mut t = f64::INFINITY;
        if direction.x > f64::EPSILON {
            t = t.min((w - origin.x) / direction.x);
        } else if direction.x < -f64::EPSILON {
            t = t.min((0.0 - origin.x) / direction.x);
        }
        if direction.y > f64::EPSILON {
            t = t.min((h - origin.y) / direction.y);
        } else if direction.y < -f64::EPSILON {
            t = t.min((0.0 - origin.y) / direction.y);
        }
        if !t.is_finite() || t < 0.0 {
            t = self.extent();
        }
        origin + direction * t
    }
}

/// A ray hitting the closest wall along its path.
#[derive(Debug, Clone, Copy)]
pub struct Collision {
    pub wall_index: usize,
    pub point: Point2<f64>,
    pub distance: f64,
}

/// Intersects a half-line `origin + t*direction` (`t > 0`) against segment `a..b`.
///
/// `direction` need not be normalized; the returned `t` is then a scale factor, not a distance.
/// Tracer callers always pass a unit `direction`.
pub fn intersect_segment(
    origin: Point2<f64>,
    direction: Vector2<f64>,
    a: Point2<f64>,
    b: Point2<f64>,
) -> Option<(Point2<f64>, f64)> {
    let denom = (a.x - b.x) * (-direction.y) - (a.y - b.y) * (-direction.x);
    if denom.abs() < f64::EPSILON {
        return None;
    }

    let rx3 = origin.x;
    let ry3 = origin.y;
    let rx4 = origin.x + direction.x;
    let ry4 = origin.y + direction.y;

    let wall_param = ((a.x - rx3) * (ry3 - ry4) - (a.y - ry3) * (rx3 - rx4)) / denom;
    let ray_param = ((b.x - a.x) * (a.y - ry3) - (b.y - a.y) * (a.x - rx3)) / denom;

    if wall_param > 0.0 && wall_param < 1.0 && ray_param > INTERSECTION_EPSILON {
        let point = Point2::new(a.x + wall_param * (b.x - a.x), a.y + wall_param * (b.y - a.y));
        Some((point, ray_param))
    } else {
        None
    }
}

/// Finds the nearest wall a ray hits, breaking ties by wall index for determinism.
pub fn closest_hit(origin: Point2<f64>, direction: Vector2<f64>, walls: &[Wall]) -> Option<Collision> {
    let mut best: Option<Collision> = None;
    for (wall_index, wall) in walls.iter().enumerate() {
        if let Some((point, distance)) = intersect_segment(origin, direction, wall.a, wall.b) {
            let better = match best {
                Some(b) => distance < b.distance,
                None => true,
            };
            if better {
                best = Some(Collision { wall_index, point, distance });
            }
        }
    }
    best
}
