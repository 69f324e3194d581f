//! Arena-backed ray bookkeeping.
//!
//! Reflection and transmission turn one ray into two, recursively. Rather than deep-cloning a
//! ray's whole history at every hop, each spawn is appended to a flat arena as one hop-sized
//! record referencing its parent by index; the full vertex path is only materialized on demand.

use nalgebra::{Point2, Vector2};
use num_complex::Complex64;

use crate::antenna::Polarization;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RayId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpawnKind {
    Primary,
    Reflected,
    Refracted,
}

/// One hop of a ray: from `origin` to `end_point` (once resolved).
#[derive(Debug, Clone)]
pub struct RayRecord {
    pub parent: Option<RayId>,
    pub kind: SpawnKind,
    pub origin: Point2<f64>,
    pub direction: Vector2<f64>,
    /// Complex amplitude accumulated from every reflection/transmission along the path so far.
    pub amplitude: Complex64,
    pub polarization: Polarization,
    /// Cumulative distance from the transmitter to `end_point`, once resolved.
    pub distance: f64,
    /// Cumulative free-space path loss at `end_point`, once resolved.
    pub path_loss: f64,
    pub num_reflections: u32,
    pub num_transmissions: u32,
    /// Share of transmitter power carried by this ray (tx_power / num_rays).
    pub power: f64,
    pub end_point: Option<Point2<f64>>,
}

/// Flat store of every ray hop produced by a launch, plus a running count of hops abandoned due
/// to non-finite intermediate values.
#[derive(Debug, Default)]
pub struct RayArena {
    records: Vec<RayRecord>,
    skipped: u32,
}

impl RayArena {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, record: RayRecord) -> RayId {
        let id = RayId(self.records.len() as u32);
        self.records.push(record);
        id
    }

    pub fn get(&self, id: RayId) -> &RayRecord {
        &self.records[id.0 as usize]
    }

    pub fn get_mut(&mut self, id: RayId) -> &mut RayRecord {
        &mut self.records[id.0 as usize]
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn records(&self) -> &[RayRecord] {
        &self.records
    }

    pub fn into_records(self) -> Vec<RayRecord> {
        self.records
    }

    pub fn skipped(&self) -> u32 {
        self.skipped
    }

    pub fn record_skipped(&mut self) {
        self.skipped += 1;
    }

    /// Reconstructs the ordered vertex path leading to `id` by walking the parent chain.
    pub fn path(&self, id: RayId) -> Vec<Point2<f64>> {
        let mut origins = Vec::new();
        let mut current = Some(id);
        while let Some(cur) = current {
            let rec = self.get(cur);
            origins.push(rec.origin);
            current = rec.parent;
        }
        origins.reverse();
        if let Some(end) = self.get(id).end_point {
            origins.push(end);
        }
        origins
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dummy(parent: Option<RayId>, origin: Point2<f64>) -> RayRecord {
        RayRecord {
            parent,
            kind: SpawnKind::Primary,
            origin,
            direction: Vector2::new(1.0, 0.0),
            amplitude: Complex64::new(1.0, 0.0),
            polarization: Polarization::Te,
            distance: 0.0,
            path_loss: 0.0,
            num_reflections: 0,
            num_transmissions: 0,
            power: 1.0,
            end_point: None,
        }
    }

    #[test]
    fn path_reconstructs_through_parent_chain() {
        let mut arena = RayArena::new();
        let root = arena.push(dummy(None, Point2::new(0.0, 0.0)));
        arena.get_mut(root).end_point = Some(Point2::new(1.0, 0.0));

        let mut child = dummy(Some(root), Point2::new(1.0, 0.0));
        child.end_point = Some(Point2::new(1.0, 1.0));
        let child_id = arena.push(child);

        let path = arena.path(child_id);
        assert_eq!(path, vec![Point2::new(0.0, 0.0), Point2::new(1.0, 0.0), Point2::new(1.0, 1.0)]);
    }
}
