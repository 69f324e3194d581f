//! Receiver grid: per-cell linear power summation, converted to dBm.

use std::f64::consts::PI;

use nalgebra::Point2;
use rayon::prelude::*;

use crate::antenna::Antenna;
use crate::error::{CoverageError, CoverageResult};
use crate::progress::{CancellationToken, Phase, ProgressSink};
use crate::ray::RayArena;

/// Floor applied to a cell with no received power, matching `10*log10(1e-12)`.
pub const DBM_FLOOR: f64 = -120.0;
/// Reported power for cells inside the near-transmitter guard zone.
pub const TX_ZONE_DBM: f64 = -30.0;

/// A uniform grid of received-power samples over the floor plan.
#[derive(Debug, Clone)]
pub struct ReceiverGrid {
    pub dimensions: (f64, f64),
    pub resolution: u32,
    pub cell_size: (f64, f64),
    /// `[row][col]` received power in dBm.
    pub received_power: Vec<Vec<f64>>,
}

impl ReceiverGrid {
    pub fn new(dimensions: (f64, f64), resolution: u32) -> CoverageResult<Self> {
        if resolution == 0 {
            return Err(CoverageError::InvalidBudget("resolution must be >= 1".into()));
        }
        let cell_size = (dimensions.0 / resolution as f64, dimensions.1 / resolution as f64);
        Ok(Self {
            dimensions,
            resolution,
            cell_size,
            received_power: vec![vec![DBM_FLOOR; resolution as usize]; resolution as usize],
        })
    }

    pub fn cell_center(&self, col: u32, row: u32) -> Point2<f64> {
        Point2::new((col as f64 + 0.5) * self.cell_size.0, (row as f64 + 0.5) * self.cell_size.1)
    }

    fn cell_bounds(&self, col: u32, row: u32) -> (Point2<f64>, Point2<f64>) {
        let min = Point2::new(col as f64 * self.cell_size.0, row as f64 * self.cell_size.1);
        let max = Point2::new(min.x + self.cell_size.0, min.y + self.cell_size.1);
        (min, max)
    }
}

/// Fills a [`ReceiverGrid`] by summing, per cell, the linear power of every ray segment that
/// crosses it.
pub struct PowerAggregator<'a> {
    antenna: &'a Antenna,
    tx_zone_radius: f64,
}

impl<'a> PowerAggregator<'a> {
    pub fn new(antenna: &'a Antenna, tx_zone_radius: f64) -> Self {
        Self { antenna, tx_zone_radius }
    }

    pub fn fill(
        &self,
        grid: &mut ReceiverGrid,
        arena: &RayArena,
        progress: &mut dyn ProgressSink,
        cancel: &CancellationToken,
        parallel: bool,
    ) -> CoverageResult<()> {
        if parallel {
            self.fill_parallel(grid, arena, progress, cancel)
        } else {
            self.fill_sequential(grid, arena, progress, cancel)
        }
    }

    fn tx_cell(&self, grid: &ReceiverGrid) -> (i64, i64) {
        (
            (self.antenna.location.x / grid.cell_size.0).floor() as i64,
            (self.antenna.location.y / grid.cell_size.1).floor() as i64,
        )
    }

    fn cell_power_dbm(&self, grid: &ReceiverGrid, arena: &RayArena, col: u32, row: u32, tx_cell: (i64, i64)) -> f64 {
        let di = (col as i64 - tx_cell.0).abs() as f64;
        let dj = (row as i64 - tx_cell.1).abs() as f64;
        if di <= self.tx_zone_radius && dj <= self.tx_zone_radius {
            return TX_ZONE_DBM;
        }

        let center = grid.cell_center(col, row);
        let (cell_min, cell_max) = grid.cell_bounds(col, row);
        let wavelength = self.antenna.wavelength();

        let mut total_power = 0.0;
        for record in arena.records() {
            let Some(end) = record.end_point else { continue };
            if !segment_intersects_cell(record.origin, end, cell_min, cell_max) {
                continue;
            }
            let distance_correction = (end - center).norm();
            let d_eff = record.distance - distance_correction;
            if d_eff <= crate::geometry::INTERSECTION_EPSILON {
                continue;
            }
            let path_loss = (4.0 * PI * d_eff / wavelength).powi(2);
            if !path_loss.is_finite() || path_loss <= 0.0 {
                continue;
            }
            let power = record.power * record.amplitude.norm_sqr() / path_loss;
            if power.is_finite() {
                total_power += power;
            }
        }

        10.0 * (total_power / 1e-3 + 1e-12).log10()
    }

    fn fill_sequential(
        &self,
        grid: &mut ReceiverGrid,
        arena: &RayArena,
        progress: &mut dyn ProgressSink,
        cancel: &CancellationToken,
    ) -> CoverageResult<()> {
        let resolution = grid.resolution;
        let tx_cell = self.tx_cell(grid);
        let total = resolution as u64 * resolution as u64;
        let mut done = 0u64;

        for row in 0..resolution {
            for col in 0..resolution {
                if cancel.is_cancelled() {
                    return Err(CoverageError::Cancelled);
                }
                grid.received_power[row as usize][col as usize] = self.cell_power_dbm(grid, arena, col, row, tx_cell);
                done += 1;
                progress.on_progress(Phase::GridFill, done, total);
            }
        }
        Ok(())
    }

    fn fill_parallel(
        &self,
        grid: &mut ReceiverGrid,
        arena: &RayArena,
        progress: &mut dyn ProgressSink,
        cancel: &CancellationToken,
    ) -> CoverageResult<()> {
        let resolution = grid.resolution;
        let tx_cell = self.tx_cell(grid);
        let total = resolution as u64 * resolution as u64;
        let cells: Vec<(u32, u32)> = (0..resolution).flat_map(|row| (0..resolution).map(move |col| (col, row))).collect();

        let results: Vec<Option<(u32, u32, f64)>> = cells
            .par_iter()
            .map(|&(col, row)| {
                if cancel.is_cancelled() {
                    return None;
                }
                Some((col, row, self.cell_power_dbm(grid, arena, col, row, tx_cell)))
            })
            .collect();

        if results.iter().any(Option::is_none) {
            return Err(CoverageError::Cancelled);
        }
        for (col, row, dbm) in results.into_iter().flatten() {
            grid.received_power[row as usize][col as usize] = dbm;
        }
        progress.on_progress(Phase::GridFill, total, total);
        Ok(())
    }
}

fn segment_intersects_cell(p1: Point2<f64>, p2: Point2<f64>, cell_min: Point2<f64>, cell_max: Point2<f64>) -> bool {
    let inside = |p: Point2<f64>| p.x >= cell_min.x && p.x <= cell_max.x && p.y >= cell_min.y && p.y <= cell_max.y;
    if inside(p1) || inside(p2) {
        return true;
    }
    if (p1.x < cell_min.x && p2.x < cell_min.x)
        || (p1.x > cell_max.x && p2.x > cell_max.x)
        || (p1.y < cell_min.y && p2.y < cell_min.y)
        || (p1.y > cell_max.y && p2.y > cell_max.y)
    {
        return false;
    }
    let corners = [
        cell_min,
        Point2::new(cell_max.x, cell_min.y),
        cell_max,
        Point2::new(cell_min.x, cell_max.y),
    ];
    (0..4).any(|i| segments_intersect(p1, p2, corners[i], corners[(i + 1) % 4]))
}

fn segments_intersect(p1: Point2<f64>, p2: Point2<f64>, p3: Point2<f64>, p4: Point2<f64>) -> bool {
    let d1 = p2 - p1;
    let d2 = p4 - p3;
    let denom = d1.x * d2.y - d1.y * d2.x;
    if denom.abs() < f64::EPSILON {
        return false;
    }
    let t = ((p3.x - p1.x) * d2.y - (p3.y - p1.y) * d2.x) / denom;
    let u = ((p3.x - p1.x) * d1.y - (p3.y - p1.y) * d1.x) / denom;
    (0.0..=1.0).contains(&t) && (0.0..=1.0).contains(&u)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::progress::NullProgress;
    use crate::ray::{RayRecord, SpawnKind};
    use nalgebra::Vector2;
    use num_complex::Complex64;

    fn antenna() -> Antenna {
        Antenna::new(Point2::new(5.0, 5.0), 0.03, 2.4e9).unwrap()
    }

    #[test]
    fn cells_with_no_rays_hit_the_dbm_floor() {
        let antenna = antenna();
        let arena = RayArena::new();
        let mut grid = ReceiverGrid::new((10.0, 10.0), 4).unwrap();
        let aggregator = PowerAggregator::new(&antenna, 0.1);
        aggregator.fill(&mut grid, &arena, &mut NullProgress, &CancellationToken::new(), false).unwrap();

        for row in &grid.received_power {
            for &v in row {
                assert!((v - DBM_FLOOR).abs() < 1e-9 || v == TX_ZONE_DBM);
            }
        }
    }

    #[test]
    fn near_transmitter_cell_reports_guard_value() {
        let antenna = antenna();
        let arena = RayArena::new();
        let mut grid = ReceiverGrid::new((10.0, 10.0), 10).unwrap();
        let aggregator = PowerAggregator::new(&antenna, 0.1);
        aggregator.fill(&mut grid, &arena, &mut NullProgress, &CancellationToken::new(), false).unwrap();

        let tx_cell = aggregator.tx_cell(&grid);
        assert_eq!(grid.received_power[tx_cell.1 as usize][tx_cell.0 as usize], TX_ZONE_DBM);
    }

    #[test]
    fn segment_crossing_cell_raises_power_above_floor() {
        let antenna = antenna();
        let mut arena = RayArena::new();
        arena.push(RayRecord {
            parent: None,
            kind: SpawnKind::Primary,
            origin: Point2::new(5.0, 5.0),
            direction: Vector2::new(1.0, 0.0),
            amplitude: Complex64::new(1.0, 0.0),
            polarization: crate::antenna::Polarization::Te,
            distance: 3.0,
            path_loss: 10.0,
            num_reflections: 0,
            num_transmissions: 0,
            power: 0.03,
            end_point: Some(Point2::new(8.0, 5.0)),
        });
        let mut grid = ReceiverGrid::new((10.0, 10.0), 10).unwrap();
        let aggregator = PowerAggregator::new(&antenna, 0.0);
        aggregator.fill(&mut grid, &arena, &mut NullProgress, &CancellationToken::new(), false).unwrap();

        // A cell along the ray's path, away from the transmitter, should be above the floor.
        assert!(grid.received_power[5][7] > DBM_FLOOR);
    }

    #[test]
    fn sequential_and_parallel_fills_agree() {
        let antenna = antenna();
        let mut arena = RayArena::new();
        arena.push(RayRecord {
            parent: None,
            kind: SpawnKind::Primary,
            origin: Point2::new(5.0, 5.0),
            direction: Vector2::new(1.0, 0.0),
            amplitude: Complex64::new(1.0, 0.0),
            polarization: crate::antenna::Polarization::Te,
            distance: 3.0,
            path_loss: 10.0,
            num_reflections: 0,
            num_transmissions: 0,
            power: 0.03,
            end_point: Some(Point2::new(8.0, 5.0)),
        });

        let mut grid_seq = ReceiverGrid::new((10.0, 10.0), 10).unwrap();
        let mut grid_par = ReceiverGrid::new((10.0, 10.0), 10).unwrap();
        let aggregator = PowerAggregator::new(&antenna, 0.1);
        aggregator.fill(&mut grid_seq, &arena, &mut NullProgress, &CancellationToken::new(), false).unwrap();
        aggregator.fill(&mut grid_par, &arena, &mut NullProgress, &CancellationToken::new(), true).unwrap();

        for (row_seq, row_par) in grid_seq.received_power.iter().zip(grid_par.received_power.iter()) {
            for (a, b) in row_seq.iter().zip(row_par.iter()) {
                assert!((a - b).abs() < 1e-9);
            }
        }
    }
}
