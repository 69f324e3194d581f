//! Converts a serialized list of line-segment features into core [`Wall`] values.

use nalgebra::Point2;
use serde::{Deserialize, Serialize};

use rf_coverage_core::geometry::{Material, Wall};

use crate::error::AdapterResult;

/// A single wall feature as it arrives over the wire, before validation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WallFeature {
    pub start: (f64, f64),
    pub end: (f64, f64),
    pub material: Option<MaterialFeature>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MaterialFeature {
    pub permittivity: f64,
    pub conductivity: f64,
    pub thickness: f64,
}

/// A whole floor plan as it arrives over the wire: dimensions plus wall features.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FloorPlanDocument {
    pub width: f64,
    pub height: f64,
    pub walls: Vec<WallFeature>,
}

/// Parses a JSON floor plan document into walls, applying the interior-wall default material
/// to any feature that omits one. Rejects malformed geometry before it reaches the core.
pub fn parse_floor_plan(json: &str) -> AdapterResult<((f64, f64), Vec<Wall>)> {
    let document: FloorPlanDocument = serde_json::from_str(json)?;
    let walls = document
        .walls
        .into_iter()
        .map(|feature| build_wall(feature))
        .collect::<AdapterResult<Vec<_>>>()?;
    Ok(((document.width, document.height), walls))
}

fn build_wall(feature: WallFeature) -> AdapterResult<Wall> {
    let material = match feature.material {
        Some(m) => Material::new(m.permittivity, m.conductivity, m.thickness)?,
        None => Material::default_wall(),
    };
    let wall = Wall::new(
        Point2::new(feature.start.0, feature.start.1),
        Point2::new(feature.end.0, feature.end.1),
        material,
    )?;
    Ok(wall)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_walls_with_explicit_material() {
        let json = r#"{
            "width": 10.0,
            "height": 8.0,
            "walls": [
                { "start": [0.0, 0.0], "end": [0.0, 8.0], "material": { "permittivity": 5.0, "conductivity": 0.01, "thickness": 0.2 } }
            ]
        }"#;
        let (dims, walls) = parse_floor_plan(json).unwrap();
        assert_eq!(dims, (10.0, 8.0));
        assert_eq!(walls.len(), 1);
        assert_eq!(walls[0].material.permittivity, 5.0);
    }

    #[test]
    fn missing_material_uses_interior_wall_default() {
        let json = r#"{
            "width": 10.0,
            "height": 8.0,
            "walls": [{ "start": [1.0, 1.0], "end": [1.0, 5.0], "material": null }]
        }"#;
        let (_, walls) = parse_floor_plan(json).unwrap();
        assert_eq!(walls[0].material, Material::default_wall());
    }

    #[test]
    fn rejects_zero_length_segment() {
        let json = r#"{
            "width": 10.0,
            "height": 8.0,
            "walls": [{ "start": [1.0, 1.0], "end": [1.0, 1.0], "material": null }]
        }"#;
        assert!(parse_floor_plan(json).is_err());
    }
}
