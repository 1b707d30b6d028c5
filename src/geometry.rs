//! Workspace geometry: which positions a cube may be picked from or placed at.

use std::f64::consts::{FRAC_PI_4, SQRT_2};

use serde::{Deserialize, Serialize};

use crate::position::{Position, WORK_AREA_HALF_SIZE_MM};

pub const TABLE_DISTANCE_FROM_EDGE_MM: f64 = 100.0;
pub const TABLE_SIZE_MM: f64 = 500.0;

/// Which configurable position a write is aimed at.
#[derive(Debug, PartialEq, Eq, Copy, Clone, Serialize, Deserialize)]
pub enum PositionSlot {
    Home,
    CubeStart,
    CubeDestination,
}

pub trait GeometryValidator {
    fn validate(&self, slot: PositionSlot, position: &Position) -> bool;
}

impl<F> GeometryValidator for F
where
    F: Fn(PositionSlot, &Position) -> bool,
{
    fn validate(&self, slot: PositionSlot, position: &Position) -> bool {
        (self)(slot, position)
    }
}

/// Convex polygon in the XY plane, vertices in counter-clockwise order.
#[derive(Debug, Clone, PartialEq)]
pub struct Polygon {
    vertices: Vec<(f64, f64)>,
}

impl Polygon {
    pub fn square(center: (f64, f64), size: f64, rotation_rad: f64) -> Self {
        let half = size / 2.0;
        let (sin, cos) = rotation_rad.sin_cos();
        let vertices = [(-half, -half), (half, -half), (half, half), (-half, half)]
            .iter()
            .map(|&(x, y)| (center.0 + x * cos - y * sin, center.1 + x * sin + y * cos))
            .collect();
        Self { vertices }
    }

    /// Strict containment: points on an edge are outside.
    pub fn contains(&self, x: f64, y: f64) -> bool {
        let n = self.vertices.len();
        (0..n).all(|i| {
            let (ax, ay) = self.vertices[i];
            let (bx, by) = self.vertices[(i + 1) % n];
            (bx - ax) * (y - ay) - (by - ay) * (x - ax) > 0.0
        })
    }

    pub fn centroid(&self) -> (f64, f64) {
        let n = self.vertices.len() as f64;
        let (sx, sy) = self.vertices.iter().fold((0.0_f64, 0.0_f64), |(sx, sy), &(x, y)| (sx + x, sy + y));
        (sx / n, sy / n)
    }

    /// Returns `(min_x, min_y, max_x, max_y)`.
    pub fn bounding_box(&self) -> (f64, f64, f64, f64) {
        self.vertices.iter().fold(
            (f64::MAX, f64::MAX, f64::MIN, f64::MIN),
            |(x0, y0, x1, y1), &(x, y)| (x0.min(x), y0.min(y), x1.max(x), y1.max(y)))
    }
}

/// The two tables of the reference cell: the cube starts on table A (an axis aligned square
/// in the upper left corner) and is placed on table B (a square rotated by 45 degrees in the
/// lower right corner).  Cubes always sit on the table surface, i.e. at z = 0.
#[derive(Debug, Clone)]
pub struct TableGeometry {
    pub table_a: Polygon,
    pub table_b: Polygon,
}

impl Default for TableGeometry {
    fn default() -> Self {
        let inner_edge = WORK_AREA_HALF_SIZE_MM - TABLE_DISTANCE_FROM_EDGE_MM;
        let half_table = TABLE_SIZE_MM / 2.0;
        let table_a = Polygon::square((-inner_edge + half_table, inner_edge - half_table), TABLE_SIZE_MM, 0.0);

        let corner_to_center = TABLE_SIZE_MM / SQRT_2;
        let table_b = Polygon::square(
            (inner_edge - corner_to_center, -inner_edge + corner_to_center),
            TABLE_SIZE_MM,
            FRAC_PI_4);

        Self { table_a, table_b }
    }
}

impl TableGeometry {
    pub fn default_cube_start(&self) -> Position {
        let (x, y) = self.table_a.centroid();
        Position::new(x, y, 0.0)
    }

    pub fn default_cube_destination(&self) -> Position {
        let (x, y) = self.table_b.centroid();
        Position::new(x, y, 0.0)
    }

    pub fn table_for(&self, slot: PositionSlot) -> Option<&Polygon> {
        match slot {
            PositionSlot::Home => None,
            PositionSlot::CubeStart => Some(&self.table_a),
            PositionSlot::CubeDestination => Some(&self.table_b),
        }
    }
}

impl GeometryValidator for TableGeometry {
    fn validate(&self, slot: PositionSlot, position: &Position) -> bool {
        match self.table_for(slot) {
            Some(table) => position.z == 0.0 && table.contains(position.x, position.y),
            None => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_a_placement() {
        let geometry = TableGeometry::default();
        let center = geometry.default_cube_start();
        assert!((center.x - -650.0).abs() < 1e-9);
        assert!((center.y - 650.0).abs() < 1e-9);
        assert!(geometry.validate(PositionSlot::CubeStart, &center));
        assert!(!geometry.validate(PositionSlot::CubeStart, &center.with_z(10.0)));
        assert!(!geometry.validate(PositionSlot::CubeStart, &Position::new(-400.0, 650.0, 0.0)));
        assert!(!geometry.validate(PositionSlot::CubeDestination, &center));
    }

    #[test]
    fn test_table_b_is_rotated() {
        let geometry = TableGeometry::default();
        let center = geometry.default_cube_destination();
        assert!(geometry.validate(PositionSlot::CubeDestination, &center));

        // Within the unrotated square around the center but outside the diamond.
        let half = TABLE_SIZE_MM / 2.0 - 1.0;
        let corner = Position::new(center.x + half, center.y + half, 0.0);
        assert!(!geometry.validate(PositionSlot::CubeDestination, &corner));

        // The diamond reaches further along the axes than the unrotated square would.
        let tip = Position::new(center.x + half * 1.3, center.y, 0.0);
        assert!(geometry.validate(PositionSlot::CubeDestination, &tip));
    }

    #[test]
    fn test_home_is_not_constrained_by_tables() {
        let geometry = TableGeometry::default();
        assert!(geometry.validate(PositionSlot::Home, &Position::new(0.0, 0.0, 500.0)));
    }

    #[test]
    fn test_closure_validator() {
        let only_positive_x = |_slot: PositionSlot, p: &Position| p.x > 0.0;
        assert!(only_positive_x.validate(PositionSlot::CubeStart, &Position::new(1.0, 0.0, 0.0)));
        assert!(!only_positive_x.validate(PositionSlot::CubeStart, &Position::new(-1.0, 0.0, 0.0)));
    }
}
