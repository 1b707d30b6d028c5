use std::fmt::{Display, Formatter};

use derive_new::new;
use serde::{Deserialize, Serialize};

use crate::error::{ControlError, ControlResult};

/// Half the edge length of the square work area, in millimetres.  Every axis of every
/// position must stay within `[-WORK_AREA_HALF_SIZE_MM, WORK_AREA_HALF_SIZE_MM]`.
pub const WORK_AREA_HALF_SIZE_MM: f64 = 1000.0;

/// Positions closer than this are considered the same point when checking for arrival.
pub const POSITION_EPSILON_MM: f64 = 1e-6;

#[derive(new, Debug, PartialEq, Copy, Clone, Default, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Position {
    pub fn with_z(&self, z: f64) -> Self {
        Self { z, ..*self }
    }

    pub fn distance_to(&self, other: &Position) -> f64 {
        let dx = other.x - self.x;
        let dy = other.y - self.y;
        let dz = other.z - self.z;
        (dx * dx + dy * dy + dz * dz).sqrt()
    }

    pub fn approx_eq(&self, other: &Position) -> bool {
        self.distance_to(other) <= POSITION_EPSILON_MM
    }

    /// Moves at most `max_step` millimetres in a straight line toward `target`, landing
    /// exactly on it once it is within reach.
    pub fn step_toward(&self, target: &Position, max_step: f64) -> Position {
        let remaining = self.distance_to(target);
        if remaining <= max_step {
            return *target;
        }
        let fraction = max_step / remaining;
        Position {
            x: self.x + (target.x - self.x) * fraction,
            y: self.y + (target.y - self.y) * fraction,
            z: self.z + (target.z - self.z) * fraction,
        }
    }

    pub fn check_in_work_area(&self) -> ControlResult<()> {
        let axes = [("x", self.x), ("y", self.y), ("z", self.z)];
        for (name, value) in axes {
            if !value.is_finite() || value.abs() > WORK_AREA_HALF_SIZE_MM {
                return Err(ControlError::InvalidPosition(format!(
                    "{name}={value} is outside [-{WORK_AREA_HALF_SIZE_MM}, {WORK_AREA_HALF_SIZE_MM}]")));
            }
        }
        Ok(())
    }
}

impl Display for Position {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "(x={:.1}, y={:.1}, z={:.1})", self.x, self.y, self.z)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_step_toward_moves_in_straight_line() {
        let start = Position::new(0.0, 0.0, 0.0);
        let target = Position::new(300.0, 400.0, 0.0);
        let next = start.step_toward(&target, 50.0);
        assert!(next.approx_eq(&Position::new(30.0, 40.0, 0.0)));
    }

    #[test]
    fn test_step_toward_snaps_onto_target() {
        let start = Position::new(10.0, 10.0, 10.0);
        let target = Position::new(10.0, 10.0, 40.0);
        assert_eq!(start.step_toward(&target, 95.0), target);
    }

    #[test]
    fn test_work_area_bounds_are_inclusive() {
        assert!(Position::new(1000.0, -1000.0, 0.0).check_in_work_area().is_ok());
        assert!(matches!(
            Position::new(1000.5, 0.0, 0.0).check_in_work_area(),
            Err(ControlError::InvalidPosition(_))));
        assert!(Position::new(0.0, 0.0, f64::NAN).check_in_work_area().is_err());
    }
}
