use crate::gantry_hal::{GantryHal, MoveStatus};
use crate::position::Position;
use crate::sequence::MoveSpeed;

/// Turns a phase's waypoint into exactly one increment of simulator progress.  Holds no
/// sequence state; the state machine calls [`MotionDriver::step`] once per tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MotionDriver {
    regular_speed_mm: f64,
    homing_speed_mm: f64,
}

impl MotionDriver {
    pub fn new(regular_speed_mm: f64, homing_speed_mm: f64) -> Self {
        Self { regular_speed_mm, homing_speed_mm }
    }

    pub fn speed_mm(&self, speed: MoveSpeed) -> f64 {
        match speed {
            MoveSpeed::Regular => self.regular_speed_mm,
            MoveSpeed::Homing => self.homing_speed_mm,
        }
    }

    pub fn step(&self, hal: &mut dyn GantryHal, target: Position, speed: MoveSpeed) -> anyhow::Result<MoveStatus> {
        hal.advance(target, self.speed_mm(speed))
    }
}
