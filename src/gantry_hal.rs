use serde::{Deserialize, Serialize};

use crate::position::Position;

/// Motion and gripper capability of the gantry.  Nothing here blocks: moves advance by one
/// increment per call to [`GantryHal::advance`] and gripper actuation is polled with
/// [`GantryHal::did_actuate_gripper`] until it completes.
pub trait GantryHal {
    fn current_position(&self) -> Position;
    fn advance(&mut self, target: Position, speed_mm: f64) -> anyhow::Result<MoveStatus>;
    fn is_gripper_open(&self) -> bool;
    fn send_gripper_command(&mut self, command: GripperCommand) -> anyhow::Result<()>;
    fn did_actuate_gripper(&mut self) -> anyhow::Result<bool>;
}

#[derive(Debug, PartialEq, Copy, Clone)]
pub struct MoveStatus {
    pub position: Position,
    pub arrived: bool,
}

#[derive(Debug, PartialEq, Eq, Copy, Clone, Serialize, Deserialize)]
pub enum GripperCommand {
    Open,
    Close,
}
