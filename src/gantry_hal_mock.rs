use anyhow::anyhow;
use log::{debug, trace};

use crate::gantry_hal::{GantryHal, GripperCommand, MoveStatus};
use crate::position::Position;

/// Simulated gantry.  Moves in a straight line by at most the requested speed per call and
/// takes a fixed number of polls to open or close the gripper.
#[derive(Debug)]
pub struct GantryHalMock {
    position: Position,
    gripper_open: bool,
    gripper_command: Option<GripperCommand>,
    gripper_ticks_remaining: u32,
    gripper_actuation_ticks: u32,
}

impl GantryHalMock {
    pub fn new(start_position: Position, gripper_actuation_ticks: u32) -> Self {
        Self {
            position: start_position,
            gripper_open: true,
            gripper_command: None,
            gripper_ticks_remaining: 0,
            gripper_actuation_ticks,
        }
    }
}

impl GantryHal for GantryHalMock {
    fn current_position(&self) -> Position {
        self.position
    }

    fn advance(&mut self, target: Position, speed_mm: f64) -> anyhow::Result<MoveStatus> {
        if !(speed_mm > 0.0) {
            return Err(anyhow!("Cannot move at speed {speed_mm}"));
        }
        self.position = self.position.step_toward(&target, speed_mm);
        let arrived = self.position.approx_eq(&target);
        trace!("advance: {} -> {}, arrived={arrived}", self.position, target);
        Ok(MoveStatus { position: self.position, arrived })
    }

    fn is_gripper_open(&self) -> bool {
        self.gripper_open
    }

    fn send_gripper_command(&mut self, command: GripperCommand) -> anyhow::Result<()> {
        debug!("send_gripper_command: {command:?}");
        self.gripper_command = Some(command);
        self.gripper_ticks_remaining = self.gripper_actuation_ticks;
        Ok(())
    }

    fn did_actuate_gripper(&mut self) -> anyhow::Result<bool> {
        let command = match self.gripper_command {
            Some(command) => command,
            None => return Err(anyhow!("No gripper command in progress")),
        };
        if self.gripper_ticks_remaining > 0 {
            self.gripper_ticks_remaining -= 1;
        }
        let answer = self.gripper_ticks_remaining == 0;
        if answer {
            self.gripper_open = command == GripperCommand::Open;
        }
        trace!("did_actuate_gripper: {answer}");
        Ok(answer)
    }
}
