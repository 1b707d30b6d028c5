use log::{info, trace};

use crate::config::GantryConfig;
use crate::error::{ControlError, ControlResult};
use crate::gantry_hal::GantryHal;
use crate::geometry::GeometryValidator;
use crate::interrupt::MoveHomeFlag;
use crate::motion_driver::MotionDriver;
use crate::position::Position;
use crate::position_store::PositionStore;
use crate::sequence::{Leg, Phase, PhaseAction, Waypoint};
use crate::status::RobotStatus;

/// The pick-and-place state machine.  Not thread safe on its own: the control loop owns it
/// behind a mutex and calls [`GantryController::tick`] once per cadence, while commands are
/// applied in between ticks.
pub struct GantryController {
  hal: Box<dyn GantryHal + Send>,
  store: PositionStore,
  driver: MotionDriver,
  move_home: MoveHomeFlag,
  lifting_height_mm: f64,
  phase: Phase,
}

impl GantryController {
  pub fn new(
      hal: Box<dyn GantryHal + Send>,
      validator: Box<dyn GeometryValidator + Send>,
      config: &GantryConfig) -> anyhow::Result<Self> {
    config.validate()?;
    let store = PositionStore::new(
        config.home_position,
        config.cube_start_position,
        config.cube_destination_position,
        validator)?;
    Ok(Self {
      hal,
      store,
      driver: MotionDriver::new(config.regular_speed_mm, config.homing_speed_mm),
      move_home: MoveHomeFlag::new(),
      lifting_height_mm: config.lifting_height_mm,
      phase: Phase::Home,
    })
  }

  pub fn phase(&self) -> Phase {
    self.phase
  }

  /// Handle for requesting a move home without going through whatever lock guards `self`.
  pub fn move_home_flag(&self) -> MoveHomeFlag {
    self.move_home.clone()
  }

  pub fn request_move_home(&self) {
    if self.move_home.request() {
      info!("Move home requested while in [{}]", self.phase);
    }
  }

  pub fn start_sequence(&mut self) -> ControlResult<()> {
    if !self.phase.can_start_sequence() {
      return Err(ControlError::Conflict(self.phase));
    }
    if self.move_home.is_requested() {
      // The pending home move wins; report the phase the next tick is committed to.
      info!("Rejecting start in [{}], a move home is pending", self.phase);
      return Err(ControlError::Conflict(Phase::MovingHome));
    }
    self.store.commit_pending();
    info!(
      "Starting sequence: {} -> {}",
      self.store.cube_start(),
      self.store.cube_destination());
    self.enter(Phase::MovingAboveCube);
    Ok(())
  }

  pub fn home_position(&self) -> Position {
    self.store.home()
  }

  pub fn set_home_position(&mut self, position: Position) -> ControlResult<()> {
    self.store.set_home(position)
  }

  pub fn cube_start_position(&self) -> Position {
    self.store.cube_start()
  }

  pub fn set_cube_start_position(&mut self, position: Position) -> ControlResult<()> {
    self.store.set_cube_start(position)
  }

  pub fn cube_destination_position(&self) -> Position {
    self.store.cube_destination()
  }

  pub fn set_cube_destination_position(&mut self, position: Position) -> ControlResult<()> {
    self.store.set_cube_destination(position)
  }

  pub fn is_target_locked(&self, leg: Leg) -> bool {
    self.store.is_locked(leg)
  }

  pub fn status(&self) -> RobotStatus {
    RobotStatus {
      state_machine_state: self.phase,
      idle: self.phase.is_idle(),
      gripper_open: self.hal.is_gripper_open(),
      position: self.hal.current_position(),
    }
  }

  /// Advances the active phase by one unit of simulator progress.  A failed tick leaves the
  /// phase untouched so the next tick simply retries.
  pub fn tick(&mut self) -> anyhow::Result<()> {
    if self.phase.is_safe_boundary() && self.move_home.take() {
      info!("Abandoning [{}] to move home", self.phase);
      return self.transition(Phase::MovingHome);
    }

    match self.phase.action() {
      PhaseAction::Idle => {
        if self.phase == Phase::SequenceFinished {
          self.complete_phase()?;
        }
      },
      PhaseAction::MoveTo(waypoint, speed) => {
        let target = self.resolve(waypoint);
        let status = self.driver.step(&mut *self.hal, target, speed)?;
        trace!("[{}] at {}, heading to {}", self.phase, status.position, target);
        if status.arrived {
          if let Some(leg) = self.phase.locks_leg() {
            self.store.lock(leg);
          }
          self.complete_phase()?;
        }
      },
      PhaseAction::Actuate(_) => {
        if self.hal.did_actuate_gripper()? {
          self.complete_phase()?;
        }
      },
    }
    Ok(())
  }

  fn complete_phase(&mut self) -> anyhow::Result<()> {
    let next = self.phase.next(self.hal.is_gripper_open());
    self.transition(next)
  }

  fn transition(&mut self, next: Phase) -> anyhow::Result<()> {
    if let PhaseAction::Actuate(command) = next.action() {
      self.hal.send_gripper_command(command)?;
    }
    self.enter(next);
    Ok(())
  }

  fn enter(&mut self, next: Phase) {
    info!("[{}] => [{}]", self.phase, next);
    if next == Phase::Home && self.phase != Phase::Home {
      self.store.commit_pending();
    }
    self.phase = next;
  }

  fn resolve(&self, waypoint: Waypoint) -> Position {
    match waypoint {
      Waypoint::AboveCube => self.store.cube_start().with_z(self.lifting_height_mm),
      Waypoint::Cube => self.store.cube_start(),
      Waypoint::AboveDestination => self.store.cube_destination().with_z(self.lifting_height_mm),
      Waypoint::Destination => self.store.cube_destination(),
      Waypoint::Home => self.store.home(),
    }
  }
}
