use thiserror::Error;

use crate::sequence::Phase;

/// Rejections of a single external command.  None of these are fatal: the offending
/// command has no effect and the control loop keeps ticking.
#[derive(Error, PartialEq, Clone, Debug)]
pub enum ControlError {
  #[error("invalid position: {0}")]
  InvalidPosition(String),

  /// Also returned while a move home is requested but not yet acted on, reported as
  /// [`Phase::MovingHome`] since that is where the next tick goes.
  #[error("cannot start the sequence while the robot is in state {0}")]
  Conflict(Phase),
}

pub type ControlResult<T> = Result<T, ControlError>;
