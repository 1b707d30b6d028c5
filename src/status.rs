use derive_new::new;
use futures::Stream;
use futures_signals::signal::{Mutable, SignalExt};
use serde::{Deserialize, Serialize};

use crate::position::Position;
use crate::sequence::Phase;

/// Point-in-time copy of what the robot is doing.
#[derive(new, Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RobotStatus {
  pub state_machine_state: Phase,
  pub idle: bool,
  pub gripper_open: bool,
  pub position: Position,
}

/// Latest-value cells for the status and position streams.  Every publish replaces the
/// previous snapshot, so a slow subscriber only ever sees the most recent one.
#[derive(Clone)]
pub struct StatusPublisher {
  status: Mutable<RobotStatus>,
  position: Mutable<Position>,
}

impl StatusPublisher {
  pub fn new(initial: RobotStatus) -> Self {
    Self {
      status: Mutable::new(initial),
      position: Mutable::new(initial.position),
    }
  }

  pub fn publish(&self, status: RobotStatus) {
    self.position.set(status.position);
    self.status.set(status);
  }

  pub fn status(&self) -> RobotStatus {
    self.status.get()
  }

  pub fn position(&self) -> Position {
    self.position.get()
  }

  /// A fresh stream starting at the current snapshot.  Can be called any number of times.
  pub fn status_stream(&self) -> impl Stream<Item = RobotStatus> {
    self.status.signal().to_stream()
  }

  pub fn position_stream(&self) -> impl Stream<Item = Position> {
    self.position.signal().to_stream()
  }
}
