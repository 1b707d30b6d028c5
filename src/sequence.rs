use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};

use crate::gantry_hal::GripperCommand;

/// Every step of the pick-and-place sequence, plus the return-home path.  Exactly one phase
/// is active at a time and, apart from a move home request, they are walked strictly in the
/// order given by [`Phase::next`].
#[derive(Debug, PartialEq, Eq, Copy, Clone, Hash, Serialize, Deserialize)]
pub enum Phase {
  Home,
  MovingHome,
  ReleasingAtHome,
  MovingAboveCube,
  DescendingToCube,
  Gripping,
  AscendingWithCube,
  MovingAboveDestination,
  DescendingToDestination,
  Releasing,
  AscendingFromDestination,
  SequenceFinished,
}

#[derive(Debug, PartialEq, Eq, Copy, Clone, Serialize, Deserialize)]
pub enum PhaseGroup {
  Home,
  Picking,
  Transporting,
  Placing,
  SequenceFinished,
}

#[derive(Debug, PartialEq, Eq, Copy, Clone, Serialize, Deserialize)]
pub enum Leg {
  Cube,
  Destination,
}

/// Where a motion phase is headed.  Resolved against the position store on every tick.
#[derive(Debug, PartialEq, Eq, Copy, Clone)]
pub enum Waypoint {
  AboveCube,
  Cube,
  AboveDestination,
  Destination,
  Home,
}

#[derive(Debug, PartialEq, Eq, Copy, Clone)]
pub enum MoveSpeed {
  Regular,
  Homing,
}

/// What a phase does on each tick until it completes.
#[derive(Debug, PartialEq, Eq, Copy, Clone)]
pub enum PhaseAction {
  MoveTo(Waypoint, MoveSpeed),
  Actuate(GripperCommand),
  Idle,
}

impl Phase {
  pub fn group(self) -> PhaseGroup {
    match self {
      Phase::Home | Phase::MovingHome | Phase::ReleasingAtHome => PhaseGroup::Home,
      Phase::MovingAboveCube | Phase::DescendingToCube | Phase::Gripping => PhaseGroup::Picking,
      Phase::AscendingWithCube | Phase::MovingAboveDestination => PhaseGroup::Transporting,
      Phase::DescendingToDestination | Phase::Releasing | Phase::AscendingFromDestination => PhaseGroup::Placing,
      Phase::SequenceFinished => PhaseGroup::SequenceFinished,
    }
  }

  pub fn action(self) -> PhaseAction {
    match self {
      Phase::Home | Phase::SequenceFinished => PhaseAction::Idle,
      Phase::MovingHome => PhaseAction::MoveTo(Waypoint::Home, MoveSpeed::Homing),
      Phase::ReleasingAtHome | Phase::Releasing => PhaseAction::Actuate(GripperCommand::Open),
      Phase::MovingAboveCube => PhaseAction::MoveTo(Waypoint::AboveCube, MoveSpeed::Regular),
      Phase::DescendingToCube => PhaseAction::MoveTo(Waypoint::Cube, MoveSpeed::Regular),
      Phase::Gripping => PhaseAction::Actuate(GripperCommand::Close),
      Phase::AscendingWithCube => PhaseAction::MoveTo(Waypoint::AboveCube, MoveSpeed::Regular),
      Phase::MovingAboveDestination => PhaseAction::MoveTo(Waypoint::AboveDestination, MoveSpeed::Regular),
      Phase::DescendingToDestination => PhaseAction::MoveTo(Waypoint::Destination, MoveSpeed::Regular),
      Phase::AscendingFromDestination => PhaseAction::MoveTo(Waypoint::AboveDestination, MoveSpeed::Regular),
    }
  }

  /// The phase that follows once this one's move has arrived or its actuation has finished.
  /// `gripper_open` only matters when arriving home: a held cube is dropped there.
  pub fn next(self, gripper_open: bool) -> Phase {
    match self {
      Phase::Home => Phase::Home,
      Phase::MovingHome if gripper_open => Phase::Home,
      Phase::MovingHome => Phase::ReleasingAtHome,
      Phase::ReleasingAtHome => Phase::Home,
      Phase::MovingAboveCube => Phase::DescendingToCube,
      Phase::DescendingToCube => Phase::Gripping,
      Phase::Gripping => Phase::AscendingWithCube,
      Phase::AscendingWithCube => Phase::MovingAboveDestination,
      Phase::MovingAboveDestination => Phase::DescendingToDestination,
      Phase::DescendingToDestination => Phase::Releasing,
      Phase::Releasing => Phase::AscendingFromDestination,
      Phase::AscendingFromDestination => Phase::SequenceFinished,
      Phase::SequenceFinished => Phase::MovingHome,
    }
  }

  /// The leg whose target gets locked once this phase completes.
  pub fn locks_leg(self) -> Option<Leg> {
    match self {
      Phase::MovingAboveCube => Some(Leg::Cube),
      Phase::MovingAboveDestination => Some(Leg::Destination),
      _ => None,
    }
  }

  /// Gripper actuation is atomic: a move home request must wait for it to finish.
  pub fn is_safe_boundary(self) -> bool {
    !matches!(self.action(), PhaseAction::Actuate(_))
  }

  pub fn is_idle(self) -> bool {
    matches!(self, Phase::Home | Phase::SequenceFinished)
  }

  pub fn can_start_sequence(self) -> bool {
    self.is_idle()
  }

  /// Name within the phase's group; the full name is `group.step`, e.g. `picking.closing`.
  fn step_name(self) -> &'static str {
    match self {
      Phase::Home => "home",
      Phase::MovingHome => "moving",
      Phase::ReleasingAtHome => "opening",
      Phase::MovingAboveCube => "moving",
      Phase::DescendingToCube => "lowering",
      Phase::Gripping => "closing",
      Phase::AscendingWithCube => "lifting",
      Phase::MovingAboveDestination => "moving",
      Phase::DescendingToDestination => "lowering",
      Phase::Releasing => "opening",
      Phase::AscendingFromDestination => "lifting",
      Phase::SequenceFinished => "finished",
    }
  }
}

impl PhaseGroup {
  pub fn name(self) -> &'static str {
    match self {
      PhaseGroup::Home => "home",
      PhaseGroup::Picking => "picking",
      PhaseGroup::Transporting => "transporting",
      PhaseGroup::Placing => "placing",
      PhaseGroup::SequenceFinished => "sequence_finished",
    }
  }
}

impl Display for Phase {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    write!(f, "{}.{}", self.group().name(), self.step_name())
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_full_sequence_order() {
    let mut phase = Phase::MovingAboveCube;
    let mut visited = vec![phase];
    while phase != Phase::Home {
      let gripper_open = !matches!(phase, Phase::AscendingWithCube | Phase::MovingAboveDestination | Phase::DescendingToDestination);
      phase = phase.next(gripper_open);
      visited.push(phase);
    }
    assert_eq!(visited, vec![
      Phase::MovingAboveCube,
      Phase::DescendingToCube,
      Phase::Gripping,
      Phase::AscendingWithCube,
      Phase::MovingAboveDestination,
      Phase::DescendingToDestination,
      Phase::Releasing,
      Phase::AscendingFromDestination,
      Phase::SequenceFinished,
      Phase::MovingHome,
      Phase::Home,
    ]);
  }

  #[test]
  fn test_arriving_home_with_cube_drops_it() {
    assert_eq!(Phase::MovingHome.next(false), Phase::ReleasingAtHome);
    assert_eq!(Phase::ReleasingAtHome.next(true), Phase::Home);
  }

  #[test]
  fn test_groups() {
    assert_eq!(Phase::Gripping.group(), PhaseGroup::Picking);
    assert_eq!(Phase::AscendingWithCube.group(), PhaseGroup::Transporting);
    assert_eq!(Phase::AscendingFromDestination.group(), PhaseGroup::Placing);
    assert_eq!(Phase::ReleasingAtHome.group(), PhaseGroup::Home);
  }

  #[test]
  fn test_names_are_qualified_by_group() {
    assert_eq!(Phase::Gripping.to_string(), "picking.closing");
    assert_eq!(Phase::MovingHome.to_string(), "home.moving");
    assert_eq!(Phase::AscendingWithCube.to_string(), "transporting.lifting");
    assert_eq!(Phase::SequenceFinished.to_string(), "sequence_finished.finished");
  }

  #[test]
  fn test_only_gripper_actuation_is_unsafe() {
    let unsafe_phases: Vec<Phase> = [
      Phase::Home,
      Phase::MovingHome,
      Phase::ReleasingAtHome,
      Phase::MovingAboveCube,
      Phase::DescendingToCube,
      Phase::Gripping,
      Phase::AscendingWithCube,
      Phase::MovingAboveDestination,
      Phase::DescendingToDestination,
      Phase::Releasing,
      Phase::AscendingFromDestination,
      Phase::SequenceFinished,
    ].into_iter().filter(|p| !p.is_safe_boundary()).collect();
    assert_eq!(unsafe_phases, vec![Phase::ReleasingAtHome, Phase::Gripping, Phase::Releasing]);
  }
}
