use log::{debug, info};

use crate::error::{ControlError, ControlResult};
use crate::geometry::{GeometryValidator, PositionSlot};
use crate::position::Position;
use crate::sequence::Leg;

/// A target that can be locked by a running sequence.  While locked, writes are buffered in
/// `pending` and only become active when [`Deferred::commit`] is called, either at the start
/// of the next sequence or once the robot is back home.
#[derive(Debug, Clone, PartialEq)]
pub struct Deferred<T> {
    active: T,
    pending: Option<T>,
    locked: bool,
}

impl<T: Copy> Deferred<T> {
    pub fn new(active: T) -> Self {
        Self { active, pending: None, locked: false }
    }

    pub fn active(&self) -> T {
        self.active
    }

    pub fn pending(&self) -> Option<T> {
        self.pending
    }

    pub fn is_locked(&self) -> bool {
        self.locked
    }

    pub fn write(&mut self, value: T) {
        if self.locked {
            self.pending = Some(value);
        } else {
            self.active = value;
            self.pending = None;
        }
    }

    /// Returns true only on the call that actually flipped the lock.
    pub fn lock(&mut self) -> bool {
        !std::mem::replace(&mut self.locked, true)
    }

    pub fn commit(&mut self) {
        if let Some(pending) = self.pending.take() {
            self.active = pending;
        }
        self.locked = false;
    }
}

pub struct PositionStore {
    home: Position,
    cube_start: Deferred<Position>,
    cube_destination: Deferred<Position>,
    validator: Box<dyn GeometryValidator + Send>,
}

impl PositionStore {
    pub fn new(
        home: Position,
        cube_start: Position,
        cube_destination: Position,
        validator: Box<dyn GeometryValidator + Send>,
    ) -> ControlResult<Self> {
        let mut store = Self {
            home: Position::default(),
            cube_start: Deferred::new(cube_start),
            cube_destination: Deferred::new(cube_destination),
            validator,
        };
        store.set_home(home)?;
        store.set_cube_start(cube_start)?;
        store.set_cube_destination(cube_destination)?;
        Ok(store)
    }

    pub fn home(&self) -> Position {
        self.home
    }

    pub fn cube_start(&self) -> Position {
        self.cube_start.active()
    }

    pub fn cube_destination(&self) -> Position {
        self.cube_destination.active()
    }

    pub fn set_home(&mut self, position: Position) -> ControlResult<()> {
        position.check_in_work_area()?;
        if position.z < 0.0 {
            return Err(ControlError::InvalidPosition(format!(
                "home {position} is below the table")));
        }
        self.check_geometry(PositionSlot::Home, &position)?;
        self.home = position;
        Ok(())
    }

    pub fn set_cube_start(&mut self, position: Position) -> ControlResult<()> {
        position.check_in_work_area()?;
        self.check_geometry(PositionSlot::CubeStart, &position)?;
        log_deferred_write("cube start", &self.cube_start, &position);
        self.cube_start.write(position);
        Ok(())
    }

    pub fn set_cube_destination(&mut self, position: Position) -> ControlResult<()> {
        position.check_in_work_area()?;
        self.check_geometry(PositionSlot::CubeDestination, &position)?;
        log_deferred_write("cube destination", &self.cube_destination, &position);
        self.cube_destination.write(position);
        Ok(())
    }

    pub fn is_locked(&self, leg: Leg) -> bool {
        self.target(leg).is_locked()
    }

    pub fn lock(&mut self, leg: Leg) {
        if self.target_mut(leg).lock() {
            info!("Locked {leg:?} target at {}", self.target(leg).active());
        }
    }

    /// Applies buffered writes and unlocks both legs.  Called when a sequence starts and when
    /// the robot settles at home, never mid-run.
    pub fn commit_pending(&mut self) {
        for leg in [Leg::Cube, Leg::Destination] {
            let target = self.target_mut(leg);
            if let Some(pending) = target.pending() {
                info!("Committing pending {leg:?} target {pending}");
            }
            target.commit();
        }
    }

    fn target(&self, leg: Leg) -> &Deferred<Position> {
        match leg {
            Leg::Cube => &self.cube_start,
            Leg::Destination => &self.cube_destination,
        }
    }

    fn target_mut(&mut self, leg: Leg) -> &mut Deferred<Position> {
        match leg {
            Leg::Cube => &mut self.cube_start,
            Leg::Destination => &mut self.cube_destination,
        }
    }

    fn check_geometry(&self, slot: PositionSlot, position: &Position) -> ControlResult<()> {
        if self.validator.validate(slot, position) {
            Ok(())
        } else {
            Err(ControlError::InvalidPosition(format!(
                "{slot:?} {position} is outside the allowed area")))
        }
    }
}

fn log_deferred_write(what: &str, target: &Deferred<Position>, position: &Position) {
    if target.is_locked() {
        debug!("{what} is locked, deferring {position} to the next sequence");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn anywhere() -> Box<dyn GeometryValidator + Send> {
        Box::new(|_slot: PositionSlot, _p: &Position| true)
    }

    fn store() -> PositionStore {
        PositionStore::new(
            Position::new(0.0, 0.0, 0.0),
            Position::new(100.0, 100.0, 0.0),
            Position::new(-100.0, -100.0, 0.0),
            anywhere()).unwrap()
    }

    #[test]
    fn test_home_below_table_is_rejected() {
        let mut store = store();
        let result = store.set_home(Position::new(10.0, 10.0, -5.0));
        assert!(matches!(result, Err(ControlError::InvalidPosition(_))));
        assert_eq!(store.home(), Position::new(0.0, 0.0, 0.0));

        store.set_home(Position::new(10.0, 10.0, 0.0)).unwrap();
        assert_eq!(store.home(), Position::new(10.0, 10.0, 0.0));
    }

    #[test]
    fn test_out_of_range_write_leaves_prior_value() {
        let mut store = store();
        assert!(store.set_cube_start(Position::new(1200.0, 0.0, 0.0)).is_err());
        assert_eq!(store.cube_start(), Position::new(100.0, 100.0, 0.0));
    }

    #[test]
    fn test_geometry_rejection() {
        let mut store = PositionStore::new(
            Position::default(),
            Position::new(100.0, 100.0, 0.0),
            Position::new(-100.0, -100.0, 0.0),
            Box::new(|slot: PositionSlot, p: &Position| slot != PositionSlot::CubeDestination || p.x < 0.0)).unwrap();
        assert!(store.set_cube_destination(Position::new(50.0, -100.0, 0.0)).is_err());
        assert!(store.set_cube_destination(Position::new(-50.0, -100.0, 0.0)).is_ok());
        assert_eq!(store.cube_destination(), Position::new(-50.0, -100.0, 0.0));
    }

    #[test]
    fn test_locked_write_is_deferred_until_commit() {
        let mut store = store();
        store.lock(Leg::Cube);
        store.set_cube_start(Position::new(200.0, 200.0, 0.0)).unwrap();
        assert_eq!(store.cube_start(), Position::new(100.0, 100.0, 0.0));

        // Destination leg is not locked, so writes land immediately.
        store.set_cube_destination(Position::new(-200.0, -200.0, 0.0)).unwrap();
        assert_eq!(store.cube_destination(), Position::new(-200.0, -200.0, 0.0));

        store.commit_pending();
        assert_eq!(store.cube_start(), Position::new(200.0, 200.0, 0.0));
        assert!(!store.is_locked(Leg::Cube));
    }

    #[test]
    fn test_lock_flips_once() {
        let mut target = Deferred::new(1);
        assert!(target.lock());
        assert!(!target.lock());
        target.commit();
        assert!(!target.is_locked());
        assert!(target.lock());
    }

    #[test]
    fn test_unlocked_write_discards_stale_pending() {
        let mut target = Deferred::new(1);
        target.lock();
        target.write(2);
        target.commit();
        target.lock();
        target.write(3);
        assert_eq!(target.pending(), Some(3));
        target.commit();
        target.write(4);
        assert_eq!(target.pending(), None);
        target.commit();
        assert_eq!(target.active(), 4);
    }
}
