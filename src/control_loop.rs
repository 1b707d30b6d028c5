use std::sync::Arc;
use std::time::Duration;

use anyhow::bail;
use futures::Stream;
use log::{error, info};
use tokio::sync;
use tokio::sync::Mutex;
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender};
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};

use crate::controller::GantryController;
use crate::error::ControlResult;
use crate::interrupt::MoveHomeFlag;
use crate::position::Position;
use crate::status::{RobotStatus, StatusPublisher};

/// Runs a [`GantryController`] on a fixed tick and serializes external commands into it.
/// Status and position snapshots are published after every tick, idle or not.
pub struct GantryControlLoop {
  handle: Option<JoinHandle<()>>,
  controller: Arc<Mutex<GantryController>>,
  move_home: MoveHomeFlag,
  publisher: StatusPublisher,
  shutdown: UnboundedSender<()>,
}

impl GantryControlLoop {
  pub fn start(controller: GantryController, tick_interval: Duration) -> anyhow::Result<Self> {
    if tick_interval.is_zero() {
      bail!("Tick interval must be non-zero");
    }
    let move_home = controller.move_home_flag();
    let publisher = StatusPublisher::new(controller.status());
    let controller = Arc::new(Mutex::new(controller));
    let (shutdown_tx, shutdown_rx) = sync::mpsc::unbounded_channel::<()>();

    let controller_for_async = controller.clone();
    let publisher_for_async = publisher.clone();
    let handle = tokio::spawn(async move {
      run_control_loop(controller_for_async, publisher_for_async, tick_interval, shutdown_rx).await;
      info!("Control loop shut down");
    });

    Ok(Self {
      handle: Some(handle),
      controller,
      move_home,
      publisher,
      shutdown: shutdown_tx,
    })
  }

  pub async fn shutdown(mut self) {
    let _ = self.shutdown.send(());
    if let Some(handle) = self.handle.take() {
      if let Err(e) = handle.await {
        error!("Control loop task failed: {e:?}");
      }
    }
  }

  pub async fn start_sequence(&self) -> ControlResult<()> {
    self.controller.lock().await.start_sequence()
  }

  /// Always accepted; acted on at the next safe boundary.
  pub fn move_home(&self) {
    if self.move_home.request() {
      info!("Move home requested");
    }
  }

  pub async fn home_position(&self) -> Position {
    self.controller.lock().await.home_position()
  }

  pub async fn set_home_position(&self, position: Position) -> ControlResult<()> {
    self.controller.lock().await.set_home_position(position)
  }

  pub async fn cube_start_position(&self) -> Position {
    self.controller.lock().await.cube_start_position()
  }

  pub async fn set_cube_start_position(&self, position: Position) -> ControlResult<()> {
    self.controller.lock().await.set_cube_start_position(position)
  }

  pub async fn cube_destination_position(&self) -> Position {
    self.controller.lock().await.cube_destination_position()
  }

  pub async fn set_cube_destination_position(&self, position: Position) -> ControlResult<()> {
    self.controller.lock().await.set_cube_destination_position(position)
  }

  pub fn status(&self) -> RobotStatus {
    self.publisher.status()
  }

  pub fn position(&self) -> Position {
    self.publisher.position()
  }

  pub fn status_stream(&self) -> impl Stream<Item = RobotStatus> {
    self.publisher.status_stream()
  }

  pub fn position_stream(&self) -> impl Stream<Item = Position> {
    self.publisher.position_stream()
  }
}

async fn run_control_loop(
    controller: Arc<Mutex<GantryController>>,
    publisher: StatusPublisher,
    tick_interval: Duration,
    mut shutdown: UnboundedReceiver<()>) {
  let mut interval = interval(tick_interval);
  interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
  loop {
    tokio::select! {
      _ = interval.tick() => {
        let mut controller = controller.lock().await;
        if let Err(e) = controller.tick() {
          error!("Tick failed in [{}], will retry: {e:?}", controller.phase());
        }
        let status = controller.status();
        drop(controller);
        publisher.publish(status);
      },
      _ = shutdown.recv() => {
        return;
      },
    }
  }
}

impl Drop for GantryControlLoop {
  fn drop(&mut self) {
    let _ = self.shutdown.send(());
  }
}
