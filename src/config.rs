use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::time::Duration;

use anyhow::{anyhow, bail};
use serde_derive::{Deserialize, Serialize};

use crate::geometry::TableGeometry;
use crate::position::Position;

pub const DEFAULT_TICK_INTERVAL_MS: u64 = 100;
pub const DEFAULT_LIFTING_HEIGHT_MM: f64 = 300.0;
pub const DEFAULT_REGULAR_SPEED_MM: f64 = 95.0;
pub const DEFAULT_HOMING_SPEED_MM: f64 = 50.0;

/// 2 seconds at the default tick interval.
pub const DEFAULT_GRIPPER_ACTUATION_TICKS: u32 = 20;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GantryConfig {
  pub tick_interval_ms: u64,
  pub lifting_height_mm: f64,

  /// Distance covered per tick, in millimetres.
  pub regular_speed_mm: f64,
  pub homing_speed_mm: f64,

  pub gripper_actuation_ticks: u32,
  pub home_position: Position,
  pub cube_start_position: Position,
  pub cube_destination_position: Position,
}

impl Default for GantryConfig {
  fn default() -> Self {
    let tables = TableGeometry::default();
    Self {
      tick_interval_ms: DEFAULT_TICK_INTERVAL_MS,
      lifting_height_mm: DEFAULT_LIFTING_HEIGHT_MM,
      regular_speed_mm: DEFAULT_REGULAR_SPEED_MM,
      homing_speed_mm: DEFAULT_HOMING_SPEED_MM,
      gripper_actuation_ticks: DEFAULT_GRIPPER_ACTUATION_TICKS,
      home_position: Position::default(),
      cube_start_position: tables.default_cube_start(),
      cube_destination_position: tables.default_cube_destination(),
    }
  }
}

impl GantryConfig {
  pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
    let file = File::open(path)?;
    let reader = BufReader::new(file);
    Ok(serde_json::from_reader(reader)?)
  }

  pub fn tick_interval(&self) -> Duration {
    Duration::from_millis(self.tick_interval_ms)
  }

  /// Rejects settings the control loop could never make progress with.  Positions are
  /// checked separately by the position store.
  pub fn validate(&self) -> anyhow::Result<()> {
    if self.tick_interval_ms == 0 {
      bail!("tick_interval_ms must be non-zero");
    }
    check_positive("regular_speed_mm", self.regular_speed_mm)?;
    check_positive("homing_speed_mm", self.homing_speed_mm)?;
    if !self.lifting_height_mm.is_finite() {
      bail!("lifting_height_mm must be finite, got {}", self.lifting_height_mm);
    }
    Ok(())
  }
}

fn check_positive(name: &str, value: f64) -> anyhow::Result<()> {
  if value.is_finite() && value > 0.0 {
    Ok(())
  } else {
    Err(anyhow!("{name} must be a positive distance per tick, got {value}"))
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_missing_fields_fall_back_to_defaults() {
    let config: GantryConfig = serde_json::from_str(r#"{
      "lifting_height_mm": 250.0,
      "home_position": { "x": 10.0, "y": -20.0, "z": 400.0 }
    }"#).unwrap();
    assert_eq!(config.lifting_height_mm, 250.0);
    assert_eq!(config.home_position, Position::new(10.0, -20.0, 400.0));
    assert_eq!(config.tick_interval(), Duration::from_millis(100));
    assert_eq!(config.cube_start_position, TableGeometry::default().default_cube_start());
    config.validate().unwrap();
  }

  #[test]
  fn test_validate_rejects_unusable_settings() {
    let zero_tick = GantryConfig { tick_interval_ms: 0, ..GantryConfig::default() };
    assert!(zero_tick.validate().is_err());

    for speed in [0.0, -10.0, f64::NAN, f64::INFINITY] {
      let regular = GantryConfig { regular_speed_mm: speed, ..GantryConfig::default() };
      assert!(regular.validate().is_err(), "regular speed {speed} accepted");
      let homing = GantryConfig { homing_speed_mm: speed, ..GantryConfig::default() };
      assert!(homing.validate().is_err(), "homing speed {speed} accepted");
    }

    let lifting = GantryConfig { lifting_height_mm: f64::NAN, ..GantryConfig::default() };
    assert!(lifting.validate().is_err());
  }
}
