pub mod config;
pub mod control_loop;
pub mod controller;
pub mod error;
pub mod gantry_hal;
pub mod gantry_hal_mock;
pub mod geometry;
pub mod interrupt;
pub mod motion_driver;
pub mod position;
pub mod position_store;
pub mod sequence;
pub mod status;
