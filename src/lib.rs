//! Tick-driven simulation of a textile winding floor.

pub mod adapters;
pub mod application;
pub mod common;
pub mod config;
pub mod domains;

pub use application::FloorService;
pub use common::*;
pub use config::Config;
pub use domains::*;
