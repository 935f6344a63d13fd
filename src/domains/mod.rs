pub mod collision;
pub mod doffer;
pub mod floor;
pub mod kinematics;
pub mod logger;
pub mod man_service;
pub mod sleever;
pub mod spooler;
pub mod statistics;
pub mod tasks;
pub mod winder;

pub use logger::*;
